//! ModelSync engine - catalog to model graph reconciliation
//!
//! This crate implements the reconciliation engine:
//! - Name normalization and deduplication
//! - Identity resolution by external reference
//! - Cross-schema conflict analysis
//! - Node reconciliation and annotation
//! - Foreign key to association synthesis
//! - Run orchestration

pub mod naming;
pub mod identity;
pub mod dedup;
pub mod conflicts;
pub mod error;
pub mod reconcile;
pub mod annotators;
pub mod associations;
pub mod orchestrator;

pub use annotators::{
    AnnotationContext, AnnotatorRegistry, AttributeAnnotator, ClassAnnotator, ClassOrigin,
    ClassSource, ColumnSource, GraphAnnotator, IndexAnnotator, IndexSource, ParameterAnnotator,
    ParameterSource, ProcedureAnnotator,
};
pub use associations::{AssociationSynthesizer, Synthesis};
pub use conflicts::{ConflictMap, TableConflict};
pub use dedup::NameRegistry;
pub use error::SyncError;
pub use identity::{ExternalRef, Identity};
pub use naming::{entity_name, normalize, singularize, NameKind};
pub use orchestrator::{SyncOutcome, Synchronizer};
