//! ModelSync Core
//!
//! Model graph types with stable node ids, configuration, diagnostics and
//! persistence. Never rename diagnostic codes or semantic type ids - they are
//! part of the persisted formats.

pub mod model;
pub mod diagnostic;
pub mod report;
pub mod config;
pub mod store;

pub use model::{
    new_node_id, ref_matches, Annotation, Annotations, Association, AssociationEnd, Attribute, Class,
    ClassKind, Folder, Index, IndexColumn, Metadata, ModelGraph, NodeId, Parameter, SemanticType,
    StoredProcedure, TypeReference,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{ReportVersion, SyncReport, SyncSummary};
pub use config::{ConfigError, EntityNaming, ExportFilter, ExportToggles, SyncConfig, TableAnnotationPolicy};
pub use store::{JsonModelStore, ModelStore, StoreError};
