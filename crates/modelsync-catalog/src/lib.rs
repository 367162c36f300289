//! Database catalog access for model synchronization
//!
//! This crate defines the raw descriptors a catalog reader produces and the
//! [`CatalogReader`] trait the sync engine consumes.
//!
//! ## Readers
//!
//! - [`SnapshotCatalog`] - replays a JSON catalog snapshot from disk
//! - [`MockCatalog`] - in-memory catalog for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use modelsync_catalog::{CatalogReader, SnapshotCatalog};
//!
//! let catalog = SnapshotCatalog::from_file(Path::new("catalog.json"))?;
//! let tables = catalog.list_tables(&[])?;
//! ```

pub mod descriptor;
pub mod reader;
pub mod types;
pub mod snapshot;
pub mod mock;

pub use descriptor::{
    ColumnDescriptor, ComputedColumn, ForeignKeyDescriptor, IndexColumnDescriptor, IndexDescriptor,
    ObjectName, ParameterDescriptor, ProcedureDescriptor, ResultColumn, TableDescriptor,
};
pub use reader::{CatalogError, CatalogReader};
pub use types::{is_decimal_type, is_text_type, is_unicode_type, map_sql_type};
pub use snapshot::{CatalogSnapshot, ProcedureSnapshot, SnapshotCatalog, TableSnapshot};
pub use mock::MockCatalog;
