//! Catalog reader trait for listing database objects

use crate::descriptor::{
    ForeignKeyDescriptor, IndexDescriptor, ObjectName, ProcedureDescriptor, ResultColumn,
    TableDescriptor,
};

/// Errors that can occur when reading the catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Result set introspection failed for {procedure}: {message}")]
    IntrospectionFailed { procedure: String, message: String },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Read access to one database catalog
///
/// All calls are synchronous and are expected to return the same answer for
/// the lifetime of a run. `schemas` filters are allow-lists; an empty slice
/// means every schema.
pub trait CatalogReader {
    /// Get the reader name (e.g. "Snapshot", "Mock")
    fn name(&self) -> &str;

    /// List tables with their columns and primary keys
    fn list_tables(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError>;

    /// List views with their columns
    fn list_views(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError>;

    /// List user-defined table types with their columns
    fn list_table_types(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError>;

    /// List stored procedures with their parameters
    fn list_stored_procedures(&self, schemas: &[String]) -> Result<Vec<ProcedureDescriptor>, CatalogError>;

    /// List the foreign keys owned by a table
    fn list_foreign_keys(&self, table: &ObjectName) -> Result<Vec<ForeignKeyDescriptor>, CatalogError>;

    /// List the indexes owned by a table
    fn list_indexes(&self, table: &ObjectName) -> Result<Vec<IndexDescriptor>, CatalogError>;

    /// Describe the first result set of a procedure
    fn describe_result_set(&self, procedure: &ObjectName) -> Result<Vec<ResultColumn>, CatalogError>;
}

/// Whether `schema` passes an allow-list
pub fn schema_allowed(schemas: &[String], schema: &str) -> bool {
    schemas.is_empty() || schemas.iter().any(|s| s.eq_ignore_ascii_case(schema))
}
