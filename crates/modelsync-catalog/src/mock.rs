//! Mock catalog reader for testing
//!
//! This reader serves predefined objects without connecting to any database.
//! It's useful for:
//! - Unit testing reconciliation logic
//! - Replaying catalog changes between two runs
//! - Simulating introspection failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modelsync_catalog::{MockCatalog, TableDescriptor, ColumnDescriptor};
//!
//! let catalog = MockCatalog::new().with_table(
//!     TableDescriptor::new("dbo", "Customer")
//!         .column(ColumnDescriptor::new("CustomerId", "int").not_null())
//!         .primary_key(["CustomerId"]),
//! );
//! ```

use crate::descriptor::{
    ForeignKeyDescriptor, IndexDescriptor, ObjectName, ProcedureDescriptor, ResultColumn,
    TableDescriptor,
};
use crate::reader::{CatalogError, CatalogReader};
use crate::snapshot::{CatalogSnapshot, ProcedureSnapshot, TableSnapshot};

/// Mock catalog reader for testing
///
/// Objects are kept in memory in insertion order; tests can mutate them
/// between two runs to simulate an evolving database.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    /// Catalog contents
    snapshot: CatalogSnapshot,

    /// Error returned from every listing call
    listing_failure: Option<String>,

    /// Name to return from name() method
    reader_name: &'static str,
}

impl MockCatalog {
    /// Create an empty mock catalog
    pub fn new() -> Self {
        Self {
            snapshot: CatalogSnapshot::default(),
            listing_failure: None,
            reader_name: "Mock",
        }
    }

    /// Create a mock catalog from a pre-built snapshot
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::new()
        }
    }

    /// Add a table
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.add_table(table);
        self
    }

    /// Add a foreign key to an existing table
    ///
    /// Panics if the table has not been added; this is a test helper.
    pub fn with_foreign_key(mut self, table: ObjectName, foreign_key: ForeignKeyDescriptor) -> Self {
        self.table_snapshot_mut(&table).foreign_keys.push(foreign_key);
        self
    }

    /// Add an index to an existing table
    pub fn with_index(mut self, table: ObjectName, index: IndexDescriptor) -> Self {
        self.table_snapshot_mut(&table).indexes.push(index);
        self
    }

    pub fn with_view(mut self, view: TableDescriptor) -> Self {
        self.snapshot.views.push(view);
        self
    }

    pub fn with_table_type(mut self, table_type: TableDescriptor) -> Self {
        self.snapshot.table_types.push(table_type);
        self
    }

    /// Add a procedure with the given first result set
    pub fn with_procedure(mut self, procedure: ProcedureDescriptor, result_set: Vec<ResultColumn>) -> Self {
        self.snapshot.procedures.push(ProcedureSnapshot {
            procedure,
            result_set: Some(result_set),
            result_set_error: None,
        });
        self
    }

    /// Add a procedure whose result set cannot be introspected
    pub fn with_failing_procedure(mut self, procedure: ProcedureDescriptor, message: impl Into<String>) -> Self {
        self.snapshot.procedures.push(ProcedureSnapshot {
            procedure,
            result_set: None,
            result_set_error: Some(message.into()),
        });
        self
    }

    /// Configure every listing call to fail
    pub fn with_listing_failure(mut self, message: impl Into<String>) -> Self {
        self.listing_failure = Some(message.into());
        self
    }

    /// Set a custom reader name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.reader_name = name;
        self
    }

    pub fn add_table(&mut self, table: TableDescriptor) {
        self.snapshot.tables.push(TableSnapshot {
            table,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        });
    }

    /// Mutable access to a table, for simulating schema changes
    pub fn table_mut(&mut self, name: &ObjectName) -> Option<&mut TableDescriptor> {
        self.snapshot
            .tables
            .iter_mut()
            .find(|t| name.matches(&t.table.schema, &t.table.name))
            .map(|t| &mut t.table)
    }

    /// Remove all foreign keys of a table
    pub fn clear_foreign_keys(&mut self, table: &ObjectName) {
        self.table_snapshot_mut(table).foreign_keys.clear();
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    fn table_snapshot_mut(&mut self, name: &ObjectName) -> &mut TableSnapshot {
        self.snapshot
            .tables
            .iter_mut()
            .find(|t| name.matches(&t.table.schema, &t.table.name))
            .unwrap_or_else(|| panic!("mock table {} has not been added", name))
    }

    fn check_listing(&self) -> Result<(), CatalogError> {
        match &self.listing_failure {
            Some(message) => Err(CatalogError::QueryError(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogReader for MockCatalog {
    fn name(&self) -> &str {
        self.reader_name
    }

    fn list_tables(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError> {
        self.check_listing()?;
        Ok(self.snapshot.tables_in(schemas))
    }

    fn list_views(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError> {
        self.check_listing()?;
        Ok(self.snapshot.views_in(schemas))
    }

    fn list_table_types(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError> {
        self.check_listing()?;
        Ok(self.snapshot.table_types_in(schemas))
    }

    fn list_stored_procedures(&self, schemas: &[String]) -> Result<Vec<ProcedureDescriptor>, CatalogError> {
        self.check_listing()?;
        Ok(self.snapshot.procedures_in(schemas))
    }

    fn list_foreign_keys(&self, table: &ObjectName) -> Result<Vec<ForeignKeyDescriptor>, CatalogError> {
        self.snapshot.foreign_keys_of(table)
    }

    fn list_indexes(&self, table: &ObjectName) -> Result<Vec<IndexDescriptor>, CatalogError> {
        self.snapshot.indexes_of(table)
    }

    fn describe_result_set(&self, procedure: &ObjectName) -> Result<Vec<ResultColumn>, CatalogError> {
        self.snapshot.result_set_of(procedure)
    }
}
