//! JSON catalog snapshots
//!
//! A snapshot is one already-materialized scan of a database catalog. It can be
//! produced by any external tool and replayed against a model as often as
//! needed.
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "schema": "dbo",
//!       "name": "Customer",
//!       "columns": [{ "name": "CustomerId", "sql_type": "int", "nullable": false }],
//!       "primary_key": ["CustomerId"],
//!       "foreign_keys": [],
//!       "indexes": []
//!     }
//!   ],
//!   "procedures": [
//!     { "schema": "dbo", "name": "GetCustomers", "result_set": [] }
//!   ]
//! }
//! ```

use crate::descriptor::{
    ForeignKeyDescriptor, IndexDescriptor, ObjectName, ProcedureDescriptor, ResultColumn,
    TableDescriptor,
};
use crate::reader::{schema_allowed, CatalogError, CatalogReader};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A table together with the constraints it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    #[serde(flatten)]
    pub table: TableDescriptor,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDescriptor>,

    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

/// A procedure together with its introspected result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureSnapshot {
    #[serde(flatten)]
    pub procedure: ProcedureDescriptor,

    /// First result set; absent means the procedure returns nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set: Option<Vec<ResultColumn>>,

    /// Error recorded when the result set could not be introspected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set_error: Option<String>,
}

/// Serializable catalog contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,

    #[serde(default)]
    pub views: Vec<TableDescriptor>,

    #[serde(default)]
    pub table_types: Vec<TableDescriptor>,

    #[serde(default)]
    pub procedures: Vec<ProcedureSnapshot>,
}

impl CatalogSnapshot {
    fn table(&self, name: &ObjectName) -> Result<&TableSnapshot, CatalogError> {
        self.tables
            .iter()
            .find(|t| name.matches(&t.table.schema, &t.table.name))
            .ok_or_else(|| CatalogError::ObjectNotFound(name.fqn()))
    }

    fn procedure(&self, name: &ObjectName) -> Result<&ProcedureSnapshot, CatalogError> {
        self.procedures
            .iter()
            .find(|p| name.matches(&p.procedure.schema, &p.procedure.name))
            .ok_or_else(|| CatalogError::ObjectNotFound(name.fqn()))
    }

    pub(crate) fn tables_in(&self, schemas: &[String]) -> Vec<TableDescriptor> {
        self.tables
            .iter()
            .filter(|t| schema_allowed(schemas, &t.table.schema))
            .map(|t| t.table.clone())
            .collect()
    }

    pub(crate) fn views_in(&self, schemas: &[String]) -> Vec<TableDescriptor> {
        filter_schema(&self.views, schemas)
    }

    pub(crate) fn table_types_in(&self, schemas: &[String]) -> Vec<TableDescriptor> {
        filter_schema(&self.table_types, schemas)
    }

    pub(crate) fn procedures_in(&self, schemas: &[String]) -> Vec<ProcedureDescriptor> {
        self.procedures
            .iter()
            .filter(|p| schema_allowed(schemas, &p.procedure.schema))
            .map(|p| p.procedure.clone())
            .collect()
    }

    pub(crate) fn foreign_keys_of(&self, table: &ObjectName) -> Result<Vec<ForeignKeyDescriptor>, CatalogError> {
        Ok(self.table(table)?.foreign_keys.clone())
    }

    pub(crate) fn indexes_of(&self, table: &ObjectName) -> Result<Vec<IndexDescriptor>, CatalogError> {
        Ok(self.table(table)?.indexes.clone())
    }

    pub(crate) fn result_set_of(&self, procedure: &ObjectName) -> Result<Vec<ResultColumn>, CatalogError> {
        let snapshot = self.procedure(procedure)?;

        if let Some(message) = &snapshot.result_set_error {
            return Err(CatalogError::IntrospectionFailed {
                procedure: procedure.fqn(),
                message: message.clone(),
            });
        }

        Ok(snapshot.result_set.clone().unwrap_or_default())
    }
}

fn filter_schema(tables: &[TableDescriptor], schemas: &[String]) -> Vec<TableDescriptor> {
    tables
        .iter()
        .filter(|t| schema_allowed(schemas, &t.schema))
        .cloned()
        .collect()
}

/// Catalog reader backed by a JSON snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    snapshot: CatalogSnapshot,
}

impl SnapshotCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let snapshot = serde_json::from_str(json)
            .map_err(|e| CatalogError::InvalidSnapshot(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::IoError(format!("{}: {}", path.display(), e)))?;

        let catalog = Self::from_json(&contents)?;
        tracing::debug!(
            path = %path.display(),
            tables = catalog.snapshot.tables.len(),
            procedures = catalog.snapshot.procedures.len(),
            "Loaded catalog snapshot"
        );
        Ok(catalog)
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }
}

impl CatalogReader for SnapshotCatalog {
    fn name(&self) -> &str {
        "Snapshot"
    }

    fn list_tables(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError> {
        Ok(self.snapshot.tables_in(schemas))
    }

    fn list_views(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError> {
        Ok(self.snapshot.views_in(schemas))
    }

    fn list_table_types(&self, schemas: &[String]) -> Result<Vec<TableDescriptor>, CatalogError> {
        Ok(self.snapshot.table_types_in(schemas))
    }

    fn list_stored_procedures(&self, schemas: &[String]) -> Result<Vec<ProcedureDescriptor>, CatalogError> {
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
