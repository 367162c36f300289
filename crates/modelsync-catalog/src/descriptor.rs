//! Raw catalog descriptors
//!
//! Plain data as read from the database catalog, before any naming or identity
//! decisions are made.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema-qualified object name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectName {
    /// Schema name
    pub schema: String,

    /// Object name
    pub name: String,
}

impl ObjectName {
    /// Create a new object name
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Case-insensitive equality
    pub fn matches(&self, schema: &str, name: &str) -> bool {
        self.schema.eq_ignore_ascii_case(schema) && self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// A computed column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedColumn {
    /// Defining expression
    pub sql: String,

    /// Whether the value is persisted
    #[serde(default)]
    pub persisted: bool,
}

/// A column of a table, view, or table type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,

    /// Database type name (e.g. `nvarchar`, `decimal`)
    pub sql_type: String,

    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Character length; `-1` means `max`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,

    #[serde(default)]
    pub is_identity: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<ComputedColumn>,
}

fn default_true() -> bool {
    true
}

impl ColumnDescriptor {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            is_identity: false,
            default_value: None,
            computed: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.nullable = false;
        self
    }

    pub fn with_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_computed(mut self, sql: impl Into<String>, persisted: bool) -> Self {
        self.computed = Some(ComputedColumn { sql: sql.into(), persisted });
        self
    }
}

/// A table, view, or user-defined table type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub schema: String,

    pub name: String,

    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,

    /// Primary key column names (empty for views and table types)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

impl TableDescriptor {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Add a column
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key columns
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn object_name(&self) -> ObjectName {
        ObjectName::new(&self.schema, &self.name)
    }

    /// Find a column by name (case-insensitive)
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether a column belongs to the primary key
    pub fn is_primary_key_column(&self, name: &str) -> bool {
        self.primary_key.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}

/// A foreign key constraint owned by a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub name: String,

    /// Source columns, in key order
    pub columns: Vec<String>,

    pub referenced_schema: String,

    pub referenced_table: String,

    /// Referenced columns, in key order
    #[serde(default)]
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyDescriptor {
    pub fn new<I, S>(name: impl Into<String>, columns: I, referenced: ObjectName) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_schema: referenced.schema,
            referenced_table: referenced.name,
            referenced_columns: Vec::new(),
        }
    }

    pub fn referencing<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.referenced_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn referenced(&self) -> ObjectName {
        ObjectName::new(&self.referenced_schema, &self.referenced_table)
    }
}

/// One column of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumnDescriptor {
    pub name: String,

    #[serde(default)]
    pub descending: bool,

    /// Included (non-key) column
    #[serde(default)]
    pub included: bool,
}

impl IndexColumnDescriptor {
    pub fn key(name: impl Into<String>) -> Self {
        Self { name: name.into(), descending: false, included: false }
    }

    pub fn included(name: impl Into<String>) -> Self {
        Self { name: name.into(), descending: false, included: true }
    }
}

/// An index owned by a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,

    #[serde(default)]
    pub is_clustered: bool,

    #[serde(default)]
    pub is_unique: bool,

    #[serde(default)]
    pub is_primary_key: bool,

    /// Filter predicate of a filtered index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default)]
    pub columns: Vec<IndexColumnDescriptor>,
}

impl IndexDescriptor {
    /// Create a non-clustered, non-unique index
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_clustered: false,
            is_unique: false,
            is_primary_key: false,
            filter: None,
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, column: IndexColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn clustered(mut self) -> Self {
        self.is_clustered = true;
        self
    }

    /// Key column names in order
    pub fn key_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter(|c| !c.included).map(|c| c.name.as_str())
    }
}

/// A stored procedure parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Parameter name, usually with a leading `@`
    pub name: String,

    pub sql_type: String,

    #[serde(default)]
    pub is_output: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,

    /// User-defined table type of a table-valued parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<ObjectName>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            is_output: false,
            max_length: None,
            precision: None,
            scale: None,
            table_type: None,
        }
    }

    /// Table-valued parameter
    pub fn table_valued(name: impl Into<String>, table_type: ObjectName) -> Self {
        let mut param = Self::new(name, "table type");
        param.table_type = Some(table_type);
        param
    }

    pub fn output(mut self) -> Self {
        self.is_output = true;
        self
    }

    pub fn with_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
}

/// A stored procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureDescriptor {
    pub schema: String,

    pub name: String,

    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
}

impl ProcedureDescriptor {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn object_name(&self) -> ObjectName {
        ObjectName::new(&self.schema, &self.name)
    }
}

/// A column of a procedure's first result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,

    pub sql_type: String,

    #[serde(default = "default_true")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,

    /// Table the column traces back to, when it traces to exactly one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<ObjectName>,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            source_table: None,
        }
    }

    pub fn from_table(mut self, table: ObjectName) -> Self {
        self.source_table = Some(table);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// View the column as a plain column descriptor
    pub fn to_column(&self) -> ColumnDescriptor {
        ColumnDescriptor {
            name: self.name.clone(),
            sql_type: self.sql_type.clone(),
            nullable: self.nullable,
            max_length: self.max_length,
            precision: self.precision,
            scale: self.scale,
            is_identity: false,
            default_value: None,
            computed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_display() {
        let name = ObjectName::new("dbo", "Customer");
        assert_eq!(name.fqn(), "dbo.Customer");
        assert_eq!(name.to_string(), "dbo.Customer");
        assert!(name.matches("DBO", "customer"));
    }

    #[test]
    fn table_builder() {
        let table = TableDescriptor::new("dbo", "Order")
            .column(ColumnDescriptor::new("OrderId", "int").identity())
            .column(ColumnDescriptor::new("Total", "decimal").with_precision(10, 2))
            .primary_key(["OrderId"]);

        assert!(table.is_primary_key_column("orderid"));
        assert!(!table.find_column("OrderId").unwrap().nullable);
        assert!(table.find_column("Total").unwrap().nullable);
    }

    #[test]
    fn index_key_columns_skip_included() {
        let index = IndexDescriptor::new("IX_Order_Date")
            .column(IndexColumnDescriptor::key("OrderDate"))
            .column(IndexColumnDescriptor::included("Total"));

        assert_eq!(index.key_columns().collect::<Vec<_>>(), vec!["OrderDate"]);
    }

    #[test]
    fn column_defaults_to_nullable_when_deserialized() {
        let column: ColumnDescriptor =
            serde_json::from_str(r#"{ "name": "Notes", "sql_type": "nvarchar", "max_length": -1 }"#).unwrap();
        assert!(column.nullable);
        assert_eq!(column.max_length, Some(-1));
    }
}
