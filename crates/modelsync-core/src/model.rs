//! Model graph types
//!
//! The persisted, hand-editable graph that downstream code generation consumes.
//! Node ids are generated once and never change for the lifetime of a graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable node identifier
pub type NodeId = String;

/// Generate a fresh node id
pub fn new_node_id() -> NodeId {
    uuid::Uuid::new_v4().to_string()
}

/// Portable semantic type system
///
/// Maps database-specific column types to the types the model speaks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Decimal,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    Guid,
    Binary,
}

impl SemanticType {
    /// Stable type id stored in type references
    ///
    /// Never rename these: persisted graphs refer to them.
    pub fn id(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::DateTimeOffset => "datetimeoffset",
            Self::Guid => "guid",
            Self::Binary => "binary",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Reference from an attribute, parameter or procedure to its type
///
/// `type_id` is either a [`SemanticType::id`] or the id of a class in the graph.
/// An untyped reference carries no `type_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,

    #[serde(default)]
    pub is_nullable: bool,

    #[serde(default)]
    pub is_collection: bool,
}

impl TypeReference {
    /// Reference to a semantic type
    pub fn semantic(ty: SemanticType, is_nullable: bool) -> Self {
        Self {
            type_id: Some(ty.id().to_string()),
            is_nullable,
            is_collection: false,
        }
    }

    /// Reference to a class node
    pub fn class(class_id: impl Into<String>, is_nullable: bool, is_collection: bool) -> Self {
        Self {
            type_id: Some(class_id.into()),
            is_nullable,
            is_collection,
        }
    }

    /// Whether a type has been resolved
    pub fn is_typed(&self) -> bool {
        self.type_id.is_some()
    }
}

/// One annotation block: an ordered set of string properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotation {
    pub properties: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style property setter
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.properties.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Open-ended annotation bag keyed by block name
///
/// Ordered so that serialization is byte-stable across runs. Blocks the engine
/// does not know about survive reconciliation untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, Annotation>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Replace a block, returning whether anything changed
    pub fn set(&mut self, name: impl Into<String>, annotation: Annotation) -> bool {
        let name = name.into();
        if self.0.get(&name) == Some(&annotation) {
            return false;
        }
        self.0.insert(name, annotation);
        true
    }

    /// Remove a block, returning whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name).is_some()
    }

    /// Read a single property of a block
    pub fn property(&self, name: &str, key: &str) -> Option<&str> {
        self.0.get(name).and_then(|a| a.get(key))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Free-form bookkeeping values attached to a node
pub type Metadata = BTreeMap<String, String>;

/// What a class stands for in the source database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassKind {
    Table,
    View,
    DataContract,
}

impl std::fmt::Display for ClassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::View => write!(f, "view"),
            Self::DataContract => write!(f, "data-contract"),
        }
    }
}

/// One folder per source schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub name: String,
}

/// A column or parameter surfaced on a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub name: String,

    #[serde(default)]
    pub type_ref: TypeReference,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_node_id(),
            external_ref: None,
            name: name.into(),
            type_ref: TypeReference::default(),
            annotations: Annotations::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.type_ref.is_nullable
    }
}

/// A column of an [`Index`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub id: NodeId,

    pub name: String,

    /// Attribute the column points at
    pub attribute_id: NodeId,

    #[serde(default)]
    pub descending: bool,

    /// Included (non-key) column
    #[serde(default)]
    pub included: bool,
}

/// A non-clustered index surfaced on a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub name: String,

    #[serde(default)]
    pub columns: Vec<IndexColumn>,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

/// A table, view, or data contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: NodeId,

    pub kind: ClassKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<NodeId>,

    #[serde(default)]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Class {
    pub fn new(kind: ClassKind, name: impl Into<String>) -> Self {
        Self {
            id: new_node_id(),
            kind,
            external_ref: None,
            name: name.into(),
            folder_id: None,
            attributes: Vec::new(),
            indexes: Vec::new(),
            annotations: Annotations::new(),
            metadata: Metadata::new(),
        }
    }

    /// Find an attribute by its external reference
    pub fn attribute_by_ref(&self, external_ref: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| ref_matches(&a.external_ref, external_ref))
    }

    /// Find an attribute by name
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// One terminal of an association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationEnd {
    pub id: NodeId,

    pub class_id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub navigable: bool,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub collection: bool,
}

impl AssociationEnd {
    pub fn new(class_id: impl Into<String>) -> Self {
        Self {
            id: new_node_id(),
            class_id: class_id.into(),
            name: None,
            navigable: false,
            nullable: false,
            collection: false,
        }
    }
}

/// A directed relationship between two classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub source_end: AssociationEnd,

    pub target_end: AssociationEnd,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

/// A stored procedure parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub name: String,

    #[serde(default)]
    pub type_ref: TypeReference,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

/// A stored procedure surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProcedure {
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<NodeId>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Inferred result shape, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeReference>,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

/// Root of the model graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGraph {
    pub id: NodeId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,

    #[serde(default)]
    pub folders: Vec<Folder>,

    #[serde(default)]
    pub classes: Vec<Class>,

    #[serde(default)]
    pub associations: Vec<Association>,

    #[serde(default)]
    pub procedures: Vec<StoredProcedure>,
}

impl ModelGraph {
    /// Create an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_node_id(),
            name: name.into(),
            annotations: Annotations::new(),
            metadata: Metadata::new(),
            folders: Vec::new(),
            classes: Vec::new(),
            associations: Vec::new(),
            procedures: Vec::new(),
        }
    }

    pub fn class(&self, id: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn class_mut(&mut self, id: &str) -> Option<&mut Class> {
        self.classes.iter_mut().find(|c| c.id == id)
    }

    /// Find a class by external reference (case-insensitive)
    pub fn class_by_ref(&self, external_ref: &str) -> Option<&Class> {
        self.classes.iter().find(|c| ref_matches(&c.external_ref, external_ref))
    }

    /// Find a class by name
    pub fn find_class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn procedure_by_ref(&self, external_ref: &str) -> Option<&StoredProcedure> {
        self.procedures.iter().find(|p| ref_matches(&p.external_ref, external_ref))
    }
}

/// Case-insensitive comparison of a stored external reference
pub fn ref_matches(stored: &Option<String>, external_ref: &str) -> bool {
    stored
        .as_deref()
        .is_some_and(|r| r.eq_ignore_ascii_case(external_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_set_reports_changes() {
        let mut annotations = Annotations::new();
        let block = Annotation::new().with("Precision", 10).with("Scale", 2);

        assert!(annotations.set("DecimalConstraints", block.clone()));
        assert!(!annotations.set("DecimalConstraints", block));
        assert_eq!(annotations.property("DecimalConstraints", "Precision"), Some("10"));
        assert!(annotations.remove("DecimalConstraints"));
        assert!(!annotations.remove("DecimalConstraints"));
    }

    #[test]
    fn external_refs_match_case_insensitively() {
        let mut graph = ModelGraph::new("Sales");
        let mut class = Class::new(ClassKind::Table, "Customer");
        class.external_ref = Some("dbo.customer".to_string());
        graph.classes.push(class);

        assert!(graph.class_by_ref("DBO.Customer").is_some());
        assert!(graph.class_by_ref("dbo.order").is_none());
    }

    #[test]
    fn node_ids_are_unique() {
        assert_ne!(new_node_id(), new_node_id());
    }

    #[test]
    fn graph_serialization_is_stable() {
        let mut graph = ModelGraph::new("Sales");
        let mut class = Class::new(ClassKind::Table, "Order");
        class.annotations.set("Table", Annotation::new().with("Schema", "dbo").with("Name", "Orders"));
        class.annotations.set("Custom", Annotation::new().with("Owner", "ops"));
        graph.classes.push(class);

        let first = serde_json::to_string_pretty(&graph).unwrap();
        let parsed: ModelGraph = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string_pretty(&parsed).unwrap();

        assert_eq!(parsed, graph);
        assert_eq!(first, second);
    }

    #[test]
    fn semantic_type_ids() {
        assert_eq!(SemanticType::DateTimeOffset.id(), "datetimeoffset");
        assert_eq!(TypeReference::semantic(SemanticType::Int, true).type_id.as_deref(), Some("int"));
    }
}
