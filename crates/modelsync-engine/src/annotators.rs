//! Per-node annotation callbacks
//!
//! Annotators attach database-specific decorations to reconciled nodes. Each
//! one owns a single annotation block: it rewrites the block from source
//! metadata on every run and removes it when the source no longer warrants it.
//! Blocks nobody owns are never touched.

use modelsync_catalog::{
    is_decimal_type, is_text_type, is_unicode_type, map_sql_type, ColumnDescriptor, IndexDescriptor,
    ParameterDescriptor, ProcedureDescriptor, TableDescriptor,
};
use modelsync_core::{
    Annotation, Annotations, Attribute, Class, Diagnostic, DiagnosticCode, Index, ModelGraph,
    Parameter, StoredProcedure, SyncConfig, SyncReport, TableAnnotationPolicy, TypeReference,
};

/// Annotation block names owned by the default annotators
pub mod blocks {
    pub const DATABASE: &str = "Database";
    pub const TABLE: &str = "Table";
    pub const VIEW: &str = "View";
    pub const TABLE_TYPE: &str = "TableType";
    pub const RESULT_SET: &str = "ResultSet";
    pub const COLUMN: &str = "Column";
    pub const PRIMARY_KEY: &str = "PrimaryKey";
    pub const TEXT_CONSTRAINTS: &str = "TextConstraints";
    pub const DECIMAL_CONSTRAINTS: &str = "DecimalConstraints";
    pub const DEFAULT_CONSTRAINT: &str = "DefaultConstraint";
    pub const COMPUTED_VALUE: &str = "ComputedValue";
    pub const INDEX: &str = "Index";
    pub const FOREIGN_KEY: &str = "ForeignKey";
    pub const STORED_PROCEDURE: &str = "StoredProcedure";
    pub const PARAMETER: &str = "Parameter";
}

/// Where a class came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrigin {
    Table,
    View,
    TableType,
    /// Synthesized from a procedure's result set
    ResultSet,
}

/// Source of a class
#[derive(Debug, Clone, Copy)]
pub struct ClassSource<'a> {
    pub origin: ClassOrigin,
    pub object: &'a TableDescriptor,
}

/// Source of an attribute
#[derive(Debug, Clone, Copy)]
pub struct ColumnSource<'a> {
    pub owner: &'a TableDescriptor,
    pub column: &'a ColumnDescriptor,
    /// Indexes of the owning table that appear in the model
    pub indexes: &'a [IndexDescriptor],
}

/// Source of an index
#[derive(Debug, Clone, Copy)]
pub struct IndexSource<'a> {
    pub owner: &'a TableDescriptor,
    pub index: &'a IndexDescriptor,
}

/// Source of a parameter
#[derive(Debug, Clone, Copy)]
pub struct ParameterSource<'a> {
    pub procedure: &'a ProcedureDescriptor,
    pub parameter: &'a ParameterDescriptor,
}

/// What annotators may see and report into
pub struct AnnotationContext<'a> {
    pub config: &'a SyncConfig,
    report: &'a mut SyncReport,
}

impl<'a> AnnotationContext<'a> {
    pub fn new(config: &'a SyncConfig, report: &'a mut SyncReport) -> Self {
        Self { config, report }
    }

    /// Record a recoverable problem
    pub fn warn(&mut self, code: DiagnosticCode, object: impl Into<String>, message: impl Into<String>) {
        let object = object.into();
        let message = message.into();
        tracing::warn!(code = %code, object = %object, "{}", message);
        self.report.add_diagnostic(Diagnostic::warn(code, message).with_object(object));
    }
}

pub trait GraphAnnotator {
    fn name(&self) -> &'static str;
    fn annotate(&self, cx: &mut AnnotationContext<'_>, graph: &mut ModelGraph);
}

pub trait ClassAnnotator {
    fn name(&self) -> &'static str;
    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &ClassSource<'_>, class: &mut Class);
}

pub trait AttributeAnnotator {
    fn name(&self) -> &'static str;
    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute);
}

pub trait IndexAnnotator {
    fn name(&self) -> &'static str;
    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &IndexSource<'_>, index: &mut Index);
}

pub trait ProcedureAnnotator {
    fn name(&self) -> &'static str;
    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &ProcedureDescriptor, procedure: &mut StoredProcedure);
}

pub trait ParameterAnnotator {
    fn name(&self) -> &'static str;
    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &ParameterSource<'_>, parameter: &mut Parameter);
}

/// Annotators registered per object kind, invoked in registration order
#[derive(Default)]
pub struct AnnotatorRegistry {
    graph: Vec<Box<dyn GraphAnnotator>>,
    class: Vec<Box<dyn ClassAnnotator>>,
    attribute: Vec<Box<dyn AttributeAnnotator>>,
    index: Vec<Box<dyn IndexAnnotator>>,
    procedure: Vec<Box<dyn ProcedureAnnotator>>,
    parameter: Vec<Box<dyn ParameterAnnotator>>,
}

impl AnnotatorRegistry {
    /// Registry with no annotators
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the SQL Server annotators
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_graph(DatabaseTypeAnnotator);
        registry.register_class(TableAnnotator);
        registry.register_class(ViewAnnotator);
        registry.register_class(TableTypeAnnotator);
        registry.register_class(ResultSetAnnotator);
        registry.register_attribute(ColumnTypeAnnotator);
        registry.register_attribute(PrimaryKeyAnnotator);
        registry.register_attribute(TextConstraintsAnnotator);
        registry.register_attribute(DecimalConstraintsAnnotator);
        registry.register_attribute(DefaultValueAnnotator);
        registry.register_attribute(ComputedValueAnnotator);
        registry.register_attribute(IndexMembershipAnnotator);
        registry.register_index(IndexSettingsAnnotator);
        registry.register_procedure(StoredProcedureAnnotator);
        registry.register_parameter(ParameterSettingsAnnotator);
        registry
    }

    pub fn register_graph(&mut self, annotator: impl GraphAnnotator + 'static) {
        self.graph.push(Box::new(annotator));
    }

    pub fn register_class(&mut self, annotator: impl ClassAnnotator + 'static) {
        self.class.push(Box::new(annotator));
    }

    pub fn register_attribute(&mut self, annotator: impl AttributeAnnotator + 'static) {
        self.attribute.push(Box::new(annotator));
    }

    pub fn register_index(&mut self, annotator: impl IndexAnnotator + 'static) {
        self.index.push(Box::new(annotator));
    }

    pub fn register_procedure(&mut self, annotator: impl ProcedureAnnotator + 'static) {
        self.procedure.push(Box::new(annotator));
    }

    pub fn register_parameter(&mut self, annotator: impl ParameterAnnotator + 'static) {
        self.parameter.push(Box::new(annotator));
    }

    /// Names of every registered annotator, grouped by kind
    pub fn names(&self) -> Vec<&'static str> {
        self.graph.iter().map(|a| a.name())
            .chain(self.class.iter().map(|a| a.name()))
            .chain(self.attribute.iter().map(|a| a.name()))
            .chain(self.index.iter().map(|a| a.name()))
            .chain(self.procedure.iter().map(|a| a.name()))
            .chain(self.parameter.iter().map(|a| a.name()))
            .collect()
    }

    pub(crate) fn annotate_graph(&self, cx: &mut AnnotationContext<'_>, graph: &mut ModelGraph) {
        for annotator in &self.graph {
            annotator.annotate(cx, graph);
        }
    }

    pub(crate) fn annotate_class(&self, cx: &mut AnnotationContext<'_>, source: &ClassSource<'_>, class: &mut Class) {
        for annotator in &self.class {
            annotator.annotate(cx, source, class);
        }
    }

    pub(crate) fn annotate_attribute(&self, cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        for annotator in &self.attribute {
            annotator.annotate(cx, source, attribute);
        }
    }

    pub(crate) fn annotate_index(&self, cx: &mut AnnotationContext<'_>, source: &IndexSource<'_>, index: &mut Index) {
        for annotator in &self.index {
            annotator.annotate(cx, source, index);
        }
    }

    pub(crate) fn annotate_procedure(&self, cx: &mut AnnotationContext<'_>, source: &ProcedureDescriptor, procedure: &mut StoredProcedure) {
        for annotator in &self.procedure {
            annotator.annotate(cx, source, procedure);
        }
    }

    pub(crate) fn annotate_parameter(&self, cx: &mut AnnotationContext<'_>, source: &ParameterSource<'_>, parameter: &mut Parameter) {
        for annotator in &self.parameter {
            annotator.annotate(cx, source, parameter);
        }
    }
}

/// Set `name` to `block` when present, remove it otherwise
fn apply(annotations: &mut Annotations, name: &str, block: Option<Annotation>) {
    match block {
        Some(block) => {
            annotations.set(name, block);
        }
        None => {
            annotations.remove(name);
        }
    }
}

/// Type spelled the way the database would, e.g. `nvarchar(100)`, `decimal(10,2)`
fn sql_type_spelling(sql_type: &str, max_length: Option<i32>, precision: Option<u8>, scale: Option<u8>) -> String {
    let base = sql_type.to_lowercase();
    if base.contains('(') {
        return base;
    }

    if is_text_type(&base) {
        return match max_length {
            Some(-1) => format!("{}(max)", base),
            Some(n) => format!("{}({})", base, n),
            None => base,
        };
    }

    if is_decimal_type(&base) {
        return match (precision, scale) {
            (Some(p), Some(s)) => format!("{}({},{})", base, p, s),
            (Some(p), None) => format!("{}({})", base, p),
            _ => base,
        };
    }

    base
}

fn text_constraints(sql_type: &str, max_length: Option<i32>) -> Option<Annotation> {
    if !is_text_type(sql_type) {
        return None;
    }

    let max_length = max_length?;
    let length = if max_length < 0 { "max".to_string() } else { max_length.to_string() };
    Some(
        Annotation::new()
            .with("MaxLength", length)
            .with("IsUnicode", is_unicode_type(sql_type)),
    )
}

fn decimal_constraints(sql_type: &str, precision: Option<u8>, scale: Option<u8>) -> Option<Annotation> {
    if !is_decimal_type(sql_type) {
        return None;
    }

    let precision = precision?;
    Some(
        Annotation::new()
            .with("Precision", precision)
            .with("Scale", scale.unwrap_or(0)),
    )
}

/// Records the database type on the graph root
pub struct DatabaseTypeAnnotator;

impl GraphAnnotator for DatabaseTypeAnnotator {
    fn name(&self) -> &'static str {
        "database-type"
    }

    fn annotate(&self, cx: &mut AnnotationContext<'_>, graph: &mut ModelGraph) {
        let block = Annotation::new().with("Type", &cx.config.database_type);
        if graph.annotations.set(blocks::DATABASE, block) {
            tracing::debug!(database_type = %cx.config.database_type, "Applied database type");
        }
    }
}

/// Records the source table, subject to the table annotation policy
pub struct TableAnnotator;

impl ClassAnnotator for TableAnnotator {
    fn name(&self) -> &'static str {
        "table"
    }

    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &ClassSource<'_>, class: &mut Class) {
        if source.origin != ClassOrigin::Table {
            return;
        }

        let table = source.object;
        let wanted = match cx.config.table_annotation {
            TableAnnotationPolicy::Always => true,
            TableAnnotationPolicy::WhenDifferent => {
                class.name != table.name || !table.schema.eq_ignore_ascii_case(&cx.config.default_schema)
            }
        };

        let block = wanted.then(|| {
            Annotation::new()
                .with("Name", &table.name)
                .with("Schema", &table.schema)
        });
        apply(&mut class.annotations, blocks::TABLE, block);
    }
}

/// Records the source view
pub struct ViewAnnotator;

impl ClassAnnotator for ViewAnnotator {
    fn name(&self) -> &'static str {
        "view"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ClassSource<'_>, class: &mut Class) {
        if source.origin != ClassOrigin::View {
            return;
        }

        class.annotations.set(
            blocks::VIEW,
            Annotation::new()
                .with("Name", &source.object.name)
                .with("Schema", &source.object.schema),
        );
    }
}

/// Records the source user-defined table type
pub struct TableTypeAnnotator;

impl ClassAnnotator for TableTypeAnnotator {
    fn name(&self) -> &'static str {
        "table-type"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ClassSource<'_>, class: &mut Class) {
        if source.origin != ClassOrigin::TableType {
            return;
        }

        class.annotations.set(
            blocks::TABLE_TYPE,
            Annotation::new()
                .with("Name", &source.object.name)
                .with("Schema", &source.object.schema),
        );
    }
}

/// Records the procedure a response contract was synthesized from
pub struct ResultSetAnnotator;

impl ClassAnnotator for ResultSetAnnotator {
    fn name(&self) -> &'static str {
        "result-set"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ClassSource<'_>, class: &mut Class) {
        if source.origin != ClassOrigin::ResultSet {
            return;
        }

        class.annotations.set(
            blocks::RESULT_SET,
            Annotation::new().with("Procedure", source.object.object_name().fqn()),
        );
    }
}

/// Resolves the attribute type and records the source column
pub struct ColumnTypeAnnotator;

impl AttributeAnnotator for ColumnTypeAnnotator {
    fn name(&self) -> &'static str {
        "column-type"
    }

    fn annotate(&self, cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let column = source.column;

        match map_sql_type(&column.sql_type) {
            Some(ty) => {
                attribute.type_ref = TypeReference::semantic(ty, column.nullable);
            }
            None => {
                attribute.type_ref = TypeReference {
                    type_id: None,
                    is_nullable: column.nullable,
                    is_collection: false,
                };
                cx.warn(
                    DiagnosticCode::UnsupportedColumnType,
                    format!("{}.{}", source.owner.object_name(), column.name),
                    format!("Column type '{}' has no semantic mapping; attribute left untyped", column.sql_type),
                );
            }
        }

        attribute.annotations.set(
            blocks::COLUMN,
            Annotation::new().with("Name", &column.name).with(
                "Type",
                sql_type_spelling(&column.sql_type, column.max_length, column.precision, column.scale),
            ),
        );
    }
}

/// Flags primary key columns
pub struct PrimaryKeyAnnotator;

impl AttributeAnnotator for PrimaryKeyAnnotator {
    fn name(&self) -> &'static str {
        "primary-key"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let block = source
            .owner
            .is_primary_key_column(&source.column.name)
            .then(|| Annotation::new().with("Identity", source.column.is_identity));
        apply(&mut attribute.annotations, blocks::PRIMARY_KEY, block);
    }
}

/// Records text length and unicode-ness
pub struct TextConstraintsAnnotator;

impl AttributeAnnotator for TextConstraintsAnnotator {
    fn name(&self) -> &'static str {
        "text-constraints"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let block = text_constraints(&source.column.sql_type, source.column.max_length);
        apply(&mut attribute.annotations, blocks::TEXT_CONSTRAINTS, block);
    }
}

/// Records decimal precision and scale
pub struct DecimalConstraintsAnnotator;

impl AttributeAnnotator for DecimalConstraintsAnnotator {
    fn name(&self) -> &'static str {
        "decimal-constraints"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let column = source.column;
        let block = decimal_constraints(&column.sql_type, column.precision, column.scale);
        apply(&mut attribute.annotations, blocks::DECIMAL_CONSTRAINTS, block);
    }
}

/// Records column default values
pub struct DefaultValueAnnotator;

impl AttributeAnnotator for DefaultValueAnnotator {
    fn name(&self) -> &'static str {
        "default-value"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let block = source
            .column
            .default_value
            .as_ref()
            .map(|value| Annotation::new().with("Value", value));
        apply(&mut attribute.annotations, blocks::DEFAULT_CONSTRAINT, block);
    }
}

/// Records computed column definitions
pub struct ComputedValueAnnotator;

impl AttributeAnnotator for ComputedValueAnnotator {
    fn name(&self) -> &'static str {
        "computed-value"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let block = source.column.computed.as_ref().map(|computed| {
            Annotation::new()
                .with("Sql", &computed.sql)
                .with("Stored", computed.persisted)
        });
        apply(&mut attribute.annotations, blocks::COMPUTED_VALUE, block);
    }
}

/// Lists the indexes a column is a key column of
pub struct IndexMembershipAnnotator;

impl AttributeAnnotator for IndexMembershipAnnotator {
    fn name(&self) -> &'static str {
        "index-membership"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ColumnSource<'_>, attribute: &mut Attribute) {
        let mut names: Vec<&str> = source
            .indexes
            .iter()
            .filter(|index| index.key_columns().any(|c| c.eq_ignore_ascii_case(&source.column.name)))
            .map(|index| index.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();

        let block = (!names.is_empty()).then(|| Annotation::new().with("Names", names.join(",")));
        apply(&mut attribute.annotations, blocks::INDEX, block);
    }
}

/// Records index uniqueness and filter
pub struct IndexSettingsAnnotator;

impl IndexAnnotator for IndexSettingsAnnotator {
    fn name(&self) -> &'static str {
        "index-settings"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &IndexSource<'_>, index: &mut Index) {
        let mut block = Annotation::new()
            .with("Name", &source.index.name)
            .with("Unique", source.index.is_unique);
        if let Some(filter) = &source.index.filter {
            block = block.with("Filter", filter);
        }
        index.annotations.set(blocks::INDEX, block);
    }
}

/// Records the source procedure
pub struct StoredProcedureAnnotator;

impl ProcedureAnnotator for StoredProcedureAnnotator {
    fn name(&self) -> &'static str {
        "stored-procedure"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ProcedureDescriptor, procedure: &mut StoredProcedure) {
        procedure.annotations.set(
            blocks::STORED_PROCEDURE,
            Annotation::new()
                .with("Name", &source.name)
                .with("Schema", &source.schema),
        );
    }
}

/// Records parameter direction, SQL type and constraints
pub struct ParameterSettingsAnnotator;

impl ParameterAnnotator for ParameterSettingsAnnotator {
    fn name(&self) -> &'static str {
        "parameter-settings"
    }

    fn annotate(&self, _cx: &mut AnnotationContext<'_>, source: &ParameterSource<'_>, parameter: &mut Parameter) {
        let param = source.parameter;
        let sql_type = match &param.table_type {
            Some(table_type) => table_type.fqn(),
            None => sql_type_spelling(&param.sql_type, param.max_length, param.precision, param.scale),
        };

        parameter.annotations.set(
            blocks::PARAMETER,
            Annotation::new()
                .with("Name", &param.name)
                .with("Direction", if param.is_output { "Out" } else { "In" })
                .with("SqlType", sql_type),
        );

        apply(
            &mut parameter.annotations,
            blocks::TEXT_CONSTRAINTS,
            text_constraints(&param.sql_type, param.max_length),
        );
        apply(
            &mut parameter.annotations,
            blocks::DECIMAL_CONSTRAINTS,
            decimal_constraints(&param.sql_type, param.precision, param.scale),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsync_catalog::IndexColumnDescriptor;
    use modelsync_core::SemanticType;

    fn run_attribute(table: &TableDescriptor, column: &str, indexes: &[IndexDescriptor]) -> (Attribute, SyncReport) {
        let config = SyncConfig::default();
        let mut report = SyncReport::new("test");
        let mut attribute = Attribute::new(column);
        let source = ColumnSource {
            owner: table,
            column: table.find_column(column).unwrap(),
            indexes,
        };

        let registry = AnnotatorRegistry::with_defaults();
        let mut cx = AnnotationContext::new(&config, &mut report);
        registry.annotate_attribute(&mut cx, &source, &mut attribute);
        (attribute, report)
    }

    fn order_table() -> TableDescriptor {
        TableDescriptor::new("dbo", "Order")
            .column(ColumnDescriptor::new("OrderId", "int").identity())
            .column(ColumnDescriptor::new("Total", "decimal").not_null().with_precision(10, 2))
            .column(ColumnDescriptor::new("Notes", "nvarchar").with_length(-1).with_default("('')"))
            .column(ColumnDescriptor::new("Location", "geography"))
            .column(ColumnDescriptor::new("Gross", "money").with_computed("[Total]*1.2", true))
            .primary_key(["OrderId"])
    }

    #[test]
    fn decimal_columns_get_precision_and_scale() {
        let (attribute, report) = run_attribute(&order_table(), "Total", &[]);

        assert_eq!(attribute.type_ref, TypeReference::semantic(SemanticType::Decimal, false));
        assert_eq!(attribute.annotations.property(blocks::DECIMAL_CONSTRAINTS, "Precision"), Some("10"));
        assert_eq!(attribute.annotations.property(blocks::DECIMAL_CONSTRAINTS, "Scale"), Some("2"));
        assert_eq!(attribute.annotations.property(blocks::COLUMN, "Type"), Some("decimal(10,2)"));
        assert!(!attribute.annotations.contains(blocks::PRIMARY_KEY));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn primary_key_identity_column() {
        let (attribute, _) = run_attribute(&order_table(), "OrderId", &[]);
        assert_eq!(attribute.annotations.property(blocks::PRIMARY_KEY, "Identity"), Some("true"));
        assert!(!attribute.is_nullable());
    }

    #[test]
    fn text_defaults_and_computed_values() {
        let (notes, _) = run_attribute(&order_table(), "Notes", &[]);
        assert_eq!(notes.annotations.property(blocks::TEXT_CONSTRAINTS, "MaxLength"), Some("max"));
        assert_eq!(notes.annotations.property(blocks::TEXT_CONSTRAINTS, "IsUnicode"), Some("true"));
        assert_eq!(notes.annotations.property(blocks::DEFAULT_CONSTRAINT, "Value"), Some("('')"));

        let (gross, _) = run_attribute(&order_table(), "Gross", &[]);
        assert_eq!(gross.annotations.property(blocks::COMPUTED_VALUE, "Stored"), Some("true"));
        assert!(!gross.annotations.contains(blocks::DECIMAL_CONSTRAINTS));
    }

    #[test]
    fn unknown_type_leaves_attribute_untyped() {
        let (attribute, report) = run_attribute(&order_table(), "Location", &[]);

        assert!(!attribute.type_ref.is_typed());
        assert!(attribute.type_ref.is_nullable);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].code, DiagnosticCode::UnsupportedColumnType);
        assert_eq!(report.diagnostics[0].object.as_deref(), Some("dbo.Order.Location"));
    }

    #[test]
    fn index_membership_is_sorted() {
        let indexes = vec![
            IndexDescriptor::new("IX_Z").column(IndexColumnDescriptor::key("Total")),
            IndexDescriptor::new("IX_A").column(IndexColumnDescriptor::key("Total")),
            IndexDescriptor::new("IX_Inc")
                .column(IndexColumnDescriptor::key("OrderId"))
                .column(IndexColumnDescriptor::included("Total")),
        ];
        let (attribute, _) = run_attribute(&order_table(), "Total", &indexes);
        assert_eq!(attribute.annotations.property(blocks::INDEX, "Names"), Some("IX_A,IX_Z"));
    }

    #[test]
    fn annotating_twice_is_a_no_op() {
        let table = order_table();
        let config = SyncConfig::default();
        let mut report = SyncReport::new("test");
        let registry = AnnotatorRegistry::with_defaults();
        let source = ColumnSource { owner: &table, column: table.find_column("Total").unwrap(), indexes: &[] };

        let mut attribute = Attribute::new("Total");
        attribute.annotations.set("Custom", Annotation::new().with("Keep", "me"));

        let mut cx = AnnotationContext::new(&config, &mut report);
        registry.annotate_attribute(&mut cx, &source, &mut attribute);
        let first = attribute.clone();
        registry.annotate_attribute(&mut cx, &source, &mut attribute);

        assert_eq!(attribute, first);
        assert_eq!(attribute.annotations.property("Custom", "Keep"), Some("me"));
    }

    #[test]
    fn stale_blocks_are_removed() {
        let table = order_table();
        let (mut attribute, _) = run_attribute(&table, "OrderId", &[]);
        assert!(attribute.annotations.contains(blocks::PRIMARY_KEY));

        let mut changed = table.clone();
        changed.primary_key.clear();
        let config = SyncConfig::default();
        let mut report = SyncReport::new("test");
        let source = ColumnSource { owner: &changed, column: changed.find_column("OrderId").unwrap(), indexes: &[] };
        let mut cx = AnnotationContext::new(&config, &mut report);
        AnnotatorRegistry::with_defaults().annotate_attribute(&mut cx, &source, &mut attribute);

        assert!(!attribute.annotations.contains(blocks::PRIMARY_KEY));
    }

    #[test]
    fn table_annotation_policy() {
        let table = TableDescriptor::new("dbo", "Customers");
        let source = ClassSource { origin: ClassOrigin::Table, object: &table };
        let mut report = SyncReport::new("test");

        let mut class = Class::new(modelsync_core::ClassKind::Table, "Customers");
        let config = SyncConfig::default();
        let mut cx = AnnotationContext::new(&config, &mut report);
        TableAnnotator.annotate(&mut cx, &source, &mut class);
        assert!(!class.annotations.contains(blocks::TABLE));

        class.name = "Customer".to_string();
        TableAnnotator.annotate(&mut cx, &source, &mut class);
        assert_eq!(class.annotations.property(blocks::TABLE, "Name"), Some("Customers"));

        let always = SyncConfig {
            table_annotation: TableAnnotationPolicy::Always,
            ..SyncConfig::default()
        };
        let mut class = Class::new(modelsync_core::ClassKind::Table, "Customers");
        let mut cx = AnnotationContext::new(&always, &mut report);
        TableAnnotator.annotate(&mut cx, &source, &mut class);
        assert_eq!(class.annotations.property(blocks::TABLE, "Schema"), Some("dbo"));
    }

    #[test]
    fn default_registry_names() {
        let names = AnnotatorRegistry::with_defaults().names();
        assert_eq!(names.first(), Some(&"database-type"));
        assert!(names.contains(&"index-membership"));
        assert!(AnnotatorRegistry::empty().names().is_empty());
    }
}
