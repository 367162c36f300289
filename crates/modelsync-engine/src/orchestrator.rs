//! Sync orchestration
//!
//! One run reads the whole catalog first, analyzes class name conflicts, then
//! reconciles the graph stage by stage:
//!
//! 1. root annotation and import settings
//! 2. tables, their attributes and annotations
//! 3. associations for every foreign key
//! 4. non-clustered indexes
//! 5. views
//! 6. user-defined table types as data contracts
//! 7. stored procedures, parameters and return types
//!
//! The run works on a graph it owns and only hands it back on success, so a
//! fatal error never leaves a half-reconciled graph behind.

use crate::annotators::{
    AnnotationContext, AnnotatorRegistry, ClassOrigin, ClassSource, ColumnSource, IndexSource,
    ParameterSource,
};
use crate::associations::{AssociationSynthesizer, Synthesis};
use crate::conflicts::{self, ConflictMap};
use crate::dedup::{
    attribute_scope, class_scope, index_scope, parameter_scope, procedure_scope, NameRegistry,
    MODEL_SCOPE,
};
use crate::error::SyncError;
use crate::identity::{ExternalRef, Identity};
use crate::naming::{entity_name, normalize, NameKind};
use crate::reconcile::{self, Claims, Outcome};
use modelsync_catalog::{
    map_sql_type, CatalogError, CatalogReader, ColumnDescriptor, ForeignKeyDescriptor,
    IndexDescriptor, ObjectName, ParameterDescriptor, ProcedureDescriptor, ResultColumn,
    TableDescriptor,
};
use modelsync_core::{
    Class, ClassKind, DiagnosticCode, IndexColumn, ModelGraph, SyncConfig, SyncReport,
    TypeReference,
};
use std::collections::HashSet;

/// Graph metadata keys recording the import settings
pub mod metadata {
    pub const ENTITY_NAMING: &str = "import.entity-naming";
    pub const TABLE_ANNOTATION: &str = "import.table-annotation";
    pub const SCHEMAS: &str = "import.schemas";

    /// Class metadata flag set on classes whose name collides across schemas
    pub const SCHEMA_CONFLICT: &str = "schema-conflict";
}

/// Appended to a procedure name to name its synthesized result contract
pub const RESPONSE_SUFFIX: &str = "Response";

/// Result of a successful run
#[derive(Debug)]
pub struct SyncOutcome {
    pub graph: ModelGraph,
    pub report: SyncReport,
}

struct TableScan {
    table: TableDescriptor,
    foreign_keys: Vec<ForeignKeyDescriptor>,
    indexes: Vec<IndexDescriptor>,
}

struct ProcedureScan {
    procedure: ProcedureDescriptor,
    result_set: Result<Vec<ResultColumn>, CatalogError>,
}

/// Everything read from the catalog, before the graph is touched
#[derive(Default)]
struct CatalogScan {
    tables: Vec<TableScan>,
    views: Vec<TableDescriptor>,
    table_types: Vec<TableDescriptor>,
    procedures: Vec<ProcedureScan>,
}

impl CatalogScan {
    /// External reference of every node this scan can produce
    fn external_refs(&self) -> Vec<ExternalRef> {
        fn object_refs(refs: &mut Vec<ExternalRef>, object_ref: ExternalRef, owner: &TableDescriptor) {
            refs.push(ExternalRef::folder(&owner.schema));
            refs.push(object_ref);
            refs.extend(
                owner
                    .columns
                    .iter()
                    .map(|c| ExternalRef::column(&owner.schema, &owner.name, &c.name)),
            );
        }

        let mut refs = Vec::new();
        for scan in &self.tables {
            let table = &scan.table;
            object_refs(&mut refs, ExternalRef::table(&table.schema, &table.name), table);
            refs.extend(
                scan.indexes
                    .iter()
                    .map(|i| ExternalRef::index(&table.schema, &table.name, &i.name)),
            );
        }
        for view in &self.views {
            object_refs(&mut refs, ExternalRef::table(&view.schema, &view.name), view);
        }
        for table_type in &self.table_types {
            object_refs(&mut refs, ExternalRef::table_type(&table_type.schema, &table_type.name), table_type);
        }
        for scan in &self.procedures {
            let procedure = &scan.procedure;
            refs.push(ExternalRef::folder(&procedure.schema));
            refs.push(ExternalRef::procedure(&procedure.schema, &procedure.name));
            refs.extend(
                procedure
                    .parameters
                    .iter()
                    .map(|p| ExternalRef::parameter(&procedure.schema, &procedure.name, &p.name)),
            );
            if let Ok(columns) = &scan.result_set {
                refs.push(ExternalRef::response(&procedure.schema, &procedure.name));
                refs.extend(
                    columns
                        .iter()
                        .map(|c| ExternalRef::column(&procedure.schema, &procedure.name, &c.name)),
                );
            }
        }
        refs
    }
}

/// Per-run state
struct SyncContext<'a> {
    config: &'a SyncConfig,
    names: NameRegistry,
    claims: Claims,
    conflicts: ConflictMap,
    report: SyncReport,
}

impl<'a> SyncContext<'a> {
    fn annotation(&mut self) -> AnnotationContext<'_> {
        AnnotationContext::new(self.config, &mut self.report)
    }

    /// Unique class name; schema-conflicting classes share one model-wide scope
    fn class_name(&mut self, schema: &str, base: &str, schema_conflict: bool) -> String {
        let (scope, other) = if schema_conflict {
            (MODEL_SCOPE.to_string(), class_scope(schema))
        } else {
            (class_scope(schema), MODEL_SCOPE.to_string())
        };
        let name = self.names.dedupe(base, &scope);
        self.names.reserve(&name, &other);
        name
    }
}

/// What one class should be reconciled from
struct ClassSpec<'s> {
    kind: ClassKind,
    origin: ClassOrigin,
    identity: Identity,
    /// Suppresses name-only matching
    schema_conflict: bool,
    object: &'s TableDescriptor,
    indexes: &'s [IndexDescriptor],
}

fn tally(outcome: Outcome, created: &mut usize, updated: &mut usize) {
    match outcome {
        Outcome::Created => *created += 1,
        Outcome::Updated => *updated += 1,
        Outcome::Unchanged => {}
    }
}

fn sort_objects<T>(items: &mut [T], key: impl Fn(&T) -> (&str, &str)) {
    items.sort_by_cached_key(|item| {
        let (schema, name) = key(item);
        (schema.to_lowercase(), name.to_lowercase())
    });
}

/// Reconciles a catalog into a model graph
pub struct Synchronizer {
    config: SyncConfig,
    annotators: AnnotatorRegistry,
}

impl Synchronizer {
    /// Synchronizer with the default annotators
    pub fn new(config: SyncConfig) -> Self {
        Self::with_annotators(config, AnnotatorRegistry::with_defaults())
    }

    pub fn with_annotators(config: SyncConfig, annotators: AnnotatorRegistry) -> Self {
        Self { config, annotators }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one sync of `catalog` into `graph`
    pub fn run(&self, catalog: &dyn CatalogReader, graph: ModelGraph) -> Result<SyncOutcome, SyncError> {
        let mut graph = graph;
        tracing::info!(catalog = catalog.name(), graph = %graph.name, "Starting sync");

        let scan = self.scan(catalog)?;

        let mut objects: Vec<ObjectName> = scan.tables.iter().map(|t| t.table.object_name()).collect();
        objects.extend(scan.views.iter().map(TableDescriptor::object_name));
        let conflicts = conflicts::analyze(&objects, self.config.entity_naming)?;
        if !conflicts.is_empty() {
            tracing::info!(objects = conflicts.len(), "Class name conflicts detected");
        }

        let mut cx = SyncContext {
            config: &self.config,
            names: NameRegistry::new(),
            claims: Claims::reserving(scan.external_refs()),
            conflicts,
            report: SyncReport::new(catalog.name()),
        };

        self.apply_root(&mut cx, &mut graph);
        self.sync_tables(&mut cx, &mut graph, &scan)?;
        self.sync_associations(&mut cx, &mut graph, &scan);
        self.sync_indexes(&mut cx, &mut graph, &scan);
        self.sync_views(&mut cx, &mut graph, &scan)?;
        self.sync_table_types(&mut cx, &mut graph, &scan)?;
        self.sync_procedures(&mut cx, &mut graph, &scan)?;

        let summary = &cx.report.summary;
        tracing::info!(
            classes_created = summary.classes_created,
            classes_updated = summary.classes_updated,
            associations_created = summary.associations_created,
            warnings = summary.warnings,
            "Sync complete"
        );

        Ok(SyncOutcome { graph, report: cx.report })
    }

    /// Read every exported object, so nothing is written before the catalog is fully known
    fn scan(&self, catalog: &dyn CatalogReader) -> Result<CatalogScan, SyncError> {
        let export = &self.config.export;
        let filter = &self.config.filter;
        let schemas = &filter.schemas;
        let included = |schema: &str, name: &str| filter.includes_object(schema, name);

        let mut scan = CatalogScan::default();

        if export.tables {
            let mut tables = catalog.list_tables(schemas)?;
            tables.retain(|t| included(&t.schema, &t.name));
            sort_objects(&mut tables, |t| (t.schema.as_str(), t.name.as_str()));

            for table in tables {
                let name = table.object_name();
                let foreign_keys = if export.foreign_keys {
                    catalog.list_foreign_keys(&name)?
                } else {
                    Vec::new()
                };
                let indexes = if export.indexes {
                    surfaced_indexes(&table, catalog.list_indexes(&name)?, &foreign_keys)
                } else {
                    Vec::new()
                };
                scan.tables.push(TableScan { table, foreign_keys, indexes });
            }
        }

        if export.views {
            scan.views = catalog.list_views(schemas)?;
            scan.views.retain(|v| included(&v.schema, &v.name));
            sort_objects(&mut scan.views, |v| (v.schema.as_str(), v.name.as_str()));
        }

        if export.table_types {
            scan.table_types = catalog.list_table_types(schemas)?;
            scan.table_types.retain(|t| included(&t.schema, &t.name));
            sort_objects(&mut scan.table_types, |t| (t.schema.as_str(), t.name.as_str()));
        }

        if export.stored_procedures {
            let mut procedures = catalog.list_stored_procedures(schemas)?;
            procedures.retain(|p| included(&p.schema, &p.name));
            sort_objects(&mut procedures, |p| (p.schema.as_str(), p.name.as_str()));

            for procedure in procedures {
                let result_set = catalog.describe_result_set(&procedure.object_name());
                scan.procedures.push(ProcedureScan { procedure, result_set });
            }
        }

        tracing::info!(
            tables = scan.tables.len(),
            views = scan.views.len(),
            table_types = scan.table_types.len(),
            procedures = scan.procedures.len(),
            "Catalog scanned"
        );

        Ok(scan)
    }

    fn apply_root(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph) {
        self.annotators.annotate_graph(&mut cx.annotation(), graph);

        let schemas = if self.config.filter.schemas.is_empty() {
            "*".to_string()
        } else {
            self.config.filter.schemas.join(",")
        };
        let settings = [
            (metadata::ENTITY_NAMING, self.config.entity_naming.to_string()),
            (metadata::TABLE_ANNOTATION, self.config.table_annotation.to_string()),
            (metadata::SCHEMAS, schemas),
        ];
        for (key, value) in settings {
            graph.metadata.insert(key.to_string(), value);
        }
    }

    /// Convention name and fallback eligibility for a table or view
    fn table_spec<'s>(
        &self,
        cx: &mut SyncContext<'_>,
        kind: ClassKind,
        origin: ClassOrigin,
        object: &'s TableDescriptor,
        indexes: &'s [IndexDescriptor],
    ) -> ClassSpec<'s> {
        let external_ref = ExternalRef::table(&object.schema, &object.name);
        let conflict = cx.conflicts.get(&external_ref).cloned().unwrap_or_default();

        let base = conflict
            .raw_name
            .unwrap_or_else(|| entity_name(&object.name, NameKind::Table, self.config.entity_naming));
        let name = cx.class_name(&object.schema, &base, conflict.different_schema);

        ClassSpec {
            kind,
            origin,
            identity: Identity::new(external_ref, name),
            schema_conflict: conflict.different_schema,
            object,
            indexes,
        }
    }

    /// Reconcile one class and its attributes, returning its position
    fn reconcile_class(
        &self,
        cx: &mut SyncContext<'_>,
        graph: &mut ModelGraph,
        spec: ClassSpec<'_>,
    ) -> Result<usize, SyncError> {
        let folder = reconcile::reconcile_folder(graph, &spec.object.schema, &mut cx.claims);
        let folder_id = graph.folders[folder.index].id.clone();

        let slot = reconcile::reconcile_class(
            graph,
            spec.kind,
            &spec.identity,
            Some(folder_id.as_str()),
            !spec.schema_conflict,
            &mut cx.claims,
        )?;

        let class = &mut graph.classes[slot.index];
        if spec.schema_conflict {
            class
                .metadata
                .insert(metadata::SCHEMA_CONFLICT.to_string(), "true".to_string());
        } else {
            class.metadata.remove(metadata::SCHEMA_CONFLICT);
        }
        let source = ClassSource { origin: spec.origin, object: spec.object };
        self.annotators.annotate_class(&mut cx.annotation(), &source, class);

        let summary = &mut cx.report.summary;
        tally(slot.outcome(class), &mut summary.classes_created, &mut summary.classes_updated);

        self.reconcile_attributes(cx, class, &spec.identity.external_ref, spec.object, spec.indexes);
        Ok(slot.index)
    }

    fn reconcile_attributes(
        &self,
        cx: &mut SyncContext<'_>,
        class: &mut Class,
        class_ref: &ExternalRef,
        owner: &TableDescriptor,
        indexes: &[IndexDescriptor],
    ) {
        let scope = attribute_scope(class_ref.as_str());

        for column in &owner.columns {
            let name = normalize(&column.name, NameKind::Column, Some(class.name.as_str()));
            let name = cx.names.dedupe(&name, &scope);
            let identity = Identity::new(ExternalRef::column(&owner.schema, &owner.name, &column.name), name);

            let slot = reconcile::reconcile_attribute(class, &identity, &mut cx.claims);
            let attribute = &mut class.attributes[slot.index];
            let source = ColumnSource { owner, column, indexes };
            self.annotators.annotate_attribute(&mut cx.annotation(), &source, attribute);

            let summary = &mut cx.report.summary;
            tally(slot.outcome(attribute), &mut summary.attributes_created, &mut summary.attributes_updated);
        }
    }

    fn sync_tables(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph, scan: &CatalogScan) -> Result<(), SyncError> {
        for table_scan in &scan.tables {
            let spec = self.table_spec(cx, ClassKind::Table, ClassOrigin::Table, &table_scan.table, &table_scan.indexes);
            self.reconcile_class(cx, graph, spec)?;
        }

        tracing::info!(tables = scan.tables.len(), "Tables reconciled");
        Ok(())
    }

    fn sync_associations(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph, scan: &CatalogScan) {
        if !self.config.export.foreign_keys {
            return;
        }

        let keys: HashSet<ExternalRef> = scan
            .tables
            .iter()
            .flat_map(|t| {
                t.foreign_keys
                    .iter()
                    .map(|fk| ExternalRef::foreign_key(&t.table.schema, &t.table.name, &fk.name))
            })
            .collect();
        let synthesizer = AssociationSynthesizer::new(&keys);

        for table_scan in &scan.tables {
            for foreign_key in &table_scan.foreign_keys {
                let mut annotation = AnnotationContext::new(cx.config, &mut cx.report);
                let result =
                    synthesizer.synthesize(&mut annotation, graph, &mut cx.claims, &table_scan.table, foreign_key);

                let summary = &mut cx.report.summary;
                match result {
                    Synthesis::Created(_) => summary.associations_created += 1,
                    Synthesis::Reused(_) | Synthesis::Mirrored(_) => summary.associations_reused += 1,
                    Synthesis::Skipped => summary.foreign_keys_skipped += 1,
                }
            }
        }

        tracing::info!(foreign_keys = keys.len(), "Associations reconciled");
    }

    fn sync_indexes(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph, scan: &CatalogScan) {
        if !self.config.export.indexes {
            return;
        }

        for table_scan in &scan.tables {
            let table = &table_scan.table;
            let class_ref = ExternalRef::table(&table.schema, &table.name);
            let Some(class) = graph
                .classes
                .iter_mut()
                .find(|c| modelsync_core::ref_matches(&c.external_ref, class_ref.as_str()))
            else {
                continue;
            };

            for index in &table_scan.indexes {
                self.reconcile_index(cx, class, &class_ref, table, index);
            }
        }

        tracing::info!("Indexes reconciled");
    }

    fn reconcile_index(
        &self,
        cx: &mut SyncContext<'_>,
        class: &mut Class,
        class_ref: &ExternalRef,
        table: &TableDescriptor,
        index: &IndexDescriptor,
    ) {
        let mut attribute_ids = Vec::with_capacity(index.columns.len());
        for column in &index.columns {
            let column_ref = ExternalRef::column(&table.schema, &table.name, &column.name);
            match class.attribute_by_ref(column_ref.as_str()) {
                Some(attribute) => attribute_ids.push((attribute.id.clone(), attribute.name.clone())),
                None => {
                    cx.annotation().warn(
                        DiagnosticCode::IndexColumnUnmapped,
                        format!("{}.{}", table.object_name(), index.name),
                        format!("Index column '{}' has no attribute", column.name),
                    );
                    return;
                }
            }
        }

        let name = normalize(&index.name, NameKind::Index, None);
        let name = cx.names.dedupe(&name, &index_scope(class_ref.as_str()));
        let identity = Identity::new(ExternalRef::index(&table.schema, &table.name, &index.name), name);

        let slot = reconcile::reconcile_index(class, &identity, &mut cx.claims);
        let node = &mut class.indexes[slot.index];

        let columns: Vec<IndexColumn> = index
            .columns
            .iter()
            .zip(attribute_ids)
            .map(|(column, (attribute_id, attribute_name))| {
                let id = node
                    .columns
                    .iter()
                    .find(|c| c.attribute_id == attribute_id)
                    .map(|c| c.id.clone())
                    .unwrap_or_else(modelsync_core::new_node_id);
                IndexColumn {
                    id,
                    name: attribute_name,
                    attribute_id,
                    descending: column.descending,
                    included: column.included,
                }
            })
            .collect();
        if node.columns != columns {
            node.columns = columns;
        }

        let source = IndexSource { owner: table, index };
        self.annotators.annotate_index(&mut cx.annotation(), &source, node);

        let summary = &mut cx.report.summary;
        tally(slot.outcome(node), &mut summary.indexes_created, &mut summary.indexes_updated);
    }

    fn sync_views(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph, scan: &CatalogScan) -> Result<(), SyncError> {
        for view in &scan.views {
            let spec = self.table_spec(cx, ClassKind::View, ClassOrigin::View, view, &[]);
            self.reconcile_class(cx, graph, spec)?;
        }

        tracing::info!(views = scan.views.len(), "Views reconciled");
        Ok(())
    }

    fn sync_table_types(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph, scan: &CatalogScan) -> Result<(), SyncError> {
        for table_type in &scan.table_types {
            let name = normalize(&table_type.name, NameKind::TableType, None);
            let name = cx.class_name(&table_type.schema, &name, false);
            let spec = ClassSpec {
                kind: ClassKind::DataContract,
                origin: ClassOrigin::TableType,
                identity: Identity::new(ExternalRef::table_type(&table_type.schema, &table_type.name), name),
                schema_conflict: false,
                object: table_type,
                indexes: &[],
            };
            self.reconcile_class(cx, graph, spec)?;
        }

        tracing::info!(table_types = scan.table_types.len(), "Table types reconciled");
        Ok(())
    }

    fn sync_procedures(&self, cx: &mut SyncContext<'_>, graph: &mut ModelGraph, scan: &CatalogScan) -> Result<(), SyncError> {
        for procedure_scan in &scan.procedures {
            self.reconcile_procedure(cx, graph, procedure_scan)?;
        }

        tracing::info!(procedures = scan.procedures.len(), "Stored procedures reconciled");
        Ok(())
    }

    fn reconcile_procedure(
        &self,
        cx: &mut SyncContext<'_>,
        graph: &mut ModelGraph,
        scan: &ProcedureScan,
    ) -> Result<(), SyncError> {
        let procedure = &scan.procedure;
        let procedure_ref = ExternalRef::procedure(&procedure.schema, &procedure.name);

        let folder = reconcile::reconcile_folder(graph, &procedure.schema, &mut cx.claims);
        let folder_id = graph.folders[folder.index].id.clone();

        let name = normalize(&procedure.name, NameKind::Procedure, None);
        let name = cx.names.dedupe(&name, &procedure_scope(&procedure.schema));
        let identity = Identity::new(procedure_ref.clone(), name);
        let slot = reconcile::reconcile_procedure(graph, &identity, Some(folder_id.as_str()), &mut cx.claims);

        let parameter_types: Vec<TypeReference> = procedure
            .parameters
            .iter()
            .map(|parameter| self.parameter_type(cx, graph, procedure, parameter))
            .collect();
        let return_type = self.return_type(cx, graph, scan, &identity.name)?;

        let node = &mut graph.procedures[slot.index];
        let scope = parameter_scope(procedure_ref.as_str());
        for (parameter, type_ref) in procedure.parameters.iter().zip(parameter_types) {
            let name = normalize(&parameter.name, NameKind::Parameter, Some(node.name.as_str()));
            let name = cx.names.dedupe(&name, &scope);
            let identity = Identity::new(
                ExternalRef::parameter(&procedure.schema, &procedure.name, &parameter.name),
                name,
            );

            let parameter_slot = reconcile::reconcile_parameter(node, &identity, &mut cx.claims);
            let target = &mut node.parameters[parameter_slot.index];
            if target.type_ref != type_ref {
                target.type_ref = type_ref;
            }
            let source = ParameterSource { procedure, parameter };
            self.annotators.annotate_parameter(&mut cx.annotation(), &source, target);
        }

        if node.return_type != return_type {
            node.return_type = return_type;
        }
        self.annotators.annotate_procedure(&mut cx.annotation(), procedure, node);

        let summary = &mut cx.report.summary;
        tally(slot.outcome(node), &mut summary.procedures_created, &mut summary.procedures_updated);
        Ok(())
    }

    fn parameter_type(
        &self,
        cx: &mut SyncContext<'_>,
        graph: &ModelGraph,
        procedure: &ProcedureDescriptor,
        parameter: &ParameterDescriptor,
    ) -> TypeReference {
        let object = format!("{}.{}", procedure.object_name(), parameter.name);

        if let Some(table_type) = &parameter.table_type {
            let type_ref = ExternalRef::table_type(&table_type.schema, &table_type.name);
            return match graph.class_by_ref(type_ref.as_str()) {
                Some(contract) => TypeReference::class(&contract.id, false, true),
                None => {
                    cx.annotation().warn(
                        DiagnosticCode::ProcedureParameterUnresolved,
                        object,
                        format!("Table type {} is not in the model", table_type),
                    );
                    TypeReference::default()
                }
            };
        }

        match map_sql_type(&parameter.sql_type) {
            Some(ty) => TypeReference::semantic(ty, false),
            None => {
                cx.annotation().warn(
                    DiagnosticCode::UnsupportedColumnType,
                    object,
                    format!("Parameter type '{}' has no semantic mapping; parameter left untyped", parameter.sql_type),
                );
                TypeReference::default()
            }
        }
    }

    /// Return type from the first result set
    ///
    /// A result set tracing entirely to one known table returns that class; any
    /// other shape gets its own response contract.
    fn return_type(
        &self,
        cx: &mut SyncContext<'_>,
        graph: &mut ModelGraph,
        scan: &ProcedureScan,
        procedure_name: &str,
    ) -> Result<Option<TypeReference>, SyncError> {
        let procedure = &scan.procedure;
        let columns = match &scan.result_set {
            Ok(columns) => columns,
            Err(err) => {
                cx.annotation().warn(
                    DiagnosticCode::ResultSetUnavailable,
                    procedure.object_name().fqn(),
                    format!("No return type inferred: {}", err),
                );
                return Ok(None);
            }
        };

        if columns.is_empty() {
            return Ok(None);
        }

        if let Some(class) = single_source_class(graph, columns) {
            return Ok(Some(TypeReference::class(&class.id, false, true)));
        }

        let shape = TableDescriptor {
            schema: procedure.schema.clone(),
            name: procedure.name.clone(),
            columns: columns.iter().map(ResultColumn::to_column).collect::<Vec<ColumnDescriptor>>(),
            primary_key: Vec::new(),
        };
        let name = format!("{}{}", procedure_name, RESPONSE_SUFFIX);
        let name = cx.class_name(&procedure.schema, &name, false);
        let spec = ClassSpec {
            kind: ClassKind::DataContract,
            origin: ClassOrigin::ResultSet,
            identity: Identity::new(ExternalRef::response(&procedure.schema, &procedure.name), name),
            schema_conflict: false,
            object: &shape,
            indexes: &[],
        };
        let index = self.reconcile_class(cx, graph, spec)?;

        Ok(Some(TypeReference::class(&graph.classes[index].id, false, true)))
    }
}

/// Table or view class every result column traces back to, if there is exactly one
fn single_source_class<'g>(graph: &'g ModelGraph, columns: &[ResultColumn]) -> Option<&'g Class> {
    let first = columns.first()?.source_table.as_ref()?;
    let all_same = columns.iter().all(|c| {
        c.source_table
            .as_ref()
            .is_some_and(|t| t.matches(&first.schema, &first.name))
    });
    if !all_same {
        return None;
    }

    graph
        .class_by_ref(ExternalRef::table(&first.schema, &first.name).as_str())
        .filter(|class| matches!(class.kind, ClassKind::Table | ClassKind::View))
}

/// Indexes the model shows for `table`
///
/// Clustered and primary key indexes are implied by the class itself, and an
/// index that only restates a foreign key is implied by its association.
fn surfaced_indexes(
    table: &TableDescriptor,
    indexes: Vec<IndexDescriptor>,
    foreign_keys: &[ForeignKeyDescriptor],
) -> Vec<IndexDescriptor> {
    indexes
        .into_iter()
        .filter(|index| {
            if index.is_clustered || index.is_primary_key {
                return false;
            }
            if duplicates_foreign_key(index, foreign_keys) {
                tracing::debug!(table = %table.object_name(), index = %index.name, "Skipping foreign key index");
                return false;
            }
            true
        })
        .collect()
}

/// An index that only restates a foreign key of its table
fn duplicates_foreign_key(index: &IndexDescriptor, foreign_keys: &[ForeignKeyDescriptor]) -> bool {
    if index.is_unique || index.filter.is_some() || index.columns.iter().any(|c| c.included) {
        return false;
    }

    foreign_keys.iter().any(|fk| {
        fk.columns.len() == index.columns.len()
            && fk
                .columns
                .iter()
                .zip(index.key_columns())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsync_catalog::IndexColumnDescriptor;

    #[test]
    fn foreign_key_index_detection() {
        let fk = ForeignKeyDescriptor::new("FK_Order_Customer", ["CustomerId"], ObjectName::new("dbo", "Customer"));
        let plain = IndexDescriptor::new("IX_Order_CustomerId").column(IndexColumnDescriptor::key("customerid"));
        let unique = plain.clone().unique();
        let covering = plain.clone().column(IndexColumnDescriptor::included("Total"));
        let other = IndexDescriptor::new("IX_Order_Date").column(IndexColumnDescriptor::key("OrderDate"));

        assert!(duplicates_foreign_key(&plain, std::slice::from_ref(&fk)));
        assert!(!duplicates_foreign_key(&unique, std::slice::from_ref(&fk)));
        assert!(!duplicates_foreign_key(&covering, std::slice::from_ref(&fk)));
        assert!(!duplicates_foreign_key(&other, std::slice::from_ref(&fk)));
        assert!(!duplicates_foreign_key(&plain, &[]));
    }

    #[test]
    fn surfaced_indexes_drop_implied_ones() {
        let table = TableDescriptor::new("dbo", "Order")
            .column(ColumnDescriptor::new("OrderId", "int").identity())
            .column(ColumnDescriptor::new("CustomerId", "int"))
            .column(ColumnDescriptor::new("PlacedAt", "datetime2"));
        let fk = ForeignKeyDescriptor::new("FK_Order_Customer", ["CustomerId"], ObjectName::new("dbo", "Customer"));
        let indexes = vec![
            IndexDescriptor {
                is_primary_key: true,
                ..IndexDescriptor::new("PK_Order").column(IndexColumnDescriptor::key("OrderId"))
            },
            IndexDescriptor::new("CIX_Order_PlacedAt").clustered().column(IndexColumnDescriptor::key("PlacedAt")),
            IndexDescriptor::new("IX_Order_CustomerId").column(IndexColumnDescriptor::key("CustomerId")),
            IndexDescriptor::new("IX_Order_PlacedAt").column(IndexColumnDescriptor::key("PlacedAt")),
        ];

        let kept = surfaced_indexes(&table, indexes.clone(), std::slice::from_ref(&fk));
        let names: Vec<_> = kept.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["IX_Order_PlacedAt"]);

        let kept = surfaced_indexes(&table, indexes, &[]);
        let names: Vec<_> = kept.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["IX_Order_CustomerId", "IX_Order_PlacedAt"]);
    }

    #[test]
    fn single_source_requires_one_known_table() {
        let mut graph = ModelGraph::new("Test");
        let mut class = Class::new(ClassKind::Table, "Order");
        class.external_ref = Some("dbo.order".to_string());
        graph.classes.push(class);

        let order = ObjectName::new("dbo", "Order");
        let from_order = vec![
            ResultColumn::new("OrderId", "int").from_table(order.clone()),
            ResultColumn::new("Total", "decimal").from_table(ObjectName::new("DBO", "ORDER")),
        ];
        assert_eq!(single_source_class(&graph, &from_order).map(|c| c.name.as_str()), Some("Order"));

        let mixed = vec![
            ResultColumn::new("OrderId", "int").from_table(order),
            ResultColumn::new("Name", "nvarchar").from_table(ObjectName::new("dbo", "Customer")),
        ];
        assert!(single_source_class(&graph, &mixed).is_none());

        let computed = vec![ResultColumn::new("Total", "decimal")];
        assert!(single_source_class(&graph, &computed).is_none());
    }

    #[test]
    fn class_names_share_scopes_both_ways() {
        let config = SyncConfig::default();
        let mut cx = SyncContext {
            config: &config,
            names: NameRegistry::new(),
            claims: Claims::new(),
            conflicts: ConflictMap::default(),
            report: SyncReport::new("test"),
        };

        assert_eq!(cx.class_name("billing", "Order", true), "Order");
        assert_eq!(cx.class_name("sales", "Order", true), "Order1");
        // billing already holds "Order" through the model-wide claim
        assert_eq!(cx.class_name("billing", "Order", false), "Order1");
        assert_eq!(cx.class_name("hr", "Employee", false), "Employee");
        assert_eq!(cx.class_name("ops", "Employee", true), "Employee2");
    }
}
