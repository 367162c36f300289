//! Foreign key to association synthesis
//!
//! Each foreign key becomes one directed association: the source end sits on
//! the referencing class, the target end on the referenced class. A foreign
//! key that cannot be mapped completely is skipped with a warning; no partial
//! association is ever written.

use crate::annotators::{blocks, AnnotationContext};
use crate::identity::{association_by_ref, ExternalRef};
use crate::naming::{entity_name, normalize, NameKind};
use crate::reconcile::Claims;
use modelsync_catalog::{ForeignKeyDescriptor, TableDescriptor};
use modelsync_core::{
    new_node_id, Annotation, Association, AssociationEnd, DiagnosticCode, EntityNaming, ModelGraph,
    NodeId,
};
use std::collections::{BTreeSet, HashSet};

/// Appended to a target end name that would shadow the source class
pub const END_NAME_SUFFIX: &str = "Reference";

/// Attribute metadata key holding the attribute name before it became a foreign key
pub const ORIGINAL_NAME_KEY: &str = "fk-original-name";

/// Attribute metadata key holding the owning association id
pub const ASSOCIATION_ID_KEY: &str = "association-id";

/// Association metadata key holding the foreign key constraint name
pub const CONSTRAINT_NAME_KEY: &str = "fk-constraint";

/// What happened to one foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    Created(NodeId),
    Reused(NodeId),
    /// An association the user reversed by hand was adopted as is
    Mirrored(NodeId),
    Skipped,
}

/// Ends an association should have for one foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cardinality {
    source_collection: bool,
    target_nullable: bool,
}

/// Collection and nullability flags of one end
fn flags(end: &AssociationEnd) -> (bool, bool) {
    (end.collection, end.nullable)
}

/// Singular when the foreign key columns are exactly the primary key
fn cardinality(table: &TableDescriptor, foreign_key: &ForeignKeyDescriptor) -> Cardinality {
    let fk_columns: BTreeSet<String> = foreign_key.columns.iter().map(|c| c.to_lowercase()).collect();
    let pk_columns: BTreeSet<String> = table.primary_key.iter().map(|c| c.to_lowercase()).collect();

    let is_primary_key = !pk_columns.is_empty() && fk_columns == pk_columns;
    let target_nullable = foreign_key
        .columns
        .iter()
        .any(|c| table.find_column(c).map_or(true, |column| column.nullable));

    Cardinality {
        source_collection: !is_primary_key,
        target_nullable,
    }
}

/// Name of the target end, derived from the first foreign key column
///
/// In order: a column starting with the target name yields the target name; a
/// column containing it yields everything through that occurrence; otherwise
/// a trailing `Id` is dropped and the rest is prefixed with the target name.
pub fn target_end_name(
    source_table: &str,
    target_table: &str,
    first_column: &str,
) -> String {
    let target = entity_name(target_table, NameKind::Table, EntityNaming::Singularize);
    let source = entity_name(source_table, NameKind::Table, EntityNaming::Singularize);
    let column = normalize(first_column, NameKind::Column, None);

    let column_lower = column.to_ascii_lowercase();
    let target_lower = target.to_ascii_lowercase();

    let name = if column_lower.starts_with(&target_lower) {
        target.clone()
    } else if let Some(pos) = column_lower.find(&target_lower) {
        column[..pos + target.len()].to_string()
    } else {
        let rest = column.strip_suffix("Id").unwrap_or(&column);
        format!("{}{}", target, rest)
    };

    if name.eq_ignore_ascii_case(&source) {
        format!("{}{}", name, END_NAME_SUFFIX)
    } else {
        name
    }
}

/// Turns foreign keys into associations for one run
pub struct AssociationSynthesizer<'a> {
    /// Every foreign key reference in the catalog; associations carrying one of
    /// these are never adopted by a different foreign key
    catalog_keys: &'a HashSet<ExternalRef>,
}

impl<'a> AssociationSynthesizer<'a> {
    pub fn new(catalog_keys: &'a HashSet<ExternalRef>) -> Self {
        Self { catalog_keys }
    }

    fn owned_by_other_key(&self, association: &Association, key: &ExternalRef) -> bool {
        association.external_ref.as_deref().is_some_and(|r| {
            !r.eq_ignore_ascii_case(key.as_str())
                && self.catalog_keys.iter().any(|k| k.as_str().eq_ignore_ascii_case(r))
        })
    }

    /// Reconcile the association for `foreign_key`, owned by `table`
    pub fn synthesize(
        &self,
        cx: &mut AnnotationContext<'_>,
        graph: &mut ModelGraph,
        claims: &mut Claims,
        table: &TableDescriptor,
        foreign_key: &ForeignKeyDescriptor,
    ) -> Synthesis {
        let key = ExternalRef::foreign_key(&table.schema, &table.name, &foreign_key.name);
        let object = format!("{}.{}", table.object_name(), foreign_key.name);
        let referenced = foreign_key.referenced();

        let source_ref = ExternalRef::table(&table.schema, &table.name);
        let target_ref = ExternalRef::table(&referenced.schema, &referenced.name);

        let Some(source) = graph.class_by_ref(source_ref.as_str()) else {
            cx.warn(DiagnosticCode::FkTargetUnresolved, object, format!("Owning table {} is not in the model", table.object_name()));
            return Synthesis::Skipped;
        };
        let Some(target) = graph.class_by_ref(target_ref.as_str()) else {
            cx.warn(DiagnosticCode::FkTargetUnresolved, object, format!("Referenced table {} is not in the model", referenced));
            return Synthesis::Skipped;
        };

        let mut column_ids = Vec::with_capacity(foreign_key.columns.len());
        for column in &foreign_key.columns {
            match source.attribute_by_ref(ExternalRef::column(&table.schema, &table.name, column).as_str()) {
                Some(attribute) => column_ids.push(attribute.id.clone()),
                None => {
                    cx.warn(DiagnosticCode::FkColumnUnmapped, object, format!("Column '{}' has no attribute", column));
                    return Synthesis::Skipped;
                }
            }
        }
        for column in &foreign_key.referenced_columns {
            let column_ref = ExternalRef::column(&referenced.schema, &referenced.name, column);
            if target.attribute_by_ref(column_ref.as_str()).is_none() {
                cx.warn(
                    DiagnosticCode::FkColumnUnmapped,
                    object,
                    format!("Referenced column '{}.{}' has no attribute", referenced, column),
                );
                return Synthesis::Skipped;
            }
        }
        let Some(first_column) = foreign_key.columns.first() else {
            cx.warn(DiagnosticCode::FkColumnUnmapped, object, "Foreign key has no columns");
            return Synthesis::Skipped;
        };

        let source_id = source.id.clone();
        let target_id = target.id.clone();
        let cardinality = cardinality(table, foreign_key);
        let end_name = target_end_name(&table.name, &referenced.name, first_column);

        let (id, created) = match self.locate(graph, claims, &key, &source_id, &target_id, &end_name) {
            Some(index) if is_reversed(&graph.associations[index], &source_id, &target_id) => {
                let association = &graph.associations[index];
                claims.claim(&association.id);
                tracing::debug!(foreign_key = %key, "Association was reversed by hand; leaving it alone");
                return Synthesis::Mirrored(association.id.clone());
            }
            Some(index) => {
                let association = &mut graph.associations[index];
                refresh(association, &key, cardinality, &end_name);
                (association.id.clone(), false)
            }
            None => match self.find_mirror(graph, claims, &key, &source_id, &target_id, cardinality) {
                Some(index) => {
                    let association = &mut graph.associations[index];
                    association.external_ref = Some(key.as_str().to_string());
                    claims.claim(&association.id);
                    tracing::debug!(foreign_key = %key, "Adopted mirrored association");
                    return Synthesis::Mirrored(association.id.clone());
                }
                None => {
                    let association = create(&key, &source_id, &target_id, cardinality, end_name);
                    let id = association.id.clone();
                    graph.associations.push(association);
                    tracing::debug!(foreign_key = %key, association = %id, "Created association");
                    (id, true)
                }
            },
        };
        claims.claim(&id);

        let mut target_end_id = String::new();
        if let Some(association) = graph.associations.iter_mut().find(|a| a.id == id) {
            association
                .metadata
                .entry(CONSTRAINT_NAME_KEY.to_string())
                .or_insert_with(|| foreign_key.name.clone());
            target_end_id = association.target_end.id.clone();
        }
        stamp_attributes(graph, &source_id, &column_ids, &id, &target_end_id);

        if created {
            Synthesis::Created(id)
        } else {
            Synthesis::Reused(id)
        }
    }

    /// Existing association for this foreign key, in the documented order
    fn locate(
        &self,
        graph: &ModelGraph,
        claims: &Claims,
        key: &ExternalRef,
        source_id: &str,
        target_id: &str,
        end_name: &str,
    ) -> Option<usize> {
        if let Some(index) = association_by_ref(&graph.associations, key) {
            return Some(index);
        }

        let pair: Vec<usize> = graph
            .associations
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                a.source_end.class_id == source_id
                    && a.target_end.class_id == target_id
                    && !claims.is_claimed(&a.id)
                    && !self.owned_by_other_key(a, key)
            })
            .map(|(i, _)| i)
            .collect();

        match pair.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => pair.into_iter().find(|&i| {
                graph.associations[i]
                    .target_end
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(end_name))
            }),
        }
    }

    /// Association running the other way with matching swapped flags
    fn find_mirror(
        &self,
        graph: &ModelGraph,
        claims: &Claims,
        key: &ExternalRef,
        source_id: &str,
        target_id: &str,
        cardinality: Cardinality,
    ) -> Option<usize> {
        let expected_source = (cardinality.source_collection, false);
        let expected_target = (false, cardinality.target_nullable);

        graph.associations.iter().position(|a| {
            a.source_end.class_id == target_id
                && a.target_end.class_id == source_id
                && flags(&a.source_end) == expected_target
                && flags(&a.target_end) == expected_source
                && !claims.is_claimed(&a.id)
                && !self.owned_by_other_key(a, key)
        })
    }
}

/// Whether `association` runs from the referenced class to the referencing one
fn is_reversed(association: &Association, source_id: &str, target_id: &str) -> bool {
    source_id != target_id
        && association.source_end.class_id == target_id
        && association.target_end.class_id == source_id
}

fn create(
    key: &ExternalRef,
    source_id: &str,
    target_id: &str,
    cardinality: Cardinality,
    end_name: String,
) -> Association {
    let mut source_end = AssociationEnd::new(source_id);
    source_end.collection = cardinality.source_collection;

    let mut target_end = AssociationEnd::new(target_id);
    target_end.name = Some(end_name);
    target_end.navigable = true;
    target_end.nullable = cardinality.target_nullable;

    Association {
        id: new_node_id(),
        external_ref: Some(key.as_str().to_string()),
        source_end,
        target_end,
        metadata: Default::default(),
    }
}

/// Bring cardinality up to date; names and navigability belong to the user once set
fn refresh(association: &mut Association, key: &ExternalRef, cardinality: Cardinality, end_name: &str) {
    association.external_ref = Some(key.as_str().to_string());

    association.source_end.collection = cardinality.source_collection;
    association.source_end.nullable = false;
    association.target_end.collection = false;
    association.target_end.nullable = cardinality.target_nullable;

    if association.target_end.name.is_none() {
        association.target_end.name = Some(end_name.to_string());
        association.target_end.navigable = true;
    }
}

/// Mark the foreign key attributes with the end they resolve to
fn stamp_attributes(
    graph: &mut ModelGraph,
    class_id: &str,
    attribute_ids: &[NodeId],
    association_id: &str,
    target_end_id: &str,
) {
    let Some(class) = graph.class_mut(class_id) else {
        return;
    };

    for attribute in class.attributes.iter_mut().filter(|a| attribute_ids.contains(&a.id)) {
        attribute.annotations.set(
            blocks::FOREIGN_KEY,
            Annotation::new().with("TargetEndId", target_end_id),
        );
        attribute
            .metadata
            .entry(ORIGINAL_NAME_KEY.to_string())
            .or_insert_with(|| attribute.name.clone());
        attribute
            .metadata
            .entry(ASSOCIATION_ID_KEY.to_string())
            .or_insert_with(|| association_id.to_string());
    }
}
