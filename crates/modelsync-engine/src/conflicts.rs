//! Cross-schema name conflict analysis
//!
//! Runs once over every table and view before any node is touched. Objects
//! whose class names collide are flagged so that the reconciler neither merges
//! them through name matching nor silently gives two of them one name.

use crate::error::SyncError;
use crate::identity::ExternalRef;
use crate::naming::{entity_name, normalize, NameKind};
use modelsync_catalog::ObjectName;
use modelsync_core::EntityNaming;
use std::collections::{BTreeMap, HashMap};

/// How one object takes part in a name collision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableConflict {
    /// Colliding objects live in more than one schema; name-only matching is
    /// suppressed for this object
    pub different_schema: bool,

    /// Name to use instead of the convention name, when colliding objects
    /// share a schema
    pub raw_name: Option<String>,
}

/// Conflict flags keyed by object external reference
#[derive(Debug, Clone, Default)]
pub struct ConflictMap {
    entries: HashMap<ExternalRef, TableConflict>,
}

impl ConflictMap {
    pub fn get(&self, external_ref: &ExternalRef) -> Option<&TableConflict> {
        self.entries.get(external_ref)
    }

    /// Whether name-only matching must be suppressed
    pub fn is_schema_conflict(&self, external_ref: &ExternalRef) -> bool {
        self.get(external_ref).is_some_and(|c| c.different_schema)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Group objects by class name and flag every collision
///
/// Fails when two objects of one schema cannot be told apart even by their
/// raw normalized names.
pub fn analyze(objects: &[ObjectName], convention: EntityNaming) -> Result<ConflictMap, SyncError> {
    let mut groups: BTreeMap<String, Vec<&ObjectName>> = BTreeMap::new();
    for object in objects {
        let name = entity_name(&object.name, NameKind::Table, convention);
        groups.entry(name.to_lowercase()).or_default().push(object);
    }

    let mut map = ConflictMap::default();

    for (name, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
        let mut by_schema: BTreeMap<String, Vec<&ObjectName>> = BTreeMap::new();
        for &member in &members {
            by_schema.entry(member.schema.to_lowercase()).or_default().push(member);
        }

        let different_schema = by_schema.len() > 1;

        for (schema, same_schema) in &by_schema {
            let raw_names = if same_schema.len() > 1 {
                Some(raw_fallbacks(schema, &name, same_schema)?)
            } else {
                None
            };

            for (i, member) in same_schema.iter().enumerate() {
                let conflict = TableConflict {
                    different_schema,
                    raw_name: raw_names.as_ref().map(|names| names[i].clone()),
                };
                map.entries.insert(ExternalRef::table(&member.schema, &member.name), conflict);
            }
        }

        tracing::debug!(
            name = %name,
            members = members.len(),
            different_schema,
            "Class name conflict"
        );
    }

    Ok(map)
}

/// Raw normalized names for same-schema members, which must all differ
fn raw_fallbacks(schema: &str, name: &str, members: &[&ObjectName]) -> Result<Vec<String>, SyncError> {
    let names: Vec<String> = members
        .iter()
        .map(|m| normalize(&m.name, NameKind::Table, None))
        .collect();

    let mut seen: HashMap<String, &ObjectName> = HashMap::new();
    for (member, raw) in members.iter().zip(&names) {
        if let Some(other) = seen.insert(raw.to_lowercase(), *member) {
            return Err(SyncError::NameConflict {
                schema: schema.to_string(),
                name: raw.clone(),
                tables: vec![other.fqn(), member.fqn()],
            });
        }
    }

    tracing::debug!(schema, name, "Same-schema conflict resolved by raw names");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_conflicts() {
        let objects = vec![ObjectName::new("dbo", "Customer"), ObjectName::new("dbo", "Order")];
        let map = analyze(&objects, EntityNaming::Singularize).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn different_schemas_are_flagged() {
        let objects = vec![ObjectName::new("sales", "Order"), ObjectName::new("billing", "Orders")];
        let map = analyze(&objects, EntityNaming::Singularize).unwrap();

        assert_eq!(map.len(), 2);
        assert!(map.is_schema_conflict(&ExternalRef::table("sales", "Order")));
        assert!(map.is_schema_conflict(&ExternalRef::table("billing", "Orders")));
        assert_eq!(map.get(&ExternalRef::table("sales", "Order")).unwrap().raw_name, None);
    }

    #[test]
    fn same_schema_uses_raw_names() {
        let objects = vec![ObjectName::new("dbo", "Customer"), ObjectName::new("dbo", "Customers")];
        let map = analyze(&objects, EntityNaming::Singularize).unwrap();

        let plural = map.get(&ExternalRef::table("dbo", "Customers")).unwrap();
        assert!(!plural.different_schema);
        assert_eq!(plural.raw_name.as_deref(), Some("Customers"));

        let singular = map.get(&ExternalRef::table("dbo", "Customer")).unwrap();
        assert_eq!(singular.raw_name.as_deref(), Some("Customer"));
    }

    #[test]
    fn indistinguishable_same_schema_tables_fail() {
        let objects = vec![ObjectName::new("dbo", "Order Item"), ObjectName::new("dbo", "Order_Item")];
        let err = analyze(&objects, EntityNaming::MatchTableName).unwrap_err();

        match err {
            SyncError::NameConflict { schema, name, tables } => {
                assert_eq!(schema, "dbo");
                assert_eq!(name, "OrderItem");
                assert_eq!(tables, vec!["dbo.Order Item".to_string(), "dbo.Order_Item".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mixed_groups_flag_both_concerns() {
        let objects = vec![
            ObjectName::new("dbo", "Customer"),
            ObjectName::new("dbo", "Customers"),
            ObjectName::new("sales", "Customer"),
        ];
        let map = analyze(&objects, EntityNaming::Singularize).unwrap();

        let dbo = map.get(&ExternalRef::table("dbo", "Customers")).unwrap();
        assert!(dbo.different_schema);
        assert_eq!(dbo.raw_name.as_deref(), Some("Customers"));

        let sales = map.get(&ExternalRef::table("sales", "Customer")).unwrap();
        assert!(sales.different_schema);
        assert_eq!(sales.raw_name, None);
    }
}
