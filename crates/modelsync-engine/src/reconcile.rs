//! Generic get-or-create for graph nodes
//!
//! Every node kind goes through [`get_or_create`]: resolve the identity, refresh
//! the external reference and name of a match, or append a fresh node. Ids are
//! never regenerated and annotations are left for the annotators.

use crate::error::SyncError;
use crate::identity::{resolve, ExternalRef, Identified, Identity, Resolution};
use modelsync_core::{
    Attribute, Class, ClassKind, Folder, Index, ModelGraph, NodeId, Parameter, StoredProcedure,
};
use std::collections::HashSet;

/// What reconciliation did to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// A reconciled node's position plus its state before this run touched it
#[derive(Debug)]
pub struct Slot<T> {
    pub index: usize,
    previous: Option<T>,
}

impl<T: PartialEq> Slot<T> {
    pub fn created(&self) -> bool {
        self.previous.is_none()
    }

    /// Compare the node's current state against the state it was found in
    pub fn outcome(&self, current: &T) -> Outcome {
        match &self.previous {
            None => Outcome::Created,
            Some(previous) if previous == current => Outcome::Unchanged,
            Some(_) => Outcome::Updated,
        }
    }
}

/// Nodes claimed during one run
///
/// A claimed node is never handed out again by a name-only match, so two
/// source objects cannot both attach to it. Nodes whose external reference
/// belongs to an object of the current catalog are reserved for that object
/// before it is reached.
#[derive(Debug, Default)]
pub struct Claims {
    ids: HashSet<NodeId>,
    reserved_refs: HashSet<String>,
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims that keep every ref in `refs` away from name-only matches
    pub fn reserving(refs: impl IntoIterator<Item = ExternalRef>) -> Self {
        Self {
            ids: HashSet::new(),
            reserved_refs: refs.into_iter().map(|r| r.as_str().to_string()).collect(),
        }
    }

    /// Whether a node carrying `external_ref` belongs to some object of this run
    pub fn is_reserved(&self, external_ref: Option<&str>) -> bool {
        external_ref.is_some_and(|r| self.reserved_refs.contains(&r.to_lowercase()))
    }

    pub fn claim(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn is_claimed(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &HashSet<NodeId> {
        &self.ids
    }
}

/// Resolve `identity` in `nodes`, creating the node if nothing matches
pub fn get_or_create<T>(
    nodes: &mut Vec<T>,
    identity: &Identity,
    allow_name_fallback: bool,
    claims: &mut Claims,
    eligible: impl Fn(&T) -> bool,
    create: impl FnOnce(&str) -> T,
) -> Slot<T>
where
    T: Identified + Clone,
{
    let resolution = resolve(nodes, identity, allow_name_fallback, claims.ids(), |node| {
        eligible(node) && !claims.is_reserved(node.external_ref())
    });

    let slot = match resolution.index() {
        Some(index) => {
            let previous = nodes[index].clone();
            if let Resolution::ByName(_) = resolution {
                tracing::debug!(
                    external_ref = %identity.external_ref,
                    name = %identity.name,
                    "Re-attached node by name"
                );
            }
            Slot { index, previous: Some(previous) }
        }
        None => {
            nodes.push(create(&identity.name));
            tracing::debug!(external_ref = %identity.external_ref, name = %identity.name, "Created node");
            Slot { index: nodes.len() - 1, previous: None }
        }
    };

    let node = &mut nodes[slot.index];
    node.set_external_ref(&identity.external_ref);
    if node.name() != identity.name {
        node.set_name(&identity.name);
    }
    claims.claim(node.node_id());

    slot
}

/// One folder per schema
pub fn reconcile_folder(graph: &mut ModelGraph, schema: &str, claims: &mut Claims) -> Slot<Folder> {
    let identity = Identity::new(ExternalRef::folder(schema), schema);
    get_or_create(&mut graph.folders, &identity, true, claims, |_| true, |name| Folder {
        id: modelsync_core::new_node_id(),
        external_ref: None,
        name: name.to_string(),
    })
}

/// Reconcile a class of `kind` inside `folder_id`
///
/// Name fallback only considers unclaimed classes of the same kind that are
/// unfiled or filed in the same folder. A class found by external reference
/// whose kind differs is treated as corruption.
pub fn reconcile_class(
    graph: &mut ModelGraph,
    kind: ClassKind,
    identity: &Identity,
    folder_id: Option<&str>,
    allow_name_fallback: bool,
    claims: &mut Claims,
) -> Result<Slot<Class>, SyncError> {
    if let Some(existing) = graph.class_by_ref(identity.external_ref.as_str()) {
        if existing.kind != kind {
            return Err(SyncError::KindMismatch {
                external_ref: identity.external_ref.to_string(),
                expected: kind.to_string(),
                found: existing.kind.to_string(),
            });
        }
    }

    let slot = get_or_create(
        &mut graph.classes,
        identity,
        allow_name_fallback,
        claims,
        |class| {
            class.kind == kind
                && (class.folder_id.is_none() || class.folder_id.as_deref() == folder_id)
        },
        |name| Class::new(kind, name),
    );

    let class = &mut graph.classes[slot.index];
    if let Some(folder_id) = folder_id {
        if class.folder_id.as_deref() != Some(folder_id) {
            class.folder_id = Some(folder_id.to_string());
        }
    }

    Ok(slot)
}

/// Reconcile an attribute of `class`
pub fn reconcile_attribute(class: &mut Class, identity: &Identity, claims: &mut Claims) -> Slot<Attribute> {
    get_or_create(&mut class.attributes, identity, true, claims, |_| true, |name| Attribute::new(name))
}

/// Reconcile an index of `class`; its columns are filled in by the caller
pub fn reconcile_index(class: &mut Class, identity: &Identity, claims: &mut Claims) -> Slot<Index> {
    get_or_create(&mut class.indexes, identity, true, claims, |_| true, |name| Index {
        id: modelsync_core::new_node_id(),
        external_ref: None,
        name: name.to_string(),
        columns: Vec::new(),
        annotations: Default::default(),
    })
}

/// Reconcile a stored procedure inside `folder_id`
pub fn reconcile_procedure(
    graph: &mut ModelGraph,
    identity: &Identity,
    folder_id: Option<&str>,
    claims: &mut Claims,
) -> Slot<StoredProcedure> {
    let slot = get_or_create(
        &mut graph.procedures,
        identity,
        true,
        claims,
        |procedure| procedure.folder_id.is_none() || procedure.folder_id.as_deref() == folder_id,
        |name| StoredProcedure {
            id: modelsync_core::new_node_id(),
            external_ref: None,
            name: name.to_string(),
            folder_id: None,
            parameters: Vec::new(),
            return_type: None,
            annotations: Default::default(),
        },
    );

    let procedure = &mut graph.procedures[slot.index];
    if let Some(folder_id) = folder_id {
        if procedure.folder_id.as_deref() != Some(folder_id) {
            procedure.folder_id = Some(folder_id.to_string());
        }
    }

    slot
}

/// Reconcile a parameter of `procedure`
pub fn reconcile_parameter(
    procedure: &mut StoredProcedure,
    identity: &Identity,
    claims: &mut Claims,
) -> Slot<Parameter> {
    get_or_create(&mut procedure.parameters, identity, true, claims, |_| true, |name| Parameter {
        id: modelsync_core::new_node_id(),
        external_ref: None,
        name: name.to_string(),
        type_ref: Default::default(),
        annotations: Default::default(),
    })
}
