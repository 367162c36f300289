//! Identity resolution
//!
//! Every reconciled node carries an external reference: a lowercase composite
//! key built from durable source coordinates. It is the only input that stays
//! stable when surface names change.
//!
//! | source | external reference |
//! |---|---|
//! | schema | `sales` |
//! | table / view | `sales.order` |
//! | column | `sales.order.customerid` |
//! | index | `index:sales.order.ix_order_date` |
//! | foreign key | `fk:sales.order.fk_order_customer` |
//! | table type | `type:sales.orderlines` |
//! | procedure | `sales.getorders` |
//! | parameter | `sales.getorders.customerid` |
//! | procedure response | `response:sales.getorders` |

use modelsync_core::{
    ref_matches, Association, Attribute, Class, Folder, Index, NodeId, Parameter, StoredProcedure,
};
use std::collections::HashSet;
use std::fmt;

/// Case-insensitive composite key identifying a source entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalRef(String);

impl ExternalRef {
    fn join(parts: &[&str]) -> Self {
        Self(parts.join(".").to_lowercase())
    }

    fn prefixed(prefix: &str, parts: &[&str]) -> Self {
        Self(format!("{}:{}", prefix, parts.join(".")).to_lowercase())
    }

    pub fn folder(schema: &str) -> Self {
        Self::join(&[schema])
    }

    pub fn table(schema: &str, table: &str) -> Self {
        Self::join(&[schema, table])
    }

    pub fn column(schema: &str, table: &str, column: &str) -> Self {
        Self::join(&[schema, table, column])
    }

    pub fn index(schema: &str, table: &str, index: &str) -> Self {
        Self::prefixed("index", &[schema, table, index])
    }

    pub fn foreign_key(schema: &str, table: &str, name: &str) -> Self {
        Self::prefixed("fk", &[schema, table, name])
    }

    pub fn table_type(schema: &str, name: &str) -> Self {
        Self::prefixed("type", &[schema, name])
    }

    pub fn procedure(schema: &str, name: &str) -> Self {
        Self::join(&[schema, name])
    }

    pub fn parameter(schema: &str, procedure: &str, parameter: &str) -> Self {
        Self::join(&[schema, procedure, parameter.trim_start_matches('@')])
    }

    pub fn response(schema: &str, procedure: &str) -> Self {
        Self::prefixed("response", &[schema, procedure])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External reference plus the name a new node would get
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub external_ref: ExternalRef,
    pub name: String,
}

impl Identity {
    pub fn new(external_ref: ExternalRef, name: impl Into<String>) -> Self {
        Self {
            external_ref,
            name: name.into(),
        }
    }
}

/// A node that can be re-identified across runs
pub trait Identified {
    fn node_id(&self) -> &str;
    fn external_ref(&self) -> Option<&str>;
    fn set_external_ref(&mut self, external_ref: &ExternalRef);
    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn node_id(&self) -> &str {
                    &self.id
                }

                fn external_ref(&self) -> Option<&str> {
                    self.external_ref.as_deref()
                }

                fn set_external_ref(&mut self, external_ref: &ExternalRef) {
                    self.external_ref = Some(external_ref.as_str().to_string());
                }

                fn name(&self) -> &str {
                    &self.name
                }

                fn set_name(&mut self, name: &str) {
                    self.name = name.to_string();
                }
            }
        )*
    };
}

impl_identified!(Folder, Class, Attribute, Index, StoredProcedure, Parameter);

/// How an existing node was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Exact external reference match
    ByRef(usize),

    /// Name match on a node not yet claimed in this run
    ByName(usize),

    /// Nothing matched
    Missing,
}

impl Resolution {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::ByRef(i) | Self::ByName(i) => Some(*i),
            Self::Missing => None,
        }
    }
}

/// Locate an existing node for `identity`
///
/// External references are matched first across all `nodes`. The name
/// fallback only runs when `allow_name_fallback` is set, only considers nodes
/// accepted by `eligible`, and never returns a node already claimed in this
/// run.
pub fn resolve<T: Identified>(
    nodes: &[T],
    identity: &Identity,
    allow_name_fallback: bool,
    claimed: &HashSet<NodeId>,
    eligible: impl Fn(&T) -> bool,
) -> Resolution {
    let external_ref = identity.external_ref.as_str();

    if let Some(i) = nodes
        .iter()
        .position(|n| n.external_ref().is_some_and(|r| r.eq_ignore_ascii_case(external_ref)))
    {
        return Resolution::ByRef(i);
    }

    if !allow_name_fallback {
        return Resolution::Missing;
    }

    nodes
        .iter()
        .position(|n| {
            n.name().eq_ignore_ascii_case(&identity.name)
                && !claimed.contains(n.node_id())
                && eligible(n)
        })
        .map(Resolution::ByName)
        .unwrap_or(Resolution::Missing)
}

/// Find an association by external reference
pub fn association_by_ref(associations: &[Association], external_ref: &ExternalRef) -> Option<usize> {
    associations
        .iter()
        .position(|a| ref_matches(&a.external_ref, external_ref.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsync_core::ClassKind;

    fn class(name: &str, external_ref: Option<&str>) -> Class {
        let mut class = Class::new(ClassKind::Table, name);
        class.external_ref = external_ref.map(str::to_string);
        class
    }

    #[test]
    fn external_refs_are_lowercase() {
        assert_eq!(ExternalRef::table("Sales", "Order").as_str(), "sales.order");
        assert_eq!(ExternalRef::column("dbo", "Order", "CustomerID").as_str(), "dbo.order.customerid");
        assert_eq!(ExternalRef::parameter("dbo", "GetOrders", "@Top").as_str(), "dbo.getorders.top");
        assert_eq!(ExternalRef::table_type("dbo", "OrderLines").as_str(), "type:dbo.orderlines");
        assert_eq!(ExternalRef::foreign_key("dbo", "Order", "FK_1").as_str(), "fk:dbo.order.fk_1");
    }

    #[test]
    fn resolves_by_external_ref_first() {
        let nodes = vec![class("Order", None), class("Purchase", Some("dbo.order"))];
        let identity = Identity::new(ExternalRef::table("dbo", "ORDER"), "Order");

        let resolution = resolve(&nodes, &identity, true, &HashSet::new(), |_| true);
        assert_eq!(resolution, Resolution::ByRef(1));
    }

    #[test]
    fn falls_back_to_name() {
        let nodes = vec![class("Customer", None)];
        let identity = Identity::new(ExternalRef::table("dbo", "Customers"), "customer");

        assert_eq!(resolve(&nodes, &identity, true, &HashSet::new(), |_| true), Resolution::ByName(0));
        assert_eq!(resolve(&nodes, &identity, false, &HashSet::new(), |_| true), Resolution::Missing);
        assert_eq!(resolve(&nodes, &identity, true, &HashSet::new(), |_| false), Resolution::Missing);
    }

    #[test]
    fn claimed_nodes_are_not_matched_by_name() {
        let nodes = vec![class("Customer", None)];
        let claimed: HashSet<NodeId> = [nodes[0].id.clone()].into_iter().collect();
        let identity = Identity::new(ExternalRef::table("sales", "Customer"), "Customer");

        assert_eq!(resolve(&nodes, &identity, true, &claimed, |_| true), Resolution::Missing);
    }
}
