//! Name deduplication
//!
//! A [`NameRegistry`] lives for exactly one run and is passed explicitly to
//! whoever assigns names. Names are compared case-insensitively.

use std::collections::{HashMap, HashSet};

/// Scope shared by every class of the run, used for schema-conflicting classes
pub const MODEL_SCOPE: &str = "model";

/// Scope key for classes of one schema
pub fn class_scope(schema: &str) -> String {
    format!("classes:{}", schema.to_lowercase())
}

/// Scope key for the attributes of one class
pub fn attribute_scope(class_ref: &str) -> String {
    format!("attributes:{}", class_ref.to_lowercase())
}

/// Scope key for the indexes of one class
pub fn index_scope(class_ref: &str) -> String {
    format!("indexes:{}", class_ref.to_lowercase())
}

/// Scope key for procedures of one schema
pub fn procedure_scope(schema: &str) -> String {
    format!("procedures:{}", schema.to_lowercase())
}

/// Scope key for the parameters of one procedure
pub fn parameter_scope(procedure_ref: &str) -> String {
    format!("parameters:{}", procedure_ref.to_lowercase())
}

#[derive(Debug, Default)]
struct ScopeNames {
    used: HashSet<String>,
    counter: u32,
}

/// Append-only registry of the names used in each scope
#[derive(Debug, Default)]
pub struct NameRegistry {
    scopes: HashMap<String, ScopeNames>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` in `scope`, appending a number if it is taken
    ///
    /// The numeric suffix comes from a per-scope counter that only grows, so a
    /// suffix is never handed out twice in one run.
    pub fn dedupe(&mut self, name: &str, scope: &str) -> String {
        let names = self.scopes.entry(scope.to_string()).or_default();

        if names.used.insert(name.to_lowercase()) {
            return name.to_string();
        }

        loop {
            names.counter += 1;
            let candidate = format!("{}{}", name, names.counter);
            if names.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
        }
    }

    /// Record `name` as used in `scope` without checking it
    pub fn reserve(&mut self, name: &str, scope: &str) {
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .used
            .insert(name.to_lowercase());
    }

    pub fn is_used(&self, name: &str, scope: &str) -> bool {
        self.scopes
            .get(scope)
            .is_some_and(|names| names.used.contains(&name.to_lowercase()))
    }
}
