//! Fatal sync errors
//!
//! Anything here aborts the run before the graph is handed back, so the
//! previously persisted model is never replaced by a partial one.

use modelsync_catalog::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Tables {tables:?} in schema '{schema}' all normalize to '{name}'; rename one of them or exclude it from the import")]
    NameConflict {
        schema: String,
        name: String,
        tables: Vec<String>,
    },

    #[error("Node '{external_ref}' is a {found} but a {expected} was expected; the model file may be corrupt")]
    KindMismatch {
        external_ref: String,
        expected: String,
        found: String,
    },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
