//! Model graph persistence
//!
//! The graph is stored as pretty-printed JSON. Saves go through a sibling
//! temporary file and a rename so the previous file is never left half-written.

use crate::model::ModelGraph;
use std::path::{Path, PathBuf};

/// Errors raised while loading or saving a graph
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("Invalid model file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

/// Loads and saves model graphs
pub trait ModelStore {
    /// Load a graph from `path`
    fn load(&self, path: &Path) -> Result<ModelGraph, StoreError>;

    /// Persist a graph to `path`
    fn save(&self, graph: &ModelGraph, path: &Path) -> Result<(), StoreError>;

    /// Load a graph, or start a new one named `name` if the file does not exist
    fn load_or_default(&self, path: &Path, name: &str) -> Result<ModelGraph, StoreError> {
        if path.exists() {
            self.load(path)
        } else {
            tracing::info!(path = %path.display(), "No model file found, starting a new graph");
            Ok(ModelGraph::new(name))
        }
    }
}

/// JSON file store
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelStore;

impl JsonModelStore {
    pub fn new() -> Self {
        Self
    }

    /// Serialize a graph exactly as `save` would write it
    pub fn to_json(graph: &ModelGraph) -> Result<String, StoreError> {
        let mut json = serde_json::to_string_pretty(graph)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }
}

impl ModelStore for JsonModelStore {
    fn load(&self, path: &Path) -> Result<ModelGraph, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&contents).map_err(|e| StoreError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn save(&self, graph: &ModelGraph, path: &Path) -> Result<(), StoreError> {
        let json = Self::to_json(graph)?;

        if let Ok(existing) = std::fs::read_to_string(path) {
            if existing == json {
                tracing::debug!(path = %path.display(), "Model unchanged, skipping write");
                return Ok(());
            }
        }

        let io_err = |e: std::io::Error| StoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        tracing::info!(path = %path.display(), classes = graph.classes.len(), "Saved model");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Class, ClassKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut graph = ModelGraph::new("Sales");
        graph.classes.push(Class::new(ClassKind::Table, "Customer"));

        let store = JsonModelStore::new();
        store.save(&graph, &path).unwrap();
        let loaded = store.load(&path).unwrap();

        assert_eq!(loaded, graph);
        assert!(!dir.path().join("model.json.tmp").exists());
    }

    #[test]
    fn load_or_default_creates_new_graph() {
        let dir = tempfile::tempdir().unwrap();
        let graph = JsonModelStore::new()
            .load_or_default(&dir.path().join("missing.json"), "Fresh")
            .unwrap();

        assert_eq!(graph.name, "Fresh");
        assert!(graph.classes.is_empty());
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonModelStore::new().load(&path).unwrap_err();
        assert!(matches!(err, StoreError::ParseError { .. }));
    }

    #[test]
    fn unchanged_graph_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let graph = ModelGraph::new("Sales");
        let store = JsonModelStore::new();

        store.save(&graph, &path).unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();
        store.save(&graph, &path).unwrap();
        let after = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert_eq!(before, after);
    }
}
