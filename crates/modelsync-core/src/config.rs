//! Configuration schema (modelsync.toml)

use serde::{Deserialize, Serialize};

/// How class names are derived from table names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityNaming {
    /// Use the normalized table name as-is
    MatchTableName,

    /// Singularize the normalized table name
    Singularize,
}

impl Default for EntityNaming {
    fn default() -> Self {
        Self::Singularize
    }
}

impl std::fmt::Display for EntityNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchTableName => write!(f, "match-table-name"),
            Self::Singularize => write!(f, "singularize"),
        }
    }
}

/// When the `Table` annotation is written onto a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableAnnotationPolicy {
    /// Always record the source table
    Always,

    /// Only when the class name or schema differ from the implicit mapping
    WhenDifferent,
}

impl Default for TableAnnotationPolicy {
    fn default() -> Self {
        Self::WhenDifferent
    }
}

impl std::fmt::Display for TableAnnotationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::WhenDifferent => write!(f, "when-different"),
        }
    }
}

/// Per-object-kind export toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportToggles {
    pub tables: bool,
    pub views: bool,
    pub stored_procedures: bool,
    pub table_types: bool,
    pub indexes: bool,
    pub foreign_keys: bool,
}

impl Default for ExportToggles {
    fn default() -> Self {
        Self {
            tables: true,
            views: true,
            stored_procedures: true,
            table_types: true,
            indexes: true,
            foreign_keys: true,
        }
    }
}

/// Schema and object allow-lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilter {
    /// Schemas to import (empty means all)
    #[serde(default)]
    pub schemas: Vec<String>,

    /// Objects to import as `schema.name` glob patterns (empty means all)
    #[serde(default)]
    pub objects: Vec<String>,
}

impl ExportFilter {
    /// Check if a schema passes the allow-list
    pub fn includes_schema(&self, schema: &str) -> bool {
        self.schemas.is_empty() || self.schemas.iter().any(|s| s.eq_ignore_ascii_case(schema))
    }

    /// Check if an object passes both allow-lists
    pub fn includes_object(&self, schema: &str, name: &str) -> bool {
        if !self.includes_schema(schema) {
            return false;
        }

        if self.objects.is_empty() {
            return true;
        }

        let qualified = format!("{}.{}", schema, name).to_lowercase();
        self.objects.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            // Bare names match in any schema
            if pattern.contains('.') {
                glob_match(&pattern, &qualified)
            } else {
                glob_match(&pattern, &name.to_lowercase())
            }
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Class naming convention
    #[serde(default)]
    pub entity_naming: EntityNaming,

    /// Table annotation policy
    #[serde(default)]
    pub table_annotation: TableAnnotationPolicy,

    /// Database type recorded on the graph root
    #[serde(default = "default_database_type")]
    pub database_type: String,

    /// Schema treated as implicit by the table annotation
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Object kinds to export
    #[serde(default)]
    pub export: ExportToggles,

    /// Allow-lists
    #[serde(default)]
    pub filter: ExportFilter,
}

fn default_database_type() -> String {
    "SqlServer".to_string()
}

fn default_schema() -> String {
    "dbo".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            entity_naming: EntityNaming::default(),
            table_annotation: TableAnnotationPolicy::default(),
            database_type: default_database_type(),
            default_schema: default_schema(),
            export: ExportToggles::default(),
            filter: ExportFilter::default(),
        }
    }
}

impl SyncConfig {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Simple glob matching (supports a single * wildcard)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    if let Some(star_pos) = pattern.find('*') {
        let prefix = &pattern[..star_pos];
        let suffix = &pattern[star_pos + 1..];

        text.len() >= prefix.len() + suffix.len()
            && text.starts_with(prefix)
            && text.ends_with(suffix)
    } else {
        pattern == text
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
