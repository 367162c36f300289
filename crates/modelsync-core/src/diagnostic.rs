//! Diagnostic codes for recoverable sync problems
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the report format.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Foreign keys
    /// Foreign key references a table that is not in the model
    FkTargetUnresolved,

    /// Foreign key column has no matching attribute
    FkColumnUnmapped,

    // Indexes
    /// Index column has no matching attribute
    IndexColumnUnmapped,

    // Types
    /// Source column type has no semantic mapping
    UnsupportedColumnType,

    // Stored procedures
    /// Result set introspection failed
    ResultSetUnavailable,

    /// Table-valued parameter type is not in the model
    ProcedureParameterUnresolved,

    // General
    /// General informational message
    Info,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FkTargetUnresolved => "FK_TARGET_UNRESOLVED",
            Self::FkColumnUnmapped => "FK_COLUMN_UNMAPPED",
            Self::IndexColumnUnmapped => "INDEX_COLUMN_UNMAPPED",
            Self::UnsupportedColumnType => "UNSUPPORTED_COLUMN_TYPE",
            Self::ResultSetUnavailable => "RESULT_SET_UNAVAILABLE",
            Self::ProcedureParameterUnresolved => "PROCEDURE_PARAMETER_UNRESOLVED",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - the object was skipped or left incomplete
    Warn,

    /// Error - reported but the run still completed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source object the diagnostic is about (`schema.object[.member]`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            object: None,
        }
    }

    /// Shorthand for a warning
    pub fn warn(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warn, message)
    }

    /// Set the source object
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }
}
