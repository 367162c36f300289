//! Sync report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Counters for one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub classes_created: usize,
    pub classes_updated: usize,
    pub attributes_created: usize,
    pub attributes_updated: usize,
    pub associations_created: usize,
    pub associations_reused: usize,
    pub foreign_keys_skipped: usize,
    pub indexes_created: usize,
    pub indexes_updated: usize,
    pub procedures_created: usize,
    pub procedures_updated: usize,
    pub warnings: usize,
}

impl SyncSummary {
    /// Whether the run changed any node
    pub fn has_changes(&self) -> bool {
        self.classes_created
            + self.classes_updated
            + self.attributes_created
            + self.attributes_updated
            + self.associations_created
            + self.indexes_created
            + self.indexes_updated
            + self.procedures_created
            + self.procedures_updated
            > 0
    }
}

/// Sync report (sync-report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Catalog the run read from
    pub catalog: String,

    /// Summary statistics
    pub summary: SyncSummary,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl SyncReport {
    /// Create a new empty report
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            catalog: catalog.into(),
            summary: SyncSummary::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity >= Severity::Warn {
            self.summary.warnings += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Check if the report has any warnings or errors
    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;

    #[test]
    fn empty_report() {
        let report = SyncReport::new("Mock");
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary, SyncSummary::default());
        assert!(!report.has_warnings());
        assert!(!report.summary.has_changes());
    }

    #[test]
    fn counts_warnings_only() {
        let mut report = SyncReport::new("Mock");
        report.add_diagnostic(Diagnostic::new(DiagnosticCode::Info, Severity::Info, "note"));
        report.add_diagnostic(Diagnostic::warn(DiagnosticCode::FkTargetUnresolved, "skipped"));

        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(report.summary.warnings, 1);
        assert!(report.has_warnings());
    }

    #[test]
    fn report_serialization() {
        let report = SyncReport::new("Snapshot");
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"diagnostics\""));
        assert!(json.contains("\"classes_created\""));
    }
}
