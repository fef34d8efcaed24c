//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{FileFailure, FileReport, RunReport, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
    /// Severity that fails the run
    fail_on: Severity,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
            fail_on: config.fail_on,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, report: &RunReport) -> Result<String> {
        let document = JsonReport::new(report, self.fail_on);

        let json = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };

        json.map_err(|e| {
            crate::err!(ReportGeneration {
                message: format!("Failed to serialize JSON report: {e}"),
            })
        })
    }
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: ReportSummary,
    /// Per-file results
    pub files: &'a [FileReport],
    /// Files that could not be analyzed
    pub failures: &'a [FileFailure],
    /// Whether any finding meets the threshold
    pub has_blocking_findings: bool,
}

impl<'a> JsonReport<'a> {
    /// Build the document for a run judged against `fail_on`.
    #[must_use]
    pub fn new(report: &'a RunReport, fail_on: Severity) -> Self {
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        for finding in report.findings() {
            *by_category.entry(finding.category.to_string()).or_insert(0) += 1;
        }

        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                fail_on,
                files_analyzed: report.files.len(),
            },
            summary: ReportSummary {
                total_findings: report.findings().count(),
                findings_by_severity: report.counts_by_severity(),
                findings_by_category: by_category,
                files_failed: report.failures.len(),
            },
            files: &report.files,
            failures: &report.failures,
            has_blocking_findings: report.has_blocking(fail_on),
        }
    }
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// Verguard version
    pub version: String,
    /// Report generation timestamp
    pub timestamp: String,
    /// Severity threshold
    pub fail_on: Severity,
    /// Number of files analyzed
    pub files_analyzed: usize,
}

/// Report summary.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    /// Total findings
    pub total_findings: usize,
    /// Findings grouped by severity
    pub findings_by_severity: BTreeMap<Severity, usize>,
    /// Findings grouped by category
    pub findings_by_category: BTreeMap<String, usize>,
    /// Files that could not be analyzed
    pub files_failed: usize,
}
