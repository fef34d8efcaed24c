//! Ordering findings into a per-file report.

use crate::types::{FileReport, Finding};
use std::cmp::Reverse;
use std::path::Path;

/// Sort findings by descending severity, then identifier, then location.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        (Reverse(a.severity), &a.identifier, &a.location)
            .cmp(&(Reverse(b.severity), &b.identifier, &b.location))
    });
}

/// Build the report for one file pair.
#[must_use]
pub fn aggregate(
    file: &Path,
    format: &str,
    dependencies_before: usize,
    dependencies_after: usize,
    mut findings: Vec<Finding>,
) -> FileReport {
    sort_findings(&mut findings);
    FileReport {
        file: file.to_path_buf(),
        format: format.to_string(),
        dependencies_before,
        dependencies_after,
        findings,
    }
}
