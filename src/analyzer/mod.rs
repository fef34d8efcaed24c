//! Constraint change analysis.
//!
//! This module compares the dependencies of two revisions of one file and
//! decides which changes increase the risk of a breaking upgrade.
//!
//! # Phases
//!
//! 1. **Reconciliation**: pair before and after declarations by
//!    identifier (dropping ignored identifiers).
//!
//! 2. **Classification**: turn each pair into at most one finding, with a
//!    severity derived from boundedness, overrides and critical patterns.
//!
//! 3. **Aggregation**: order the findings deterministically into a
//!    [`FileReport`].
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use verguard::analyzer::Analyzer;
//! use verguard::config::ClassificationConfig;
//! use verguard::types::{DependencyRecord, RawDependency};
//!
//! let file = Path::new("main.tf");
//! let record = |c: &str| {
//!     DependencyRecord::from_raw(RawDependency::new("foo", c, 1), file, "terraform")
//! };
//!
//! let analyzer = Analyzer::new(ClassificationConfig::default());
//! let report = analyzer.analyze(file, "terraform", vec![record("~> 1.0")], vec![record(">= 1.0")]);
//! assert_eq!(report.findings.len(), 1);
//! ```

mod aggregate;
mod classifier;
mod reconcile;

pub use aggregate::{aggregate, sort_findings};
pub use classifier::Classifier;
pub use reconcile::reconcile;

use crate::config::ClassificationConfig;
use crate::types::{DependencyRecord, FileReport, Finding};
use std::path::Path;

/// Runs reconciliation, classification and aggregation for one file.
#[derive(Debug, Clone)]
pub struct Analyzer {
    classification: ClassificationConfig,
    classifier: Classifier,
}

impl Analyzer {
    /// Create an analyzer over compiled classification settings.
    #[must_use]
    pub fn new(classification: ClassificationConfig) -> Self {
        Self {
            classifier: Classifier::new(classification.clone()),
            classification,
        }
    }

    /// Compare two extraction passes of the same file.
    #[must_use]
    pub fn analyze(
        &self,
        file: &Path,
        format: &str,
        before: Vec<DependencyRecord>,
        after: Vec<DependencyRecord>,
    ) -> FileReport {
        let (before_count, after_count) = (before.len(), after.len());
        tracing::debug!(
            file = %file.display(),
            before = before_count,
            after = after_count,
            "Starting analysis"
        );

        // Phase 1: Reconcile
        let pairs = reconcile(before, after, &self.classification);
        tracing::debug!(pairs = pairs.len(), "Reconciled dependencies");

        // Phase 2: Classify
        let findings: Vec<Finding> = pairs
            .iter()
            .filter_map(|pair| self.classifier.classify(pair))
            .collect();
        tracing::debug!(findings = findings.len(), "Classified dependency changes");

        // Phase 3: Aggregate
        aggregate(file, format, before_count, after_count, findings)
    }
}
