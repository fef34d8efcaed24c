//! Core data types used throughout Verguard.
//!
//! This module defines the fundamental data structures for representing:
//! - Dependency declarations extracted from one revision of a file
//! - Before/after pairs produced by reconciliation
//! - Findings, severities and categories
//! - Per-file and per-run reports

use crate::constraint::ConstraintExpression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Severity level for findings.
///
/// Ordered `Info < Warning < Critical`. Escalation saturates at `Critical`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding
    Info,
    /// Potential risk
    Warning,
    /// Severe risk requiring attention
    Critical,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warning, Self::Critical];

    /// The next level up, capped at `Critical`.
    #[must_use]
    pub fn escalate(self) -> Self {
        match self {
            Self::Info => Self::Warning,
            Self::Warning | Self::Critical => Self::Critical,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Category of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    /// A bound constraint lost its ceiling
    NewlyUnbound,
    /// The constraint is unbound and was not bound before (or is new)
    AlreadyUnbound,
    /// A bound constraint on a critical dependency was removed
    RemovedSafetyConstraint,
    /// Both sides bound, but the lower bound jumped a major version
    MajorVersionJump,
    /// Anything else worth reporting, such as an unparseable constraint
    Informational,
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewlyUnbound => write!(f, "newly-unbound"),
            Self::AlreadyUnbound => write!(f, "already-unbound"),
            Self::RemovedSafetyConstraint => write!(f, "removed-safety-constraint"),
            Self::MajorVersionJump => write!(f, "major-version-jump"),
            Self::Informational => write!(f, "informational"),
        }
    }
}

/// Location in a file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based, 0 when unknown)
    pub line: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// A declaration as reported by a format adapter, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDependency {
    /// Dependency identifier (e.g. `hashicorp/aws`)
    pub identifier: String,
    /// Constraint text as written; empty when the declaration has none
    pub raw_constraint: String,
    /// Line of the declaration (1-based, 0 when unknown)
    pub line: usize,
    /// Where the dependency comes from, when the identifier is a local name
    /// (a Terraform module address such as `module.vpc`)
    pub source: Option<String>,
}

impl RawDependency {
    /// Create a new raw declaration.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        raw_constraint: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            raw_constraint: raw_constraint.into(),
            line,
            source: None,
        }
    }

    /// Attach the source the identifier refers to.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Outcome of parsing a declaration's constraint text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedConstraint {
    /// The text parsed
    Valid(ConstraintExpression),
    /// The text matched no constraint grammar
    Malformed {
        /// Why parsing failed
        reason: String,
    },
}

impl ParsedConstraint {
    /// The parsed expression, if valid.
    #[must_use]
    pub fn expression(&self) -> Option<&ConstraintExpression> {
        match self {
            Self::Valid(expr) => Some(expr),
            Self::Malformed { .. } => None,
        }
    }
}

/// One dependency declaration from one revision of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// Dependency identifier
    pub identifier: String,
    /// Constraint text as written
    pub raw: String,
    /// Parsed constraint
    pub constraint: ParsedConstraint,
    /// Where the declaration lives
    pub location: Location,
    /// Tag of the adapter that produced the record
    pub format: String,
    /// Source the identifier refers to, if the adapter reported one
    pub source: Option<String>,
}

impl DependencyRecord {
    /// Build a record from an adapter's raw declaration, parsing its constraint.
    ///
    /// A malformed constraint does not fail construction; it is kept as
    /// [`ParsedConstraint::Malformed`] so the classifier can report it.
    #[must_use]
    pub fn from_raw(raw: RawDependency, file: &Path, format: &str) -> Self {
        let constraint = match ConstraintExpression::parse(&raw.raw_constraint) {
            Ok(expr) => ParsedConstraint::Valid(expr),
            Err(e) => {
                tracing::debug!(
                    identifier = %raw.identifier,
                    constraint = %raw.raw_constraint,
                    error = %e,
                    "Constraint did not parse"
                );
                let reason = match e {
                    crate::error::VerguardError::MalformedConstraint { message, .. } => message,
                    other => other.to_string(),
                };
                ParsedConstraint::Malformed { reason }
            }
        };

        Self {
            identifier: raw.identifier,
            raw: raw.raw_constraint,
            constraint,
            location: Location {
                file: file.to_path_buf(),
                line: raw.line,
            },
            format: format.to_string(),
            source: raw.source,
        }
    }

    /// The identifier, then the source when there is one.
    ///
    /// Classification patterns are matched against each name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.identifier.as_str()).chain(self.source.as_deref())
    }

    /// How the dependency is named in messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.source {
            Some(source) => format!("{} ({source})", self.identifier),
            None => self.identifier.clone(),
        }
    }

    /// Whether the constraint parsed and caps future versions.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.constraint
            .expression()
            .is_some_and(ConstraintExpression::is_bound)
    }
}

/// A dependency's before and after declarations, aligned by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciledPair {
    /// Declared in both revisions
    Both {
        /// Declaration in the before revision
        before: DependencyRecord,
        /// Declaration in the after revision
        after: DependencyRecord,
    },
    /// Only declared before: the dependency was removed
    Removed(DependencyRecord),
    /// Only declared after: the dependency is new
    Added(DependencyRecord),
}

impl ReconciledPair {
    /// The identifier shared by the pair.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Both { after, .. } | Self::Added(after) => &after.identifier,
            Self::Removed(before) => &before.identifier,
        }
    }

    /// The before declaration, if any.
    #[must_use]
    pub fn before(&self) -> Option<&DependencyRecord> {
        match self {
            Self::Both { before, .. } | Self::Removed(before) => Some(before),
            Self::Added(_) => None,
        }
    }

    /// The after declaration, if any.
    #[must_use]
    pub fn after(&self) -> Option<&DependencyRecord> {
        match self {
            Self::Both { after, .. } | Self::Added(after) => Some(after),
            Self::Removed(_) => None,
        }
    }

    /// The most recent declaration: the after side, else the before side.
    #[must_use]
    pub fn latest(&self) -> &DependencyRecord {
        match self {
            Self::Both { after, .. } | Self::Added(after) => after,
            Self::Removed(before) => before,
        }
    }
}

/// A single reported risk observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Dependency identifier
    pub identifier: String,

    /// Severity level
    pub severity: Severity,

    /// Category of the finding
    pub category: FindingCategory,

    /// Constraint text before the change
    pub before: Option<String>,

    /// Constraint text after the change
    pub after: Option<String>,

    /// Declaration location (after side when present)
    pub location: Location,

    /// Human-readable message
    pub message: String,

    /// Whether the old lower bound still satisfies the new constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_version_satisfied: Option<bool>,

    /// Suggested fix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Everything found for one before/after file pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// File under analysis
    pub file: PathBuf,
    /// Tag of the adapter used
    pub format: String,
    /// Dependencies declared before the change
    pub dependencies_before: usize,
    /// Dependencies declared after the change
    pub dependencies_after: usize,
    /// Findings in report order
    pub findings: Vec<Finding>,
}

impl FileReport {
    /// Check if any finding meets or exceeds `threshold`.
    #[must_use]
    pub fn has_blocking(&self, threshold: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= threshold)
    }
}

/// A file whose pipeline was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// File that failed
    pub file: PathBuf,
    /// Error kind (e.g. `duplicate-dependency`)
    pub kind: String,
    /// Error message
    pub message: String,
}

impl FileFailure {
    /// Record a file-local error.
    #[must_use]
    pub fn new(file: &Path, error: &crate::error::VerguardError) -> Self {
        Self {
            file: file.to_path_buf(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Results of one invocation across every file pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-file reports, sorted by path
    pub files: Vec<FileReport>,
    /// Files that could not be analyzed
    pub failures: Vec<FileFailure>,
}

impl RunReport {
    /// All findings across files.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.findings.iter())
    }

    /// Check if any finding meets or exceeds `threshold`.
    #[must_use]
    pub fn has_blocking(&self, threshold: Severity) -> bool {
        self.files.iter().any(|f| f.has_blocking(threshold))
    }

    /// Number of findings per severity, every severity present.
    #[must_use]
    pub fn counts_by_severity(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for finding in self.findings() {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Process exit code for this run.
    ///
    /// `1` when a finding meets the threshold, else `2` when any file
    /// failed, else `0`.
    #[must_use]
    pub fn exit_code(&self, threshold: Severity) -> u8 {
        if self.has_blocking(threshold) {
            1
        } else if !self.failures.is_empty() {
            2
        } else {
            0
        }
    }
}

/// Input for one file pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    /// Path used for adapter selection and locations
    pub path: PathBuf,
    /// Content before the change; `None` when the file did not exist
    pub before: Option<String>,
    /// Content after the change; `None` when the file was deleted
    pub after: Option<String>,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    /// Plain text format
    #[default]
    Text,
    /// JSON format
    Json,
}
