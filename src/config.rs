//! Configuration module for Verguard.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`verguard.yaml`)
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # verguard.yaml
//!
//! # Severity that makes the run exit non-zero
//! fail_on: warning
//!
//! classification:
//!   base_unbound_severity: warning
//!   critical_packages:
//!     - hashicorp/aws
//!   severity_overrides:
//!     "hashicorp/random": info
//!   ignore_packages: []
//!   report_major_jumps: true
//!   report_removed_critical: false
//!
//! extraction:
//!   duplicate_policy: reject
//!
//! git:
//!   base_ref: HEAD~1
//!
//! output:
//!   colored: true
//!   verbose: false
//!   pretty: true
//! ```

use crate::error::{Result, VerguardError};
use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationOptions {
    /// Severity of an unbound constraint before any escalation.
    pub base_unbound_severity: Severity,

    /// Identifier patterns (glob) whose findings are escalated one level.
    pub critical_packages: Vec<String>,

    /// Identifier pattern (glob) to severity replacing the computed one.
    pub severity_overrides: BTreeMap<String, Severity>,

    /// Identifier patterns (glob) never reported.
    pub ignore_packages: Vec<String>,

    /// Report bound-to-bound changes whose lower bound jumps a major version.
    pub report_major_jumps: bool,

    /// Report removal of a bound constraint on a critical dependency.
    pub report_removed_critical: bool,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            base_unbound_severity: Severity::Warning,
            critical_packages: vec![
                "hashicorp/aws".to_string(),
                "hashicorp/kubernetes".to_string(),
            ],
            severity_overrides: BTreeMap::new(),
            ignore_packages: Vec::new(),
            report_major_jumps: true,
            report_removed_critical: false,
        }
    }
}

/// What to do when one extraction pass declares an identifier twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the file with `DuplicateDependency`
    #[default]
    Reject,
    /// Keep a bound declaration over an unbound one, else the first
    KeepMostRestrictive,
}

/// Extraction options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Duplicate identifier handling.
    pub duplicate_policy: DuplicatePolicy,
}

/// Git options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitOptions {
    /// Revision the working tree is compared against.
    pub base_ref: String,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            base_ref: "HEAD~1".to_string(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            verbose: false,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Findings at or above this severity fail the run
    pub fail_on: Severity,

    /// Classification options
    pub classification: ClassificationOptions,

    /// Extraction options
    pub extraction: ExtractionOptions,

    /// Git options
    pub git: GitOptions,

    /// Output options
    pub output: OutputOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_on: Severity::Warning,
            classification: ClassificationOptions::default(),
            extraction: ExtractionOptions::default(),
            git: GitOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a value fails validation.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");

        let config: Config = serde_yaml::from_str(content).map_err(|e| {
            crate::err!(ConfigParse {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })
        })?;
        config.validate()?;

        tracing::debug!(
            critical = config.classification.critical_packages.len(),
            overrides = config.classification.severity_overrides.len(),
            ignored = config.classification.ignore_packages.len(),
            fail_on = %config.fail_on,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Reject configurations the core cannot use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for an invalid identifier pattern or an empty
    /// base ref.
    pub fn validate(&self) -> Result<()> {
        ClassificationConfig::compile(&self.classification)?;

        if self.git.base_ref.trim().is_empty() {
            return Err(crate::err!(ConfigValue {
                key: "git.base_ref".to_string(),
                message: "must not be empty".to_string(),
            }));
        }

        Ok(())
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# Verguard Configuration File

# Findings at or above this severity make the run exit non-zero
# (info | warning | critical)
fail_on: warning

classification:
  # Severity of an unbound constraint (">= 1.0", "*", missing) before escalation.
  # A bound constraint that loses its ceiling is reported one level higher.
  base_unbound_severity: warning

  # Identifiers (glob patterns) whose findings are escalated one level
  critical_packages:
    - hashicorp/aws
    - hashicorp/kubernetes

  # Fixed severity for matching identifiers (critical escalation still applies)
  # severity_overrides:
  #   "hashicorp/random": info

  # Identifiers that are never reported
  # ignore_packages:
  #   - "hashicorp/null"

  # Report bound -> bound changes whose lower bound jumps a major version
  report_major_jumps: true

  # Report removal of a bound constraint on a critical dependency
  report_removed_critical: false

extraction:
  # Same dependency declared twice in one file: reject | keep_most_restrictive
  duplicate_policy: reject

git:
  # Revision the working tree is compared against
  base_ref: HEAD~1

output:
  # Use colored output in terminal
  colored: true

  # Show per-file dependency counts
  verbose: false

  # Pretty-print JSON output
  pretty: true
"#
        .to_string()
    }
}

/// Compiled, read-only classification settings consumed by the analyzer.
#[derive(Debug, Clone)]
pub struct ClassificationConfig {
    base_unbound_severity: Severity,
    critical: Vec<glob::Pattern>,
    overrides: Vec<(glob::Pattern, Severity)>,
    ignored: Vec<glob::Pattern>,
    report_major_jumps: bool,
    report_removed_critical: bool,
}

impl ClassificationConfig {
    /// Compile the classification section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for an invalid pattern.
    pub fn compile(options: &ClassificationOptions) -> Result<Self> {
        let compile_all = |key: &str, patterns: &[String]| {
            patterns
                .iter()
                .map(|p| compile_pattern(key, p))
                .collect::<Result<Vec<_>>>()
        };

        // Literal identifiers win over globs; BTreeMap keeps the rest ordered.
        let (mut literal, mut globbed): (Vec<_>, Vec<_>) = options
            .severity_overrides
            .iter()
            .partition(|(pattern, _)| !pattern.contains(['*', '?', '[']));
        literal.append(&mut globbed);
        let overrides = literal
            .into_iter()
            .map(|(p, s)| Ok((compile_pattern("classification.severity_overrides", p)?, *s)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_unbound_severity: options.base_unbound_severity,
            critical: compile_all("classification.critical_packages", &options.critical_packages)?,
            overrides,
            ignored: compile_all("classification.ignore_packages", &options.ignore_packages)?,
            report_major_jumps: options.report_major_jumps,
            report_removed_critical: options.report_removed_critical,
        })
    }

    /// Severity of an unbound constraint before escalation.
    #[must_use]
    pub fn base_unbound_severity(&self) -> Severity {
        self.base_unbound_severity
    }

    /// Whether the identifier matches a critical pattern.
    #[must_use]
    pub fn is_critical(&self, identifier: &str) -> bool {
        self.critical.iter().any(|p| p.matches(identifier))
    }

    /// The override severity for the identifier, if any pattern matches.
    #[must_use]
    pub fn override_for(&self, identifier: &str) -> Option<Severity> {
        self.overrides
            .iter()
            .find(|(p, _)| p.matches(identifier))
            .map(|(_, s)| *s)
    }

    /// Whether the identifier is never reported.
    #[must_use]
    pub fn is_ignored(&self, identifier: &str) -> bool {
        self.ignored.iter().any(|p| p.matches(identifier))
    }

    /// Whether bound-to-bound major jumps are reported.
    #[must_use]
    pub fn report_major_jumps(&self) -> bool {
        self.report_major_jumps
    }

    /// Whether removing a critical dependency's bound constraint is reported.
    #[must_use]
    pub fn report_removed_critical(&self) -> bool {
        self.report_removed_critical
    }
}

impl Default for ClassificationConfig {
    /// The compiled form of [`ClassificationOptions::default`].
    fn default() -> Self {
        let options = ClassificationOptions::default();
        Self::compile(&options).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Built-in classification patterns did not compile");
            Self {
                base_unbound_severity: options.base_unbound_severity,
                critical: Vec::new(),
                overrides: Vec::new(),
                ignored: Vec::new(),
                report_major_jumps: options.report_major_jumps,
                report_removed_critical: options.report_removed_critical,
            }
        })
    }
}

/// Compile a glob pattern, naming the config key on failure.
pub(crate) fn compile_pattern(key: &str, pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(pattern).map_err(|e| VerguardError::ConfigValue {
        key: key.to_string(),
        message: format!("invalid pattern '{pattern}': {e}"),
        src_path: file!(),
        src_line: line!(),
    })
}
