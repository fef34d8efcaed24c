//! Report generation module.
//!
//! This module renders a [`RunReport`] in multiple formats:
//! - Text: Human-readable CLI output
//! - JSON: Machine-readable structured output
//!
//! # Example
//!
//! ```rust
//! use verguard::reporter::Reporter;
//! use verguard::types::{ReportFormat, RunReport};
//! use verguard::Config;
//!
//! let config = Config::default();
//! let reporter = Reporter::new(&config);
//!
//! let json = reporter.generate(&RunReport::default(), ReportFormat::Json).unwrap();
//! assert!(json.contains("\"has_blocking_findings\": false"));
//! ```

mod json;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::types::{ReportFormat, RunReport};

pub use json::JsonReporter;
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    ///
    /// `config.fail_on` is the threshold the report is judged against.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, report: &RunReport, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).generate(report),
            ReportFormat::Text => TextReporter::new(&self.config).generate(report),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from run results.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, report: &RunReport) -> Result<String>;
}
