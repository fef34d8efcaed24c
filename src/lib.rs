//! # Verguard
//!
//! Detects risky dependency version constraint changes between two
//! revisions of a configuration file.
//!
//! Verguard extracts the declared version constraints from the "before"
//! and "after" content of a file, classifies each constraint as bound
//! (upgrades are capped) or unbound (any future version is accepted), and
//! reports the changes that make a breaking upgrade more likely, most
//! importantly a bound constraint losing its ceiling.
//!
//! ## Features
//!
//! - **Constraint model**: `=`, `!=`, `>=`, `<=`, `>`, `<`, `~>`, `*` and
//!   comma-separated conjunctions
//! - **Pluggable formats**: Terraform HCL and Terraform JSON out of the box,
//!   more through [`parser::ExtractorRegistry::register`]
//! - **Git integration**: compare the working tree against any revision
//! - **Multiple output formats**: JSON and plain text reports
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use verguard::{Config, Detector, FindingCategory};
//!
//! let before = r#"
//! terraform {
//!   required_providers {
//!     aws = { source = "hashicorp/aws", version = "~> 4.0" }
//!   }
//! }
//! "#;
//! let after = before.replace("~> 4.0", ">= 4.0");
//!
//! let detector = Detector::new(Config::default()).unwrap();
//! let report = detector
//!     .analyze_texts(Path::new("versions.tf"), Some(before), Some(&after))
//!     .unwrap();
//!
//! assert_eq!(report.findings.len(), 1);
//! assert_eq!(report.findings[0].category, FindingCategory::NewlyUnbound);
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constraint;
pub mod error;
pub mod git;
pub mod parser;
pub mod reporter;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, VerguardError};
pub use types::{
    FileFailure, FileReport, FileSource, Finding, FindingCategory, ReportFormat, RunReport,
    Severity,
};

use crate::analyzer::Analyzer;
use crate::config::{ClassificationConfig, DuplicatePolicy};
use crate::git::GitRepository;
use crate::parser::{into_records, Adapter, ExtractorRegistry};
use crate::types::DependencyRecord;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Main entry point that runs file pipelines.
///
/// A `Detector` owns a validated configuration, the adapter registry and
/// the compiled classification settings. Each file pipeline is a pure
/// function of its two texts, so many files run in parallel.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use verguard::git::GitRepository;
/// use verguard::{Config, Detector, Severity};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let detector = Detector::new(Config::default())?;
///     let repo = GitRepository::discover(Path::new(".")).await?;
///
///     let report = detector.check_git(&repo, &[], "origin/main").await?;
///     println!("blocking: {}", report.has_blocking(Severity::Warning));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Detector {
    config: Config,
    registry: ExtractorRegistry,
    analyzer: Analyzer,
    format_tag: Option<String>,
}

impl Detector {
    /// Create a detector with the built-in adapters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` if the configuration does not validate. This
    /// happens before any file is read.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let classification = ClassificationConfig::compile(&config.classification)?;

        Ok(Self {
            analyzer: Analyzer::new(classification),
            registry: ExtractorRegistry::with_defaults(),
            config,
            format_tag: None,
        })
    }

    /// Replace the adapter registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Force one adapter for every file instead of matching file names.
    #[must_use]
    pub fn with_format_tag(mut self, tag: Option<String>) -> Self {
        self.format_tag = tag;
        self
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The adapter registry.
    #[must_use]
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Run one file pipeline.
    ///
    /// `None` stands for a file that does not exist on that side: no
    /// before text makes every dependency new, no after text makes every
    /// dependency a removal.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat`, `ExtractionFailure` or
    /// `DuplicateDependency`. All of them concern this file only.
    pub fn analyze_texts(
        &self,
        path: &Path,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<FileReport> {
        let adapter = self.registry.select(path, self.format_tag.as_deref())?;
        let policy = self.config.extraction.duplicate_policy;

        let before = extract_pass(adapter, path, before, policy)?;
        let after = extract_pass(adapter, path, after, policy)?;

        Ok(self.analyzer.analyze(path, adapter.tag(), before, after))
    }

    /// Run every pipeline in parallel and collect the results.
    ///
    /// Failing files are recorded in [`RunReport::failures`] without
    /// affecting the others. Both lists are sorted by path.
    #[must_use]
    pub fn analyze_sources(&self, sources: Vec<FileSource>) -> RunReport {
        tracing::info!(files = sources.len(), "Analyzing files");

        let outcomes: Vec<(PathBuf, Result<FileReport>)> = sources
            .into_par_iter()
            .map(|source| {
                let outcome = self.analyze_texts(
                    &source.path,
                    source.before.as_deref(),
                    source.after.as_deref(),
                );
                (source.path, outcome)
            })
            .collect();

        let mut report = RunReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(file) => report.files.push(file),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "File analysis failed");
                    report.failures.push(FileFailure::new(&path, &e));
                }
            }
        }

        report.files.sort_by(|a, b| a.file.cmp(&b.file));
        report.failures.sort_by(|a, b| a.file.cmp(&b.file));

        tracing::info!(
            files = report.files.len(),
            failures = report.failures.len(),
            findings = report.findings().count(),
            "Analysis complete"
        );

        report
    }

    /// Compare files at `base_ref` with the working tree.
    ///
    /// With no `files`, every changed file a registered adapter claims is
    /// checked. Paths are reported relative to the repository root.
    ///
    /// # Errors
    ///
    /// Returns `Git` if the changed files cannot be listed. Problems with a
    /// single file are recorded as failures instead.
    pub async fn check_git(
        &self,
        repo: &GitRepository,
        files: &[PathBuf],
        base_ref: &str,
    ) -> Result<RunReport> {
        let mut failures = Vec::new();

        let targets: Vec<PathBuf> = if files.is_empty() {
            repo.changed_files(base_ref)
                .await?
                .into_iter()
                .filter(|path| self.registry.supports(path))
                .collect()
        } else {
            let mut targets = Vec::with_capacity(files.len());
            for file in files {
                match repo.relative(file) {
                    Ok(path) => targets.push(path),
                    Err(e) => failures.push(FileFailure::new(file, &e)),
                }
            }
            targets
        };
        tracing::debug!(base_ref, files = targets.len(), "Selected files to check");

        let mut sources = Vec::with_capacity(targets.len());
        for path in targets {
            match read_revisions(repo, base_ref, &path).await {
                Ok(source) => sources.push(source),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Could not read file");
                    failures.push(FileFailure::new(&path, &e));
                }
            }
        }

        let mut report = self.analyze_in_background(sources).await?;
        report.failures.extend(failures);
        report.failures.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(report)
    }

    /// Compare two files on disk.
    ///
    /// A missing `before` is treated as a new file. The adapter is chosen
    /// from the `after` path.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if `after` does not exist, or `Io` if either
    /// file cannot be read.
    pub async fn diff_files(&self, before: &Path, after: &Path) -> Result<RunReport> {
        let after_text = git::read_optional(after).await?.ok_or_else(|| {
            crate::err!(FileNotFound {
                path: after.to_path_buf(),
            })
        })?;

        let before_text = git::read_optional(before).await?;
        if before_text.is_none() {
            tracing::info!(path = %before.display(), "Before file missing, treating as new");
        }

        self.analyze_in_background(vec![FileSource {
            path: after.to_path_buf(),
            before: before_text,
            after: Some(after_text),
        }])
        .await
    }

    /// [`Self::analyze_sources`] on the blocking pool, off the async workers.
    async fn analyze_in_background(&self, sources: Vec<FileSource>) -> Result<RunReport> {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.analyze_sources(sources))
            .await
            .map_err(|e| {
                VerguardError::internal(format!("analysis task failed: {e}"), file!(), line!())
            })
    }
}

fn extract_pass(
    adapter: &Adapter,
    path: &Path,
    text: Option<&str>,
    policy: DuplicatePolicy,
) -> Result<Vec<DependencyRecord>> {
    let Some(text) = text else {
        return Ok(Vec::new());
    };
    let raw = adapter.extract(path, text)?;
    into_records(raw, path, adapter.tag(), policy)
}

async fn read_revisions(repo: &GitRepository, base_ref: &str, path: &Path) -> Result<FileSource> {
    let before = repo.read_at_ref(base_ref, path).await?;
    let after = repo.read_working(path).await?;

    if before.is_none() && after.is_none() {
        return Err(crate::err!(FileNotFound {
            path: path.to_path_buf(),
        }));
    }

    Ok(FileSource {
        path: path.to_path_buf(),
        before,
        after,
    })
}
