//! Error types for Verguard.
//!
//! This module defines the error hierarchy using `thiserror`. Every
//! variant records the crate source location it was raised from, which
//! keeps bug reports actionable without requiring a backtrace.
//!
//! # Error Categories
//!
//! - **Dependency-local**: a single malformed constraint. These never
//!   surface as errors from a run; the classifier turns them into
//!   informational findings.
//! - **File-local**: duplicate declarations, unparseable files, unknown
//!   formats, unreadable blobs. These abort one file's pipeline only.
//! - **Fatal**: configuration errors, rejected before any file is read.
//!
//! # Example
//!
//! ```rust
//! use verguard::error::{VerguardError, Result};
//!
//! fn read(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| VerguardError::io(path, e, file!(), line!()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigValue { key: "fail_on".to_string(), message: "bad".to_string() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::VerguardError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for Verguard operations.
pub type Result<T> = std::result::Result<T, VerguardError>;

/// The main error type for Verguard.
#[derive(Error, Debug)]
pub enum VerguardError {
    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Constraint and Extraction Errors
    // =========================================================================
    /// A raw constraint string matched no recognized grammar.
    #[error("Malformed version constraint '{constraint}' ({src_path}:{src_line}): {message}")]
    MalformedConstraint {
        /// The constraint text that failed to parse
        constraint: String,
        /// Why it failed
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The same identifier was declared twice in one extraction pass.
    #[error("Dependency '{identifier}' declared more than once in '{file}' (lines {first_line} and {second_line}) ({src_path}:{src_line})")]
    DuplicateDependency {
        /// The duplicated identifier
        identifier: String,
        /// The file being extracted
        file: PathBuf,
        /// Line of the first declaration
        first_line: usize,
        /// Line of the conflicting declaration
        second_line: usize,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The adapter could not parse the input as its target format.
    #[error("Failed to extract dependencies from '{file}' as {format} ({src_path}:{src_line}): {message}")]
    ExtractionFailure {
        /// The file being extracted
        file: PathBuf,
        /// The adapter's format tag
        format: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// No adapter is registered for the file.
    #[error("No extractor registered for '{file}' ({src_path}:{src_line})")]
    UnsupportedFormat {
        /// The file that could not be matched
        file: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Git Errors
    // =========================================================================
    /// Git operation error.
    #[error("Git error ({src_path}:{src_line}): {message}")]
    Git {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    /// Report generation error.
    #[error("Failed to generate report ({src_path}:{src_line}): {message}")]
    ReportGeneration {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl VerguardError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
        src_path: &'static str,
        src_line: u32,
    ) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates a `Git` error.
    #[must_use]
    pub fn git(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::Git { message, src_path, src_line }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::Internal { message, src_path, src_line }
    }

    /// Whether the error aborts only the file it was raised for.
    ///
    /// Configuration errors are the only ones that must stop the whole run.
    #[must_use]
    pub fn is_file_local(&self) -> bool {
        !matches!(self, Self::ConfigParse { .. } | Self::ConfigValue { .. })
    }

    /// Short machine-friendly name of the error kind, used in reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::FileNotFound { .. } => "file-not-found",
            Self::MalformedConstraint { .. } => "malformed-constraint",
            Self::DuplicateDependency { .. } => "duplicate-dependency",
            Self::ExtractionFailure { .. } => "extraction-failure",
            Self::UnsupportedFormat { .. } => "unsupported-format",
            Self::Git { .. } => "git",
            Self::ConfigParse { .. } => "config-parse",
            Self::ConfigValue { .. } => "config-value",
            Self::ReportGeneration { .. } => "report-generation",
            Self::Internal { .. } => "internal",
        }
    }

    /// Returns the appropriate process exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::FileNotFound { .. } => 14,
            Self::Git { .. } => 16,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            _ => 3,
        }
    }
}

impl From<serde_json::Error> for VerguardError {
    fn from(source: serde_json::Error) -> Self {
        Self::ReportGeneration {
            message: format!("JSON serialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<git2::Error> for VerguardError {
    fn from(source: git2::Error) -> Self {
        Self::Git {
            message: source.message().to_string(),
            src_path: file!(),
            src_line: line!(),
        }
    }
}
