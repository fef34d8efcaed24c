//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `check`: Compare files at a git revision with the working tree
//! - `diff`: Compare two files on disk
//! - `init`: Create an example configuration file
//! - `validate`: Validate a configuration file
//!
//! # Example Usage
//!
//! ```bash
//! # Check every changed Terraform file against the previous commit
//! verguard check
//!
//! # Check specific files against a branch, failing only on critical findings
//! verguard check infra/versions.tf --base-ref origin/main --fail-on critical
//!
//! # Compare two files and write a JSON report
//! verguard diff old/versions.tf new/versions.tf --format json --output report.json
//!
//! # Initialize configuration
//! verguard init
//!
//! # Validate configuration
//! verguard validate verguard.yaml
//! ```

use crate::types::{ReportFormat, Severity};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Verguard - flags risky dependency version constraint changes.
#[derive(Parser, Debug)]
#[command(
    name = "verguard",
    author,
    version,
    about = "Flags risky dependency version constraint changes between two revisions of a file",
    long_about = "Verguard extracts version constraints from the before and after content of \
                  configuration files, classifies each as bound or unbound, and reports \
                  changes that make a breaking upgrade more likely."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "VERGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare files at a git revision with the working tree
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Compare two files on disk
    #[command(visible_alias = "d")]
    Diff(DiffArgs),

    /// Create an example configuration file
    Init,

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Report options shared by `check` and `diff`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: ReportFormat,

    /// Fail when a finding is at or above this severity (overrides config)
    #[arg(long, value_enum, value_name = "SEVERITY")]
    pub fail_on: Option<Severity>,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Use this extractor for every file instead of matching file names
    #[arg(long, value_name = "TAG")]
    pub format_tag: Option<String>,
}

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Files to check (all changed supported files if empty)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Revision to compare against (overrides config)
    #[arg(short, long, value_name = "REF")]
    pub base_ref: Option<String>,

    /// Report options
    #[command(flatten)]
    pub report: ReportArgs,
}

/// Arguments for the diff command.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// File before the change (may be missing for a new file)
    #[arg(value_name = "BEFORE")]
    pub before: PathBuf,

    /// File after the change
    #[arg(value_name = "AFTER")]
    pub after: PathBuf,

    /// Report options
    #[command(flatten)]
    pub report: ReportArgs,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(value_name = "FILE", default_value = "verguard.yaml")]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_defaults() {
        let cli = Cli::parse_from(["verguard", "check"]);
        match cli.command {
            Commands::Check(args) => {
                assert!(args.files.is_empty());
                assert!(args.base_ref.is_none());
                assert_eq!(args.report.format, ReportFormat::Text);
                assert!(args.report.fail_on.is_none());
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_check_with_options() {
        let cli = Cli::parse_from([
            "verguard",
            "check",
            "versions.tf",
            "modules.tf",
            "--base-ref",
            "origin/main",
            "--format",
            "json",
            "--fail-on",
            "critical",
            "--output",
            "report.json",
        ]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.base_ref.as_deref(), Some("origin/main"));
                assert_eq!(args.report.format, ReportFormat::Json);
                assert_eq!(args.report.fail_on, Some(Severity::Critical));
                assert_eq!(args.report.output, Some(PathBuf::from("report.json")));
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_diff_command() {
        let cli = Cli::parse_from([
            "verguard",
            "diff",
            "old.tf",
            "new.tf",
            "--format-tag",
            "terraform",
        ]);
        match cli.command {
            Commands::Diff(args) => {
                assert_eq!(args.before, PathBuf::from("old.tf"));
                assert_eq!(args.after, PathBuf::from("new.tf"));
                assert_eq!(args.report.format_tag.as_deref(), Some("terraform"));
            }
            _ => panic!("Expected Diff command"),
        }
    }

    #[test]
    fn test_diff_requires_both_files() {
        assert!(Cli::try_parse_from(["verguard", "diff", "old.tf"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["verguard", "-vv", "validate", "--config", "custom.yaml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.file, PathBuf::from("verguard.yaml")),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_unknown_severity_rejected() {
        assert!(Cli::try_parse_from(["verguard", "check", "--fail-on", "error"]).is_err());
    }
}
