//! Verguard CLI entry point.
//!
//! This binary provides the command-line interface for Verguard.

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verguard::cli::{Cli, Commands, ReportArgs};
use verguard::git::GitRepository;
use verguard::reporter::Reporter;
use verguard::{Config, Detector, RunReport, VerguardError};

/// Configuration files looked up in the working directory.
const DEFAULT_CONFIG_PATHS: [&str; 3] = ["verguard.yaml", "verguard.yml", ".verguard.yaml"];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(exit_code) => ExitCode::from(exit_code),
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            let mut causes = e.chain().skip(1).peekable();
            if causes.peek().is_some() {
                eprintln!("\nCaused by:");
                for (i, cause) in causes.enumerate() {
                    eprintln!("  {i}: {cause}");
                }
            }

            let code = e
                .downcast_ref::<VerguardError>()
                .map_or(3, VerguardError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over -v
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,verguard={level}"))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    match cli.command {
        Commands::Check(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_report_args(&mut config, &args.report);
            let base_ref = args.base_ref.unwrap_or_else(|| config.git.base_ref.clone());
            tracing::debug!(
                base_ref = %base_ref,
                files = args.files.len(),
                "Executing check command"
            );

            let detector = Detector::new(config)?.with_format_tag(args.report.format_tag.clone());
            let repo = GitRepository::discover(Path::new(".")).await?;
            let report = detector.check_git(&repo, &args.files, &base_ref).await?;

            emit(detector.config(), &report, &args.report)
        }

        Commands::Diff(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_report_args(&mut config, &args.report);
            tracing::debug!(
                before = %args.before.display(),
                after = %args.after.display(),
                "Executing diff command"
            );

            let detector = Detector::new(config)?.with_format_tag(args.report.format_tag.clone());
            let report = detector.diff_files(&args.before, &args.after).await?;

            emit(detector.config(), &report, &args.report)
        }

        Commands::Init => {
            let config_path = Path::new(DEFAULT_CONFIG_PATHS[0]);

            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: {}", config_path.display());
            Ok(0)
        }

        Commands::Validate(args) => {
            let content = std::fs::read_to_string(&args.file)
                .map_err(|e| VerguardError::io(&args.file, e, file!(), line!()))?;
            match Config::from_yaml(&content) {
                Ok(_) => {
                    println!("Configuration is valid: {}", args.file.display());
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    Ok(e.exit_code())
                }
            }
        }
    }
}

/// Fold command-line report options into the configuration.
fn apply_report_args(config: &mut Config, args: &ReportArgs) {
    if let Some(fail_on) = args.fail_on {
        config.fail_on = fail_on;
    }
    // Plain text when the report goes to a file
    if args.output.is_some() {
        config.output.colored = false;
    }
}

/// Render the report, write it out and pick the exit code.
fn emit(config: &Config, report: &RunReport, args: &ReportArgs) -> anyhow::Result<u8> {
    let rendered = Reporter::new(config).generate(report, args.format)?;

    if let Some(output_path) = &args.output {
        std::fs::write(output_path, &rendered)
            .map_err(|e| VerguardError::io(output_path, e, file!(), line!()))?;
        tracing::info!(path = %output_path.display(), "Report written");
    } else {
        println!("{rendered}");
    }

    Ok(report.exit_code(config.fail_on))
}

/// Load the configuration used by `check` and `diff`.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    tracing::debug!("Loading configuration");
    if let Some(config_path) = explicit {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| VerguardError::io(config_path, e, file!(), line!()))?;
        return Ok(Config::from_yaml(&content)?);
    }

    for path in DEFAULT_CONFIG_PATHS.iter().map(Path::new) {
        if path.exists() {
            tracing::debug!(path = %path.display(), "Found configuration file");
            let content = std::fs::read_to_string(path)
                .map_err(|e| VerguardError::io(path, e, file!(), line!()))?;
            return Ok(Config::from_yaml(&content)?);
        }
    }

    tracing::debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}
