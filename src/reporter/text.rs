//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{FileReport, Finding, RunReport, Severity};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    /// Severity that fails the run
    fail_on: Severity,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
            verbose: config.output.verbose,
            fail_on: config.fail_on,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header());
        output.push('\n');

        output.push_str(&self.format_summary(report));
        output.push('\n');

        if report.findings().next().is_some() {
            output.push_str(&self.format_findings(report));
            output.push('\n');
        }

        if !report.failures.is_empty() {
            output.push_str(&self.format_failures(report));
            output.push('\n');
        }

        if self.verbose && !report.files.is_empty() {
            output.push_str(&self.format_files(&report.files));
            output.push('\n');
        }

        output.push_str(&self.format_footer(report));

        Ok(output)
    }
}

impl TextReporter {
    fn section(&self, title: &str) -> String {
        let title = if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        format!("\n{title}\n{}\n", "-".repeat(80))
    }

    /// Format the report header.
    fn format_header(&self) -> String {
        let title = "Verguard Analysis";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                format!("({timestamp})").dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {version} ({timestamp})\n{}\n", "=".repeat(80))
        }
    }

    /// Format the summary section.
    fn format_summary(&self, report: &RunReport) -> String {
        let mut output = self.section("Summary");

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Severity", "Findings"]);

        for (severity, count) in report.counts_by_severity().into_iter().rev() {
            let label = Cell::new(severity.to_string());
            let label = match (self.use_colors, severity) {
                (false, _) => label,
                (true, Severity::Critical) => label.fg(Color::Red),
                (true, Severity::Warning) => label.fg(Color::Yellow),
                (true, Severity::Info) => label.fg(Color::Blue),
            };
            table.add_row(vec![label, Cell::new(count)]);
        }

        output.push_str(&table.to_string());
        output.push('\n');

        output.push_str(&format!(
            "  {} files analyzed | {} failed | fail on {}\n",
            report.files.len(),
            report.failures.len(),
            self.fail_on,
        ));

        output
    }

    /// Format the findings section.
    fn format_findings(&self, report: &RunReport) -> String {
        let mut output = self.section("Findings");

        // Files are already in path order and findings in report order.
        for finding in report.findings() {
            output.push_str(&self.format_finding(finding));
        }

        output
    }

    /// Format a single finding.
    fn format_finding(&self, finding: &Finding) -> String {
        let label = finding.severity.to_string();
        let severity_str = if self.use_colors {
            match finding.severity {
                Severity::Critical => label.red().bold().to_string(),
                Severity::Warning => label.yellow().to_string(),
                Severity::Info => label.blue().to_string(),
            }
        } else {
            label
        };

        let mut output = format!(
            "\n  [{severity_str}] {} ({})\n",
            finding.message, finding.category
        );

        let before = finding.before.as_deref().map_or("(absent)", display_constraint);
        let after = finding.after.as_deref().map_or("(absent)", display_constraint);
        let mut details = vec![
            format!("    -> {}", finding.location),
            format!("    {before} => {after}"),
        ];
        if let Some(satisfied) = finding.before_version_satisfied {
            let verdict = if satisfied { "still" } else { "no longer" };
            details.push(format!(
                "    previous lower bound {verdict} satisfies the new constraint"
            ));
        }

        for line in details {
            if self.use_colors {
                output.push_str(&line.dimmed().to_string());
            } else {
                output.push_str(&line);
            }
            output.push('\n');
        }

        if let Some(suggestion) = &finding.suggestion {
            let sugg_str = if self.use_colors {
                format!("    Suggestion: {suggestion}").green().to_string()
            } else {
                format!("    Suggestion: {suggestion}")
            };
            output.push_str(&sugg_str);
            output.push('\n');
        }

        output
    }

    /// Format files that could not be analyzed.
    fn format_failures(&self, report: &RunReport) -> String {
        let mut output = self.section("Failures");

        for failure in &report.failures {
            let kind = if self.use_colors {
                failure.kind.red().to_string()
            } else {
                failure.kind.clone()
            };
            output.push_str(&format!(
                "\n  [{kind}] {}\n    {}\n",
                get_contextual_path(&failure.file, 3),
                failure.message
            ));
        }

        output
    }

    /// Format the per-file table.
    fn format_files(&self, files: &[FileReport]) -> String {
        let mut output = self.section("Files");

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["File", "Format", "Before", "After", "Findings"]);

        for file in files {
            let findings = Cell::new(file.findings.len());
            let findings = match (self.use_colors, file.has_blocking(self.fail_on)) {
                (false, _) => findings,
                (true, true) => findings.fg(Color::Red),
                (true, false) => findings.fg(Color::Green),
            };

            table.add_row(vec![
                Cell::new(get_contextual_path(&file.file, 3)),
                Cell::new(&file.format),
                Cell::new(file.dependencies_before),
                Cell::new(file.dependencies_after),
                findings,
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');

        output
    }

    /// Format the report footer.
    fn format_footer(&self, report: &RunReport) -> String {
        let status = if report.has_blocking(self.fail_on) {
            let text = format!("FAILED - findings at or above {}", self.fail_on);
            if self.use_colors {
                text.red().bold().to_string()
            } else {
                text
            }
        } else if !report.failures.is_empty() {
            let text = "INCOMPLETE - some files could not be analyzed";
            if self.use_colors {
                text.yellow().bold().to_string()
            } else {
                text.to_string()
            }
        } else if report.findings().next().is_some() {
            let text = format!("PASSED - no findings at or above {}", self.fail_on);
            if self.use_colors {
                text.yellow().to_string()
            } else {
                text
            }
        } else {
            "PASSED - No issues found".to_string()
        };

        format!("\n{status}\n\n")
    }
}

/// Show an empty constraint as `(none)`.
fn display_constraint(raw: &str) -> &str {
    if raw.trim().is_empty() {
        "(none)"
    } else {
        raw
    }
}

/// Get last N path components for display.
/// Example: /Users/foo/projects/terraform/env/prod/main.tf -> env/prod/main.tf
fn get_contextual_path(path: &std::path::Path, depth: usize) -> String {
    let components: Vec<_> = path.components().collect();
    let start_idx = components.len().saturating_sub(depth);

    components[start_idx..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
