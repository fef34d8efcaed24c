//! Severity classification of reconciled pairs.
//!
//! # Rules
//!
//! | before    | after     | finding                                   |
//! |-----------|-----------|-------------------------------------------|
//! | bound     | removed   | none (`removed-safety-constraint` opt-in) |
//! | absent    | unbound   | `already-unbound` at base                 |
//! | bound     | unbound   | `newly-unbound` at base + 1               |
//! | unbound   | unbound   | `already-unbound` at base                 |
//! | bound     | bound     | `major-version-jump` at info, if any      |
//! | unbound   | bound     | none                                      |
//!
//! A constraint that does not parse yields an `informational` finding
//! instead. Severity overrides replace the computed level; critical
//! identifiers are then escalated one level, capped at `critical`.

use crate::config::ClassificationConfig;
use crate::constraint::{is_upgrade, ConstraintExpression, UpgradeKind};
use crate::types::{
    DependencyRecord, Finding, FindingCategory, ParsedConstraint, ReconciledPair, Severity,
};

/// Turns reconciled pairs into findings.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassificationConfig,
}

impl Classifier {
    /// Create a classifier over compiled classification settings.
    #[must_use]
    pub fn new(config: ClassificationConfig) -> Self {
        Self { config }
    }

    /// Classify one pair. Returns at most one finding.
    #[must_use]
    pub fn classify(&self, pair: &ReconciledPair) -> Option<Finding> {
        let finding = match pair {
            ReconciledPair::Removed(before) => self.removed(before),
            ReconciledPair::Added(after) => self.added(after),
            ReconciledPair::Both { before, after } => self.changed(before, after),
        }?;

        Some(self.finalize(finding, pair.latest()))
    }

    fn is_critical(&self, record: &DependencyRecord) -> bool {
        record.names().any(|name| self.config.is_critical(name))
    }

    fn removed(&self, before: &DependencyRecord) -> Option<Finding> {
        if !(self.config.report_removed_critical()
            && self.is_critical(before)
            && before.is_bound())
        {
            return None;
        }

        Some(Finding {
            identifier: before.identifier.clone(),
            severity: Severity::Info,
            category: FindingCategory::RemovedSafetyConstraint,
            before: Some(before.raw.clone()),
            after: None,
            location: before.location.clone(),
            message: format!(
                "Bound constraint '{}' for critical dependency {} was removed",
                display_raw(&before.raw),
                before.display_name()
            ),
            before_version_satisfied: None,
            suggestion: Some(format!(
                "Confirm {} is no longer required, or restore a bounded constraint",
                before.display_name()
            )),
        })
    }

    fn added(&self, after: &DependencyRecord) -> Option<Finding> {
        let expr = match &after.constraint {
            ParsedConstraint::Valid(expr) => expr,
            ParsedConstraint::Malformed { reason } => {
                return Some(malformed(None, after, &after.raw, reason));
            }
        };
        if expr.is_bound() {
            return None;
        }
        Some(self.already_unbound(None, after, expr))
    }

    fn changed(&self, before: &DependencyRecord, after: &DependencyRecord) -> Option<Finding> {
        let after_expr = match &after.constraint {
            ParsedConstraint::Valid(expr) => expr,
            ParsedConstraint::Malformed { reason } => {
                return Some(malformed(Some(before), after, &after.raw, reason));
            }
        };

        let before_expr = match &before.constraint {
            ParsedConstraint::Valid(expr) => expr,
            ParsedConstraint::Malformed { reason } => {
                // Nothing to compare against: judge the new constraint on its own.
                return match self.added(after) {
                    Some(mut finding) => {
                        finding.before = Some(before.raw.clone());
                        finding.message = format!(
                            "{} (previous constraint '{}' could not be parsed: {reason})",
                            finding.message, before.raw
                        );
                        Some(finding)
                    }
                    None => Some(malformed(Some(before), after, &before.raw, reason)),
                };
            }
        };

        let before_bound = before_expr.is_bound();
        let after_bound = after_expr.is_bound();
        tracing::trace!(
            identifier = %after.identifier,
            before_bound,
            after_bound,
            "Comparing constraints"
        );

        let mut finding = match (before_bound, after_bound) {
            (true, false) => {
                let mut finding = self.already_unbound(Some(before), after, after_expr);
                finding.category = FindingCategory::NewlyUnbound;
                finding.severity = self.config.base_unbound_severity().escalate();
                finding.message = format!(
                    "Version constraint for {} lost its upper bound: '{}' -> '{}'",
                    after.display_name(),
                    display_raw(&before.raw),
                    display_raw(&after.raw)
                );
                finding
            }
            (false, false) => self.already_unbound(Some(before), after, after_expr),
            (true, true) => self.major_jump(before, after, before_expr, after_expr)?,
            (false, true) => return None,
        };

        finding.before_version_satisfied = before_expr
            .lower_bound()
            .map(|version| after_expr.satisfies(version));
        Some(finding)
    }

    fn already_unbound(
        &self,
        before: Option<&DependencyRecord>,
        after: &DependencyRecord,
        expr: &ConstraintExpression,
    ) -> Finding {
        Finding {
            identifier: after.identifier.clone(),
            severity: self.config.base_unbound_severity(),
            category: FindingCategory::AlreadyUnbound,
            before: before.map(|b| b.raw.clone()),
            after: Some(after.raw.clone()),
            location: after.location.clone(),
            message: format!(
                "Unbound version constraint '{}' for {}",
                display_raw(&after.raw),
                after.display_name()
            ),
            before_version_satisfied: None,
            suggestion: Some(suggest_bound(expr)),
        }
    }

    fn major_jump(
        &self,
        before: &DependencyRecord,
        after: &DependencyRecord,
        before_expr: &ConstraintExpression,
        after_expr: &ConstraintExpression,
    ) -> Option<Finding> {
        if !self.config.report_major_jumps() {
            return None;
        }
        let from = before_expr.lower_bound()?;
        let to = after_expr.lower_bound()?;
        if is_upgrade(from, to) != UpgradeKind::Major {
            return None;
        }

        Some(Finding {
            identifier: after.identifier.clone(),
            severity: Severity::Info,
            category: FindingCategory::MajorVersionJump,
            before: Some(before.raw.clone()),
            after: Some(after.raw.clone()),
            location: after.location.clone(),
            message: format!(
                "Major version bump detected: {} changed from {from} to {to}",
                after.display_name()
            ),
            before_version_satisfied: None,
            suggestion: Some(format!(
                "Review breaking changes in {} changelog between versions {from} and {to}",
                after.display_name()
            )),
        })
    }

    /// Apply overrides, then critical escalation.
    fn finalize(&self, mut finding: Finding, record: &DependencyRecord) -> Finding {
        let computed = finding.severity;
        if let Some(severity) = record.names().find_map(|name| self.config.override_for(name)) {
            finding.severity = severity;
        }
        if self.is_critical(record) {
            finding.severity = finding.severity.escalate();
        }

        if finding.severity != computed {
            tracing::debug!(
                identifier = %finding.identifier,
                computed = %computed,
                severity = %finding.severity,
                "Adjusted finding severity"
            );
        }
        finding
    }
}

/// Informational finding for a constraint (`bad_raw`) that did not parse.
fn malformed(
    before: Option<&DependencyRecord>,
    after: &DependencyRecord,
    bad_raw: &str,
    reason: &str,
) -> Finding {
    Finding {
        identifier: after.identifier.clone(),
        severity: Severity::Info,
        category: FindingCategory::Informational,
        before: before.map(|b| b.raw.clone()),
        after: Some(after.raw.clone()),
        location: after.location.clone(),
        message: format!(
            "Could not parse version constraint '{bad_raw}' for {}: {reason}",
            after.display_name()
        ),
        before_version_satisfied: None,
        suggestion: Some("Use a constraint like '~> 1.2' or '>= 1.0, < 2.0'".to_string()),
    }
}

/// Suggested replacement for an unbound constraint.
fn suggest_bound(expr: &ConstraintExpression) -> String {
    match expr.lower_bound() {
        Some(v) if !expr.is_wildcard() => format!(
            "Consider using '~> {}.{}' to bound to major version {}",
            v.major, v.minor, v.major
        ),
        _ => "Use a specific version like '= 1.2.3' or a bounded constraint like '~> 1.2'"
            .to_string(),
    }
}

fn display_raw(raw: &str) -> &str {
    if raw.trim().is_empty() {
        "(none)"
    } else {
        raw
    }
}
