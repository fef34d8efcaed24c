//! Constraint expressions: parsing, boundedness and satisfaction.

use super::version::parse_version;
use crate::error::Result;
use semver::Version;

/// A parsed version constraint.
///
/// Supports Terraform's constraint syntax:
/// - `= 1.0.0` or a bare `1.0.0` - Exact version
/// - `!= 1.0.0` - Excluded version
/// - `> 1.0.0`, `>= 1.0.0` - Lower bounds
/// - `< 1.0.0`, `<= 1.0.0` - Upper bounds
/// - `~> 1.0` - Compatible (rightmost component may increment)
/// - `*` or an empty string - Any version
/// - `>= 1.0, < 2.0` - Multiple constraints (AND)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintExpression {
    /// `= X.Y.Z`
    Exact(Version),
    /// `>= X.Y.Z`
    AtLeast(Version),
    /// `<= X.Y.Z`
    AtMost(Version),
    /// `> X.Y.Z`
    GreaterThan(Version),
    /// `< X.Y.Z`
    LessThan(Version),
    /// `!= X.Y.Z`
    Excluded(Version),
    /// `~> X.Y`
    Compatible {
        /// The version specified in the constraint
        version: Version,
        /// Number of version components written (1=X, 2=X.Y, 3=X.Y.Z)
        precision: usize,
    },
    /// `*`, or no constraint at all
    Wildcard,
    /// Comma-separated terms that must all hold
    Conjunction(Vec<ConstraintExpression>),
}

impl ConstraintExpression {
    /// Parse a raw constraint string.
    ///
    /// Whitespace around operators and terms is ignored. A single term is
    /// returned as-is; two or more comma-separated terms become a
    /// `Conjunction` in written order.
    ///
    /// # Errors
    ///
    /// Returns `MalformedConstraint` if any term matches no operator/version
    /// grammar.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::Wildcard);
        }

        let mut terms = trimmed
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| parse_term(raw, t))
            .collect::<Result<Vec<_>>>()?;

        match terms.len() {
            0 => Err(crate::err!(MalformedConstraint {
                constraint: raw.to_string(),
                message: "no constraint terms".to_string(),
            })),
            1 => Ok(terms.remove(0)),
            _ => Ok(Self::Conjunction(terms)),
        }
    }

    /// Whether the constraint caps future versions.
    ///
    /// `Exact`, `AtMost`, `LessThan` and `Compatible` are upper-bounding. A
    /// conjunction is bound as soon as one of its terms is; `Wildcard`
    /// contributes nothing.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        match self {
            Self::Exact(_) | Self::AtMost(_) | Self::LessThan(_) | Self::Compatible { .. } => true,
            Self::AtLeast(_) | Self::GreaterThan(_) | Self::Excluded(_) | Self::Wildcard => false,
            Self::Conjunction(terms) => terms.iter().any(Self::is_bound),
        }
    }

    /// Check if a concrete version satisfies this constraint.
    ///
    /// Best-effort: pre-release versions are compared with plain semver
    /// ordering, without Terraform's opt-in rules.
    #[must_use]
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            Self::Exact(v) => version == v,
            Self::AtLeast(v) => version >= v,
            Self::AtMost(v) => version <= v,
            Self::GreaterThan(v) => version > v,
            Self::LessThan(v) => version < v,
            Self::Excluded(v) => version != v,
            Self::Compatible { version: v, precision } => {
                version >= v && *version < compatible_upper_bound(v, *precision)
            }
            Self::Wildcard => true,
            Self::Conjunction(terms) => terms.iter().all(|t| t.satisfies(version)),
        }
    }

    /// The highest lower bound stated by the constraint, if any.
    #[must_use]
    pub fn lower_bound(&self) -> Option<&Version> {
        match self {
            Self::Exact(v)
            | Self::AtLeast(v)
            | Self::GreaterThan(v)
            | Self::Compatible { version: v, .. } => Some(v),
            Self::AtMost(_) | Self::LessThan(_) | Self::Excluded(_) | Self::Wildcard => None,
            Self::Conjunction(terms) => terms.iter().filter_map(Self::lower_bound).max(),
        }
    }

    /// Returns true for `*` and empty constraints.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

impl std::fmt::Display for ConstraintExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "= {v}"),
            Self::AtLeast(v) => write!(f, ">= {v}"),
            Self::AtMost(v) => write!(f, "<= {v}"),
            Self::GreaterThan(v) => write!(f, "> {v}"),
            Self::LessThan(v) => write!(f, "< {v}"),
            Self::Excluded(v) => write!(f, "!= {v}"),
            Self::Compatible { version, precision } => match precision {
                1 => write!(f, "~> {}", version.major),
                2 => write!(f, "~> {}.{}", version.major, version.minor),
                _ => write!(f, "~> {version}"),
            },
            Self::Wildcard => write!(f, "*"),
            Self::Conjunction(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse a single comma-free term.
fn parse_term(raw: &str, term: &str) -> Result<ConstraintExpression> {
    if term == "*" {
        return Ok(ConstraintExpression::Wildcard);
    }

    // Two-character operators must be tried before their one-character prefixes.
    const OPERATORS: &[&str] = &["~>", ">=", "<=", "!=", ">", "<", "="];

    let (op, version_text) = OPERATORS
        .iter()
        .find_map(|op| term.strip_prefix(*op).map(|rest| (*op, rest.trim())))
        .unwrap_or(("", term));

    if version_text.is_empty() {
        return Err(crate::err!(MalformedConstraint {
            constraint: raw.to_string(),
            message: format!("operator '{op}' is missing a version"),
        }));
    }

    let (version, precision) = parse_version(version_text).map_err(|e| match e {
        crate::error::VerguardError::MalformedConstraint { message, .. } => {
            crate::err!(MalformedConstraint {
                constraint: raw.to_string(),
                message: format!("'{term}': {message}"),
            })
        }
        other => other,
    })?;

    Ok(match op {
        "~>" => ConstraintExpression::Compatible { version, precision },
        ">=" => ConstraintExpression::AtLeast(version),
        "<=" => ConstraintExpression::AtMost(version),
        "!=" => ConstraintExpression::Excluded(version),
        ">" => ConstraintExpression::GreaterThan(version),
        "<" => ConstraintExpression::LessThan(version),
        _ => ConstraintExpression::Exact(version),
    })
}

/// Upper bound (exclusive) for a compatible constraint.
///
/// `~> X.Y.Z` allows `< X.(Y+1).0`; `~> X.Y` and `~> X` allow `< (X+1).0.0`.
fn compatible_upper_bound(v: &Version, precision: usize) -> Version {
    if precision >= 3 {
        Version::new(v.major, v.minor + 1, 0)
    } else {
        Version::new(v.major + 1, 0, 0)
    }
}
