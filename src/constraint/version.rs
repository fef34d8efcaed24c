//! Version parsing and upgrade magnitude.

use crate::error::Result;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Magnitude of a jump between two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    /// Not an upgrade (equal, or a downgrade)
    None,
    /// Patch component (or only the pre-release tag) moved forward
    Patch,
    /// Minor component moved forward
    Minor,
    /// Major component moved forward
    Major,
}

impl std::fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// Classify the jump from `before` to `after` by the leading differing
/// component.
///
/// Build metadata is ignored. A change that only promotes a pre-release
/// (e.g. `1.0.0-rc.1` to `1.0.0`) counts as a patch-level upgrade.
#[must_use]
pub fn is_upgrade(before: &Version, after: &Version) -> UpgradeKind {
    let b = (before.major, before.minor, before.patch, &before.pre);
    let a = (after.major, after.minor, after.patch, &after.pre);
    if a <= b {
        return UpgradeKind::None;
    }

    if after.major != before.major {
        UpgradeKind::Major
    } else if after.minor != before.minor {
        UpgradeKind::Minor
    } else {
        UpgradeKind::Patch
    }
}

/// Parse a version string, handling incomplete versions.
///
/// Accepts an optional `v` prefix, one to three numeric components, and
/// optional `-pre` / `+build` suffixes. Returns the version (missing
/// components filled with zero) and the number of components written,
/// which the `~>` operator needs.
///
/// # Errors
///
/// Returns `MalformedConstraint` if the text is not a version.
pub fn parse_version(s: &str) -> Result<(Version, usize)> {
    let text = s.trim();
    let text = text.strip_prefix('v').unwrap_or(text);

    let suffix_at = text.find(['-', '+']).unwrap_or(text.len());
    let (core, suffix) = text.split_at(suffix_at);

    let components: Vec<&str> = core.split('.').collect();
    if components.len() > 3 {
        return Err(malformed(s, "too many version components"));
    }
    if components
        .iter()
        .any(|c| c.is_empty() || !c.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(malformed(s, "expected a numeric version like 1.2.3"));
    }

    let precision = components.len();
    let mut padded = components.clone();
    padded.resize(3, "0");
    let normalized = format!("{}{suffix}", padded.join("."));

    let version = Version::parse(&normalized).map_err(|e| malformed(s, &e.to_string()))?;
    Ok((version, precision))
}

fn malformed(constraint: &str, message: &str) -> crate::error::VerguardError {
    crate::err!(MalformedConstraint {
        constraint: constraint.to_string(),
        message: message.to_string(),
    })
}
