//! Module source classification.
//!
//! Only registry modules carry a version constraint that Terraform
//! resolves; git, HTTP, bucket and local sources pin through the URL or
//! not at all.

use regex::Regex;
use std::sync::LazyLock;

static REGISTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: namespace/name/provider or hostname/namespace/name/provider
    Regex::new(r"^(?:[a-zA-Z0-9.-]+/)?[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+$")
        .expect("Invalid regex")
});

/// Prefixes of sources that are fetched rather than resolved from a registry.
const NON_REGISTRY_PREFIXES: &[&str] = &[
    "./", "../", "/", "git::", "git@", "hg::", "s3::", "s3://", "gcs::", "http://", "https://",
    "github.com/", "bitbucket.org/",
];

/// Whether a module source names a registry module
/// (`[hostname/]namespace/name/provider`).
///
/// # Examples
///
/// ```rust
/// use verguard::parser::is_registry_source;
///
/// assert!(is_registry_source("terraform-aws-modules/vpc/aws"));
/// assert!(is_registry_source("app.terraform.io/acme/network/aws"));
/// assert!(!is_registry_source("../modules/vpc"));
/// assert!(!is_registry_source("git::https://example.com/vpc.git"));
/// ```
#[must_use]
pub fn is_registry_source(source: &str) -> bool {
    let source = source.trim();
    if NON_REGISTRY_PREFIXES.iter().any(|p| source.starts_with(p)) {
        return false;
    }
    REGISTRY_PATTERN.is_match(source)
}
