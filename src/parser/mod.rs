//! Dependency extraction for supported file formats.
//!
//! An adapter turns the raw text of one file revision into a list of
//! [`RawDependency`] declarations. Adapters are plain function values kept
//! in an [`ExtractorRegistry`] under a format tag, together with the file
//! name patterns they claim.
//!
//! # Built-in Formats
//!
//! - `terraform-json`: `*.tf.json` (Terraform's JSON syntax)
//! - `terraform`: `*.tf` (HCL)
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use verguard::parser::ExtractorRegistry;
//!
//! let registry = ExtractorRegistry::with_defaults();
//! let adapter = registry.select(Path::new("versions.tf"), None).unwrap();
//! assert_eq!(adapter.tag(), "terraform");
//!
//! let deps = adapter
//!     .extract(Path::new("versions.tf"), "terraform {\n  required_providers {\n    aws = \">= 4.0\"\n  }\n}\n")
//!     .unwrap();
//! assert_eq!(deps[0].identifier, "aws");
//! ```

mod hcl;
mod json;
mod locate;
mod source;

pub use self::hcl::extract_terraform;
pub use self::json::extract_terraform_json;
pub use source::is_registry_source;

use crate::config::DuplicatePolicy;
use crate::error::{Result, VerguardError};
use crate::types::{DependencyRecord, RawDependency};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Format tag of the HCL Terraform adapter.
pub const TERRAFORM: &str = "terraform";

/// Format tag of the JSON Terraform adapter.
pub const TERRAFORM_JSON: &str = "terraform-json";

/// Capability implemented by every format adapter.
///
/// Adapters are stateless: the same text always yields the same
/// declarations. Valid input without declarations yields an empty list.
pub trait Extractor: Send + Sync {
    /// Extract raw declarations from one revision of a file.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionFailure` if the text is not valid in the
    /// adapter's format.
    fn extract(&self, text: &str) -> Result<Vec<RawDependency>>;
}

impl<F> Extractor for F
where
    F: Fn(&str) -> Result<Vec<RawDependency>> + Send + Sync,
{
    fn extract(&self, text: &str) -> Result<Vec<RawDependency>> {
        self(text)
    }
}

/// A registered adapter: its tag, claimed file patterns and extractor.
#[derive(Clone)]
pub struct Adapter {
    tag: String,
    patterns: Vec<glob::Pattern>,
    extractor: Arc<dyn Extractor>,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("tag", &self.tag)
            .field("patterns", &self.patterns.iter().map(glob::Pattern::as_str).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// The adapter's format tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the file name matches one of the adapter's patterns.
    #[must_use]
    pub fn claims(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Run the extractor on `text`, attributing failures to `file`.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error with `file` filled in.
    pub fn extract(&self, file: &Path, text: &str) -> Result<Vec<RawDependency>> {
        self.extractor.extract(text).map_err(|e| match e {
            VerguardError::ExtractionFailure { format, message, src_path, src_line, .. } => {
                VerguardError::ExtractionFailure {
                    file: file.to_path_buf(),
                    format,
                    message,
                    src_path,
                    src_line,
                }
            }
            other => other,
        })
    }
}

/// Adapters keyed by format tag, consulted in registration order.
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    adapters: Vec<Adapter>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Terraform adapters.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.adapters.push(builtin(TERRAFORM_JSON, "*.tf.json", extract_terraform_json));
        registry.adapters.push(builtin(TERRAFORM, "*.tf", extract_terraform));
        registry
    }

    /// Register an adapter, replacing any adapter with the same tag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` if a file pattern is not a valid glob.
    pub fn register<E>(&mut self, tag: &str, patterns: &[&str], extractor: E) -> Result<()>
    where
        E: Extractor + 'static,
    {
        let patterns = patterns
            .iter()
            .map(|p| crate::config::compile_pattern("extraction.patterns", p))
            .collect::<Result<Vec<_>>>()?;

        let adapter = Adapter {
            tag: tag.to_string(),
            patterns,
            extractor: Arc::new(extractor),
        };

        match self.adapters.iter_mut().find(|a| a.tag == tag) {
            Some(existing) => *existing = adapter,
            None => self.adapters.push(adapter),
        }

        tracing::debug!(tag, "Registered extractor");
        Ok(())
    }

    /// Registered format tags in lookup order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.tag.as_str())
    }

    /// Look up an adapter by tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Adapter> {
        self.adapters.iter().find(|a| a.tag == tag)
    }

    /// Whether any adapter claims the file.
    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.adapters.iter().any(|a| a.claims(path))
    }

    /// Choose the adapter for a file.
    ///
    /// An explicit tag wins; otherwise the first adapter whose pattern
    /// matches the file name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the tag is unknown or nothing matches.
    pub fn select(&self, path: &Path, explicit_tag: Option<&str>) -> Result<&Adapter> {
        let found = match explicit_tag {
            Some(tag) => self.get(tag),
            None => self.adapters.iter().find(|a| a.claims(path)),
        };

        found.ok_or_else(|| {
            crate::err!(UnsupportedFormat {
                file: path.to_path_buf(),
            })
        })
    }
}

fn builtin(
    tag: &str,
    pattern: &str,
    extractor: fn(&str) -> Result<Vec<RawDependency>>,
) -> Adapter {
    Adapter {
        tag: tag.to_string(),
        // built-in patterns are literals known to compile
        patterns: glob::Pattern::new(pattern).into_iter().collect(),
        extractor: Arc::new(extractor),
    }
}

/// Turn one extraction pass into records with unique identifiers.
///
/// # Errors
///
/// Returns `DuplicateDependency` under [`DuplicatePolicy::Reject`] when an
/// identifier is declared twice.
pub fn into_records(
    raw: Vec<RawDependency>,
    file: &Path,
    format: &str,
    policy: DuplicatePolicy,
) -> Result<Vec<DependencyRecord>> {
    let mut records: Vec<DependencyRecord> = Vec::with_capacity(raw.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for dep in raw {
        let record = DependencyRecord::from_raw(dep, file, format);

        let Some(&pos) = index.get(&record.identifier) else {
            index.insert(record.identifier.clone(), records.len());
            records.push(record);
            continue;
        };

        let first = &records[pos];
        match policy {
            DuplicatePolicy::Reject => {
                return Err(crate::err!(DuplicateDependency {
                    identifier: record.identifier,
                    file: file.to_path_buf(),
                    first_line: first.location.line,
                    second_line: record.location.line,
                }));
            }
            DuplicatePolicy::KeepMostRestrictive => {
                tracing::debug!(
                    identifier = %record.identifier,
                    first_line = first.location.line,
                    second_line = record.location.line,
                    "Merging duplicate declaration"
                );
                if record.is_bound() && !first.is_bound() {
                    records[pos] = record;
                }
            }
        }
    }

    Ok(records)
}
