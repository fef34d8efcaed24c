//! Terraform (HCL) adapter.
//!
//! This module extracts version constraints using the `hcl-rs` crate.
//!
//! # Supported Constructs
//!
//! - `terraform.required_providers` entries, in object form
//!   (`aws = { source = "hashicorp/aws", version = "~> 5.0" }`) or the
//!   legacy string form (`aws = ">= 4.0"`)
//! - `module` blocks with a `version` attribute or a registry source,
//!   identified by their address (`module.vpc`) so two instances of the
//!   same registry module stay distinct

use super::locate::LineLocator;
use super::source::is_registry_source;
use super::TERRAFORM;
use crate::error::Result;
use crate::types::RawDependency;

use hcl::{Block, Body, Expression};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

static REQUIRED_PROVIDERS_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*required_providers\s*\{").expect("Invalid regex"));

/// Extract provider and module constraints from HCL text.
///
/// A provider without a `version` yields an empty constraint; its
/// identifier is the `source` when given, else the attribute key.
///
/// # Errors
///
/// Returns `ExtractionFailure` if the text is not valid HCL.
pub fn extract_terraform(text: &str) -> Result<Vec<RawDependency>> {
    let body: Body = hcl::from_str(text).map_err(|e| {
        crate::err!(ExtractionFailure {
            file: PathBuf::new(),
            format: TERRAFORM.to_string(),
            message: e.to_string(),
        })
    })?;

    let mut locator = LineLocator::new(text);
    let provider_headers = locator.all(&REQUIRED_PROVIDERS_HEADER);
    let mut provider_blocks = 0;
    let mut deps = Vec::new();

    for structure in body.into_inner() {
        let hcl::Structure::Block(block) = structure else {
            continue;
        };

        match block.identifier.as_str() {
            "terraform" => {
                for nested in block.body.blocks() {
                    if nested.identifier.as_str() != "required_providers" {
                        continue;
                    }
                    let from = provider_headers.get(provider_blocks).copied().unwrap_or(1);
                    provider_blocks += 1;
                    deps.extend(required_providers(nested, from, &mut locator));
                }
            }
            "module" => {
                if let Some(dep) = module_dependency(&block, &mut locator) {
                    deps.push(dep);
                }
            }
            _ => {
                // resource, data, variable, provider configuration, ...
            }
        }
    }

    tracing::trace!(dependencies = deps.len(), "Extracted HCL dependencies");
    Ok(deps)
}

/// Entries of one `required_providers` block.
fn required_providers(
    block: &Block,
    from: usize,
    locator: &mut LineLocator<'_>,
) -> Vec<RawDependency> {
    block
        .body
        .attributes()
        .map(|attr| {
            let key = attr.key.as_str();
            let (source, version) = provider_requirement(&attr.expr);
            let line = locator.claim_key(key, from);
            RawDependency::new(
                source.unwrap_or_else(|| key.to_string()),
                version.unwrap_or_default(),
                line,
            )
        })
        .collect()
}

/// Split a provider requirement into its source and version.
fn provider_requirement(expr: &Expression) -> (Option<String>, Option<String>) {
    match expr {
        // legacy pre-0.13 form: aws = ">= 4.0"
        Expression::String(version) => (None, Some(version.clone())),
        Expression::Object(obj) => {
            let mut source = None;
            let mut version = None;
            for (key, value) in obj {
                match object_key_to_string(key).as_str() {
                    "source" => source = expression_to_string(value),
                    "version" => version = expression_to_string(value),
                    _ => {
                        // configuration_aliases
                    }
                }
            }
            (source, version)
        }
        other => (None, expression_to_string(other)),
    }
}

/// A module block as a dependency, if it is versioned or registry-sourced.
fn module_dependency(block: &Block, locator: &mut LineLocator<'_>) -> Option<RawDependency> {
    let label = block.labels.first().map(|l| l.as_str().to_string());

    let Some(source) = get_string_attribute(&block.body, "source") else {
        tracing::debug!(module = ?label, "Module block without a literal source, skipping");
        return None;
    };
    let version = block
        .body
        .attributes()
        .find(|attr| attr.key.as_str() == "version")
        .and_then(|attr| expression_to_string(&attr.expr));

    if version.is_none() && !is_registry_source(&source) {
        return None;
    }

    let line = label
        .as_deref()
        .and_then(|l| Regex::new(&format!(r#"^\s*module\s+"{}"\s*\{{"#, regex::escape(l))).ok())
        .map_or(0, |re| locator.claim(&re, 1));

    let address = label.map_or_else(|| source.clone(), |l| format!("module.{l}"));
    Some(RawDependency::new(address, version.unwrap_or_default(), line).with_source(source))
}

/// Get a literal string attribute from a body.
fn get_string_attribute(body: &Body, key: &str) -> Option<String> {
    body.attributes()
        .find(|attr| attr.key.as_str() == key)
        .and_then(|attr| match &attr.expr {
            Expression::String(s) => Some(s.clone()),
            _ => None,
        })
}

/// Render an expression as constraint text.
///
/// Non-literal expressions (`var.aws_version`, templates) are kept as
/// written so the constraint parser reports them as malformed.
fn expression_to_string(expr: &Expression) -> Option<String> {
    match expr {
        Expression::String(s) => Some(s.clone()),
        Expression::Number(n) => Some(n.to_string()),
        Expression::Null => None,
        other => hcl::format::to_string(other).ok(),
    }
}

/// Convert an object key to a string.
fn object_key_to_string(key: &hcl::ObjectKey) -> String {
    match key {
        hcl::ObjectKey::Identifier(id) => id.as_str().to_string(),
        hcl::ObjectKey::Expression(expr) => expression_to_string(expr).unwrap_or_default(),
        _ => String::new(),
    }
}
