//! Terraform JSON syntax (`*.tf.json`) adapter.
//!
//! Blocks appear as nested objects; Terraform also accepts an array of
//! objects wherever a block body may repeat.

use super::locate::LineLocator;
use super::source::is_registry_source;
use super::TERRAFORM_JSON;
use crate::error::Result;
use crate::types::RawDependency;

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Extract provider and module constraints from Terraform JSON.
///
/// # Errors
///
/// Returns `ExtractionFailure` if the text is not JSON or its top level
/// is not an object.
pub fn extract_terraform_json(text: &str) -> Result<Vec<RawDependency>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let root: Value = serde_json::from_str(text).map_err(|e| failure(e.to_string()))?;
    let Value::Object(root) = root else {
        return Err(failure("top-level value must be an object".to_string()));
    };

    let mut locator = LineLocator::new(text);
    let mut deps = Vec::new();

    for terraform in root.get("terraform").map(objects).unwrap_or_default() {
        for providers in terraform.get("required_providers").map(objects).unwrap_or_default() {
            for (key, requirement) in providers {
                let (source, version) = match requirement {
                    Value::String(version) => (None, Some(version.clone())),
                    Value::Object(obj) => {
                        (string_field(obj, "source"), string_field(obj, "version"))
                    }
                    _ => (None, None),
                };
                let line = locator.claim_key(key, 1);
                deps.push(RawDependency::new(
                    source.unwrap_or_else(|| key.clone()),
                    version.unwrap_or_default(),
                    line,
                ));
            }
        }
    }

    for modules in root.get("module").map(objects).unwrap_or_default() {
        for (label, body) in modules {
            for body in objects(body) {
                let Some(source) = string_field(body, "source") else {
                    continue;
                };
                let version = string_field(body, "version");
                if version.is_none() && !is_registry_source(&source) {
                    continue;
                }
                let line = locator.claim_key(label, 1);
                deps.push(
                    RawDependency::new(format!("module.{label}"), version.unwrap_or_default(), line)
                        .with_source(source),
                );
            }
        }
    }

    tracing::trace!(dependencies = deps.len(), "Extracted JSON dependencies");
    Ok(deps)
}

/// The object, or the objects of an array.
fn objects(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn failure(reason: String) -> crate::error::VerguardError {
    crate::err!(ExtractionFailure {
        file: PathBuf::new(),
        format: TERRAFORM_JSON.to_string(),
        message: reason,
    })
}
