//! Pairing before and after declarations by identifier.

use crate::config::ClassificationConfig;
use crate::types::{DependencyRecord, ReconciledPair};
use std::collections::HashMap;

/// Align two extraction passes by identifier.
///
/// Pairs come out in after-declaration order, followed by removed
/// dependencies in before-declaration order. Pairs whose identifier or
/// source is ignored are dropped. Both inputs are expected to hold unique
/// identifiers.
#[must_use]
pub fn reconcile(
    before: Vec<DependencyRecord>,
    after: Vec<DependencyRecord>,
    classification: &ClassificationConfig,
) -> Vec<ReconciledPair> {
    let mut before_order: Vec<String> = Vec::with_capacity(before.len());
    let mut remaining: HashMap<String, DependencyRecord> = HashMap::with_capacity(before.len());
    for record in before {
        before_order.push(record.identifier.clone());
        remaining.insert(record.identifier.clone(), record);
    }

    let mut pairs = Vec::with_capacity(after.len() + remaining.len());
    for record in after {
        let pair = match remaining.remove(&record.identifier) {
            Some(previous) => ReconciledPair::Both {
                before: previous,
                after: record,
            },
            None => ReconciledPair::Added(record),
        };
        pairs.push(pair);
    }

    for identifier in before_order {
        if let Some(record) = remaining.remove(&identifier) {
            pairs.push(ReconciledPair::Removed(record));
        }
    }

    let total = pairs.len();
    pairs.retain(|pair| {
        !pair
            .latest()
            .names()
            .any(|name| classification.is_ignored(name))
    });
    if pairs.len() != total {
        tracing::debug!(ignored = total - pairs.len(), "Dropped ignored dependencies");
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassificationOptions;
    use crate::types::RawDependency;
    use std::path::Path;

    fn records(deps: &[(&str, &str)]) -> Vec<DependencyRecord> {
        deps.iter()
            .enumerate()
            .map(|(i, (id, c))| {
                DependencyRecord::from_raw(
                    RawDependency::new(*id, *c, i + 1),
                    Path::new("main.tf"),
                    "terraform",
                )
            })
            .collect()
    }

    fn shape(pair: &ReconciledPair) -> (&str, &'static str) {
        let kind = match pair {
            ReconciledPair::Both { .. } => "both",
            ReconciledPair::Removed(_) => "removed",
            ReconciledPair::Added(_) => "added",
        };
        (pair.identifier(), kind)
    }

    #[test]
    fn test_reconcile_shapes_and_order() {
        let before = records(&[("aws", ">= 4.0"), ("old", "~> 1.0"), ("kubernetes", "~> 2.0")]);
        let after = records(&[("kubernetes", "~> 2.0"), ("random", "*"), ("aws", ">= 4.0")]);

        let pairs = reconcile(before, after, &ClassificationConfig::default());
        let shapes: Vec<_> = pairs.iter().map(shape).collect();
        assert_eq!(
            shapes,
            vec![
                ("kubernetes", "both"),
                ("random", "added"),
                ("aws", "both"),
                ("old", "removed"),
            ]
        );
    }

    #[test]
    fn test_reconcile_keeps_both_sides() {
        let pairs = reconcile(
            records(&[("foo", "~> 1.0")]),
            records(&[("foo", ">= 1.0")]),
            &ClassificationConfig::default(),
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].before().map(|r| r.raw.as_str()), Some("~> 1.0"));
        assert_eq!(pairs[0].after().map(|r| r.raw.as_str()), Some(">= 1.0"));
    }

    #[test]
    fn test_reconcile_drops_ignored() {
        let options = ClassificationOptions {
            ignore_packages: vec!["hashicorp/*".to_string()],
            ..ClassificationOptions::default()
        };
        let classification = ClassificationConfig::compile(&options).unwrap();

        let pairs = reconcile(
            records(&[("hashicorp/null", "*")]),
            records(&[("hashicorp/null", "*"), ("acme/thing", "*")]),
            &classification,
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].identifier(), "acme/thing");
    }

    #[test]
    fn test_reconcile_drops_modules_by_source() {
        let options = ClassificationOptions {
            ignore_packages: vec!["terraform-aws-modules/s3-bucket/aws".to_string()],
            ..ClassificationOptions::default()
        };
        let classification = ClassificationConfig::compile(&options).unwrap();
        let module = DependencyRecord::from_raw(
            RawDependency::new("module.logs", "*", 1)
                .with_source("terraform-aws-modules/s3-bucket/aws"),
            Path::new("main.tf"),
            "terraform",
        );

        let pairs = reconcile(Vec::new(), vec![module], &classification);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_reconcile_empty() {
        assert!(reconcile(Vec::new(), Vec::new(), &ClassificationConfig::default()).is_empty());
    }
}
