//! Version constraint model.
//!
//! This module turns raw constraint text such as `">= 1.0, < 2.0"` into a
//! [`ConstraintExpression`] and answers the questions the classifier needs:
//!
//! - **Boundedness**: does the constraint cap future versions?
//! - **Satisfaction**: does a concrete version meet the constraint?
//! - **Upgrade magnitude**: how far apart are two versions?
//!
//! Versions are [`semver::Version`]s; incomplete versions like `1.2` are
//! padded with zeros and their written precision is kept for `~>`.
//!
//! # Example
//!
//! ```rust
//! use verguard::constraint::ConstraintExpression;
//!
//! let expr = ConstraintExpression::parse(">= 4.0, < 5.0").unwrap();
//! assert!(expr.is_bound());
//! assert!(!ConstraintExpression::parse(">= 4.0").unwrap().is_bound());
//! ```

mod expression;
mod version;

pub use expression::ConstraintExpression;
pub use semver::Version;
pub use version::{is_upgrade, parse_version, UpgradeKind};
