//! Built-in rule implementations.
//!
//! Every rule here implements [`Rule`](crate::core::Rule) and
//! [`FromSpec`](crate::core::FromSpec) and is registered by
//! [`RuleRegistry::with_builtins`](crate::core::RuleRegistry::with_builtins).
//!
//! | Type | Rule | Applies to | Fails when |
//! |---|---|---|---|
//! | `null_percentage` | [`NullPercentageRule`] | all columns | null % > `threshold` |
//! | `unique_value` | [`UniqueValueRule`] | all columns | distinct % < `threshold` |
//! | `value_range` | [`ValueRangeRule`] | integer, float | a value is outside the bounds |
//! | `pattern_match` | [`PatternMatchRule`] | all columns | a value does not match `pattern` |
//! | `allowed_values` | [`AllowedValuesRule`] | all columns | a value is not in `values` |
//! | `string_length` | [`StringLengthRule`] | string | a length is outside the allowed range |
//!
//! Rules without a `target_column` are evaluated against every column of the
//! dataset; inapplicable columns yield skipped outcomes.
//!
//! ## Usage
//!
//! ```rust
//! use canary_guard::core::{RuleEngine, RuleSet, RuleSpec};
//! use canary_guard::dataset::{Column, Dataset};
//!
//! let dataset = Dataset::new(vec![Column::new("age", vec![5i64, 12, 1500, 30])]).unwrap();
//! let rules = RuleSet::new(vec![RuleSpec::new("value_range")
//!     .with_target_column("age")
//!     .with_min_value(0.0)
//!     .with_max_value(1000.0)]);
//!
//! let report = RuleEngine::new().validate(&dataset, &rules).unwrap();
//! assert!(!report.overall_passed);
//! assert_eq!(report.outcomes[0].failing_samples[0].value, "1500");
//! ```

use crate::core::RuleSpec;

/// Implements the name, description and target accessors of
/// [`Rule`](crate::core::Rule) from a `meta: RuleMeta` field.
macro_rules! rule_meta_accessors {
    () => {
        fn name(&self) -> Option<&str> {
            self.meta.name.as_deref()
        }

        fn description(&self) -> Option<&str> {
            Some(&self.meta.description)
        }

        fn target_column(&self) -> Option<&str> {
            self.meta.target_column.as_deref()
        }
    };
}

mod allowed_values;
mod null_percentage;
mod pattern;
mod string_length;
mod uniqueness;
mod value_range;

pub use allowed_values::AllowedValuesRule;
pub use null_percentage::NullPercentageRule;
pub use pattern::PatternMatchRule;
pub use string_length::StringLengthRule;
pub use uniqueness::UniqueValueRule;
pub use value_range::{RangeBound, ValueRangeRule};

/// Identity shared by all built-in rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMeta {
    pub name: Option<String>,
    pub description: String,
    pub target_column: Option<String>,
}

impl RuleMeta {
    /// Takes name and target from the spec; the description falls back to
    /// `default_description` when the spec has none.
    pub fn from_spec(spec: &RuleSpec, default_description: impl FnOnce() -> String) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec
                .description
                .clone()
                .unwrap_or_else(default_description),
            target_column: spec.target_column.clone(),
        }
    }
}

/// Percentage of `total - failing` over `total`; 100 for an empty column.
pub(crate) fn conforming_percentage(failing: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        (total - failing) as f64 / total as f64 * 100.0
    }
}
