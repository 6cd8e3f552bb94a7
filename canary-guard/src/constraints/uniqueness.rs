//! Unique value rule.

use std::collections::HashSet;

use tracing::instrument;

use super::RuleMeta;
use crate::core::{BuildContext, ColumnContext, FromSpec, Rule, RuleOutcome, RuleSpec};
use crate::prelude::*;

/// Fails a column whose distinct percentage (distinct over non-null values)
/// is below the threshold.
///
/// A column without non-null values has no defined uniqueness. It fails
/// unless `allow_empty` is set on the spec or in the engine's
/// [`RuleDefaults`](crate::core::RuleDefaults).
///
/// Failing samples are the rows repeating an earlier value.
#[derive(Debug, Clone)]
pub struct UniqueValueRule {
    meta: RuleMeta,
    /// Minimum acceptable percentage of distinct values
    threshold: f64,
    allow_empty: bool,
}

impl UniqueValueRule {
    pub fn min_distinct_percentage(&self) -> f64 {
        self.threshold
    }

    pub fn allows_empty(&self) -> bool {
        self.allow_empty
    }
}

impl FromSpec for UniqueValueRule {
    const RULE_TYPE: &'static str = "unique_value";

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self> {
        let defaults = ctx.defaults();
        let threshold = ctx.percentage(
            "threshold",
            spec.threshold.as_ref(),
            defaults.unique_value_threshold,
        )?;
        Ok(Self {
            meta: RuleMeta::from_spec(spec, || {
                format!("Check if unique value percentage is at least {threshold}%")
            }),
            threshold,
            allow_empty: spec.allow_empty.unwrap_or(defaults.unique_value_allow_empty),
        })
    }
}

impl Rule for UniqueValueRule {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    rule_meta_accessors!();

    fn threshold(&self) -> Option<f64> {
        Some(self.threshold)
    }

    #[instrument(
        skip(self, ctx),
        fields(rule.column = %ctx.name(), rule.threshold = %self.threshold)
    )]
    fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
        let profile = ctx.profile;
        let name = self.outcome_name(ctx.name());

        if profile.non_null_count == 0 {
            let message = if self.allow_empty {
                "Column has no non-null values (allowed)"
            } else {
                "Column has no non-null values; uniqueness is undefined"
            };
            return Ok(RuleOutcome::from_check(
                self.allow_empty,
                name,
                Self::RULE_TYPE,
                ctx.name(),
                message,
            )
            .with_threshold(self.threshold)
            .with_detail("non_null_count", 0));
        }

        let unique_pct = profile.distinct_percentage;
        let passed = unique_pct >= self.threshold;
        let outcome = RuleOutcome::from_check(
            passed,
            name,
            Self::RULE_TYPE,
            ctx.name(),
            format!(
                "Column has {unique_pct:.2}% unique values (threshold: {}%)",
                self.threshold
            ),
        )
        .with_metric(unique_pct)
        .with_threshold(self.threshold)
        .with_detail("distinct_count", profile.distinct_count)
        .with_detail("non_null_count", profile.non_null_count);

        if passed {
            return Ok(outcome);
        }

        let mut seen = HashSet::new();
        let duplicates = ctx.scan(|value| !seen.insert(value.raw().into_owned()));
        Ok(outcome.with_failures(duplicates))
    }
}
