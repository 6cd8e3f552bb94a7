//! Null percentage rule.

use tracing::instrument;

use super::RuleMeta;
use crate::core::{BuildContext, ColumnContext, FromSpec, Rule, RuleOutcome, RuleSpec};
use crate::prelude::*;

/// Fails a column whose null percentage exceeds the threshold.
///
/// An empty column has 0% nulls and always passes.
#[derive(Debug, Clone)]
pub struct NullPercentageRule {
    meta: RuleMeta,
    /// Maximum acceptable percentage of nulls
    threshold: f64,
}

impl NullPercentageRule {
    pub fn max_null_percentage(&self) -> f64 {
        self.threshold
    }
}

impl FromSpec for NullPercentageRule {
    const RULE_TYPE: &'static str = "null_percentage";

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self> {
        let threshold = ctx.percentage(
            "threshold",
            spec.threshold.as_ref(),
            ctx.defaults().null_percentage_threshold,
        )?;
        Ok(Self {
            meta: RuleMeta::from_spec(spec, || {
                format!("Check if null percentage is at most {threshold}%")
            }),
            threshold,
        })
    }
}

impl Rule for NullPercentageRule {
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
        let null_pct = if profile.row_count == 0 {
            0.0
        } else {
            profile.null_percentage
        };
        let passed = null_pct <= self.threshold;

        let mut outcome = RuleOutcome::from_check(
            passed,
            self.outcome_name(ctx.name()),
            Self::RULE_TYPE,
            ctx.name(),
            format!(
                "Column has {null_pct:.2}% nulls (threshold: {}%)",
                self.threshold
            ),
        )
        .with_metric(null_pct)
        .with_threshold(self.threshold)
        .with_detail("null_count", profile.null_count)
        .with_detail("row_count", profile.row_count);

        if !passed {
            outcome.failing_row_count = profile.null_count;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::{build, run};
    use crate::core::OutcomeStatus;
    use crate::dataset::{Column, Value};

    fn spec(threshold: f64) -> RuleSpec {
        RuleSpec::new("null_percentage").with_threshold(threshold)
    }

    #[test]
    fn test_passes_at_threshold() {
        let outcomes = run(
            spec(25.0),
            vec![Column::new("email", vec![Some("a"), None, Some("b"), Some("c")])],
        );
        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert!(outcome.passed());
        assert_eq!(outcome.rule_name, "null_percentage_email");
        assert_eq!(outcome.metric, Some(25.0));
        assert_eq!(outcome.threshold, Some(25.0));
        assert_eq!(outcome.message, "Column has 25.00% nulls (threshold: 25%)");
    }

    #[test]
    fn test_fails_above_threshold() {
        let outcomes = run(
            spec(10.0).with_name("email_nulls"),
            vec![Column::new("email", vec![Some("a"), None, None, Some("c")])],
        );
        let outcome = &outcomes[0];
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.rule_name, "email_nulls");
        assert_eq!(outcome.failing_row_count, 2);
        assert_eq!(outcome.details.get("null_count").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_empty_dataset_passes_with_zero_threshold() {
        let outcomes = run(
            spec(0.0),
            vec![
                Column::new("a", Vec::<Value>::new()),
                Column::new("b", Vec::<Value>::new()),
            ],
        );
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.passed() && o.metric == Some(0.0)));
    }

    #[test]
    fn test_threshold_validation() {
        let err = build(RuleSpec::new("null_percentage")).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'threshold'"));

        let err = build(spec(150.0)).unwrap_err();
        assert!(err.to_string().contains("between 0 and 100"));

        let err = build(RuleSpec::new("null_percentage").with_threshold("lots")).unwrap_err();
        assert!(err.to_string().contains("'lots' is not a number"));
    }

    #[test]
    fn test_default_threshold_from_defaults() {
        use crate::core::{RuleDefaults, RuleRegistry};

        let rule = RuleRegistry::with_builtins()
            .build(&RuleSpec::new("null_percentage"), 0, &RuleDefaults::lenient())
            .unwrap();
        assert_eq!(rule.threshold(), Some(5.0));
        assert_eq!(
            rule.description(),
            Some("Check if null percentage is at most 5%")
        );
    }
}
