//! Allowed values rule.

use std::collections::BTreeSet;

use tracing::instrument;

use super::{conforming_percentage, RuleMeta};
use crate::core::{BuildContext, ColumnContext, FromSpec, Rule, RuleOutcome, RuleSpec};
use crate::prelude::*;

/// Fails a column with any non-null value outside a fixed set.
///
/// Values are compared by their raw text, so `1` in the configuration
/// matches both the integer `1` and the text `"1"`.
#[derive(Debug, Clone)]
pub struct AllowedValuesRule {
    meta: RuleMeta,
    allowed: BTreeSet<String>,
}

impl AllowedValuesRule {
    pub fn allowed_values(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl FromSpec for AllowedValuesRule {
    const RULE_TYPE: &'static str = "allowed_values";

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self> {
        let values = spec
            .values
            .as_ref()
            .ok_or_else(|| ctx.error("missing required parameter 'values'"))?;
        if values.is_empty() {
            return Err(ctx.error("'values' must not be empty"));
        }

        let allowed = values
            .iter()
            .map(|value| {
                scalar_text(value).ok_or_else(|| {
                    ctx.error(format!(
                        "'values' entries must be strings, numbers or booleans, found {value}"
                    ))
                })
            })
            .collect::<Result<BTreeSet<_>>>()?;

        Ok(Self {
            meta: RuleMeta::from_spec(spec, || {
                format!("Check if values are one of {} allowed values", allowed.len())
            }),
            allowed,
        })
    }
}

impl Rule for AllowedValuesRule {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    rule_meta_accessors!();

    #[instrument(skip(self, ctx), fields(rule.column = %ctx.name()))]
    fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
        let failures = ctx.scan(|value| !self.allowed.contains(&*value.raw()));
        let total = ctx.profile.non_null_count;

        let message = if failures.is_empty() {
            format!("All {total} non-null values are allowed")
        } else {
            format!(
                "{} of {total} non-null values are not in the allowed set",
                failures.count
            )
        };

        Ok(RuleOutcome::from_check(
            failures.is_empty(),
            self.outcome_name(ctx.name()),
            Self::RULE_TYPE,
            ctx.name(),
            message,
        )
        .with_metric(conforming_percentage(failures.count, total))
        .with_detail("allowed_count", self.allowed.len())
        .with_failures(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::{build, run};
    use crate::dataset::Column;
    use serde_json::json;

    #[test]
    fn test_values_outside_set_fail() {
        let outcomes = run(
            RuleSpec::new("allowed_values")
                .with_target_column("status")
                .with_values(vec![json!("active"), json!("inactive")]),
            vec![Column::new(
                "status",
                vec![Some("active"), Some("deleted"), None, Some("inactive")],
            )],
        );
        let outcome = &outcomes[0];
        assert!(outcome.is_failed());
        assert_eq!(outcome.failing_row_count, 1);
        assert_eq!(outcome.failing_samples[0].row, 1);
        assert_eq!(outcome.failing_samples[0].value, "deleted");
        assert!((outcome.metric.unwrap() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_numbers_and_booleans_compare_by_text() {
        let outcomes = run(
            RuleSpec::new("allowed_values").with_values(vec![json!(1), json!(2), json!(true)]),
            vec![
                Column::new("level", vec![1i64, 2, 2]),
                Column::new("code", vec!["1", "3"]),
                Column::new("flag", vec![true, true]),
            ],
        );
        assert!(outcomes[0].passed());
        assert!(outcomes[1].is_failed());
        assert_eq!(outcomes[1].failing_samples[0].value, "3");
        assert!(outcomes[2].passed());
    }

    #[test]
    fn test_invalid_values() {
        let err = build(RuleSpec::new("allowed_values")).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'values'"));

        let err = build(
            RuleSpec::new("allowed_values").with_values(Vec::<serde_json::Value>::new()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let err = build(RuleSpec::new("allowed_values").with_values(vec![json!({"a": 1})]))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
