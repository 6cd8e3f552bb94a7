//! Value range rule.

use std::fmt;

use tracing::instrument;

use super::{conforming_percentage, RuleMeta};
use crate::analyzers::inference::{parse_integer, parse_number};
use crate::analyzers::InferredType;
use crate::core::{
    BuildContext, ColumnContext, FromSpec, NumericParam, Rule, RuleOutcome, RuleSpec,
};
use crate::prelude::*;

/// One end of the allowed range.
///
/// `exact` is set when the configured value is a whole number that fits in an
/// `i64`; integer columns compare against it without going through `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBound {
    pub value: f64,
    pub exact: Option<i64>,
}

impl RangeBound {
    fn resolve(
        ctx: &BuildContext<'_>,
        field: &str,
        param: Option<&NumericParam>,
    ) -> Result<Option<Self>> {
        Ok(ctx.number(field, param)?.map(|value| RangeBound {
            value,
            exact: param.and_then(NumericParam::as_integer),
        }))
    }

    /// Smallest integer at or above this bound.
    fn integer_ceil(&self) -> i128 {
        self.exact.map_or(self.value.ceil() as i128, i128::from)
    }

    /// Largest integer at or below this bound.
    fn integer_floor(&self) -> i128 {
        self.exact.map_or(self.value.floor() as i128, i128::from)
    }

    fn exceeds(&self, other: &RangeBound) -> bool {
        match (self.exact, other.exact) {
            (Some(a), Some(b)) => a > b,
            _ => self.value > other.value,
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exact {
            Some(exact) => write!(f, "{exact}"),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Fails a numeric column with any value outside `[min_value, max_value]`.
///
/// Both bounds are inclusive and at least one is required. Columns that are
/// not inferred as integer or float are skipped. Integer columns are compared
/// exactly; float columns compare as `f64`.
#[derive(Debug, Clone)]
pub struct ValueRangeRule {
    meta: RuleMeta,
    min_value: Option<RangeBound>,
    max_value: Option<RangeBound>,
}

impl ValueRangeRule {
    pub fn bounds(&self) -> (Option<RangeBound>, Option<RangeBound>) {
        (self.min_value, self.max_value)
    }

    fn contains_float(&self, value: f64) -> bool {
        self.min_value.map_or(true, |min| value >= min.value)
            && self.max_value.map_or(true, |max| value <= max.value)
    }

    fn contains_integer(&self, value: i64) -> bool {
        let value = i128::from(value);
        self.min_value.map_or(true, |min| value >= min.integer_ceil())
            && self.max_value.map_or(true, |max| value <= max.integer_floor())
    }

    /// `None` when the value cannot be read as a number.
    fn accepts(&self, value: &Value, integer_column: bool) -> Option<bool> {
        if integer_column {
            if let Some(integer) = parse_integer(value) {
                return Some(self.contains_integer(integer));
            }
        }
        parse_number(value).map(|number| self.contains_float(number))
    }

    fn expectation(&self) -> String {
        expectation(self.min_value, self.max_value)
    }
}

fn expectation(min_value: Option<RangeBound>, max_value: Option<RangeBound>) -> String {
    match (min_value, max_value) {
        (Some(min), Some(max)) => format!("{min} to {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => "any value".to_string(),
    }
}

impl FromSpec for ValueRangeRule {
    const RULE_TYPE: &'static str = "value_range";

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self> {
        let min_value = RangeBound::resolve(ctx, "min_value", spec.min_value.as_ref())?;
        let max_value = RangeBound::resolve(ctx, "max_value", spec.max_value.as_ref())?;

        match (min_value, max_value) {
            (None, None) => {
                return Err(ctx.error("value_range requires 'min_value', 'max_value' or both"))
            }
            (Some(min), Some(max)) if min.exceeds(&max) => {
                return Err(ctx.error(format!(
                    "min_value ({min}) is greater than max_value ({max})"
                )))
            }
            _ => {}
        }

        Ok(Self {
            meta: RuleMeta::from_spec(spec, || {
                format!("Check if values are {}", expectation(min_value, max_value))
            }),
            min_value,
            max_value,
        })
    }
}

impl Rule for ValueRangeRule {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    rule_meta_accessors!();

    fn applies_to(&self, inferred_type: InferredType) -> bool {
        inferred_type.is_numeric()
    }

    #[instrument(skip(self, ctx), fields(rule.column = %ctx.name()))]
    fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
        let integer_column = ctx.profile.inferred_type == InferredType::Integer;
        let mut unreadable = None;
        let failures = ctx.scan(|value| match self.accepts(value, integer_column) {
            Some(accepted) => !accepted,
            None => {
                unreadable.get_or_insert_with(|| value.raw().into_owned());
                false
            }
        });

        if let Some(raw) = unreadable {
            return Err(CanaryError::evaluation(
                self.outcome_name(ctx.name()),
                ctx.name(),
                format!("value '{raw}' is not numeric"),
            ));
        }

        let profile = ctx.profile;
        let observed = match (&profile.min, &profile.max) {
            (Some(min), Some(max)) => format!("Values range from {min} to {max}"),
            _ => "Column has no values".to_string(),
        };
        let message = if failures.is_empty() {
            format!("{observed} (expected: {})", self.expectation())
        } else {
            format!(
                "{observed} (expected: {}); {} values out of range",
                self.expectation(),
                failures.count
            )
        };

        let mut outcome = RuleOutcome::from_check(
            failures.is_empty(),
            self.outcome_name(ctx.name()),
            Self::RULE_TYPE,
            ctx.name(),
            message,
        )
        .with_metric(conforming_percentage(failures.count, profile.non_null_count));

        if let Some(min) = &profile.min {
            outcome = outcome.with_detail("actual_min", min);
        }
        if let Some(max) = &profile.max {
            outcome = outcome.with_detail("actual_max", max);
        }
        if let Some(min) = self.min_value {
            outcome = outcome.with_detail("expected_min", min);
        }
        if let Some(max) = self.max_value {
            outcome = outcome.with_detail("expected_max", max);
        }
        Ok(outcome.with_failures(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::{build, run};
    use crate::core::OutcomeStatus;
    use crate::dataset::Column;

    fn spec(min: Option<f64>, max: Option<f64>) -> RuleSpec {
        let mut spec = RuleSpec::new("value_range");
        if let Some(min) = min {
            spec = spec.with_min_value(min);
        }
        if let Some(max) = max {
            spec = spec.with_max_value(max);
        }
        spec
    }

    #[test]
    fn test_out_of_range_value_fails() {
        let outcomes = run(
            spec(Some(0.0), Some(1000.0)),
            vec![Column::new("age", vec![5i64, 12, 1500, 30])],
        );
        let outcome = &outcomes[0];
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.failing_row_count, 1);
        assert_eq!(outcome.failing_samples[0].row, 2);
        assert_eq!(outcome.failing_samples[0].value, "1500");
        assert_eq!(outcome.metric, Some(75.0));
        assert_eq!(outcome.details.get("actual_max").map(String::as_str), Some("1500"));
        assert!(outcome.message.starts_with("Values range from 5 to 1500 (expected: 0 to 1000)"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let outcomes = run(
            spec(Some(1.5), Some(3.0)),
            vec![Column::new("score", vec![Some(1.5), None, Some(3.0)])],
        );
        assert!(outcomes[0].passed());
        assert_eq!(outcomes[0].metric, Some(100.0));
    }

    #[test]
    fn test_single_bound() {
        let outcomes = run(
            spec(None, Some(10.0)),
            vec![Column::new("n", vec!["-4", "11", "12"])],
        );
        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[0].failing_row_count, 2);
        assert!(outcomes[0].message.contains("expected: at most 10"));
    }

    #[test]
    fn test_integers_beyond_f64_precision_compare_exactly() {
        // 2^53 + 1 rounds to 2^53 as an f64.
        let outcomes = run(
            RuleSpec::new("value_range").with_max_value(9_007_199_254_740_992i64),
            vec![Column::new("id", vec![9_007_199_254_740_993i64])],
        );
        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[0].failing_row_count, 1);
        assert_eq!(outcomes[0].failing_samples[0].value, "9007199254740993");
        assert_eq!(
            outcomes[0].details.get("expected_max").map(String::as_str),
            Some("9007199254740992")
        );

        let outcomes = run(
            RuleSpec::new("value_range")
                .with_min_value("9007199254740993")
                .with_max_value(i64::MAX),
            vec![Column::new("id", vec![9_007_199_254_740_992i64, i64::MAX])],
        );
        assert_eq!(outcomes[0].failing_row_count, 1);
        assert_eq!(outcomes[0].failing_samples[0].row, 0);
    }

    #[test]
    fn test_fractional_bounds_on_integer_column() {
        let outcomes = run(
            spec(Some(0.5), Some(2.5)),
            vec![Column::new("n", vec![0i64, 1, 2, 3])],
        );
        let rows: Vec<usize> = outcomes[0].failing_samples.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![0, 3]);
    }

    #[test]
    fn test_exact_bounds_are_ordered_exactly() {
        let err = build(
            RuleSpec::new("value_range")
                .with_min_value(9_007_199_254_740_993i64)
                .with_max_value(9_007_199_254_740_992i64),
        )
        .unwrap_err();
        assert!(err.to_string().contains(
            "min_value (9007199254740993) is greater than max_value (9007199254740992)"
        ));
    }

    #[test]
    fn test_non_numeric_column_is_skipped() {
        let outcomes = run(
            spec(Some(0.0), Some(1.0)),
            vec![
                Column::new("name", vec!["ann", "bob"]),
                Column::new("flag", vec![true, false]),
            ],
        );
        assert!(outcomes.iter().all(|o| o.is_skipped()));
    }

    #[test]
    fn test_configuration_errors() {
        let err = build(spec(None, None)).unwrap_err();
        assert!(err.to_string().contains("requires 'min_value'"));

        let err = build(spec(Some(10.0), Some(1.0))).unwrap_err();
        assert!(err
            .to_string()
            .contains("min_value (10) is greater than max_value (1)"));

        let err = build(RuleSpec::new("value_range").with_min_value("low")).unwrap_err();
        assert!(err.is_configuration());
    }
}
