//! String length rule.

use tracing::instrument;

use super::{conforming_percentage, RuleMeta};
use crate::analyzers::InferredType;
use crate::core::{BuildContext, ColumnContext, FromSpec, Rule, RuleOutcome, RuleSpec};
use crate::prelude::*;

/// Fails a string column with any value whose length in characters is
/// outside `[min_length, max_length]`.
#[derive(Debug, Clone)]
pub struct StringLengthRule {
    meta: RuleMeta,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringLengthRule {
    pub fn bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.min_length, self.max_length)
    }

    fn accepts(&self, length: usize) -> bool {
        self.min_length.map_or(true, |min| length >= min)
            && self.max_length.map_or(true, |max| length <= max)
    }
}

fn length_expectation(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("between {min} and {max} characters"),
        (Some(min), None) => format!("at least {min} characters"),
        (None, Some(max)) => format!("at most {max} characters"),
        (None, None) => "any length".to_string(),
    }
}

impl FromSpec for StringLengthRule {
    const RULE_TYPE: &'static str = "string_length";

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self> {
        let min_length = ctx.count("min_length", spec.min_length.as_ref())?;
        let max_length = ctx.count("max_length", spec.max_length.as_ref())?;

        match (min_length, max_length) {
            (None, None) => {
                return Err(ctx.error("string_length requires 'min_length', 'max_length' or both"))
            }
            (Some(min), Some(max)) if min > max => {
                return Err(ctx.error(format!(
                    "min_length ({min}) is greater than max_length ({max})"
                )))
            }
            _ => {}
        }

        Ok(Self {
            meta: RuleMeta::from_spec(spec, || {
                format!(
                    "Check if lengths are {}",
                    length_expectation(min_length, max_length)
                )
            }),
            min_length,
            max_length,
        })
    }
}

impl Rule for StringLengthRule {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    rule_meta_accessors!();

    fn applies_to(&self, inferred_type: InferredType) -> bool {
        inferred_type == InferredType::String
    }

    #[instrument(skip(self, ctx), fields(rule.column = %ctx.name()))]
    fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
        let failures = ctx.scan(|value| !self.accepts(value.raw().chars().count()));
        let total = ctx.profile.non_null_count;
        let expected = length_expectation(self.min_length, self.max_length);

        let message = match &ctx.profile.text {
            Some(text) if failures.is_empty() => format!(
                "Lengths range from {} to {} (expected: {expected})",
                text.min_length, text.max_length
            ),
            _ if failures.is_empty() => format!("All values are {expected}"),
            _ => format!(
                "{} of {total} non-null values are not {expected}",
                failures.count
            ),
        };

        let mut outcome = RuleOutcome::from_check(
            failures.is_empty(),
            self.outcome_name(ctx.name()),
            Self::RULE_TYPE,
            ctx.name(),
            message,
        )
        .with_metric(conforming_percentage(failures.count, total));

        if let Some(min) = self.min_length {
            outcome = outcome.with_detail("expected_min_length", min);
        }
        if let Some(max) = self.max_length {
            outcome = outcome.with_detail("expected_max_length", max);
        }
        Ok(outcome.with_failures(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::test_support::{build, run};
    use crate::dataset::Column;

    #[test]
    fn test_lengths_outside_bounds_fail() {
        let outcomes = run(
            RuleSpec::new("string_length")
                .with_target_column("code")
                .with_min_length(2i64)
                .with_max_length(3i64),
            vec![Column::new("code", vec!["ab", "abcd", "x", "abc"])],
        );
        let outcome = &outcomes[0];
        assert!(outcome.is_failed());
        assert_eq!(outcome.failing_row_count, 2);
        assert_eq!(outcome.failing_samples[0].value, "abcd");
        assert_eq!(outcome.failing_samples[1].row, 2);
        assert_eq!(outcome.metric, Some(50.0));
    }

    #[test]
    fn test_length_counts_characters() {
        let outcomes = run(
            RuleSpec::new("string_length").with_max_length(4i64),
            vec![Column::new("city", vec!["Köln", "Zürich"])],
        );
        assert_eq!(outcomes[0].failing_row_count, 1);
        assert_eq!(outcomes[0].failing_samples[0].value, "Zürich");
    }

    #[test]
    fn test_non_string_columns_are_skipped() {
        let outcomes = run(
            RuleSpec::new("string_length").with_min_length(1i64),
            vec![
                Column::new("id", vec![1i64, 2]),
                Column::new("name", vec!["ann", "bob"]),
            ],
        );
        assert!(outcomes[0].is_skipped());
        assert!(outcomes[1].passed());
    }

    #[test]
    fn test_configuration_errors() {
        assert!(build(RuleSpec::new("string_length")).is_err());

        let err = build(
            RuleSpec::new("string_length")
                .with_min_length(5i64)
                .with_max_length(2i64),
        )
        .unwrap_err();
        assert!(err.to_string().contains("min_length (5) is greater than max_length (2)"));

        let err = build(RuleSpec::new("string_length").with_min_length(1.5)).unwrap_err();
        assert!(err.to_string().contains("non-negative integer"));
    }
}
