//! Rule trait and outcome types.

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzers::{ColumnProfile, InferredType};
use crate::dataset::{Column, Dataset, Value};
use crate::prelude::*;

/// Default bound on failing samples per outcome.
pub const DEFAULT_MAX_FAILING_SAMPLES: usize = 5;

/// The status of a rule evaluated against one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The column satisfies the rule
    Passed,
    /// The column violates the rule, or evaluation failed
    Failed,
    /// The rule does not apply to the column's inferred type
    Skipped,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Passed => "passed",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that violated a rule, with its 0-based row index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingSample {
    pub row: usize,
    /// Raw representation of the offending value
    pub value: String,
}

/// Failing rows found by [`ColumnContext::scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failures {
    pub count: u64,
    pub samples: Vec<FailingSample>,
}

impl Failures {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// The result of evaluating one rule against one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_name: String,
    pub rule_type: String,
    pub column: String,
    pub status: OutcomeStatus,
    /// Observed value compared against the threshold, if the rule has one
    pub metric: Option<f64>,
    pub threshold: Option<f64>,
    pub message: String,
    pub failing_row_count: u64,
    /// Bounded list of failing rows, in row order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failing_samples: Vec<FailingSample>,
    /// Extra diagnostics such as observed bounds or the pattern
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl RuleOutcome {
    fn new(
        rule_name: impl Into<String>,
        rule_type: impl Into<String>,
        column: impl Into<String>,
        status: OutcomeStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            rule_type: rule_type.into(),
            column: column.into(),
            status,
            metric: None,
            threshold: None,
            message: message.into(),
            failing_row_count: 0,
            failing_samples: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    /// Creates a passed outcome.
    pub fn pass(
        rule_name: impl Into<String>,
        rule_type: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::new(rule_name, rule_type, column, OutcomeStatus::Passed, "passed")
    }

    /// Creates a failed outcome.
    pub fn fail(
        rule_name: impl Into<String>,
        rule_type: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(rule_name, rule_type, column, OutcomeStatus::Failed, message)
    }

    /// Creates a skipped outcome.
    pub fn skip(
        rule_name: impl Into<String>,
        rule_type: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(rule_name, rule_type, column, OutcomeStatus::Skipped, message)
    }

    /// Creates a passed or failed outcome depending on `passed`.
    pub fn from_check(
        passed: bool,
        rule_name: impl Into<String>,
        rule_type: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let status = if passed {
            OutcomeStatus::Passed
        } else {
            OutcomeStatus::Failed
        };
        Self::new(rule_name, rule_type, column, status, message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the measured value. Non-finite metrics are dropped, since JSON
    /// cannot carry them.
    pub fn with_metric(mut self, metric: f64) -> Self {
        self.metric = metric.is_finite().then_some(metric);
        self
    }

    /// Sets the configured limit. Non-finite thresholds are dropped.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.is_finite().then_some(threshold);
        self
    }

    /// Records the failing row count and samples.
    pub fn with_failures(mut self, failures: Failures) -> Self {
        self.failing_row_count = failures.count;
        self.failing_samples = failures.samples;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.insert(key.into(), value.to_string());
        self
    }

    /// Returns true only for a passed outcome.
    pub fn passed(&self) -> bool {
        self.status == OutcomeStatus::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == OutcomeStatus::Skipped
    }
}

/// One column with its profile, handed to [`Rule::evaluate_column`].
#[derive(Debug, Clone, Copy)]
pub struct ColumnContext<'a> {
    pub column: &'a Column,
    pub profile: &'a ColumnProfile,
    pub max_failing_samples: usize,
}

impl<'a> ColumnContext<'a> {
    pub fn new(column: &'a Column, profile: &'a ColumnProfile, max_failing_samples: usize) -> Self {
        Self {
            column,
            profile,
            max_failing_samples,
        }
    }

    /// The column name.
    pub fn name(&self) -> &'a str {
        self.column.name()
    }

    /// Collects the non-null values for which `is_failure` returns true,
    /// keeping at most `max_failing_samples` samples in row order.
    pub fn scan<F>(&self, mut is_failure: F) -> Failures
    where
        F: FnMut(&Value) -> bool,
    {
        let mut failures = Failures::default();
        for (row, value) in self.column.non_null() {
            if is_failure(value) {
                failures.count += 1;
                if failures.samples.len() < self.max_failing_samples {
                    failures.samples.push(FailingSample {
                        row,
                        value: value.raw().into_owned(),
                    });
                }
            }
        }
        failures
    }
}

/// The dataset and profiles a rule set is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    dataset: &'a Dataset,
    profiles: &'a [ColumnProfile],
    max_failing_samples: usize,
}

impl<'a> EvaluationContext<'a> {
    /// `profiles` is expected in dataset column order, as produced by the
    /// profiler.
    pub fn new(dataset: &'a Dataset, profiles: &'a [ColumnProfile]) -> Self {
        Self {
            dataset,
            profiles,
            max_failing_samples: DEFAULT_MAX_FAILING_SAMPLES,
        }
    }

    pub fn with_max_failing_samples(mut self, max: usize) -> Self {
        self.max_failing_samples = max;
        self
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn profiles(&self) -> &'a [ColumnProfile] {
        self.profiles
    }

    pub fn max_failing_samples(&self) -> usize {
        self.max_failing_samples
    }

    /// Looks up a column and its profile.
    pub fn column(&self, name: &str) -> Option<ColumnContext<'a>> {
        let column = self.dataset.column(name)?;
        let profile = self.profiles.iter().find(|p| p.name == name)?;
        Some(ColumnContext::new(column, profile, self.max_failing_samples))
    }
}

/// A validation rule evaluated against the columns of a dataset.
///
/// Implementations are immutable once built and shared across runs. A rule
/// either targets a single column or, without a target, every column of the
/// dataset in column order.
///
/// # Examples
///
/// ```rust
/// use canary_guard::core::{ColumnContext, Rule, RuleOutcome};
/// use canary_guard::prelude::*;
///
/// #[derive(Debug)]
/// struct NonEmptyRule;
///
/// impl Rule for NonEmptyRule {
///     fn rule_type(&self) -> &str {
///         "non_empty"
///     }
///
///     fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
///         let rows = ctx.profile.row_count;
///         Ok(RuleOutcome::from_check(
///             rows > 0,
///             self.outcome_name(ctx.name()),
///             self.rule_type(),
///             ctx.name(),
///             format!("{rows} rows"),
///         ))
///     }
/// }
/// ```
pub trait Rule: Debug + Send + Sync {
    /// The registry key of this rule variant.
    fn rule_type(&self) -> &str;

    /// The configured rule name, if any.
    fn name(&self) -> Option<&str> {
        None
    }

    fn description(&self) -> Option<&str> {
        None
    }

    /// The single column this rule is restricted to, if any.
    fn target_column(&self) -> Option<&str> {
        None
    }

    fn threshold(&self) -> Option<f64> {
        None
    }

    /// Whether the rule applies to a column of the given inferred type.
    /// Inapplicable columns produce a skipped outcome.
    fn applies_to(&self, _inferred_type: InferredType) -> bool {
        true
    }

    /// Evaluates the rule against one column.
    ///
    /// Errors are turned into failed outcomes by [`Rule::evaluate`].
    fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome>;

    /// The rule name reported for a column: the configured name, otherwise
    /// `{rule_type}_{column}`.
    fn outcome_name(&self, column: &str) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("{}_{}", self.rule_type(), column),
        }
    }

    /// The columns this rule is evaluated against, in order.
    fn target_columns<'a>(&'a self, ctx: &EvaluationContext<'a>) -> Vec<&'a str> {
        match self.target_column() {
            Some(column) => vec![column],
            None => ctx.dataset().column_names(),
        }
    }

    /// Evaluates the rule against every target column, producing exactly one
    /// outcome per column.
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Vec<RuleOutcome> {
        self.target_columns(ctx)
            .into_iter()
            .map(|column| evaluate_single(self, ctx, column))
            .collect()
    }
}

fn evaluate_single<R: Rule + ?Sized>(
    rule: &R,
    ctx: &EvaluationContext<'_>,
    column: &str,
) -> RuleOutcome {
    let name = rule.outcome_name(column);

    let Some(column_ctx) = ctx.column(column) else {
        let error = CanaryError::ColumnNotFound {
            column: column.to_string(),
        };
        warn!(rule.name = %name, rule.column = %column, "Target column is missing");
        return RuleOutcome::fail(name, rule.rule_type(), column, error.to_string())
            .with_detail("error", "column_not_found");
    };

    let inferred_type = column_ctx.profile.inferred_type;
    if !rule.applies_to(inferred_type) {
        debug!(rule.name = %name, rule.column = %column, %inferred_type, "Rule skipped");
        return RuleOutcome::skip(
            name,
            rule.rule_type(),
            column,
            format!("rule does not apply to {inferred_type} columns"),
        )
        .with_detail("inferred_type", inferred_type);
    }

    match rule.evaluate_column(&column_ctx) {
        Ok(outcome) => outcome,
        Err(error) => {
            warn!(
                rule.name = %name,
                rule.column = %column,
                error = %error,
                "Rule evaluation failed"
            );
            let outcome = RuleOutcome::fail(name, rule.rule_type(), column, error.to_string())
                .with_detail("error", "evaluation");
            match rule.threshold() {
                Some(threshold) => outcome.with_threshold(threshold),
                None => outcome,
            }
        }
    }
}

/// A shared, type-erased rule.
pub type BoxedRule = Arc<dyn Rule>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ColumnProfiler;

    #[derive(Debug)]
    struct NumericOnly {
        fail_with_error: bool,
    }

    impl Rule for NumericOnly {
        fn rule_type(&self) -> &str {
            "numeric_only"
        }

        fn applies_to(&self, inferred_type: InferredType) -> bool {
            inferred_type.is_numeric()
        }

        fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
            if self.fail_with_error {
                return Err(CanaryError::evaluation(
                    self.rule_type(),
                    ctx.name(),
                    "boom",
                ));
            }
            let failures = ctx.scan(|v| matches!(v, Value::Integer(i) if *i < 0));
            Ok(RuleOutcome::from_check(
                failures.is_empty(),
                self.outcome_name(ctx.name()),
                self.rule_type(),
                ctx.name(),
                "checked",
            )
            .with_failures(failures))
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("amount", vec![3i64, -1, 4, -5, -9]),
            Column::new("label", vec!["a", "b", "c", "d", "e"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = RuleOutcome::fail("r", "null_percentage", "email", "too many")
            .with_metric(40.0)
            .with_threshold(5.0)
            .with_detail("null_count", 2);

        assert!(outcome.is_failed());
        assert!(!outcome.passed());
        assert_eq!(outcome.metric, Some(40.0));
        assert_eq!(outcome.details.get("null_count").map(String::as_str), Some("2"));

        assert!(RuleOutcome::pass("r", "t", "c").passed());
        assert!(RuleOutcome::skip("r", "t", "c", "n/a").is_skipped());
    }

    #[test]
    fn test_evaluate_untargeted_rule_covers_all_columns() {
        let dataset = dataset();
        let profiles = ColumnProfiler::new().profile_dataset(&dataset);
        let ctx = EvaluationContext::new(&dataset, &profiles).with_max_failing_samples(2);

        let outcomes = NumericOnly {
            fail_with_error: false,
        }
        .evaluate(&ctx);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].rule_name, "numeric_only_amount");
        assert!(outcomes[0].is_failed());
        assert_eq!(outcomes[0].failing_row_count, 3);
        assert_eq!(
            outcomes[0].failing_samples,
            vec![
                FailingSample {
                    row: 1,
                    value: "-1".to_string()
                },
                FailingSample {
                    row: 3,
                    value: "-5".to_string()
                },
            ]
        );

        assert!(outcomes[1].is_skipped());
        assert_eq!(
            outcomes[1].details.get("inferred_type").map(String::as_str),
            Some("string")
        );
    }

    #[test]
    fn test_evaluation_errors_become_failures() {
        let dataset = dataset();
        let profiles = ColumnProfiler::new().profile_dataset(&dataset);
        let ctx = EvaluationContext::new(&dataset, &profiles);

        let outcomes = NumericOnly {
            fail_with_error: true,
        }
        .evaluate(&ctx);

        assert!(outcomes[0].is_failed());
        assert!(outcomes[0].message.contains("boom"));
        assert_eq!(
            outcomes[0].details.get("error").map(String::as_str),
            Some("evaluation")
        );
    }

    #[test]
    fn test_missing_column_lookup() {
        let dataset = dataset();
        let profiles = ColumnProfiler::new().profile_dataset(&dataset);
        let ctx = EvaluationContext::new(&dataset, &profiles);
        assert!(ctx.column("missing").is_none());

        let rule = NumericOnly {
            fail_with_error: false,
        };
        let outcome = evaluate_single(&rule, &ctx, "missing");
        assert!(outcome.is_failed());
        assert_eq!(outcome.rule_name, "numeric_only_missing");
        assert!(outcome.message.contains("missing"));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&OutcomeStatus::Skipped).unwrap(),
            "\"skipped\""
        );
        assert_eq!(OutcomeStatus::Passed.to_string(), "passed");
    }
}
