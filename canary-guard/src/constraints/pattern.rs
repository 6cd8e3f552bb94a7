//! Pattern match rule.

use regex::Regex;
use tracing::instrument;

use super::{conforming_percentage, RuleMeta};
use crate::core::{BuildContext, ColumnContext, FromSpec, Rule, RuleOutcome, RuleSpec};
use crate::logging::truncate_field;
use crate::prelude::*;

const MAX_PATTERN_IN_MESSAGE: usize = 64;

/// Fails a column with any non-null value whose raw text does not fully
/// match the pattern.
///
/// The pattern is anchored and compiled once, when the rule is built.
#[derive(Debug, Clone)]
pub struct PatternMatchRule {
    meta: RuleMeta,
    pattern: String,
    regex: Regex,
}

impl PatternMatchRule {
    /// The pattern as configured, before anchoring.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the whole of `text` matches the pattern.
    pub fn is_full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl FromSpec for PatternMatchRule {
    const RULE_TYPE: &'static str = "pattern_match";

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self> {
        let pattern = spec
            .pattern
            .clone()
            .ok_or_else(|| ctx.error("missing required parameter 'pattern'"))?;
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| ctx.error(format!("invalid regular expression '{pattern}': {e}")))?;

        Ok(Self {
            meta: RuleMeta::from_spec(spec, || format!("Check if values match '{pattern}'")),
            pattern,
            regex,
        })
    }
}

impl Rule for PatternMatchRule {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    rule_meta_accessors!();

    #[instrument(skip(self, ctx), fields(rule.column = %ctx.name()))]
    fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
        let failures = ctx.scan(|value| !self.regex.is_match(&value.raw()));
        let total = ctx.profile.non_null_count;
        let shown = truncate_field(&self.pattern, MAX_PATTERN_IN_MESSAGE);

        let message = if failures.is_empty() {
            format!("All {total} non-null values match pattern '{shown}'")
        } else {
            format!(
                "{} of {total} non-null values do not match pattern '{shown}'",
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
        .with_detail("pattern", &self.pattern)
        .with_failures(failures))
    }
}
