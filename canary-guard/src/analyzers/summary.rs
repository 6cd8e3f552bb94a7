//! Dataset-level summary statistics and the health score.
//!
//! The summary aggregates column profiles into a handful of indicators
//! (column type counts, null and distinct averages, notable columns). The
//! health score blends rule compliance with completeness:
//!
//! ```text
//! score = round(0.7 * rule_compliance + 0.3 * completeness, 2)
//! ```
//!
//! Rule compliance is `passed / (passed + failed) * 100` over all outcomes;
//! skipped outcomes do not count and a run without evaluated outcomes has a
//! compliance of 0.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::profile_types::ColumnProfile;
use crate::core::{OutcomeStatus, RuleOutcome};

const RULE_COMPLIANCE_WEIGHT: f64 = 0.7;
const COMPLETENESS_WEIGHT: f64 = 0.3;

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A column singled out by the summary, with the percentage that put it there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotableColumn {
    pub name: String,
    pub percentage: f64,
}

/// Aggregate statistics over all column profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_columns: usize,
    /// Number of columns per inferred type name
    pub column_types: BTreeMap<String, usize>,
    pub columns_with_nulls: usize,
    pub columns_with_nulls_percentage: f64,
    pub avg_null_percentage: f64,
    pub avg_distinct_percentage: f64,
    /// 100 minus the average null percentage
    pub completeness: f64,
    /// Average distinct percentage
    pub uniqueness: f64,
    /// Column with the highest non-zero null percentage
    pub highest_null_column: Option<NotableColumn>,
    /// Column with the lowest distinct percentage strictly between 0 and 100
    pub lowest_distinct_column: Option<NotableColumn>,
}

impl DatasetSummary {
    /// Builds the summary from column profiles.
    ///
    /// With no columns every average is 0 and completeness is 100.
    pub fn from_profiles(profiles: &[ColumnProfile]) -> Self {
        let total_columns = profiles.len();
        let mut column_types = BTreeMap::new();
        let mut columns_with_nulls = 0;
        let mut total_null = 0.0;
        let mut total_distinct = 0.0;
        let mut highest_null: Option<&ColumnProfile> = None;
        let mut lowest_distinct: Option<&ColumnProfile> = None;

        for profile in profiles {
            *column_types
                .entry(profile.inferred_type.to_string())
                .or_insert(0) += 1;

            total_null += profile.null_percentage;
            if profile.null_percentage > 0.0 {
                columns_with_nulls += 1;
                if highest_null.map_or(true, |h| profile.null_percentage > h.null_percentage) {
                    highest_null = Some(profile);
                }
            }

            total_distinct += profile.distinct_percentage;
            if profile.distinct_percentage > 0.0
                && profile.distinct_percentage < 100.0
                && lowest_distinct
                    .map_or(true, |l| profile.distinct_percentage < l.distinct_percentage)
            {
                lowest_distinct = Some(profile);
            }
        }

        let (avg_null, avg_distinct, nulls_pct) = if total_columns == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = total_columns as f64;
            (
                total_null / n,
                total_distinct / n,
                columns_with_nulls as f64 / n * 100.0,
            )
        };

        Self {
            total_columns,
            column_types,
            columns_with_nulls,
            columns_with_nulls_percentage: round2(nulls_pct),
            avg_null_percentage: round2(avg_null),
            avg_distinct_percentage: round2(avg_distinct),
            completeness: round2(100.0 - avg_null),
            uniqueness: round2(avg_distinct),
            highest_null_column: highest_null.map(|p| NotableColumn {
                name: p.name.clone(),
                percentage: round2(p.null_percentage),
            }),
            lowest_distinct_column: lowest_distinct.map(|p| NotableColumn {
                name: p.name.clone(),
                percentage: round2(p.distinct_percentage),
            }),
        }
    }
}

/// Qualitative band of a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 90 and above
    Excellent,
    /// 75 and above
    Good,
    /// 60 and above
    Fair,
    /// Below 60
    Poor,
}

impl HealthStatus {
    /// Band for a score in `[0, 100]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthStatus::Excellent
        } else if score >= 75.0 {
            HealthStatus::Good
        } else if score >= 60.0 {
            HealthStatus::Fair
        } else {
            HealthStatus::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule compliance of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScore {
    pub column: String,
    pub passed: usize,
    pub evaluated: usize,
    /// passed / evaluated * 100, rounded to two decimals
    pub score: f64,
}

/// Overall dataset health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub status: HealthStatus,
    pub rule_compliance: f64,
    pub completeness: f64,
    /// Per-column compliance in order of first appearance in the outcomes;
    /// columns whose outcomes were all skipped are left out
    pub column_scores: Vec<ColumnScore>,
}

impl HealthScore {
    /// Computes the health score from the summary and the rule outcomes.
    #[instrument(skip_all, fields(outcomes = outcomes.len()))]
    pub fn compute(summary: &DatasetSummary, outcomes: &[RuleOutcome]) -> Self {
        let mut column_scores: Vec<ColumnScore> = Vec::new();
        let mut passed = 0;
        let mut evaluated = 0;

        for outcome in outcomes {
            if outcome.status == OutcomeStatus::Skipped {
                continue;
            }
            let ok = outcome.passed();
            evaluated += 1;
            if ok {
                passed += 1;
            }

            match column_scores.iter_mut().find(|c| c.column == outcome.column) {
                Some(entry) => {
                    entry.evaluated += 1;
                    entry.passed += usize::from(ok);
                }
                None => column_scores.push(ColumnScore {
                    column: outcome.column.clone(),
                    passed: usize::from(ok),
                    evaluated: 1,
                    score: 0.0,
                }),
            }
        }

        for entry in &mut column_scores {
            entry.score = round2(entry.passed as f64 / entry.evaluated as f64 * 100.0);
        }

        let rule_compliance = if evaluated == 0 {
            0.0
        } else {
            round2(passed as f64 / evaluated as f64 * 100.0)
        };
        let completeness = summary.completeness;
        let score = round2(
            rule_compliance * RULE_COMPLIANCE_WEIGHT + completeness * COMPLETENESS_WEIGHT,
        );
        let status = HealthStatus::from_score(score);

        debug!(score, %status, "Computed health score");

        Self {
            score,
            status,
            rule_compliance,
            completeness,
            column_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ColumnProfiler;
    use crate::dataset::{Column, Dataset};

    fn profiles() -> Vec<ColumnProfile> {
        let dataset = Dataset::new(vec![
            Column::new("id", vec![1i64, 2, 3, 4]),
            Column::new("email", vec![Some("a@x.io"), None, Some("b@x.io"), None]),
            Column::new("country", vec!["DE", "DE", "FR", "DE"]),
        ])
        .unwrap();
        ColumnProfiler::new().profile_dataset(&dataset)
    }

    #[test]
    fn test_summary_from_profiles() {
        let summary = DatasetSummary::from_profiles(&profiles());

        assert_eq!(summary.total_columns, 3);
        assert_eq!(summary.column_types.get("integer"), Some(&1));
        assert_eq!(summary.column_types.get("string"), Some(&2));
        assert_eq!(summary.columns_with_nulls, 1);
        assert_eq!(summary.columns_with_nulls_percentage, 33.33);
        assert_eq!(summary.avg_null_percentage, 16.67);
        assert_eq!(summary.completeness, 83.33);

        let highest = summary.highest_null_column.unwrap();
        assert_eq!(highest.name, "email");
        assert_eq!(highest.percentage, 50.0);

        // id and email are fully distinct, country is 2 of 4
        let lowest = summary.lowest_distinct_column.unwrap();
        assert_eq!(lowest.name, "country");
        assert_eq!(lowest.percentage, 50.0);
    }

    #[test]
    fn test_summary_without_columns() {
        let summary = DatasetSummary::from_profiles(&[]);
        assert_eq!(summary.total_columns, 0);
        assert_eq!(summary.completeness, 100.0);
        assert!(summary.highest_null_column.is_none());
        assert!(summary.lowest_distinct_column.is_none());
    }

    #[test]
    fn test_health_status_bands() {
        assert_eq!(HealthStatus::from_score(90.0), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(89.99), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(75.0), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(60.0), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(59.99), HealthStatus::Poor);
    }

    #[test]
    fn test_health_score_weighting() {
        let summary = DatasetSummary::from_profiles(&profiles());
        let outcomes = vec![
            RuleOutcome::pass("null_percentage_id", "null_percentage", "id"),
            RuleOutcome::fail(
                "null_percentage_email",
                "null_percentage",
                "email",
                "too many nulls",
            ),
            RuleOutcome::pass("unique_value_email", "unique_value", "email"),
            RuleOutcome::skip("value_range_country", "value_range", "country", "not numeric"),
        ];
        let health = HealthScore::compute(&summary, &outcomes);

        assert_eq!(health.rule_compliance, 66.67);
        assert_eq!(health.completeness, 83.33);
        // 66.67 * 0.7 + 83.33 * 0.3 = 46.669 + 24.999
        assert_eq!(health.score, 71.67);
        assert_eq!(health.status, HealthStatus::Fair);

        let columns: Vec<(&str, f64)> = health
            .column_scores
            .iter()
            .map(|c| (c.column.as_str(), c.score))
            .collect();
        assert_eq!(columns, vec![("id", 100.0), ("email", 50.0)]);
    }

    #[test]
    fn test_health_without_outcomes() {
        let summary = DatasetSummary::from_profiles(&[]);
        let health = HealthScore::compute(&summary, &[]);
        assert_eq!(health.rule_compliance, 0.0);
        assert_eq!(health.score, 30.0);
        assert_eq!(health.status, HealthStatus::Poor);
        assert!(health.column_scores.is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
    }
}
