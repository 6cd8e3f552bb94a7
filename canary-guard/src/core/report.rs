//! The result of running a rule set against a dataset.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{OutcomeStatus, RuleOutcome};
use crate::analyzers::{ColumnProfile, DataInsights, DatasetSummary, HealthScore};
use crate::prelude::*;

/// Counts of outcomes by status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `passed / (passed + failed) × 100`; 100 when nothing was evaluated
    pub pass_rate: f64,
}

impl ReportMetrics {
    pub fn from_outcomes(outcomes: &[RuleOutcome]) -> Self {
        let mut metrics = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Passed => metrics.passed += 1,
                OutcomeStatus::Failed => metrics.failed += 1,
                OutcomeStatus::Skipped => metrics.skipped += 1,
            }
        }
        let evaluated = metrics.passed + metrics.failed;
        metrics.pass_rate = if evaluated == 0 {
            100.0
        } else {
            metrics.passed as f64 / evaluated as f64 * 100.0
        };
        metrics
    }
}

/// Where and when a report was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub dataset_name: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub rule_set_name: Option<String>,
    /// SHA-256 of the canonical JSON of the rule set
    pub rule_set_fingerprint: String,
    pub rule_count: usize,
    pub engine_version: String,
    /// RFC 3339
    pub timestamp: String,
    pub duration_ms: u64,
}

impl RunMetadata {
    pub fn engine_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

/// Outcomes, profiles and aggregates of one run.
///
/// Outcomes are in canonical order: rules in declaration order, and for a
/// rule without a target column, columns in dataset order.
///
/// # Examples
///
/// ```rust
/// use canary_guard::core::{Report, RuleEngine, RuleSet, RuleSpec};
/// use canary_guard::dataset::{Column, Dataset};
///
/// let dataset = Dataset::new(vec![Column::new("id", vec![1i64, 2, 3])]).unwrap();
/// let rules = RuleSet::new(vec![RuleSpec::new("unique_value").with_threshold(100.0)]);
///
/// let report = RuleEngine::new().validate(&dataset, &rules).unwrap();
/// assert!(report.overall_passed);
///
/// let restored = Report::from_json(&report.to_json().unwrap()).unwrap();
/// assert_eq!(restored, report);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// True when no outcome failed
    pub overall_passed: bool,
    pub metrics: ReportMetrics,
    pub outcomes: Vec<RuleOutcome>,
    pub profiles: Vec<ColumnProfile>,
    pub summary: DatasetSummary,
    pub health: HealthScore,
    pub insights: DataInsights,
    pub metadata: RunMetadata,
}

impl Report {
    /// Assembles a report from evaluated outcomes and the profiles they were
    /// evaluated against.
    pub fn new(
        outcomes: Vec<RuleOutcome>,
        profiles: Vec<ColumnProfile>,
        insights: DataInsights,
        metadata: RunMetadata,
    ) -> Self {
        let summary = DatasetSummary::from_profiles(&profiles);
        let health = HealthScore::compute(&summary, &outcomes);
        let metrics = ReportMetrics::from_outcomes(&outcomes);

        Self {
            overall_passed: metrics.failed == 0,
            metrics,
            outcomes,
            profiles,
            summary,
            health,
            insights,
            metadata,
        }
    }

    pub fn failed_outcomes(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Outcomes for one column, in canonical order.
    pub fn outcomes_for<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a RuleOutcome> {
        self.outcomes.iter().filter(move |o| o.column == column)
    }

    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.profiles.iter().find(|p| p.name == column)
    }

    /// SHA-256 over everything but the timestamp and duration.
    ///
    /// Two runs of the same rule set over the same dataset have equal
    /// fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        let mut stable = self.clone();
        stable.metadata.timestamp.clear();
        stable.metadata.duration_ms = 0;
        let bytes = serde_json::to_vec(&stable)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
