//! Report formatting for humans and machines.
//!
//! Reports can be rendered as JSON, as a plain-text quality report for
//! terminals and logs, or as Markdown for pull requests and wikis.
//!
//! # Examples
//!
//! ```rust
//! use canary_guard::core::{RuleEngine, RuleSet, RuleSpec};
//! use canary_guard::dataset::{Column, Dataset};
//! use canary_guard::formatters::{FormatterConfig, HumanFormatter, ReportFormatter};
//!
//! let dataset = Dataset::new(vec![Column::new("id", vec![1i64, 2, 2])]).unwrap();
//! let rules = RuleSet::new(vec![RuleSpec::new("unique_value").with_threshold(100.0)]);
//! let report = RuleEngine::new().validate(&dataset, &rules).unwrap();
//!
//! let text = HumanFormatter::with_config(FormatterConfig::ci())
//!     .format(&report)
//!     .unwrap();
//! assert!(text.contains("Overall status: FAILED"));
//! ```

use std::fmt::{self, Write};

use crate::analyzers::ColumnProfile;
use crate::core::{OutcomeStatus, Report, RuleOutcome};
use crate::prelude::*;

/// Configuration options for formatting reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include run metrics, dataset summary and health score
    pub include_metrics: bool,
    /// Include rule outcomes
    pub include_outcomes: bool,
    /// Include passed outcomes alongside failed and skipped ones
    pub include_passed: bool,
    /// Include per-column statistics from the profiles
    pub include_statistics: bool,
    /// Include insight sentences and recommendations
    pub include_insights: bool,
    /// Maximum number of outcomes to display; `None` for all
    pub max_outcomes: Option<usize>,
    /// Maximum number of failing samples per outcome
    pub max_samples: usize,
    /// Whether to use colorized output (for the human formatter)
    pub use_colors: bool,
    /// Whether to include the run timestamp and duration
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_metrics: true,
            include_outcomes: true,
            include_passed: true,
            include_statistics: true,
            include_insights: true,
            max_outcomes: None,
            max_samples: 5,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Only the metrics and the overall status.
    pub fn minimal() -> Self {
        Self {
            include_metrics: true,
            include_outcomes: false,
            include_passed: false,
            include_statistics: false,
            include_insights: false,
            max_outcomes: Some(0),
            max_samples: 0,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Problems only, bounded, without colors.
    pub fn ci() -> Self {
        Self {
            include_metrics: true,
            include_outcomes: true,
            include_passed: false,
            include_statistics: false,
            include_insights: true,
            max_outcomes: Some(50),
            max_samples: 3,
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_metrics(mut self, include: bool) -> Self {
        self.include_metrics = include;
        self
    }

    pub fn with_outcomes(mut self, include: bool) -> Self {
        self.include_outcomes = include;
        self
    }

    pub fn with_passed(mut self, include: bool) -> Self {
        self.include_passed = include;
        self
    }

    pub fn with_statistics(mut self, include: bool) -> Self {
        self.include_statistics = include;
        self
    }

    pub fn with_max_outcomes(mut self, max: Option<usize>) -> Self {
        self.max_outcomes = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }
}

/// Renders a [`Report`] into a string.
///
/// # Examples
///
/// ```rust
/// use canary_guard::core::Report;
/// use canary_guard::formatters::ReportFormatter;
///
/// struct StatusLine;
///
/// impl ReportFormatter for StatusLine {
///     fn format(&self, report: &Report) -> canary_guard::prelude::Result<String> {
///         Ok(format!("{}: {}", report.health.status, report.overall_passed))
///     }
/// }
/// ```
pub trait ReportFormatter {
    fn format(&self, report: &Report) -> Result<String>;

    /// Formats with an explicit configuration. The default ignores it.
    fn format_with_config(&self, report: &Report, _config: &FormatterConfig) -> Result<String> {
        self.format(report)
    }
}

/// Formats reports as JSON.
///
/// With the default configuration the output is the full report and can be
/// read back with [`Report::from_json`].
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &Report, config: &FormatterConfig) -> Result<String> {
        let filtered = filter_report(report, config);
        let json = if self.pretty {
            serde_json::to_string_pretty(&filtered)
        } else {
            serde_json::to_string(&filtered)
        };
        json.map_err(|e| CanaryError::Serialization(format!("Failed to serialize report: {e}")))
    }
}

/// Formats reports as a plain-text quality report.
///
/// The layout has a header with the health score, then the dataset summary,
/// insights and recommendations, one section per column with its rule
/// results, and a closing summary with the overall status.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn write_report(
        &self,
        out: &mut String,
        report: &Report,
        config: &FormatterConfig,
    ) -> fmt::Result {
        let meta = &report.metadata;
        writeln!(out, "= Canary Guard Quality Report =")?;
        writeln!(out, "Dataset: {}", meta.dataset_name.as_deref().unwrap_or("(unnamed)"))?;
        if config.include_timestamps {
            writeln!(out, "Generated: {} ({}ms)", meta.timestamp, meta.duration_ms)?;
        }
        writeln!(out, "Rows: {}", meta.row_count)?;
        writeln!(out, "Total columns: {}", meta.column_count)?;
        writeln!(
            out,
            "Health Score: {} ({})",
            report.health.score, report.health.status
        )?;
        writeln!(out)?;

        if config.include_metrics {
            let summary = &report.summary;
            writeln!(out, "== Dataset Summary ==")?;
            writeln!(out, "Total columns: {}", summary.total_columns)?;
            let types = summary
                .column_types
                .iter()
                .map(|(name, count)| format!("{name}: {count}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "Column types: {types}")?;
            writeln!(
                out,
                "Columns with nulls: {} ({}%)",
                summary.columns_with_nulls, summary.columns_with_nulls_percentage
            )?;
            writeln!(out, "Average null percentage: {}%", summary.avg_null_percentage)?;
            writeln!(
                out,
                "Average unique percentage: {}%",
                summary.avg_distinct_percentage
            )?;
            writeln!(out)?;
        }

        if config.include_insights {
            write_bullets(out, "== Data Insights ==", &report.insights.summary)?;
            write_bullets(out, "== Recommendations ==", &report.insights.recommendations)?;
        }

        if config.include_outcomes {
            let shown = filter_outcomes(&report.outcomes, config);
            for column in column_order(report) {
                let outcomes: Vec<&RuleOutcome> =
                    shown.iter().copied().filter(|o| o.column == column).collect();
                if outcomes.is_empty() {
                    continue;
                }
                self.write_column(out, report, column, &outcomes, config)?;
            }
            let hidden = report.outcomes.len() - shown.len();
            if hidden > 0 {
                writeln!(out, "... {hidden} more outcomes not shown")?;
                writeln!(out)?;
            }
        }

        let metrics = &report.metrics;
        writeln!(out, "== Summary ==")?;
        writeln!(out, "Total rules evaluated: {}", metrics.passed + metrics.failed)?;
        writeln!(
            out,
            "Rules passed: {} ({:.1}%)",
            metrics.passed, metrics.pass_rate
        )?;
        if metrics.skipped > 0 {
            writeln!(out, "Rules skipped: {}", metrics.skipped)?;
        }
        let status = match (report.overall_passed, config.use_colors) {
            (true, true) => "\x1b[32mPASSED\x1b[0m",
            (true, false) => "PASSED",
            (false, true) => "\x1b[31mFAILED\x1b[0m",
            (false, false) => "FAILED",
        };
        writeln!(out, "Overall status: {status}")
    }

    fn write_column(
        &self,
        out: &mut String,
        report: &Report,
        column: &str,
        outcomes: &[&RuleOutcome],
        config: &FormatterConfig,
    ) -> fmt::Result {
        let failed = report.outcomes_for(column).any(|o| o.is_failed());
        writeln!(out, "== Column: {column} [{}] ==", mark(!failed))?;

        let profile = report.profile(column);
        if let Some(profile) = profile {
            writeln!(out, "Type: {}", profile.inferred_type)?;
        }
        if let Some(score) = report.health.column_scores.iter().find(|s| s.column == column) {
            writeln!(out, "Rules: {}/{} passed", score.passed, score.evaluated)?;
        }
        if let (Some(profile), true) = (profile, config.include_statistics) {
            writeln!(out, "Statistics:")?;
            write_statistics(out, profile)?;
        }

        writeln!(out, "Rule Results:")?;
        for outcome in outcomes {
            let status = match outcome.status {
                OutcomeStatus::Passed => mark(true),
                OutcomeStatus::Failed => mark(false),
                OutcomeStatus::Skipped => "-",
            };
            writeln!(out, "  [{status}] {}: {}", outcome.rule_name, outcome.message)?;
            for sample in outcome.failing_samples.iter().take(config.max_samples) {
                writeln!(out, "      row {}: {}", sample.row, sample.value)?;
            }
        }
        writeln!(out)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &Report, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.write_report(&mut output, report, config)
            .map_err(|e| CanaryError::Internal(format!("Failed to format report: {e}")))?;
        Ok(output)
    }
}

/// Formats reports as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 5);
        self
    }

    fn write_report(
        &self,
        out: &mut String,
        report: &Report,
        config: &FormatterConfig,
    ) -> fmt::Result {
        let h = "#".repeat(self.heading_level as usize);
        let meta = &report.metadata;

        let verdict = if report.overall_passed {
            "PASSED"
        } else {
            "FAILED"
        };
        writeln!(out, "{h} Data Quality Report - {verdict}")?;
        writeln!(out)?;
        if let Some(name) = &meta.dataset_name {
            writeln!(out, "**Dataset:** {}", escape_cell(name))?;
        }
        writeln!(
            out,
            "**Health:** {} ({})",
            report.health.score, report.health.status
        )?;
        if config.include_timestamps {
            writeln!(out, "**Generated:** {}", meta.timestamp)?;
        }

        if config.include_metrics {
            let metrics = &report.metrics;
            writeln!(out)?;
            writeln!(out, "{h}# Summary")?;
            writeln!(out)?;
            writeln!(out, "| Metric | Value |")?;
            writeln!(out, "|--------|-------|")?;
            writeln!(out, "| Rows | {} |", meta.row_count)?;
            writeln!(out, "| Columns | {} |", meta.column_count)?;
            writeln!(out, "| Outcomes | {} |", metrics.total)?;
            writeln!(out, "| Passed | {} |", metrics.passed)?;
            writeln!(out, "| Failed | {} |", metrics.failed)?;
            writeln!(out, "| Skipped | {} |", metrics.skipped)?;
            writeln!(out, "| Pass Rate | {:.1}% |", metrics.pass_rate)?;
            writeln!(out, "| Completeness | {}% |", report.summary.completeness)?;
        }

        if config.include_outcomes {
            let shown = filter_outcomes(&report.outcomes, config);
            if !shown.is_empty() {
                writeln!(out)?;
                writeln!(out, "{h}# Rule Results")?;
                writeln!(out)?;
                writeln!(out, "| Status | Rule | Column | Metric | Message |")?;
                writeln!(out, "|--------|------|--------|--------|---------|")?;
                for outcome in &shown {
                    let metric = outcome
                        .metric
                        .map(|m| format!("{m:.2}"))
                        .unwrap_or_default();
                    writeln!(
                        out,
                        "| {} | {} | {} | {metric} | {} |",
                        outcome.status,
                        escape_cell(&outcome.rule_name),
                        escape_cell(&outcome.column),
                        escape_cell(&outcome.message)
                    )?;
                }
            }
            let hidden = report.outcomes.len() - shown.len();
            if hidden > 0 {
                writeln!(out)?;
                writeln!(out, "> **Note:** {hidden} additional outcomes not shown.")?;
            }
        }

        if config.include_insights && !report.insights.is_empty() {
            writeln!(out)?;
            writeln!(out, "{h}# Insights")?;
            writeln!(out)?;
            for line in &report.insights.summary {
                writeln!(out, "- {line}")?;
            }
            for line in &report.insights.recommendations {
                writeln!(out, "- _{line}_")?;
            }
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &Report, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.write_report(&mut output, report, config)
            .map_err(|e| CanaryError::Internal(format!("Failed to format report: {e}")))?;
        Ok(output)
    }
}

fn mark(passed: bool) -> &'static str {
    if passed {
        "✓"
    } else {
        "✗"
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn write_bullets(out: &mut String, heading: &str, lines: &[String]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(out, "{heading}")?;
    for line in lines {
        writeln!(out, "- {line}")?;
    }
    writeln!(out)
}

fn write_statistics(out: &mut String, profile: &ColumnProfile) -> fmt::Result {
    writeln!(out, "  rows: {}", profile.row_count)?;
    writeln!(
        out,
        "  nulls: {} ({:.2}%)",
        profile.null_count, profile.null_percentage
    )?;
    writeln!(
        out,
        "  distinct: {} ({:.2}%)",
        profile.distinct_count, profile.distinct_percentage
    )?;
    if let (Some(min), Some(max)) = (&profile.min, &profile.max) {
        writeln!(out, "  min: {min}")?;
        writeln!(out, "  max: {max}")?;
    }
    if let Some(numeric) = &profile.numeric {
        writeln!(out, "  mean: {:.4}", numeric.mean)?;
        writeln!(out, "  median: {:.4}", numeric.median)?;
        writeln!(out, "  std_dev: {:.4}", numeric.std_dev)?;
    }
    if let Some(text) = &profile.text {
        writeln!(
            out,
            "  length: {}..{} (mean {:.2})",
            text.min_length, text.max_length, text.mean_length
        )?;
    }
    if !profile.sample_values.is_empty() {
        writeln!(out, "  samples: {}", profile.sample_values.join(", "))?;
    }
    Ok(())
}

/// Columns in dataset order, followed by columns that only appear in outcomes
/// (missing targets).
fn column_order(report: &Report) -> Vec<&str> {
    let mut columns: Vec<&str> = report.profiles.iter().map(|p| p.name.as_str()).collect();
    for outcome in &report.outcomes {
        if !columns.contains(&outcome.column.as_str()) {
            columns.push(&outcome.column);
        }
    }
    columns
}

fn filter_outcomes<'a>(
    outcomes: &'a [RuleOutcome],
    config: &FormatterConfig,
) -> Vec<&'a RuleOutcome> {
    let selected = outcomes
        .iter()
        .filter(|o| config.include_passed || !o.passed());
    match config.max_outcomes {
        Some(max) => selected.take(max).collect(),
        None => selected.collect(),
    }
}

fn filter_report(report: &Report, config: &FormatterConfig) -> Report {
    let mut filtered = report.clone();

    filtered.outcomes = if config.include_outcomes {
        filter_outcomes(&report.outcomes, config)
            .into_iter()
            .cloned()
            .map(|mut outcome| {
                outcome.failing_samples.truncate(config.max_samples);
                outcome
            })
            .collect()
    } else {
        Vec::new()
    };

    if !config.include_statistics {
        filtered.profiles.clear();
    }
    if !config.include_insights {
        filtered.insights = Default::default();
    }
    if !config.include_timestamps {
        filtered.metadata.timestamp.clear();
        filtered.metadata.duration_ms = 0;
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RuleEngine, RuleSet, RuleSpec};
    use crate::dataset::{Column, Dataset};

    fn report() -> Report {
        let dataset = Dataset::new(vec![
            Column::new("id", vec![1i64, 2, 3, 3]),
            Column::new("email", vec![Some("a@b.com"), None, Some("x|y"), Some("c@d.org")]),
        ])
        .unwrap()
        .with_name("users.csv");
        let rules = RuleSet::new(vec![
            RuleSpec::new("unique_value")
                .with_target_column("id")
                .with_threshold(95.0),
            RuleSpec::new("null_percentage")
                .with_target_column("email")
                .with_threshold(30.0),
            RuleSpec::new("value_range")
                .with_target_column("email")
                .with_min_value(0.0),
        ]);
        RuleEngine::new().validate(&dataset, &rules).unwrap()
    }

    #[test]
    fn test_human_formatter_layout() {
        let output = HumanFormatter::with_config(FormatterConfig::default().with_colors(false))
            .format(&report())
            .unwrap();

        assert!(output.starts_with("= Canary Guard Quality Report =\n"));
        assert!(output.contains("Dataset: users.csv"));
        assert!(output.contains("== Dataset Summary =="));
        assert!(output.contains("Column types: integer: 1, string: 1"));
        assert!(output.contains("== Column: id [✗] =="));
        assert!(output.contains(
            "  [✗] unique_value_id: Column has 75.00% unique values (threshold: 95%)"
        ));
        assert!(output.contains("      row 3: 3"));
        assert!(output.contains("== Column: email [✓] =="));
        assert!(output.contains("  [-] value_range_email:"));
        assert!(output.contains("Rules: 1/1 passed"));
        assert!(output.contains("Total rules evaluated: 2"));
        assert!(output.contains("Rules skipped: 1"));
        assert!(output.ends_with("Overall status: FAILED\n"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_human_formatter_minimal() {
        let output = HumanFormatter::with_config(FormatterConfig::minimal())
            .format(&report())
            .unwrap();
        assert!(!output.contains("== Column:"));
        assert!(!output.contains("Generated:"));
        assert!(output.contains("Rules passed: 1 (50.0%)"));
    }

    #[test]
    fn test_json_formatter_round_trips_by_default() {
        let report = report();
        let json = JsonFormatter::new().format(&report).unwrap();
        assert_eq!(Report::from_json(&json).unwrap(), report);

        let compact = JsonFormatter::new().with_pretty(false).format(&report).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_json_formatter_filters() {
        let json = JsonFormatter::with_config(FormatterConfig::ci())
            .format(&report())
            .unwrap();
        let filtered = Report::from_json(&json).unwrap();
        assert_eq!(filtered.outcomes.len(), 2);
        assert!(filtered.outcomes.iter().all(|o| !o.passed()));
        assert!(filtered.profiles.is_empty());
        assert_eq!(filtered.metrics.total, 3);
    }

    #[test]
    fn test_markdown_formatter() {
        let output = MarkdownFormatter::new()
            .with_heading_level(3)
            .format(&report())
            .unwrap();
        assert!(output.starts_with("### Data Quality Report - FAILED"));
        assert!(output.contains("#### Summary"));
        assert!(output.contains("| Failed | 1 |"));
        assert!(output.contains("| failed | unique_value_id | id | 75.00 |"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }
}
