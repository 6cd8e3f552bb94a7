//! Loading rule sets and running them against datasets.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{info, instrument, warn};

use super::{
    BoxedRule, BuildContext, EvaluationContext, FromSpec, Report, RuleDefaults, RuleRegistry,
    RuleSet, RuleSpec, RunMetadata, DEFAULT_MAX_FAILING_SAMPLES,
};
use crate::analyzers::{
    ColumnProfile, ColumnProfiler, DataInsights, InsightThresholds, ProfilerConfig,
};
use crate::dataset::Dataset;
use crate::logging::{truncate_field, LogConfig};
use crate::prelude::*;

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Parameters for specs that leave them out
    pub defaults: RuleDefaults,
    /// Upper bound on failing samples per outcome
    pub max_failing_samples: usize,
    pub profiler: ProfilerConfig,
    pub insights: InsightThresholds,
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defaults: RuleDefaults::default(),
            max_failing_samples: DEFAULT_MAX_FAILING_SAMPLES,
            profiler: ProfilerConfig::default(),
            insights: InsightThresholds::default(),
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Lenient rule defaults and verbose logging, for exploring a dataset.
    pub fn exploratory() -> Self {
        Self {
            defaults: RuleDefaults::lenient(),
            log: LogConfig::verbose(),
            ..Self::default()
        }
    }
}

/// A validated rule set, ready to run.
///
/// Rules are immutable and shared, so one `CompiledRules` can be run against
/// any number of datasets, from any thread.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    name: Option<String>,
    fingerprint: String,
    rules: Vec<BoxedRule>,
}

impl CompiledRules {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fingerprint of the rule set these rules were loaded from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[BoxedRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Loads rule sets and evaluates them against datasets.
///
/// # Examples
///
/// ```rust
/// use canary_guard::core::{RuleEngine, RuleSet};
/// use canary_guard::dataset::{Column, Dataset};
///
/// let rules = RuleSet::from_yaml_str(
///     r#"
/// rules:
///   - type: null_percentage
///     target_column: email
///     threshold: 10
/// "#,
/// )
/// .unwrap();
///
/// let engine = RuleEngine::new();
/// let compiled = engine.load_rules(&rules).unwrap();
///
/// let dataset = Dataset::new(vec![Column::new(
///     "email",
///     vec![Some("a@b.com"), None, Some("c@d.com"), Some("e@f.com")],
/// )])
/// .unwrap();
///
/// let report = engine.run(&dataset, &compiled);
/// assert!(!report.overall_passed);
/// assert_eq!(report.outcomes[0].metric, Some(25.0));
/// ```
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: EngineConfig,
    registry: RuleRegistry,
    profiler: ColumnProfiler,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// An engine with the built-in rules and default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RuleEngineBuilder {
        RuleEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Resolves every spec of the rule set into a rule.
    ///
    /// Fails on the first invalid spec, naming it in the error.
    #[instrument(skip(self, rule_set), fields(
        rule_set.name = ?rule_set.name,
        rule_set.rules = rule_set.len()
    ))]
    pub fn load_rules(&self, rule_set: &RuleSet) -> Result<CompiledRules> {
        let generated = GeneratedNames::of(rule_set);
        let mut names = HashSet::new();
        let mut rules = Vec::with_capacity(rule_set.len());

        for (index, spec) in rule_set.rules.iter().enumerate() {
            if let Some(name) = spec.name.as_deref() {
                let problem = if !names.insert(name) {
                    Some(format!("duplicate rule name '{name}'"))
                } else {
                    generated.collision(name).map(|rule_type| {
                        format!(
                            "rule name '{name}' collides with the generated name of an \
                             unnamed {rule_type} rule"
                        )
                    })
                };
                if let Some(message) = problem {
                    warn!(rule.name = %name, "Rejected rule name");
                    return Err(CanaryError::configuration(spec.label(index), message));
                }
            }

            let rule = match self.registry.build(spec, index, &self.config.defaults) {
                Ok(rule) => rule,
                Err(e) => {
                    warn!(error = %e, "Rejected rule");
                    return Err(e);
                }
            };
            crate::perf_debug!(
                self.config.log,
                rule.index = index,
                rule.kind = %spec.rule_type,
                rule.column = ?rule.target_column(),
                "Loaded rule"
            );
            rules.push(rule);
        }

        let fingerprint = rule_set.fingerprint()?;
        info!(
            rules = rules.len(),
            rule_set.fingerprint = %fingerprint,
            "Loaded rule set"
        );

        Ok(CompiledRules {
            name: rule_set.name.clone(),
            fingerprint,
            rules,
        })
    }

    /// Profiles every column of the dataset.
    pub fn profile(&self, dataset: &Dataset) -> Vec<ColumnProfile> {
        let profiles = self.profiler.profile_dataset(dataset);
        for profile in &profiles {
            crate::log_profile!(
                self.config.log,
                column = %profile.name,
                inferred_type = %profile.inferred_type,
                null_percentage = profile.null_percentage,
                distinct_count = profile.distinct_count,
                "Profiled column"
            );
        }
        profiles
    }

    /// Profiles the dataset and evaluates the rules against it.
    ///
    /// Rules are evaluated in declaration order. Evaluation problems become
    /// failed outcomes, so this never fails.
    #[instrument(skip(self, dataset, rules), fields(
        dataset.name = ?dataset.name(),
        dataset.rows = dataset.row_count(),
        rules = rules.len()
    ))]
    pub fn run(&self, dataset: &Dataset, rules: &CompiledRules) -> Report {
        info!(
            dataset.columns = dataset.column_count(),
            rule_set.name = ?rules.name(),
            "Starting rule evaluation"
        );
        let start = Instant::now();

        let profiles = self.profile(dataset);
        let ctx = EvaluationContext::new(dataset, &profiles)
            .with_max_failing_samples(self.config.max_failing_samples);

        let mut outcomes = Vec::new();
        for rule in rules.rules() {
            let rule_outcomes = rule.evaluate(&ctx);
            for outcome in &rule_outcomes {
                crate::log_rule!(
                    self.config.log,
                    rule.name = %outcome.rule_name,
                    rule.column = %outcome.column,
                    rule.status = %outcome.status,
                    rule.metric = ?outcome.metric,
                    rule.message = %truncate_field(
                        &outcome.message,
                        self.config.log.max_field_length
                    ),
                    "Evaluated rule"
                );
            }
            outcomes.extend(rule_outcomes);
        }

        let insights = DataInsights::with_thresholds(&profiles, &self.config.insights);
        let metadata = RunMetadata {
            dataset_name: dataset.name().map(str::to_string),
            row_count: dataset.row_count(),
            column_count: dataset.column_count(),
            rule_set_name: rules.name.clone(),
            rule_set_fingerprint: rules.fingerprint.clone(),
            rule_count: rules.len(),
            engine_version: RunMetadata::engine_version().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        let report = Report::new(outcomes, profiles, insights, metadata);

        if self.config.log.log_run_summary {
            info!(
                report.passed = report.overall_passed,
                outcomes.passed = report.metrics.passed,
                outcomes.failed = report.metrics.failed,
                outcomes.skipped = report.metrics.skipped,
                health.score = report.health.score,
                health.status = %report.health.status,
                duration_ms = report.metadata.duration_ms,
                "Rule evaluation completed"
            );
        }
        report
    }

    /// Loads the rule set and runs it. A configuration error aborts the run
    /// without a report.
    pub fn validate(&self, dataset: &Dataset, rule_set: &RuleSet) -> Result<Report> {
        let rules = self.load_rules(rule_set)?;
        Ok(self.run(dataset, &rules))
    }
}

/// Builder for [`RuleEngine`].
#[derive(Debug, Clone, Default)]
pub struct RuleEngineBuilder {
    config: EngineConfig,
    registry: RuleRegistry,
}

impl RuleEngineBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn defaults(mut self, defaults: RuleDefaults) -> Self {
        self.config.defaults = defaults;
        self
    }

    pub fn max_failing_samples(mut self, max: usize) -> Self {
        self.config.max_failing_samples = max;
        self
    }

    pub fn profiler(mut self, profiler: ProfilerConfig) -> Self {
        self.config.profiler = profiler;
        self
    }

    pub fn insight_thresholds(mut self, thresholds: InsightThresholds) -> Self {
        self.config.insights = thresholds;
        self
    }

    pub fn log_config(mut self, log: LogConfig) -> Self {
        self.config.log = log;
        self
    }

    /// Replaces the registry, dropping the built-in rules unless `registry`
    /// has them.
    pub fn registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers a custom rule factory.
    pub fn register<F>(mut self, rule_type: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RuleSpec, &BuildContext<'_>) -> Result<BoxedRule> + Send + Sync + 'static,
    {
        self.registry.register(rule_type, factory);
        self
    }

    /// Registers a custom rule implementing [`FromSpec`].
    pub fn register_rule<R: FromSpec>(mut self) -> Self {
        self.registry.register_rule::<R>();
        self
    }

    pub fn build(self) -> RuleEngine {
        let profiler = ColumnProfiler::builder()
            .config(self.config.profiler.clone())
            .build();
        RuleEngine {
            config: self.config,
            registry: self.registry,
            profiler,
        }
    }
}

/// Names the engine generates for unnamed rules, as `{rule_type}_{column}`.
///
/// Targeted rules produce one known name. Untargeted rules may produce
/// `{rule_type}_` followed by any column name.
#[derive(Debug, Default)]
struct GeneratedNames<'a> {
    exact: HashMap<String, &'a str>,
    prefixes: Vec<&'a str>,
}

impl<'a> GeneratedNames<'a> {
    fn of(rule_set: &'a RuleSet) -> Self {
        let mut names = Self::default();
        for spec in rule_set.rules.iter().filter(|spec| spec.name.is_none()) {
            match spec.target_column.as_deref() {
                Some(column) => {
                    names
                        .exact
                        .insert(format!("{}_{column}", spec.rule_type), &spec.rule_type);
                }
                None => names.prefixes.push(&spec.rule_type),
            }
        }
        names
    }

    /// The rule type whose generated names include `name`, if any.
    fn collision(&self, name: &str) -> Option<&str> {
        if let Some(rule_type) = self.exact.get(name) {
            return Some(*rule_type);
        }
        self.prefixes.iter().copied().find(|rule_type| {
            name.strip_prefix(*rule_type)
                .and_then(|rest| rest.strip_prefix('_'))
                .is_some_and(|column| !column.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnContext, OutcomeStatus, Rule, RuleOutcome};
    use crate::dataset::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("id", vec![1i64, 2, 3, 3]),
            Column::new("email", vec![Some("a@b.com"), None, Some("c@d.com"), Some("x")]),
        ])
        .unwrap()
        .with_name("users")
    }

    #[test]
    fn test_outcomes_follow_declaration_order() {
        let rules = RuleSet::new(vec![
            RuleSpec::new("unique_value").with_target_column("id").with_threshold(95.0),
            RuleSpec::new("null_percentage").with_threshold(50.0),
        ]);
        let report = RuleEngine::new().validate(&dataset(), &rules).unwrap();

        let order: Vec<(&str, &str)> = report
            .outcomes
            .iter()
            .map(|o| (o.rule_type.as_str(), o.column.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("unique_value", "id"),
                ("null_percentage", "id"),
                ("null_percentage", "email"),
            ]
        );
        assert!(!report.overall_passed);
        assert_eq!(report.metrics.failed, 1);
        assert_eq!(report.metadata.dataset_name.as_deref(), Some("users"));
        assert_eq!(report.metadata.rule_count, 2);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let rules = RuleSet::new(vec![
            RuleSpec::new("null_percentage").with_name("dup").with_threshold(1.0),
            RuleSpec::new("unique_value").with_name("dup").with_threshold(1.0),
        ]);
        let err = RuleEngine::new().load_rules(&rules).unwrap_err();
        match err {
            CanaryError::Configuration { rule, message } => {
                assert_eq!(rule, "dup");
                assert!(message.contains("duplicate rule name"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_names_colliding_with_generated_names_are_rejected() {
        let rules = RuleSet::new(vec![
            RuleSpec::new("null_percentage").with_threshold(1.0),
            RuleSpec::new("null_percentage")
                .with_name("null_percentage_email")
                .with_target_column("email")
                .with_threshold(50.0),
        ]);
        let err = RuleEngine::new().load_rules(&rules).unwrap_err();
        match err {
            CanaryError::Configuration { rule, message } => {
                assert_eq!(rule, "null_percentage_email");
                assert!(message.contains("unnamed null_percentage rule"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let rules = RuleSet::new(vec![
            RuleSpec::new("unique_value")
                .with_target_column("first_name")
                .with_threshold(1.0),
            RuleSpec::new("null_percentage")
                .with_name("unique_value_first_name")
                .with_threshold(1.0),
        ]);
        assert!(RuleEngine::new().load_rules(&rules).is_err());

        let rules = RuleSet::new(vec![
            RuleSpec::new("unique_value")
                .with_target_column("id")
                .with_threshold(1.0),
            RuleSpec::new("null_percentage")
                .with_name("unique_value_email")
                .with_threshold(1.0),
            RuleSpec::new("null_percentage")
                .with_name("null_percentage")
                .with_threshold(1.0),
        ]);
        assert!(RuleEngine::new().load_rules(&rules).is_ok());
    }

    #[test]
    fn test_unknown_type_aborts_validation() {
        let rules = RuleSet::new(vec![
            RuleSpec::new("null_percentage").with_threshold(1.0),
            RuleSpec::new("no_such_rule"),
        ]);
        let err = RuleEngine::new().validate(&dataset(), &rules).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("rules[1] (no_such_rule)"));
    }

    #[test]
    fn test_max_failing_samples_is_applied() {
        let engine = RuleEngine::builder().max_failing_samples(1).build();
        let rules = RuleSet::new(vec![RuleSpec::new("value_range")
            .with_target_column("id")
            .with_max_value(1.0)]);
        let report = engine.validate(&dataset(), &rules).unwrap();
        assert_eq!(report.outcomes[0].failing_row_count, 3);
        assert_eq!(report.outcomes[0].failing_samples.len(), 1);
    }

    #[derive(Debug)]
    struct ColumnCount {
        expected: usize,
    }

    impl Rule for ColumnCount {
        fn rule_type(&self) -> &str {
            "row_count"
        }

        fn target_column(&self) -> Option<&str> {
            Some("id")
        }

        fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
            let rows = ctx.profile.row_count as usize;
            Ok(RuleOutcome::from_check(
                rows == self.expected,
                self.outcome_name(ctx.name()),
                self.rule_type(),
                ctx.name(),
                format!("{rows} rows"),
            ))
        }
    }

    #[test]
    fn test_custom_rule_registration() {
        let engine = RuleEngine::builder()
            .register("row_count", |spec, ctx| {
                let expected = ctx
                    .count("expected", spec.threshold.as_ref())?
                    .ok_or_else(|| ctx.error("missing required parameter 'threshold'"))?;
                Ok(std::sync::Arc::new(ColumnCount { expected }) as BoxedRule)
            })
            .build();
        assert!(engine.registry().contains("row_count"));
        assert!(engine.registry().contains("null_percentage"));

        let rules = RuleSet::new(vec![RuleSpec::new("row_count").with_threshold(4i64)]);
        let report = engine.validate(&dataset(), &rules).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].status, OutcomeStatus::Passed);
        assert_eq!(report.outcomes[0].rule_name, "row_count_id");
    }

    #[test]
    fn test_compiled_rules_carry_fingerprint() {
        let rules = RuleSet::new(vec![RuleSpec::new("null_percentage").with_threshold(1.0)])
            .with_name("users");
        let compiled = RuleEngine::new().load_rules(&rules).unwrap();
        assert_eq!(compiled.name(), Some("users"));
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled.fingerprint(), rules.fingerprint().unwrap());
    }
}
