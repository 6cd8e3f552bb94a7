//! Rules, the rule engine and reports.
//!
//! ## Overview
//!
//! - **[`RuleSpec`] / [`RuleSet`]**: declarative rule configuration, parsed
//!   from JSON or YAML
//! - **[`RuleRegistry`]**: maps rule type names to factories that turn specs
//!   into [`Rule`]s
//! - **[`RuleEngine`]**: validates a rule set into [`CompiledRules`] and runs
//!   them against a dataset
//! - **[`Report`]**: outcomes, column profiles and aggregates of one run
//!
//! ## Architecture
//!
//! ```text
//! RuleSet ──load_rules──▶ CompiledRules
//!                             │
//! Dataset ──profile──▶ [ColumnProfile]
//!                             │
//!                      run ───┴──▶ Report
//!                                   ├── outcomes (declaration order)
//!                                   ├── profiles
//!                                   ├── summary / health / insights
//!                                   └── metadata
//! ```
//!
//! ## Outcome status
//!
//! - **passed**: the column satisfies the rule
//! - **failed**: the column violates the rule, the target column is missing,
//!   or evaluation raised an error
//! - **skipped**: the rule does not apply to the column's inferred type
//!
//! Only failed outcomes make a report fail.

mod engine;
mod registry;
mod report;
mod rule;
mod spec;

pub use engine::{CompiledRules, EngineConfig, RuleEngine, RuleEngineBuilder};
pub use registry::{BuildContext, FromSpec, RuleFactory, RuleRegistry};
pub use report::{Report, ReportMetrics, RunMetadata};
pub use rule::{
    BoxedRule, ColumnContext, EvaluationContext, FailingSample, Failures, OutcomeStatus, Rule,
    RuleOutcome, DEFAULT_MAX_FAILING_SAMPLES,
};
pub use spec::{NumericParam, RuleDefaults, RuleSet, RuleSpec};
