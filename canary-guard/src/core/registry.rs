//! Rule registry: maps a spec's `type` to a factory building the rule.
//!
//! Dispatch happens once, when rules are loaded. Adding a rule type means
//! registering one more factory; the engine never inspects types itself.
//!
//! ```rust
//! use std::sync::Arc;
//! use canary_guard::core::{BoxedRule, ColumnContext, Rule, RuleOutcome, RuleRegistry, RuleSpec};
//! use canary_guard::prelude::*;
//!
//! #[derive(Debug)]
//! struct MaxRows(f64);
//!
//! impl Rule for MaxRows {
//!     fn rule_type(&self) -> &str {
//!         "max_rows"
//!     }
//!
//!     fn evaluate_column(&self, ctx: &ColumnContext<'_>) -> Result<RuleOutcome> {
//!         let rows = ctx.profile.row_count as f64;
//!         Ok(RuleOutcome::from_check(
//!             rows <= self.0,
//!             self.outcome_name(ctx.name()),
//!             self.rule_type(),
//!             ctx.name(),
//!             format!("{rows} rows"),
//!         ))
//!     }
//! }
//!
//! let mut registry = RuleRegistry::with_builtins();
//! registry.register("max_rows", |spec, ctx| {
//!     let limit = ctx.require_number("threshold", spec.threshold.as_ref())?;
//!     Ok(Arc::new(MaxRows(limit)) as BoxedRule)
//! });
//!
//! let rule = registry.build(
//!     &RuleSpec::new("max_rows").with_threshold(10.0),
//!     0,
//!     &Default::default(),
//! );
//! assert!(rule.is_ok());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::constraints::{
    AllowedValuesRule, NullPercentageRule, PatternMatchRule, StringLengthRule, UniqueValueRule,
    ValueRangeRule,
};
use crate::core::rule::{BoxedRule, Rule};
use crate::core::spec::{NumericParam, RuleDefaults, RuleSpec};
use crate::prelude::*;

/// Builds a rule from its spec.
pub type RuleFactory =
    Arc<dyn Fn(&RuleSpec, &BuildContext<'_>) -> Result<BoxedRule> + Send + Sync>;

/// Rules that can be built from a spec by the registry.
pub trait FromSpec: Rule + Sized + 'static {
    /// The `type` value this rule is registered under.
    const RULE_TYPE: &'static str;

    fn from_spec(spec: &RuleSpec, ctx: &BuildContext<'_>) -> Result<Self>;
}

/// What a factory gets besides the spec: the label for error messages and
/// the engine's defaults.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    label: &'a str,
    defaults: &'a RuleDefaults,
}

impl<'a> BuildContext<'a> {
    pub fn new(label: &'a str, defaults: &'a RuleDefaults) -> Self {
        Self { label, defaults }
    }

    /// Identifies the rule in configuration errors.
    pub fn label(&self) -> &str {
        self.label
    }

    pub fn defaults(&self) -> &RuleDefaults {
        self.defaults
    }

    /// A configuration error for this rule.
    pub fn error(&self, message: impl Into<String>) -> CanaryError {
        CanaryError::configuration(self.label, message)
    }

    /// Resolves an optional numeric parameter.
    pub fn number(&self, field: &str, param: Option<&NumericParam>) -> Result<Option<f64>> {
        param
            .map(|p| {
                p.resolve()
                    .map_err(|e| self.error(format!("parameter '{field}': {e}")))
            })
            .transpose()
    }

    /// Resolves a required numeric parameter.
    pub fn require_number(&self, field: &str, param: Option<&NumericParam>) -> Result<f64> {
        self.number(field, param)?
            .ok_or_else(|| self.error(format!("missing required parameter '{field}'")))
    }

    /// Resolves a percentage in `[0, 100]`, falling back to `default`.
    pub fn percentage(
        &self,
        field: &str,
        param: Option<&NumericParam>,
        default: Option<f64>,
    ) -> Result<f64> {
        let value = match self.number(field, param)? {
            Some(value) => value,
            None => default
                .ok_or_else(|| self.error(format!("missing required parameter '{field}'")))?,
        };
        if !(0.0..=100.0).contains(&value) {
            return Err(self.error(format!(
                "parameter '{field}' must be between 0 and 100, got {value}"
            )));
        }
        Ok(value)
    }

    /// Resolves a non-negative whole number.
    pub fn count(&self, field: &str, param: Option<&NumericParam>) -> Result<Option<usize>> {
        match self.number(field, param)? {
            None => Ok(None),
            Some(value) if value >= 0.0 && value.fract() == 0.0 => Ok(Some(value as usize)),
            Some(value) => Err(self.error(format!(
                "parameter '{field}' must be a non-negative integer, got {value}"
            ))),
        }
    }
}

/// Factories keyed by rule type.
#[derive(Clone)]
pub struct RuleRegistry {
    factories: BTreeMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// A registry without any rule types.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with every built-in rule type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry
            .register_rule::<NullPercentageRule>()
            .register_rule::<UniqueValueRule>()
            .register_rule::<ValueRangeRule>()
            .register_rule::<PatternMatchRule>()
            .register_rule::<AllowedValuesRule>()
            .register_rule::<StringLengthRule>();
        registry
    }

    /// Registers a factory, replacing any previous one for the same type.
    pub fn register<F>(&mut self, rule_type: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&RuleSpec, &BuildContext<'_>) -> Result<BoxedRule> + Send + Sync + 'static,
    {
        let rule_type = rule_type.into();
        debug!(rule.kind = %rule_type, "Registering rule type");
        self.factories.insert(rule_type, Arc::new(factory));
        self
    }

    /// Registers a rule implementing [`FromSpec`] under its `RULE_TYPE`.
    pub fn register_rule<R: FromSpec>(&mut self) -> &mut Self {
        self.register(R::RULE_TYPE, |spec, ctx| {
            Ok(Arc::new(R::from_spec(spec, ctx)?) as BoxedRule)
        })
    }

    pub fn contains(&self, rule_type: &str) -> bool {
        self.factories.contains_key(rule_type)
    }

    /// Registered rule types in sorted order.
    pub fn rule_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Builds the rule for the spec at position `index` of its rule set.
    pub fn build(
        &self,
        spec: &RuleSpec,
        index: usize,
        defaults: &RuleDefaults,
    ) -> Result<BoxedRule> {
        let label = spec.label(index);
        let ctx = BuildContext::new(&label, defaults);
        let factory = self.factories.get(&spec.rule_type).ok_or_else(|| {
            ctx.error(format!(
                "unknown rule type '{}' (known types: {})",
                spec.rule_type,
                self.rule_types().join(", ")
            ))
        })?;
        factory(spec, &ctx)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rule_types", &self.rule_types())
            .finish()
    }
}
