//! Declarative rule specifications.
//!
//! A [`RuleSet`] mirrors the external rule document:
//!
//! ```yaml
//! name: customers
//! rules:
//!   - type: null_percentage
//!     threshold: 5.0
//!   - type: pattern_match
//!     name: email_format
//!     target_column: email
//!     pattern: '^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$'
//! ```
//!
//! Specs are plain data; nothing is validated until the engine loads them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::prelude::*;

/// A numeric rule parameter, written either as a number or as numeric text.
///
/// Integer literals keep their exact value, so bounds beyond 2^53 compare
/// exactly against integer columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericParam {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl NumericParam {
    /// Resolves the parameter to a finite number.
    pub fn resolve(&self) -> std::result::Result<f64, String> {
        let value = match self {
            NumericParam::Integer(i) => *i as f64,
            NumericParam::Number(n) => *n,
            NumericParam::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{text}' is not a number"))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{value} is not a finite number"))
        }
    }

    /// The exact integer value, if the parameter is a whole number that fits
    /// in an `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NumericParam::Integer(i) => Some(*i),
            NumericParam::Number(n) => exact_integer(*n),
            NumericParam::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(exact_integer))
            }
        }
    }
}

/// `value` as an `i64` when that conversion loses nothing.
fn exact_integer(value: f64) -> Option<i64> {
    // 2^63; the upper end is exclusive since i64::MAX is not representable
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then_some(value as i64)
}

impl From<f64> for NumericParam {
    fn from(value: f64) -> Self {
        NumericParam::Number(value)
    }
}

impl From<i64> for NumericParam {
    fn from(value: i64) -> Self {
        NumericParam::Integer(value)
    }
}

impl From<&str> for NumericParam {
    fn from(value: &str) -> Self {
        NumericParam::Text(value.to_string())
    }
}

/// Declarative description of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Registry key of the rule variant
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Restricts the rule to one column; otherwise every column is checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<NumericParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<NumericParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<NumericParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Accepted values for `allowed_values`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<NumericParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<NumericParam>,
    /// Lets `unique_value` pass on columns without non-null values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty: Option<bool>,
    /// Any other keys, for custom rule types
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl RuleSpec {
    /// Creates a spec of the given type with no parameters.
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            name: None,
            description: None,
            target_column: None,
            threshold: None,
            min_value: None,
            max_value: None,
            pattern: None,
            values: None,
            min_length: None,
            max_length: None,
            allow_empty: None,
            params: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    pub fn with_threshold(mut self, threshold: impl Into<NumericParam>) -> Self {
        self.threshold = Some(threshold.into());
        self
    }

    pub fn with_min_value(mut self, min: impl Into<NumericParam>) -> Self {
        self.min_value = Some(min.into());
        self
    }

    pub fn with_max_value(mut self, max: impl Into<NumericParam>) -> Self {
        self.max_value = Some(max.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_min_length(mut self, min: impl Into<NumericParam>) -> Self {
        self.min_length = Some(min.into());
        self
    }

    pub fn with_max_length(mut self, max: impl Into<NumericParam>) -> Self {
        self.max_length = Some(max.into());
        self
    }

    pub fn with_allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = Some(allow);
        self
    }

    /// Adds a free-form parameter for custom rule types.
    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Label used in configuration errors: the rule name, or its position
    /// and type.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("rules[{index}] ({})", self.rule_type),
        }
    }
}

/// An ordered list of rule specs, optionally named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rules: Vec<RuleSpec>,
}

impl RuleSet {
    pub fn new(rules: Vec<RuleSpec>) -> Self {
        Self { name: None, rules }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parses a JSON rule document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CanaryError::configuration("rule set", format!("invalid JSON: {e}")))
    }

    /// Parses a YAML rule document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| CanaryError::configuration("rule set", format!("invalid YAML: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the canonical JSON form, hex encoded.
    ///
    /// Equal for rule sets that differ only in the source format or key order.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Defaults applied to specs that leave a parameter out.
///
/// The default is strict: a missing threshold is a configuration error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDefaults {
    pub null_percentage_threshold: Option<f64>,
    pub unique_value_threshold: Option<f64>,
    /// Empty-column policy for `unique_value` when the spec has no `allow_empty`
    pub unique_value_allow_empty: bool,
}

impl RuleDefaults {
    /// Thresholds of 5% nulls and 90% distinct values.
    pub fn lenient() -> Self {
        Self {
            null_percentage_threshold: Some(5.0),
            unique_value_threshold: Some(90.0),
            unique_value_allow_empty: false,
        }
    }
}
