//! Data type inference for column values.
//!
//! Values arrive either already typed (integers, floats, booleans, dates) or as
//! text that may hold any of those. The engine classifies every non-null value
//! and picks the most specific type that covers all of them:
//!
//! 1. `Integer` if every value is an integer
//! 2. `Float` if every value is numeric (and at least one is not an integer)
//! 3. `Boolean` if every value is a boolean or a boolean token
//! 4. `Date` if every value is a date or date/time in a recognised format
//! 5. `String` otherwise, or `Null` when there is nothing to classify
//!
//! Inference never fails: values that pass no test simply make the column a
//! string column.
//!
//! # Example
//!
//! ```rust
//! use canary_guard::analyzers::inference::TypeInferenceEngine;
//! use canary_guard::analyzers::InferredType;
//! use canary_guard::dataset::Column;
//!
//! let engine = TypeInferenceEngine::new();
//! let column = Column::new("price", vec!["1", "2.5", "3"]);
//! assert_eq!(engine.infer_column(&column).inferred_type, InferredType::Float);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzers::profile_types::InferredType;
use crate::dataset::{Column, Value};

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern is valid"));

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("number pattern is valid")
});

/// Configuration for the type inference engine
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Lowercase tokens read as `true`
    pub true_tokens: Vec<String>,
    /// Lowercase tokens read as `false`
    pub false_tokens: Vec<String>,
    /// `chrono` formats for date-only text
    pub date_formats: Vec<String>,
    /// `chrono` formats for date/time text (RFC 3339 is always accepted)
    pub datetime_formats: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            true_tokens: to_strings(&["true", "t", "yes", "y"]),
            false_tokens: to_strings(&["false", "f", "no", "n"]),
            date_formats: to_strings(&["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"]),
            datetime_formats: to_strings(&["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Per-type match counts over the non-null values of a column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    pub non_null: usize,
    pub integer_matches: usize,
    pub numeric_matches: usize,
    pub boolean_matches: usize,
    pub temporal_matches: usize,
}

/// Type inference result for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInferenceResult {
    pub inferred_type: InferredType,
    pub stats: TypeStats,
}

/// Builder for TypeInferenceEngine
#[derive(Debug, Clone, Default)]
pub struct TypeInferenceEngineBuilder {
    config: InferenceConfig,
}

impl TypeInferenceEngineBuilder {
    /// Replace the boolean token sets
    pub fn boolean_tokens<I, S>(mut self, true_tokens: I, false_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.true_tokens = true_tokens
            .into_iter()
            .map(|t| t.into().to_lowercase())
            .collect();
        self.config.false_tokens = false_tokens
            .into_iter()
            .map(|t| t.into().to_lowercase())
            .collect();
        self
    }

    /// Add a date-only format
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.date_formats.push(format.into());
        self
    }

    /// Add a date/time format
    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.config.datetime_formats.push(format.into());
        self
    }

    /// Build the TypeInferenceEngine
    pub fn build(self) -> TypeInferenceEngine {
        TypeInferenceEngine {
            config: self.config,
        }
    }
}

/// Classifies values and infers column types.
#[derive(Debug, Clone, Default)]
pub struct TypeInferenceEngine {
    config: InferenceConfig,
}

impl TypeInferenceEngine {
    /// Create a new builder for TypeInferenceEngine
    pub fn builder() -> TypeInferenceEngineBuilder {
        TypeInferenceEngineBuilder::default()
    }

    /// Create a TypeInferenceEngine with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer the type of a column from its non-null values.
    pub fn infer_column(&self, column: &Column) -> TypeInferenceResult {
        let mut stats = TypeStats::default();
        for (_, value) in column.non_null() {
            self.record(value, &mut stats);
        }
        TypeInferenceResult {
            inferred_type: determine_type(&stats),
            stats,
        }
    }

    /// Test a single non-null value against every type and update the counts.
    pub fn record(&self, value: &Value, stats: &mut TypeStats) {
        stats.non_null += 1;
        if parse_integer(value).is_some() {
            stats.integer_matches += 1;
        }
        if parse_number(value).is_some() {
            stats.numeric_matches += 1;
        }
        if self.parse_boolean(value).is_some() {
            stats.boolean_matches += 1;
        }
        if self.parse_temporal(value).is_some() {
            stats.temporal_matches += 1;
        }
    }

    /// Reads a boolean or boolean token.
    pub fn parse_boolean(&self, value: &Value) -> Option<bool> {
        match value {
            Value::Boolean(b) => Some(*b),
            Value::Text(s) => {
                let token = s.trim().to_lowercase();
                if self.config.true_tokens.contains(&token) {
                    Some(true)
                } else if self.config.false_tokens.contains(&token) {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Reads a date or date/time, returning the instant and whether the
    /// source carried only a date.
    pub fn parse_temporal(&self, value: &Value) -> Option<(NaiveDateTime, bool)> {
        match value {
            Value::Date(d) => Some((d.and_time(NaiveTime::MIN), true)),
            Value::DateTime(dt) => Some((*dt, false)),
            Value::Text(s) => {
                let text = s.trim();
                for format in &self.config.date_formats {
                    if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                        return Some((date.and_time(NaiveTime::MIN), true));
                    }
                }
                for format in &self.config.datetime_formats {
                    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                        return Some((dt, false));
                    }
                }
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|dt| (dt.naive_utc(), false))
            }
            _ => None,
        }
    }
}

/// Reads an integer value or integer text.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Text(s) => {
            let text = s.trim();
            if INTEGER_PATTERN.is_match(text) {
                text.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Reads a numeric value or numeric text as a finite `f64`.
///
/// Infinities, including text that overflows such as `1e400`, are not
/// numbers here.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) if f.is_finite() => Some(*f),
        Value::Text(s) => {
            let text = s.trim();
            if NUMBER_PATTERN.is_match(text) {
                text.parse::<f64>().ok().filter(|f| f.is_finite())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn determine_type(stats: &TypeStats) -> InferredType {
    let n = stats.non_null;
    if n == 0 {
        InferredType::Null
    } else if stats.integer_matches == n {
        InferredType::Integer
    } else if stats.numeric_matches == n {
        InferredType::Float
    } else if stats.boolean_matches == n {
        InferredType::Boolean
    } else if stats.temporal_matches == n {
        InferredType::Date
    } else {
        InferredType::String
    }
}
