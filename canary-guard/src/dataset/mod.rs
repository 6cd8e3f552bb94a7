//! In-memory columnar datasets.
//!
//! A [`Dataset`] is an ordered list of equally long [`Column`]s. Values carry
//! the type the loading collaborator decoded them as; text cells that look like
//! numbers or dates are left as [`Value::Text`] and classified later by the
//! profiler. Null sentinels (empty strings, explicit null markers, NaN) must
//! already be normalised to [`Value::Null`] by the loader, with the exception of
//! `Float(NaN)` which is always treated as null.
//!
//! # Example
//!
//! ```rust
//! use canary_guard::dataset::{Column, Dataset, Value};
//!
//! let dataset = Dataset::new(vec![
//!     Column::new("id", vec![1i64, 2, 3]),
//!     Column::new("email", vec![Some("a@b.com"), None, Some("c@d.org")]),
//! ])
//! .unwrap()
//! .with_name("users.parquet");
//!
//! assert_eq!(dataset.row_count(), 3);
//! assert_eq!(dataset.column("email").unwrap().values()[1], Value::Null);
//! ```

mod record_batch;

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Missing value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float; NaN is treated as null
    Float(f64),
    /// Text, possibly holding a number or date awaiting inference
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without time zone
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true for [`Value::Null`] and `Float(NaN)`.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// The raw, pre-coercion textual representation of the value.
    ///
    /// Floats always render with a fractional part or exponent (`3.0`,
    /// `1e20`) so that they never read as integers.
    pub fn raw(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::Integer(i) => Cow::Owned(i.to_string()),
            Value::Float(f) => Cow::Owned(format!("{f:?}")),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Cow::Owned(dt.to_string()),
        }
    }

    /// Short lowercase name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            other => write!(f, "{}", other.raw()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A named, ordered sequence of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    /// Creates a column from anything convertible into values.
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the values in row order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(row_index, value)` pairs of non-null values.
    pub fn non_null(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.values.iter().enumerate().filter(|(_, v)| !v.is_null())
    }
}

/// An ordered collection of equally long columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    name: Option<String>,
    columns: Vec<Column>,
}

impl Dataset {
    /// Creates a dataset, checking that all columns have the same length and
    /// distinct names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(CanaryError::InvalidDataset(format!(
                    "column '{}' has {} rows but column '{}' has {}",
                    bad.name(),
                    bad.len(),
                    first.name(),
                    expected
                )));
            }
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(CanaryError::InvalidDataset(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        Ok(Self {
            name: None,
            columns,
        })
    }

    /// Sets an identifying name, reported in the run metadata.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the dataset name if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Number of rows (0 for a dataset without columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
