//! Profile data structures produced by the column profiler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::Value;

/// The type a column was inferred to hold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    /// Every non-null value is an integer
    Integer,
    /// Every non-null value is numeric and at least one is not an integer
    Float,
    /// Every non-null value is a boolean or boolean token
    Boolean,
    /// Every non-null value is a date or date/time
    Date,
    /// Anything else
    String,
    /// The column has no non-null values
    Null,
}

impl InferredType {
    /// Returns the string representation of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Integer => "integer",
            InferredType::Float => "float",
            InferredType::Boolean => "boolean",
            InferredType::Date => "date",
            InferredType::String => "string",
            InferredType::Null => "null",
        }
    }

    /// Returns true for integer and float columns.
    pub fn is_numeric(&self) -> bool {
        matches!(self, InferredType::Integer | InferredType::Float)
    }

    /// Returns true for types that carry a min/max.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            InferredType::Integer | InferredType::Float | InferredType::Date
        )
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Distribution statistics for numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); 0 for a single value
    pub std_dev: f64,
    pub zeros_count: u64,
    pub zeros_percentage: f64,
    pub negative_count: u64,
}

/// Length statistics for string columns, in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatistics {
    pub min_length: usize,
    pub max_length: usize,
    pub mean_length: f64,
}

/// Range statistics for date columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalStatistics {
    /// Whole days between the earliest and latest value
    pub range_days: i64,
}

/// Read-only statistics for one column, computed once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: InferredType,
    pub row_count: u64,
    pub null_count: u64,
    /// null_count / row_count * 100, 0 for an empty column
    pub null_percentage: f64,
    pub non_null_count: u64,
    /// Unique non-null values, compared on their raw representation
    pub distinct_count: u64,
    /// distinct_count / non_null_count * 100, 0 when there are no non-null values
    pub distinct_percentage: f64,
    pub has_duplicates: bool,
    /// Smallest coerced value; only for integer, float and date columns
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<Value>,
    /// Largest coerced value; only for integer, float and date columns
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<Value>,
    /// First distinct raw values in row order
    pub sample_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub numeric: Option<NumericStatistics>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<TextStatistics>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temporal: Option<TemporalStatistics>,
}

impl ColumnProfile {
    /// Returns true if the column has no non-null values.
    pub fn is_all_null(&self) -> bool {
        self.non_null_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inferred_type_predicates() {
        assert!(InferredType::Integer.is_numeric());
        assert!(InferredType::Float.is_numeric());
        assert!(!InferredType::Date.is_numeric());
        assert!(InferredType::Date.is_orderable());
        assert!(!InferredType::String.is_orderable());
        assert!(!InferredType::Null.is_orderable());
    }

    #[test]
    fn test_inferred_type_serde() {
        let json = serde_json::to_string(&InferredType::Float).unwrap();
        assert_eq!(json, "\"float\"");
        let back: InferredType = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(back, InferredType::Date);
        assert_eq!(InferredType::Boolean.to_string(), "boolean");
    }
}
