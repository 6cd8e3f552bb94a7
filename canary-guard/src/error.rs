//! Error types for the Canary data quality library.
//!
//! All fallible operations in the crate return [`CanaryError`]. Only
//! [`CanaryError::Configuration`] and [`CanaryError::InvalidDataset`] ever reach
//! callers of the engine; evaluation errors are absorbed into failed outcomes
//! of the [`Report`](crate::core::Report).

use thiserror::Error;

/// The main error type for the Canary library.
#[derive(Error, Debug)]
pub enum CanaryError {
    /// A rule set could not be turned into executable rules.
    ///
    /// Raised before any evaluation takes place; no partial report exists.
    #[error("Configuration error in rule '{rule}': {message}")]
    Configuration {
        /// Identifies the offending rule (its name, or its position and type)
        rule: String,
        /// Detailed error message
        message: String,
    },

    /// The dataset violates a structural invariant.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// A rule targets a column that does not exist in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// An unexpected condition while evaluating one rule against one column.
    #[error("Evaluation of rule '{rule}' on column '{column}' failed: {message}")]
    Evaluation {
        /// Name of the rule being evaluated
        rule: String,
        /// Column being evaluated
        column: String,
        /// Detailed error message
        message: String,
    },

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, CanaryError>`.
pub type Result<T> = std::result::Result<T, CanaryError>;

impl CanaryError {
    /// Creates a configuration error for the given rule.
    pub fn configuration(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Creates an evaluation error for a (rule, column) pair.
    pub fn evaluation(
        rule: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Evaluation {
            rule: rule.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error is fatal to a run.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<serde_json::Error> for CanaryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let err = CanaryError::configuration("email_format", "invalid regex");
        assert_eq!(
            err.to_string(),
            "Configuration error in rule 'email_format': invalid regex"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_evaluation_error() {
        let err = CanaryError::evaluation("age_range", "age", "value 'x' is not numeric");
        assert_eq!(
            err.to_string(),
            "Evaluation of rule 'age_range' on column 'age' failed: value 'x' is not numeric"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_column_not_found() {
        let err = CanaryError::ColumnNotFound {
            column: "user_id".to_string(),
        };
        assert_eq!(err.to_string(), "Column 'user_id' not found in dataset");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CanaryError = parse_err.into();
        assert!(matches!(err, CanaryError::Serialization(_)));
    }
}
