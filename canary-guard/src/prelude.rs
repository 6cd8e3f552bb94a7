//! Prelude for commonly used types and traits in canary-guard.

pub use crate::core::{OutcomeStatus, Report, Rule, RuleEngine, RuleOutcome, RuleSet, RuleSpec};
pub use crate::dataset::{Column, Dataset, Value};
pub use crate::error::{CanaryError, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
