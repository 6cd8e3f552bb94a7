//! # Canary Guard - Column Profiling and Rule Checks for Tabular Data
//!
//! Canary Guard profiles the columns of an in-memory dataset and evaluates a
//! declarative set of data quality rules against it, producing a structured
//! report with per-rule outcomes, column statistics, a health score and
//! insights.
//!
//! ## Quick Start
//!
//! ```rust
//! use canary_guard::prelude::*;
//! use canary_guard::formatters::HumanFormatter;
//!
//! # fn example() -> canary_guard::prelude::Result<()> {
//! let dataset = Dataset::new(vec![
//!     Column::new("id", vec![1i64, 2, 3, 3]),
//!     Column::new("email", vec![Some("a@b.com"), None, Some("c@d.org"), Some("nope")]),
//!     Column::new("age", vec![34i64, 27, 1500, 41]),
//! ])?
//! .with_name("customers.csv");
//!
//! let rules = RuleSet::from_yaml_str(
//!     r#"
//! name: customers
//! rules:
//!   - type: unique_value
//!     target_column: id
//!     threshold: 100
//!   - type: null_percentage
//!     threshold: 30
//!   - type: pattern_match
//!     name: email_format
//!     target_column: email
//!     pattern: '[^@\s]+@[^@\s]+\.[a-z]{2,}'
//!   - type: value_range
//!     target_column: age
//!     min_value: 0
//!     max_value: 120
//! "#,
//! )?;
//!
//! let report = RuleEngine::new().validate(&dataset, &rules)?;
//! assert!(!report.overall_passed);
//!
//! for outcome in report.failed_outcomes() {
//!     println!("{} on {}: {}", outcome.rule_name, outcome.column, outcome.message);
//! }
//! println!("{}", HumanFormatter::new().format(&report)?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Rules
//!
//! Rules are configured as [`RuleSpec`](core::RuleSpec)s inside a
//! [`RuleSet`](core::RuleSet), usually parsed from JSON or YAML. Each spec has
//! a `type`, an optional `name` and `target_column`, and type-specific
//! parameters. Without a target column a rule is evaluated against every
//! column. The built-in types are listed in [`constraints`]; custom types are
//! added through [`RuleEngine::builder`](core::RuleEngine::builder).
//!
//! Loading a rule set validates every spec up front. A bad spec is a
//! [`CanaryError::Configuration`](error::CanaryError::Configuration) and no
//! report is produced. Once loaded, a run never fails: problems evaluating a
//! rule become failed outcomes.
//!
//! ## Architecture
//!
//! - **`dataset`**: in-memory columns and values, with an Arrow adapter
//! - **`analyzers`**: type inference, column profiling, dataset summary,
//!   health score and insights
//! - **`core`**: the `Rule` trait, rule specs, the registry, the engine and
//!   reports
//! - **`constraints`**: built-in rule implementations
//! - **`formatters`**: JSON, text and Markdown rendering of reports
//! - **`logging`**: log configuration and subscriber setup

pub mod analyzers;
pub mod constraints;
pub mod core;
pub mod dataset;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
