//! Common test fixtures for profiling and rule evaluation scenarios.
//!
//! Datasets here are small and hand-written so that expected outcomes can be
//! worked out by hand, except for [`generated_dataset`], which is sized for
//! benchmarks.

use std::sync::Arc;

use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::core::{RuleSet, RuleSpec};
use crate::dataset::{Column, Dataset, Value};
use crate::error::Result;

/// Email pattern used across the fixtures.
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Ten customers with nulls in several columns, one malformed email and an
/// implausible age.
pub fn customers() -> Result<Dataset> {
    Ok(Dataset::new(vec![
        Column::new("id", (1..=10i64).collect::<Vec<_>>()),
        Column::new(
            "name",
            vec![
                Some("Alice"),
                None,
                Some("Charlie"),
                Some("David"),
                None,
                Some("Frank"),
                Some("Grace"),
                None,
                Some("Ivan"),
                Some("Jane"),
            ],
        ),
        Column::new(
            "email",
            vec![
                Some("alice@example.com"),
                Some("bob@example.com"),
                None,
                Some("david@example.com"),
                Some("not-an-email"),
                None,
                Some("grace@example.com"),
                Some("henry@example.com"),
                None,
                Some("jane@example.com"),
            ],
        ),
        Column::new(
            "age",
            vec![
                Some(25i64),
                Some(30),
                Some(35),
                Some(40),
                None,
                Some(28),
                Some(1500),
                Some(33),
                Some(29),
                Some(31),
            ],
        ),
        Column::new(
            "status",
            vec![
                "active", "active", "inactive", "active", "banned", "active", "inactive",
                "active", "active", "active",
            ],
        ),
    ])?
    .with_name("customers.csv"))
}

/// Transactions with duplicated ids, text-encoded numbers and dates.
pub fn transactions() -> Result<Dataset> {
    Ok(Dataset::new(vec![
        Column::new(
            "transaction_id",
            vec![
                "TX001", "TX002", "TX003", "TX001", "TX004", "TX005", "TX002", "TX006",
            ],
        ),
        Column::new(
            "amount",
            vec![
                "100.50", "250.00", "75.25", "100.50", "300.00", "150.75", "250.00", "-80.00",
            ],
        ),
        Column::new(
            "booked_at",
            vec![
                "2024-01-01", "2024-01-02", "2024-01-02", "2024-01-01", "2024-01-05",
                "2024-01-07", "2024-01-02", "2024-01-09",
            ],
        ),
        Column::new(
            "flagged",
            vec!["no", "no", "yes", "no", "no", "No", "no", "YES"],
        ),
    ])?
    .with_name("transactions"))
}

/// A dataset with columns but no rows.
pub fn empty_dataset() -> Result<Dataset> {
    Dataset::new(vec![
        Column::new("a", Vec::<Value>::new()),
        Column::new("b", Vec::<Value>::new()),
    ])
}

/// The customer rules: one of each built-in type.
pub fn customer_rules() -> RuleSet {
    RuleSet::new(vec![
        RuleSpec::new("unique_value")
            .with_name("unique_ids")
            .with_target_column("id")
            .with_threshold(100.0),
        RuleSpec::new("null_percentage")
            .with_name("email_completeness")
            .with_target_column("email")
            .with_threshold(25.0),
        RuleSpec::new("pattern_match")
            .with_name("email_format")
            .with_target_column("email")
            .with_pattern(EMAIL_PATTERN),
        RuleSpec::new("value_range")
            .with_name("plausible_age")
            .with_target_column("age")
            .with_min_value(0.0)
            .with_max_value(120.0),
        RuleSpec::new("allowed_values")
            .with_name("known_status")
            .with_target_column("status")
            .with_values(vec!["active", "inactive"]),
        RuleSpec::new("string_length")
            .with_name("name_length")
            .with_target_column("name")
            .with_min_length(2i64)
            .with_max_length(32i64),
    ])
    .with_name("customers")
}

/// The customer rules as a YAML document.
pub const CUSTOMER_RULES_YAML: &str = r#"
name: customers
rules:
  - type: unique_value
    name: unique_ids
    target_column: id
    threshold: 100
  - type: null_percentage
    name: email_completeness
    target_column: email
    threshold: 25
  - type: pattern_match
    name: email_format
    target_column: email
    pattern: '^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$'
  - type: value_range
    name: plausible_age
    target_column: age
    min_value: 0
    max_value: 120
  - type: allowed_values
    name: known_status
    target_column: status
    values: [active, inactive]
  - type: string_length
    name: name_length
    target_column: name
    min_length: 2
    max_length: 32
"#;

/// An Arrow batch with nullable integer, float, string and boolean columns.
pub fn sensor_batch() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sensor_id", DataType::Int64, false),
        Field::new("reading", DataType::Float64, true),
        Field::new("unit", DataType::Utf8, true),
        Field::new("calibrated", DataType::Boolean, true),
    ]));

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])),
            Arc::new(Float64Array::from(vec![
                Some(20.5),
                Some(21.0),
                None,
                Some(19.75),
                Some(20.25),
                Some(22.0),
            ])),
            Arc::new(StringArray::from(vec![
                Some("C"),
                Some("C"),
                Some("C"),
                None,
                Some("C"),
                Some("F"),
            ])),
            Arc::new(BooleanArray::from(vec![
                Some(true),
                Some(true),
                Some(false),
                Some(true),
                None,
                Some(true),
            ])),
        ],
    )?)
}

/// A deterministic dataset of `rows` rows for benchmarks: an integer key, a
/// float measure with a few outliers, a low-cardinality category and a text
/// column with roughly 5% nulls.
pub fn generated_dataset(rows: usize) -> Result<Dataset> {
    const CATEGORIES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

    let ids: Vec<Value> = (0..rows).map(|i| Value::Integer(i as i64)).collect();
    let measures: Vec<Value> = (0..rows)
        .map(|i| {
            let base = ((i * 7919) % 1000) as f64 / 10.0;
            Value::Float(if i % 997 == 0 { base * 100.0 } else { base })
        })
        .collect();
    let categories: Vec<Value> = (0..rows)
        .map(|i| Value::from(CATEGORIES[i % CATEGORIES.len()]))
        .collect();
    let emails: Vec<Value> = (0..rows)
        .map(|i| {
            if i % 20 == 0 {
                Value::Null
            } else {
                Value::Text(format!("user{i}@example.com"))
            }
        })
        .collect();

    Dataset::new(vec![
        Column::new("id", ids),
        Column::new("measure", measures),
        Column::new("category", categories),
        Column::new("email", emails),
    ])
    .map(|dataset| dataset.with_name(format!("generated_{rows}")))
}
