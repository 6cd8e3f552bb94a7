//! Column profiling.
//!
//! The [`ColumnProfiler`] turns every column of a [`Dataset`] into a
//! [`ColumnProfile`] in a single pass per column:
//!
//! - null detection and distinct counting on raw values
//! - type inference via [`TypeInferenceEngine`]
//! - min/max on coerced values for integer, float and date columns
//! - optional numeric, text-length and date-range statistics
//!
//! Profiling is a pure function of the dataset and never fails; values that
//! cannot be coerced are ignored by the type-specific statistics.
//!
//! # Example
//!
//! ```rust
//! use canary_guard::analyzers::{ColumnProfiler, InferredType};
//! use canary_guard::dataset::{Column, Dataset};
//!
//! let dataset = Dataset::new(vec![Column::new("age", vec![Some(5i64), None, Some(30)])]).unwrap();
//! let profiles = ColumnProfiler::new().profile_dataset(&dataset);
//!
//! assert_eq!(profiles[0].inferred_type, InferredType::Integer);
//! assert_eq!(profiles[0].null_count, 1);
//! ```

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use crate::analyzers::inference::{parse_integer, parse_number, TypeInferenceEngine};
use crate::analyzers::profile_types::{
    ColumnProfile, InferredType, NumericStatistics, TemporalStatistics, TextStatistics,
};
use crate::dataset::{Column, Dataset, Value};

/// Configuration for column profiling
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Number of distinct raw values kept as samples
    pub sample_size: usize,
    /// Compute mean/median/std dev for numeric columns
    pub compute_numeric: bool,
    /// Compute length statistics for string columns
    pub compute_text: bool,
    /// Compute the date range for date columns
    pub compute_temporal: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sample_size: 5,
            compute_numeric: true,
            compute_text: true,
            compute_temporal: true,
        }
    }
}

impl ProfilerConfig {
    /// Only counts, types and min/max; no distribution statistics.
    pub fn minimal() -> Self {
        Self {
            sample_size: 3,
            compute_numeric: false,
            compute_text: false,
            compute_temporal: false,
        }
    }
}

/// Builder for ColumnProfiler
#[derive(Debug, Clone, Default)]
pub struct ColumnProfilerBuilder {
    config: ProfilerConfig,
    inference: Option<TypeInferenceEngine>,
}

impl ColumnProfilerBuilder {
    /// Set the number of sample values kept per column
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Enable or disable numeric distribution statistics
    pub fn compute_numeric(mut self, enable: bool) -> Self {
        self.config.compute_numeric = enable;
        self
    }

    /// Enable or disable string length statistics
    pub fn compute_text(mut self, enable: bool) -> Self {
        self.config.compute_text = enable;
        self
    }

    /// Enable or disable date range statistics
    pub fn compute_temporal(mut self, enable: bool) -> Self {
        self.config.compute_temporal = enable;
        self
    }

    /// Use a custom type inference engine
    pub fn inference_engine(mut self, engine: TypeInferenceEngine) -> Self {
        self.inference = Some(engine);
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the ColumnProfiler
    pub fn build(self) -> ColumnProfiler {
        ColumnProfiler {
            config: self.config,
            inference: self.inference.unwrap_or_default(),
        }
    }
}

/// Builds [`ColumnProfile`]s from datasets.
#[derive(Debug, Clone, Default)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
    inference: TypeInferenceEngine,
}

impl ColumnProfiler {
    /// Create a new builder for ColumnProfiler
    pub fn builder() -> ColumnProfilerBuilder {
        ColumnProfilerBuilder::default()
    }

    /// Create a ColumnProfiler with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns the profiler configuration.
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Returns the type inference engine used by this profiler.
    pub fn inference_engine(&self) -> &TypeInferenceEngine {
        &self.inference
    }

    /// Profiles every column, in column order.
    #[instrument(skip(self, dataset), fields(
        dataset.name = dataset.name().unwrap_or("<unnamed>"),
        dataset.rows = dataset.row_count(),
        dataset.columns = dataset.column_count()
    ))]
    pub fn profile_dataset(&self, dataset: &Dataset) -> Vec<ColumnProfile> {
        let profiles: Vec<ColumnProfile> = dataset
            .columns()
            .iter()
            .map(|column| self.profile_column(column))
            .collect();
        debug!(profiles = profiles.len(), "Completed dataset profiling");
        profiles
    }

    /// Profiles a single column.
    pub fn profile_column(&self, column: &Column) -> ColumnProfile {
        let row_count = column.len() as u64;
        let inference = self.inference.infer_column(column);
        let inferred_type = inference.inferred_type;
        let non_null_count = inference.stats.non_null as u64;
        let null_count = row_count - non_null_count;

        let mut distinct = HashSet::new();
        let mut sample_values = Vec::new();
        for (_, value) in column.non_null() {
            let raw = value.raw();
            if distinct.insert(raw.clone().into_owned())
                && sample_values.len() < self.config.sample_size
            {
                sample_values.push(raw.into_owned());
            }
        }
        let distinct_count = distinct.len() as u64;

        let mut profile = ColumnProfile {
            name: column.name().to_string(),
            inferred_type,
            row_count,
            null_count,
            null_percentage: percentage(null_count, row_count),
            non_null_count,
            distinct_count,
            distinct_percentage: percentage(distinct_count, non_null_count),
            has_duplicates: distinct_count < non_null_count,
            min: None,
            max: None,
            sample_values,
            numeric: None,
            text: None,
            temporal: None,
        };

        match inferred_type {
            InferredType::Integer => self.profile_integers(column, &mut profile),
            InferredType::Float => self.profile_floats(column, &mut profile),
            InferredType::Date => self.profile_dates(column, &mut profile),
            InferredType::String if self.config.compute_text => {
                profile.text = text_statistics(column);
            }
            _ => {}
        }

        debug!(
            column = %profile.name,
            inferred_type = %profile.inferred_type,
            nulls = profile.null_count,
            distinct = profile.distinct_count,
            "Profiled column"
        );
        profile
    }

    fn profile_integers(&self, column: &Column, profile: &mut ColumnProfile) {
        let values: Vec<i64> = column
            .non_null()
            .filter_map(|(_, v)| parse_integer(v))
            .collect();
        profile.min = values.iter().min().copied().map(Value::Integer);
        profile.max = values.iter().max().copied().map(Value::Integer);
        if self.config.compute_numeric {
            let floats: Vec<f64> = values.iter().map(|v| *v as f64).collect();
            profile.numeric = numeric_statistics(floats);
        }
    }

    fn profile_floats(&self, column: &Column, profile: &mut ColumnProfile) {
        let values: Vec<f64> = column
            .non_null()
            .filter_map(|(_, v)| parse_number(v))
            .collect();
        profile.min = values.iter().copied().reduce(f64::min).map(Value::Float);
        profile.max = values.iter().copied().reduce(f64::max).map(Value::Float);
        if self.config.compute_numeric {
            profile.numeric = numeric_statistics(values);
        }
    }

    fn profile_dates(&self, column: &Column, profile: &mut ColumnProfile) {
        let mut date_only = true;
        let values: Vec<NaiveDateTime> = column
            .non_null()
            .filter_map(|(_, v)| self.inference.parse_temporal(v))
            .map(|(dt, is_date)| {
                date_only &= is_date;
                dt
            })
            .collect();

        let (Some(min), Some(max)) = (values.iter().min().copied(), values.iter().max().copied())
        else {
            return;
        };

        let to_value = |dt: NaiveDateTime| {
            if date_only {
                Value::Date(dt.date())
            } else {
                Value::DateTime(dt)
            }
        };
        profile.min = Some(to_value(min));
        profile.max = Some(to_value(max));
        if self.config.compute_temporal {
            profile.temporal = Some(TemporalStatistics {
                range_days: (max - min).num_days(),
            });
        }
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn numeric_statistics(mut values: Vec<f64>) -> Option<NumericStatistics> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let (mut mean, mut std_dev) = mean_and_std_dev(&values, 1.0);
    if !(mean.is_finite() && std_dev.is_finite()) {
        // Values near f64::MAX overflow the sums; retry on values scaled to [-1, 1].
        let scale = values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        (mean, std_dev) = mean_and_std_dev(&values, scale);
    }

    values.sort_by(f64::total_cmp);
    let median = if n % 2 == 0 {
        values[n / 2 - 1] / 2.0 + values[n / 2] / 2.0
    } else {
        values[n / 2]
    };

    if !(mean.is_finite() && std_dev.is_finite() && median.is_finite()) {
        return None;
    }

    let zeros_count = values.iter().filter(|v| **v == 0.0).count() as u64;
    let negative_count = values.iter().filter(|v| **v < 0.0).count() as u64;

    Some(NumericStatistics {
        mean,
        median,
        std_dev,
        zeros_count,
        zeros_percentage: percentage(zeros_count, n as u64),
        negative_count,
    })
}

fn mean_and_std_dev(values: &[f64], scale: f64) -> (f64, f64) {
    let n = values.len();
    let mean = values.iter().map(|v| v / scale).sum::<f64>() / n as f64;
    let std_dev = if n > 1 {
        let variance = values
            .iter()
            .map(|v| (v / scale - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };
    (mean * scale, std_dev * scale)
}

fn text_statistics(column: &Column) -> Option<TextStatistics> {
    let lengths: Vec<usize> = column
        .non_null()
        .map(|(_, v)| v.raw().chars().count())
        .collect();
    let min_length = *lengths.iter().min()?;
    let max_length = *lengths.iter().max()?;
    Some(TextStatistics {
        min_length,
        max_length,
        mean_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(column: Column) -> ColumnProfile {
        ColumnProfiler::new().profile_column(&column)
    }

    #[test]
    fn test_integer_profile() {
        let p = profile(Column::new(
            "age",
            vec![Some(5i64), Some(12), Some(1500), Some(30), None],
        ));
        assert_eq!(p.inferred_type, InferredType::Integer);
        assert_eq!(p.row_count, 5);
        assert_eq!(p.null_count, 1);
        assert_eq!(p.null_percentage, 20.0);
        assert_eq!(p.distinct_count, 4);
        assert_eq!(p.min, Some(Value::Integer(5)));
        assert_eq!(p.max, Some(Value::Integer(1500)));

        let numeric = p.numeric.unwrap();
        assert_eq!(numeric.mean, 386.75);
        assert_eq!(numeric.median, 21.0);
        assert_eq!(numeric.zeros_count, 0);
    }

    #[test]
    fn test_distinct_uses_raw_representation() {
        // "1" and 1 share a raw form, 1.0 does not
        let p = profile(Column::new(
            "mixed",
            vec![Value::from("1"), Value::Integer(1), Value::Float(1.0)],
        ));
        assert_eq!(p.distinct_count, 2);
        assert!(p.has_duplicates);
        assert_eq!(p.inferred_type, InferredType::Float);
    }

    #[test]
    fn test_string_profile_has_no_min_max() {
        let p = profile(Column::new("name", vec!["ann", "bo", "cleo", "bo"]));
        assert_eq!(p.inferred_type, InferredType::String);
        assert!(p.min.is_none());
        assert!(p.max.is_none());
        assert_eq!(p.sample_values, vec!["ann", "bo", "cleo"]);

        let text = p.text.unwrap();
        assert_eq!(text.min_length, 2);
        assert_eq!(text.max_length, 4);
        assert_eq!(text.mean_length, 2.75);
    }

    #[test]
    fn test_boolean_profile_has_no_min_max() {
        let p = profile(Column::new("flag", vec![true, false, true]));
        assert_eq!(p.inferred_type, InferredType::Boolean);
        assert!(p.min.is_none());
        assert_eq!(p.distinct_count, 2);
    }

    #[test]
    fn test_date_profile() {
        let p = profile(Column::new(
            "joined",
            vec!["2024-01-10", "2023-12-31", "2024-03-01"],
        ));
        assert_eq!(p.inferred_type, InferredType::Date);
        assert_eq!(
            p.min,
            Some(Value::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()))
        );
        assert_eq!(
            p.max,
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(p.temporal.unwrap().range_days, 61);
    }

    #[test]
    fn test_empty_and_all_null_columns() {
        let empty = profile(Column::new("e", Vec::<Value>::new()));
        assert_eq!(empty.inferred_type, InferredType::Null);
        assert_eq!(empty.null_percentage, 0.0);
        assert_eq!(empty.distinct_percentage, 0.0);

        let nulls = profile(Column::new("n", vec![Value::Null, Value::Float(f64::NAN)]));
        assert_eq!(nulls.null_count, 2);
        assert_eq!(nulls.null_percentage, 100.0);
        assert!(nulls.is_all_null());
    }

    #[test]
    fn test_sample_size_and_minimal_config() {
        let profiler = ColumnProfiler::builder()
            .config(ProfilerConfig::minimal())
            .sample_size(2)
            .build();
        let p = profiler.profile_column(&Column::new("x", vec![1.5, 2.5, 3.5]));
        assert_eq!(p.sample_values.len(), 2);
        assert!(p.numeric.is_none());
        assert_eq!(p.min, Some(Value::Float(1.5)));
    }

    #[test]
    fn test_profile_dataset_preserves_order() {
        let dataset = Dataset::new(vec![
            Column::new("b", vec![1i64]),
            Column::new("a", vec!["x"]),
        ])
        .unwrap();
        let profiles = ColumnProfiler::new().profile_dataset(&dataset);
        let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
