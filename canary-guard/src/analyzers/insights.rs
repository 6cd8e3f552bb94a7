//! Heuristic insights derived from column profiles.
//!
//! Four detectors run over the profiles of a dataset:
//!
//! - **Outliers**: the z-score of a numeric column's min or max exceeds the
//!   threshold (3 by default). Columns with a near-zero standard deviation are
//!   ignored.
//! - **Skewness**: mean and median differ. The relative difference
//!   `|mean - median| / max(|mean|, |median|)` grades it as mild (< 5%),
//!   moderate (< 15%) or strong.
//! - **High nulls**: more than 10% of the values are null.
//! - **Low uniqueness**: at least 100 rows and fewer than 1% distinct values.
//!
//! Each detector that fires adds a summary sentence and a recommendation.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::profile_types::ColumnProfile;
use crate::analyzers::summary::round2;
use crate::dataset::Value;

const MIN_STD_DEV: f64 = 1e-10;

/// Thresholds used by the insight detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// |z| above which a min or max is reported as an outlier
    pub outlier_z_score: f64,
    /// Null percentage above which a column is reported
    pub high_null_percentage: f64,
    /// Minimum row count for the low-uniqueness check
    pub low_distinct_min_rows: u64,
    /// Distinct percentage below which a column is reported
    pub low_distinct_percentage: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            outlier_z_score: 3.0,
            high_null_percentage: 10.0,
            low_distinct_min_rows: 100,
            low_distinct_percentage: 1.0,
        }
    }
}

/// Which end of the range an outlier sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierKind {
    Minimum,
    Maximum,
}

/// A min or max value far from the column mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub column: String,
    pub kind: OutlierKind,
    pub value: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkewDirection {
    /// Mean above median
    RightSkewed,
    /// Mean below median
    LeftSkewed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkewStrength {
    Mild,
    Moderate,
    Strong,
}

impl SkewStrength {
    /// Moderate and strong skew.
    pub fn is_significant(&self) -> bool {
        *self >= SkewStrength::Moderate
    }
}

/// Mean/median skewness of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skewness {
    pub column: String,
    pub direction: SkewDirection,
    pub strength: SkewStrength,
    pub mean: f64,
    pub median: f64,
    pub difference_percentage: f64,
}

/// A column reported with the percentage that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPercentage {
    pub column: String,
    pub percentage: f64,
}

/// Everything the detectors found, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataInsights {
    pub outliers: Vec<Outlier>,
    pub skewness: Vec<Skewness>,
    pub high_null_columns: Vec<ColumnPercentage>,
    pub low_distinct_columns: Vec<ColumnPercentage>,
    pub summary: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DataInsights {
    /// Runs all detectors with the default thresholds.
    pub fn from_profiles(profiles: &[ColumnProfile]) -> Self {
        Self::with_thresholds(profiles, &InsightThresholds::default())
    }

    /// Runs all detectors.
    #[instrument(skip_all, fields(columns = profiles.len()))]
    pub fn with_thresholds(profiles: &[ColumnProfile], thresholds: &InsightThresholds) -> Self {
        let mut insights = DataInsights::default();

        for profile in profiles {
            insights
                .outliers
                .extend(detect_outliers(profile, thresholds.outlier_z_score));
            insights.skewness.extend(detect_skewness(profile));

            if profile.null_percentage > thresholds.high_null_percentage {
                insights.high_null_columns.push(ColumnPercentage {
                    column: profile.name.clone(),
                    percentage: round2(profile.null_percentage),
                });
            }
            if profile.row_count >= thresholds.low_distinct_min_rows
                && profile.distinct_percentage < thresholds.low_distinct_percentage
            {
                insights.low_distinct_columns.push(ColumnPercentage {
                    column: profile.name.clone(),
                    percentage: round2(profile.distinct_percentage),
                });
            }
        }

        insights.describe();
        debug!(
            outliers = insights.outliers.len(),
            skewed = insights.skewness.len(),
            high_null = insights.high_null_columns.len(),
            low_distinct = insights.low_distinct_columns.len(),
            "Generated data insights"
        );
        insights
    }

    /// Number of distinct columns with at least one outlier.
    pub fn outlier_column_count(&self) -> usize {
        let mut columns: Vec<&str> = self.outliers.iter().map(|o| o.column.as_str()).collect();
        columns.dedup();
        columns.len()
    }

    /// Returns true if no detector fired.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    fn describe(&mut self) {
        if !self.outliers.is_empty() {
            self.summary.push(format!(
                "Found potential outliers in {} columns.",
                self.outlier_column_count()
            ));
            self.recommendations
                .push("Consider investigating outlier values for data entry errors.".to_string());
        }

        let significant = self
            .skewness
            .iter()
            .filter(|s| s.strength.is_significant())
            .count();
        if significant > 0 {
            self.summary.push(format!(
                "Found {significant} columns with significant skewness."
            ));
            self.recommendations.push(
                "Consider transformations (e.g., log) for strongly skewed numeric columns."
                    .to_string(),
            );
        }

        if !self.high_null_columns.is_empty() {
            self.summary.push(format!(
                "Found {} columns with high null percentages.",
                self.high_null_columns.len()
            ));
            self.recommendations
                .push("Review data collection process for columns with many nulls.".to_string());
        }

        if !self.low_distinct_columns.is_empty() {
            self.summary.push(format!(
                "Found {} columns with very low uniqueness.",
                self.low_distinct_columns.len()
            ));
            self.recommendations.push(
                "Check if low-uniqueness columns should be categorical rather than continuous."
                    .to_string(),
            );
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn detect_outliers(profile: &ColumnProfile, threshold: f64) -> Vec<Outlier> {
    let Some(numeric) = profile.numeric.as_ref() else {
        return Vec::new();
    };
    if !profile.inferred_type.is_numeric() || numeric.std_dev < MIN_STD_DEV {
        return Vec::new();
    }

    [
        (OutlierKind::Minimum, profile.min.as_ref()),
        (OutlierKind::Maximum, profile.max.as_ref()),
    ]
    .into_iter()
    .filter_map(|(kind, value)| {
        let value = as_f64(value?)?;
        let z = ((value - numeric.mean) / numeric.std_dev).abs();
        (z.is_finite() && z > threshold).then(|| Outlier {
            column: profile.name.clone(),
            kind,
            value,
            z_score: round2(z),
        })
    })
    .collect()
}

fn detect_skewness(profile: &ColumnProfile) -> Option<Skewness> {
    let numeric = profile.numeric.as_ref()?;
    if !profile.inferred_type.is_numeric() {
        return None;
    }
    let (mean, median) = (numeric.mean, numeric.median);
    let diff = (mean - median).abs();
    if diff < MIN_STD_DEV {
        return None;
    }

    let difference_percentage = diff / mean.abs().max(median.abs()).max(MIN_STD_DEV) * 100.0;
    if !difference_percentage.is_finite() {
        return None;
    }
    let strength = if difference_percentage < 5.0 {
        SkewStrength::Mild
    } else if difference_percentage < 15.0 {
        SkewStrength::Moderate
    } else {
        SkewStrength::Strong
    };

    Some(Skewness {
        column: profile.name.clone(),
        direction: if mean > median {
            SkewDirection::RightSkewed
        } else {
            SkewDirection::LeftSkewed
        },
        strength,
        mean,
        median,
        difference_percentage: round2(difference_percentage),
    })
}
