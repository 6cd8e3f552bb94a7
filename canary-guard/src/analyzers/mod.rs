//! Column profiling and dataset-level analysis.
//!
//! ## Modules
//!
//! - **Type Inference** (`inference`): classifies raw values and infers a
//!   column type (`integer`, `float`, `boolean`, `date`, `string`, `null`)
//! - **Column Profiler** (`profiler`): null and distinct counts, min/max,
//!   numeric/text/temporal statistics for every column
//! - **Summary** (`summary`): dataset summary and health score
//! - **Insights** (`insights`): outliers, skewness, high-null and
//!   low-uniqueness columns, with recommendations
//!
//! ## Example Usage
//!
//! ```rust
//! use canary_guard::analyzers::{ColumnProfiler, DataInsights, DatasetSummary};
//! use canary_guard::dataset::{Column, Dataset};
//!
//! let dataset = Dataset::new(vec![
//!     Column::new("id", vec![1i64, 2, 3]),
//!     Column::new("email", vec![Some("a@b.com"), None, Some("c@d.org")]),
//! ])
//! .unwrap();
//!
//! let profiles = ColumnProfiler::new().profile_dataset(&dataset);
//! let summary = DatasetSummary::from_profiles(&profiles);
//! let insights = DataInsights::from_profiles(&profiles);
//!
//! assert_eq!(summary.columns_with_nulls, 1);
//! assert!(insights.outliers.is_empty());
//! ```

pub mod inference;
pub mod insights;
pub mod profile_types;
pub mod profiler;
pub mod summary;

pub use inference::{InferenceConfig, TypeInferenceEngine, TypeInferenceResult, TypeStats};
pub use insights::{
    ColumnPercentage, DataInsights, InsightThresholds, Outlier, OutlierKind, SkewDirection,
    SkewStrength, Skewness,
};
pub use profile_types::{
    ColumnProfile, InferredType, NumericStatistics, TemporalStatistics, TextStatistics,
};
pub use profiler::{ColumnProfiler, ColumnProfilerBuilder, ProfilerConfig};
pub use summary::{ColumnScore, DatasetSummary, HealthScore, HealthStatus, NotableColumn};
