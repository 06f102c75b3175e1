//! Dashboard metric calculators
//!
//! Each submodule owns one analytical view of the feed. They all take
//! an [`ActivityFeed`](crate::models::ActivityFeed) by reference and
//! return plain data; rendering and caching live elsewhere.

pub mod comparison;
pub mod efficiency;
pub mod fatigue;
pub mod heatmap;
pub mod monthly;
pub mod series;
pub mod trend;

pub use comparison::{
    ComparisonCalculator, ComparisonConfig, ComparisonMetric, ComparisonReport, MetricDeltas,
    WindowSummary,
};
pub use efficiency::{EfficiencyConfig, EfficiencyEstimator, EfficiencyPoint, EfficiencyReport};
pub use fatigue::{FatigueBand, FatigueConfig, FatigueEstimator, FatigueScore, WeeklyLoad};
pub use heatmap::{HeatmapGrid, HEATMAP_ROWS, HEATMAP_WEEKS};
pub use monthly::{feed_statistics, monthly_summaries, FeedStatistics, MonthlySummary, PaceQuartiles};
pub use series::{correlate, series, CorrelationAnalysis, MetricKind, MetricPoint, MetricSeries};
pub use trend::{linear_fit, pearson, TrendLine};
