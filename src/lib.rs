// Library interface for the rundash analysis modules
// This allows integration tests to access the core functionality

pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pace;
pub mod session;

// Re-export commonly used types for convenience
pub use models::*;
pub use error::{Result, RundashError};
pub use feed::{FeedCache, FeedLoader, FeedSchema, LoadReport, SourceKey};
pub use filter::Thresholds;
pub use metrics::{
    ComparisonCalculator, ComparisonReport, EfficiencyEstimator, EfficiencyReport, FatigueBand,
    FatigueEstimator, FatigueScore, HeatmapGrid, MetricKind, MetricSeries,
};
pub use session::{AnalysisSession, Dashboard, UserControls};
pub use logging::{LogConfig, LogFormat, LogLevel};
