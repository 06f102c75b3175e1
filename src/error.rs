//! Unified error hierarchy for rundash
//!
//! Provides a structured error type system with context preservation and
//! integration with the tracing system. Row-level feed problems are not
//! errors at this level; the loader drops and logs those (see
//! `feed::loader`). The variants here are the failures a caller can act on.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all rundash operations
#[derive(Debug, Error)]
pub enum RundashError {
    /// Activity feed loading errors
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Metric derivation errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Activity feed loading and parsing errors
///
/// These cover failures of the feed as a whole. A single malformed row is
/// never a `FeedError`; the loader excludes it and records the drop.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Source file not found at specified path
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Source could not be read as tabular data
    #[error("Unreadable source {path}: {reason}")]
    UnreadableSource { path: PathBuf, reason: String },

    /// A column the schema requires is missing from the header
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// Pace string did not match any accepted encoding
    #[error("Invalid pace value: {value:?}")]
    InvalidPace { value: String },

    /// No schema preset registered under the given name
    #[error("Unknown schema preset: {name}")]
    UnknownSchema { name: String },
}

/// Metric derivation errors
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Too few usable activities for the requested metric
    #[error("Insufficient data for {metric}: {reason}")]
    InsufficientData { metric: String, reason: String },

    /// Invalid parameter supplied to an estimator
    #[error("Invalid parameter for {metric}: {parameter}={value}")]
    InvalidParameter {
        metric: String,
        parameter: String,
        value: String,
    },

    /// Division by zero
    #[error("Division by zero in {metric}")]
    DivisionByZero { metric: String },
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported output format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Write to destination failed
    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Result type alias for rundash operations
pub type Result<T> = std::result::Result<T, RundashError>;

impl RundashError {
    /// Check whether the error leaves a usable partial result behind
    ///
    /// Insufficient-data failures are per-component: the rest of the
    /// dashboard is still valid and callers should render it.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            RundashError::Metrics(MetricsError::InsufficientData { .. })
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RundashError::Feed(FeedError::SourceNotFound { .. }) => ErrorSeverity::Error,
            RundashError::Feed(_) => ErrorSeverity::Error,
            RundashError::Metrics(MetricsError::InsufficientData { .. }) => ErrorSeverity::Warning,
            RundashError::Metrics(_) => ErrorSeverity::Error,
            RundashError::Configuration(_) => ErrorSeverity::Error,
            RundashError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RundashError::Feed(FeedError::SourceNotFound { path }) => {
                format!("Could not find activity feed: {}", path.display())
            }
            RundashError::Feed(FeedError::MissingColumn { column }) => {
                format!(
                    "The feed is missing the '{}' column. Check the schema preset against the source file.",
                    column
                )
            }
            RundashError::Metrics(MetricsError::InsufficientData { metric, .. }) => {
                format!(
                    "Not enough activities to derive {}. Log a few more runs and try again.",
                    metric
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
