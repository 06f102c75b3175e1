//! Per-activity metric series and cross-metric correlation

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::metrics::trend::{linear_fit, pearson, TrendLine};
use crate::models::{Activity, ActivityFeed};

/// A per-activity value the dashboard can chart or correlate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Distance,
    AvgHeartRate,
    Pace,
    MovingTime,
    ElevationGain,
    MaxHeartRate,
    SufferScore,
    PacePerHeartRate,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::Distance,
        MetricKind::AvgHeartRate,
        MetricKind::Pace,
        MetricKind::MovingTime,
        MetricKind::ElevationGain,
        MetricKind::MaxHeartRate,
        MetricKind::SufferScore,
        MetricKind::PacePerHeartRate,
    ];

    /// Stable key used on the command line and in exports
    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::Distance => "distance",
            MetricKind::AvgHeartRate => "avg_heart_rate",
            MetricKind::Pace => "pace",
            MetricKind::MovingTime => "moving_time",
            MetricKind::ElevationGain => "elevation_gain",
            MetricKind::MaxHeartRate => "max_heart_rate",
            MetricKind::SufferScore => "suffer_score",
            MetricKind::PacePerHeartRate => "pace_per_heart_rate",
        }
    }

    /// Human-readable label with units
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Distance => "Distance (km)",
            MetricKind::AvgHeartRate => "Avg heart rate (bpm)",
            MetricKind::Pace => "Pace (min/km)",
            MetricKind::MovingTime => "Moving time (s)",
            MetricKind::ElevationGain => "Elevation gain (m)",
            MetricKind::MaxHeartRate => "Max heart rate (bpm)",
            MetricKind::SufferScore => "Suffer score",
            MetricKind::PacePerHeartRate => "Pace per heart rate",
        }
    }

    pub fn parse(raw: &str) -> Result<MetricKind, MetricsError> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        let kind = match normalized.as_str() {
            "distance" | "distance_km" => MetricKind::Distance,
            "avg_heart_rate" | "heart_rate" | "average_heartrate" => MetricKind::AvgHeartRate,
            "pace" => MetricKind::Pace,
            "moving_time" | "moving_time_seconds" => MetricKind::MovingTime,
            "elevation_gain" | "elevation" => MetricKind::ElevationGain,
            "max_heart_rate" | "max_heartrate" => MetricKind::MaxHeartRate,
            "suffer_score" => MetricKind::SufferScore,
            "pace_per_heart_rate" | "hrpr" => MetricKind::PacePerHeartRate,
            _ => {
                return Err(MetricsError::InvalidParameter {
                    metric: "series".to_string(),
                    parameter: "metric".to_string(),
                    value: raw.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// Extract this metric from one activity, `None` when undefined
    pub fn value_of(&self, activity: &Activity) -> Option<f64> {
        match self {
            MetricKind::Distance => activity.distance_km.to_f64(),
            MetricKind::AvgHeartRate => activity.avg_heart_rate.and_then(|v| v.to_f64()),
            MetricKind::Pace => activity.pace.and_then(|v| v.to_f64()),
            MetricKind::MovingTime => activity.moving_time_seconds.map(|v| v as f64),
            MetricKind::ElevationGain => activity.elevation_gain.and_then(|v| v.to_f64()),
            MetricKind::MaxHeartRate => activity.max_heart_rate.and_then(|v| v.to_f64()),
            MetricKind::SufferScore => activity.suffer_score.and_then(|v| v.to_f64()),
            MetricKind::PacePerHeartRate => {
                let pace = activity.pace.and_then(|v| v.to_f64())?;
                let heart_rate = activity.avg_heart_rate.and_then(|v| v.to_f64())?;
                (heart_rate > 0.0).then_some(pace / heart_rate)
            }
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub start_time: NaiveDateTime,
    pub value: f64,
}

/// One metric over time, activities without the value skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: MetricKind,
    pub points: Vec<MetricPoint>,
}

pub fn series(feed: &ActivityFeed, metric: MetricKind) -> MetricSeries {
    let points = feed
        .iter()
        .filter_map(|activity| {
            metric.value_of(activity).map(|value| MetricPoint {
                start_time: activity.start_time,
                value,
            })
        })
        .collect();

    MetricSeries { metric, points }
}

/// Scatter of two metrics with correlation and a fitted overlay.
///
/// Only activities where both metrics are defined contribute; the
/// correlation and regression are `None` when the remaining points
/// cannot support them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub x: MetricKind,
    pub y: MetricKind,
    pub points: Vec<(f64, f64)>,
    pub correlation: Option<f64>,
    pub regression: Option<TrendLine>,
}

pub fn correlate(feed: &ActivityFeed, x: MetricKind, y: MetricKind) -> CorrelationAnalysis {
    let points: Vec<(f64, f64)> = feed
        .iter()
        .filter_map(|activity| {
            let xv = x.value_of(activity)?;
            let yv = y.value_of(activity)?;
            Some((xv, yv))
        })
        .collect();

    let xs: Vec<f64> = points.iter().map(|(xv, _)| *xv).collect();
    let ys: Vec<f64> = points.iter().map(|(_, yv)| *yv).collect();

    CorrelationAnalysis {
        x,
        y,
        correlation: pearson(&xs, &ys),
        regression: linear_fit(&xs, &ys),
        points,
    }
}
