//! Heart-rate efficiency estimation
//!
//! Efficiency is climb-adjusted speed per beat of drift-adjusted heart
//! rate, with a decay penalty for short efforts that would otherwise
//! look artificially strong. The per-activity series is fitted with a
//! least-squares trend so aerobic progress shows up as a slope.

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MetricsError;
use crate::metrics::trend::{linear_fit, TrendLine};
use crate::models::{Activity, ActivityFeed};

/// Largest heart-rate discount applied to long efforts
const MAX_DRIFT_DISCOUNT: f64 = 0.05;
/// Effort length at which the drift discount saturates
const DRIFT_SATURATION_SECONDS: f64 = 3600.0;
/// Runs at or under this distance receive the short-effort decay
const SHORT_RUN_CUTOFF_KM: f64 = 6.0;
/// Strength of the short-effort decay at zero distance
const SHORT_RUN_PENALTY: f64 = 0.12;
/// Distance at which the decay ramp would reach neutral
const SHORT_RUN_REFERENCE_KM: f64 = 8.0;

#[derive(Debug, Clone, Copy)]
pub struct EfficiencyConfig {
    /// Meters of flat-equivalent distance credited per meter of climb
    pub elevation_factor: f64,
}

impl Default for EfficiencyConfig {
    fn default() -> Self {
        EfficiencyConfig {
            elevation_factor: 6.0,
        }
    }
}

/// One activity's efficiency sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub activity_id: String,
    pub start_time: NaiveDateTime,
    /// Climb-adjusted speed in m/s
    pub adjusted_speed: f64,
    /// Drift-adjusted average heart rate in bpm
    pub adjusted_heart_rate: f64,
    /// Short-effort decay multiplier applied to the ratio
    pub decay: f64,
    /// `adjusted_speed / adjusted_heart_rate * decay`
    pub efficiency: f64,
}

/// Efficiency series plus its fitted trend when one exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyReport {
    pub points: Vec<EfficiencyPoint>,
    pub trend: Option<TrendLine>,
}

pub struct EfficiencyEstimator {
    config: EfficiencyConfig,
}

impl EfficiencyEstimator {
    pub fn new() -> Self {
        Self {
            config: EfficiencyConfig::default(),
        }
    }

    pub fn with_config(config: EfficiencyConfig) -> Self {
        Self { config }
    }

    /// Efficiency samples for every eligible activity, in feed order.
    ///
    /// An activity is eligible when distance, elevation gain, moving
    /// time, and average heart rate are all present, and all but the
    /// gain are positive; others are skipped without affecting the
    /// rest of the dashboard.
    pub fn series(&self, feed: &ActivityFeed) -> Vec<EfficiencyPoint> {
        feed.iter()
            .filter_map(|activity| self.point_for(activity))
            .collect()
    }

    /// Least-squares trend of efficiency over time
    pub fn trend(points: &[EfficiencyPoint]) -> Result<TrendLine, MetricsError> {
        let xs: Vec<f64> = points
            .iter()
            .map(|p| p.start_time.and_utc().timestamp() as f64)
            .collect();
        let ys: Vec<f64> = points.iter().map(|p| p.efficiency).collect();

        linear_fit(&xs, &ys).ok_or_else(|| MetricsError::InsufficientData {
            metric: "heart-rate efficiency".to_string(),
            reason: format!(
                "trend needs at least two distinct-time samples, found {}",
                points.len()
            ),
        })
    }

    /// Full report: sample series plus the trend when it is determined
    pub fn estimate(&self, feed: &ActivityFeed) -> EfficiencyReport {
        let points = self.series(feed);
        let trend = match Self::trend(&points) {
            Ok(line) => Some(line),
            Err(e) => {
                debug!("efficiency trend unavailable: {}", e);
                None
            }
        };

        EfficiencyReport { points, trend }
    }

    fn point_for(&self, activity: &Activity) -> Option<EfficiencyPoint> {
        let distance_km = activity.distance_km.to_f64()?;
        let gain_m = activity.elevation_gain?.to_f64()?;
        let moving_seconds = activity.moving_time_seconds? as f64;
        let avg_heart_rate = activity.avg_heart_rate?.to_f64()?;

        if distance_km <= 0.0 || moving_seconds <= 0.0 || avg_heart_rate <= 0.0 {
            return None;
        }

        let adjusted_distance_km = distance_km + self.config.elevation_factor * gain_m / 1000.0;
        let adjusted_speed = adjusted_distance_km / moving_seconds * 1000.0;

        let drift = (1.0 - MAX_DRIFT_DISCOUNT * (moving_seconds / DRIFT_SATURATION_SECONDS))
            .clamp(1.0 - MAX_DRIFT_DISCOUNT, 1.0);
        let adjusted_heart_rate = avg_heart_rate * drift;

        let decay = if distance_km <= SHORT_RUN_CUTOFF_KM {
            1.0 - SHORT_RUN_PENALTY * (1.0 - distance_km / SHORT_RUN_REFERENCE_KM)
        } else {
            1.0
        };

        let efficiency = adjusted_speed / adjusted_heart_rate * decay;
        if !efficiency.is_finite() {
            return None;
        }

        Some(EfficiencyPoint {
            activity_id: activity.id.clone(),
            start_time: activity.start_time,
            adjusted_speed,
            adjusted_heart_rate,
            decay,
            efficiency,
        })
    }
}

impl Default for EfficiencyEstimator {
    fn default() -> Self {
        Self::new()
    }
}
