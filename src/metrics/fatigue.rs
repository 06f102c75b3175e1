//! Weekly training-load aggregation and fatigue scoring
//!
//! Activities are bucketed into Monday-anchored weeks and reduced to
//! volume, intensity, and a heart-rate-to-pace ratio. The latest week's
//! position inside the historical range of each of those, discounted by
//! how long ago the last run was, becomes a 0..100 fatigue score.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

use crate::error::MetricsError;
use crate::models::{Activity, ActivityFeed};
use crate::pace;

const FATIGUE_METRIC: &str = "fatigue";
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy)]
pub struct FatigueConfig {
    /// Daily fatigue dissipation in `(0, 1)`. The recency adjustment is
    /// `1 - days_since_last * (1 - decay_factor)`, so 0.9 means each
    /// rest day sheds ten percent of the accumulated load.
    pub decay_factor: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        FatigueConfig { decay_factor: 0.9 }
    }
}

/// One Monday-anchored week of training load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLoad {
    pub week_start: NaiveDate,
    pub runs: usize,
    /// Summed distance in kilometers
    pub volume_km: f64,
    /// Mean max heart rate, `None` when no activity in the week has one
    pub intensity: Option<f64>,
    /// Mean heart-rate-to-pace ratio (bpm per m/s)
    pub mean_hrpr: Option<f64>,
    /// Mean days since the previous activity, over runs that have one
    pub mean_gap_days: Option<f64>,
}

/// Interpretation bands for a fatigue score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatigueBand {
    Safe,
    Caution,
    HighRisk,
}

impl FatigueBand {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            FatigueBand::Safe
        } else if score < 60.0 {
            FatigueBand::Caution
        } else {
            FatigueBand::HighRisk
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FatigueBand::Safe => "safe to keep building",
            FatigueBand::Caution => "train with care",
            FatigueBand::HighRisk => "high risk, prioritize recovery",
        }
    }
}

impl std::fmt::Display for FatigueBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FatigueBand::Safe => "safe",
            FatigueBand::Caution => "caution",
            FatigueBand::HighRisk => "high risk",
        };
        write!(f, "{}", label)
    }
}

/// Fatigue estimate for the feed's latest training week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueScore {
    /// Week the score describes
    pub week_start: NaiveDate,
    /// Composite score clamped to `[0, 100]`
    pub score: f64,
    /// `100 - score`, the remaining capacity to absorb load
    pub headroom: f64,
    /// Recency multiplier actually applied, in `[0, 1]`
    pub adjustment: f64,
    pub band: FatigueBand,
}

#[derive(Default)]
struct WeekAccumulator {
    runs: usize,
    volume_km: f64,
    max_heart_rates: Vec<f64>,
    ratios: Vec<f64>,
    gaps: Vec<f64>,
}

pub struct FatigueEstimator {
    config: FatigueConfig,
}

impl FatigueEstimator {
    pub fn new() -> Self {
        Self {
            config: FatigueConfig::default(),
        }
    }

    pub fn with_config(config: FatigueConfig) -> Self {
        Self { config }
    }

    /// Per-week load table in chronological order.
    ///
    /// Missing average heart rates are imputed with the feed-wide median
    /// before the ratio is formed; rows with no usable speed are left out
    /// of the ratio mean only. The first activity of the feed contributes
    /// no gap.
    pub fn weekly_loads(&self, feed: &ActivityFeed) -> Vec<WeeklyLoad> {
        let median_hr = median_heart_rate(feed);

        let mut weeks: BTreeMap<NaiveDate, WeekAccumulator> = BTreeMap::new();
        let mut previous_start: Option<NaiveDateTime> = None;

        for activity in feed.iter() {
            let accumulator = weeks.entry(activity.week_start()).or_default();
            accumulator.runs += 1;
            accumulator.volume_km += activity.distance_km.to_f64().unwrap_or(0.0);

            if let Some(max_hr) = activity.max_heart_rate.and_then(|v| v.to_f64()) {
                accumulator.max_heart_rates.push(max_hr);
            }

            let heart_rate = activity.avg_heart_rate.and_then(|v| v.to_f64()).or(median_hr);
            if let (Some(hr), Some(speed)) = (heart_rate, usable_speed(activity)) {
                accumulator.ratios.push(hr / speed);
            }

            if let Some(previous) = previous_start {
                let gap = (activity.start_time - previous).num_seconds() as f64 / SECONDS_PER_DAY;
                accumulator.gaps.push(gap);
            }
            previous_start = Some(activity.start_time);
        }

        weeks
            .into_iter()
            .map(|(week_start, acc)| WeeklyLoad {
                week_start,
                runs: acc.runs,
                volume_km: acc.volume_km,
                intensity: mean(&acc.max_heart_rates),
                mean_hrpr: mean(&acc.ratios),
                mean_gap_days: mean(&acc.gaps),
            })
            .collect()
    }

    /// Fatigue score for the latest week.
    ///
    /// Each weekly component is min-max normalized against the feed's
    /// history; a component that is constant across all weeks leaves
    /// nothing to normalize against and the estimate is refused rather
    /// than faked.
    pub fn score(&self, feed: &ActivityFeed) -> Result<FatigueScore, MetricsError> {
        let weeks = self.weekly_loads(feed);
        let latest = weeks.last().ok_or_else(|| MetricsError::InsufficientData {
            metric: FATIGUE_METRIC.to_string(),
            reason: "feed has no activities".to_string(),
        })?;

        let volumes: Vec<Option<f64>> = weeks.iter().map(|w| Some(w.volume_km)).collect();
        let intensities: Vec<Option<f64>> = weeks.iter().map(|w| w.intensity).collect();
        let ratios: Vec<Option<f64>> = weeks.iter().map(|w| w.mean_hrpr).collect();

        let volume_norm = normalized(&volumes, Some(latest.volume_km), "weekly volume")?;
        let intensity_norm = normalized(&intensities, latest.intensity, "weekly intensity")?;
        let ratio_norm = normalized(&ratios, latest.mean_hrpr, "heart-rate-to-pace ratio")?;

        // No recorded gap means no evidence of a layoff
        let days_since_last = latest.mean_gap_days.unwrap_or(0.0);
        let adjustment =
            (1.0 - days_since_last * (1.0 - self.config.decay_factor)).clamp(0.0, 1.0);

        let load = (volume_norm + intensity_norm + ratio_norm) / 3.0;
        let score = (100.0 * adjustment * load + 10.0).clamp(0.0, 100.0);

        Ok(FatigueScore {
            week_start: latest.week_start,
            score,
            headroom: 100.0 - score,
            adjustment,
            band: FatigueBand::from_score(score),
        })
    }
}

impl Default for FatigueEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn median_heart_rate(feed: &ActivityFeed) -> Option<f64> {
    let rates: Vec<f64> = feed
        .iter()
        .filter_map(|a| a.avg_heart_rate.and_then(|v| v.to_f64()))
        .collect();
    if rates.is_empty() {
        return None;
    }
    let mut data = Data::new(rates);
    Some(data.median())
}

fn usable_speed(activity: &Activity) -> Option<f64> {
    activity
        .avg_speed
        .filter(|s| s.is_sign_positive() && !s.is_zero())
        .or_else(|| activity.pace.and_then(pace::to_speed))
        .and_then(|s| s.to_f64())
        .filter(|s| *s > 0.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn normalized(
    values: &[Option<f64>],
    target: Option<f64>,
    component: &str,
) -> Result<f64, MetricsError> {
    let target = target.ok_or_else(|| MetricsError::InsufficientData {
        metric: FATIGUE_METRIC.to_string(),
        reason: format!("latest week has no {}", component),
    })?;

    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    let min = defined.iter().copied().fold(f64::INFINITY, f64::min);
    let max = defined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range <= 0.0 {
        return Err(MetricsError::InsufficientData {
            metric: FATIGUE_METRIC.to_string(),
            reason: format!("{} is constant across the recorded weeks", component),
        });
    }

    Ok((target - min) / range)
}
