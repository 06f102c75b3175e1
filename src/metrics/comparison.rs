//! Rolling-window comparison metrics
//!
//! Summarizes the feed over three windows anchored to the latest activity:
//! all time, the most recent 30 days, and the 30 days before those. The
//! recent-versus-prior deltas drive the headline dashboard cards.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Activity, ActivityFeed};

/// Aggregate figures for one time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    /// Number of activities in the window
    pub count: usize,
    /// Summed distance in kilometers
    pub total_distance_km: Decimal,
    /// Mean of the defined paces, `None` when the window has no usable pace
    pub mean_pace: Option<Decimal>,
}

impl WindowSummary {
    fn from_activities<'a>(activities: impl Iterator<Item = &'a Activity>) -> Self {
        let mut count = 0usize;
        let mut total_distance_km = Decimal::ZERO;
        let mut pace_sum = Decimal::ZERO;
        let mut pace_count = 0u32;

        for activity in activities {
            count += 1;
            total_distance_km += activity.distance_km;
            if let Some(pace) = activity.pace {
                pace_sum += pace;
                pace_count += 1;
            }
        }

        let mean_pace = if pace_count > 0 {
            Some(pace_sum / Decimal::from(pace_count))
        } else {
            None
        };

        WindowSummary {
            count,
            total_distance_km,
            mean_pace,
        }
    }

    fn empty() -> Self {
        WindowSummary {
            count: 0,
            total_distance_km: Decimal::ZERO,
            mean_pace: None,
        }
    }

    /// Copy with two-decimal display rounding; the aggregation itself
    /// stays exact.
    pub fn rounded(&self) -> WindowSummary {
        WindowSummary {
            count: self.count,
            total_distance_km: self.total_distance_km.round_dp(2),
            mean_pace: self.mean_pace.map(|p| p.round_dp(2)),
        }
    }
}

/// Recent-minus-prior change for each headline metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub count: i64,
    pub total_distance_km: Decimal,
    /// `None` when either window lacks a defined mean pace
    pub mean_pace: Option<Decimal>,
}

impl MetricDeltas {
    fn between(recent: &WindowSummary, prior: &WindowSummary) -> Self {
        let mean_pace = match (recent.mean_pace, prior.mean_pace) {
            (Some(r), Some(p)) => Some(r - p),
            _ => None,
        };

        MetricDeltas {
            count: recent.count as i64 - prior.count as i64,
            total_distance_km: recent.total_distance_km - prior.total_distance_km,
            mean_pace,
        }
    }

    pub fn rounded(&self) -> MetricDeltas {
        MetricDeltas {
            count: self.count,
            total_distance_km: self.total_distance_km.round_dp(2),
            mean_pace: self.mean_pace.map(|p| p.round_dp(2)),
        }
    }
}

/// The headline metrics a comparison reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonMetric {
    Count,
    Distance,
    MeanPace,
}

impl ComparisonMetric {
    /// Direction in which a positive delta is an improvement. Pace is
    /// minutes per kilometer, so dropping is getting faster.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, ComparisonMetric::MeanPace)
    }

    /// Whether a delta of this metric represents an improvement
    pub fn is_improvement(&self, delta: Decimal) -> bool {
        if self.higher_is_better() {
            delta > Decimal::ZERO
        } else {
            delta < Decimal::ZERO
        }
    }
}

/// Comparison of the feed's recent month against the month before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Anchor of the windows; `None` for an empty feed
    pub end_time: Option<NaiveDateTime>,
    pub all_time: WindowSummary,
    /// Activities in `(end - window, end]`
    pub recent: WindowSummary,
    /// Activities in `(end - 2*window, end - window]`
    pub prior: WindowSummary,
    pub deltas: MetricDeltas,
}

#[derive(Debug, Clone, Copy)]
pub struct ComparisonConfig {
    /// Width of each comparison window in days
    pub window_days: i64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig { window_days: 30 }
    }
}

pub struct ComparisonCalculator {
    config: ComparisonConfig,
}

impl ComparisonCalculator {
    pub fn new() -> Self {
        Self {
            config: ComparisonConfig::default(),
        }
    }

    pub fn with_config(config: ComparisonConfig) -> Self {
        Self { config }
    }

    /// Compare the latest window against the one before it.
    ///
    /// An empty feed yields a report of zero-valued summaries rather
    /// than an error; no activities in a window is a real answer.
    pub fn compare(&self, feed: &ActivityFeed) -> ComparisonReport {
        let end_time = match feed.latest_time() {
            Some(t) => t,
            None => {
                return ComparisonReport {
                    end_time: None,
                    all_time: WindowSummary::empty(),
                    recent: WindowSummary::empty(),
                    prior: WindowSummary::empty(),
                    deltas: MetricDeltas::between(
                        &WindowSummary::empty(),
                        &WindowSummary::empty(),
                    ),
                };
            }
        };

        let window = Duration::days(self.config.window_days);
        let recent_start = end_time - window;
        let prior_start = end_time - window - window;

        let all_time = WindowSummary::from_activities(feed.iter());
        let recent = WindowSummary::from_activities(
            feed.iter()
                .filter(|a| a.start_time > recent_start && a.start_time <= end_time),
        );
        let prior = WindowSummary::from_activities(
            feed.iter()
                .filter(|a| a.start_time > prior_start && a.start_time <= recent_start),
        );
        let deltas = MetricDeltas::between(&recent, &prior);

        ComparisonReport {
            end_time: Some(end_time),
            all_time,
            recent,
            prior,
            deltas,
        }
    }
}

impl Default for ComparisonCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::models::Sport;

    fn test_activity(id: &str, date: (i32, u32, u32), distance_km: Decimal, pace: Option<Decimal>) -> Activity {
        Activity {
            id: id.to_string(),
            name: None,
            start_time: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            sport: Sport::Run,
            distance_km,
            moving_time_seconds: None,
            elapsed_time_seconds: None,
            elevation_gain: None,
            avg_speed: None,
            avg_heart_rate: None,
            max_heart_rate: None,
            pace,
            suffer_score: None,
        }
    }

    #[test]
    fn test_windows_split_at_thirty_days() {
        // End anchor is Mar 31; the Mar 1 run sits exactly at end - 30d
        // and belongs to the prior window, not the recent one.
        let feed = ActivityFeed::from_activities(vec![
            test_activity("old", (2024, 1, 5), dec!(12.0), Some(dec!(6.5))),
            test_activity("boundary", (2024, 3, 1), dec!(8.0), Some(dec!(6.0))),
            test_activity("mid", (2024, 3, 10), dec!(10.0), Some(dec!(5.5))),
            test_activity("end", (2024, 3, 31), dec!(6.0), Some(dec!(5.0))),
        ]);

        let report = ComparisonCalculator::new().compare(&feed);

        assert_eq!(report.all_time.count, 4);
        assert_eq!(report.recent.count, 2);
        assert_eq!(report.recent.total_distance_km, dec!(16.0));
        assert_eq!(report.prior.count, 1);
        assert_eq!(report.prior.total_distance_km, dec!(8.0));

        assert_eq!(report.deltas.count, 1);
        assert_eq!(report.deltas.total_distance_km, dec!(8.0));
        // Recent mean 5.25 against prior 6.0
        assert_eq!(report.deltas.mean_pace, Some(dec!(-0.75)));
    }

    #[test]
    fn test_empty_prior_window_is_well_defined() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 5, 20), dec!(5.0), Some(dec!(6.0))),
            test_activity("b", (2024, 5, 25), dec!(7.0), Some(dec!(5.8))),
        ]);

        let report = ComparisonCalculator::new().compare(&feed);

        assert_eq!(report.recent.count, 2);
        assert_eq!(report.prior.count, 0);
        assert_eq!(report.prior.mean_pace, None);
        assert_eq!(report.deltas.count, 2);
        assert_eq!(report.deltas.total_distance_km, dec!(12.0));
        // Pace delta is undefined with nothing to compare against
        assert_eq!(report.deltas.mean_pace, None);
    }

    #[test]
    fn test_empty_feed_reports_zeroes() {
        let report = ComparisonCalculator::new().compare(&ActivityFeed::empty());

        assert_eq!(report.end_time, None);
        assert_eq!(report.all_time.count, 0);
        assert_eq!(report.recent.total_distance_km, Decimal::ZERO);
        assert_eq!(report.deltas.count, 0);
        assert_eq!(report.deltas.mean_pace, None);
    }

    #[test]
    fn test_undefined_pace_excluded_from_mean() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 5, 20), dec!(5.0), Some(dec!(6.0))),
            test_activity("b", (2024, 5, 21), dec!(5.0), None),
            test_activity("c", (2024, 5, 22), dec!(5.0), Some(dec!(5.0))),
        ]);

        let report = ComparisonCalculator::new().compare(&feed);
        assert_eq!(report.recent.count, 3);
        assert_eq!(report.recent.mean_pace, Some(dec!(5.5)));
    }

    #[test]
    fn test_display_rounding_is_two_decimals() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 5, 20), dec!(5.123), Some(dec!(6.0))),
            test_activity("b", (2024, 5, 21), dec!(5.0), Some(dec!(5.07))),
            test_activity("c", (2024, 5, 22), dec!(5.0), Some(dec!(5.0))),
        ]);

        let report = ComparisonCalculator::new().compare(&feed);
        let rounded = report.recent.rounded();

        assert_eq!(rounded.total_distance_km, dec!(15.12));
        // (6.0 + 5.07 + 5.0) / 3 = 5.3566...
        assert_eq!(rounded.mean_pace, Some(dec!(5.36)));
        // The exact value is untouched
        assert_ne!(report.recent.mean_pace, rounded.mean_pace);
    }

    #[test]
    fn test_pace_improvement_direction_is_inverted() {
        assert!(ComparisonMetric::Distance.is_improvement(dec!(3.0)));
        assert!(!ComparisonMetric::Distance.is_improvement(dec!(-3.0)));
        assert!(ComparisonMetric::MeanPace.is_improvement(dec!(-0.5)));
        assert!(!ComparisonMetric::MeanPace.is_improvement(dec!(0.5)));
        assert!(!ComparisonMetric::MeanPace.is_improvement(Decimal::ZERO));
    }
}
