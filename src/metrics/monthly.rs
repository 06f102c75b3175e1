//! Per-month aggregates and whole-feed statistics

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

use crate::models::{Activity, ActivityFeed};

/// Five-number summary of a month's paces, for box-style displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceQuartiles {
    pub min: f64,
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// Month key in `YYYY-MM` form
    pub month: String,
    pub runs: usize,
    pub total_distance_km: Decimal,
    /// Mean of the month's defined paces
    pub mean_pace: Option<Decimal>,
    pub pace_quartiles: Option<PaceQuartiles>,
}

/// Aggregate the feed month by month, oldest first
pub fn monthly_summaries(feed: &ActivityFeed) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<String, Vec<&Activity>> = BTreeMap::new();
    for activity in feed.iter() {
        months.entry(activity.month_key()).or_default().push(activity);
    }

    months
        .into_iter()
        .map(|(month, activities)| {
            let total_distance_km = activities.iter().map(|a| a.distance_km).sum();
            let paces: Vec<Decimal> = activities.iter().filter_map(|a| a.pace).collect();

            let mean_pace = if paces.is_empty() {
                None
            } else {
                Some(paces.iter().copied().sum::<Decimal>() / Decimal::from(paces.len() as u32))
            };

            MonthlySummary {
                month,
                runs: activities.len(),
                total_distance_km,
                mean_pace,
                pace_quartiles: pace_quartiles(&paces),
            }
        })
        .collect()
}

fn pace_quartiles(paces: &[Decimal]) -> Option<PaceQuartiles> {
    let values: Vec<f64> = paces.iter().filter_map(|p| p.to_f64()).collect();
    if values.is_empty() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut data = Data::new(values);

    Some(PaceQuartiles {
        min,
        lower: data.lower_quartile(),
        median: data.median(),
        upper: data.upper_quartile(),
        max,
    })
}

/// Headline figures for the whole feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStatistics {
    pub runs: usize,
    pub total_distance_km: Decimal,
    /// Mean of the recorded average heart rates
    pub mean_heart_rate: Option<Decimal>,
    /// Fastest (lowest) defined pace
    pub best_pace: Option<Decimal>,
    pub total_elevation_gain: Decimal,
}

pub fn feed_statistics(feed: &ActivityFeed) -> FeedStatistics {
    let mut heart_rate_sum = Decimal::ZERO;
    let mut heart_rate_count = 0u32;
    for activity in feed.iter() {
        if let Some(hr) = activity.avg_heart_rate {
            heart_rate_sum += hr;
            heart_rate_count += 1;
        }
    }

    let mean_heart_rate = if heart_rate_count > 0 {
        Some(heart_rate_sum / Decimal::from(heart_rate_count))
    } else {
        None
    };

    FeedStatistics {
        runs: feed.len(),
        total_distance_km: feed.iter().map(|a| a.distance_km).sum(),
        mean_heart_rate,
        best_pace: feed.iter().filter_map(|a| a.pace).min(),
        total_elevation_gain: feed
            .iter()
            .filter_map(|a| a.elevation_gain)
            .sum(),
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
                .and_hms_opt(18, 0, 0)
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
    fn test_months_group_and_sort() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("feb", (2024, 2, 10), dec!(8.0), Some(dec!(5.5))),
            test_activity("jan_a", (2024, 1, 5), dec!(5.0), Some(dec!(6.0))),
            test_activity("jan_b", (2024, 1, 20), dec!(7.0), Some(dec!(5.0))),
        ]);

        let months = monthly_summaries(&feed);
        assert_eq!(months.len(), 2);

        assert_eq!(months[0].month, "2024-01");
        assert_eq!(months[0].runs, 2);
        assert_eq!(months[0].total_distance_km, dec!(12.0));
        assert_eq!(months[0].mean_pace, Some(dec!(5.5)));

        assert_eq!(months[1].month, "2024-02");
        assert_eq!(months[1].runs, 1);
    }

    #[test]
    fn test_quartiles_are_ordered() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 1, 1), dec!(5.0), Some(dec!(4.5))),
            test_activity("b", (2024, 1, 8), dec!(5.0), Some(dec!(5.0))),
            test_activity("c", (2024, 1, 15), dec!(5.0), Some(dec!(5.5))),
            test_activity("d", (2024, 1, 22), dec!(5.0), Some(dec!(6.0))),
            test_activity("e", (2024, 1, 29), dec!(5.0), Some(dec!(7.0))),
        ]);

        let months = monthly_summaries(&feed);
        let quartiles = months[0].pace_quartiles.clone().unwrap();

        assert_eq!(quartiles.min, 4.5);
        assert_eq!(quartiles.max, 7.0);
        assert_eq!(quartiles.median, 5.5);
        assert!(quartiles.min <= quartiles.lower);
        assert!(quartiles.lower <= quartiles.median);
        assert!(quartiles.median <= quartiles.upper);
        assert!(quartiles.upper <= quartiles.max);
    }

    #[test]
    fn test_uniform_paces_collapse_the_box() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 1, 1), dec!(5.0), Some(dec!(5.0))),
            test_activity("b", (2024, 1, 2), dec!(5.0), Some(dec!(5.0))),
        ]);

        let quartiles = monthly_summaries(&feed)[0].pace_quartiles.clone().unwrap();
        assert_eq!(quartiles.min, 5.0);
        assert_eq!(quartiles.lower, 5.0);
        assert_eq!(quartiles.median, 5.0);
        assert_eq!(quartiles.upper, 5.0);
        assert_eq!(quartiles.max, 5.0);
    }

    #[test]
    fn test_month_without_paces_has_no_pace_stats() {
        let feed = ActivityFeed::from_activities(vec![test_activity(
            "a",
            (2024, 1, 1),
            dec!(5.0),
            None,
        )]);

        let months = monthly_summaries(&feed);
        assert_eq!(months[0].mean_pace, None);
        assert!(months[0].pace_quartiles.is_none());
    }

    #[test]
    fn test_feed_statistics() {
        let mut a = test_activity("a", (2024, 1, 1), dec!(5.0), Some(dec!(6.0)));
        a.avg_heart_rate = Some(dec!(140));
        a.elevation_gain = Some(dec!(50));
        let mut b = test_activity("b", (2024, 1, 2), dec!(10.0), Some(dec!(5.25)));
        b.avg_heart_rate = Some(dec!(150));
        let c = test_activity("c", (2024, 1, 3), dec!(3.0), None);

        let stats = feed_statistics(&ActivityFeed::from_activities(vec![a, b, c]));
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.total_distance_km, dec!(18.0));
        assert_eq!(stats.mean_heart_rate, Some(dec!(145)));
        assert_eq!(stats.best_pace, Some(dec!(5.25)));
        assert_eq!(stats.total_elevation_gain, dec!(50));
    }

    #[test]
    fn test_empty_feed_statistics() {
        let stats = feed_statistics(&ActivityFeed::empty());
        assert_eq!(stats.runs, 0);
        assert_eq!(stats.total_distance_km, Decimal::ZERO);
        assert_eq!(stats.mean_heart_rate, None);
        assert_eq!(stats.best_pace, None);
    }
}
