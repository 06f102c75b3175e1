//! Threshold filtering of the cleaned feed
//!
//! Two user-supplied cutoffs define the analysis subset: a pace ceiling
//! (exclude slow recovery jogs) and a distance floor (exclude short
//! shakeouts). Filtering is value-level: it derives a new feed and never
//! mutates the input, so the raw feed stays available for the heatmap and
//! fatigue modeling. An empty result is a valid outcome, not an error.

use chrono::Months;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{Activity, ActivityFeed};

/// User-adjustable analysis cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Slowest acceptable pace in min/km, inclusive
    pub max_pace: Decimal,
    /// Shortest acceptable distance in km, inclusive
    pub min_distance_km: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            max_pace: dec!(7),
            min_distance_km: dec!(4),
        }
    }
}

impl Thresholds {
    pub fn new(max_pace: Decimal, min_distance_km: Decimal) -> Self {
        Thresholds {
            max_pace,
            min_distance_km,
        }
    }

    /// Whether one activity passes both cutoffs
    ///
    /// An undefined pace is treated as infinitely slow and never passes
    /// the ceiling.
    pub fn accepts(&self, activity: &Activity) -> bool {
        match activity.pace {
            Some(pace) => {
                pace <= self.max_pace && activity.distance_km >= self.min_distance_km
            }
            None => false,
        }
    }

    /// Derive the analysis subset from a cleaned feed
    pub fn apply(&self, feed: &ActivityFeed) -> ActivityFeed {
        feed.filter(|a| self.accepts(a))
    }
}

/// Clip a feed to the trailing `months_back` months, measured from the
/// feed's own latest activity rather than wall-clock today. Both ends of
/// the window are inclusive.
pub fn clip_recent_months(feed: &ActivityFeed, months_back: u32) -> ActivityFeed {
    let Some(end) = feed.latest_time() else {
        return ActivityFeed::empty();
    };
    match end.checked_sub_months(Months::new(months_back)) {
        Some(start) => feed.filter(|a| a.start_time >= start && a.start_time <= end),
        None => feed.clone(),
    }
}
