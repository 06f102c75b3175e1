use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sport types distinguished by the activity sources
///
/// Sources mix many activity kinds in one feed; the analysis pipeline only
/// keeps runs, but the loader still classifies everything it reads so the
/// drop accounting can say what was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Run,
    Ride,
    Walk,
    Hike,
    Swim,
    Other,
}

impl Sport {
    /// Classify a source's free-form activity-type label
    pub fn from_source_label(label: &str) -> Sport {
        match label.trim().to_lowercase().as_str() {
            "run" | "running" | "trail run" | "virtualrun" => Sport::Run,
            "ride" | "cycling" | "virtualride" | "bike" => Sport::Ride,
            "walk" | "walking" => Sport::Walk,
            "hike" | "hiking" => Sport::Hike,
            "swim" | "swimming" => Sport::Swim,
            _ => Sport::Other,
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Sport::Run => "Run",
            Sport::Ride => "Ride",
            Sport::Walk => "Walk",
            Sport::Hike => "Hike",
            Sport::Swim => "Swim",
            Sport::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

/// One observed activity after schema normalization
///
/// Distances are kilometers and speeds meters per second regardless of what
/// the source recorded. Pace is always derived (from the source pace column
/// or from speed), never taken on trust; `None` means the row had no usable
/// speed, which downstream code treats as "infinitely slow" rather than NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Identifier from the source, or synthesized at load when absent
    pub id: String,

    /// Activity title from the source
    pub name: Option<String>,

    /// Start timestamp in the source's local time
    pub start_time: NaiveDateTime,

    /// Sport/activity type
    pub sport: Sport,

    /// Distance in kilometers, non-negative
    pub distance_km: Decimal,

    /// Moving time in seconds
    pub moving_time_seconds: Option<u32>,

    /// Elapsed (wall-clock) time in seconds
    pub elapsed_time_seconds: Option<u32>,

    /// Total elevation gain in meters
    pub elevation_gain: Option<Decimal>,

    /// Average speed in meters per second
    pub avg_speed: Option<Decimal>,

    /// Average heart rate in beats per minute
    pub avg_heart_rate: Option<Decimal>,

    /// Maximum heart rate in beats per minute
    pub max_heart_rate: Option<Decimal>,

    /// Pace in decimal minutes per kilometer; `None` when speed was zero
    pub pace: Option<Decimal>,

    /// Relative effort score when the source provides one
    pub suffer_score: Option<Decimal>,
}

impl Activity {
    /// Calendar date of the activity
    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Year-month bucket key, e.g. "2024-03"
    ///
    /// Derived from the timestamp on demand so the two can never disagree.
    pub fn month_key(&self) -> String {
        self.start_time.format("%Y-%m").to_string()
    }

    /// Monday of the week containing the activity
    pub fn week_start(&self) -> NaiveDate {
        let date = self.date();
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
    }

    /// Moving time, falling back to elapsed time when the source lacks it
    pub fn duration_seconds(&self) -> Option<u32> {
        self.moving_time_seconds.or(self.elapsed_time_seconds)
    }
}

/// The ordered set of activities for one user
///
/// Always sorted ascending by start time with unique identifiers;
/// construction enforces both. Immutable once built, so every derived table
/// is a pure function of a feed plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFeed {
    activities: Vec<Activity>,
}

impl ActivityFeed {
    /// Build a feed from raw activities, sorting by start time and keeping
    /// the first record for any duplicated identifier.
    pub fn from_activities(mut activities: Vec<Activity>) -> Self {
        activities.sort_by_key(|a| a.start_time);
        let mut seen = HashSet::new();
        activities.retain(|a| seen.insert(a.id.clone()));
        ActivityFeed { activities }
    }

    pub fn empty() -> Self {
        ActivityFeed {
            activities: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Activity> {
        self.activities.iter()
    }

    /// Timestamp of the most recent activity
    pub fn latest_time(&self) -> Option<NaiveDateTime> {
        self.activities.last().map(|a| a.start_time)
    }

    /// Timestamp of the oldest activity
    pub fn earliest_time(&self) -> Option<NaiveDateTime> {
        self.activities.first().map(|a| a.start_time)
    }

    /// Derive a new feed containing the activities matching `keep`
    ///
    /// Order and uniqueness carry over from this feed, so no re-sort is
    /// needed.
    pub fn filter<F>(&self, keep: F) -> ActivityFeed
    where
        F: Fn(&Activity) -> bool,
    {
        ActivityFeed {
            activities: self
                .activities
                .iter()
                .filter(|a| keep(a))
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActivityFeed {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.activities.iter()
    }
}
