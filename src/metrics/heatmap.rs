//! Calendar heatmap of daily running distance
//!
//! A 7x52 grid: one row per weekday (Monday first), one column per ISO
//! week. Cells accumulate the distance of every activity that lands on
//! that day and carry the day's date as a label, so a rest day (zero
//! distance, no label) stays distinguishable from a zero-distance run.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ActivityFeed;

pub const HEATMAP_ROWS: usize = 7;
pub const HEATMAP_WEEKS: usize = 52;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    /// Calendar year the grid covers
    pub year: i32,
    /// Accumulated distance per cell, `[weekday][week]`
    pub distances: Vec<Vec<Decimal>>,
    /// Date label per cell, empty string for days with no activity
    pub labels: Vec<Vec<String>>,
}

impl HeatmapGrid {
    /// Build the grid for one calendar year of the feed.
    ///
    /// Columns follow the ISO week number, so the last days of December
    /// may fall into column zero and the first days of January into the
    /// rightmost column. A date in ISO week 53 has no column and is
    /// skipped.
    pub fn for_year(feed: &ActivityFeed, year: i32) -> HeatmapGrid {
        let mut distances = vec![vec![Decimal::ZERO; HEATMAP_WEEKS]; HEATMAP_ROWS];
        let mut labels = vec![vec![String::new(); HEATMAP_WEEKS]; HEATMAP_ROWS];

        for activity in feed.iter() {
            let date = activity.date();
            if date.year() != year {
                continue;
            }

            let (row, col) = match Self::position_of(date) {
                Some(cell) => cell,
                None => {
                    debug!(date = %date, "skipping ISO week 53 date with no heatmap column");
                    continue;
                }
            };

            distances[row][col] += activity.distance_km;
            labels[row][col] = date.format("%Y-%m-%d").to_string();
        }

        HeatmapGrid {
            year,
            distances,
            labels,
        }
    }

    /// Grid for the calendar year of the feed's latest activity
    pub fn latest(feed: &ActivityFeed) -> Option<HeatmapGrid> {
        let year = feed.latest_time()?.date().year();
        Some(Self::for_year(feed, year))
    }

    /// Whether a cell saw at least one activity
    pub fn has_activity(&self, row: usize, col: usize) -> bool {
        !self.labels[row][col].is_empty()
    }

    /// Largest cell distance, for shading scales
    pub fn max_distance(&self) -> Decimal {
        self.distances
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// Cell coordinates of a date, `None` for ISO week 53
    pub fn position_of(date: NaiveDate) -> Option<(usize, usize)> {
        let week = date.iso_week().week() as usize;
        if week > HEATMAP_WEEKS {
            return None;
        }
        Some((date.weekday().num_days_from_monday() as usize, week - 1))
    }
}
