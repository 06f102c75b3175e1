//! Activity feed loading and cleaning
//!
//! Reads a tabular source through its `FeedSchema` and produces a clean,
//! sorted `ActivityFeed`. Cleaning follows a fixed order: parse the
//! timestamp, keep only the target sport, normalize distance and pace,
//! apply the earliest-date floor, drop rows repeating an earlier id, then
//! sort ascending.
//!
//! A malformed row never aborts the load. It is dropped, logged at debug
//! level, and counted in the `LoadReport` so the caller can surface how
//! much of the source survived. Only source-level problems (missing file,
//! missing required column) are returned as errors.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{FeedError, Result};
use crate::feed::schema::{normalize_column_name, DistanceUnit, DurationUnit, FeedSchema, PaceEncoding};
use crate::models::{Activity, ActivityFeed, Sport};
use crate::pace;

/// Accounting for one load: how many rows arrived and why the rest left
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Data rows present in the source
    pub rows_seen: usize,
    /// Rows that made it into the feed
    pub rows_loaded: usize,
    /// Rows dropped for an unparseable timestamp, distance, or pace
    pub dropped_malformed: usize,
    /// Rows dropped because they are not the target sport
    pub dropped_other_sport: usize,
    /// Rows dropped by the earliest-date floor
    pub dropped_before_floor: usize,
    /// Rows dropped because an earlier row already used their id
    pub dropped_duplicate: usize,
}

impl LoadReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped_malformed
            + self.dropped_other_sport
            + self.dropped_before_floor
            + self.dropped_duplicate
    }
}

/// Resolved header positions for one source file
struct ColumnIndices {
    timestamp: usize,
    distance: usize,
    id: Option<usize>,
    name: Option<usize>,
    sport: Option<usize>,
    moving_time: Option<usize>,
    elapsed_time: Option<usize>,
    elevation: Option<usize>,
    speed: Option<usize>,
    avg_hr: Option<usize>,
    max_hr: Option<usize>,
    pace: Option<usize>,
    suffer_score: Option<usize>,
}

/// Loader/cleaner for one schema
pub struct FeedLoader {
    schema: FeedSchema,
    target_sport: Sport,
}

impl FeedLoader {
    pub fn new(schema: FeedSchema) -> Self {
        FeedLoader {
            schema,
            target_sport: Sport::Run,
        }
    }

    /// Keep a sport other than runs; used by feeds analysed for a
    /// different discipline.
    pub fn with_target_sport(schema: FeedSchema, target_sport: Sport) -> Self {
        FeedLoader {
            schema,
            target_sport,
        }
    }

    pub fn schema(&self) -> &FeedSchema {
        &self.schema
    }

    /// Load and clean a CSV source
    pub fn load_path(&self, path: &Path, date_floor: NaiveDate) -> Result<(ActivityFeed, LoadReport)> {
        if !path.exists() {
            return Err(FeedError::SourceNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let unreadable = |reason: String| FeedError::UnreadableSource {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| unreadable(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| unreadable(e.to_string()))?
            .clone();
        let indices = self.resolve_columns(&headers)?;

        let mut report = LoadReport::default();
        let mut activities = Vec::new();
        let mut seen_ids = HashSet::new();

        for record in reader.records() {
            report.rows_seen += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    report.dropped_malformed += 1;
                    debug!(error = %e, "row dropped: unreadable record");
                    continue;
                }
            };
            if let Some(activity) = self.parse_row(&record, &indices, date_floor, &mut report) {
                if !seen_ids.insert(activity.id.clone()) {
                    report.dropped_duplicate += 1;
                    debug!(id = %activity.id, "row dropped: duplicate id");
                    continue;
                }
                activities.push(activity);
            }
        }

        report.rows_loaded = activities.len();
        info!(
            source = %path.display(),
            schema = %self.schema.name,
            loaded = report.rows_loaded,
            dropped = report.dropped_total(),
            "activity feed loaded"
        );

        Ok((ActivityFeed::from_activities(activities), report))
    }

    fn resolve_columns(&self, headers: &StringRecord) -> Result<ColumnIndices> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            by_name.entry(normalize_column_name(header)).or_insert(i);
        }

        let lookup = |column: &str| by_name.get(&normalize_column_name(column)).copied();
        let require = |column: &str| {
            lookup(column).ok_or(FeedError::MissingColumn {
                column: column.to_string(),
            })
        };
        let optional = |column: &Option<String>| column.as_deref().and_then(lookup);

        let pace = match &self.schema.pace {
            Some(spec) => Some(require(&spec.column)?),
            None => None,
        };

        Ok(ColumnIndices {
            timestamp: require(&self.schema.timestamp_column)?,
            distance: require(&self.schema.distance_column)?,
            id: optional(&self.schema.id_column),
            name: optional(&self.schema.name_column),
            sport: optional(&self.schema.sport_column),
            moving_time: optional(&self.schema.moving_time_column),
            elapsed_time: optional(&self.schema.elapsed_time_column),
            elevation: optional(&self.schema.elevation_column),
            speed: optional(&self.schema.speed_column),
            avg_hr: optional(&self.schema.avg_hr_column),
            max_hr: optional(&self.schema.max_hr_column),
            pace,
            suffer_score: optional(&self.schema.suffer_score_column),
        })
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        idx: &ColumnIndices,
        date_floor: NaiveDate,
        report: &mut LoadReport,
    ) -> Option<Activity> {
        let Some(raw_timestamp) = nonempty(record.get(idx.timestamp)) else {
            report.dropped_malformed += 1;
            debug!("row dropped: empty timestamp");
            return None;
        };
        let Some(start_time) = parse_timestamp(raw_timestamp) else {
            report.dropped_malformed += 1;
            debug!(value = raw_timestamp, "row dropped: unparseable timestamp");
            return None;
        };

        let sport = match idx.sport {
            Some(i) => match nonempty(record.get(i)) {
                Some(label) => Sport::from_source_label(label),
                None => Sport::Other,
            },
            None => self.target_sport.clone(),
        };
        if sport != self.target_sport {
            report.dropped_other_sport += 1;
            return None;
        }

        let Some(raw_distance) = nonempty(record.get(idx.distance)) else {
            report.dropped_malformed += 1;
            debug!("row dropped: empty distance");
            return None;
        };
        let Ok(raw_distance) = raw_distance.parse::<Decimal>() else {
            report.dropped_malformed += 1;
            debug!(value = raw_distance, "row dropped: unparseable distance");
            return None;
        };
        if raw_distance < Decimal::ZERO {
            report.dropped_malformed += 1;
            debug!("row dropped: negative distance");
            return None;
        }
        let distance_km = match self.schema.distance_unit {
            DistanceUnit::Meters => raw_distance / dec!(1000),
            DistanceUnit::Kilometers => raw_distance,
        };

        let avg_speed = optional_decimal(idx.speed, record);
        let pace = match &self.schema.pace {
            Some(spec) => match idx.pace.and_then(|i| nonempty(record.get(i))) {
                None => None,
                // Dumps of API data write "inf" for zero-speed rows
                Some(token) if token.eq_ignore_ascii_case("inf") => None,
                Some(token) => match spec.encoding {
                    PaceEncoding::MinSecToken => match pace::from_min_sec(token) {
                        Ok(value) => positive_pace(value),
                        Err(_) => {
                            report.dropped_malformed += 1;
                            debug!(value = token, "row dropped: unparseable pace token");
                            return None;
                        }
                    },
                    PaceEncoding::CentiMinutes => match token.parse::<Decimal>() {
                        Ok(encoded) => positive_pace(pace::from_centi_minutes(encoded)),
                        Err(_) => {
                            report.dropped_malformed += 1;
                            debug!(value = token, "row dropped: unparseable pace value");
                            return None;
                        }
                    },
                },
            },
            None => avg_speed.and_then(pace::from_speed),
        };

        if start_time.date() < date_floor {
            report.dropped_before_floor += 1;
            return None;
        }

        let id = idx
            .id
            .and_then(|i| nonempty(record.get(i)))
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Some(Activity {
            id,
            name: idx
                .name
                .and_then(|i| nonempty(record.get(i)))
                .map(str::to_string),
            start_time,
            sport,
            distance_km,
            moving_time_seconds: self.optional_duration(idx.moving_time, record),
            elapsed_time_seconds: self.optional_duration(idx.elapsed_time, record),
            elevation_gain: optional_decimal(idx.elevation, record),
            avg_speed,
            avg_heart_rate: optional_decimal(idx.avg_hr, record),
            max_heart_rate: optional_decimal(idx.max_hr, record),
            pace,
            suffer_score: optional_decimal(idx.suffer_score, record),
        })
    }

    fn optional_duration(&self, index: Option<usize>, record: &StringRecord) -> Option<u32> {
        let raw = nonempty(record.get(index?))?;
        let value: f64 = match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                debug!(value = raw, "ignoring unparseable duration cell");
                return None;
            }
        };
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let seconds = match self.schema.duration_unit {
            DurationUnit::Seconds => value,
            DurationUnit::Minutes => value * 60.0,
        };
        Some(seconds.round() as u32)
    }
}

fn nonempty(cell: Option<&str>) -> Option<&str> {
    let trimmed = cell?.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn optional_decimal(index: Option<usize>, record: &StringRecord) -> Option<Decimal> {
    let raw = nonempty(record.get(index?))?;
    match raw.parse::<Decimal>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(value = raw, "ignoring unparseable numeric cell");
            None
        }
    }
}

fn positive_pace(pace: Decimal) -> Option<Decimal> {
    (pace > Decimal::ZERO).then_some(pace)
}

/// Parse a source timestamp, trying datetime formats first and falling
/// back to bare dates at midnight.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
    ];
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

    let trimmed = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}
