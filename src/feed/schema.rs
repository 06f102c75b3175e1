//! Explicit per-source feed schemas
//!
//! Every source is described by a `FeedSchema` naming its columns, units,
//! and pace encoding. The loader validates a file's header against the
//! schema before reading a single row, so a renamed column fails loudly
//! instead of silently producing an empty metric.
//!
//! Column names are matched after normalization (lowercased, spaces and
//! hyphens folded to underscores), which absorbs the cosmetic header
//! differences between export variants.

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Unit a source records distance in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
}

/// Unit a source records durations in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationUnit {
    Seconds,
    Minutes,
}

/// How a source encodes its pace column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceEncoding {
    /// "minutes:seconds" token, e.g. "7:30"
    MinSecToken,
    /// Decimal minutes whose fraction is seconds over 100, so 7.30 is 7m30s
    CentiMinutes,
}

/// A pace column together with the encoding it uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceColumn {
    pub column: String,
    pub encoding: PaceEncoding,
}

/// Column names and units for one feed source
///
/// `timestamp_column` and `distance_column` are mandatory; everything else
/// is declared only when the source has it. When `pace` is absent the
/// loader derives pace from `speed_column`; when `sport_column` is absent
/// every row is assumed to be a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSchema {
    /// Preset name, part of the feed cache key
    pub name: String,

    pub timestamp_column: String,
    pub distance_column: String,
    pub distance_unit: DistanceUnit,
    pub duration_unit: DurationUnit,

    pub id_column: Option<String>,
    pub name_column: Option<String>,
    pub sport_column: Option<String>,
    pub moving_time_column: Option<String>,
    pub elapsed_time_column: Option<String>,
    pub elevation_column: Option<String>,
    pub speed_column: Option<String>,
    pub avg_hr_column: Option<String>,
    pub max_hr_column: Option<String>,
    pub pace: Option<PaceColumn>,
    pub suffer_score_column: Option<String>,
}

impl FeedSchema {
    /// Schema for a raw activity-API dump: distances in meters, durations
    /// in seconds, pace derived from average speed, no id column.
    pub fn strava_api() -> Self {
        FeedSchema {
            name: "strava-api".to_string(),
            timestamp_column: "date".to_string(),
            distance_column: "distance_meters".to_string(),
            distance_unit: DistanceUnit::Meters,
            duration_unit: DurationUnit::Seconds,
            id_column: None,
            name_column: Some("name".to_string()),
            sport_column: Some("type".to_string()),
            moving_time_column: Some("moving_time_seconds".to_string()),
            elapsed_time_column: Some("elapsed_time_seconds".to_string()),
            elevation_column: Some("total_elevation_gain".to_string()),
            speed_column: Some("average_speed_metres_per_second".to_string()),
            avg_hr_column: Some("average_heartrate".to_string()),
            max_hr_column: Some("max_heartrate".to_string()),
            pace: None,
            suffer_score_column: Some("suffer_score".to_string()),
        }
    }

    /// Schema for a preprocessed CSV dump of the API data: kilometers,
    /// centi-minute pace column, still no id column.
    pub fn strava_csv() -> Self {
        FeedSchema {
            name: "strava-csv".to_string(),
            timestamp_column: "date".to_string(),
            distance_column: "distance_km".to_string(),
            distance_unit: DistanceUnit::Kilometers,
            duration_unit: DurationUnit::Seconds,
            id_column: None,
            name_column: Some("name".to_string()),
            sport_column: Some("type".to_string()),
            moving_time_column: Some("moving_time_seconds".to_string()),
            elapsed_time_column: None,
            elevation_column: Some("total_elevation_gain".to_string()),
            speed_column: Some("average_speed_metres_per_second".to_string()),
            avg_hr_column: Some("average_heartrate".to_string()),
            max_hr_column: Some("max_heartrate".to_string()),
            pace: Some(PaceColumn {
                column: "pace".to_string(),
                encoding: PaceEncoding::CentiMinutes,
            }),
            suffer_score_column: Some("suffer_score".to_string()),
        }
    }

    /// Schema for the hand-kept training spreadsheet: kilometers, durations
    /// in minutes, "M:SS" pace tokens, runs only so no sport column.
    pub fn spreadsheet() -> Self {
        FeedSchema {
            name: "spreadsheet".to_string(),
            timestamp_column: "date".to_string(),
            distance_column: "distance".to_string(),
            distance_unit: DistanceUnit::Kilometers,
            duration_unit: DurationUnit::Minutes,
            id_column: Some("id".to_string()),
            name_column: None,
            sport_column: None,
            moving_time_column: Some("time".to_string()),
            elapsed_time_column: None,
            elevation_column: Some("elevgain".to_string()),
            speed_column: None,
            avg_hr_column: Some("heartrate".to_string()),
            max_hr_column: None,
            pace: Some(PaceColumn {
                column: "pace".to_string(),
                encoding: PaceEncoding::MinSecToken,
            }),
            suffer_score_column: None,
        }
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> Result<FeedSchema, FeedError> {
        match name.trim().to_lowercase().as_str() {
            "strava-api" | "strava_api" | "api" => Ok(Self::strava_api()),
            "strava-csv" | "strava_csv" | "csv" => Ok(Self::strava_csv()),
            "spreadsheet" | "sheet" => Ok(Self::spreadsheet()),
            other => Err(FeedError::UnknownSchema {
                name: other.to_string(),
            }),
        }
    }

    /// Names of all built-in presets
    pub fn preset_names() -> &'static [&'static str] {
        &["strava-api", "strava-csv", "spreadsheet"]
    }

    /// Columns that must be present in the source header
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required = vec![self.timestamp_column.as_str(), self.distance_column.as_str()];
        if let Some(pace) = &self.pace {
            required.push(pace.column.as_str());
        }
        required
    }

    /// Stable text describing this schema, mixed into the feed cache key so
    /// reloading the same file under a different mapping is a cache miss.
    pub fn fingerprint(&self) -> String {
        let mut parts = vec![self.name.clone(), self.timestamp_column.clone()];
        parts.push(self.distance_column.clone());
        parts.push(format!("{:?}/{:?}", self.distance_unit, self.duration_unit));
        for column in [
            &self.id_column,
            &self.name_column,
            &self.sport_column,
            &self.moving_time_column,
            &self.elapsed_time_column,
            &self.elevation_column,
            &self.speed_column,
            &self.avg_hr_column,
            &self.max_hr_column,
            &self.suffer_score_column,
        ]
        .into_iter()
        .flatten()
        {
            parts.push(column.clone());
        }
        if let Some(pace) = &self.pace {
            parts.push(format!("{}:{:?}", pace.column, pace.encoding));
        }
        parts.join("|")
    }
}

/// Normalize a header cell for schema matching
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}
