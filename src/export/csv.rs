use std::io::Write;
use std::path::Path;

use super::ExportError;
use crate::metrics::fatigue::WeeklyLoad;
use crate::metrics::monthly::MonthlySummary;
use crate::models::ActivityFeed;
use crate::pace;

fn create_file<P: AsRef<Path>>(path: P) -> Result<std::fs::File, ExportError> {
    std::fs::File::create(&path).map_err(|e| ExportError::WriteFailed {
        path: path.as_ref().to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_error<P: AsRef<Path>>(path: P) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.as_ref().to_path_buf();
    move |e| ExportError::WriteFailed {
        path,
        reason: e.to_string(),
    }
}

/// Export the feed's activities to CSV
pub fn export_activities<P: AsRef<Path>>(
    feed: &ActivityFeed,
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = create_file(&output_path)?;
    let fail = write_error(&output_path);

    (|| -> std::io::Result<()> {
        writeln!(
            file,
            "Date,Name,Sport,Distance_KM,Moving_Time_S,Elapsed_Time_S,Elevation_Gain_M,Avg_Speed_MS,Avg_HR,Max_HR,Pace_Min_Per_KM,Suffer_Score"
        )?;

        for activity in feed.iter() {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                activity.start_time.format("%Y-%m-%d %H:%M:%S"),
                activity
                    .name
                    .as_ref()
                    .map_or(String::new(), |n| format!("\"{}\"", n.replace('"', "\"\""))),
                activity.sport,
                activity.distance_km,
                activity
                    .moving_time_seconds
                    .map_or(String::new(), |v| v.to_string()),
                activity
                    .elapsed_time_seconds
                    .map_or(String::new(), |v| v.to_string()),
                activity
                    .elevation_gain
                    .map_or(String::new(), |v| v.to_string()),
                activity.avg_speed.map_or(String::new(), |v| v.to_string()),
                activity
                    .avg_heart_rate
                    .map_or(String::new(), |v| v.to_string()),
                activity
                    .max_heart_rate
                    .map_or(String::new(), |v| v.to_string()),
                pace::format_pace(activity.pace),
                activity
                    .suffer_score
                    .map_or(String::new(), |v| v.to_string()),
            )?;
        }
        Ok(())
    })()
    .map_err(fail)
}

/// Export the weekly load table to CSV
pub fn export_weekly_loads<P: AsRef<Path>>(
    loads: &[WeeklyLoad],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = create_file(&output_path)?;
    let fail = write_error(&output_path);

    (|| -> std::io::Result<()> {
        writeln!(
            file,
            "Week_Start,Runs,Volume_KM,Intensity_BPM,Mean_HRPR,Mean_Gap_Days"
        )?;

        for load in loads {
            writeln!(
                file,
                "{},{},{:.3},{},{},{}",
                load.week_start.format("%Y-%m-%d"),
                load.runs,
                load.volume_km,
                load.intensity.map_or(String::new(), |v| format!("{:.1}", v)),
                load.mean_hrpr.map_or(String::new(), |v| format!("{:.3}", v)),
                load
                    .mean_gap_days
                    .map_or(String::new(), |v| format!("{:.2}", v)),
            )?;
        }
        Ok(())
    })()
    .map_err(fail)
}

/// Export monthly summaries to CSV
pub fn export_monthly_summaries<P: AsRef<Path>>(
    months: &[MonthlySummary],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = create_file(&output_path)?;
    let fail = write_error(&output_path);

    (|| -> std::io::Result<()> {
        writeln!(file, "Month,Runs,Total_Distance_KM,Mean_Pace_Min_Per_KM")?;

        for month in months {
            writeln!(
                file,
                "{},{},{},{}",
                month.month,
                month.runs,
                month.total_distance_km,
                month
                    .mean_pace
                    .map_or(String::new(), |v| v.round_dp(2).to_string()),
            )?;
        }
        Ok(())
    })()
    .map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    use crate::models::{Activity, Sport};

    fn test_activity(id: &str, distance_km: Decimal, pace: Option<Decimal>) -> Activity {
        Activity {
            id: id.to_string(),
            name: Some("Morning \"easy\" run".to_string()),
            start_time: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(7, 15, 0)
                .unwrap(),
            sport: Sport::Run,
            distance_km,
            moving_time_seconds: Some(1800),
            elapsed_time_seconds: None,
            elevation_gain: Some(dec!(42)),
            avg_speed: None,
            avg_heart_rate: Some(dec!(148)),
            max_heart_rate: None,
            pace,
            suffer_score: None,
        }
    }

    #[test]
    fn test_export_activities() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", dec!(7.5), Some(dec!(5.75))),
        ]);

        let temp_file = NamedTempFile::new().unwrap();
        export_activities(&feed, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("Date,Name,Sport"));
        assert!(content.contains("2024-03-05 07:15:00"));
        assert!(content.contains("\"Morning \"\"easy\"\" run\""));
        assert!(content.contains(",7.5,"));
        assert!(content.contains(",5.75,"));
    }

    #[test]
    fn test_undefined_pace_exports_as_inf() {
        let feed = ActivityFeed::from_activities(vec![test_activity("a", dec!(2.0), None)]);

        let temp_file = NamedTempFile::new().unwrap();
        export_activities(&feed, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains(",inf,"));
    }

    #[test]
    fn test_export_weekly_loads() {
        let loads = vec![WeeklyLoad {
            week_start: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            runs: 3,
            volume_km: 25.5,
            intensity: Some(165.0),
            mean_hrpr: None,
            mean_gap_days: Some(2.33),
        }];

        let temp_file = NamedTempFile::new().unwrap();
        export_weekly_loads(&loads, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Week_Start,Runs"));
        assert!(content.contains("2024-01-08,3,25.500,165.0,,2.33"));
    }

    #[test]
    fn test_export_monthly_summaries() {
        let months = vec![MonthlySummary {
            month: "2024-01".to_string(),
            runs: 9,
            total_distance_km: dec!(81.4),
            mean_pace: Some(dec!(5.847)),
            pace_quartiles: None,
        }];

        let temp_file = NamedTempFile::new().unwrap();
        export_monthly_summaries(&months, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("2024-01,9,81.4,5.85"));
    }
}
