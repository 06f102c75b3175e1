//! Terminal rendering of dashboard views
//!
//! Every renderer returns a plain `String`; the CLI decides where it
//! goes. Colored verdict lines stay outside the tables so the column
//! widths are never thrown off by escape codes.

use colored::Colorize;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::feed::LoadReport;
use crate::metrics::comparison::{ComparisonMetric, ComparisonReport, WindowSummary};
use crate::metrics::efficiency::EfficiencyReport;
use crate::metrics::fatigue::{FatigueBand, FatigueScore, WeeklyLoad};
use crate::metrics::heatmap::{HeatmapGrid, HEATMAP_ROWS, HEATMAP_WEEKS};
use crate::metrics::monthly::{FeedStatistics, MonthlySummary};
use crate::metrics::series::MetricSeries;
use crate::models::ActivityFeed;
use crate::pace;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const HEATMAP_SHADES: [char; 5] = ['·', '░', '▒', '▓', '█'];
const GAUGE_WIDTH: usize = 20;

fn opt_decimal(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(2).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{}", value.round_dp(2))
    } else {
        value.round_dp(2).to_string()
    }
}

/// One line summarizing what the loader kept and dropped
pub fn render_load_report(report: &LoadReport) -> String {
    let mut line = format!(
        "Loaded {} of {} rows",
        report.rows_loaded, report.rows_seen
    );
    if report.dropped_total() > 0 {
        line.push_str(&format!(
            " ({} malformed, {} other sport, {} before floor, {} duplicate)",
            report.dropped_malformed,
            report.dropped_other_sport,
            report.dropped_before_floor,
            report.dropped_duplicate
        ));
    }
    line
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "All time")]
    all_time: String,
    #[tabled(rename = "Last 30 days")]
    recent: String,
    #[tabled(rename = "Prior 30 days")]
    prior: String,
    #[tabled(rename = "Change")]
    delta: String,
}

/// Comparison table plus colored improvement verdicts
pub fn render_comparison(report: &ComparisonReport) -> String {
    let all_time = report.all_time.rounded();
    let recent = report.recent.rounded();
    let prior = report.prior.rounded();
    let deltas = report.deltas.rounded();

    let rows = vec![
        ComparisonRow {
            metric: "Runs".to_string(),
            all_time: all_time.count.to_string(),
            recent: recent.count.to_string(),
            prior: prior.count.to_string(),
            delta: if deltas.count >= 0 {
                format!("+{}", deltas.count)
            } else {
                deltas.count.to_string()
            },
        },
        ComparisonRow {
            metric: "Distance (km)".to_string(),
            all_time: all_time.total_distance_km.to_string(),
            recent: recent.total_distance_km.to_string(),
            prior: prior.total_distance_km.to_string(),
            delta: signed(deltas.total_distance_km),
        },
        ComparisonRow {
            metric: "Avg pace (min/km)".to_string(),
            all_time: opt_decimal(all_time.mean_pace),
            recent: opt_decimal(recent.mean_pace),
            prior: opt_decimal(prior.mean_pace),
            delta: deltas.mean_pace.map(signed).unwrap_or_else(|| "-".to_string()),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let mut out = table.to_string();
    out.push('\n');
    out.push_str(&pace_verdict(&deltas.mean_pace));
    out
}

fn pace_verdict(delta: &Option<Decimal>) -> String {
    match delta {
        Some(d) if ComparisonMetric::MeanPace.is_improvement(*d) => {
            format!("{}", format!("✓ Pace improved by {} min/km", d.abs().round_dp(2)).green())
        }
        Some(d) if *d > Decimal::ZERO => {
            format!("{}", format!("✗ Pace slowed by {} min/km", d.round_dp(2)).red())
        }
        Some(_) => "Pace unchanged".to_string(),
        None => "Pace change unavailable".to_string(),
    }
}

pub fn render_window_summary(label: &str, summary: &WindowSummary) -> String {
    let rounded = summary.rounded();
    format!(
        "{}: {} runs, {} km, avg pace {}",
        label,
        rounded.count,
        rounded.total_distance_km,
        rounded
            .mean_pace
            .map(pace::format_min_sec)
            .unwrap_or_else(|| "-".to_string())
    )
}

#[derive(Tabled)]
struct WeeklyRow {
    #[tabled(rename = "Week of")]
    week: String,
    #[tabled(rename = "Runs")]
    runs: usize,
    #[tabled(rename = "Volume (km)")]
    volume: String,
    #[tabled(rename = "Intensity (bpm)")]
    intensity: String,
    #[tabled(rename = "HR/pace")]
    hrpr: String,
    #[tabled(rename = "Mean gap (d)")]
    gap: String,
}

fn opt_f64(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_weekly_loads(loads: &[WeeklyLoad]) -> String {
    let rows: Vec<WeeklyRow> = loads
        .iter()
        .map(|load| WeeklyRow {
            week: load.week_start.format("%Y-%m-%d").to_string(),
            runs: load.runs,
            volume: format!("{:.1}", load.volume_km),
            intensity: opt_f64(load.intensity, 0),
            hrpr: opt_f64(load.mean_hrpr, 1),
            gap: opt_f64(load.mean_gap_days, 1),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Two-segment fatigue gauge with the band verdict
pub fn render_fatigue_gauge(score: &FatigueScore) -> String {
    let filled = ((score.score / 100.0) * GAUGE_WIDTH as f64).round() as usize;
    let filled = filled.min(GAUGE_WIDTH);
    let gauge = format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(GAUGE_WIDTH - filled)
    );

    let verdict = format!("{} ({})", score.band, score.band.description());
    let colored_verdict = match score.band {
        FatigueBand::Safe => verdict.green(),
        FatigueBand::Caution => verdict.yellow(),
        FatigueBand::HighRisk => verdict.red(),
    };

    format!(
        "Week of {}  {} fatigue {:.1}%, headroom {:.1}%\n{}",
        score.week_start.format("%Y-%m-%d"),
        gauge,
        score.score,
        score.headroom,
        colored_verdict
    )
}

#[derive(Tabled)]
struct EfficiencyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Adj speed (m/s)")]
    speed: String,
    #[tabled(rename = "Adj HR (bpm)")]
    heart_rate: String,
    #[tabled(rename = "Efficiency")]
    efficiency: String,
}

pub fn render_efficiency(report: &EfficiencyReport) -> String {
    if report.points.is_empty() {
        return "No activities carry the fields needed for efficiency (distance, elevation, moving time, heart rate)".to_string();
    }

    let rows: Vec<EfficiencyRow> = report
        .points
        .iter()
        .map(|p| EfficiencyRow {
            date: p.start_time.format("%Y-%m-%d").to_string(),
            speed: format!("{:.2}", p.adjusted_speed),
            heart_rate: format!("{:.1}", p.adjusted_heart_rate),
            efficiency: format!("{:.4}", p.efficiency),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let mut out = table.to_string();
    out.push('\n');
    match &report.trend {
        Some(trend) => {
            // Slope is per second of activity time
            let per_week = trend.slope * 7.0 * 86_400.0;
            let line = format!("Trend: {:+.5} per week", per_week);
            if per_week > 0.0 {
                out.push_str(&format!("{}", line.green()));
            } else {
                out.push_str(&line);
            }
        }
        None => out.push_str("Trend: insufficient data"),
    }
    out
}

#[derive(Tabled)]
struct MonthlyRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Runs")]
    runs: usize,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Avg pace")]
    pace: String,
    #[tabled(rename = "Pace range")]
    range: String,
}

pub fn render_monthly(months: &[MonthlySummary]) -> String {
    let rows: Vec<MonthlyRow> = months
        .iter()
        .map(|m| MonthlyRow {
            month: m.month.clone(),
            runs: m.runs,
            distance: m.total_distance_km.round_dp(2).to_string(),
            pace: m
                .mean_pace
                .map(pace::format_min_sec)
                .unwrap_or_else(|| "-".to_string()),
            range: m
                .pace_quartiles
                .as_ref()
                .map(|q| format!("{:.2}..{:.2}", q.min, q.max))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn render_statistics(stats: &FeedStatistics) -> String {
    let best = stats
        .best_pace
        .map(pace::format_min_sec)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Runs: {}\nTotal distance: {} km\nAvg heart rate: {} bpm\nBest pace: {}\nTotal climb: {} m",
        stats.runs,
        stats.total_distance_km.round_dp(2),
        opt_decimal(stats.mean_heart_rate),
        best,
        stats.total_elevation_gain.round_dp(0),
    )
}

/// Shaded year grid, one row per weekday
pub fn render_heatmap(grid: &HeatmapGrid) -> String {
    let max = grid.max_distance();
    let mut out = format!("{}\n", grid.year);

    for row in 0..HEATMAP_ROWS {
        let mut line = format!("{} ", WEEKDAY_LABELS[row]);
        for col in 0..HEATMAP_WEEKS {
            if !grid.has_activity(row, col) {
                line.push(' ');
                continue;
            }
            let distance = grid.distances[row][col];
            if max.is_zero() || distance.is_zero() {
                line.push(HEATMAP_SHADES[0]);
            } else {
                let ratio = (distance / max).to_f64().unwrap_or(0.0);
                let bucket = ((ratio * 4.0).ceil() as usize).clamp(1, 4);
                line.push(HEATMAP_SHADES[bucket]);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[derive(Tabled)]
struct SeriesRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "First")]
    first: String,
    #[tabled(rename = "Last")]
    last: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
}

pub fn render_series(series: &[MetricSeries]) -> String {
    let rows: Vec<SeriesRow> = series
        .iter()
        .map(|s| {
            let values: Vec<f64> = s.points.iter().map(|p| p.value).collect();
            let fmt = |v: Option<f64>| {
                v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
            };
            SeriesRow {
                metric: s.metric.label().to_string(),
                points: s.points.len(),
                first: fmt(values.first().copied()),
                last: fmt(values.last().copied()),
                min: fmt(values.iter().copied().reduce(f64::min)),
                max: fmt(values.iter().copied().reduce(f64::max)),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "km")]
    distance: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "HR")]
    heart_rate: String,
}

/// Most recent activities of a feed, newest last
pub fn render_recent_activities(feed: &ActivityFeed, limit: usize) -> String {
    let skip = feed.len().saturating_sub(limit);
    let rows: Vec<ActivityRow> = feed
        .iter()
        .skip(skip)
        .map(|a| ActivityRow {
            date: a.start_time.format("%Y-%m-%d").to_string(),
            name: a.name.clone().unwrap_or_else(|| "-".to_string()),
            distance: a.distance_km.round_dp(2).to_string(),
            pace: pace::format_pace(a.pace),
            heart_rate: opt_decimal(a.avg_heart_rate),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::metrics::comparison::ComparisonCalculator;
    use crate::metrics::fatigue::FatigueBand;
    use crate::models::{Activity, Sport};

    fn test_activity(id: &str, date: (i32, u32, u32), distance_km: Decimal, pace: Option<Decimal>) -> Activity {
        Activity {
            id: id.to_string(),
            name: Some(format!("Run {}", id)),
            start_time: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            sport: Sport::Run,
            distance_km,
            moving_time_seconds: Some(1800),
            elapsed_time_seconds: None,
            elevation_gain: None,
            avg_speed: None,
            avg_heart_rate: Some(dec!(145)),
            max_heart_rate: None,
            pace,
            suffer_score: None,
        }
    }

    #[test]
    fn test_load_report_line() {
        let mut report = LoadReport::default();
        report.rows_seen = 10;
        report.rows_loaded = 7;
        report.dropped_malformed = 1;
        report.dropped_other_sport = 2;

        let line = render_load_report(&report);
        assert!(line.contains("7 of 10"));
        assert!(line.contains("1 malformed"));
        assert!(line.contains("2 other sport"));

        let clean = LoadReport {
            rows_seen: 3,
            rows_loaded: 3,
            ..LoadReport::default()
        };
        assert!(!render_load_report(&clean).contains("malformed"));
    }

    #[test]
    fn test_comparison_table_contains_windows() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 3, 10), dec!(10.0), Some(dec!(5.5))),
            test_activity("b", (2024, 3, 31), dec!(6.0), Some(dec!(5.0))),
        ]);
        let report = ComparisonCalculator::new().compare(&feed);

        let rendered = render_comparison(&report);
        assert!(rendered.contains("Runs"));
        assert!(rendered.contains("Distance (km)"));
        assert!(rendered.contains("Avg pace (min/km)"));
        assert!(rendered.contains("16"));
    }

    #[test]
    fn test_fatigue_gauge_shape() {
        let score = FatigueScore {
            week_start: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            score: 75.0,
            headroom: 25.0,
            adjustment: 0.65,
            band: FatigueBand::HighRisk,
        };

        let gauge = render_fatigue_gauge(&score);
        assert!(gauge.contains("75.0%"));
        assert!(gauge.contains("25.0%"));
        assert!(gauge.contains("2024-01-08"));
        // 75% of a 20-char gauge is 15 filled cells
        assert!(gauge.contains(&"█".repeat(15)));
        assert!(!gauge.contains(&"█".repeat(16)));
    }

    #[test]
    fn test_heatmap_render_marks_active_days() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 1, 1), dec!(10.0), Some(dec!(5.5))),
            test_activity("b", (2024, 1, 2), dec!(5.0), Some(dec!(6.0))),
        ]);
        let grid = HeatmapGrid::for_year(&feed, 2024);

        let rendered = render_heatmap(&grid);
        assert!(rendered.starts_with("2024"));
        assert!(rendered.contains("Mon █"));
        // Half the max distance lands in the second shade bucket
        assert!(rendered.contains("Tue ▒"));
        assert!(rendered.contains("Sun"));
    }

    #[test]
    fn test_statistics_render() {
        let feed = ActivityFeed::from_activities(vec![test_activity(
            "a",
            (2024, 1, 1),
            dec!(12.3),
            Some(dec!(5.5)),
        )]);
        let stats = crate::metrics::monthly::feed_statistics(&feed);

        let rendered = render_statistics(&stats);
        assert!(rendered.contains("Runs: 1"));
        assert!(rendered.contains("12.3 km"));
        assert!(rendered.contains("5:30"));
    }

    #[test]
    fn test_recent_activities_limit() {
        let feed = ActivityFeed::from_activities(vec![
            test_activity("a", (2024, 1, 1), dec!(5.0), Some(dec!(6.0))),
            test_activity("b", (2024, 1, 2), dec!(6.0), Some(dec!(6.0))),
            test_activity("c", (2024, 1, 3), dec!(7.0), None),
        ]);

        let rendered = render_recent_activities(&feed, 2);
        assert!(!rendered.contains("2024-01-01"));
        assert!(rendered.contains("2024-01-02"));
        assert!(rendered.contains("2024-01-03"));
        // Undefined pace renders as inf, not a blank
        assert!(rendered.contains("inf"));
    }
}
