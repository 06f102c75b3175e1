//! Dashboard session: memoized loading plus metric assembly
//!
//! An [`AnalysisSession`] owns the loader and the feed cache for one
//! sitting. Repeated dashboard builds against the same source reuse the
//! cached feed; only the cheap derivations rerun when the user moves a
//! threshold. All work happens on the caller's thread.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::feed::{FeedCache, FeedLoader, FeedSchema, LoadReport, SourceKey};
use crate::filter::{clip_recent_months, Thresholds};
use crate::metrics::{
    comparison::{ComparisonCalculator, ComparisonReport},
    efficiency::{EfficiencyConfig, EfficiencyEstimator, EfficiencyReport},
    fatigue::{FatigueConfig, FatigueEstimator, FatigueScore, WeeklyLoad},
    heatmap::HeatmapGrid,
    monthly::{feed_statistics, monthly_summaries, FeedStatistics, MonthlySummary},
    series::{series, MetricKind, MetricSeries},
};
use crate::models::ActivityFeed;

/// Knobs the dashboard user can move between rebuilds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserControls {
    pub thresholds: Thresholds,
    /// Window for the per-metric time series, in months back from the
    /// feed's latest activity
    pub months_back: u32,
    /// Metrics to extract as time series
    pub metrics: Vec<MetricKind>,
    /// Calendar year for the heatmap; `None` charts the feed's latest year
    pub heatmap_year: Option<i32>,
}

impl Default for UserControls {
    fn default() -> Self {
        UserControls {
            thresholds: Thresholds::default(),
            months_back: 6,
            metrics: vec![MetricKind::Distance],
            heatmap_year: None,
        }
    }
}

/// Everything one dashboard render needs, as plain data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub load_report: LoadReport,
    /// Feed after cleaning, before thresholds
    pub feed: ActivityFeed,
    /// Feed after the user's thresholds
    pub filtered: ActivityFeed,
    pub comparison: ComparisonReport,
    /// Weekly load table over the unfiltered feed
    pub weekly_loads: Vec<WeeklyLoad>,
    /// `None` when the feed cannot support a score yet
    pub fatigue: Option<FatigueScore>,
    pub efficiency: EfficiencyReport,
    /// Calendar heatmap over the raw feed, latest year unless overridden
    pub heatmap: Option<HeatmapGrid>,
    pub monthly: Vec<MonthlySummary>,
    pub statistics: FeedStatistics,
    /// Selected metrics over the recent-months window
    pub series: Vec<MetricSeries>,
}

impl Dashboard {
    /// The filtered feed, handed off as-is for ad-hoc querying
    pub fn query_table(&self) -> &ActivityFeed {
        &self.filtered
    }
}

pub struct AnalysisSession {
    loader: FeedLoader,
    cache: FeedCache,
    date_floor: NaiveDate,
    comparison: ComparisonCalculator,
    efficiency: EfficiencyEstimator,
    fatigue: FatigueEstimator,
}

impl AnalysisSession {
    pub fn new(schema: FeedSchema, date_floor: NaiveDate) -> Self {
        Self::with_tuning(
            schema,
            date_floor,
            EfficiencyConfig::default(),
            FatigueConfig::default(),
        )
    }

    pub fn with_tuning(
        schema: FeedSchema,
        date_floor: NaiveDate,
        efficiency: EfficiencyConfig,
        fatigue: FatigueConfig,
    ) -> Self {
        Self {
            loader: FeedLoader::new(schema),
            cache: FeedCache::new(),
            date_floor,
            comparison: ComparisonCalculator::new(),
            efficiency: EfficiencyEstimator::with_config(efficiency),
            fatigue: FatigueEstimator::with_config(fatigue),
        }
    }

    /// Load a source through the session cache.
    ///
    /// The cache key covers the file's content, so editing the file and
    /// loading again parses fresh rather than serving the stale feed.
    pub fn load(&mut self, path: &Path) -> Result<(ActivityFeed, LoadReport)> {
        let key = SourceKey::for_file(path, self.loader.schema())?;
        if let Some(cached) = self.cache.get(&key) {
            return Ok((cached.feed.clone(), cached.report.clone()));
        }

        let (feed, report) = self.loader.load_path(path, self.date_floor)?;
        self.cache.put(key, feed.clone(), report.clone());
        Ok((feed, report))
    }

    /// Build the full dashboard for a source under the given controls
    pub fn dashboard(&mut self, path: &Path, controls: &UserControls) -> Result<Dashboard> {
        let (feed, report) = self.load(path)?;
        Ok(self.assemble(feed, report, controls))
    }

    /// Derive every dashboard view from an already-loaded feed.
    ///
    /// The heatmap and the fatigue estimate see the unfiltered feed, the
    /// latter because fatigue modeling deliberately counts every effort.
    /// Everything else works on the thresholded feed, and the metric
    /// series are additionally clipped to the recent-months window.
    pub fn assemble(
        &self,
        feed: ActivityFeed,
        load_report: LoadReport,
        controls: &UserControls,
    ) -> Dashboard {
        let heatmap = match controls.heatmap_year {
            Some(year) => Some(HeatmapGrid::for_year(&feed, year)),
            None => HeatmapGrid::latest(&feed),
        };
        let filtered = controls.thresholds.apply(&feed);
        info!(
            total = feed.len(),
            kept = filtered.len(),
            "applied thresholds"
        );

        let comparison = self.comparison.compare(&filtered);
        let weekly_loads = self.fatigue.weekly_loads(&feed);
        let fatigue = match self.fatigue.score(&feed) {
            Ok(score) => Some(score),
            Err(e) => {
                debug!("fatigue score unavailable: {}", e);
                None
            }
        };
        let efficiency = self.efficiency.estimate(&filtered);
        let monthly = monthly_summaries(&filtered);
        let statistics = feed_statistics(&filtered);

        let clipped = clip_recent_months(&filtered, controls.months_back);
        let series = controls
            .metrics
            .iter()
            .map(|metric| series(&clipped, *metric))
            .collect();

        Dashboard {
            load_report,
            feed,
            filtered,
            comparison,
            weekly_loads,
            fatigue,
            efficiency,
            heatmap,
            monthly,
            statistics,
            series,
        }
    }

    pub fn cache_metrics(&self) -> &crate::feed::CacheMetrics {
        self.cache.metrics()
    }

    /// Drop a source's cached feed, forcing the next load to parse
    pub fn invalidate_source(&mut self, path: &Path) -> Result<()> {
        let key = SourceKey::for_file(path, self.loader.schema())?;
        self.cache.invalidate(&key);
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    use crate::feed::FeedSchema;
    use crate::models::{Activity, Sport};

    fn floor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    fn write_source(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,date,distance,time,pace,heartrate,elevgain").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn test_activity(id: &str, date: (i32, u32, u32), distance_km: Decimal, pace: Option<Decimal>) -> Activity {
        Activity {
            id: id.to_string(),
            name: None,
            start_time: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
            sport: Sport::Run,
            distance_km,
            moving_time_seconds: Some(1800),
            elapsed_time_seconds: None,
            elevation_gain: Some(dec!(20)),
            avg_speed: None,
            avg_heart_rate: Some(dec!(150)),
            max_heart_rate: Some(dec!(168)),
            pace,
            suffer_score: None,
        }
    }

    #[test]
    fn test_second_load_hits_the_cache() {
        let file = write_source(&[
            "1,2024-03-01,5.0,30.0,6:00,140,12",
            "2,2024-03-08,10.0,55.0,5:30,150,30",
        ]);

        let mut session = AnalysisSession::new(FeedSchema::spreadsheet(), floor());
        let (first, report) = session.load(file.path()).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(report.rows_loaded, 2);

        let (second, _) = session.load(file.path()).unwrap();
        assert_eq!(first, second);

        let metrics = session.cache_metrics();
        assert_eq!(metrics.lookups, 2);
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
    }

    #[test]
    fn test_invalidation_forces_reparse() {
        let file = write_source(&["1,2024-03-01,5.0,30.0,6:00,140,12"]);

        let mut session = AnalysisSession::new(FeedSchema::spreadsheet(), floor());
        session.load(file.path()).unwrap();
        session.invalidate_source(file.path()).unwrap();
        session.load(file.path()).unwrap();

        let metrics = session.cache_metrics();
        assert_eq!(metrics.hits, 0);
        assert_eq!(metrics.misses, 2);
        assert_eq!(metrics.invalidations, 1);
    }

    #[test]
    fn test_dashboard_views_use_the_right_feeds() {
        let session = AnalysisSession::new(FeedSchema::spreadsheet(), floor());

        // One run fails the default 7 min/km ceiling
        let feed = ActivityFeed::from_activities(vec![
            test_activity("keep_a", (2024, 1, 1), dec!(5.0), Some(dec!(6.0))),
            test_activity("slow", (2024, 1, 3), dec!(8.0), Some(dec!(8.5))),
            test_activity("keep_b", (2024, 1, 8), dec!(10.0), Some(dec!(5.5))),
        ]);

        let dashboard = session.assemble(feed, LoadReport::default(), &UserControls::default());

        assert_eq!(dashboard.feed.len(), 3);
        assert_eq!(dashboard.filtered.len(), 2);
        assert_eq!(dashboard.query_table().len(), 2);
        assert_eq!(dashboard.comparison.all_time.count, 2);
        assert_eq!(dashboard.statistics.runs, 2);

        // Heatmap is built from the unfiltered feed
        let grid = dashboard.heatmap.unwrap();
        let total: Decimal = grid.distances.iter().flatten().copied().sum();
        assert_eq!(total, dec!(23.0));

        // Weekly loads count every effort, including the filtered-out run
        assert_eq!(dashboard.weekly_loads.len(), 2);
        assert!((dashboard.weekly_loads[0].volume_km - 13.0).abs() < 1e-9);

        assert_eq!(dashboard.series.len(), 1);
        assert_eq!(dashboard.series[0].metric, MetricKind::Distance);
        assert_eq!(dashboard.series[0].points.len(), 2);
    }

    #[test]
    fn test_heatmap_year_override() {
        let session = AnalysisSession::new(FeedSchema::spreadsheet(), floor());
        let feed = ActivityFeed::from_activities(vec![
            test_activity("old", (2023, 5, 1), dec!(5.0), Some(dec!(6.0))),
            test_activity("new", (2024, 5, 1), dec!(5.0), Some(dec!(6.0))),
        ]);

        let controls = UserControls {
            heatmap_year: Some(2023),
            ..UserControls::default()
        };
        let dashboard = session.assemble(feed, LoadReport::default(), &controls);
        assert_eq!(dashboard.heatmap.unwrap().year, 2023);
    }

    #[test]
    fn test_dashboard_survives_insufficient_fatigue_data() {
        let session = AnalysisSession::new(FeedSchema::spreadsheet(), floor());
        let feed = ActivityFeed::from_activities(vec![test_activity(
            "only",
            (2024, 1, 1),
            dec!(5.0),
            Some(dec!(6.0)),
        )]);

        let dashboard = session.assemble(feed, LoadReport::default(), &UserControls::default());
        assert!(dashboard.fatigue.is_none());
        assert_eq!(dashboard.weekly_loads.len(), 1);
        assert_eq!(dashboard.comparison.all_time.count, 1);
    }

    #[test]
    fn test_empty_feed_dashboard_is_valid() {
        let session = AnalysisSession::new(FeedSchema::spreadsheet(), floor());
        let dashboard = session.assemble(
            ActivityFeed::empty(),
            LoadReport::default(),
            &UserControls::default(),
        );

        assert!(dashboard.heatmap.is_none());
        assert!(dashboard.fatigue.is_none());
        assert_eq!(dashboard.comparison.all_time.count, 0);
        assert!(dashboard.monthly.is_empty());
        assert!(dashboard.efficiency.points.is_empty());
    }
}
