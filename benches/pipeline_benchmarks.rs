use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

use rundash::feed::{FeedLoader, FeedSchema, LoadReport};
use rundash::metrics::{ComparisonCalculator, FatigueEstimator, HeatmapGrid};
use rundash::models::{Activity, ActivityFeed, Sport};
use rundash::session::{AnalysisSession, UserControls};

/// Performance benchmarks for the analysis pipeline
///
/// These benchmarks cover feed loading and the dashboard derivations
/// with varying feed sizes to ensure scalability.

fn bench_feed_loading(c: &mut Criterion) {
    let loader = FeedLoader::new(FeedSchema::spreadsheet());
    let floor = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

    let mut group = c.benchmark_group("Feed Loading");

    for &rows in &[100, 1000, 5000] {
        let source = write_benchmark_source(rows);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("load_path", rows), &source, |b, source| {
            b.iter(|| {
                let _ = loader.load_path(black_box(source.path()), floor);
            });
        });
    }

    group.finish();
}

fn bench_window_comparison(c: &mut Criterion) {
    let calculator = ComparisonCalculator::new();
    let mut group = c.benchmark_group("Window Comparison");

    for &size in &[30, 365, 2000] {
        let feed = create_benchmark_feed(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compare", size), &feed, |b, feed| {
            b.iter(|| {
                let _ = calculator.compare(black_box(feed));
            });
        });
    }

    group.finish();
}

fn bench_fatigue_estimation(c: &mut Criterion) {
    let estimator = FatigueEstimator::new();
    let mut group = c.benchmark_group("Fatigue Estimation");

    for &size in &[30, 365, 2000] {
        let feed = create_benchmark_feed(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("score", size), &feed, |b, feed| {
            b.iter(|| {
                let _ = estimator.score(black_box(feed));
            });
        });
    }

    group.finish();
}

fn bench_heatmap(c: &mut Criterion) {
    let feed = create_benchmark_feed(365);
    let year = feed.latest_time().map(|t| t.date().year()).unwrap_or(2024);

    c.bench_function("heatmap_for_year", |b| {
        b.iter(|| {
            let _ = HeatmapGrid::for_year(black_box(&feed), year);
        });
    });
}

fn bench_dashboard_assembly(c: &mut Criterion) {
    let session = AnalysisSession::new(
        FeedSchema::spreadsheet(),
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
    );
    let controls = UserControls::default();
    let mut group = c.benchmark_group("Dashboard Assembly");

    for &size in &[365, 2000] {
        let feed = create_benchmark_feed(size);
        let report = LoadReport {
            rows_seen: size,
            rows_loaded: size,
            ..LoadReport::default()
        };

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("assemble", size), &feed, |b, feed| {
            b.iter(|| {
                let _ = session.assemble(feed.clone(), report.clone(), &controls);
            });
        });
    }

    group.finish();
}

/// Synthetic daily training feed with mildly varying load
fn create_benchmark_feed(size: usize) -> ActivityFeed {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap();

    let activities = (0..size)
        .map(|i| {
            let pace = dec!(5.2) + Decimal::from(i as u64 % 10) * dec!(0.05);
            let distance = dec!(8) + Decimal::from(i as u64 % 7);
            Activity {
                id: format!("bench_{}", i),
                name: None,
                start_time: start + Duration::days(i as i64),
                sport: Sport::Run,
                distance_km: distance,
                moving_time_seconds: Some(2400 + (i as u32 % 5) * 300),
                elapsed_time_seconds: None,
                elevation_gain: Some(Decimal::from(i as u64 % 120)),
                avg_speed: None,
                avg_heart_rate: Some(dec!(140) + Decimal::from(i as u64 % 20)),
                max_heart_rate: Some(dec!(158) + Decimal::from(i as u64 % 25)),
                pace: Some(pace),
                suffer_score: None,
            }
        })
        .collect();

    ActivityFeed::from_activities(activities)
}

fn write_benchmark_source(rows: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,date,distance,time,pace,heartrate,elevgain").unwrap();

    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    for i in 0..rows {
        let date = start + Duration::days(i as i64);
        writeln!(
            file,
            "{},{},{},{},{}:{:02},{},{}",
            i,
            date.format("%Y-%m-%d"),
            8 + i % 7,
            40 + i % 30,
            5,
            10 + i % 40,
            140 + i % 20,
            i % 120,
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

criterion_group!(
    benches,
    bench_feed_loading,
    bench_window_comparison,
    bench_fatigue_estimation,
    bench_heatmap,
    bench_dashboard_assembly
);
criterion_main!(benches);
