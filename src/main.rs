use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use rundash::config::AppConfig;
use rundash::display;
use rundash::export::{self, ExportFormat};
use rundash::feed::{FeedSchema, LoadReport};
use rundash::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use rundash::metrics::{
    self, ComparisonCalculator, EfficiencyEstimator, FatigueEstimator, HeatmapGrid, MetricKind,
    MetricSeries,
};
use rundash::models::ActivityFeed;
use rundash::session::AnalysisSession;

/// rundash - Running Analytics Dashboard
///
/// A terminal dashboard over a personal running feed: pace trends,
/// 30-day comparisons, fatigue load, and consistency heatmaps.
#[derive(Parser)]
#[command(name = "rundash")]
#[command(version = "0.1.0")]
#[command(about = "Running analytics dashboard", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed export to analyze (overrides the configured source)
    #[arg(short, long, value_name = "FILE")]
    source: Option<PathBuf>,

    /// Column schema preset for the feed file (strava-api, strava-csv, spreadsheet)
    #[arg(long, value_name = "NAME")]
    schema: Option<String>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<String>,

    /// Write logs to this file as well
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the full dashboard
    Dashboard {
        /// Number of recent activities to list
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Heatmap year (latest year in the feed if omitted)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Compare the latest 30 days against the 30 days before
    Compare,

    /// Show weekly training loads and the fatigue gauge
    Fatigue,

    /// Estimate the heart-rate efficiency trend
    Efficiency,

    /// Draw a calendar heatmap of daily distance
    Heatmap {
        /// Calendar year to draw (latest year in the feed if omitted)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Summarize mileage and pace month by month
    Monthly,

    /// Show whole-feed statistics and metric series
    Stats {
        /// Metrics to chart (repeatable; configured metrics if omitted)
        #[arg(short, long = "metric", value_name = "NAME")]
        metrics: Vec<String>,
    },

    /// Export the dashboard or the cleaned feed
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json)
        #[arg(short = 'f', long, default_value = "json")]
        format: String,
    },

    /// Manage application settings
    Config {
        /// Write a default config file to the standard location
        #[arg(long)]
        init: bool,

        /// Print the standard config file path
        #[arg(long)]
        path: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&log_config(&cli)?).context("failed to initialize logging")?;

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    match &cli.command {
        Commands::Dashboard { limit, year } => {
            println!("{}", "Building running dashboard...".green().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let mut controls = config.controls()?;
            controls.heatmap_year = *year;
            let source = resolve_source(&cli, &config)?;
            let dashboard = session.dashboard(&source, &controls)?;

            println!();
            println!("{}", display::render_load_report(&dashboard.load_report));
            println!();
            println!("{}", display::render_statistics(&dashboard.statistics));
            println!();
            println!("{}", display::render_comparison(&dashboard.comparison));
            if let Some(score) = &dashboard.fatigue {
                println!();
                println!("{}", display::render_fatigue_gauge(score));
            }
            if let Some(grid) = &dashboard.heatmap {
                println!();
                println!("{}", display::render_heatmap(grid));
            }
            if !dashboard.series.is_empty() {
                println!();
                println!("{}", display::render_series(&dashboard.series));
            }
            println!();
            println!(
                "{}",
                display::render_recent_activities(dashboard.query_table(), *limit)
            );
            println!();
            println!("{}", "✓ Dashboard ready".green());
        }

        Commands::Compare => {
            println!("{}", "Comparing 30-day windows...".blue().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;
            let (_, filtered, report) = load_cleaned(&mut session, &source, &config)?;

            println!();
            println!("{}", display::render_load_report(&report));
            println!();
            let comparison = ComparisonCalculator::new().compare(&filtered);
            println!("{}", display::render_comparison(&comparison));
            println!();
            println!("{}", "✓ Comparison complete".blue());
        }

        Commands::Fatigue => {
            println!("{}", "Estimating training fatigue...".cyan().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;
            // Fatigue modeling counts every loaded effort, not just the
            // query table, so the thresholds never apply here.
            let (feed, _) = session.load(&source)?;

            let estimator = FatigueEstimator::with_config(config.fatigue_config());
            let loads = estimator.weekly_loads(&feed);

            println!();
            println!("{}", display::render_weekly_loads(&loads));
            println!();
            match estimator.score(&feed) {
                Ok(score) => println!("{}", display::render_fatigue_gauge(&score)),
                Err(e) => println!("{}", format!("Fatigue score unavailable: {}", e).yellow()),
            }
            println!();
            println!("{}", "✓ Fatigue analysis complete".cyan());
        }

        Commands::Efficiency => {
            println!("{}", "Estimating heart-rate efficiency...".cyan().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;
            let (_, filtered, _) = load_cleaned(&mut session, &source, &config)?;

            let estimator = EfficiencyEstimator::with_config(config.efficiency_config());
            let report = estimator.estimate(&filtered);

            println!();
            println!("{}", display::render_efficiency(&report));
            println!();
            println!("{}", "✓ Efficiency analysis complete".cyan());
        }

        Commands::Heatmap { year } => {
            println!("{}", "Drawing activity heatmap...".magenta().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;
            let (feed, _) = session.load(&source)?;

            // The heatmap charts every loaded run, not just the query table.
            let grid = match year {
                Some(y) => Some(HeatmapGrid::for_year(&feed, *y)),
                None => HeatmapGrid::latest(&feed),
            };

            println!();
            match grid {
                Some(grid) => println!("{}", display::render_heatmap(&grid)),
                None => println!("{}", "No activities to chart".yellow()),
            }
            println!();
            println!("{}", "✓ Heatmap ready".magenta());
        }

        Commands::Monthly => {
            println!("{}", "Summarizing monthly mileage...".blue().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;
            let (_, filtered, _) = load_cleaned(&mut session, &source, &config)?;

            let months = metrics::monthly_summaries(&filtered);
            println!();
            println!("{}", display::render_monthly(&months));
            println!();
            println!("{}", "✓ Monthly summary complete".blue());
        }

        Commands::Stats { metrics: names } => {
            println!("{}", "Computing feed statistics...".green().bold());

            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;
            let (_, filtered, _) = load_cleaned(&mut session, &source, &config)?;

            let kinds = if names.is_empty() {
                config.controls()?.metrics
            } else {
                names
                    .iter()
                    .map(|raw| MetricKind::parse(raw))
                    .collect::<Result<Vec<_>, _>>()?
            };

            let stats = metrics::feed_statistics(&filtered);
            println!();
            println!("{}", display::render_statistics(&stats));

            let series: Vec<MetricSeries> = kinds
                .iter()
                .map(|metric| metrics::series(&filtered, *metric))
                .collect();
            if !series.is_empty() {
                println!();
                println!("{}", display::render_series(&series));
            }
            println!();
            println!("{}", "✓ Statistics complete".green());
        }

        Commands::Export { output, format } => {
            println!("{}", "Exporting analysis data...".yellow().bold());

            let format: ExportFormat = format.parse()?;
            let mut session = build_session(&config, cli.schema.as_deref())?;
            let source = resolve_source(&cli, &config)?;

            match format {
                ExportFormat::Json => {
                    let controls = config.controls()?;
                    let dashboard = session.dashboard(&source, &controls)?;
                    export::json::export_dashboard(&dashboard, output)?;
                }
                ExportFormat::Csv => {
                    let (feed, _) = session.load(&source)?;
                    export::csv::export_activities(&feed, output)?;
                }
            }

            println!("  Output: {}", output.display());
            println!("{}", "✓ Export completed successfully".yellow());
        }

        Commands::Config { init, path } => {
            if *init {
                let mut defaults = AppConfig::default();
                defaults.save_default()?;
                println!(
                    "{}",
                    format!(
                        "✓ Wrote default config to {}",
                        AppConfig::default_config_path().display()
                    )
                    .green()
                );
            } else if *path {
                println!("{}", AppConfig::default_config_path().display());
            } else {
                println!("{}", "Current settings".white().bold());
                println!(
                    "  Source:          {}",
                    config
                        .feed
                        .source
                        .as_ref()
                        .map_or("(not set)".to_string(), |p| p.display().to_string())
                );
                println!("  Schema:          {}", config.feed.schema);
                println!("  Date floor:      {}", config.feed.date_floor);
                println!("  Max pace:        {} min/km", config.analysis.max_pace);
                println!("  Min distance:    {} km", config.analysis.min_distance_km);
                println!("  Months back:     {}", config.analysis.months_back);
                println!("  Metrics:         {}", config.analysis.metrics.join(", "));
            }
        }
    }

    Ok(())
}

/// Map CLI flags onto the logging configuration
fn log_config(cli: &Cli) -> Result<LogConfig> {
    let level = match cli.verbose {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let format = match cli.log_format.as_deref() {
        Some(raw) => raw.parse::<LogFormat>().map_err(|e| anyhow!(e))?,
        None => LogFormat::Pretty,
    };

    Ok(LogConfig {
        level,
        format,
        file_path: cli.log_file.clone(),
        ..LogConfig::default()
    })
}

fn build_session(config: &AppConfig, schema_override: Option<&str>) -> Result<AnalysisSession> {
    let schema = match schema_override {
        Some(name) => FeedSchema::by_name(name)
            .with_context(|| format!("unknown schema preset '{}'", name))?,
        None => config.schema()?,
    };

    Ok(AnalysisSession::with_tuning(
        schema,
        config.feed.date_floor,
        config.efficiency_config(),
        config.fatigue_config(),
    ))
}

fn resolve_source(cli: &Cli, config: &AppConfig) -> Result<PathBuf> {
    cli.source
        .clone()
        .or_else(|| config.feed.source.clone())
        .context("no feed source configured; pass --source or set feed.source in the config file")
}

fn load_cleaned(
    session: &mut AnalysisSession,
    source: &Path,
    config: &AppConfig,
) -> Result<(ActivityFeed, ActivityFeed, LoadReport)> {
    let (feed, report) = session.load(source)?;
    let filtered = config.thresholds().apply(&feed);
    Ok((feed, filtered, report))
}
