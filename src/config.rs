use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::feed::FeedSchema;
use crate::filter::Thresholds;
use crate::metrics::efficiency::EfficiencyConfig;
use crate::metrics::fatigue::FatigueConfig;
use crate::metrics::series::MetricKind;
use crate::session::UserControls;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Feed source settings
    pub feed: FeedSettings,

    /// Analysis defaults and estimator tunables
    pub analysis: AnalysisSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Where and how to read the activity feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Default source file, so the CLI can omit --source
    pub source: Option<PathBuf>,

    /// Schema preset name (see `FeedSchema::preset_names`)
    pub schema: String,

    /// Activities before this date are dropped at load
    pub date_floor: NaiveDate,
}

/// Defaults for the user controls plus estimator tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Pace ceiling in decimal minutes per kilometer
    pub max_pace: Decimal,

    /// Distance floor in kilometers
    pub min_distance_km: Decimal,

    /// Recent-months window for metric series (1 to 24)
    pub months_back: u32,

    /// Metric keys charted by default
    pub metrics: Vec<String>,

    /// Flat-equivalent meters credited per meter of climb
    pub elevation_factor: f64,

    /// Daily fatigue dissipation factor in (0, 1]
    pub decay_factor: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            feed: FeedSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            source: None,
            schema: "spreadsheet".to_string(),
            date_floor: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            max_pace: dec!(7.0),
            min_distance_km: dec!(4.0),
            months_back: 6,
            metrics: vec!["distance".to_string()],
            elevation_factor: 6.0,
            decay_factor: 0.9,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rundash")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_pace <= Decimal::ZERO {
            anyhow::bail!("analysis.max_pace must be positive");
        }
        if self.analysis.min_distance_km < Decimal::ZERO {
            anyhow::bail!("analysis.min_distance_km must not be negative");
        }
        if !(1..=24).contains(&self.analysis.months_back) {
            anyhow::bail!("analysis.months_back must be between 1 and 24");
        }
        if !(self.analysis.decay_factor > 0.0 && self.analysis.decay_factor <= 1.0) {
            anyhow::bail!("analysis.decay_factor must be in (0, 1]");
        }
        if self.analysis.elevation_factor < 0.0 {
            anyhow::bail!("analysis.elevation_factor must not be negative");
        }
        Ok(())
    }

    /// Resolve the configured schema preset
    pub fn schema(&self) -> Result<FeedSchema> {
        FeedSchema::by_name(&self.feed.schema)
            .with_context(|| format!("Unknown schema preset in config: {}", self.feed.schema))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.analysis.max_pace, self.analysis.min_distance_km)
    }

    pub fn efficiency_config(&self) -> EfficiencyConfig {
        EfficiencyConfig {
            elevation_factor: self.analysis.elevation_factor,
        }
    }

    pub fn fatigue_config(&self) -> FatigueConfig {
        FatigueConfig {
            decay_factor: self.analysis.decay_factor,
        }
    }

    /// User controls seeded from the configured defaults
    pub fn controls(&self) -> Result<UserControls> {
        let metrics = self
            .analysis
            .metrics
            .iter()
            .map(|name| {
                MetricKind::parse(name)
                    .with_context(|| format!("Unknown metric in config: {}", name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(UserControls {
            thresholds: self.thresholds(),
            months_back: self.analysis.months_back,
            metrics,
            heatmap_year: None,
        })
    }
}
