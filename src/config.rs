//! Configuration types for deal-signals

use crate::window::WindowError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Raw listing warehouse configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Directory holding `listings_*.parquet` files
    #[serde(default = "default_warehouse_dir")]
    pub warehouse_dir: PathBuf,

    /// Trailing window of listings loaded per run (days)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

fn default_warehouse_dir() -> PathBuf {
    PathBuf::from("./warehouse")
}
fn default_lookback_days() -> u32 {
    35
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            warehouse_dir: default_warehouse_dir(),
            lookback_days: default_lookback_days(),
        }
    }
}

/// Rolling window configuration
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum observations kept per asset class
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Observations required before mean/std are defined
    #[serde(default = "default_min_periods")]
    pub min_periods: usize,
}

fn default_capacity() -> usize {
    crate::window::DEFAULT_CAPACITY
}
fn default_min_periods() -> usize {
    crate::window::DEFAULT_MIN_PERIODS
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            min_periods: default_min_periods(),
        }
    }
}

impl WindowConfig {
    /// A sample std needs at least two points, and the window must be able
    /// to hold `min_periods` of them
    pub fn validate(&self) -> Result<(), WindowError> {
        if self.min_periods < 2 {
            return Err(WindowError::InvalidConfig(format!(
                "min_periods must be at least 2, got {}",
                self.min_periods
            )));
        }
        if self.capacity < self.min_periods {
            return Err(WindowError::InvalidConfig(format!(
                "capacity {} is smaller than min_periods {}",
                self.capacity, self.min_periods
            )));
        }
        Ok(())
    }
}

/// Deal threshold configuration
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct SignalConfig {
    /// Price at or below `mean * discount_ratio` is a discount deal
    #[serde(default = "default_discount_ratio")]
    pub discount_ratio: f64,

    /// Z-score at or below this value is a deal
    #[serde(default = "default_z_score_threshold")]
    pub z_score_threshold: f64,
}

fn default_discount_ratio() -> f64 {
    crate::signal::DEFAULT_DISCOUNT_RATIO
}
fn default_z_score_threshold() -> f64 {
    crate::signal::DEFAULT_Z_SCORE_THRESHOLD
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            discount_ratio: default_discount_ratio(),
            z_score_threshold: default_z_score_threshold(),
        }
    }
}

/// Signal store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// SQLite database holding the `signals` table
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./signals.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Deal notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Post deals to Slack; when false deals are only logged
    #[serde(default)]
    pub enabled: bool,

    /// Environment variable holding the Slack bot token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Target channel
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Slack Web API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_env() -> String {
    "SLACK_BOT_TOKEN".to_string()
}
fn default_channel() -> String {
    "#general".to_string()
}
fn default_api_url() -> String {
    crate::notify::SLACK_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token_env: default_token_env(),
            channel: default_channel(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable output
    #[serde(default)]
    pub json_logs: bool,

    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.window.validate()?;
        Ok(config)
    }
}
