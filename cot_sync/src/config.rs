//! Runtime configuration for `cot-sync`.
//!
//! Values come from built-in defaults, then an optional TOML file, then a handful of
//! environment overrides. The merged result is validated once before use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cot_ingestor::download::{DownloaderConfig, CFTC_BASE_URL};
use cot_ingestor::providers::yahoo::YAHOO_BASE_URL;
use serde::{Deserialize, Serialize};
use shared_utils::env::{env_or, InvalidEnvVarError};
use thiserror::Error;

use crate::analytics::CalculatorConfig;
use crate::prices::{DEFAULT_PRICE_WORKERS, DEFAULT_PRICE_YEARS, DEFAULT_TTL_HOURS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] InvalidEnvVarError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Report download settings, `[download]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_secs: u64,
    /// Archive years kept, counting back from the current year.
    pub years: u32,
    /// Concurrent archive downloads within one variant.
    pub workers: usize,
    pub requests_per_second: u32,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        let http = DownloaderConfig::default();
        Self {
            base_url: CFTC_BASE_URL.to_string(),
            timeout_secs: http.timeout.as_secs(),
            retries: http.retries,
            backoff_secs: http.backoff.as_secs(),
            years: 5,
            workers: 4,
            requests_per_second: http.requests_per_second,
        }
    }
}

impl DownloadSettings {
    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            backoff: Duration::from_secs(self.backoff_secs),
            requests_per_second: self.requests_per_second,
            ..DownloaderConfig::default()
        }
    }
}

/// Price source settings, `[prices]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub years: u32,
    pub workers: usize,
    pub cache_ttl_hours: i64,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            base_url: YAHOO_BASE_URL.to_string(),
            timeout_secs: 30,
            years: DEFAULT_PRICE_YEARS,
            workers: DEFAULT_PRICE_WORKERS,
            cache_ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub db_path: String,
    pub output_dir: PathBuf,
    pub lock_path: PathBuf,
    pub download: DownloadSettings,
    pub analytics: CalculatorConfig,
    pub prices: PriceSettings,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            db_path: "data/cot.db".to_string(),
            output_dir: PathBuf::from("data/json"),
            lock_path: PathBuf::from("data/pipeline.lock"),
            download: DownloadSettings::default(),
            analytics: CalculatorConfig::default(),
            prices: PriceSettings::default(),
        }
    }
}

impl SyncConfig {
    /// Defaults, overlaid with `path` (when given) and the environment, then validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies `COT_*` and `PRICE_YEARS` overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.db_path = env_or("COT_DB_PATH", self.db_path.clone())?;
        self.output_dir = env_or("COT_OUTPUT_DIR", self.output_dir.clone())?;
        self.lock_path = env_or("COT_LOCK_PATH", self.lock_path.clone())?;
        self.download.years = env_or("COT_YEARS", self.download.years)?;
        self.analytics.buy_threshold = env_or("COT_CROWDED_BUY", self.analytics.buy_threshold)?;
        self.analytics.sell_threshold = env_or("COT_CROWDED_SELL", self.analytics.sell_threshold)?;
        self.prices.years = env_or("PRICE_YEARS", self.prices.years)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analytics;
        if !(0.0 <= a.sell_threshold && a.sell_threshold < a.buy_threshold && a.buy_threshold <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "thresholds must satisfy 0 <= sell < buy <= 100 (sell={}, buy={})",
                a.sell_threshold, a.buy_threshold
            )));
        }
        let windows = [
            a.lookback_3m,
            a.lookback_1y,
            a.lookback_3y,
            a.wci_lookback,
            a.window_5y,
            a.avg_window,
        ];
        if windows.contains(&0) {
            return Err(ConfigError::Invalid("analytics windows must be >= 1".into()));
        }
        if self.download.years == 0 || self.prices.years == 0 {
            return Err(ConfigError::Invalid("years must be >= 1".into()));
        }
        if self.download.workers == 0 || self.prices.workers == 0 {
            return Err(ConfigError::Invalid("workers must be >= 1".into()));
        }
        if self.download.retries == 0 {
            return Err(ConfigError::Invalid("download.retries must be >= 1".into()));
        }
        if self.download.requests_per_second == 0 {
            return Err(ConfigError::Invalid("download.requests_per_second must be >= 1".into()));
        }
        if self.prices.cache_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("prices.cache_ttl_hours must be > 0".into()));
        }
        Ok(())
    }
}
