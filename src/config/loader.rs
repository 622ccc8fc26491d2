//! Configuration Loader
//!
//! Loads and validates configuration from an optional TOML file. Every
//! field has a default, so an absent file (or an empty one) yields the
//! stock behavior: top 150 coins by market cap, one page, USD.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::coingecko::{CoinGeckoConfig, DEFAULT_BASE_URL};
use crate::adapters::storage::DEFAULT_DATA_FILE;
use crate::application::{HarvestSettings, PaginationSettings, RetryPolicy, DETAIL_RETRY, LISTING_RETRY};
use crate::domain::checkpoint::DEFAULT_PROGRESS_FILE;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "COINGECKO_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub pagination: PaginationSection,
    pub throttle: ThrottleSection,
    pub retry: RetrySection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

/// CoinGecko API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// API base URL
    pub base_url: String,
    /// Quote currency for prices and market caps
    pub vs_currency: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiSection {
    /// Get base URL with environment variable override
    /// Checks COINGECKO_API_URL env var first, falls back to config value
    pub fn get_base_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.base_url.clone())
    }
}

/// Listing pagination section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationSection {
    /// Coins per listing page
    pub per_page: u32,
    /// Highest page fetched
    pub max_pages: u32,
    /// Pause between page requests in seconds
    pub page_pause_secs: u64,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            per_page: 150,
            max_pages: 1,
            page_pause_secs: 30,
        }
    }
}

/// Per-coin throttle section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleSection {
    /// Pause after each processed coin in seconds
    pub coin_pause_secs: u64,
}

impl Default for ThrottleSection {
    fn default() -> Self {
        Self { coin_pause_secs: 15 }
    }
}

/// Backoff parameters for one fetch site. Unset fields fall back to that
/// site's built-in policy (`LISTING_RETRY` or `DETAIL_RETRY`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackoffSection {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub multiplier: Option<u32>,
}

impl BackoffSection {
    /// Overlay the configured fields on `fallback`
    pub fn policy(&self, fallback: RetryPolicy) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts.unwrap_or(fallback.max_attempts),
            self.base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(fallback.base_delay),
            self.multiplier.unwrap_or(fallback.multiplier),
        )
    }
}

/// Retry section; listing and detail keep separate policies
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub listing: BackoffSection,
    pub detail: BackoffSection,
}

impl RetrySection {
    pub fn listing_policy(&self) -> RetryPolicy {
        self.listing.policy(LISTING_RETRY)
    }

    pub fn detail_policy(&self) -> RetryPolicy {
        self.detail.policy(DETAIL_RETRY)
    }
}

/// Output files section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Coin document path
    pub data_file: String,
    /// Checkpoint path
    pub progress_file: String,
    /// Coins processed between document flushes
    pub flush_every: usize,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            data_file: DEFAULT_DATA_FILE.to_string(),
            progress_file: DEFAULT_PROGRESS_FILE.to_string(),
            flush_every: 1,
        }
    }
}

impl OutputSection {
    /// Coin document path with `~` expanded
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_file).to_string())
    }

    /// Checkpoint path with `~` expanded
    pub fn progress_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.progress_file).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load from `path` if given, otherwise use defaults
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url cannot be empty".to_string(),
            ));
        }

        if self.api.vs_currency.is_empty() {
            return Err(ConfigError::ValidationError(
                "vs_currency cannot be empty".to_string(),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.pagination.per_page == 0 || self.pagination.per_page > 250 {
            return Err(ConfigError::ValidationError(format!(
                "per_page must be 1-250, got {}",
                self.pagination.per_page
            )));
        }

        if self.pagination.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "max_pages must be > 0".to_string(),
            ));
        }

        let policies = [
            ("listing", self.retry.listing_policy()),
            ("detail", self.retry.detail_policy()),
        ];
        for (name, backoff) in policies {
            if backoff.max_attempts == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "retry.{}.max_attempts must be > 0",
                    name
                )));
            }
            if backoff.multiplier == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "retry.{}.multiplier must be >= 1",
                    name
                )));
            }
        }

        if self.output.flush_every == 0 {
            return Err(ConfigError::ValidationError(
                "flush_every must be > 0".to_string(),
            ));
        }

        if self.output.data_file.is_empty() || self.output.progress_file.is_empty() {
            return Err(ConfigError::ValidationError(
                "data_file and progress_file cannot be empty".to_string(),
            ));
        }

        if self.output.data_file == self.output.progress_file {
            return Err(ConfigError::ValidationError(
                "data_file and progress_file must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// HTTP client configuration (env override applied)
    pub fn coingecko(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.api.get_base_url(),
            vs_currency: self.api.vs_currency.clone(),
            timeout: Duration::from_secs(self.api.request_timeout_secs),
        }
    }
}

// Conversion from Config to HarvestSettings
impl From<&Config> for HarvestSettings {
    fn from(config: &Config) -> Self {
        HarvestSettings {
            pagination: PaginationSettings {
                vs_currency: config.api.vs_currency.clone(),
                per_page: config.pagination.per_page,
                max_pages: config.pagination.max_pages,
                page_pause: Duration::from_secs(config.pagination.page_pause_secs),
            },
            coin_pause: Duration::from_secs(config.throttle.coin_pause_secs),
            listing_retry: config.retry.listing_policy(),
            detail_retry: config.retry.detail_policy(),
            flush_every: config.output.flush_every,
        }
    }
}
