//! Command-line interface parsing for snowdash
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! validated [`Settings`], which also know how to wire up the fetch pipeline.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{default_cache_dir, CacheStore, FileStorage, MemoryStorage, Storage};
use crate::clock::{Clock, SystemClock};
use crate::data::{WeatherClient, TOMORROW_FORECAST_URL};
use crate::logging::LogTarget;
use crate::refresh::{RefreshConfig, Scheduler};
use crate::retry::{FetchError, ReqwestTransport, RetryingFetcher, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Name of the log file written next to the cache in dashboard mode
const LOG_FILE_NAME: &str = "snowdash.log";

/// Longest accepted refresh interval: one week
pub const MAX_REFRESH_MINUTES: u64 = 7 * 24 * 60;
/// Longest accepted cache lifetime: one year
pub const MAX_CACHE_TTL_HOURS: u64 = 365 * 24;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// No API key was given on the command line or in the environment
    #[error("Missing Tomorrow.io API key: pass --api-key or set TOMORROW_API_KEY")]
    MissingApiKey,

    /// The forecast endpoint is not a valid URL
    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// snowdash - Snow forecasts for Colorado ski resorts
#[derive(Parser, Debug)]
#[command(name = "snowdash")]
#[command(about = "Snow forecasts for Colorado ski resorts")]
#[command(version)]
pub struct Cli {
    /// Tomorrow.io API key
    #[arg(long, env = "TOMORROW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Forecast endpoint
    #[arg(long, env = "SNOWDASH_API_BASE_URL", hide = true, default_value = TOMORROW_FORECAST_URL)]
    pub api_base_url: String,

    /// Minutes between automatic refreshes
    #[arg(long, value_name = "MINUTES", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=MAX_REFRESH_MINUTES))]
    pub refresh_minutes: u64,

    /// Hours a fetched forecast stays fresh in the cache
    #[arg(long, value_name = "HOURS", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..=MAX_CACHE_TTL_HOURS))]
    pub cache_ttl_hours: u64,

    /// Pause between requests for consecutive resorts
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub request_delay_ms: u64,

    /// Per-request timeout
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Directory for cached forecasts (defaults to the XDG cache directory)
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Keep forecasts in memory only
    #[arg(long)]
    pub no_cache: bool,

    /// Fetch once, print a report and exit instead of opening the dashboard
    ///
    /// Examples:
    ///   snowdash --once          # Plain text report
    ///   snowdash --once --json   # Full forecast data as JSON
    #[arg(long)]
    pub once: bool,

    /// Print the report as JSON (requires --once)
    #[arg(long, requires = "once")]
    pub json: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

/// How the application presents results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Interactive terminal dashboard with periodic refresh
    Dashboard,
    /// Single refresh followed by a printed report
    Once { json: bool },
}

/// Where forecasts are cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    Disk(PathBuf),
    Memory,
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_base_url: String,
    pub refresh_interval: Duration,
    pub cache_ttl: Duration,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub cache: CacheLocation,
    pub mode: RunMode,
    pub log_level: String,
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with defaults applied
    /// * `Err(CliError)` if the API key is missing or the base URL is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CliError::MissingApiKey)?
            .to_string();

        reqwest::Url::parse(&cli.api_base_url)
            .map_err(|_| CliError::InvalidBaseUrl(cli.api_base_url.clone()))?;

        let cache = if cli.no_cache {
            CacheLocation::Memory
        } else {
            match cli.cache_dir.clone().or_else(default_cache_dir) {
                Some(dir) => CacheLocation::Disk(dir),
                // No home directory: fall back to a process-local cache
                None => CacheLocation::Memory,
            }
        };

        let mode = if cli.once {
            RunMode::Once { json: cli.json }
        } else {
            RunMode::Dashboard
        };

        Ok(Settings {
            api_key,
            api_base_url: cli.api_base_url.clone(),
            refresh_interval: Duration::from_secs(cli.refresh_minutes * 60),
            cache_ttl: Duration::from_secs(cli.cache_ttl_hours * 60 * 60),
            request_delay: Duration::from_millis(cli.request_delay_ms),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            cache,
            mode,
            log_level: cli.log_level.clone(),
        })
    }

    /// Where log output goes for this configuration
    ///
    /// The dashboard owns the terminal, so it logs to a file next to the cache
    /// (or nowhere when there is no cache directory).
    pub fn log_target(&self) -> LogTarget {
        match (&self.mode, &self.cache) {
            (RunMode::Once { .. }, _) => LogTarget::Stderr,
            (RunMode::Dashboard, CacheLocation::Disk(dir)) => LogTarget::File(dir.join(LOG_FILE_NAME)),
            (RunMode::Dashboard, CacheLocation::Memory) => LogTarget::Discard,
        }
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            interval: self.refresh_interval,
        }
    }

    /// Wires storage, transport, fetcher and client into a scheduler
    pub fn build_scheduler(&self) -> Result<Scheduler, FetchError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage: Arc<dyn Storage> = match &self.cache {
            CacheLocation::Disk(dir) => Arc::new(FileStorage::with_dir(dir.clone())),
            CacheLocation::Memory => Arc::new(MemoryStorage::new()),
        };

        let transport = Arc::new(ReqwestTransport::new(self.request_timeout)?);
        let fetcher = RetryingFetcher::new(transport, clock.clone());
        let cache = CacheStore::new(storage, clock.clone());
        let client = WeatherClient::new(fetcher, cache, self.api_key.clone())
            .with_base_url(self.api_base_url.clone())
            .with_cache_ttl(self.cache_ttl);

        Ok(Scheduler::new(client, clock).with_pacing_delay(self.request_delay))
    }
}
