//! Runner configuration
//!
//! Connection settings for the ingestion service and the status database,
//! plus the polling budget. Loaded either from a JSON file (the layout the
//! ingestion scripts already share) or from environment variables.

use anyhow::Context;
use serde::Deserialize;
use sluice_core::policy::{CompletionPolicy, DEFAULT_MIN_TASK_COUNT};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::scheduler::PollSettings;

const DEFAULT_POLL_TIMEOUT_MINUTES: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_WARM_UP_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Ingestion service base URL (e.g., "https://ingest.example.com/api")
    pub api_base_url: String,

    /// Key sent as `x-api-key`
    pub api_key: String,

    /// PEM certificate to trust for the ingestion service
    pub cert_path: Option<PathBuf>,

    /// Postgres connection string for the status database
    pub database_url: String,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,

    /// Wall-clock budget for polling one job
    pub poll_timeout: Duration,

    /// Pause between two status fetches
    pub poll_interval: Duration,

    /// Pause before the first status fetch
    pub warm_up: Duration,

    /// Sub-tasks a fully registered job reports
    pub min_task_count: usize,

    /// Transient fetch failures in a row before a poll gives up
    pub max_consecutive_failures: u32,

    /// Threshold for tasks stuck in progress; accepted but not enforced
    pub stuck_task_timeout: Option<Duration>,
}

impl Config {
    /// Creates a new configuration with default polling settings
    pub fn new(api_base_url: String, api_key: String, database_url: String) -> Self {
        Self {
            api_base_url,
            api_key,
            cert_path: None,
            database_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_MINUTES * 60),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            warm_up: Duration::from_secs(DEFAULT_WARM_UP_SECS),
            min_task_count: DEFAULT_MIN_TASK_COUNT,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            stuck_task_timeout: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SLUICE_API_BASE_URL (required)
    /// - SLUICE_API_KEY (required)
    /// - DATABASE_URL (required)
    /// - SLUICE_CERT_PATH (optional)
    /// - SLUICE_POLL_TIMEOUT_MINUTES (optional, default: 30)
    /// - SLUICE_POLL_INTERVAL (optional, seconds, default: 30)
    /// - SLUICE_WARM_UP (optional, seconds, default: 10)
    /// - SLUICE_MIN_TASK_COUNT (optional, default: 5)
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = std::env::var("SLUICE_API_BASE_URL")
            .map_err(|_| anyhow::anyhow!("SLUICE_API_BASE_URL environment variable not set"))?;

        let api_key = std::env::var("SLUICE_API_KEY")
            .map_err(|_| anyhow::anyhow!("SLUICE_API_KEY environment variable not set"))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

        let mut config = Self::new(api_base_url, api_key, database_url);

        config.cert_path = std::env::var("SLUICE_CERT_PATH").ok().map(PathBuf::from);

        if let Some(minutes) = env_parse::<u64>("SLUICE_POLL_TIMEOUT_MINUTES") {
            config.poll_timeout = Duration::from_secs(minutes * 60);
        }
        if let Some(secs) = env_parse::<u64>("SLUICE_POLL_INTERVAL") {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("SLUICE_WARM_UP") {
            config.warm_up = Duration::from_secs(secs);
        }
        if let Some(count) = env_parse::<usize>("SLUICE_MIN_TASK_COUNT") {
            config.min_task_count = count;
        }

        Ok(config)
    }

    /// Loads configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_json(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parses the JSON configuration layout
    ///
    /// ```json
    /// {
    ///   "datalake": { "api_base_url": "...", "api_key": "...", "cert_path": "..." },
    ///   "database": { "url": "postgres://..." },
    ///   "polling": { "timeout_minutes": 30, "poll_interval_seconds": 30 }
    /// }
    /// ```
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_json::from_str(raw)?;
        let polling = file.polling;

        let mut config = Self::new(
            file.datalake.api_base_url,
            file.datalake.api_key,
            file.database.url,
        );
        config.cert_path = file.datalake.cert_path;
        config.poll_timeout = Duration::from_secs(polling.timeout_minutes * 60);
        config.poll_interval = Duration::from_secs(polling.poll_interval_seconds);
        config.warm_up = Duration::from_secs(polling.warm_up_seconds);
        config.request_timeout = Duration::from_secs(polling.request_timeout_seconds);
        config.min_task_count = polling.min_task_count;
        config.max_consecutive_failures = polling.max_consecutive_failures;
        config.stuck_task_timeout = polling
            .stuck_task_timeout_minutes
            .map(|minutes| Duration::from_secs(minutes * 60));

        Ok(config)
    }

    /// Polling settings derived from this configuration
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            timeout: self.poll_timeout,
            poll_interval: self.poll_interval,
            warm_up: self.warm_up,
            policy: CompletionPolicy::new(self.min_task_count),
            max_consecutive_failures: self.max_consecutive_failures,
            stuck_task_timeout: self.stuck_task_timeout,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!("api_key cannot be empty");
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            anyhow::bail!("api_base_url must start with http:// or https://");
        }

        if self.database_url.is_empty() {
            anyhow::bail!("database_url cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.poll_timeout.is_zero() {
            anyhow::bail!("poll_timeout must be greater than 0");
        }

        if self.min_task_count == 0 {
            anyhow::bail!("min_task_count must be greater than 0");
        }

        if self.max_consecutive_failures == 0 {
            anyhow::bail!("max_consecutive_failures must be greater than 0");
        }

        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

// =============================================================================
// File Layout
// =============================================================================

#[derive(Debug, Deserialize)]
struct ConfigFile {
    datalake: DatalakeSection,
    database: DatabaseSection,
    #[serde(default)]
    polling: PollingSection,
}

#[derive(Debug, Deserialize)]
struct DatalakeSection {
    api_base_url: String,
    api_key: String,
    #[serde(default)]
    cert_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PollingSection {
    timeout_minutes: u64,
    poll_interval_seconds: u64,
    warm_up_seconds: u64,
    request_timeout_seconds: u64,
    min_task_count: usize,
    max_consecutive_failures: u32,
    stuck_task_timeout_minutes: Option<u64>,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            timeout_minutes: DEFAULT_POLL_TIMEOUT_MINUTES,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
            warm_up_seconds: DEFAULT_WARM_UP_SECS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            min_task_count: DEFAULT_MIN_TASK_COUNT,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            stuck_task_timeout_minutes: None,
        }
    }
}
