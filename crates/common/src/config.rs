//! Application configuration.

use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Approval workflow configuration.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`postgres://...` or `sqlite::memory:`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Buffered change events per live-query subscriber.
    #[serde(default = "default_change_feed_capacity")]
    pub change_feed_capacity: usize,
}

/// Registration and record-keeping settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Bounded wait for the profile lookup on the recovery path.
    #[serde(default = "default_profile_lookup_timeout_secs")]
    pub profile_lookup_timeout_secs: u64,
    /// IANA timezone that defines the calendar day of a daily record.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Minimum accepted password length for new identities.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_change_feed_capacity() -> usize {
    256
}

const fn default_profile_lookup_timeout_secs() -> u64 {
    8
}

fn default_timezone() -> String {
    "UTC".to_string()
}

const fn default_min_password_length() -> usize {
    6
}

fn default_log_filter() -> String {
    "hifz=info".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            profile_lookup_timeout_secs: default_profile_lookup_timeout_secs(),
            timezone: default_timezone(),
            min_password_length: default_min_password_length(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl WorkflowConfig {
    /// Profile lookup timeout as a [`Duration`].
    #[must_use]
    pub const fn profile_lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.profile_lookup_timeout_secs)
    }

    /// Parse the configured timezone.
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::Config(format!("Invalid timezone {}: {e}", self.timezone)))
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `HIFZ_ENV`)
    /// 4. Environment variables with `HIFZ_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("HIFZ_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HIFZ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("HIFZ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
