/// Service configuration loader - parses hnd.toml
///
/// Every key has a default, so the file is optional. Environment variables
/// (also read from a `.env` file, if present) override the file:
///
/// - `HND_LISTEN_ADDR` — address of the metrics endpoint
/// - `HND_BASE_URL`    — station page URL, `?pgnr=` is appended
/// - `HND_TIMEZONE`    — IANA zone of the station timestamps

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::civil_zone::{CivilZone, DEFAULT_TIMEZONE};
use crate::ingest::hnd::HND_BASE_URL;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "hnd.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Runtime configuration of the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Address the metrics endpoint binds to.
    pub listen_addr: String,

    /// Station page URL without query string.
    pub base_url: String,

    /// IANA name of the civil zone the pages print their timestamps in.
    pub timezone: String,

    /// Timeout for one station page request.
    pub request_timeout_secs: u64,

    /// Number of request handler threads.
    pub workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9142".to_string(),
            base_url: HND_BASE_URL.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            request_timeout_secs: 10,
            workers: 4,
        }
    }
}

impl ServiceConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file at `path`. A missing file yields the
    /// defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents, &origin),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Read { path: origin, source: e }),
        }
    }

    /// Loads `path`, then applies `.env` and environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("HND_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(url) = lookup("HND_BASE_URL") {
            self.base_url = url;
        }
        if let Some(tz) = lookup("HND_TIMEZONE") {
            self.timezone = tz;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                key: "workers",
                message: "at least one worker is required".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                message: "timeout must be positive".to_string(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "base_url",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolves the configured timezone. Call once at startup.
    pub fn civil_zone(&self) -> CivilZone {
        CivilZone::resolve(&self.timezone)
    }
}
