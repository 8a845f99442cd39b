/// Service configuration loader - parses climate.toml
///
/// Keeps deployment details (dataset location, listen address, worker count,
/// query time bound, which station `/api/v1.0/tobs` reports on) out of the
/// code. Values are layered: built-in defaults, then `climate.toml`, then
/// `CLIMATE_*` environment variables (a `.env` file is honoured), then
/// command-line flags applied by the binary.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::model::DEFAULT_TOBS_STATION;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "climate.toml";

/// Sentinel value for `tobs_station` selecting the busiest station.
const MOST_ACTIVE: &str = "most-active";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Station selection
// ---------------------------------------------------------------------------

/// Which station the temperature-observation endpoint reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationSelector {
    /// A fixed station code.
    Fixed(String),
    /// The station with the most measurement rows, resolved per request.
    MostActive,
}

impl FromStr for StationSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::Invalid("tobs_station must not be empty".to_string()));
        }
        if s.eq_ignore_ascii_case(MOST_ACTIVE) {
            Ok(StationSelector::MostActive)
        } else {
            Ok(StationSelector::Fixed(s.to_string()))
        }
    }
}

impl fmt::Display for StationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationSelector::Fixed(code) => f.write_str(code),
            StationSelector::MostActive => f.write_str(MOST_ACTIVE),
        }
    }
}

impl<'de> Deserialize<'de> for StationSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Service configuration
// ---------------------------------------------------------------------------

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Path to the SQLite dataset.
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    /// Size of the request worker pool.
    pub workers: usize,
    /// Upper bound on database work per request, in milliseconds.
    pub query_timeout_ms: u64,
    pub tobs_station: StationSelector,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("Resources/hawaii.sqlite"),
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            workers: 4,
            query_timeout_ms: 5000,
            tobs_station: StationSelector::Fixed(DEFAULT_TOBS_STATION.to_string()),
        }
    }
}

impl ServiceConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// `host:port` string handed to the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid("query_timeout_ms must be at least 1".to_string()));
        }
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        Ok(())
    }

    /// Applies `CLIMATE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| env::var(var).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(path) = lookup("CLIMATE_DATABASE") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("CLIMATE_BIND") {
            self.bind_address = addr;
        }
        if let Some(port) = lookup("CLIMATE_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { var: "CLIMATE_PORT", value: port })?;
        }
        if let Some(workers) = lookup("CLIMATE_WORKERS") {
            self.workers = workers
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { var: "CLIMATE_WORKERS", value: workers })?;
        }
        if let Some(station) = lookup("CLIMATE_TOBS_STATION") {
            self.tobs_station = station.parse()?;
        }
        Ok(())
    }
}

/// Parses a configuration document.
pub fn parse_config(contents: &str, path: &Path) -> Result<ServiceConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads configuration from `path`, then applies environment overrides.
///
/// A missing file is not an error: the service runs on defaults. A file
/// that exists but cannot be parsed is.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    dotenv::dotenv().ok();

    let mut config = match fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("{} not found, using defaults", path.display());
            ServiceConfig::default()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
