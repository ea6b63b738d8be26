//! Application configuration.
//!
//! Loaded from an optional TOML file; `CRYPTO_LIST_ENDPOINT` and
//! `CRYPTO_LIST_DB` override the endpoint and cache path.

use crate::error::ConfigError;
use crate::remote::DEFAULT_ENDPOINT;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_CONFIG_FILE: &str = "crypto-list.toml";
pub const ENV_ENDPOINT: &str = "CRYPTO_LIST_ENDPOINT";
pub const ENV_DB: &str = "CRYPTO_LIST_DB";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite file; `None` keeps the cache in memory
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("coins.db")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub probe_addr: String,
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_addr: "1.1.1.1:443".to_string(),
            probe_timeout_ms: 1500,
        }
    }
}

impl ConnectivityConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reapply_on_refresh: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Log file used while the TUI owns the terminal
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
            file: PathBuf::from("crypto-list.log"),
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Initialize the tracing subscriber writing to stderr.
    pub fn init(&self) {
        let filter = self.filter();

        match self.format.as_str() {
            "json" => {
                let _ = fmt().json().with_env_filter(filter).with_writer(std::io::stderr).try_init();
            }
            _ => {
                let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
            }
        }
    }

    /// Initialize the tracing subscriber writing to `self.file`.
    pub fn init_to_file(&self) -> Result<(), ConfigError> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)
            .map_err(ConfigError::LogFile)?;
        let filter = self.filter();

        match self.format.as_str() {
            "json" => {
                let _ = fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .try_init();
            }
            _ => {
                let _ = fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .try_init();
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub connectivity: ConnectivityConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from `path`; a missing file means defaults. Env overrides apply
    /// either way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
            Self::parse_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            self.remote.endpoint = endpoint;
        }
        if let Ok(db) = std::env::var(ENV_DB) {
            self.cache.path = if db.is_empty() { None } else { Some(PathBuf::from(db)) };
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote.endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "remote.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connectivity.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connectivity.probe_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
