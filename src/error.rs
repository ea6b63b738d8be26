// ⚠️ Error types
// Nothing here crosses the engine boundary: fetch failures become an empty
// emission, cache failures are logged.

use thiserror::Error;

/// Failure while fetching the coin list from the remote source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode coin payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty response body")]
    EmptyBody,
}

/// Failure while reading or writing the local coin cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to open log file: {0}")]
    LogFile(#[source] std::io::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
pub type FetchResult<T> = std::result::Result<T, FetchError>;
