// Crypto List - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod coin;
pub mod filter;
pub mod reconciliation;
pub mod cache;
pub mod remote;
pub mod connectivity;
pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use coin::{
    Coin, BadgeColor, DisplayState,
    derive_display_states, lists_same_state, decode_coins,
};
pub use filter::{
    FilterKind, FilterOption, FilterPanel,
    apply_filters, remove_duplicates, search,
};
pub use reconciliation::{
    ReconciliationEngine, EmptyState, ListListener,
};
pub use cache::{
    CacheStore, SqliteCacheStore, MemoryCacheStore, load_csv,
};
pub use remote::{RemoteSource, HttpRemoteSource, DEFAULT_ENDPOINT};
pub use connectivity::{ConnectivityOracle, NetworkMonitor, StaticConnectivity, ConnectionType};
pub use config::{AppConfig, LoggingConfig};
pub use error::{CacheError, ConfigError, FetchError};
pub use session::Session;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
