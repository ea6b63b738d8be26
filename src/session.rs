// 🔌 Session wiring - build one engine from configuration

use crate::cache::{CacheStore, MemoryCacheStore, SqliteCacheStore};
use crate::config::AppConfig;
use crate::connectivity::{ConnectivityOracle, NetworkMonitor, StaticConnectivity};
use crate::reconciliation::ReconciliationEngine;
use crate::remote::HttpRemoteSource;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::info;

/// Everything a front end needs for one screen session.
pub struct Session {
    pub engine: ReconciliationEngine,
    pub monitor: Option<Arc<NetworkMonitor>>,
}

impl Session {
    /// `offline` skips the probe and reports "not connected" to the engine.
    pub fn build(config: &AppConfig, offline: bool) -> Result<Self> {
        let cache: Arc<dyn CacheStore> = match &config.cache.path {
            Some(path) => Arc::new(
                SqliteCacheStore::open(path)
                    .with_context(|| format!("Failed to open cache at {}", path.display()))?,
            ),
            None => Arc::new(MemoryCacheStore::new()),
        };

        let remote = HttpRemoteSource::new(config.remote.endpoint.clone(), config.remote.timeout())
            .context("Failed to build HTTP client")?;

        let (connectivity, monitor): (Arc<dyn ConnectivityOracle>, Option<Arc<NetworkMonitor>>) =
            if offline {
                (Arc::new(StaticConnectivity::new(false)), None)
            } else {
                let monitor = Arc::new(NetworkMonitor::new(
                    config.connectivity.probe_addr.clone(),
                    config.connectivity.probe_timeout(),
                ));
                (monitor.clone(), Some(monitor))
            };

        info!(
            endpoint = %config.remote.endpoint,
            cache = ?config.cache.path,
            offline,
            "Session ready"
        );

        let engine = ReconciliationEngine::new(cache, Arc::new(remote), connectivity)
            .with_reapply_on_refresh(config.engine.reapply_on_refresh);

        Ok(Session { engine, monitor })
    }

    /// Re-probe connectivity (if monitored) and run a load to completion.
    pub async fn refresh(&self) -> Result<(), JoinError> {
        refresh_with(self.engine.clone(), self.monitor.clone()).await
    }

    /// Start a refresh in the background, for synchronous front ends.
    pub fn spawn_refresh(&self) -> JoinHandle<Result<(), JoinError>> {
        tokio::spawn(refresh_with(self.engine.clone(), self.monitor.clone()))
    }
}

async fn refresh_with(
    engine: ReconciliationEngine,
    monitor: Option<Arc<NetworkMonitor>>,
) -> Result<(), JoinError> {
    // TCP probe and cache read both block
    let load = tokio::task::spawn_blocking(move || {
        if let Some(monitor) = &monitor {
            monitor.refresh();
        }
        engine.load()
    })
    .await?;

    load.await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::EmptyState;

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.path = None;
        config.remote.endpoint = "http://127.0.0.1:9/coins".to_string();
        config.remote.timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn test_offline_refresh_completes_with_empty_list() {
        let session = Session::build(&offline_config(), true).unwrap();
        assert!(session.monitor.is_none());

        session.refresh().await.unwrap();

        assert!(session.engine.displayed().is_empty());
        assert!(session.engine.last_error().is_some());
        assert_eq!(session.engine.empty_state(), Some(EmptyState::Offline));
    }

    #[tokio::test]
    async fn test_spawned_refresh_probes_monitor() {
        let mut config = offline_config();
        // Closed local port: the probe fails fast and the monitor reports offline
        config.connectivity.probe_addr = "127.0.0.1:9".to_string();
        config.connectivity.probe_timeout_ms = 200;
        let session = Session::build(&config, false).unwrap();

        session.spawn_refresh().await.unwrap().unwrap();

        let monitor = session.monitor.as_ref().unwrap();
        assert!(!monitor.is_connected());
        assert_eq!(session.engine.empty_state(), Some(EmptyState::Offline));
    }
}
