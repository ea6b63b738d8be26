// 📶 Connectivity oracle
//
// The engine only polls `is_connected()`. `NetworkMonitor` keeps the last
// known state and refreshes it with a TCP reachability probe.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

pub trait ConnectivityOracle: Send + Sync {
    fn is_connected(&self) -> bool;
}

// ============================================================================
// CONNECTION TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionType {
    Unknown,
    Wired,
    NoConnection,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Unknown => "Unknown",
            ConnectionType::Wired => "Wired Ethernet",
            ConnectionType::NoConnection => "No Connection",
        }
    }
}

// ============================================================================
// NETWORK MONITOR
// ============================================================================

pub struct NetworkMonitor {
    connected: AtomicBool,
    connection_type: RwLock<ConnectionType>,
    probe_addr: String,
    probe_timeout: Duration,
}

impl NetworkMonitor {
    /// Starts disconnected until the first `refresh()`.
    pub fn new(probe_addr: impl Into<String>, probe_timeout: Duration) -> Self {
        NetworkMonitor {
            connected: AtomicBool::new(false),
            connection_type: RwLock::new(ConnectionType::Unknown),
            probe_addr: probe_addr.into(),
            probe_timeout,
        }
    }

    /// Probe the configured address and update the stored state.
    pub fn refresh(&self) -> bool {
        let reachable = self
            .resolve()
            .map(|addr| TcpStream::connect_timeout(&addr, self.probe_timeout).is_ok())
            .unwrap_or(false);

        self.update(reachable);
        reachable
    }

    /// Record a connectivity change observed elsewhere.
    pub fn update(&self, reachable: bool) {
        let previous = self.connected.swap(reachable, Ordering::SeqCst);

        if let Ok(mut kind) = self.connection_type.write() {
            *kind = if reachable {
                ConnectionType::Wired
            } else {
                ConnectionType::NoConnection
            };
        }

        if previous != reachable {
            info!(connected = reachable, "Connection status changed");
        } else {
            debug!(connected = reachable, "Connection status unchanged");
        }
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
            .read()
            .map(|k| k.clone())
            .unwrap_or(ConnectionType::Unknown)
    }

    fn resolve(&self) -> Option<SocketAddr> {
        self.probe_addr.to_socket_addrs().ok()?.next()
    }
}

impl ConnectivityOracle for NetworkMonitor {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ============================================================================
// STATIC ORACLE
// ============================================================================

/// Fixed answer; tests and `--offline`.
pub struct StaticConnectivity(pub AtomicBool);

impl StaticConnectivity {
    pub fn new(connected: bool) -> Self {
        StaticConnectivity(AtomicBool::new(connected))
    }

    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::SeqCst);
    }
}

impl ConnectivityOracle for StaticConnectivity {
    fn is_connected(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_monitor_starts_disconnected() {
        let monitor = NetworkMonitor::new("127.0.0.1:1", Duration::from_millis(100));
        assert!(!monitor.is_connected());
        assert_eq!(monitor.connection_type(), ConnectionType::Unknown);
    }

    #[test]
    fn test_refresh_against_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let monitor = NetworkMonitor::new(addr.to_string(), Duration::from_millis(500));

        assert!(monitor.refresh());
        assert!(monitor.is_connected());
        assert_eq!(monitor.connection_type().as_str(), "Wired Ethernet");
    }

    #[test]
    fn test_unresolvable_address_is_disconnected() {
        let monitor = NetworkMonitor::new("not an address", Duration::from_millis(100));

        assert!(!monitor.refresh());
        assert_eq!(monitor.connection_type(), ConnectionType::NoConnection);
    }

    #[test]
    fn test_static_connectivity_toggles() {
        let oracle = StaticConnectivity::new(true);
        assert!(oracle.is_connected());
        oracle.set(false);
        assert!(!oracle.is_connected());
    }
}
