//! Network Monitoring Abstraction
//!
//! Lets the core decide between the online and offline progress paths.

use async_trait::async_trait;

use crate::error::Result;

/// Network connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Cellular,
    WiFi,
    Ethernet,
    Other,
}

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Connected,
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

/// Network information
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    pub network_type: Option<NetworkType>,
    /// Whether the connection is metered (has data limits/costs)
    pub is_metered: bool,
}

impl NetworkInfo {
    pub fn connected(network_type: NetworkType) -> Self {
        Self {
            status: NetworkStatus::Connected,
            network_type: Some(network_type),
            is_metered: matches!(network_type, NetworkType::Cellular),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: NetworkStatus::Disconnected,
            network_type: None,
            is_metered: false,
        }
    }
}

/// Network monitor trait
///
/// Platform support:
/// - **Android**: ConnectivityManager
/// - **iOS**: Network framework
/// - **Desktop**: system network APIs
///
/// An `Indeterminate` status counts as offline so that progress is kept
/// locally rather than dropped.
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        matches!(
            self.get_network_info().await,
            Ok(NetworkInfo {
                status: NetworkStatus::Connected,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    struct StaticMonitor(Option<NetworkInfo>);

    #[async_trait]
    impl NetworkMonitor for StaticMonitor {
        async fn get_network_info(&self) -> Result<NetworkInfo> {
            self.0
                .clone()
                .ok_or_else(|| BridgeError::NotAvailable("network info".to_string()))
        }
    }

    #[test]
    fn test_network_info_constructors() {
        let cellular = NetworkInfo::connected(NetworkType::Cellular);
        assert_eq!(cellular.status, NetworkStatus::Connected);
        assert!(cellular.is_metered);

        let offline = NetworkInfo::disconnected();
        assert_eq!(offline.status, NetworkStatus::Disconnected);
        assert_eq!(offline.network_type, None);
    }

    #[tokio::test]
    async fn test_is_connected_defaults() {
        let wifi = StaticMonitor(Some(NetworkInfo::connected(NetworkType::WiFi)));
        assert!(wifi.is_connected().await);

        let offline = StaticMonitor(Some(NetworkInfo::disconnected()));
        assert!(!offline.is_connected().await);

        let unknown = StaticMonitor(Some(NetworkInfo {
            status: NetworkStatus::Indeterminate,
            network_type: None,
            is_metered: false,
        }));
        assert!(!unknown.is_connected().await);

        let failing = StaticMonitor(None);
        assert!(!failing.is_connected().await);
    }
}
