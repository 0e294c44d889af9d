//! # Core Configuration Module
//!
//! Builder-based configuration for the course client core.
//!
//! ## Overview
//!
//! [`CoreConfigBuilder`] collects the host bridges and settings and produces
//! a validated [`CoreConfig`]. Validation is fail-fast: a missing required
//! bridge or an inconsistent setting is reported by `build()` with an
//! actionable message instead of surfacing later during playback.
//!
//! ## Required Dependencies
//!
//! - `PlaybackApi` - Token acquisition and remote progress updates
//! - `LocalProgressStore` - Offline progression records and watch stats
//!
//! ## Optional Dependencies
//!
//! - `SyncScheduler` - Deferred push of offline progress
//! - `NetworkMonitor` - Online/offline detection for playback ticks
//! - `Clock` - Time source (defaults to `SystemClock`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ProgressSettings};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .playback_api(Arc::new(MyPlaybackApi))
//!     .progress_store(Arc::new(MyProgressStore))
//!     .sync_scheduler(Arc::new(MyScheduler))
//!     .progress_settings(ProgressSettings::default())
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics with an actionable message naming the missing bridge
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, LocalProgressStore, NetworkMonitor, PlaybackApi, SyncScheduler, SystemClock};
use std::sync::Arc;

/// Core configuration. Use [`CoreConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Remote playback API (required)
    pub playback_api: Arc<dyn PlaybackApi>,

    /// Local progression storage (required)
    pub progress_store: Arc<dyn LocalProgressStore>,

    /// Background scheduler for offline progress pushes (optional)
    pub sync_scheduler: Option<Arc<dyn SyncScheduler>>,

    /// Network connectivity monitor (optional)
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    pub clock: Arc<dyn Clock>,

    pub progress: ProgressSettings,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("playback_api", &"PlaybackApi { ... }")
            .field("progress_store", &"LocalProgressStore { ... }")
            .field(
                "sync_scheduler",
                &self.sync_scheduler.as_ref().map(|_| "SyncScheduler { ... }"),
            )
            .field(
                "network_monitor",
                &self
                    .network_monitor
                    .as_ref()
                    .map(|_| "NetworkMonitor { ... }"),
            )
            .field("progress", &self.progress)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Tunables of the progress synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    /// Minimum progress advance, in seconds, between two reports
    pub throttle_seconds: i64,
    /// Offline records at or above this percentage count as finished
    pub finished_threshold_percent: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            throttle_seconds: 5,
            finished_threshold_percent: 99,
        }
    }
}

impl ProgressSettings {
    pub fn validate(&self) -> Result<()> {
        if self.throttle_seconds <= 0 {
            return Err(Error::Config(
                "Progress throttle must be at least 1 second".to_string(),
            ));
        }
        if self.finished_threshold_percent == 0 || self.finished_threshold_percent > 100 {
            return Err(Error::Config(format!(
                "Finished threshold must be within 1..=100, got {}",
                self.finished_threshold_percent
            )));
        }
        Ok(())
    }
}

/// Feature flags control optional functionality.
///
/// Enabling a feature requires the matching bridge; `build()` rejects the
/// combination otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Push offline progress through the `SyncScheduler`
    pub enable_offline_sync: bool,
    /// Derive online state from the `NetworkMonitor`
    pub enable_network_awareness: bool,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates settings and feature flags against the available bridges.
    pub fn validate(&self) -> Result<()> {
        self.progress.validate()?;

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.features.enable_offline_sync && self.sync_scheduler.is_none() {
            return Err(Error::Config(
                "Offline sync enabled but no SyncScheduler provided. \
                 Disable the feature or inject a SyncScheduler implementation."
                    .to_string(),
            ));
        }

        if self.features.enable_network_awareness && self.network_monitor.is_none() {
            return Err(Error::Config(
                "Network awareness enabled but no NetworkMonitor provided. \
                 Disable the feature or inject a NetworkMonitor implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    playback_api: Option<Arc<dyn PlaybackApi>>,
    progress_store: Option<Arc<dyn LocalProgressStore>>,
    sync_scheduler: Option<Arc<dyn SyncScheduler>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Option<Arc<dyn Clock>>,
    progress: Option<ProgressSettings>,
    event_buffer_size: Option<usize>,
    features: Option<FeatureFlags>,
}

impl CoreConfigBuilder {
    /// Sets the playback API implementation (required).
    pub fn playback_api(mut self, api: Arc<dyn PlaybackApi>) -> Self {
        self.playback_api = Some(api);
        self
    }

    /// Sets the local progress store implementation (required).
    pub fn progress_store(mut self, store: Arc<dyn LocalProgressStore>) -> Self {
        self.progress_store = Some(store);
        self
    }

    /// Sets the sync scheduler. Enables offline sync unless flags say otherwise.
    pub fn sync_scheduler(mut self, scheduler: Arc<dyn SyncScheduler>) -> Self {
        self.sync_scheduler = Some(scheduler);
        self
    }

    /// Sets the network monitor. Enables network awareness unless flags say otherwise.
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn progress_settings(mut self, settings: ProgressSettings) -> Self {
        self.progress = Some(settings);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Overrides the feature flags derived from the provided bridges.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }

    /// Builds the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` when `PlaybackApi` or `LocalProgressStore` is absent
    /// - `Config` when settings are out of range or a feature lacks its bridge
    pub fn build(self) -> Result<CoreConfig> {
        let playback_api = self.playback_api.ok_or_else(|| Error::CapabilityMissing {
            capability: "PlaybackApi".to_string(),
            message: "A PlaybackApi implementation is required to report progress. \
                      Use .playback_api() to inject the host's API client."
                .to_string(),
        })?;

        let progress_store = self.progress_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "LocalProgressStore".to_string(),
            message: "A LocalProgressStore implementation is required for offline progress. \
                      Use .progress_store() to inject the host's database adapter."
                .to_string(),
        })?;

        let features = self.features.unwrap_or(FeatureFlags {
            enable_offline_sync: self.sync_scheduler.is_some(),
            enable_network_awareness: self.network_monitor.is_some(),
        });

        let config = CoreConfig {
            playback_api,
            progress_store,
            sync_scheduler: self.sync_scheduler,
            network_monitor: self.network_monitor,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            progress: self.progress.unwrap_or_default(),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        NetworkInfo, NetworkType, PlaybackToken, ProgressUpdateRequest, ProgressUpdateResponse,
        ProgressionRecord, TaskConstraints,
    };
    use chrono::{DateTime, Utc};

    struct StubApi;

    #[async_trait]
    impl PlaybackApi for StubApi {
        async fn acquire_token(&self) -> BridgeResult<PlaybackToken> {
            Ok(PlaybackToken::new("t"))
        }

        async fn update_progress(
            &self,
            _request: ProgressUpdateRequest,
        ) -> BridgeResult<ProgressUpdateResponse> {
            Ok(ProgressUpdateResponse {
                http_status: 200,
                server_progress_seconds: None,
            })
        }
    }

    struct StubStore;

    #[async_trait]
    impl LocalProgressStore for StubStore {
        async fn update_local_progression(&self, _record: &ProgressionRecord) -> BridgeResult<()> {
            Ok(())
        }

        async fn update_watch_stat(
            &self,
            _content_id: &str,
            _duration_seconds: i64,
            _watched_at: DateTime<Utc>,
        ) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct StubScheduler;

    #[async_trait]
    impl SyncScheduler for StubScheduler {
        async fn enqueue_progress_sync(
            &self,
            _content_id: &str,
            _constraints: TaskConstraints,
        ) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct StubMonitor;

    #[async_trait]
    impl NetworkMonitor for StubMonitor {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
            Ok(NetworkInfo::connected(NetworkType::WiFi))
        }
    }

    fn required() -> CoreConfigBuilder {
        CoreConfig::builder()
            .playback_api(Arc::new(StubApi))
            .progress_store(Arc::new(StubStore))
    }

    #[test]
    fn test_builder_requires_playback_api() {
        let err = CoreConfig::builder()
            .progress_store(Arc::new(StubStore))
            .build()
            .unwrap_err();
        assert!(
            matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "PlaybackApi")
        );
    }

    #[test]
    fn test_builder_requires_progress_store() {
        let err = CoreConfig::builder()
            .playback_api(Arc::new(StubApi))
            .build()
            .unwrap_err();
        assert!(
            matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "LocalProgressStore")
        );
    }

    #[test]
    fn test_builder_defaults() {
        let config = required().build().unwrap();
        assert_eq!(config.progress, ProgressSettings::default());
        assert_eq!(config.progress.throttle_seconds, 5);
        assert_eq!(config.progress.finished_threshold_percent, 99);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.features, FeatureFlags::default());
        assert!(config.sync_scheduler.is_none());
    }

    #[test]
    fn test_optional_bridges_enable_features() {
        let config = required()
            .sync_scheduler(Arc::new(StubScheduler))
            .network_monitor(Arc::new(StubMonitor))
            .build()
            .unwrap();
        assert!(config.features.enable_offline_sync);
        assert!(config.features.enable_network_awareness);
    }

    #[test]
    fn test_feature_without_bridge_is_rejected() {
        let err = required()
            .features(FeatureFlags {
                enable_offline_sync: true,
                enable_network_awareness: false,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("SyncScheduler"));
    }

    #[test]
    fn test_invalid_progress_settings_are_rejected() {
        let err = required()
            .progress_settings(ProgressSettings {
                throttle_seconds: 0,
                finished_threshold_percent: 99,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = required()
            .progress_settings(ProgressSettings {
                throttle_seconds: 5,
                finished_threshold_percent: 101,
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("101"));
    }

    #[test]
    fn test_zero_event_buffer_is_rejected() {
        assert!(required().event_buffer_size(0).build().is_err());
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = required().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("PlaybackApi { ... }"));
        assert!(debug.contains("throttle_seconds: 5"));
    }
}
