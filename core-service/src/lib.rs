//! Core service façade.
//!
//! This crate wires the host-provided bridges from a [`CoreConfig`] into the
//! course client core: the graph resolver, the download roll-up and the
//! progress synchronizer, all publishing to one [`EventBus`].
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::CourseService;
//!
//! let config = CoreConfig::builder()
//!     .playback_api(api)
//!     .progress_store(store)
//!     .build()?;
//! let service = CourseService::builder().config(config).build()?;
//!
//! let collection = service.load_collection_json(&body)?;
//! let episodes = service.episode_list(&collection, &[]);
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::ProgressionRecord;
use core_graph::{Attributes, EpisodeListEntry, GraphResolver, Payload, Resource, ResourceKind};
use core_offline::CollectionRollup;
use core_progress::{
    progression_resource, PlaybackTarget, ProgressSynchronizer, ResumeOutcome, TickOutcome,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, DownloadEvent, EventBus, EventStream, LibraryEvent};
use tracing::{debug, instrument};

#[cfg(feature = "http-api")]
pub use core_progress::HttpPlaybackApi;

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share the synchronizer and the event bus.
#[derive(Clone)]
pub struct CourseService {
    config: Arc<CoreConfig>,
    events: EventBus,
    resolver: GraphResolver,
    rollup: CollectionRollup,
    synchronizer: Arc<ProgressSynchronizer>,
}

impl CourseService {
    pub fn builder() -> CourseServiceBuilder {
        CourseServiceBuilder::default()
    }

    /// Create a service with default resolver settings and a fresh event bus.
    pub fn new(config: CoreConfig) -> Self {
        let events = EventBus::new(config.event_buffer_size);
        Self::assemble(config, events, GraphResolver::new())
    }

    fn assemble(config: CoreConfig, events: EventBus, resolver: GraphResolver) -> Self {
        let synchronizer = Arc::new(ProgressSynchronizer::from_config(&config, events.clone()));
        Self {
            config: Arc::new(config),
            events,
            resolver,
            rollup: CollectionRollup::new(),
            synchronizer,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to every event published by the core.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn synchronizer(&self) -> &ProgressSynchronizer {
        &self.synchronizer
    }

    // =========================================================================
    // Graph
    // =========================================================================

    /// Resolve a parsed payload into a populated collection graph.
    pub fn load_collection(&self, payload: &Payload) -> Resource {
        let resolved = self.resolver.resolve_payload(payload);
        debug!(
            id = resolved.id.as_deref().unwrap_or("-"),
            included = payload.included.len(),
            "Collection resolved"
        );
        resolved
    }

    /// Parse and resolve a JSON:API document.
    ///
    /// # Errors
    ///
    /// Fails when the document is malformed or names an unknown resource type.
    pub fn load_collection_json(&self, json: &str) -> Result<Resource> {
        let payload = Payload::from_json(json)?;
        Ok(self.load_collection(&payload))
    }

    /// Flatten a collection's groups into the rows an episode list renders.
    pub fn episode_list(&self, collection: &Resource, sideload: &[Resource]) -> Vec<EpisodeListEntry> {
        self.resolver.episode_list_for(collection, sideload)
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    /// Mark a content item finished or unfinished through its progression.
    ///
    /// # Errors
    ///
    /// `InvalidResource` when `content` has no id.
    pub fn toggle_finished(&self, content: &Resource, finished: bool) -> Result<Resource> {
        let content_id = Self::content_id(content)?;
        let progression = content.progression().cloned().unwrap_or_else(|| Resource {
            kind: Some(ResourceKind::Progression),
            attributes: Some(Attributes {
                content_id: Some(content_id.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let updated = content.with_progression(progression.toggle_finished(content_id, finished));

        self.emit(CoreEvent::Library(LibraryEvent::FinishedToggled {
            content_id: content_id.to_string(),
            finished,
        }));
        Ok(updated)
    }

    /// Add a bookmark stub, or remove the existing bookmark.
    ///
    /// # Errors
    ///
    /// `InvalidResource` when `content` has no id.
    pub fn toggle_bookmark(&self, content: &Resource) -> Result<Resource> {
        let content_id = Self::content_id(content)?;
        let bookmarked = !content.is_bookmarked();
        let updated = if bookmarked {
            content.with_bookmark(Some(Resource::bookmark_stub(content_id)))
        } else {
            content.with_bookmark(None)
        };

        self.emit(CoreEvent::Library(LibraryEvent::BookmarkToggled {
            content_id: content_id.to_string(),
            bookmarked,
        }));
        Ok(updated)
    }

    /// Attach a locally stored progression record to its content item.
    pub fn apply_progression(&self, content: &Resource, record: &ProgressionRecord) -> Resource {
        content.with_progression(progression_resource(record))
    }

    /// Recompute a collection's download overlay from its episodes.
    ///
    /// Publishes `AggregateChanged` only when the overlay actually changed.
    pub fn refresh_download_rollup(&self, collection: &Resource) -> Resource {
        let updated = self.rollup.apply(collection);
        if updated.local_state != collection.local_state {
            let state = updated.local_state.as_ref();
            self.emit(CoreEvent::Download(DownloadEvent::AggregateChanged {
                collection_id: collection.id.clone().unwrap_or_default(),
                status: state.map(|state| format!("{:?}", state.status)),
                progress_percent: state.map_or(0, |state| state.progress_percent),
                cached: state.is_some_and(|state| state.cached),
            }));
        }
        updated
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn begin_playback(&self, target: PlaybackTarget) {
        self.synchronizer.begin(target);
    }

    /// Start playing a resolved content resource.
    ///
    /// # Errors
    ///
    /// `InvalidResource` when `content` has no id.
    pub fn begin_playback_of(&self, content: &Resource) -> Result<()> {
        let target = PlaybackTarget::from_resource(content).ok_or_else(|| {
            CoreError::InvalidResource("cannot play a resource without an id".to_string())
        })?;
        self.begin_playback(target);
        Ok(())
    }

    pub fn stop_playback(&self) {
        self.synchronizer.stop();
    }

    /// Forward a playback tick to the synchronizer.
    ///
    /// Online state comes from the network monitor when network awareness is
    /// enabled; otherwise `host_reports_online` is trusted.
    #[instrument(skip(self))]
    pub async fn on_tick(&self, elapsed_millis: u64, host_reports_online: bool) -> Result<TickOutcome> {
        let is_online = match &self.config.network_monitor {
            Some(monitor) if self.config.features.enable_network_awareness => {
                monitor.is_connected().await
            }
            _ => host_reports_online,
        };
        let now = self.config.clock.now();
        Ok(self
            .synchronizer
            .record_tick(is_online, elapsed_millis, now)
            .await?)
    }

    pub async fn resume_playback(&self) -> ResumeOutcome {
        self.synchronizer.resume_playback().await
    }

    fn content_id(content: &Resource) -> Result<&str> {
        content.id.as_deref().ok_or_else(|| {
            CoreError::InvalidResource("content resource has no id".to_string())
        })
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is fine
        self.events.emit(event).ok();
    }
}

impl std::fmt::Debug for CourseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseService")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("synchronizer", &self.synchronizer)
            .finish()
    }
}

/// Builder for [`CourseService`].
#[derive(Default)]
pub struct CourseServiceBuilder {
    config: Option<CoreConfig>,
    events: Option<EventBus>,
    max_depth: Option<usize>,
}

impl CourseServiceBuilder {
    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing event bus instead of creating one.
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Nesting limit for graph resolution.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// # Errors
    ///
    /// `InitializationFailed` without a config or with a zero resolution depth.
    pub fn build(self) -> Result<CourseService> {
        let config = self.config.ok_or_else(|| {
            CoreError::InitializationFailed(
                "CourseService requires a CoreConfig. Use .config() to provide one.".to_string(),
            )
        })?;

        let resolver = match self.max_depth {
            Some(0) => {
                return Err(CoreError::InitializationFailed(
                    "max_depth must be at least 1".to_string(),
                ))
            }
            Some(depth) => GraphResolver::new().with_max_depth(depth),
            None => GraphResolver::new(),
        };

        let events = self
            .events
            .unwrap_or_else(|| EventBus::new(config.event_buffer_size));

        Ok(CourseService::assemble(config, events, resolver))
    }
}
