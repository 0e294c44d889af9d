//! # Progress Synchronizer
//!
//! Turns playback ticks into progress reports.
//!
//! ## Overview
//!
//! One synchronizer drives one playback session at a time. Each tick is
//! routed to one of two paths:
//!
//! - **online**: reports the position through the [`PlaybackApi`], reacting
//!   to token rejection and surfacing server progress that is ahead of ours
//! - **offline**: persists a [`ProgressionRecord`] with `synced = false`,
//!   accumulates watch time and asks the [`SyncScheduler`] to push it later
//!
//! Both paths share the [`Watermark`] throttle. The watermark advances
//! before the remote call is issued, so a tick arriving while a call is in
//! flight never reports the same seconds again. A failed call is not
//! retried for the same delta: delivery is at-most-once.
//!
//! ## Concurrency
//!
//! Session state lives behind a `parking_lot::Mutex` that is only locked in
//! short synchronous sections and never held across an `.await`. A remote
//! answer is applied only if the content it was issued for is still the
//! active one.

use std::sync::Arc;

use bridge_traits::{
    BridgeError, LocalProgressStore, PlaybackApi, PlaybackToken, ProgressUpdateRequest,
    ProgressionRecord, SyncScheduler, TaskConstraints,
};
use chrono::{DateTime, Utc};
use core_graph::Resource;
use core_runtime::config::{CoreConfig, ProgressSettings};
use core_runtime::events::{CoreEvent, EventBus, ProgressEvent};
use core_runtime::logging::redact_if_sensitive;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProgressError, Result};
use crate::record::offline_record;
use crate::token::TokenState;
use crate::watermark::Watermark;

/// Sentinel for "no tick seen yet in this session".
const SESSION_UNSET: i64 = -1;

/// The content item being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackTarget {
    pub content_id: String,
    /// Existing progression record id, if the server already has one
    pub progression_id: Option<String>,
    pub duration_seconds: Option<i64>,
    /// Played from a local download
    pub is_downloaded: bool,
}

impl PlaybackTarget {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            progression_id: None,
            duration_seconds: None,
            is_downloaded: false,
        }
    }

    pub fn with_duration(mut self, duration_seconds: i64) -> Self {
        self.duration_seconds = Some(duration_seconds);
        self
    }

    pub fn with_progression_id(mut self, progression_id: impl Into<String>) -> Self {
        self.progression_id = Some(progression_id.into());
        self
    }

    pub fn downloaded(mut self, is_downloaded: bool) -> Self {
        self.is_downloaded = is_downloaded;
        self
    }

    /// Target for a resolved content resource. `None` without an id.
    pub fn from_resource(resource: &Resource) -> Option<Self> {
        let content_id = resource.id.clone()?;
        Some(Self {
            content_id,
            progression_id: resource.progression().and_then(|p| p.id.clone()),
            duration_seconds: resource.duration_seconds(),
            is_downloaded: resource
                .local_state
                .as_ref()
                .is_some_and(|state| state.is_completed()),
        })
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Zero elapsed time or no active content
    Skipped,
    /// Below the throttle since the last report
    Throttled,
    /// The server accepted the update
    Reported {
        progress_seconds: i64,
        delta_seconds: i64,
        /// Server progress, when it is ahead of the watermark
        server_ahead_seconds: Option<i64>,
    },
    /// The playback token is invalid; `resume_playback` must run first
    TokenInvalid,
    /// The update could not be delivered and was dropped
    Dropped,
    /// Progress was persisted locally for a later push
    StoredOffline(ProgressionRecord),
    /// The active content changed while the call was in flight
    Stale,
}

/// Result of reacquiring the playback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Ready,
    /// Recoverable: the user can retry playback
    ResetRequired { reason: String },
}

#[derive(Debug)]
struct SessionState {
    active: Option<PlaybackTarget>,
    watermark: Watermark,
    session_start_seconds: i64,
    token: TokenState,
}

impl SessionState {
    fn is_active(&self, content_id: &str) -> bool {
        self.active
            .as_ref()
            .is_some_and(|target| target.content_id == content_id)
    }
}

pub struct ProgressSynchronizer {
    api: Arc<dyn PlaybackApi>,
    store: Arc<dyn LocalProgressStore>,
    scheduler: Option<Arc<dyn SyncScheduler>>,
    events: Option<EventBus>,
    settings: ProgressSettings,
    state: Mutex<SessionState>,
}

impl ProgressSynchronizer {
    pub fn new(
        api: Arc<dyn PlaybackApi>,
        store: Arc<dyn LocalProgressStore>,
        settings: ProgressSettings,
    ) -> Self {
        Self {
            api,
            store,
            scheduler: None,
            events: None,
            settings,
            state: Mutex::new(SessionState {
                active: None,
                watermark: Watermark::new(settings.throttle_seconds),
                session_start_seconds: SESSION_UNSET,
                token: TokenState::default(),
            }),
        }
    }

    /// Build from a validated configuration, honoring its feature flags.
    pub fn from_config(config: &CoreConfig, events: EventBus) -> Self {
        let mut synchronizer = Self::new(
            Arc::clone(&config.playback_api),
            Arc::clone(&config.progress_store),
            config.progress,
        )
        .with_event_bus(events);
        if config.features.enable_offline_sync {
            synchronizer.scheduler = config.sync_scheduler.clone();
        }
        synchronizer
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn SyncScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Start a playback session, resetting the watermark and session start.
    ///
    /// The token survives: it belongs to the user, not to the content.
    pub fn begin(&self, target: PlaybackTarget) {
        debug!(content_id = %target.content_id, "Beginning playback session");
        let mut state = self.state.lock();
        state.active = Some(target);
        state.watermark.reset();
        state.session_start_seconds = SESSION_UNSET;
    }

    /// End the session. Results still in flight are discarded as stale.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.active = None;
        state.watermark.reset();
        state.session_start_seconds = SESSION_UNSET;
    }

    pub fn active_target(&self) -> Option<PlaybackTarget> {
        self.state.lock().active.clone()
    }

    pub fn watermark_seconds(&self) -> i64 {
        self.state.lock().watermark.last_reported_seconds()
    }

    /// `-1` until the first tick of the session.
    pub fn session_start_seconds(&self) -> i64 {
        self.state.lock().session_start_seconds
    }

    pub fn token_state(&self) -> TokenState {
        self.state.lock().token.clone()
    }

    // =========================================================================
    // Ticks
    // =========================================================================

    /// Handle a playback tick at `elapsed_millis` into the active content.
    ///
    /// Online ticks for downloaded items refresh the playback token before
    /// reporting, but only once the tick has passed the throttle. A throttled
    /// tick makes no remote call at all, so a token endpoint rejecting the
    /// user is noticed on the next tick that would actually report.
    ///
    /// # Errors
    ///
    /// Only a failure to persist progress locally is an error. Network and
    /// token problems are reported through [`TickOutcome`].
    #[instrument(skip(self, now))]
    pub async fn record_tick(
        &self,
        is_online: bool,
        elapsed_millis: u64,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome> {
        if elapsed_millis == 0 {
            return Ok(TickOutcome::Skipped);
        }
        let Some(target) = self.active_target() else {
            return Ok(TickOutcome::Skipped);
        };

        let progress_seconds = i64::try_from(elapsed_millis / 1000).unwrap_or(i64::MAX);

        if is_online {
            Ok(self.report_online(target, progress_seconds).await)
        } else {
            self.store_offline(target, progress_seconds, now).await
        }
    }

    async fn report_online(&self, target: PlaybackTarget, progress_seconds: i64) -> TickOutcome {
        if let Some(outcome) = self.precheck_online(progress_seconds) {
            return outcome;
        }

        if target.is_downloaded {
            // Downloaded items can sit unplayed for a long time; start from a fresh token.
            if let Some(outcome) = self.refresh_token(&target.content_id).await {
                return outcome;
            }
        }

        let token = match self.current_token() {
            Some(token) => token,
            None => match self.refresh_token(&target.content_id).await {
                Some(outcome) => return outcome,
                None => match self.current_token() {
                    Some(token) => token,
                    None => return TickOutcome::Dropped,
                },
            },
        };

        let delta_seconds = match self.advance_watermark(&target.content_id, progress_seconds) {
            Ok(delta) => delta,
            Err(outcome) => return outcome,
        };

        let request = ProgressUpdateRequest {
            token,
            content_id: target.content_id.clone(),
            progress_seconds,
            delta_seconds,
        };

        match self.api.update_progress(request).await {
            Ok(response) if response.is_client_error() => {
                self.invalidate_token(Some(&target.content_id), Some(response.http_status));
                TickOutcome::TokenInvalid
            }
            Ok(response) if !response.is_success() => {
                debug!(
                    content_id = %target.content_id,
                    status = response.http_status,
                    "Progress update rejected by server, dropping"
                );
                TickOutcome::Dropped
            }
            Ok(response) => self.apply_report(
                &target.content_id,
                progress_seconds,
                delta_seconds,
                response.server_progress_seconds,
            ),
            Err(BridgeError::Http { status, .. }) if (400..500).contains(&status) => {
                self.invalidate_token(Some(&target.content_id), Some(status));
                TickOutcome::TokenInvalid
            }
            Err(err) => {
                debug!(content_id = %target.content_id, error = %err, "Progress update failed, dropping");
                TickOutcome::Dropped
            }
        }
    }

    /// Outcome that ends the online path before any network call.
    fn precheck_online(&self, progress_seconds: i64) -> Option<TickOutcome> {
        let state = self.state.lock();
        if state.token.is_invalid() {
            return Some(TickOutcome::TokenInvalid);
        }
        if !state.watermark.would_advance(progress_seconds) {
            return Some(TickOutcome::Throttled);
        }
        None
    }

    fn current_token(&self) -> Option<PlaybackToken> {
        self.state.lock().token.token().cloned()
    }

    fn advance_watermark(
        &self,
        content_id: &str,
        progress_seconds: i64,
    ) -> std::result::Result<i64, TickOutcome> {
        let mut state = self.state.lock();
        if !state.is_active(content_id) {
            return Err(TickOutcome::Stale);
        }
        state
            .watermark
            .advance(progress_seconds)
            .ok_or(TickOutcome::Throttled)
    }

    fn apply_report(
        &self,
        content_id: &str,
        progress_seconds: i64,
        delta_seconds: i64,
        server_progress_seconds: Option<i64>,
    ) -> TickOutcome {
        let server_ahead_seconds = {
            let state = self.state.lock();
            if !state.is_active(content_id) {
                debug!(content_id, "Active content changed during report, ignoring answer");
                return TickOutcome::Stale;
            }
            let watermark = state.watermark.last_reported_seconds();
            server_progress_seconds.filter(|server| *server > watermark)
        };

        self.emit(ProgressEvent::Reported {
            content_id: content_id.to_string(),
            progress_seconds,
            delta_seconds,
        });
        if let Some(server_seconds) = server_ahead_seconds {
            info!(content_id, server_seconds, "Server progress is ahead of local playback");
            self.emit(ProgressEvent::ServerAhead {
                content_id: content_id.to_string(),
                local_seconds: progress_seconds,
                server_seconds,
            });
        }

        TickOutcome::Reported {
            progress_seconds,
            delta_seconds,
            server_ahead_seconds,
        }
    }

    /// Acquire a token. `None` means a token is in place and the tick may
    /// continue; `Some` is the outcome that ends the tick.
    async fn refresh_token(&self, content_id: &str) -> Option<TickOutcome> {
        match self.api.acquire_token().await {
            Ok(token) => {
                debug!(
                    content_id,
                    playback_token = %redact_if_sensitive("playback_token", token.as_str()),
                    "Playback token refreshed"
                );
                self.state.lock().token.accept(token);
                None
            }
            Err(BridgeError::Http { status, .. }) if (400..500).contains(&status) => {
                self.invalidate_token(Some(content_id), Some(status));
                Some(TickOutcome::TokenInvalid)
            }
            Err(err) => {
                debug!(content_id, error = %err, "Token refresh failed");
                // An older token may still be accepted
                if self.current_token().is_some() {
                    None
                } else {
                    Some(TickOutcome::Dropped)
                }
            }
        }
    }

    fn invalidate_token(&self, content_id: Option<&str>, http_status: Option<u16>) {
        warn!(content_id, http_status, "Playback token rejected");
        self.state.lock().token.invalidate();
        self.emit(ProgressEvent::TokenInvalidated {
            content_id: content_id.map(str::to_string),
            http_status,
        });
    }

    async fn store_offline(
        &self,
        target: PlaybackTarget,
        progress_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome> {
        let watched_seconds = match self.advance_offline(&target.content_id, progress_seconds) {
            Ok(watched) => watched,
            Err(outcome) => return Ok(outcome),
        };

        let record = offline_record(
            &target.content_id,
            target.progression_id.clone(),
            progress_seconds,
            target.duration_seconds,
            self.settings.finished_threshold_percent,
            now,
        );

        self.store
            .update_local_progression(&record)
            .await
            .map_err(ProgressError::Storage)?;

        if let Err(err) = self
            .store
            .update_watch_stat(&target.content_id, watched_seconds, now)
            .await
        {
            warn!(content_id = %target.content_id, error = %err, "Failed to record watch time");
        }

        debug!(
            content_id = %target.content_id,
            percent = record.percent_complete,
            finished = record.finished,
            "Progress stored offline"
        );
        self.emit(ProgressEvent::StoredOffline {
            content_id: target.content_id.clone(),
            percent_complete: record.percent_complete,
            finished: record.finished,
        });

        self.enqueue_sync(&target.content_id).await;

        Ok(TickOutcome::StoredOffline(record))
    }

    /// Throttle an offline tick. Returns watched seconds since the session
    /// started.
    fn advance_offline(
        &self,
        content_id: &str,
        progress_seconds: i64,
    ) -> std::result::Result<i64, TickOutcome> {
        let mut state = self.state.lock();
        if !state.is_active(content_id) {
            return Err(TickOutcome::Stale);
        }
        if state.session_start_seconds == SESSION_UNSET {
            state.session_start_seconds = progress_seconds;
        }
        state
            .watermark
            .advance(progress_seconds)
            .ok_or(TickOutcome::Throttled)?;
        Ok(progress_seconds - state.session_start_seconds)
    }

    async fn enqueue_sync(&self, content_id: &str) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        match scheduler
            .enqueue_progress_sync(content_id, TaskConstraints::default())
            .await
        {
            Ok(()) => self.emit(ProgressEvent::SyncEnqueued {
                content_id: content_id.to_string(),
            }),
            Err(err) => warn!(content_id, error = %err, "Failed to enqueue progress sync"),
        }
    }

    // =========================================================================
    // Resume
    // =========================================================================

    /// Reacquire the playback token after an interruption.
    ///
    /// Failure is not fatal: the token is marked invalid and the caller is
    /// told to offer a reset.
    #[instrument(skip(self))]
    pub async fn resume_playback(&self) -> ResumeOutcome {
        match self.api.acquire_token().await {
            Ok(token) => {
                self.state.lock().token.accept(token);
                info!("Playback token reacquired");
                ResumeOutcome::Ready
            }
            Err(err) => {
                warn!(error = %err, "Could not reacquire playback token");
                self.state.lock().token.invalidate();
                let reason = err.to_string();
                self.emit(ProgressEvent::ResetRequired {
                    message: reason.clone(),
                });
                ResumeOutcome::ResetRequired { reason }
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(events) = &self.events {
            events.emit(CoreEvent::Progress(event)).ok();
        }
    }
}

impl std::fmt::Debug for ProgressSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSynchronizer")
            .field("settings", &self.settings)
            .field("has_scheduler", &self.scheduler.is_some())
            .field("state", &*self.state.lock())
            .finish()
    }
}
