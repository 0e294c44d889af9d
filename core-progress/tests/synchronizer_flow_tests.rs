//! Integration tests for the progress synchronizer
//!
//! These tests drive the synchronizer through hand-written bridge fakes:
//! - A report still in flight when the user switches content is discarded
//! - Ticks arriving during an in-flight report are throttled
//! - Offline records accumulate in the store and sync is requested
//! - Token rejection followed by a resume

use bridge_traits::{
    error::BridgeError, LocalProgressStore, PlaybackApi, PlaybackToken, ProgressUpdateRequest,
    ProgressUpdateResponse, ProgressionRecord, SyncScheduler, TaskConstraints,
};
use chrono::{DateTime, TimeZone, Utc};
use core_progress::{PlaybackTarget, ProgressSynchronizer, ResumeOutcome, TickOutcome};
use core_runtime::config::ProgressSettings;
use core_runtime::events::{CoreEvent, EventBus, ProgressEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, Notify};

// ============================================================================
// Fakes
// ============================================================================

/// Playback API whose progress call can be held open by the test
struct GatedPlaybackApi {
    gated: bool,
    entered: Notify,
    release: Notify,
    reject_with: AsyncMutex<Option<u16>>,
    tokens_issued: AsyncMutex<u32>,
    updates: AsyncMutex<Vec<ProgressUpdateRequest>>,
    server_progress_seconds: Option<i64>,
}

impl GatedPlaybackApi {
    fn new(gated: bool) -> Self {
        Self {
            gated,
            entered: Notify::new(),
            release: Notify::new(),
            reject_with: AsyncMutex::new(None),
            tokens_issued: AsyncMutex::new(0),
            updates: AsyncMutex::new(Vec::new()),
            server_progress_seconds: None,
        }
    }

    async fn reject_next(&self, status: u16) {
        *self.reject_with.lock().await = Some(status);
    }
}

#[async_trait::async_trait]
impl PlaybackApi for GatedPlaybackApi {
    async fn acquire_token(&self) -> bridge_traits::error::Result<PlaybackToken> {
        let mut issued = self.tokens_issued.lock().await;
        *issued += 1;
        Ok(PlaybackToken::new(format!("token-{}", *issued)))
    }

    async fn update_progress(
        &self,
        request: ProgressUpdateRequest,
    ) -> bridge_traits::error::Result<ProgressUpdateResponse> {
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.updates.lock().await.push(request);
        let status = self.reject_with.lock().await.take().unwrap_or(200);
        Ok(ProgressUpdateResponse {
            http_status: status,
            server_progress_seconds: self.server_progress_seconds,
        })
    }
}

#[derive(Default)]
struct InMemoryProgressStore {
    records: AsyncMutex<HashMap<String, ProgressionRecord>>,
    watch_seconds: AsyncMutex<HashMap<String, i64>>,
}

#[async_trait::async_trait]
impl LocalProgressStore for InMemoryProgressStore {
    async fn update_local_progression(
        &self,
        record: &ProgressionRecord,
    ) -> bridge_traits::error::Result<()> {
        self.records
            .lock()
            .await
            .insert(record.content_id.clone(), record.clone());
        Ok(())
    }

    async fn update_watch_stat(
        &self,
        content_id: &str,
        duration_seconds: i64,
        _watched_at: DateTime<Utc>,
    ) -> bridge_traits::error::Result<()> {
        // The synchronizer reports the session total, not an increment
        self.watch_seconds
            .lock()
            .await
            .insert(content_id.to_string(), duration_seconds);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingScheduler {
    enqueued: AsyncMutex<Vec<String>>,
}

#[async_trait::async_trait]
impl SyncScheduler for RecordingScheduler {
    async fn enqueue_progress_sync(
        &self,
        content_id: &str,
        constraints: TaskConstraints,
    ) -> bridge_traits::error::Result<()> {
        if !constraints.requires_network {
            return Err(BridgeError::OperationFailed(
                "progress sync must wait for network".to_string(),
            ));
        }
        self.enqueued.lock().await.push(content_id.to_string());
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn synchronizer(
    api: Arc<GatedPlaybackApi>,
    store: Arc<InMemoryProgressStore>,
) -> Arc<ProgressSynchronizer> {
    Arc::new(ProgressSynchronizer::new(
        api,
        store,
        ProgressSettings::default(),
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_in_flight_report_for_previous_content_is_stale() {
    let api = Arc::new(GatedPlaybackApi::new(true));
    let sync = synchronizer(Arc::clone(&api), Arc::new(InMemoryProgressStore::default()));
    sync.begin(PlaybackTarget::new("episode-1"));

    let in_flight = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.record_tick(true, 30_000, now()).await })
    };

    api.entered.notified().await;
    sync.begin(PlaybackTarget::new("episode-2"));
    api.release.notify_one();

    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, TickOutcome::Stale);
    // The new session starts from scratch
    assert_eq!(sync.watermark_seconds(), 0);
    assert_eq!(api.updates.lock().await.len(), 1);
}

#[tokio::test]
async fn test_tick_during_in_flight_report_is_throttled() {
    let api = Arc::new(GatedPlaybackApi::new(true));
    let sync = synchronizer(Arc::clone(&api), Arc::new(InMemoryProgressStore::default()));
    sync.begin(PlaybackTarget::new("episode-1"));

    let in_flight = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.record_tick(true, 10_000, now()).await })
    };

    api.entered.notified().await;
    assert_eq!(sync.watermark_seconds(), 10);
    let concurrent = sync.record_tick(true, 12_000, now()).await.unwrap();
    assert_eq!(concurrent, TickOutcome::Throttled);

    api.release.notify_one();
    let outcome = in_flight.await.unwrap().unwrap();
    assert!(matches!(
        outcome,
        TickOutcome::Reported {
            progress_seconds: 10,
            delta_seconds: 10,
            ..
        }
    ));
}

#[tokio::test]
async fn test_offline_session_persists_and_requests_sync() {
    let api = Arc::new(GatedPlaybackApi::new(false));
    let store = Arc::new(InMemoryProgressStore::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let bus = EventBus::new(32);
    let mut events = bus.subscribe();

    let sync = ProgressSynchronizer::new(
        Arc::clone(&api) as Arc<dyn PlaybackApi>,
        Arc::clone(&store) as Arc<dyn LocalProgressStore>,
        ProgressSettings::default(),
    )
    .with_scheduler(Arc::clone(&scheduler) as Arc<dyn SyncScheduler>)
    .with_event_bus(bus);

    sync.begin(PlaybackTarget::new("episode-1").with_duration(200));

    for elapsed_seconds in [20_u64, 22, 40, 60, 198] {
        sync.record_tick(false, elapsed_seconds * 1000, now())
            .await
            .unwrap();
    }

    let records = store.records.lock().await;
    let record = &records["episode-1"];
    assert_eq!(record.progress_seconds, 198);
    assert_eq!(record.percent_complete, 99);
    assert!(record.finished);
    assert!(!record.synced);

    assert_eq!(store.watch_seconds.lock().await["episode-1"], 178);
    // One request per stored record
    assert_eq!(scheduler.enqueued.lock().await.len(), 4);
    assert!(api.updates.lock().await.is_empty());

    let mut stored = 0;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Progress(ProgressEvent::StoredOffline { .. }) = event {
            stored += 1;
        }
    }
    assert_eq!(stored, 4);
}

#[tokio::test]
async fn test_rejected_token_then_resume() {
    let api = Arc::new(GatedPlaybackApi::new(false));
    let sync = synchronizer(Arc::clone(&api), Arc::new(InMemoryProgressStore::default()));
    sync.begin(PlaybackTarget::new("episode-1"));

    api.reject_next(400).await;
    let rejected = sync.record_tick(true, 10_000, now()).await.unwrap();
    assert_eq!(rejected, TickOutcome::TokenInvalid);

    let blocked = sync.record_tick(true, 20_000, now()).await.unwrap();
    assert_eq!(blocked, TickOutcome::TokenInvalid);

    assert_eq!(sync.resume_playback().await, ResumeOutcome::Ready);

    let reported = sync.record_tick(true, 20_000, now()).await.unwrap();
    assert!(matches!(
        reported,
        TickOutcome::Reported {
            progress_seconds: 20,
            delta_seconds: 10,
            ..
        }
    ));

    let updates = api.updates.lock().await;
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].token.as_str(), "token-1");
    assert_eq!(updates[1].token.as_str(), "token-2");
}
