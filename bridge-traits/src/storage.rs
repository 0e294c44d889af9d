//! Local Progress Persistence
//!
//! The host owns the on-device database; the core hands it progression
//! records and watch statistics to persist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Watch progress for one content item.
///
/// `synced = false` marks a record produced offline that still has to be
/// pushed to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub content_id: String,
    pub progression_id: Option<String>,
    /// 0..=100
    pub percent_complete: u8,
    pub progress_seconds: i64,
    pub finished: bool,
    pub updated_at: DateTime<Utc>,
    pub synced: bool,
}

/// Local progress store trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{LocalProgressStore, ProgressionRecord};
///
/// async fn persist(store: &dyn LocalProgressStore, record: ProgressionRecord) -> Result<()> {
///     store.update_local_progression(&record).await?;
///     store.update_watch_stat(&record.content_id, 30, record.updated_at).await
/// }
/// ```
#[async_trait]
pub trait LocalProgressStore: Send + Sync {
    /// Insert or replace the progression record for `record.content_id`
    async fn update_local_progression(&self, record: &ProgressionRecord) -> Result<()>;

    /// Record how long the content was watched in the current session
    async fn update_watch_stat(
        &self,
        content_id: &str,
        duration_seconds: i64,
        watched_at: DateTime<Utc>,
    ) -> Result<()>;
}
