//! Background Sync Scheduling
//!
//! The core only *requests* that offline progress be pushed later; when and
//! how the work runs is up to the host scheduler.

use async_trait::async_trait;

use crate::error::Result;

/// Task execution constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConstraints {
    /// Require WiFi connection
    pub requires_wifi: bool,
    /// Require any network connection
    pub requires_network: bool,
    /// Require device to be charging
    pub requires_charging: bool,
}

impl Default for TaskConstraints {
    fn default() -> Self {
        Self {
            requires_wifi: false,
            requires_network: true,
            requires_charging: false,
        }
    }
}

/// Sync scheduler trait
///
/// Platform mapping:
/// - **Android**: WorkManager unique work keyed by content id
/// - **iOS**: BGTaskScheduler
/// - **Desktop**: in-process queue drained on reconnect
///
/// Enqueuing the same content twice before it drains must be harmless.
#[async_trait]
pub trait SyncScheduler: Send + Sync {
    /// Ask the host to push unsynced progress for `content_id`
    async fn enqueue_progress_sync(
        &self,
        content_id: &str,
        constraints: TaskConstraints,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_constraints() {
        let constraints = TaskConstraints {
            requires_wifi: true,
            ..Default::default()
        };

        assert!(constraints.requires_wifi);
        assert!(constraints.requires_network);
        assert!(!constraints.requires_charging);
    }
}
