//! Local download overlay carried by resources.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownloadStatus {
    #[default]
    None,
    Created,
    InProgress,
    Completed,
    Failed,
    Paused,
}

/// Download/offline state of one resource.
///
/// `cached` says the resource's graph is available offline, which can be
/// true while the binary asset is still downloading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadState {
    /// 0..=100
    pub progress_percent: u8,
    pub status: DownloadStatus,
    pub failure_reason: Option<String>,
    pub url: Option<String>,
    pub cached: bool,
}

impl DownloadState {
    /// Create a state, clamping progress to 100.
    pub fn new(status: DownloadStatus, progress_percent: u8) -> Self {
        Self {
            progress_percent: progress_percent.min(100),
            status,
            ..Default::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            cached: true,
            ..Self::new(DownloadStatus::Completed, 100)
        }
    }

    pub fn in_progress(progress_percent: u8) -> Self {
        Self {
            cached: true,
            ..Self::new(DownloadStatus::InProgress, progress_percent)
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            failure_reason: Some(reason.into()),
            ..Self::new(DownloadStatus::Failed, 0)
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Finished downloading: either marked completed or at 100%.
    pub fn is_completed(&self) -> bool {
        self.status == DownloadStatus::Completed || self.progress_percent == 100
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == DownloadStatus::InProgress
    }
}
