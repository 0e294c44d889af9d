//! Rolls leaf download states up into one parent state.

use core_graph::{DownloadState, DownloadStatus};
use tracing::trace;

/// Computes a collection's download state from its episodes' states.
///
/// Precedence: any leaf in progress wins over all leaves completed, which
/// wins over everything else. A parent never reports `InProgress`; while a
/// child streams the parent shows as paused with the averaged progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadAggregator;

impl DownloadAggregator {
    pub fn new() -> Self {
        Self
    }

    /// `None` when there are no leaf states yet.
    ///
    /// `expected_ids` are the episodes the parent should contain; the parent
    /// is only complete when every one of them has a completed leaf.
    pub fn aggregate<S: AsRef<str>>(
        &self,
        leaf_downloads: &[DownloadState],
        expected_ids: &[S],
    ) -> Option<DownloadState> {
        if leaf_downloads.is_empty() {
            return None;
        }

        if leaf_downloads.iter().any(DownloadState::is_in_progress) {
            let total: usize = leaf_downloads
                .iter()
                .map(|leaf| usize::from(leaf.progress_percent))
                .sum();
            let average = total / leaf_downloads.len();
            trace!(average, leaves = leaf_downloads.len(), "Download in progress");
            return Some(DownloadState {
                cached: true,
                ..DownloadState::new(DownloadStatus::Paused, average.min(100) as u8)
            });
        }

        if expected_ids.len() == leaf_downloads.len()
            && leaf_downloads.iter().all(DownloadState::is_completed)
        {
            return Some(DownloadState::completed());
        }

        let cached = leaf_downloads
            .iter()
            .any(|leaf| leaf.is_completed() || leaf.is_in_progress());
        Some(DownloadState {
            cached,
            ..DownloadState::new(DownloadStatus::Paused, 0)
        })
    }
}

/// [`DownloadAggregator::aggregate`] as a free function.
pub fn aggregate<S: AsRef<str>>(
    leaf_downloads: &[DownloadState],
    expected_ids: &[S],
) -> Option<DownloadState> {
    DownloadAggregator.aggregate(leaf_downloads, expected_ids)
}
