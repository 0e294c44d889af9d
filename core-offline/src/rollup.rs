//! Applies the aggregate download state to a resolved collection.

use core_graph::{DownloadState, Resource};
use tracing::debug;

use crate::aggregator::DownloadAggregator;

/// Sets a collection's download overlay from its children's overlays.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionRollup {
    aggregator: DownloadAggregator,
}

impl CollectionRollup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaf overlays of `collection`'s episodes, gathered from `contents`
    /// and from every group's `contents`. Episodes listed twice count once.
    pub fn leaf_states(collection: &Resource) -> (Vec<String>, Vec<DownloadState>) {
        let mut expected_ids: Vec<String> = Vec::new();
        let mut leaves = Vec::new();

        let children = collection
            .child_resources()
            .iter()
            .chain(collection.groups().iter().flat_map(Resource::child_resources));
        for child in children {
            let Some(id) = child.id.as_deref() else {
                continue;
            };
            if expected_ids.iter().any(|seen| seen == id) {
                continue;
            }
            expected_ids.push(id.to_string());
            if let Some(state) = &child.local_state {
                leaves.push(state.clone());
            }
        }

        (expected_ids, leaves)
    }

    /// Return `collection` with its overlay replaced by the aggregate, or
    /// cleared when no child has a download state.
    pub fn apply(&self, collection: &Resource) -> Resource {
        let (expected_ids, leaves) = Self::leaf_states(collection);
        match self.aggregator.aggregate(&leaves, &expected_ids) {
            Some(state) => {
                debug!(
                    collection = collection.id.as_deref().unwrap_or("-"),
                    status = ?state.status,
                    progress = state.progress_percent,
                    "Collection download state rolled up"
                );
                collection.with_download_state(state)
            }
            None => collection.without_download_state(),
        }
    }
}
