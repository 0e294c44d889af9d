//! Display-ready rows of a collection's episode list.

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// Either a section header (`title` set) or an episode (`resource` set).
///
/// Episode positions run continuously across sections. A header carries
/// the position its slot computes to, but only episodes are numbered for
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeListEntry {
    pub title: Option<String>,
    pub resource: Option<Resource>,
    pub position: usize,
}

impl EpisodeListEntry {
    pub fn header(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            resource: None,
            position: 0,
        }
    }

    pub fn episode(resource: Resource) -> Self {
        Self {
            title: None,
            resource: Some(resource),
            position: 0,
        }
    }

    pub fn is_header(&self) -> bool {
        self.resource.is_none()
    }

    pub fn episode_id(&self) -> Option<&str> {
        self.resource.as_ref()?.id.as_deref()
    }
}
