//! Closed set of resource kinds the server sends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A playable item or a collection of them
    #[serde(rename = "contents")]
    Content,
    #[serde(rename = "domains")]
    Domain,
    #[serde(rename = "progressions")]
    Progression,
    #[serde(rename = "bookmarks")]
    Bookmark,
    /// Section header grouping episodes of a collection
    #[serde(rename = "groups")]
    Group,
    /// A downloadable rendition of a content item
    #[serde(rename = "download_qualities")]
    DownloadQuality,
}

impl ResourceKind {
    /// JSON:API `type` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Content => "contents",
            ResourceKind::Domain => "domains",
            ResourceKind::Progression => "progressions",
            ResourceKind::Bookmark => "bookmarks",
            ResourceKind::Group => "groups",
            ResourceKind::DownloadQuality => "download_qualities",
        }
    }

    /// Kinds whose records point back at a content item through `contentId`.
    pub fn carries_content_key(&self) -> bool {
        matches!(self, ResourceKind::Progression | ResourceKind::Bookmark)
    }
}

impl FromStr for ResourceKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contents" => Ok(ResourceKind::Content),
            "domains" => Ok(ResourceKind::Domain),
            "progressions" => Ok(ResourceKind::Progression),
            "bookmarks" => Ok(ResourceKind::Bookmark),
            "groups" => Ok(ResourceKind::Group),
            "download_qualities" => Ok(ResourceKind::DownloadQuality),
            other => Err(GraphError::UnsupportedKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
