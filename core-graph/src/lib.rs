//! # Resource Graph
//!
//! Normalized resources and the resolver that denormalizes them.
//!
//! ## Overview
//!
//! Content arrives as a primary resource plus a flat side-load pool. This
//! crate provides:
//! - [`Resource`]: immutable entity value with copy-on-write mutations
//! - [`RelationSet`]: named relations with the update and attach merge policies
//! - [`GraphResolver`]: recursive resolution and episode list flattening
//! - [`Payload`]: JSON:API document parsing
//! - [`DownloadState`]: the local download overlay carried by resources
//!
//! Everything here is pure and synchronous.
//!
//! ## Usage
//!
//! ```
//! use core_graph::{GraphResolver, Payload};
//!
//! let payload = Payload::from_json(r#"{
//!     "data": { "id": "c1", "type": "contents" },
//!     "included": [
//!         { "id": "p1", "type": "progressions",
//!           "attributes": { "contentId": "c1", "percentComplete": 40 } }
//!     ]
//! }"#)?;
//!
//! let resolved = GraphResolver::new().resolve_payload(&payload);
//! assert_eq!(resolved.progression_percent(), 40);
//! # Ok::<(), core_graph::GraphError>(())
//! ```

pub mod attributes;
pub mod download;
pub mod episodes;
pub mod error;
pub mod kind;
pub mod payload;
pub mod relations;
pub mod resolver;
pub mod resource;

pub use attributes::Attributes;
pub use download::{DownloadState, DownloadStatus};
pub use episodes::EpisodeListEntry;
pub use error::{GraphError, Result};
pub use kind::ResourceKind;
pub use payload::Payload;
pub use relations::{Cardinality, RelationKind, RelationSet};
pub use resolver::{build_episode_list, resolve_primary, GraphResolver, DEFAULT_MAX_DEPTH};
pub use resource::Resource;
