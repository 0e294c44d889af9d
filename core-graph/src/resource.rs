//! The normalized entity type.
//!
//! A [`Resource`] is an immutable value: every operation below returns a new
//! resource and leaves the receiver untouched, so a reader holding a
//! snapshot never observes a half-updated graph.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::download::DownloadState;
use crate::kind::ResourceKind;
use crate::relations::{RelationKind, RelationSet};

/// Relations refreshed by [`Resource::with_updated_relations`].
const UPDATED_RELATIONS: [RelationKind; 3] = [
    RelationKind::Domains,
    RelationKind::Progression,
    RelationKind::Bookmark,
];

/// Relations seeded by [`Resource::with_attached_relations`].
const ATTACHED_RELATIONS: [RelationKind; 5] = [
    RelationKind::Domains,
    RelationKind::Progression,
    RelationKind::Bookmark,
    RelationKind::Contents,
    RelationKind::Groups,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<RelationSet>,
    /// Local download overlay, never part of a server payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_state: Option<DownloadState>,
}

impl Resource {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(kind),
            attributes: Some(Attributes::default()),
            ..Default::default()
        }
    }

    /// A bare `{ id, type }` reference, as found inside a relationship.
    pub fn reference(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// A progression record owned by `content_id`.
    pub fn progression_record(id: impl Into<String>, content_id: impl Into<String>, percent: u8) -> Self {
        let percent = percent.min(100);
        Self::new(ResourceKind::Progression, id).with_attributes(Attributes {
            content_id: Some(content_id.into()),
            percent_complete: Some(percent),
            finished: Some(percent == 100),
            ..Default::default()
        })
    }

    /// A locally synthesized bookmark for `content_id`, not yet known to the server.
    pub fn bookmark_stub(content_id: impl Into<String>) -> Self {
        Self {
            kind: Some(ResourceKind::Bookmark),
            attributes: Some(Attributes {
                content_id: Some(content_id.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_relations(mut self, relations: RelationSet) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let mut attributes = self.attributes.take().unwrap_or_default();
        attributes.name = Some(name.into());
        self.attributes = Some(attributes);
        self
    }

    /// `contentId` foreign key carried by progression and bookmark records.
    pub fn content_key(&self) -> Option<&str> {
        self.attributes.as_ref()?.content_id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.as_ref()?.display_name()
    }

    /// Duration in seconds, when the server sent one.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.attributes.as_ref()?.duration
    }

    pub fn is_a(&self, kind: ResourceKind) -> bool {
        self.kind == Some(kind)
    }

    // =========================================================================
    // Relation merging
    // =========================================================================

    /// Re-resolve domains, progression and bookmark against `sideload`.
    ///
    /// Returns an identical resource when `sideload` is empty.
    pub fn with_updated_relations(&self, sideload: &[Resource]) -> Resource {
        self.merge_relations(&UPDATED_RELATIONS, sideload, RelationSet::update)
    }

    /// Seed domains, progression, bookmark, contents and groups from `sideload`.
    ///
    /// Returns an identical resource when `sideload` is empty.
    pub fn with_attached_relations(&self, sideload: &[Resource]) -> Resource {
        self.merge_relations(&ATTACHED_RELATIONS, sideload, RelationSet::attach)
    }

    fn merge_relations(
        &self,
        kinds: &[RelationKind],
        sideload: &[Resource],
        policy: fn(RelationSet, RelationKind, &[Resource], Option<&str>) -> RelationSet,
    ) -> Resource {
        if sideload.is_empty() {
            return self.clone();
        }

        let owner_id = self.id.as_deref();
        let merged = kinds.iter().fold(
            self.relations.clone().unwrap_or_default(),
            |relations, kind| policy(relations, *kind, sideload, owner_id),
        );

        let relations = if merged.is_empty() && self.relations.is_none() {
            None
        } else {
            Some(merged)
        };

        Resource {
            relations,
            ..self.clone()
        }
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    /// Mark a progression record finished or unfinished.
    ///
    /// Sets `percentComplete` to 100 or 0 along with `finished`. A record with
    /// no relations gets a minimal `content` relation pointing at
    /// `content_id`.
    pub fn toggle_finished(&self, content_id: &str, finished: bool) -> Resource {
        let mut attributes = self.attributes.clone().unwrap_or_default();
        attributes.percent_complete = Some(if finished { 100 } else { 0 });
        attributes.finished = Some(finished);

        let relations = match &self.relations {
            Some(relations) => relations.clone(),
            None => RelationSet::new().with_single(
                RelationKind::Content,
                Some(Resource::reference(ResourceKind::Content, content_id)),
            ),
        };

        Resource {
            attributes: Some(attributes),
            relations: Some(relations),
            ..self.clone()
        }
    }

    pub fn with_download_state(&self, state: DownloadState) -> Resource {
        Resource {
            local_state: Some(state),
            ..self.clone()
        }
    }

    pub fn without_download_state(&self) -> Resource {
        Resource {
            local_state: None,
            ..self.clone()
        }
    }

    /// Replace the bookmark relation; `None` removes it.
    pub fn with_bookmark(&self, bookmark: Option<Resource>) -> Resource {
        self.with_single_relation(RelationKind::Bookmark, bookmark)
    }

    /// Replace the progression relation with a locally produced record.
    pub fn with_progression(&self, progression: Resource) -> Resource {
        self.with_single_relation(RelationKind::Progression, Some(progression))
    }

    fn with_single_relation(&self, kind: RelationKind, resource: Option<Resource>) -> Resource {
        let relations = self
            .relations
            .clone()
            .unwrap_or_default()
            .with_single(kind, resource);
        let relations = if relations.is_empty() && self.relations.is_none() {
            None
        } else {
            Some(relations)
        };
        Resource {
            relations,
            ..self.clone()
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    fn relation_single(&self, kind: RelationKind) -> Option<&Resource> {
        self.relations.as_ref()?.single(kind)
    }

    fn relation_list(&self, kind: RelationKind) -> &[Resource] {
        self.relations
            .as_ref()
            .and_then(|relations| relations.list(kind))
            .unwrap_or_default()
    }

    pub fn bookmark(&self) -> Option<&Resource> {
        self.relation_single(RelationKind::Bookmark)
    }

    pub fn progression(&self) -> Option<&Resource> {
        self.relation_single(RelationKind::Progression)
    }

    pub fn groups(&self) -> &[Resource] {
        self.relation_list(RelationKind::Groups)
    }

    pub fn domains(&self) -> &[Resource] {
        self.relation_list(RelationKind::Domains)
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmark().is_some()
    }

    pub fn is_progression_finished(&self) -> bool {
        self.progression()
            .and_then(|progression| progression.attributes.as_ref())
            .and_then(|attributes| attributes.finished)
            .unwrap_or(false)
    }

    /// 0 when there is no progression record.
    pub fn progression_percent(&self) -> u8 {
        self.progression()
            .and_then(|progression| progression.attributes.as_ref())
            .and_then(|attributes| attributes.percent_complete)
            .unwrap_or(0)
    }

    /// Children listed under `contents`.
    pub fn child_resources(&self) -> &[Resource] {
        self.relation_list(RelationKind::Contents)
    }

    pub fn child_resource_ids(&self) -> Vec<String> {
        self.child_resources()
            .iter()
            .filter_map(|child| child.id.clone())
            .collect()
    }

    pub fn content_group_ids(&self) -> Vec<String> {
        self.groups()
            .iter()
            .filter_map(|group| group.id.clone())
            .collect()
    }
}
