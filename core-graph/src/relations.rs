//! Named relations of a resource and the two merge policies.
//!
//! * **update** re-resolves relations a resource already knows about against
//!   a fresh side-load batch. It never introduces entities the resource did
//!   not reference before.
//! * **attach** seeds a relation the resource had no knowledge of, taking
//!   whatever the side-load offers for that kind.
//!
//! Both policies leave the relation untouched when the side-load carries
//! nothing of the matching kind.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::kind::ResourceKind;
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Many,
}

/// The named relations a resource can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Content,
    Contents,
    Bookmark,
    Domains,
    Progression,
    Groups,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Content,
        RelationKind::Contents,
        RelationKind::Bookmark,
        RelationKind::Domains,
        RelationKind::Progression,
        RelationKind::Groups,
    ];

    /// Kind of resource this relation points at.
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            RelationKind::Content | RelationKind::Contents => ResourceKind::Content,
            RelationKind::Bookmark => ResourceKind::Bookmark,
            RelationKind::Domains => ResourceKind::Domain,
            RelationKind::Progression => ResourceKind::Progression,
            RelationKind::Groups => ResourceKind::Group,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationKind::Content | RelationKind::Bookmark | RelationKind::Progression => {
                Cardinality::Single
            }
            RelationKind::Contents | RelationKind::Domains | RelationKind::Groups => {
                Cardinality::Many
            }
        }
    }

    pub fn is_list(&self) -> bool {
        self.cardinality() == Cardinality::Many
    }

    /// Name used under `relationships` in a payload.
    pub fn wire_name(&self) -> &'static str {
        match self {
            RelationKind::Content => "content",
            RelationKind::Contents => "contents",
            RelationKind::Bookmark => "bookmark",
            RelationKind::Domains => "domains",
            RelationKind::Progression => "progression",
            RelationKind::Groups => "groups",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_name() == name)
    }
}

/// One resource's named relations.
///
/// `None` means the relation is absent. `Some` holds 0..N resources; list
/// relations keep payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Box<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Box<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<Box<Resource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Resource>>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no relation is present at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.contents.is_none()
            && self.bookmark.is_none()
            && self.domains.is_none()
            && self.progression.is_none()
            && self.groups.is_none()
    }

    /// The resource held by a single relation. Always `None` for list kinds.
    pub fn single(&self, kind: RelationKind) -> Option<&Resource> {
        let slot = match kind {
            RelationKind::Content => &self.content,
            RelationKind::Bookmark => &self.bookmark,
            RelationKind::Progression => &self.progression,
            _ => return None,
        };
        slot.as_deref()
    }

    /// The resources held by a list relation. Always `None` for single kinds.
    pub fn list(&self, kind: RelationKind) -> Option<&[Resource]> {
        let slot = match kind {
            RelationKind::Contents => &self.contents,
            RelationKind::Domains => &self.domains,
            RelationKind::Groups => &self.groups,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Ids referenced by a relation, in relation order.
    pub fn ids(&self, kind: RelationKind) -> Vec<&str> {
        match kind.cardinality() {
            Cardinality::Single => self
                .single(kind)
                .and_then(|resource| resource.id.as_deref())
                .into_iter()
                .collect(),
            Cardinality::Many => self
                .list(kind)
                .unwrap_or_default()
                .iter()
                .filter_map(|resource| resource.id.as_deref())
                .collect(),
        }
    }

    /// Replace a single relation. Ignored for list kinds.
    pub fn with_single(mut self, kind: RelationKind, resource: Option<Resource>) -> Self {
        let resource = resource.map(Box::new);
        match kind {
            RelationKind::Content => self.content = resource,
            RelationKind::Bookmark => self.bookmark = resource,
            RelationKind::Progression => self.progression = resource,
            _ => {}
        }
        self
    }

    /// Replace a list relation. Ignored for single kinds.
    pub fn with_list(mut self, kind: RelationKind, resources: Option<Vec<Resource>>) -> Self {
        match kind {
            RelationKind::Contents => self.contents = resources,
            RelationKind::Domains => self.domains = resources,
            RelationKind::Groups => self.groups = resources,
            _ => {}
        }
        self
    }

    /// Re-resolve an existing relation against `sideload`.
    ///
    /// List relations keep only the side-load entries whose id they already
    /// reference, in side-load order; references with no side-load copy are
    /// dropped and unreferenced entries never leak in. An absent list stays
    /// absent. Single
    /// relations match the known child id, then fall back to the
    /// `contentId` foreign key against `owner_id` for kinds that carry one.
    pub fn update(self, kind: RelationKind, sideload: &[Resource], owner_id: Option<&str>) -> Self {
        let candidates = candidates_of(kind, sideload);
        if candidates.is_empty() {
            return self;
        }

        match kind.cardinality() {
            Cardinality::Many => {
                if self.list(kind).is_none() {
                    return self;
                }
                let resolved: Vec<Resource> = {
                    let referenced: HashSet<&str> = self.ids(kind).into_iter().collect();
                    candidates
                        .into_iter()
                        .filter(|candidate| {
                            candidate
                                .id
                                .as_deref()
                                .is_some_and(|id| referenced.contains(id))
                        })
                        .cloned()
                        .collect()
                };
                self.with_list(kind, Some(resolved))
            }
            Cardinality::Single => {
                let by_id = self
                    .single(kind)
                    .and_then(|child| child.id.as_deref())
                    .and_then(|id| find_by_id(&candidates, id));
                let matched = by_id.or_else(|| {
                    let owner = owner_id?;
                    if !kind.resource_kind().carries_content_key() {
                        return None;
                    }
                    candidates
                        .iter()
                        .copied()
                        .find(|candidate| candidate.content_key() == Some(owner))
                });

                match matched {
                    Some(resource) => {
                        let resource = resource.clone();
                        self.with_single(kind, Some(resource))
                    }
                    None => {
                        trace!(relation = kind.wire_name(), "No side-load match, keeping relation");
                        self
                    }
                }
            }
        }
    }

    /// Seed a relation from `sideload`.
    ///
    /// List relations take every resource of the matching kind. Single
    /// relations take the first match; for kinds carrying a `contentId`
    /// key, records owned by a different resource are skipped.
    pub fn attach(self, kind: RelationKind, sideload: &[Resource], owner_id: Option<&str>) -> Self {
        let candidates = candidates_of(kind, sideload);
        if candidates.is_empty() {
            return self;
        }

        match kind.cardinality() {
            Cardinality::Many => {
                let attached = candidates.into_iter().cloned().collect();
                self.with_list(kind, Some(attached))
            }
            Cardinality::Single => {
                let first = candidates.into_iter().find(|candidate| {
                    if !kind.resource_kind().carries_content_key() {
                        return true;
                    }
                    match (candidate.content_key(), owner_id) {
                        (None, _) | (_, None) => true,
                        (Some(key), Some(owner)) => key == owner,
                    }
                });
                match first {
                    Some(resource) => {
                        let resource = resource.clone();
                        self.with_single(kind, Some(resource))
                    }
                    None => self,
                }
            }
        }
    }
}

fn candidates_of(kind: RelationKind, sideload: &[Resource]) -> Vec<&Resource> {
    let wanted = kind.resource_kind();
    sideload
        .iter()
        .filter(|resource| resource.kind == Some(wanted))
        .collect()
}

fn find_by_id<'a>(candidates: &[&'a Resource], id: &str) -> Option<&'a Resource> {
    candidates
        .iter()
        .copied()
        .find(|candidate| candidate.id.as_deref() == Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(id: &str) -> Resource {
        Resource::new(ResourceKind::Domain, id).with_name(format!("Domain {id}"))
    }

    fn progression(id: &str, content_id: &str, percent: u8) -> Resource {
        Resource::progression_record(id, content_id, percent)
    }

    #[test]
    fn test_update_with_no_matching_kind_is_unchanged() {
        let relations = RelationSet::new().with_list(
            RelationKind::Domains,
            Some(vec![Resource::reference(ResourceKind::Domain, "1")]),
        );
        let sideload = vec![progression("p1", "c1", 10)];

        let updated = relations
            .clone()
            .update(RelationKind::Domains, &sideload, Some("c1"));
        assert_eq!(updated, relations);
    }

    #[test]
    fn test_update_list_resolves_only_referenced_ids() {
        let relations = RelationSet::new().with_list(
            RelationKind::Domains,
            Some(vec![
                Resource::reference(ResourceKind::Domain, "2"),
                Resource::reference(ResourceKind::Domain, "1"),
            ]),
        );
        let sideload = vec![domain("1"), domain("99"), domain("2")];

        let updated = relations.update(RelationKind::Domains, &sideload, None);
        let domains = updated.list(RelationKind::Domains).unwrap();
        assert_eq!(updated.ids(RelationKind::Domains), vec!["1", "2"]);
        assert!(domains.iter().all(|d| d.attributes.is_some()));
    }

    #[test]
    fn test_update_list_drops_references_missing_from_sideload() {
        let relations = RelationSet::new().with_list(
            RelationKind::Domains,
            Some(vec![
                Resource::reference(ResourceKind::Domain, "1"),
                Resource::reference(ResourceKind::Domain, "3"),
            ]),
        );
        let updated = relations.update(RelationKind::Domains, &[domain("1")], None);
        assert_eq!(updated.ids(RelationKind::Domains), vec!["1"]);
        assert_eq!(updated.list(RelationKind::Domains).unwrap()[0], domain("1"));
    }

    #[test]
    fn test_update_list_without_referenced_entries_is_emptied() {
        let relations = RelationSet::new().with_list(
            RelationKind::Domains,
            Some(vec![Resource::reference(ResourceKind::Domain, "3")]),
        );
        let updated = relations.update(RelationKind::Domains, &[domain("1")], None);
        assert_eq!(updated.list(RelationKind::Domains), Some(&[][..]));
    }

    #[test]
    fn test_update_absent_list_stays_absent() {
        let updated = RelationSet::new().update(RelationKind::Domains, &[domain("1")], None);
        assert!(updated.domains.is_none());
    }

    #[test]
    fn test_update_single_by_known_id() {
        let relations = RelationSet::new().with_single(
            RelationKind::Progression,
            Some(Resource::reference(ResourceKind::Progression, "p2")),
        );
        let sideload = vec![progression("p1", "c1", 10), progression("p2", "c1", 40)];

        let updated = relations.update(RelationKind::Progression, &sideload, Some("c1"));
        assert_eq!(
            updated.single(RelationKind::Progression).unwrap().id.as_deref(),
            Some("p2")
        );
    }

    #[test]
    fn test_update_single_falls_back_to_content_key() {
        let sideload = vec![progression("p1", "other", 10), progression("p2", "c1", 40)];

        let updated = RelationSet::new().update(RelationKind::Progression, &sideload, Some("c1"));
        assert_eq!(
            updated.single(RelationKind::Progression).unwrap().id.as_deref(),
            Some("p2")
        );
    }

    #[test]
    fn test_update_single_without_match_is_unchanged() {
        let relations = RelationSet::new().with_single(
            RelationKind::Progression,
            Some(Resource::reference(ResourceKind::Progression, "p9")),
        );
        let sideload = vec![progression("p1", "other", 10)];

        let updated = relations
            .clone()
            .update(RelationKind::Progression, &sideload, Some("c1"));
        assert_eq!(updated, relations);
    }

    #[test]
    fn test_attach_list_takes_everything_of_kind() {
        let sideload = vec![domain("1"), progression("p1", "c1", 5), domain("99")];
        let attached = RelationSet::new().attach(RelationKind::Domains, &sideload, None);
        assert_eq!(attached.ids(RelationKind::Domains), vec!["1", "99"]);
    }

    #[test]
    fn test_attach_single_skips_records_of_other_owners() {
        let sideload = vec![progression("p1", "other", 10), progression("p2", "c1", 40)];
        let attached = RelationSet::new().attach(RelationKind::Progression, &sideload, Some("c1"));
        assert_eq!(attached.ids(RelationKind::Progression), vec!["p2"]);

        let none = RelationSet::new().attach(
            RelationKind::Progression,
            &[progression("p1", "other", 10)],
            Some("c1"),
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_relation_kind_wire_names() {
        for kind in RelationKind::ALL {
            assert_eq!(RelationKind::from_wire_name(kind.wire_name()), Some(kind));
        }
        assert_eq!(RelationKind::from_wire_name("author"), None);
        assert!(RelationKind::Groups.is_list());
        assert!(!RelationKind::Bookmark.is_list());
    }
}
