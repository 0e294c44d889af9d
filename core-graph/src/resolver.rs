//! Denormalizes a primary resource against one flat side-load pool.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::episodes::EpisodeListEntry;
use crate::kind::ResourceKind;
use crate::payload::Payload;
use crate::relations::RelationKind;
use crate::resource::Resource;

/// Default nesting limit for recursive resolution.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Side-load lookup by `(kind, id)`. The first occurrence of a key wins.
struct SideloadIndex<'a> {
    entries: HashMap<(ResourceKind, &'a str), &'a Resource>,
}

impl<'a> SideloadIndex<'a> {
    fn new(sideload: &'a [Resource]) -> Self {
        let mut entries = HashMap::with_capacity(sideload.len());
        for resource in sideload {
            if let (Some(kind), Some(id)) = (resource.kind, resource.id.as_deref()) {
                entries.entry((kind, id)).or_insert(resource);
            }
        }
        Self { entries }
    }

    fn get(&self, kind: ResourceKind, id: &str) -> Option<&'a Resource> {
        self.entries.get(&(kind, id)).copied()
    }
}

/// Resolves resource graphs and flattens collections into episode lists.
///
/// Stateless apart from the recursion limit; every call works on the values
/// it is given.
#[derive(Debug, Clone)]
pub struct GraphResolver {
    max_depth: usize,
}

impl Default for GraphResolver {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl GraphResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve `primary` and everything reachable through `groups` and
    /// `contents` against `sideload`.
    ///
    /// A primary without relations is seeded with the attach policy; one
    /// that already has relations is refreshed with the update policy.
    /// Children are swapped for their side-load copy when one exists and
    /// refreshed with the update policy.
    pub fn resolve_primary(&self, primary: &Resource, sideload: &[Resource]) -> Resource {
        let index = SideloadIndex::new(sideload);
        let mut path = Vec::new();

        let seeded = match &primary.relations {
            Some(relations) if !relations.is_empty() => primary.with_updated_relations(sideload),
            _ => primary.with_attached_relations(sideload),
        };
        self.resolve_children_of(seeded, primary, sideload, &index, 0, &mut path)
    }

    fn resolve_node<'a>(
        &self,
        node: &'a Resource,
        sideload: &'a [Resource],
        index: &SideloadIndex<'a>,
        depth: usize,
        path: &mut Vec<(Option<ResourceKind>, &'a str)>,
    ) -> Resource {
        let updated = node.with_updated_relations(sideload);
        self.resolve_children_of(updated, node, sideload, index, depth, path)
    }

    fn resolve_children<'a>(
        &self,
        resource: Resource,
        sideload: &'a [Resource],
        index: &SideloadIndex<'a>,
        depth: usize,
        path: &mut Vec<(Option<ResourceKind>, &'a str)>,
    ) -> Resource {
        let Some(relations) = resource.relations.clone() else {
            return resource;
        };
        if depth >= self.max_depth {
            debug!(depth, "Resolution depth limit reached");
            return resource;
        }

        let relations = [RelationKind::Groups, RelationKind::Contents]
            .into_iter()
            .fold(relations, |relations, kind| {
                let Some(children) = relations.list(kind) else {
                    return relations;
                };
                let resolved = children
                    .iter()
                    .map(|child| {
                        let source = child
                            .id
                            .as_deref()
                            .and_then(|id| index.get(kind.resource_kind(), id));
                        match source {
                            Some(source) => self.resolve_node(source, sideload, index, depth + 1, path),
                            None => child.clone(),
                        }
                    })
                    .collect();
                relations.with_list(kind, Some(resolved))
            });

        Resource {
            relations: Some(relations),
            ..resource
        }
    }

    fn resolve_children_of<'a>(
        &self,
        resource: Resource,
        node: &'a Resource,
        sideload: &'a [Resource],
        index: &SideloadIndex<'a>,
        depth: usize,
        path: &mut Vec<(Option<ResourceKind>, &'a str)>,
    ) -> Resource {
        let Some(id) = node.id.as_deref() else {
            return self.resolve_children(resource, sideload, index, depth, path);
        };
        let key = (node.kind, id);
        if path.contains(&key) {
            trace!(id, "Cycle in resource graph, not descending");
            return resource;
        }

        path.push(key);
        let resolved = self.resolve_children(resource, sideload, index, depth, path);
        path.pop();
        resolved
    }

    /// Flatten `groups` into headers and episodes.
    ///
    /// Each group contributes an optional header (present when the group
    /// has a non-blank name) followed by its episodes in `contents` order.
    /// Child ids missing from `sideload` are skipped but still count
    /// towards numbering. Positions continue across groups; a group without
    /// a header numbers its episodes as if the header occupied a slot.
    pub fn build_episode_list(&self, groups: &[Resource], sideload: &[Resource]) -> Vec<EpisodeListEntry> {
        let index = SideloadIndex::new(sideload);
        let mut episode_counter = 0usize;
        let mut entries = Vec::new();

        for group in groups {
            let group = self.group_source(group, &index);
            let child_ids = group.child_resource_ids();
            episode_counter += child_ids.len();

            let episodes: Vec<Resource> = child_ids
                .iter()
                .filter_map(|id| {
                    let episode = index.get(ResourceKind::Content, id);
                    if episode.is_none() {
                        debug!(episode_id = %id, "Episode missing from side-load, skipping");
                    }
                    episode
                })
                .map(|episode| episode.with_updated_relations(sideload))
                .collect();

            let header = group.name().map(EpisodeListEntry::header);
            let baseline = if header.is_some() {
                episode_counter
            } else {
                episode_counter + 1
            };

            let episode_count = episodes.len();
            let section = header
                .into_iter()
                .chain(episodes.into_iter().map(EpisodeListEntry::episode))
                .enumerate()
                .map(|(slot, entry)| EpisodeListEntry {
                    position: slot + baseline - episode_count,
                    ..entry
                });
            entries.extend(section);
        }

        entries
    }

    /// The group itself when it lists its children, else its side-load copy.
    fn group_source<'a>(&self, group: &'a Resource, index: &SideloadIndex<'a>) -> &'a Resource {
        let lists_children = group
            .relations
            .as_ref()
            .and_then(|relations| relations.list(RelationKind::Contents))
            .is_some();
        if lists_children {
            return group;
        }
        group
            .id
            .as_deref()
            .and_then(|id| index.get(ResourceKind::Group, id))
            .unwrap_or(group)
    }

    /// Resolve the primary resource of a parsed payload against its `included` block.
    pub fn resolve_payload(&self, payload: &Payload) -> Resource {
        self.resolve_primary(&payload.datum, &payload.included)
    }

    /// Resolve `collection` and flatten its groups into an episode list.
    pub fn episode_list_for(&self, collection: &Resource, sideload: &[Resource]) -> Vec<EpisodeListEntry> {
        let resolved = self.resolve_primary(collection, sideload);
        self.build_episode_list(resolved.groups(), sideload)
    }
}

/// [`GraphResolver::resolve_primary`] with default settings.
pub fn resolve_primary(primary: &Resource, sideload: &[Resource]) -> Resource {
    GraphResolver::default().resolve_primary(primary, sideload)
}

/// [`GraphResolver::build_episode_list`] with default settings.
pub fn build_episode_list(groups: &[Resource], sideload: &[Resource]) -> Vec<EpisodeListEntry> {
    GraphResolver::default().build_episode_list(groups, sideload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::RelationSet;

    fn group(id: &str, name: Option<&str>, children: &[&str]) -> Resource {
        let contents = children
            .iter()
            .map(|child| Resource::reference(ResourceKind::Content, *child))
            .collect();
        let group = Resource::new(ResourceKind::Group, id)
            .with_relations(RelationSet::new().with_list(RelationKind::Contents, Some(contents)));
        match name {
            Some(name) => group.with_name(name),
            None => group,
        }
    }

    fn episodes(ids: &[&str]) -> Vec<Resource> {
        ids.iter()
            .map(|id| Resource::new(ResourceKind::Content, *id).with_name(format!("Episode {id}")))
            .collect()
    }

    #[test]
    fn test_single_titled_group_positions() {
        let groups = vec![group("g1", Some("Week 1"), &["a", "b", "c"])];
        let entries = build_episode_list(&groups, &episodes(&["a", "b", "c"]));

        let positions: Vec<_> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(entries[0].is_header());
        assert_eq!(entries[0].title.as_deref(), Some("Week 1"));
    }

    #[test]
    fn test_untitled_group_starts_at_one() {
        let groups = vec![group("g1", Some("  "), &["a", "b"])];
        let entries = build_episode_list(&groups, &episodes(&["a", "b"]));

        assert!(entries.iter().all(|e| !e.is_header()));
        let positions: Vec<_> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_missing_episode_is_skipped_but_counted() {
        let groups = vec![
            group("g1", Some("One"), &["a", "ghost", "b"]),
            group("g2", Some("Two"), &["c"]),
        ];
        let entries = build_episode_list(&groups, &episodes(&["a", "b", "c"]));

        let ids: Vec<_> = entries.iter().map(|e| e.episode_id()).collect();
        assert_eq!(ids, vec![None, Some("a"), Some("b"), None, Some("c")]);
        let positions: Vec<_> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 3, 4]);
    }

    #[test]
    fn test_group_without_contents_uses_sideload_copy() {
        let stub = Resource::reference(ResourceKind::Group, "g1");
        let mut sideload = episodes(&["a"]);
        sideload.push(group("g1", Some("From pool"), &["a"]));

        let entries = build_episode_list(&[stub], &sideload);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("From pool"));
        assert_eq!(entries[1].position, 1);
    }

    #[test]
    fn test_empty_group_yields_only_header() {
        let entries = build_episode_list(&[group("g1", Some("Soon"), &[])], &[]);
        assert_eq!(entries, vec![EpisodeListEntry::header("Soon")]);
    }

    #[test]
    fn test_resolve_primary_refreshes_children_from_pool() {
        let collection = Resource::new(ResourceKind::Content, "col");
        let mut sideload = vec![group("g1", Some("Week 1"), &["a"])];
        sideload.extend(episodes(&["a"]));
        sideload.push(Resource::progression_record("p1", "a", 25));

        let resolved = resolve_primary(&collection, &sideload);
        let group = &resolved.groups()[0];
        let child = &group.child_resources()[0];
        assert_eq!(child.name(), Some("Episode a"));
        assert_eq!(child.progression_percent(), 25);
    }

    #[test]
    fn test_resolve_primary_survives_cycles() {
        let looping = Resource::new(ResourceKind::Content, "loop").with_relations(
            RelationSet::new().with_list(
                RelationKind::Contents,
                Some(vec![Resource::reference(ResourceKind::Content, "loop")]),
            ),
        );
        let sideload = vec![looping.clone()];

        let resolved = resolve_primary(&looping, &sideload);
        assert_eq!(resolved.child_resource_ids(), vec!["loop"]);
    }

    #[test]
    fn test_depth_limit_stops_descent() {
        let collection = Resource::new(ResourceKind::Content, "col");
        let mut sideload = vec![group("g1", None, &["a"])];
        sideload.extend(episodes(&["a"]));

        let resolved = GraphResolver::new()
            .with_max_depth(1)
            .resolve_primary(&collection, &sideload);
        let group = &resolved.groups()[0];
        // groups resolve at depth 1 but their children are left as references
        assert_eq!(group.child_resources()[0], Resource::reference(ResourceKind::Content, "a"));
    }
}
