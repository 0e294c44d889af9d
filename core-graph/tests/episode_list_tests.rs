//! Episode list numbering and end-to-end collection resolution.

use core_graph::{
    build_episode_list, EpisodeListEntry, GraphResolver, Payload, RelationKind, RelationSet,
    Resource, ResourceKind,
};
use serde_json::{json, Value};

fn group(id: &str, name: Option<&str>, children: &[String]) -> Resource {
    let contents = children
        .iter()
        .map(|child| Resource::reference(ResourceKind::Content, child.as_str()))
        .collect();
    let group = Resource::new(ResourceKind::Group, id)
        .with_relations(RelationSet::new().with_list(RelationKind::Contents, Some(contents)));
    match name {
        Some(name) => group.with_name(name),
        None => group,
    }
}

fn episode_ids(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|n| format!("e{n}")).collect()
}

fn episode_pool() -> Vec<Resource> {
    episode_ids(1..=12)
        .into_iter()
        .map(|id| Resource::new(ResourceKind::Content, id))
        .collect()
}

fn positions(entries: &[EpisodeListEntry]) -> Vec<usize> {
    entries.iter().map(|entry| entry.position).collect()
}

#[test]
fn test_two_titled_groups_of_six() {
    let groups = vec![
        group("g1", Some("Part 1"), &episode_ids(1..=6)),
        group("g2", Some("Part 2"), &episode_ids(7..=12)),
    ];

    let entries = build_episode_list(&groups, &episode_pool());

    assert_eq!(entries.len(), 14);
    assert_eq!(
        positions(&entries),
        vec![0, 1, 2, 3, 4, 5, 6, 6, 7, 8, 9, 10, 11, 12]
    );
    assert!(entries[0].is_header());
    assert!(entries[7].is_header());
    assert_eq!(entries[7].title.as_deref(), Some("Part 2"));
}

#[test]
fn test_second_group_without_header_keeps_numbering_continuous() {
    let groups = vec![
        group("g1", Some("Part 1"), &episode_ids(1..=6)),
        group("g2", None, &episode_ids(7..=12)),
    ];

    let entries = build_episode_list(&groups, &episode_pool());

    assert_eq!(entries.len(), 13);
    assert_eq!(
        positions(&entries),
        vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
    );
    let episode_positions: Vec<_> = entries
        .iter()
        .filter(|entry| !entry.is_header())
        .map(|entry| entry.position)
        .collect();
    assert_eq!(episode_positions, (1..=12).collect::<Vec<_>>());
}

#[test]
fn test_episode_order_follows_group_order() {
    let groups = vec![
        group("g2", Some("Later"), &episode_ids(7..=12)),
        group("g1", Some("Earlier"), &episode_ids(1..=6)),
    ];

    let entries = build_episode_list(&groups, &episode_pool());
    let ids: Vec<_> = entries.iter().filter_map(|e| e.episode_id()).collect();
    assert_eq!(ids.first(), Some(&"e7"));
    assert_eq!(ids.last(), Some(&"e6"));
}

fn identifier(kind: &str, id: &str) -> Value {
    json!({ "id": id, "type": kind })
}

fn collection_document() -> Value {
    let mut included = Vec::new();
    for (group_id, name, range) in [("g1", "Part 1", 1..=6), ("g2", "Part 2", 7..=12)] {
        let children: Vec<Value> = episode_ids(range.clone())
            .iter()
            .map(|id| identifier("contents", id))
            .collect();
        included.push(json!({
            "id": group_id,
            "type": "groups",
            "attributes": { "name": name },
            "relationships": { "contents": { "data": children } }
        }));
        for id in episode_ids(range) {
            included.push(json!({
                "id": id,
                "type": "contents",
                "attributes": { "name": format!("Episode {id}"), "duration": 600, "kind": "video" }
            }));
        }
    }
    included.push(json!({
        "id": "p5",
        "type": "progressions",
        "attributes": { "contentId": "e5", "percentComplete": 10, "finished": false },
        "relationships": { "content": { "data": identifier("contents", "e5") } }
    }));

    json!({
        "data": {
            "id": "course",
            "type": "contents",
            "attributes": { "name": "Course", "kind": "collection" },
            "relationships": {
                "groups": { "data": [identifier("groups", "g1"), identifier("groups", "g2")] }
            }
        },
        "included": included
    })
}

#[test]
fn test_collection_end_to_end() {
    let payload = Payload::from_value(collection_document()).unwrap();
    let resolver = GraphResolver::new();

    let entries = resolver.episode_list_for(&payload.datum, &payload.included);

    assert_eq!(entries.len(), 14);
    for entry in entries.iter().filter(|entry| !entry.is_header()) {
        let episode = entry.resource.as_ref().unwrap();
        let expected = if episode.id.as_deref() == Some("e5") { 10 } else { 0 };
        assert_eq!(
            episode.progression_percent(),
            expected,
            "episode {:?}",
            episode.id
        );
        assert!(!episode.is_progression_finished());
    }

    let fifth = entries
        .iter()
        .find(|entry| entry.episode_id() == Some("e5"))
        .unwrap();
    assert_eq!(fifth.position, 5);
}

#[test]
fn test_resolved_collection_exposes_groups_and_children() {
    let payload = Payload::from_value(collection_document()).unwrap();
    let resolved = GraphResolver::new().resolve_payload(&payload);

    assert_eq!(resolved.content_group_ids(), vec!["g1", "g2"]);
    let second = &resolved.groups()[1];
    assert_eq!(second.name(), Some("Part 2"));
    assert_eq!(second.child_resource_ids(), episode_ids(7..=12));
    assert!(second
        .child_resources()
        .iter()
        .all(|child| child.duration_seconds() == Some(600)));
    // the collection itself owns no progression record
    assert!(resolved.progression().is_none());
}
