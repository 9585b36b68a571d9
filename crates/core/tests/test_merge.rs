//! Merger contract: deduplication by entity id, last write wins, placeholder
//! reconciliation.

use carto_core::graph::{
    FileParseResult, MergedGraph, Node, NodeKind, Relationship, RelationshipType, Span,
};

fn node(kind: NodeKind, name: &str, qualified: &str, file: &str) -> Node {
    Node::new(kind, name, qualified, file, "typescript", Span::line(1))
}

#[test]
fn duplicate_entity_ids_keep_the_latest_node() {
    let mut merged = MergedGraph::new();

    let mut first = FileParseResult::new("/src/a.ts");
    first.push_node(
        node(NodeKind::Class, "Widget", "/src/a.ts:Widget", "/src/a.ts").with_prop("version", 1),
    );
    merged.absorb(first);

    let mut second = FileParseResult::new("/src/a.ts");
    second.push_node(
        node(NodeKind::Class, "Widget", "/src/a.ts:Widget", "/src/a.ts").with_prop("version", 2),
    );
    merged.absorb(second);

    assert_eq!(merged.node_count(), 1);
    let survivor = merged.nodes().next().unwrap();
    assert_eq!(survivor.prop("version").and_then(|v| v.as_u64()), Some(2));

    let (intra, cross) = merged.duplicate_counts();
    assert_eq!(intra, 1);
    assert_eq!(cross, 0);
}

#[test]
fn cross_file_collisions_are_counted_separately() {
    let mut merged = MergedGraph::new();

    let mut first = FileParseResult::new("/src/a.ts");
    first.push_node(node(NodeKind::Class, "Widget", "collides", "/src/a.ts"));
    merged.absorb(first);

    let mut second = FileParseResult::new("/src/b.ts");
    second.push_node(node(NodeKind::Class, "Widget", "collides", "/src/b.ts"));
    merged.absorb(second);

    let (intra, cross) = merged.duplicate_counts();
    assert_eq!(intra, 0);
    assert_eq!(cross, 1);
    assert_eq!(merged.node_count(), 1);
}

#[test]
fn relationships_deduplicate_by_entity_id() {
    let mut merged = MergedGraph::new();

    let a = node(NodeKind::Function, "a", "/src/x.ts:a:1", "/src/x.ts");
    let b = node(NodeKind::Function, "b", "/src/x.ts:b:2", "/src/x.ts");

    let mut result = FileParseResult::new("/src/x.ts");
    let a_id = result.push_node(a);
    let b_id = result.push_node(b);
    result.push_relationship(Relationship::new(
        RelationshipType::Calls,
        a_id.clone(),
        b_id.clone(),
    ));
    result.push_relationship(Relationship::new(RelationshipType::Calls, a_id, b_id));
    merged.absorb(result);

    assert_eq!(merged.relationship_count(), 1);
}

#[test]
fn reconciliation_flips_placeholders_whose_target_exists() {
    let mut merged = MergedGraph::new();

    let base = node(NodeKind::Class, "Base", "/src/base.ts:Base", "/src/base.ts");
    let derived = node(
        NodeKind::Class,
        "Derived",
        "/src/derived.ts:Derived",
        "/src/derived.ts",
    );
    let base_id = base.entity_id().clone();
    let derived_id = derived.entity_id().clone();

    let mut result = FileParseResult::new("/src/derived.ts");
    result.push_node(derived);
    result.push_relationship(
        Relationship::new(RelationshipType::Extends, derived_id, base_id.clone())
            .with_placeholder(),
    );
    merged.absorb(result);

    let mut other = FileParseResult::new("/src/base.ts");
    other.push_node(base);
    merged.absorb(other);

    merged.reconcile_placeholders();

    let edge = merged.relationships().next().unwrap();
    assert!(!edge.is_placeholder());

    // A placeholder pointing nowhere stays a placeholder
    let mut dangling = FileParseResult::new("/src/derived.ts");
    dangling.push_relationship(
        Relationship::new(
            RelationshipType::Extends,
            base_id,
            carto_core::EntityId::new("Class", "/src/missing.ts:Gone"),
        )
        .with_placeholder(),
    );
    merged.absorb(dangling);
    merged.reconcile_placeholders();

    let placeholders = merged
        .relationships()
        .filter(|r| r.is_placeholder())
        .count();
    assert_eq!(placeholders, 1);
}
