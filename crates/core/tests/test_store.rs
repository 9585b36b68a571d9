//! Storage writer and store backend tests.
//!
//! The writer is exercised against MemoryStore (always) and CozoStore (when
//! the cozo-store feature is enabled).

use carto_core::graph::{
    FileParseResult, MergedGraph, Node, NodeKind, Relationship, RelationshipType, Span,
};
use carto_core::store::{GraphStore, MemoryStore, StorageWriter};

#[cfg(feature = "cozo-store")]
use carto_core::store::CozoStore;

fn stores() -> Vec<(&'static str, Box<dyn GraphStore>)> {
    #[allow(unused_mut)]
    let mut stores: Vec<(&'static str, Box<dyn GraphStore>)> =
        vec![("memory", Box::new(MemoryStore::new()))];

    #[cfg(feature = "cozo-store")]
    stores.push(("cozo", Box::new(CozoStore::new_memory().unwrap())));

    stores
}

fn node(name: &str, line: u32) -> Node {
    Node::new(
        NodeKind::Function,
        name,
        &format!("/src/app.ts:{name}:{line}"),
        "/src/app.ts",
        "typescript",
        Span::line(line),
    )
}

/// Three functions, a call chain, and one placeholder edge to a node that
/// is not part of the graph.
fn sample_graph() -> MergedGraph {
    let mut result = FileParseResult::new("/src/app.ts");
    let a = result.push_node(node("a", 1));
    let b = result.push_node(node("b", 5));
    let c = result.push_node(node("c", 9));

    result.push_relationship(Relationship::at_line(
        RelationshipType::Calls,
        a.clone(),
        b.clone(),
        2,
    ));
    result.push_relationship(Relationship::at_line(RelationshipType::Calls, b, c, 6));
    result.push_relationship(
        Relationship::new(
            RelationshipType::Imports,
            a,
            carto_core::EntityId::new("File", "lodash"),
        )
        .with_placeholder(),
    );

    let mut merged = MergedGraph::new();
    merged.absorb(result);
    merged
}

#[test]
fn write_persists_all_nodes_and_edges() {
    let graph = sample_graph();
    for (name, store) in stores() {
        let stats = StorageWriter::new(store.as_ref(), 100).write(&graph).unwrap();
        assert_eq!(stats.nodes, 3, "store {name}");
        assert_eq!(stats.relationships, 3, "store {name}");
        // 3 real nodes plus the placeholder endpoint stub
        assert_eq!(store.node_count().unwrap(), 4, "store {name}");
        assert_eq!(store.relationship_count().unwrap(), 3, "store {name}");
    }
}

#[test]
fn small_batches_commit_everything() {
    let graph = sample_graph();
    for (name, store) in stores() {
        let stats = StorageWriter::new(store.as_ref(), 1).write(&graph).unwrap();
        assert_eq!(stats.node_batches, 3, "store {name}");
        assert_eq!(store.relationship_count().unwrap(), 3, "store {name}");
    }
}

#[test]
fn rewriting_the_same_graph_is_idempotent() {
    let graph = sample_graph();
    for (name, store) in stores() {
        let writer = StorageWriter::new(store.as_ref(), 2);
        writer.write(&graph).unwrap();
        let nodes_before = store.node_count().unwrap();
        let edges_before = store.relationship_count().unwrap();

        writer.write(&graph).unwrap();
        assert_eq!(store.node_count().unwrap(), nodes_before, "store {name}");
        assert_eq!(
            store.relationship_count().unwrap(),
            edges_before,
            "store {name}"
        );
    }
}

#[test]
fn reset_clears_the_store() {
    let graph = sample_graph();
    for (name, store) in stores() {
        StorageWriter::new(store.as_ref(), 10).write(&graph).unwrap();
        store.reset().unwrap();
        assert_eq!(store.node_count().unwrap(), 0, "store {name}");
        assert_eq!(store.relationship_count().unwrap(), 0, "store {name}");
    }
}

#[test]
fn memory_store_keeps_graph_referentially_closed() {
    let graph = sample_graph();
    let store = MemoryStore::new();
    StorageWriter::new(&store, 10).write(&graph).unwrap();

    for rel in store.all_relationships() {
        assert!(
            store.contains_node(rel.source_id()),
            "missing source for {}",
            rel.entity_id()
        );
        assert!(
            store.contains_node(rel.target_id()),
            "missing target for {}",
            rel.entity_id()
        );
    }
    assert_eq!(store.stub_count(), 1);
}

#[test]
fn real_node_replaces_stub_on_later_upsert() {
    let store = MemoryStore::new();

    let lodash = Node::new(
        NodeKind::File,
        "lodash",
        "lodash",
        "lodash",
        "javascript",
        Span::line(1),
    );
    let a = node("a", 1);
    let rel = Relationship::new(
        RelationshipType::Imports,
        a.entity_id().clone(),
        lodash.entity_id().clone(),
    );

    store.upsert_nodes(&[a]).unwrap();
    store
        .upsert_relationships(RelationshipType::Imports, &[rel])
        .unwrap();
    assert_eq!(store.stub_count(), 1);

    store.upsert_nodes(&[lodash.clone()]).unwrap();
    assert_eq!(store.stub_count(), 0);
    assert_eq!(store.node(lodash.entity_id()).unwrap().name(), "lodash");
}
