//! End-to-end pipeline tests: boundary behaviors and idempotent
//! persistence.

use tempfile::TempDir;

use carto_core::graph::{NodeKind, RelationshipType};
use carto_core::store::MemoryStore;
use carto_core::{analyze_with_store, AnalyzeOptions, GraphStore};

fn write(dir: &TempDir, name: &str, content: &str) {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

#[test]
fn empty_directory_succeeds_with_nothing_written() {
    let dir = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let report = analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    assert_eq!(report.files_discovered, 0);
    assert_eq!(report.node_count, 0);
    assert_eq!(store.node_count().unwrap(), 0);
}

#[test]
fn file_with_no_constructs_still_gets_a_file_node() {
    let dir = TempDir::new().unwrap();
    write(&dir, "empty.ts", "// nothing here\n");

    let store = MemoryStore::new();
    let report = analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    assert_eq!(report.files_parsed, 1);
    assert_eq!(store.find_nodes(NodeKind::File, "empty.ts").len(), 1);
}

#[test]
fn ignored_files_never_become_nodes() {
    let dir = TempDir::new().unwrap();
    write(&dir, "app.ts", "export const x = 1;\n");
    write(&dir, "node_modules/lib/index.js", "module.exports = 1;\n");

    let store = MemoryStore::new();
    analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    assert!(store.find_nodes(NodeKind::File, "index.js").is_empty());
    assert_eq!(store.find_nodes(NodeKind::File, "app.ts").len(), 1);
}

#[test]
fn broken_file_is_dropped_without_aborting_the_run() {
    let dir = TempDir::new().unwrap();
    write(&dir, "good.sql", "CREATE TABLE t (id INTEGER);\n");
    // Invalid UTF-8 makes the file unreadable for the SQL parser
    std::fs::write(dir.path().join("bad.sql"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let store = MemoryStore::new();
    let report = analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    assert_eq!(report.files_failed, 1);
    assert_eq!(store.find_nodes(NodeKind::SqlTable, "t").len(), 1);
}

#[test]
fn running_twice_converges_on_the_same_graph() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "a.ts",
        "import { funcB } from './b';\nexport function funcA() { funcB(); }\n",
    );
    write(
        &dir,
        "b.ts",
        "export function funcB() { console.log('x'); }\n",
    );

    let store = MemoryStore::new();
    let options = AnalyzeOptions::default();

    analyze_with_store(dir.path(), &options, &store).unwrap();
    let nodes_first = store.node_count().unwrap();
    let edges_first = store.relationship_count().unwrap();
    assert!(nodes_first > 0);

    analyze_with_store(dir.path(), &options, &store).unwrap();
    assert_eq!(store.node_count().unwrap(), nodes_first);
    assert_eq!(store.relationship_count().unwrap(), edges_first);
}

#[test]
fn reset_db_clears_previous_state() {
    let dir = TempDir::new().unwrap();
    write(&dir, "one.ts", "export const one = 1;\n");

    let store = MemoryStore::new();
    analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();
    assert!(store.node_count().unwrap() > 0);

    // Second run over a different tree with reset_db leaves only that
    // tree's nodes behind.
    let other = TempDir::new().unwrap();
    write(&other, "two.ts", "export const two = 2;\n");
    let options = AnalyzeOptions {
        reset_db: true,
        ..Default::default()
    };
    analyze_with_store(other.path(), &options, &store).unwrap();

    assert!(store.find_nodes(NodeKind::File, "one.ts").is_empty());
    assert_eq!(store.find_nodes(NodeKind::File, "two.ts").len(), 1);
}

#[test]
fn extension_override_limits_the_scan() {
    let dir = TempDir::new().unwrap();
    write(&dir, "app.ts", "export const x = 1;\n");
    write(&dir, "schema.sql", "CREATE TABLE t (id INTEGER);\n");

    let store = MemoryStore::new();
    let mut options = AnalyzeOptions::default();
    options.set_extensions_from_list("sql");
    let report = analyze_with_store(dir.path(), &options, &store).unwrap();

    assert_eq!(report.files_discovered, 1);
    assert!(store.find_nodes(NodeKind::File, "app.ts").is_empty());
    assert_eq!(store.find_nodes(NodeKind::SqlTable, "t").len(), 1);
}

#[test]
fn every_stored_edge_type_is_in_the_vocabulary() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "mixed.tsx",
        "export function App() { return <div className=\"p-2\" />; }\n",
    );
    write(&dir, "schema.sql", "CREATE TABLE logs (id INTEGER);\n");

    let store = MemoryStore::new();
    analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    for rel in store.all_relationships() {
        // Round-trip through the serialized tag proves membership in the
        // closed set
        let tag = rel.rel_type().as_str();
        assert_eq!(RelationshipType::from_str_tag(tag), Some(rel.rel_type()));
    }
}
