//! Pass 2 tests: imports, calls, inheritance and component usage across
//! files. Each test writes a small tree into a temp dir, runs the full
//! pipeline against an in-memory store, and asserts on specific edges.

use tempfile::TempDir;

use carto_core::graph::{NodeKind, RelationshipType};
use carto_core::store::MemoryStore;
use carto_core::{analyze_with_store, AnalyzeOptions};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn run(dir: &TempDir) -> MemoryStore {
    let store = MemoryStore::new();
    let options = AnalyzeOptions::default();
    analyze_with_store(dir.path(), &options, &store).expect("analyze should succeed");
    store
}

#[test]
fn ts_import_resolves_to_exported_function() {
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
    let store = run(&dir);

    // An Import node exists for './b'
    let imports = store.find_nodes(NodeKind::Import, "./b");
    assert_eq!(imports.len(), 1);

    // File —IMPORTS→ File edge between a.ts and b.ts
    let file_a = store
        .find_nodes(NodeKind::File, "a.ts")
        .into_iter()
        .next()
        .expect("a.ts file node");
    let file_b = store
        .find_nodes(NodeKind::File, "b.ts")
        .into_iter()
        .next()
        .expect("b.ts file node");
    let imports_edges = store.relationships_of_type(RelationshipType::Imports);
    assert!(
        imports_edges
            .iter()
            .any(|r| r.source_id() == file_a.entity_id()
                && r.target_id() == file_b.entity_id()),
        "expected a.ts →IMPORTS→ b.ts"
    );

    // Import node —RESOLVES_IMPORT→ funcB
    let func_b = store
        .find_nodes(NodeKind::Function, "funcB")
        .into_iter()
        .next()
        .expect("funcB node");
    let resolves = store.relationships_of_type(RelationshipType::ResolvesImport);
    assert!(
        resolves
            .iter()
            .any(|r| r.source_id() == imports[0].entity_id()
                && r.target_id() == func_b.entity_id()),
        "expected Import node →RESOLVES_IMPORT→ funcB"
    );

    // funcA —CALLS→ funcB, resolved and cross-file
    let func_a = store
        .find_nodes(NodeKind::Function, "funcA")
        .into_iter()
        .next()
        .expect("funcA node");
    let calls = store.relationships_of_type(RelationshipType::Calls);
    let call = calls
        .iter()
        .find(|r| r.source_id() == func_a.entity_id() && r.target_id() == func_b.entity_id())
        .expect("funcA →CALLS→ funcB");
    assert!(!call.bool_prop("isPlaceholder"));
    assert!(call.bool_prop("isCrossFile"));
}

#[test]
fn unresolved_import_yields_placeholder_file_edge() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.ts", "import { x } from 'left-pad';\nexport const y = 1;\n");
    let store = run(&dir);

    let imports_edges = store.relationships_of_type(RelationshipType::Imports);
    let placeholder = imports_edges
        .iter()
        .find(|r| r.str_prop("moduleSpecifier") == Some("left-pad"))
        .expect("file-level import edge for external module");
    assert!(placeholder.bool_prop("isPlaceholder"));

    // No RESOLVES_IMPORT for a symbol that cannot be found
    assert!(store
        .relationships_of_type(RelationshipType::ResolvesImport)
        .is_empty());
}

#[test]
fn class_inheritance_across_files() {
    let dir = TempDir::new().unwrap();
    write(&dir, "base.ts", "export class Base {}\n");
    write(
        &dir,
        "derived.ts",
        "import { Base } from './base';\nexport class Derived extends Base {}\n",
    );
    let store = run(&dir);

    let base = store
        .find_nodes(NodeKind::Class, "Base")
        .into_iter()
        .next()
        .unwrap();
    let derived = store
        .find_nodes(NodeKind::Class, "Derived")
        .into_iter()
        .next()
        .unwrap();

    let extends = store.relationships_of_type(RelationshipType::Extends);
    let edge = extends
        .iter()
        .find(|r| r.source_id() == derived.entity_id())
        .expect("Derived has an EXTENDS edge");
    assert_eq!(edge.target_id(), base.entity_id());
    assert!(!edge.bool_prop("isPlaceholder"));
}

#[test]
fn extends_of_unknown_base_stays_placeholder() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "widget.ts",
        "export class Widget extends LibraryBase {}\n",
    );
    let store = run(&dir);

    let extends = store.relationships_of_type(RelationshipType::Extends);
    assert_eq!(extends.len(), 1);
    assert!(extends[0].bool_prop("isPlaceholder"));
    assert_eq!(extends[0].str_prop("targetName"), Some("LibraryBase"));
}

#[test]
fn component_usage_across_files() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "Child.tsx",
        "export function Child() { return <div />; }\n",
    );
    write(
        &dir,
        "Parent.tsx",
        "import { Child } from './Child';\nexport function Parent() { return <Child prop=\"x\" />; }\n",
    );
    let store = run(&dir);

    let parent = store
        .find_nodes(NodeKind::Component, "Parent")
        .into_iter()
        .next()
        .expect("Parent component");
    let child = store
        .find_nodes(NodeKind::Component, "Child")
        .into_iter()
        .next()
        .expect("Child component");

    let uses = store.relationships_of_type(RelationshipType::UsesComponent);
    assert!(
        uses.iter()
            .any(|r| r.source_id() == parent.entity_id()
                && r.target_id() == child.entity_id()),
        "expected Parent →USES_COMPONENT→ Child"
    );
}

#[test]
fn try_catch_emits_handles_error() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "risky.ts",
        "export function risky() {\n    try {\n        work();\n    } catch (err) {\n        console.log(err);\n    }\n}\n",
    );
    let store = run(&dir);

    let risky = store
        .find_nodes(NodeKind::Function, "risky")
        .into_iter()
        .next()
        .unwrap();
    let handles = store.relationships_of_type(RelationshipType::HandlesError);
    let edge = handles
        .iter()
        .find(|r| r.source_id() == risky.entity_id())
        .expect("risky has a HANDLES_ERROR edge");
    assert_eq!(edge.str_prop("catchBinding"), Some("err"));
}

#[test]
fn mutation_of_module_variable_is_recorded() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "counter.ts",
        "let count = 0;\nexport function bump() {\n    count = count + 1;\n}\n",
    );
    let store = run(&dir);

    let bump = store
        .find_nodes(NodeKind::Function, "bump")
        .into_iter()
        .next()
        .unwrap();
    let count = store
        .find_nodes(NodeKind::Variable, "count")
        .into_iter()
        .next()
        .unwrap();

    let mutations = store.relationships_of_type(RelationshipType::MutatesState);
    assert!(mutations
        .iter()
        .any(|r| r.source_id() == bump.entity_id() && r.target_id() == count.entity_id()));
}
