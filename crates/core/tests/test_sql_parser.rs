//! SQL extraction and reference resolution tests.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use carto_core::graph::{FileParseResult, InstanceIds, NodeKind, RelationshipType};
use carto_core::parser::sql::SqlParser;
use carto_core::parser::{FileContext, Language, LanguageParser};
use carto_core::store::MemoryStore;
use carto_core::{analyze_with_store, AnalyzeOptions};

fn parse(source: &str) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new("/db/schema.sql"),
        Language::Sql,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    SqlParser::new()
        .parse_source(source, &ctx)
        .expect("parse should succeed")
}

fn nodes_of(result: &FileParseResult, kind: NodeKind) -> Vec<&carto_core::Node> {
    result.nodes.iter().filter(|n| n.kind() == kind).collect()
}

const SCHEMA: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL,
    created_at TIMESTAMP
);

CREATE VIEW active_users AS
SELECT id, email FROM users WHERE created_at IS NOT NULL;

SELECT email FROM users;
INSERT INTO users (email) VALUES ('a@b.c');
UPDATE users SET email = 'x@y.z' WHERE id = 1;
DELETE FROM users WHERE id = 2;
"#;

#[test]
fn create_table_yields_table_and_columns() {
    let result = parse(SCHEMA);

    let tables = nodes_of(&result, NodeKind::SqlTable);
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name(), "users");

    let columns = nodes_of(&result, NodeKind::SqlColumn);
    let names: Vec<_> = columns.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["id", "email", "created_at"]);

    let id = columns.iter().find(|c| c.name() == "id").unwrap();
    assert_eq!(id.str_prop("type"), Some("INTEGER"));

    let has_column: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::HasColumn)
        .collect();
    assert_eq!(has_column.len(), 3);
    for edge in has_column {
        assert_eq!(edge.source_id(), tables[0].entity_id());
    }

    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::DefinesTable));
}

#[test]
fn create_view_keeps_query_text() {
    let result = parse(SCHEMA);

    let views = nodes_of(&result, NodeKind::SqlView);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].name(), "active_users");
    let query = views[0].str_prop("queryText").unwrap();
    assert!(query.starts_with("SELECT"));
    assert!(query.contains("FROM users"));
}

#[test]
fn dml_statements_get_verb_kinds() {
    let result = parse(SCHEMA);

    assert_eq!(nodes_of(&result, NodeKind::SqlSelectStatement).len(), 1);
    assert_eq!(nodes_of(&result, NodeKind::SqlInsertStatement).len(), 1);
    assert_eq!(nodes_of(&result, NodeKind::SqlUpdateStatement).len(), 1);
    assert_eq!(nodes_of(&result, NodeKind::SqlDeleteStatement).len(), 1);

    let select = nodes_of(&result, NodeKind::SqlSelectStatement)[0];
    assert!(select.str_prop("text").unwrap().contains("FROM users"));
}

#[test]
fn references_resolve_to_tables_in_pass_2() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("schema.sql"), SCHEMA).unwrap();

    let store = MemoryStore::new();
    analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    let users = store
        .find_nodes(NodeKind::SqlTable, "users")
        .into_iter()
        .next()
        .expect("users table");

    let references = store.relationships_of_type(RelationshipType::ReferencesTable);
    // view + select + insert + update + delete all reference `users`
    assert_eq!(references.len(), 5);
    for edge in &references {
        assert_eq!(edge.target_id(), users.entity_id());
    }
}
