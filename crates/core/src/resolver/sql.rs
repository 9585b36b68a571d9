//! SQL reference resolution.
//!
//! Views and DML statements stored their query text in Pass 1; this pass
//! scans the text for relation names after `FROM`/`JOIN`/`INTO`/`UPDATE`
//! and links each to a known `SQLTable` or `SQLView` by name. Names with no
//! matching relation in the index are skipped, not guessed.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::graph::{EdgePatch, NodeIndex, NodeKind, Relationship, RelationshipType};

fn relation_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:FROM|JOIN|INTO|UPDATE)\s+[`"\[]?([A-Za-z0-9_.]+)"#)
            .expect("static regex")
    })
}

pub fn resolve(index: &NodeIndex<'_>) -> EdgePatch {
    let mut patch = EdgePatch::default();

    let statement_kinds = [
        NodeKind::SqlView,
        NodeKind::SqlSelectStatement,
        NodeKind::SqlInsertStatement,
        NodeKind::SqlUpdateStatement,
        NodeKind::SqlDeleteStatement,
    ];

    for file_node in index.files() {
        if file_node.language() != "sql" {
            continue;
        }
        for node in index.in_file(file_node.file_path()) {
            if !statement_kinds.contains(&node.kind()) {
                continue;
            }
            let Some(text) = node.str_prop("queryText").or_else(|| node.str_prop("text"))
            else {
                continue;
            };

            let mut seen: HashSet<String> = HashSet::new();
            for captures in relation_ref_pattern().captures_iter(text) {
                let Some(name) = captures.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                if name.eq_ignore_ascii_case(node.name()) || !seen.insert(name.to_string()) {
                    continue;
                }

                if let Some(table) = index
                    .named_in_file(NodeKind::SqlTable, name, file_node.file_path())
                    .or_else(|| index.named(NodeKind::SqlTable, name).first().copied())
                {
                    patch.add.push(
                        Relationship::new(
                            RelationshipType::ReferencesTable,
                            node.entity_id().clone(),
                            table.entity_id().clone(),
                        )
                        .with_prop("tableName", name),
                    );
                } else if let Some(view) = index
                    .named_in_file(NodeKind::SqlView, name, file_node.file_path())
                    .or_else(|| index.named(NodeKind::SqlView, name).first().copied())
                {
                    patch.add.push(
                        Relationship::new(
                            RelationshipType::ReferencesView,
                            node.entity_id().clone(),
                            view.entity_id().clone(),
                        )
                        .with_prop("viewName", name),
                    );
                }
            }
        }
    }

    patch
}
