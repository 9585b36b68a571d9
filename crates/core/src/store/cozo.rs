//! CozoDB-backed graph store.
//!
//! Embedded property-graph persistence: `mem` engine for tests, SQLite
//! backend for durable runs. Rows are written through `import_relations`,
//! whose keyed put gives the idempotent MERGE-by-entity-id semantics the
//! writer relies on. Behind the `cozo-store` feature.

use std::collections::BTreeMap;
use std::path::Path;

use cozo_ce::{DataValue, DbInstance, NamedRows, Num, ScriptMutability};

use crate::error::StoreError;
use crate::graph::{Node, Relationship, RelationshipType};

use super::GraphStore;

pub struct CozoStore {
    db: DbInstance,
}

const NODE_COLUMNS: &[&str] = &[
    "entity_id",
    "kind",
    "name",
    "file_path",
    "language",
    "start_line",
    "end_line",
    "start_column",
    "end_column",
    "parent_id",
    "properties_json",
    "created_at",
];

const EDGE_COLUMNS: &[&str] = &[
    "rel_type",
    "entity_id",
    "source_id",
    "target_id",
    "weight",
    "properties_json",
    "created_at",
];

impl CozoStore {
    /// In-memory instance (tests).
    pub fn new_memory() -> Result<Self, StoreError> {
        let db = DbInstance::new("mem", "", Default::default())
            .map_err(|e| StoreError::new(format!("failed to create CozoDB: {e}")))?;
        let store = Self { db };
        store.ensure_schema()?;
        Ok(store)
    }

    /// SQLite-backed instance (persistent runs).
    pub fn new_sqlite(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = DbInstance::new("sqlite", path.as_ref(), Default::default())
            .map_err(|e| StoreError::new(format!("failed to create CozoDB with SQLite: {e}")))?;
        let store = Self { db };
        store.ensure_schema()?;
        Ok(store)
    }

    fn run_mut(&self, script: &str) -> Result<NamedRows, StoreError> {
        self.db
            .run_script(script, BTreeMap::new(), ScriptMutability::Mutable)
            .map_err(|e| StoreError::with_code("cozo.script", format!("{e}")))
    }

    fn run_query(
        &self,
        script: &str,
        params: BTreeMap<String, DataValue>,
    ) -> Result<NamedRows, StoreError> {
        self.db
            .run_script(script, params, ScriptMutability::Immutable)
            .map_err(|e| StoreError::with_code("cozo.query", format!("{e}")))
    }

    fn import(&self, relation: &str, columns: &[&str], rows: Vec<Vec<DataValue>>) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut data = BTreeMap::new();
        data.insert(
            relation.to_string(),
            NamedRows {
                headers: columns.iter().map(|c| c.to_string()).collect(),
                rows,
                next: None,
            },
        );
        self.db
            .import_relations(data)
            .map_err(|e| StoreError::with_code("cozo.import", format!("{e}")))
    }

    fn node_row(node: &Node) -> Result<Vec<DataValue>, StoreError> {
        let properties = serde_json::to_string(node.properties())
            .map_err(|e| StoreError::new(format!("serialize node properties: {e}")))?;
        let span = node.span();
        Ok(vec![
            DataValue::Str(node.entity_id().as_str().into()),
            DataValue::Str(node.kind().label().into()),
            DataValue::Str(node.name().into()),
            DataValue::Str(node.file_path().into()),
            DataValue::Str(node.language().into()),
            DataValue::from(span.start_line as i64),
            DataValue::from(span.end_line as i64),
            DataValue::from(span.start_column as i64),
            DataValue::from(span.end_column as i64),
            DataValue::Str(
                node.parent_id()
                    .map(|p| p.as_str())
                    .unwrap_or_default()
                    .into(),
            ),
            DataValue::Str(properties.into()),
            DataValue::Str(node.created_at().into()),
        ])
    }

    fn edge_row(rel_type: RelationshipType, rel: &Relationship) -> Result<Vec<DataValue>, StoreError> {
        let properties = serde_json::to_string(rel.properties())
            .map_err(|e| StoreError::new(format!("serialize relationship properties: {e}")))?;
        Ok(vec![
            DataValue::Str(rel_type.as_str().into()),
            DataValue::Str(rel.entity_id().as_str().into()),
            DataValue::Str(rel.source_id().as_str().into()),
            DataValue::Str(rel.target_id().as_str().into()),
            DataValue::from(rel.weight() as i64),
            DataValue::Str(properties.into()),
            DataValue::Str(rel.created_at().into()),
        ])
    }

    fn node_exists(&self, entity_id: &str) -> Result<bool, StoreError> {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), DataValue::Str(entity_id.into()));
        let result = self.run_query(
            "?[entity_id] := *nodes{entity_id}, entity_id = $id",
            params,
        )?;
        Ok(!result.rows.is_empty())
    }

    /// A key-only stub row for an endpoint the run never saw. Real nodes
    /// overwrite stubs on a later upsert because the key matches.
    fn stub_row(entity_id: &str) -> Vec<DataValue> {
        vec![
            DataValue::Str(entity_id.into()),
            DataValue::Str("".into()),
            DataValue::Str("".into()),
            DataValue::Str("".into()),
            DataValue::Str("".into()),
            DataValue::from(0i64),
            DataValue::from(0i64),
            DataValue::from(0i64),
            DataValue::from(0i64),
            DataValue::Str("".into()),
            DataValue::Str("{\"isStub\":true}".into()),
            DataValue::Str("".into()),
        ]
    }
}

impl GraphStore for CozoStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        let create_nodes = r#"
            :create nodes {
                entity_id: String
                =>
                kind: String,
                name: String,
                file_path: String,
                language: String,
                start_line: Int,
                end_line: Int,
                start_column: Int,
                end_column: Int,
                parent_id: String,
                properties_json: String,
                created_at: String
            }
        "#;

        let create_edges = r#"
            :create edges {
                rel_type: String,
                entity_id: String
                =>
                source_id: String,
                target_id: String,
                weight: Int,
                properties_json: String,
                created_at: String
            }
        "#;

        for script in [create_nodes, create_edges] {
            match self.run_mut(script) {
                Ok(_) => {}
                Err(err) => {
                    // Re-applying the schema over an existing database is fine
                    if !err.message.contains("already exists") {
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let delete_nodes = r#"?[entity_id, kind, name, file_path, language, start_line, end_line, start_column, end_column, parent_id, properties_json, created_at] :=
                *nodes{entity_id, kind, name, file_path, language, start_line, end_line, start_column, end_column, parent_id, properties_json, created_at}
            :delete nodes {entity_id => kind, name, file_path, language, start_line, end_line, start_column, end_column, parent_id, properties_json, created_at}"#;

        let delete_edges = r#"?[rel_type, entity_id, source_id, target_id, weight, properties_json, created_at] :=
                *edges{rel_type, entity_id, source_id, target_id, weight, properties_json, created_at}
            :delete edges {rel_type, entity_id => source_id, target_id, weight, properties_json, created_at}"#;

        self.run_mut(delete_nodes)?;
        self.run_mut(delete_edges)?;
        Ok(())
    }

    fn upsert_nodes(&self, batch: &[Node]) -> Result<(), StoreError> {
        let rows = batch
            .iter()
            .map(Self::node_row)
            .collect::<Result<Vec<_>, _>>()?;
        self.import("nodes", NODE_COLUMNS, rows)
    }

    fn upsert_relationships(
        &self,
        rel_type: RelationshipType,
        batch: &[Relationship],
    ) -> Result<(), StoreError> {
        // Materialize stub endpoints first so the stored graph stays
        // referentially closed.
        let mut stubs = Vec::new();
        for rel in batch {
            for endpoint in [rel.source_id(), rel.target_id()] {
                if !self.node_exists(endpoint.as_str())? {
                    stubs.push(Self::stub_row(endpoint.as_str()));
                }
            }
        }
        self.import("nodes", NODE_COLUMNS, stubs)?;

        let rows = batch
            .iter()
            .map(|rel| Self::edge_row(rel_type, rel))
            .collect::<Result<Vec<_>, _>>()?;
        self.import("edges", EDGE_COLUMNS, rows)
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        let result = self.run_query("?[count(entity_id)] := *nodes{entity_id}", BTreeMap::new())?;
        count_from(&result)
    }

    fn relationship_count(&self) -> Result<usize, StoreError> {
        let result = self.run_query(
            "?[count(entity_id)] := *edges{rel_type, entity_id}",
            BTreeMap::new(),
        )?;
        count_from(&result)
    }
}

fn count_from(rows: &NamedRows) -> Result<usize, StoreError> {
    let Some(row) = rows.rows.first() else {
        return Ok(0);
    };
    match row.first() {
        Some(DataValue::Num(Num::Int(n))) => Ok(*n as usize),
        Some(DataValue::Num(Num::Float(f))) => Ok(*f as usize),
        other => Err(StoreError::new(format!("expected count, got {other:?}"))),
    }
}
