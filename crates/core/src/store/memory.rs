//! In-memory graph store.
//!
//! Reference implementation of the upsert semantics: merge by entity id,
//! replace properties, materialize stub endpoints. Tests assert referential
//! closure and idempotence against this store; store-less runs use it as a
//! sink.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::graph::{EntityId, Node, NodeKind, Relationship, RelationshipType};

use super::GraphStore;

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<EntityId, Node>,
    /// Endpoints created by relationship upserts before (or without) their
    /// real node arriving.
    stubs: HashSet<EntityId>,
    relationships: HashMap<(RelationshipType, EntityId), Relationship>,
    schema_applied: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an id is present, as a real node or a stub.
    pub fn contains_node(&self, id: &EntityId) -> bool {
        let inner = self.inner.lock().expect("store lock");
        inner.nodes.contains_key(id) || inner.stubs.contains(id)
    }

    pub fn node(&self, id: &EntityId) -> Option<Node> {
        self.inner.lock().expect("store lock").nodes.get(id).cloned()
    }

    pub fn find_nodes(&self, kind: NodeKind, name: &str) -> Vec<Node> {
        self.inner
            .lock()
            .expect("store lock")
            .nodes
            .values()
            .filter(|n| n.kind() == kind && n.name() == name)
            .cloned()
            .collect()
    }

    pub fn relationships_of_type(&self, rel_type: RelationshipType) -> Vec<Relationship> {
        self.inner
            .lock()
            .expect("store lock")
            .relationships
            .iter()
            .filter(|((t, _), _)| *t == rel_type)
            .map(|(_, rel)| rel.clone())
            .collect()
    }

    pub fn all_relationships(&self) -> Vec<Relationship> {
        self.inner
            .lock()
            .expect("store lock")
            .relationships
            .values()
            .cloned()
            .collect()
    }

    pub fn stub_count(&self) -> usize {
        self.inner.lock().expect("store lock").stubs.len()
    }
}

impl GraphStore for MemoryStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.inner.lock().expect("store lock").schema_applied = true;
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.nodes.clear();
        inner.stubs.clear();
        inner.relationships.clear();
        Ok(())
    }

    fn upsert_nodes(&self, batch: &[Node]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        for node in batch {
            inner.stubs.remove(node.entity_id());
            inner.nodes.insert(node.entity_id().clone(), node.clone());
        }
        Ok(())
    }

    fn upsert_relationships(
        &self,
        rel_type: RelationshipType,
        batch: &[Relationship],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        for rel in batch {
            for endpoint in [rel.source_id(), rel.target_id()] {
                if !inner.nodes.contains_key(endpoint) {
                    inner.stubs.insert(endpoint.clone());
                }
            }
            inner
                .relationships
                .insert((rel_type, rel.entity_id().clone()), rel.clone());
        }
        Ok(())
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.nodes.len() + inner.stubs.len())
    }

    fn relationship_count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().expect("store lock").relationships.len())
    }
}
