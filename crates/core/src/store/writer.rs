//! Batched persistence of a merged graph.
//!
//! Nodes first, then relationships grouped by type, everything sharded into
//! fixed-size batches. Node batches land before any edge batch so stub
//! creation for missing endpoints stays the exception, not the rule.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::graph::{MergedGraph, Relationship, RelationshipType};

use super::GraphStore;

pub struct StorageWriter<'s> {
    store: &'s dyn GraphStore,
    batch_size: usize,
}

/// What one write phase committed.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteStats {
    pub nodes: usize,
    pub relationships: usize,
    pub node_batches: usize,
    pub relationship_batches: usize,
}

impl<'s> StorageWriter<'s> {
    pub fn new(store: &'s dyn GraphStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Write the whole merged graph. On a batch failure the first five
    /// offending records are logged and the error is returned; no
    /// partial-batch retry.
    pub fn write(&self, graph: &MergedGraph) -> Result<WriteStats, StoreError> {
        let mut stats = WriteStats::default();

        let nodes: Vec<_> = graph.nodes().cloned().collect();
        for batch in nodes.chunks(self.batch_size) {
            if let Err(err) = self.store.upsert_nodes(batch) {
                for node in batch.iter().take(5) {
                    tracing::error!(
                        entity_id = %node.entity_id(),
                        kind = node.kind().label(),
                        file = node.file_path(),
                        "node in failed batch"
                    );
                }
                return Err(err);
            }
            stats.node_batches += 1;
            stats.nodes += batch.len();
        }

        // Group by relationship type, then shard each group.
        let mut groups: BTreeMap<RelationshipType, Vec<Relationship>> = BTreeMap::new();
        for rel in graph.relationships() {
            groups.entry(rel.rel_type()).or_default().push(rel.clone());
        }

        for (rel_type, group) in groups {
            for batch in group.chunks(self.batch_size) {
                if let Err(err) = self.store.upsert_relationships(rel_type, batch) {
                    for rel in batch.iter().take(5) {
                        tracing::error!(
                            entity_id = %rel.entity_id(),
                            rel_type = rel_type.as_str(),
                            source = %rel.source_id(),
                            target = %rel.target_id(),
                            "relationship in failed batch"
                        );
                    }
                    return Err(err);
                }
                stats.relationship_batches += 1;
                stats.relationships += batch.len();
            }
        }

        tracing::debug!(
            nodes = stats.nodes,
            relationships = stats.relationships,
            node_batches = stats.node_batches,
            relationship_batches = stats.relationship_batches,
            "write phase complete"
        );
        Ok(stats)
    }
}
