//! Graph storage abstraction layer.
//!
//! A [`GraphStore`] is the seam between the engine and whatever holds the
//! persisted graph: upserts are idempotent and keyed by entity id, so
//! re-running an analysis converges instead of duplicating. Two
//! implementations ship here:
//!
//! - [`MemoryStore`]: in-memory maps, always available, used by tests and
//!   store-less runs.
//! - [`CozoStore`]: embedded CozoDB (mem or SQLite file), behind the
//!   `cozo-store` feature.

pub mod memory;
pub mod writer;

#[cfg(feature = "cozo-store")]
pub mod cozo;

pub use memory::MemoryStore;
pub use writer::StorageWriter;

#[cfg(feature = "cozo-store")]
pub use cozo::CozoStore;

use crate::error::StoreError;
use crate::graph::{Node, Relationship, RelationshipType};

/// Abstract graph storage backend.
///
/// Batches arrive pre-sharded from the [`StorageWriter`]; an implementation
/// commits each batch atomically. Upserting a relationship whose endpoints
/// are unknown MUST materialize stub nodes for them so the stored graph
/// stays referentially closed.
pub trait GraphStore: Send + Sync {
    /// Create labels/relations/indexes. Idempotent.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Delete all nodes and relationships.
    fn reset(&self) -> Result<(), StoreError>;

    /// Upsert one batch of nodes, merged by entity id. Properties are
    /// replaced, not merged, so stale attributes from earlier runs drop out.
    fn upsert_nodes(&self, batch: &[Node]) -> Result<(), StoreError>;

    /// Upsert one batch of relationships of a single type, merged by
    /// `(type, entityId)`.
    fn upsert_relationships(
        &self,
        rel_type: RelationshipType,
        batch: &[Relationship],
    ) -> Result<(), StoreError>;

    fn node_count(&self) -> Result<usize, StoreError>;

    fn relationship_count(&self) -> Result<usize, StoreError>;
}
