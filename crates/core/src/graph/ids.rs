//! Deterministic entity identifiers.
//!
//! Every node and relationship is keyed by an [`EntityId`] derived from its
//! kind and canonical qualified name. Pass 2 reconstructs the same ids from
//! the same inputs to look nodes up in the merged index, so the encoding here
//! is the contract between the two passes: same `(kind, qualifiedName)` in,
//! same id out, on every run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier for a node or relationship, unique across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Derive an id from a kind tag and a qualified name (see the id rules on
    /// the constructors below). The digest is truncated to 128 bits, which is
    /// plenty for collision resistance at codebase scale.
    pub fn new(kind: &str, qualified_name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(b":");
        hasher.update(qualified_name.as_bytes());
        let digest = hasher.finalize();

        let mut out = String::with_capacity(32);
        for byte in &digest[..16] {
            use fmt::Write;
            let _ = write!(out, "{byte:02x}");
        }
        EntityId(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-run instance id allocator. Instance ids are unique within one analyze
/// invocation and are never persisted as identity.
#[derive(Debug, Default)]
pub struct InstanceIds {
    next: AtomicU64,
}

impl InstanceIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_id() {
        let a = EntityId::new("Function", "/src/a.ts:funcA:3");
        let b = EntityId::new("Function", "/src/a.ts:funcA:3");
        assert_eq!(a, b);
    }

    #[test]
    fn kind_participates_in_identity() {
        let a = EntityId::new("Function", "/src/a.ts:thing:3");
        let b = EntityId::new("Variable", "/src/a.ts:thing:3");
        assert_ne!(a, b);
    }

    #[test]
    fn id_is_32_hex_chars() {
        let id = EntityId::new("File", "/src/a.ts");
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
