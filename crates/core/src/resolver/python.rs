//! Python call resolution.
//!
//! Pass 1 emits every Python call as a placeholder `PYTHON_CALLS` edge
//! carrying the callee name. Resolution here is deliberately cheap and
//! name-based: a callee that matches a function or method in the same file
//! gets the edge re-pointed at the real node; anything else (builtins,
//! library calls) stays a placeholder.

use crate::graph::{EdgePatch, NodeIndex, NodeKind, RelationshipType};

pub fn resolve(index: &NodeIndex<'_>) -> EdgePatch {
    let mut patch = EdgePatch::default();

    for rel in index.relationships() {
        if rel.rel_type() != RelationshipType::PythonCalls || !rel.is_placeholder() {
            continue;
        }
        let Some(target_name) = rel.str_prop("targetName") else {
            continue;
        };
        let Some(source) = index.get(rel.source_id()) else {
            continue;
        };

        let file = source.file_path();
        let target = index
            .named_in_file(NodeKind::PythonFunction, target_name, file)
            .or_else(|| index.named_in_file(NodeKind::PythonMethod, target_name, file));

        if let Some(target) = target {
            let mut resolved = rel.clone();
            resolved.retarget(target.entity_id().clone());
            resolved.set_placeholder(false);
            patch.remove.push(rel.entity_id().clone());
            patch.add.push(resolved);
        }
    }

    patch
}
