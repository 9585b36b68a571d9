//! C/C++ include resolution.
//!
//! Every `IncludeDirective` from Pass 1 produces a file-to-file `INCLUDES`
//! edge. The target is looked up in the merged index: relative to the
//! including file first, then as given, then by path suffix. Unresolved
//! includes (system headers, files outside the scanned tree) get a
//! placeholder target built from the include path verbatim.

use serde_json::Value;

use crate::graph::{EdgePatch, EntityId, NodeIndex, NodeKind, Relationship, RelationshipType};

pub fn resolve(index: &NodeIndex<'_>) -> EdgePatch {
    let mut patch = EdgePatch::default();

    let directives: Vec<_> = index
        .relationships()
        .filter(|rel| rel.rel_type() == RelationshipType::Includes)
        .filter_map(|rel| index.get(rel.target_id()))
        .filter(|node| node.kind() == NodeKind::IncludeDirective)
        .collect();

    for directive in directives {
        let Some(include_path) = directive.str_prop("includePath") else {
            continue;
        };
        let Some(file_node) = index.file(directive.file_path()) else {
            tracing::warn!(
                file = directive.file_path(),
                "include directive without a file node in the index"
            );
            continue;
        };

        let resolved = lookup_target(index, directive.file_path(), include_path);

        let mut rel = match &resolved {
            Some(target) => Relationship::new(
                RelationshipType::Includes,
                file_node.entity_id().clone(),
                target.entity_id().clone(),
            ),
            None => Relationship::new(
                RelationshipType::Includes,
                file_node.entity_id().clone(),
                EntityId::new(NodeKind::File.label(), include_path),
            )
            .with_placeholder(),
        };
        rel.set_prop("includePath", include_path);
        rel.set_prop("isCrossFile", true);
        rel.set_prop(
            "isSystemInclude",
            directive
                .prop("isSystemInclude")
                .cloned()
                .unwrap_or(Value::Bool(false)),
        );
        patch.add.push(rel);
    }

    patch
}

fn lookup_target<'g>(
    index: &NodeIndex<'g>,
    including_file: &str,
    include_path: &str,
) -> Option<&'g crate::graph::Node> {
    // Relative to the including file's directory
    if let Some((dir, _)) = including_file.rsplit_once('/') {
        let joined = format!("{dir}/{include_path}");
        if let Some(node) = index.file(&joined) {
            return Some(node);
        }
    }
    // Exact path as written
    if let Some(node) = index.file(include_path) {
        return Some(node);
    }
    // Suffix match anywhere in the scanned tree
    index.file_by_suffix(&format!("/{include_path}"))
}
