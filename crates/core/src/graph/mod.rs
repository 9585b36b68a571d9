//! Graph data model: nodes, relationships, deterministic ids, and the
//! merge/index machinery that joins per-file Pass 1 results into the single
//! graph Pass 2 resolves against.

pub mod edges;
pub mod ids;
pub mod nodes;

pub use edges::{Relationship, RelationshipType};
pub use ids::{EntityId, InstanceIds};
pub use nodes::{Node, NodeKind, Span};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Everything one parser extracted from one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParseResult {
    pub file_path: String,
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

impl FileParseResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            nodes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn push_node(&mut self, node: Node) -> EntityId {
        let id = node.entity_id().clone();
        self.nodes.push(node);
        id
    }

    pub fn push_relationship(&mut self, rel: Relationship) {
        self.relationships.push(rel);
    }
}

/// Pass 2 patch produced by a resolver: edges to add and edge ids to drop
/// (an edge is dropped when resolution replaced it with a re-pointed copy).
#[derive(Debug, Default)]
pub struct EdgePatch {
    pub add: Vec<Relationship>,
    pub remove: Vec<EntityId>,
}

impl EdgePatch {
    pub fn merge(&mut self, other: EdgePatch) {
        self.add.extend(other.add);
        self.remove.extend(other.remove);
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// The merged graph: all Pass 1 results deduplicated by entity id, plus the
/// edges Pass 2 adds. Later emissions overwrite earlier ones deterministically
/// (last write wins); collisions are logged because a cross-file collision
/// almost always means an id-generation bug.
#[derive(Debug, Default)]
pub struct MergedGraph {
    nodes: HashMap<EntityId, Node>,
    relationships: HashMap<EntityId, Relationship>,
    intra_file_duplicates: usize,
    cross_file_duplicates: usize,
}

impl MergedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file's Pass 1 output into the graph.
    pub fn absorb(&mut self, result: FileParseResult) {
        for node in result.nodes {
            if let Some(existing) = self.nodes.get(node.entity_id()) {
                if existing.file_path() == node.file_path() {
                    self.intra_file_duplicates += 1;
                    tracing::debug!(
                        entity_id = %node.entity_id(),
                        file = node.file_path(),
                        "duplicate entity id within file, keeping latest"
                    );
                } else {
                    self.cross_file_duplicates += 1;
                    tracing::warn!(
                        entity_id = %node.entity_id(),
                        first = existing.file_path(),
                        second = node.file_path(),
                        "entity id collision across files, keeping latest"
                    );
                }
            }
            self.nodes.insert(node.entity_id().clone(), node);
        }

        for rel in result.relationships {
            self.relationships.insert(rel.entity_id().clone(), rel);
        }
    }

    /// Apply a Pass 2 patch. Removals run first so a re-pointed edge cannot
    /// collide with the placeholder it replaces.
    pub fn apply(&mut self, patch: EdgePatch) {
        for id in patch.remove {
            self.relationships.remove(&id);
        }
        for rel in patch.add {
            self.relationships.insert(rel.entity_id().clone(), rel);
        }
    }

    /// Flip `isPlaceholder` off on every edge whose target node turned out to
    /// exist in the merged node set, and log dangling parent references.
    pub fn reconcile_placeholders(&mut self) {
        let mut resolved = 0usize;
        let known: std::collections::HashSet<EntityId> = self.nodes.keys().cloned().collect();

        for rel in self.relationships.values_mut() {
            if rel.is_placeholder() && known.contains(rel.target_id()) {
                rel.set_placeholder(false);
                resolved += 1;
            }
        }
        if resolved > 0 {
            tracing::debug!(resolved, "reconciled placeholder edges against merged index");
        }

        for node in self.nodes.values() {
            if let Some(parent) = node.parent_id() {
                if !known.contains(parent) {
                    tracing::debug!(
                        entity_id = %node.entity_id(),
                        parent = %parent,
                        "node references a parent that is not in the merged set"
                    );
                }
            }
        }
    }

    pub fn node(&self, id: &EntityId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn relationship(&self, id: &EntityId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn duplicate_counts(&self) -> (usize, usize) {
        (self.intra_file_duplicates, self.cross_file_duplicates)
    }

    /// Build the read-only lookup view Pass 2 resolvers work against.
    pub fn index(&self) -> NodeIndex<'_> {
        NodeIndex::build(self)
    }
}

/// Read-only lookup over the merged node set, built once after the merge and
/// shared by every Pass 2 resolver.
pub struct NodeIndex<'g> {
    graph: &'g MergedGraph,
    file_by_path: HashMap<&'g str, &'g Node>,
    by_file: HashMap<&'g str, Vec<&'g Node>>,
    by_name: HashMap<(NodeKind, &'g str), Vec<&'g Node>>,
}

impl<'g> NodeIndex<'g> {
    fn build(graph: &'g MergedGraph) -> Self {
        let mut file_by_path: HashMap<&str, &Node> = HashMap::new();
        let mut by_file: HashMap<&str, Vec<&Node>> = HashMap::new();
        let mut by_name: HashMap<(NodeKind, &str), Vec<&Node>> = HashMap::new();

        for node in graph.nodes() {
            if node.kind() == NodeKind::File {
                file_by_path.insert(node.file_path(), node);
            }
            by_file.entry(node.file_path()).or_default().push(node);
            by_name
                .entry((node.kind(), node.name()))
                .or_default()
                .push(node);
        }

        Self {
            graph,
            file_by_path,
            by_file,
            by_name,
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&'g Node> {
        self.graph.nodes.get(id)
    }

    /// All merged relationships (Pass 1 plus earlier Pass 2 patches).
    pub fn relationships(&self) -> impl Iterator<Item = &'g Relationship> + '_ {
        self.graph.relationships.values()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.graph.nodes.contains_key(id)
    }

    pub fn file(&self, path: &str) -> Option<&'g Node> {
        self.file_by_path.get(path).copied()
    }

    pub fn files(&self) -> impl Iterator<Item = &'g Node> + '_ {
        self.file_by_path.values().copied()
    }

    /// All nodes extracted from the given file.
    pub fn in_file(&self, path: &str) -> &[&'g Node] {
        self.by_file.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Nodes of a given kind and name, anywhere in the graph.
    pub fn named<'s>(&'s self, kind: NodeKind, name: &'s str) -> &'s [&'g Node] {
        self.by_name
            .get(&(kind, name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First node of the given kind and name within one file, if any.
    pub fn named_in_file(&self, kind: NodeKind, name: &str, path: &str) -> Option<&'g Node> {
        self.named(kind, name)
            .iter()
            .find(|n| n.file_path() == path)
            .copied()
    }

    /// Find a file node whose path ends with the given suffix. Used by the
    /// include resolver when an exact match fails.
    pub fn file_by_suffix(&self, suffix: &str) -> Option<&'g Node> {
        self.file_by_path
            .iter()
            .find(|(path, _)| path.ends_with(suffix))
            .map(|(_, node)| *node)
    }
}
