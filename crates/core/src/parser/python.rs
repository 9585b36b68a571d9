//! Python parser: a per-file subprocess over the standard library `ast`.
//!
//! The embedded script is materialized into a scoped temporary directory on
//! first use and removed with it when the parser is dropped. The subprocess
//! emits one JSON document per file; this wrapper validates the shape,
//! derives entity ids from the script's `(kind, qualifiedName)` pairs, and
//! stamps instance ids and timestamps. Rayon bounds how many interpreter
//! processes run at once.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::TempDir;

use super::support::normalize_path;
use super::{FileContext, Language, LanguageParser, ParseError};
use crate::graph::{
    EntityId, FileParseResult, Node, NodeKind, Relationship, RelationshipType, Span,
};

const AST_EXTRACT_PY: &str = include_str!("python/ast_extract.py");

pub struct PythonParser {
    temp_override: Option<PathBuf>,
    script: OnceLock<Result<(TempDir, PathBuf), String>>,
}

impl PythonParser {
    pub fn new(temp_override: Option<PathBuf>) -> Self {
        Self {
            temp_override,
            script: OnceLock::new(),
        }
    }

    fn script_path(&self) -> Result<&Path, ParseError> {
        let entry = self.script.get_or_init(|| {
            let mut builder = tempfile::Builder::new();
            builder.prefix("carto-python-");
            let dir = match &self.temp_override {
                Some(base) => {
                    std::fs::create_dir_all(base).map_err(|e| e.to_string())?;
                    builder.tempdir_in(base)
                }
                None => builder.tempdir(),
            }
            .map_err(|e| e.to_string())?;

            let path = dir.path().join("ast_extract.py");
            std::fs::write(&path, AST_EXTRACT_PY).map_err(|e| e.to_string())?;
            Ok((dir, path))
        });

        match entry {
            Ok((_, path)) => Ok(path),
            Err(message) => Err(ParseError::Subprocess(message.clone())),
        }
    }
}

fn python_binary() -> String {
    std::env::var("CARTO_PYTHON").unwrap_or_else(|_| "python3".to_string())
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &[&str] {
        &[".py"]
    }

    fn parse_file(&self, path: &Path, ctx: &FileContext) -> Result<FileParseResult, ParseError> {
        let script = self.script_path()?;
        let file_arg = normalize_path(path);

        let output = Command::new(python_binary())
            .arg(script)
            .arg(&file_arg)
            .output()
            .map_err(|e| ParseError::Subprocess(format!("failed to spawn python3: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let message = match serde_json::from_str::<PyError>(stderr.trim()) {
                Ok(err) => err.error,
                Err(_) => format!("exit status {}: {}", output.status, stderr.trim()),
            };
            return Err(ParseError::Subprocess(message));
        }
        if let Ok(err) = serde_json::from_str::<PyError>(stderr.trim()) {
            return Err(ParseError::Subprocess(err.error));
        }

        let document: PyDocument = serde_json::from_slice(&output.stdout)
            .map_err(|e| ParseError::MalformedOutput(format!("python output: {e}")))?;
        if document.file_path.is_empty() {
            return Err(ParseError::MalformedOutput(
                "python output missing filePath".to_string(),
            ));
        }

        Ok(self.materialize(document, ctx))
    }

    fn parse_source(
        &self,
        source: &str,
        ctx: &FileContext,
    ) -> Result<FileParseResult, ParseError> {
        // Write the snippet next to the script and parse it from there; ids
        // still derive from the context's file path because the script
        // receives that path as its argument.
        let script_dir = self.script_path()?.parent().map(Path::to_path_buf);
        let dir = script_dir.ok_or_else(|| {
            ParseError::Subprocess("python script directory unavailable".to_string())
        })?;
        let staged = dir.join("snippet.py");
        std::fs::write(&staged, source)?;

        let script = self.script_path()?;
        let output = Command::new(python_binary())
            .arg(script)
            .arg(&staged)
            .output()
            .map_err(|e| ParseError::Subprocess(format!("failed to spawn python3: {e}")))?;
        let _ = std::fs::remove_file(&staged);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::Subprocess(stderr.trim().to_string()));
        }

        let mut document: PyDocument = serde_json::from_slice(&output.stdout)
            .map_err(|e| ParseError::MalformedOutput(format!("python output: {e}")))?;

        // Rebase every qualified name from the staged path onto the
        // context's path so ids match the rest of the run.
        let staged_norm = normalize_path(&staged);
        document.rebase(&staged_norm, ctx.file_path());

        Ok(self.materialize(document, ctx))
    }
}

impl PythonParser {
    fn materialize(&self, document: PyDocument, ctx: &FileContext) -> FileParseResult {
        let mut out = FileParseResult::new(ctx.file_path());

        // Script-side qualified names → final entity ids, so relationship
        // refs land on the node ids actually emitted (parameters get their
        // qualified name rebuilt from the parent's entity id).
        let mut id_map: std::collections::HashMap<(String, String), EntityId> =
            std::collections::HashMap::new();

        for record in document.nodes {
            let Some(kind) = NodeKind::from_label(&record.kind) else {
                tracing::warn!(kind = %record.kind, "unknown node kind from python, skipping");
                continue;
            };

            let parent_id = record.parent.as_ref().and_then(PyRef::entity_id);
            let qualified = if record.parent_qualifies {
                match &parent_id {
                    Some(parent) => format!("{parent}:{}", record.name),
                    None => record.qualified_name.clone(),
                }
            } else {
                record.qualified_name.clone()
            };

            let span = Span::new(
                record.start_line.max(1),
                record.end_line.max(record.start_line.max(1)),
                record.start_column,
                record.end_column,
            );
            let mut node = Node::new(
                kind,
                record.name,
                &qualified,
                ctx.file_path(),
                Language::Python.as_str(),
                span,
            );
            if let Some(parent) = parent_id {
                node.set_parent(parent);
            }
            for (key, value) in record.properties {
                node.set_prop(&key, value);
            }
            ctx.adopt(&mut node);
            id_map.insert(
                (record.kind, record.qualified_name),
                node.entity_id().clone(),
            );
            out.push_node(node);
        }

        let resolve_ref = |r: &PyRef| -> Option<EntityId> {
            id_map
                .get(&(r.kind.clone(), r.qualified_name.clone()))
                .cloned()
                .or_else(|| r.entity_id())
        };

        for record in document.relationships {
            let Some(rel_type) = RelationshipType::from_str_tag(&record.rel_type) else {
                tracing::warn!(rel = %record.rel_type, "unknown relationship type from python, skipping");
                continue;
            };
            let (Some(source), Some(target)) =
                (resolve_ref(&record.source), resolve_ref(&record.target))
            else {
                continue;
            };

            let mut rel = match record.line {
                Some(line) => Relationship::at_line(rel_type, source, target, line),
                None => Relationship::new(rel_type, source, target),
            };
            for (key, value) in record.properties {
                rel.set_prop(&key, value);
            }
            rel.set_created_at(ctx.timestamp());
            out.push_relationship(rel);
        }

        out
    }
}

#[derive(Deserialize)]
struct PyError {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PyDocument {
    file_path: String,
    nodes: Vec<PyNode>,
    relationships: Vec<PyRelationship>,
}

impl PyDocument {
    fn rebase(&mut self, from: &str, to: &str) {
        self.file_path = self.file_path.replace(from, to);
        for node in &mut self.nodes {
            node.qualified_name = node.qualified_name.replace(from, to);
            if let Some(parent) = &mut node.parent {
                parent.qualified_name = parent.qualified_name.replace(from, to);
            }
        }
        for rel in &mut self.relationships {
            rel.source.qualified_name = rel.source.qualified_name.replace(from, to);
            rel.target.qualified_name = rel.target.qualified_name.replace(from, to);
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PyNode {
    kind: String,
    name: String,
    qualified_name: String,
    #[serde(default)]
    parent: Option<PyRef>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    start_line: u32,
    #[serde(default)]
    end_line: u32,
    #[serde(default)]
    start_column: u32,
    #[serde(default)]
    end_column: u32,
    #[serde(default)]
    parent_qualifies: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PyRef {
    kind: String,
    qualified_name: String,
}

impl PyRef {
    fn entity_id(&self) -> Option<EntityId> {
        let kind = NodeKind::from_label(&self.kind)?;
        Some(EntityId::new(kind.label(), &self.qualified_name))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PyRelationship {
    #[serde(rename = "type")]
    rel_type: String,
    source: PyRef,
    target: PyRef,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    properties: Map<String, Value>,
}
