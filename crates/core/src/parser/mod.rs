//! Pass 1: per-file extraction.
//!
//! One parser per language family turns a source file into a
//! [`FileParseResult`] of nodes and intra-file relationships, each tagged
//! with a deterministic entity id. The [`Dispatcher`] routes files by
//! extension, parallelizes everything except TypeScript/JavaScript (which
//! share one [`TsProject`] so Pass 2 can resolve symbols across files), and
//! turns individual parser failures into skipped files rather than aborting
//! the run.

pub mod c;
pub mod csharp;
pub mod go;
pub mod java;
pub mod python;
pub mod sql;
pub(crate) mod support;
pub mod typescript;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::config::AnalyzeOptions;
use crate::graph::{
    EntityId, FileParseResult, InstanceIds, Node, NodeKind, Relationship, RelationshipType, Span,
};
use support::normalize_path;
use typescript::{TsProject, TypeScriptParser};

/// Error types for parsing operations.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse file: {0}")]
    ParseFailed(String),

    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("subprocess error: {0}")]
    Subprocess(String),

    #[error("malformed parser output: {0}")]
    MalformedOutput(String),
}

/// Source languages the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    C,
    Cpp,
    Java,
    CSharp,
    Go,
    Sql,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Sql => "sql",
        }
    }

    /// Detect the language from an extension with a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".ts" | ".tsx" => Some(Language::TypeScript),
            ".js" | ".jsx" => Some(Language::JavaScript),
            ".py" => Some(Language::Python),
            ".c" | ".h" => Some(Language::C),
            ".cpp" | ".hpp" | ".cc" | ".hh" => Some(Language::Cpp),
            ".java" => Some(Language::Java),
            ".cs" => Some(Language::CSharp),
            ".go" => Some(Language::Go),
            ".sql" => Some(Language::Sql),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        Self::from_extension(&format!(".{ext}"))
    }

    /// TS/JS/TSX/JSX all live in the shared TypeScript project.
    pub fn is_ts_family(&self) -> bool {
        matches!(self, Language::TypeScript | Language::JavaScript)
    }
}

/// Per-file context threaded through a parser: normalized path, language,
/// and the run-wide instance id allocator and timestamp.
pub struct FileContext {
    file_path: String,
    language: Language,
    ids: Arc<InstanceIds>,
    timestamp: String,
}

impl FileContext {
    pub fn new(path: &Path, language: Language, ids: Arc<InstanceIds>, timestamp: String) -> Self {
        Self {
            file_path: normalize_path(path),
            language,
            ids,
            timestamp,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Build a node stamped with this run's instance id and timestamp.
    pub fn node(
        &self,
        kind: NodeKind,
        name: impl Into<String>,
        qualified_name: &str,
        span: Span,
    ) -> Node {
        let mut node = Node::new(
            kind,
            name,
            qualified_name,
            &self.file_path,
            self.language.as_str(),
            span,
        );
        node.set_instance_id(self.ids.next());
        node.set_created_at(&self.timestamp);
        node
    }

    /// Stamp a node that was built elsewhere (Python subprocess records).
    pub fn adopt(&self, node: &mut Node) {
        node.set_instance_id(self.ids.next());
        node.set_created_at(&self.timestamp);
    }

    pub fn relationship(
        &self,
        rel_type: RelationshipType,
        source: EntityId,
        target: EntityId,
    ) -> Relationship {
        let mut rel = Relationship::new(rel_type, source, target);
        rel.set_created_at(&self.timestamp);
        rel
    }

    pub fn relationship_at(
        &self,
        rel_type: RelationshipType,
        source: EntityId,
        target: EntityId,
        line: u32,
    ) -> Relationship {
        let mut rel = Relationship::at_line(rel_type, source, target, line);
        rel.set_created_at(&self.timestamp);
        rel
    }

    /// The `File` node for this context. Its qualified name is the
    /// normalized absolute path itself.
    pub fn file_node(&self, line_count: u32) -> Node {
        let name = self
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_path)
            .to_string();
        let qualified = self.file_path.clone();
        self.node(NodeKind::File, name, &qualified, Span::new(1, line_count.max(1), 0, 0))
    }
}

/// Trait for language-specific Pass 1 parsers.
pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// Extensions this parser handles (with leading dot).
    fn extensions(&self) -> &[&str];

    /// Parse source text into nodes and intra-file relationships.
    fn parse_source(&self, source: &str, ctx: &FileContext)
        -> Result<FileParseResult, ParseError>;

    /// Parse a file from disk. Parsers that shell out (Python) override this.
    fn parse_file(&self, path: &Path, ctx: &FileContext) -> Result<FileParseResult, ParseError> {
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&source, ctx)
    }
}

/// Result of dispatching a set of files through Pass 1.
pub struct ParseOutcome {
    pub results: Vec<FileParseResult>,
    pub failures: Vec<(PathBuf, ParseError)>,
    pub skipped: usize,
    /// The shared TypeScript project, kept alive for Pass 2 resolution.
    pub ts_project: TsProject,
}

/// Routes files to parsers by extension and runs Pass 1.
pub struct Dispatcher {
    parsers: Vec<Box<dyn LanguageParser>>,
    ts: TypeScriptParser,
    ids: Arc<InstanceIds>,
    timestamp: String,
}

impl Dispatcher {
    pub fn new(options: &AnalyzeOptions) -> Self {
        Self {
            parsers: vec![
                Box::new(c::CFamilyParser::new()),
                Box::new(csharp::CSharpParser::new()),
                Box::new(go::GoParser::new()),
                Box::new(java::JavaParser::new()),
                Box::new(python::PythonParser::new(options.temp_dir.clone())),
                Box::new(sql::SqlParser::new()),
            ],
            ts: TypeScriptParser::new(),
            ids: Arc::new(InstanceIds::new()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Find a parser for the given file path based on extension. TS/JS files
    /// are not served here; they go through the shared project.
    pub fn find_parser(&self, path: &Path) -> Option<&dyn LanguageParser> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        let with_dot = format!(".{ext}");
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&with_dot.as_str()))
            .map(|boxed| &**boxed)
    }

    fn context_for(&self, path: &Path, language: Language) -> FileContext {
        FileContext::new(path, language, Arc::clone(&self.ids), self.timestamp.clone())
    }

    /// Run Pass 1 over all files: everything except TS/JS parses in parallel;
    /// TS/JS is hydrated into one shared project first, then extracted
    /// serially. Parser failures drop the file, not the run.
    pub fn parse_all(&self, files: &[PathBuf]) -> ParseOutcome {
        let mut ts_files: Vec<&PathBuf> = Vec::new();
        let mut other_files: Vec<(&PathBuf, Language)> = Vec::new();
        let mut skipped = 0usize;

        for file in files {
            match Language::from_path(file) {
                Some(lang) if lang.is_ts_family() => ts_files.push(file),
                Some(lang) => other_files.push((file, lang)),
                None => {
                    skipped += 1;
                    tracing::warn!(file = %file.display(), "no parser for extension, skipping");
                }
            }
        }

        // Parallel phase: every non-TS file parses independently.
        let parsed: Vec<Result<FileParseResult, (PathBuf, ParseError)>> = other_files
            .par_iter()
            .map(|(file, lang)| {
                let ctx = self.context_for(file, *lang);
                match self.find_parser(file) {
                    Some(parser) => parser
                        .parse_file(file, &ctx)
                        .map_err(|e| ((*file).clone(), e)),
                    None => Err((
                        (*file).clone(),
                        ParseError::UnsupportedExtension(
                            file.extension()
                                .and_then(|e| e.to_str())
                                .unwrap_or("unknown")
                                .to_string(),
                        ),
                    )),
                }
            })
            .collect();

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for item in parsed {
            match item {
                Ok(result) => results.push(result),
                Err((file, err)) => {
                    tracing::warn!(file = %file.display(), error = %err, "parser failed, file dropped");
                    failures.push((file, err));
                }
            }
        }

        // Serial phase: hydrate the shared TS project, then extract per file.
        let mut ts_project = TsProject::new();
        for file in &ts_files {
            if let Err(err) = ts_project.add_file(file) {
                tracing::warn!(file = %file.display(), error = %err, "failed to load into TS project");
                failures.push(((*file).clone(), err));
            }
        }
        for file in &ts_files {
            let normalized = normalize_path(file);
            if !ts_project.contains(&normalized) {
                continue;
            }
            let language = Language::from_path(file).unwrap_or(Language::TypeScript);
            let ctx = self.context_for(file, language);
            match self.ts.extract_file(&ts_project, &ctx) {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "TS extraction failed, file dropped");
                    failures.push(((*file).clone(), err));
                }
            }
        }

        ParseOutcome {
            results,
            failures,
            skipped,
            ts_project,
        }
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self
            .parsers
            .iter()
            .flat_map(|p| p.extensions().iter().copied())
            .collect();
        extensions.extend([".ts", ".tsx", ".js", ".jsx"]);
        extensions
    }
}
