//! Carto Core - Code Knowledge Graph Engine
//!
//! This crate turns a multi-language source tree into a typed node/edge
//! graph keyed by deterministic entity ids:
//! - Pass 1: per-file extraction via tree-sitter (plus a Python subprocess)
//! - Pass 2: cross-file resolution of imports, calls, inheritance, JSX
//!   composition and SQL references over an in-memory index
//! - Deduplicated, batched, idempotent persistence into a graph store

pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod store;

pub use config::{AnalyzeOptions, DEFAULT_EXTENSIONS, DEFAULT_IGNORE_GLOBS};
pub use discovery::discover_files;
pub use error::{AnalyzeError, StoreError};
pub use graph::{
    EntityId, FileParseResult, MergedGraph, Node, NodeIndex, NodeKind, Relationship,
    RelationshipType, Span,
};
pub use parser::{Dispatcher, Language, LanguageParser, ParseError};
pub use pipeline::{analyze, analyze_with_store, AnalyzeReport};
pub use store::{GraphStore, MemoryStore, StorageWriter};

#[cfg(feature = "cozo-store")]
pub use store::CozoStore;

/// Carto version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
