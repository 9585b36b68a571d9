//! The analyze pipeline: scan → Pass 1 (parallel) → merge (serial) →
//! Pass 2 (serial) → write (serial, batched).
//!
//! A single file failing to parse drops that file; scan, configuration and
//! store failures abort the run.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::AnalyzeOptions;
use crate::discovery::discover_files;
use crate::error::AnalyzeError;
use crate::graph::MergedGraph;
use crate::parser::Dispatcher;
use crate::resolver;
use crate::store::{GraphStore, MemoryStore, StorageWriter};

/// Summary of one analyze invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeReport {
    pub files_discovered: usize,
    pub files_parsed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub node_count: usize,
    pub relationship_count: usize,
    pub nodes_written: usize,
    pub relationships_written: usize,
    pub duration: Duration,
}

/// Analyze a directory with a store derived from the options: the embedded
/// database when `store_path` is set, an in-memory sink otherwise.
pub fn analyze(root: &Path, options: &AnalyzeOptions) -> Result<AnalyzeReport, AnalyzeError> {
    #[cfg(feature = "cozo-store")]
    if let Some(path) = &options.store_path {
        let store = crate::store::CozoStore::new_sqlite(path)?;
        return analyze_with_store(root, options, &store);
    }

    #[cfg(not(feature = "cozo-store"))]
    if options.store_path.is_some() {
        return Err(AnalyzeError::Config(
            "store_path requires the cozo-store feature".to_string(),
        ));
    }

    let store = MemoryStore::new();
    analyze_with_store(root, options, &store)
}

/// Analyze a directory and persist into the given store.
pub fn analyze_with_store(
    root: &Path,
    options: &AnalyzeOptions,
    store: &dyn GraphStore,
) -> Result<AnalyzeReport, AnalyzeError> {
    let started = Instant::now();

    let files = discover_files(root, &options.extensions, &options.ignore_globs())?;
    tracing::info!(root = %root.display(), files = files.len(), "scan complete");

    // Pass 1
    let dispatcher = Dispatcher::new(options);
    let outcome = dispatcher.parse_all(&files);
    let files_parsed = outcome.results.len();
    let files_failed = outcome.failures.len();

    // Merge and index
    let mut merged = MergedGraph::new();
    for result in outcome.results {
        merged.absorb(result);
    }
    let (intra_duplicates, cross_duplicates) = merged.duplicate_counts();
    tracing::info!(
        nodes = merged.node_count(),
        relationships = merged.relationship_count(),
        intra_duplicates,
        cross_duplicates,
        "pass 1 merged"
    );

    // Pass 2: resolvers read the frozen index and return a patch.
    let patch = {
        let index = merged.index();
        resolver::resolve_all(&index, &outcome.ts_project)
    };
    merged.apply(patch);
    merged.reconcile_placeholders();
    tracing::info!(
        relationships = merged.relationship_count(),
        "pass 2 resolution complete"
    );

    // Write phase
    if options.update_schema {
        store.ensure_schema()?;
    }
    if options.reset_db {
        store.reset()?;
    }
    let stats = StorageWriter::new(store, options.batch_size).write(&merged)?;

    Ok(AnalyzeReport {
        files_discovered: files.len(),
        files_parsed,
        files_failed,
        files_skipped: outcome.skipped,
        node_count: merged.node_count(),
        relationship_count: merged.relationship_count(),
        nodes_written: stats.nodes,
        relationships_written: stats.relationships,
        duration: started.elapsed(),
    })
}
