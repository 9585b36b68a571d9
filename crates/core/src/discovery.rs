//! Source file discovery with gitignore-aware filtering.
//!
//! Uses the `ignore` crate (from ripgrep) to respect `.gitignore`,
//! `.ignore`, and `.git/info/exclude`, on top of the analyzer's built-in
//! ignore globs and any user-supplied patterns.

use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::error::AnalyzeError;

/// Discover files under `root` matching any of `extensions`, skipping paths
/// that match any of `ignore_globs`.
///
/// Returns absolute paths sorted alphabetically. A failure to access `root`
/// is fatal; individual unreadable entries are skipped.
pub fn discover_files(
    root: &Path,
    extensions: &[String],
    ignore_globs: &[String],
) -> Result<Vec<PathBuf>, AnalyzeError> {
    let root = root.canonicalize().map_err(|source| AnalyzeError::FileSystem {
        path: root.to_path_buf(),
        source,
    })?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    // The `ignore` crate uses gitignore syntax for overrides: a `!` prefix
    // turns a pattern into an exclusion.
    if !ignore_globs.is_empty() {
        let mut overrides = OverrideBuilder::new(&root);
        for pattern in ignore_globs {
            let glob = if pattern.ends_with('/') {
                format!("!{pattern}**")
            } else {
                format!("!{pattern}")
            };
            overrides
                .add(&glob)
                .map_err(|e| AnalyzeError::Config(format!("bad ignore glob {pattern:?}: {e}")))?;
        }
        let built = overrides
            .build()
            .map_err(|e| AnalyzeError::Config(format!("ignore globs: {e}")))?;
        builder.overrides(built);
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!(%err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.into_path();
        if has_supported_extension(&path, extensions) {
            if path.is_absolute() {
                files.push(path);
            } else {
                files.push(root.join(path));
            }
        }
    }

    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    let with_dot = format!(".{ext}");
    extensions.iter().any(|e| e == &with_dot)
}
