//! Analyze options: built-in defaults, `.carto.toml` loading, and environment
//! overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AnalyzeError;

/// Extensions routed to a parser when no override is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".py", ".c", ".h", ".cpp", ".hpp", ".cc", ".hh", ".java", ".cs",
    ".go", ".sql",
];

/// Globs excluded from every scan, before user-supplied patterns.
pub const DEFAULT_IGNORE_GLOBS: &[&str] = &[
    "**/.idea/**",
    "**/node_modules/**",
    "**/.git/**",
    "**/dist/**",
    "**/build/**",
    "**/coverage/**",
    "**/.next/**",
    "**/.svelte-kit/**",
    "**/.venv/**",
    "**/venv/**",
    "**/env/**",
    "**/__pycache__/**",
    "**/*.pyc",
    "**/bin/**",
    "**/obj/**",
    "**/*.class",
    "**/target/**",
    "**/*.log",
    "**/*.lock",
    "**/*.test.*",
    "**/*.spec.*",
    "**/playwright-report/**",
    "**/public/**",
    ".DS_Store",
];

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Options for one analyze invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Extensions to analyze (with leading dot). Overrides the defaults.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Extra ignore globs, appended to the built-in list.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Re-apply the store schema before writing.
    #[serde(default)]
    pub update_schema: bool,

    /// Delete all nodes and relationships before writing.
    #[serde(default)]
    pub reset_db: bool,

    /// Path of the embedded graph store. `None` keeps the graph in memory for
    /// the duration of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Upsert batch size for nodes and for each relationship group.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Directory for scoped temporary files (Python subprocess protocol).
    /// Defaults to the OS temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore: Vec::new(),
            update_schema: false,
            reset_db: false,
            store_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            temp_dir: None,
        }
    }
}

impl AnalyzeOptions {
    pub fn from_file(path: &Path) -> Result<Self, AnalyzeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AnalyzeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut options: AnalyzeOptions = toml::from_str(&contents)
            .map_err(|e| AnalyzeError::Config(format!("{}: {e}", path.display())))?;
        options.normalize();
        Ok(options)
    }

    /// Find and load `.carto.toml` from `start_dir` or its ancestors, falling
    /// back to defaults, then apply environment overrides.
    pub fn find_and_load(start_dir: &Path) -> Result<Self, AnalyzeError> {
        let mut current = start_dir;
        let mut options = loop {
            let candidate = current.join(".carto.toml");
            if candidate.exists() {
                break Self::from_file(&candidate)?;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break Self::default(),
            }
        };
        options.apply_env();
        Ok(options)
    }

    /// Environment overrides: `STORAGE_BATCH_SIZE` (invalid values fall back
    /// to the default with a warning), `CARTO_DB_PATH`, `TEMP_DIR`.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var("STORAGE_BATCH_SIZE") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.batch_size = n,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "invalid STORAGE_BATCH_SIZE, using default of {DEFAULT_BATCH_SIZE}"
                    );
                    self.batch_size = DEFAULT_BATCH_SIZE;
                }
            }
        }
        if let Ok(path) = std::env::var("CARTO_DB_PATH") {
            if !path.is_empty() {
                self.store_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var("TEMP_DIR") {
            if !dir.is_empty() {
                self.temp_dir = Some(PathBuf::from(dir));
            }
        }
    }

    /// Replace the extension list from a comma-separated CLI value
    /// (`ts,.tsx,js` and `.ts,.tsx` are both accepted).
    pub fn set_extensions_from_list(&mut self, list: &str) {
        self.extensions = list
            .split(',')
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                if raw.starts_with('.') {
                    raw.to_string()
                } else {
                    format!(".{raw}")
                }
            })
            .collect();
    }

    fn normalize(&mut self) {
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        for ext in &mut self.extensions {
            if !ext.starts_with('.') {
                *ext = format!(".{ext}");
            }
        }
    }

    /// Built-in ignore globs followed by the user-supplied ones.
    pub fn ignore_globs(&self) -> Vec<String> {
        DEFAULT_IGNORE_GLOBS
            .iter()
            .map(|s| s.to_string())
            .chain(self.ignore.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_list_gets_dots() {
        let mut options = AnalyzeOptions::default();
        options.set_extensions_from_list("ts,.tsx, py");
        assert_eq!(options.extensions, vec![".ts", ".tsx", ".py"]);
    }

    #[test]
    fn defaults_cover_all_supported_languages() {
        let options = AnalyzeOptions::default();
        for ext in [".ts", ".py", ".cpp", ".java", ".cs", ".go", ".sql"] {
            assert!(options.extensions.iter().any(|e| e == ext), "missing {ext}");
        }
    }
}
