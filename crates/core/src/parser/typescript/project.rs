//! The shared TypeScript/JavaScript project.
//!
//! All TS/JS files of a run are parsed into one project so that Pass 2 can
//! resolve module specifiers and exported symbols across files. Pass 1 only
//! reads its own file's tree; the project outlives Pass 1 and is handed to
//! the resolver.

use std::collections::BTreeMap;
use std::path::Path;

use crate::parser::support::normalize_path;
use crate::parser::ParseError;

/// One parsed source file inside the project.
pub struct TsFile {
    pub source: String,
    pub tree: tree_sitter::Tree,
    /// Parsed with the TSX grammar (`.tsx` / `.jsx`).
    pub tsx: bool,
}

/// All TS/JS sources of a run, keyed by normalized absolute path.
pub struct TsProject {
    files: BTreeMap<String, TsFile>,
    ts_language: tree_sitter::Language,
    tsx_language: tree_sitter::Language,
}

impl Default for TsProject {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            ts_language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx_language: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl TsProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a file into the project.
    pub fn add_file(&mut self, path: &Path) -> Result<(), ParseError> {
        let source = std::fs::read_to_string(path)?;
        let tsx = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "tsx" | "jsx"))
            .unwrap_or(false);
        self.add_source(normalize_path(path), source, tsx)
    }

    /// Parse source text into the project under the given normalized path.
    pub fn add_source(&mut self, path: String, source: String, tsx: bool) -> Result<(), ParseError> {
        let mut parser = tree_sitter::Parser::new();
        let language = if tsx {
            &self.tsx_language
        } else {
            &self.ts_language
        };
        parser
            .set_language(language)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        let tree = parser.parse(&source, None).ok_or_else(|| {
            ParseError::ParseFailed(format!("failed to parse TypeScript source {path}"))
        })?;
        self.files.insert(path, TsFile { source, tree, tsx });
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&TsFile> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &TsFile)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Resolve a module specifier relative to the importing file.
    ///
    /// Only relative specifiers resolve inside the project; bare specifiers
    /// are external modules and return `None`. Tries the specifier verbatim,
    /// then with each TS/JS extension, then as a directory with an index
    /// file.
    pub fn resolve_specifier(&self, specifier: &str, importing_file: &str) -> Option<String> {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return None;
        }

        let dir = match importing_file.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };
        let base = lexical_join(dir, specifier);

        if self.files.contains_key(&base) {
            return Some(base);
        }
        for ext in ["ts", "tsx", "js", "jsx"] {
            let candidate = format!("{base}.{ext}");
            if self.files.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        for index in ["index.ts", "index.tsx", "index.js", "index.jsx"] {
            let candidate = format!("{base}/{index}");
            if self.files.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Join a relative specifier onto a directory, resolving `.` and `..`
/// lexically so the result matches the project's normalized keys.
fn lexical_join(dir: &str, specifier: &str) -> String {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    let absolute = dir.starts_with('/');

    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_join_resolves_dots() {
        assert_eq!(lexical_join("/src/app", "./util"), "/src/app/util");
        assert_eq!(lexical_join("/src/app", "../lib/x"), "/src/lib/x");
    }

    #[test]
    fn resolve_specifier_tries_extensions() {
        let mut project = TsProject::new();
        project
            .add_source("/src/b.ts".into(), "export function b() {}".into(), false)
            .unwrap();
        assert_eq!(
            project.resolve_specifier("./b", "/src/a.ts"),
            Some("/src/b.ts".to_string())
        );
        assert_eq!(project.resolve_specifier("react", "/src/a.ts"), None);
    }
}
