//! Small helpers shared by the tree-sitter parsers.

use std::path::Path;

use crate::graph::Span;

/// Text of a syntax node, or the empty string when the range is not valid
/// UTF-8 (tree-sitter guarantees byte ranges inside the source).
pub(crate) fn node_text<'s>(node: &tree_sitter::Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Text of a named field child, if present.
pub(crate) fn field_text(node: &tree_sitter::Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(source.as_bytes())
        .ok()
        .map(|s| s.to_string())
}

/// Location of a syntax node. Tree-sitter rows are 0-based; lines in the
/// graph are 1-based, columns stay 0-based.
pub(crate) fn span_of(node: &tree_sitter::Node) -> Span {
    Span::new(
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
        node.start_position().column as u32,
        node.end_position().column as u32,
    )
}

/// Absolute, forward-slash-normalized path string. All entity ids derived
/// from paths go through this so the two passes agree byte-for-byte.
pub(crate) fn normalize_path(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute.to_string_lossy().replace('\\', "/")
}

/// Strip matching string delimiters from a literal.
pub(crate) fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches(|c| c == '\'' || c == '"' || c == '`')
}

/// React component naming convention: leading uppercase letter.
pub(crate) fn is_pascal_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_detection() {
        assert!(is_pascal_case("Button"));
        assert!(!is_pascal_case("button"));
        assert!(!is_pascal_case(""));
    }

    #[test]
    fn quote_stripping() {
        assert_eq!(strip_quotes("'./mod'"), "./mod");
        assert_eq!(strip_quotes("\"x\""), "x");
    }
}
