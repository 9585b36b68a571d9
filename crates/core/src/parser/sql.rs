//! SQL parser: statement-level scanning.
//!
//! SQL in a source tree is almost always DDL plus a handful of DML blocks,
//! so extraction works on whole statements: `CREATE TABLE` yields a table
//! node with its columns, `CREATE VIEW` keeps the query text verbatim for
//! Pass 2, and DML statements become nodes whose kind encodes the verb.
//! Table/view references are resolved in Pass 2 from the stored text.

use regex::Regex;

use super::{FileContext, Language, LanguageParser, ParseError};
use crate::graph::{EntityId, FileParseResult, NodeKind, RelationshipType, Span};

pub struct SqlParser {
    create_table: Regex,
    create_view: Regex,
}

impl Default for SqlParser {
    fn default() -> Self {
        Self {
            create_table: Regex::new(
                r#"(?is)^\s*CREATE\s+(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?[`"\[]?([A-Za-z0-9_.]+)[`"\]]?\s*\((.*)\)[^)]*$"#,
            )
            .expect("static regex"),
            create_view: Regex::new(
                r#"(?is)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?VIEW\s+[`"\[]?([A-Za-z0-9_.]+)[`"\]]?\s+AS\s+(.*)$"#,
            )
            .expect("static regex"),
        }
    }
}

impl SqlParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageParser for SqlParser {
    fn language(&self) -> Language {
        Language::Sql
    }

    fn extensions(&self) -> &[&str] {
        &[".sql"]
    }

    fn parse_source(
        &self,
        source: &str,
        ctx: &FileContext,
    ) -> Result<FileParseResult, ParseError> {
        let mut out = FileParseResult::new(ctx.file_path());
        let file_node = ctx.file_node(source.lines().count() as u32);
        let file_id = file_node.entity_id().clone();
        out.push_node(file_node);

        for statement in split_statements(source) {
            let text = statement.text.trim();
            if text.is_empty() {
                continue;
            }

            if let Some(captures) = self.create_table.captures(text) {
                self.emit_table(ctx, &mut out, &file_id, &captures, statement.line);
            } else if let Some(captures) = self.create_view.captures(text) {
                let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                let query = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
                self.emit_view(ctx, &mut out, &file_id, name, query, statement.line, text);
            } else {
                let verb = text
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                let kind = match verb.as_str() {
                    "SELECT" => Some(NodeKind::SqlSelectStatement),
                    "INSERT" => Some(NodeKind::SqlInsertStatement),
                    "UPDATE" => Some(NodeKind::SqlUpdateStatement),
                    "DELETE" => Some(NodeKind::SqlDeleteStatement),
                    _ => None,
                };
                if let Some(kind) = kind {
                    self.emit_statement(ctx, &mut out, &file_id, kind, &verb, text, statement.line);
                }
            }
        }

        Ok(out)
    }
}

impl SqlParser {
    fn emit_table(
        &self,
        ctx: &FileContext,
        out: &mut FileParseResult,
        file_id: &EntityId,
        captures: &regex::Captures,
        line: u32,
    ) {
        let table_name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let columns_block = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        if table_name.is_empty() {
            return;
        }

        let qualified = format!("{}:{}", ctx.file_path(), table_name);
        let mut table = ctx.node(NodeKind::SqlTable, table_name, &qualified, Span::line(line));
        table.set_parent(file_id.clone());

        let table_id = out.push_node(table);
        out.push_relationship(ctx.relationship(
            RelationshipType::DefinesTable,
            file_id.clone(),
            table_id.clone(),
        ));

        for (name, column_type) in parse_columns(columns_block) {
            let column_qualified = format!("{}:{}.{}", ctx.file_path(), table_name, name);
            let mut column =
                ctx.node(NodeKind::SqlColumn, &name, &column_qualified, Span::line(line));
            column.set_parent(table_id.clone());
            if let Some(t) = column_type {
                column.set_prop("type", t);
            }
            let column_id = out.push_node(column);
            out.push_relationship(ctx.relationship(
                RelationshipType::HasColumn,
                table_id.clone(),
                column_id,
            ));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_view(
        &self,
        ctx: &FileContext,
        out: &mut FileParseResult,
        file_id: &EntityId,
        name: &str,
        query: &str,
        line: u32,
        full_text: &str,
    ) {
        if name.is_empty() {
            return;
        }
        let qualified = format!("{}:{}", ctx.file_path(), name);
        let mut view = ctx.node(NodeKind::SqlView, name, &qualified, Span::line(line));
        view.set_parent(file_id.clone());
        view.set_prop("queryText", query.trim());
        view.set_prop("text", full_text);

        let view_id = out.push_node(view);
        out.push_relationship(ctx.relationship(
            RelationshipType::DefinesView,
            file_id.clone(),
            view_id,
        ));
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_statement(
        &self,
        ctx: &FileContext,
        out: &mut FileParseResult,
        file_id: &EntityId,
        kind: NodeKind,
        verb: &str,
        text: &str,
        line: u32,
    ) {
        let qualified = format!("{}:{}:{}", ctx.file_path(), verb.to_ascii_lowercase(), line);
        let mut statement = ctx.node(kind, verb, &qualified, Span::line(line));
        statement.set_parent(file_id.clone());
        statement.set_prop("text", text);

        let statement_id = out.push_node(statement);
        out.push_relationship(ctx.relationship(
            RelationshipType::Contains,
            file_id.clone(),
            statement_id,
        ));
    }
}

struct Statement {
    text: String,
    /// 1-based line the statement starts on.
    line: u32,
}

/// Split on `;` outside string literals and comments, tracking start lines.
fn split_statements(source: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut line = 1u32;
    let mut start_line = 1u32;

    let mut chars = source.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            in_line_comment = false;
        }

        if in_line_comment {
            continue;
        }
        if in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block_comment = false;
            }
            continue;
        }
        if in_single {
            current.push(c);
            if c == '\'' {
                in_single = false;
            }
            continue;
        }
        if in_double {
            current.push(c);
            if c == '"' {
                in_double = false;
            }
            continue;
        }

        match c {
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                in_line_comment = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                in_block_comment = true;
            }
            '\'' => {
                in_single = true;
                current.push(c);
            }
            '"' => {
                in_double = true;
                current.push(c);
            }
            ';' => {
                statements.push(Statement {
                    text: std::mem::take(&mut current),
                    line: start_line,
                });
                start_line = line;
            }
            _ => {
                if current.trim().is_empty() && !c.is_whitespace() {
                    start_line = line;
                }
                current.push(c);
            }
        }
    }

    if !current.trim().is_empty() {
        statements.push(Statement {
            text: current,
            line: start_line,
        });
    }

    statements
}

/// Column `(name, type)` pairs from the body of a CREATE TABLE, skipping
/// table-level constraints.
fn parse_columns(block: &str) -> Vec<(String, Option<String>)> {
    const CONSTRAINT_KEYWORDS: &[&str] = &[
        "PRIMARY",
        "FOREIGN",
        "UNIQUE",
        "CONSTRAINT",
        "CHECK",
        "KEY",
        "INDEX",
    ];

    let mut columns = Vec::new();
    let mut depth = 0i32;
    let mut piece = String::new();
    let mut pieces = Vec::new();

    for c in block.chars() {
        match c {
            '(' => {
                depth += 1;
                piece.push(c);
            }
            ')' => {
                depth -= 1;
                piece.push(c);
            }
            ',' if depth == 0 => pieces.push(std::mem::take(&mut piece)),
            _ => piece.push(c),
        }
    }
    if !piece.trim().is_empty() {
        pieces.push(piece);
    }

    for piece in pieces {
        let mut tokens = piece.split_whitespace();
        let Some(first) = tokens.next() else { continue };
        let name = first.trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'));
        if name.is_empty()
            || CONSTRAINT_KEYWORDS
                .iter()
                .any(|kw| name.eq_ignore_ascii_case(kw))
        {
            continue;
        }
        let column_type = tokens.next().map(|t| t.to_string());
        columns.push((name.to_string(), column_type));
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_outside_strings() {
        let statements = split_statements("SELECT 'a;b' FROM t;\nINSERT INTO t VALUES (1);");
        assert_eq!(statements.len(), 2);
        assert!(statements[0].text.contains("'a;b'"));
        assert_eq!(statements[1].line, 2);
    }

    #[test]
    fn columns_skip_constraints() {
        let columns = parse_columns("id INTEGER PRIMARY KEY, name TEXT, PRIMARY KEY (id)");
        let names: Vec<_> = columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }
}
