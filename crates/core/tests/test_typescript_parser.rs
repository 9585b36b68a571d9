//! Pass 1 extraction tests for the TypeScript/JavaScript parser.

use std::path::Path;
use std::sync::Arc;

use carto_core::graph::{FileParseResult, InstanceIds, NodeKind, RelationshipType};
use carto_core::parser::typescript::TypeScriptParser;
use carto_core::parser::{FileContext, Language};

fn parse(source: &str) -> FileParseResult {
    parse_at("/src/app.ts", source, false)
}

fn parse_at(path: &str, source: &str, tsx: bool) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new(path),
        Language::TypeScript,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    TypeScriptParser::new()
        .parse_standalone(source, &ctx, tsx)
        .expect("parse should succeed")
}

fn nodes_of(result: &FileParseResult, kind: NodeKind) -> Vec<&carto_core::Node> {
    result.nodes.iter().filter(|n| n.kind() == kind).collect()
}

fn edges_of(
    result: &FileParseResult,
    rel_type: RelationshipType,
) -> Vec<&carto_core::Relationship> {
    result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == rel_type)
        .collect()
}

#[test]
fn file_node_is_always_emitted() {
    let result = parse("// just a comment\n");
    let files = nodes_of(&result, NodeKind::File);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name(), "app.ts");
    assert_eq!(files[0].file_path(), "/src/app.ts");
}

#[test]
fn function_declaration_with_parameters() {
    let result = parse("export function add(a: number, b: number): number { return a + b; }\n");

    let functions = nodes_of(&result, NodeKind::Function);
    assert_eq!(functions.len(), 1);
    let add = functions[0];
    assert_eq!(add.name(), "add");
    assert!(add.bool_prop("isExported"));
    assert_eq!(add.str_prop("returnType"), Some("number"));

    let params = nodes_of(&result, NodeKind::Parameter);
    let names: Vec<_> = params.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    for param in &params {
        assert_eq!(param.parent_id(), Some(add.entity_id()));
    }
    assert_eq!(edges_of(&result, RelationshipType::HasParameter).len(), 2);
}

#[test]
fn arrow_function_bound_to_const_is_a_function() {
    let result = parse("const greet = (name: string) => console.log(name);\n");
    let functions = nodes_of(&result, NodeKind::Function);
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name(), "greet");
    // The binding is consumed by the function, not duplicated as a variable
    assert!(nodes_of(&result, NodeKind::Variable).is_empty());
}

#[test]
fn plain_variable_records_constness() {
    let result = parse("const LIMIT: number = 10;\nlet current = 0;\n");
    let variables = nodes_of(&result, NodeKind::Variable);
    assert_eq!(variables.len(), 2);

    let limit = variables.iter().find(|v| v.name() == "LIMIT").unwrap();
    assert!(limit.bool_prop("isConstant"));
    assert_eq!(limit.str_prop("type"), Some("number"));

    let current = variables.iter().find(|v| v.name() == "current").unwrap();
    assert!(!current.bool_prop("isConstant"));
}

#[test]
fn import_node_carries_clause_details() {
    let result = parse(
        "import Default, { a, b } from './mod';\nimport * as ns from './other';\nimport './side-effect';\n",
    );

    let imports = nodes_of(&result, NodeKind::Import);
    assert_eq!(imports.len(), 3);

    let first = imports.iter().find(|i| i.name() == "./mod").unwrap();
    assert_eq!(first.str_prop("moduleSpecifier"), Some("./mod"));
    assert_eq!(first.str_prop("defaultImport"), Some("Default"));
    let named = first.prop("namedImports").and_then(|v| v.as_array()).unwrap();
    assert_eq!(named.len(), 2);

    let ns = imports.iter().find(|i| i.name() == "./other").unwrap();
    assert_eq!(ns.str_prop("namespaceImport"), Some("ns"));

    // One File —IMPORTS→ Import edge per import declaration
    assert_eq!(edges_of(&result, RelationshipType::Imports).len(), 3);
}

#[test]
fn class_methods_and_visibility() {
    let result = parse(
        r#"
export class Service {
    public async fetch(url: string): Promise<string> {
        return url;
    }

    static create(): Service {
        return new Service();
    }
}
"#,
    );

    let classes = nodes_of(&result, NodeKind::Class);
    assert_eq!(classes.len(), 1);
    let class_id = classes[0].entity_id();

    let methods = nodes_of(&result, NodeKind::Method);
    assert_eq!(methods.len(), 2);

    let fetch = methods.iter().find(|m| m.name() == "fetch").unwrap();
    assert_eq!(fetch.str_prop("visibility"), Some("public"));
    assert!(fetch.bool_prop("isAsync"));
    assert_eq!(fetch.parent_id(), Some(class_id));

    let create = methods.iter().find(|m| m.name() == "create").unwrap();
    assert!(create.bool_prop("isStatic"));

    let has_method = edges_of(&result, RelationshipType::HasMethod);
    assert_eq!(has_method.len(), 2);
    for edge in has_method {
        assert_eq!(edge.source_id(), class_id);
    }
}

#[test]
fn interface_signatures_are_methods() {
    let result = parse(
        "export interface Repo {\n    find(id: string): Promise<string>;\n    count: number;\n}\n",
    );

    let interfaces = nodes_of(&result, NodeKind::Interface);
    assert_eq!(interfaces.len(), 1);

    let methods = nodes_of(&result, NodeKind::Method);
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name(), "find");
    assert!(methods[0].bool_prop("isSignature"));
}

#[test]
fn type_alias_and_enum() {
    let result = parse("type Id = string;\nenum Color { Red, Green }\n");
    let aliases = nodes_of(&result, NodeKind::TypeAlias);
    assert_eq!(aliases.len(), 2);

    let color = aliases.iter().find(|a| a.name() == "Color").unwrap();
    assert!(color.bool_prop("isEnum"));
    let id = aliases.iter().find(|a| a.name() == "Id").unwrap();
    assert!(!id.bool_prop("isEnum"));
}

#[test]
fn cyclomatic_complexity_counts_decision_points() {
    let result = parse(
        r#"
function busy(x: number): number {
    if (x > 0) {
        for (let i = 0; i < x; i++) {
            x += i;
        }
    }
    return x > 10 && x < 100 ? x : 0;
}
"#,
    );

    let busy = nodes_of(&result, NodeKind::Function)
        .into_iter()
        .find(|f| f.name() == "busy")
        .unwrap();
    // 1 + if + for + ternary + &&
    assert_eq!(busy.prop("complexity").and_then(|v| v.as_u64()), Some(5));
}

#[test]
fn anonymous_callback_gets_synthetic_name() {
    let result = parse("const xs = [1, 2];\nxs.forEach(function (x) { console.log(x); });\n");
    let functions = nodes_of(&result, NodeKind::Function);
    assert!(
        functions
            .iter()
            .any(|f| f.name().starts_with("callback_") && f.name().ends_with("_arg0")),
        "expected a callback_<caller>_arg0 function, got {:?}",
        functions.iter().map(|f| f.name()).collect::<Vec<_>>()
    );
}

#[test]
fn entity_ids_are_stable_across_parses() {
    let source = "export function one() {}\nexport class Two {}\nconst three = 3;\n";
    let first = parse(source);
    let second = parse(source);

    let mut first_ids: Vec<_> = first.nodes.iter().map(|n| n.entity_id().clone()).collect();
    let mut second_ids: Vec<_> = second.nodes.iter().map(|n| n.entity_id().clone()).collect();
    first_ids.sort();
    second_ids.sort();
    assert_eq!(first_ids, second_ids);

    let mut first_edges: Vec<_> = first
        .relationships
        .iter()
        .map(|r| r.entity_id().clone())
        .collect();
    let mut second_edges: Vec<_> = second
        .relationships
        .iter()
        .map(|r| r.entity_id().clone())
        .collect();
    first_edges.sort();
    second_edges.sort();
    assert_eq!(first_edges, second_edges);
}

#[test]
fn same_name_functions_disambiguated_by_line() {
    let result = parse_at(
        "/src/overloads.ts",
        "function handler() {}\nfunction wrap() {\n    function handler() {}\n}\n",
        false,
    );
    let handlers: Vec<_> = result
        .nodes
        .iter()
        .filter(|n| n.kind() == NodeKind::Function && n.name() == "handler")
        .collect();
    assert_eq!(handlers.len(), 2);
    assert_ne!(handlers[0].entity_id(), handlers[1].entity_id());
}
