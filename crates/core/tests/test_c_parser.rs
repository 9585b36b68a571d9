//! C/C++ extraction and include resolution tests.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use carto_core::graph::{FileParseResult, InstanceIds, NodeKind, RelationshipType};
use carto_core::parser::c::CFamilyParser;
use carto_core::parser::{FileContext, Language, LanguageParser};
use carto_core::store::MemoryStore;
use carto_core::{analyze_with_store, AnalyzeOptions};

fn parse_cpp(source: &str) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new("/src/main.cpp"),
        Language::Cpp,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    CFamilyParser::new()
        .parse_source(source, &ctx)
        .expect("parse should succeed")
}

fn parse_c(source: &str) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new("/src/util.c"),
        Language::C,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    CFamilyParser::new()
        .parse_source(source, &ctx)
        .expect("parse should succeed")
}

fn nodes_of(result: &FileParseResult, kind: NodeKind) -> Vec<&carto_core::Node> {
    result.nodes.iter().filter(|n| n.kind() == kind).collect()
}

#[test]
fn includes_distinguish_system_and_local() {
    let result = parse_cpp("#include <iostream>\n#include \"shapes/Circle.h\"\n\nint main() { return 0; }\n");

    let directives = nodes_of(&result, NodeKind::IncludeDirective);
    assert_eq!(directives.len(), 2);

    let iostream = directives.iter().find(|d| d.name() == "iostream").unwrap();
    assert!(iostream.bool_prop("isSystemInclude"));

    let circle = directives.iter().find(|d| d.name() == "Circle.h").unwrap();
    assert!(!circle.bool_prop("isSystemInclude"));
    assert_eq!(circle.str_prop("includePath"), Some("shapes/Circle.h"));

    let includes: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::Includes)
        .collect();
    assert_eq!(includes.len(), 2);
}

#[test]
fn free_function_in_c() {
    let result = parse_c("int add(int a, int b) {\n    return a + b;\n}\n");

    let functions = nodes_of(&result, NodeKind::CFunction);
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name(), "add");
    assert_eq!(functions[0].str_prop("returnType"), Some("int"));

    let params = nodes_of(&result, NodeKind::Parameter);
    assert_eq!(params.len(), 2);
}

#[test]
fn out_of_line_method_definition_keeps_qualified_name() {
    let result = parse_cpp("double Circle::area() {\n    return 3.14;\n}\n");
    let functions = nodes_of(&result, NodeKind::CFunction);
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name(), "Circle::area");
}

#[test]
fn class_with_methods_and_fields() {
    let result = parse_cpp(
        r#"
class Circle {
    double radius;
public:
    double area() { return radius * radius; }
};
"#,
    );

    let classes = nodes_of(&result, NodeKind::CppClass);
    assert_eq!(classes.len(), 1);
    let class_id = classes[0].entity_id();

    let methods = nodes_of(&result, NodeKind::CppMethod);
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].name(), "area");
    assert_eq!(methods[0].parent_id(), Some(class_id));

    let fields = nodes_of(&result, NodeKind::Field);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name(), "radius");

    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::HasMethod && r.source_id() == class_id));
    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::HasField && r.source_id() == class_id));
}

#[test]
fn macro_definitions_are_extracted() {
    let result = parse_c("#define MAX_SIZE 128\n#define SQUARE(x) ((x) * (x))\n");
    let macros = nodes_of(&result, NodeKind::MacroDefinition);
    assert_eq!(macros.len(), 2);

    let square = macros.iter().find(|m| m.name() == "SQUARE").unwrap();
    assert!(square.bool_prop("isFunctionLike"));
}

#[test]
fn local_include_resolves_to_scanned_header() {
    let dir = TempDir::new().unwrap();
    let main_path = dir.path().join("main.cpp");
    std::fs::create_dir_all(dir.path().join("shapes")).unwrap();
    std::fs::write(
        &main_path,
        "#include <iostream>\n#include \"shapes/Circle.h\"\n\nint main() { return 0; }\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("shapes/Circle.h"),
        "class Circle {\npublic:\n    double area();\n};\n",
    )
    .unwrap();

    let store = MemoryStore::new();
    analyze_with_store(dir.path(), &AnalyzeOptions::default(), &store).unwrap();

    let header = store
        .find_nodes(NodeKind::File, "Circle.h")
        .into_iter()
        .next()
        .expect("header file node");
    let main_file = store
        .find_nodes(NodeKind::File, "main.cpp")
        .into_iter()
        .next()
        .expect("main file node");

    let includes = store.relationships_of_type(RelationshipType::Includes);

    // File —INCLUDES→ File for the local header, resolved
    let local = includes
        .iter()
        .find(|r| r.source_id() == main_file.entity_id()
            && r.target_id() == header.entity_id())
        .expect("main.cpp →INCLUDES→ Circle.h");
    assert!(!local.bool_prop("isPlaceholder"));

    // The system include stays a placeholder file target
    let system = includes
        .iter()
        .find(|r| r.str_prop("includePath") == Some("iostream"))
        .expect("iostream include edge");
    assert!(system.bool_prop("isPlaceholder"));

    // Header method declaration surfaced as a CppMethod signature
    let area = store.find_nodes(NodeKind::CppMethod, "area");
    assert_eq!(area.len(), 1);
    assert!(area[0].bool_prop("isSignature"));
}
