//! Java extraction tests.

use std::path::Path;
use std::sync::Arc;

use carto_core::graph::{FileParseResult, InstanceIds, NodeKind, RelationshipType};
use carto_core::parser::java::JavaParser;
use carto_core::parser::{FileContext, Language, LanguageParser};

fn parse(source: &str) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new("/src/Calculator.java"),
        Language::Java,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    JavaParser::new()
        .parse_source(source, &ctx)
        .expect("parse should succeed")
}

fn nodes_of(result: &FileParseResult, kind: NodeKind) -> Vec<&carto_core::Node> {
    result.nodes.iter().filter(|n| n.kind() == kind).collect()
}

const CALCULATOR: &str = r#"
package com.example.calc;

import java.util.List;

public class Calculator {
    private int total;

    public Calculator() {
        this.total = 0;
    }

    public int performOperation(int a, int b) {
        return a + b;
    }
}
"#;

#[test]
fn package_declaration_comes_first() {
    let result = parse(CALCULATOR);

    let packages = nodes_of(&result, NodeKind::PackageDeclaration);
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name(), "com.example.calc");

    let file_id = nodes_of(&result, NodeKind::File)[0].entity_id();
    let declares: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::DeclaresPackage)
        .collect();
    assert_eq!(declares.len(), 1);
    assert_eq!(declares[0].source_id(), file_id);
    assert_eq!(declares[0].target_id(), packages[0].entity_id());
}

#[test]
fn class_is_package_qualified_with_defines_edge() {
    let result = parse(CALCULATOR);

    let classes = nodes_of(&result, NodeKind::JavaClass);
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].name(), "Calculator");
    assert_eq!(classes[0].str_prop("package"), Some("com.example.calc"));

    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::DefinesClass
            && r.target_id() == classes[0].entity_id()));
}

#[test]
fn constructor_is_a_method_with_flag() {
    let result = parse(CALCULATOR);

    let methods = nodes_of(&result, NodeKind::JavaMethod);
    assert_eq!(methods.len(), 2);

    let ctor = methods.iter().find(|m| m.name() == "Calculator").unwrap();
    assert!(ctor.bool_prop("isConstructor"));

    let op = methods.iter().find(|m| m.name() == "performOperation").unwrap();
    assert!(!op.bool_prop("isConstructor"));
    assert_eq!(op.str_prop("returnType"), Some("int"));
    assert_eq!(op.str_prop("visibility"), Some("public"));

    let class_id = nodes_of(&result, NodeKind::JavaClass)[0].entity_id();
    let has_method: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::HasMethod)
        .collect();
    assert_eq!(has_method.len(), 2);
    for edge in has_method {
        assert_eq!(edge.source_id(), class_id);
    }
}

#[test]
fn fields_and_parameters() {
    let result = parse(CALCULATOR);

    let fields = nodes_of(&result, NodeKind::Field);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name(), "total");

    let params = nodes_of(&result, NodeKind::Parameter);
    let names: Vec<_> = params.iter().map(|p| p.name()).collect();
    assert!(names.contains(&"a"));
    assert!(names.contains(&"b"));
}

#[test]
fn imports_are_extracted() {
    let result = parse(CALCULATOR);
    let imports = nodes_of(&result, NodeKind::Import);
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].str_prop("moduleSpecifier"), Some("java.util.List"));
}

#[test]
fn extends_clause_becomes_placeholder_edge() {
    let result = parse(
        "package app;\n\npublic class Child extends Base implements Runnable {\n}\n",
    );

    let extends: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::Extends)
        .collect();
    assert_eq!(extends.len(), 1);
    assert!(extends[0].bool_prop("isPlaceholder"));
    assert_eq!(extends[0].str_prop("targetName"), Some("Base"));

    let implements: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert_eq!(implements[0].str_prop("targetName"), Some("Runnable"));
}

#[test]
fn nested_and_enum_types() {
    let result = parse(
        r#"
package app;

public class Outer {
    public enum Mode { FAST, SLOW }

    static class Inner {
        void go() {}
    }
}
"#,
    );

    let classes = nodes_of(&result, NodeKind::JavaClass);
    let names: Vec<_> = classes.iter().map(|c| c.name()).collect();
    assert!(names.contains(&"Outer"));
    assert!(names.contains(&"Inner"));
    assert!(names.contains(&"Mode"));

    let mode = classes.iter().find(|c| c.name() == "Mode").unwrap();
    assert!(mode.bool_prop("isEnum"));

    // Enum constants surface as fields of the enum
    let fields = nodes_of(&result, NodeKind::Field);
    let field_names: Vec<_> = fields.iter().map(|f| f.name()).collect();
    assert!(field_names.contains(&"FAST"));
    assert!(field_names.contains(&"SLOW"));
}
