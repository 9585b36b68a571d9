//! Go extraction tests.

use std::path::Path;
use std::sync::Arc;

use carto_core::graph::{EntityId, FileParseResult, InstanceIds, NodeKind, RelationshipType};
use carto_core::parser::go::GoParser;
use carto_core::parser::{FileContext, Language, LanguageParser};

fn parse(source: &str) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new("/src/server.go"),
        Language::Go,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    GoParser::new()
        .parse_source(source, &ctx)
        .expect("parse should succeed")
}

fn nodes_of(result: &FileParseResult, kind: NodeKind) -> Vec<&carto_core::Node> {
    result.nodes.iter().filter(|n| n.kind() == kind).collect()
}

const SERVER: &str = r#"
package server

import (
    "fmt"
    "net/http"
)

type Server struct {
    addr string
    port int
}

func (s *Server) Start() error {
    fmt.Println(s.addr)
    return nil
}

func NewServer(addr string) *Server {
    return &Server{addr: addr}
}

type Handler interface {
    Handle(req string) error
}
"#;

#[test]
fn package_clause_is_declared() {
    let result = parse(SERVER);
    let packages = nodes_of(&result, NodeKind::PackageClause);
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name(), "server");
    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::DeclaresPackage));
}

#[test]
fn imports_become_declaration_and_specs() {
    let result = parse(SERVER);

    assert_eq!(nodes_of(&result, NodeKind::ImportDeclaration).len(), 1);

    let specs = nodes_of(&result, NodeKind::ImportSpec);
    assert_eq!(specs.len(), 2);
    let modules: Vec<_> = specs
        .iter()
        .filter_map(|s| s.str_prop("moduleSpecifier"))
        .collect();
    assert!(modules.contains(&"fmt"));
    assert!(modules.contains(&"net/http"));
}

#[test]
fn struct_with_fields() {
    let result = parse(SERVER);

    let structs = nodes_of(&result, NodeKind::GoStruct);
    assert_eq!(structs.len(), 1);
    assert_eq!(structs[0].name(), "Server");
    assert!(structs[0].bool_prop("isExported"));

    let fields = nodes_of(&result, NodeKind::Field);
    let names: Vec<_> = fields.iter().map(|f| f.name()).collect();
    assert!(names.contains(&"addr"));
    assert!(names.contains(&"port"));
}

#[test]
fn method_attaches_to_package_qualified_receiver() {
    let result = parse(SERVER);

    let methods = nodes_of(&result, NodeKind::GoMethod);
    assert_eq!(methods.len(), 2); // Start plus the interface signature

    let start = methods.iter().find(|m| m.name() == "Start").unwrap();
    assert_eq!(start.str_prop("receiverType"), Some("*Server"));

    // HAS_METHOD edge originates at the struct's reconstructed id
    let struct_id = EntityId::new(NodeKind::GoStruct.label(), "server.Server");
    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::HasMethod
            && r.source_id() == &struct_id
            && r.target_id() == start.entity_id()));
}

#[test]
fn free_function_and_interface() {
    let result = parse(SERVER);

    let functions = nodes_of(&result, NodeKind::GoFunction);
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name(), "NewServer");

    let interfaces = nodes_of(&result, NodeKind::GoInterface);
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].name(), "Handler");

    let handle = nodes_of(&result, NodeKind::GoMethod)
        .into_iter()
        .find(|m| m.name() == "Handle")
        .unwrap();
    assert!(handle.bool_prop("isSignature"));
}

#[test]
fn embedded_struct_records_extends_placeholder() {
    let result = parse(
        "package app\n\ntype Base struct {\n\tid int\n}\n\ntype Derived struct {\n\tBase\n\tname string\n}\n",
    );

    let extends: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::Extends)
        .collect();
    assert_eq!(extends.len(), 1);
    assert_eq!(extends[0].str_prop("targetName"), Some("Base"));

    // Both structs are in the same file, so the reconstructed target id is
    // the real Base struct.
    let base = nodes_of(&result, NodeKind::GoStruct)
        .into_iter()
        .find(|s| s.name() == "Base")
        .unwrap();
    assert_eq!(extends[0].target_id(), base.entity_id());
}
