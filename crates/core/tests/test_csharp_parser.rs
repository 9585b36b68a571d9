//! C# extraction tests.

use std::path::Path;
use std::sync::Arc;

use carto_core::graph::{FileParseResult, InstanceIds, NodeKind, RelationshipType};
use carto_core::parser::csharp::CSharpParser;
use carto_core::parser::{FileContext, Language, LanguageParser};

fn parse(source: &str) -> FileParseResult {
    let ctx = FileContext::new(
        Path::new("/src/Service.cs"),
        Language::CSharp,
        Arc::new(InstanceIds::new()),
        "2026-01-01T00:00:00Z".to_string(),
    );
    CSharpParser::new()
        .parse_source(source, &ctx)
        .expect("parse should succeed")
}

fn nodes_of(result: &FileParseResult, kind: NodeKind) -> Vec<&carto_core::Node> {
    result.nodes.iter().filter(|n| n.kind() == kind).collect()
}

const SERVICE: &str = r#"
using System;
using System.Collections.Generic;

namespace App.Services
{
    public class OrderService
    {
        private readonly List<string> orders = new List<string>();

        public int Count { get; set; }

        public OrderService()
        {
        }

        public void Add(string order)
        {
            orders.Add(order);
        }
    }
}
"#;

#[test]
fn using_directives_become_import_edges() {
    let result = parse(SERVICE);

    let usings = nodes_of(&result, NodeKind::UsingDirective);
    assert_eq!(usings.len(), 2);
    let names: Vec<_> = usings.iter().map(|u| u.name()).collect();
    assert!(names.contains(&"System"));
    assert!(names.contains(&"System.Collections.Generic"));

    let imports: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::Imports)
        .collect();
    assert_eq!(imports.len(), 2);
}

#[test]
fn namespace_is_declared_and_owns_the_class() {
    let result = parse(SERVICE);

    let namespaces = nodes_of(&result, NodeKind::NamespaceDeclaration);
    assert_eq!(namespaces.len(), 1);
    assert_eq!(namespaces[0].name(), "App.Services");

    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::DeclaresNamespace));

    let classes = nodes_of(&result, NodeKind::CSharpClass);
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].parent_id(), Some(namespaces[0].entity_id()));
}

#[test]
fn methods_properties_and_fields() {
    let result = parse(SERVICE);
    let class_id = nodes_of(&result, NodeKind::CSharpClass)[0].entity_id();

    let methods = nodes_of(&result, NodeKind::CSharpMethod);
    assert_eq!(methods.len(), 2);
    let ctor = methods.iter().find(|m| m.name() == "OrderService").unwrap();
    assert!(ctor.bool_prop("isConstructor"));
    let add = methods.iter().find(|m| m.name() == "Add").unwrap();
    assert_eq!(add.str_prop("visibility"), Some("public"));

    let properties = nodes_of(&result, NodeKind::Property);
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].name(), "Count");
    assert!(result
        .relationships
        .iter()
        .any(|r| r.rel_type() == RelationshipType::HasProperty
            && r.source_id() == class_id));

    let fields = nodes_of(&result, NodeKind::Field);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name(), "orders");
}

#[test]
fn interface_and_struct_kinds() {
    let result = parse(
        r#"
namespace App
{
    public interface IRepository
    {
        void Save();
    }

    public struct Point
    {
        public int X;
    }

    public class Repo : IRepository
    {
        public void Save() { }
    }
}
"#,
    );

    assert_eq!(nodes_of(&result, NodeKind::CSharpInterface).len(), 1);
    assert_eq!(nodes_of(&result, NodeKind::CSharpStruct).len(), 1);

    // Repo : IRepository reads as IMPLEMENTS because of the I-prefix
    let implements: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.rel_type() == RelationshipType::Implements)
        .collect();
    assert_eq!(implements.len(), 1);
    assert_eq!(implements[0].str_prop("targetName"), Some("IRepository"));
}

#[test]
fn using_static_is_flagged() {
    let result = parse("using static System.Math;\n\nnamespace App { public class C { } }\n");
    let usings = nodes_of(&result, NodeKind::UsingDirective);
    assert_eq!(usings.len(), 1);
    assert!(usings[0].bool_prop("isStatic"));
}
