//! Java parser using tree-sitter.
//!
//! The package declaration is extracted first because every container id in
//! the file is qualified by it (`com.example.Calculator`). Constructors are
//! `JavaMethod` nodes flagged `isConstructor`.

use super::support::{field_text, node_text, span_of};
use super::{FileContext, Language, LanguageParser, ParseError};
use crate::graph::{EntityId, FileParseResult, NodeKind, RelationshipType};

pub struct JavaParser {
    language: tree_sitter::Language,
}

impl Default for JavaParser {
    fn default() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }
}

impl JavaParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extensions(&self) -> &[&str] {
        &[".java"]
    }

    fn parse_source(
        &self,
        source: &str,
        ctx: &FileContext,
    ) -> Result<FileParseResult, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParseFailed("failed to parse Java source".to_string()))?;

        let file_node = ctx.file_node(source.lines().count() as u32);
        let file_id = file_node.entity_id().clone();
        let mut extract = Extract {
            ctx,
            source,
            out: FileParseResult::new(ctx.file_path()),
            file_id,
            package: None,
        };
        extract.out.push_node(file_node);

        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "package_declaration" => extract.extract_package(&child),
                "import_declaration" => extract.extract_import(&child),
                "class_declaration" => extract.extract_type(&child, TypeShape::Class, None),
                "interface_declaration" => extract.extract_type(&child, TypeShape::Interface, None),
                "enum_declaration" => extract.extract_type(&child, TypeShape::Enum, None),
                "record_declaration" => extract.extract_type(&child, TypeShape::Record, None),
                _ => {}
            }
        }

        Ok(extract.out)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum TypeShape {
    Class,
    Interface,
    Enum,
    Record,
}

struct Extract<'a> {
    ctx: &'a FileContext,
    source: &'a str,
    out: FileParseResult,
    file_id: EntityId,
    package: Option<String>,
}

impl<'a> Extract<'a> {
    fn file(&self) -> &str {
        self.ctx.file_path()
    }

    /// Fully-qualified type name: `package.Outer.Name` when a package is
    /// declared, `file:Name` otherwise.
    fn type_qualified(&self, outer: Option<&str>, name: &str) -> String {
        let local = match outer {
            Some(o) => format!("{o}.{name}"),
            None => name.to_string(),
        };
        match &self.package {
            Some(pkg) => format!("{pkg}.{local}"),
            None => format!("{}:{}", self.file(), local),
        }
    }

    fn extract_package(&mut self, node: &tree_sitter::Node) {
        let mut name = String::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "scoped_identifier" | "identifier") {
                name = node_text(&child, self.source).to_string();
            }
        }
        if name.is_empty() {
            tracing::debug!(file = self.file(), "package declaration without a name, skipping");
            return;
        }

        let qualified = format!("{}:{}", self.file(), name);
        let mut pkg = self.ctx.node(
            NodeKind::PackageDeclaration,
            name.clone(),
            &qualified,
            span_of(node),
        );
        pkg.set_parent(self.file_id.clone());

        let pkg_id = self.out.push_node(pkg);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DeclaresPackage,
            self.file_id.clone(),
            pkg_id,
        ));
        self.package = Some(name);
    }

    fn extract_import(&mut self, node: &tree_sitter::Node) {
        let mut path = String::new();
        let mut is_wildcard = false;
        let mut is_static = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "scoped_identifier" | "identifier" => {
                    path = node_text(&child, self.source).to_string();
                }
                "asterisk" => is_wildcard = true,
                "static" => is_static = true,
                _ => {}
            }
        }
        if path.is_empty() {
            return;
        }

        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:{}:{}", self.file(), path, line);
        let mut import = self
            .ctx
            .node(NodeKind::Import, path.clone(), &qualified, span_of(node));
        import.set_parent(self.file_id.clone());
        import.set_prop("moduleSpecifier", path);
        import.set_prop("isWildcard", is_wildcard);
        import.set_prop("isStatic", is_static);

        let import_id = self.out.push_node(import);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Imports,
            self.file_id.clone(),
            import_id,
        ));
    }

    fn extract_type(&mut self, node: &tree_sitter::Node, shape: TypeShape, outer: Option<&str>) {
        let Some(name) = field_text(node, "name", self.source) else {
            tracing::debug!(file = self.file(), "type declaration without a name, skipping");
            return;
        };
        let qualified = self.type_qualified(outer, &name);
        let local_qualified = match outer {
            Some(o) => format!("{o}.{name}"),
            None => name.clone(),
        };

        let kind = match shape {
            TypeShape::Interface => NodeKind::JavaInterface,
            _ => NodeKind::JavaClass,
        };
        let mut type_node = self
            .ctx
            .node(kind, name.clone(), &qualified, span_of(node));
        type_node.set_parent(self.file_id.clone());
        if let Some(pkg) = &self.package {
            type_node.set_prop("package", pkg.clone());
        }
        match shape {
            TypeShape::Enum => type_node.set_prop("isEnum", true),
            TypeShape::Record => type_node.set_prop("isRecord", true),
            _ => {}
        }

        let type_id = type_node.entity_id().clone();

        // Superclass → EXTENDS, interface list → IMPLEMENTS (EXTENDS between
        // interfaces). Emitted as placeholders; Pass 2 reconciles.
        if let Some(superclass) = node.child_by_field_name("superclass") {
            let mut sc_cursor = superclass.walk();
            for sc in superclass.children(&mut sc_cursor) {
                if matches!(sc.kind(), "type_identifier" | "generic_type") {
                    let base = base_type_name(node_text(&sc, self.source));
                    self.push_inheritance(RelationshipType::Extends, &type_id, &base, kind);
                }
            }
        }
        if let Some(interfaces) = node.child_by_field_name("interfaces") {
            let rel_type = if shape == TypeShape::Interface {
                RelationshipType::Extends
            } else {
                RelationshipType::Implements
            };
            let mut bases = Vec::new();
            collect_type_list(&interfaces, self.source, &mut |base| bases.push(base));
            for base in bases {
                self.push_inheritance(
                    rel_type,
                    &type_id,
                    &base_type_name(&base),
                    NodeKind::JavaInterface,
                );
            }
        }
        // extends_interfaces is not a named field on interface_declaration
        let mut iface_cursor = node.walk();
        for child in node.children(&mut iface_cursor) {
            if child.kind() == "extends_interfaces" {
                let mut bases = Vec::new();
                collect_type_list(&child, self.source, &mut |base| bases.push(base));
                for base in bases {
                    self.push_inheritance(
                        RelationshipType::Extends,
                        &type_id,
                        &base_type_name(&base),
                        NodeKind::JavaInterface,
                    );
                }
            }
        }

        self.out.push_node(type_node);
        let defines = match shape {
            TypeShape::Interface => RelationshipType::DefinesInterface,
            TypeShape::Enum => RelationshipType::DefinesEnum,
            _ => RelationshipType::DefinesClass,
        };
        self.out.push_relationship(self.ctx.relationship(
            defines,
            self.file_id.clone(),
            type_id.clone(),
        ));

        if let Some(body) = node.child_by_field_name("body") {
            self.extract_members(&body, &qualified, &local_qualified, &type_id);
        }
    }

    fn extract_members(
        &mut self,
        body: &tree_sitter::Node,
        type_qualified: &str,
        local_qualified: &str,
        type_id: &EntityId,
    ) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_declaration" => {
                    self.extract_method(&member, type_qualified, type_id, false);
                }
                "constructor_declaration" => {
                    self.extract_method(&member, type_qualified, type_id, true);
                }
                "field_declaration" => {
                    self.extract_fields(&member, type_id);
                }
                "class_declaration" => {
                    self.extract_type(&member, TypeShape::Class, Some(local_qualified));
                }
                "interface_declaration" => {
                    self.extract_type(&member, TypeShape::Interface, Some(local_qualified));
                }
                "enum_declaration" => {
                    self.extract_type(&member, TypeShape::Enum, Some(local_qualified));
                }
                "enum_body_declarations" => {
                    self.extract_members(&member, type_qualified, local_qualified, type_id);
                }
                "enum_constant" => {
                    if let Some(const_name) = field_text(&member, "name", self.source) {
                        let qualified = format!("{type_id}:{const_name}");
                        let mut field = self.ctx.node(
                            NodeKind::Field,
                            const_name,
                            &qualified,
                            span_of(&member),
                        );
                        field.set_parent(type_id.clone());
                        field.set_prop("isEnumConstant", true);
                        let field_id = self.out.push_node(field);
                        self.out.push_relationship(self.ctx.relationship(
                            RelationshipType::HasField,
                            type_id.clone(),
                            field_id,
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_method(
        &mut self,
        node: &tree_sitter::Node,
        type_qualified: &str,
        type_id: &EntityId,
        is_constructor: bool,
    ) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = format!("{}:{}.{}", self.file(), type_qualified, name);

        let mut method = self
            .ctx
            .node(NodeKind::JavaMethod, name, &qualified, span_of(node));
        method.set_parent(type_id.clone());
        method.set_prop("visibility", visibility_of(node, self.source));
        method.set_prop("isStatic", has_modifier(node, self.source, "static"));
        if is_constructor {
            method.set_prop("isConstructor", true);
        }
        if let Some(return_type) = field_text(node, "type", self.source) {
            method.set_prop("returnType", return_type);
        }

        let method_id = self.out.push_node(method);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasMethod,
            type_id.clone(),
            method_id.clone(),
        ));

        if let Some(params) = node.child_by_field_name("parameters") {
            self.extract_parameters(&params, &method_id);
        }
    }

    fn extract_fields(&mut self, node: &tree_sitter::Node, type_id: &EntityId) {
        let field_type = field_text(node, "type", self.source);
        let is_constant = has_modifier(node, self.source, "static")
            && has_modifier(node, self.source, "final");

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "variable_declarator" {
                if let Some(name) = field_text(&child, "name", self.source) {
                    let qualified = format!("{type_id}:{name}");
                    let mut field =
                        self.ctx
                            .node(NodeKind::Field, name, &qualified, span_of(&child));
                    field.set_parent(type_id.clone());
                    if let Some(ref t) = field_type {
                        field.set_prop("type", t.clone());
                    }
                    field.set_prop("isConstant", is_constant);
                    let field_id = self.out.push_node(field);
                    self.out.push_relationship(self.ctx.relationship(
                        RelationshipType::HasField,
                        type_id.clone(),
                        field_id,
                    ));
                }
            }
        }
    }

    fn extract_parameters(&mut self, params: &tree_sitter::Node, owner: &EntityId) {
        let mut cursor = params.walk();
        for child in params.children(&mut cursor) {
            if !matches!(child.kind(), "formal_parameter" | "spread_parameter") {
                continue;
            }
            let Some(name) = field_text(&child, "name", self.source) else {
                continue;
            };
            let qualified = format!("{owner}:{name}");
            let mut param = self
                .ctx
                .node(NodeKind::Parameter, name, &qualified, span_of(&child));
            param.set_parent(owner.clone());
            if let Some(param_type) = field_text(&child, "type", self.source) {
                if child.kind() == "spread_parameter" {
                    param.set_prop("type", format!("{param_type}..."));
                } else {
                    param.set_prop("type", param_type);
                }
            }
            let param_id = self.out.push_node(param);
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::HasParameter,
                owner.clone(),
                param_id,
            ));
        }
    }

    fn push_inheritance(
        &mut self,
        rel_type: RelationshipType,
        source_id: &EntityId,
        base_name: &str,
        target_kind: NodeKind,
    ) {
        let target = EntityId::new(target_kind.label(), &self.type_qualified(None, base_name));
        let rel = self
            .ctx
            .relationship(rel_type, source_id.clone(), target)
            .with_placeholder()
            .with_prop("targetName", base_name);
        self.out.push_relationship(rel);
    }
}

/// Strip generics from a type reference (`List<String>` → `List`).
fn base_type_name(raw: &str) -> String {
    raw.split('<').next().unwrap_or(raw).trim().to_string()
}

fn collect_type_list(
    node: &tree_sitter::Node,
    source: &str,
    push: &mut impl FnMut(String),
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type_list" => collect_type_list(&child, source, push),
            "type_identifier" | "generic_type" => {
                push(node_text(&child, source).to_string());
            }
            _ => {}
        }
    }
}

fn has_modifier(node: &tree_sitter::Node, source: &str, modifier: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            return node_text(&child, source).contains(modifier);
        }
    }
    false
}

fn visibility_of(node: &tree_sitter::Node, source: &str) -> &'static str {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let text = node_text(&child, source);
            if text.contains("public") {
                return "public";
            }
            if text.contains("private") {
                return "private";
            }
            if text.contains("protected") {
                return "protected";
            }
        }
    }
    "package"
}
