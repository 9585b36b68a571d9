//! C# parser using tree-sitter.
//!
//! Maintains an explicit context stack of the current namespace and the
//! current container while walking. The previous value is backed up before
//! recursing and restored afterwards, so nested namespaces and nested types
//! always attach to the right owner.

use super::support::{field_text, node_text, span_of};
use super::{FileContext, Language, LanguageParser, ParseError};
use crate::graph::{EntityId, FileParseResult, NodeKind, RelationshipType};

pub struct CSharpParser {
    language: tree_sitter::Language,
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self {
            language: tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }
}

impl CSharpParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageParser for CSharpParser {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn extensions(&self) -> &[&str] {
        &[".cs"]
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
            .ok_or_else(|| ParseError::ParseFailed("failed to parse C# source".to_string()))?;

        let file_node = ctx.file_node(source.lines().count() as u32);
        let file_id = file_node.entity_id().clone();
        let mut extract = Extract {
            ctx,
            source,
            out: FileParseResult::new(ctx.file_path()),
            file_id,
            current_namespace: None,
        };
        extract.out.push_node(file_node);

        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            extract.visit(&child);
        }

        Ok(extract.out)
    }
}

#[derive(Clone)]
struct Namespace {
    name: String,
    id: EntityId,
}

struct Extract<'a> {
    ctx: &'a FileContext,
    source: &'a str,
    out: FileParseResult,
    file_id: EntityId,
    current_namespace: Option<Namespace>,
}

impl<'a> Extract<'a> {
    fn file(&self) -> &str {
        self.ctx.file_path()
    }

    fn type_qualified(&self, outer: Option<&str>, name: &str) -> String {
        let local = match outer {
            Some(o) => format!("{o}.{name}"),
            None => name.to_string(),
        };
        match &self.current_namespace {
            Some(ns) => format!("{}.{}", ns.name, local),
            None => format!("{}:{}", self.file(), local),
        }
    }

    fn visit(&mut self, node: &tree_sitter::Node) {
        match node.kind() {
            "using_directive" => self.extract_using(node),
            "namespace_declaration" => self.extract_namespace(node),
            "file_scoped_namespace_declaration" => {
                // No body node: the namespace applies to the rest of the file.
                self.enter_namespace(node);
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.visit(&child);
                }
            }
            "class_declaration" => {
                self.extract_type(node, NodeKind::CSharpClass, None);
            }
            "struct_declaration" | "record_struct_declaration" => {
                self.extract_type(node, NodeKind::CSharpStruct, None);
            }
            "interface_declaration" => {
                self.extract_type(node, NodeKind::CSharpInterface, None);
            }
            "record_declaration" => {
                self.extract_type(node, NodeKind::CSharpClass, None);
            }
            "enum_declaration" => self.extract_enum(node, None),
            _ => {}
        }
    }

    fn extract_using(&mut self, node: &tree_sitter::Node) {
        let mut is_static = false;
        let mut alias: Option<String> = None;
        let mut path = String::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "qualified_name" | "identifier" => {
                    path = node_text(&child, self.source).to_string();
                }
                // using Alias = Some.Namespace;
                "name_equals" => {
                    let mut inner = child.walk();
                    for c in child.children(&mut inner) {
                        if c.kind() == "identifier" {
                            alias = Some(node_text(&c, self.source).to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        if path.is_empty() {
            return;
        }

        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:{}:{}", self.file(), path, line);
        let mut using = self
            .ctx
            .node(NodeKind::UsingDirective, path.clone(), &qualified, span_of(node));
        using.set_parent(self.file_id.clone());
        using.set_prop("moduleSpecifier", path);
        using.set_prop("isStatic", is_static);
        if let Some(a) = alias {
            using.set_prop("alias", a);
        }

        let using_id = self.out.push_node(using);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Imports,
            self.file_id.clone(),
            using_id,
        ));
    }

    /// Emit the namespace node and set it current; returns the previous
    /// namespace for restoration.
    fn enter_namespace(&mut self, node: &tree_sitter::Node) -> Option<Namespace> {
        let Some(name) = field_text(node, "name", self.source) else {
            return self.current_namespace.clone();
        };
        let full_name = match &self.current_namespace {
            Some(outer) => format!("{}.{}", outer.name, name),
            None => name,
        };

        let qualified = format!("{}:{}", self.file(), full_name);
        let mut ns_node = self.ctx.node(
            NodeKind::NamespaceDeclaration,
            full_name.clone(),
            &qualified,
            span_of(node),
        );
        ns_node.set_parent(self.file_id.clone());
        let ns_id = self.out.push_node(ns_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DeclaresNamespace,
            self.file_id.clone(),
            ns_id.clone(),
        ));

        let previous = self.current_namespace.take();
        self.current_namespace = Some(Namespace {
            name: full_name,
            id: ns_id,
        });
        previous
    }

    fn extract_namespace(&mut self, node: &tree_sitter::Node) {
        let previous = self.enter_namespace(node);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.visit(&child);
            }
        }
        self.current_namespace = previous;
    }

    fn extract_type(&mut self, node: &tree_sitter::Node, kind: NodeKind, outer: Option<&str>) {
        let Some(name) = field_text(node, "name", self.source) else {
            tracing::debug!(file = self.file(), "type declaration without a name, skipping");
            return;
        };
        let qualified = self.type_qualified(outer, &name);
        let local_qualified = match outer {
            Some(o) => format!("{o}.{name}"),
            None => name.clone(),
        };

        let mut type_node = self.ctx.node(kind, name.clone(), &qualified, span_of(node));
        type_node.set_parent(match &self.current_namespace {
            Some(ns) => ns.id.clone(),
            None => self.file_id.clone(),
        });
        if node.kind() == "record_declaration" || node.kind() == "record_struct_declaration" {
            type_node.set_prop("isRecord", true);
        }

        let type_id = type_node.entity_id().clone();

        // Base list: an `I`-prefixed name reads as an interface. The first
        // non-interface entry is the base class.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "base_list" {
                continue;
            }
            let mut seen_class_base = false;
            let mut base_cursor = child.walk();
            for base in child.children(&mut base_cursor) {
                if !matches!(base.kind(), "identifier" | "qualified_name" | "generic_name") {
                    continue;
                }
                let base_name = node_text(&base, self.source)
                    .split('<')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                if base_name.is_empty() {
                    continue;
                }
                let looks_like_interface = base_name
                    .strip_prefix('I')
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| c.is_ascii_uppercase());

                let (rel_type, target_kind) =
                    if looks_like_interface || kind == NodeKind::CSharpInterface {
                        let rel = if kind == NodeKind::CSharpInterface {
                            RelationshipType::Extends
                        } else {
                            RelationshipType::Implements
                        };
                        (rel, NodeKind::CSharpInterface)
                    } else if seen_class_base {
                        (RelationshipType::Implements, NodeKind::CSharpClass)
                    } else {
                        seen_class_base = true;
                        (RelationshipType::Extends, NodeKind::CSharpClass)
                    };

                let target = EntityId::new(
                    target_kind.label(),
                    &self.type_qualified(None, &base_name),
                );
                let rel = self
                    .ctx
                    .relationship(rel_type, type_id.clone(), target)
                    .with_placeholder()
                    .with_prop("targetName", base_name);
                self.out.push_relationship(rel);
            }
        }

        self.out.push_node(type_node);
        let defines = match kind {
            NodeKind::CSharpInterface => RelationshipType::DefinesInterface,
            NodeKind::CSharpStruct => RelationshipType::DefinesStruct,
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

    fn extract_enum(&mut self, node: &tree_sitter::Node, outer: Option<&str>) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = self.type_qualified(outer, &name);

        let mut enum_node =
            self.ctx
                .node(NodeKind::CSharpStruct, name.clone(), &qualified, span_of(node));
        enum_node.set_parent(match &self.current_namespace {
            Some(ns) => ns.id.clone(),
            None => self.file_id.clone(),
        });
        enum_node.set_prop("isEnum", true);

        let enum_id = enum_node.entity_id().clone();
        self.out.push_node(enum_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DefinesEnum,
            self.file_id.clone(),
            enum_id.clone(),
        ));

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                if member.kind() == "enum_member_declaration" {
                    if let Some(member_name) = field_text(&member, "name", self.source) {
                        let member_qualified = format!("{enum_id}:{member_name}");
                        let mut field = self.ctx.node(
                            NodeKind::Field,
                            member_name,
                            &member_qualified,
                            span_of(&member),
                        );
                        field.set_parent(enum_id.clone());
                        field.set_prop("isEnumConstant", true);
                        let field_id = self.out.push_node(field);
                        self.out.push_relationship(self.ctx.relationship(
                            RelationshipType::HasField,
                            enum_id.clone(),
                            field_id,
                        ));
                    }
                }
            }
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
                "property_declaration" => {
                    self.extract_property(&member, type_id);
                }
                "field_declaration" => {
                    self.extract_fields(&member, type_id);
                }
                "class_declaration" => {
                    self.extract_type(&member, NodeKind::CSharpClass, Some(local_qualified));
                }
                "struct_declaration" => {
                    self.extract_type(&member, NodeKind::CSharpStruct, Some(local_qualified));
                }
                "interface_declaration" => {
                    self.extract_type(&member, NodeKind::CSharpInterface, Some(local_qualified));
                }
                "enum_declaration" => {
                    self.extract_enum(&member, Some(local_qualified));
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
            .node(NodeKind::CSharpMethod, name, &qualified, span_of(node));
        method.set_parent(type_id.clone());
        method.set_prop("visibility", visibility_of(node, self.source));
        method.set_prop("isStatic", has_modifier(node, self.source, "static"));
        method.set_prop("isAsync", has_modifier(node, self.source, "async"));
        if is_constructor {
            method.set_prop("isConstructor", true);
        }
        if let Some(returns) = field_text(node, "returns", self.source) {
            method.set_prop("returnType", returns);
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

    fn extract_property(&mut self, node: &tree_sitter::Node, type_id: &EntityId) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = format!("{type_id}:{name}");
        let mut property = self
            .ctx
            .node(NodeKind::Property, name, &qualified, span_of(node));
        property.set_parent(type_id.clone());
        if let Some(prop_type) = field_text(node, "type", self.source) {
            property.set_prop("type", prop_type);
        }
        property.set_prop("visibility", visibility_of(node, self.source));

        let property_id = self.out.push_node(property);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasProperty,
            type_id.clone(),
            property_id,
        ));
    }

    fn extract_fields(&mut self, node: &tree_sitter::Node, type_id: &EntityId) {
        // field_declaration → variable_declaration → variable_declarator;
        // the inner declaration is not a named field.
        let mut var_decl = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "variable_declaration" {
                var_decl = Some(child);
            }
        }
        let Some(var_decl) = var_decl else { return };

        let field_type = field_text(&var_decl, "type", self.source);
        let is_constant = has_modifier(node, self.source, "const")
            || (has_modifier(node, self.source, "static")
                && has_modifier(node, self.source, "readonly"));

        let mut decl_cursor = var_decl.walk();
        for child in var_decl.children(&mut decl_cursor) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let name = field_text(&child, "name", self.source).or_else(|| {
                let mut inner = child.walk();
                let found = child
                    .children(&mut inner)
                    .find(|c| c.kind() == "identifier")
                    .map(|c| node_text(&c, self.source).to_string());
                found
            });
            let Some(name) = name else { continue };

            let qualified = format!("{type_id}:{name}");
            let mut field = self
                .ctx
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

    fn extract_parameters(&mut self, params: &tree_sitter::Node, owner: &EntityId) {
        let mut cursor = params.walk();
        for child in params.children(&mut cursor) {
            if child.kind() != "parameter" {
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
                param.set_prop("type", param_type);
            }
            let param_id = self.out.push_node(param);
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::HasParameter,
                owner.clone(),
                param_id,
            ));
        }
    }
}

fn has_modifier(node: &tree_sitter::Node, source: &str, modifier: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier" && node_text(&child, source) == modifier {
            return true;
        }
    }
    false
}

fn visibility_of(node: &tree_sitter::Node, source: &str) -> &'static str {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifier" {
            match node_text(&child, source) {
                "public" => return "public",
                "private" => return "private",
                "protected" => return "protected",
                "internal" => return "internal",
                _ => {}
            }
        }
    }
    "internal"
}
