//! Go parser using tree-sitter.
//!
//! The package clause qualifies every type in the file. Methods are attached
//! to their receiver struct's entity id (`pkg.Type`), which also works when
//! the struct is declared in a sibling file of the same package: the edge is
//! emitted against the reconstructed id and Pass 2 reconciles it.

use super::support::{field_text, node_text, span_of};
use super::{FileContext, Language, LanguageParser, ParseError};
use crate::graph::{EntityId, FileParseResult, NodeKind, RelationshipType};

pub struct GoParser {
    language: tree_sitter::Language,
}

impl Default for GoParser {
    fn default() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }
}

impl GoParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageParser for GoParser {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extensions(&self) -> &[&str] {
        &[".go"]
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
            .ok_or_else(|| ParseError::ParseFailed("failed to parse Go source".to_string()))?;

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
                "package_clause" => extract.extract_package(&child),
                "import_declaration" => extract.extract_imports(&child),
                "function_declaration" => extract.extract_function(&child),
                "method_declaration" => extract.extract_method(&child),
                "type_declaration" => extract.extract_types(&child),
                _ => {}
            }
        }

        Ok(extract.out)
    }
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

    /// `pkg.Name` when the package clause was seen, `file:Name` otherwise.
    fn type_qualified(&self, name: &str) -> String {
        match &self.package {
            Some(pkg) => format!("{pkg}.{name}"),
            None => format!("{}:{}", self.file(), name),
        }
    }

    fn extract_package(&mut self, node: &tree_sitter::Node) {
        let mut name = String::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "package_identifier" {
                name = node_text(&child, self.source).to_string();
            }
        }
        if name.is_empty() {
            return;
        }

        let qualified = format!("{}:{}", self.file(), name);
        let mut pkg = self
            .ctx
            .node(NodeKind::PackageClause, name.clone(), &qualified, span_of(node));
        pkg.set_parent(self.file_id.clone());
        let pkg_id = self.out.push_node(pkg);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DeclaresPackage,
            self.file_id.clone(),
            pkg_id,
        ));
        self.package = Some(name);
    }

    fn extract_imports(&mut self, node: &tree_sitter::Node) {
        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:import:{}", self.file(), line);
        let mut decl = self.ctx.node(
            NodeKind::ImportDeclaration,
            "import",
            &qualified,
            span_of(node),
        );
        decl.set_parent(self.file_id.clone());
        let decl_id = self.out.push_node(decl);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Imports,
            self.file_id.clone(),
            decl_id.clone(),
        ));

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "import_spec" => self.extract_import_spec(&child, &decl_id),
                "import_spec_list" => {
                    let mut list_cursor = child.walk();
                    for spec in child.children(&mut list_cursor) {
                        if spec.kind() == "import_spec" {
                            self.extract_import_spec(&spec, &decl_id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_import_spec(&mut self, node: &tree_sitter::Node, decl_id: &EntityId) {
        let Some(raw_path) = field_text(node, "path", self.source) else {
            return;
        };
        let import_path = raw_path.trim_matches('"').to_string();
        let alias = field_text(node, "name", self.source);
        let display = alias
            .clone()
            .unwrap_or_else(|| {
                import_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(&import_path)
                    .to_string()
            });

        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:{}:{}", self.file(), import_path, line);
        let mut spec = self
            .ctx
            .node(NodeKind::ImportSpec, display, &qualified, span_of(node));
        spec.set_parent(decl_id.clone());
        spec.set_prop("moduleSpecifier", import_path);
        if let Some(a) = alias {
            spec.set_prop("alias", a);
        }

        let spec_id = self.out.push_node(spec);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            decl_id.clone(),
            spec_id,
        ));
    }

    fn extract_function(&mut self, node: &tree_sitter::Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:{}:{}", self.file(), name, line);

        let mut fn_node = self
            .ctx
            .node(NodeKind::GoFunction, name.clone(), &qualified, span_of(node));
        fn_node.set_parent(self.file_id.clone());
        fn_node.set_prop("isExported", starts_uppercase(&name));
        if let Some(result) = field_text(node, "result", self.source) {
            fn_node.set_prop("returnType", result);
        }

        let fn_id = self.out.push_node(fn_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DefinesFunction,
            self.file_id.clone(),
            fn_id.clone(),
        ));
        if let Some(params) = node.child_by_field_name("parameters") {
            self.extract_parameters(&params, &fn_id);
        }
    }

    fn extract_method(&mut self, node: &tree_sitter::Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let Some(receiver) = node.child_by_field_name("receiver") else {
            return;
        };
        let (receiver_name, receiver_type, base_type) = self.extract_receiver(&receiver);
        if base_type.is_empty() {
            tracing::debug!(file = self.file(), method = %name, "method without a receiver type, skipping");
            return;
        }

        let qualified = format!("{}:{}.{}", self.file(), base_type, name);
        let struct_id = EntityId::new(
            NodeKind::GoStruct.label(),
            &self.type_qualified(&base_type),
        );

        let mut method = self
            .ctx
            .node(NodeKind::GoMethod, name.clone(), &qualified, span_of(node));
        method.set_parent(struct_id.clone());
        method.set_prop("receiver", receiver_name);
        method.set_prop("receiverType", receiver_type);
        method.set_prop("isExported", starts_uppercase(&name));
        if let Some(result) = field_text(node, "result", self.source) {
            method.set_prop("returnType", result);
        }

        let method_id = self.out.push_node(method);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasMethod,
            struct_id,
            method_id.clone(),
        ));
        if let Some(params) = node.child_by_field_name("parameters") {
            self.extract_parameters(&params, &method_id);
        }
    }

    /// `(name, full type, base type)` from a receiver clause; the base type
    /// has any pointer stripped.
    fn extract_receiver(&self, receiver: &tree_sitter::Node) -> (String, String, String) {
        let mut cursor = receiver.walk();
        for child in receiver.children(&mut cursor) {
            if child.kind() == "parameter_declaration" {
                let name = field_text(&child, "name", self.source)
                    .unwrap_or_else(|| "self".to_string());
                let type_text = field_text(&child, "type", self.source).unwrap_or_default();
                let base = type_text
                    .trim_start_matches('*')
                    .split('[')
                    .next()
                    .unwrap_or("")
                    .to_string();
                return (name, type_text, base);
            }
        }
        ("self".to_string(), String::new(), String::new())
    }

    fn extract_types(&mut self, node: &tree_sitter::Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "type_spec" => self.extract_type_spec(&child),
                "type_alias" => self.extract_type_alias(&child),
                _ => {}
            }
        }
    }

    fn extract_type_spec(&mut self, node: &tree_sitter::Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };

        match type_node.kind() {
            "struct_type" => {
                let qualified = self.type_qualified(&name);
                let mut struct_node =
                    self.ctx
                        .node(NodeKind::GoStruct, name.clone(), &qualified, span_of(node));
                struct_node.set_parent(self.file_id.clone());
                struct_node.set_prop("isExported", starts_uppercase(&name));

                let struct_id = self.out.push_node(struct_node);
                self.out.push_relationship(self.ctx.relationship(
                    RelationshipType::DefinesStruct,
                    self.file_id.clone(),
                    struct_id.clone(),
                ));
                self.extract_struct_fields(&type_node, &struct_id);
            }
            "interface_type" => {
                let qualified = self.type_qualified(&name);
                let mut iface_node =
                    self.ctx
                        .node(NodeKind::GoInterface, name.clone(), &qualified, span_of(node));
                iface_node.set_parent(self.file_id.clone());
                iface_node.set_prop("isExported", starts_uppercase(&name));

                let iface_id = self.out.push_node(iface_node);
                self.out.push_relationship(self.ctx.relationship(
                    RelationshipType::DefinesInterface,
                    self.file_id.clone(),
                    iface_id.clone(),
                ));

                let mut cursor = type_node.walk();
                for member in type_node.children(&mut cursor) {
                    if member.kind() == "method_elem" {
                        if let Some(method_name) = field_text(&member, "name", self.source) {
                            let method_qualified =
                                format!("{}:{}.{}", self.file(), name, method_name);
                            let mut method = self.ctx.node(
                                NodeKind::GoMethod,
                                method_name,
                                &method_qualified,
                                span_of(&member),
                            );
                            method.set_parent(iface_id.clone());
                            method.set_prop("isSignature", true);
                            let method_id = self.out.push_node(method);
                            self.out.push_relationship(self.ctx.relationship(
                                RelationshipType::HasMethod,
                                iface_id.clone(),
                                method_id,
                            ));
                        }
                    }
                }
            }
            _ => {
                // Named type: `type Duration int64`
                let qualified = self.type_qualified(&name);
                let mut alias = self
                    .ctx
                    .node(NodeKind::TypeAlias, name, &qualified, span_of(node));
                alias.set_parent(self.file_id.clone());
                alias.set_prop("type", node_text(&type_node, self.source));
                let alias_id = self.out.push_node(alias);
                self.out.push_relationship(self.ctx.relationship(
                    RelationshipType::Contains,
                    self.file_id.clone(),
                    alias_id,
                ));
            }
        }
    }

    fn extract_type_alias(&mut self, node: &tree_sitter::Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = self.type_qualified(&name);
        let mut alias = self
            .ctx
            .node(NodeKind::TypeAlias, name, &qualified, span_of(node));
        alias.set_parent(self.file_id.clone());
        if let Some(type_text) = field_text(node, "type", self.source) {
            alias.set_prop("type", type_text);
        }
        alias.set_prop("isAlias", true);
        let alias_id = self.out.push_node(alias);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            self.file_id.clone(),
            alias_id,
        ));
    }

    fn extract_struct_fields(&mut self, struct_type: &tree_sitter::Node, struct_id: &EntityId) {
        let mut cursor = struct_type.walk();
        for child in struct_type.children(&mut cursor) {
            if child.kind() != "field_declaration_list" {
                continue;
            }
            let mut list_cursor = child.walk();
            for field_decl in child.children(&mut list_cursor) {
                if field_decl.kind() != "field_declaration" {
                    continue;
                }
                let field_type = field_text(&field_decl, "type", self.source);
                let mut any_name = false;

                let mut name_cursor = field_decl.walk();
                for name_child in field_decl.children(&mut name_cursor) {
                    if name_child.kind() == "field_identifier" {
                        any_name = true;
                        let name = node_text(&name_child, self.source);
                        let qualified = format!("{struct_id}:{name}");
                        let mut field =
                            self.ctx
                                .node(NodeKind::Field, name, &qualified, span_of(&name_child));
                        field.set_parent(struct_id.clone());
                        if let Some(ref t) = field_type {
                            field.set_prop("type", t.clone());
                        }
                        let field_id = self.out.push_node(field);
                        self.out.push_relationship(self.ctx.relationship(
                            RelationshipType::HasField,
                            struct_id.clone(),
                            field_id,
                        ));
                    }
                }

                // Embedded type (no name): record it as an EXTENDS placeholder,
                // the closest Go gets to inheritance.
                if !any_name {
                    if let Some(embedded) = field_type {
                        let base = embedded.trim_start_matches('*').to_string();
                        if !base.is_empty() {
                            let target = EntityId::new(
                                NodeKind::GoStruct.label(),
                                &self.type_qualified(&base),
                            );
                            let rel = self
                                .ctx
                                .relationship(
                                    RelationshipType::Extends,
                                    struct_id.clone(),
                                    target,
                                )
                                .with_placeholder()
                                .with_prop("targetName", base);
                            self.out.push_relationship(rel);
                        }
                    }
                }
            }
        }
    }

    fn extract_parameters(&mut self, params: &tree_sitter::Node, owner: &EntityId) {
        let mut cursor = params.walk();
        for child in params.children(&mut cursor) {
            if !matches!(
                child.kind(),
                "parameter_declaration" | "variadic_parameter_declaration"
            ) {
                continue;
            }
            let param_type = field_text(&child, "type", self.source);

            // Go allows several names per declaration: `a, b int`
            let mut any = false;
            let mut name_cursor = child.walk();
            for name_child in child.children(&mut name_cursor) {
                if name_child.kind() == "identifier" {
                    any = true;
                    let name = node_text(&name_child, self.source);
                    self.emit_parameter(&name_child, name, param_type.clone(), owner);
                }
            }
            // Unnamed parameter: type only
            if !any {
                if let Some(t) = param_type {
                    self.emit_parameter(&child, "_", Some(t), owner);
                }
            }
        }
    }

    fn emit_parameter(
        &mut self,
        node: &tree_sitter::Node,
        name: &str,
        param_type: Option<String>,
        owner: &EntityId,
    ) {
        let qualified = format!("{owner}:{name}");
        let mut param = self
            .ctx
            .node(NodeKind::Parameter, name, &qualified, span_of(node));
        param.set_parent(owner.clone());
        if let Some(t) = param_type {
            param.set_prop("type", t);
        }
        let param_id = self.out.push_node(param);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasParameter,
            owner.clone(),
            param_id,
        ));
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}
