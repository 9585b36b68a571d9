//! C and C++ parser using tree-sitter.
//!
//! Uses `tree-sitter-cpp` for `.cpp`, `.cc`, `.hpp`, `.hh` files and
//! `tree-sitter-c` for `.c` and `.h` files. Free functions become
//! `CFunction` nodes, functions inside a class body become `CppMethod`.
//! Include directives are extracted here; resolving them to files is Pass 2.

use super::support::{field_text, node_text, span_of};
use super::{FileContext, Language, LanguageParser, ParseError};
use crate::graph::{EntityId, FileParseResult, NodeKind, RelationshipType};

pub struct CFamilyParser {
    c_language: tree_sitter::Language,
    cpp_language: tree_sitter::Language,
}

impl Default for CFamilyParser {
    fn default() -> Self {
        Self {
            c_language: tree_sitter_c::LANGUAGE.into(),
            cpp_language: tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}

impl CFamilyParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_tree(&self, source: &str, cpp: bool) -> Result<tree_sitter::Tree, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        let language = if cpp { &self.cpp_language } else { &self.c_language };
        parser
            .set_language(language)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParseFailed("failed to parse C/C++ source".to_string()))
    }
}

impl LanguageParser for CFamilyParser {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn extensions(&self) -> &[&str] {
        &[".c", ".h", ".cpp", ".hpp", ".cc", ".hh"]
    }

    fn parse_source(
        &self,
        source: &str,
        ctx: &FileContext,
    ) -> Result<FileParseResult, ParseError> {
        // Headers parse with the C++ grammar: it accepts C declarations and
        // real projects keep class definitions in .h files.
        let cpp = ctx.language() == Language::Cpp || ctx.file_path().ends_with(".h");
        let tree = self.parse_tree(source, cpp)?;

        let mut extract = Extract {
            ctx,
            source,
            out: FileParseResult::new(ctx.file_path()),
            file_id: EntityId::new("File", ctx.file_path()),
            cpp,
        };

        let file_node = ctx.file_node(source.lines().count() as u32);
        extract.file_id = file_node.entity_id().clone();
        extract.out.push_node(file_node);

        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            extract.visit_toplevel(&child, None);
        }

        Ok(extract.out)
    }
}

struct Extract<'a> {
    ctx: &'a FileContext,
    source: &'a str,
    out: FileParseResult,
    file_id: EntityId,
    cpp: bool,
}

impl<'a> Extract<'a> {
    fn file(&self) -> &str {
        self.ctx.file_path()
    }

    /// Classes are qualified by namespace when one encloses them, by file
    /// path otherwise.
    fn container_qualified(&self, namespace: Option<&str>, name: &str) -> String {
        match namespace {
            Some(ns) => format!("{ns}.{name}"),
            None => format!("{}:{}", self.file(), name),
        }
    }

    fn visit_toplevel(&mut self, node: &tree_sitter::Node, namespace: Option<&str>) {
        match node.kind() {
            "preproc_include" => self.extract_include(node),
            "preproc_def" => self.extract_macro(node, false),
            "preproc_function_def" => self.extract_macro(node, true),
            "function_definition" => {
                // Grammar quirk: class/struct declarations occasionally
                // mis-parse as function_definition. The literal prefix of the
                // node text decides.
                let text = node_text(node, self.source);
                if text.starts_with("class ") || text.starts_with("struct ") {
                    tracing::debug!(
                        file = self.file(),
                        line = node.start_position().row + 1,
                        "class/struct mis-parsed as function_definition, applying prefix workaround"
                    );
                    self.extract_misparsed_class(node, namespace, text.starts_with("struct "));
                } else {
                    self.extract_function(node, namespace);
                }
            }
            "class_specifier" => {
                self.extract_class(node, namespace, false);
            }
            "struct_specifier" | "union_specifier" => {
                if node.child_by_field_name("body").is_some() {
                    self.extract_class(node, namespace, true);
                }
            }
            "namespace_definition" if self.cpp => {
                self.extract_namespace(node, namespace);
            }
            "template_declaration" if self.cpp => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if matches!(
                        child.kind(),
                        "function_definition" | "class_specifier" | "struct_specifier"
                    ) {
                        self.visit_toplevel(&child, namespace);
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    fn extract_include(&mut self, node: &tree_sitter::Node) {
        let Some(path_node) = node.child_by_field_name("path") else {
            return;
        };
        let raw = node_text(&path_node, self.source);
        let is_system = raw.starts_with('<');
        let include_path = raw
            .trim_matches('"')
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_string();
        let name = include_path
            .rsplit('/')
            .next()
            .unwrap_or(&include_path)
            .to_string();
        let line = node.start_position().row as u32 + 1;

        let qualified = format!("{}:{}:{}", self.file(), include_path, line);
        let mut directive =
            self.ctx
                .node(NodeKind::IncludeDirective, name, &qualified, span_of(node));
        directive.set_parent(self.file_id.clone());
        directive.set_prop("includePath", include_path);
        directive.set_prop("isSystemInclude", is_system);

        let directive_id = self.out.push_node(directive);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Includes,
            self.file_id.clone(),
            directive_id,
        ));
    }

    fn extract_macro(&mut self, node: &tree_sitter::Node, function_like: bool) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:{}:{}", self.file(), name, line);
        let mut macro_node =
            self.ctx
                .node(NodeKind::MacroDefinition, name, &qualified, span_of(node));
        macro_node.set_parent(self.file_id.clone());
        if function_like {
            macro_node.set_prop("isFunctionLike", true);
        }
        let macro_id = self.out.push_node(macro_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            self.file_id.clone(),
            macro_id,
        ));
    }

    fn extract_function(&mut self, node: &tree_sitter::Node, _namespace: Option<&str>) {
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        let Some((name, params_node)) = unwrap_function_declarator(declarator, self.source) else {
            return;
        };

        let line = node.start_position().row as u32 + 1;
        let qualified = format!("{}:{}:{}", self.file(), name, line);
        let mut fn_node = self
            .ctx
            .node(NodeKind::CFunction, name, &qualified, span_of(node));
        fn_node.set_parent(self.file_id.clone());
        if let Some(return_type) = field_text(node, "type", self.source) {
            fn_node.set_prop("returnType", return_type);
        }

        let fn_id = self.out.push_node(fn_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DefinesFunction,
            self.file_id.clone(),
            fn_id.clone(),
        ));
        self.extract_parameters(&params_node, &fn_id);
    }

    fn extract_class(
        &mut self,
        node: &tree_sitter::Node,
        namespace: Option<&str>,
        is_struct: bool,
    ) {
        let Some(name) = field_text(node, "name", self.source) else {
            tracing::debug!(file = self.file(), "unnamed class/struct specifier, skipping");
            return;
        };
        let qualified = self.container_qualified(namespace, &name);

        let mut class_node = self
            .ctx
            .node(NodeKind::CppClass, name.clone(), &qualified, span_of(node));
        class_node.set_parent(self.file_id.clone());
        if is_struct {
            class_node.set_prop("isStruct", node.kind() != "union_specifier");
            if node.kind() == "union_specifier" {
                class_node.set_prop("isUnion", true);
            }
        }

        let class_id = class_node.entity_id().clone();

        // Base classes become placeholder EXTENDS edges; Pass 2 flips the
        // flag when the base is in the merged index.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "base_class_clause" {
                let mut base_cursor = child.walk();
                for base in child.children(&mut base_cursor) {
                    if base.kind() == "type_identifier" {
                        let base_name = node_text(&base, self.source);
                        let target = EntityId::new(
                            NodeKind::CppClass.label(),
                            &self.container_qualified(namespace, base_name),
                        );
                        let rel = self
                            .ctx
                            .relationship(RelationshipType::Extends, class_id.clone(), target)
                            .with_placeholder()
                            .with_prop("targetName", base_name);
                        self.out.push_relationship(rel);
                    }
                }
            }
        }

        self.out.push_node(class_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DefinesClass,
            self.file_id.clone(),
            class_id.clone(),
        ));

        if let Some(body) = node.child_by_field_name("body") {
            self.extract_class_members(&body, &name, &class_id);
        }
    }

    fn extract_class_members(
        &mut self,
        body: &tree_sitter::Node,
        class_name: &str,
        class_id: &EntityId,
    ) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                // In-class method definition
                "function_definition" => {
                    if let Some(declarator) = member.child_by_field_name("declarator") {
                        if let Some((name, params)) =
                            unwrap_function_declarator(declarator, self.source)
                        {
                            self.emit_method(&member, class_name, class_id, &name, Some(params), false);
                        }
                    }
                }
                // Field or method declaration without body
                "field_declaration" => {
                    if let Some(declarator) = member.child_by_field_name("declarator") {
                        if let Some((name, params)) =
                            unwrap_function_declarator(declarator, self.source)
                        {
                            self.emit_method(&member, class_name, class_id, &name, Some(params), true);
                            continue;
                        }
                    }
                    self.emit_fields(&member, class_id);
                }
                _ => {}
            }
        }
    }

    fn emit_method(
        &mut self,
        node: &tree_sitter::Node,
        class_name: &str,
        class_id: &EntityId,
        name: &str,
        params: Option<tree_sitter::Node>,
        signature_only: bool,
    ) {
        let qualified = format!("{}:{}.{}", self.file(), class_name, name);
        let mut method = self
            .ctx
            .node(NodeKind::CppMethod, name, &qualified, span_of(node));
        method.set_parent(class_id.clone());
        if signature_only {
            method.set_prop("isSignature", true);
        }
        if let Some(return_type) = field_text(node, "type", self.source) {
            method.set_prop("returnType", return_type);
        }

        let method_id = self.out.push_node(method);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasMethod,
            class_id.clone(),
            method_id.clone(),
        ));
        if let Some(params_node) = params {
            self.extract_parameters(&params_node, &method_id);
        }
    }

    fn emit_fields(&mut self, node: &tree_sitter::Node, class_id: &EntityId) {
        let field_type = field_text(node, "type", self.source);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "field_identifier" {
                let name = node_text(&child, self.source);
                let qualified = format!("{class_id}:{name}");
                let mut field = self
                    .ctx
                    .node(NodeKind::Field, name, &qualified, span_of(&child));
                field.set_parent(class_id.clone());
                if let Some(ref t) = field_type {
                    field.set_prop("type", t.clone());
                }
                let field_id = self.out.push_node(field);
                self.out.push_relationship(self.ctx.relationship(
                    RelationshipType::HasField,
                    class_id.clone(),
                    field_id,
                ));
            }
        }
    }

    fn extract_namespace(&mut self, node: &tree_sitter::Node, outer: Option<&str>) {
        let name = field_text(node, "name", self.source).unwrap_or_default();
        let qualified_ns = match (outer, name.is_empty()) {
            (Some(o), false) => format!("{o}.{name}"),
            (Some(o), true) => o.to_string(),
            (None, false) => name.clone(),
            (None, true) => String::new(),
        };

        if !name.is_empty() {
            let qualified = format!("{}:{}", self.file(), qualified_ns);
            let mut ns_node = self.ctx.node(
                NodeKind::NamespaceDeclaration,
                name.clone(),
                &qualified,
                span_of(node),
            );
            ns_node.set_parent(self.file_id.clone());
            let ns_id = self.out.push_node(ns_node);
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::DeclaresNamespace,
                self.file_id.clone(),
                ns_id,
            ));
        }

        if let Some(body) = node.child_by_field_name("body") {
            let scope = if qualified_ns.is_empty() {
                None
            } else {
                Some(qualified_ns.as_str())
            };
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.visit_toplevel(&child, scope);
            }
        }
    }

    /// The quirk path: the node parsed as a function but the source text says
    /// class/struct. Extract the name from the text, emit the class node, and
    /// leave the members to a future grammar fix.
    fn extract_misparsed_class(
        &mut self,
        node: &tree_sitter::Node,
        namespace: Option<&str>,
        is_struct: bool,
    ) {
        let text = node_text(node, self.source);
        let name = text
            .split_whitespace()
            .nth(1)
            .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
            .unwrap_or("");
        if name.is_empty() {
            tracing::debug!(file = self.file(), "quirk workaround found no class name, skipping");
            return;
        }

        let qualified = self.container_qualified(namespace, name);
        let mut class_node = self
            .ctx
            .node(NodeKind::CppClass, name, &qualified, span_of(node));
        class_node.set_parent(self.file_id.clone());
        class_node.set_prop("isStruct", is_struct);

        let class_id = self.out.push_node(class_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DefinesClass,
            self.file_id.clone(),
            class_id,
        ));
    }

    fn extract_parameters(&mut self, params_node: &tree_sitter::Node, owner: &EntityId) {
        let mut cursor = params_node.walk();
        for child in params_node.children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" => {
                    let param_type = field_text(&child, "type", self.source);
                    let name = child
                        .child_by_field_name("declarator")
                        .and_then(|d| declarator_name(&d, self.source));
                    let Some(name) = name else { continue };

                    let qualified = format!("{owner}:{name}");
                    let mut param =
                        self.ctx
                            .node(NodeKind::Parameter, &name, &qualified, span_of(&child));
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
                "variadic_parameter" => {
                    let qualified = format!("{owner}:...");
                    let mut param =
                        self.ctx
                            .node(NodeKind::Parameter, "...", &qualified, span_of(&child));
                    param.set_parent(owner.clone());
                    let param_id = self.out.push_node(param);
                    self.out.push_relationship(self.ctx.relationship(
                        RelationshipType::HasParameter,
                        owner.clone(),
                        param_id,
                    ));
                }
                _ => {}
            }
        }
    }
}

/// Unwrap pointer/reference declarator layers down to a
/// `function_declarator`, returning the function name and the parameter
/// list node. The name may be qualified (`Circle::area`) for out-of-line
/// method definitions.
fn unwrap_function_declarator<'t>(
    mut node: tree_sitter::Node<'t>,
    source: &str,
) -> Option<(String, tree_sitter::Node<'t>)> {
    loop {
        match node.kind() {
            "function_declarator" => {
                let name_node = node.child_by_field_name("declarator")?;
                let name = node_text(&name_node, source).to_string();
                if name.is_empty() {
                    return None;
                }
                let params = node.child_by_field_name("parameters")?;
                return Some((name, params));
            }
            "pointer_declarator" | "reference_declarator" => {
                node = node.child_by_field_name("declarator")?;
            }
            _ => return None,
        }
    }
}

fn declarator_name(node: &tree_sitter::Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source).to_string()),
        "pointer_declarator" | "reference_declarator" | "array_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            declarator_name(&inner, source)
        }
        _ => {
            let text = node_text(node, source);
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
    }
}
