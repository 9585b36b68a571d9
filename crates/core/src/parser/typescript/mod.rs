//! TypeScript/JavaScript extraction over the shared project.
//!
//! Pass 1 walks each file's tree and emits declarations, imports, JSX
//! structure and Tailwind class usage. Everything that needs another file
//! (import targets, call targets, inheritance, component usage) is Pass 2's
//! job; the qualified-name helpers at the bottom of this module are the
//! contract both passes build entity ids with.

mod project;

pub use project::{TsFile, TsProject};

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::graph::{EntityId, FileParseResult, NodeKind, RelationshipType};
use crate::parser::support::{field_text, is_pascal_case, node_text, span_of, strip_quotes};
use crate::parser::{FileContext, ParseError};

pub struct TypeScriptParser;

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self
    }
}

impl TypeScriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract one file that was previously hydrated into the project.
    pub fn extract_file(
        &self,
        project: &TsProject,
        ctx: &FileContext,
    ) -> Result<FileParseResult, ParseError> {
        let ts_file = project.get(ctx.file_path()).ok_or_else(|| {
            ParseError::ParseFailed(format!("{} is not in the TS project", ctx.file_path()))
        })?;

        let mut extract = Extract::new(ctx, &ts_file.source);
        extract.run(ts_file.tree.root_node());
        Ok(extract.out)
    }

    /// Parse standalone source text (tests, snippets): builds a one-file
    /// project internally.
    pub fn parse_standalone(
        &self,
        source: &str,
        ctx: &FileContext,
        tsx: bool,
    ) -> Result<FileParseResult, ParseError> {
        let mut project = TsProject::new();
        project.add_source(ctx.file_path().to_string(), source.to_string(), tsx)?;
        self.extract_file(&project, ctx)
    }
}

/// Mutable state for one file's extraction.
struct Extract<'a> {
    ctx: &'a FileContext,
    source: &'a str,
    out: FileParseResult,
    file_id: EntityId,
    /// Byte offsets of function-likes already emitted under a proper name,
    /// so the anonymous-callback sweep skips them.
    named_fns: HashSet<usize>,
    /// (start_byte, end_byte, id) of every emitted function-like, tightest
    /// match wins when attaching anonymous callbacks.
    fn_ranges: Vec<(usize, usize, EntityId)>,
    /// (start_byte, end_byte, id) of every emitted Component node.
    components: Vec<(usize, usize, EntityId)>,
    /// Declaration name -> index into `out.nodes`, for `export { a, b }`.
    decl_by_name: HashMap<String, usize>,
    /// Tailwind class token -> node id, cached per file.
    tailwind: HashMap<String, EntityId>,
}

impl<'a> Extract<'a> {
    fn new(ctx: &'a FileContext, source: &'a str) -> Self {
        let line_count = source.lines().count() as u32;
        let file_node = ctx.file_node(line_count);
        let file_id = file_node.entity_id().clone();
        let mut out = FileParseResult::new(ctx.file_path());
        out.push_node(file_node);

        Self {
            ctx,
            source,
            out,
            file_id,
            named_fns: HashSet::new(),
            fn_ranges: Vec::new(),
            components: Vec::new(),
            decl_by_name: HashMap::new(),
            tailwind: HashMap::new(),
        }
    }

    fn run(&mut self, root: tree_sitter::Node) {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.top_level(&child, false, false);
        }
        self.sweep_anonymous(&root);
        self.walk_jsx(&root, None, None);
    }

    fn text(&self, node: &tree_sitter::Node) -> &'a str {
        node_text(node, self.source)
    }

    fn file(&self) -> &str {
        self.ctx.file_path()
    }

    // ── Top-level dispatch ──────────────────────────────────────────────

    fn top_level(&mut self, node: &tree_sitter::Node, exported: bool, is_default: bool) {
        match node.kind() {
            "import_statement" => self.extract_import(node),
            "export_statement" => self.extract_export(node),
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.extract_function(node, &name, exported, is_default, None);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                self.extract_variable_declaration(node, exported, None);
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.extract_class(node, exported, is_default);
            }
            "interface_declaration" => self.extract_interface(node, exported),
            "type_alias_declaration" => self.extract_type_alias(node, exported),
            "enum_declaration" => self.extract_enum(node, exported),
            _ => {}
        }
    }

    fn extract_export(&mut self, node: &tree_sitter::Node) {
        let is_default = has_keyword(node, "default");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function_declaration"
                | "generator_function_declaration"
                | "class_declaration"
                | "abstract_class_declaration"
                | "interface_declaration"
                | "type_alias_declaration"
                | "enum_declaration"
                | "lexical_declaration"
                | "variable_declaration" => {
                    self.top_level(&child, true, is_default);
                }
                // export { a, b } — flag the referenced declarations
                "export_clause" => {
                    let mut spec_cursor = child.walk();
                    for spec in child.children(&mut spec_cursor) {
                        if spec.kind() == "export_specifier" {
                            if let Some(name) = field_text(&spec, "name", self.source) {
                                if let Some(&idx) = self.decl_by_name.get(&name) {
                                    self.out.nodes[idx].set_prop("isExported", true);
                                }
                            }
                        }
                    }
                }
                // export default <expression> (arrow functions land here)
                "arrow_function" | "function_expression" => {
                    self.extract_function(&child, "default", true, true, None);
                }
                _ => {}
            }
        }
    }

    // ── Imports ─────────────────────────────────────────────────────────

    fn extract_import(&mut self, node: &tree_sitter::Node) {
        let Some(raw_source) = field_text(node, "source", self.source) else {
            return;
        };
        let specifier = strip_quotes(&raw_source).to_string();
        let line = node.start_position().row as u32 + 1;

        let mut named: Vec<Value> = Vec::new();
        let mut default_import: Option<String> = None;
        let mut namespace_import: Option<String> = None;
        let is_type_only = node
            .child(1)
            .map(|c| c.kind() == "type")
            .unwrap_or(false);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for clause_child in child.children(&mut clause_cursor) {
                match clause_child.kind() {
                    "identifier" => {
                        default_import = Some(self.text(&clause_child).to_string());
                    }
                    "named_imports" => {
                        let mut inner = clause_child.walk();
                        for spec in clause_child.children(&mut inner) {
                            if spec.kind() == "import_specifier" {
                                if let Some(name) = field_text(&spec, "name", self.source) {
                                    named.push(Value::String(name));
                                }
                            }
                        }
                    }
                    "namespace_import" => {
                        // import * as ns — the identifier is the last child
                        let mut ns_cursor = clause_child.walk();
                        for ns_child in clause_child.children(&mut ns_cursor) {
                            if ns_child.kind() == "identifier" {
                                namespace_import = Some(self.text(&ns_child).to_string());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let qualified = import_qualified(self.file(), &specifier, line);
        let mut import_node = self.ctx.node(
            NodeKind::Import,
            specifier.clone(),
            &qualified,
            span_of(node),
        );
        import_node.set_parent(self.file_id.clone());
        import_node.set_prop("moduleSpecifier", specifier);
        import_node.set_prop("namedImports", Value::Array(named));
        if let Some(default) = default_import {
            import_node.set_prop("defaultImport", default);
        }
        if let Some(namespace) = namespace_import {
            import_node.set_prop("namespaceImport", namespace);
        }
        import_node.set_prop("isTypeOnly", is_type_only);

        let import_id = self.out.push_node(import_node);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Imports,
            self.file_id.clone(),
            import_id,
        ));
    }

    // ── Function-likes ──────────────────────────────────────────────────

    fn extract_function(
        &mut self,
        node: &tree_sitter::Node,
        name: &str,
        exported: bool,
        is_default: bool,
        parent: Option<EntityId>,
    ) {
        let line = node.start_position().row as u32 + 1;
        let qualified = function_qualified(self.file(), name, line);

        let mut fn_node = self
            .ctx
            .node(NodeKind::Function, name, &qualified, span_of(node));
        fn_node.set_parent(parent.clone().unwrap_or_else(|| self.file_id.clone()));
        fn_node.set_prop("isExported", exported);
        if is_default {
            fn_node.set_prop("isDefaultExport", true);
        }
        fn_node.set_prop("isAsync", has_keyword(node, "async"));
        fn_node.set_prop(
            "isGenerator",
            node.kind() == "generator_function_declaration" || has_keyword(node, "*"),
        );
        if let Some(return_type) = return_type_of(node, self.source) {
            fn_node.set_prop("returnType", return_type);
        }
        fn_node.set_prop("complexity", complexity(node));
        if let Some(doc) = doc_comment(node, self.source) {
            fn_node.set_prop("documentation", doc);
        }

        let fn_id = fn_node.entity_id().clone();
        let node_idx = self.out.nodes.len();
        self.out.push_node(fn_node);
        self.decl_by_name.insert(name.to_string(), node_idx);

        let container = parent.unwrap_or_else(|| self.file_id.clone());
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            container,
            fn_id.clone(),
        ));
        if exported {
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::Exports,
                self.file_id.clone(),
                fn_id.clone(),
            ));
        }

        self.extract_parameters(node, &fn_id);
        self.named_fns.insert(node.start_byte());
        self.fn_ranges
            .push((node.start_byte(), node.end_byte(), fn_id.clone()));

        // React component: PascalCase plus JSX evidence or a JSX-ish return
        // type annotation.
        let jsx_typed = return_type_of(node, self.source)
            .map(|t| is_jsx_type(&t))
            .unwrap_or(false);
        if is_pascal_case(name) && (contains_jsx(node) || jsx_typed) {
            self.emit_component(name, node, exported, is_default);
        }

        // Nested named functions keep this function as parent.
        if let Some(body) = node.child_by_field_name("body") {
            self.scan_body(&body, &fn_id);
        }
    }

    /// Named function-likes nested in a body: declarations and
    /// variable-bound arrows.
    fn scan_body(&mut self, body: &tree_sitter::Node, parent_fn: &EntityId) {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "function_declaration" | "generator_function_declaration" => {
                    if let Some(name) = field_text(&child, "name", self.source) {
                        self.extract_function(&child, &name, false, false, Some(parent_fn.clone()));
                    }
                }
                "lexical_declaration" | "variable_declaration" => {
                    self.extract_variable_declaration(&child, false, Some(parent_fn.clone()));
                }
                "statement_block" | "if_statement" | "for_statement" | "for_in_statement"
                | "while_statement" | "do_statement" | "try_statement" | "switch_statement" => {
                    self.scan_body(&child, parent_fn);
                }
                _ => {}
            }
        }
    }

    fn extract_parameters(&mut self, fn_node: &tree_sitter::Node, fn_id: &EntityId) {
        let Some(params) = fn_node.child_by_field_name("parameters") else {
            // Single-parameter arrow without parens: x => …
            if let Some(param) = fn_node.child_by_field_name("parameter") {
                let name = self.text(&param).to_string();
                self.emit_parameter(&param, &name, None, false, fn_id);
            }
            return;
        };

        let mut cursor = params.walk();
        for child in params.children(&mut cursor) {
            match child.kind() {
                "required_parameter" | "optional_parameter" => {
                    let Some(name) = parameter_name(&child, self.source) else {
                        continue;
                    };
                    let param_type = child
                        .child_by_field_name("type")
                        .map(|t| type_annotation_text(&t, self.source));
                    let optional = child.kind() == "optional_parameter";
                    self.emit_parameter(&child, &name, param_type, optional, fn_id);
                }
                "identifier" => {
                    let name = self.text(&child).to_string();
                    self.emit_parameter(&child, &name, None, false, fn_id);
                }
                "assignment_pattern" => {
                    if let Some(left) = child.child_by_field_name("left") {
                        let name = self.text(&left).to_string();
                        self.emit_parameter(&child, &name, None, false, fn_id);
                    }
                }
                "rest_parameter" => {
                    let mut rest_cursor = child.walk();
                    for rest_child in child.children(&mut rest_cursor) {
                        if rest_child.kind() == "identifier" {
                            let name = format!("...{}", self.text(&rest_child));
                            self.emit_parameter(&child, &name, None, false, fn_id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn emit_parameter(
        &mut self,
        node: &tree_sitter::Node,
        name: &str,
        param_type: Option<String>,
        optional: bool,
        fn_id: &EntityId,
    ) {
        let qualified = format!("{fn_id}:{name}");
        let mut param = self
            .ctx
            .node(NodeKind::Parameter, name, &qualified, span_of(node));
        param.set_parent(fn_id.clone());
        if let Some(t) = param_type {
            param.set_prop("type", t);
        }
        if optional {
            param.set_prop("isOptional", true);
        }
        let param_id = self.out.push_node(param);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasParameter,
            fn_id.clone(),
            param_id,
        ));
    }

    // ── Variables ───────────────────────────────────────────────────────

    fn extract_variable_declaration(
        &mut self,
        node: &tree_sitter::Node,
        exported: bool,
        parent: Option<EntityId>,
    ) {
        let is_const = node
            .child(0)
            .map(|c| self.text(&c) == "const")
            .unwrap_or(false);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = field_text(&child, "name", self.source) else {
                continue;
            };
            let value = child.child_by_field_name("value");

            if let Some(value_node) = value {
                if matches!(value_node.kind(), "arrow_function" | "function_expression") {
                    self.extract_function(&value_node, &name, exported, false, parent.clone());
                    continue;
                }
            }

            let line = child.start_position().row as u32 + 1;
            let qualified = variable_qualified(self.file(), &name, line);
            let mut var_node =
                self.ctx
                    .node(NodeKind::Variable, name.clone(), &qualified, span_of(&child));
            var_node.set_parent(parent.clone().unwrap_or_else(|| self.file_id.clone()));
            var_node.set_prop("isConstant", is_const);
            var_node.set_prop("isExported", exported);
            if let Some(var_type) = child
                .child_by_field_name("type")
                .map(|t| type_annotation_text(&t, self.source))
            {
                var_node.set_prop("type", var_type.clone());

                // const App: React.FC = … is a component even without a body
                if is_pascal_case(&name) && is_jsx_type(&var_type) {
                    self.emit_component(&name, &child, exported, false);
                }
            }

            let node_idx = self.out.nodes.len();
            let var_id = self.out.push_node(var_node);
            self.decl_by_name.insert(name, node_idx);
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::Contains,
                parent.clone().unwrap_or_else(|| self.file_id.clone()),
                var_id.clone(),
            ));
            if exported {
                self.out.push_relationship(self.ctx.relationship(
                    RelationshipType::Exports,
                    self.file_id.clone(),
                    var_id,
                ));
            }
        }
    }

    // ── Classes, interfaces, aliases, enums ─────────────────────────────

    fn extract_class(&mut self, node: &tree_sitter::Node, exported: bool, is_default: bool) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = container_qualified(self.file(), &name);

        let (extends, implements) = heritage_of(node, self.source);

        let mut class_node = self
            .ctx
            .node(NodeKind::Class, name.clone(), &qualified, span_of(node));
        class_node.set_parent(self.file_id.clone());
        class_node.set_prop("isExported", exported);
        if is_default {
            class_node.set_prop("isDefaultExport", true);
        }
        if node.kind() == "abstract_class_declaration" {
            class_node.set_prop("isAbstract", true);
        }
        if let Some(base) = extends.clone() {
            class_node.set_prop("extends", base);
        }
        if !implements.is_empty() {
            class_node.set_prop(
                "implements",
                Value::Array(implements.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(doc) = doc_comment(node, self.source) {
            class_node.set_prop("documentation", doc);
        }

        let node_idx = self.out.nodes.len();
        let class_id = self.out.push_node(class_node);
        self.decl_by_name.insert(name.clone(), node_idx);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            self.file_id.clone(),
            class_id.clone(),
        ));
        if exported {
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::Exports,
                self.file_id.clone(),
                class_id.clone(),
            ));
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                if member.kind() == "method_definition" {
                    self.extract_method(&member, &name, &class_id);
                }
            }
        }

        let extends_component = extends
            .map(|base| base.ends_with("Component") || base.starts_with("React."))
            .unwrap_or(false);
        if is_pascal_case(&name) && (contains_jsx(node) || extends_component) {
            self.emit_component(&name, node, exported, is_default);
        }
    }

    fn extract_method(
        &mut self,
        node: &tree_sitter::Node,
        class_name: &str,
        class_id: &EntityId,
    ) {
        let Some(method_name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = method_qualified(self.file(), class_name, &method_name);

        let mut method = self
            .ctx
            .node(NodeKind::Method, method_name, &qualified, span_of(node));
        method.set_parent(class_id.clone());
        method.set_prop("visibility", visibility_of(node, self.source));
        method.set_prop("isStatic", has_keyword(node, "static"));
        method.set_prop("isAsync", has_keyword(node, "async"));
        method.set_prop("complexity", complexity(node));
        if let Some(return_type) = return_type_of(node, self.source) {
            method.set_prop("returnType", return_type);
        }

        let method_id = self.out.push_node(method);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasMethod,
            class_id.clone(),
            method_id.clone(),
        ));

        self.extract_parameters(node, &method_id);
        self.fn_ranges
            .push((node.start_byte(), node.end_byte(), method_id));
    }

    fn extract_interface(&mut self, node: &tree_sitter::Node, exported: bool) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = container_qualified(self.file(), &name);

        let mut iface = self
            .ctx
            .node(NodeKind::Interface, name.clone(), &qualified, span_of(node));
        iface.set_parent(self.file_id.clone());
        iface.set_prop("isExported", exported);
        if let Some(doc) = doc_comment(node, self.source) {
            iface.set_prop("documentation", doc);
        }

        let node_idx = self.out.nodes.len();
        let iface_id = self.out.push_node(iface);
        self.decl_by_name.insert(name.clone(), node_idx);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            self.file_id.clone(),
            iface_id.clone(),
        ));

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                if member.kind() == "method_signature" {
                    if let Some(sig_name) = field_text(&member, "name", self.source) {
                        let sig_qualified = method_qualified(self.file(), &name, &sig_name);
                        let mut sig = self.ctx.node(
                            NodeKind::Method,
                            sig_name,
                            &sig_qualified,
                            span_of(&member),
                        );
                        sig.set_parent(iface_id.clone());
                        sig.set_prop("isSignature", true);
                        if let Some(return_type) = return_type_of(&member, self.source) {
                            sig.set_prop("returnType", return_type);
                        }
                        let sig_id = self.out.push_node(sig);
                        self.out.push_relationship(self.ctx.relationship(
                            RelationshipType::HasMethod,
                            iface_id.clone(),
                            sig_id,
                        ));
                    }
                }
            }
        }
    }

    fn extract_type_alias(&mut self, node: &tree_sitter::Node, exported: bool) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = container_qualified(self.file(), &name);
        let mut alias = self
            .ctx
            .node(NodeKind::TypeAlias, name.clone(), &qualified, span_of(node));
        alias.set_parent(self.file_id.clone());
        alias.set_prop("isExported", exported);
        if let Some(value) = field_text(node, "value", self.source) {
            alias.set_prop("type", value);
        }

        let node_idx = self.out.nodes.len();
        let alias_id = self.out.push_node(alias);
        self.decl_by_name.insert(name, node_idx);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            self.file_id.clone(),
            alias_id,
        ));
    }

    fn extract_enum(&mut self, node: &tree_sitter::Node, exported: bool) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = container_qualified(self.file(), &name);
        let mut enum_node = self
            .ctx
            .node(NodeKind::TypeAlias, name.clone(), &qualified, span_of(node));
        enum_node.set_parent(self.file_id.clone());
        enum_node.set_prop("isEnum", true);
        enum_node.set_prop("isExported", exported);

        let node_idx = self.out.nodes.len();
        let enum_id = self.out.push_node(enum_node);
        self.decl_by_name.insert(name, node_idx);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::Contains,
            self.file_id.clone(),
            enum_id,
        ));
    }

    fn emit_component(
        &mut self,
        name: &str,
        node: &tree_sitter::Node,
        exported: bool,
        is_default: bool,
    ) {
        let qualified = container_qualified(self.file(), name);
        let mut component = self
            .ctx
            .node(NodeKind::Component, name, &qualified, span_of(node));
        component.set_parent(self.file_id.clone());
        component.set_prop("isExported", exported);
        if is_default {
            component.set_prop("isDefaultExport", true);
        }
        let component_id = self.out.push_node(component);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::DefinesComponent,
            self.file_id.clone(),
            component_id.clone(),
        ));
        self.components
            .push((node.start_byte(), node.end_byte(), component_id));
    }

    // ── Anonymous callbacks ─────────────────────────────────────────────

    /// Function expressions and arrows that were not bound to a name get a
    /// synthetic one: `callback_<callee>_arg<N>` when passed as a call
    /// argument, `anonymousLambda` otherwise.
    fn sweep_anonymous(&mut self, root: &tree_sitter::Node) {
        let mut stack = vec![*root];
        while let Some(node) = stack.pop() {
            if matches!(node.kind(), "arrow_function" | "function_expression")
                && !self.named_fns.contains(&node.start_byte())
            {
                let name = synthetic_callback_name(&node, self.source);
                let line = node.start_position().row as u32 + 1;
                let qualified = function_qualified(self.file(), &name, line);

                let mut fn_node =
                    self.ctx
                        .node(NodeKind::Function, name.clone(), &qualified, span_of(&node));
                let parent = self
                    .enclosing_fn(node.start_byte(), node.end_byte())
                    .unwrap_or_else(|| self.file_id.clone());
                fn_node.set_parent(parent.clone());
                fn_node.set_prop("isAsync", has_keyword(&node, "async"));
                fn_node.set_prop("complexity", complexity(&node));

                let fn_id = self.out.push_node(fn_node);
                self.out.push_relationship(self.ctx.relationship(
                    RelationshipType::Contains,
                    parent,
                    fn_id.clone(),
                ));
                self.extract_parameters(&node, &fn_id);
                self.fn_ranges
                    .push((node.start_byte(), node.end_byte(), fn_id));
            }

            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }

    /// Tightest already-emitted function-like strictly containing the range.
    fn enclosing_fn(&self, start: usize, end: usize) -> Option<EntityId> {
        self.fn_ranges
            .iter()
            .filter(|(s, e, _)| *s < start && *e >= end)
            .min_by_key(|(s, e, _)| e - s)
            .map(|(_, _, id)| id.clone())
    }

    fn enclosing_component(&self, start: usize, end: usize) -> Option<EntityId> {
        self.components
            .iter()
            .filter(|(s, e, _)| *s <= start && *e >= end)
            .min_by_key(|(s, e, _)| e - s)
            .map(|(_, _, id)| id.clone())
    }

    // ── JSX ─────────────────────────────────────────────────────────────

    fn walk_jsx(
        &mut self,
        node: &tree_sitter::Node,
        current_component: Option<EntityId>,
        current_element: Option<EntityId>,
    ) {
        let mut component = current_component;
        let mut element = current_element;

        match node.kind() {
            "jsx_element" => {
                if let Some(opening) = node.child(0).filter(|c| c.kind() == "jsx_opening_element")
                {
                    if let Some(id) = self.emit_jsx_element(node, &opening, &component, &element) {
                        element = Some(id);
                    }
                }
            }
            "jsx_self_closing_element" => {
                if let Some(id) = self.emit_jsx_element(node, node, &component, &element) {
                    element = Some(id);
                }
            }
            "arrow_function" | "function_expression" | "function_declaration"
            | "generator_function_declaration" | "method_definition" | "class_declaration"
            | "abstract_class_declaration" => {
                if let Some(id) = self.enclosing_component(node.start_byte(), node.end_byte()) {
                    component = Some(id);
                    element = None;
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_jsx(&child, component.clone(), element.clone());
        }
    }

    /// Emit a JSXElement node plus its attributes; returns the element id.
    /// `tag_holder` is the node carrying the `name` field and attribute
    /// children (the opening element, or the element itself when
    /// self-closing).
    fn emit_jsx_element(
        &mut self,
        node: &tree_sitter::Node,
        tag_holder: &tree_sitter::Node,
        component: &Option<EntityId>,
        parent_element: &Option<EntityId>,
    ) -> Option<EntityId> {
        let tag = field_text(tag_holder, "name", self.source)?;
        let line = node.start_position().row as u32 + 1;
        let column = node.start_position().column as u32;
        let qualified = jsx_qualified(self.file(), &tag, line, column);

        let mut element = self
            .ctx
            .node(NodeKind::JsxElement, tag.clone(), &qualified, span_of(node));
        element.set_prop("tagName", tag.clone());
        element.set_prop("isComponentTag", is_pascal_case(&tag));
        if let Some(parent) = parent_element.as_ref().or(component.as_ref()) {
            element.set_parent(parent.clone());
        }

        let element_id = self.out.push_node(element);

        if let Some(renderer) = parent_element.as_ref().or(component.as_ref()) {
            self.out.push_relationship(self.ctx.relationship(
                RelationshipType::RendersElement,
                renderer.clone(),
                element_id.clone(),
            ));
        }

        let mut cursor = tag_holder.walk();
        for child in tag_holder.children(&mut cursor) {
            if child.kind() == "jsx_attribute" {
                self.emit_jsx_attribute(&child, &qualified, &element_id);
            }
        }

        Some(element_id)
    }

    fn emit_jsx_attribute(
        &mut self,
        node: &tree_sitter::Node,
        element_qualified: &str,
        element_id: &EntityId,
    ) {
        let Some(name_node) = node.child(0) else {
            return;
        };
        let attr_name = self.text(&name_node).to_string();
        let value = node
            .child(2)
            .map(|v| strip_quotes(node_text(&v, self.source)).to_string());

        let qualified = format!("{element_qualified}:{attr_name}");
        let mut attr =
            self.ctx
                .node(NodeKind::JsxAttribute, attr_name.clone(), &qualified, span_of(node));
        attr.set_parent(element_id.clone());
        if let Some(ref v) = value {
            attr.set_prop("value", v.clone());
        }
        let attr_id = self.out.push_node(attr);
        self.out.push_relationship(self.ctx.relationship(
            RelationshipType::HasProp,
            element_id.clone(),
            attr_id,
        ));

        // className="px-2 text-sm" → one TailwindClass node per token
        if matches!(attr_name.as_str(), "className" | "class") {
            if let Some(classes) = value {
                for token in classes.split_whitespace() {
                    let class_id = match self.tailwind.get(token) {
                        Some(id) => id.clone(),
                        None => {
                            let class_node = self.ctx.node(
                                NodeKind::TailwindClass,
                                token,
                                token,
                                span_of(node),
                            );
                            let id = self.out.push_node(class_node);
                            self.tailwind.insert(token.to_string(), id.clone());
                            id
                        }
                    };
                    self.out.push_relationship(self.ctx.relationship(
                        RelationshipType::UsesTailwindClass,
                        element_id.clone(),
                        class_id,
                    ));
                }
            }
        }
    }
}

// ── Qualified-name rules shared with the resolver ───────────────────────

pub(crate) fn function_qualified(file: &str, name: &str, line: u32) -> String {
    format!("{file}:{name}:{line}")
}

pub(crate) fn method_qualified(file: &str, parent: &str, name: &str) -> String {
    format!("{file}:{parent}.{name}")
}

pub(crate) fn container_qualified(file: &str, name: &str) -> String {
    format!("{file}:{name}")
}

pub(crate) fn variable_qualified(file: &str, name: &str, line: u32) -> String {
    format!("{file}:{name}:{line}")
}

pub(crate) fn import_qualified(file: &str, specifier: &str, line: u32) -> String {
    format!("{file}:{specifier}:{line}")
}

pub(crate) fn jsx_qualified(file: &str, tag: &str, line: u32, column: u32) -> String {
    format!("{file}:{tag}:{line}:{column}")
}

// ── Syntax helpers shared with the resolver ─────────────────────────────

/// Whether the node has a direct child token of the given kind
/// (`async`, `static`, `default`, `*`).
pub(crate) fn has_keyword(node: &tree_sitter::Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == keyword);
    found
}

/// Cyclomatic complexity: 1 plus one per decision point.
pub(crate) fn complexity(node: &tree_sitter::Node) -> u32 {
    let mut count = 1u32;
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        match current.kind() {
            "if_statement" | "for_statement" | "for_in_statement" | "while_statement"
            | "do_statement" | "switch_case" | "catch_clause" | "ternary_expression" => {
                count += 1;
            }
            "binary_expression" => {
                if let Some(op) = current.child_by_field_name("operator") {
                    if matches!(op.kind(), "&&" | "||" | "??") {
                        count += 1;
                    }
                }
            }
            _ => {}
        }
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            stack.push(child);
        }
    }
    count
}

/// Whether any descendant is a JSX element.
pub(crate) fn contains_jsx(node: &tree_sitter::Node) -> bool {
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if matches!(current.kind(), "jsx_element" | "jsx_self_closing_element") {
            return true;
        }
        let mut cursor = current.walk();
        for child in current.children(&mut cursor) {
            stack.push(child);
        }
    }
    false
}

/// A return-type annotation that marks a function as a React component.
pub(crate) fn is_jsx_type(annotation: &str) -> bool {
    annotation.contains("JSX.Element")
        || annotation.contains("ReactElement")
        || annotation.contains("React.FC")
        || annotation.contains("FC<")
        || annotation.contains("ReactNode")
}

/// Return type text with the annotation colon stripped.
pub(crate) fn return_type_of(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let annotation = node.child_by_field_name("return_type")?;
    Some(type_annotation_text(&annotation, source))
}

fn type_annotation_text(annotation: &tree_sitter::Node, source: &str) -> String {
    // type_annotation wraps ": " plus the actual type; take the last child
    if annotation.kind() == "type_annotation" && annotation.child_count() > 0 {
        if let Some(inner) = annotation.child(annotation.child_count() - 1) {
            return node_text(&inner, source).to_string();
        }
    }
    node_text(annotation, source)
        .trim_start_matches(':')
        .trim()
        .to_string()
}

fn parameter_name(node: &tree_sitter::Node, source: &str) -> Option<String> {
    if let Some(pattern) = node.child_by_field_name("pattern") {
        return Some(node_text(&pattern, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return Some(node_text(&child, source).to_string());
        }
    }
    None
}

fn visibility_of(node: &tree_sitter::Node, source: &str) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "accessibility_modifier" {
            return node_text(&child, source).to_string();
        }
    }
    "public".to_string()
}

/// Base class and implemented interfaces from a class heritage clause.
pub(crate) fn heritage_of(
    node: &tree_sitter::Node,
    source: &str,
) -> (Option<String>, Vec<String>) {
    let mut extends = None;
    let mut implements = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "class_heritage" {
            continue;
        }
        let mut heritage_cursor = child.walk();
        for clause in child.children(&mut heritage_cursor) {
            match clause.kind() {
                "extends_clause" => {
                    if let Some(value) = clause.child_by_field_name("value") {
                        extends = Some(node_text(&value, source).to_string());
                    } else {
                        let mut inner = clause.walk();
                        for c in clause.children(&mut inner) {
                            if matches!(c.kind(), "identifier" | "member_expression") {
                                extends = Some(node_text(&c, source).to_string());
                            }
                        }
                    }
                }
                "implements_clause" => {
                    let mut inner = clause.walk();
                    for c in clause.children(&mut inner) {
                        if matches!(c.kind(), "type_identifier" | "generic_type") {
                            implements.push(node_text(&c, source).to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    (extends, implements)
}

/// JSDoc block immediately preceding the node, if any.
fn doc_comment(node: &tree_sitter::Node, source: &str) -> Option<String> {
    let prev = node.prev_sibling()?;
    if prev.kind() == "comment" {
        let text = node_text(&prev, source);
        if text.starts_with("/**") {
            return Some(text.to_string());
        }
    }
    None
}

/// Name for a function-like that has no binding of its own.
fn synthetic_callback_name(node: &tree_sitter::Node, source: &str) -> String {
    if let Some(arguments) = node.parent() {
        if arguments.kind() == "arguments" {
            if let Some(call) = arguments.parent() {
                if call.kind() == "call_expression" {
                    let callee = call
                        .child_by_field_name("function")
                        .map(|f| node_text(&f, source).to_string())
                        .unwrap_or_else(|| "call".to_string());
                    let mut index = 0usize;
                    let mut cursor = arguments.walk();
                    for (position, arg) in arguments.named_children(&mut cursor).enumerate() {
                        if arg.id() == node.id() {
                            index = position;
                            break;
                        }
                    }
                    return format!("callback_{callee}_arg{index}");
                }
            }
        }
    }
    "anonymousLambda".to_string()
}
