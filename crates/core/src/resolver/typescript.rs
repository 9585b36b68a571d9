//! TypeScript/JavaScript cross-file resolution.
//!
//! Works against the shared [`TsProject`] kept alive from Pass 1 and the
//! merged node index. For each file: resolve module specifiers into
//! file-to-file `IMPORTS` edges and per-symbol `RESOLVES_IMPORT` edges,
//! resolve inheritance clauses, scan function bodies for calls, assignments
//! and try/catch, and connect JSX component usage. Entity ids are rebuilt
//! with the same qualified-name rules Pass 1 used, which is what makes the
//! index lookups land.

use std::collections::HashMap;

use crate::graph::{
    EdgePatch, EntityId, Node, NodeIndex, NodeKind, Relationship, RelationshipType,
};
use crate::parser::support::{field_text, is_pascal_case, node_text, strip_quotes};
use crate::parser::typescript::{
    container_qualified, function_qualified, heritage_of, import_qualified, method_qualified,
    TsProject,
};

/// Export lookup order when resolving a named import; first hit wins.
const EXPORT_KINDS: &[NodeKind] = &[
    NodeKind::Function,
    NodeKind::Class,
    NodeKind::Interface,
    NodeKind::Variable,
    NodeKind::TypeAlias,
    NodeKind::Component,
];

pub fn resolve(index: &NodeIndex<'_>, project: &TsProject) -> EdgePatch {
    let mut patch = EdgePatch::default();

    for (path, file) in project.files() {
        let Some(file_node) = index.file(path) else {
            tracing::warn!(file = path, "TS file has no file node in the index, skipping");
            continue;
        };

        let mut resolver = FileResolver {
            index,
            project,
            path,
            source: &file.source,
            file_id: file_node.entity_id().clone(),
            imports: HashMap::new(),
            locals: HashMap::new(),
            patch: EdgePatch::default(),
        };

        let root = file.tree.root_node();
        resolver.collect_locals(&root);
        resolver.resolve_imports(&root);
        resolver.resolve_inheritance(&root);
        resolver.scan_bodies(&root, None, None);
        resolver.resolve_component_usage(&root, None);

        patch.merge(resolver.patch);
    }

    patch
}

/// What a local binding name refers to after the import clause.
#[derive(Debug, Clone)]
struct ImportBinding {
    specifier: String,
    resolved_file: Option<String>,
    /// Exported name in the target module (differs from the binding for
    /// aliased imports).
    imported_name: String,
    shape: ImportShape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ImportShape {
    Named,
    Default,
    Namespace,
}

/// A declaration seen at the top level of this file.
#[derive(Debug, Clone, Copy)]
struct LocalDecl {
    kind: NodeKind,
    line: u32,
}

struct FileResolver<'g, 'p> {
    index: &'p NodeIndex<'g>,
    project: &'p TsProject,
    path: &'p str,
    source: &'p str,
    file_id: EntityId,
    imports: HashMap<String, ImportBinding>,
    locals: HashMap<String, LocalDecl>,
    patch: EdgePatch,
}

impl<'g, 'p> FileResolver<'g, 'p> {
    // ── Local declaration table ─────────────────────────────────────────

    fn collect_locals(&mut self, root: &tree_sitter::Node) {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.collect_decl(&child);
        }
    }

    fn collect_decl(&mut self, node: &tree_sitter::Node) {
        match node.kind() {
            "export_statement" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.collect_decl(&child);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.locals.insert(
                        name,
                        LocalDecl {
                            kind: NodeKind::Function,
                            line: node.start_position().row as u32 + 1,
                        },
                    );
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.locals.insert(
                        name,
                        LocalDecl {
                            kind: NodeKind::Class,
                            line: node.start_position().row as u32 + 1,
                        },
                    );
                }
            }
            "interface_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.locals.insert(
                        name,
                        LocalDecl {
                            kind: NodeKind::Interface,
                            line: node.start_position().row as u32 + 1,
                        },
                    );
                }
            }
            "type_alias_declaration" | "enum_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    self.locals.insert(
                        name,
                        LocalDecl {
                            kind: NodeKind::TypeAlias,
                            line: node.start_position().row as u32 + 1,
                        },
                    );
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name) = field_text(&child, "name", self.source) else {
                        continue;
                    };
                    let value = child.child_by_field_name("value");
                    let is_fn = value
                        .map(|v| matches!(v.kind(), "arrow_function" | "function_expression"))
                        .unwrap_or(false);
                    if is_fn {
                        let line = value.map(|v| v.start_position().row as u32 + 1).unwrap_or(1);
                        self.locals.insert(
                            name,
                            LocalDecl {
                                kind: NodeKind::Function,
                                line,
                            },
                        );
                    } else {
                        self.locals.insert(
                            name,
                            LocalDecl {
                                kind: NodeKind::Variable,
                                line: child.start_position().row as u32 + 1,
                            },
                        );
                    }
                }
            }
            _ => {}
        }
    }

    /// Entity id of a top-level declaration in this file.
    fn local_id(&self, name: &str, decl: LocalDecl) -> EntityId {
        match decl.kind {
            NodeKind::Function => EntityId::new(
                NodeKind::Function.label(),
                &function_qualified(self.path, name, decl.line),
            ),
            NodeKind::Variable => EntityId::new(
                NodeKind::Variable.label(),
                &format!("{}:{}:{}", self.path, name, decl.line),
            ),
            kind => EntityId::new(kind.label(), &container_qualified(self.path, name)),
        }
    }

    // ── Module resolution ───────────────────────────────────────────────

    fn resolve_imports(&mut self, root: &tree_sitter::Node) {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "import_statement" {
                self.resolve_import_statement(&child);
            }
        }
    }

    fn resolve_import_statement(&mut self, node: &tree_sitter::Node) {
        let Some(raw) = field_text(node, "source", self.source) else {
            return;
        };
        let specifier = strip_quotes(&raw).to_string();
        let line = node.start_position().row as u32 + 1;
        let resolved = self.project.resolve_specifier(&specifier, self.path);

        // File —IMPORTS→ File, placeholder when the module is outside the
        // analyzed set.
        let target_file_node = resolved.as_deref().and_then(|p| self.index.file(p));
        let mut file_edge = match target_file_node {
            Some(target) => Relationship::new(
                RelationshipType::Imports,
                self.file_id.clone(),
                target.entity_id().clone(),
            ),
            None => Relationship::new(
                RelationshipType::Imports,
                self.file_id.clone(),
                EntityId::new(NodeKind::File.label(), &specifier),
            )
            .with_placeholder(),
        };
        file_edge.set_prop("moduleSpecifier", specifier.clone());
        file_edge.set_prop("isCrossFile", true);
        self.patch.add.push(file_edge);

        // Pass 1's Import node for the same declaration.
        let import_id = EntityId::new(
            NodeKind::Import.label(),
            &import_qualified(self.path, &specifier, line),
        );
        if !self.index.contains(&import_id) {
            tracing::debug!(
                file = self.path,
                specifier = %specifier,
                "no Pass 1 import node found for import statement"
            );
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for clause_child in child.children(&mut clause_cursor) {
                match clause_child.kind() {
                    "identifier" => {
                        let binding = node_text(&clause_child, self.source).to_string();
                        self.register_default_import(&binding, &specifier, &resolved, &import_id);
                    }
                    "named_imports" => {
                        let mut inner = clause_child.walk();
                        for spec in clause_child.children(&mut inner) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name) = field_text(&spec, "name", self.source) else {
                                continue;
                            };
                            let binding =
                                field_text(&spec, "alias", self.source).unwrap_or_else(|| name.clone());
                            self.register_named_import(
                                &binding, &name, &specifier, &resolved, &import_id,
                            );
                        }
                    }
                    "namespace_import" => {
                        let mut ns_cursor = clause_child.walk();
                        for ns_child in clause_child.children(&mut ns_cursor) {
                            if ns_child.kind() == "identifier" {
                                let binding = node_text(&ns_child, self.source).to_string();
                                self.register_namespace_import(
                                    &binding, &specifier, &resolved, &import_id,
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn register_named_import(
        &mut self,
        binding: &str,
        name: &str,
        specifier: &str,
        resolved: &Option<String>,
        import_id: &EntityId,
    ) {
        self.imports.insert(
            binding.to_string(),
            ImportBinding {
                specifier: specifier.to_string(),
                resolved_file: resolved.clone(),
                imported_name: name.to_string(),
                shape: ImportShape::Named,
            },
        );

        if let Some(target_file) = resolved {
            if let Some(target) = self.find_export(target_file, name) {
                self.patch.add.push(
                    Relationship::new(
                        RelationshipType::ResolvesImport,
                        import_id.clone(),
                        target.entity_id().clone(),
                    )
                    .with_prop("importedName", name),
                );
            }
        }
    }

    fn register_default_import(
        &mut self,
        binding: &str,
        specifier: &str,
        resolved: &Option<String>,
        import_id: &EntityId,
    ) {
        self.imports.insert(
            binding.to_string(),
            ImportBinding {
                specifier: specifier.to_string(),
                resolved_file: resolved.clone(),
                imported_name: "default".to_string(),
                shape: ImportShape::Default,
            },
        );

        if let Some(target_file) = resolved {
            let target = self
                .index
                .in_file(target_file)
                .iter()
                .find(|n| EXPORT_KINDS.contains(&n.kind()) && n.bool_prop("isDefaultExport"))
                .copied();
            if let Some(target) = target {
                self.patch.add.push(
                    Relationship::new(
                        RelationshipType::ResolvesImport,
                        import_id.clone(),
                        target.entity_id().clone(),
                    )
                    .with_prop("importedName", "default"),
                );
            }
        }
    }

    fn register_namespace_import(
        &mut self,
        binding: &str,
        specifier: &str,
        resolved: &Option<String>,
        import_id: &EntityId,
    ) {
        self.imports.insert(
            binding.to_string(),
            ImportBinding {
                specifier: specifier.to_string(),
                resolved_file: resolved.clone(),
                imported_name: "*".to_string(),
                shape: ImportShape::Namespace,
            },
        );

        if let Some(target_file) = resolved {
            if let Some(file_node) = self.index.file(target_file) {
                self.patch.add.push(
                    Relationship::new(
                        RelationshipType::ResolvesImport,
                        import_id.clone(),
                        file_node.entity_id().clone(),
                    )
                    .with_prop("importedName", "*"),
                );
            }
        }
    }

    /// Exported declaration of the given name in a file, trying kinds in
    /// fixed order. Only exported declarations count.
    fn find_export(&self, file: &str, name: &str) -> Option<&'g Node> {
        for kind in EXPORT_KINDS {
            if let Some(node) = self.index.named_in_file(*kind, name, file) {
                if node.bool_prop("isExported") || node.bool_prop("isDefaultExport") {
                    return Some(node);
                }
            }
        }
        None
    }

    // ── Inheritance ─────────────────────────────────────────────────────

    fn resolve_inheritance(&mut self, root: &tree_sitter::Node) {
        let mut stack = vec![*root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "class_declaration" | "abstract_class_declaration" => {
                    if let Some(name) = field_text(&node, "name", self.source) {
                        let source_id = EntityId::new(
                            NodeKind::Class.label(),
                            &container_qualified(self.path, &name),
                        );
                        let (extends, implements) = heritage_of(&node, self.source);
                        if let Some(base) = extends {
                            self.push_type_edge(
                                RelationshipType::Extends,
                                &source_id,
                                &base,
                                NodeKind::Class,
                            );
                        }
                        for iface in implements {
                            self.push_type_edge(
                                RelationshipType::Implements,
                                &source_id,
                                &iface,
                                NodeKind::Interface,
                            );
                        }
                    }
                }
                "interface_declaration" => {
                    if let Some(name) = field_text(&node, "name", self.source) {
                        let source_id = EntityId::new(
                            NodeKind::Interface.label(),
                            &container_qualified(self.path, &name),
                        );
                        let mut cursor = node.walk();
                        for child in node.children(&mut cursor) {
                            if child.kind() == "extends_type_clause" {
                                let mut inner = child.walk();
                                for base in child.children(&mut inner) {
                                    if matches!(
                                        base.kind(),
                                        "type_identifier" | "generic_type" | "identifier"
                                    ) {
                                        let base_name =
                                            node_text(&base, self.source).to_string();
                                        self.push_type_edge(
                                            RelationshipType::Extends,
                                            &source_id,
                                            &base_name,
                                            NodeKind::Interface,
                                        );
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }

            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
    }

    /// Resolve a type name to a declaration and emit an inheritance edge;
    /// falls back to a placeholder built from the current file's qualified
    /// name rules.
    fn push_type_edge(
        &mut self,
        rel_type: RelationshipType,
        source_id: &EntityId,
        type_name: &str,
        fallback_kind: NodeKind,
    ) {
        let bare = type_name.split('<').next().unwrap_or(type_name).trim();

        // Same-file declaration
        if let Some(decl) = self.locals.get(bare).copied() {
            if matches!(
                decl.kind,
                NodeKind::Class | NodeKind::Interface | NodeKind::TypeAlias
            ) {
                let target = self.local_id(bare, decl);
                self.patch
                    .add
                    .push(Relationship::new(rel_type, source_id.clone(), target));
                return;
            }
        }

        // Imported declaration
        if let Some(binding) = self.imports.get(bare).cloned() {
            if let Some(target_file) = &binding.resolved_file {
                if let Some(target) = self.find_export(target_file, &binding.imported_name) {
                    self.patch.add.push(
                        Relationship::new(rel_type, source_id.clone(), target.entity_id().clone())
                            .with_prop("isCrossFile", true),
                    );
                    return;
                }
            }
        }

        let target = EntityId::new(
            fallback_kind.label(),
            &container_qualified(self.path, bare),
        );
        self.patch.add.push(
            Relationship::new(rel_type, source_id.clone(), target)
                .with_placeholder()
                .with_prop("targetName", bare),
        );
    }

    // ── Calls, mutations, error handling ────────────────────────────────

    fn scan_bodies(
        &mut self,
        node: &tree_sitter::Node,
        enclosing: Option<&EntityId>,
        class_name: Option<&str>,
    ) {
        let owned_id;
        let mut next_enclosing = enclosing;
        let mut next_class = class_name;
        let owned_class;

        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    let line = node.start_position().row as u32 + 1;
                    owned_id = EntityId::new(
                        NodeKind::Function.label(),
                        &function_qualified(self.path, &name, line),
                    );
                    next_enclosing = Some(&owned_id);
                }
            }
            "method_definition" => {
                if let (Some(class), Some(name)) =
                    (class_name, field_text(node, "name", self.source))
                {
                    owned_id = EntityId::new(
                        NodeKind::Method.label(),
                        &method_qualified(self.path, class, &name),
                    );
                    next_enclosing = Some(&owned_id);
                }
            }
            "arrow_function" | "function_expression" => {
                let line = node.start_position().row as u32 + 1;
                let name = self.function_like_name(node);
                owned_id = EntityId::new(
                    NodeKind::Function.label(),
                    &function_qualified(self.path, &name, line),
                );
                next_enclosing = Some(&owned_id);
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    owned_class = name;
                    next_class = Some(owned_class.as_str());
                    // Walk children with the class context, then stop: the
                    // recursion below would otherwise shadow it.
                    let mut cursor = node.walk();
                    for child in node.children(&mut cursor) {
                        self.scan_bodies(&child, next_enclosing, next_class);
                    }
                    return;
                }
            }
            "call_expression" => {
                if let Some(enclosing_id) = enclosing {
                    self.resolve_call(node, enclosing_id);
                }
            }
            "assignment_expression" => {
                if let Some(enclosing_id) = enclosing {
                    self.resolve_assignment(node, enclosing_id);
                }
            }
            "catch_clause" => {
                if let Some(enclosing_id) = enclosing {
                    self.resolve_catch(node, enclosing_id);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.scan_bodies(&child, next_enclosing, next_class);
        }
    }

    /// The same naming Pass 1 used for this function-like: the variable
    /// name when bound to a declarator, a synthetic callback name otherwise.
    fn function_like_name(&self, node: &tree_sitter::Node) -> String {
        if let Some(parent) = node.parent() {
            if parent.kind() == "variable_declarator" {
                if let Some(name) = field_text(&parent, "name", self.source) {
                    return name;
                }
            }
            if parent.kind() == "arguments" {
                if let Some(call) = parent.parent() {
                    if call.kind() == "call_expression" {
                        let callee = call
                            .child_by_field_name("function")
                            .map(|f| node_text(&f, self.source).to_string())
                            .unwrap_or_else(|| "call".to_string());
                        let mut index = 0usize;
                        let mut cursor = parent.walk();
                        for (position, arg) in parent.named_children(&mut cursor).enumerate() {
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

    fn resolve_call(&mut self, call: &tree_sitter::Node, enclosing: &EntityId) {
        let Some(callee) = call.child_by_field_name("function") else {
            return;
        };
        let line = call.start_position().row as u32 + 1;
        let column = call.start_position().column as u32;

        let resolved: Option<(EntityId, bool)> = match callee.kind() {
            "identifier" => {
                let name = node_text(&callee, self.source);
                self.resolve_callable(name)
            }
            "member_expression" => {
                let object = callee
                    .child_by_field_name("object")
                    .map(|o| node_text(&o, self.source).to_string());
                let property = callee
                    .child_by_field_name("property")
                    .map(|p| node_text(&p, self.source).to_string());
                match (object, property) {
                    (Some(object), Some(property)) => {
                        self.resolve_member_callable(&object, &property)
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        let Some((target, cross_file)) = resolved else {
            return;
        };

        let mut rel = Relationship::at_line(
            RelationshipType::Calls,
            enclosing.clone(),
            target.clone(),
            line,
        );
        rel.set_prop("callSiteLine", line);
        rel.set_prop("callSiteColumn", column);
        rel.set_prop("isCrossFile", cross_file);
        rel.set_prop(
            "isAwaited",
            call.parent().map(|p| p.kind() == "await_expression").unwrap_or(false),
        );
        rel.set_prop("isConditional", is_conditional(call));
        if !self.index.contains(&target) {
            rel.set_placeholder(true);
        } else {
            rel.set_prop("isPlaceholder", false);
        }
        self.patch.add.push(rel);
    }

    /// Resolve a bare identifier callee: local function first, then an
    /// imported symbol, then a placeholder for imported-but-unresolved
    /// names. Unknown bare identifiers (builtins, globals) are skipped.
    fn resolve_callable(&mut self, name: &str) -> Option<(EntityId, bool)> {
        if let Some(decl) = self.locals.get(name).copied() {
            if matches!(decl.kind, NodeKind::Function | NodeKind::Class) {
                return Some((self.local_id(name, decl), false));
            }
        }

        let binding = self.imports.get(name).cloned()?;
        if let Some(target_file) = &binding.resolved_file {
            if let Some(target) = self.find_export(target_file, &binding.imported_name) {
                return Some((target.entity_id().clone(), true));
            }
            // Module resolved but the symbol is missing: well-formed
            // placeholder id in the target file.
            let target = EntityId::new(
                NodeKind::Function.label(),
                &container_qualified(target_file, &binding.imported_name),
            );
            return Some((target, true));
        }
        // External module: placeholder id from the specifier.
        let target = EntityId::new(
            NodeKind::Function.label(),
            &container_qualified(&binding.specifier, &binding.imported_name),
        );
        Some((target, true))
    }

    /// `object.property(…)`: namespace imports and static calls on local or
    /// imported classes.
    fn resolve_member_callable(&mut self, object: &str, property: &str) -> Option<(EntityId, bool)> {
        if let Some(binding) = self.imports.get(object).cloned() {
            if binding.shape == ImportShape::Namespace {
                if let Some(target_file) = &binding.resolved_file {
                    if let Some(target) = self.find_export(target_file, property) {
                        return Some((target.entity_id().clone(), true));
                    }
                    let target = EntityId::new(
                        NodeKind::Function.label(),
                        &container_qualified(target_file, property),
                    );
                    return Some((target, true));
                }
                return None;
            }
            // Static method on an imported class
            if let Some(target_file) = &binding.resolved_file {
                if self.find_export(target_file, &binding.imported_name).is_some() {
                    let target = EntityId::new(
                        NodeKind::Method.label(),
                        &method_qualified(target_file, &binding.imported_name, property),
                    );
                    return Some((target, true));
                }
            }
            return None;
        }

        if let Some(decl) = self.locals.get(object).copied() {
            if decl.kind == NodeKind::Class {
                let target = EntityId::new(
                    NodeKind::Method.label(),
                    &method_qualified(self.path, object, property),
                );
                return Some((target, false));
            }
        }
        None
    }

    fn resolve_assignment(&mut self, node: &tree_sitter::Node, enclosing: &EntityId) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = node_text(&left, self.source);
        let line = node.start_position().row as u32 + 1;

        let target: Option<(EntityId, bool)> = if let Some(decl) = self.locals.get(name).copied() {
            if decl.kind == NodeKind::Variable {
                Some((self.local_id(name, decl), false))
            } else {
                None
            }
        } else if let Some(binding) = self.imports.get(name).cloned() {
            binding.resolved_file.as_deref().and_then(|target_file| {
                self.index
                    .named_in_file(NodeKind::Variable, &binding.imported_name, target_file)
                    .map(|n| (n.entity_id().clone(), true))
            })
        } else {
            None
        };

        let Some((target, cross_file)) = target else {
            return;
        };

        let mut rel =
            Relationship::at_line(RelationshipType::MutatesState, enclosing.clone(), target, line);
        rel.set_prop("assignmentLine", line);
        rel.set_prop("isCrossFile", cross_file);
        rel.set_prop("isConditional", is_conditional(node));
        self.patch.add.push(rel);
    }

    /// `HANDLES_ERROR` from the enclosing function to a synthetic catch
    /// parameter id. Anonymous catches target the enclosing function itself.
    fn resolve_catch(&mut self, catch: &tree_sitter::Node, enclosing: &EntityId) {
        let line = catch.start_position().row as u32 + 1;

        let (target, binding_name) = match catch.child_by_field_name("parameter") {
            Some(parameter) => {
                let name = node_text(&parameter, self.source).to_string();
                let qualified = format!("{enclosing}:catch:{name}:{line}");
                (
                    EntityId::new(NodeKind::Parameter.label(), &qualified),
                    Some(name),
                )
            }
            None => (enclosing.clone(), None),
        };

        let mut rel = Relationship::at_line(
            RelationshipType::HandlesError,
            enclosing.clone(),
            target,
            line,
        );
        rel.set_prop("catchLine", line);
        match binding_name {
            Some(name) => {
                rel.set_prop("catchBinding", name);
                rel.set_placeholder(true);
            }
            None => {
                rel.set_prop("isAnonymousCatch", true);
            }
        }
        self.patch.add.push(rel);
    }

    // ── Component usage ─────────────────────────────────────────────────

    fn resolve_component_usage(
        &mut self,
        node: &tree_sitter::Node,
        current_component: Option<&EntityId>,
    ) {
        let owned_id;
        let mut component = current_component;

        match node.kind() {
            "function_declaration" | "generator_function_declaration" | "class_declaration"
            | "abstract_class_declaration" => {
                if let Some(name) = field_text(node, "name", self.source) {
                    if let Some(found) =
                        self.index.named_in_file(NodeKind::Component, &name, self.path)
                    {
                        owned_id = found.entity_id().clone();
                        component = Some(&owned_id);
                    }
                }
            }
            "arrow_function" | "function_expression" => {
                if let Some(parent) = node.parent() {
                    if parent.kind() == "variable_declarator" {
                        if let Some(name) = field_text(&parent, "name", self.source) {
                            if let Some(found) =
                                self.index.named_in_file(NodeKind::Component, &name, self.path)
                            {
                                owned_id = found.entity_id().clone();
                                component = Some(&owned_id);
                            }
                        }
                    }
                }
            }
            "jsx_opening_element" | "jsx_self_closing_element" => {
                if let (Some(tag), Some(source_component)) =
                    (field_text(node, "name", self.source), component)
                {
                    if is_pascal_case(&tag) {
                        self.push_component_usage(source_component, &tag, node);
                    }
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.resolve_component_usage(&child, component);
        }
    }

    fn push_component_usage(
        &mut self,
        source_component: &EntityId,
        tag: &str,
        site: &tree_sitter::Node,
    ) {
        let line = site.start_position().row as u32 + 1;

        let target: Option<EntityId> = self
            .index
            .named_in_file(NodeKind::Component, tag, self.path)
            .map(|n| n.entity_id().clone())
            .or_else(|| {
                let binding = self.imports.get(tag)?;
                let target_file = binding.resolved_file.as_deref()?;
                self.index
                    .named_in_file(NodeKind::Component, &binding.imported_name, target_file)
                    .map(|n| n.entity_id().clone())
            });

        let (target, placeholder) = match target {
            Some(id) => (id, false),
            None => (
                EntityId::new(
                    NodeKind::Component.label(),
                    &container_qualified(self.path, tag),
                ),
                true,
            ),
        };

        if &target == source_component {
            return;
        }

        let mut rel = Relationship::at_line(
            RelationshipType::UsesComponent,
            source_component.clone(),
            target,
            line,
        );
        rel.set_prop("tagName", tag);
        if placeholder {
            rel.set_placeholder(true);
        }
        self.patch.add.push(rel);
    }
}

/// Whether an ancestor inside the enclosing function makes this site
/// conditional.
fn is_conditional(node: &tree_sitter::Node) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        match ancestor.kind() {
            "if_statement" | "switch_statement" | "ternary_expression" | "for_statement"
            | "for_in_statement" | "while_statement" | "do_statement" => return true,
            "function_declaration" | "generator_function_declaration" | "arrow_function"
            | "function_expression" | "method_definition" => return false,
            _ => {}
        }
        current = ancestor.parent();
    }
    false
}
