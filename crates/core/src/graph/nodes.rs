//! Node types for the code knowledge graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::EntityId;

/// The kind of code entity a node represents. Closed vocabulary; the store
/// derives node labels from these, so new kinds also mean schema changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
    Class,
    Interface,
    Function,
    Method,
    Variable,
    Parameter,
    TypeAlias,
    Import,
    Export,
    Component,
    #[serde(rename = "JSXElement")]
    JsxElement,
    #[serde(rename = "JSXAttribute")]
    JsxAttribute,
    TailwindClass,

    PythonFunction,
    PythonClass,
    PythonMethod,
    PythonParameter,
    PythonVariable,

    JavaClass,
    JavaInterface,
    JavaMethod,

    CppClass,
    CppMethod,
    CFunction,
    IncludeDirective,
    MacroDefinition,

    CSharpClass,
    CSharpInterface,
    CSharpStruct,
    CSharpMethod,
    Property,
    Field,

    GoFunction,
    GoMethod,
    GoStruct,
    GoInterface,

    PackageDeclaration,
    PackageClause,
    ImportDeclaration,
    ImportSpec,
    NamespaceDeclaration,
    UsingDirective,

    #[serde(rename = "SQLTable")]
    SqlTable,
    #[serde(rename = "SQLView")]
    SqlView,
    #[serde(rename = "SQLColumn")]
    SqlColumn,
    #[serde(rename = "SQLSelectStatement")]
    SqlSelectStatement,
    #[serde(rename = "SQLInsertStatement")]
    SqlInsertStatement,
    #[serde(rename = "SQLUpdateStatement")]
    SqlUpdateStatement,
    #[serde(rename = "SQLDeleteStatement")]
    SqlDeleteStatement,
}

impl NodeKind {
    /// Canonical label, also the hash key for entity id construction.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Directory => "Directory",
            NodeKind::Class => "Class",
            NodeKind::Interface => "Interface",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
            NodeKind::Variable => "Variable",
            NodeKind::Parameter => "Parameter",
            NodeKind::TypeAlias => "TypeAlias",
            NodeKind::Import => "Import",
            NodeKind::Export => "Export",
            NodeKind::Component => "Component",
            NodeKind::JsxElement => "JSXElement",
            NodeKind::JsxAttribute => "JSXAttribute",
            NodeKind::TailwindClass => "TailwindClass",
            NodeKind::PythonFunction => "PythonFunction",
            NodeKind::PythonClass => "PythonClass",
            NodeKind::PythonMethod => "PythonMethod",
            NodeKind::PythonParameter => "PythonParameter",
            NodeKind::PythonVariable => "PythonVariable",
            NodeKind::JavaClass => "JavaClass",
            NodeKind::JavaInterface => "JavaInterface",
            NodeKind::JavaMethod => "JavaMethod",
            NodeKind::CppClass => "CppClass",
            NodeKind::CppMethod => "CppMethod",
            NodeKind::CFunction => "CFunction",
            NodeKind::IncludeDirective => "IncludeDirective",
            NodeKind::MacroDefinition => "MacroDefinition",
            NodeKind::CSharpClass => "CSharpClass",
            NodeKind::CSharpInterface => "CSharpInterface",
            NodeKind::CSharpStruct => "CSharpStruct",
            NodeKind::CSharpMethod => "CSharpMethod",
            NodeKind::Property => "Property",
            NodeKind::Field => "Field",
            NodeKind::GoFunction => "GoFunction",
            NodeKind::GoMethod => "GoMethod",
            NodeKind::GoStruct => "GoStruct",
            NodeKind::GoInterface => "GoInterface",
            NodeKind::PackageDeclaration => "PackageDeclaration",
            NodeKind::PackageClause => "PackageClause",
            NodeKind::ImportDeclaration => "ImportDeclaration",
            NodeKind::ImportSpec => "ImportSpec",
            NodeKind::NamespaceDeclaration => "NamespaceDeclaration",
            NodeKind::UsingDirective => "UsingDirective",
            NodeKind::SqlTable => "SQLTable",
            NodeKind::SqlView => "SQLView",
            NodeKind::SqlColumn => "SQLColumn",
            NodeKind::SqlSelectStatement => "SQLSelectStatement",
            NodeKind::SqlInsertStatement => "SQLInsertStatement",
            NodeKind::SqlUpdateStatement => "SQLUpdateStatement",
            NodeKind::SqlDeleteStatement => "SQLDeleteStatement",
        }
    }

    /// Parse a canonical label back into a kind (Python subprocess protocol,
    /// store deserialization).
    pub fn from_label(label: &str) -> Option<Self> {
        serde_json::from_value(Value::String(label.to_string())).ok()
    }

    /// Whether this kind structurally owns members (methods, fields, columns,
    /// parameters). Member containment edges may only originate from these.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Function
                | NodeKind::Method
                | NodeKind::Component
                | NodeKind::PythonClass
                | NodeKind::PythonFunction
                | NodeKind::PythonMethod
                | NodeKind::JavaClass
                | NodeKind::JavaInterface
                | NodeKind::JavaMethod
                | NodeKind::CppClass
                | NodeKind::CppMethod
                | NodeKind::CFunction
                | NodeKind::CSharpClass
                | NodeKind::CSharpInterface
                | NodeKind::CSharpStruct
                | NodeKind::CSharpMethod
                | NodeKind::GoStruct
                | NodeKind::GoInterface
                | NodeKind::GoFunction
                | NodeKind::GoMethod
                | NodeKind::NamespaceDeclaration
                | NodeKind::SqlTable
        )
    }
}

/// Source location. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(start_line: u32, end_line: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }

    pub fn line(line: u32) -> Self {
        Self {
            start_line: line,
            end_line: line,
            start_column: 0,
            end_column: 0,
        }
    }
}

/// A node in the code knowledge graph.
///
/// The entity id is the primary key and is derived from `(kind,
/// qualifiedName)` at construction time; everything else is payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    entity_id: EntityId,

    /// Per-run id, never persisted as identity.
    instance_id: u64,

    kind: NodeKind,

    name: String,

    /// Absolute, forward-slash-normalized path of the containing file.
    file_path: String,

    language: String,

    #[serde(flatten)]
    span: Span,

    /// Entity id of the structurally enclosing node, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<EntityId>,

    /// Open map of language-specific attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,

    /// ISO-8601 extraction timestamp.
    created_at: String,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        name: impl Into<String>,
        qualified_name: &str,
        file_path: impl Into<String>,
        language: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            entity_id: EntityId::new(kind.label(), qualified_name),
            instance_id: 0,
            kind,
            name: name.into(),
            file_path: file_path.into(),
            language: language.into(),
            span,
            parent_id: None,
            properties: Map::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn set_instance_id(&mut self, id: u64) {
        self.instance_id = id;
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn parent_id(&self) -> Option<&EntityId> {
        self.parent_id.as_ref()
    }

    pub fn set_parent(&mut self, parent: EntityId) {
        self.parent_id = Some(parent);
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn set_prop(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_prop(key, value);
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn bool_prop(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn set_created_at(&mut self, stamp: impl Into<String>) {
        self.created_at = stamp.into();
    }
}
