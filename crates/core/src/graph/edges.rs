//! Relationship (edge) types for the code knowledge graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::EntityId;

/// The kind of relationship an edge represents. Closed vocabulary, persisted
/// verbatim as the relationship type in the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Contains,
    Imports,
    ResolvesImport,
    Exports,
    Calls,
    PythonCalls,
    Extends,
    Implements,
    HasMethod,
    HasField,
    HasProperty,
    HasParameter,
    HasColumn,
    MutatesState,
    HandlesError,
    DefinesClass,
    DefinesInterface,
    DefinesStruct,
    DefinesEnum,
    DefinesFunction,
    DefinesTable,
    DefinesView,
    DefinesComponent,
    DeclaresPackage,
    DeclaresNamespace,
    Includes,
    RendersElement,
    UsesComponent,
    HasProp,
    UsesTailwindClass,
    ReferencesTable,
    ReferencesView,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Contains => "CONTAINS",
            RelationshipType::Imports => "IMPORTS",
            RelationshipType::ResolvesImport => "RESOLVES_IMPORT",
            RelationshipType::Exports => "EXPORTS",
            RelationshipType::Calls => "CALLS",
            RelationshipType::PythonCalls => "PYTHON_CALLS",
            RelationshipType::Extends => "EXTENDS",
            RelationshipType::Implements => "IMPLEMENTS",
            RelationshipType::HasMethod => "HAS_METHOD",
            RelationshipType::HasField => "HAS_FIELD",
            RelationshipType::HasProperty => "HAS_PROPERTY",
            RelationshipType::HasParameter => "HAS_PARAMETER",
            RelationshipType::HasColumn => "HAS_COLUMN",
            RelationshipType::MutatesState => "MUTATES_STATE",
            RelationshipType::HandlesError => "HANDLES_ERROR",
            RelationshipType::DefinesClass => "DEFINES_CLASS",
            RelationshipType::DefinesInterface => "DEFINES_INTERFACE",
            RelationshipType::DefinesStruct => "DEFINES_STRUCT",
            RelationshipType::DefinesEnum => "DEFINES_ENUM",
            RelationshipType::DefinesFunction => "DEFINES_FUNCTION",
            RelationshipType::DefinesTable => "DEFINES_TABLE",
            RelationshipType::DefinesView => "DEFINES_VIEW",
            RelationshipType::DefinesComponent => "DEFINES_COMPONENT",
            RelationshipType::DeclaresPackage => "DECLARES_PACKAGE",
            RelationshipType::DeclaresNamespace => "DECLARES_NAMESPACE",
            RelationshipType::Includes => "INCLUDES",
            RelationshipType::RendersElement => "RENDERS_ELEMENT",
            RelationshipType::UsesComponent => "USES_COMPONENT",
            RelationshipType::HasProp => "HAS_PROP",
            RelationshipType::UsesTailwindClass => "USES_TAILWIND_CLASS",
            RelationshipType::ReferencesTable => "REFERENCES_TABLE",
            RelationshipType::ReferencesView => "REFERENCES_VIEW",
        }
    }

    pub fn from_str_tag(tag: &str) -> Option<Self> {
        serde_json::from_value(Value::String(tag.to_string())).ok()
    }

    /// Structural priority in [0, 10]; higher means a stronger signal.
    pub fn default_weight(&self) -> u8 {
        match self {
            RelationshipType::Contains => 10,
            RelationshipType::DefinesClass
            | RelationshipType::DefinesInterface
            | RelationshipType::DefinesStruct
            | RelationshipType::DefinesEnum
            | RelationshipType::DefinesFunction
            | RelationshipType::DefinesTable
            | RelationshipType::DefinesView
            | RelationshipType::DefinesComponent
            | RelationshipType::DeclaresPackage
            | RelationshipType::DeclaresNamespace => 9,
            RelationshipType::HasMethod
            | RelationshipType::HasField
            | RelationshipType::HasProperty
            | RelationshipType::HasParameter
            | RelationshipType::HasColumn => 9,
            RelationshipType::Extends | RelationshipType::Implements => 8,
            RelationshipType::ResolvesImport | RelationshipType::Exports => 7,
            RelationshipType::Imports | RelationshipType::Includes => 6,
            RelationshipType::RendersElement
            | RelationshipType::UsesComponent
            | RelationshipType::HasProp => 6,
            RelationshipType::Calls | RelationshipType::PythonCalls => 5,
            RelationshipType::ReferencesTable | RelationshipType::ReferencesView => 5,
            RelationshipType::MutatesState | RelationshipType::HandlesError => 4,
            RelationshipType::UsesTailwindClass => 2,
        }
    }
}

/// A directed, typed edge between two entity ids.
///
/// The target may refer to a node that does not exist in the current run; such
/// edges carry `isPlaceholder: true` in their properties and the store
/// materializes stub endpoints for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    entity_id: EntityId,

    #[serde(rename = "type")]
    rel_type: RelationshipType,

    source_id: EntityId,

    target_id: EntityId,

    /// Integer priority in [0, 10].
    weight: u8,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,

    created_at: String,

    /// Call-site line that participated in the entity id, if any. Needed to
    /// rebuild the id when an edge is re-pointed during resolution.
    #[serde(skip)]
    site_line: Option<u32>,
}

impl Relationship {
    /// Edge whose identity is `(type, sourceId:targetId)`.
    pub fn new(rel_type: RelationshipType, source_id: EntityId, target_id: EntityId) -> Self {
        let qualified = format!("{source_id}:{target_id}");
        Self {
            entity_id: EntityId::new(rel_type.as_str(), &qualified),
            rel_type,
            weight: rel_type.default_weight(),
            source_id,
            target_id,
            properties: Map::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
            site_line: None,
        }
    }

    /// Edge whose identity additionally includes a source line, so repeated
    /// call/assignment sites between the same endpoints stay distinct.
    pub fn at_line(
        rel_type: RelationshipType,
        source_id: EntityId,
        target_id: EntityId,
        line: u32,
    ) -> Self {
        let qualified = format!("{source_id}:{target_id}:{line}");
        Self {
            entity_id: EntityId::new(rel_type.as_str(), &qualified),
            rel_type,
            weight: rel_type.default_weight(),
            source_id,
            target_id,
            properties: Map::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
            site_line: Some(line),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn rel_type(&self) -> RelationshipType {
        self.rel_type
    }

    pub fn source_id(&self) -> &EntityId {
        &self.source_id
    }

    pub fn target_id(&self) -> &EntityId {
        &self.target_id
    }

    pub fn weight(&self) -> u8 {
        self.weight
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

    pub fn is_placeholder(&self) -> bool {
        self.bool_prop("isPlaceholder")
    }

    pub fn set_placeholder(&mut self, value: bool) {
        self.set_prop("isPlaceholder", value);
    }

    pub fn with_placeholder(mut self) -> Self {
        self.set_placeholder(true);
        self
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn set_created_at(&mut self, stamp: impl Into<String>) {
        self.created_at = stamp.into();
    }

    /// Re-point the edge at a new target, rebuilding the entity id under the
    /// same rule it was created with.
    pub fn retarget(&mut self, target_id: EntityId) {
        self.target_id = target_id;
        let qualified = match self.site_line {
            Some(line) => format!("{}:{}:{}", self.source_id, self.target_id, line),
            None => format!("{}:{}", self.source_id, self.target_id),
        };
        self.entity_id = EntityId::new(self.rel_type.as_str(), &qualified);
    }
}
