pub mod canvas;
pub mod error;
pub mod history;
pub mod kind;
pub mod registry;
pub mod sanitize;
pub mod sequence;
pub mod state;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use error::{CoreError, RegistryError, Result};
pub use history::{CanvasHistory, HistoryEntry, MAX_HISTORY};
pub use kind::{
    ArchimateEntityKind, ArchimateRelationshipKind, EntityKind, Notation, RelationshipKind,
    SimpleEntityKind, SimpleRelationshipKind, UmlEntityKind, UmlRelationshipKind,
};
pub use registry::{registry, validate_all, NotationRegistry};
pub use sanitize::sanitize_text;
pub use sequence::{
    Activation, MessageKind, Participant, ParticipantKind, SequenceDiagramData, SequenceMessage,
};
pub use state::{CanvasEvent, CanvasState};

// --- Canvas types (live, in-memory format) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How an edge path is routed between its endpoints. Absent means the
/// renderer's default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRoutingType {
    Straight,
    Step,
    Smoothstep,
    Bezier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CanvasMode {
    Edit,
    #[default]
    Browse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNodeData {
    pub label: String,
    pub entity_type: EntityKind,
    /// Backend entity this node stands for. `None` means the node is unsaved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_mode: Option<bool>,
    /// Notation-specific payload (UML compartments, ArchiMate layer hints, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node on the canvas. Matches the Svelte Flow node structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: EntityKind,
    #[serde(default)]
    pub position: Position,
    pub data: CanvasNodeData,
}

impl CanvasNode {
    /// The id written to placements: the backend entity id when linked,
    /// otherwise the node's own id.
    pub fn placement_key(&self) -> &str {
        self.data.entity_id.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdgeData {
    pub relationship_type: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_type: Option<EdgeRoutingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_offset_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_offset_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_rotation: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An edge on the canvas. Matches the Svelte Flow edge structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: RelationshipKind,
    pub data: CanvasEdgeData,
}

// --- Model version document (persisted format) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Placement {
    pub entity_id: String,
    pub position: Position,
    pub size: Size,
    /// Per-placement visual overrides. Reserved; written as `{}`.
    #[serde(default)]
    pub visual: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub struct GridSettings {
    pub enabled: bool,
    pub snap: bool,
    pub size: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            snap: true,
            size: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct CanvasSettings {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub grid: GridSettings,
}

/// A saved diagram as the backend stores it per model version.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct ModelVersionData {
    #[serde(default)]
    pub placements: Vec<Placement>,
    /// Relationship ids shown on this diagram.
    #[serde(default)]
    pub displayed_relationships: Vec<String>,
    #[serde(default)]
    pub canvas: CanvasSettings,
}

impl ModelVersionData {
    /// Parse the free-form `data` object of a model or model version.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// JSON schema of the persisted model version document.
pub fn model_version_schema() -> schemars::Schema {
    schemars::schema_for!(ModelVersionData)
}
