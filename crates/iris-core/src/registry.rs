//! Notation registries: display metadata and rendering handlers per kind key.
//!
//! Each notation has two tables keyed by kind: what the palette shows
//! (`entity_types` / `relationship_types`) and which handler draws it
//! (`node_types` / `edge_types`). The tables are static and must cover the
//! same keys; [`NotationRegistry::validate`] checks that.

use serde::Serialize;

use crate::error::RegistryError;
use crate::kind::{EntityKind, Notation, RelationshipKind};

/// Node component a kind is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRenderer {
    Component,
    Service,
    Interface,
    Package,
    Actor,
    Database,
    Queue,
    UmlClass,
    UmlObject,
    UseCase,
    State,
    Activity,
    Deployment,
    /// Shared by every ArchiMate element; the layer colour comes from node data.
    Archimate,
    /// Sequence lifeline head.
    Participant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stroke {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    None,
    Arrow,
    OpenArrow,
    HollowDiamond,
    FilledDiamond,
    HollowTriangle,
}

/// Edge component a relationship kind is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeRenderer {
    pub component: &'static str,
    pub stroke: Stroke,
    pub source_marker: Marker,
    pub target_marker: Marker,
}

impl EdgeRenderer {
    const fn new(component: &'static str, stroke: Stroke, source: Marker, target: Marker) -> Self {
        Self {
            component,
            stroke,
            source_marker: source,
            target_marker: target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchimateLayer {
    Business,
    Application,
    Technology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityTypeInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    /// Only set for ArchiMate elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<ArchimateLayer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationshipTypeInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct NotationRegistry {
    pub notation: Notation,
    pub node_types: &'static [(&'static str, NodeRenderer)],
    pub edge_types: &'static [(&'static str, EdgeRenderer)],
    pub entity_types: &'static [EntityTypeInfo],
    pub relationship_types: &'static [RelationshipTypeInfo],
}

impl NotationRegistry {
    pub fn node_renderer(&self, key: &str) -> Option<NodeRenderer> {
        self.node_types
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, r)| *r)
    }

    pub fn edge_renderer(&self, key: &str) -> Option<EdgeRenderer> {
        self.edge_types
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, r)| *r)
    }

    pub fn entity_info(&self, key: &str) -> Option<&'static EntityTypeInfo> {
        self.entity_types.iter().find(|t| t.key == key)
    }

    pub fn relationship_info(&self, key: &str) -> Option<&'static RelationshipTypeInfo> {
        self.relationship_types.iter().find(|t| t.key == key)
    }

    /// Check that metadata and handler tables cover exactly the same keys.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut missing_handlers = Vec::new();
        let mut missing_metadata = Vec::new();

        for info in self.entity_types {
            if self.node_renderer(info.key).is_none() {
                missing_handlers.push(info.key);
            }
        }
        for info in self.relationship_types {
            if self.edge_renderer(info.key).is_none() {
                missing_handlers.push(info.key);
            }
        }
        for (key, _) in self.node_types {
            if self.entity_info(key).is_none() {
                missing_metadata.push(*key);
            }
        }
        for (key, _) in self.edge_types {
            if self.relationship_info(key).is_none() {
                missing_metadata.push(*key);
            }
        }

        if missing_handlers.is_empty() && missing_metadata.is_empty() {
            Ok(())
        } else {
            Err(RegistryError {
                notation: self.notation,
                missing_handlers,
                missing_metadata,
            })
        }
    }
}

/// The registry for a notation.
pub fn registry(notation: Notation) -> &'static NotationRegistry {
    match notation {
        Notation::Simple => &SIMPLE_VIEW,
        Notation::Uml => &UML,
        Notation::Archimate => &ARCHIMATE,
        Notation::Sequence => &SEQUENCE,
    }
}

/// Validate every registry. Intended to run once at startup.
pub fn validate_all() -> Result<(), RegistryError> {
    Notation::ALL
        .into_iter()
        .try_for_each(|notation| registry(notation).validate())
}

/// Handler for a node kind. Total: every kind has a handler in its notation.
pub fn node_renderer_for(kind: EntityKind) -> Option<NodeRenderer> {
    registry(kind.notation()).node_renderer(kind.key())
}

pub fn edge_renderer_for(kind: RelationshipKind) -> Option<EdgeRenderer> {
    registry(kind.notation()).edge_renderer(kind.key())
}

pub fn entity_info_for(kind: EntityKind) -> Option<&'static EntityTypeInfo> {
    registry(kind.notation()).entity_info(kind.key())
}

pub fn relationship_info_for(kind: RelationshipKind) -> Option<&'static RelationshipTypeInfo> {
    registry(kind.notation()).relationship_info(kind.key())
}

const fn solid(component: &'static str, source: Marker, target: Marker) -> EdgeRenderer {
    EdgeRenderer::new(component, Stroke::Solid, source, target)
}

const fn dashed(component: &'static str, source: Marker, target: Marker) -> EdgeRenderer {
    EdgeRenderer::new(component, Stroke::Dashed, source, target)
}

const fn entity(
    key: &'static str,
    label: &'static str,
    icon: &'static str,
    description: &'static str,
) -> EntityTypeInfo {
    EntityTypeInfo {
        key,
        label,
        icon,
        description,
        layer: None,
    }
}

const fn archimate(
    key: &'static str,
    label: &'static str,
    icon: &'static str,
    layer: ArchimateLayer,
    description: &'static str,
) -> EntityTypeInfo {
    EntityTypeInfo {
        key,
        label,
        icon,
        description,
        layer: Some(layer),
    }
}

const fn relationship(
    key: &'static str,
    label: &'static str,
    description: &'static str,
) -> RelationshipTypeInfo {
    RelationshipTypeInfo {
        key,
        label,
        description,
    }
}

// --- Simple View ---

pub static SIMPLE_VIEW: NotationRegistry = NotationRegistry {
    notation: Notation::Simple,
    node_types: &[
        ("component", NodeRenderer::Component),
        ("service", NodeRenderer::Service),
        ("interface", NodeRenderer::Interface),
        ("package", NodeRenderer::Package),
        ("actor", NodeRenderer::Actor),
        ("database", NodeRenderer::Database),
        ("queue", NodeRenderer::Queue),
    ],
    edge_types: &[
        ("uses", solid("UsesEdge", Marker::None, Marker::Arrow)),
        (
            "depends_on",
            dashed("DependsOnEdge", Marker::None, Marker::OpenArrow),
        ),
        (
            "composes",
            solid("ComposesEdge", Marker::FilledDiamond, Marker::None),
        ),
        (
            "implements",
            dashed("ImplementsEdge", Marker::None, Marker::HollowTriangle),
        ),
        (
            "contains",
            solid("ContainsEdge", Marker::HollowDiamond, Marker::None),
        ),
    ],
    entity_types: &[
        entity("component", "Component", "⬡", "A modular unit of software"),
        entity("service", "Service", "◎", "A deployed or logical service"),
        entity("interface", "Interface", "◯", "A contract or API surface"),
        entity("package", "Package", "▤", "A grouping container"),
        entity("actor", "Actor", "👤", "A person or external system"),
        entity("database", "Database", "▦", "A persistent data store"),
        entity("queue", "Queue", "≋", "An asynchronous message channel"),
    ],
    relationship_types: &[
        relationship("uses", "Uses", "Source uses/depends on target"),
        relationship("depends_on", "Depends On", "Source depends on target"),
        relationship("composes", "Composes", "Source is composed of target"),
        relationship(
            "implements",
            "Implements",
            "Source implements target interface",
        ),
        relationship("contains", "Contains", "Source contains target (nesting)"),
    ],
};

// --- Full View UML ---

pub static UML: NotationRegistry = NotationRegistry {
    notation: Notation::Uml,
    node_types: &[
        ("class", NodeRenderer::UmlClass),
        ("object", NodeRenderer::UmlObject),
        ("use_case", NodeRenderer::UseCase),
        ("state", NodeRenderer::State),
        ("activity", NodeRenderer::Activity),
        ("node", NodeRenderer::Deployment),
    ],
    edge_types: &[
        (
            "association",
            solid("AssociationEdge", Marker::None, Marker::None),
        ),
        (
            "aggregation",
            solid("AggregationEdge", Marker::HollowDiamond, Marker::None),
        ),
        (
            "composition",
            solid("CompositionEdge", Marker::FilledDiamond, Marker::None),
        ),
        (
            "dependency",
            dashed("DependencyEdge", Marker::None, Marker::OpenArrow),
        ),
        (
            "realization",
            dashed("RealizationEdge", Marker::None, Marker::HollowTriangle),
        ),
        (
            "generalization",
            solid("GeneralizationEdge", Marker::None, Marker::HollowTriangle),
        ),
    ],
    entity_types: &[
        entity(
            "class",
            "Class",
            "▭",
            "UML class with attributes and operations",
        ),
        entity("object", "Object", "▯", "Instance of a class"),
        entity("use_case", "Use Case", "◎", "User goal or system function"),
        entity("state", "State", "◉", "Condition during object life"),
        entity("activity", "Activity", "▷", "Action or workflow step"),
        entity("node", "Node", "⬡", "Computational resource"),
    ],
    relationship_types: &[
        relationship(
            "association",
            "Association",
            "Structural link between classes",
        ),
        relationship("aggregation", "Aggregation", "Whole-part (weak ownership)"),
        relationship(
            "composition",
            "Composition",
            "Whole-part (strong ownership)",
        ),
        relationship("dependency", "Dependency", "Source depends on target"),
        relationship(
            "realization",
            "Realization",
            "Source implements the target contract",
        ),
        relationship(
            "generalization",
            "Generalization",
            "Source inherits from target",
        ),
    ],
};

// --- ArchiMate ---

const ARCHIMATE_EDGE: EdgeRenderer = solid("ArchimateEdge", Marker::None, Marker::Arrow);

pub static ARCHIMATE: NotationRegistry = NotationRegistry {
    notation: Notation::Archimate,
    node_types: &[
        ("business_actor", NodeRenderer::Archimate),
        ("business_role", NodeRenderer::Archimate),
        ("business_process", NodeRenderer::Archimate),
        ("business_service", NodeRenderer::Archimate),
        ("business_object", NodeRenderer::Archimate),
        ("application_component", NodeRenderer::Archimate),
        ("application_service", NodeRenderer::Archimate),
        ("application_interface", NodeRenderer::Archimate),
        ("technology_node", NodeRenderer::Archimate),
        ("technology_service", NodeRenderer::Archimate),
        ("technology_interface", NodeRenderer::Archimate),
    ],
    edge_types: &[
        ("serving", ARCHIMATE_EDGE),
        ("flow", ARCHIMATE_EDGE),
        ("triggering", ARCHIMATE_EDGE),
        ("access", ARCHIMATE_EDGE),
        ("influence", ARCHIMATE_EDGE),
        ("archimate_realization", ARCHIMATE_EDGE),
        ("archimate_composition", ARCHIMATE_EDGE),
        ("archimate_aggregation", ARCHIMATE_EDGE),
    ],
    entity_types: &[
        archimate(
            "business_actor",
            "Business Actor",
            "👤",
            ArchimateLayer::Business,
            "An organizational entity capable of performing behavior",
        ),
        archimate(
            "business_role",
            "Business Role",
            "🎭",
            ArchimateLayer::Business,
            "A responsibility for performing specific behavior",
        ),
        archimate(
            "business_process",
            "Business Process",
            "⇨",
            ArchimateLayer::Business,
            "A sequence of business behaviors that achieves a result",
        ),
        archimate(
            "business_service",
            "Business Service",
            "◎",
            ArchimateLayer::Business,
            "Business behavior exposed to the environment",
        ),
        archimate(
            "business_object",
            "Business Object",
            "▭",
            ArchimateLayer::Business,
            "A concept used within a business domain",
        ),
        archimate(
            "application_component",
            "Application Component",
            "⬡",
            ArchimateLayer::Application,
            "An encapsulation of application functionality",
        ),
        archimate(
            "application_service",
            "Application Service",
            "◎",
            ArchimateLayer::Application,
            "Application behavior exposed to the environment",
        ),
        archimate(
            "application_interface",
            "Application Interface",
            "◯",
            ArchimateLayer::Application,
            "A point of access where application services are available",
        ),
        archimate(
            "technology_node",
            "Node",
            "▦",
            ArchimateLayer::Technology,
            "A computational or physical resource that hosts artifacts",
        ),
        archimate(
            "technology_service",
            "Technology Service",
            "◎",
            ArchimateLayer::Technology,
            "Technology behavior exposed to the environment",
        ),
        archimate(
            "technology_interface",
            "Technology Interface",
            "◯",
            ArchimateLayer::Technology,
            "A point of access where technology services are offered",
        ),
    ],
    relationship_types: &[
        relationship(
            "serving",
            "Serving",
            "Source provides its functionality to target",
        ),
        relationship("flow", "Flow", "Transfer from one behavior to another"),
        relationship("triggering", "Triggering", "Temporal or causal precedence"),
        relationship(
            "access",
            "Access",
            "Behavior reads or writes a passive object",
        ),
        relationship(
            "influence",
            "Influence",
            "Source affects the motivation of target",
        ),
        relationship(
            "archimate_realization",
            "Realization",
            "Source realizes a more abstract target",
        ),
        relationship(
            "archimate_composition",
            "Composition",
            "Target is an integral part of source",
        ),
        relationship(
            "archimate_aggregation",
            "Aggregation",
            "Source groups target",
        ),
    ],
};

// --- Sequence ---

pub static SEQUENCE: NotationRegistry = NotationRegistry {
    notation: Notation::Sequence,
    node_types: &[
        ("actor", NodeRenderer::Participant),
        ("component", NodeRenderer::Participant),
        ("service", NodeRenderer::Participant),
    ],
    edge_types: &[
        ("sync", solid("SyncMessage", Marker::None, Marker::Arrow)),
        (
            "async",
            solid("AsyncMessage", Marker::None, Marker::OpenArrow),
        ),
        (
            "reply",
            dashed("ReplyMessage", Marker::None, Marker::OpenArrow),
        ),
    ],
    entity_types: &[
        entity(
            "actor",
            "Actor",
            "👤",
            "A person or external system starting the interaction",
        ),
        entity(
            "component",
            "Component",
            "⬡",
            "A software component taking part in the interaction",
        ),
        entity(
            "service",
            "Service",
            "◎",
            "A deployed service taking part in the interaction",
        ),
    ],
    relationship_types: &[
        relationship(
            "sync",
            "Synchronous",
            "Caller blocks until the callee answers",
        ),
        relationship("async", "Asynchronous", "Caller continues without waiting"),
        relationship("reply", "Reply", "Return message to an earlier call"),
    ],
};
