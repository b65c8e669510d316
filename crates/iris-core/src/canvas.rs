//! Conversions between live canvas nodes/edges and persisted model versions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Map;

use crate::sanitize::{sanitize_optional, sanitize_text};
use crate::{
    CanvasEdge, CanvasEdgeData, CanvasNode, CanvasNodeData, CanvasSettings, EdgeRoutingType,
    EntityKind, ModelVersionData, Placement, Position, RelationshipKind, Size,
};

/// Size written for every placement. The canvas does not track node size.
pub const DEFAULT_NODE_SIZE: Size = Size {
    width: 180.0,
    height: 80.0,
};

static NODE_COUNTER: AtomicU64 = AtomicU64::new(1);
static EDGE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Next `node-N` id. Unique within the process.
pub fn generate_node_id() -> String {
    format!("node-{}", NODE_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Next `edge-N` id. Unique within the process.
pub fn generate_edge_id() -> String {
    format!("edge-{}", EDGE_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Move the id counters past every `node-N` / `edge-N` id already present,
/// so ids generated after loading a diagram cannot collide with it.
pub fn reserve_ids(nodes: &[CanvasNode], edges: &[CanvasEdge]) {
    if let Some(max) = max_suffix(nodes.iter().map(|n| n.id.as_str()), "node-") {
        NODE_COUNTER.fetch_max(max + 1, Ordering::Relaxed);
    }
    if let Some(max) = max_suffix(edges.iter().map(|e| e.id.as_str()), "edge-") {
        EDGE_COUNTER.fetch_max(max + 1, Ordering::Relaxed);
    }
}

fn max_suffix<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> Option<u64> {
    ids.filter_map(|id| id.strip_prefix(prefix).and_then(|n| n.parse::<u64>().ok()))
        .max()
}

/// Build a node. `label` and `description` are sanitized.
pub fn create_canvas_node(
    id: impl Into<String>,
    label: &str,
    entity_type: EntityKind,
    position: Position,
    entity_id: Option<&str>,
    description: Option<&str>,
) -> CanvasNode {
    CanvasNode {
        id: id.into(),
        node_type: entity_type,
        position,
        data: CanvasNodeData {
            label: sanitize_text(label),
            entity_type,
            entity_id: entity_id.map(str::to_string),
            description: sanitize_optional(description),
            browse_mode: None,
            extra: Map::new(),
        },
    }
}

/// Build an edge. `label` is sanitized.
pub fn create_canvas_edge(
    id: impl Into<String>,
    source_id: impl Into<String>,
    target_id: impl Into<String>,
    relationship_type: RelationshipKind,
    relationship_id: Option<&str>,
    label: Option<&str>,
) -> CanvasEdge {
    CanvasEdge {
        id: id.into(),
        source: source_id.into(),
        target: target_id.into(),
        edge_type: relationship_type,
        data: CanvasEdgeData {
            relationship_type,
            relationship_id: relationship_id.map(str::to_string),
            label: sanitize_optional(label),
            routing_type: None,
            label_offset_x: None,
            label_offset_y: None,
            label_rotation: None,
            extra: Map::new(),
        },
    }
}

pub fn nodes_to_placements(nodes: &[CanvasNode]) -> Vec<Placement> {
    nodes
        .iter()
        .map(|node| Placement {
            entity_id: node.placement_key().to_string(),
            position: node.position,
            size: DEFAULT_NODE_SIZE,
            visual: Map::new(),
        })
        .collect()
}

/// Serialize a diagram for saving.
///
/// Edges without a `relationshipId` are not persisted: they are dropped from
/// `displayed_relationships` without error. Canvas settings are always the
/// defaults.
pub fn build_model_version_data(nodes: &[CanvasNode], edges: &[CanvasEdge]) -> ModelVersionData {
    ModelVersionData {
        placements: nodes_to_placements(nodes),
        displayed_relationships: edges
            .iter()
            .filter_map(|edge| edge.data.relationship_id.clone())
            .collect(),
        canvas: CanvasSettings::default(),
    }
}

/// Restore node positions from saved placements. Nodes are matched by their
/// placement key; nodes without a placement keep their position.
///
/// Returns how many nodes were moved.
pub fn apply_placements(nodes: &mut [CanvasNode], placements: &[Placement]) -> usize {
    let mut moved = 0;
    for node in nodes.iter_mut() {
        let Some(placement) = placements
            .iter()
            .find(|p| p.entity_id == node.placement_key())
        else {
            continue;
        };
        if node.position != placement.position {
            node.position = placement.position;
            moved += 1;
        }
    }
    moved
}

/// Set the routing of one edge. `None` restores the default routing.
///
/// Returns `false` if no edge has `edge_id`.
pub fn set_edge_routing(
    edges: &mut [CanvasEdge],
    edge_id: &str,
    routing: Option<EdgeRoutingType>,
) -> bool {
    match edges.iter_mut().find(|e| e.id == edge_id) {
        Some(edge) => {
            edge.data.routing_type = routing;
            true
        }
        None => false,
    }
}

/// Copy of `nodes` flagged for browse mode, or with the flag cleared.
pub fn with_browse_mode(nodes: &[CanvasNode], enabled: bool) -> Vec<CanvasNode> {
    nodes
        .iter()
        .cloned()
        .map(|mut node| {
            node.data.browse_mode = enabled.then_some(true);
            node
        })
        .collect()
}
