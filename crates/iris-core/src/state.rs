//! Live diagram state with history and change notification.

use std::fmt;

use tracing::debug;

use crate::canvas::{build_model_version_data, reserve_ids};
use crate::history::CanvasHistory;
use crate::{CanvasEdge, CanvasMode, CanvasNode, ModelVersionData};

/// What changed in a [`CanvasState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    Mutated,
    Undone,
    Redone,
    Loaded,
    ModeChanged(CanvasMode),
}

type Listener = Box<dyn FnMut(&CanvasEvent) + Send>;

/// The diagram being edited: nodes, edges, their undo history and the
/// edit/browse mode. Listeners are called after every change.
#[derive(Default)]
pub struct CanvasState {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    history: CanvasHistory,
    mode: CanvasMode,
    listeners: Vec<Listener>,
}

impl fmt::Debug for CanvasState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasState")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("mode", &self.mode)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: CanvasHistory) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    pub fn history(&self) -> &CanvasHistory {
        &self.history
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn is_edit_mode(&self) -> bool {
        self.mode == CanvasMode::Edit
    }

    pub fn is_browse_mode(&self) -> bool {
        self.mode == CanvasMode::Browse
    }

    pub fn set_mode(&mut self, mode: CanvasMode) {
        if self.mode != mode {
            self.mode = mode;
            self.notify(CanvasEvent::ModeChanged(mode));
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CanvasEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Apply an undoable change. The state before `f` runs is recorded first.
    pub fn mutate<R>(
        &mut self,
        f: impl FnOnce(&mut Vec<CanvasNode>, &mut Vec<CanvasEdge>) -> R,
    ) -> R {
        self.history.push_state(&self.nodes, &self.edges);
        let out = f(&mut self.nodes, &mut self.edges);
        self.notify(CanvasEvent::Mutated);
        out
    }

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.nodes, &self.edges) {
            Some(entry) => {
                self.nodes = entry.nodes;
                self.edges = entry.edges;
                self.notify(CanvasEvent::Undone);
                true
            }
            None => false,
        }
    }

    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.nodes, &self.edges) {
            Some(entry) => {
                self.nodes = entry.nodes;
                self.edges = entry.edges;
                self.notify(CanvasEvent::Redone);
                true
            }
            None => false,
        }
    }

    /// Replace the diagram, e.g. when opening another model. History starts
    /// over.
    pub fn load(&mut self, nodes: Vec<CanvasNode>, edges: Vec<CanvasEdge>) {
        reserve_ids(&nodes, &edges);
        self.nodes = nodes;
        self.edges = edges;
        self.history.clear();
        debug!(nodes = self.nodes.len(), edges = self.edges.len(), "canvas loaded");
        self.notify(CanvasEvent::Loaded);
    }

    pub fn to_model_version(&self) -> ModelVersionData {
        build_model_version_data(&self.nodes, &self.edges)
    }

    fn notify(&mut self, event: CanvasEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{create_canvas_edge, create_canvas_node, generate_node_id};
    use crate::{Position, SimpleEntityKind, SimpleRelationshipKind};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn recorder(state: &mut CanvasState) -> Arc<Mutex<Vec<CanvasEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        state.subscribe(move |e| sink.lock().unwrap().push(*e));
        events
    }

    fn add_service(state: &mut CanvasState, label: &str) -> String {
        let id = generate_node_id();
        let node = create_canvas_node(
            id.clone(),
            label,
            SimpleEntityKind::Service.into(),
            Position::new(0.0, 0.0),
            None,
            None,
        );
        state.mutate(|nodes, _| nodes.push(node));
        id
    }

    #[test]
    fn mutate_then_undo_restores_and_notifies() {
        let mut state = CanvasState::new();
        let events = recorder(&mut state);

        add_service(&mut state, "Orders");
        assert_eq!(state.nodes().len(), 1);

        assert!(state.undo());
        assert!(state.nodes().is_empty());
        assert_eq!(
            *events.lock().unwrap(),
            vec![CanvasEvent::Mutated, CanvasEvent::Undone]
        );

        assert!(state.redo());
        assert_eq!(state.nodes()[0].data.label, "Orders");
    }

    #[test]
    fn undo_on_fresh_state_changes_nothing() {
        let mut state = CanvasState::new();
        let events = recorder(&mut state);
        assert!(!state.undo());
        assert!(!state.redo());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn mutate_returns_closure_result() {
        let mut state = CanvasState::new();
        let a = add_service(&mut state, "A");
        let b = add_service(&mut state, "B");
        let edge_count = state.mutate(|_, edges| {
            edges.push(create_canvas_edge(
                "e1",
                a.clone(),
                b.clone(),
                SimpleRelationshipKind::Uses.into(),
                Some("rel-1"),
                None,
            ));
            edges.len()
        });
        assert_eq!(edge_count, 1);
        assert_eq!(state.history().undo_depth(), 3);

        let doc = state.to_model_version();
        assert_eq!(doc.placements.len(), 2);
        assert_eq!(doc.displayed_relationships, vec!["rel-1".to_string()]);
    }

    #[test]
    fn load_resets_history() {
        let mut state = CanvasState::new();
        add_service(&mut state, "A");
        let events = recorder(&mut state);

        state.load(Vec::new(), Vec::new());
        assert!(!state.history().can_undo());
        assert!(!state.undo());
        assert_eq!(*events.lock().unwrap(), vec![CanvasEvent::Loaded]);
    }

    #[test]
    fn mode_defaults_to_browse() {
        let mut state = CanvasState::new();
        let events = recorder(&mut state);
        assert!(state.is_browse_mode());

        state.set_mode(CanvasMode::Edit);
        state.set_mode(CanvasMode::Edit);
        assert!(state.is_edit_mode());
        assert_eq!(
            *events.lock().unwrap(),
            vec![CanvasEvent::ModeChanged(CanvasMode::Edit)]
        );
    }
}
