//! Bounded undo/redo over full diagram snapshots.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{CanvasEdge, CanvasNode};

/// Default number of undo steps kept.
pub const MAX_HISTORY: usize = 50;

/// An owned copy of the diagram. Never aliases the live node/edge vectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryEntry {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

impl HistoryEntry {
    pub fn capture(nodes: &[CanvasNode], edges: &[CanvasEdge]) -> Self {
        Self {
            nodes: nodes.to_vec(),
            edges: edges.to_vec(),
        }
    }
}

/// Linear undo history. A push after an undo discards the redo branch.
#[derive(Debug, Clone)]
pub struct CanvasHistory {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    capacity: usize,
}

impl Default for CanvasHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// History keeping at most `capacity` undo steps (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: Vec::new(),
            capacity,
        }
    }

    /// Record the state about to be changed. Clears the redo stack.
    pub fn push_state(&mut self, nodes: &[CanvasNode], edges: &[CanvasEdge]) {
        self.push_undo(HistoryEntry::capture(nodes, edges));
        if !self.redo_stack.is_empty() {
            trace!(discarded = self.redo_stack.len(), "redo branch discarded");
            self.redo_stack.clear();
        }
    }

    /// Step back. Returns the state to apply, or `None` when there is nothing
    /// to undo. The current state becomes redoable.
    pub fn undo(&mut self, nodes: &[CanvasNode], edges: &[CanvasEdge]) -> Option<HistoryEntry> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(HistoryEntry::capture(nodes, edges));
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, nodes: &[CanvasNode], edges: &[CanvasEdge]) -> Option<HistoryEntry> {
        let next = self.redo_stack.pop()?;
        self.push_undo(HistoryEntry::capture(nodes, edges));
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        if self.undo_stack.len() == self.capacity {
            self.undo_stack.pop_front();
            debug!(capacity = self.capacity, "oldest undo step evicted");
        }
        self.undo_stack.push_back(entry);
    }
}
