//! Bounded linear undo/redo history.

use crate::canvas::CanvasContent;
use crate::selection::Selection;
use std::collections::VecDeque;

/// Default number of snapshots kept on each stack.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Copy of the undoable part of the state.
///
/// `action` names the action the snapshot was taken for.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub action: &'static str,
    pub timestamp_ms: u64,
    pub canvas: CanvasContent,
    pub selection: Selection,
}

/// Past and future snapshot stacks. The present lives in the state itself.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: VecDeque<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record the present before a mutating action. Clears the redo stack.
    pub fn record(
        &mut self,
        action: &'static str,
        timestamp_ms: u64,
        canvas: &CanvasContent,
        selection: &Selection,
    ) {
        push_bounded(
            &mut self.past,
            Snapshot {
                action,
                timestamp_ms,
                canvas: canvas.clone(),
                selection: selection.clone(),
            },
            self.limit,
        );
        self.future.clear();
    }

    /// Restore the most recent snapshot. Returns `false` if there is none.
    pub fn undo(&mut self, canvas: &mut CanvasContent, selection: &mut Selection) -> bool {
        let Some(snapshot) = self.past.pop_back() else {
            return false;
        };
        let present = swap_present(snapshot, canvas, selection);
        push_bounded(&mut self.future, present, self.limit);
        true
    }

    /// Re-apply the most recently undone state. Returns `false` if there is none.
    pub fn redo(&mut self, canvas: &mut CanvasContent, selection: &mut Selection) -> bool {
        let Some(snapshot) = self.future.pop_back() else {
            return false;
        };
        let present = swap_present(snapshot, canvas, selection);
        push_bounded(&mut self.past, present, self.limit);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Name of the action that `undo` would revert.
    pub fn undo_label(&self) -> Option<&'static str> {
        self.past.back().map(|s| s.action)
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.future.back().map(|s| s.action)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

/// Put `snapshot` into the present and return the previous present, keeping
/// the snapshot's action name so the label follows the entry across stacks.
fn swap_present(
    snapshot: Snapshot,
    canvas: &mut CanvasContent,
    selection: &mut Selection,
) -> Snapshot {
    let Snapshot {
        action,
        timestamp_ms,
        canvas: restored_canvas,
        selection: restored_selection,
    } = snapshot;
    Snapshot {
        action,
        timestamp_ms,
        canvas: std::mem::replace(canvas, restored_canvas),
        selection: std::mem::replace(selection, restored_selection),
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, limit: usize) {
    stack.push_back(snapshot);
    while stack.len() > limit {
        stack.pop_front();
    }
}
