//! The single mutable state cell.

use super::{Action, AppState, apply};
use crate::viewport::Viewport;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type StateListener = Box<dyn FnMut(&AppState, &Action)>;
type ViewportListener = Box<dyn FnMut(&Viewport)>;

/// Owns the current [`AppState`]. All mutation goes through [`Store::dispatch`].
///
/// Event handlers read [`Store::state`] directly; listeners are notified
/// after every dispatch that changed something.
pub struct Store {
    state: AppState,
    revision: u64,
    next_listener: u64,
    listeners: Vec<(ListenerId, StateListener)>,
    viewport_listeners: Vec<(ListenerId, ViewportListener)>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            revision: 0,
            next_listener: 0,
            listeners: Vec::new(),
            viewport_listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bumped on every state change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    /// Apply an action. Returns `true` when the state changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let viewport_before = self.state.ui.viewport;
        let changed = apply(&mut self.state, &action);
        log::debug!(
            "dispatch {} changed={} past={} future={}",
            action.tag(),
            changed,
            self.state.history.past_len(),
            self.state.history.future_len()
        );
        if !changed {
            return false;
        }

        self.revision += 1;
        for (_, listener) in &mut self.listeners {
            listener(&self.state, &action);
        }
        if self.state.ui.viewport != viewport_before {
            let viewport = self.state.ui.viewport;
            for (_, listener) in &mut self.viewport_listeners {
                listener(&viewport);
            }
        }
        true
    }

    pub fn undo(&mut self) -> bool {
        self.dispatch(Action::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.dispatch(Action::Redo)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AppState, &Action) + 'static) -> ListenerId {
        let id = self.next_id();
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Register a callback for viewport transform changes.
    pub fn subscribe_viewport(&mut self, listener: impl FnMut(&Viewport) + 'static) -> ListenerId {
        let id = self.next_id();
        self.viewport_listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener of either kind. Returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len() + self.viewport_listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.viewport_listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len() + self.viewport_listeners.len()
    }

    fn next_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }
}
