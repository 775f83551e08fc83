//! Application state, actions and the undo/redo reducer.

mod action;
mod history;
mod reducer;
mod store;

pub use action::{Action, EntityMove};
pub use history::{History, MAX_UNDO_HISTORY, Snapshot};
pub use reducer::{apply, reduce};
pub use store::{ListenerId, Store};

use crate::canvas::CanvasContent;
use crate::model::EntityId;
use crate::selection::Selection;
use crate::storage::Preferences;
use crate::tools::ToolSettings;
use crate::viewport::Viewport;
use kurbo::Point;

/// UI state. Never recorded in history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub viewport: Viewport,
    pub tools: ToolSettings,
    /// World point the comment dialog is open for.
    pub pending_comment: Option<Point>,
    pub editing_label: Option<EntityId>,
    pub preferences: Preferences,
}

/// The whole state of one canvas session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub canvas: CanvasContent,
    pub selection: Selection,
    pub ui: UiState,
    pub history: History,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history: History::new(limit),
            ..Self::default()
        }
    }
}
