//! Actions: every state change is expressed as one of these.

use crate::model::{
    Comment, DrawLayer, Drawing, EntityId, LabelStylePatch, StrokeStyle, TextLabel, Thumbnail,
    ThumbnailId,
};
use crate::selection::Selection;
use crate::tools::ToolKind;
use crate::viewport::Viewport;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// New absolute position for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMove<Id> {
    pub id: Id,
    pub to: Point,
}

impl<Id> EntityMove<Id> {
    pub fn new(id: Id, to: Point) -> Self {
        Self { id, to }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    // Content
    ImportThumbnails {
        thumbnails: Vec<Thumbnail>,
    },
    /// Commit the result of a drag. Locked thumbnails are skipped.
    MoveEntities {
        #[serde(default)]
        thumbnails: Vec<EntityMove<ThumbnailId>>,
        #[serde(default)]
        labels: Vec<EntityMove<EntityId>>,
        #[serde(default)]
        comments: Vec<EntityMove<EntityId>>,
    },
    ToggleThumbnailLock {
        id: ThumbnailId,
    },
    SetLocked {
        ids: Vec<ThumbnailId>,
        locked: bool,
    },
    DeleteThumbnails {
        ids: Vec<ThumbnailId>,
    },
    AddComment {
        comment: Comment,
    },
    UpdateCommentText {
        id: EntityId,
        text: String,
    },
    ToggleCommentResolved {
        id: EntityId,
    },
    DeleteComment {
        id: EntityId,
    },
    AddDrawing {
        drawing: Drawing,
    },
    DeleteDrawings {
        ids: Vec<EntityId>,
    },
    /// Remove every drawing, or only those on one layer.
    ClearDrawings {
        #[serde(default)]
        layer: Option<DrawLayer>,
    },
    AddLabel {
        label: TextLabel,
    },
    UpdateLabelText {
        id: EntityId,
        text: String,
    },
    ApplyLabelStyle {
        ids: Vec<EntityId>,
        patch: LabelStylePatch,
    },
    DeleteLabels {
        ids: Vec<EntityId>,
    },
    /// Delete every selected thumbnail and label.
    DeleteSelection,

    // Selection
    SetSelection {
        selection: Selection,
    },
    SelectAll,
    ClearSelection,

    // UI
    SetViewport {
        viewport: Viewport,
    },
    SetTool {
        tool: ToolKind,
    },
    SetBrush {
        style: StrokeStyle,
    },
    SetEraserSize {
        size: f64,
    },
    SetDrawLayer {
        layer: DrawLayer,
    },
    OpenCommentDialog {
        position: Point,
    },
    CloseCommentDialog,
    BeginLabelEdit {
        id: EntityId,
    },
    EndLabelEdit,
    SetSidebar {
        #[serde(default)]
        open: Option<bool>,
        #[serde(default)]
        width: Option<f64>,
    },

    // History
    Undo,
    Redo,
}

impl Action {
    /// Stable name recorded in history snapshots and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::ImportThumbnails { .. } => "import_thumbnails",
            Action::MoveEntities { .. } => "move_entities",
            Action::ToggleThumbnailLock { .. } => "toggle_thumbnail_lock",
            Action::SetLocked { .. } => "set_locked",
            Action::DeleteThumbnails { .. } => "delete_thumbnails",
            Action::AddComment { .. } => "add_comment",
            Action::UpdateCommentText { .. } => "update_comment_text",
            Action::ToggleCommentResolved { .. } => "toggle_comment_resolved",
            Action::DeleteComment { .. } => "delete_comment",
            Action::AddDrawing { .. } => "add_drawing",
            Action::DeleteDrawings { .. } => "delete_drawings",
            Action::ClearDrawings { .. } => "clear_drawings",
            Action::AddLabel { .. } => "add_label",
            Action::UpdateLabelText { .. } => "update_label_text",
            Action::ApplyLabelStyle { .. } => "apply_label_style",
            Action::DeleteLabels { .. } => "delete_labels",
            Action::DeleteSelection => "delete_selection",
            Action::SetSelection { .. } => "set_selection",
            Action::SelectAll => "select_all",
            Action::ClearSelection => "clear_selection",
            Action::SetViewport { .. } => "set_viewport",
            Action::SetTool { .. } => "set_tool",
            Action::SetBrush { .. } => "set_brush",
            Action::SetEraserSize { .. } => "set_eraser_size",
            Action::SetDrawLayer { .. } => "set_draw_layer",
            Action::OpenCommentDialog { .. } => "open_comment_dialog",
            Action::CloseCommentDialog => "close_comment_dialog",
            Action::BeginLabelEdit { .. } => "begin_label_edit",
            Action::EndLabelEdit => "end_label_edit",
            Action::SetSidebar { .. } => "set_sidebar",
            Action::Undo => "undo",
            Action::Redo => "redo",
        }
    }

    /// Content and selection changes are recorded in history. UI state,
    /// viewport and the history commands themselves are not.
    pub fn is_undoable(&self) -> bool {
        match self {
            Action::ImportThumbnails { .. }
            | Action::MoveEntities { .. }
            | Action::ToggleThumbnailLock { .. }
            | Action::SetLocked { .. }
            | Action::DeleteThumbnails { .. }
            | Action::AddComment { .. }
            | Action::UpdateCommentText { .. }
            | Action::ToggleCommentResolved { .. }
            | Action::DeleteComment { .. }
            | Action::AddDrawing { .. }
            | Action::DeleteDrawings { .. }
            | Action::ClearDrawings { .. }
            | Action::AddLabel { .. }
            | Action::UpdateLabelText { .. }
            | Action::ApplyLabelStyle { .. }
            | Action::DeleteLabels { .. }
            | Action::DeleteSelection
            | Action::SetSelection { .. }
            | Action::SelectAll
            | Action::ClearSelection => true,
            Action::SetViewport { .. }
            | Action::SetTool { .. }
            | Action::SetBrush { .. }
            | Action::SetEraserSize { .. }
            | Action::SetDrawLayer { .. }
            | Action::OpenCommentDialog { .. }
            | Action::CloseCommentDialog
            | Action::BeginLabelEdit { .. }
            | Action::EndLabelEdit
            | Action::SetSidebar { .. }
            | Action::Undo
            | Action::Redo => false,
        }
    }
}
