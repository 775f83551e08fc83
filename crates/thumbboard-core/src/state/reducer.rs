//! State transitions.
//!
//! Actions that reference missing ids leave the state unchanged. Undoable
//! actions always record a snapshot first, even when they turn out to be
//! no-ops, so the redo stack is empty after every content or selection
//! dispatch.

use super::{Action, AppState, EntityMove, UiState};
use crate::canvas::CanvasContent;
use crate::model::{EntityId, ThumbnailId};
use crate::selection::Selection;
use crate::storage::Preferences;
use crate::time::now_ms;
use std::collections::HashSet;

/// Pure transition: returns the state after `action`.
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    let mut next = state.clone();
    apply(&mut next, action);
    next
}

/// Apply `action` in place. Returns `true` when the state changed
/// (including history).
pub fn apply(state: &mut AppState, action: &Action) -> bool {
    match action {
        Action::Undo => {
            let changed = state.history.undo(&mut state.canvas, &mut state.selection);
            if changed {
                drop_stale_ui(state);
            }
            changed
        }
        Action::Redo => {
            let changed = state.history.redo(&mut state.canvas, &mut state.selection);
            if changed {
                drop_stale_ui(state);
            }
            changed
        }
        Action::AddDrawing { drawing } if !drawing.has_geometry() => {
            log::warn!(
                "Ignoring {:?} drawing {} with {} points",
                drawing.kind,
                drawing.id,
                drawing.points().len()
            );
            false
        }
        action if action.is_undoable() => {
            state
                .history
                .record(action.tag(), now_ms(), &state.canvas, &state.selection);
            apply_content(&mut state.canvas, &mut state.selection, action);
            drop_stale_ui(state);
            true
        }
        action => apply_ui(&mut state.ui, &state.canvas, action),
    }
}

/// UI references into content must stay valid after content changes.
fn drop_stale_ui(state: &mut AppState) {
    if let Some(id) = state.ui.editing_label {
        if state.canvas.label(id).is_none() {
            state.ui.editing_label = None;
        }
    }
}

fn apply_content(canvas: &mut CanvasContent, selection: &mut Selection, action: &Action) {
    match action {
        Action::ImportThumbnails { thumbnails } => {
            for thumbnail in thumbnails {
                if !canvas.has_thumbnail(&thumbnail.id) {
                    canvas.thumbnails.push(thumbnail.clone());
                }
            }
        }
        Action::MoveEntities {
            thumbnails,
            labels,
            comments,
        } => move_entities(canvas, thumbnails, labels, comments),
        Action::ToggleThumbnailLock { id } => {
            if canvas.has_thumbnail(id) && !canvas.locked.remove(id) {
                canvas.locked.insert(id.clone());
            }
        }
        Action::SetLocked { ids, locked } => {
            for id in ids {
                if !canvas.has_thumbnail(id) {
                    continue;
                }
                if *locked {
                    canvas.locked.insert(id.clone());
                } else {
                    canvas.locked.remove(id);
                }
            }
        }
        Action::DeleteThumbnails { ids } => {
            let ids: HashSet<ThumbnailId> = ids.iter().cloned().collect();
            delete_thumbnails(canvas, selection, &ids);
        }
        Action::AddComment { comment } => {
            if canvas.comment(comment.id).is_none() {
                canvas.comments.push(comment.clone());
            }
        }
        Action::UpdateCommentText { id, text } => {
            if let Some(comment) = canvas.comment_mut(*id) {
                comment.text = text.clone();
            }
        }
        Action::ToggleCommentResolved { id } => {
            if let Some(comment) = canvas.comment_mut(*id) {
                comment.resolved = !comment.resolved;
            }
        }
        Action::DeleteComment { id } => canvas.comments.retain(|c| c.id != *id),
        Action::AddDrawing { drawing } => {
            if canvas.drawing(drawing.id).is_none() {
                canvas.drawings.push(drawing.clone());
            }
        }
        Action::DeleteDrawings { ids } => {
            let ids: HashSet<EntityId> = ids.iter().copied().collect();
            canvas.remove_drawings(&ids);
        }
        Action::ClearDrawings { layer } => match layer {
            Some(layer) => canvas.drawings.retain(|d| d.layer != *layer),
            None => canvas.drawings.clear(),
        },
        Action::AddLabel { label } => {
            if canvas.label(label.id).is_none() {
                canvas.labels.push(label.clone());
            }
        }
        Action::UpdateLabelText { id, text } => {
            if let Some(label) = canvas.label_mut(*id) {
                label.text = text.clone();
            }
        }
        Action::ApplyLabelStyle { ids, patch } => {
            for id in ids {
                if let Some(label) = canvas.label_mut(*id) {
                    patch.apply(&mut label.style);
                }
            }
        }
        Action::DeleteLabels { ids } => {
            let ids: HashSet<EntityId> = ids.iter().copied().collect();
            delete_labels(canvas, selection, &ids);
        }
        Action::DeleteSelection => {
            let thumbnails = selection.thumbnails.clone();
            let labels = selection.labels.clone();
            delete_thumbnails(canvas, selection, &thumbnails);
            delete_labels(canvas, selection, &labels);
        }
        Action::SetSelection { selection: next } => {
            let mut next = next.clone();
            next.retain_live(canvas);
            *selection = next;
        }
        Action::SelectAll => {
            selection.thumbnails = canvas.thumbnails.iter().map(|t| t.id.clone()).collect();
            selection.labels = canvas.labels.iter().map(|l| l.id).collect();
        }
        Action::ClearSelection => selection.clear(),
        other => log::warn!("{} is not a content action", other.tag()),
    }
}

fn move_entities(
    canvas: &mut CanvasContent,
    thumbnails: &[EntityMove<ThumbnailId>],
    labels: &[EntityMove<EntityId>],
    comments: &[EntityMove<EntityId>],
) {
    for EntityMove { id, to } in thumbnails {
        if canvas.has_thumbnail(id) && !canvas.is_locked(id) {
            canvas.positions.insert(id.clone(), *to);
        }
    }
    for EntityMove { id, to } in labels {
        if let Some(label) = canvas.label_mut(*id) {
            label.position = *to;
        }
    }
    for EntityMove { id, to } in comments {
        if let Some(comment) = canvas.comment_mut(*id) {
            comment.position = *to;
        }
    }
}

/// Remove thumbnails with their positions, lock entries and selection in one step.
fn delete_thumbnails(
    canvas: &mut CanvasContent,
    selection: &mut Selection,
    ids: &HashSet<ThumbnailId>,
) {
    canvas.remove_thumbnails(ids);
    selection.thumbnails.retain(|id| !ids.contains(id));
}

fn delete_labels(canvas: &mut CanvasContent, selection: &mut Selection, ids: &HashSet<EntityId>) {
    canvas.remove_labels(ids);
    selection.labels.retain(|id| !ids.contains(id));
}

fn apply_ui(ui: &mut UiState, canvas: &CanvasContent, action: &Action) -> bool {
    match action {
        Action::SetViewport { viewport } => {
            // Limits belong to the session; only the transform is taken.
            let mut next = ui.viewport;
            if viewport.offset.is_finite() {
                next.offset = viewport.offset;
            }
            if viewport.scale.is_finite() {
                next.set_scale(viewport.scale);
            }
            replace(&mut ui.viewport, next)
        }
        Action::SetTool { tool } => replace(&mut ui.tools.tool, *tool),
        Action::SetBrush { style } => replace(&mut ui.tools.brush, style.sanitized()),
        Action::SetEraserSize { size } => replace(&mut ui.tools.eraser_size, size.max(1.0)),
        Action::SetDrawLayer { layer } => replace(&mut ui.tools.draw_layer, *layer),
        Action::OpenCommentDialog { position } => replace(&mut ui.pending_comment, Some(*position)),
        Action::CloseCommentDialog => ui.pending_comment.take().is_some(),
        Action::BeginLabelEdit { id } => {
            canvas.label(*id).is_some() && replace(&mut ui.editing_label, Some(*id))
        }
        Action::EndLabelEdit => ui.editing_label.take().is_some(),
        Action::SetSidebar { open, width } => {
            let mut prefs = ui.preferences;
            if let Some(open) = open {
                prefs.sidebar_open = *open;
            }
            if let Some(width) = width {
                prefs.sidebar_width = Preferences::clamp_width(*width);
            }
            replace(&mut ui.preferences, prefs)
        }
        other => {
            log::warn!("{} is not a UI action", other.tag());
            false
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
