//! Drag-to-move for canvas entities.

use kurbo::{Point, Vec2};
use std::collections::HashMap;
use thumbboard_core::canvas::CanvasContent;
use thumbboard_core::model::{EntityId, ThumbnailId};
use thumbboard_core::selection::Selection;
use thumbboard_core::state::{Action, EntityMove};

/// The entity a drag started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Thumbnail(ThumbnailId),
    Label(EntityId),
    Comment(EntityId),
}

/// Transient positions shown while a drag is in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub thumbnails: HashMap<ThumbnailId, Point>,
    pub labels: HashMap<EntityId, Point>,
    pub comments: HashMap<EntityId, Point>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty() && self.labels.is_empty() && self.comments.is_empty()
    }
}

/// Selection to commit before dragging `target`, if it changes.
///
/// Grabbing an unselected thumbnail or label selects just that entity.
/// Comments are not selectable.
pub fn selection_for_drag(target: &DragTarget, selection: &Selection) -> Option<Selection> {
    let mut only = Selection::new();
    match target {
        DragTarget::Thumbnail(id) if !selection.contains_thumbnail(id) => {
            only.thumbnails.insert(id.clone());
        }
        DragTarget::Label(id) if !selection.contains_label(*id) => {
            only.labels.insert(*id);
        }
        _ => return None,
    }
    Some(only)
}

/// An in-flight move of one or more entities.
#[derive(Debug, Clone)]
pub struct DragMove {
    start_point: Point,
    current_point: Point,
    thumbnails: Vec<(ThumbnailId, Point)>,
    labels: Vec<(EntityId, Point)>,
    comments: Vec<(EntityId, Point)>,
}

impl DragMove {
    /// Capture start positions for a drag on `target` at world point `start`.
    ///
    /// Thumbnails and labels move as the whole current selection; locked
    /// thumbnails are left out. Returns `None` when nothing can move.
    pub fn begin(
        target: &DragTarget,
        start: Point,
        content: &CanvasContent,
        selection: &Selection,
    ) -> Option<Self> {
        let mut drag = Self {
            start_point: start,
            current_point: start,
            thumbnails: Vec::new(),
            labels: Vec::new(),
            comments: Vec::new(),
        };
        match target {
            DragTarget::Comment(id) => {
                let comment = content.comment(*id)?;
                drag.comments.push((comment.id, comment.position));
            }
            DragTarget::Thumbnail(_) | DragTarget::Label(_) => {
                // Canvas order keeps the captured list deterministic.
                drag.thumbnails = content
                    .thumbnails
                    .iter()
                    .filter(|t| selection.contains_thumbnail(&t.id) && !content.is_locked(&t.id))
                    .filter_map(|t| Some((t.id.clone(), content.thumbnail_position(&t.id)?)))
                    .collect();
                drag.labels = content
                    .labels
                    .iter()
                    .filter(|l| selection.contains_label(l.id))
                    .map(|l| (l.id, l.position))
                    .collect();
            }
        }
        if drag.is_empty() {
            log::debug!("drag on {:?}: nothing to move", target);
            return None;
        }
        Some(drag)
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty() && self.labels.is_empty() && self.comments.is_empty()
    }

    pub fn update(&mut self, point: Point) {
        self.current_point = point;
    }

    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    pub fn overrides(&self) -> Overrides {
        let delta = self.delta();
        Overrides {
            thumbnails: self
                .thumbnails
                .iter()
                .map(|(id, p)| (id.clone(), *p + delta))
                .collect(),
            labels: self.labels.iter().map(|(id, p)| (*id, *p + delta)).collect(),
            comments: self.comments.iter().map(|(id, p)| (*id, *p + delta)).collect(),
        }
    }

    /// The single action committing this drag. `None` if nothing moved.
    pub fn finish(self) -> Option<Action> {
        let delta = self.delta();
        if delta == Vec2::ZERO {
            return None;
        }
        Some(Action::MoveEntities {
            thumbnails: self
                .thumbnails
                .into_iter()
                .map(|(id, p)| EntityMove::new(id, p + delta))
                .collect(),
            labels: self
                .labels
                .into_iter()
                .map(|(id, p)| EntityMove::new(id, p + delta))
                .collect(),
            comments: self
                .comments
                .into_iter()
                .map(|(id, p)| EntityMove::new(id, p + delta))
                .collect(),
        })
    }
}
