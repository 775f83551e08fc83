//! Canvas content: every entity on the board and the lookups over it.

use crate::geometry::{rect_contains, rects_overlap};
use crate::model::{Comment, Drawing, EntityId, TextLabel, Thumbnail, ThumbnailId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// All content on the board. This is the part of the state covered by undo.
///
/// Vectors are kept in paint order (back to front).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasContent {
    pub thumbnails: Vec<Thumbnail>,
    /// Explicit thumbnail positions. Absent ids use `Thumbnail::default_position`.
    pub positions: HashMap<ThumbnailId, Point>,
    pub locked: HashSet<ThumbnailId>,
    pub comments: Vec<Comment>,
    pub drawings: Vec<Drawing>,
    pub labels: Vec<TextLabel>,
}

impl CanvasContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty()
            && self.comments.is_empty()
            && self.drawings.is_empty()
            && self.labels.is_empty()
    }

    pub fn thumbnail(&self, id: &str) -> Option<&Thumbnail> {
        self.thumbnails.iter().find(|t| t.id == id)
    }

    pub fn has_thumbnail(&self, id: &str) -> bool {
        self.thumbnail(id).is_some()
    }

    /// Current top-left corner of a thumbnail.
    pub fn thumbnail_position(&self, id: &str) -> Option<Point> {
        let thumbnail = self.thumbnail(id)?;
        Some(
            self.positions
                .get(id)
                .copied()
                .unwrap_or(thumbnail.default_position),
        )
    }

    pub fn thumbnail_bounds(&self, id: &str) -> Option<Rect> {
        self.thumbnail_position(id).map(Thumbnail::bounds_at)
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.locked.contains(id)
    }

    pub fn comment(&self, id: EntityId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn comment_mut(&mut self, id: EntityId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    pub fn drawing(&self, id: EntityId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    pub fn label(&self, id: EntityId) -> Option<&TextLabel> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn label_mut(&mut self, id: EntityId) -> Option<&mut TextLabel> {
        self.labels.iter_mut().find(|l| l.id == id)
    }

    /// Thumbnails whose bounds overlap `rect` (touching edges included).
    pub fn thumbnails_in_rect(&self, rect: Rect) -> Vec<ThumbnailId> {
        self.thumbnails
            .iter()
            .filter(|t| {
                self.thumbnail_bounds(&t.id)
                    .is_some_and(|bounds| rects_overlap(rect, bounds))
            })
            .map(|t| t.id.clone())
            .collect()
    }

    /// Labels whose bounds overlap `rect` (touching edges included).
    pub fn labels_in_rect(&self, rect: Rect) -> Vec<EntityId> {
        self.labels
            .iter()
            .filter(|l| rects_overlap(rect, l.bounds()))
            .map(|l| l.id)
            .collect()
    }

    /// Topmost thumbnail under a world point.
    pub fn thumbnail_at(&self, point: Point) -> Option<ThumbnailId> {
        self.thumbnails
            .iter()
            .rev()
            .find(|t| {
                self.thumbnail_bounds(&t.id)
                    .is_some_and(|bounds| rect_contains(bounds, point))
            })
            .map(|t| t.id.clone())
    }

    /// Topmost label under a world point.
    pub fn label_at(&self, point: Point) -> Option<EntityId> {
        self.labels
            .iter()
            .rev()
            .find(|l| rect_contains(l.bounds(), point))
            .map(|l| l.id)
    }

    /// Topmost comment marker under a world point at the given viewport scale.
    pub fn comment_at(&self, point: Point, scale: f64) -> Option<EntityId> {
        self.comments
            .iter()
            .rev()
            .find(|c| rect_contains(c.marker_bounds(scale), point))
            .map(|c| c.id)
    }

    /// Union of the bounds of all content, or `None` for an empty board.
    pub fn bounds(&self) -> Option<Rect> {
        let thumbnails = self
            .thumbnails
            .iter()
            .filter_map(|t| self.thumbnail_bounds(&t.id));
        let labels = self.labels.iter().map(TextLabel::bounds);
        let drawings = self.drawings.iter().map(Drawing::visual_bounds);
        let comments = self
            .comments
            .iter()
            .map(|c| Rect::from_points(c.position, c.position));

        thumbnails
            .chain(labels)
            .chain(drawings)
            .chain(comments)
            .reduce(|acc, r| acc.union(r))
    }

    /// Remove thumbnails together with their positions and lock entries.
    ///
    /// Returns the number of thumbnails removed.
    pub fn remove_thumbnails(&mut self, ids: &HashSet<ThumbnailId>) -> usize {
        let before = self.thumbnails.len();
        self.thumbnails.retain(|t| !ids.contains(&t.id));
        self.positions.retain(|id, _| !ids.contains(id));
        self.locked.retain(|id| !ids.contains(id));
        before - self.thumbnails.len()
    }

    pub fn remove_labels(&mut self, ids: &HashSet<EntityId>) -> usize {
        let before = self.labels.len();
        self.labels.retain(|l| !ids.contains(&l.id));
        before - self.labels.len()
    }

    pub fn remove_drawings(&mut self, ids: &HashSet<EntityId>) -> usize {
        let before = self.drawings.len();
        self.drawings.retain(|d| !ids.contains(&d.id));
        before - self.drawings.len()
    }

    /// Serialize the board to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
