//! Selection sets and the rectangular marquee gesture.

use crate::canvas::CanvasContent;
use crate::geometry::{is_degenerate, rect_from_points};
use crate::input::Modifiers;
use crate::model::{EntityId, ThumbnailId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Selected entities. Thumbnails and labels live in separate id namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub thumbnails: HashSet<ThumbnailId>,
    pub labels: HashSet<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty() && self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.thumbnails.len() + self.labels.len()
    }

    pub fn clear(&mut self) {
        self.thumbnails.clear();
        self.labels.clear();
    }

    pub fn contains_thumbnail(&self, id: &str) -> bool {
        self.thumbnails.contains(id)
    }

    pub fn contains_label(&self, id: EntityId) -> bool {
        self.labels.contains(&id)
    }

    /// Combine with another selection under the given mode.
    pub fn combine(&self, hits: &Selection, mode: SelectionMode) -> Selection {
        Selection {
            thumbnails: mode.apply(&self.thumbnails, &hits.thumbnails),
            labels: mode.apply(&self.labels, &hits.labels),
        }
    }

    /// Drop ids that no longer reference live entities.
    pub fn retain_live(&mut self, content: &CanvasContent) {
        self.thumbnails.retain(|id| content.has_thumbnail(id));
        self.labels.retain(|id| content.label(*id).is_some());
    }
}

/// How a marquee or click result merges with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Replace the selection with the hits.
    #[default]
    Replace,
    /// Add the hits to the selection.
    Union,
    /// Flip membership of every hit (XOR).
    Toggle,
}

impl SelectionMode {
    /// Ctrl/Cmd toggles, otherwise Shift unions, otherwise replace.
    pub fn from_modifiers(modifiers: &Modifiers) -> Self {
        if modifiers.command() {
            SelectionMode::Toggle
        } else if modifiers.shift {
            SelectionMode::Union
        } else {
            SelectionMode::Replace
        }
    }

    fn apply<T: Clone + Eq + Hash>(self, current: &HashSet<T>, hits: &HashSet<T>) -> HashSet<T> {
        match self {
            SelectionMode::Replace => hits.clone(),
            SelectionMode::Union => current.union(hits).cloned().collect(),
            SelectionMode::Toggle => current.symmetric_difference(hits).cloned().collect(),
        }
    }
}

/// Entities intersecting a world-space rectangle.
pub fn hits_in_rect(content: &CanvasContent, rect: Rect) -> Selection {
    Selection {
        thumbnails: content.thumbnails_in_rect(rect).into_iter().collect(),
        labels: content.labels_in_rect(rect).into_iter().collect(),
    }
}

/// An in-progress marquee drag in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MarqueeDrag {
    origin: Point,
    current: Point,
}

/// Rectangular marquee selection gesture.
///
/// While dragging, [`MarqueeSelection::pending`] reports the entities under
/// the rectangle. Nothing is committed until [`MarqueeSelection::end`].
#[derive(Debug, Clone, Default)]
pub struct MarqueeSelection {
    drag: Option<MarqueeDrag>,
    /// Minimum rectangle extent in screen pixels.
    threshold: f64,
}

impl MarqueeSelection {
    pub fn new(threshold: f64) -> Self {
        Self {
            drag: None,
            threshold,
        }
    }

    pub fn start(&mut self, point: Point) {
        self.drag = Some(MarqueeDrag {
            origin: point,
            current: point,
        });
    }

    pub fn update(&mut self, point: Point) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current = point;
        }
    }

    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    /// Current normalized rectangle.
    pub fn rect(&self) -> Option<Rect> {
        self.drag.map(|d| rect_from_points(d.origin, d.current))
    }

    /// Whether the rectangle is still too small to count as a drag at `scale`.
    pub fn is_click(&self, scale: f64) -> bool {
        self.rect()
            .is_none_or(|rect| is_degenerate(rect, self.threshold / scale))
    }

    /// Entities the rectangle would select right now. Empty below the threshold.
    pub fn pending(&self, content: &CanvasContent, scale: f64) -> Selection {
        match self.rect() {
            Some(rect) if !self.is_click(scale) => hits_in_rect(content, rect),
            _ => Selection::new(),
        }
    }

    /// Finish the gesture. Returns the new selection, or `None` when the
    /// gesture was a click (or no drag was active) and selection must not change.
    pub fn end(
        &mut self,
        point: Point,
        modifiers: &Modifiers,
        content: &CanvasContent,
        current: &Selection,
        scale: f64,
    ) -> Option<Selection> {
        self.update(point);
        let rect = self.rect()?;
        let is_click = self.is_click(scale);
        self.drag = None;
        if is_click {
            return None;
        }
        let hits = hits_in_rect(content, rect);
        Some(current.combine(&hits, SelectionMode::from_modifiers(modifiers)))
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::tests::thumbnail;
    use crate::model::{LabelStyle, TextLabel};

    fn content() -> CanvasContent {
        let mut content = CanvasContent::new();
        content.thumbnails.push(thumbnail("a", 0.0, 0.0));
        content.thumbnails.push(thumbnail("b", 400.0, 0.0));
        content.thumbnails.push(thumbnail("c", 800.0, 0.0));
        content.labels.push(TextLabel::new(
            Point::new(0.0, 400.0),
            "label".into(),
            LabelStyle::default(),
        ));
        content
    }

    fn ids(list: &[&str]) -> HashSet<ThumbnailId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_modifier_precedence() {
        assert_eq!(SelectionMode::from_modifiers(&Modifiers::NONE), SelectionMode::Replace);
        assert_eq!(SelectionMode::from_modifiers(&Modifiers::shift()), SelectionMode::Union);
        let both = Modifiers {
            shift: true,
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(SelectionMode::from_modifiers(&both), SelectionMode::Toggle);
    }

    #[test]
    fn test_combine_modes() {
        let current = Selection {
            thumbnails: ids(&["a", "b"]),
            ..Selection::new()
        };
        let hits = Selection {
            thumbnails: ids(&["b", "c"]),
            ..Selection::new()
        };
        assert_eq!(
            current.combine(&hits, SelectionMode::Replace).thumbnails,
            ids(&["b", "c"])
        );
        assert_eq!(
            current.combine(&hits, SelectionMode::Union).thumbnails,
            ids(&["a", "b", "c"])
        );
        assert_eq!(
            current.combine(&hits, SelectionMode::Toggle).thumbnails,
            ids(&["a", "c"])
        );
    }

    #[test]
    fn test_marquee_selects_thumbnails_and_labels() {
        let content = content();
        let mut marquee = MarqueeSelection::new(3.0);
        marquee.start(Point::new(700.0, 500.0));
        marquee.update(Point::new(350.0, 100.0));
        let pending = marquee.pending(&content, 1.0);
        assert_eq!(pending.thumbnails, ids(&["b"]));
        assert!(pending.labels.is_empty());

        let selection = marquee
            .end(Point::new(-10.0, 100.0), &Modifiers::NONE, &content, &Selection::new(), 1.0)
            .expect("drag commits");
        assert_eq!(selection.thumbnails, ids(&["a", "b"]));
        assert_eq!(selection.labels.len(), 1);
        assert!(!marquee.is_active());
    }

    #[test]
    fn test_click_below_threshold_changes_nothing() {
        let content = content();
        let current = Selection {
            thumbnails: ids(&["c"]),
            ..Selection::new()
        };
        let mut marquee = MarqueeSelection::new(3.0);
        marquee.start(Point::new(10.0, 10.0));
        assert!(marquee.pending(&content, 1.0).is_empty());
        assert!(marquee
            .end(Point::new(11.0, 12.0), &Modifiers::NONE, &content, &current, 1.0)
            .is_none());
    }

    #[test]
    fn test_threshold_scales_with_zoom() {
        let mut marquee = MarqueeSelection::new(3.0);
        marquee.start(Point::new(0.0, 0.0));
        marquee.update(Point::new(2.0, 0.0));
        // 2 world units is 1 screen pixel at 0.5x but 8 pixels at 4x.
        assert!(marquee.is_click(0.5));
        assert!(!marquee.is_click(4.0));
    }

    #[test]
    fn test_fully_inside_and_outside() {
        let content = content();
        let inside = hits_in_rect(&content, Rect::new(-50.0, -50.0, 370.0, 290.0));
        assert!(inside.contains_thumbnail("a"));
        let outside = hits_in_rect(&content, Rect::new(-500.0, -500.0, -1.0, -1.0));
        assert!(outside.is_empty());
        // Rectangle ending exactly on a's left edge still touches it.
        let touching = hits_in_rect(&content, Rect::new(-100.0, 10.0, 0.0, 20.0));
        assert!(touching.contains_thumbnail("a"));
    }

    #[test]
    fn test_retain_live() {
        let content = content();
        let mut selection = Selection {
            thumbnails: ids(&["a", "gone"]),
            labels: [uuid::Uuid::new_v4()].into_iter().collect(),
        };
        selection.retain_live(&content);
        assert_eq!(selection.thumbnails, ids(&["a"]));
        assert!(selection.labels.is_empty());
    }
}
