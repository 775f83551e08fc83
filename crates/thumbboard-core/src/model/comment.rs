//! Pinned review comments.

use super::EntityId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-screen size of a comment marker in pixels.
pub const COMMENT_MARKER_SIZE: f64 = 28.0;

/// A comment pinned to a world-space location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub position: Point,
    pub text: String,
    pub author: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub resolved: bool,
}

impl Comment {
    pub fn new(position: Point, text: String, author: String, timestamp: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            text,
            author,
            timestamp,
            resolved: false,
        }
    }

    /// World-space marker bounds at the given viewport scale.
    ///
    /// The marker keeps a constant screen size, so its world size is
    /// `COMMENT_MARKER_SIZE / scale`. The anchor is the marker's bottom-left tip.
    pub fn marker_bounds(&self, scale: f64) -> Rect {
        let size = COMMENT_MARKER_SIZE / scale;
        Rect::new(
            self.position.x,
            self.position.y - size,
            self.position.x + size,
            self.position.y,
        )
    }
}
