//! Tool system for the board.

mod eraser;
mod stroke;

pub use eraser::{erase_hits, eraser_radius};
pub use stroke::{StrokeBuilder, StrokePreview, admission_distance, smooth_path};

use crate::model::{DrawKind, DrawLayer, StrokeStyle};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "tool", content = "kind", rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Draw(DrawKind),
    Eraser,
    /// Click to open the comment dialog at a point.
    Comment,
    /// Click to place a new text label.
    Label,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Draw(DrawKind::Freehand) => "freehand",
            ToolKind::Draw(DrawKind::Line) => "line",
            ToolKind::Draw(DrawKind::Rectangle) => "rectangle",
            ToolKind::Draw(DrawKind::Circle) => "circle",
            ToolKind::Eraser => "eraser",
            ToolKind::Comment => "comment",
            ToolKind::Label => "label",
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, ToolKind::Draw(_) | ToolKind::Eraser)
    }
}

/// Current tool and brush configuration. UI state, not covered by undo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub tool: ToolKind,
    pub brush: StrokeStyle,
    /// Eraser brush size in world units.
    pub eraser_size: f64,
    /// Layer assigned to new drawings.
    pub draw_layer: DrawLayer,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: ToolKind::Select,
            brush: StrokeStyle::default(),
            eraser_size: 10.0,
            draw_layer: DrawLayer::Above,
        }
    }
}
