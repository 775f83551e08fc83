//! Free-standing text labels.

use super::{EntityId, SerializableColor};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub color: SerializableColor,
    pub font_size: f64,
    pub bold: bool,
    pub background: Option<SerializableColor>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            font_size: 24.0,
            bold: false,
            background: None,
        }
    }
}

/// Partial style update applied to every selected label.
///
/// `background: Some(None)` clears the background.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStylePatch {
    pub color: Option<SerializableColor>,
    pub font_size: Option<f64>,
    pub bold: Option<bool>,
    pub background: Option<Option<SerializableColor>>,
}

impl LabelStylePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, style: &mut LabelStyle) {
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(size) = self.font_size {
            style.font_size = size.max(1.0);
        }
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(background) = self.background {
            style.background = background;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    pub id: EntityId,
    pub text: String,
    /// Top-left corner in world space.
    pub position: Point,
    #[serde(default)]
    pub style: LabelStyle,
}

impl TextLabel {
    pub fn new(position: Point, text: String, style: LabelStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            position,
            style,
        }
    }

    /// Approximate bounds from character count and font size.
    pub fn bounds(&self) -> Rect {
        let max_line_len = self
            .text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let char_width = if self.style.bold { 0.6 } else { 0.55 };
        let width = (max_line_len as f64 * self.style.font_size * char_width)
            .max(self.style.font_size);

        let mut line_count = self.text.lines().count().max(1);
        if self.text.ends_with('\n') {
            line_count += 1;
        }
        let height = line_count as f64 * self.style.font_size * 1.2;

        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + height,
        )
    }
}
