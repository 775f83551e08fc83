//! Tunable constants for the canvas interaction layer.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Where imported thumbnails land on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub origin: Point,
    pub columns: usize,
    /// Distance between the top-left corners of neighbouring slots.
    pub step: Vec2,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: Point::new(100.0, 100.0),
            columns: 5,
            step: Vec2::new(360.0, 280.0),
        }
    }
}

/// Canvas-wide interaction settings.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per wheel delta unit.
    pub wheel_sensitivity: f64,
    /// Multiplier used by the zoom-in/zoom-out commands.
    pub zoom_step: f64,
    pub resize_debounce_ms: u64,
    /// Marquee threshold in screen pixels.
    pub marquee_threshold: f64,
    /// Minimum screen distance between recorded stroke points.
    pub admission_distance: f64,
    pub smoothing_tolerance: f64,
    /// Eraser reach as a multiple of the eraser size.
    pub eraser_factor: f64,
    pub history_limit: usize,
    /// Padding used by fit-to-content, in screen pixels.
    pub fit_padding: f64,
    pub grid: GridConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 5.0,
            wheel_sensitivity: 0.001,
            zoom_step: 1.2,
            resize_debounce_ms: 150,
            marquee_threshold: 3.0,
            admission_distance: 3.0,
            smoothing_tolerance: 2.0,
            eraser_factor: 1.5,
            history_limit: 50,
            fit_padding: 40.0,
            grid: GridConfig::default(),
        }
    }
}

impl CanvasConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
