//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 5.0;

/// Viewport manages the world-to-screen transform for the canvas.
///
/// `screen = world * scale + offset`. The scale is kept inside
/// `[min_scale, max_scale]` by every mutating method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation (pan) in screen pixels.
    pub offset: Vec2,
    /// Current uniform scale.
    pub scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewport with custom scale limits.
    ///
    /// The limits are ordered and bounded to `[MIN_SCALE, MAX_SCALE]`.
    pub fn with_limits(min_scale: f64, max_scale: f64) -> Self {
        let (min_scale, max_scale) = scale_limits(min_scale, max_scale);
        Self {
            min_scale,
            max_scale,
            scale: 1.0_f64.clamp(min_scale, max_scale),
            ..Self::default()
        }
    }

    /// Get the affine transform for rendering (world → screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Get the inverse transform for input handling (screen → world).
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a screen-space length to world units.
    pub fn screen_len_to_world(&self, len: f64) -> f64 {
        len / self.scale
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the scale directly, clamped to the limits.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    ///
    /// Returns `false` when the clamped scale did not change.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) -> bool {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return false;
        }

        let world = self.screen_to_world(screen_point);
        self.scale = new_scale;
        self.offset = screen_point.to_vec2() - world.to_vec2() * new_scale;
        true
    }

    /// Zoom factor for a wheel event: `1 - delta_y * sensitivity`.
    pub fn wheel_factor(delta_y: f64, sensitivity: f64) -> f64 {
        1.0 - delta_y * sensitivity
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0_f64.clamp(self.min_scale, self.max_scale);
    }

    /// Fit the viewport to show the given bounding box centered on screen.
    pub fn fit_to_bounds(&mut self, bounds: Rect, screen: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (screen.width - padding * 2.0).max(1.0),
            (screen.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.scale = scale_x.min(scale_y).clamp(self.min_scale, self.max_scale);

        let bounds_center = bounds.center();
        let screen_center = Point::new(screen.width / 2.0, screen.height / 2.0);
        self.offset = screen_center.to_vec2() - bounds_center.to_vec2() * self.scale;
    }

    /// The world-space rectangle currently covered by a screen of the given size.
    pub fn visible_world_rect(&self, screen: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(screen.width, screen.height));
        Rect::from_points(top_left, bottom_right)
    }
}

/// Order a pair of scale limits and bound them to `[MIN_SCALE, MAX_SCALE]`.
///
/// Non-finite limits fall back to the global bound on that side.
pub fn scale_limits(min_scale: f64, max_scale: f64) -> (f64, f64) {
    let bound = |value: f64, fallback: f64| {
        if value.is_finite() {
            value.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            fallback
        }
    };
    let (lo, hi) = (bound(min_scale, MIN_SCALE), bound(max_scale, MAX_SCALE));
    (lo.min(hi), lo.max(hi))
}
