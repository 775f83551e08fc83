//! Viewport controller: drag panning, space-bar panning, coalesced wheel
//! zoom and debounced resize.
//!
//! The controller owns only transient gesture state. It never holds the
//! viewport itself; every operation reads the current [`Viewport`] and
//! returns the new one (or `None` when nothing changed) for the caller to
//! dispatch into the store.

use crate::config::CanvasConfig;
use crate::time::{Duration, Instant};
use crate::tools::ToolKind;
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};

/// A wheel event waiting for the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingWheel {
    pub screen_point: Point,
    pub delta_y: f64,
}

/// Interprets raw navigation input into viewport changes.
#[derive(Debug, Clone)]
pub struct ViewportController {
    wheel_sensitivity: f64,
    zoom_step: f64,
    /// Last screen point of an active drag pan.
    pan_last: Option<Point>,
    /// Tool to restore when the space bar is released.
    space_restore: Option<ToolKind>,
    pending_wheel: Option<PendingWheel>,
    /// Wheel events replaced before a frame consumed them.
    coalesced_wheels: u64,
}

impl ViewportController {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            wheel_sensitivity: config.wheel_sensitivity,
            zoom_step: config.zoom_step,
            pan_last: None,
            space_restore: None,
            pending_wheel: None,
            coalesced_wheels: 0,
        }
    }

    pub fn pan(&self, viewport: &Viewport, delta: Vec2) -> Option<Viewport> {
        if delta == Vec2::ZERO {
            return None;
        }
        let mut next = *viewport;
        next.pan(delta);
        Some(next)
    }

    pub fn zoom_at(&self, viewport: &Viewport, screen_point: Point, factor: f64) -> Option<Viewport> {
        let mut next = *viewport;
        next.zoom_at(screen_point, factor).then_some(next)
    }

    pub fn pan_start(&mut self, screen_point: Point) {
        self.pan_last = Some(screen_point);
    }

    /// Continue a drag pan. Returns `None` when no pan is in progress.
    pub fn pan_move(&mut self, viewport: &Viewport, screen_point: Point) -> Option<Viewport> {
        let last = self.pan_last.replace(screen_point)?;
        self.pan(viewport, screen_point - last)
    }

    pub fn pan_end(&mut self) {
        self.pan_last = None;
    }

    pub fn is_panning(&self) -> bool {
        self.pan_last.is_some()
    }

    /// Space pressed. Returns the tool to switch to, or `None` on key repeat.
    pub fn space_pan_start(&mut self, current_tool: ToolKind) -> Option<ToolKind> {
        if self.space_restore.is_some() {
            return None;
        }
        self.space_restore = Some(current_tool);
        Some(ToolKind::Pan)
    }

    /// Space released. Returns the tool that was active before the press.
    pub fn space_pan_end(&mut self) -> Option<ToolKind> {
        self.pan_last = None;
        self.space_restore.take()
    }

    pub fn is_space_panning(&self) -> bool {
        self.space_restore.is_some()
    }

    /// Record a wheel event. Only the latest one survives until the next frame.
    pub fn queue_wheel(&mut self, screen_point: Point, delta_y: f64) {
        if self.pending_wheel.is_some() {
            self.coalesced_wheels += 1;
        }
        self.pending_wheel = Some(PendingWheel {
            screen_point,
            delta_y,
        });
    }

    pub fn has_pending_wheel(&self) -> bool {
        self.pending_wheel.is_some()
    }

    pub fn coalesced_wheels(&self) -> u64 {
        self.coalesced_wheels
    }

    /// Apply the pending wheel event, if any. Called once per frame.
    pub fn take_wheel_zoom(&mut self, viewport: &Viewport) -> Option<Viewport> {
        let wheel = self.pending_wheel.take()?;
        let factor = Viewport::wheel_factor(wheel.delta_y, self.wheel_sensitivity);
        self.zoom_at(viewport, wheel.screen_point, factor)
    }

    pub fn zoom_in(&self, viewport: &Viewport, screen: Size) -> Option<Viewport> {
        self.zoom_at(viewport, screen_center(screen), self.zoom_step)
    }

    pub fn zoom_out(&self, viewport: &Viewport, screen: Size) -> Option<Viewport> {
        self.zoom_at(viewport, screen_center(screen), 1.0 / self.zoom_step)
    }
}

fn screen_center(screen: Size) -> Point {
    Point::new(screen.width / 2.0, screen.height / 2.0)
}

/// Debounces window resize events.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<(Size, Instant)>,
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(Duration::from_millis(config.resize_debounce_ms))
    }

    /// Record a resize. Each push restarts the quiet period.
    pub fn push(&mut self, size: Size, now: Instant) {
        self.pending = Some((size, now));
    }

    /// Returns the latest size once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Size> {
        let (size, at) = self.pending?;
        if now.duration_since(at) >= self.delay {
            self.pending = None;
            Some(size)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
