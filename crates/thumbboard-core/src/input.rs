//! Input state management for mouse/touch/keyboard events.

use crate::time::{Duration, Instant};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on Windows/Linux, Cmd on macOS. Either one counts.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Up {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}

/// Keyboard event type. Keys use DOM `KeyboardEvent.key` names (`" "`, `"Escape"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(500);
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Pointer, key and modifier state between frames.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last pointer position in screen coordinates.
    pub pointer_position: Point,
    pub modifiers: Modifiers,
    pressed_buttons: HashSet<MouseButton>,
    pressed_keys: HashSet<String>,
    just_pressed_keys: HashSet<String>,
    last_click: Option<(Instant, Point)>,
    double_click_detected: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.double_click_detected = false;
    }

    /// Process a pointer event that happened at `now`.
    pub fn handle_pointer_event_at(&mut self, event: &PointerEvent, now: Instant) {
        self.pointer_position = event.position();
        match *event {
            PointerEvent::Down { position, button } => {
                self.pressed_buttons.insert(button);
                if button == MouseButton::Left {
                    self.detect_double_click(position, now);
                }
            }
            PointerEvent::Up { button, .. } => {
                self.pressed_buttons.remove(&button);
            }
            PointerEvent::Move { .. } | PointerEvent::Scroll { .. } => {}
        }
    }

    fn detect_double_click(&mut self, position: Point, now: Instant) {
        match self.last_click {
            Some((at, last))
                if now.duration_since(at) < DOUBLE_CLICK_TIME
                    && position.distance(last) < DOUBLE_CLICK_DISTANCE =>
            {
                self.double_click_detected = true;
                // A third click starts a new pair.
                self.last_click = None;
            }
            _ => self.last_click = Some((now, position)),
        }
    }

    pub fn handle_key_event(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Pressed(key) => {
                if self.pressed_keys.insert(key.clone()) {
                    self.just_pressed_keys.insert(key);
                }
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    /// Whether the key went down since the last frame (key repeat excluded).
    pub fn is_key_just_pressed(&self, key: &str) -> bool {
        self.just_pressed_keys.contains(key)
    }

    /// Whether the last left-button press completed a double click.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }
}
