//! ThumbBoard Core Library
//!
//! Platform-agnostic data model and interaction logic for the ThumbBoard
//! canvas: viewport, marquee selection, drawing, and the undoable reducer.

pub mod canvas;
pub mod config;
pub mod critique;
pub mod geometry;
pub mod import;
pub mod input;
pub mod model;
pub mod navigation;
pub mod presence;
pub mod selection;
pub mod shortcuts;
pub mod state;
pub mod storage;
pub mod time;
pub mod tools;
pub mod viewport;

pub use canvas::CanvasContent;
pub use config::{CanvasConfig, GridConfig};
pub use critique::{Critique, CritiqueCache, CritiqueError, CritiqueProvider};
pub use import::{GridLayout, ImportError, ImportResult, ImportSource, VideoRecord};
pub use input::{InputState, Modifiers, MouseButton, PointerEvent};
pub use navigation::{ResizeDebouncer, ViewportController};
pub use presence::{ConnectionState, PresenceOverlay, RemoteCursor};
pub use selection::{MarqueeSelection, Selection, SelectionMode};
pub use shortcuts::{Command, ShortcutRegistry};
pub use state::{Action, AppState, History, Store};
pub use tools::{StrokeBuilder, ToolKind, ToolSettings};
pub use viewport::Viewport;
