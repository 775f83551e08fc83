//! ThumbBoard Scene Library
//!
//! Keeps a retained scene in step with the canvas store and routes input
//! from the scene back into store actions.

mod backend;
pub mod interaction;
pub mod path;
mod recording;
pub mod session;
pub mod sync;

pub use backend::{
    NodeHandle, NodeKey, NodeProps, SceneBackend, SceneError, SceneLayer, SceneResult, VisualState,
};
pub use interaction::{DragMove, DragTarget, Overrides};
pub use recording::{OpCounts, RecordedNode, RecordingBackend};
pub use session::CanvasSession;
pub use sync::{SceneFrame, SceneSync, SyncReport};
