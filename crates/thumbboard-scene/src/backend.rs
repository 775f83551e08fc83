//! Scene backend abstraction.
//!
//! A backend owns retained visual nodes; the sync layer drives their
//! lifetime from store state.

use kurbo::{Affine, BezPath, Point, Rect, Size};
use peniko::Color;
use thiserror::Error;
use thumbboard_core::model::{EntityId, LabelStyle, SerializableColor, StrokeStyle, ThumbnailId};

/// Scene errors.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeHandle),
    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// What state entity a node was created for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Thumbnail(ThumbnailId),
    Comment(EntityId),
    Drawing(EntityId),
    Label(EntityId),
    RemoteCursor(String),
    /// The in-progress stroke.
    StrokePreview,
    /// The marquee rectangle.
    Marquee,
}

/// Z-ordered layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneLayer {
    DrawingsBehind,
    Thumbnails,
    DrawingsAbove,
    Labels,
    Comments,
    Overlay,
}

/// Opaque backend handle for a created node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u64);

/// Interaction state shown on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualState {
    pub selected: bool,
    /// Under the marquee but not committed yet.
    pub pending: bool,
    pub locked: bool,
    /// Culled: present but not drawn.
    pub hidden: bool,
}

/// Everything a backend needs to draw one node, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProps {
    Thumbnail {
        bounds: Rect,
        title: String,
        image_url: String,
        caption: String,
    },
    Comment {
        /// Marker tip.
        position: Point,
        text: String,
        resolved: bool,
    },
    Drawing {
        path: BezPath,
        style: StrokeStyle,
        /// Stroke color with the style opacity applied.
        paint: Color,
        /// Dots are filled instead of stroked.
        filled: bool,
    },
    Label {
        position: Point,
        bounds: Rect,
        text: String,
        style: LabelStyle,
        editing: bool,
    },
    RemoteCursor {
        position: Point,
        name: String,
        color: SerializableColor,
    },
    Marquee {
        rect: Rect,
    },
}

/// Retained-mode scene backend.
pub trait SceneBackend {
    fn create_node(
        &mut self,
        key: &NodeKey,
        layer: SceneLayer,
        props: &NodeProps,
        visual: VisualState,
    ) -> SceneResult<NodeHandle>;

    fn update_node(
        &mut self,
        handle: NodeHandle,
        props: &NodeProps,
        visual: VisualState,
    ) -> SceneResult<()>;

    fn destroy_node(&mut self, handle: NodeHandle) -> SceneResult<()>;

    /// World-to-screen transform for the whole scene.
    fn set_view_transform(&mut self, transform: Affine) -> SceneResult<()>;

    /// Output surface size changed.
    fn resize(&mut self, size: Size) -> SceneResult<()> {
        let _ = size;
        Ok(())
    }
}
