//! State to scene reconciliation.
//!
//! Each frame the desired node set is derived from store state plus the
//! transient gesture overlays. [`SceneSync::reconcile`] then creates nodes
//! for new keys, destroys nodes whose key disappeared and updates a node
//! only when its props or visual state differ from what the backend holds.

use crate::backend::{NodeHandle, NodeKey, NodeProps, SceneBackend, SceneLayer, SceneResult, VisualState};
use crate::interaction::Overrides;
use crate::path::{drawing_path, stroke_paint};
use kurbo::{Rect, Size, Vec2};
use std::collections::{HashMap, HashSet};
use thumbboard_core::geometry::rects_overlap;
use thumbboard_core::model::{DrawLayer, Drawing, SerializableColor, Thumbnail};
use thumbboard_core::presence::PresenceOverlay;
use thumbboard_core::selection::Selection;
use thumbboard_core::state::AppState;
use thumbboard_core::tools::StrokePreview;
use thumbboard_core::viewport::Viewport;

/// Inputs for one reconcile pass.
pub struct SceneFrame<'a> {
    pub state: &'a AppState,
    pub overrides: &'a Overrides,
    /// Entities under the marquee while it is being dragged.
    pub pending: &'a Selection,
    pub marquee: Option<Rect>,
    pub preview: Option<StrokePreview>,
    pub presence: &'a PresenceOverlay,
    pub screen: Size,
}

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
    pub unchanged: usize,
    /// Drawings outside the visible world rect.
    pub culled: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.destroyed == 0
    }
}

#[derive(Debug, Clone)]
struct LiveNode {
    handle: NodeHandle,
    props: NodeProps,
    visual: VisualState,
}

enum Props<'a> {
    Ready(NodeProps),
    /// Drawings never change after creation; the path is built once.
    Drawing(&'a Drawing),
}

struct Desired<'a> {
    key: NodeKey,
    layer: SceneLayer,
    props: Props<'a>,
    visual: VisualState,
}

/// Owns the mapping from state keys to backend nodes.
#[derive(Debug, Default)]
pub struct SceneSync {
    nodes: HashMap<NodeKey, LiveNode>,
    keys: HashMap<NodeHandle, NodeKey>,
    view: Option<Viewport>,
    size: Option<Size>,
}

impl SceneSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Origin key of a backend node, for routing backend pointer events.
    pub fn key_for(&self, handle: NodeHandle) -> Option<&NodeKey> {
        self.keys.get(&handle)
    }

    pub fn handle_for(&self, key: &NodeKey) -> Option<NodeHandle> {
        self.nodes.get(key).map(|n| n.handle)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn reconcile<B: SceneBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame: &SceneFrame<'_>,
    ) -> SceneResult<SyncReport> {
        let viewport = frame.state.ui.viewport;
        if self.view != Some(viewport) {
            backend.set_view_transform(viewport.transform())?;
            self.view = Some(viewport);
        }
        if self.size != Some(frame.screen) {
            backend.resize(frame.screen)?;
            self.size = Some(frame.screen);
        }

        let desired = desired_nodes(frame);
        let mut report = SyncReport::default();

        let stale: Vec<NodeKey> = {
            let wanted: HashSet<&NodeKey> = desired.iter().map(|d| &d.key).collect();
            self.nodes
                .keys()
                .filter(|k| !wanted.contains(k))
                .cloned()
                .collect()
        };
        for key in stale {
            if let Some(node) = self.nodes.remove(&key) {
                self.keys.remove(&node.handle);
                backend.destroy_node(node.handle)?;
                report.destroyed += 1;
            }
        }

        for Desired {
            key,
            layer,
            props,
            visual,
        } in desired
        {
            if visual.hidden {
                report.culled += 1;
            }
            if let Some(node) = self.nodes.get_mut(&key) {
                let props = match props {
                    Props::Ready(props) if props != node.props => Some(props),
                    Props::Ready(_) | Props::Drawing(_) => None,
                };
                if props.is_none() && visual == node.visual {
                    report.unchanged += 1;
                    continue;
                }
                if let Some(props) = props {
                    node.props = props;
                }
                node.visual = visual;
                backend.update_node(node.handle, &node.props, visual)?;
                report.updated += 1;
                continue;
            }

            let props = match props {
                Props::Ready(props) => props,
                Props::Drawing(drawing) => drawing_props(drawing),
            };
            let handle = backend.create_node(&key, layer, &props, visual)?;
            self.keys.insert(handle, key.clone());
            self.nodes.insert(
                key,
                LiveNode {
                    handle,
                    props,
                    visual,
                },
            );
            report.created += 1;
        }

        if !report.is_noop() {
            log::debug!(
                "reconcile: +{} ~{} -{} ({} culled, {} live)",
                report.created,
                report.updated,
                report.destroyed,
                report.culled,
                self.nodes.len()
            );
        }
        Ok(report)
    }
}

fn drawing_props(drawing: &Drawing) -> NodeProps {
    let (path, filled) = drawing_path(drawing);
    NodeProps::Drawing {
        path,
        style: drawing.style,
        paint: stroke_paint(&drawing.style),
        filled,
    }
}

fn drawing_layer(layer: DrawLayer) -> SceneLayer {
    match layer {
        DrawLayer::Behind => SceneLayer::DrawingsBehind,
        DrawLayer::Above => SceneLayer::DrawingsAbove,
    }
}

/// Short count such as `1.2M` or `980`.
fn compact_count(n: u64) -> String {
    match n {
        0..1_000 => n.to_string(),
        1_000..1_000_000 => format!("{:.1}K", n as f64 / 1e3),
        _ => format!("{:.1}M", n as f64 / 1e6),
    }
}

fn caption(thumbnail: &Thumbnail) -> String {
    let mut caption = format!(
        "{} · {} views",
        thumbnail.channel_name,
        compact_count(thumbnail.metrics.view_count)
    );
    if let Some(duration) = thumbnail.duration_label() {
        caption.push_str(" · ");
        caption.push_str(&duration);
    }
    caption
}

fn desired_nodes<'a>(frame: &SceneFrame<'a>) -> Vec<Desired<'a>> {
    let state = frame.state;
    let canvas = &state.canvas;
    let visible = state.ui.viewport.visible_world_rect(frame.screen);
    let mut out = Vec::new();

    for drawing in &canvas.drawings {
        out.push(Desired {
            key: NodeKey::Drawing(drawing.id),
            layer: drawing_layer(drawing.layer),
            props: Props::Drawing(drawing),
            visual: VisualState {
                hidden: !rects_overlap(drawing.visual_bounds(), visible),
                ..VisualState::default()
            },
        });
    }

    for thumbnail in &canvas.thumbnails {
        let position = frame
            .overrides
            .thumbnails
            .get(&thumbnail.id)
            .copied()
            .or_else(|| canvas.thumbnail_position(&thumbnail.id))
            .unwrap_or(thumbnail.default_position);
        out.push(Desired {
            key: NodeKey::Thumbnail(thumbnail.id.clone()),
            layer: SceneLayer::Thumbnails,
            props: Props::Ready(NodeProps::Thumbnail {
                bounds: Thumbnail::bounds_at(position),
                title: thumbnail.title.clone(),
                image_url: thumbnail.thumbnail_url.clone(),
                caption: caption(thumbnail),
            }),
            visual: VisualState {
                selected: state.selection.contains_thumbnail(&thumbnail.id),
                pending: frame.pending.contains_thumbnail(&thumbnail.id),
                locked: canvas.is_locked(&thumbnail.id),
                hidden: false,
            },
        });
    }

    for label in &canvas.labels {
        let position = frame
            .overrides
            .labels
            .get(&label.id)
            .copied()
            .unwrap_or(label.position);
        let shift: Vec2 = position - label.position;
        out.push(Desired {
            key: NodeKey::Label(label.id),
            layer: SceneLayer::Labels,
            props: Props::Ready(NodeProps::Label {
                position,
                bounds: label.bounds() + shift,
                text: label.text.clone(),
                style: label.style,
                editing: state.ui.editing_label == Some(label.id),
            }),
            visual: VisualState {
                selected: state.selection.contains_label(label.id),
                pending: frame.pending.contains_label(label.id),
                ..VisualState::default()
            },
        });
    }

    for comment in &canvas.comments {
        let position = frame
            .overrides
            .comments
            .get(&comment.id)
            .copied()
            .unwrap_or(comment.position);
        out.push(Desired {
            key: NodeKey::Comment(comment.id),
            layer: SceneLayer::Comments,
            props: Props::Ready(NodeProps::Comment {
                position,
                text: comment.text.clone(),
                resolved: comment.resolved,
            }),
            visual: VisualState::default(),
        });
    }

    if let Some(preview) = &frame.preview {
        let drawing = Drawing::new(preview.kind, preview.layer, preview.style, preview.points.clone());
        out.push(Desired {
            key: NodeKey::StrokePreview,
            layer: drawing_layer(preview.layer),
            props: Props::Ready(drawing_props(&drawing)),
            visual: VisualState::default(),
        });
    }

    if let Some(rect) = frame.marquee {
        out.push(Desired {
            key: NodeKey::Marquee,
            layer: SceneLayer::Overlay,
            props: Props::Ready(NodeProps::Marquee { rect }),
            visual: VisualState::default(),
        });
    }

    for cursor in frame.presence.cursors() {
        out.push(Desired {
            key: NodeKey::RemoteCursor(cursor.user_id.clone()),
            layer: SceneLayer::Overlay,
            props: Props::Ready(NodeProps::RemoteCursor {
                position: cursor.position,
                name: cursor.name.clone(),
                color: SerializableColor::from_hex(&cursor.color)
                    .unwrap_or_else(SerializableColor::black),
            }),
            visual: VisualState::default(),
        });
    }

    out
}
