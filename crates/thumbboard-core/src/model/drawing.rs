//! Finalized drawings (strokes and shape primitives).

use super::{EntityId, SerializableColor};
use crate::geometry::{point_to_segment_dist, points_bounds};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use uuid::Uuid;

/// Segments used to approximate a circle outline for hit testing.
const CIRCLE_OUTLINE_SEGMENTS: usize = 32;

/// Kind of drawing primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawKind {
    #[default]
    Freehand,
    Line,
    Rectangle,
    Circle,
}

impl DrawKind {
    /// Shape primitives keep only their two defining points.
    pub fn is_shape(self) -> bool {
        !matches!(self, DrawKind::Freehand)
    }
}

/// Z-layer of a drawing relative to thumbnails and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawLayer {
    Behind,
    #[default]
    Above,
}

/// Stroke appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: SerializableColor,
    pub width: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::new(239, 68, 68, 255),
            width: 4.0,
            alpha: 1.0,
        }
    }
}

impl StrokeStyle {
    /// Same style with the opacity clamped to `[0, 1]` and a positive width.
    pub fn sanitized(self) -> Self {
        Self {
            color: self.color,
            width: self.width.max(0.5),
            alpha: self.alpha.clamp(0.0, 1.0),
        }
    }
}

/// A finalized drawing. Points and bounds are fixed after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DrawingData", into = "DrawingData")]
pub struct Drawing {
    pub id: EntityId,
    pub kind: DrawKind,
    pub layer: DrawLayer,
    pub style: StrokeStyle,
    points: Vec<Point>,
    bounds: Rect,
}

impl Drawing {
    pub fn new(kind: DrawKind, layer: DrawLayer, style: StrokeStyle, points: Vec<Point>) -> Self {
        let bounds = points_bounds(&points);
        Self {
            id: Uuid::new_v4(),
            kind,
            layer,
            style,
            points,
            bounds,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Bounding box of the recorded points (stroke width not included).
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Bounds grown by half the stroke width, for culling.
    pub fn visual_bounds(&self) -> Rect {
        self.bounds.inflate(self.style.width / 2.0, self.style.width / 2.0)
    }

    /// Freehand needs one point, shapes need both corners.
    pub fn has_geometry(&self) -> bool {
        let needed = if self.kind.is_shape() { 2 } else { 1 };
        self.points.len() >= needed
    }

    /// Outline polyline used for hit testing shape primitives.
    pub fn outline(&self) -> Vec<Point> {
        match (self.kind, self.points.as_slice()) {
            (DrawKind::Freehand, _) | (_, [] | [_]) => self.points.clone(),
            (DrawKind::Line, [a, .., b]) => vec![*a, *b],
            (DrawKind::Rectangle, _) => {
                let r = self.bounds;
                vec![
                    Point::new(r.x0, r.y0),
                    Point::new(r.x1, r.y0),
                    Point::new(r.x1, r.y1),
                    Point::new(r.x0, r.y1),
                    Point::new(r.x0, r.y0),
                ]
            }
            (DrawKind::Circle, _) => {
                let center = self.bounds.center();
                let (rx, ry) = (self.bounds.width() / 2.0, self.bounds.height() / 2.0);
                (0..=CIRCLE_OUTLINE_SEGMENTS)
                    .map(|i| {
                        let t = TAU * i as f64 / CIRCLE_OUTLINE_SEGMENTS as f64;
                        Point::new(center.x + rx * t.cos(), center.y + ry * t.sin())
                    })
                    .collect()
            }
        }
    }

    /// Eraser test: a freehand stroke is hit when any recorded point lies
    /// within `radius`; a shape when its outline does.
    pub fn is_hit_by(&self, point: Point, radius: f64) -> bool {
        if !self.bounds.inflate(radius, radius).contains(point) {
            return false;
        }
        match self.kind {
            DrawKind::Freehand => self.points.iter().any(|p| p.distance(point) <= radius),
            _ => {
                let outline = self.outline();
                match outline.as_slice() {
                    [] => false,
                    [only] => only.distance(point) <= radius,
                    _ => outline
                        .windows(2)
                        .any(|seg| point_to_segment_dist(point, seg[0], seg[1]) <= radius),
                }
            }
        }
    }
}

/// Wire form of a drawing. Bounds are recomputed on load.
#[derive(Serialize, Deserialize)]
struct DrawingData {
    id: EntityId,
    kind: DrawKind,
    layer: DrawLayer,
    style: StrokeStyle,
    points: Vec<Point>,
}

impl From<DrawingData> for Drawing {
    fn from(data: DrawingData) -> Self {
        let bounds = points_bounds(&data.points);
        Self {
            id: data.id,
            kind: data.kind,
            layer: data.layer,
            style: data.style,
            points: data.points,
            bounds,
        }
    }
}

impl From<Drawing> for DrawingData {
    fn from(drawing: Drawing) -> Self {
        Self {
            id: drawing.id,
            kind: drawing.kind,
            layer: drawing.layer,
            style: drawing.style,
            points: drawing.points,
        }
    }
}
