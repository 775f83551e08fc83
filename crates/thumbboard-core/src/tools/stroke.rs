//! Stroke capture, point admission and smoothing.

use crate::geometry::{is_degenerate, perpendicular_distance, rect_from_points};
use crate::model::{DrawKind, DrawLayer, Drawing, StrokeStyle};
use kurbo::Point;

/// Interior points closer than this to the chord are treated as collinear.
const COLLINEAR_EPSILON: f64 = 1e-6;

/// Minimum world distance between recorded points: `max(1, screen_px / scale)`.
pub fn admission_distance(screen_px: f64, scale: f64) -> f64 {
    (screen_px / scale).max(1.0)
}

/// Decimate a stroke.
///
/// A point is kept only when it is at least `tolerance` away from the last
/// kept point. The first and last points are always kept. Interior points
/// lying exactly on the line between their kept neighbours are removed
/// afterwards, so a straight stroke reduces to its endpoints.
pub fn smooth_path(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let (first, rest) = (points[0], &points[1..points.len() - 1]);
    let last = points[points.len() - 1];

    let mut kept = vec![first];
    for &point in rest {
        if kept.last().is_some_and(|prev| point.distance(*prev) >= tolerance) {
            kept.push(point);
        }
    }
    kept.push(last);

    rdp_simplify(&kept, COLLINEAR_EPSILON)
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// What the scene shows while a stroke is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePreview {
    pub kind: DrawKind,
    pub layer: DrawLayer,
    pub style: StrokeStyle,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    kind: DrawKind,
    layer: DrawLayer,
    style: StrokeStyle,
    points: Vec<Point>,
    /// Admission distance fixed at stroke start.
    min_distance: f64,
}

/// Builds one drawing from pointer input.
#[derive(Debug, Clone)]
pub struct StrokeBuilder {
    active: Option<ActiveStroke>,
    /// Screen-pixel admission distance.
    admission_px: f64,
    smoothing_tolerance: f64,
}

impl StrokeBuilder {
    pub fn new(admission_px: f64, smoothing_tolerance: f64) -> Self {
        Self {
            active: None,
            admission_px,
            smoothing_tolerance,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn stroke_start(
        &mut self,
        point: Point,
        kind: DrawKind,
        layer: DrawLayer,
        style: StrokeStyle,
        scale: f64,
    ) {
        let points = if kind.is_shape() {
            vec![point, point]
        } else {
            vec![point]
        };
        self.active = Some(ActiveStroke {
            kind,
            layer,
            style: style.sanitized(),
            points,
            min_distance: admission_distance(self.admission_px, scale),
        });
    }

    /// Feed a pointer position. Returns `true` when the stroke changed.
    pub fn stroke_move(&mut self, point: Point) -> bool {
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        if stroke.kind.is_shape() {
            // Shapes track only their start and current corner.
            if stroke.points[1] == point {
                return false;
            }
            stroke.points[1] = point;
            return true;
        }
        match stroke.points.last() {
            Some(last) if point.distance(*last) <= stroke.min_distance => false,
            _ => {
                stroke.points.push(point);
                true
            }
        }
    }

    /// Finalize the stroke.
    ///
    /// Freehand strokes are smoothed; a single-point freehand becomes a dot.
    /// Shapes smaller than the admission distance are discarded.
    pub fn stroke_end(&mut self) -> Option<Drawing> {
        let stroke = self.active.take()?;
        if stroke.kind.is_shape() {
            let (a, b) = (stroke.points[0], stroke.points[1]);
            let too_small = match stroke.kind {
                DrawKind::Line => a.distance(b) < stroke.min_distance,
                _ => is_degenerate(rect_from_points(a, b), stroke.min_distance),
            };
            if too_small {
                log::debug!("discarding degenerate {:?}", stroke.kind);
                return None;
            }
            return Some(Drawing::new(stroke.kind, stroke.layer, stroke.style, stroke.points));
        }

        let points = smooth_path(&stroke.points, self.smoothing_tolerance);
        log::debug!(
            "freehand stroke: {} captured, {} kept",
            stroke.points.len(),
            points.len()
        );
        Some(Drawing::new(DrawKind::Freehand, stroke.layer, stroke.style, points))
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn preview(&self) -> Option<StrokePreview> {
        self.active.as_ref().map(|s| StrokePreview {
            kind: s.kind,
            layer: s.layer,
            style: s.style,
            points: s.points.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> StrokeBuilder {
        StrokeBuilder::new(3.0, 2.0)
    }

    #[test]
    fn test_collinear_reduces_to_endpoints() {
        for tolerance in [0.5, 2.0, 10.0, 1000.0] {
            let points: Vec<Point> = (0..50)
                .map(|i| Point::new(i as f64 * 3.0, i as f64 * 1.5))
                .collect();
            let smoothed = smooth_path(&points, tolerance);
            assert_eq!(smoothed, vec![points[0], points[49]], "tolerance {tolerance}");
        }
    }

    #[test]
    fn test_decimation_keeps_first_and_last() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.5, 1.0),
            Point::new(5.0, 5.0),
            Point::new(5.2, 5.1),
            Point::new(10.0, 0.0),
        ];
        let smoothed = smooth_path(&points, 2.0);
        assert_eq!(
            smoothed,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 0.0)]
        );
        assert_eq!(smooth_path(&points[..2], 2.0), points[..2].to_vec());
    }

    #[test]
    fn test_admission_distance_depends_on_scale() {
        assert_eq!(admission_distance(3.0, 1.0), 3.0);
        assert_eq!(admission_distance(3.0, 0.5), 6.0);
        assert_eq!(admission_distance(3.0, 5.0), 1.0);
    }

    #[test]
    fn test_admission_filter() {
        let mut builder = builder();
        builder.stroke_start(
            Point::ZERO,
            DrawKind::Freehand,
            DrawLayer::Above,
            StrokeStyle::default(),
            1.0,
        );
        assert!(!builder.stroke_move(Point::new(2.0, 0.0)));
        assert!(!builder.stroke_move(Point::new(3.0, 0.0)));
        assert!(builder.stroke_move(Point::new(3.5, 0.0)));
        assert_eq!(builder.preview().map(|p| p.points.len()), Some(2));
    }

    #[test]
    fn test_single_point_freehand_is_dot() {
        let mut builder = builder();
        builder.stroke_start(
            Point::new(5.0, 5.0),
            DrawKind::Freehand,
            DrawLayer::Behind,
            StrokeStyle::default(),
            1.0,
        );
        let dot = builder.stroke_end().expect("dot kept");
        assert_eq!(dot.points(), &[Point::new(5.0, 5.0)]);
        assert_eq!(dot.layer, DrawLayer::Behind);
        assert!(!builder.is_active());
    }

    #[test]
    fn test_shapes_track_two_points() {
        let mut builder = builder();
        builder.stroke_start(
            Point::ZERO,
            DrawKind::Rectangle,
            DrawLayer::Above,
            StrokeStyle::default(),
            1.0,
        );
        builder.stroke_move(Point::new(50.0, 10.0));
        builder.stroke_move(Point::new(80.0, 40.0));
        let rect = builder.stroke_end().expect("rectangle kept");
        assert_eq!(rect.points(), &[Point::ZERO, Point::new(80.0, 40.0)]);

        builder.stroke_start(
            Point::ZERO,
            DrawKind::Circle,
            DrawLayer::Above,
            StrokeStyle::default(),
            1.0,
        );
        builder.stroke_move(Point::new(1.0, 1.0));
        assert!(builder.stroke_end().is_none());
    }
}
