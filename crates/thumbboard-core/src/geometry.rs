//! Geometry helpers shared by selection, drawing and hit-testing.

use kurbo::{Point, Rect};

/// Build a normalized rectangle from two arbitrary corner points.
///
/// The result is independent of the order of the corners.
pub fn rect_from_points(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Axis-aligned overlap test. Touching edges count as overlapping.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    !(a.x1 < b.x0 || a.x0 > b.x1 || a.y1 < b.y0 || a.y0 > b.y1)
}

/// Point-in-rectangle test with all four edges inclusive.
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Bounding box of a point list (`Rect::ZERO` for an empty list).
pub fn points_bounds(points: &[Point]) -> Rect {
    if points.is_empty() {
        return Rect::ZERO;
    }

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::new(min_x, min_y, max_x, max_y)
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}

/// Perpendicular distance from a point to the infinite line through two points.
pub fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        return point.distance(line_start);
    }

    // Area of triangle * 2 / base = height
    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}

/// Whether a rectangle is too small (in both dimensions) to count as a drag.
pub fn is_degenerate(rect: Rect, min_extent: f64) -> bool {
    rect.width() < min_extent && rect.height() < min_extent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_points_is_order_independent() {
        let pairs = [
            (Point::new(10.0, 20.0), Point::new(-5.0, 40.0)),
            (Point::new(0.0, 0.0), Point::new(100.0, 100.0)),
            (Point::new(7.5, -3.0), Point::new(7.5, 12.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(rect_from_points(a, b), rect_from_points(b, a));
            let r = rect_from_points(a, b);
            assert!(r.x0 <= r.x1 && r.y0 <= r.y1);
        }
    }

    #[test]
    fn test_rect_from_points_extent() {
        let r = rect_from_points(Point::new(30.0, 10.0), Point::new(10.0, 50.0));
        assert_eq!(r, Rect::new(10.0, 10.0, 30.0, 50.0));
        assert!((r.width() - 20.0).abs() < f64::EPSILON);
        assert!((r.height() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlap_inside_outside() {
        let sel = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(rects_overlap(sel, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!rects_overlap(sel, Rect::new(150.0, 150.0, 200.0, 200.0)));
        assert!(rects_overlap(sel, Rect::new(90.0, 90.0, 200.0, 200.0)));
    }

    #[test]
    fn test_overlap_touching_edges_is_inclusive() {
        let sel = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Shares the right edge exactly.
        assert!(rects_overlap(sel, Rect::new(100.0, 10.0, 150.0, 20.0)));
        // Shares only a corner.
        assert!(rects_overlap(sel, Rect::new(100.0, 100.0, 120.0, 120.0)));
        // Just past the edge.
        assert!(!rects_overlap(sel, Rect::new(100.001, 10.0, 150.0, 20.0)));
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_contains(r, Point::new(10.0, 10.0)));
        assert!(rect_contains(r, Point::new(0.0, 5.0)));
        assert!(!rect_contains(r, Point::new(10.5, 5.0)));
    }

    #[test]
    fn test_points_bounds() {
        let bounds = points_bounds(&[
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
        ]);
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(points_bounds(&[]), Rect::ZERO);
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_dist(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-10);
        assert!((point_to_segment_dist(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_degenerate() {
        assert!(is_degenerate(Rect::new(0.0, 0.0, 1.0, 2.0), 3.0));
        assert!(!is_degenerate(Rect::new(0.0, 0.0, 1.0, 20.0), 3.0));
    }
}
