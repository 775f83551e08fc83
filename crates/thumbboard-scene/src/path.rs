//! Drawing geometry to kurbo paths.

use kurbo::{BezPath, Circle, Ellipse, Point, Rect, Shape};
use peniko::Color;
use thumbboard_core::model::{DrawKind, Drawing, StrokeStyle};

const PATH_TOLERANCE: f64 = 0.1;

/// Path for a drawing, and whether it should be filled (dots) or stroked.
///
/// A shape missing a corner yields an empty path.
pub fn drawing_path(drawing: &Drawing) -> (BezPath, bool) {
    let path = match (drawing.kind, drawing.points()) {
        (_, [center]) => {
            let radius = drawing.style.width / 2.0;
            return (Circle::new(*center, radius).to_path(PATH_TOLERANCE), true);
        }
        (DrawKind::Freehand, points) => smooth_polyline(points),
        (DrawKind::Line, points) => polyline(points),
        (DrawKind::Rectangle, [a, b, ..]) => Rect::from_points(*a, *b).to_path(PATH_TOLERANCE),
        (DrawKind::Circle, [a, b, ..]) => {
            Ellipse::from_rect(Rect::from_points(*a, *b)).to_path(PATH_TOLERANCE)
        }
        (DrawKind::Rectangle | DrawKind::Circle, []) => BezPath::new(),
    };
    (path, false)
}

/// Path through `points` using segment midpoints as quadratic end points.
///
/// With fewer than three points this is a plain polyline.
pub fn smooth_polyline(points: &[Point]) -> BezPath {
    if points.len() < 3 {
        return polyline(points);
    }
    let mut path = BezPath::new();
    path.move_to(points[0]);
    for pair in points[1..points.len() - 1].windows(2) {
        path.quad_to(pair[0], pair[0].midpoint(pair[1]));
    }
    path.line_to(points[points.len() - 1]);
    path
}

fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

/// Paint for a stroke, with the style opacity folded into the alpha channel.
pub fn stroke_paint(style: &StrokeStyle) -> Color {
    let alpha = (f64::from(style.color.a) * style.alpha.clamp(0.0, 1.0)).round() as u8;
    Color::from_rgba8(style.color.r, style.color.g, style.color.b, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;
    use thumbboard_core::model::DrawLayer;

    fn drawing(kind: DrawKind, points: Vec<Point>) -> Drawing {
        Drawing::new(kind, DrawLayer::Above, StrokeStyle::default(), points)
    }

    #[test]
    fn test_freehand_uses_midpoint_quads() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let (path, filled) = drawing_path(&drawing(DrawKind::Freehand, points));
        assert!(!filled);
        let els = path.elements();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(
            els[1],
            PathEl::QuadTo(Point::new(10.0, 0.0), Point::new(10.0, 5.0))
        );
        assert_eq!(
            els[2],
            PathEl::QuadTo(Point::new(10.0, 10.0), Point::new(5.0, 10.0))
        );
        assert_eq!(els[3], PathEl::LineTo(Point::new(0.0, 10.0)));
    }

    #[test]
    fn test_two_points_is_a_line() {
        let (path, _) = drawing_path(&drawing(
            DrawKind::Freehand,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        ));
        assert_eq!(path.elements().len(), 2);
        assert_eq!(path.elements()[1], PathEl::LineTo(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_dot_is_filled_circle() {
        let (path, filled) = drawing_path(&drawing(DrawKind::Freehand, vec![Point::new(3.0, 3.0)]));
        assert!(filled);
        let bbox = path.bounding_box();
        assert!((bbox.width() - 4.0).abs() < 0.2);
        assert!((bbox.center().x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_shapes() {
        let corners = vec![Point::new(10.0, 10.0), Point::new(0.0, 20.0)];
        let (rect, _) = drawing_path(&drawing(DrawKind::Rectangle, corners.clone()));
        assert_eq!(rect.bounding_box(), Rect::new(0.0, 10.0, 10.0, 20.0));
        let (circle, _) = drawing_path(&drawing(DrawKind::Circle, corners));
        let bbox = circle.bounding_box();
        assert!((bbox.x0 - 0.0).abs() < 1e-6 && (bbox.y1 - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_shape_without_points_is_empty() {
        for kind in [DrawKind::Rectangle, DrawKind::Circle, DrawKind::Freehand] {
            let (path, filled) = drawing_path(&drawing(kind, Vec::new()));
            assert!(path.elements().is_empty());
            assert!(!filled);
        }
    }

    #[test]
    fn test_stroke_paint_alpha() {
        let style = StrokeStyle {
            alpha: 0.5,
            ..StrokeStyle::default()
        };
        let rgba = stroke_paint(&style).to_rgba8();
        assert_eq!((rgba.r, rgba.a), (239, 128));
    }
}
