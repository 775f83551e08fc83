//! Whole-stroke eraser.

use crate::canvas::CanvasContent;
use crate::model::EntityId;
use kurbo::Point;

/// Reach of the eraser for a given brush size.
pub fn eraser_radius(eraser_size: f64, factor: f64) -> f64 {
    eraser_size * factor
}

/// Drawings touched by an erase at `point`. Each hit is deleted as a whole.
pub fn erase_hits(content: &CanvasContent, point: Point, radius: f64) -> Vec<EntityId> {
    content
        .drawings
        .iter()
        .filter(|d| d.is_hit_by(point, radius))
        .map(|d| d.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DrawKind, DrawLayer, Drawing, StrokeStyle};

    #[test]
    fn test_erase_hits_whole_strokes() {
        let mut content = CanvasContent::new();
        let near = Drawing::new(
            DrawKind::Freehand,
            DrawLayer::Above,
            StrokeStyle::default(),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(200.0, 0.0)],
        );
        let far = Drawing::new(
            DrawKind::Freehand,
            DrawLayer::Behind,
            StrokeStyle::default(),
            vec![Point::new(0.0, 100.0), Point::new(10.0, 100.0)],
        );
        let near_id = near.id;
        content.drawings.push(near);
        content.drawings.push(far);

        let radius = eraser_radius(10.0, 1.5);
        assert_eq!(erase_hits(&content, Point::new(10.0, 14.0), radius), vec![near_id]);
        assert!(erase_hits(&content, Point::new(100.0, 50.0), radius).is_empty());
    }
}
