//! Source-level multi-column detection from shape positions.

use crate::flatten::reading_order;
use crate::types::{Rect, Shape};

/// Shapes wider than this fraction of the slide are full-width.
pub const FULL_WIDTH_FRACTION: f64 = 0.6;

/// A slide laid out in columns at the source.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    /// Full-width shapes above the columns, in reading order.
    pub preface: Vec<Shape>,
    /// Column shapes, columns left to right, each in reading order.
    pub columns: Vec<Vec<Shape>>,
}

struct Cluster {
    extent: Rect,
    shapes: Vec<Shape>,
}

impl Cluster {
    fn new(shape: Shape) -> Self {
        Self {
            extent: shape.bounds,
            shapes: vec![shape],
        }
    }

    fn push(&mut self, shape: Shape) {
        let left = self.extent.left.min(shape.bounds.left);
        let top = self.extent.top.min(shape.bounds.top);
        let right = self.extent.right().max(shape.bounds.right());
        let bottom = self.extent.bottom().max(shape.bounds.bottom());
        self.extent = Rect::new(left, top, right - left, bottom - top);
        self.shapes.push(shape);
    }
}

/// Detect a multi-column layout among non-title shapes.
///
/// The slide is multi-column when the narrow shapes form at least two
/// clusters of overlapping horizontal extent, two of those clusters overlap
/// vertically, and no full-width shape starts below the top of the columns.
pub fn detect_columns(shapes: &[Shape], slide_width: i64) -> Option<ColumnLayout> {
    if slide_width <= 0 {
        return None;
    }
    let limit = slide_width as f64 * FULL_WIDTH_FRACTION;
    let (full, mut narrow): (Vec<Shape>, Vec<Shape>) = shapes
        .iter()
        .cloned()
        .partition(|shape| shape.bounds.width as f64 > limit);

    narrow.sort_by_key(|shape| (shape.bounds.left, shape.bounds.top, shape.id));
    let mut clusters: Vec<Cluster> = Vec::new();
    for shape in narrow {
        match clusters.last_mut() {
            Some(cluster) if cluster.extent.horizontal_overlap(&shape.bounds) > 0 => {
                cluster.push(shape)
            }
            _ => clusters.push(Cluster::new(shape)),
        }
    }

    if clusters.len() < 2 {
        return None;
    }
    let side_by_side = clusters.iter().enumerate().any(|(i, a)| {
        clusters[i + 1..]
            .iter()
            .any(|b| a.extent.vertical_overlap(&b.extent) > 0)
    });
    if !side_by_side {
        return None;
    }
    let columns_top = clusters.iter().map(|c| c.extent.top).min()?;
    if full.iter().any(|shape| shape.bounds.top > columns_top) {
        return None;
    }

    log::debug!("Detected {} source columns", clusters.len());
    Some(ColumnLayout {
        preface: reading_order(full),
        columns: clusters
            .into_iter()
            .map(|cluster| reading_order(cluster.shapes))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeKind;

    fn boxed(id: u32, left: i64, top: i64, width: i64, height: i64) -> Shape {
        Shape::new(id, ShapeKind::Other).with_bounds(Rect::new(left, top, width, height))
    }

    #[test]
    fn test_two_columns_with_preface() {
        let shapes = vec![
            boxed(1, 0, 0, 900, 100),
            boxed(2, 0, 200, 400, 300),
            boxed(3, 500, 200, 400, 300),
            boxed(4, 0, 550, 400, 100),
        ];
        let layout = detect_columns(&shapes, 1000).expect("columns");
        assert_eq!(layout.preface.len(), 1);
        assert_eq!(layout.columns.len(), 2);
        let left: Vec<u32> = layout.columns[0].iter().map(|s| s.id).collect();
        assert_eq!(left, vec![2, 4]);
    }

    #[test]
    fn test_stacked_boxes_are_not_columns() {
        let shapes = vec![boxed(1, 0, 0, 400, 100), boxed(2, 500, 300, 400, 100)];
        assert!(detect_columns(&shapes, 1000).is_none());
    }

    #[test]
    fn test_full_width_below_columns_cancels() {
        let shapes = vec![
            boxed(1, 0, 0, 400, 300),
            boxed(2, 500, 0, 400, 300),
            boxed(3, 0, 400, 900, 100),
        ];
        assert!(detect_columns(&shapes, 1000).is_none());
    }

    #[test]
    fn test_single_cluster_is_not_columns() {
        let shapes = vec![boxed(1, 0, 0, 400, 100), boxed(2, 100, 200, 400, 100)];
        assert!(detect_columns(&shapes, 1000).is_none());
    }
}
