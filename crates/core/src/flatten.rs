//! Shape flattening: expands groups and sorts leaves into reading order.

use crate::types::{GroupTransform, Shape, ShapeKind};

/// Two shapes share a band when their vertical overlap exceeds this
/// fraction of the smaller height.
pub const BAND_OVERLAP_FRACTION: f64 = 0.1;

/// Expand nested groups into leaf shapes with slide-space bounds, then sort
/// them into reading order.
pub fn flatten_shapes(shapes: &[Shape]) -> Vec<Shape> {
    reading_order(expand_groups(shapes))
}

/// Depth-first group expansion in stored order.
///
/// Uses an explicit stack so nesting depth is bounded only by memory.
/// Children's bounds are mapped through every enclosing group transform.
pub fn expand_groups(shapes: &[Shape]) -> Vec<Shape> {
    let mut leaves = Vec::new();
    let mut stack: Vec<(&Shape, Vec<GroupTransform>)> =
        shapes.iter().rev().map(|shape| (shape, Vec::new())).collect();

    while let Some((shape, transforms)) = stack.pop() {
        match &shape.kind {
            ShapeKind::Group {
                transform,
                children,
            } => {
                let mut inner = transforms.clone();
                inner.extend(transform.iter().copied());
                for child in children.iter().rev() {
                    stack.push((child, inner.clone()));
                }
            }
            _ => {
                let mut leaf = shape.clone();
                for transform in transforms.iter().rev() {
                    leaf.bounds = transform.apply(&leaf.bounds);
                }
                leaves.push(leaf);
            }
        }
    }

    leaves
}

/// Sort leaves into horizontal bands, top to bottom, and each band left to
/// right.
pub fn reading_order(mut shapes: Vec<Shape>) -> Vec<Shape> {
    shapes.sort_by_key(|shape| (shape.bounds.top, shape.bounds.left, shape.id));

    let mut bands: Vec<Vec<Shape>> = Vec::new();
    for shape in shapes {
        match bands.last_mut() {
            Some(band) if band.iter().any(|member| shares_band(member, &shape)) => {
                band.push(shape)
            }
            _ => bands.push(vec![shape]),
        }
    }

    bands
        .into_iter()
        .flat_map(|mut band| {
            band.sort_by_key(|shape| (shape.bounds.left, shape.bounds.top, shape.id));
            band
        })
        .collect()
}

fn shares_band(a: &Shape, b: &Shape) -> bool {
    let overlap = a.bounds.vertical_overlap(&b.bounds);
    let smaller = a.bounds.height.min(b.bounds.height);
    overlap > 0 && overlap as f64 > BAND_OVERLAP_FRACTION * smaller as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;

    fn boxed(id: u32, left: i64, top: i64, width: i64, height: i64) -> Shape {
        Shape::new(id, ShapeKind::Other).with_bounds(Rect::new(left, top, width, height))
    }

    fn ids(shapes: &[Shape]) -> Vec<u32> {
        shapes.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_band_orders_left_to_right() {
        // Right box starts slightly higher but shares the band.
        let shapes = vec![
            boxed(1, 5000, 100, 1000, 1000),
            boxed(2, 0, 150, 1000, 1000),
            boxed(3, 0, 3000, 1000, 500),
        ];
        assert_eq!(ids(&flatten_shapes(&shapes)), vec![2, 1, 3]);
    }

    #[test]
    fn test_z_order_does_not_change_reading_order() {
        let a = boxed(1, 0, 0, 100, 100);
        let b = boxed(2, 200, 10, 100, 100);
        let c = boxed(3, 0, 500, 100, 100);
        let forward = flatten_shapes(&[a.clone(), b.clone(), c.clone()]);
        let reversed = flatten_shapes(&[c, b, a]);
        assert_eq!(ids(&forward), ids(&reversed));
    }

    #[test]
    fn test_small_overlap_starts_new_band() {
        // Overlap of 5 on height 100 is under the threshold.
        let shapes = vec![boxed(1, 500, 0, 100, 100), boxed(2, 0, 95, 100, 100)];
        assert_eq!(ids(&flatten_shapes(&shapes)), vec![1, 2]);
    }

    #[test]
    fn test_nested_groups_are_expanded_with_transforms() {
        let inner = Shape::new(
            10,
            ShapeKind::Group {
                transform: Some(GroupTransform {
                    bounds: Rect::new(0, 0, 100, 100),
                    child_offset: (0, 0),
                    child_extent: (200, 200),
                }),
                children: vec![boxed(11, 100, 100, 50, 50)],
            },
        );
        let outer = Shape::new(
            20,
            ShapeKind::Group {
                transform: Some(GroupTransform {
                    bounds: Rect::new(1000, 1000, 100, 100),
                    child_offset: (0, 0),
                    child_extent: (100, 100),
                }),
                children: vec![inner, boxed(12, 0, 0, 10, 10)],
            },
        );
        let leaves = expand_groups(&[outer]);
        assert_eq!(ids(&leaves), vec![11, 12]);
        assert_eq!(leaves[0].bounds, Rect::new(1050, 1050, 25, 25));
        assert_eq!(leaves[1].bounds, Rect::new(1000, 1000, 10, 10));
    }

    #[test]
    fn test_empty_group_contributes_nothing() {
        let group = Shape::new(
            1,
            ShapeKind::Group {
                transform: None,
                children: vec![],
            },
        );
        assert!(flatten_shapes(&[group]).is_empty());
    }
}
