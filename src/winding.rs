//! Winding numbers, by casting a ray toward negative x.
//!
//! Each piece of the boundary that crosses the ray contributes +1 if it's
//! heading down (decreasing y) and -1 if it's heading up. With y pointing up,
//! that makes counter-clockwise loops wind positively, and the region on the
//! left of the direction of travel has winding number one more than the
//! region on the right.
//!
//! Crossings are counted half-open, so that a ray passing exactly through the
//! join between two pieces counts it once.

use std::ops::Range;

use kurbo::Point;

use crate::{bvh::NodeKind, curve::Curve, num::bernstein_roots, path::PathComponent};

// The contribution of a y-monotonic piece running from height `start` to
// height `end`, assuming it crosses the ray to the left of the point.
fn crossing(start: f64, end: f64, y: f64) -> i32 {
    if end < y && y <= start {
        1
    } else if start < y && y <= end {
        -1
    } else {
        0
    }
}

/// The winding number of a component around `p`.
///
/// Open components wind zero times around everything.
pub fn winding_count(component: &PathComponent, p: Point) -> i32 {
    if !component.is_closed() {
        return 0;
    }
    let bvh = component.bvh();
    if !bvh.bounding_box().contains(p) {
        return 0;
    }

    let mut count = 0;
    bvh.visit(|node, _depth| {
        let bbox = node.bounding_box;
        if p.y < bbox.min.y || p.y > bbox.max.y || bbox.min.x > p.x {
            return false;
        }
        let (first, last) = match node.kind {
            NodeKind::Leaf { element } => (element, element),
            NodeKind::Internal { start, end } => (start, end),
        };
        if bbox.max.x < p.x {
            // Everything in here is to the left, and it's a contiguous run of
            // elements, so only its two ends matter.
            let start = component.element(first).start();
            let end = component.element(last).end();
            count += crossing(start.y, end.y, p.y);
            return false;
        }
        if first == last {
            count += element_winding(&component.element(first), p);
            return false;
        }
        true
    });
    count
}

// The contribution of a single element, splitting it into monotonic pieces.
fn element_winding(curve: &Curve, p: Point) -> i32 {
    let mut count = 0;
    for range in curve.y_monotonic_ranges() {
        let start = curve.eval(range.start);
        let end = curve.eval(range.end);
        let c = crossing(start.y, end.y, p.y);
        if c != 0 && x_at_height(curve, range, start, end, p.y) < p.x {
            count += c;
        }
    }
    count
}

// Where a y-monotonic piece of `curve` reaches height `y`.
fn x_at_height(curve: &Curve, range: Range<f64>, start: Point, end: Point, y: f64) -> f64 {
    let ys: Vec<f64> = curve.points().iter().map(|q| q.y - y).collect();
    let width = range.end - range.start;
    let slack = 1e-9 * width.max(f64::EPSILON);
    let t = bernstein_roots(&ys)
        .into_iter()
        .find(|t| *t >= range.start - slack && *t <= range.end + slack)
        .map(|t| t.clamp(range.start, range.end))
        .unwrap_or_else(|| {
            // The root finder missed; take whichever end is closer.
            if (start.y - y).abs() <= (end.y - y).abs() {
                range.start
            } else {
                range.end
            }
        });
    curve.eval(t).x
}

#[cfg(test)]
mod tests {
    use kurbo::{BezPath, Shape};
    use proptest::prelude::*;

    use super::*;
    use crate::{path::Path, FillRule};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn square(x: f64, y: f64, size: f64) -> PathComponent {
        PathComponent::from_polygon(&[p(x, y), p(x + size, y), p(x + size, y + size), p(x, y + size)])
            .unwrap()
    }

    fn brute_force(component: &PathComponent, p: Point) -> i32 {
        component.curves().map(|c| element_winding(&c, p)).sum()
    }

    #[test]
    fn square_winding() {
        let sq = square(0.0, 0.0, 1.0);
        assert_eq!(winding_count(&sq, p(0.5, 0.5)), 1);
        assert_eq!(winding_count(&sq.reversed(), p(0.5, 0.5)), -1);
        assert_eq!(winding_count(&sq, p(1.5, 0.5)), 0);
        assert_eq!(winding_count(&sq, p(-0.5, 0.5)), 0);
        assert_eq!(winding_count(&sq, p(0.5, 2.0)), 0);
    }

    #[test]
    fn ray_through_vertices() {
        // A diamond, so the ray from the center hits the left vertex exactly.
        let diamond = PathComponent::from_polygon(&[p(0.0, -1.0), p(1.0, 0.0), p(0.0, 1.0), p(-1.0, 0.0)]).unwrap();
        assert_eq!(winding_count(&diamond, p(0.0, 0.0)), 1);
        assert_eq!(winding_count(&diamond, p(0.5, 0.0)), 1);
        assert_eq!(winding_count(&diamond, p(-2.0, 0.0)), 0);
    }

    #[test]
    fn open_components_dont_wind() {
        let open = PathComponent::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)], vec![1, 1]).unwrap();
        assert_eq!(winding_count(&open, p(0.9, 0.1)), 0);
    }

    #[test]
    fn curved_boundary() {
        let circle = Path::from_bezpath(&kurbo::Circle::new((0.0, 0.0), 1.0).to_path(1e-4)).unwrap();
        assert!(circle.contains(p(0.0, 0.0), FillRule::NonZero));
        assert!(circle.contains(p(0.0, 0.99), FillRule::NonZero));
        assert!(circle.contains(p(-0.99, 0.0), FillRule::NonZero));
        assert!(!circle.contains(p(0.72, 0.72), FillRule::NonZero));
        // The kurbo circle runs counter-clockwise with y up.
        assert_eq!(circle.winding_count(p(0.0, 0.0)), 1);
    }

    #[test]
    fn doubled_loop() {
        let mut bez = BezPath::new();
        for _ in 0..2 {
            bez.move_to((0.0, 0.0));
            bez.line_to((4.0, 0.0));
            bez.line_to((4.0, 4.0));
            bez.line_to((0.0, 4.0));
            bez.close_path();
        }
        let path = Path::from_bezpath(&bez).unwrap();
        assert_eq!(path.winding_count(p(1.0, 1.0)), 2);
        assert!(path.contains(p(1.0, 1.0), FillRule::NonZero));
        assert!(!path.contains(p(1.0, 1.0), FillRule::EvenOdd));
    }

    fn star(points: usize, wobble: &[f64]) -> PathComponent {
        let vertices: Vec<_> = (0..points)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / points as f64;
                let r = if i % 2 == 0 { 3.0 } else { 1.0 } + wobble[i % wobble.len()];
                p(r * angle.cos(), r * angle.sin())
            })
            .collect();
        PathComponent::from_polygon(&vertices).unwrap()
    }

    proptest! {
        #[test]
        fn hierarchy_matches_brute_force(
            n in 3usize..40,
            wobble in prop::collection::vec(-0.5f64..0.5, 1..8),
            x in -4.0f64..4.0,
            y in -4.0f64..4.0,
        ) {
            let component = star(2 * n, &wobble);
            prop_assert_eq!(winding_count(&component, p(x, y)), brute_force(&component, p(x, y)));
        }

        #[test]
        fn cubic_blob_matches_brute_force(x in -2.0f64..2.0, y in -2.0f64..2.0) {
            let bez = BezPath::from_svg(
                "M-1,-1 C0,-2 1,-1 1.5,0 C2,1 0,2 -0.5,1 Q-2,0.5 -1,-1 Z",
            ).unwrap();
            let path = Path::from_bezpath(&bez).unwrap();
            let component = &path.components()[0];
            prop_assert_eq!(winding_count(component, p(x, y)), brute_force(component, p(x, y)));
        }
    }
}
