//! Convex hulls of tiny point sets.

use arrayvec::ArrayVec;
use kurbo::Point;

fn is_clockwise_turn(a: Point, b: Point, c: Point) -> bool {
    if a == b {
        return false;
    }
    let ab = b - a;
    let ac = c - a;
    let cross = ab.cross(ac);
    cross < 0.0 || (cross == 0.0 && ab.hypot2() < ac.hypot2())
}

/// Computes the convex hull of at most four points, by Jarvis march.
///
/// The hull is returned as a closed polygon (without repeating the first
/// point), starting from the leftmost point and winding counter-clockwise in
/// a y-up coordinate system. Collinear points in the middle of an edge are
/// dropped. The result is empty only when `points` is.
pub fn convex_hull(points: &[Point]) -> ArrayVec<Point, 4> {
    let mut hull = ArrayVec::new();
    let Some(first) = points
        .iter()
        .copied()
        .reduce(|a, b| if b.x < a.x { b } else { a })
    else {
        return hull;
    };

    let mut on_hull = first;
    // Each step adds a distinct point, so this can't take more than `points.len()` steps
    // unless something has gone numerically wrong.
    for _ in 0..points.len() {
        hull.push(on_hull);
        let mut end = points[0];
        for &p in &points[1..] {
            if end == on_hull || is_clockwise_turn(on_hull, end, p) {
                end = p;
            }
        }
        if end == first || hull.is_full() {
            break;
        }
        on_hull = end;
    }
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn square() {
        let hull = convex_hull(&[p(0.0, 0.0), p(1.0, 1.0), p(1.0, 0.0), p(0.0, 1.0)]);
        assert_eq!(hull.len(), 4);
        assert_eq!(hull[0].x, 0.0);
    }

    #[test]
    fn interior_point_dropped() {
        let hull = convex_hull(&[p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.5), p(1.0, 2.0)]);
        assert_eq!(hull.len(), 3);
        assert!(!hull.contains(&p(1.0, 0.5)));
    }

    #[test]
    fn collinear() {
        let hull = convex_hull(&[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)]);
        assert_eq!(hull.as_slice(), &[p(0.0, 0.0), p(2.0, 0.0)]);
    }

    #[test]
    fn degenerate() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[p(1.0, 1.0), p(1.0, 1.0)]).len(), 1);
    }
}
