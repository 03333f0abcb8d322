//! Axis-aligned bounding boxes.

use kurbo::{Point, Rect, Vec2};

/// An axis-aligned bounding box, with closed edges.
///
/// Unlike [`kurbo::Rect`], a point on the boundary is contained in the box
/// and two boxes that touch along an edge overlap. That's what we want for
/// pruning: curves whose boxes merely touch can still meet.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// The lower-left corner.
    pub min: Point,
    /// The upper-right corner.
    pub max: Point,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    /// The empty box: it contains nothing, and unioning it with something
    /// gives back that thing.
    pub const EMPTY: BoundingBox = BoundingBox {
        min: Point::new(f64::INFINITY, f64::INFINITY),
        max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// Creates the smallest box containing two points.
    pub fn from_points(p0: Point, p1: Point) -> Self {
        BoundingBox {
            min: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            max: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates the smallest box containing all the points.
    pub fn from_point_iter(points: impl IntoIterator<Item = Point>) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |bbox, p| bbox.union_pt(p))
    }

    /// Is this the empty box?
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// The smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// The smallest box containing this box and a point.
    pub fn union_pt(&self, p: Point) -> BoundingBox {
        BoundingBox {
            min: Point::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// The intersection of two boxes, which might be empty.
    pub fn intersection(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Do the two boxes share at least one point?
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Is the point inside the box (or on its boundary)?
    pub fn contains(&self, p: Point) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    /// The width and height, as a vector. The empty box has size zero.
    pub fn size(&self) -> Vec2 {
        if self.is_empty() {
            Vec2::ZERO
        } else {
            self.max - self.min
        }
    }

    /// The area. Zero for empty and for degenerate boxes.
    pub fn area(&self) -> f64 {
        let size = self.size();
        size.x * size.y
    }

    /// The center of the box.
    pub fn center(&self) -> Point {
        self.min.midpoint(self.max)
    }

    /// A lower bound on the distance from `p` to anything in the box.
    pub fn lower_bound_distance_to(&self, p: Point) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        dx.hypot(dy)
    }

    /// An upper bound on the distance from `p` to the nearest point of
    /// anything whose bounding box is exactly this box.
    ///
    /// Such a thing touches every edge of the box, so the answer is the
    /// smallest over all edges of the distance to the farthest point on that edge.
    pub fn upper_bound_distance_to(&self, p: Point) -> f64 {
        let dx_far = (p.x - self.min.x).abs().max((p.x - self.max.x).abs());
        let dy_far = (p.y - self.min.y).abs().max((p.y - self.max.y).abs());
        let dx_near = (p.x - self.min.x).abs().min((p.x - self.max.x).abs());
        let dy_near = (p.y - self.min.y).abs().min((p.y - self.max.y).abs());
        // Farthest point on the nearest vertical edge, or on the nearest horizontal one.
        dx_near.hypot(dy_far).min(dy_near.hypot(dx_far))
    }
}

impl From<BoundingBox> for Rect {
    fn from(b: BoundingBox) -> Rect {
        Rect::new(b.min.x, b.min.y, b.max.x, b.max.y)
    }
}

impl From<Rect> for BoundingBox {
    fn from(r: Rect) -> BoundingBox {
        let r = r.abs();
        BoundingBox {
            min: Point::new(r.x0, r.y0),
            max: Point::new(r.x1, r.y1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox::from_points((x0, y0).into(), (x1, y1).into())
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = bbox(0.0, 0.0, 1.0, 1.0);
        let b = bbox(1.0, 0.0, 2.0, 1.0);
        assert!(a.overlaps(&b));
        assert_eq!(a.intersection(&b).area(), 0.0);
        assert!(!a.overlaps(&bbox(1.5, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn empty_is_identity_for_union() {
        let a = bbox(0.0, 0.0, 1.0, 2.0);
        assert_eq!(BoundingBox::EMPTY.union(&a), a);
        assert!(BoundingBox::EMPTY.is_empty());
        assert_eq!(BoundingBox::EMPTY.area(), 0.0);
        assert!(!BoundingBox::EMPTY.overlaps(&a));
    }

    #[test]
    fn distance_bounds() {
        let a = bbox(0.0, 0.0, 2.0, 2.0);
        assert_eq!(a.lower_bound_distance_to((1.0, 1.0).into()), 0.0);
        assert_eq!(a.lower_bound_distance_to((5.0, 2.0).into()), 3.0);
        assert_eq!(a.lower_bound_distance_to((5.0, 6.0).into()), 5.0);

        let p = Point::new(3.0, 1.0);
        let upper = a.upper_bound_distance_to(p);
        assert!(upper >= a.lower_bound_distance_to(p));
        // The right edge is at distance 1 and spans y from 0 to 2.
        assert!((upper - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn contains_boundary() {
        let a = bbox(0.0, 0.0, 1.0, 1.0);
        assert!(a.contains((1.0, 0.5).into()));
        assert!(!a.contains((1.0 + 1e-9, 0.5).into()));
    }
}
