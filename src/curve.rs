//! Lines, quadratics and cubics, as a single closed type.

use std::ops::Range;

use arrayvec::ArrayVec;
use kurbo::{
    Affine, CubicBez, Line, ParamCurve, ParamCurveArclen, ParamCurveArea, ParamCurveExtrema,
    ParamCurveNearest, PathSeg, Point, QuadBez, Vec2,
};

use crate::{bbox::BoundingBox, intersect::Intersection, num::bernstein_roots};

/// A single polynomial curve segment of order 1, 2, or 3.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Curve {
    /// A straight line segment.
    Line(Line),
    /// A quadratic Bézier.
    Quad(QuadBez),
    /// A cubic Bézier.
    Cubic(CubicBez),
}

impl From<Line> for Curve {
    fn from(l: Line) -> Self {
        Curve::Line(l)
    }
}

impl From<QuadBez> for Curve {
    fn from(q: QuadBez) -> Self {
        Curve::Quad(q)
    }
}

impl From<CubicBez> for Curve {
    fn from(c: CubicBez) -> Self {
        Curve::Cubic(c)
    }
}

impl From<PathSeg> for Curve {
    fn from(seg: PathSeg) -> Self {
        match seg {
            PathSeg::Line(l) => Curve::Line(l),
            PathSeg::Quad(q) => Curve::Quad(q),
            PathSeg::Cubic(c) => Curve::Cubic(c),
        }
    }
}

impl From<Curve> for PathSeg {
    fn from(c: Curve) -> Self {
        match c {
            Curve::Line(l) => PathSeg::Line(l),
            Curve::Quad(q) => PathSeg::Quad(q),
            Curve::Cubic(c) => PathSeg::Cubic(c),
        }
    }
}

impl Curve {
    /// Builds a curve from its control points, which must number 2, 3, or 4.
    pub fn from_points(points: &[Point]) -> Option<Curve> {
        match *points {
            [p0, p1] => Some(Curve::Line(Line::new(p0, p1))),
            [p0, p1, p2] => Some(Curve::Quad(QuadBez::new(p0, p1, p2))),
            [p0, p1, p2, p3] => Some(Curve::Cubic(CubicBez::new(p0, p1, p2, p3))),
            _ => None,
        }
    }

    /// The polynomial degree.
    pub fn order(&self) -> usize {
        match self {
            Curve::Line(_) => 1,
            Curve::Quad(_) => 2,
            Curve::Cubic(_) => 3,
        }
    }

    /// The control points, from start to end.
    pub fn points(&self) -> ArrayVec<Point, 4> {
        match *self {
            Curve::Line(l) => [l.p0, l.p1].into_iter().collect(),
            Curve::Quad(q) => [q.p0, q.p1, q.p2].into_iter().collect(),
            Curve::Cubic(c) => [c.p0, c.p1, c.p2, c.p3].into_iter().collect(),
        }
    }

    /// The starting point.
    pub fn start(&self) -> Point {
        match self {
            Curve::Line(l) => l.p0,
            Curve::Quad(q) => q.p0,
            Curve::Cubic(c) => c.p0,
        }
    }

    /// The ending point.
    pub fn end(&self) -> Point {
        match self {
            Curve::Line(l) => l.p1,
            Curve::Quad(q) => q.p2,
            Curve::Cubic(c) => c.p3,
        }
    }

    /// Evaluates the curve at `t`.
    pub fn eval(&self, t: f64) -> Point {
        match self {
            Curve::Line(l) => l.eval(t),
            Curve::Quad(q) => q.eval(t),
            Curve::Cubic(c) => c.eval(t),
        }
    }

    /// The derivative with respect to `t`.
    pub fn deriv(&self, t: f64) -> Vec2 {
        let mt = 1.0 - t;
        match *self {
            Curve::Line(l) => l.p1 - l.p0,
            Curve::Quad(q) => ((q.p1 - q.p0) * mt + (q.p2 - q.p1) * t) * 2.0,
            Curve::Cubic(c) => {
                ((c.p1 - c.p0) * (mt * mt) + (c.p2 - c.p1) * (2.0 * mt * t) + (c.p3 - c.p2) * (t * t))
                    * 3.0
            }
        }
    }

    /// The direction the curve leaves its start point in.
    ///
    /// Unlike `deriv(0.0)`, this is non-zero whenever the curve isn't a single point,
    /// because coincident control points are skipped.
    pub fn start_tangent(&self) -> Vec2 {
        let points = self.points();
        let p0 = points[0];
        points[1..]
            .iter()
            .map(|p| *p - p0)
            .find(|v| v.hypot2() > 0.0)
            .unwrap_or(Vec2::ZERO)
    }

    /// The direction the curve arrives at its end point from.
    pub fn end_tangent(&self) -> Vec2 {
        let points = self.points();
        let last = points[points.len() - 1];
        points[..points.len() - 1]
            .iter()
            .rev()
            .map(|p| last - *p)
            .find(|v| v.hypot2() > 0.0)
            .unwrap_or(Vec2::ZERO)
    }

    /// The unit normal at `t`: the tangent turned a quarter turn counter-clockwise.
    ///
    /// Where the derivative vanishes, the direction of the nearest non-coincident
    /// control point is used instead. A curve that's a single point has no
    /// normal, and gets zero.
    pub fn normal(&self, t: f64) -> Vec2 {
        let mut d = self.deriv(t);
        if d.hypot2() == 0.0 {
            d = if t < 0.5 {
                self.start_tangent()
            } else {
                self.end_tangent()
            };
        }
        if d.hypot2() == 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(-d.y, d.x).normalize()
    }

    /// The arc length, to within `accuracy`.
    pub fn arclen(&self, accuracy: f64) -> f64 {
        PathSeg::from(*self).arclen(accuracy)
    }

    /// The same curve with every point transformed by `affine`.
    pub fn transformed(&self, affine: Affine) -> Curve {
        (affine * PathSeg::from(*self)).into()
    }

    /// The part of this curve with parameters in `range`.
    pub fn subsegment(&self, range: Range<f64>) -> Curve {
        match self {
            Curve::Line(l) => Curve::Line(l.subsegment(range)),
            Curve::Quad(q) => Curve::Quad(q.subsegment(range)),
            Curve::Cubic(c) => Curve::Cubic(c.subsegment(range)),
        }
    }

    /// Splits the curve in two at `t`.
    ///
    /// The two halves share their middle point exactly.
    pub fn split(&self, t: f64) -> (Curve, Curve) {
        let mid = self.eval(t);
        let left = self.subsegment(0.0..t).with_endpoints(self.start(), mid);
        let right = self.subsegment(t..1.0).with_endpoints(mid, self.end());
        (left, right)
    }

    /// Returns a copy of this curve with the end points replaced.
    ///
    /// This is for cleaning up after floating-point error: the new points
    /// should be very close to the old ones.
    pub fn with_endpoints(&self, start: Point, end: Point) -> Curve {
        match *self {
            Curve::Line(_) => Curve::Line(Line::new(start, end)),
            Curve::Quad(q) => Curve::Quad(QuadBez::new(start, q.p1, end)),
            Curve::Cubic(c) => Curve::Cubic(CubicBez::new(start, c.p1, c.p2, end)),
        }
    }

    /// The same curve, traversed in the other direction.
    pub fn reversed(&self) -> Curve {
        match *self {
            Curve::Line(l) => Curve::Line(Line::new(l.p1, l.p0)),
            Curve::Quad(q) => Curve::Quad(QuadBez::new(q.p2, q.p1, q.p0)),
            Curve::Cubic(c) => Curve::Cubic(CubicBez::new(c.p3, c.p2, c.p1, c.p0)),
        }
    }

    /// The tight bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        let rect = match self {
            Curve::Line(l) => l.bounding_box(),
            Curve::Quad(q) => q.bounding_box(),
            Curve::Cubic(c) => c.bounding_box(),
        };
        rect.into()
    }

    /// The signed area between the curve and the origin, as in [`ParamCurveArea`].
    pub fn signed_area(&self) -> f64 {
        PathSeg::from(*self).signed_area()
    }

    /// The parameter of the nearest point to `p`, and the squared distance to it.
    pub fn nearest(&self, p: Point, accuracy: f64) -> (f64, f64) {
        let nearest = PathSeg::from(*self).nearest(p, accuracy);
        (nearest.t, nearest.distance_sq)
    }

    /// Is this a single point?
    pub fn is_degenerate(&self) -> bool {
        let points = self.points();
        points.iter().all(|p| *p == points[0])
    }

    /// Does this curve bend in only one direction, and not too much?
    ///
    /// Curves that are simple in this sense are well approximated by
    /// offsetting, and they can't self-intersect.
    pub fn is_simple(&self) -> bool {
        let points = self.points();
        if let Curve::Cubic(c) = self {
            let base = c.p3 - c.p0;
            let a1 = base.cross(c.p1 - c.p0);
            let a2 = base.cross(c.p2 - c.p0);
            if (a1 > 0.0 && a2 < 0.0) || (a1 < 0.0 && a2 > 0.0) {
                return false;
            }
        } else if points.len() == 2 {
            return true;
        }
        let n1 = self.start_tangent();
        let n2 = self.end_tangent();
        let denom = n1.hypot() * n2.hypot();
        if denom == 0.0 {
            return true;
        }
        let cos = (n1.dot(n2) / denom).clamp(-1.0, 1.0);
        cos.acos() < std::f64::consts::FRAC_PI_3
    }

    /// The parameters strictly between 0 and 1 at which the y coordinate
    /// changes direction, in increasing order.
    pub fn y_extrema(&self) -> ArrayVec<f64, 2> {
        let ys: ArrayVec<f64, 4> = self.points().iter().map(|p| p.y).collect();
        // The derivative is a Bernstein polynomial of one lower order, with
        // coefficients given by differences of the control points.
        let dys: ArrayVec<f64, 3> = ys.windows(2).map(|w| w[1] - w[0]).collect();
        let mut ret = ArrayVec::new();
        if dys.len() < 2 {
            return ret;
        }
        for t in bernstein_roots(&dys) {
            if t > 0.0 && t < 1.0 && ret.last().map_or(true, |last| *last < t) {
                ret.push(t);
            }
        }
        ret
    }

    /// Splits the curve into pieces that are monotonic in y, returning the
    /// parameter range of each piece.
    pub fn y_monotonic_ranges(&self) -> ArrayVec<Range<f64>, 3> {
        let mut ret = ArrayVec::new();
        let mut start = 0.0;
        for t in self.y_extrema() {
            ret.push(start..t);
            start = t;
        }
        ret.push(start..1.0);
        ret
    }

    /// Signed distances of the control points from the line through `line`.
    ///
    /// The distances are scaled by the line's length; only their signs and
    /// ratios are meaningful.
    pub fn aligned_to(&self, line: Line) -> ArrayVec<f64, 4> {
        let dir = line.p1 - line.p0;
        self.points()
            .iter()
            .map(|p| dir.cross(*p - line.p0))
            .collect()
    }

    /// Where this cubic crosses itself, if it does.
    ///
    /// Lines and quadratics never do. The returned intersection has `t1 < t2`.
    pub fn self_intersection(&self) -> Option<Intersection> {
        let Curve::Cubic(c) = self else {
            return None;
        };
        // Map the curve to canonical form, where the first three control points
        // are (0, 0), (0, 1) and (1, 1). Whether the curve has a loop then only
        // depends on where the last control point lands.
        let d1 = c.p1 - c.p0;
        let d2 = c.p2 - c.p0;
        let d3 = c.p3 - c.p0;
        let det = d1.cross(d2);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let x = inv * (-d1.y * d3.x + d1.x * d3.y);
        let y = inv * ((d2.y - d1.y) * d3.x + (d1.x - d2.x) * d3.y);
        if x >= 1.0 {
            return None;
        }
        let x2 = x * x;
        let cusp_edge = -3.0 * x2 + 6.0 * x - 12.0 * y + 9.0;
        if cusp_edge <= 0.0 {
            return None;
        }
        if x <= 0.0 {
            if y < (-x2 + 3.0 * x) / 3.0 {
                return None;
            }
        } else if y < ((3.0 * (4.0 * x - x2)).sqrt() - x) / 2.0 {
            return None;
        }

        let radical = cusp_edge.sqrt();
        let denom = 3.0 - x - y;
        let t1 = (0.5 * (3.0 - x - radical) / denom).clamp(0.0, 1.0);
        let t2 = (0.5 * (3.0 - x + radical) / denom).clamp(0.0, 1.0);
        (t1.is_finite() && t2.is_finite() && t1 < t2).then_some(Intersection { t1, t2 })
    }
}
