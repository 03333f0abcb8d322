//! Intersections between pairs of curves.
//!
//! Lines are handled directly: two lines by solving a linear system, and a
//! line against a curve by rotating the curve so that the line is the x axis
//! and finding roots. Pairs of proper curves go to one of two numerical
//! strategies, chosen by [`IntersectionStrategy`].
//!
//! All strategies report parameters snapped to exactly 0 or 1 when they're
//! within [`T_SNAP`](crate::num::T_SNAP) of an endpoint, sorted by `(t1, t2)`
//! and without near-duplicates.

use kurbo::Line;

use crate::{
    bbox::BoundingBox,
    curve::Curve,
    num::{approx_eq, snap_unit, solve_2x2, CheapOrderedFloat},
};

mod fat_line;
mod subdivision;

/// Two intersections closer than this in both parameters are the same one.
const MERGE_TOLERANCE: f64 = 1e-7;

/// Roots this far outside `[0, 1]` still count, to survive rounding.
const ROOT_SLACK: f64 = 1e-8;

/// A point where two curves meet, given by its parameter on each of them.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Intersection {
    /// The parameter on the first curve.
    pub t1: f64,
    /// The parameter on the second curve.
    pub t2: f64,
}

impl Intersection {
    /// Creates a new intersection.
    pub fn new(t1: f64, t2: f64) -> Self {
        Intersection { t1, t2 }
    }

    /// The same intersection, seen from the other curve.
    pub fn swapped(self) -> Self {
        Intersection {
            t1: self.t2,
            t2: self.t1,
        }
    }

    fn snapped(self) -> Self {
        Intersection {
            t1: snap_unit(self.t1).clamp(0.0, 1.0),
            t2: snap_unit(self.t2).clamp(0.0, 1.0),
        }
    }

    fn key(&self) -> (CheapOrderedFloat, CheapOrderedFloat) {
        (self.t1.into(), self.t2.into())
    }

    fn is_close_to(&self, other: &Intersection) -> bool {
        approx_eq(self.t1, other.t1, MERGE_TOLERANCE) && approx_eq(self.t2, other.t2, MERGE_TOLERANCE)
    }
}

/// How to intersect two curves that aren't both lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IntersectionStrategy {
    /// Recursive splitting until the pieces are smaller than the accuracy,
    /// followed by intersecting their chords and polishing with Newton's method.
    #[default]
    Subdivision,
    /// Bézier clipping against fat lines.
    FatLine,
}

/// Parameters for [`intersect`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntersectOptions {
    /// Which algorithm to use for two curves.
    pub strategy: IntersectionStrategy,
    /// For subdivision: pieces whose bounding box has width plus height below
    /// this are small enough to be treated as lines.
    pub accuracy: f64,
    /// For fat-line clipping: how small the parameter intervals need to get.
    /// Values larger than `1e-8` are tightened to `1e-8`.
    pub precision: f64,
}

impl IntersectOptions {
    /// The default subdivision accuracy.
    pub const DEFAULT_ACCURACY: f64 = 0.5;

    /// The default fat-line precision.
    pub const DEFAULT_PRECISION: f64 = 1e-6;

    /// The default options, with a different subdivision accuracy.
    pub fn with_accuracy(accuracy: f64) -> Self {
        IntersectOptions {
            accuracy,
            ..Default::default()
        }
    }
}

impl Default for IntersectOptions {
    fn default() -> Self {
        IntersectOptions {
            strategy: IntersectionStrategy::default(),
            accuracy: Self::DEFAULT_ACCURACY,
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

/// Finds all the places where two curves meet.
///
/// The result is sorted by `t1` and then `t2`. Curves that overlap along a
/// whole stretch don't have a well-defined answer; we report whatever
/// isolated points the numerics find.
pub fn intersect(a: &Curve, b: &Curve, options: &IntersectOptions) -> Vec<Intersection> {
    if a.is_degenerate() || b.is_degenerate() || !a.bounding_box().overlaps(&b.bounding_box()) {
        return Vec::new();
    }
    let raw = match (a, b) {
        (Curve::Line(l1), Curve::Line(l2)) => line_line(*l1, *l2).into_iter().collect(),
        (_, Curve::Line(l)) => curve_line(a, *l),
        (Curve::Line(l), _) => curve_line(b, *l).into_iter().map(Intersection::swapped).collect(),
        _ => match options.strategy {
            IntersectionStrategy::Subdivision => subdivision::intersect(a, b, options.accuracy),
            IntersectionStrategy::FatLine => fat_line::intersect(a, b, options.precision),
        },
    };
    normalize(raw)
}

/// Snaps, sorts, and removes near-duplicates.
pub(crate) fn normalize(raw: Vec<Intersection>) -> Vec<Intersection> {
    let mut snapped: Vec<_> = raw
        .into_iter()
        .filter(|i| i.t1.is_finite() && i.t2.is_finite())
        .map(Intersection::snapped)
        .collect();
    snapped.sort_by_key(Intersection::key);
    let mut ret: Vec<Intersection> = Vec::with_capacity(snapped.len());
    for i in snapped {
        if !ret.iter().any(|j| j.is_close_to(&i)) {
            ret.push(i);
        }
    }
    ret
}

/// Where two line segments cross, if they do.
///
/// Segments that share an endpoint exactly are reported with exact
/// parameters; parallel segments never intersect.
pub fn line_line(l1: Line, l2: Line) -> Option<Intersection> {
    if l1.p0 == l1.p1 || l2.p0 == l2.p1 {
        return None;
    }
    let b1 = BoundingBox::from_points(l1.p0, l1.p1);
    let b2 = BoundingBox::from_points(l2.p0, l2.p1);
    if !b1.overlaps(&b2) {
        return None;
    }

    if l1.p1 == l2.p1 {
        return Some(Intersection::new(1.0, 1.0));
    } else if l1.p1 == l2.p0 {
        return Some(Intersection::new(1.0, 0.0));
    } else if l1.p0 == l2.p1 {
        return Some(Intersection::new(0.0, 1.0));
    } else if l1.p0 == l2.p0 {
        return Some(Intersection::new(0.0, 0.0));
    }

    let (t1, t2) = solve_2x2(l1.p1 - l1.p0, l2.p0 - l2.p1, l2.p0 - l1.p0)?;
    let t1 = snap_unit(t1);
    let t2 = snap_unit(t2);
    ((0.0..=1.0).contains(&t1) && (0.0..=1.0).contains(&t2)).then_some(Intersection::new(t1, t2))
}

/// Where a curve meets a line segment. `t1` is on the curve and `t2` on the line.
pub fn curve_line(curve: &Curve, line: Line) -> Vec<Intersection> {
    let dir = line.p1 - line.p0;
    let len2 = dir.hypot2();
    if len2 == 0.0 {
        return Vec::new();
    }
    let in_range = |t: f64| (-ROOT_SLACK..=1.0 + ROOT_SLACK).contains(&t);

    let mut ret = Vec::new();
    for t1 in crate::num::bernstein_roots(&curve.aligned_to(line)) {
        if !in_range(t1) {
            continue;
        }
        let t1 = snap_unit(t1).clamp(0.0, 1.0);
        let p = curve.eval(t1);
        let t2 = (p - line.p0).dot(dir) / len2;
        if !in_range(t2) {
            continue;
        }
        ret.push(Intersection::new(t1, snap_unit(t2).clamp(0.0, 1.0)));
    }
    ret
}
