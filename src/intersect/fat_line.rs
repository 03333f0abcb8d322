//! Curve/curve intersection by Bézier clipping.
//!
//! Each curve lies within a "fat line": a band around the line through its
//! endpoints, as wide as its control polygon. Clipping the other curve to
//! that band (using the convex hull of its distance function) discards
//! parameter ranges that can't contain an intersection. We alternate
//! between the two curves until both parameter ranges are tiny, and split
//! whenever a clip fails to make enough progress.

use kurbo::{Line, Point, Vec2};

use crate::{curve::Curve, hull::convex_hull};

use super::Intersection;

/// The coarsest parameter precision we'll settle for.
const MAX_PRECISION: f64 = 1e-8;

/// If a clip keeps more than this fraction of a curve, we split instead.
const MIN_CLIPPED_SIZE_THRESHOLD: f64 = 0.8;

/// How close two nearly-constant pieces must be to count as meeting.
const EPSILON: f64 = 1e-6;

const MAX_CALLS: usize = 100;
const MAX_ITERATIONS: usize = 100;

/// An interval of parameters, with `start <= end`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    const UNIT: Interval = Interval {
        start: 0.0,
        end: 1.0,
    };

    fn new(a: f64, b: f64) -> Self {
        Interval {
            start: a.min(b),
            end: a.max(b),
        }
    }

    fn extent(&self) -> f64 {
        self.end - self.start
    }

    fn middle(&self) -> f64 {
        0.5 * (self.start + self.end)
    }

    /// The parameter to report for an intersection found in this interval.
    ///
    /// An interval reaching within `precision` of an end reports that end
    /// exactly, so hits at a shared endpoint agree with the other strategies.
    fn representative(&self, precision: f64) -> f64 {
        if self.start <= precision {
            0.0
        } else if self.end >= 1.0 - precision {
            1.0
        } else {
            self.middle()
        }
    }

    fn value_at(&self, t: f64) -> f64 {
        (1.0 - t) * self.start + t * self.end
    }

    /// Maps a sub-interval of `[0, 1]` into this interval.
    fn map(&self, inner: Interval) -> Interval {
        Interval::new(self.value_at(inner.start), self.value_at(inner.end))
    }
}

const FIRST_HALF: Interval = Interval {
    start: 0.0,
    end: 0.5,
};

// The two halves shouldn't overlap, or an intersection at exactly 0.5 gets found twice.
fn second_half() -> Interval {
    Interval {
        start: f64::from_bits(0.5f64.to_bits() + 1),
        end: 1.0,
    }
}

fn is_constant(c: &Curve, precision: f64) -> bool {
    let start = c.start();
    c.points()
        .iter()
        .all(|p| (*p - start).hypot() <= precision)
}

fn are_near(p: Point, q: Point) -> bool {
    (p - q).hypot() <= EPSILON
}

fn middle_point(c: &Curve) -> Point {
    c.start().midpoint(c.end())
}

fn portion(c: &Curve, dom: Interval) -> Curve {
    c.subsegment(dom.start..dom.end)
}

/// An oriented line with a unit direction.
#[derive(Clone, Copy, Debug)]
struct OrientedLine {
    origin: Point,
    dir: Vec2,
}

impl OrientedLine {
    fn through(line: Line) -> Self {
        let dir = line.p1 - line.p0;
        let len = dir.hypot();
        OrientedLine {
            origin: line.p0,
            dir: if len > 0.0 { dir / len } else { Vec2::new(1.0, 0.0) },
        }
    }

    fn signed_distance(&self, p: Point) -> f64 {
        self.dir.cross(p - self.origin)
    }

    fn orthogonal_through(&self, p: Point) -> Self {
        OrientedLine {
            origin: p,
            dir: self.dir.turn_90(),
        }
    }
}

/// The line from the start point to the last control point that's
/// distinguishable from it.
fn orientation_line(c: &Curve, precision: f64) -> OrientedLine {
    let points = c.points();
    let p0 = points[0];
    let far = points[1..]
        .iter()
        .rev()
        .find(|p| (**p - p0).hypot() > precision)
        .copied()
        .unwrap_or(p0);
    OrientedLine::through(Line::new(p0, far))
}

/// The band, as a range of signed distances from `line`, that contains `c`.
fn fat_line_bounds(c: &Curve, line: &OrientedLine) -> Interval {
    let (min, max) = c
        .points()
        .iter()
        .map(|p| line.signed_distance(*p))
        .fold((0.0f64, 0.0f64), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Interval { start: min, end: max }
}

// The x coordinate where the segment from p to q reaches height y.
fn cross_at(p: Point, q: Point, y: f64) -> f64 {
    p.x + (y - p.y) * (q.x - p.x) / (q.y - p.y)
}

/// Clips `c` to the parameters where it might be within `bound` of `line`.
fn clip_interval(c: &Curve, line: &OrientedLine, bound: Interval) -> Option<Interval> {
    let points = c.points();
    let n = (points.len() - 1) as f64;
    let distances: Vec<Point> = points
        .iter()
        .enumerate()
        .map(|(i, p)| Point::new(i as f64 / n, line.signed_distance(*p)))
        .collect();
    let hull = convex_hull(&distances);

    let mut tmin = 1.0f64;
    let mut tmax = 0.0f64;
    let mut include = |t: f64| {
        tmin = tmin.min(t);
        tmax = tmax.max(t);
    };

    let below = |p: &Point| p.y < bound.start;
    let above = |p: &Point| p.y > bound.end;
    // Walk the closed hull, noting vertices inside the band and the places
    // where edges enter or leave it.
    for i in 0..hull.len() {
        let p = hull[i];
        let q = hull[(i + 1) % hull.len()];
        if !below(&p) && !above(&p) {
            include(p.x);
        }
        if below(&p) != below(&q) {
            include(cross_at(p, q, bound.start));
        }
        if above(&p) != above(&q) {
            include(cross_at(p, q, bound.end));
        }
    }

    (tmin <= tmax).then(|| Interval::new(tmin, tmax))
}

/// Clips `c2` against the fat line of `c1`, returning the surviving parameter range of `c2`.
fn clip(c1: &Curve, c2: &Curve, precision: f64) -> Option<Interval> {
    if is_constant(c1, precision) {
        let line = orientation_line(c2, precision).orthogonal_through(middle_point(c1));
        clip_interval(c2, &line, Interval { start: 0.0, end: 0.0 })
    } else {
        let line = orientation_line(c1, precision);
        let bound = fat_line_bounds(c1, &line);
        clip_interval(c2, &line, bound)
    }
}

struct Clipper {
    precision: f64,
    calls: usize,
    found: Vec<(Interval, Interval)>,
}

pub(super) fn intersect(a: &Curve, b: &Curve, precision: f64) -> Vec<Intersection> {
    let precision = if precision > 0.0 {
        precision.min(MAX_PRECISION)
    } else {
        MAX_PRECISION
    };
    let mut clipper = Clipper {
        precision,
        calls: 0,
        found: Vec::new(),
    };
    clipper.iterate(*a, *b, Interval::UNIT, Interval::UNIT);
    if clipper.calls > MAX_CALLS {
        tracing::debug!(
            found = clipper.found.len(),
            "fat line clipping ran out of iterations"
        );
    }
    clipper
        .found
        .into_iter()
        .map(|(da, db)| Intersection::new(da.representative(precision), db.representative(precision)))
        .collect()
}

impl Clipper {
    fn iterate(&mut self, mut a: Curve, mut b: Curve, mut dom_a: Interval, mut dom_b: Interval) {
        self.calls += 1;
        if self.calls > MAX_CALLS {
            return;
        }
        let precision = self.precision;
        if is_constant(&a, precision) && is_constant(&b, precision) {
            if are_near(middle_point(&a), middle_point(&b)) {
                self.found.push((dom_a, dom_b));
            }
            return;
        }

        // Whether `a` is the one doing the clipping this round.
        let mut a_clips = true;
        let mut iterations = 1;
        while iterations < MAX_ITERATIONS
            && (dom_a.extent() >= precision || dom_b.extent() >= precision)
        {
            iterations += 1;
            let (clipper, clipped, dom) = if a_clips {
                (&a, &mut b, &mut dom_b)
            } else {
                (&b, &mut a, &mut dom_a)
            };
            let Some(kept) = clip(clipper, clipped, precision) else {
                return;
            };
            *dom = dom.map(kept);
            *clipped = portion(clipped, kept);

            if is_constant(&a, precision) && is_constant(&b, precision) {
                if are_near(middle_point(&a), middle_point(&b)) {
                    break;
                } else {
                    return;
                }
            }

            if kept.extent() > MIN_CLIPPED_SIZE_THRESHOLD {
                let halves = [FIRST_HALF, second_half()];
                if dom_a.extent() > dom_b.extent() {
                    for half in halves {
                        self.iterate(portion(&a, half), b, dom_a.map(half), dom_b);
                    }
                } else {
                    for half in halves {
                        self.iterate(a, portion(&b, half), dom_a, dom_b.map(half));
                    }
                }
                return;
            }

            a_clips = !a_clips;
        }
        self.found.push((dom_a, dom_b));
    }
}

#[cfg(test)]
mod tests {
    use kurbo::QuadBez;

    use super::*;

    #[test]
    fn interval_mapping() {
        let outer = Interval::new(0.5, 1.0);
        assert_eq!(outer.map(FIRST_HALF), Interval::new(0.5, 0.75));
        assert_eq!(Interval::new(0.75, 0.25).extent(), 0.5);
        assert!(second_half().start > FIRST_HALF.end);
    }

    #[test]
    fn intervals_at_the_ends_report_the_ends() {
        let p = MAX_PRECISION;
        assert_eq!(Interval::new(1.0 - 0.5 * p, 1.0 - 0.25 * p).representative(p), 1.0);
        assert_eq!(Interval::new(0.0, 0.5 * p).representative(p), 0.0);
        assert_eq!(Interval::new(0.5, 0.5 + 0.5 * p).representative(p), 0.5 + 0.25 * p);
    }

    #[test]
    fn clipping_shrinks() {
        // A flat line and a steep parabola crossing it near the middle.
        let flat: Curve = Line::new((0.0, 0.0), (4.0, 0.0)).into();
        let steep: Curve = QuadBez::new((2.0, -2.0), (2.5, 0.0), (2.0, 2.0)).into();
        let kept = clip(&flat, &steep, MAX_PRECISION).unwrap();
        assert!(kept.start > 0.0 && kept.end < 1.0);
        assert!(kept.start <= 0.5 && 0.5 <= kept.end);
    }

    #[test]
    fn clipping_rejects() {
        let a: Curve = QuadBez::new((0.0, 0.0), (1.0, 1.0), (2.0, 0.0)).into();
        let b: Curve = QuadBez::new((0.0, 5.0), (1.0, 6.0), (2.0, 5.0)).into();
        assert!(clip(&a, &b, MAX_PRECISION).is_none());
    }

    #[test]
    fn two_parabolas() {
        let a: Curve = QuadBez::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0)).into();
        let b: Curve = QuadBez::new((0.0, 1.0), (1.0, -1.0), (2.0, 1.0)).into();
        let ints = intersect(&a, &b, 1e-6);
        let mut xs: Vec<f64> = ints.iter().map(|i| a.eval(i.t1).x).collect();
        xs.sort_by(|x, y| x.partial_cmp(y).unwrap());
        xs.dedup_by(|x, y| (*x - *y).abs() < 1e-6);
        // They meet where 8t^2 - 8t + 1 = 0, and x = 2t.
        assert_eq!(xs.len(), 2);
        assert!((xs[0] - (1.0 - std::f64::consts::FRAC_1_SQRT_2)).abs() < 1e-6);
        assert!((xs[1] - (1.0 + std::f64::consts::FRAC_1_SQRT_2)).abs() < 1e-6);
    }
}
