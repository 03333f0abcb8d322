//! Curve/curve intersection by recursive subdivision.
//!
//! We keep splitting both curves in half (pruning pairs of pieces whose
//! bounding boxes are disjoint) until the pieces are smaller than the
//! accuracy. At that point each piece is treated as its chord; the chord
//! intersection is a starting guess that gets polished with a few Newton
//! steps on the original curves.

use crate::{bbox::BoundingBox, curve::Curve, num::solve_2x2};

use super::{line_line, Intersection};

const MAX_RESULTS: usize = 20;
const MAX_DEPTH: usize = 40;
const MAX_CALLS: usize = 4096;
const NEWTON_STEPS: usize = 8;

/// Chord intersections can miss by a little when the chord is only an
/// approximation of the curve, so we look slightly past the ends.
const CHORD_SLACK: f64 = 0.25;

#[derive(Clone, Copy, Debug)]
struct Piece {
    curve: Curve,
    t0: f64,
    t1: f64,
    bbox: BoundingBox,
}

impl Piece {
    fn whole(curve: &Curve) -> Self {
        Piece {
            curve: *curve,
            t0: 0.0,
            t1: 1.0,
            bbox: curve.bounding_box(),
        }
    }

    fn size(&self) -> f64 {
        let size = self.bbox.size();
        size.x + size.y
    }

    fn can_split(&self, depth: usize) -> bool {
        let mid = self.mid();
        depth < MAX_DEPTH && self.t0 < mid && mid < self.t1
    }

    fn mid(&self) -> f64 {
        0.5 * (self.t0 + self.t1)
    }

    fn split(&self) -> (Piece, Piece) {
        let (left, right) = self.curve.split(0.5);
        let mid = self.mid();
        (
            Piece {
                curve: left,
                t0: self.t0,
                t1: mid,
                bbox: left.bounding_box(),
            },
            Piece {
                curve: right,
                t0: mid,
                t1: self.t1,
                bbox: right.bounding_box(),
            },
        )
    }

    // Maps a local parameter to the original curve's parameter.
    fn global(&self, s: f64) -> f64 {
        (1.0 - s) * self.t0 + s * self.t1
    }

    // Is `t` inside this piece, or at most one piece-width away from it?
    fn is_near(&self, t: f64) -> bool {
        let width = self.t1 - self.t0;
        t >= self.t0 - width && t <= self.t1 + width
    }
}

struct Subdivider<'a> {
    a: &'a Curve,
    b: &'a Curve,
    accuracy: f64,
    calls: usize,
    results: Vec<Intersection>,
}

pub(super) fn intersect(a: &Curve, b: &Curve, accuracy: f64) -> Vec<Intersection> {
    let mut sub = Subdivider {
        a,
        b,
        accuracy: if accuracy > 0.0 { accuracy } else { super::IntersectOptions::DEFAULT_ACCURACY },
        calls: 0,
        results: Vec::new(),
    };
    sub.recurse(Piece::whole(a), Piece::whole(b), 0);
    if sub.calls > MAX_CALLS || sub.results.len() >= MAX_RESULTS {
        tracing::debug!(
            calls = sub.calls,
            results = sub.results.len(),
            "curve subdivision gave up early"
        );
    }
    sub.results
}

impl Subdivider<'_> {
    fn recurse(&mut self, p: Piece, q: Piece, depth: usize) {
        self.calls += 1;
        if self.calls > MAX_CALLS || self.results.len() >= MAX_RESULTS {
            return;
        }
        if !p.bbox.overlaps(&q.bbox) {
            return;
        }

        let split_p = p.size() >= self.accuracy && p.can_split(depth);
        let split_q = q.size() >= self.accuracy && q.can_split(depth);
        match (split_p, split_q) {
            (false, false) => self.leaf(&p, &q),
            (true, false) => {
                let (p0, p1) = p.split();
                self.recurse(p0, q, depth + 1);
                self.recurse(p1, q, depth + 1);
            }
            (false, true) => {
                let (q0, q1) = q.split();
                self.recurse(p, q0, depth + 1);
                self.recurse(p, q1, depth + 1);
            }
            (true, true) => {
                let (p0, p1) = p.split();
                let (q0, q1) = q.split();
                self.recurse(p0, q0, depth + 1);
                self.recurse(p0, q1, depth + 1);
                self.recurse(p1, q0, depth + 1);
                self.recurse(p1, q1, depth + 1);
            }
        }
    }

    fn leaf(&mut self, p: &Piece, q: &Piece) {
        let Some((s, u, strict)) = chord_intersection(&p.curve, &q.curve) else {
            return;
        };
        let guess = (p.global(s.clamp(0.0, 1.0)), q.global(u.clamp(0.0, 1.0)));
        match refine(self.a, self.b, guess) {
            Some((t1, t2)) if p.is_near(t1) && q.is_near(t2) => {
                self.results.push(Intersection::new(t1, t2));
            }
            _ if strict => self.results.push(Intersection::new(guess.0, guess.1)),
            _ => {}
        }
    }
}

/// Intersects the chords of two curves, allowing a little slack past their ends.
///
/// Returns the local parameters, and whether the hit is within both chords proper.
fn chord_intersection(a: &Curve, b: &Curve) -> Option<(f64, f64, bool)> {
    let la = kurbo::Line::new(a.start(), a.end());
    let lb = kurbo::Line::new(b.start(), b.end());
    if let Some(i) = line_line(la, lb) {
        return Some((i.t1, i.t2, true));
    }
    if la.p0 == la.p1 || lb.p0 == lb.p1 {
        return None;
    }
    let (s, u) = solve_2x2(la.p1 - la.p0, lb.p0 - lb.p1, lb.p0 - la.p0)?;
    let relaxed = -CHORD_SLACK..=1.0 + CHORD_SLACK;
    (relaxed.contains(&s) && relaxed.contains(&u)).then_some((s, u, false))
}

/// Polishes an approximate intersection with Newton's method.
///
/// Returns `None` unless the iteration converges to a point where the two
/// curves really meet.
fn refine(a: &Curve, b: &Curve, (mut t1, mut t2): (f64, f64)) -> Option<(f64, f64)> {
    let scale = a
        .bounding_box()
        .union(&b.bounding_box())
        .size()
        .hypot()
        .max(1.0);
    let tolerance = 1e-10 * scale;

    let mut residual = a.eval(t1) - b.eval(t2);
    for _ in 0..NEWTON_STEPS {
        if residual.hypot() <= tolerance {
            break;
        }
        // Solve [a'(t1), -b'(t2)] (dt1, dt2) = -residual.
        let Some((dt1, dt2)) = solve_2x2(a.deriv(t1), -b.deriv(t2), -residual) else {
            break;
        };
        let n1 = (t1 + dt1).clamp(0.0, 1.0);
        let n2 = (t2 + dt2).clamp(0.0, 1.0);
        let new_residual = a.eval(n1) - b.eval(n2);
        if new_residual.hypot2() >= residual.hypot2() {
            break;
        }
        t1 = n1;
        t2 = n2;
        residual = new_residual;
    }
    (residual.hypot() <= tolerance).then_some((t1, t2))
}

#[cfg(test)]
mod tests {
    use kurbo::{CubicBez, QuadBez};

    use super::*;

    #[test]
    fn refine_converges() {
        let a: Curve = QuadBez::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0)).into();
        let b: Curve = QuadBez::new((0.0, 1.0), (1.0, -1.0), (2.0, 1.0)).into();
        // Both have x = 2t, so they cross at equal parameters.
        let (t1, t2) = refine(&a, &b, (0.3, 0.3)).unwrap();
        assert!((a.eval(t1) - b.eval(t2)).hypot() < 1e-9);
        assert!((t1 - t2).abs() < 1e-9);
    }

    #[test]
    fn refine_rejects_misses() {
        let a: Curve = QuadBez::new((0.0, 0.0), (1.0, 1.0), (2.0, 0.0)).into();
        let b: Curve = QuadBez::new((0.0, 2.0), (1.0, 3.0), (2.0, 2.0)).into();
        assert!(refine(&a, &b, (0.5, 0.5)).is_none());
    }

    #[test]
    fn coarse_accuracy_still_accurate() {
        let a: Curve = CubicBez::new((0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)).into();
        let b: Curve = CubicBez::new((-1.0, 1.0), (1.0, 0.5), (2.0, 2.0), (3.0, 1.0)).into();
        let ints = super::super::normalize(intersect(&a, &b, 1.0));
        assert_eq!(ints.len(), 2);
        for i in ints {
            assert!((a.eval(i.t1) - b.eval(i.t2)).hypot() < 1e-6);
        }
    }
}
