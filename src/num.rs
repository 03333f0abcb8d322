//! Small numerical helpers: float ordering, parameter snapping and root finding.

use std::hash::Hash;

use arrayvec::ArrayVec;
use kurbo::common::solve_cubic;

/// Parameters this close to 0 or 1 get snapped to exactly 0 or 1.
///
/// Intersections that land on the join between two path elements need to
/// agree exactly on which element they belong to, so `t = 1 - 1e-12` and
/// `t = 1e-12` shouldn't both survive. Anything coarser than rounding noise
/// is left alone: a genuine crossing at `t = 1e-6` stays where it is.
pub const T_SNAP: f64 = 1e-9;

/// A wrapper for `f64` that implements `Ord`.
///
/// This one just panics when comparing NaNs -- it doesn't order them, nor does
/// it guard against them on construction. Everything we sort has already
/// been checked for finiteness.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CheapOrderedFloat(f64);

impl Hash for CheapOrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}

impl CheapOrderedFloat {
    /// Retrieve the inner `f64`.
    pub fn into_inner(self) -> f64 {
        self.0
    }
}

// Now comes the fishy stuff.
impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0 < other.0 {
            std::cmp::Ordering::Less
        } else if self.0 > other.0 {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    }
}

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        CheapOrderedFloat(value)
    }
}

/// Are `a` and `b` within `eps` of one another?
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Snaps a parameter to 0 or 1 if it's within [`T_SNAP`] of them.
pub fn snap_unit(t: f64) -> f64 {
    if approx_eq(t, 0.0, T_SNAP) {
        0.0
    } else if approx_eq(t, 1.0, T_SNAP) {
        1.0
    } else {
        t
    }
}

// Tries to solve a cubic, but only looks for accurate solutions in the interval [0.0, 1.0].
//
// This doesn't actually filter out solutions outside that interval, it only
// makes some tweaks for better numerical stability inside it.
pub(crate) fn solve_cubic_in_unit_interval(
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
) -> ArrayVec<f64, 3> {
    // Since we're only interested in small values of t, we can ignore c3 if it's
    // much smaller than the other coefficients. Zeroing it out introduces error
    // of order 1/T for a threshold T, while keeping it costs about T * 1e-15 of
    // absolute error in the roots. Balancing the two gives T around 1e7.
    let mut new_c3 = c3;
    let mut new_c2 = c2;
    if c3.abs() < c2.abs().max(c1.abs()).max(c0.abs()) / 1e7 {
        new_c3 = 0.0;
        if c2.abs() < c1.abs().max(c0.abs()) / 1e7 {
            new_c2 = 0.0;
        }
    }
    let mut roots = solve_cubic(c0, c1, new_c2, new_c3);

    // Do a few Newton steps with the original coefficients, to recover the
    // accuracy we may have lost by truncating.
    for x in &mut roots {
        let mut val = c3 * *x * *x * *x + c2 * *x * *x + c1 * *x + c0;
        let mut deriv = 3.0 * c3 * *x * *x + 2.0 * c2 * *x + c1;
        for _ in 0..3 {
            if val.abs() <= 1e-14 || deriv == 0.0 {
                break;
            }

            let step = val / deriv;
            // If the original equation was (x - 1)^2 + eps * x^3, the truncated
            // one has a perfect double root at x = 1 and the Newton step is
            // giant (independent of eps). Restrict it to more like sqrt(eps).
            let step = step.abs().min(val.abs().sqrt()).copysign(step);
            *x -= step;

            val = c3 * *x * *x * *x + c2 * *x * *x + c1 * *x + c0;
            deriv = 3.0 * c3 * *x * *x + 2.0 * c2 * *x + c1;
        }
    }
    roots
}

/// Finds the roots of a polynomial given in the Bernstein basis.
///
/// `coeffs` has between 2 and 4 entries (a line, quadratic, or cubic). The
/// roots are returned in increasing order. They are not clipped to `[0, 1]`,
/// but they are only accurate near there. A polynomial that is identically
/// zero has no roots, as far as we're concerned.
pub fn bernstein_roots(coeffs: &[f64]) -> ArrayVec<f64, 3> {
    let (c0, c1, c2, c3) = match *coeffs {
        [b0, b1] => (b0, b1 - b0, 0.0, 0.0),
        [b0, b1, b2] => (b0, 2.0 * (b1 - b0), b0 - 2.0 * b1 + b2, 0.0),
        [b0, b1, b2, b3] => (
            b0,
            3.0 * (b1 - b0),
            3.0 * (b0 - 2.0 * b1 + b2),
            b3 - 3.0 * b2 + 3.0 * b1 - b0,
        ),
        _ => return ArrayVec::new(),
    };
    if c0 == 0.0 && c1 == 0.0 && c2 == 0.0 && c3 == 0.0 {
        return ArrayVec::new();
    }

    let mut roots = solve_cubic_in_unit_interval(c0, c1, c2, c3);
    roots.retain(|t| t.is_finite());
    roots.sort_by_key(|t| CheapOrderedFloat::from(*t));
    roots
}

/// Solves the 2x2 linear system `[a b] x = rhs`, returning `None` if it's singular.
pub(crate) fn solve_2x2(a: kurbo::Vec2, b: kurbo::Vec2, rhs: kurbo::Vec2) -> Option<(f64, f64)> {
    let inv_det = 1.0 / a.cross(b);
    if !inv_det.is_finite() {
        return None;
    }
    let x = rhs.cross(b) * inv_det;
    let y = a.cross(rhs) * inv_det;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn snapping() {
        assert_eq!(snap_unit(1e-12), 0.0);
        assert_eq!(snap_unit(1.0 - 1e-12), 1.0);
        assert_eq!(snap_unit(0.5), 0.5);
        assert_eq!(snap_unit(1e-6), 1e-6);
        assert_eq!(snap_unit(1.0 - 1e-6), 1.0 - 1e-6);
    }

    #[test]
    fn linear_root() {
        let roots = bernstein_roots(&[-1.0, 1.0]);
        assert_eq!(roots.as_slice(), &[0.5]);
    }

    #[test]
    fn quadratic_roots() {
        // (t - 0.25)(t - 0.75) = t^2 - t + 3/16, in Bernstein form.
        let b0 = 3.0 / 16.0;
        let b1 = b0 - 0.5;
        let b2 = b0 - 1.0 + 1.0;
        let roots = bernstein_roots(&[b0, b1, b2]);
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 0.25).abs() < 1e-12);
        assert!((roots[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_polynomial() {
        assert!(bernstein_roots(&[0.0, 0.0, 0.0]).is_empty());
    }

    #[test]
    fn singular_system() {
        let v = kurbo::Vec2::new(1.0, 2.0);
        assert!(solve_2x2(v, v * 2.0, v).is_none());
        let (x, y) = solve_2x2(
            kurbo::Vec2::new(1.0, 0.0),
            kurbo::Vec2::new(0.0, 2.0),
            kurbo::Vec2::new(3.0, 4.0),
        )
        .unwrap();
        assert_eq!((x, y), (3.0, 2.0));
    }

    proptest! {
        #[test]
        fn cubic_roots_are_roots(r0 in 0.0f64..1.0, r1 in 0.0f64..1.0, r2 in 0.0f64..1.0) {
            // Expand (t - r0)(t - r1)(t - r2) and convert to the Bernstein basis.
            let c3 = 1.0;
            let c2 = -(r0 + r1 + r2);
            let c1 = r0 * r1 + r0 * r2 + r1 * r2;
            let c0 = -r0 * r1 * r2;
            let b0 = c0;
            let b1 = c0 + c1 / 3.0;
            let b2 = c0 + 2.0 * c1 / 3.0 + c2 / 3.0;
            let b3 = c0 + c1 + c2 + c3;
            let roots = bernstein_roots(&[b0, b1, b2, b3]);
            prop_assert!(!roots.is_empty());
            for t in roots {
                let val = ((c3 * t + c2) * t + c1) * t + c0;
                prop_assert!(val.abs() < 1e-9);
            }
        }
    }
}
