//! Utilities for fuzz and/or property testing using `arbitrary`.
//!
//! The `check_*` functions are properties that should hold for any input.
//! They panic if the property fails, and they're shared between the unit
//! tests (through `arbtest`) and the fuzz targets.

use arbitrary::Unstructured;
use kurbo::{Line, Point};

use crate::{
    boolean::{self, BooleanOptions, Classification},
    curve::Curve,
    intersect::{intersect, IntersectOptions, Intersection, IntersectionStrategy},
    num::bernstein_roots,
    path::{Path, PathComponent},
};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be very close to `orig`.
pub fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
        Ok((orig * scale).clamp(start, end))
    } else {
        float_in_range(start, end, u)
    }
}

/// Generate a point in the square `[-size, size] x [-size, size]`.
pub fn point(size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(-size, size, u)?,
        float_in_range(-size, size, u)?,
    ))
}

fn curve_from(start: Point, size: f64, u: &mut Unstructured<'_>) -> Result<Curve, arbitrary::Error> {
    let mut points = vec![start];
    let order = u.int_in_range(1..=3)?;
    for _ in 0..order {
        points.push(point(size, u)?);
    }
    // from_points only fails on a bad point count, and we control that.
    Ok(Curve::from_points(&points).unwrap_or(Curve::Line(Line::new(points[0], points[1]))))
}

/// Generate an arbitrary line, quadratic or cubic inside `[-size, size]^2`.
pub fn curve(size: f64, u: &mut Unstructured<'_>) -> Result<Curve, arbitrary::Error> {
    let start = point(size, u)?;
    curve_from(start, size, u)
}

/// Generate an arbitrary curve that has a chance to share something with `first`:
/// a start point, an end point, or a stretch of the same curve.
pub fn another_curve(
    first: &Curve,
    size: f64,
    u: &mut Unstructured<'_>,
) -> Result<Curve, arbitrary::Error> {
    match u.int_in_range(0..=3)? {
        0 => curve_from(first.start(), size, u),
        1 => curve_from(first.end(), size, u),
        2 => {
            let t0 = float_in_range(0.0, 1.0, u)?;
            let t1 = float_in_range(0.0, 1.0, u)?;
            Ok(first.subsegment(t0.min(t1)..t0.max(t1)))
        }
        _ => curve(size, u),
    }
}

/// Generate a closed component with between 1 and `max_elements` elements.
pub fn closed_component(
    size: f64,
    max_elements: usize,
    u: &mut Unstructured<'_>,
) -> Result<PathComponent, arbitrary::Error> {
    let n = u.int_in_range(1..=max_elements.max(1))?;
    let first = point(size, u)?;
    let mut points = vec![first];
    let mut orders = Vec::with_capacity(n);
    for i in 0..n {
        let order = u.int_in_range(1..=3)?;
        for _ in 1..order {
            points.push(point(size, u)?);
        }
        points.push(if i + 1 == n { first } else { point(size, u)? });
        orders.push(order);
    }
    PathComponent::new(points, orders).map_err(|_| arbitrary::Error::IncorrectFormat)
}

/// Generate a path of up to `max_components` closed components.
pub fn closed_path(
    size: f64,
    max_components: usize,
    u: &mut Unstructured<'_>,
) -> Result<Path, arbitrary::Error> {
    let n = u.int_in_range(1..=max_components.max(1))?;
    let components = (0..n)
        .map(|_| closed_component(size, 6, u))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Path::new(components))
}

/// Generate the Bernstein coefficients of a polynomial of degree 1 to 3 whose
/// roots are near `[0, 1]`, with a bias towards roots that are almost repeated.
pub fn bernstein_polynomial(u: &mut Unstructured<'_>) -> Result<Vec<f64>, arbitrary::Error> {
    let degree = u.int_in_range(1..=3)?;
    let mut roots = vec![float_in_range(-0.5, 1.5, u)?];
    for _ in 1..degree {
        let prev = roots[roots.len() - 1];
        roots.push(another_float_in_range(prev, -0.5, 1.5, u)?);
    }
    let scale = float_in_range(0.1, 1e3, u)? * if u.arbitrary::<bool>()? { 1.0 } else { -1.0 };

    // Multiply out scale * (t - r1) * ... in the power basis.
    let mut power = vec![scale];
    for r in roots {
        let mut next = vec![0.0; power.len() + 1];
        for (i, c) in power.iter().enumerate() {
            next[i] -= r * c;
            next[i + 1] += c;
        }
        power = next;
    }
    Ok(power_to_bernstein(&power))
}

fn power_to_bernstein(power: &[f64]) -> Vec<f64> {
    match *power {
        [a0, a1] => vec![a0, a0 + a1],
        [a0, a1, a2] => vec![a0, a0 + a1 / 2.0, a0 + a1 + a2],
        [a0, a1, a2, a3] => vec![
            a0,
            a0 + a1 / 3.0,
            a0 + 2.0 * a1 / 3.0 + a2 / 3.0,
            a0 + a1 + a2 + a3,
        ],
        _ => power.to_vec(),
    }
}

fn eval_bernstein(coeffs: &[f64], t: f64) -> f64 {
    // de Casteljau.
    let mut c = coeffs.to_vec();
    for k in (1..c.len()).rev() {
        for i in 0..k {
            c[i] = (1.0 - t) * c[i] + t * c[i + 1];
        }
    }
    c[0]
}

/// Roots of Bernstein polynomials are accurate inside the unit interval, and
/// a sign change over the unit interval always produces a root.
pub fn check_bernstein_roots(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let coeffs = bernstein_polynomial(u)?;
    let size = coeffs.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    let threshold = 1e-6 * size;

    let roots = bernstein_roots(&coeffs);
    let inside: Vec<f64> = roots
        .iter()
        .copied()
        .filter(|t| (-1e-3..=1.0 + 1e-3).contains(t))
        .collect();
    for &t in &inside {
        let val = eval_bernstein(&coeffs, t);
        assert!(val.abs() <= threshold, "{coeffs:?} at root {t} is {val}");
    }

    let first = coeffs[0];
    let last = coeffs[coeffs.len() - 1];
    if first.abs() > threshold && last.abs() > threshold && first.signum() != last.signum() {
        assert!(!inside.is_empty(), "{coeffs:?} changes sign but has roots {roots:?}");
    }
    Ok(())
}

fn check_genuine(a: &Curve, b: &Curve, found: &[Intersection], tolerance: f64) {
    for i in found {
        assert!((0.0..=1.0).contains(&i.t1) && (0.0..=1.0).contains(&i.t2));
        let dist = (a.eval(i.t1) - b.eval(i.t2)).hypot();
        assert!(dist <= tolerance, "{a:?} and {b:?} are {dist} apart at {i:?}");
    }
}

/// Every intersection we report is a real one, in either argument order, and
/// anything involving a line comes out the same both ways around.
pub fn check_intersection_symmetry(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let size = 100.0;
    let a = curve(size, u)?;
    let b = another_curve(&a, size, u)?;
    let strategy = if u.arbitrary()? {
        IntersectionStrategy::Subdivision
    } else {
        IntersectionStrategy::FatLine
    };
    let options = IntersectOptions {
        strategy,
        accuracy: 1e-3,
        ..IntersectOptions::default()
    };
    let tolerance = 4.0 * options.accuracy + 1e-6 * size;

    let ab = intersect(&a, &b, &options);
    let ba = intersect(&b, &a, &options);
    check_genuine(&a, &b, &ab, tolerance);
    check_genuine(&b, &a, &ba, tolerance);

    if matches!(a, Curve::Line(_)) || matches!(b, Curve::Line(_)) {
        let mut swapped: Vec<_> = ba.into_iter().map(Intersection::swapped).collect();
        swapped.sort_by(|x, y| x.t1.total_cmp(&y.t1).then(x.t2.total_cmp(&y.t2)));
        assert_eq!(ab.len(), swapped.len(), "{ab:?} vs {swapped:?}");
        for (x, y) in ab.iter().zip(&swapped) {
            assert!((x.t1 - y.t1).abs() < 1e-7 && (x.t2 - y.t2).abs() < 1e-7);
        }
    }
    Ok(())
}

/// The boolean operations don't panic, and only produce closed, finite output.
pub fn check_boolean_no_panic(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let a = closed_path(10.0, 3, u)?;
    let b = closed_path(10.0, 3, u)?;
    let classification = if u.arbitrary()? {
        Classification::RelativeWinding
    } else {
        Classification::Sampled
    };
    let options = BooleanOptions {
        classification,
        ..BooleanOptions::default()
    };

    let outputs = [
        boolean::union(&a, &b, &options),
        boolean::intersection(&a, &b, &options),
        boolean::difference(&a, &b, &options),
        boolean::remove_crossings(&a, &options),
    ];
    for out in outputs {
        for c in out.path.components() {
            assert!(c.is_closed());
            assert!(c.points().iter().all(|p| p.is_finite()));
        }
    }
    Ok(())
}
