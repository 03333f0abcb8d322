//! Boolean operations on paths.
//!
//! The operations never fail outright. If they run into something they can't
//! make sense of (usually because an intersection was missed) they do the best
//! they can and say what went wrong in [`BooleanOutput::diagnostics`].

use crate::{
    graph::{Graph, Operation},
    intersect::{IntersectOptions, IntersectionStrategy},
    path::Path,
    FillRule,
};

/// Binary operations between paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BooleanOp {
    /// Everything in either path.
    Union,
    /// Everything in both paths.
    Intersection,
    /// Everything in the first path but not in the second.
    Difference,
}

impl BooleanOp {
    /// Applies this operation.
    pub fn apply(self, a: &Path, b: &Path, options: &BooleanOptions) -> BooleanOutput {
        match self {
            BooleanOp::Union => union(a, b, options),
            BooleanOp::Intersection => intersection(a, b, options),
            BooleanOp::Difference => difference(a, b, options),
        }
    }
}

/// How to decide which edges are inside the other path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Classification {
    /// Compute one winding number per component, and update it by ±1 at every
    /// intersection according to which way the boundary is crossed.
    ///
    /// If a component's count doesn't come back to where it started, that
    /// component falls back to [`Classification::Sampled`].
    #[default]
    RelativeWinding,
    /// Compute a winding number at the midpoint of every edge. Slower, but
    /// every edge stands on its own.
    Sampled,
}

/// Parameters for the boolean operations.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BooleanOptions {
    /// The accuracy for finding intersections; see [`IntersectOptions::accuracy`].
    pub accuracy: f64,
    /// The fat-line clipping precision; see [`IntersectOptions::precision`].
    pub precision: f64,
    /// How to find intersections between curves.
    pub strategy: IntersectionStrategy,
    /// The fill rule for deciding what's inside a path.
    ///
    /// If unset, the two-path operations use [`FillRule::EvenOdd`] and
    /// [`remove_crossings`] uses [`FillRule::NonZero`].
    pub fill_rule: Option<FillRule>,
    /// How edges get classified.
    pub classification: Classification,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        BooleanOptions {
            accuracy: IntersectOptions::DEFAULT_ACCURACY,
            precision: IntersectOptions::DEFAULT_PRECISION,
            strategy: IntersectionStrategy::default(),
            fill_rule: None,
            classification: Classification::default(),
        }
    }
}

impl BooleanOptions {
    /// The options handed to the intersection engine.
    pub fn intersect_options(&self) -> IntersectOptions {
        IntersectOptions {
            strategy: self.strategy,
            accuracy: self.accuracy,
            precision: self.precision,
        }
    }
}

/// Something that went wrong during a boolean operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum Diagnostic {
    /// The traversal couldn't continue from a vertex of the graph, so it closed
    /// off the contour it was working on and gave up on it.
    #[error("traversal got stuck at graph vertex {vertex}")]
    InconsistentTraversal {
        /// The index of the vertex.
        vertex: usize,
    },
    /// Counting winding numbers around a component didn't come back to where
    /// it started, so its edges were classified by sampling instead.
    #[error("winding count of component {component} went from {expected} to {found}")]
    WindingMismatch {
        /// The component, within its path.
        component: usize,
        /// The winding number at the start.
        expected: i32,
        /// The winding number after going all the way around.
        found: i32,
    },
    /// Boolean operations only make sense for closed components; open ones get dropped.
    #[error("component {component} of path {path} isn't closed")]
    OpenComponentIgnored {
        /// Which input path: 0 for the first, 1 for the second.
        path: usize,
        /// The component, within its path.
        component: usize,
    },
}

/// The result of a boolean operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BooleanOutput {
    /// The resulting path.
    pub path: Path,
    /// Anything that went wrong along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl BooleanOutput {
    fn clean(path: Path) -> Self {
        BooleanOutput {
            path,
            diagnostics: Vec::new(),
        }
    }

    /// Did everything go smoothly?
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

fn binary(a: &Path, b: &Path, op: Operation, options: &BooleanOptions) -> BooleanOutput {
    let intersections = a.intersections(b, &options.intersect_options());
    let graph = Graph::new(
        a,
        b,
        false,
        &intersections,
        options.fill_rule.unwrap_or(FillRule::EvenOdd),
        options.classification,
    );
    let (path, diagnostics) = graph.traverse(op);
    BooleanOutput { path, diagnostics }
}

/// The union of two paths.
pub fn union(a: &Path, b: &Path, options: &BooleanOptions) -> BooleanOutput {
    if a.is_empty() {
        return BooleanOutput::clean(b.clone());
    }
    if b.is_empty() {
        return BooleanOutput::clean(a.clone());
    }
    binary(a, b, Operation::Union, options)
}

/// The intersection of two paths.
pub fn intersection(a: &Path, b: &Path, options: &BooleanOptions) -> BooleanOutput {
    binary(a, b, Operation::Intersection, options)
}

/// The part of `a` that's outside `b`.
///
/// Components of `b` that end up as holes in the output are reversed.
pub fn difference(a: &Path, b: &Path, options: &BooleanOptions) -> BooleanOutput {
    let b = b.reversed();
    binary(a, &b, Operation::Difference, options)
}

/// Simplifies a path by removing the places where it crosses itself.
///
/// The output covers the same region (according to the fill rule) with
/// contours that don't cross. A contour that passes through the same point
/// twice without crossing over (like a figure-eight) gets split there.
pub fn remove_crossings(path: &Path, options: &BooleanOptions) -> BooleanOutput {
    let intersections = path.self_intersections(&options.intersect_options());
    let graph = Graph::new(
        path,
        path,
        true,
        &intersections,
        options.fill_rule.unwrap_or(FillRule::NonZero),
        options.classification,
    );
    let (path, diagnostics) = graph.traverse(Operation::RemoveCrossings);
    BooleanOutput { path, diagnostics }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Shape};

    use super::*;
    use crate::path::PathComponent;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        PathComponent::from_polygon(&[p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)])
            .unwrap()
            .into()
    }

    #[test]
    fn empty_inputs() {
        let sq = rect(0.0, 0.0, 1.0, 1.0);
        let empty = Path::default();
        let opts = BooleanOptions::default();
        assert_eq!(union(&sq, &empty, &opts).path, sq);
        assert_eq!(union(&empty, &sq, &opts).path, sq);
        assert!(intersection(&sq, &empty, &opts).path.is_empty());
        assert_eq!(difference(&sq, &empty, &opts).path, sq);
        assert!(difference(&empty, &sq, &opts).path.is_empty());
    }

    #[test]
    fn overlapping_rectangles() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 1.0, 3.0, 3.0);
        for classification in [Classification::RelativeWinding, Classification::Sampled] {
            let opts = BooleanOptions {
                classification,
                ..Default::default()
            };
            let u = union(&a, &b, &opts);
            assert!(u.is_clean());
            assert_eq!(u.path.components().len(), 1);
            assert!((u.path.area() - 7.0).abs() < 1e-9);

            let i = intersection(&a, &b, &opts);
            assert!(i.is_clean());
            assert!((i.path.area() - 1.0).abs() < 1e-9);

            let d = difference(&a, &b, &opts);
            assert!(d.is_clean());
            assert!((d.path.area() - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn nested_rectangles() {
        let outer = rect(0.0, 0.0, 4.0, 4.0);
        let inner = rect(1.0, 1.0, 2.0, 2.0);
        let opts = BooleanOptions::default();

        assert_eq!(union(&outer, &inner, &opts).path, outer);
        assert_eq!(intersection(&outer, &inner, &opts).path, inner);
        let d = difference(&outer, &inner, &opts).path;
        assert_eq!(d.components().len(), 2);
        assert!((d.area() - 15.0).abs() < 1e-9);
        assert!(difference(&inner, &outer, &opts).path.is_empty());
    }

    #[test]
    fn apply_dispatches() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, -1.0, 3.0, 1.0);
        let opts = BooleanOptions::default();
        for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference] {
            let direct = match op {
                BooleanOp::Union => union(&a, &b, &opts),
                BooleanOp::Intersection => intersection(&a, &b, &opts),
                BooleanOp::Difference => difference(&a, &b, &opts),
            };
            assert_eq!(op.apply(&a, &b, &opts), direct);
        }
    }

    #[test]
    fn options_from_yaml() {
        let opts: BooleanOptions =
            serde_yaml::from_str("fill_rule: NonZero\nclassification: Sampled\n").unwrap();
        assert_eq!(opts.fill_rule, Some(FillRule::NonZero));
        assert_eq!(opts.classification, Classification::Sampled);
        assert_eq!(opts.accuracy, IntersectOptions::DEFAULT_ACCURACY);
        assert_eq!(opts.precision, IntersectOptions::DEFAULT_PRECISION);
    }

    #[test]
    fn intersection_settings_are_forwarded() {
        let opts: BooleanOptions =
            serde_yaml::from_str("strategy: FatLine
precision: 1.0e-10
accuracy: 0.01
").unwrap();
        assert_eq!(
            opts.intersect_options(),
            IntersectOptions {
                strategy: IntersectionStrategy::FatLine,
                accuracy: 0.01,
                precision: 1e-10,
            }
        );

        // Circles made of cubics, so the fat-line strategy does the work.
        let a = Path::from_bezpath(&kurbo::Circle::new((0.0, 0.0), 1.0).to_path(1e-3)).unwrap();
        let b = Path::from_bezpath(&kurbo::Circle::new((1.0, 0.0), 1.0).to_path(1e-3)).unwrap();
        let out = intersection(&a, &b, &opts);
        assert!(out.is_clean(), "{:?}", out.diagnostics);
        assert_eq!(out.path.components().len(), 1);
        // Two thirds of the circle minus the equilateral triangles: 2pi/3 - sqrt(3)/2.
        let lens = 2.0 * std::f64::consts::PI / 3.0 - 3f64.sqrt() / 2.0;
        assert!((out.path.area() - lens).abs() < 1e-2);
    }

    #[test]
    fn diagnostics_display() {
        let d = Diagnostic::OpenComponentIgnored {
            path: 1,
            component: 2,
        };
        assert_eq!(d.to_string(), "component 2 of path 1 isn't closed");
    }
}
