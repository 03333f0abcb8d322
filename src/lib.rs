#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod bbox;
pub mod boolean;
pub mod bvh;
pub mod curve;
mod graph;
mod hull;
pub mod intersect;
pub mod num;
pub mod path;
pub mod winding;

#[cfg(feature = "generators")]
pub mod generators;

pub use bbox::BoundingBox;
pub use boolean::{
    difference, intersection, remove_crossings, union, BooleanOp, BooleanOptions, BooleanOutput,
    Classification, Diagnostic,
};
pub use curve::Curve;
pub use intersect::{intersect, IntersectOptions, Intersection, IntersectionStrategy};
pub use path::{
    ComponentIntersection, IndexedLocation, Path, PathComponent, PathIntersection, PathLocation,
    Projection,
};

/// A fill rule tells us how to decide whether a point is "inside" a path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

impl FillRule {
    /// Does this winding number count as inside?
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding % 2 != 0,
            FillRule::NonZero => winding != 0,
        }
    }
}

/// The input was faulty.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A path component needs at least one element.
    #[error("a path component needs at least one element")]
    EmptyComponent,
    /// The number of points didn't match the element orders.
    #[error("expected {expected} points, but got {points}")]
    PointCountMismatch {
        /// How many points there were.
        points: usize,
        /// How many the orders call for.
        expected: usize,
    },
    /// Elements can only be lines, quadratics, or cubics.
    #[error("unsupported element order {0}")]
    UnsupportedOrder(usize),
    /// An element didn't start where the previous one ended.
    #[error("element {element} doesn't start where the previous one ended")]
    NotContiguous {
        /// The index of the offending element.
        element: usize,
    },
    /// At least one of the coordinates was infinite or NaN.
    #[error("one of the inputs was infinite or NaN")]
    NonFinite,
    /// SVG path data couldn't be parsed.
    #[error("invalid SVG path data: {0}")]
    Svg(String),
}
