//! Utilities for generating examples, benchmarks, and test cases.
//!
//! Unless they say otherwise, the shapes here run counter-clockwise (with y
//! pointing up).

use std::f64::consts::TAU;

use kurbo::{Circle, Point, Shape};

use crate::path::{Path, PathComponent};

/// The usual cubic approximation of a circle uses control points this far
/// along the tangents, as a fraction of the radius.
pub const CIRCLE_KAPPA: f64 = 0.551915024494;

// Non-finite input gives nothing.
fn polygon(vertices: &[Point]) -> Option<PathComponent> {
    PathComponent::from_polygon(vertices).ok()
}

/// Generate a bunch of squares, arranged in a grid.
///
/// The bottom-left of the first square is at `(x0, y0)`. Each square has size
/// `size x size`, and the distance between squares (both horizontally and
/// vertically) is `offset`.
///
/// If `slant` is non-zero, generates parallelograms instead of squares: the
/// right-hand side of each square gets translated up by `slant`.
fn squares((x0, y0): (f64, f64), size: f64, offset: f64, slant: f64, count: usize) -> Path {
    let mut ret = Vec::new();
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            ret.extend(polygon(&[
                Point::new(x, y),
                Point::new(x + size, y + slant),
                Point::new(x + size, y + size + slant),
                Point::new(x, y + size),
            ]));
        }
    }
    Path::new(ret)
}

/// Generate an `n` by `n` grid of squares, and an `n - 1` by `n - 1` grid
/// offset so that each of its squares overlaps the corners of four squares
/// in the first grid.
///
/// Neither grid overlaps itself.
pub fn checkerboard(n: usize) -> (Path, Path) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 0.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 0.0, n.saturating_sub(1)),
    )
}

/// Like [`checkerboard`], but with no exactly-horizontal lines.
pub fn slanted_checkerboard(n: usize) -> (Path, Path) {
    (
        squares((0.0, 0.0), 30.0, 40.0, 1.0, n),
        squares((20.0, 20.0), 30.0, 40.0, 1.0, n.saturating_sub(1)),
    )
}

/// A circle made of four cubics.
pub fn circle(center: Point, radius: f64) -> Path {
    circle_component(center, radius).map(Path::from).unwrap_or_default()
}

fn circle_component(center: Point, radius: f64) -> Option<PathComponent> {
    let k = CIRCLE_KAPPA * radius;
    let (x, y) = (center.x, center.y);
    let r = radius;
    let points = vec![
        Point::new(x + r, y),
        Point::new(x + r, y + k),
        Point::new(x + k, y + r),
        Point::new(x, y + r),
        Point::new(x - k, y + r),
        Point::new(x - r, y + k),
        Point::new(x - r, y),
        Point::new(x - r, y - k),
        Point::new(x - k, y - r),
        Point::new(x, y - r),
        Point::new(x + k, y - r),
        Point::new(x + r, y - k),
        Point::new(x + r, y),
    ];
    PathComponent::new(points, vec![3; 4]).ok()
}

/// A circle as kurbo approximates it, which isn't always four cubics.
pub fn kurbo_circle(center: Point, radius: f64, tolerance: f64) -> Path {
    let bez = Circle::new(center, radius).to_path(tolerance);
    Path::from_bezpath(&bez).unwrap_or_default()
}

/// `n` circles of radius 1 spaced evenly around a ring of radius `ring`, so
/// that each one overlaps its neighbors when `ring` is small enough.
pub fn ring_of_circles(n: usize, ring: f64) -> Path {
    Path::new(
        (0..n)
            .filter_map(|i| {
                let angle = i as f64 * TAU / n as f64;
                circle_component(Point::new(ring * angle.cos(), ring * angle.sin()), 1.0)
            })
            .collect(),
    )
}

/// A star polygon with `points` tips, centered at the origin.
///
/// If `step` is bigger than one, the edges jump over that many tips at a time
/// and the star crosses itself (a pentagram is `star(5, 2, 1.0)`).
pub fn star(points: usize, step: usize, radius: f64) -> Path {
    let tips = points.max(3);
    let vertices: Vec<_> = (0..tips)
        .map(|i| {
            let angle = (i * step) as f64 * TAU / tips as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();
    polygon(&vertices).map(Path::from).unwrap_or_default()
}

/// A figure-eight made of two triangles that meet at the origin.
///
/// The right triangle runs counter-clockwise and the left one clockwise.
pub fn figure_eight(size: f64) -> Path {
    polygon(&[
        Point::new(0.0, 0.0),
        Point::new(size, -size),
        Point::new(size, size),
        Point::new(-size, -size),
        Point::new(-size, size),
    ])
    .map(Path::from)
    .unwrap_or_default()
}

/// A closed band whose top edge is a wave of `n` quadratics, alternating up and down.
pub fn wave(n: usize, amplitude: f64) -> Path {
    let n = n.max(1);
    let mut points = vec![Point::new(0.0, 0.0)];
    for i in 0..n {
        let x = i as f64;
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        points.push(Point::new(x + 0.5, sign * 2.0 * amplitude));
        points.push(Point::new(x + 1.0, 0.0));
    }
    let top = n as f64;
    points.push(Point::new(top, -3.0 * amplitude));
    points.push(Point::new(0.0, -3.0 * amplitude));
    points.push(Point::new(0.0, 0.0));
    let mut orders = vec![2; n];
    orders.extend([1, 1, 1]);
    // Built clockwise, so flip it.
    PathComponent::new(points, orders)
        .map(|c| Path::from(c.reversed()))
        .unwrap_or_default()
}
