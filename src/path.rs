//! Paths, made of components, made of contiguous curves.
//!
//! A [`PathComponent`] stores its curves in a single flat point buffer: the
//! end point of one element is the start point of the next, so a component
//! with elements of orders `o_0, ..., o_{n-1}` has exactly `1 + sum(o_i)`
//! points. A [`Path`] is just a list of components.

use std::sync::OnceLock;

use kurbo::{Affine, BezPath, CubicBez, Line, PathEl, Point, QuadBez, Shape as _, Vec2};

use crate::{
    bbox::BoundingBox,
    bvh::{BoundingBoxHierarchy, NodeKind},
    curve::Curve,
    intersect::{intersect, IntersectOptions},
    winding, Error, FillRule,
};

/// The accuracy we ask of kurbo when projecting onto a single curve.
const NEAREST_ACCURACY: f64 = 1e-9;

/// A point on a [`PathComponent`], given by an element index and a parameter on that element.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexedLocation {
    /// Which element.
    pub element: usize,
    /// The parameter on that element, in `[0, 1]`.
    pub t: f64,
}

impl IndexedLocation {
    /// Creates a new location.
    pub fn new(element: usize, t: f64) -> Self {
        IndexedLocation { element, t }
    }
}

impl PartialOrd for IndexedLocation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.element.cmp(&other.element) {
            std::cmp::Ordering::Equal => self.t.partial_cmp(&other.t),
            ord => Some(ord),
        }
    }
}

/// A point on a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathLocation {
    /// Which component.
    pub component: usize,
    /// Where on that component.
    pub location: IndexedLocation,
}

impl PathLocation {
    /// Creates a new location.
    pub fn new(component: usize, element: usize, t: f64) -> Self {
        PathLocation {
            component,
            location: IndexedLocation::new(element, t),
        }
    }
}

/// A place where two components meet.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentIntersection {
    /// The location on the first component.
    pub location1: IndexedLocation,
    /// The location on the second component.
    pub location2: IndexedLocation,
}

/// A place where two paths (or two parts of the same path) meet.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathIntersection {
    /// The location on the first path.
    pub location1: PathLocation,
    /// The location on the second path.
    pub location2: PathLocation,
}

/// The result of projecting a point onto a component or path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection<L> {
    /// The nearest point.
    pub point: Point,
    /// Where the nearest point is.
    pub location: L,
    /// The distance to the nearest point.
    pub distance: f64,
}

/// A non-empty sequence of contiguous curves.
#[derive(Clone, Debug)]
pub struct PathComponent {
    points: Vec<Point>,
    orders: Vec<usize>,
    offsets: Vec<usize>,
    bvh: OnceLock<BoundingBoxHierarchy>,
}

impl PartialEq for PathComponent {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.orders == other.orders
    }
}

fn offsets_for(orders: &[usize]) -> Vec<usize> {
    orders
        .iter()
        .scan(0, |acc, order| {
            let offset = *acc;
            *acc += order;
            Some(offset)
        })
        .collect()
}

impl PathComponent {
    /// Creates a component from its point buffer and the order of each element.
    ///
    /// Every order must be 1, 2, or 3, and there must be exactly one more
    /// point than the sum of the orders.
    pub fn new(points: Vec<Point>, orders: Vec<usize>) -> Result<Self, Error> {
        if orders.is_empty() {
            return Err(Error::EmptyComponent);
        }
        if let Some(&order) = orders.iter().find(|o| !(1..=3).contains(*o)) {
            return Err(Error::UnsupportedOrder(order));
        }
        let expected = 1 + orders.iter().sum::<usize>();
        if points.len() != expected {
            return Err(Error::PointCountMismatch {
                points: points.len(),
                expected,
            });
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(Error::NonFinite);
        }
        Ok(Self::from_parts(points, orders))
    }

    // The caller is responsible for the invariants.
    fn from_parts(points: Vec<Point>, orders: Vec<usize>) -> Self {
        let offsets = offsets_for(&orders);
        PathComponent {
            points,
            orders,
            offsets,
            bvh: OnceLock::new(),
        }
    }

    /// Creates a component from a list of curves, each starting where the last one ended.
    pub fn from_curves(curves: &[Curve]) -> Result<Self, Error> {
        let (first, rest) = curves.split_first().ok_or(Error::EmptyComponent)?;
        let mut points = first.points().to_vec();
        let mut orders = vec![first.order()];
        for (i, c) in rest.iter().enumerate() {
            if Some(&c.start()) != points.last() {
                return Err(Error::NotContiguous { element: i + 1 });
            }
            points.extend_from_slice(&c.points()[1..]);
            orders.push(c.order());
        }
        Self::new(points, orders)
    }

    /// Creates a closed polygon through the given vertices.
    ///
    /// If the last vertex isn't the same as the first, a closing edge is added.
    pub fn from_polygon(vertices: &[Point]) -> Result<Self, Error> {
        let mut points = vertices.to_vec();
        match (vertices.first(), vertices.last()) {
            (Some(first), Some(last)) if first != last => points.push(*first),
            (Some(_), Some(_)) => {}
            _ => return Err(Error::EmptyComponent),
        }
        let orders = vec![1; points.len() - 1];
        Self::new(points, orders)
    }

    /// All the points, including control points.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The order of each element.
    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    /// The number of elements (curves).
    pub fn element_count(&self) -> usize {
        self.orders.len()
    }

    /// The element at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn element(&self, i: usize) -> Curve {
        let o = self.offsets[i];
        let p = &self.points;
        match self.orders[i] {
            1 => Line::new(p[o], p[o + 1]).into(),
            2 => QuadBez::new(p[o], p[o + 1], p[o + 2]).into(),
            _ => CubicBez::new(p[o], p[o + 1], p[o + 2], p[o + 3]).into(),
        }
    }

    /// Iterates over the elements.
    pub fn curves(&self) -> impl Iterator<Item = Curve> + '_ {
        (0..self.element_count()).map(|i| self.element(i))
    }

    /// The first point.
    pub fn start_point(&self) -> Point {
        self.points[0]
    }

    /// The last point.
    pub fn end_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Does this component end where it starts?
    pub fn is_closed(&self) -> bool {
        self.start_point() == self.end_point()
    }

    /// The bounding box hierarchy over the elements, built on first use.
    pub fn bvh(&self) -> &BoundingBoxHierarchy {
        self.bvh.get_or_init(|| {
            let boxes: Vec<_> = self.curves().map(|c| c.bounding_box()).collect();
            BoundingBoxHierarchy::new(&boxes)
        })
    }

    /// The tight bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bvh().bounding_box()
    }

    /// The point at a location.
    pub fn point_at(&self, location: IndexedLocation) -> Point {
        self.element(location.element).eval(location.t)
    }

    /// The derivative at a location, with respect to the element's parameter.
    pub fn derivative_at(&self, location: IndexedLocation) -> Vec2 {
        self.element(location.element).deriv(location.t)
    }

    /// The unit normal at a location, pointing to the left of the direction of travel.
    pub fn normal_at(&self, location: IndexedLocation) -> Vec2 {
        self.element(location.element).normal(location.t)
    }

    /// The total arc length, to within `accuracy` per element.
    pub fn length(&self, accuracy: f64) -> f64 {
        self.curves().map(|c| c.arclen(accuracy)).sum()
    }

    /// A copy with every point transformed by `affine`.
    pub fn transformed(&self, affine: Affine) -> PathComponent {
        let points = self.points.iter().map(|p| affine * *p).collect();
        Self::from_parts(points, self.orders.clone())
    }

    /// The same component, traversed backwards.
    pub fn reversed(&self) -> PathComponent {
        let points = self.points.iter().rev().copied().collect();
        let orders = self.orders.iter().rev().copied().collect();
        Self::from_parts(points, orders)
    }

    /// The part of this component between two locations.
    ///
    /// If `to` comes before `from`, the result runs backwards.
    pub fn split(&self, from: IndexedLocation, to: IndexedLocation) -> PathComponent {
        let reverse = to < from;
        let (mut start, mut end) = if reverse { (to, from) } else { (from, to) };
        // Avoid degenerate pieces at the ends.
        if start.element < end.element {
            if start.t == 1.0 {
                start = IndexedLocation::new(start.element + 1, 0.0);
            }
            if end.t == 0.0 && end.element > start.element {
                end = IndexedLocation::new(end.element - 1, 1.0);
            }
        }

        let mut points = Vec::new();
        let mut orders = Vec::new();
        let mut append = |index: usize, t0: f64, t1: f64, include_start: bool| {
            let piece = self.element(index).subsegment(t0..t1);
            let piece_points = piece.points();
            let skip = usize::from(!include_start);
            points.extend_from_slice(&piece_points[skip..]);
            orders.push(self.orders[index]);
        };

        if start.element == end.element {
            append(start.element, start.t, end.t, true);
        } else {
            append(start.element, start.t, 1.0, true);
            for i in start.element + 1..end.element {
                append(i, 0.0, 1.0, false);
            }
            append(end.element, 0.0, end.t, false);
        }
        let ret = Self::from_parts(points, orders);
        if reverse {
            ret.reversed()
        } else {
            ret
        }
    }

    /// All the places where this component meets another one.
    ///
    /// An intersection at the join between two elements is reported once, as
    /// `t = 1` on the earlier element.
    pub fn intersections(
        &self,
        other: &PathComponent,
        options: &IntersectOptions,
    ) -> Vec<ComponentIntersection> {
        let mut ret = Vec::new();
        let closed1 = self.is_closed();
        let closed2 = other.is_closed();
        self.bvh().for_each_overlap(other.bvh(), |i1, i2| {
            for i in intersect(&self.element(i1), &other.element(i2), options) {
                if i.t1 == 0.0 && (closed1 || i1 > 0) {
                    continue;
                }
                if i.t2 == 0.0 && (closed2 || i2 > 0) {
                    continue;
                }
                ret.push(ComponentIntersection {
                    location1: IndexedLocation::new(i1, i.t1),
                    location2: IndexedLocation::new(i2, i.t2),
                });
            }
        });
        ret
    }

    // Consecutive elements always meet where `before` ends and `after` starts.
    // This checks whether that's the only place they could meet.
    fn neighbors_meet_only_trivially(&self, before: usize, after: usize) -> bool {
        let b1 = self.bvh().element_bounding_box(before);
        let b2 = self.bvh().element_bounding_box(after);
        let overlap = b1.intersection(&b2);
        if overlap.area() != 0.0 {
            return false;
        }
        // A flat box has no area whatever it meets, so then only a single shared point will do.
        if (b1.area() == 0.0 || b2.area() == 0.0) && overlap.size() != Vec2::ZERO {
            return false;
        }
        let offset = self.offsets[after];
        let count = self.orders[after] + 1;
        !self.points[offset + 1..offset + count]
            .iter()
            .any(|p| b1.contains(*p))
    }

    /// All the places where this component crosses or touches itself.
    ///
    /// Each pair has `location1 <= location2`. The joins between consecutive
    /// elements aren't reported.
    pub fn self_intersections(&self, options: &IntersectOptions) -> Vec<ComponentIntersection> {
        let mut ret = Vec::new();
        let closed = self.is_closed();
        let n = self.element_count();
        self.bvh().for_each_self_overlap(|i1, i2| {
            let found = if i1 == i2 {
                self.element(i1)
                    .self_intersection()
                    .filter(|i| n > 1 || i.t1 != 0.0 || i.t2 != 1.0)
                    .into_iter()
                    .collect()
            } else {
                let trivial = if i1 + 1 == i2 {
                    self.neighbors_meet_only_trivially(i1, i2)
                } else if closed && i1 == 0 && i2 == n - 1 {
                    // The closing join: the last element runs into the first.
                    self.neighbors_meet_only_trivially(i2, i1)
                } else {
                    false
                };
                if trivial {
                    Vec::new()
                } else {
                    let mut found = intersect(&self.element(i1), &self.element(i2), options);
                    found.retain(|i| {
                        if i1 + 1 == i2 && i.t1 == 1.0 && i.t2 == 0.0 {
                            return false;
                        }
                        if i1 == 0 && i2 == n - 1 && i.t1 == 0.0 && i.t2 == 1.0 {
                            return false;
                        }
                        if i.t1 == 0.0 && (i1 > 0 || closed) {
                            return false;
                        }
                        i.t2 != 0.0
                    });
                    found
                }
            };
            ret.extend(found.into_iter().map(|i| ComponentIntersection {
                location1: IndexedLocation::new(i1, i.t1),
                location2: IndexedLocation::new(i2, i.t2),
            }));
        });
        ret
    }

    /// The winding number of this component around a point.
    ///
    /// Open components have winding number zero everywhere.
    pub fn winding_count(&self, p: Point) -> i32 {
        winding::winding_count(self, p)
    }

    /// Is the point inside this component?
    pub fn contains(&self, p: Point, fill_rule: FillRule) -> bool {
        fill_rule.is_inside(self.winding_count(p))
    }

    /// Finds the point on this component nearest to `p`.
    pub fn project(&self, p: Point) -> Projection<IndexedLocation> {
        let mut best: Option<(IndexedLocation, f64)> = None;
        // Never smaller than the true minimum, so it's safe to prune against.
        let mut bound = f64::INFINITY;
        self.bvh().visit(|node, _depth| {
            if node.bounding_box.lower_bound_distance_to(p) > bound {
                return false;
            }
            bound = bound.min(node.bounding_box.upper_bound_distance_to(p));
            if let NodeKind::Leaf { element } = node.kind {
                let (t, dist_sq) = self.element(element).nearest(p, NEAREST_ACCURACY);
                let dist = dist_sq.sqrt();
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((IndexedLocation::new(element, t), dist));
                    bound = bound.min(dist);
                }
            }
            true
        });
        let location = best.map_or(IndexedLocation::new(0, 0.0), |(loc, _)| loc);
        let point = self.point_at(location);
        Projection {
            point,
            location,
            distance: (point - p).hypot(),
        }
    }

    /// Is some point of this component within distance `d` of `p`?
    pub fn is_within_distance(&self, p: Point, d: f64) -> bool {
        let mut found = false;
        self.bvh().visit(|node, _depth| {
            if found || node.bounding_box.lower_bound_distance_to(p) > d {
                return false;
            }
            if node.bounding_box.upper_bound_distance_to(p) <= d {
                found = true;
                return false;
            }
            if let NodeKind::Leaf { element } = node.kind {
                let (_, dist_sq) = self.element(element).nearest(p, NEAREST_ACCURACY);
                found = dist_sq.sqrt() <= d;
            }
            !found
        });
        found
    }

    fn append_to(&self, bez: &mut BezPath) {
        bez.move_to(self.start_point());
        for c in self.curves() {
            match c {
                Curve::Line(l) => bez.line_to(l.p1),
                Curve::Quad(q) => bez.quad_to(q.p1, q.p2),
                Curve::Cubic(c) => bez.curve_to(c.p1, c.p2, c.p3),
            }
        }
        if self.is_closed() {
            bez.close_path();
        }
    }
}

/// A collection of path components.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    components: Vec<PathComponent>,
}

impl From<PathComponent> for Path {
    fn from(c: PathComponent) -> Self {
        Path {
            components: vec![c],
        }
    }
}

// Accumulates the elements of a single subpath while reading a `BezPath`.
#[derive(Default)]
struct ComponentBuilder {
    points: Vec<Point>,
    orders: Vec<usize>,
}

impl ComponentBuilder {
    fn finish(&mut self, out: &mut Vec<PathComponent>) -> Result<(), Error> {
        let points = std::mem::take(&mut self.points);
        let orders = std::mem::take(&mut self.orders);
        // A lone move-to doesn't make a component.
        if !orders.is_empty() {
            out.push(PathComponent::new(points, orders)?);
        }
        Ok(())
    }

    fn ensure_started(&mut self, current: Point) {
        if self.points.is_empty() {
            self.points.push(current);
        }
    }
}

impl Path {
    /// Creates a path from its components.
    pub fn new(components: Vec<PathComponent>) -> Self {
        Path { components }
    }

    /// The components.
    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Does this path have no components?
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Converts a kurbo path.
    ///
    /// Each subpath becomes a component. A close-path command adds a closing
    /// line if the subpath doesn't already end where it started.
    pub fn from_bezpath(bez: &BezPath) -> Result<Self, Error> {
        let mut components = Vec::new();
        let mut builder = ComponentBuilder::default();
        let mut subpath_start = Point::ZERO;
        let mut current = Point::ZERO;
        for el in bez.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    builder.finish(&mut components)?;
                    builder.points.push(p);
                    subpath_start = p;
                    current = p;
                }
                PathEl::LineTo(p) => {
                    builder.ensure_started(current);
                    builder.points.push(p);
                    builder.orders.push(1);
                    current = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    builder.ensure_started(current);
                    builder.points.extend([p1, p2]);
                    builder.orders.push(2);
                    current = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    builder.ensure_started(current);
                    builder.points.extend([p1, p2, p3]);
                    builder.orders.push(3);
                    current = p3;
                }
                PathEl::ClosePath => {
                    if let Some(&last) = builder.points.last() {
                        if last != subpath_start {
                            builder.points.push(subpath_start);
                            builder.orders.push(1);
                        }
                    }
                    builder.finish(&mut components)?;
                    current = subpath_start;
                }
            }
        }
        builder.finish(&mut components)?;
        Ok(Path { components })
    }

    /// Converts to a kurbo path. Closed components get a close-path command.
    pub fn to_bezpath(&self) -> BezPath {
        let mut bez = BezPath::new();
        for c in &self.components {
            c.append_to(&mut bez);
        }
        bez
    }

    /// Parses SVG path data.
    pub fn from_svg(data: &str) -> Result<Self, Error> {
        let bez = BezPath::from_svg(data).map_err(|e| Error::Svg(e.to_string()))?;
        Self::from_bezpath(&bez)
    }

    /// Formats as SVG path data.
    pub fn to_svg(&self) -> String {
        self.to_bezpath().to_svg()
    }

    /// The same path with every component reversed.
    pub fn reversed(&self) -> Path {
        Path {
            components: self.components.iter().map(PathComponent::reversed).collect(),
        }
    }

    /// A copy with every point transformed by `affine`.
    pub fn transformed(&self, affine: Affine) -> Path {
        Path {
            components: self.components.iter().map(|c| c.transformed(affine)).collect(),
        }
    }

    /// The total arc length of all the components.
    pub fn length(&self, accuracy: f64) -> f64 {
        self.components.iter().map(|c| c.length(accuracy)).sum()
    }

    /// The tight bounding box. Empty if the path is.
    pub fn bounding_box(&self) -> BoundingBox {
        self.components
            .iter()
            .fold(BoundingBox::EMPTY, |bbox, c| bbox.union(&c.bounding_box()))
    }

    /// The point at a location.
    pub fn point_at(&self, location: PathLocation) -> Point {
        self.components[location.component].point_at(location.location)
    }

    /// The unit normal at a location, pointing to the left of the direction of travel.
    pub fn normal_at(&self, location: PathLocation) -> Vec2 {
        self.components[location.component].normal_at(location.location)
    }

    /// All the places where this path meets another one.
    pub fn intersections(&self, other: &Path, options: &IntersectOptions) -> Vec<PathIntersection> {
        if !self.bounding_box().overlaps(&other.bounding_box()) {
            return Vec::new();
        }
        let mut ret = Vec::new();
        for (i, c1) in self.components.iter().enumerate() {
            for (j, c2) in other.components.iter().enumerate() {
                ret.extend(
                    c1.intersections(c2, options)
                        .into_iter()
                        .map(|ci| path_intersection(i, j, ci)),
                );
            }
        }
        ret
    }

    /// All the places where this path meets itself, within a component or between two.
    pub fn self_intersections(&self, options: &IntersectOptions) -> Vec<PathIntersection> {
        let mut ret = Vec::new();
        for (i, c1) in self.components.iter().enumerate() {
            ret.extend(
                c1.self_intersections(options)
                    .into_iter()
                    .map(|ci| path_intersection(i, i, ci)),
            );
            for (j, c2) in self.components.iter().enumerate().skip(i + 1) {
                ret.extend(
                    c1.intersections(c2, options)
                        .into_iter()
                        .map(|ci| path_intersection(i, j, ci)),
                );
            }
        }
        ret
    }

    /// Does this path meet another one anywhere?
    pub fn intersects(&self, other: &Path, options: &IntersectOptions) -> bool {
        !self.intersections(other, options).is_empty()
    }

    /// Does this path meet itself anywhere?
    pub fn self_intersects(&self, options: &IntersectOptions) -> bool {
        !self.self_intersections(options).is_empty()
    }

    /// The total winding number of all the components around a point.
    pub fn winding_count(&self, p: Point) -> i32 {
        self.components.iter().map(|c| c.winding_count(p)).sum()
    }

    fn winding_count_ignoring(&self, p: Point, ignored: usize) -> i32 {
        self.components
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != ignored)
            .map(|(_, c)| c.winding_count(p))
            .sum()
    }

    /// Is the point inside this path?
    pub fn contains(&self, p: Point, fill_rule: FillRule) -> bool {
        fill_rule.is_inside(self.winding_count(p))
    }

    /// Is all of `other` inside this path?
    ///
    /// Every component of `other` has to start inside, and the two paths
    /// mustn't meet at all. So a path that shares part of its boundary with
    /// this one isn't contained in it, even if it never leaves.
    pub fn contains_path(&self, other: &Path, fill_rule: FillRule, options: &IntersectOptions) -> bool {
        other
            .components
            .iter()
            .all(|c| self.contains(c.start_point(), fill_rule))
            && !self.intersects(other, options)
    }

    /// The signed area enclosed by the path.
    ///
    /// Counter-clockwise components (in a y-up coordinate system) count as positive.
    pub fn area(&self) -> f64 {
        self.to_bezpath().area()
    }

    /// Finds the point on this path nearest to `p`, or `None` if the path is empty.
    pub fn project(&self, p: Point) -> Option<Projection<PathLocation>> {
        let mut candidates: Vec<_> = self
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let bbox = c.bounding_box();
                (i, bbox.lower_bound_distance_to(p), bbox.upper_bound_distance_to(p))
            })
            .collect();
        candidates.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut best: Option<Projection<PathLocation>> = None;
        for (i, lower, _) in candidates {
            if best.as_ref().is_some_and(|b| lower > b.distance) {
                continue;
            }
            let proj = self.components[i].project(p);
            if best.as_ref().map_or(true, |b| proj.distance < b.distance) {
                best = Some(Projection {
                    point: proj.point,
                    location: PathLocation {
                        component: i,
                        location: proj.location,
                    },
                    distance: proj.distance,
                });
            }
        }
        best
    }

    /// Is some point of this path within distance `d` of `p`?
    pub fn is_within_distance(&self, p: Point, d: f64) -> bool {
        self.components.iter().any(|c| c.is_within_distance(p, d))
    }

    /// Splits the path into groups that don't overlap: each group is an outer
    /// component together with the holes directly inside it.
    ///
    /// Containment is decided with the even-odd rule, by testing the start
    /// point of each component. A component that looks like a hole but sits
    /// in no single outer component gets a group of its own, so every
    /// component ends up in exactly one group.
    pub fn disjoint_components(&self) -> Vec<Path> {
        let rule = FillRule::EvenOdd;
        let mut outer: Vec<(usize, Vec<PathComponent>)> = Vec::new();
        let mut inner = Vec::new();
        for (i, c) in self.components.iter().enumerate() {
            if rule.is_inside(self.winding_count_ignoring(c.start_point(), i)) {
                inner.push(c);
            } else {
                outer.push((i, vec![c.clone()]));
            }
        }

        let mut orphans = Vec::new();
        for c in inner {
            let p = c.start_point();
            let mut owner: Option<usize> = None;
            for (k, (i, _)) in outer.iter().enumerate() {
                let candidate = &self.components[*i];
                if let Some(o) = owner {
                    // Only a candidate nested inside the current owner can do better.
                    let owner_box = self.components[outer[o].0].bounding_box();
                    let candidate_box = candidate.bounding_box();
                    if owner_box.intersection(&candidate_box) != candidate_box {
                        continue;
                    }
                }
                if candidate.contains(p, rule) {
                    owner = Some(k);
                }
            }
            match owner {
                Some(o) => outer[o].1.push(c.clone()),
                // Inside the others taken together but inside no outer one on
                // its own: it still has to go somewhere.
                None => orphans.push(c.clone()),
            }
        }
        outer
            .into_iter()
            .map(|(_, cs)| Path::new(cs))
            .chain(orphans.into_iter().map(Path::from))
            .collect()
    }
}

fn path_intersection(i: usize, j: usize, ci: ComponentIntersection) -> PathIntersection {
    PathIntersection {
        location1: PathLocation {
            component: i,
            location: ci.location1,
        },
        location2: PathLocation {
            component: j,
            location: ci.location2,
        },
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use kurbo::Shape;

    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn square(x: f64, y: f64, size: f64) -> PathComponent {
        PathComponent::from_polygon(&[p(x, y), p(x + size, y), p(x + size, y + size), p(x, y + size)])
            .unwrap()
    }

    fn figure_eight() -> PathComponent {
        PathComponent::from_polygon(&[
            p(0.0, 1.0),
            p(1.0, 1.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
            p(1.0, 1.0),
            p(1.0, 0.0),
            p(0.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn construction_errors() {
        assert_matches!(PathComponent::new(vec![p(0.0, 0.0)], vec![]), Err(Error::EmptyComponent));
        assert_matches!(
            PathComponent::new(vec![p(0.0, 0.0), p(1.0, 0.0)], vec![2]),
            Err(Error::PointCountMismatch {
                points: 2,
                expected: 3
            })
        );
        assert_matches!(
            PathComponent::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0)], vec![4]),
            Err(Error::UnsupportedOrder(4))
        );
        assert_matches!(
            PathComponent::new(vec![p(0.0, 0.0), p(f64::NAN, 0.0)], vec![1]),
            Err(Error::NonFinite)
        );
        let gap = [
            Curve::from(Line::new((0.0, 0.0), (1.0, 0.0))),
            Curve::from(Line::new((2.0, 0.0), (3.0, 0.0))),
        ];
        assert_matches!(PathComponent::from_curves(&gap), Err(Error::NotContiguous { element: 1 }));
    }

    #[test]
    fn elements_share_endpoints() {
        let c = PathComponent::new(
            vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 1.0), p(2.0, 2.0), p(1.0, 3.0), p(0.0, 2.0), p(0.0, 0.0)],
            vec![1, 2, 3],
        )
        .unwrap();
        assert_eq!(c.element_count(), 3);
        assert_matches!(c.element(1), Curve::Quad(_));
        for i in 0..2 {
            assert_eq!(c.element(i).end(), c.element(i + 1).start());
        }
        assert!(c.is_closed());
        assert_eq!(PathComponent::from_curves(&c.curves().collect::<Vec<_>>()).unwrap(), c);
    }

    #[test]
    fn reversal() {
        let c = square(0.0, 0.0, 1.0);
        let r = c.reversed();
        assert_eq!(r.start_point(), c.end_point());
        assert_eq!(r.element(0), c.element(c.element_count() - 1).reversed());
        assert_eq!(r.reversed(), c);
    }

    #[test]
    fn split_ranges() {
        let c = square(0.0, 0.0, 2.0);
        let piece = c.split(IndexedLocation::new(0, 0.5), IndexedLocation::new(2, 0.5));
        assert_eq!(piece.points(), &[p(1.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(1.0, 2.0)]);

        let within = c.split(IndexedLocation::new(1, 0.25), IndexedLocation::new(1, 0.75));
        assert_eq!(within.points(), &[p(2.0, 0.5), p(2.0, 1.5)]);

        let backwards = c.split(IndexedLocation::new(2, 0.5), IndexedLocation::new(0, 0.5));
        assert_eq!(backwards, piece.reversed());

        // A range starting at the very end of an element skips it.
        let skip = c.split(IndexedLocation::new(0, 1.0), IndexedLocation::new(2, 0.0));
        assert_eq!(skip.points(), &[p(2.0, 0.0), p(2.0, 2.0)]);
    }

    #[test]
    fn bezpath_round_trip() {
        let path = Path::from_svg("M0,0 L10,0 Q10,10 0,10 Z M20,20 C21,20 22,21 22,22").unwrap();
        assert_eq!(path.components().len(), 2);
        let closed = &path.components()[0];
        assert!(closed.is_closed());
        assert_eq!(closed.orders(), &[1, 2, 1]);
        assert!(!path.components()[1].is_closed());

        let again = Path::from_bezpath(&path.to_bezpath()).unwrap();
        assert_eq!(again, path);
        assert_matches!(Path::from_svg("M0,0 X1,1"), Err(Error::Svg(_)));
    }

    #[test]
    fn square_intersections() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let ints = a.intersections(&b, &IntersectOptions::default());
        assert_eq!(ints.len(), 2);
        for i in &ints {
            let q1 = a.point_at(i.location1);
            let q2 = b.point_at(i.location2);
            assert!((q1 - q2).hypot() < 1e-12);
        }
        let mut points: Vec<_> = ints.iter().map(|i| a.point_at(i.location1)).collect();
        points.sort_by(|u, v| u.x.total_cmp(&v.x));
        assert_eq!(points, vec![p(1.0, 2.0), p(2.0, 1.0)]);
    }

    #[test]
    fn shared_corner_reported_once() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 1.0, 1.0);
        let ints = a.intersections(&b, &IntersectOptions::default());
        assert_eq!(ints.len(), 1);
        assert_eq!(a.point_at(ints[0].location1), p(1.0, 1.0));
        assert_eq!(ints[0].location1.t, 1.0);
        assert_eq!(ints[0].location2.t, 1.0);
    }

    #[test]
    fn simple_shapes_dont_self_intersect() {
        let opts = IntersectOptions::default();
        assert!(square(0.0, 0.0, 1.0).self_intersections(&opts).is_empty());
        let circle = Path::from_bezpath(&kurbo::Circle::new((0.0, 0.0), 1.0).to_path(1e-3)).unwrap();
        assert!(!circle.self_intersects(&opts));
    }

    #[test]
    fn figure_eight_crosses_once() {
        let c = figure_eight();
        let ints = c.self_intersections(&IntersectOptions::default());
        assert_eq!(ints.len(), 1);
        assert_eq!(ints[0].location1, IndexedLocation::new(0, 1.0));
        assert_eq!(ints[0].location2, IndexedLocation::new(4, 1.0));
    }

    #[test]
    fn single_cubic_loop() {
        let c = PathComponent::from_curves(&[CubicBez::new((-1.0, 0.0), (2.0, 2.0), (-2.0, 2.0), (1.0, 0.0)).into()])
            .unwrap();
        let ints = c.self_intersections(&IntersectOptions::default());
        assert_eq!(ints.len(), 1);
        assert!(ints[0].location1.t < ints[0].location2.t);
    }

    #[test]
    fn projection() {
        let path = Path::new(vec![square(0.0, 0.0, 1.0), square(5.0, 0.0, 1.0)]);
        let proj = path.project(p(4.0, 0.5)).unwrap();
        assert_eq!(proj.location.component, 1);
        assert!((proj.point - p(5.0, 0.5)).hypot() < 1e-9);
        assert!((proj.distance - 1.0).abs() < 1e-9);
        assert!(path.is_within_distance(p(4.0, 0.5), 1.01));
        assert!(!path.is_within_distance(p(3.0, 0.5), 1.9));
        assert!(Path::default().project(p(0.0, 0.0)).is_none());
    }

    #[test]
    fn projection_onto_the_middle_of_an_element() {
        let c = PathComponent::from_polygon(&[p(1.0, 0.0), p(3.0, 0.0), p(3.0, 2.0), p(1.0, 2.0)]).unwrap();

        let corner = c.project(p(4.0, 0.0));
        assert!((corner.point - p(3.0, 0.0)).hypot() < 1e-9);
        assert!((corner.distance - 1.0).abs() < 1e-9);

        let side = c.project(p(4.0, 1.0));
        assert_eq!(side.location.element, 1);
        assert!((side.location.t - 0.5).abs() < 1e-9);
        assert!((side.point - p(3.0, 1.0)).hypot() < 1e-9);

        let inside = c.project(p(1.5, 1.2));
        assert!((inside.point - p(1.0, 1.2)).hypot() < 1e-9);
        assert!((inside.distance - 0.5).abs() < 1e-9);

        let path = Path::new(vec![square(10.0, 10.0, 1.0), c]);
        let proj = path.project(p(4.0, 0.0)).unwrap();
        assert_eq!(proj.location.component, 1);
        assert!((proj.distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn closing_join_takes_the_shortcut() {
        let c = square(0.0, 0.0, 1.0);
        // The last element runs into the first at the origin and they touch nowhere else.
        assert!(c.neighbors_meet_only_trivially(3, 0));
        assert!(c.neighbors_meet_only_trivially(0, 1));
        // The other way around, the shared point is the far end of element 3.
        assert!(!c.neighbors_meet_only_trivially(0, 3));
    }

    #[test]
    fn flat_neighbor_crossed_by_the_next_element() {
        // The cubic crosses back over the line it starts from, with none of
        // its control points on that line.
        let c = PathComponent::new(
            vec![p(0.0, 0.0), p(4.0, 0.0), p(2.0, -3.0), p(1.0, 3.0), p(0.0, 2.0)],
            vec![1, 3],
        )
        .unwrap();
        assert!(!c.neighbors_meet_only_trivially(0, 1));
        let ints = c.self_intersections(&IntersectOptions::default());
        assert_eq!(ints.len(), 1, "{ints:?}");
        let q = c.point_at(ints[0].location1);
        assert!(q.y.abs() < 1e-9);
        assert!((q.x - 1.788).abs() < 1e-2);
    }

    #[test]
    fn closing_element_crossing_the_first() {
        let c = PathComponent::new(
            vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(2.0, -3.0), p(1.0, -3.0), p(0.0, 0.0)],
            vec![1, 1, 3],
        )
        .unwrap();
        let ints = c.self_intersections(&IntersectOptions::default());
        assert_eq!(ints.len(), 1, "{ints:?}");
        assert_eq!(ints[0].location1.element, 0);
        assert_eq!(ints[0].location2.element, 2);
        let q = c.point_at(ints[0].location1);
        assert!(q.y.abs() < 1e-9);
        assert!((q.x - 3.124).abs() < 1e-2);
    }

    #[test]
    fn normals_lengths_and_transforms() {
        let path = Path::from(square(0.0, 0.0, 2.0));
        // Counter-clockwise, so normals point inwards.
        let n = path.normal_at(PathLocation::new(0, 0, 0.5));
        assert!((n - Vec2::new(0.0, 1.0)).hypot() < 1e-12);
        assert!((path.length(1e-9) - 8.0).abs() < 1e-9);

        let moved = path.transformed(Affine::translate((1.0, 1.0)) * Affine::scale(2.0));
        assert!((moved.area() - 4.0 * path.area()).abs() < 1e-9);
        assert_eq!(moved.components()[0].start_point(), p(1.0, 1.0));
        assert_eq!(moved.components()[0].orders(), path.components()[0].orders());

        // A reflection flips the direction of travel.
        let flipped = path.transformed(Affine::FLIP_Y);
        assert!((flipped.area() + path.area()).abs() < 1e-9);
    }

    #[test]
    fn path_containment() {
        let opts = IntersectOptions::default();
        let big = Path::from(square(0.0, 0.0, 4.0));
        let small = Path::from(square(1.0, 1.0, 1.0));
        let overlapping = Path::from(square(3.0, 3.0, 2.0));
        let touching = Path::from(square(0.0, 0.0, 1.0));

        assert!(big.contains_path(&small, FillRule::NonZero, &opts));
        assert!(!small.contains_path(&big, FillRule::NonZero, &opts));
        assert!(!big.contains_path(&overlapping, FillRule::NonZero, &opts));
        assert!(!big.contains_path(&touching, FillRule::NonZero, &opts));
        assert!(big.contains_path(&Path::default(), FillRule::EvenOdd, &opts));

        // The hole isn't part of the path, so nothing in it is contained.
        let holed = Path::new(vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 2.0).reversed()]);
        let in_hole = Path::from(square(1.5, 1.5, 0.5));
        assert!(!holed.contains_path(&in_hole, FillRule::NonZero, &opts));
        assert!(holed.contains_path(&Path::from(square(3.2, 3.2, 0.5)), FillRule::NonZero, &opts));
    }

    #[test]
    fn area_and_containment() {
        let path = Path::new(vec![square(0.0, 0.0, 4.0), square(1.0, 1.0, 1.0).reversed()]);
        assert!((path.area() - 15.0).abs() < 1e-12);
        assert!(path.contains(p(3.0, 3.0), FillRule::NonZero));
        assert!(!path.contains(p(1.5, 1.5), FillRule::NonZero));
        assert!(!path.contains(p(1.5, 1.5), FillRule::EvenOdd));
    }

    #[test]
    fn disjoint_groups() {
        let path = Path::new(vec![
            square(0.0, 0.0, 4.0),
            square(10.0, 0.0, 1.0),
            square(1.0, 1.0, 1.0).reversed(),
        ]);
        let groups = path.disjoint_components();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].components().len(), 2);
        assert_eq!(groups[1].components().len(), 1);
    }

    #[test]
    fn disjoint_groups_keep_every_component() {
        // Each of these two starts inside the other, so neither looks like an
        // outer boundary. The small one in their overlap has winding two.
        let a = square(0.0, 0.0, 4.0);
        let b = PathComponent::from_polygon(&[p(1.0, 1.0), p(-1.0, 1.0), p(-1.0, -1.0), p(1.0, -1.0)]).unwrap();
        let hole = square(0.25, 0.25, 0.5).reversed();
        let path = Path::new(vec![a, b, hole]);

        let groups = path.disjoint_components();
        let total: usize = groups.iter().map(|g| g.components().len()).sum();
        assert_eq!(total, 3);
        for c in path.components() {
            assert_eq!(groups.iter().filter(|g| g.components().contains(c)).count(), 1);
        }
    }
}
