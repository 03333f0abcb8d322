//! The augmented graph behind the boolean operations.
//!
//! Every closed component becomes a cycle of vertices, one at the start of
//! each element, linked in both directions. Each intersection adds a pair of
//! vertices (one on each of the two branches that meet there), spliced into
//! the cycles. Once every edge knows whether it's inside or outside the other
//! shape, the output contours come from walking the cycles and hopping
//! between branches at the crossings.

use kurbo::{Line, Point, Vec2};

use crate::{
    boolean::{Classification, Diagnostic},
    curve::Curve,
    path::{Path, PathComponent, PathIntersection, PathLocation},
    FillRule,
};

/// How far from an edge we sample its sides, relative to the size of the input.
const SIDE_OFFSET: f64 = 1e-6;

/// An index into the vertex arena.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct VertexIdx(usize);

#[derive(Clone)]
struct Vertices<T> {
    inner: Vec<T>,
}

impl_typed_vec!(Vertices, VertexIdx, "v");

/// Whether an edge is inside the shape it's being compared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Internal,
    External,
}

#[derive(Clone, Debug)]
struct Vertex {
    location: Point,
    next: VertexIdx,
    prev: VertexIdx,
    /// The curve from here to `next`. Its end points get replaced by the
    /// vertex locations when we emit it.
    transition: Curve,
    /// For intersection vertices, the vertex on the other branch.
    neighbor: Option<VertexIdx>,
    /// For vertices that split an element, the parameter of the split.
    split_t: Option<f64>,
    /// The classification of the edge from here to `next`.
    forward_edge: Edge,
}

/// What the traversal is building.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Union,
    Intersection,
    /// The second path must already be reversed.
    Difference,
    RemoveCrossings,
}

// Is the direction `v`, leaving a vertex, on the left of a branch that
// arrives at the vertex along `incoming` and leaves along `outgoing`?
fn is_left_of_branch(v: Vec2, incoming: Vec2, outgoing: Vec2) -> bool {
    let back = -incoming;
    if outgoing.cross(back) > 0.0 {
        outgoing.cross(v) > 0.0 && back.cross(v) < 0.0
    } else {
        outgoing.cross(v) > 0.0 || back.cross(v) < 0.0
    }
}

// A short vector pointing to the right of `curve` at its midpoint.
fn right_normal(curve: &Curve, length: f64) -> Vec2 {
    let mut d = curve.deriv(0.5);
    if d.hypot2() == 0.0 {
        d = curve.end() - curve.start();
    }
    let len = d.hypot();
    if len == 0.0 {
        Vec2::ZERO
    } else {
        Vec2::new(d.y, -d.x) * (length / len)
    }
}

pub(crate) struct Graph<'a> {
    vertices: Vertices<Vertex>,
    paths: [&'a Path; 2],
    /// `starts[side][component][element]` is the vertex at the start of that
    /// element, or `None` for open components. In the self case only side 0
    /// is used.
    starts: [Vec<Option<Vec<VertexIdx>>>; 2],
    is_self: bool,
    fill_rule: FillRule,
    side_offset: f64,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Graph<'a> {
    /// Builds and classifies the graph.
    ///
    /// If `is_self` is true then `path1` and `path2` must be the same, and
    /// `intersections` are its self-intersections.
    pub(crate) fn new(
        path1: &'a Path,
        path2: &'a Path,
        is_self: bool,
        intersections: &[PathIntersection],
        fill_rule: FillRule,
        classification: Classification,
    ) -> Self {
        let scale = path1
            .bounding_box()
            .union(&path2.bounding_box())
            .size()
            .hypot()
            .max(1.0);
        let mut graph = Graph {
            vertices: Vertices::default(),
            paths: [path1, path2],
            starts: [Vec::new(), Vec::new()],
            is_self,
            fill_rule,
            side_offset: SIDE_OFFSET * scale,
            diagnostics: Vec::new(),
        };

        for side in 0..graph.side_count() {
            let path = graph.paths[side];
            let mut starts = Vec::with_capacity(path.components().len());
            for (i, c) in path.components().iter().enumerate() {
                if c.is_closed() {
                    starts.push(Some(graph.add_cycle(c)));
                } else {
                    graph.report(Diagnostic::OpenComponentIgnored {
                        path: side,
                        component: i,
                    });
                    starts.push(None);
                }
            }
            graph.starts[side] = starts;
        }

        let side2 = graph.side(1);
        let mut added = 0;
        for i in intersections {
            if graph.starts[0][i.location1.component].is_none()
                || graph.starts[side2][i.location2.component].is_none()
            {
                continue;
            }
            let location = path1
                .point_at(i.location1)
                .midpoint(path2.point_at(i.location2));
            let v1 = graph.new_vertex(location);
            let v2 = graph.new_vertex(location);
            graph.vertices[v1].neighbor = Some(v2);
            graph.vertices[v2].neighbor = Some(v1);
            graph.insert(v1, 0, i.location1);
            graph.insert(v2, side2, i.location2);
            added += 1;
        }
        tracing::debug!(
            vertices = graph.vertices.len(),
            intersections = added,
            "built augmented graph"
        );

        for side in 0..graph.side_count() {
            for component in 0..graph.starts[side].len() {
                graph.classify_component(side, component, classification);
            }
        }
        graph
    }

    fn side_count(&self) -> usize {
        if self.is_self {
            1
        } else {
            2
        }
    }

    // The side that holds the components of path `which`.
    fn side(&self, which: usize) -> usize {
        if self.is_self {
            0
        } else {
            which
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "boolean operation diagnostic");
        self.diagnostics.push(diagnostic);
    }

    fn new_vertex(&mut self, location: Point) -> VertexIdx {
        let idx = self.vertices.next_idx();
        self.vertices.push(Vertex {
            location,
            next: idx,
            prev: idx,
            transition: Line::new(location, location).into(),
            neighbor: None,
            split_t: None,
            forward_edge: Edge::External,
        })
    }

    fn add_cycle(&mut self, component: &PathComponent) -> Vec<VertexIdx> {
        let first = self.vertices.next_idx().0;
        let n = component.element_count();
        let starts: Vec<_> = (0..n).map(|i| VertexIdx(first + i)).collect();
        for (i, curve) in component.curves().enumerate() {
            self.vertices.push(Vertex {
                location: curve.start(),
                next: starts[(i + 1) % n],
                prev: starts[(i + n - 1) % n],
                transition: curve,
                neighbor: None,
                split_t: None,
                forward_edge: Edge::External,
            });
        }
        starts
    }

    /// Splices the intersection vertex `v` into the cycle at `location`.
    fn insert(&mut self, v: VertexIdx, side: usize, location: PathLocation) {
        let component = location.component;
        let Some(starts) = &self.starts[side][component] else {
            return;
        };
        let n = starts.len();
        let (element, t) = if location.location.t <= 0.0 {
            ((location.location.element + n - 1) % n, 1.0)
        } else {
            (location.location.element, location.location.t)
        };

        if t >= 1.0 {
            let old = starts[(element + 1) % n];
            self.replace(side, component, old, v);
            return;
        }

        let mut start = starts[element];
        loop {
            let next = self.vertices[start].next;
            match self.vertices[next].split_t {
                Some(s) if s < t => start = next,
                Some(s) if s == t => {
                    self.replace(side, component, next, v);
                    return;
                }
                _ => break,
            }
        }
        let end = self.vertices[start].next;
        let t0 = self.vertices[start].split_t.unwrap_or(0.0);
        let t1 = self.vertices[end].split_t.unwrap_or(1.0);
        let curve = self.paths[side].components()[component].element(element);

        self.vertices[start].transition = curve.subsegment(t0..t);
        self.vertices[start].next = v;
        self.vertices[end].prev = v;
        let vertex = &mut self.vertices[v];
        vertex.transition = curve.subsegment(t..t1);
        vertex.split_t = Some(t);
        vertex.prev = start;
        vertex.next = end;
    }

    /// Puts `new` in the place of `old`, which drops out of the graph.
    ///
    /// If `old` was paired, its neighbor loses its pairing.
    fn replace(&mut self, side: usize, component: usize, old: VertexIdx, new: VertexIdx) {
        if let Some(n) = self.vertices[old].neighbor.take() {
            self.vertices[n].neighbor = None;
        }
        let old_vertex = self.vertices[old].clone();
        let prev = if old_vertex.prev == old { new } else { old_vertex.prev };
        let next = if old_vertex.next == old { new } else { old_vertex.next };

        let vertex = &mut self.vertices[new];
        vertex.prev = prev;
        vertex.next = next;
        vertex.transition = old_vertex.transition;
        vertex.split_t = old_vertex.split_t;
        self.vertices[prev].next = new;
        self.vertices[next].prev = new;

        if let Some(starts) = &mut self.starts[side][component] {
            for s in starts.iter_mut().filter(|s| **s == old) {
                *s = new;
            }
        }
    }

    fn cycle(&self, start: VertexIdx) -> Vec<VertexIdx> {
        let mut ret = vec![start];
        let mut v = self.vertices[start].next;
        while v != start && ret.len() <= self.vertices.len() {
            ret.push(v);
            v = self.vertices[v].next;
        }
        ret
    }

    /// The curve leaving `v` in the given direction.
    fn emit(&self, v: VertexIdx, forward: bool) -> Curve {
        if forward {
            let vertex = &self.vertices[v];
            vertex
                .transition
                .with_endpoints(vertex.location, self.vertices[vertex.next].location)
        } else {
            self.emit(self.vertices[v].prev, true).reversed()
        }
    }

    fn other_path(&self, side: usize) -> &'a Path {
        if self.is_self {
            self.paths[0]
        } else {
            self.paths[1 - side]
        }
    }

    fn edge_for_winding(&self, winding: i32) -> Edge {
        // In the self case, the winding number is the one on the right of the
        // edge, and the left has one more.
        let inside = if self.is_self {
            self.fill_rule.is_inside(winding) && self.fill_rule.is_inside(winding + 1)
        } else {
            self.fill_rule.is_inside(winding)
        };
        if inside {
            Edge::Internal
        } else {
            Edge::External
        }
    }

    // The winding number that classifies `edge`: the other path's around its
    // midpoint, or (in the self case) the path's just to the right of it.
    fn edge_winding(&self, side: usize, edge: &Curve) -> i32 {
        let mid = edge.eval(0.5);
        if self.is_self {
            self.paths[0].winding_count(mid + right_normal(edge, self.side_offset))
        } else {
            self.other_path(side).winding_count(mid)
        }
    }

    fn sampled_edge(&self, side: usize, v: VertexIdx) -> Edge {
        let edge = self.emit(v, true);
        if self.is_self {
            let mid = edge.eval(0.5);
            let offset = right_normal(&edge, self.side_offset);
            let right = self.paths[0].winding_count(mid + offset);
            let left = self.paths[0].winding_count(mid - offset);
            if self.fill_rule.is_inside(right) && self.fill_rule.is_inside(left) {
                Edge::Internal
            } else {
                Edge::External
            }
        } else {
            self.edge_for_winding(self.edge_winding(side, &edge))
        }
    }

    /// How much the winding number changes as we pass through the
    /// intersection vertex `v`: +1 if we cross the other branch from its
    /// right to its left, -1 for the opposite, and 0 if we just touch it.
    fn winding_adjustment(&self, v: VertexIdx) -> i32 {
        let Some(n) = self.vertices[v].neighbor else {
            return 0;
        };
        let incoming = self.emit(self.vertices[v].prev, true).end_tangent();
        let outgoing = self.emit(v, true).start_tangent();
        let branch_in = self.emit(self.vertices[n].prev, true).end_tangent();
        let branch_out = self.emit(n, true).start_tangent();

        let from_left = is_left_of_branch(-incoming, branch_in, branch_out);
        let to_left = is_left_of_branch(outgoing, branch_in, branch_out);
        match (from_left, to_left) {
            (false, true) => 1,
            (true, false) => -1,
            _ => 0,
        }
    }

    // Classifies the edges of a cycle that starts at an intersection vertex by
    // tracking the winding number across the intersections. On failure,
    // returns the winding number we started with and the one we came back with.
    fn relative_edges(&self, side: usize, cycle: &[VertexIdx]) -> Result<Vec<Edge>, (i32, i32)> {
        let before = self.emit(self.vertices[cycle[0]].prev, true);
        let seed = self.edge_winding(side, &before);
        let mut winding = seed;
        let edges: Vec<_> = cycle
            .iter()
            .map(|&v| {
                winding += self.winding_adjustment(v);
                self.edge_for_winding(winding)
            })
            .collect();
        if winding == seed {
            Ok(edges)
        } else {
            Err((seed, winding))
        }
    }

    fn classify_component(&mut self, side: usize, component: usize, classification: Classification) {
        let Some(first) = self.starts[side][component].as_ref().map(|s| s[0]) else {
            return;
        };
        let mut cycle = self.cycle(first);
        let Some(pos) = cycle
            .iter()
            .position(|v| self.vertices[*v].neighbor.is_some())
        else {
            // Nothing crosses this component, so it's all on one side.
            let edge = self.sampled_edge(side, first);
            for v in cycle {
                self.vertices[v].forward_edge = edge;
            }
            return;
        };

        if classification == Classification::RelativeWinding {
            cycle.rotate_left(pos);
            match self.relative_edges(side, &cycle) {
                Ok(edges) => {
                    for (v, edge) in cycle.into_iter().zip(edges) {
                        self.vertices[v].forward_edge = edge;
                    }
                    return;
                }
                Err((expected, found)) => self.report(Diagnostic::WindingMismatch {
                    component,
                    expected,
                    found,
                }),
            }
        }
        for v in cycle {
            let edge = self.sampled_edge(side, v);
            self.vertices[v].forward_edge = edge;
        }
    }

    fn backward_edge(&self, v: VertexIdx) -> Edge {
        self.vertices[self.vertices[v].prev].forward_edge
    }

    fn is_entry(&self, v: VertexIdx) -> bool {
        self.vertices[v].forward_edge == Edge::Internal && self.backward_edge(v) == Edge::External
    }

    fn is_exit(&self, v: VertexIdx) -> bool {
        self.vertices[v].forward_edge == Edge::External && self.backward_edge(v) == Edge::Internal
    }

    fn is_crossing(&self, v: VertexIdx) -> bool {
        let Some(n) = self.vertices[v].neighbor else {
            return false;
        };
        (self.is_entry(v) || self.is_exit(v)) && (self.is_entry(n) || self.is_exit(n))
    }

    /// A self-intersection where all four edges are outside, like the middle
    /// of a figure-eight. Removing crossings splits the contour there.
    fn is_split_point(&self, v: VertexIdx) -> bool {
        let Some(n) = self.vertices[v].neighbor else {
            return false;
        };
        self.is_self
            && [v, n].iter().all(|&u| {
                self.vertices[u].forward_edge == Edge::External
                    && self.backward_edge(u) == Edge::External
            })
    }

    fn is_turning_point(&self, v: VertexIdx, op: Operation) -> bool {
        self.is_crossing(v) || (op == Operation::RemoveCrossings && self.is_split_point(v))
    }

    fn moves_forward(&self, v: VertexIdx, op: Operation, on_first: bool) -> bool {
        let external = self.vertices[v].forward_edge == Edge::External;
        match op {
            Operation::Union | Operation::RemoveCrossings => external,
            Operation::Intersection => !external,
            Operation::Difference => external == on_first,
        }
    }

    // Should a walk in direction `forward` stop at `v` and switch branches?
    fn stops_at(&self, v: VertexIdx, op: Operation, on_first: bool, forward: bool) -> bool {
        self.vertices[v].neighbor.is_some()
            && (self.moves_forward(v, op, on_first) != forward
                || (op == Operation::RemoveCrossings && self.is_split_point(v)))
    }

    // Does the whole of a component with no crossings belong in the output?
    fn keeps_whole(&self, op: Operation, side: usize, component: &PathComponent) -> bool {
        if op == Operation::RemoveCrossings {
            return true;
        }
        let p = component.element(0).eval(0.5);
        let inside = self.other_path(side).contains(p, self.fill_rule);
        match op {
            Operation::Union => !inside,
            Operation::Intersection => inside,
            Operation::Difference => inside == (side == 1),
            Operation::RemoveCrossings => true,
        }
    }

    fn depart(&self, v: VertexIdx, op: Operation, departed: &mut Vertices<bool>) {
        departed[v] = true;
        // A split point gets passed through twice, once for each loop.
        if op != Operation::RemoveCrossings || !self.is_split_point(v) {
            if let Some(n) = self.vertices[v].neighbor {
                departed[n] = true;
            }
        }
    }

    /// Walks out the output contours.
    pub(crate) fn traverse(mut self, op: Operation) -> (Path, Vec<Diagnostic>) {
        let mut components = Vec::new();
        let mut seeds = Vec::new();
        for side in 0..self.side_count() {
            let path = self.paths[side];
            for (i, starts) in self.starts[side].iter().enumerate() {
                let Some(starts) = starts else {
                    continue;
                };
                let turning: Vec<_> = self
                    .cycle(starts[0])
                    .into_iter()
                    .filter(|v| self.is_turning_point(*v, op))
                    .collect();
                if turning.is_empty() {
                    let component = &path.components()[i];
                    if self.keeps_whole(op, side, component) {
                        components.push(component.clone());
                    }
                } else if side == 0 {
                    seeds.extend(turning);
                }
            }
        }
        // Starting from vertices that move forward keeps the output oriented
        // like the input.
        seeds.sort_by_key(|v| !self.moves_forward(*v, op, true));

        let mut departed = Vertices::<bool>::with_size(self.vertices.len());
        for start in seeds {
            if departed[start] {
                continue;
            }
            if let Some(c) = self.walk(start, op, &mut departed) {
                components.push(c);
            }
        }
        tracing::debug!(components = components.len(), ?op, "finished traversal");
        (Path::new(components), self.diagnostics)
    }

    fn walk(
        &mut self,
        start: VertexIdx,
        op: Operation,
        departed: &mut Vertices<bool>,
    ) -> Option<PathComponent> {
        let cap = self.vertices.len();
        let mut curves = Vec::new();
        let mut v = start;
        let mut on_first = true;
        let mut steps = 0;
        let mut failure = None;

        'contour: loop {
            let forward = self.moves_forward(v, op, on_first);
            self.depart(v, op, departed);
            let stop = loop {
                curves.push(self.emit(v, forward));
                v = if forward {
                    self.vertices[v].next
                } else {
                    self.vertices[v].prev
                };
                steps += 1;
                if steps > cap {
                    failure = Some(v);
                    break 'contour;
                }
                if self.stops_at(v, op, on_first, forward) {
                    break v;
                }
            };
            let Some(jump) = self.vertices[stop].neighbor else {
                failure = Some(stop);
                break;
            };
            if stop == start || jump == start {
                break;
            }
            if departed[jump] || !self.is_turning_point(jump, op) {
                failure = Some(jump);
                break;
            }
            v = jump;
            on_first = !on_first;
        }

        if let Some(vertex) = failure {
            self.report(Diagnostic::InconsistentTraversal { vertex: vertex.0 });
        }
        close_contour(curves)
    }
}

fn close_contour(mut curves: Vec<Curve>) -> Option<PathComponent> {
    let first = curves.first()?.start();
    let last = curves.last()?.end();
    if first != last {
        curves.push(Line::new(last, first).into());
    }
    match PathComponent::from_curves(&curves) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::debug!(%e, "dropping a malformed contour");
            None
        }
    }
}
