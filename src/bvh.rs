//! A bounding volume hierarchy over the elements of a path component.
//!
//! The tree is a complete binary tree stored implicitly in an array: node `i`
//! has children `2i + 1` and `2i + 2`. With `n` elements there are `n` leaves
//! and `n - 1` internal nodes. The leaves occupy the last row of the tree and
//! (if that row isn't full) the end of the second-to-last row; we assign
//! elements to them left to right, so every subtree covers a contiguous range
//! of elements.

use crate::bbox::BoundingBox;

/// What kind of node [`BoundingBoxHierarchy::visit`] is looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf, holding a single element.
    Leaf {
        /// The element's index.
        element: usize,
    },
    /// An internal node, covering all the elements between `start` and `end` inclusive.
    Internal {
        /// The first element covered by this node.
        start: usize,
        /// The last element covered by this node.
        end: usize,
    },
}

/// A node of the hierarchy, as seen by [`BoundingBoxHierarchy::visit`].
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    /// The bounding box of everything in this node's subtree.
    pub bounding_box: &'a BoundingBox,
    /// Leaf or internal.
    pub kind: NodeKind,
}

/// A bounding volume hierarchy, built once from a list of boxes.
#[derive(Clone, Debug)]
pub struct BoundingBoxHierarchy {
    boxes: Vec<BoundingBox>,
    // The (inclusive) range of elements covered by each node.
    ranges: Vec<(usize, usize)>,
    element_count: usize,
    last_row_index: usize,
}

fn left(index: usize) -> usize {
    2 * index + 1
}

fn right(index: usize) -> usize {
    2 * index + 2
}

impl BoundingBoxHierarchy {
    /// Builds a hierarchy whose leaves are the given boxes, in order.
    ///
    /// # Panics
    ///
    /// Panics if `boxes` is empty.
    pub fn new(boxes: &[BoundingBox]) -> Self {
        assert!(
            !boxes.is_empty(),
            "a bounding box hierarchy needs at least one element"
        );
        let element_count = boxes.len();
        let internal_count = element_count - 1;
        let node_count = element_count + internal_count;

        let mut last_row_index = 0;
        while last_row_index < internal_count {
            last_row_index = left(last_row_index);
        }

        let mut ret = BoundingBoxHierarchy {
            boxes: vec![BoundingBox::EMPTY; node_count],
            ranges: vec![(0, 0); node_count],
            element_count,
            last_row_index,
        };
        for node in internal_count..node_count {
            let element = ret.leaf_to_element(node);
            ret.boxes[node] = boxes[element];
            ret.ranges[node] = (element, element);
        }
        for node in (0..internal_count).rev() {
            let (l, r) = (left(node), right(node));
            ret.boxes[node] = ret.boxes[l].union(&ret.boxes[r]);
            ret.ranges[node] = (ret.ranges[l].0, ret.ranges[r].1);
        }
        ret
    }

    fn is_leaf(&self, node: usize) -> bool {
        node >= self.element_count - 1
    }

    fn leaf_to_element(&self, node: usize) -> usize {
        debug_assert!(self.is_leaf(node));
        (node + self.element_count - self.last_row_index) % self.element_count
    }

    fn element_to_leaf(&self, element: usize) -> usize {
        let node = self.last_row_index + element;
        if node >= self.boxes.len() {
            node - self.element_count
        } else {
            node
        }
    }

    /// How many elements (leaves) there are.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// The bounding box of everything.
    pub fn bounding_box(&self) -> BoundingBox {
        self.boxes[0]
    }

    /// The bounding box of a single element.
    pub fn element_bounding_box(&self, element: usize) -> BoundingBox {
        self.boxes[self.element_to_leaf(element)]
    }

    fn node(&self, index: usize) -> Node<'_> {
        let kind = if self.is_leaf(index) {
            NodeKind::Leaf {
                element: self.ranges[index].0,
            }
        } else {
            NodeKind::Internal {
                start: self.ranges[index].0,
                end: self.ranges[index].1,
            }
        };
        Node {
            bounding_box: &self.boxes[index],
            kind,
        }
    }

    /// Visits the nodes of the tree in pre-order.
    ///
    /// The callback receives each node and its depth; if it returns `false`,
    /// the node's children are skipped.
    pub fn visit(&self, mut callback: impl FnMut(&Node<'_>, usize) -> bool) {
        self.visit_from(0, 0, &mut callback);
    }

    fn visit_from(
        &self,
        index: usize,
        depth: usize,
        callback: &mut impl FnMut(&Node<'_>, usize) -> bool,
    ) {
        if !callback(&self.node(index), depth) || self.is_leaf(index) {
            return;
        }
        self.visit_from(left(index), depth + 1, callback);
        self.visit_from(right(index), depth + 1, callback);
    }

    /// Calls `f(a, b)` for every element `a` of `self` and element `b` of `other`
    /// whose bounding boxes overlap.
    pub fn for_each_overlap(&self, other: &BoundingBoxHierarchy, mut f: impl FnMut(usize, usize)) {
        self.overlaps_between(other, 0, 0, &mut f);
    }

    /// All the pairs found by [`for_each_overlap`](Self::for_each_overlap).
    pub fn overlaps(&self, other: &BoundingBoxHierarchy) -> Vec<(usize, usize)> {
        let mut ret = Vec::new();
        self.for_each_overlap(other, |a, b| ret.push((a, b)));
        ret
    }

    fn overlaps_between(
        &self,
        other: &BoundingBoxHierarchy,
        index1: usize,
        index2: usize,
        f: &mut impl FnMut(usize, usize),
    ) {
        if !self.boxes[index1].overlaps(&other.boxes[index2]) {
            return;
        }
        match (self.is_leaf(index1), other.is_leaf(index2)) {
            (true, true) => f(self.ranges[index1].0, other.ranges[index2].0),
            (true, false) => {
                self.overlaps_between(other, index1, left(index2), f);
                self.overlaps_between(other, index1, right(index2), f);
            }
            (false, true) => {
                self.overlaps_between(other, left(index1), index2, f);
                self.overlaps_between(other, right(index1), index2, f);
            }
            (false, false) => {
                self.overlaps_between(other, left(index1), left(index2), f);
                self.overlaps_between(other, left(index1), right(index2), f);
                self.overlaps_between(other, right(index1), left(index2), f);
                self.overlaps_between(other, right(index1), right(index2), f);
            }
        }
    }

    /// Calls `f(a, b)` for every pair of elements with `a <= b` whose bounding
    /// boxes overlap. This includes every `(a, a)`.
    pub fn for_each_self_overlap(&self, mut f: impl FnMut(usize, usize)) {
        self.self_overlaps_from(0, &mut f);
    }

    /// All the pairs found by [`for_each_self_overlap`](Self::for_each_self_overlap).
    pub fn self_overlaps(&self) -> Vec<(usize, usize)> {
        let mut ret = Vec::new();
        self.for_each_self_overlap(|a, b| ret.push((a, b)));
        ret
    }

    fn self_overlaps_from(&self, index: usize, f: &mut impl FnMut(usize, usize)) {
        if self.is_leaf(index) {
            let element = self.ranges[index].0;
            f(element, element);
            return;
        }
        let (l, r) = (left(index), right(index));
        self.self_overlaps_from(l, f);
        // Elements in the left subtree all come before the ones on the right.
        self.overlaps_between(self, l, r, f);
        self.self_overlaps_from(r, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_box(x: f64, y: f64) -> BoundingBox {
        BoundingBox::from_points((x, y).into(), (x + 1.0, y + 1.0).into())
    }

    #[test]
    fn leaf_order_is_contiguous() {
        for n in 1..40 {
            let boxes: Vec<_> = (0..n).map(|i| unit_box(i as f64, 0.0)).collect();
            let bvh = BoundingBoxHierarchy::new(&boxes);
            let mut leaves = Vec::new();
            bvh.visit(|node, _| {
                if let NodeKind::Leaf { element } = node.kind {
                    leaves.push(element);
                }
                true
            });
            assert_eq!(leaves, (0..n).collect::<Vec<_>>());
            for i in 0..n {
                assert_eq!(bvh.element_bounding_box(i), boxes[i]);
            }
        }
    }

    #[test]
    fn internal_ranges() {
        let boxes: Vec<_> = (0..5).map(|i| unit_box(i as f64, 0.0)).collect();
        let bvh = BoundingBoxHierarchy::new(&boxes);
        let mut root = None;
        bvh.visit(|node, depth| {
            if depth == 0 {
                root = Some(node.kind);
            }
            true
        });
        assert_eq!(root, Some(NodeKind::Internal { start: 0, end: 4 }));
        assert_eq!(bvh.bounding_box(), unit_box(0.0, 0.0).union(&unit_box(4.0, 0.0)));
    }

    #[test]
    fn single_element() {
        let bvh = BoundingBoxHierarchy::new(&[unit_box(0.0, 0.0)]);
        assert_eq!(bvh.self_overlaps(), vec![(0, 0)]);
        let other = BoundingBoxHierarchy::new(&[unit_box(0.5, 0.5), unit_box(5.0, 5.0)]);
        assert_eq!(bvh.overlaps(&other), vec![(0, 0)]);
    }

    #[test]
    fn pruning() {
        let boxes: Vec<_> = (0..8).map(|i| unit_box(3.0 * i as f64, 0.0)).collect();
        let bvh = BoundingBoxHierarchy::new(&boxes);
        let mut visited = 0;
        bvh.visit(|node, _| {
            visited += 1;
            node.bounding_box.min.x < 1.0
        });
        // Only the leftmost path gets expanded.
        assert!(visited < 2 * boxes.len() - 1);
    }

    fn brute_force(a: &[BoundingBox], b: &[BoundingBox]) -> Vec<(usize, usize)> {
        let mut ret = Vec::new();
        for (i, ba) in a.iter().enumerate() {
            for (j, bb) in b.iter().enumerate() {
                if ba.overlaps(bb) {
                    ret.push((i, j));
                }
            }
        }
        ret
    }

    fn arb_boxes() -> impl Strategy<Value = Vec<BoundingBox>> {
        prop::collection::vec(
            (0.0f64..10.0, 0.0f64..10.0, 0.0f64..3.0, 0.0f64..3.0).prop_map(|(x, y, w, h)| {
                BoundingBox::from_points((x, y).into(), (x + w, y + h).into())
            }),
            1..30,
        )
    }

    proptest! {
        #[test]
        fn overlaps_match_brute_force(a in arb_boxes(), b in arb_boxes()) {
            let bvh_a = BoundingBoxHierarchy::new(&a);
            let bvh_b = BoundingBoxHierarchy::new(&b);
            let mut found = bvh_a.overlaps(&bvh_b);
            found.sort();
            prop_assert_eq!(found, brute_force(&a, &b));
        }

        #[test]
        fn self_overlaps_match_brute_force(a in arb_boxes()) {
            let bvh = BoundingBoxHierarchy::new(&a);
            let mut found = bvh.self_overlaps();
            found.sort();
            let expected: Vec<_> = brute_force(&a, &a).into_iter().filter(|(i, j)| i <= j).collect();
            prop_assert_eq!(found, expected);
        }
    }
}
