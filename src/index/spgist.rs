//! SP-GiST quadtree/kd-tree traversal over [`Span`]. A `SpanNode` is the
//! traversal value a host access method carries down the tree: not a box
//! of values but a box of *bounds* — `left` tracks the span of possible
//! lower bounds in the subtree, `right` tracks the span of possible upper
//! bounds. Centroid choice and the six pruning predicates are expressed
//! purely in terms of those two bound-spans.

use std::fmt;

use crate::collections::span::Span;

/// The traversal value for a node: `left` bounds where a descendant span's
/// lower bound can fall, `right` bounds where its upper bound can fall.
/// `None` on either side means unbounded in that direction.
#[derive(Debug, Clone)]
pub struct SpanNode<T: Clone + PartialOrd + fmt::Debug> {
    pub left: Option<Span<T>>,
    pub right: Option<Span<T>>,
}

impl<T: Clone + PartialOrd + fmt::Debug> SpanNode<T> {
    /// The root traversal value: unrestricted in both directions.
    pub fn unbounded() -> Self {
        Self {
            left: None,
            right: None,
        }
    }

    /// The single span `[min possible lower, max possible upper]` a node's
    /// subtree could possibly contain, used by the pruning predicates.
    fn envelope(&self) -> Option<Span<T>> {
        let left = self.left.as_ref()?;
        let right = self.right.as_ref()?;
        Span::new(left.lower().clone(), right.upper().clone(), left.lower_inc(), right.upper_inc()).ok()
    }

    /// The next traversal value for a quadtree child, given the centroid
    /// span at this node and the quadrant (0-3, bit 1 = lower-half choice,
    /// bit 0 = upper-half choice, matching [`quadrant_2d`]).
    pub fn quadtree_child(&self, centroid: &Span<T>, quadrant: u8) -> Self {
        let mut next = self.clone();
        let left = next.left.get_or_insert_with(|| centroid.clone());
        if quadrant & 0x2 != 0 {
            *left = Span::new(centroid.lower().clone(), left.upper().clone(), true, left.upper_inc()).unwrap_or_else(|_| left.clone());
        } else {
            *left = Span::new(left.lower().clone(), centroid.lower().clone(), left.lower_inc(), true).unwrap_or_else(|_| left.clone());
        }
        let right = next.right.get_or_insert_with(|| centroid.clone());
        if quadrant & 0x1 != 0 {
            *right = Span::new(centroid.upper().clone(), right.upper().clone(), true, right.upper_inc()).unwrap_or_else(|_| right.clone());
        } else {
            *right = Span::new(right.lower().clone(), centroid.upper().clone(), right.lower_inc(), true).unwrap_or_else(|_| right.clone());
        }
        next
    }

    /// The next traversal value for a kd-tree child. Even levels split on
    /// the centroid's upper bound, odd levels on its lower bound —
    /// alternating the axis each level keeps both bound-ranges from
    /// collapsing to the same half forever.
    pub fn kdtree_child(&self, centroid: &Span<T>, side: u8, level: usize) -> Self {
        let mut next = self.clone();
        if level % 2 == 1 {
            let right = next.right.get_or_insert_with(|| centroid.clone());
            if side == 0 {
                *right = Span::new(centroid.lower().clone(), right.upper().clone(), true, right.upper_inc()).unwrap_or_else(|_| right.clone());
            } else {
                let left = next.left.get_or_insert_with(|| centroid.clone());
                *left = Span::new(centroid.lower().clone(), left.upper().clone(), true, left.upper_inc()).unwrap_or_else(|_| left.clone());
            }
        } else {
            let right = next.right.get_or_insert_with(|| centroid.clone());
            if side == 0 {
                *right = Span::new(right.lower().clone(), centroid.upper().clone(), right.lower_inc(), true).unwrap_or_else(|_| right.clone());
            } else {
                let left = next.left.get_or_insert_with(|| centroid.clone());
                *left = Span::new(left.lower().clone(), centroid.upper().clone(), left.lower_inc(), true).unwrap_or_else(|_| left.clone());
            }
        }
        next
    }
}

/// Which of the 4 quadrants `query` falls in relative to `centroid`: bit 1
/// set if `query`'s lower bound is greater than the centroid's, bit 0 set
/// if `query`'s upper bound is greater than the centroid's.
pub fn quadrant_2d<T: Clone + PartialOrd + fmt::Debug>(centroid: &Span<T>, query: &Span<T>) -> u8 {
    let mut quadrant = 0u8;
    if query.lower() > centroid.lower() {
        quadrant |= 0x2;
    }
    if query.upper() > centroid.upper() {
        quadrant |= 0x1;
    }
    quadrant
}

/// Can any span in `node`'s subtree overlap `query`?
pub fn overlap_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.envelope().is_some_and(|e| e.overlaps(query))
}

/// Can any span in `node`'s subtree contain `query`?
pub fn contain_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.envelope().is_some_and(|e| e.contains(query))
}

/// Can any span in `node`'s subtree be strictly left of `query`? Only the
/// possible-upper-bound range (`right`) matters: even the rightmost
/// possible span must end before `query` begins.
pub fn left_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.right.as_ref().is_some_and(|r| r.strictly_left(query))
}

pub fn over_left_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.right.as_ref().is_some_and(|r| r.overlaps_or_left(query))
}

/// Can any span in `node`'s subtree be strictly right of `query`? Only the
/// possible-lower-bound range (`left`) matters.
pub fn right_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.left.as_ref().is_some_and(|l| l.strictly_right(query))
}

pub fn over_right_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.left.as_ref().is_some_and(|l| l.overlaps_or_right(query))
}

/// Can any span in `node`'s subtree be adjacent to `query`?
pub fn adjacent_2d<T: Clone + PartialOrd + fmt::Debug>(node: &SpanNode<T>, query: &Span<T>) -> bool {
    node.left.as_ref().is_some_and(|l| l.adjacent(query)) || node.right.as_ref().is_some_and(|r| r.adjacent(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap()
    }

    fn span(a: u32, b: u32) -> Span<DateTime<Utc>> {
        Span::new(t(a), t(b), true, true).unwrap()
    }

    #[test]
    fn quadrant_splits_on_lower_and_upper_independently() {
        let centroid = span(5, 10);
        assert_eq!(quadrant_2d(&centroid, &span(1, 2)), 0);
        assert_eq!(quadrant_2d(&centroid, &span(6, 7)), 0x2);
        assert_eq!(quadrant_2d(&centroid, &span(1, 20)), 0x1);
        assert_eq!(quadrant_2d(&centroid, &span(6, 20)), 0x3);
    }

    #[test]
    fn quadtree_child_narrows_the_bound_ranges() {
        let root = SpanNode::unbounded();
        let centroid = span(5, 10);
        let child = root.quadtree_child(&centroid, 0x3);
        assert_eq!(*child.left.as_ref().unwrap().lower(), t(5));
        assert_eq!(*child.right.as_ref().unwrap().lower(), t(10));
    }

    #[test]
    fn left_2d_prunes_once_possible_upper_bounds_precede_the_query() {
        let mut node = SpanNode::unbounded();
        node.right = Some(span(0, 1));
        assert!(left_2d(&node, &span(5, 6)));
        assert!(!over_right_2d(&node, &span(5, 6)));
    }
}
