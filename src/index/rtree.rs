//! An in-memory R-tree over axis-aligned boxes, used to accelerate
//! overlap search. Fixed fan-out (`MAXITEMS`), `MINITEMS`-rebalanced splits
//! on the largest-extent axis, and a corrected choose-subtree rule (see the
//! note on [`RTree::choose_subtree`]).
//!
//! The axis accessor is a trait, [`RTreeBox`], rather than hardcoded x/y/z/t
//! field access, so the same tree and split/search code could host another
//! bounded type later.

use std::fmt;

use crate::boxes::STBox;
use crate::errors::{Error, Result};

/// Maximum children/items per node.
pub const MAXITEMS: usize = 32;
/// Minimum children/items a node may have after a split (an implementation
/// ratio; no exact value is given beyond "MINITEMS constants").
pub const MINITEMS: usize = MAXITEMS / 3;

/// A box type usable as an R-tree key. Axis 0/1 are always present; further
/// axes (z, time, ...) are exposed through `axis_count`/`axis_bounds` so the
/// split/search code never special-cases a concrete basetype.
pub trait RTreeBox: Clone + fmt::Debug {
    fn axis_count(&self) -> usize;
    /// The `(lo, hi)` extent of `self` along `axis`.
    fn axis_bounds(&self, axis: usize) -> (f64, f64);
    fn union(&self, other: &Self) -> Result<Self>;
    fn overlaps(&self, other: &Self) -> Result<bool>;
    fn contains(&self, other: &Self) -> Result<bool>;
}

impl RTreeBox for STBox {
    fn axis_count(&self) -> usize {
        2 + self.has_z() as usize + self.has_t() as usize
    }

    fn axis_bounds(&self, axis: usize) -> (f64, f64) {
        match axis {
            0 => (self.xmin, self.xmax),
            1 => (self.ymin, self.ymax),
            2 if self.has_z() => (self.zmin, self.zmax),
            _ => {
                let span = self
                    .time_span()
                    .expect("time axis requested on a box without a time dimension");
                (
                    span.lower().timestamp_millis() as f64,
                    span.upper().timestamp_millis() as f64,
                )
            }
        }
    }

    fn union(&self, other: &Self) -> Result<Self> {
        let mut out = self.clone();
        out.expand(other)?;
        Ok(out)
    }

    fn overlaps(&self, other: &Self) -> Result<bool> {
        STBox::overlaps(self, other)
    }

    fn contains(&self, other: &Self) -> Result<bool> {
        STBox::contains(self, other)
    }
}

fn area<B: RTreeBox>(b: &B) -> f64 {
    (0..b.axis_count())
        .map(|a| {
            let (lo, hi) = b.axis_bounds(a);
            (hi - lo).max(0.0)
        })
        .product()
}

fn largest_axis<B: RTreeBox>(b: &B) -> usize {
    (1..b.axis_count())
        .max_by(|&a, &c| extent(b, a).partial_cmp(&extent(b, c)).unwrap())
        .unwrap_or(0)
}

fn extent<B: RTreeBox>(b: &B, axis: usize) -> f64 {
    let (lo, hi) = b.axis_bounds(axis);
    hi - lo
}

fn compute_box<B: RTreeBox>(items: &[(B, Payload)]) -> Result<B> {
    let mut iter = items.iter();
    let (first, _) = iter.next().expect("a node is never empty");
    let mut out = first.clone();
    for (b, _) in iter {
        out = out.union(b)?;
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Leaf,
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    Leaf(u64),
    Inner(usize),
}

#[derive(Debug, Clone)]
struct Node<B: RTreeBox> {
    kind: NodeKind,
    items: Vec<(B, Payload)>,
}

enum InsertOutcome {
    Done,
    NeedsSplit,
}

/// An in-memory R-tree over boxes of type `B`, keyed by `u64` user ids.
#[derive(Debug, Clone)]
pub struct RTree<B: RTreeBox = STBox> {
    nodes: Vec<Node<B>>,
    root: usize,
}

impl<B: RTreeBox> Default for RTree<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RTreeBox> RTree<B> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, id: u64, b: B) -> Result<()> {
        if self.nodes.is_empty() {
            self.nodes.push(Node {
                kind: NodeKind::Leaf,
                items: vec![(b, Payload::Leaf(id))],
            });
            self.root = 0;
            return Ok(());
        }
        match self.insert_into(self.root, &b, id)? {
            InsertOutcome::Done => Ok(()),
            InsertOutcome::NeedsSplit => {
                let (left_box, right_box, right_idx) = self.split_node(self.root, &b)?;
                let old_root = self.root;
                self.root = self.nodes.len();
                self.nodes.push(Node {
                    kind: NodeKind::Inner,
                    items: vec![(left_box, Payload::Inner(old_root)), (right_box, Payload::Inner(right_idx))],
                });
                match self.insert_into(self.root, &b, id)? {
                    InsertOutcome::Done => Ok(()),
                    InsertOutcome::NeedsSplit => {
                        Err(Error::internal("rtree insert found no room after splitting the root"))
                    }
                }
            }
        }
    }

    fn insert_into(&mut self, idx: usize, b: &B, id: u64) -> Result<InsertOutcome> {
        if self.nodes[idx].kind == NodeKind::Leaf {
            if self.nodes[idx].items.len() < MAXITEMS {
                self.nodes[idx].items.push((b.clone(), Payload::Leaf(id)));
                return Ok(InsertOutcome::Done);
            }
            return Ok(InsertOutcome::NeedsSplit);
        }
        let child_pos = self.choose_subtree(idx, b)?;
        let child_idx = match self.nodes[idx].items[child_pos].1 {
            Payload::Inner(i) => i,
            Payload::Leaf(_) => unreachable!("inner node items are always Payload::Inner"),
        };
        match self.insert_into(child_idx, b, id)? {
            InsertOutcome::Done => {
                self.nodes[idx].items[child_pos].0 = self.nodes[idx].items[child_pos].0.union(b)?;
                Ok(InsertOutcome::Done)
            }
            InsertOutcome::NeedsSplit => {
                if self.nodes[idx].items.len() == MAXITEMS {
                    return Ok(InsertOutcome::NeedsSplit);
                }
                let (left_box, right_box, right_idx) = self.split_node(child_idx, b)?;
                self.nodes[idx].items[child_pos].0 = left_box;
                self.nodes[idx].items.push((right_box, Payload::Inner(right_idx)));
                self.insert_into(idx, b, id)
            }
        }
    }

    /// Descends into the child whose *own* box already contains the new
    /// box; falls back to least-enlargement. The original engine shortcuts
    /// this with the R-tree's global root box rather than the candidate
    /// child's own box, which always resolves to the first child when the
    /// new box sits inside the root's overall extent — this mirrors the
    /// corrected rule instead.
    fn choose_subtree(&self, idx: usize, b: &B) -> Result<usize> {
        let node = &self.nodes[idx];
        for (i, (child_box, _)) in node.items.iter().enumerate() {
            if child_box.contains(b)? {
                return Ok(i);
            }
        }
        let mut best = 0;
        let mut best_enlargement = f64::INFINITY;
        for (i, (child_box, _)) in node.items.iter().enumerate() {
            let unioned = child_box.union(b)?;
            let enlargement = area(&unioned) - area(child_box);
            if enlargement < best_enlargement {
                best_enlargement = enlargement;
                best = i;
            }
        }
        Ok(best)
    }

    /// Splits a full node along the largest-extent axis of `guide` (the box
    /// being inserted, used only to pick the axis), redistributing by
    /// distance-to-extreme and rebalancing so neither side underflows
    /// `MINITEMS`. Mutates `self.nodes[idx]` in place to the left half and
    /// appends the right half as a new node.
    fn split_node(&mut self, idx: usize, guide: &B) -> Result<(B, B, usize)> {
        let axis = largest_axis(guide);
        let kind = self.nodes[idx].kind;
        let items = std::mem::take(&mut self.nodes[idx].items);
        let (glo, ghi) = guide.axis_bounds(axis);

        let mut left: Vec<(B, Payload)> = Vec::new();
        let mut right: Vec<(B, Payload)> = Vec::new();
        for (b, p) in items {
            let (lo, hi) = b.axis_bounds(axis);
            let min_dist = lo - glo;
            let max_dist = ghi - hi;
            if max_dist < min_dist {
                right.push((b, p));
            } else {
                left.push((b, p));
            }
        }

        if left.len() < MINITEMS {
            // Reverse sort by the lower bound, then migrate from the tail.
            right.sort_by(|(a, _), (b, _)| b.axis_bounds(axis).0.partial_cmp(&a.axis_bounds(axis).0).unwrap());
            while left.len() < MINITEMS && !right.is_empty() {
                left.push(right.pop().unwrap());
            }
        } else if right.len() < MINITEMS {
            // Reverse sort by the upper bound, then migrate from the tail.
            left.sort_by(|(a, _), (b, _)| b.axis_bounds(axis).1.partial_cmp(&a.axis_bounds(axis).1).unwrap());
            while right.len() < MINITEMS && !left.is_empty() {
                right.push(left.pop().unwrap());
            }
        }

        let left_box = compute_box(&left)?;
        let right_box = compute_box(&right)?;
        self.nodes[idx].items = left;
        let right_idx = self.nodes.len();
        self.nodes.push(Node { kind, items: right });
        Ok((left_box, right_box, right_idx))
    }

    /// Depth-first overlap search, collecting matching ids into a plain
    /// `Vec` (its own amortized-doubling growth already gives the growable
    /// result array the original engine hand-rolls with power-of-two
    /// `repalloc` milestones).
    pub fn search(&self, query: &B) -> Result<Vec<u64>> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() {
            self.search_node(self.root, query, &mut out)?;
        }
        Ok(out)
    }

    fn search_node(&self, idx: usize, query: &B, out: &mut Vec<u64>) -> Result<()> {
        let node = &self.nodes[idx];
        for (b, p) in &node.items {
            if b.overlaps(query)? {
                match *p {
                    Payload::Leaf(id) => out.push(id),
                    Payload::Inner(child) => self.search_node(child, query, out)?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box2d(x0: f64, y0: f64, x1: f64, y1: f64) -> STBox {
        STBox::new_xy(x0, y0, x1, y1, None, 0, false).unwrap()
    }

    #[test]
    fn search_finds_exactly_the_overlapping_boxes() {
        let mut tree = RTree::<STBox>::new();
        tree.insert(1, box2d(0.0, 0.0, 1.0, 1.0)).unwrap();
        tree.insert(2, box2d(2.0, 2.0, 3.0, 3.0)).unwrap();
        tree.insert(3, box2d(0.5, 0.5, 2.5, 2.5)).unwrap();

        let query = box2d(0.9, 0.9, 1.1, 1.1);
        let mut hits = tree.search(&query).unwrap();
        hits.sort();
        assert_eq!(hits, vec![1, 3]);
    }

    #[test]
    fn split_keeps_every_item_reachable() {
        let mut tree = RTree::<STBox>::new();
        for i in 0..(MAXITEMS as u64 * 3) {
            let x = i as f64;
            tree.insert(i, box2d(x, 0.0, x + 0.5, 1.0)).unwrap();
        }
        let whole = box2d(-1.0, -1.0, MAXITEMS as f64 * 3.0, 2.0);
        let mut hits = tree.search(&whole).unwrap();
        hits.sort();
        assert_eq!(hits, (0..(MAXITEMS as u64 * 3)).collect::<Vec<_>>());
    }
}
