//! A probabilistic skiplist over `(key, value)` pairs with an atomic
//! range-splice-merge operation, the backing structure shared by every
//! windowed/time-weighted aggregate. Grounded line-for-line (constants,
//! sentinel layout, capacity growth, free-list reuse) in the original
//! engine's skiplist, generalized from its two hardcoded element shapes
//! (keyed, temporal) to one generic `(K, V)` node.
//!
//! Nodes live in a flat `Vec`, indexed by position rather than linked
//! through pointers, with `HEAD`/`TAIL` fixed at indices 0/1 the way the
//! original reserves `elems[0]`/`elems[1]` for its sentinels. A `next[level]`
//! pointer of `TAIL` means "nothing further at this level" — there is no
//! separate `NIL` distinct from the tail sentinel, matching the original's
//! `cur == list->tail` loop terminator.

use crate::agg::context::{AggregationContext, SKIPLIST_MAXLEVEL};
use crate::errors::{Error, Result};

const SKIPLIST_INITIAL_CAPACITY: usize = 1024;
/// An implementation-defined allocation ceiling past which a splice that
/// needs more slots than are free fails instead of growing further.
const SKIPLIST_MAX_CAPACITY: usize = 1 << 20;

const HEAD: usize = 0;
const TAIL: usize = 1;

#[derive(Debug, Clone)]
struct Elem<K, V> {
    key: Option<K>,
    value: Option<V>,
    next: Vec<usize>,
}

/// A skiplist keyed by `K`, carrying a `V` payload per node.
#[derive(Debug, Clone)]
pub struct SkipList<K, V> {
    elems: Vec<Elem<K, V>>,
    free_list: Vec<usize>,
    capacity: usize,
    height: u32,
    length: usize,
}

impl<K, V> Default for SkipList<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SkipList<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        let head = Elem {
            key: None,
            value: None,
            next: vec![TAIL],
        };
        let tail = Elem {
            key: None,
            value: None,
            next: vec![TAIL],
        };
        Self {
            elems: vec![head, tail],
            free_list: Vec::new(),
            capacity: SKIPLIST_INITIAL_CAPACITY,
            height: 1,
            length: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn grow_height(&mut self, new_height: u32) {
        if new_height <= self.height {
            return;
        }
        self.elems[HEAD].next.resize(new_height as usize, TAIL);
        self.elems[TAIL].next.resize(new_height as usize, TAIL);
        self.height = new_height;
    }

    /// Returns, for every level `0..self.height`, the index of the last
    /// element whose key precedes (or whose slot is `HEAD`, if none does)
    /// the insertion point for `key` at that level.
    fn locate(&self, key: &K) -> Vec<usize> {
        let mut update = vec![HEAD; self.height as usize];
        let mut cur = HEAD;
        for level in (0..self.height as usize).rev() {
            loop {
                let next = self.elems[cur].next[level];
                if next == TAIL {
                    break;
                }
                let next_key = self.elems[next].key.as_ref().expect("non-sentinel has a key");
                if next_key < key {
                    cur = next;
                } else {
                    break;
                }
            }
            update[level] = cur;
        }
        update
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        let update = self.locate(key);
        let candidate = self.elems[update[0]].next[0];
        if candidate == TAIL {
            return None;
        }
        if self.elems[candidate].key.as_ref() == Some(key) {
            self.elems[candidate].value.as_ref()
        } else {
            None
        }
    }

    fn alloc_slot(&mut self) -> Result<usize> {
        if let Some(idx) = self.free_list.pop() {
            return Ok(idx);
        }
        if self.elems.len() >= self.capacity {
            if self.capacity >= SKIPLIST_MAX_CAPACITY {
                tracing::warn!(capacity = self.capacity, "skiplist allocation ceiling reached");
                return Err(Error::memory_alloc(
                    "skiplist exceeded its implementation-defined allocation ceiling",
                ));
            }
            self.capacity = (self.capacity * 2).min(SKIPLIST_MAX_CAPACITY);
            tracing::debug!(new_capacity = self.capacity, "grew skiplist capacity");
        }
        let idx = self.elems.len();
        self.elems.push(Elem {
            key: None,
            value: None,
            next: Vec::new(),
        });
        Ok(idx)
    }

    fn insert_one(&mut self, key: K, value: V, ctx: &mut AggregationContext) -> Result<()> {
        let level = ctx.random_level().min(SKIPLIST_MAXLEVEL);
        self.grow_height(level);
        let update = self.locate(&key);
        let idx = self.alloc_slot()?;
        let mut next = vec![TAIL; level as usize];
        for l in 0..level as usize {
            let pred = update.get(l).copied().unwrap_or(HEAD);
            next[l] = self.elems[pred].next[l];
            self.elems[pred].next[l] = idx;
        }
        self.elems[idx] = Elem {
            key: Some(key),
            value: Some(value),
            next,
        };
        self.length += 1;
        Ok(())
    }

    /// Deletes every element with a key in `[lo, hi]` (inclusive on both
    /// ends), returning the deleted `(key, value)` pairs in ascending key
    /// order. Freed slots go onto the LIFO free list for reuse.
    fn delete_range(&mut self, lo: &K, hi: &K) -> Vec<(K, V)> {
        let update = self.locate(lo);
        let mut removed = Vec::new();
        let mut cur = self.elems[update[0]].next[0];
        while cur != TAIL {
            let key = self.elems[cur].key.clone().expect("non-sentinel has a key");
            if &key > hi {
                break;
            }
            let next_levels = self.elems[cur].next.clone();
            for (level, next) in next_levels.iter().enumerate() {
                let pred = update[level];
                if self.elems[pred].next[level] == cur {
                    self.elems[pred].next[level] = *next;
                }
            }
            let value = self.elems[cur].value.take().expect("non-sentinel has a value");
            removed.push((key, value));
            self.free_list.push(cur);
            self.length -= 1;
            cur = next_levels[0];
        }
        removed
    }

    /// Atomically replaces the contiguous run of existing elements whose
    /// keys fall within `[new_items.first().key, new_items.last().key]`
    /// with the two-finger merge of that run against `new_items`: a key
    /// present on both sides is combined with `merge`, a key present on
    /// only one side passes through unchanged. Every surviving element is
    /// reinserted with a freshly drawn random level, matching the
    /// original's "reinsert with fresh levels" step.
    pub fn splice(&mut self, new_items: Vec<(K, V)>, merge: impl Fn(&V, &V) -> V, ctx: &mut AggregationContext) -> Result<()> {
        if new_items.is_empty() {
            return Ok(());
        }
        let lo = new_items[0].0.clone();
        let hi = new_items[new_items.len() - 1].0.clone();
        let existing = self.delete_range(&lo, &hi);

        let mut merged = Vec::with_capacity(existing.len() + new_items.len());
        let (mut ei, mut ni) = (existing.into_iter().peekable(), new_items.into_iter().peekable());
        loop {
            ctx.check_cancelled()?;
            match (ei.peek(), ni.peek()) {
                (None, None) => break,
                (Some(_), None) => merged.push(ei.next().unwrap()),
                (None, Some(_)) => merged.push(ni.next().unwrap()),
                (Some((ek, _)), Some((nk, _))) => {
                    if ek < nk {
                        merged.push(ei.next().unwrap());
                    } else if nk < ek {
                        merged.push(ni.next().unwrap());
                    } else {
                        let (k, ev) = ei.next().unwrap();
                        let (_, nv) = ni.next().unwrap();
                        let combined = merge(&ev, &nv);
                        merged.push((k, combined));
                    }
                }
            }
        }

        for (k, v) in merged {
            self.insert_one(k, v, ctx)?;
        }
        Ok(())
    }

    /// A convenience wrapper over `splice` for inserting a single
    /// `(key, value)` pair with no existing bracket to merge against.
    pub fn insert(&mut self, key: K, value: V, ctx: &mut AggregationContext) -> Result<()> {
        self.splice(vec![(key, value)], |_, new| new.clone(), ctx)
    }

    /// The `(key, value)` pairs in ascending key order — strictly
    /// increasing, since the list is never left with duplicate keys.
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.length);
        let mut cur = self.elems[HEAD].next[0];
        while cur != TAIL {
            out.push((
                self.elems[cur].key.clone().expect("non-sentinel has a key"),
                self.elems[cur].value.clone().expect("non-sentinel has a value"),
            ));
            cur = self.elems[cur].next[0];
        }
        out
    }

    pub fn values(&self) -> Vec<V> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AggregationContext {
        AggregationContext::new(123)
    }

    #[test]
    fn splice_merge_matches_the_documented_scenario() {
        let mut list = SkipList::new();
        let mut c = ctx();
        list.splice(vec![(1, "a"), (3, "b"), (5, "c")], |_, new| new, &mut c).unwrap();
        list.splice(vec![(3, "B"), (4, "D")], |_, new| new, &mut c).unwrap();
        assert_eq!(
            list.entries(),
            vec![(1, "a"), (3, "B"), (4, "D"), (5, "c")]
        );
    }

    #[test]
    fn values_are_strictly_increasing_in_key() {
        let mut list = SkipList::new();
        let mut c = ctx();
        for k in [10, 2, 7, 1, 9, 3] {
            list.insert(k, k * 10, &mut c).unwrap();
        }
        let keys: Vec<_> = list.entries().into_iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn search_finds_an_inserted_key_and_misses_an_absent_one() {
        let mut list = SkipList::new();
        let mut c = ctx();
        list.insert(5, "five", &mut c).unwrap();
        list.insert(10, "ten", &mut c).unwrap();
        assert_eq!(list.search(&5), Some(&"five"));
        assert_eq!(list.search(&7), None);
    }

    #[test]
    fn deleted_slots_are_reused_and_length_tracks_live_nodes() {
        let mut list = SkipList::new();
        let mut c = ctx();
        list.splice(vec![(1, 'a'), (2, 'b'), (3, 'c')], |_, new| new, &mut c).unwrap();
        assert_eq!(list.len(), 3);
        list.splice(vec![(2, 'B')], |_, new| new, &mut c).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.entries(), vec![(1, 'a'), (2, 'B'), (3, 'c')]);
    }

    #[test]
    fn splice_respects_cancellation() {
        let mut list = SkipList::new();
        let mut c = ctx();
        list.insert(1, 'a', &mut c).unwrap();
        c.cancel();
        let err = list.splice(vec![(2, 'b')], |_, new| new, &mut c).unwrap_err();
        assert_eq!(err, Error::OperationCancelled);
    }
}
