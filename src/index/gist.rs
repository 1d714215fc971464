//! Pure GiST consistency functions over [`Span`]: leaf-level exactness,
//! inner-node pruning, and the recheck classification a host access method
//! needs to decide whether to re-evaluate the exact predicate after an
//! index hit.

use crate::collections::span::{Span, SpanDistance};

/// The strategy a query predicate is evaluated under. `Before`/`After` and
/// their `Over` variants are the time-axis aliases of `Left`/`Right` — on a
/// time span they compute exactly the same comparison, just named for the
/// axis they're conventionally used on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Contains,
    ContainedBy,
    Overlaps,
    Equals,
    Adjacent,
    Left,
    OverLeft,
    Right,
    OverRight,
    Before,
    OverBefore,
    After,
    OverAfter,
}

impl Strategy {
    /// Positional strategies are bounding-box-exact; topological ones need
    /// a recheck against the full object after an index hit.
    pub fn requires_recheck(self) -> bool {
        matches!(
            self,
            Strategy::Contains
                | Strategy::ContainedBy
                | Strategy::Overlaps
                | Strategy::Equals
                | Strategy::Adjacent
        )
    }
}

/// True iff `leaf` and `query` are in the relation `strategy` declares.
pub fn leaf_consistent<T: SpanDistance>(strategy: Strategy, leaf: &Span<T>, query: &Span<T>) -> bool {
    match strategy {
        Strategy::Contains => leaf.contains(query),
        Strategy::ContainedBy => leaf.contained_by(query),
        Strategy::Overlaps => leaf.overlaps(query),
        Strategy::Equals => leaf.equals(query),
        Strategy::Adjacent => leaf.adjacent(query),
        Strategy::Left | Strategy::Before => leaf.strictly_left(query),
        Strategy::OverLeft | Strategy::OverBefore => leaf.overlaps_or_left(query),
        Strategy::Right | Strategy::After => leaf.strictly_right(query),
        Strategy::OverRight | Strategy::OverAfter => leaf.overlaps_or_right(query),
    }
}

/// Pruning rule for an inner node whose key is the MBR of its subtree: may
/// the subtree contain a match for `strategy` against `query`?
pub fn inner_consistent<T: SpanDistance>(strategy: Strategy, mbr: &Span<T>, query: &Span<T>) -> bool {
    match strategy {
        Strategy::Overlaps | Strategy::ContainedBy => mbr.overlaps(query),
        Strategy::Contains | Strategy::Equals => mbr.contains(query),
        Strategy::Adjacent => mbr.overlaps(query) || mbr.adjacent(query),
        Strategy::Left | Strategy::Before => !mbr.overlaps_or_right(query),
        Strategy::OverLeft | Strategy::OverBefore => !mbr.strictly_right(query),
        Strategy::Right | Strategy::After => !mbr.overlaps_or_left(query),
        Strategy::OverRight | Strategy::OverAfter => !mbr.strictly_left(query),
    }
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
    fn positional_strategies_never_require_recheck() {
        assert!(!Strategy::Left.requires_recheck());
        assert!(!Strategy::OverBefore.requires_recheck());
        assert!(Strategy::Overlaps.requires_recheck());
        assert!(Strategy::Contains.requires_recheck());
    }

    #[test]
    fn inner_consistent_prunes_disjoint_left_subtree() {
        let mbr = span(0, 1);
        let query = span(5, 6);
        assert!(!inner_consistent(Strategy::Overlaps, &mbr, &query));
        assert!(inner_consistent(Strategy::Left, &mbr, &query));
    }

    #[test]
    fn leaf_consistent_matches_overlaps() {
        let leaf = span(0, 5);
        let query = span(3, 8);
        assert!(leaf_consistent(Strategy::Overlaps, &leaf, &query));
        assert!(!leaf_consistent(Strategy::Contains, &leaf, &query));
    }
}
