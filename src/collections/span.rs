//! A one-dimensional interval over any ordered base type.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::errors::{Error, Result};

/// The rank used to break ties when two bound *values* are equal:
/// lexicographic on `(value, is_upper, is_inclusive)`, with the convention
/// that an exclusive lower bound is greater than an inclusive one at the
/// same value, and an exclusive upper bound is less than an inclusive one
/// at the same value.
///
/// This is the single source of truth for adjacency and containment —
/// every predicate in this module and in [`crate::index::gist`] is built
/// on it.
fn bound_rank(is_upper: bool, is_inclusive: bool) -> u8 {
    match (is_upper, is_inclusive) {
        (false, true) => 0,  // lower, inclusive
        (false, false) => 1, // lower, exclusive
        (true, false) => 2,  // upper, exclusive
        (true, true) => 3,   // upper, inclusive
    }
}

/// Compares two span bounds by `(value, is_upper, is_inclusive)`.
pub fn compare_bound<T: PartialOrd>(
    v1: &T,
    upper1: bool,
    inc1: bool,
    v2: &T,
    upper2: bool,
    inc2: bool,
) -> Option<Ordering> {
    match v1.partial_cmp(v2) {
        Some(Ordering::Equal) => Some(bound_rank(upper1, inc1).cmp(&bound_rank(upper2, inc2))),
        other => other,
    }
}

/// A span `[lo, hi)` with configurable bound inclusivity, over any ordered
/// base type.
///
/// Invariant: `lo <= hi`; if `lo == hi` both bounds must be inclusive (a
/// point span).
#[derive(Debug, Clone)]
pub struct Span<T> {
    lower: T,
    upper: T,
    lower_inc: bool,
    upper_inc: bool,
}

impl<T: Clone + PartialOrd + fmt::Debug> Span<T> {
    pub fn new(lower: T, upper: T, lower_inc: bool, upper_inc: bool) -> Result<Self> {
        match lower.partial_cmp(&upper) {
            Some(Ordering::Greater) => Err(Error::invalid_value(format!(
                "span lower bound {lower:?} is greater than upper bound {upper:?}"
            ))),
            Some(Ordering::Equal) if !(lower_inc && upper_inc) => Err(Error::invalid_value(
                "a point span (lower == upper) must have both bounds inclusive",
            )),
            None => Err(Error::invalid_value("span bounds are not comparable (NaN?)")),
            _ => Ok(Self {
                lower,
                upper,
                lower_inc,
                upper_inc,
            }),
        }
    }

    /// A degenerate span containing exactly `value`.
    pub fn point(value: T) -> Self {
        Self {
            lower: value.clone(),
            upper: value,
            lower_inc: true,
            upper_inc: true,
        }
    }

    pub fn lower(&self) -> &T {
        &self.lower
    }

    pub fn upper(&self) -> &T {
        &self.upper
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn is_point(&self) -> bool {
        self.lower.partial_cmp(&self.upper) == Some(Ordering::Equal)
    }

    fn lower_bound_cmp(&self) -> (u8, &T) {
        (bound_rank(false, self.lower_inc), &self.lower)
    }

    fn upper_bound_cmp(&self) -> (u8, &T) {
        (bound_rank(true, self.upper_inc), &self.upper)
    }

    pub fn contains_value(&self, value: &T) -> bool {
        let above_lower = match value.partial_cmp(&self.lower) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => self.lower_inc,
            _ => false,
        };
        let below_upper = match value.partial_cmp(&self.upper) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => self.upper_inc,
            _ => false,
        };
        above_lower && below_upper
    }

    /// `contains(self, other)`: every value of `other` is a value of `self`.
    pub fn contains(&self, other: &Self) -> bool {
        compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.lower,
            false,
            other.lower_inc,
        )
        .is_some_and(|o| o != Ordering::Greater)
            && compare_bound(
                &self.upper,
                true,
                self.upper_inc,
                &other.upper,
                true,
                other.upper_inc,
            )
            .is_some_and(|o| o != Ordering::Less)
    }

    pub fn contained_by(&self, other: &Self) -> bool {
        other.contains(self)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.upper,
            true,
            other.upper_inc,
        )
        .is_some_and(|o| o != Ordering::Greater)
            && compare_bound(
                &other.lower,
                false,
                other.lower_inc,
                &self.upper,
                true,
                self.upper_inc,
            )
            .is_some_and(|o| o != Ordering::Greater)
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.lower_bound_cmp() == other.lower_bound_cmp()
            && self.upper_bound_cmp() == other.upper_bound_cmp()
    }

    /// `self` is strictly to the left of `other`: `self`'s upper bound is
    /// below `other`'s lower bound with no touching.
    pub fn strictly_left(&self, other: &Self) -> bool {
        compare_bound(
            &self.upper,
            true,
            self.upper_inc,
            &other.lower,
            false,
            other.lower_inc,
        ) == Some(Ordering::Less)
    }

    pub fn overlaps_or_left(&self, other: &Self) -> bool {
        compare_bound(
            &self.upper,
            true,
            self.upper_inc,
            &other.upper,
            true,
            other.upper_inc,
        )
        .is_some_and(|o| o != Ordering::Greater)
    }

    pub fn strictly_right(&self, other: &Self) -> bool {
        other.strictly_left(self)
    }

    pub fn overlaps_or_right(&self, other: &Self) -> bool {
        other.overlaps_or_left(self)
    }

    /// Two spans are adjacent iff they are not overlapping and their
    /// touching bounds form a contiguous run: one's upper bound value
    /// equals the other's lower bound value, and together the two bounds
    /// cover every value (i.e. exactly one of the two touching bounds is
    /// inclusive).
    pub fn adjacent(&self, other: &Self) -> bool {
        let (left, right) = if self.strictly_left(other) {
            (self, other)
        } else if other.strictly_left(self) {
            (other, self)
        } else {
            return false;
        };
        left.upper.partial_cmp(&right.lower) == Some(Ordering::Equal)
            && (left.upper_inc != right.lower_inc)
    }

    /// The intersection of two spans, or `None` if they don't overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let (lower, lower_inc) = match compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.lower,
            false,
            other.lower_inc,
        ) {
            Some(Ordering::Less) => (other.lower.clone(), other.lower_inc),
            _ => (self.lower.clone(), self.lower_inc),
        };
        let (upper, upper_inc) = match compare_bound(
            &self.upper,
            true,
            self.upper_inc,
            &other.upper,
            true,
            other.upper_inc,
        ) {
            Some(Ordering::Greater) => (other.upper.clone(), other.upper_inc),
            _ => (self.upper.clone(), self.upper_inc),
        };
        Some(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// The union of two overlapping or adjacent spans. Returns `None` when
    /// the spans are disjoint and non-adjacent (the union would not be a
    /// single span).
    pub fn union(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) && !self.adjacent(other) {
            return None;
        }
        let (lower, lower_inc) = match compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.lower,
            false,
            other.lower_inc,
        ) {
            Some(Ordering::Greater) => (other.lower.clone(), other.lower_inc),
            _ => (self.lower.clone(), self.lower_inc),
        };
        let (upper, upper_inc) = match compare_bound(
            &self.upper,
            true,
            self.upper_inc,
            &other.upper,
            true,
            other.upper_inc,
        ) {
            Some(Ordering::Less) => (other.upper.clone(), other.upper_inc),
            _ => (self.upper.clone(), self.upper_inc),
        };
        Some(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// `self` with `other` cut out, as zero, one, or two remaining pieces.
    pub fn minus_pieces(&self, other: &Self) -> Vec<Self> {
        if !self.overlaps(other) {
            return vec![self.clone()];
        }
        let mut out = Vec::with_capacity(2);
        if compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.lower,
            false,
            other.lower_inc,
        ) == Some(Ordering::Less)
        {
            if let Ok(left) = Span::new(
                self.lower.clone(),
                other.lower.clone(),
                self.lower_inc,
                !other.lower_inc,
            ) {
                out.push(left);
            }
        }
        if compare_bound(
            &self.upper,
            true,
            self.upper_inc,
            &other.upper,
            true,
            other.upper_inc,
        ) == Some(Ordering::Greater)
        {
            if let Ok(right) = Span::new(
                other.upper.clone(),
                self.upper.clone(),
                !other.upper_inc,
                self.upper_inc,
            ) {
                out.push(right);
            }
        }
        out
    }
}

impl<T: Clone + PartialOrd + fmt::Debug> Span<T> {
    /// The minimal bounding span covering both `self` and `other`, used for
    /// bounding-box expansion (R-tree, sequence-set bbox cache) where the
    /// two inputs need not overlap or be adjacent — unlike
    /// [`Span::union`], this never fails.
    pub fn hull(&self, other: &Self) -> Self {
        let (lower, lower_inc) = match compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.lower,
            false,
            other.lower_inc,
        ) {
            Some(Ordering::Greater) => (other.lower.clone(), other.lower_inc),
            _ => (self.lower.clone(), self.lower_inc),
        };
        let (upper, upper_inc) = match compare_bound(
            &self.upper,
            true,
            self.upper_inc,
            &other.upper,
            true,
            other.upper_inc,
        ) {
            Some(Ordering::Less) => (other.upper.clone(), other.upper_inc),
            _ => (self.upper.clone(), self.upper_inc),
        };
        Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        }
    }
}

impl<T: Clone + PartialOrd + fmt::Debug> PartialEq for Span<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<T: Clone + PartialOrd + fmt::Debug> PartialOrd for Span<T> {
    /// "Spans form a total order by (lower bound, upper bound) with
    /// bound-inclusivity tie-breaks".
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match compare_bound(
            &self.lower,
            false,
            self.lower_inc,
            &other.lower,
            false,
            other.lower_inc,
        )? {
            Ordering::Equal => compare_bound(
                &self.upper,
                true,
                self.upper_inc,
                &other.upper,
                true,
                other.upper_inc,
            ),
            other_order => Some(other_order),
        }
    }
}

/// Types whose spans support a numeric gap/distance computation
/// ("Distance between spans ... is defined as
/// `max(0, gap)`").
pub trait SpanDistance: Clone + PartialOrd + fmt::Debug {
    fn gap_to(&self, other: &Self) -> f64;
}

impl SpanDistance for f64 {
    fn gap_to(&self, other: &Self) -> f64 {
        other - self
    }
}

impl SpanDistance for i32 {
    fn gap_to(&self, other: &Self) -> f64 {
        (*other - *self) as f64
    }
}

impl SpanDistance for i64 {
    fn gap_to(&self, other: &Self) -> f64 {
        (*other - *self) as f64
    }
}

impl SpanDistance for DateTime<Utc> {
    fn gap_to(&self, other: &Self) -> f64 {
        (*other - *self).num_milliseconds() as f64 / 1000.0
    }
}

impl<T: SpanDistance> Span<T> {
    pub fn distance_to_span(&self, other: &Self) -> f64 {
        if self.overlaps(other) {
            return 0.0;
        }
        let gap = if self.strictly_left(other) {
            self.upper.gap_to(&other.lower)
        } else {
            other.upper.gap_to(&self.lower)
        };
        gap.max(0.0)
    }

    pub fn distance_to_value(&self, value: &T) -> f64 {
        if self.contains_value(value) {
            return 0.0;
        }
        let gap = match value.partial_cmp(&self.lower) {
            Some(Ordering::Less) => value.gap_to(&self.lower),
            _ => self.upper.gap_to(value),
        };
        gap.max(0.0)
    }
}

impl Span<DateTime<Utc>> {
    pub fn duration(&self) -> TimeDelta {
        self.upper - self.lower
    }
}

impl Span<f64> {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Returns a new span shifted by `delta` and/or scaled so its width
    /// equals `width`.
    pub fn shift_scale(&self, delta: Option<f64>, width: Option<f64>) -> Result<Self> {
        let lower = self.lower + delta.unwrap_or(0.0);
        let span_width = width.unwrap_or_else(|| self.width());
        Span::new(lower, lower + span_width, self.lower_inc, self.upper_inc)
    }
}

impl Span<DateTime<Utc>> {
    pub fn shift_scale(&self, delta: Option<TimeDelta>, width: Option<TimeDelta>) -> Result<Self> {
        let lower = self.lower + delta.unwrap_or_default();
        let span_width = width.unwrap_or_else(|| self.duration());
        Span::new(lower, lower + span_width, self.lower_inc, self.upper_inc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(lo: f64, hi: f64, li: bool, ui: bool) -> Span<f64> {
        Span::new(lo, hi, li, ui).unwrap()
    }

    #[test]
    fn point_span_requires_both_bounds_inclusive() {
        assert!(Span::new(1.0, 1.0, true, false).is_err());
        assert!(Span::new(1.0, 1.0, true, true).is_ok());
    }

    #[test]
    fn contains_and_contained_by_are_duals() {
        let outer = s(0.0, 10.0, true, false);
        let inner = s(2.0, 5.0, true, true);
        assert!(outer.contains(&inner));
        assert!(inner.contained_by(&outer));
    }

    #[test]
    fn overlaps_is_symmetric() {
        let a = s(0.0, 5.0, true, false);
        let b = s(4.0, 8.0, true, false);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn adjacent_touching_exclusive_inclusive() {
        let a = s(0.0, 5.0, true, false);
        let b = s(5.0, 8.0, true, false);
        assert!(a.adjacent(&b));
        assert!(b.adjacent(&a));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn adjacent_is_incompatible_with_overlaps() {
        let a = s(0.0, 5.0, true, true);
        let b = s(5.0, 8.0, true, false);
        // Both bounds inclusive at the touch point: this is an overlap, not adjacency.
        assert!(a.overlaps(&b));
        assert!(!a.adjacent(&b));
    }

    #[test]
    fn strictly_left_right_are_duals() {
        let a = s(0.0, 5.0, true, false);
        let b = s(6.0, 8.0, true, false);
        assert!(a.strictly_left(&b));
        assert!(b.strictly_right(&a));
    }
}
