//! An ordered set of disjoint, non-adjacent spans.

use std::fmt;

use crate::collections::span::Span;
use crate::errors::{Error, Result};

/// Invariant: for any two consecutive spans `s_i, s_{i+1}`, either
/// `s_i.hi < s_{i+1}.lo`, or they're equal and neither bound there is
/// inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanSet<T> {
    spans: Vec<Span<T>>,
}

impl<T: Clone + PartialOrd + fmt::Debug> SpanSet<T> {
    /// Builds a span set from spans in any order, merging overlapping or
    /// adjacent spans and sorting the result — this is the canonical
    /// normalization every set-algebra operator must return
    ///.
    pub fn new(mut spans: Vec<Span<T>>) -> Result<Self> {
        if spans.is_empty() {
            return Ok(Self { spans });
        }
        spans.sort_by(|a, b| a.partial_cmp(b).expect("span bounds must be comparable"));
        let mut merged: Vec<Span<T>> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if last.overlaps(&span) || last.adjacent(&span) => {
                    *last = last.union(&span).ok_or_else(|| {
                        Error::internal("overlapping or adjacent spans failed to union")
                    })?;
                }
                _ => merged.push(span),
            }
        }
        Ok(Self { spans: merged })
    }

    pub fn empty() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn spans(&self) -> &[Span<T>] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn lower(&self) -> Option<&T> {
        self.spans.first().map(|s| s.lower())
    }

    pub fn upper(&self) -> Option<&T> {
        self.spans.last().map(|s| s.upper())
    }

    pub fn contains_value(&self, value: &T) -> bool {
        self.spans.iter().any(|s| s.contains_value(value))
    }

    pub fn contains(&self, other: &Self) -> bool {
        other.spans.iter().all(|os| self.spans.iter().any(|s| s.contains(os)))
    }

    pub fn contained_by(&self, other: &Self) -> bool {
        other.contains(self)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.spans
            .iter()
            .any(|s| other.spans.iter().any(|os| s.overlaps(os)))
    }

    pub fn equals(&self, other: &Self) -> bool {
        self.spans.len() == other.spans.len()
            && self.spans.iter().zip(other.spans.iter()).all(|(a, b)| a.equals(b))
    }

    pub fn strictly_left(&self, other: &Self) -> bool {
        match (self.spans.last(), other.spans.first()) {
            (Some(a), Some(b)) => a.strictly_left(b),
            _ => false,
        }
    }

    pub fn strictly_right(&self, other: &Self) -> bool {
        other.strictly_left(self)
    }

    pub fn overlaps_or_left(&self, other: &Self) -> bool {
        match (self.spans.last(), other.spans.last()) {
            (Some(a), Some(b)) => a.overlaps_or_left(b),
            _ => false,
        }
    }

    pub fn overlaps_or_right(&self, other: &Self) -> bool {
        other.overlaps_or_left(self)
    }

    pub fn adjacent(&self, other: &Self) -> bool {
        match (self.spans.last(), other.spans.first()) {
            (Some(a), Some(b)) => a.adjacent(b),
            _ => false,
        }
    }

    /// Intersects two span sets, returning a new normalized span set (empty
    /// if disjoint).
    pub fn intersection(&self, other: &Self) -> Result<Self> {
        let mut out = Vec::new();
        for a in &self.spans {
            for b in &other.spans {
                if let Some(inter) = a.intersection(b) {
                    out.push(inter);
                }
            }
        }
        Self::new(out)
    }

    /// The union of two span sets.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let mut all = self.spans.clone();
        all.extend(other.spans.iter().cloned());
        Self::new(all)
    }

    /// Set difference `self - other`.
    pub fn minus(&self, other: &Self) -> Result<Self> {
        let mut remaining: Vec<Span<T>> = self.spans.clone();
        for cut in &other.spans {
            let mut next = Vec::with_capacity(remaining.len());
            for span in remaining {
                if !span.overlaps(cut) {
                    next.push(span);
                    continue;
                }
                // Left remainder
                if span.lower().partial_cmp(cut.lower()) == Some(std::cmp::Ordering::Less)
                    || (span.lower().partial_cmp(cut.lower()) == Some(std::cmp::Ordering::Equal)
                        && span.lower_inc()
                        && !cut.lower_inc())
                {
                    if let Ok(left) =
                        Span::new(span.lower().clone(), cut.lower().clone(), span.lower_inc(), !cut.lower_inc())
                    {
                        next.push(left);
                    }
                }
                // Right remainder
                if span.upper().partial_cmp(cut.upper()) == Some(std::cmp::Ordering::Greater)
                    || (span.upper().partial_cmp(cut.upper()) == Some(std::cmp::Ordering::Equal)
                        && span.upper_inc()
                        && !cut.upper_inc())
                {
                    if let Ok(right) =
                        Span::new(cut.upper().clone(), span.upper().clone(), !cut.upper_inc(), span.upper_inc())
                    {
                        next.push(right);
                    }
                }
            }
            remaining = next;
        }
        Self::new(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(lo: f64, hi: f64) -> Span<f64> {
        Span::new(lo, hi, true, false).unwrap()
    }

    #[test]
    fn construction_merges_overlapping_and_adjacent() {
        let set = SpanSet::new(vec![s(0.0, 5.0), s(5.0, 10.0), s(20.0, 25.0)]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn minus_splits_a_span_around_a_hole() {
        let whole = SpanSet::new(vec![s(0.0, 10.0)]).unwrap();
        let hole = SpanSet::new(vec![s(4.0, 6.0)]).unwrap();
        let result = whole.minus(&hole).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(*result.spans()[0].lower(), 0.0);
        assert_eq!(*result.spans()[1].upper(), 10.0);
    }

    #[test]
    fn at_and_minus_partition_the_domain() {
        let whole = SpanSet::new(vec![s(0.0, 10.0)]).unwrap();
        let cut = SpanSet::new(vec![s(3.0, 7.0)]).unwrap();
        let at = whole.intersection(&cut).unwrap();
        let minus = whole.minus(&cut).unwrap();
        let reunited = at.union(&minus).unwrap();
        assert!(reunited.equals(&whole));
    }
}
