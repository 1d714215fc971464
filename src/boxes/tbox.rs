//! The value x time bounding box used for temporal numbers.

use chrono::{DateTime, Utc};

use crate::collections::span::Span;
use crate::errors::{Error, Result};

/// A value-span (optional) and a time-span (optional); at least one must be
/// present.
#[derive(Debug, Clone, PartialEq)]
pub struct TBox {
    value_span: Option<Span<f64>>,
    time_span: Option<Span<DateTime<Utc>>>,
}

impl TBox {
    pub fn new(value_span: Option<Span<f64>>, time_span: Option<Span<DateTime<Utc>>>) -> Result<Self> {
        if value_span.is_none() && time_span.is_none() {
            return Err(Error::invalid_value(
                "a TBOX must have a value span, a time span, or both",
            ));
        }
        Ok(Self {
            value_span,
            time_span,
        })
    }

    pub fn from_value(span: Span<f64>) -> Self {
        Self {
            value_span: Some(span),
            time_span: None,
        }
    }

    pub fn from_time(span: Span<DateTime<Utc>>) -> Self {
        Self {
            value_span: None,
            time_span: Some(span),
        }
    }

    pub fn value_span(&self) -> Option<&Span<f64>> {
        self.value_span.as_ref()
    }

    pub fn time_span(&self) -> Option<&Span<DateTime<Utc>>> {
        self.time_span.as_ref()
    }

    /// Expands `self` in place so it also contains `other` (used by the
    /// R-tree's box-union bookkeeping and by sequence-set bbox caching).
    pub fn expand(&mut self, other: &Self) -> Result<()> {
        self.value_span = match (self.value_span.take(), &other.value_span) {
            (Some(a), Some(b)) => Some(a.hull(b)),
            (a, None) => a,
            (None, b) => b.clone(),
        };
        self.time_span = match (self.time_span.take(), &other.time_span) {
            (Some(a), Some(b)) => Some(a.hull(b)),
            (a, None) => a,
            (None, b) => b.clone(),
        };
        Ok(())
    }

    pub fn contains(&self, other: &Self) -> bool {
        dim_contains(&self.value_span, &other.value_span)
            && dim_contains(&self.time_span, &other.time_span)
    }

    pub fn contained_by(&self, other: &Self) -> bool {
        other.contains(self)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        dim_overlaps(&self.value_span, &other.value_span)
            && dim_overlaps(&self.time_span, &other.time_span)
    }

    pub fn equals(&self, other: &Self) -> bool {
        opt_span_eq(&self.value_span, &other.value_span)
            && opt_span_eq(&self.time_span, &other.time_span)
    }

    pub fn adjacent(&self, other: &Self) -> bool {
        !self.overlaps(other)
            && (dim_adjacent(&self.value_span, &other.value_span)
                && dim_overlaps_or_touches(&self.time_span, &other.time_span)
                || dim_adjacent(&self.time_span, &other.time_span)
                    && dim_overlaps_or_touches(&self.value_span, &other.value_span))
    }

    pub fn strictly_left(&self, other: &Self) -> bool {
        dim_strictly_left(&self.value_span, &other.value_span)
    }

    pub fn overlaps_or_left(&self, other: &Self) -> bool {
        dim_overlaps_or_left(&self.value_span, &other.value_span)
    }

    pub fn strictly_right(&self, other: &Self) -> bool {
        other.strictly_left(self)
    }

    pub fn overlaps_or_right(&self, other: &Self) -> bool {
        other.overlaps_or_left(self)
    }

    pub fn strictly_before(&self, other: &Self) -> bool {
        dim_strictly_left(&self.time_span, &other.time_span)
    }

    pub fn overlaps_or_before(&self, other: &Self) -> bool {
        dim_overlaps_or_left(&self.time_span, &other.time_span)
    }

    pub fn strictly_after(&self, other: &Self) -> bool {
        other.strictly_before(self)
    }

    pub fn overlaps_or_after(&self, other: &Self) -> bool {
        other.overlaps_or_before(self)
    }
}

fn dim_contains<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.contains(b),
        (None, None) => true,
        (Some(_), None) => true,
        (None, Some(_)) => false,
    }
}

fn dim_overlaps<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => true,
    }
}

fn dim_overlaps_or_touches<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b) || a.adjacent(b),
        _ => true,
    }
}

fn dim_adjacent<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.adjacent(b),
        _ => false,
    }
}

fn dim_strictly_left<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.strictly_left(b),
        _ => false,
    }
}

fn dim_overlaps_or_left<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps_or_left(b),
        _ => false,
    }
}

fn opt_span_eq<T: Clone + PartialOrd + std::fmt::Debug>(
    a: &Option<Span<T>>,
    b: &Option<Span<T>>,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.equals(b),
        (None, None) => true,
        _ => false,
    }
}
