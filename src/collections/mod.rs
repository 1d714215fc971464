//! `span`: the one-dimensional interval type and its set algebra
//!.

pub mod span;
pub mod span_set;

pub use span::Span;
pub use span_set::SpanSet;

use chrono::{DateTime, Utc};

/// The span type used for time domains throughout the crate (MobilityDB's
/// `tstzspan`).
pub type TsTzSpan = Span<DateTime<Utc>>;
/// A set of disjoint, non-adjacent time spans (MobilityDB's `tstzspanset`).
pub type TsTzSpanSet = SpanSet<DateTime<Utc>>;
