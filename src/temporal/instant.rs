//! The `instant` subtype: exactly one `(value, timestamp)` sample.

use chrono::{DateTime, TimeDelta, Utc};

use crate::base::TemporalBase;
use crate::collections::span::{Span, SpanDistance};
use crate::errors::Result;
use crate::temporal::sequence::Side;

#[derive(Debug, Clone, PartialEq)]
pub struct TInstant<V: TemporalBase> {
    value: V,
    timestamp: DateTime<Utc>,
}

impl<V: TemporalBase> TInstant<V> {
    pub fn new(value: V, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timespan(&self) -> Span<DateTime<Utc>> {
        Span::point(self.timestamp)
    }

    pub fn shift_scale_time(&self, shift: Option<TimeDelta>, scale_origin: Option<(DateTime<Utc>, TimeDelta, TimeDelta)>) -> Self {
        let mut t = self.timestamp;
        if let Some(d) = shift {
            t += d;
        }
        if let Some((origin, old_width, new_width)) = scale_origin {
            let old_ms = old_width.num_milliseconds().max(1) as f64;
            let new_ms = new_width.num_milliseconds() as f64;
            let offset_ms = (t - origin).num_milliseconds() as f64;
            let scaled_ms = (offset_ms * new_ms / old_ms).round() as i64;
            t = origin + TimeDelta::milliseconds(scaled_ms);
        }
        Self {
            value: self.value.clone(),
            timestamp: t,
        }
    }
}

impl<V> TInstant<V>
where
    V: TemporalBase,
    DateTime<Utc>: SpanDistance,
{
    /// An instant has no second sample to disambiguate a side against, so
    /// `side` is accepted only for signature parity with the other three
    /// subtypes and ignored.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>, _side: Side) -> Option<V> {
        if t == self.timestamp {
            Some(self.value.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn value_at_timestamp_only_matches_the_sample() {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let inst = TInstant::new(1.0_f64, t0);
        assert_eq!(inst.value_at_timestamp(t0, Side::Right), Some(1.0));
        assert_eq!(inst.value_at_timestamp(t0 + TimeDelta::seconds(1), Side::Right), None);
    }
}
