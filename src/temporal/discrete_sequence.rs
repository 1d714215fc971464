//! The `discrete sequence` subtype: a finite ordered set of distinct-
//! timestamp instants, defined only at the sampled instants.

use chrono::{DateTime, TimeDelta, Utc};

use crate::base::TemporalBase;
use crate::collections::span::Span;
use crate::errors::{Error, Result};
use crate::temporal::instant::TInstant;
use crate::temporal::sequence::{RestrictMode, Side};

#[derive(Debug, Clone, PartialEq)]
pub struct TDiscreteSequence<V: TemporalBase> {
    instants: Vec<TInstant<V>>,
}

impl<V: TemporalBase> TDiscreteSequence<V> {
    pub fn new(instants: Vec<TInstant<V>>) -> Result<Self> {
        if instants.is_empty() {
            return Err(Error::invalid_value(
                "a discrete sequence must have at least one instant",
            ));
        }
        for pair in instants.windows(2) {
            if pair[0].timestamp() >= pair[1].timestamp() {
                return Err(Error::invalid_value(
                    "discrete sequence instants must be strictly increasing in time",
                ));
            }
        }
        Ok(Self { instants })
    }

    pub fn instants(&self) -> &[TInstant<V>] {
        &self.instants
    }

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn start_instant(&self) -> &TInstant<V> {
        &self.instants[0]
    }

    pub fn end_instant(&self) -> &TInstant<V> {
        self.instants.last().expect("sequence is never empty")
    }

    pub fn instant_n(&self, n: usize) -> Option<&TInstant<V>> {
        self.instants.get(n)
    }

    pub fn timespan(&self) -> Span<DateTime<Utc>> {
        Span::new(
            self.start_instant().timestamp(),
            self.end_instant().timestamp(),
            true,
            true,
        )
        .expect("instant timestamps were already validated")
    }

    /// Defined only at the sampled instants, so there is nothing a `side`
    /// could disambiguate; accepted only for signature parity with the
    /// other three subtypes and ignored.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>, _side: Side) -> Option<V> {
        self.instants
            .binary_search_by(|inst| inst.timestamp().cmp(&t))
            .ok()
            .map(|i| self.instants[i].value().clone())
    }

    pub fn restrict_span(&self, span: &Span<DateTime<Utc>>, mode: RestrictMode) -> Result<Option<Self>> {
        let kept: Vec<TInstant<V>> = self
            .instants
            .iter()
            .filter(|inst| {
                let inside = span.contains_value(&inst.timestamp());
                match mode {
                    RestrictMode::At => inside,
                    RestrictMode::Minus => !inside,
                }
            })
            .cloned()
            .collect();
        if kept.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self::new(kept)?))
        }
    }

    pub fn restrict_timestamp(&self, t: DateTime<Utc>, mode: RestrictMode) -> Result<Option<Self>> {
        self.restrict_span(&Span::point(t), mode)
    }

    pub fn shift_scale_time(&self, shift: Option<TimeDelta>, scale: Option<TimeDelta>) -> Result<Self> {
        let origin = self.start_instant().timestamp();
        let old_width = self.end_instant().timestamp() - origin;
        let new_width = scale.unwrap_or(old_width);
        let instants = self
            .instants
            .iter()
            .map(|inst| inst.shift_scale_time(shift, Some((origin, old_width, new_width))))
            .collect();
        Self::new(instants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn value_at_timestamp_is_undefined_between_samples() {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + TimeDelta::hours(1);
        let seq = TDiscreteSequence::new(vec![
            TInstant::new(1_i64, t0),
            TInstant::new(2_i64, t1),
        ])
        .unwrap();
        assert_eq!(seq.value_at_timestamp(t0, Side::Right), Some(1));
        assert_eq!(seq.value_at_timestamp(t0 + TimeDelta::minutes(30), Side::Right), None);
    }
}
