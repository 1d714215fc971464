//! The `sequence set` subtype: a finite ordered list of continuous
//! sequences whose time spans are pairwise disjoint and non-adjacent.

use chrono::{DateTime, TimeDelta, Utc};

use crate::base::TemporalBase;
use crate::collections::span::{Span, SpanDistance};
use crate::errors::{Error, Result};
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::sequence::{RestrictMode, Side, TSequence};

#[derive(Debug, Clone, PartialEq)]
pub struct TSequenceSet<V: TemporalBase> {
    sequences: Vec<TSequence<V>>,
}

impl<V: TemporalBase> TSequenceSet<V> {
    /// Builds a sequence set from sequences sharing one interpretation,
    /// sorting them and merging any whose time-span endpoints touch and
    /// whose value at the join agrees.
    pub fn new(mut sequences: Vec<TSequence<V>>) -> Result<Self> {
        if sequences.is_empty() {
            return Err(Error::invalid_value(
                "a sequence set must have at least one sequence",
            ));
        }
        let interp = sequences[0].interpolation();
        if sequences.iter().any(|s| s.interpolation() != interp) {
            return Err(Error::invalid_value(
                "every sequence in a sequence set must share one interpretation",
            ));
        }
        sequences.sort_by(|a, b| {
            a.timespan()
                .partial_cmp(&b.timespan())
                .expect("timestamps are always comparable")
        });
        for pair in sequences.windows(2) {
            if pair[0].timespan().overlaps(&pair[1].timespan()) {
                return Err(Error::invalid_value(
                    "sequence set members must have pairwise disjoint time spans",
                ));
            }
        }
        let merged = merge_touching(sequences, interp)?;
        Ok(Self { sequences: merged })
    }

    pub fn sequences(&self) -> &[TSequence<V>] {
        &self.sequences
    }

    pub fn interpolation(&self) -> TInterpolation {
        self.sequences[0].interpolation()
    }

    pub fn num_instants(&self) -> usize {
        self.sequences.iter().map(|s| s.num_instants()).sum()
    }

    pub fn timespan(&self) -> Span<DateTime<Utc>> {
        let first = self.sequences.first().unwrap().timespan();
        let last = self.sequences.last().unwrap().timespan();
        first.hull(&last)
    }
}

/// Merges consecutive sequences whose time spans touch at an inclusive/
/// exclusive boundary and whose value at the join point agrees — this is
/// what keeps the set's invariant ("pairwise disjoint and non-adjacent")
/// after e.g. a restriction splits then reunites neighboring pieces.
fn merge_touching<V: TemporalBase>(
    sequences: Vec<TSequence<V>>,
    interp: TInterpolation,
) -> Result<Vec<TSequence<V>>> {
    let mut out: Vec<TSequence<V>> = Vec::with_capacity(sequences.len());
    for seq in sequences {
        let should_merge = match out.last() {
            Some(last) => {
                last.timespan().adjacent(&seq.timespan())
                    && last
                        .end_instant()
                        .value()
                        .approx_eq(seq.start_instant().value())
            }
            None => false,
        };
        if should_merge {
            let last = out.pop().unwrap();
            let mut instants: Vec<_> = last.instants().to_vec();
            instants.extend(seq.instants().iter().skip(1).cloned());
            let lower_inc = last.lower_inc();
            let upper_inc = seq.upper_inc();
            out.push(TSequence::new(instants, lower_inc, upper_inc, interp)?);
        } else {
            out.push(seq);
        }
    }
    Ok(out)
}

impl<V> TSequenceSet<V>
where
    V: TemporalBase,
    DateTime<Utc>: SpanDistance,
{
    /// Members are pairwise disjoint, or touch only where both abutting
    /// bounds are exclusive (so the touching instant belongs to neither),
    /// so at most one member ever contains `t` — `side` only matters
    /// *within* that member and is forwarded unchanged.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>, side: Side) -> Option<V> {
        let idx = self
            .sequences
            .binary_search_by(|seq| {
                if seq.timespan().contains_value(&t) {
                    std::cmp::Ordering::Equal
                } else if *seq.timespan().upper() < t {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Greater
                }
            })
            .ok()?;
        self.sequences[idx].value_at_timestamp(t, side)
    }

    pub fn restrict_span(&self, span: &Span<DateTime<Utc>>, mode: RestrictMode) -> Result<Option<Self>> {
        let mut out = Vec::new();
        for seq in &self.sequences {
            out.extend(seq.restrict_span(span, mode)?);
        }
        if out.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self::new(out)?))
        }
    }

    pub fn restrict_timestamp(&self, t: DateTime<Utc>, mode: RestrictMode) -> Result<Option<Self>> {
        self.restrict_span(&Span::point(t), mode)
    }

    /// Shifts and/or scales every member instant about the set's own time
    /// origin, so relative gaps between member sequences scale along with
    /// their durations.
    pub fn shift_scale_time(
        &self,
        shift: Option<TimeDelta>,
        scale: Option<TimeDelta>,
    ) -> Result<Self> {
        let origin_span = self.timespan();
        let origin = *origin_span.lower();
        let old_width = origin_span.duration();
        let new_width = scale.unwrap_or(old_width);
        let sequences = self
            .sequences
            .iter()
            .map(|seq| {
                let instants = seq
                    .instants()
                    .iter()
                    .map(|inst| inst.shift_scale_time(shift, Some((origin, old_width, new_width))))
                    .collect();
                TSequence::new(instants, seq.lower_inc(), seq.upper_inc(), seq.interpolation())
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::instant::TInstant;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, m, 0).unwrap()
    }

    fn seq(v0: f64, t0: DateTime<Utc>, v1: f64, t1: DateTime<Utc>) -> TSequence<f64> {
        TSequence::new(
            vec![TInstant::new(v0, t0), TInstant::new(v1, t1)],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn construction_rejects_overlapping_sequences() {
        let a = seq(0.0, t(0, 0), 1.0, t(1, 0));
        let b = seq(0.0, t(0, 30), 1.0, t(1, 30));
        assert!(TSequenceSet::new(vec![a, b]).is_err());
    }

    #[test]
    fn value_at_timestamp_dispatches_to_the_right_member() {
        let a = seq(0.0, t(0, 0), 1.0, t(1, 0));
        let b = seq(5.0, t(2, 0), 6.0, t(3, 0));
        let set = TSequenceSet::new(vec![b.clone(), a.clone()]).unwrap();
        assert_eq!(set.sequences().len(), 2);
        assert_eq!(set.value_at_timestamp(t(0, 0), Side::Right), Some(0.0));
        assert_eq!(set.value_at_timestamp(t(1, 30), Side::Right), None);
        assert_eq!(set.value_at_timestamp(t(2, 0), Side::Right), Some(5.0));
    }
}
