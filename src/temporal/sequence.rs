//! The `continuous sequence` subtype: an ordered instant list plus a time
//! span, filled in between samples under step or linear interpretation.

use chrono::{DateTime, TimeDelta, Utc};

use crate::base::TemporalBase;
use crate::collections::span::{Span, SpanDistance};
use crate::errors::{Error, Result};
use crate::temporal::instant::TInstant;
use crate::temporal::interpolation::TInterpolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictMode {
    At,
    Minus,
}

/// Which side of an exact sample timestamp `value_at_timestamp` evaluates.
///
/// A probe `t` that lands exactly on a recorded instant `t_i` is unambiguous
/// almost everywhere: `Right` (the default the crate used before this type
/// existed) returns `v_i` itself, which is correct for every interpolation
/// and for every caller that isn't synthesizing a restriction boundary.
/// `Left` only differs under step interpolation, where a sample can be the
/// site of a jump: it returns the value the step held just *before* `t_i`
/// (`v_{i-1}`) rather than the value the step jumps to at `t_i`. This is
/// what `restrict_to_subspan` needs when a cut falls exactly on a sample
/// that is then excluded from the piece being built — the piece's trailing
/// edge must carry the value it approached with, not the value on the far
/// side of the excluded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TSequence<V: TemporalBase> {
    instants: Vec<TInstant<V>>,
    lower_inc: bool,
    upper_inc: bool,
    interpolation: TInterpolation,
}

impl<V: TemporalBase> TSequence<V> {
    /// Builds a sequence from a strictly time-monotonic instant list.
    ///
    /// Linear interpolation is only admissible for base types whose value
    /// space is continuous; an instantaneous sequence (single sample) must
    /// have both bounds inclusive.
    pub fn new(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interpolation: TInterpolation,
    ) -> Result<Self> {
        if instants.is_empty() {
            return Err(Error::invalid_value(
                "a sequence must have at least one instant",
            ));
        }
        if interpolation == TInterpolation::Discrete {
            return Err(Error::invalid_value(
                "a continuous sequence cannot use discrete interpolation",
            ));
        }
        if interpolation == TInterpolation::Linear && !V::CONTINUOUS {
            return Err(Error::invalid_value(
                "linear interpolation is not admissible for this base type",
            ));
        }
        for pair in instants.windows(2) {
            if pair[0].timestamp() >= pair[1].timestamp() {
                return Err(Error::invalid_value(
                    "sequence instants must be strictly increasing in time",
                ));
            }
        }
        if instants.len() == 1 && !(lower_inc && upper_inc) {
            return Err(Error::invalid_value(
                "an instantaneous sequence must have both bounds inclusive",
            ));
        }
        let mut seq = Self {
            instants,
            lower_inc,
            upper_inc,
            interpolation,
        };
        seq.normalize();
        Ok(seq)
    }

    pub fn instants(&self) -> &[TInstant<V>] {
        &self.instants
    }

    pub fn interpolation(&self) -> TInterpolation {
        self.interpolation
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
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
            self.lower_inc,
            self.upper_inc,
        )
        .expect("instant timestamps were already validated")
    }

    pub fn is_instantaneous(&self) -> bool {
        self.instants.len() == 1
    }

    /// A single left-to-right pass dropping interior instants whose two
    /// surrounding segments extend the value identically.
    pub fn normalize(&mut self) {
        if self.instants.len() < 3 {
            return;
        }
        let mut out = Vec::with_capacity(self.instants.len());
        out.push(self.instants[0].clone());
        for i in 1..self.instants.len() - 1 {
            let prev = &self.instants[i - 1];
            let cur = &self.instants[i];
            let next = &self.instants[i + 1];
            let redundant = match self.interpolation {
                TInterpolation::Step => prev.value().approx_eq(cur.value()),
                TInterpolation::Linear => {
                    let fraction = (cur.timestamp() - prev.timestamp()).num_milliseconds() as f64
                        / (next.timestamp() - prev.timestamp()).num_milliseconds() as f64;
                    let expected = V::interpolate(prev.value(), next.value(), fraction);
                    expected.approx_eq(cur.value())
                }
                TInterpolation::Discrete => false,
            };
            if !redundant {
                out.push(cur.clone());
            }
        }
        out.push(self.instants.last().unwrap().clone());
        self.instants = out;
    }
}

impl<V> TSequence<V>
where
    V: TemporalBase,
    DateTime<Utc>: SpanDistance,
{
    /// Locates the largest index `i` with `timestamp(i) <= t`, or `None` if
    /// `t` precedes the first instant.
    fn floor_index(&self, t: DateTime<Utc>) -> Option<usize> {
        match self.instants.binary_search_by(|inst| inst.timestamp().cmp(&t)) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    pub fn value_at_timestamp(&self, t: DateTime<Utc>, side: Side) -> Option<V> {
        if !self.timespan().contains_value(&t) {
            return None;
        }
        let i = self.floor_index(t)?;
        let inst = &self.instants[i];
        if inst.timestamp() == t {
            if side == Side::Left && i > 0 && self.interpolation == TInterpolation::Step {
                return Some(self.instants[i - 1].value().clone());
            }
            return Some(inst.value().clone());
        }
        match self.interpolation {
            TInterpolation::Discrete => None,
            TInterpolation::Step => Some(inst.value().clone()),
            TInterpolation::Linear => {
                let next = self.instants.get(i + 1)?;
                let fraction = (t - inst.timestamp()).num_milliseconds() as f64
                    / (next.timestamp() - inst.timestamp()).num_milliseconds() as f64;
                Some(V::interpolate(inst.value(), next.value(), fraction))
            }
        }
    }

    /// Truncates the sequence to a subspan of its own time domain,
    /// synthesizing boundary instants at cut points that fall strictly
    /// between two samples.
    fn restrict_to_subspan(&self, sub: &Span<DateTime<Utc>>) -> Result<Option<Self>> {
        let lower = *sub.lower();
        let upper = *sub.upper();
        let mut instants: Vec<TInstant<V>> = self
            .instants
            .iter()
            .filter(|inst| sub.contains_value(&inst.timestamp()))
            .cloned()
            .collect();

        if instants.first().map(|i| i.timestamp()) != Some(lower) {
            if let Some(v) = self.value_at_timestamp(lower, Side::Right) {
                instants.insert(0, TInstant::new(v, lower));
            }
        }
        if instants.last().map(|i| i.timestamp()) != Some(upper) {
            // The piece being built ends at `upper`; its trailing value is
            // the one approached from inside the piece, not the value a
            // step sample jumps to exactly at `upper` (which belongs to the
            // next piece, if `upper` is itself an excluded sample).
            if let Some(v) = self.value_at_timestamp(upper, Side::Left) {
                instants.push(TInstant::new(v, upper));
            }
        }
        if instants.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(
            instants,
            sub.lower_inc(),
            sub.upper_inc(),
            self.interpolation,
        )?))
    }

    /// Restricts the sequence to a single time span, returning the (zero,
    /// one, or — for MINUS with the span fully inside the domain — two)
    /// resulting pieces.
    pub fn restrict_span(&self, span: &Span<DateTime<Utc>>, mode: RestrictMode) -> Result<Vec<Self>> {
        let dom = self.timespan();
        match mode {
            RestrictMode::At => match dom.intersection(span) {
                Some(sub) => Ok(self.restrict_to_subspan(&sub)?.into_iter().collect()),
                None => Ok(vec![]),
            },
            RestrictMode::Minus => {
                let mut out = Vec::new();
                for piece in dom.minus_pieces(span) {
                    if let Some(seq) = self.restrict_to_subspan(&piece)? {
                        out.push(seq);
                    }
                }
                Ok(out)
            }
        }
    }

    pub fn restrict_timestamp(&self, t: DateTime<Utc>, mode: RestrictMode) -> Result<Vec<Self>> {
        self.restrict_span(&Span::point(t), mode)
    }

    pub fn shift_scale_time(
        &self,
        shift: Option<TimeDelta>,
        scale: Option<TimeDelta>,
    ) -> Result<Self> {
        let origin = self.start_instant().timestamp();
        let old_width = self.timespan().duration();
        let new_width = scale.unwrap_or(old_width);
        let instants = self
            .instants
            .iter()
            .map(|inst| inst.shift_scale_time(shift, Some((origin, old_width, new_width))))
            .collect();
        Self::new(instants, self.lower_inc, self.upper_inc, self.interpolation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn normalization_drops_redundant_step_instant() {
        let seq = TSequence::new(
            vec![
                TInstant::new(1_i64, t(0, 0)),
                TInstant::new(1_i64, t(0, 1)),
                TInstant::new(1_i64, t(0, 2)),
            ],
            true,
            true,
            TInterpolation::Step,
        )
        .unwrap();
        assert_eq!(seq.num_instants(), 2);
        assert_eq!(seq.start_instant().timestamp(), t(0, 0));
        assert_eq!(seq.end_instant().timestamp(), t(0, 2));
    }

    #[test]
    fn linear_restriction_interpolates_boundary_instants() {
        let seq = TSequence::new(
            vec![
                TInstant::new(0.0_f64, t(12, 0)),
                TInstant::new(10.0_f64, t(13, 0)),
            ],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let span = Span::new(t(12, 30), t(12, 45), true, true).unwrap();
        let pieces = seq.restrict_span(&span, RestrictMode::At).unwrap();
        assert_eq!(pieces.len(), 1);
        let piece = &pieces[0];
        assert_eq!(piece.num_instants(), 2);
        assert!((*piece.instant_n(0).unwrap().value() - 5.0).abs() < 1e-9);
        assert!((*piece.instant_n(1).unwrap().value() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn minus_splits_a_linear_sequence_around_a_hole() {
        let seq = TSequence::new(
            vec![
                TInstant::new(0.0_f64, t(0, 0)),
                TInstant::new(10.0_f64, t(0, 10)),
            ],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let hole = Span::new(t(0, 4), t(0, 6), true, true).unwrap();
        let pieces = seq.restrict_span(&hole, RestrictMode::Minus).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].end_instant().timestamp(), t(0, 4));
        assert_eq!(pieces[1].start_instant().timestamp(), t(0, 6));
    }
}
