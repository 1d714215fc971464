//! The temporal value: the heart of the model. A value whose base value is
//! a function of time, in one of four subtypes sharing a common public
//! contract (constructors, accessors, value-at-time, restriction,
//! iteration).

use chrono::{DateTime, TimeDelta, Utc};

use crate::base::{BboxContribution, TemporalBase};
use crate::boxes::{STBox, TBox};
use crate::collections::span::Span;
use crate::collections::span_set::SpanSet;
use crate::errors::{Error, Result};
use crate::temporal::discrete_sequence::TDiscreteSequence;
use crate::temporal::instant::TInstant;
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::sequence::{RestrictMode, Side, TSequence};
use crate::temporal::sequence_set::TSequenceSet;

/// The cached bounding box of a temporal value, computed at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalBbox {
    /// A base type with no spatial or numeric extent: only the time
    /// dimension bounds the value.
    Time(Span<DateTime<Utc>>),
    /// A temporal number.
    Value(TBox),
    /// A temporal point or pose.
    Spatial(STBox),
}

fn compute_bbox<'a, V: TemporalBase + 'a>(
    values: impl Iterator<Item = &'a V>,
    time_span: Span<DateTime<Utc>>,
) -> Result<TemporalBbox> {
    let mut numeric: Option<(f64, f64)> = None;
    let mut spatial: Option<(f64, f64, f64, f64, Option<f64>, Option<f64>)> = None;
    for v in values {
        match v.bbox_contribution() {
            BboxContribution::None => {}
            BboxContribution::Numeric(x) => {
                numeric = Some(match numeric {
                    None => (x, x),
                    Some((lo, hi)) => (lo.min(x), hi.max(x)),
                });
            }
            BboxContribution::Spatial { x, y, z } => {
                spatial = Some(match spatial {
                    None => (x, x, y, y, z, z),
                    Some((xlo, xhi, ylo, yhi, zlo, zhi)) => (
                        xlo.min(x),
                        xhi.max(x),
                        ylo.min(y),
                        yhi.max(y),
                        merge_opt(zlo, z, f64::min),
                        merge_opt(zhi, z, f64::max),
                    ),
                });
            }
        }
    }
    if let Some((xlo, xhi, ylo, yhi, zlo, zhi)) = spatial {
        let mut bbox = STBox::new_xy(xlo, ylo, xhi, yhi, Some(time_span), 0, false)?;
        if let (Some(zlo), Some(zhi)) = (zlo, zhi) {
            bbox = bbox.with_z(zlo, zhi)?;
        }
        return Ok(TemporalBbox::Spatial(bbox));
    }
    if let Some((lo, hi)) = numeric {
        let value_span = Span::new(lo, hi, true, true)?;
        return Ok(TemporalBbox::Value(TBox::new(Some(value_span), Some(time_span))?));
    }
    Ok(TemporalBbox::Time(time_span))
}

fn merge_opt(a: Option<f64>, b: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Which of the four temporal subtypes a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalShape {
    Instant,
    Discrete,
    Sequence,
    SequenceSet,
}

#[derive(Debug, Clone, PartialEq)]
enum TemporalKind<V: TemporalBase> {
    Instant(TInstant<V>),
    Discrete(TDiscreteSequence<V>),
    Sequence(TSequence<V>),
    SequenceSet(TSequenceSet<V>),
}

/// A value whose base value is a function of time, in one of four
/// subtypes (instant, discrete sequence, continuous sequence, sequence
/// set).
#[derive(Debug, Clone, PartialEq)]
pub struct Temporal<V: TemporalBase> {
    kind: TemporalKind<V>,
    bbox: TemporalBbox,
}

impl<V: TemporalBase> Temporal<V> {
    pub fn instant(value: V, timestamp: DateTime<Utc>) -> Result<Self> {
        let bbox = compute_bbox(std::iter::once(&value), Span::point(timestamp))?;
        Ok(Self {
            kind: TemporalKind::Instant(TInstant::new(value, timestamp)),
            bbox,
        })
    }

    pub fn discrete_sequence(instants: Vec<TInstant<V>>) -> Result<Self> {
        let seq = TDiscreteSequence::new(instants)?;
        let bbox = compute_bbox(seq.instants().iter().map(|i| i.value()), seq.timespan())?;
        Ok(Self {
            kind: TemporalKind::Discrete(seq),
            bbox,
        })
    }

    pub fn sequence(
        instants: Vec<TInstant<V>>,
        lower_inc: bool,
        upper_inc: bool,
        interpolation: TInterpolation,
    ) -> Result<Self> {
        let seq = TSequence::new(instants, lower_inc, upper_inc, interpolation)?;
        let bbox = compute_bbox(seq.instants().iter().map(|i| i.value()), seq.timespan())?;
        Ok(Self {
            kind: TemporalKind::Sequence(seq),
            bbox,
        })
    }

    pub fn sequence_set(sequences: Vec<TSequence<V>>) -> Result<Self> {
        let set = TSequenceSet::new(sequences)?;
        let bbox = compute_bbox(
            set.sequences().iter().flat_map(|s| s.instants().iter().map(|i| i.value())),
            set.timespan(),
        )?;
        Ok(Self {
            kind: TemporalKind::SequenceSet(set),
            bbox,
        })
    }

    fn from_sequence_pieces(pieces: Vec<TSequence<V>>) -> Result<Option<Self>> {
        match pieces.len() {
            0 => Ok(None),
            1 => {
                let seq = pieces.into_iter().next().unwrap();
                Ok(Some(Self::sequence(
                    seq.instants().to_vec(),
                    seq.lower_inc(),
                    seq.upper_inc(),
                    seq.interpolation(),
                )?))
            }
            _ => Ok(Some(Self::sequence_set(pieces)?)),
        }
    }

    pub fn bbox(&self) -> &TemporalBbox {
        &self.bbox
    }

    /// Which of the four subtypes this value is — the introspection MF-JSON
    /// emission needs to pick the right output shape.
    pub fn shape(&self) -> TemporalShape {
        match &self.kind {
            TemporalKind::Instant(_) => TemporalShape::Instant,
            TemporalKind::Discrete(_) => TemporalShape::Discrete,
            TemporalKind::Sequence(_) => TemporalShape::Sequence,
            TemporalKind::SequenceSet(_) => TemporalShape::SequenceSet,
        }
    }

    /// The member sequences of a sequence set, each rewrapped as its own
    /// `Temporal`; `None` for any other shape.
    pub fn sequence_members(&self) -> Option<Vec<Self>> {
        match &self.kind {
            TemporalKind::SequenceSet(set) => Some(
                set.sequences()
                    .iter()
                    .map(|s| {
                        Self::sequence(s.instants().to_vec(), s.lower_inc(), s.upper_inc(), s.interpolation())
                            .expect("member sequence was already valid")
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Whether the lower bound of the time domain is included. Always true
    /// for an instant/discrete sequence (a set of isolated points has no
    /// exclusive endpoint to speak of).
    pub fn lower_inc(&self) -> bool {
        match &self.kind {
            TemporalKind::Instant(_) | TemporalKind::Discrete(_) => true,
            TemporalKind::Sequence(s) => s.lower_inc(),
            TemporalKind::SequenceSet(set) => set.sequences()[0].lower_inc(),
        }
    }

    pub fn upper_inc(&self) -> bool {
        match &self.kind {
            TemporalKind::Instant(_) | TemporalKind::Discrete(_) => true,
            TemporalKind::Sequence(s) => s.upper_inc(),
            TemporalKind::SequenceSet(set) => set.sequences().last().unwrap().upper_inc(),
        }
    }

    pub fn interpolation(&self) -> TInterpolation {
        match &self.kind {
            TemporalKind::Instant(_) => TInterpolation::Step,
            TemporalKind::Discrete(_) => TInterpolation::Discrete,
            TemporalKind::Sequence(s) => s.interpolation(),
            TemporalKind::SequenceSet(s) => s.interpolation(),
        }
    }

    pub fn instants(&self) -> Vec<TInstant<V>> {
        match &self.kind {
            TemporalKind::Instant(i) => vec![i.clone()],
            TemporalKind::Discrete(d) => d.instants().to_vec(),
            TemporalKind::Sequence(s) => s.instants().to_vec(),
            TemporalKind::SequenceSet(s) => {
                s.sequences().iter().flat_map(|seq| seq.instants().to_vec()).collect()
            }
        }
    }

    pub fn num_instants(&self) -> usize {
        match &self.kind {
            TemporalKind::Instant(_) => 1,
            TemporalKind::Discrete(d) => d.num_instants(),
            TemporalKind::Sequence(s) => s.num_instants(),
            TemporalKind::SequenceSet(s) => s.num_instants(),
        }
    }

    pub fn start_instant(&self) -> TInstant<V> {
        match &self.kind {
            TemporalKind::Instant(i) => i.clone(),
            TemporalKind::Discrete(d) => d.start_instant().clone(),
            TemporalKind::Sequence(s) => s.start_instant().clone(),
            TemporalKind::SequenceSet(s) => s.sequences()[0].start_instant().clone(),
        }
    }

    pub fn end_instant(&self) -> TInstant<V> {
        match &self.kind {
            TemporalKind::Instant(i) => i.clone(),
            TemporalKind::Discrete(d) => d.end_instant().clone(),
            TemporalKind::Sequence(s) => s.end_instant().clone(),
            TemporalKind::SequenceSet(s) => s.sequences().last().unwrap().end_instant().clone(),
        }
    }

    pub fn instant_n(&self, n: usize) -> Option<TInstant<V>> {
        self.instants().get(n).cloned()
    }

    pub fn num_timestamps(&self) -> usize {
        self.num_instants()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.instants().iter().map(|i| i.timestamp()).collect()
    }

    pub fn start_timestamp(&self) -> DateTime<Utc> {
        self.start_instant().timestamp()
    }

    pub fn end_timestamp(&self) -> DateTime<Utc> {
        self.end_instant().timestamp()
    }

    pub fn timestamp_n(&self, n: usize) -> Option<DateTime<Utc>> {
        self.instant_n(n).map(|i| i.timestamp())
    }

    /// The time span on which the value is defined, as a span set (a
    /// single span for a continuous sequence, one span per member of a
    /// sequence set, and point spans for instant/discrete subtypes).
    pub fn time(&self) -> Result<SpanSet<DateTime<Utc>>> {
        match &self.kind {
            TemporalKind::Instant(i) => SpanSet::new(vec![Span::point(i.timestamp())]),
            TemporalKind::Discrete(d) => {
                SpanSet::new(d.instants().iter().map(|i| Span::point(i.timestamp())).collect())
            }
            TemporalKind::Sequence(s) => SpanSet::new(vec![s.timespan()]),
            TemporalKind::SequenceSet(s) => {
                SpanSet::new(s.sequences().iter().map(|seq| seq.timespan()).collect())
            }
        }
    }

    pub fn timespan(&self) -> Span<DateTime<Utc>> {
        match &self.kind {
            TemporalKind::Instant(i) => i.timespan(),
            TemporalKind::Discrete(d) => d.timespan(),
            TemporalKind::Sequence(s) => s.timespan(),
            TemporalKind::SequenceSet(s) => s.timespan(),
        }
    }

    /// Total duration of the value's time domain. When `ignore_gaps` is
    /// true, sums each segment's own duration instead of spanning start to
    /// end (relevant only to sequence sets, which may have gaps).
    pub fn duration(&self, ignore_gaps: bool) -> TimeDelta {
        match &self.kind {
            TemporalKind::Instant(_) | TemporalKind::Discrete(_) => TimeDelta::zero(),
            TemporalKind::Sequence(s) => s.timespan().duration(),
            TemporalKind::SequenceSet(s) => {
                if ignore_gaps {
                    s.sequences().iter().map(|seq| seq.timespan().duration()).sum()
                } else {
                    s.timespan().duration()
                }
            }
        }
    }

    pub fn segments(&self) -> Vec<TSequence<V>> {
        match &self.kind {
            TemporalKind::Instant(i) => {
                vec![TSequence::new(vec![i.clone()], true, true, TInterpolation::Step)
                    .expect("single-instant sequence is always valid")]
            }
            TemporalKind::Discrete(d) => d
                .instants()
                .iter()
                .map(|i| {
                    TSequence::new(vec![i.clone()], true, true, TInterpolation::Step)
                        .expect("single-instant sequence is always valid")
                })
                .collect(),
            TemporalKind::Sequence(s) => {
                if s.is_instantaneous() {
                    return vec![s.clone()];
                }
                s.instants()
                    .windows(2)
                    .map(|pair| {
                        TSequence::new(pair.to_vec(), true, true, s.interpolation())
                            .expect("adjacent instants form a valid sequence")
                    })
                    .collect()
            }
            TemporalKind::SequenceSet(set) => {
                set.sequences().iter().flat_map(|s| {
                    if s.is_instantaneous() {
                        vec![s.clone()]
                    } else {
                        s.instants()
                            .windows(2)
                            .map(|pair| {
                                TSequence::new(pair.to_vec(), true, true, s.interpolation())
                                    .expect("adjacent instants form a valid sequence")
                            })
                            .collect()
                    }
                }).collect()
            }
        }
    }

    /// `side` selects which limit to return when `t` coincides exactly with
    /// a recorded instant that is also a step discontinuity — only matters
    /// when synthesizing a restriction boundary; pass [`Side::Right`] for
    /// an ordinary point query.
    pub fn value_at_timestamp(&self, t: DateTime<Utc>, side: Side) -> Option<V> {
        match &self.kind {
            TemporalKind::Instant(i) => i.value_at_timestamp(t, side),
            TemporalKind::Discrete(d) => d.value_at_timestamp(t, side),
            TemporalKind::Sequence(s) => s.value_at_timestamp(t, side),
            TemporalKind::SequenceSet(s) => s.value_at_timestamp(t, side),
        }
    }

    pub fn set_interpolation(&self, interp: TInterpolation) -> Result<Self> {
        match &self.kind {
            TemporalKind::Instant(i) => {
                if interp == TInterpolation::Discrete {
                    Self::discrete_sequence(vec![i.clone()])
                } else {
                    Self::sequence(vec![i.clone()], true, true, interp)
                }
            }
            TemporalKind::Discrete(d) => {
                if interp == TInterpolation::Discrete {
                    Ok(self.clone())
                } else {
                    Self::sequence(d.instants().to_vec(), true, true, interp)
                }
            }
            TemporalKind::Sequence(s) => {
                if interp == s.interpolation() {
                    Ok(self.clone())
                } else if interp == TInterpolation::Discrete {
                    Self::discrete_sequence(s.instants().to_vec())
                } else {
                    Self::sequence(s.instants().to_vec(), s.lower_inc(), s.upper_inc(), interp)
                }
            }
            TemporalKind::SequenceSet(set) => {
                if interp == TInterpolation::Discrete {
                    Self::discrete_sequence(self.instants())
                } else {
                    let sequences = set
                        .sequences()
                        .iter()
                        .map(|s| TSequence::new(s.instants().to_vec(), s.lower_inc(), s.upper_inc(), interp))
                        .collect::<Result<Vec<_>>>()?;
                    Self::sequence_set(sequences)
                }
            }
        }
    }

    pub fn shift_time(&self, delta: TimeDelta) -> Result<Self> {
        self.shift_scale_time(Some(delta), None)
    }

    pub fn scale_time(&self, duration: TimeDelta) -> Result<Self> {
        self.shift_scale_time(None, Some(duration))
    }

    pub fn shift_scale_time(&self, shift: Option<TimeDelta>, duration: Option<TimeDelta>) -> Result<Self> {
        match &self.kind {
            TemporalKind::Instant(i) => {
                let shifted = i.shift_scale_time(shift, None);
                Self::instant(shifted.value().clone(), shifted.timestamp())
            }
            TemporalKind::Discrete(d) => {
                let shifted = d.shift_scale_time(shift, duration)?;
                Self::discrete_sequence(shifted.instants().to_vec())
            }
            TemporalKind::Sequence(s) => {
                let shifted = s.shift_scale_time(shift, duration)?;
                Self::sequence(
                    shifted.instants().to_vec(),
                    shifted.lower_inc(),
                    shifted.upper_inc(),
                    shifted.interpolation(),
                )
            }
            TemporalKind::SequenceSet(set) => {
                let shifted = set.shift_scale_time(shift, duration)?;
                Self::sequence_set(shifted.sequences().to_vec())
            }
        }
    }

    pub fn to_instant(&self) -> Result<TInstant<V>> {
        match &self.kind {
            TemporalKind::Instant(i) => Ok(i.clone()),
            _ if self.num_instants() == 1 => Ok(self.start_instant()),
            _ => Err(Error::invalid_value("value has more than one instant")),
        }
    }

    pub fn to_sequence(&self, interpolation: TInterpolation) -> Result<Self> {
        match &self.kind {
            TemporalKind::Sequence(s) if s.interpolation() == interpolation => Ok(self.clone()),
            _ => Self::sequence(self.instants(), true, true, interpolation),
        }
    }

    pub fn to_sequence_set(&self) -> Result<Self> {
        match &self.kind {
            TemporalKind::SequenceSet(_) => Ok(self.clone()),
            TemporalKind::Sequence(s) => Self::sequence_set(vec![s.clone()]),
            _ => Err(Error::invalid_value(
                "only a continuous sequence can be promoted to a sequence set",
            )),
        }
    }

    pub fn restrict_timestamp(&self, t: DateTime<Utc>, mode: RestrictMode) -> Result<Option<Self>> {
        self.restrict_span(&Span::point(t), mode)
    }

    pub fn restrict_span(&self, span: &Span<DateTime<Utc>>, mode: RestrictMode) -> Result<Option<Self>> {
        match &self.kind {
            TemporalKind::Instant(i) => {
                let inside = span.contains_value(&i.timestamp());
                let keep = match mode {
                    RestrictMode::At => inside,
                    RestrictMode::Minus => !inside,
                };
                if keep {
                    Ok(Some(Self::instant(i.value().clone(), i.timestamp())?))
                } else {
                    Ok(None)
                }
            }
            TemporalKind::Discrete(d) => match d.restrict_span(span, mode)? {
                Some(result) => Ok(Some(Self::discrete_sequence(result.instants().to_vec())?)),
                None => Ok(None),
            },
            TemporalKind::Sequence(s) => Self::from_sequence_pieces(s.restrict_span(span, mode)?),
            TemporalKind::SequenceSet(set) => {
                let mut pieces = Vec::new();
                for seq in set.sequences() {
                    pieces.extend(seq.restrict_span(span, mode)?);
                }
                Self::from_sequence_pieces(pieces)
            }
        }
    }

    /// Restricts to the union (AT) or iterated difference (MINUS) of a
    /// span set. Spans in a span set are disjoint and non-adjacent, so
    /// MINUS can be applied one span at a time.
    pub fn restrict_span_set(&self, set: &SpanSet<DateTime<Utc>>, mode: RestrictMode) -> Result<Option<Self>> {
        match mode {
            RestrictMode::Minus => {
                let mut current = Some(self.clone());
                for span in set.spans() {
                    current = match current {
                        Some(value) => value.restrict_span(span, RestrictMode::Minus)?,
                        None => return Ok(None),
                    };
                }
                Ok(current)
            }
            RestrictMode::At => {
                let mut results = Vec::new();
                for span in set.spans() {
                    if let Some(piece) = self.restrict_span(span, RestrictMode::At)? {
                        results.push(piece);
                    }
                }
                if results.is_empty() {
                    return Ok(None);
                }
                let mut iter = results.into_iter();
                let mut acc = iter.next().unwrap();
                for piece in iter {
                    acc = acc.merge_disjoint(piece)?;
                }
                Ok(Some(acc))
            }
        }
    }

    /// Combines two values with disjoint, non-adjacent time domains into
    /// one (used to reassemble the pieces restriction to a span set
    /// produces).
    fn merge_disjoint(self, other: Self) -> Result<Self> {
        let mut segments = self.segments();
        segments.extend(other.segments());
        if self.interpolation() == TInterpolation::Discrete || other.interpolation() == TInterpolation::Discrete {
            let mut instants = self.instants();
            instants.extend(other.instants());
            instants.sort_by_key(|i| i.timestamp());
            return Self::discrete_sequence(instants);
        }
        Self::from_sequence_pieces(segments)
            .map(|opt| opt.expect("merging two non-empty values is never empty"))
    }

    /// Generically applies a pointwise function to the base values of one
    /// temporal value, producing a temporal value of the result type with
    /// the same time domain and subtype shape. `reslinear` declares whether
    /// `f` preserves linearity; when it does not, a linear input segment
    /// downgrades to step in the result.
    pub fn lift1<R, F>(&self, f: F, reslinear: bool) -> Result<Temporal<R>>
    where
        R: TemporalBase,
        F: Fn(&V) -> R,
    {
        match &self.kind {
            TemporalKind::Instant(i) => Temporal::instant(f(i.value()), i.timestamp()),
            TemporalKind::Discrete(d) => Temporal::discrete_sequence(
                d.instants()
                    .iter()
                    .map(|i| TInstant::new(f(i.value()), i.timestamp()))
                    .collect(),
            ),
            TemporalKind::Sequence(s) => {
                let out_interp = if s.interpolation() == TInterpolation::Linear && !reslinear {
                    TInterpolation::Step
                } else {
                    s.interpolation()
                };
                let instants = s
                    .instants()
                    .iter()
                    .map(|i| TInstant::new(f(i.value()), i.timestamp()))
                    .collect();
                Temporal::sequence(instants, s.lower_inc(), s.upper_inc(), out_interp)
            }
            TemporalKind::SequenceSet(set) => {
                let sequences = set
                    .sequences()
                    .iter()
                    .map(|s| {
                        let out_interp = if s.interpolation() == TInterpolation::Linear && !reslinear {
                            TInterpolation::Step
                        } else {
                            s.interpolation()
                        };
                        let instants = s
                            .instants()
                            .iter()
                            .map(|i| TInstant::new(f(i.value()), i.timestamp()))
                            .collect();
                        TSequence::new(instants, s.lower_inc(), s.upper_inc(), out_interp)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Temporal::sequence_set(sequences)
            }
        }
    }

    /// Generically applies a pointwise function to the base values of two
    /// temporal values, synchronized over their common time domain.
    /// `tpfn`, when given, reports interior turning-point timestamps within
    /// each pair of overlapping linear segments so the result captures the
    /// value's true extremum instead of only its sampled endpoints.
    /// Returns `None` when the two values share no common instant.
    pub fn lift2<V2, R, F>(
        &self,
        other: &Temporal<V2>,
        f: F,
        tpfn: Option<&dyn Fn(&V, &V2, &V, &V2, DateTime<Utc>, DateTime<Utc>) -> Vec<DateTime<Utc>>>,
        reslinear: bool,
    ) -> Result<Option<Temporal<R>>>
    where
        V2: TemporalBase,
        R: TemporalBase,
        F: Fn(&V, &V2) -> R,
    {
        if let (TemporalKind::Instant(i1), TemporalKind::Instant(i2)) = (&self.kind, &other.kind) {
            return if i1.timestamp() == i2.timestamp() {
                Ok(Some(Temporal::instant(f(i1.value(), i2.value()), i1.timestamp())?))
            } else {
                Ok(None)
            };
        }

        let common = self.time()?.intersection(&other.time()?)?;
        if common.is_empty() {
            return Ok(None);
        }

        let self_linear = self.interpolation() == TInterpolation::Linear;
        let other_linear = other.interpolation() == TInterpolation::Linear;
        let discrete_result =
            self.interpolation() == TInterpolation::Discrete || other.interpolation() == TInterpolation::Discrete;
        let linear_result = reslinear && self_linear && other_linear;

        let mut pieces: Vec<TSequence<R>> = Vec::new();
        let mut discrete_instants: Vec<TInstant<R>> = Vec::new();

        for span in common.spans() {
            let mut breakpoints: Vec<DateTime<Utc>> = self
                .restrict_span(span, RestrictMode::At)?
                .expect("span came from the common domain")
                .timestamps();
            breakpoints.extend(
                other
                    .restrict_span(span, RestrictMode::At)?
                    .expect("span came from the common domain")
                    .timestamps(),
            );
            breakpoints.sort();
            breakpoints.dedup();

            if let Some(tp) = tpfn {
                if self_linear && other_linear {
                    let mut inserted = Vec::new();
                    for pair in breakpoints.windows(2) {
                        let (tl, tu) = (pair[0], pair[1]);
                        let v1l = self.value_at_timestamp(tl, Side::Right).expect("within common domain");
                        let v1u = self.value_at_timestamp(tu, Side::Right).expect("within common domain");
                        let v2l = other.value_at_timestamp(tl, Side::Right).expect("within common domain");
                        let v2u = other.value_at_timestamp(tu, Side::Right).expect("within common domain");
                        for t in tp(&v1l, &v2l, &v1u, &v2u, tl, tu) {
                            if t > tl && t < tu {
                                inserted.push(t);
                            }
                        }
                    }
                    breakpoints.extend(inserted);
                    breakpoints.sort();
                    breakpoints.dedup();
                }
            }

            if discrete_result {
                for t in &breakpoints {
                    let v1 = self.value_at_timestamp(*t, Side::Right).expect("within common domain");
                    let v2 = other.value_at_timestamp(*t, Side::Right).expect("within common domain");
                    discrete_instants.push(TInstant::new(f(&v1, &v2), *t));
                }
                continue;
            }

            let instants: Vec<TInstant<R>> = breakpoints
                .iter()
                .map(|t| {
                    let v1 = self.value_at_timestamp(*t, Side::Right).expect("within common domain");
                    let v2 = other.value_at_timestamp(*t, Side::Right).expect("within common domain");
                    TInstant::new(f(&v1, &v2), *t)
                })
                .collect();
            let out_interp = if linear_result {
                TInterpolation::Linear
            } else {
                TInterpolation::Step
            };
            pieces.push(TSequence::new(instants, span.lower_inc(), span.upper_inc(), out_interp)?);
        }

        if discrete_result {
            return Ok(Some(Temporal::discrete_sequence(discrete_instants)?));
        }
        Self::from_sequence_pieces(pieces)
    }
}

impl<V> Temporal<V>
where
    V: TemporalBase,
{
    /// The instant(s) attaining the temporal minimum, found by the base
    /// type's natural order.
    fn extreme_value(&self, want_max: bool) -> Result<V> {
        let instants = self.instants();
        let mut best = instants[0].value().clone();
        for inst in &instants[1..] {
            let cmp = best
                .partial_cmp_value(inst.value())
                .ok_or_else(|| Error::invalid_value("base values are not comparable"))?;
            let replace = if want_max {
                cmp == std::cmp::Ordering::Less
            } else {
                cmp == std::cmp::Ordering::Greater
            };
            if replace {
                best = inst.value().clone();
            }
        }
        Ok(best)
    }

    fn restrict_extreme(&self, want_max: bool, mode: RestrictMode) -> Result<Option<Self>> {
        let extreme = self.extreme_value(want_max)?;
        let timestamps: Vec<DateTime<Utc>> = self
            .instants()
            .iter()
            .filter(|i| i.value().approx_eq(&extreme))
            .map(|i| i.timestamp())
            .collect();
        let points = SpanSet::new(timestamps.into_iter().map(Span::point).collect())?;
        self.restrict_span_set(&points, mode)
    }

    pub fn at_min(&self) -> Result<Option<Self>> {
        self.restrict_extreme(false, RestrictMode::At)
    }

    pub fn at_max(&self) -> Result<Option<Self>> {
        self.restrict_extreme(true, RestrictMode::At)
    }

    pub fn minus_min(&self) -> Result<Option<Self>> {
        self.restrict_extreme(false, RestrictMode::Minus)
    }

    pub fn minus_max(&self) -> Result<Option<Self>> {
        self.restrict_extreme(true, RestrictMode::Minus)
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
    fn normalization_collapses_a_redundant_step_instant() {
        let value = Temporal::sequence(
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
        assert_eq!(value.num_instants(), 2);
    }

    #[test]
    fn restrict_at_and_minus_partition_the_domain() {
        let value = Temporal::sequence(
            vec![
                TInstant::new(0.0_f64, t(0, 0)),
                TInstant::new(10.0_f64, t(0, 10)),
            ],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let span = Span::new(t(0, 3), t(0, 7), true, true).unwrap();
        let at = value.restrict_span(&span, RestrictMode::At).unwrap().unwrap();
        let minus = value.restrict_span(&span, RestrictMode::Minus).unwrap().unwrap();
        assert_eq!(at.timespan().lower(), &t(0, 3));
        assert_eq!(at.timespan().upper(), &t(0, 7));
        assert_eq!(minus.num_instants(), 4);
    }

    #[test]
    fn at_max_keeps_only_the_maximal_sample() {
        let value = Temporal::discrete_sequence(vec![
            TInstant::new(1_i64, t(0, 0)),
            TInstant::new(5_i64, t(0, 1)),
            TInstant::new(2_i64, t(0, 2)),
        ])
        .unwrap();
        let at_max = value.at_max().unwrap().unwrap();
        assert_eq!(at_max.num_instants(), 1);
        assert_eq!(at_max.start_timestamp(), t(0, 1));
    }

    #[test]
    fn shape_distinguishes_a_sequence_from_a_sequence_set() {
        let seq = Temporal::sequence(
            vec![TInstant::new(0.0_f64, t(0, 0)), TInstant::new(1.0_f64, t(0, 1))],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        assert_eq!(seq.shape(), TemporalShape::Sequence);
        assert!(seq.sequence_members().is_none());

        let far = Temporal::sequence(
            vec![TInstant::new(5.0_f64, t(1, 0)), TInstant::new(6.0_f64, t(1, 1))],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let set = seq.merge_disjoint(far).unwrap();
        assert_eq!(set.shape(), TemporalShape::SequenceSet);
        assert_eq!(set.sequence_members().unwrap().len(), 2);
    }

    #[test]
    fn bbox_is_cached_as_a_numeric_value_box() {
        let value = Temporal::sequence(
            vec![
                TInstant::new(0.0_f64, t(0, 0)),
                TInstant::new(10.0_f64, t(0, 10)),
            ],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        match value.bbox() {
            TemporalBbox::Value(tbox) => {
                assert_eq!(*tbox.value_span().unwrap().lower(), 0.0);
                assert_eq!(*tbox.value_span().unwrap().upper(), 10.0);
            }
            _ => panic!("expected a TBOX"),
        }
    }
}
