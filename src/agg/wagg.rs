//! The windowed-aggregation driver: extend each instant of a temporal
//! number by a fixed interval, fold the resulting step segments into a
//! running aggregate carried *in* a skiplist, and read the aggregate back
//! out as a temporal number. Grounded in
//! `original_source/meos/src/general/temporal_waggfuncs.c` and
//! `original_source/meos/src/temporal/skiplist.c`'s `skiplist_splice`.

use chrono::{DateTime, TimeDelta, Utc};

use crate::agg::context::AggregationContext;
use crate::agg::skiplist::SkipList;
use crate::base::{Double2, TemporalBase};
use crate::errors::Result;
use crate::temporal::core::Temporal;
use crate::temporal::instant::TInstant;
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::lifting::crossing_turning_point;
use crate::temporal::sequence::{RestrictMode, Side, TSequence};

/// The running state of a windowed aggregate: a skiplist of disjoint
/// segments keyed by each segment's own start timestamp, the way the
/// original engine's `TEMPORAL`-typed skiplist keys its elements by the
/// sequence they carry. `transition`/`combine_states` commit into this
/// skiplist via [`SkipList::splice`] rather than accumulating the state as
/// a bare `Temporal`, so the aggregation context's PRNG-driven level
/// assignment is exercised on every fold, not just on export.
pub type WaggState<C> = SkipList<DateTime<Utc>, TSequence<C>>;

/// Extends each `(v, t)` instant into the 2-instant step segment
/// `[(v, t), (v, t + delta)]` that windowed aggregation folds into the
/// running state — the "extend by interval" step of `wagg`, independent of
/// which reducer eventually consumes the extended segments.
pub fn extend_instants<V: TemporalBase>(instants: &[TInstant<V>], delta: TimeDelta) -> Result<Vec<Temporal<V>>> {
    instants
        .iter()
        .map(|inst| {
            let t0 = inst.timestamp();
            let t1 = t0 + delta;
            Temporal::sequence(
                vec![TInstant::new(inst.value().clone(), t0), TInstant::new(inst.value().clone(), t1)],
                true,
                true,
                TInterpolation::Step,
            )
        })
        .collect()
}

/// A windowed-aggregation reducer: lifts a raw temporal-number sample into
/// a running carrier, combines two overlapping carriers pointwise, and
/// reads the final aggregate back out of the carrier. `min`/`max` need the
/// interior crossing of two overlapping step plateaus inserted so the
/// output switches plateau exactly where the envelope does; the purely
/// additive reducers (`sum`, `count`, `avg`) never do.
pub trait WaggReducer {
    type Carrier: TemporalBase + Clone;

    fn lift(raw: f64) -> Self::Carrier;
    fn combine(a: &Self::Carrier, b: &Self::Carrier) -> Self::Carrier;
    fn finalize(carrier: &Self::Carrier) -> f64;

    /// `Some` only for reducers whose combine is non-monotonic across a
    /// crossing (`min`/`max`); `None` lets `lift2` skip the turning-point
    /// search entirely for additive reducers.
    #[allow(clippy::type_complexity)]
    fn crossings() -> Option<fn(&Self::Carrier, &Self::Carrier, &Self::Carrier, &Self::Carrier, DateTime<Utc>, DateTime<Utc>) -> Vec<DateTime<Utc>>> {
        None
    }
}

fn min_max_crossings(v1l: &f64, v2l: &f64, v1u: &f64, v2u: &f64, tl: DateTime<Utc>, tu: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    crossing_turning_point(tl, tu, *v1l, *v1u, *v2l, *v2u)
}

pub struct MinReducer;

impl WaggReducer for MinReducer {
    type Carrier = f64;

    fn lift(raw: f64) -> f64 {
        raw
    }

    fn combine(a: &f64, b: &f64) -> f64 {
        a.min(*b)
    }

    fn finalize(carrier: &f64) -> f64 {
        *carrier
    }

    fn crossings() -> Option<fn(&f64, &f64, &f64, &f64, DateTime<Utc>, DateTime<Utc>) -> Vec<DateTime<Utc>>> {
        Some(min_max_crossings)
    }
}

pub struct MaxReducer;

impl WaggReducer for MaxReducer {
    type Carrier = f64;

    fn lift(raw: f64) -> f64 {
        raw
    }

    fn combine(a: &f64, b: &f64) -> f64 {
        a.max(*b)
    }

    fn finalize(carrier: &f64) -> f64 {
        *carrier
    }

    fn crossings() -> Option<fn(&f64, &f64, &f64, &f64, DateTime<Utc>, DateTime<Utc>) -> Vec<DateTime<Utc>>> {
        Some(min_max_crossings)
    }
}

pub struct SumReducer;

impl WaggReducer for SumReducer {
    type Carrier = f64;

    fn lift(raw: f64) -> f64 {
        raw
    }

    fn combine(a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn finalize(carrier: &f64) -> f64 {
        *carrier
    }
}

pub struct CountReducer;

impl WaggReducer for CountReducer {
    type Carrier = f64;

    fn lift(_raw: f64) -> f64 {
        1.0
    }

    fn combine(a: &f64, b: &f64) -> f64 {
        a + b
    }

    fn finalize(carrier: &f64) -> f64 {
        *carrier
    }
}

/// `avg`'s carrier is a running `(sum, count)` pair (a `double2`), divided
/// out only when the caller reads the final aggregate — exactly the
/// carrier the original's `tnumber_extend_wavg` uses.
pub struct AvgReducer;

impl WaggReducer for AvgReducer {
    type Carrier = Double2;

    fn lift(raw: f64) -> Double2 {
        Double2([raw, 1.0])
    }

    fn combine(a: &Double2, b: &Double2) -> Double2 {
        a.add(b)
    }

    fn finalize(carrier: &Double2) -> f64 {
        carrier.0[0] / carrier.0[1]
    }
}

/// Builds a `Temporal` out of disjoint, time-ordered segments: a single
/// segment becomes a plain sequence, more than one becomes a sequence set
/// (`Temporal::sequence_set` merges any that turn out to touch at the
/// join on its own).
fn temporal_from_segments<C: TemporalBase + Clone>(mut segments: Vec<TSequence<C>>) -> Result<Temporal<C>> {
    if segments.len() == 1 {
        let s = segments.pop().unwrap();
        Temporal::sequence(s.instants().to_vec(), s.lower_inc(), s.upper_inc(), s.interpolation())
    } else {
        Temporal::sequence_set(segments)
    }
}

/// Reassembles disjoint (possibly touching) carrier pieces into a single
/// `Temporal`, fragmenting each piece into its individual segments first
/// (harmless, since `temporal_from_segments` reassembles touching pieces).
fn reassemble<C: TemporalBase + Clone>(parts: Vec<Temporal<C>>) -> Result<Temporal<C>> {
    let mut segments: Vec<TSequence<C>> = Vec::new();
    for part in parts {
        segments.extend(part.segments());
    }
    temporal_from_segments(segments)
}

/// Reconstructs the `Temporal` a running [`WaggState`] currently represents,
/// or `None` if the skiplist (and therefore the aggregate) is still empty.
/// The inverse of [`commit`]'s final splice.
fn from_state<C: TemporalBase + Clone>(state: &WaggState<C>) -> Result<Option<Temporal<C>>> {
    let segments = state.values();
    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(temporal_from_segments(segments)?))
    }
}

/// Merges a newly extended segment into the running aggregate: the parts
/// of each side outside their shared time domain pass through unchanged,
/// the shared part is combined pointwise via `R::combine` (with crossings
/// requested when `R` needs them).
fn merge_overlap<R: WaggReducer>(state: Option<Temporal<R::Carrier>>, seg: Temporal<R::Carrier>) -> Result<Temporal<R::Carrier>> {
    let Some(state) = state else {
        return Ok(seg);
    };
    let state_time = state.time()?;
    let seg_time = seg.time()?;
    let overlap = state_time.intersection(&seg_time)?;
    if overlap.is_empty() {
        return reassemble(vec![state, seg]);
    }

    let state_outside = state.restrict_span_set(&overlap, RestrictMode::Minus)?;
    let seg_outside = seg.restrict_span_set(&overlap, RestrictMode::Minus)?;
    let state_shared = state
        .restrict_span_set(&overlap, RestrictMode::At)?
        .expect("overlap is non-empty by construction");
    let seg_shared = seg
        .restrict_span_set(&overlap, RestrictMode::At)?
        .expect("overlap is non-empty by construction");

    let combined = match R::crossings() {
        Some(tp) => state_shared.lift2(
            &seg_shared,
            |a, b| R::combine(a, b),
            Some(&tp as &dyn Fn(&R::Carrier, &R::Carrier, &R::Carrier, &R::Carrier, DateTime<Utc>, DateTime<Utc>) -> Vec<DateTime<Utc>>),
            false,
        )?,
        None => state_shared.lift2(&seg_shared, |a, b| R::combine(a, b), None, false)?,
    }
    .expect("both sides are defined on the whole overlap");

    let mut parts = Vec::with_capacity(3);
    if let Some(p) = state_outside {
        parts.push(p);
    }
    if let Some(p) = seg_outside {
        parts.push(p);
    }
    parts.push(combined);
    reassemble(parts)
}

/// Folds `seg` into `state`'s running aggregate and commits the result back
/// into `state` via [`SkipList::splice`]: the synchronized lift (with
/// turning points inserted where `R` needs them) computes the merged
/// value outside the skiplist, since that computation needs the full
/// `Temporal` restriction/lifting machinery: `splice`'s own per-key merge
/// only fires on exact key collisions, too narrow for a synchronized lift
/// over two overlapping but differently-sampled segments. The merged
/// result's segments always span at least `state`'s entire prior key
/// range, so handing them to `splice` deletes every old entry in that
/// range and reinserts the merged segments with freshly drawn random
/// levels — the atomic "replace the overlapping range with the merged
/// stream" operation `skiplist_splice` is specified to perform.
fn commit<R: WaggReducer>(state: &mut WaggState<R::Carrier>, seg: Temporal<R::Carrier>, ctx: &mut AggregationContext) -> Result<()> {
    let prior = from_state::<R::Carrier>(state)?;
    let merged = merge_overlap::<R>(prior, seg)?;
    let entries: Vec<(DateTime<Utc>, TSequence<R::Carrier>)> = merged
        .segments()
        .into_iter()
        .map(|s| (s.instants()[0].timestamp(), s))
        .collect();
    state.splice(entries, |_, new| new.clone(), ctx)
}

/// Folds a batch of raw `(value, timestamp)` samples into the running
/// aggregate state, extending each by `delta` and lifting it into `R`'s
/// carrier before committing it into `state`.
pub fn transition<R: WaggReducer>(
    state: &mut WaggState<R::Carrier>,
    instants: &[TInstant<f64>],
    delta: TimeDelta,
    ctx: &mut AggregationContext,
) -> Result<()> {
    for extended in extend_instants(instants, delta)? {
        let lifted: Temporal<R::Carrier> = extended.lift1(|v| R::lift(*v), true)?;
        commit::<R>(state, lifted, ctx)?;
    }
    Ok(())
}

/// Splices one worker's running state into another's — the combiner a
/// host uses to reduce per-worker skiplists after parallel transition.
/// `ctx` should be `a`'s own aggregation context (or a worker context
/// forked from it); per §5, the PRNG is never shared across workers, only
/// re-seeded/re-drawn on the combining side.
pub fn combine_states<R: WaggReducer>(a: &mut WaggState<R::Carrier>, b: &WaggState<R::Carrier>, ctx: &mut AggregationContext) -> Result<()> {
    let Some(seg) = from_state::<R::Carrier>(b)? else {
        return Ok(());
    };
    commit::<R>(a, seg, ctx)
}

/// Reads the final aggregate out of the running state, or `None` if no
/// sample has ever been folded in.
pub fn finalize<R: WaggReducer>(state: &WaggState<R::Carrier>) -> Result<Option<Temporal<f64>>> {
    let Some(value) = from_state::<R::Carrier>(state)? else {
        return Ok(None);
    };
    Ok(Some(value.lift1(|c| R::finalize(c), true)?))
}

/// Flattens the running state to one skiplist entry per sample instant
/// (rather than one per stored segment) — a host-facing snapshot for
/// searching the aggregate at individual timestamps.
pub fn to_instant_skiplist<R: WaggReducer>(
    state: &WaggState<R::Carrier>,
    ctx: &mut AggregationContext,
) -> Result<SkipList<DateTime<Utc>, R::Carrier>> {
    let mut out = SkipList::new();
    let Some(value) = from_state::<R::Carrier>(state)? else {
        return Ok(out);
    };
    let entries: Vec<(DateTime<Utc>, R::Carrier)> = value.instants().iter().map(|i| (i.timestamp(), i.value().clone())).collect();
    out.splice(entries, |_, new| new.clone(), ctx)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(s: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + TimeDelta::seconds(s)
    }

    fn ctx() -> AggregationContext {
        AggregationContext::new(7)
    }

    #[test]
    fn max_over_overlapping_windows_never_drops_below_either_input() {
        let instants = vec![TInstant::new(1.0, t(0)), TInstant::new(5.0, t(2)), TInstant::new(2.0, t(4))];
        let delta = TimeDelta::seconds(3);
        let mut c = ctx();
        let mut state = WaggState::<f64>::new();
        transition::<MaxReducer>(&mut state, &instants, delta, &mut c).unwrap();
        let result = finalize::<MaxReducer>(&state).unwrap().unwrap();
        assert_eq!(result.value_at_timestamp(t(0), Side::Right), Some(1.0));
        assert_eq!(result.value_at_timestamp(t(2), Side::Right), Some(5.0));
        assert_eq!(result.value_at_timestamp(t(5), Side::Right), Some(2.0));
    }

    #[test]
    fn count_accumulates_overlapping_window_coverage() {
        let instants = vec![TInstant::new(10.0, t(0)), TInstant::new(20.0, t(1))];
        let delta = TimeDelta::seconds(2);
        let mut c = ctx();
        let mut state = WaggState::<f64>::new();
        transition::<CountReducer>(&mut state, &instants, delta, &mut c).unwrap();
        let result = finalize::<CountReducer>(&state).unwrap().unwrap();
        assert_eq!(result.value_at_timestamp(t(1), Side::Right), Some(2.0));
    }

    #[test]
    fn avg_divides_the_running_sum_by_the_running_count() {
        let instants = vec![TInstant::new(4.0, t(0)), TInstant::new(8.0, t(5))];
        let delta = TimeDelta::seconds(1);
        let mut c = ctx();
        let mut state = WaggState::<Double2>::new();
        transition::<AvgReducer>(&mut state, &instants, delta, &mut c).unwrap();
        let result = finalize::<AvgReducer>(&state).unwrap().unwrap();
        assert_eq!(result.value_at_timestamp(t(0), Side::Right), Some(4.0));
        assert_eq!(result.value_at_timestamp(t(5), Side::Right), Some(8.0));
    }

    #[test]
    fn combine_states_merges_two_workers_disjoint_in_time() {
        let mut c = ctx();
        let mut a = WaggState::<f64>::new();
        transition::<SumReducer>(&mut a, &[TInstant::new(1.0, t(0))], TimeDelta::seconds(1), &mut c).unwrap();
        let mut b = WaggState::<f64>::new();
        transition::<SumReducer>(&mut b, &[TInstant::new(2.0, t(10))], TimeDelta::seconds(1), &mut c).unwrap();
        combine_states::<SumReducer>(&mut a, &b, &mut c).unwrap();
        let result = finalize::<SumReducer>(&a).unwrap().unwrap();
        assert_eq!(result.value_at_timestamp(t(0), Side::Right), Some(1.0));
        assert_eq!(result.value_at_timestamp(t(10), Side::Right), Some(2.0));
    }

    #[test]
    fn combine_states_merges_two_workers_overlapping_in_time() {
        let mut c = ctx();
        let mut a = WaggState::<f64>::new();
        transition::<MaxReducer>(&mut a, &[TInstant::new(1.0, t(0))], TimeDelta::seconds(3), &mut c).unwrap();
        let mut b = WaggState::<f64>::new();
        transition::<MaxReducer>(&mut b, &[TInstant::new(5.0, t(1))], TimeDelta::seconds(3), &mut c).unwrap();
        combine_states::<MaxReducer>(&mut a, &b, &mut c).unwrap();
        let result = finalize::<MaxReducer>(&a).unwrap().unwrap();
        assert_eq!(result.value_at_timestamp(t(0), Side::Right), Some(1.0));
        assert_eq!(result.value_at_timestamp(t(2), Side::Right), Some(5.0));
    }

    #[test]
    fn to_instant_skiplist_snapshots_the_running_state_in_key_order() {
        let instants = vec![TInstant::new(1.0, t(0)), TInstant::new(2.0, t(1)), TInstant::new(3.0, t(2))];
        let mut c = ctx();
        let mut state = WaggState::<f64>::new();
        transition::<SumReducer>(&mut state, &instants, TimeDelta::seconds(1), &mut c).unwrap();
        let list = to_instant_skiplist::<SumReducer>(&state, &mut c).unwrap();
        let keys: Vec<_> = list.entries().into_iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn finalize_on_an_untouched_state_is_none() {
        let state = WaggState::<f64>::new();
        assert!(finalize::<SumReducer>(&state).unwrap().is_none());
    }
}
