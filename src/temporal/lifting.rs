//! Free helpers that support [`crate::temporal::core::Temporal::lift2`]:
//! the numeric turning-point formula for multiplication/division on linear
//! float segments, and the division-by-zero pre-check. The synchronization
//! algorithm itself lives as `lift1`/`lift2` on `Temporal<V>`, since it needs
//! access to `core`'s private subtype representation.

use chrono::{DateTime, TimeDelta, Utc};

use crate::base::EPSILON;
use crate::errors::{Error, Result};
use crate::temporal::core::Temporal;
use crate::temporal::interpolation::TInterpolation;

/// The interior extremum of `×`/`÷` applied to two linear float segments
/// sharing the span `[tl, tu]`, with endpoint values `(x1, x2)` and
/// `(x3, x4)` respectively. Returns `None` when either segment is constant
/// (no zero-crossing) or the computed instant falls within `ε` of an
/// endpoint.
pub fn numeric_turning_point(
    tl: DateTime<Utc>,
    tu: DateTime<Utc>,
    x1: f64,
    x2: f64,
    x3: f64,
    x4: f64,
) -> Vec<DateTime<Utc>> {
    if (x2 - x1).abs() <= EPSILON || (x4 - x3).abs() <= EPSILON {
        return Vec::new();
    }
    let d1 = -x1 / (x2 - x1);
    let d2 = -x3 / (x4 - x3);
    let fraction = d1 + (d2 - d1) / 2.0;
    fraction_to_timestamp_checked(tl, tu, fraction)
}

/// The interior zero-crossing of the linear difference `a(t) - b(t)` over
/// two linear float segments sharing the span `[tl, tu]`, with endpoint
/// values `(a1, a2)` and `(b1, b2)` respectively. Used by `min`/`max`
/// lifting to insert the instant where two segments cross, the way
/// [`numeric_turning_point`] inserts the instant where a product/quotient
/// crosses zero. `None` when the difference never changes sign strictly
/// inside the span.
pub fn crossing_turning_point(
    tl: DateTime<Utc>,
    tu: DateTime<Utc>,
    a1: f64,
    a2: f64,
    b1: f64,
    b2: f64,
) -> Vec<DateTime<Utc>> {
    let d1 = a1 - b1;
    let d2 = a2 - b2;
    if (d1 < 0.0) == (d2 < 0.0) || (d1.abs() <= EPSILON && d2.abs() <= EPSILON) {
        return Vec::new();
    }
    let fraction = -d1 / (d2 - d1);
    fraction_to_timestamp_checked(tl, tu, fraction)
}

/// Converts a `[0, 1]` fraction of the span `[tl, tu]` into an instant,
/// rejecting fractions outside the span or within `ε` of either endpoint.
/// Shared by [`numeric_turning_point`] and [`crossing_turning_point`].
///
/// The endpoint-proximity check compares `fraction` itself (and its mirror
/// `1 - fraction`) against `EPSILON`, not a post-conversion millisecond time
/// delta: a millisecond count is routinely in the thousands-to-millions
/// range, so comparing it directly against the `1e-9`-scale `EPSILON` would
/// only ever reject an exact zero-width offset, never a fraction that is
/// merely close to 0 or 1.
fn fraction_to_timestamp_checked(tl: DateTime<Utc>, tu: DateTime<Utc>, fraction: f64) -> Vec<DateTime<Utc>> {
    if !(0.0..=1.0).contains(&fraction) {
        return Vec::new();
    }
    if fraction.min(1.0 - fraction) <= EPSILON {
        return Vec::new();
    }
    let width = tu - tl;
    let offset_ms = (width.num_milliseconds() as f64 * fraction).round() as i64;
    vec![tl + TimeDelta::milliseconds(offset_ms)]
}

/// Tests whether a temporal float value is ever (approximately) zero
/// anywhere in its time domain — the *ever-equals-zero* predicate used as
/// the division-by-zero pre-check.
pub fn ever_equals_zero(value: &Temporal<f64>) -> bool {
    value.instants().iter().any(|i| i.value().abs() <= EPSILON)
        || matches!(value.interpolation(), TInterpolation::Linear)
            && value.segments().iter().any(|seg| {
                let a = *seg.start_instant().value();
                let b = *seg.end_instant().value();
                a.abs() <= EPSILON || b.abs() <= EPSILON || (a < 0.0) != (b < 0.0)
            })
}

/// Projects `divisor` onto `dividend`'s time domain and fails with
/// `ARG_VALUE_DIVISION_BY_ZERO` if the projected divisor is ever zero.
pub fn check_division_by_zero(dividend: &Temporal<f64>, divisor: &Temporal<f64>) -> Result<()> {
    let common = dividend.time()?.intersection(&divisor.time()?)?;
    if common.is_empty() {
        return Ok(());
    }
    let Some(projected) = divisor.restrict_span_set(&common, crate::temporal::RestrictMode::At)? else {
        return Ok(());
    };
    if ever_equals_zero(&projected) {
        return Err(Error::invalid_value(
            "division by zero: divisor is zero somewhere in the dividend's time domain",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(s: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + TimeDelta::seconds(s)
    }

    #[test]
    fn turning_point_matches_the_documented_scenario() {
        // T1 = [(+1, 0s), (-1, 2s)]; a segment crossing zero at its midpoint.
        let points = numeric_turning_point(t(0), t(2), 1.0, -1.0, 1.0, -1.0);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0], t(1));
    }

    #[test]
    fn constant_segment_has_no_turning_point() {
        assert!(numeric_turning_point(t(0), t(2), 1.0, 1.0, 1.0, -1.0).is_empty());
    }

    #[test]
    fn crossing_turning_point_finds_the_midpoint_swap() {
        // a goes 0 -> 2, b goes 2 -> 0: they cross at the midpoint.
        let points = crossing_turning_point(t(0), t(2), 0.0, 2.0, 2.0, 0.0);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0], t(1));
    }

    #[test]
    fn crossing_turning_point_empty_when_one_side_always_dominates() {
        assert!(crossing_turning_point(t(0), t(2), 5.0, 6.0, 1.0, 2.0).is_empty());
    }
}
