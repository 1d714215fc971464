//! The concrete pointwise operator set for temporal numbers, built on
//! [`Temporal::lift1`] and [`Temporal::lift2`]: arithmetic (`add`, `sub`,
//! `mul`, `div`, `neg`, `round`, `abs`) and the six comparisons. Each
//! declares its own `reslinear` and, for `mul`/`div`, supplies the
//! turning-point function from [`crate::temporal::lifting`].

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::temporal::lifting::{check_division_by_zero, numeric_turning_point};
use crate::temporal::Temporal;

type TurningPointFn = dyn Fn(&f64, &f64, &f64, &f64, DateTime<Utc>, DateTime<Utc>) -> Vec<DateTime<Utc>>;

pub fn add(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<f64>>> {
    t1.lift2(t2, |a, b| a + b, None, true)
}

pub fn sub(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<f64>>> {
    t1.lift2(t2, |a, b| a - b, None, true)
}

pub fn mul(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<f64>>> {
    let tpfn: &TurningPointFn = &|a1, b1, a2, b2, tl, tu| numeric_turning_point(tl, tu, *a1, *a2, *b1, *b2);
    t1.lift2(t2, |a, b| a * b, Some(tpfn), false)
}

pub fn div(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<f64>>> {
    check_division_by_zero(t1, t2)?;
    let tpfn: &TurningPointFn = &|a1, b1, a2, b2, tl, tu| numeric_turning_point(tl, tu, *a1, *a2, *b1, *b2);
    t1.lift2(t2, |a, b| a / b, Some(tpfn), false)
}

pub fn neg(t: &Temporal<f64>) -> Result<Temporal<f64>> {
    t.lift1(|a| -a, true)
}

pub fn round(t: &Temporal<f64>, decimals: i32) -> Result<Temporal<f64>> {
    let factor = 10f64.powi(decimals);
    t.lift1(move |a| (a * factor).round() / factor, false)
}

pub fn abs(t: &Temporal<f64>) -> Result<Temporal<f64>> {
    t.lift1(|a| a.abs(), false)
}

/// The six comparisons; discontinuous, so always step-interpreted with the
/// transition instant materialized (`reslinear = false`, no `tpfn`).
pub fn eq(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<bool>>> {
    t1.lift2(t2, |a, b| a.approx_eq_for_compare(b), None, false)
}

pub fn ne(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<bool>>> {
    t1.lift2(t2, |a, b| !a.approx_eq_for_compare(b), None, false)
}

pub fn lt(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<bool>>> {
    t1.lift2(t2, |a, b| a.partial_cmp(b) == Some(Ordering::Less), None, false)
}

pub fn le(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<bool>>> {
    t1.lift2(t2, |a, b| matches!(a.partial_cmp(b), Some(Ordering::Less | Ordering::Equal)), None, false)
}

pub fn gt(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<bool>>> {
    t1.lift2(t2, |a, b| a.partial_cmp(b) == Some(Ordering::Greater), None, false)
}

pub fn ge(t1: &Temporal<f64>, t2: &Temporal<f64>) -> Result<Option<Temporal<bool>>> {
    t1.lift2(t2, |a, b| matches!(a.partial_cmp(b), Some(Ordering::Greater | Ordering::Equal)), None, false)
}

trait ApproxEqForCompare {
    fn approx_eq_for_compare(&self, other: &Self) -> bool;
}

impl ApproxEqForCompare for f64 {
    fn approx_eq_for_compare(&self, other: &Self) -> bool {
        (self - other).abs() <= crate::base::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::TInterpolation;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(s: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + chrono::TimeDelta::seconds(s)
    }

    fn linear(a: f64, b: f64) -> Temporal<f64> {
        Temporal::sequence(
            vec![
                crate::temporal::TInstant::new(a, t(0)),
                crate::temporal::TInstant::new(b, t(2)),
            ],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn multiplication_inserts_the_documented_turning_point() {
        let a = linear(1.0, -1.0);
        let b = linear(1.0, -1.0);
        let result = mul(&a, &b).unwrap().unwrap();
        assert_eq!(result.num_instants(), 3);
        assert_eq!(result.instants()[1].timestamp(), t(1));
        assert!((*result.instants()[1].value() - 0.0).abs() < 1e-6);
    }

    #[test]
    fn division_by_a_value_that_is_ever_zero_fails() {
        let dividend = linear(4.0, 4.0);
        let divisor = linear(1.0, -1.0);
        assert!(div(&dividend, &divisor).is_err());
    }

    #[test]
    fn comparison_produces_a_step_boolean_result() {
        let a = linear(0.0, 10.0);
        let b = linear(5.0, 5.0);
        let result = lt(&a, &b).unwrap().unwrap();
        assert_eq!(result.interpolation(), TInterpolation::Step);
    }
}
