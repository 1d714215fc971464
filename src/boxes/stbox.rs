//! The x/y/z x time spatiotemporal bounding box.

use bitmask_enum::bitmask;
use chrono::{DateTime, Utc};

use crate::collections::span::Span;
use crate::errors::{Error, Result};

#[bitmask(u8)]
pub enum StboxFlags {
    /// x/y are populated.
    X = 1,
    /// z is populated.
    Z = 2,
    /// The time span is populated.
    T = 4,
    /// Coordinates are geodetic (lon/lat on a sphere), not planar.
    Geodetic = 8,
}

/// Axis-aligned box over x (if the `X` flag is set), y (ditto), z (if `Z` is
/// set), plus a time span (if `T` is set). Two boxes are only comparable if
/// their flags and SRID match.
#[derive(Debug, Clone, PartialEq)]
pub struct STBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
    time_span: Option<Span<DateTime<Utc>>>,
    flags: StboxFlags,
    srid: i32,
}

impl STBox {
    pub fn new_xy(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        time_span: Option<Span<DateTime<Utc>>>,
        srid: i32,
        geodetic: bool,
    ) -> Result<Self> {
        if xmin > xmax || ymin > ymax {
            return Err(Error::invalid_value("STBOX min must not exceed max"));
        }
        let mut flags = StboxFlags::X;
        if time_span.is_some() {
            flags |= StboxFlags::T;
        }
        if geodetic {
            flags |= StboxFlags::Geodetic;
        }
        Ok(Self {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin: 0.0,
            zmax: 0.0,
            time_span,
            flags,
            srid,
        })
    }

    pub fn with_z(mut self, zmin: f64, zmax: f64) -> Result<Self> {
        if zmin > zmax {
            return Err(Error::invalid_value("STBOX zmin must not exceed zmax"));
        }
        self.zmin = zmin;
        self.zmax = zmax;
        self.flags |= StboxFlags::Z;
        Ok(self)
    }

    pub fn has_z(&self) -> bool {
        self.flags.contains(StboxFlags::Z)
    }

    pub fn has_t(&self) -> bool {
        self.flags.contains(StboxFlags::T)
    }

    pub fn is_geodetic(&self) -> bool {
        self.flags.contains(StboxFlags::Geodetic)
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    pub fn time_span(&self) -> Option<&Span<DateTime<Utc>>> {
        self.time_span.as_ref()
    }

    /// Checks that two boxes may be compared: matching flag sets and SRID
    /// ("Two boxes are comparable only if their flag sets and
    /// reference identifier match").
    fn check_comparable(&self, other: &Self) -> Result<()> {
        if self.flags != other.flags || self.srid != other.srid {
            return Err(Error::invalid_value(
                "STBox operands have mismatched flags or SRID",
            ));
        }
        Ok(())
    }

    /// Left/right/above/below predicates are undefined on geodetic
    /// coordinates.
    fn check_planar(&self) -> Result<()> {
        if self.is_geodetic() {
            return Err(Error::invalid_value(
                "left/right/above/below predicates are undefined on geodetic STBOX",
            ));
        }
        Ok(())
    }

    pub fn expand(&mut self, other: &Self) -> Result<()> {
        self.check_comparable(other)?;
        self.xmin = self.xmin.min(other.xmin);
        self.xmax = self.xmax.max(other.xmax);
        self.ymin = self.ymin.min(other.ymin);
        self.ymax = self.ymax.max(other.ymax);
        if self.has_z() || other.has_z() {
            self.zmin = self.zmin.min(other.zmin);
            self.zmax = self.zmax.max(other.zmax);
            self.flags |= StboxFlags::Z;
        }
        self.time_span = match (self.time_span.take(), &other.time_span) {
            (Some(a), Some(b)) => Some(a.hull(b)),
            (a, None) => a,
            (None, b) => b.clone(),
        };
        Ok(())
    }

    pub fn contains(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        Ok(self.xmin <= other.xmin
            && self.xmax >= other.xmax
            && self.ymin <= other.ymin
            && self.ymax >= other.ymax
            && (!other.has_z() || (self.zmin <= other.zmin && self.zmax >= other.zmax))
            && time_dim_contains(&self.time_span, &other.time_span))
    }

    pub fn contained_by(&self, other: &Self) -> Result<bool> {
        other.contains(self)
    }

    pub fn overlaps(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        let z_overlaps = !self.has_z() || !other.has_z() || (self.zmin <= other.zmax && other.zmin <= self.zmax);
        Ok(self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
            && z_overlaps
            && time_dim_overlaps(&self.time_span, &other.time_span))
    }

    pub fn equals(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        Ok(self.xmin == other.xmin
            && self.xmax == other.xmax
            && self.ymin == other.ymin
            && self.ymax == other.ymax
            && self.zmin == other.zmin
            && self.zmax == other.zmax
            && time_dim_eq(&self.time_span, &other.time_span))
    }

    pub fn adjacent(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        if self.overlaps(other)? {
            return Ok(false);
        }
        let touches_x = self.xmax == other.xmin || other.xmax == self.xmin;
        let touches_y = self.ymax == other.ymin || other.ymax == self.ymin;
        let touches_t = match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => a.adjacent(b),
            _ => false,
        };
        Ok(touches_x || touches_y || touches_t)
    }

    pub fn strictly_left(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        self.check_planar()?;
        Ok(self.xmax < other.xmin)
    }

    pub fn overlaps_or_left(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        self.check_planar()?;
        Ok(self.xmax <= other.xmax)
    }

    pub fn strictly_right(&self, other: &Self) -> Result<bool> {
        other.strictly_left(self)
    }

    pub fn overlaps_or_right(&self, other: &Self) -> Result<bool> {
        other.overlaps_or_left(self)
    }

    pub fn strictly_below(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        self.check_planar()?;
        Ok(self.ymax < other.ymin)
    }

    pub fn overlaps_or_below(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        self.check_planar()?;
        Ok(self.ymax <= other.ymax)
    }

    pub fn strictly_above(&self, other: &Self) -> Result<bool> {
        other.strictly_below(self)
    }

    pub fn overlaps_or_above(&self, other: &Self) -> Result<bool> {
        other.overlaps_or_below(self)
    }

    pub fn strictly_before(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => Ok(a.strictly_left(b)),
            _ => Ok(false),
        }
    }

    pub fn overlaps_or_before(&self, other: &Self) -> Result<bool> {
        self.check_comparable(other)?;
        match (&self.time_span, &other.time_span) {
            (Some(a), Some(b)) => Ok(a.overlaps_or_left(b)),
            _ => Ok(false),
        }
    }

    pub fn strictly_after(&self, other: &Self) -> Result<bool> {
        other.strictly_before(self)
    }

    pub fn overlaps_or_after(&self, other: &Self) -> Result<bool> {
        other.overlaps_or_before(self)
    }
}

fn time_dim_contains(a: &Option<Span<DateTime<Utc>>>, b: &Option<Span<DateTime<Utc>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.contains(b),
        (None, None) => true,
        (Some(_), None) => true,
        (None, Some(_)) => false,
    }
}

fn time_dim_overlaps(a: &Option<Span<DateTime<Utc>>>, b: &Option<Span<DateTime<Utc>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => true,
    }
}

fn time_dim_eq(a: &Option<Span<DateTime<Utc>>>, b: &Option<Span<DateTime<Utc>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.equals(b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x0: f64, y0: f64, x1: f64, y1: f64) -> STBox {
        STBox::new_xy(x0, y0, x1, y1, None, 4326, false).unwrap()
    }

    #[test]
    fn overlap_example_from_spec_scenario_e() {
        // Scenario E boxes projected to 2D (z range collapsed).
        let a = unit_box(0.0, 0.0, 1.0, 1.0);
        let b = unit_box(2.0, 2.0, 3.0, 3.0);
        let c = unit_box(0.5, 0.5, 2.5, 2.5);
        let query = unit_box(0.9, 0.9, 1.1, 1.1);
        assert!(query.overlaps(&a).unwrap());
        assert!(!query.overlaps(&b).unwrap());
        assert!(query.overlaps(&c).unwrap());
    }

    #[test]
    fn geodetic_left_right_predicates_error() {
        let a = STBox::new_xy(0.0, 0.0, 1.0, 1.0, None, 4326, true).unwrap();
        let b = STBox::new_xy(2.0, 0.0, 3.0, 1.0, None, 4326, true).unwrap();
        assert!(a.strictly_left(&b).is_err());
    }

    #[test]
    fn mismatched_flags_is_an_error() {
        let a = unit_box(0.0, 0.0, 1.0, 1.0);
        let b = a.clone().with_z(0.0, 1.0).unwrap();
        assert!(a.overlaps(&b).is_err());
    }
}
