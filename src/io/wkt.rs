//! WKT/EWKT emission for the base point/pose types, plus a narrow
//! collaborator trait a host app can implement to supply WKT text for a
//! geometry type this crate has no opinion about linking against directly.
//!
//! The crate itself never parses or validates WKT beyond the
//! `SRID=<n>;`/`SRID=<n>,` prefix: `Display` on the base point/pose types
//! already produces a bare WKT literal (`"POINT (1 2)"`), so EWKT emission
//! is just prefixing that with the SRID and stitching the per-instant
//! literals together.

use std::fmt;

use crate::base::TemporalBase;
use crate::temporal::core::Temporal;
use crate::temporal::interpolation::TInterpolation;

/// A geometry type the crate has no built-in WKT rendering for. A host
/// implements this to teach the crate how to render its own geometry
/// library's types without this crate linking against it.
pub trait GeometryCollaborator<G> {
    fn wkt(&self, geom: &G) -> String;
}

/// The EWKT prefix for a given SRID and interpolation: a semicolon
/// separator for `Linear`, a comma otherwise — the separator is itself
/// the interpolation signal, per the same convention the sequence type
/// uses for its own text representation.
pub fn ewkt_prefix(srid: i32, interpolation: TInterpolation) -> String {
    let sep = if interpolation == TInterpolation::Linear { ';' } else { ',' };
    format!("SRID={srid}{sep}")
}

/// Renders a temporal point/pose as EWKT: the SRID prefix followed by one
/// `value@timestamp` WKT literal per instant, comma-separated.
pub fn temporal_ewkt<V>(value: &Temporal<V>, srid: i32) -> String
where
    V: TemporalBase + fmt::Display,
{
    let mut out = ewkt_prefix(srid, value.interpolation());
    let pieces: Vec<String> = value
        .instants()
        .iter()
        .map(|i| format!("{}@{}", i.value(), i.timestamp().to_rfc3339()))
        .collect();
    out.push_str(&pieces.join(", "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Point2D;
    use crate::temporal::instant::TInstant;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn ewkt_prefix_encodes_interpolation_in_the_separator() {
        assert_eq!(ewkt_prefix(4326, TInterpolation::Linear), "SRID=4326;");
        assert_eq!(ewkt_prefix(4326, TInterpolation::Step), "SRID=4326,");
        assert_eq!(ewkt_prefix(4326, TInterpolation::Discrete), "SRID=4326,");
    }

    #[test]
    fn temporal_ewkt_lists_one_wkt_literal_per_instant() {
        let value = Temporal::sequence(
            vec![
                TInstant::new(Point2D::new(0.0, 0.0), t(0)),
                TInstant::new(Point2D::new(1.0, 1.0), t(1)),
            ],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let text = temporal_ewkt(&value, 4326);
        assert!(text.starts_with("SRID=4326;"));
        assert_eq!(text.matches('@').count(), 2);
        assert!(text.contains("POINT (0 0)"));
        assert!(text.contains("POINT (1 1)"));
    }
}
