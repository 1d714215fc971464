//! Temporal MF-JSON emission, built on `serde_json`'s `Value`/`Map`
//! construction rather than hand-rolled string concatenation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::base::{Point2D, TemporalBase};
use crate::errors::{Error, Result};
use crate::io::text::format_f64;
use crate::temporal::core::{Temporal, TemporalShape};
use crate::temporal::instant::TInstant;
use crate::temporal::interpolation::TInterpolation;
use crate::temporal::sequence::TSequence;

/// A base type with a coordinate array representation — the "coordinates"
/// field of MF-JSON. Implemented for the point type; a pose or network
/// point has no standard MF-JSON coordinate shape and is out of scope.
pub trait MfJsonCoordinates {
    fn coordinates(&self) -> Vec<f64>;

    /// The inverse of [`MfJsonCoordinates::coordinates`]: rebuilds a base
    /// value from a 2- or 3-element coordinate array, the shape ingestion
    /// needs to undo emission (round-trip law of `spec.md` §8).
    fn from_coordinates(coords: &[f64]) -> Result<Self>
    where
        Self: Sized;
}

impl MfJsonCoordinates for Point2D {
    fn coordinates(&self) -> Vec<f64> {
        match self.z {
            Some(z) => vec![self.x, self.y, z],
            None => vec![self.x, self.y],
        }
    }

    fn from_coordinates(coords: &[f64]) -> Result<Self> {
        match coords {
            [x, y] => Ok(Point2D::new(*x, *y)),
            [x, y, z] => Ok(Point2D::new_3d(*x, *y, *z)),
            _ => Err(Error::invalid_value("mfjson: a point needs 2 or 3 coordinates")),
        }
    }
}

/// Emission knobs: CRS annotation, the optional `stBoundedBy` block, and
/// coordinate precision (defaults to the IEEE double round-trip maximum of
/// 15 significant digits).
#[derive(Debug, Clone, Default)]
pub struct MfJsonOptions {
    pub crs: Option<String>,
    pub bounded_by: bool,
    pub precision: Option<usize>,
}

fn format_datetime(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn interpolation_name(interp: TInterpolation) -> &'static str {
    match interp {
        TInterpolation::Discrete => "Discrete",
        TInterpolation::Step => "Stepwise",
        TInterpolation::Linear => "Linear",
    }
}

fn round_coord(x: f64, precision: Option<usize>) -> Value {
    match precision {
        Some(p) => json!(format_f64(x, Some(p)).parse::<f64>().unwrap_or(x)),
        None => json!(x),
    }
}

fn coordinates_value(coords: &[f64], precision: Option<usize>) -> Value {
    Value::Array(coords.iter().map(|&x| round_coord(x, precision)).collect())
}

/// Emits a temporal point as an MF-JSON object.
pub fn to_mfjson<V>(value: &Temporal<V>, opts: &MfJsonOptions) -> Result<Value>
where
    V: TemporalBase + MfJsonCoordinates,
{
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!("MovingPoint"));
    if let Some(crs) = &opts.crs {
        obj.insert("crs".to_string(), json!({ "type": "name", "properties": { "name": crs } }));
    }
    if opts.bounded_by {
        obj.insert("stBoundedBy".to_string(), bounded_by(value, opts.precision)?);
    }

    match value.shape() {
        TemporalShape::Instant => {
            let inst = value.start_instant();
            obj.insert("coordinates".to_string(), coordinates_value(&inst.value().coordinates(), opts.precision));
            obj.insert("datetimes".to_string(), json!(format_datetime(inst.timestamp())));
            obj.insert("interpolations".to_string(), json!(["Discrete"]));
        }
        TemporalShape::Discrete => {
            let instants = value.instants();
            obj.insert(
                "coordinates".to_string(),
                Value::Array(instants.iter().map(|i| coordinates_value(&i.value().coordinates(), opts.precision)).collect()),
            );
            obj.insert(
                "datetimes".to_string(),
                Value::Array(instants.iter().map(|i| json!(format_datetime(i.timestamp()))).collect()),
            );
            obj.insert("interpolations".to_string(), json!(["Discrete"]));
        }
        TemporalShape::Sequence => {
            fill_sequence_fields(&mut obj, value, opts.precision);
        }
        TemporalShape::SequenceSet => {
            let members = value.sequence_members().expect("sequence set has members");
            let mut sequences = Vec::with_capacity(members.len());
            for member in &members {
                let mut seq_obj = Map::new();
                fill_sequence_fields(&mut seq_obj, member, opts.precision);
                sequences.push(Value::Object(seq_obj));
            }
            obj.insert("sequences".to_string(), Value::Array(sequences));
            obj.insert("interpolations".to_string(), json!([interpolation_name(value.interpolation())]));
        }
    }

    Ok(Value::Object(obj))
}

fn fill_sequence_fields<V>(obj: &mut Map<String, Value>, value: &Temporal<V>, precision: Option<usize>)
where
    V: TemporalBase + MfJsonCoordinates,
{
    let instants = value.instants();
    obj.insert(
        "coordinates".to_string(),
        Value::Array(instants.iter().map(|i| coordinates_value(&i.value().coordinates(), precision)).collect()),
    );
    obj.insert(
        "datetimes".to_string(),
        Value::Array(instants.iter().map(|i| json!(format_datetime(i.timestamp()))).collect()),
    );
    obj.insert("lower_inc".to_string(), json!(value.lower_inc()));
    obj.insert("upper_inc".to_string(), json!(value.upper_inc()));
    obj.insert("interpolations".to_string(), json!([interpolation_name(value.interpolation())]));
}

fn bounded_by<V>(value: &Temporal<V>, precision: Option<usize>) -> Result<Value>
where
    V: TemporalBase + MfJsonCoordinates,
{
    let instants = value.instants();
    if instants.is_empty() {
        return Err(Error::invalid_value("cannot compute stBoundedBy of an empty value"));
    }
    let mut xmin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymin = f64::INFINITY;
    let mut ymax = f64::NEG_INFINITY;
    let mut zmin = f64::INFINITY;
    let mut zmax = f64::NEG_INFINITY;
    let mut has_z = false;
    for inst in &instants {
        let c = inst.value().coordinates();
        xmin = xmin.min(c[0]);
        xmax = xmax.max(c[0]);
        ymin = ymin.min(c[1]);
        ymax = ymax.max(c[1]);
        if c.len() > 2 {
            has_z = true;
            zmin = zmin.min(c[2]);
            zmax = zmax.max(c[2]);
        }
    }
    let bbox = if has_z {
        vec![
            round_coord(xmin, precision),
            round_coord(ymin, precision),
            round_coord(zmin, precision),
            round_coord(xmax, precision),
            round_coord(ymax, precision),
            round_coord(zmax, precision),
        ]
    } else {
        vec![
            round_coord(xmin, precision),
            round_coord(ymin, precision),
            round_coord(xmax, precision),
            round_coord(ymax, precision),
        ]
    };
    Ok(json!({
        "bbox": bbox,
        "period": {
            "begin": format_datetime(value.start_timestamp()),
            "end": format_datetime(value.end_timestamp()),
        },
    }))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::invalid_value(format!("mfjson: bad datetime {s:?}: {e}")))
}

fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| Error::invalid_value(format!("mfjson: expected {what} to be an object")))
}

fn expect_array<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Vec<Value>> {
    obj.get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::invalid_value(format!("mfjson: missing or non-array field {field:?}")))
}

fn expect_bool(obj: &Map<String, Value>, field: &str) -> Result<bool> {
    obj.get(field)
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::invalid_value(format!("mfjson: missing or non-boolean field {field:?}")))
}

fn expect_f64(value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| Error::invalid_value("mfjson: expected a number"))
}

fn parse_point<V: MfJsonCoordinates>(value: &Value) -> Result<V> {
    let coords = value
        .as_array()
        .ok_or_else(|| Error::invalid_value("mfjson: expected a coordinate array"))?
        .iter()
        .map(expect_f64)
        .collect::<Result<Vec<f64>>>()?;
    V::from_coordinates(&coords)
}

fn interpolation_from_name(name: &str) -> Result<TInterpolation> {
    match name {
        "Discrete" => Ok(TInterpolation::Discrete),
        "Stepwise" => Ok(TInterpolation::Step),
        "Linear" => Ok(TInterpolation::Linear),
        other => Err(Error::invalid_value(format!("mfjson: unknown interpolation {other:?}"))),
    }
}

fn first_interpolation(obj: &Map<String, Value>) -> Result<TInterpolation> {
    let name = expect_array(obj, "interpolations")?
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_value("mfjson: empty interpolations array"))?;
    interpolation_from_name(name)
}

fn parse_instants<V: TemporalBase + MfJsonCoordinates>(obj: &Map<String, Value>) -> Result<Vec<TInstant<V>>> {
    let coords = expect_array(obj, "coordinates")?;
    let datetimes = expect_array(obj, "datetimes")?;
    if coords.len() != datetimes.len() {
        return Err(Error::invalid_value("mfjson: coordinates/datetimes length mismatch"));
    }
    coords
        .iter()
        .zip(datetimes.iter())
        .map(|(c, t)| {
            let value: V = parse_point(c)?;
            let t = t.as_str().ok_or_else(|| Error::invalid_value("mfjson: datetime entry is not a string"))?;
            Ok(TInstant::new(value, parse_datetime(t)?))
        })
        .collect()
}

fn parse_sequence_object<V: TemporalBase + MfJsonCoordinates>(obj: &Map<String, Value>) -> Result<TSequence<V>> {
    let instants = parse_instants(obj)?;
    let lower_inc = expect_bool(obj, "lower_inc")?;
    let upper_inc = expect_bool(obj, "upper_inc")?;
    let interp = first_interpolation(obj)?;
    TSequence::new(instants, lower_inc, upper_inc, interp)
}

/// Ingests an MF-JSON object emitted by [`to_mfjson`] back into a
/// [`Temporal`] value, the inverse direction of the round-trip law of
/// `spec.md` §8 ("MF-JSON emission followed by MF-JSON ingestion yields a
/// value equal to the original").
pub fn from_mfjson<V>(json: &Value) -> Result<Temporal<V>>
where
    V: TemporalBase + MfJsonCoordinates,
{
    let obj = expect_object(json, "the top-level MF-JSON value")?;

    if let Some(sequences) = obj.get("sequences") {
        let sequences = sequences
            .as_array()
            .ok_or_else(|| Error::invalid_value("mfjson: \"sequences\" must be an array"))?;
        let members = sequences
            .iter()
            .map(|s| parse_sequence_object(expect_object(s, "a sequence-set member")?))
            .collect::<Result<Vec<_>>>()?;
        return Temporal::sequence_set(members);
    }

    let interp = first_interpolation(obj)?;
    match interp {
        TInterpolation::Discrete => {
            let is_sequence = obj.get("datetimes").is_some_and(Value::is_array);
            if is_sequence {
                Temporal::discrete_sequence(parse_instants(obj)?)
            } else {
                let value: V = parse_point(obj.get("coordinates").ok_or_else(|| Error::invalid_value("mfjson: missing \"coordinates\""))?)?;
                let t = obj
                    .get("datetimes")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::invalid_value("mfjson: missing \"datetimes\""))?;
                Temporal::instant(value, parse_datetime(t)?)
            }
        }
        TInterpolation::Step | TInterpolation::Linear => {
            let seq = parse_sequence_object(obj)?;
            Temporal::sequence(seq.instants().to_vec(), seq.lower_inc(), seq.upper_inc(), seq.interpolation())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::instant::TInstant;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn instant_shape_emits_scalar_coordinates_and_datetime() {
        let value = Temporal::instant(Point2D::new(1.0, 2.0), t(0)).unwrap();
        let out = to_mfjson(&value, &MfJsonOptions::default()).unwrap();
        assert_eq!(out["type"], json!("MovingPoint"));
        assert_eq!(out["interpolations"], json!(["Discrete"]));
        assert_eq!(out["coordinates"], json!([1.0, 2.0]));
    }

    #[test]
    fn sequence_shape_carries_lower_upper_inc_and_interpolation() {
        let value = Temporal::sequence(
            vec![TInstant::new(Point2D::new(0.0, 0.0), t(0)), TInstant::new(Point2D::new(1.0, 1.0), t(1))],
            true,
            false,
            TInterpolation::Linear,
        )
        .unwrap();
        let out = to_mfjson(&value, &MfJsonOptions::default()).unwrap();
        assert_eq!(out["lower_inc"], json!(true));
        assert_eq!(out["upper_inc"], json!(false));
        assert_eq!(out["interpolations"], json!(["Linear"]));
    }

    #[test]
    fn bounded_by_reports_the_spatial_and_temporal_extent() {
        let value = Temporal::sequence(
            vec![TInstant::new(Point2D::new(0.0, 0.0), t(0)), TInstant::new(Point2D::new(3.0, 4.0), t(2))],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let opts = MfJsonOptions {
            bounded_by: true,
            ..Default::default()
        };
        let out = to_mfjson(&value, &opts).unwrap();
        assert_eq!(out["stBoundedBy"]["bbox"], json!([0.0, 0.0, 3.0, 4.0]));
    }

    #[test]
    fn round_trip_instant_discrete_sequence_and_sequence() {
        let instant = Temporal::instant(Point2D::new(1.0, 2.0), t(0)).unwrap();
        let back: Temporal<Point2D> = from_mfjson(&to_mfjson(&instant, &MfJsonOptions::default()).unwrap()).unwrap();
        assert_eq!(instant, back);

        let discrete = Temporal::discrete_sequence(vec![
            TInstant::new(Point2D::new(0.0, 0.0), t(0)),
            TInstant::new(Point2D::new(1.0, 1.0), t(1)),
        ])
        .unwrap();
        let back: Temporal<Point2D> = from_mfjson(&to_mfjson(&discrete, &MfJsonOptions::default()).unwrap()).unwrap();
        assert_eq!(discrete, back);

        let sequence = Temporal::sequence(
            vec![TInstant::new(Point2D::new(0.0, 0.0), t(0)), TInstant::new(Point2D::new(1.0, 1.0), t(1))],
            true,
            false,
            TInterpolation::Linear,
        )
        .unwrap();
        let back: Temporal<Point2D> = from_mfjson(&to_mfjson(&sequence, &MfJsonOptions::default()).unwrap()).unwrap();
        assert_eq!(sequence, back);
    }

    #[test]
    fn round_trip_sequence_set() {
        let s1 = TSequence::new(
            vec![TInstant::new(Point2D::new(0.0, 0.0), t(0)), TInstant::new(Point2D::new(1.0, 1.0), t(1))],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let s2 = TSequence::new(
            vec![TInstant::new(Point2D::new(5.0, 5.0), t(3)), TInstant::new(Point2D::new(6.0, 6.0), t(4))],
            true,
            true,
            TInterpolation::Linear,
        )
        .unwrap();
        let set = Temporal::sequence_set(vec![s1, s2]).unwrap();
        let back: Temporal<Point2D> = from_mfjson(&to_mfjson(&set, &MfJsonOptions::default()).unwrap()).unwrap();
        assert_eq!(set, back);
    }

    #[test]
    fn ingestion_rejects_malformed_input() {
        let bad = json!({"type": "MovingPoint", "interpolations": ["Discrete"]});
        let err = from_mfjson::<Point2D>(&bad).unwrap_err();
        assert!(matches!(err, Error::InvalidArgValue(_)));
    }
}
