//! Text, WKT/EWKT, and MF-JSON input/output for base and temporal values.

pub mod mfjson;
pub mod text;
pub mod wkt;

pub use mfjson::{from_mfjson, to_mfjson, MfJsonCoordinates, MfJsonOptions};
pub use wkt::{ewkt_prefix, temporal_ewkt, GeometryCollaborator};
