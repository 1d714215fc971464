//! `mobilitydb-core`: the temporal-value, spatiotemporal-index, and
//! windowed-aggregation core of a moving-object database, independent of
//! any particular host (a database engine, a standalone service, ...).
//!
//! - [`base`]: base value types (`f64`, `i32`, `bool`, points, poses, the
//!   double-N carriers) and their polymorphic comparators/arithmetic.
//! - [`collections`]: one-dimensional spans and span sets, the backbone of
//!   both the time domain and value-range restriction.
//! - [`temporal`]: the four temporal subtypes (instant, discrete sequence,
//!   continuous sequence, sequence set), their shared contract, and the
//!   generic lifting machinery restriction/interpolation is built on.
//! - [`boxes`]: bounding-geometry types (`TBox`, `STBox`) and the
//!   topological/positional predicates shared with the index layer.
//! - [`index`]: an in-memory R-tree plus the pure GiST/SP-GiST consistency
//!   and traversal functions a host index access method calls into.
//! - [`agg`]: the windowed-aggregation skiplist and the `wagg` driver built
//!   on it, for computing running min/max/sum/count/avg over sliding or
//!   accumulating time windows.
//! - [`io`]: base-type text I/O, WKT/EWKT emission, and MF-JSON emission.
//!
//! Errors are uniform across the crate: see [`errors::Error`] and
//! [`errors::Result`].

pub mod agg;
pub mod base;
pub mod boxes;
pub mod collections;
pub mod errors;
pub mod index;
pub mod io;
pub mod temporal;

pub use errors::{Error, Result};
