//! Bounding-geometry model: [`TBox`] (value x time) and [`STBox`]
//! (space x time), plus the twelve topological/positional predicates shared
//! with [`crate::index::gist`].

pub mod stbox;
pub mod tbox;

pub use stbox::STBox;
pub use tbox::TBox;
