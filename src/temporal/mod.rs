//! The temporal-value core: the four subtypes, their shared public
//! contract, lifting, and the concrete numeric operator set built on it.

pub mod core;
pub mod discrete_sequence;
pub mod instant;
pub mod interpolation;
pub mod lifting;
pub mod numeric_ops;
pub mod sequence;
pub mod sequence_set;

pub use core::{Temporal, TemporalBbox};
pub use discrete_sequence::TDiscreteSequence;
pub use instant::TInstant;
pub use interpolation::TInterpolation;
pub use sequence::{RestrictMode, Side, TSequence};
pub use sequence_set::TSequenceSet;
