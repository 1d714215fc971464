//! The three ways a sequence fills the gaps between its samples.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TInterpolation {
    /// The value is defined only at the sampled instants.
    Discrete,
    /// Holds the last sample's value until the next one.
    Step,
    /// Affine interpolation between consecutive samples.
    Linear,
}

impl fmt::Display for TInterpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TInterpolation::Discrete => "Discrete",
            TInterpolation::Step => "Step",
            TInterpolation::Linear => "Linear",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TInterpolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "discrete" => Ok(TInterpolation::Discrete),
            "step" | "stepwise" => Ok(TInterpolation::Step),
            "linear" => Ok(TInterpolation::Linear),
            other => Err(Error::invalid_value(format!(
                "unrecognized interpolation: {other}"
            ))),
        }
    }
}
