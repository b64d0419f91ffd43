use crate::error::ConfigurationError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Space the sampler explores for a parameter
///
/// In [SamplingSpace::Logarithmic] the sampler works with log2 of the physical value.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum SamplingSpace {
    #[default]
    Linear,
    #[serde(alias = "Log")]
    Logarithmic,
}

impl SamplingSpace {
    /// Physical value to sampler coordinate
    #[inline]
    pub fn to_sampler(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Logarithmic => x.log2(),
        }
    }

    /// Sampler coordinate to physical value
    #[inline]
    pub fn to_physical(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Logarithmic => x.exp2(),
        }
    }

    pub fn bounds_to_sampler(self, bounds: [f64; 2]) -> [f64; 2] {
        [self.to_sampler(bounds[0]), self.to_sampler(bounds[1])]
    }
}

impl FromStr for SamplingSpace {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Linear" => Ok(Self::Linear),
            "Logarithmic" | "Log" => Ok(Self::Logarithmic),
            _ => Err(ConfigurationError::UnknownName {
                what: "sampling space",
                name: s.to_owned(),
            }),
        }
    }
}
