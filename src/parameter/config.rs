use crate::parameter::SamplingSpace;
use crate::prior::PriorConfig;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// User configuration of a single parameter, every field is optional
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ParameterConfig {
    /// Physical-space boundaries
    pub bounds: Option<[f64; 2]>,
    pub space: Option<SamplingSpace>,
    pub prior: Option<PriorConfig>,
    /// Removes the parameter from theta
    pub fixed: Option<f64>,
    /// Gaussian uncertainty of the fixed value, used for randomized derivations
    pub fixed_error: Option<f64>,
    /// Starting value of the sampler, physical space
    pub starts: Option<f64>,
}

impl ParameterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(value: f64) -> Self {
        Self {
            fixed: Some(value),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some([lower, upper]);
        self
    }

    pub fn with_space(mut self, space: SamplingSpace) -> Self {
        self.space = Some(space);
        self
    }

    pub fn with_prior(mut self, prior: PriorConfig) -> Self {
        self.prior = Some(prior);
        self
    }

    pub fn with_fixed_error(mut self, error: f64) -> Self {
        self.fixed_error = Some(error);
        self
    }

    pub fn with_start(mut self, start: f64) -> Self {
        self.starts = Some(start);
        self
    }
}

/// Entity-provided fallback for a parameter the configuration doesn't describe
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDefaults {
    pub bounds: [f64; 2],
    pub space: SamplingSpace,
    pub prior: PriorConfig,
    /// Angle in radians, wraps around by a full turn
    pub circular: bool,
}

impl ParameterDefaults {
    pub fn linear(lower: f64, upper: f64) -> Self {
        Self {
            bounds: [lower, upper],
            space: SamplingSpace::Linear,
            prior: PriorConfig::uniform(),
            circular: false,
        }
    }

    pub fn logarithmic(lower: f64, upper: f64) -> Self {
        Self {
            space: SamplingSpace::Logarithmic,
            ..Self::linear(lower, upper)
        }
    }

    pub fn angle(lower: f64, upper: f64) -> Self {
        Self {
            circular: true,
            ..Self::linear(lower, upper)
        }
    }
}

/// Bounds, space, prior and wrapping of a parameter after merging configuration and defaults
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedParameter {
    pub bounds: [f64; 2],
    pub space: SamplingSpace,
    pub prior: PriorConfig,
    pub circular: bool,
}
