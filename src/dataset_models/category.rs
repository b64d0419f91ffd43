use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Role of a dataset model in the composition of the dataset prediction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ModelCategory {
    /// Adds to the white-noise term, no forward-model contribution
    Jitter,
    /// Added to the prediction before any other model
    Systematic,
    /// Relative flux, multiplied by the normalization
    Unitary,
    /// Multiplies the unitary contribution
    Normalization,
    Additive,
    /// Conditioned on the residuals of every other model
    GaussianProcess,
    /// Provided by the dynamical integrator, once per theta for all datasets
    Dynamical,
}
