use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings of an ensemble-sampler run
///
/// The sampler itself lives outside of this crate, these values size the initial population
/// and describe the chain to be stored.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EmceeParameters {
    /// Walkers per sampled dimension
    #[serde(default = "EmceeParameters::default_npop_mult")]
    pub npop_mult: usize,
    #[serde(default = "EmceeParameters::default_nsteps")]
    pub nsteps: usize,
    /// Steps discarded from the beginning of the chain
    #[serde(default = "EmceeParameters::default_nburn")]
    pub nburn: usize,
    #[serde(default = "EmceeParameters::default_thin")]
    pub thin: usize,
    /// Steps between checkpoints, zero disables them
    #[serde(default)]
    pub nsave: usize,
    /// Fix every jitter at zero before initialization
    #[serde(default)]
    pub shutdown_jitter: bool,
}

impl EmceeParameters {
    pub fn default_npop_mult() -> usize {
        2
    }

    pub fn default_nsteps() -> usize {
        20000
    }

    pub fn default_nburn() -> usize {
        10000
    }

    pub fn default_thin() -> usize {
        100
    }

    /// Number of walkers, `ndim × npop_mult` rounded up to an even number
    pub fn nwalkers(&self, ndim: usize) -> usize {
        let nwalkers = ndim * self.npop_mult;
        nwalkers + nwalkers % 2
    }

    /// Number of stored samples per walker after burn-in and thinning
    pub fn nsamples(&self) -> usize {
        self.nsteps.saturating_sub(self.nburn) / self.thin.max(1)
    }
}

impl Default for EmceeParameters {
    fn default() -> Self {
        Self {
            npop_mult: Self::default_npop_mult(),
            nsteps: Self::default_nsteps(),
            nburn: Self::default_nburn(),
            thin: Self::default_thin(),
            nsave: 0,
            shutdown_jitter: false,
        }
    }
}
