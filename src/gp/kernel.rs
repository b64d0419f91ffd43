use crate::error::GpError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Quasi-periodic covariance of stellar activity
///
/// k(τ) = h² exp(−sin²(πτ/P_rot) / (2 O_amp²) − τ² / (2 P_dec²))
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct QuasiPeriodicKernel {
    /// Amplitude h
    pub h_amp: f64,
    /// Rotational period
    pub p_rot: f64,
    /// Decay timescale of active regions
    pub p_dec: f64,
    /// Coherence scale of the periodic part
    pub o_amp: f64,
}

impl QuasiPeriodicKernel {
    pub const N_PARAMETERS: usize = 4;

    /// Parameter vector order `[Hamp, Prot, Pdec, Oamp]`
    pub fn from_parameter_vector(p: &[f64]) -> Result<Self, GpError> {
        match *p {
            [h_amp, p_rot, p_dec, o_amp] => Ok(Self {
                h_amp,
                p_rot,
                p_dec,
                o_amp,
            }),
            _ => Err(GpError::ParameterVector {
                expected: Self::N_PARAMETERS,
                actual: p.len(),
            }),
        }
    }

    pub fn parameter_vector(&self) -> [f64; 4] {
        [self.h_amp, self.p_rot, self.p_dec, self.o_amp]
    }

    #[inline]
    pub fn eval(&self, tau: f64) -> f64 {
        let periodic = (PI * tau / self.p_rot).sin().powi(2) / (2.0 * self.o_amp.powi(2));
        let decay = tau.powi(2) / (2.0 * self.p_dec.powi(2));
        self.h_amp.powi(2) * (-periodic - decay).exp()
    }
}

impl Default for QuasiPeriodicKernel {
    fn default() -> Self {
        Self {
            h_amp: 1.0,
            p_rot: 10.0,
            p_dec: 20.0,
            o_amp: 0.35,
        }
    }
}
