use crate::error::ConfigurationError;
use crate::parameter::SamplingSpace;
use crate::prior::kind::{PriorConfig, PriorKind};
use crate::prior::ln_prior_1d::{LnPrior1D, LnPrior1DTrait};
use crate::prior::spline::MonotoneCubicSpline;

use itertools::Itertools;
use macro_const::macro_const;
use ndarray::Array1;
use statrs::distribution::{Beta, ContinuousCDF, Normal};

/// Number of grid points used to integrate a density without closed-form inverse CDF
pub const N_INTEGRATION_POINTS: usize = 10001;

/// Added at every integration step so the numerical CDF is strictly increasing
pub const CDF_FLOOR: f64 = 1e-10;

macro_const! {
    const DOC: &str = r"
Maps a point of the unit interval to a sampler coordinate distributed as the prior

Uniform, Gaussian and Beta priors use their exact inverse CDF. Every other prior is
integrated numerically over its bounds on a regular grid, the resulting CDF is normalized to
$[0, 1]$ and a monotone cubic spline maps CDF values back to the parameter. Those priors
are only allowed in Linear sampling space.

In Logarithmic space the returned value is the sampler coordinate $\log_2 x$, so decoding
it gives back the physical value $x$.
";
}

/// Coefficients prepared ahead of sampling by [PriorTransform::prepare]
#[derive(Clone, Debug)]
pub enum InverseCdf {
    /// Sampler-space bounds
    Uniform { lower: f64, upper: f64 },
    Gaussian(Normal),
    Beta(Beta),
    Spline(MonotoneCubicSpline),
}

#[doc = DOC!()]
#[derive(Clone, Debug)]
pub struct PriorTransform {
    space: SamplingSpace,
    inverse_cdf: InverseCdf,
}

impl PriorTransform {
    /// Prepare the inverse CDF of a prior defined over physical `bounds`
    pub fn prepare(
        prior: &PriorConfig,
        bounds: [f64; 2],
        space: SamplingSpace,
    ) -> Result<Self, ConfigurationError> {
        let invalid = |e: String| ConfigurationError::InvalidPriorParameters {
            kind: prior.kind,
            reason: e,
        };
        let inverse_cdf = match prior.kind {
            PriorKind::Uniform => {
                let [lower, upper] = space.bounds_to_sampler(bounds);
                InverseCdf::Uniform { lower, upper }
            }
            PriorKind::Gaussian => {
                let [mu, sigma] = two_parameters(prior)?;
                InverseCdf::Gaussian(Normal::new(mu, sigma).map_err(|e| invalid(e.to_string()))?)
            }
            PriorKind::Beta => {
                let [alpha, beta] = two_parameters(prior)?;
                InverseCdf::Beta(Beta::new(alpha, beta).map_err(|e| invalid(e.to_string()))?)
            }
            kind => {
                if space != SamplingSpace::Linear {
                    return Err(ConfigurationError::NonLinearSpaceForPrior { kind, space });
                }
                let density = LnPrior1D::from_config(prior, bounds)?;
                InverseCdf::Spline(integrate_inverse_cdf(&density, bounds))
            }
        };
        Ok(Self { space, inverse_cdf })
    }

    pub fn space(&self) -> SamplingSpace {
        self.space
    }

    pub fn inverse_cdf(&self) -> &InverseCdf {
        &self.inverse_cdf
    }

    /// Sampler coordinate for the unit-interval point `u`
    pub fn evaluate(&self, u: f64) -> f64 {
        match &self.inverse_cdf {
            InverseCdf::Uniform { lower, upper } => lower + u * (upper - lower),
            InverseCdf::Gaussian(normal) => self.space.to_sampler(normal.inverse_cdf(u)),
            InverseCdf::Beta(beta) => self.space.to_sampler(beta.inverse_cdf(u)),
            InverseCdf::Spline(spline) => spline.eval(u),
        }
    }

    /// Natural logarithm of the prior density of the physical value `x`
    pub fn log_density(prior: &PriorConfig, bounds: [f64; 2], x: f64) -> Result<f64, ConfigurationError> {
        Ok(LnPrior1D::from_config(prior, bounds)?.ln_prior_1d(x))
    }
}

fn two_parameters(prior: &PriorConfig) -> Result<[f64; 2], ConfigurationError> {
    prior
        .parameters
        .as_slice()
        .try_into()
        .map_err(|_| ConfigurationError::PriorParameterCount {
            kind: prior.kind,
            expected: 2,
            actual: prior.parameters.len(),
        })
}

fn integrate_inverse_cdf(density: &LnPrior1D, bounds: [f64; 2]) -> MonotoneCubicSpline {
    let grid = Array1::linspace(bounds[0], bounds[1], N_INTEGRATION_POINTS);
    let dx = grid[1] - grid[0];
    let pdf: Vec<f64> = grid
        .iter()
        .map(|&x| {
            let p = density.ln_prior_1d(x).exp();
            if p.is_finite() { p } else { 0.0 }
        })
        .collect();

    let mut cdf = Vec::with_capacity(N_INTEGRATION_POINTS);
    cdf.push(0.0);
    for (p0, p1) in pdf.iter().tuple_windows() {
        let last = cdf[cdf.len() - 1];
        cdf.push(last + 0.5 * (p0 + p1) * dx + CDF_FLOOR);
    }
    let total = cdf[cdf.len() - 1];
    cdf.iter_mut().for_each(|c| *c /= total);

    MonotoneCubicSpline::new(cdf, grid.to_vec())
}
