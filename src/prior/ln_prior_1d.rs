use crate::error::ConfigurationError;
use crate::prior::kde::KdeLnPrior1D;
use crate::prior::kind::{PriorConfig, PriorKind};

use enum_dispatch::enum_dispatch;
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::{LN_2, TAU};
use std::fmt::Debug;

#[enum_dispatch]
pub trait LnPrior1DTrait: Clone + Debug + Serialize + DeserializeOwned + PartialEq {
    /// Evaluate the natural logarithm of the prior density at x
    ///
    /// Bounds are not checked here, rejecting values outside of the parameter boundaries is up
    /// to the caller.
    fn ln_prior_1d(&self, x: f64) -> f64;
}

/// Natural logarithm of prior for a single physical parameter
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LnPrior1D {
    None(NoneLnPrior1D),
    Uniform(UniformLnPrior1D),
    Gaussian(GaussianLnPrior1D),
    HalfGaussian(HalfGaussianLnPrior1D),
    Jeffreys(JeffreysLnPrior1D),
    ModifiedJeffreys(ModifiedJeffreysLnPrior1D),
    TruncatedRayleigh(TruncatedRayleighLnPrior1D),
    WhiteNoise(WhiteNoiseLnPrior1D),
    Beta(BetaLnPrior1D),
    Kde(KdeLnPrior1D),
}

impl LnPrior1D {
    pub fn none() -> Self {
        NoneLnPrior1D {}.into()
    }

    pub fn uniform(left: f64, right: f64) -> Self {
        UniformLnPrior1D::new(left, right).into()
    }

    pub fn gaussian(mu: f64, std: f64) -> Self {
        GaussianLnPrior1D::new(mu, std).into()
    }

    pub fn half_gaussian(mu: f64, std: f64, positive: bool) -> Self {
        HalfGaussianLnPrior1D::new(mu, std, positive).into()
    }

    pub fn jeffreys(left: f64, right: f64) -> Self {
        JeffreysLnPrior1D::new(left, right).into()
    }

    pub fn modified_jeffreys(knee: f64, right: f64) -> Self {
        ModifiedJeffreysLnPrior1D::new(knee, right).into()
    }

    pub fn truncated_rayleigh(sigma: f64, truncation: f64) -> Self {
        TruncatedRayleighLnPrior1D::new(sigma, truncation).into()
    }

    pub fn white_noise(knee: f64) -> Self {
        WhiteNoiseLnPrior1D::new(knee).into()
    }

    pub fn beta(alpha: f64, beta: f64) -> Self {
        BetaLnPrior1D::new(alpha, beta).into()
    }

    pub fn kde(samples: &[f64]) -> Self {
        KdeLnPrior1D::new(samples, None).into()
    }

    /// Build the prior described by the configuration for a parameter with the given bounds
    pub fn from_config(config: &PriorConfig, bounds: [f64; 2]) -> Result<Self, ConfigurationError> {
        let kind = config.kind;
        let p = &config.parameters[..];
        if let Some(expected) = kind.n_parameters() {
            if p.len() != expected {
                return Err(ConfigurationError::PriorParameterCount {
                    kind,
                    expected,
                    actual: p.len(),
                });
            }
        }
        let invalid = |reason: &str| ConfigurationError::InvalidPriorParameters {
            kind,
            reason: reason.to_owned(),
        };
        let positive = |x: f64| x.is_finite() && x > 0.0;

        let prior = match kind {
            PriorKind::None => Self::none(),
            PriorKind::Uniform => Self::uniform(bounds[0], bounds[1]),
            PriorKind::Gaussian | PriorKind::HalfGaussian | PriorKind::NegativeHalfGaussian => {
                if !p[0].is_finite() || !positive(p[1]) {
                    return Err(invalid("mean must be finite and sigma positive"));
                }
                match kind {
                    PriorKind::Gaussian => Self::gaussian(p[0], p[1]),
                    PriorKind::HalfGaussian => Self::half_gaussian(p[0], p[1], true),
                    _ => Self::half_gaussian(p[0], p[1], false),
                }
            }
            PriorKind::Jeffreys => {
                if !positive(bounds[0]) {
                    return Err(invalid("lower bound must be positive"));
                }
                Self::jeffreys(bounds[0], bounds[1])
            }
            PriorKind::ModifiedJeffreys => {
                if !positive(p[0]) {
                    return Err(invalid("knee must be positive"));
                }
                Self::modified_jeffreys(p[0], bounds[1])
            }
            PriorKind::TruncatedRayleigh => {
                if !positive(p[0]) || !positive(p[1]) {
                    return Err(invalid("sigma and truncation must be positive"));
                }
                Self::truncated_rayleigh(p[0], p[1])
            }
            PriorKind::WhiteNoisePrior => {
                if !positive(p[0]) {
                    return Err(invalid("knee must be positive"));
                }
                Self::white_noise(p[0])
            }
            PriorKind::Beta => {
                if !positive(p[0]) || !positive(p[1]) {
                    return Err(invalid("alpha and beta must be positive"));
                }
                Self::beta(p[0], p[1])
            }
            PriorKind::File => {
                if p.len() < 2 || p.iter().any(|x| !x.is_finite()) {
                    return Err(invalid("at least two finite samples are required"));
                }
                if !positive(KdeLnPrior1D::scott_bandwidth(p)) {
                    return Err(invalid("samples must not be all equal"));
                }
                Self::kde(p)
            }
        };
        Ok(prior)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct NoneLnPrior1D {}

impl LnPrior1DTrait for NoneLnPrior1D {
    fn ln_prior_1d(&self, _x: f64) -> f64 {
        0.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "UniformLnPrior1DParameters",
    from = "UniformLnPrior1DParameters"
)]
pub struct UniformLnPrior1D {
    range: std::ops::RangeInclusive<NotNan<f64>>,
    ln_prob: NotNan<f64>,
}

impl UniformLnPrior1D {
    pub fn new(left: f64, right: f64) -> Self {
        let left = NotNan::new(left).expect("left must be finite");
        let right = NotNan::new(right).expect("right must be finite");
        Self {
            range: left..=right,
            ln_prob: NotNan::new(-f64::ln(right.into_inner() - left.into_inner()))
                .expect("right must be larger than left"),
        }
    }

    fn left(&self) -> f64 {
        self.range.start().into_inner()
    }

    fn right(&self) -> f64 {
        self.range.end().into_inner()
    }
}

impl LnPrior1DTrait for UniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NEG_INFINITY;
        }
        self.ln_prob.into_inner()
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "UniformLnPrior")]
struct UniformLnPrior1DParameters {
    range: std::ops::RangeInclusive<f64>,
}

impl From<UniformLnPrior1D> for UniformLnPrior1DParameters {
    fn from(f: UniformLnPrior1D) -> Self {
        Self {
            range: f.left()..=f.right(),
        }
    }
}

impl From<UniformLnPrior1DParameters> for UniformLnPrior1D {
    fn from(f: UniformLnPrior1DParameters) -> Self {
        Self::new(*f.range.start(), *f.range.end())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "GaussianLnPrior1DParameters",
    from = "GaussianLnPrior1DParameters"
)]
pub struct GaussianLnPrior1D {
    mu: NotNan<f64>,
    inv_std2: NotNan<f64>,
    ln_prob_coeff: NotNan<f64>,
}

impl GaussianLnPrior1D {
    pub fn new(mu: f64, std: f64) -> Self {
        Self {
            mu: NotNan::new(mu).expect("mu must be not NaN"),
            inv_std2: NotNan::new(std.powi(-2)).expect("std must be positive and finite"),
            ln_prob_coeff: NotNan::new(-f64::ln(std) - 0.5 * f64::ln(TAU))
                .expect("std must be positive and finite"),
        }
    }

    pub fn mu(&self) -> f64 {
        self.mu.into_inner()
    }

    pub fn std(&self) -> f64 {
        self.inv_std2.into_inner().recip().sqrt()
    }
}

impl LnPrior1DTrait for GaussianLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let diff = self.mu() - x;
        self.ln_prob_coeff.into_inner() - 0.5 * diff.powi(2) * self.inv_std2.into_inner()
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "GaussianLnPrior1D")]
struct GaussianLnPrior1DParameters {
    mu: f64,
    std: f64,
}

impl From<GaussianLnPrior1D> for GaussianLnPrior1DParameters {
    fn from(f: GaussianLnPrior1D) -> Self {
        Self {
            mu: f.mu(),
            std: f.std(),
        }
    }
}

impl From<GaussianLnPrior1DParameters> for GaussianLnPrior1D {
    fn from(f: GaussianLnPrior1DParameters) -> Self {
        Self::new(f.mu, f.std)
    }
}

/// Gaussian folded onto one side of zero, `positive` selects the allowed side
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct HalfGaussianLnPrior1D {
    gaussian: GaussianLnPrior1D,
    positive: bool,
}

impl HalfGaussianLnPrior1D {
    pub fn new(mu: f64, std: f64, positive: bool) -> Self {
        Self {
            gaussian: GaussianLnPrior1D::new(mu, std),
            positive,
        }
    }
}

impl LnPrior1DTrait for HalfGaussianLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if (self.positive && x < 0.0) || (!self.positive && x > 0.0) {
            return f64::NEG_INFINITY;
        }
        LN_2 + self.gaussian.ln_prior_1d(x)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct JeffreysLnPrior1D {
    ln_prob_coeff: NotNan<f64>,
}

impl JeffreysLnPrior1D {
    pub fn new(left: f64, right: f64) -> Self {
        assert!(0.0 < left && left < right);
        Self {
            ln_prob_coeff: NotNan::new(-f64::ln(f64::ln(right / left)))
                .expect("bounds must be positive and finite"),
        }
    }
}

impl LnPrior1DTrait for JeffreysLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if x <= 0.0 || x.is_nan() {
            return f64::NEG_INFINITY;
        }
        self.ln_prob_coeff.into_inner() - f64::ln(x)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct ModifiedJeffreysLnPrior1D {
    knee: NotNan<f64>,
    ln_norm: NotNan<f64>,
}

impl ModifiedJeffreysLnPrior1D {
    pub fn new(knee: f64, right: f64) -> Self {
        Self {
            knee: NotNan::new(knee).expect("knee must be not NaN"),
            ln_norm: NotNan::new(f64::ln(f64::ln_1p(right / knee)))
                .expect("knee and the upper bound must be positive"),
        }
    }
}

impl LnPrior1DTrait for ModifiedJeffreysLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let knee = self.knee.into_inner();
        -f64::ln(knee * (1.0 + x / knee)) - self.ln_norm.into_inner()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct TruncatedRayleighLnPrior1D {
    sigma: NotNan<f64>,
    ln_norm: NotNan<f64>,
}

impl TruncatedRayleighLnPrior1D {
    pub fn new(sigma: f64, truncation: f64) -> Self {
        let norm = 1.0 - f64::exp(-truncation.powi(2) / (2.0 * sigma.powi(2)));
        Self {
            sigma: NotNan::new(sigma).expect("sigma must be not NaN"),
            ln_norm: NotNan::new(f64::ln(norm)).expect("sigma and truncation must be positive"),
        }
    }
}

impl LnPrior1DTrait for TruncatedRayleighLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let sigma2 = self.sigma.into_inner().powi(2);
        f64::ln(x / sigma2) - x.powi(2) / (2.0 * sigma2) - self.ln_norm.into_inner()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct WhiteNoiseLnPrior1D {
    knee: NotNan<f64>,
}

impl WhiteNoiseLnPrior1D {
    pub fn new(knee: f64) -> Self {
        Self {
            knee: NotNan::new(knee).expect("knee must be not NaN"),
        }
    }
}

impl LnPrior1DTrait for WhiteNoiseLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let knee = self.knee.into_inner();
        -f64::ln(knee * (1.0 + x / knee))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(into = "BetaLnPrior1DParameters", from = "BetaLnPrior1DParameters")]
pub struct BetaLnPrior1D {
    alpha: NotNan<f64>,
    beta: NotNan<f64>,
    ln_beta_function: NotNan<f64>,
}

impl BetaLnPrior1D {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self {
            alpha: NotNan::new(alpha).expect("alpha must be not NaN"),
            beta: NotNan::new(beta).expect("beta must be not NaN"),
            ln_beta_function: NotNan::new(ln_gamma(alpha) + ln_gamma(beta) - ln_gamma(alpha + beta))
                .expect("alpha and beta must be positive and finite"),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha.into_inner()
    }

    pub fn beta(&self) -> f64 {
        self.beta.into_inner()
    }
}

impl LnPrior1DTrait for BetaLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return f64::NEG_INFINITY;
        }
        (self.alpha() - 1.0) * f64::ln(x) + (self.beta() - 1.0) * f64::ln_1p(-x)
            - self.ln_beta_function.into_inner()
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "BetaLnPrior1D")]
struct BetaLnPrior1DParameters {
    alpha: f64,
    beta: f64,
}

impl From<BetaLnPrior1D> for BetaLnPrior1DParameters {
    fn from(f: BetaLnPrior1D) -> Self {
        Self {
            alpha: f.alpha(),
            beta: f.beta(),
        }
    }
}

impl From<BetaLnPrior1DParameters> for BetaLnPrior1D {
    fn from(f: BetaLnPrior1DParameters) -> Self {
        Self::new(f.alpha, f.beta)
    }
}
