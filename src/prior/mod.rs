//! One-parameter priors: log-densities and inverse-CDF transforms

pub mod kde;
pub mod kind;
pub mod ln_prior_1d;
pub mod spline;
pub mod transform;

pub use kind::{PriorConfig, PriorKind};
pub use ln_prior_1d::{LnPrior1D, LnPrior1DTrait};
pub use transform::{InverseCdf, PriorTransform};
