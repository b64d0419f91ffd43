//! Gaussian-process collaborator of the composer
//!
//! The composer only talks to [GaussianProcess]. [DenseGaussianProcess] is an exact
//! O(n³) implementation suited to datasets of up to a few thousand points.

mod cholesky;
pub use cholesky::Cholesky;

mod dense;
pub use dense::DenseGaussianProcess;

mod kernel;
pub use kernel::QuasiPeriodicKernel;

use crate::error::GpError;

use ndarray::{Array1, ArrayView1};
use rand::RngCore;

/// Handle of a Gaussian process conditioned on one dataset
///
/// The handle caches the covariance factorization, so `compute` must be called after every
/// `set_parameter_vector` and before the other methods.
pub trait GaussianProcess {
    fn n_parameters(&self) -> usize;

    fn set_parameter_vector(&mut self, parameters: &[f64]) -> Result<(), GpError>;

    /// Factorize the covariance at abscissas `x` with white-noise uncertainties `yerr`
    fn compute(&mut self, x: ArrayView1<f64>, yerr: ArrayView1<f64>) -> Result<(), GpError>;

    fn log_likelihood(&self, residuals: ArrayView1<f64>) -> Result<f64, GpError>;

    /// Predictive mean and variance at `x_query`
    fn predict(
        &self,
        residuals: ArrayView1<f64>,
        x_query: ArrayView1<f64>,
    ) -> Result<(Array1<f64>, Array1<f64>), GpError>;

    fn sample_conditional(
        &self,
        residuals: ArrayView1<f64>,
        x_query: ArrayView1<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<Array1<f64>, GpError>;
}
