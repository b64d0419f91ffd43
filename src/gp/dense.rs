use crate::error::GpError;
use crate::gp::cholesky::Cholesky;
use crate::gp::kernel::QuasiPeriodicKernel;
use crate::gp::GaussianProcess;

use ndarray::{Array1, Array2, ArrayView1, Zip};
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use std::f64::consts::TAU;

/// Diagonal regularization of the predictive covariance before it is factorized
const PREDICTIVE_JITTER: f64 = 1e-10;

/// Gaussian process with a dense covariance matrix
#[derive(Clone, Debug, Default)]
pub struct DenseGaussianProcess {
    kernel: QuasiPeriodicKernel,
    x: Array1<f64>,
    factor: Option<Cholesky>,
}

impl DenseGaussianProcess {
    pub fn new(kernel: QuasiPeriodicKernel) -> Self {
        Self {
            kernel,
            x: Array1::zeros(0),
            factor: None,
        }
    }

    pub fn kernel(&self) -> &QuasiPeriodicKernel {
        &self.kernel
    }

    fn factor(&self) -> Result<&Cholesky, GpError> {
        self.factor.as_ref().ok_or(GpError::NotComputed)
    }

    fn check_residuals(&self, residuals: ArrayView1<f64>) -> Result<(), GpError> {
        if residuals.len() == self.x.len() {
            Ok(())
        } else {
            Err(GpError::SizeMismatch {
                expected: self.x.len(),
                actual: residuals.len(),
            })
        }
    }

    fn cross_covariance(&self, x_query: ArrayView1<f64>) -> Array2<f64> {
        Array2::from_shape_fn((self.x.len(), x_query.len()), |(i, j)| {
            self.kernel.eval(self.x[i] - x_query[j])
        })
    }

    /// Predictive mean and the columns `L⁻¹ K*` reused by the covariance
    fn conditional(
        &self,
        residuals: ArrayView1<f64>,
        x_query: ArrayView1<f64>,
    ) -> Result<(Array1<f64>, Array2<f64>), GpError> {
        let factor = self.factor()?;
        self.check_residuals(residuals)?;
        let alpha = factor.solve(residuals);
        let k_star = self.cross_covariance(x_query);
        let mean = k_star.t().dot(&alpha);
        let mut v = Array2::zeros(k_star.raw_dim());
        Zip::from(v.columns_mut())
            .and(k_star.columns())
            .for_each(|mut v, k| v.assign(&factor.solve_lower(k)));
        Ok((mean, v))
    }
}

impl GaussianProcess for DenseGaussianProcess {
    fn n_parameters(&self) -> usize {
        QuasiPeriodicKernel::N_PARAMETERS
    }

    fn set_parameter_vector(&mut self, parameters: &[f64]) -> Result<(), GpError> {
        self.kernel = QuasiPeriodicKernel::from_parameter_vector(parameters)?;
        self.factor = None;
        Ok(())
    }

    fn compute(&mut self, x: ArrayView1<f64>, yerr: ArrayView1<f64>) -> Result<(), GpError> {
        if x.len() != yerr.len() {
            return Err(GpError::SizeMismatch {
                expected: x.len(),
                actual: yerr.len(),
            });
        }
        let covariance = Array2::from_shape_fn((x.len(), x.len()), |(i, j)| {
            let k = self.kernel.eval(x[i] - x[j]);
            if i == j { k + yerr[i].powi(2) } else { k }
        });
        self.factor = Some(Cholesky::decompose(&covariance)?);
        self.x = x.to_owned();
        Ok(())
    }

    fn log_likelihood(&self, residuals: ArrayView1<f64>) -> Result<f64, GpError> {
        let factor = self.factor()?;
        self.check_residuals(residuals)?;
        let y = factor.solve_lower(residuals);
        Ok(-0.5 * (y.dot(&y) + factor.ln_det() + residuals.len() as f64 * TAU.ln()))
    }

    fn predict(
        &self,
        residuals: ArrayView1<f64>,
        x_query: ArrayView1<f64>,
    ) -> Result<(Array1<f64>, Array1<f64>), GpError> {
        let (mean, v) = self.conditional(residuals, x_query)?;
        let prior_variance = self.kernel.eval(0.0);
        let variance = v
            .columns()
            .into_iter()
            .map(|column| (prior_variance - column.dot(&column)).max(0.0))
            .collect();
        Ok((mean, variance))
    }

    fn sample_conditional(
        &self,
        residuals: ArrayView1<f64>,
        x_query: ArrayView1<f64>,
        rng: &mut dyn RngCore,
    ) -> Result<Array1<f64>, GpError> {
        let (mean, v) = self.conditional(residuals, x_query)?;
        let mut covariance = Array2::from_shape_fn((x_query.len(), x_query.len()), |(i, j)| {
            self.kernel.eval(x_query[i] - x_query[j])
        }) - v.t().dot(&v);
        covariance.diag_mut().map_inplace(|x| *x += PREDICTIVE_JITTER);
        let factor = Cholesky::decompose(&covariance)?;
        let z: Array1<f64> = (0..x_query.len())
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Ok(mean + factor.factor().dot(&z))
    }
}
