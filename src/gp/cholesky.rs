use crate::error::GpError;

use ndarray::{Array1, Array2, ArrayView1};

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix
#[derive(Clone, Debug)]
pub struct Cholesky {
    l: Array2<f64>,
}

impl Cholesky {
    pub fn decompose(a: &Array2<f64>) -> Result<Self, GpError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(GpError::SizeMismatch {
                expected: n,
                actual: a.ncols(),
            });
        }
        let mut l = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..=i {
                let mut s = 0.0;
                for k in 0..j {
                    s += l[[i, k]] * l[[j, k]];
                }
                if i == j {
                    let diag = a[[i, i]] - s;
                    if diag <= 1e-300 || !diag.is_finite() {
                        return Err(GpError::NotPositiveDefinite);
                    }
                    l[[i, j]] = diag.sqrt();
                } else {
                    l[[i, j]] = (a[[i, j]] - s) / l[[j, j]];
                }
            }
        }
        Ok(Self { l })
    }

    pub fn dim(&self) -> usize {
        self.l.nrows()
    }

    pub fn factor(&self) -> &Array2<f64> {
        &self.l
    }

    pub fn ln_det(&self) -> f64 {
        2.0 * self.l.diag().iter().map(|x| x.ln()).sum::<f64>()
    }

    /// Solve `L y = b`
    pub fn solve_lower(&self, b: ArrayView1<f64>) -> Array1<f64> {
        let n = self.dim();
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let s: f64 = (0..i).map(|k| self.l[[i, k]] * y[k]).sum();
            y[i] = (b[i] - s) / self.l[[i, i]];
        }
        y
    }

    /// Solve `Lᵀ x = y`
    pub fn solve_upper(&self, y: ArrayView1<f64>) -> Array1<f64> {
        let n = self.dim();
        let mut x = Array1::zeros(n);
        for i in (0..n).rev() {
            let s: f64 = (i + 1..n).map(|k| self.l[[k, i]] * x[k]).sum();
            x[i] = (y[i] - s) / self.l[[i, i]];
        }
        x
    }

    /// Solve `A x = b`
    pub fn solve(&self, b: ArrayView1<f64>) -> Array1<f64> {
        self.solve_upper(self.solve_lower(b).view())
    }
}
