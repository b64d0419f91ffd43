use crate::prior::ln_prior_1d::LnPrior1DTrait;

use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Gaussian kernel-density estimate of a pre-fitted posterior, used as a prior
///
/// Stands for the "File" prior: the density was fitted elsewhere and only its samples are kept.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct KdeLnPrior1D {
    samples: Vec<NotNan<f64>>,
    bandwidth: NotNan<f64>,
}

impl KdeLnPrior1D {
    /// Build the estimate, `bandwidth` defaults to Scott's rule
    pub fn new(samples: &[f64], bandwidth: Option<f64>) -> Self {
        assert!(samples.len() > 1, "at least two samples are required");
        let bandwidth = bandwidth.unwrap_or_else(|| Self::scott_bandwidth(samples));
        Self {
            samples: samples
                .iter()
                .map(|&x| NotNan::new(x).expect("samples must be not NaN"))
                .collect(),
            bandwidth: NotNan::new(bandwidth)
                .ok()
                .filter(|h| h.into_inner() > 0.0)
                .expect("bandwidth must be positive"),
        }
    }

    pub(crate) fn scott_bandwidth(samples: &[f64]) -> f64 {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt() * n.powf(-0.2)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth.into_inner()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let h = self.bandwidth();
        let norm = 1.0 / (h * TAU.sqrt() * self.samples.len() as f64);
        norm * self
            .samples
            .iter()
            .map(|s| f64::exp(-0.5 * ((x - s.into_inner()) / h).powi(2)))
            .sum::<f64>()
    }
}

impl LnPrior1DTrait for KdeLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        f64::ln(self.pdf(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn integrates_to_unity() {
        let kde = KdeLnPrior1D::new(&[0.9, 1.0, 1.05, 1.2, 1.3], None);
        let n = 20_001;
        let (a, b) = (-2.0, 4.0);
        let dx = (b - a) / (n - 1) as f64;
        let integral: f64 = (0..n).map(|i| kde.pdf(a + dx * i as f64) * dx).sum();
        assert_relative_eq!(integral, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn peaks_near_samples() {
        let kde = KdeLnPrior1D::new(&[0.0, 0.1, -0.1, 0.05], Some(0.1));
        assert!(kde.ln_prior_1d(0.0) > kde.ln_prior_1d(1.0));
    }
}
