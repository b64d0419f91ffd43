use crate::dataset_models::{DatasetModelTrait, ModelCategory, Values, variable};
use crate::error::ComposeError;
use crate::kepler::kepler_rv;

use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const KEPLERIAN_PAMS: [&str; 5] = ["P", "K", "e", "o", "f"];

/// Keplerian radial velocity of one planet
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RadialVelocity {}

impl RadialVelocity {
    pub fn new() -> Self {
        Self {}
    }
}

/// Radial velocity of `values` at `x0`, shared with the Keplerian integrator
pub(crate) fn keplerian(
    model: &str,
    values: &Values,
    x0: ArrayView1<f64>,
) -> Result<Array1<f64>, ComposeError> {
    let period = variable(values, model, "P")?;
    let k = variable(values, model, "K")?;
    let e = variable(values, model, "e")?;
    let omega = variable(values, model, "o")?;
    let mean_longitude = variable(values, model, "f")?;
    let t_ref = values.get("Tref").copied().unwrap_or(0.0);
    Ok(x0.mapv(|t| kepler_rv(t, period, k, mean_longitude, e, omega, t_ref)))
}

impl DatasetModelTrait for RadialVelocity {
    fn model_class(&self) -> &'static str {
        "radial_velocities"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Additive
    }

    fn common_class(&self) -> Option<&'static str> {
        Some("planet")
    }

    fn common_pams(&self) -> Vec<String> {
        KEPLERIAN_PAMS.iter().map(|&s| s.to_owned()).collect()
    }

    fn compute(&self, values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError> {
        keplerian(self.model_class(), values, x0)
    }
}

/// Radial velocity of all referenced planets, supplied by a
/// [crate::dynamical::DynamicalIntegrator] once per theta
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Dynamical {}

impl Dynamical {
    pub fn new() -> Self {
        Self {}
    }
}

impl DatasetModelTrait for Dynamical {
    fn model_class(&self) -> &'static str {
        "dynamical"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Dynamical
    }

    fn common_class(&self) -> Option<&'static str> {
        Some("planet")
    }

    fn common_pams(&self) -> Vec<String> {
        KEPLERIAN_PAMS.iter().map(|&s| s.to_owned()).collect()
    }

    /// Contribution of a single planet, the integrator sums them
    fn compute(&self, values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError> {
        keplerian(self.model_class(), values, x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::f64::consts::TAU;

    #[test]
    fn circular_orbit() {
        let values = Values::from([
            ("P".to_owned(), 4.0),
            ("K".to_owned(), 3.0),
            ("e".to_owned(), 0.0),
            ("o".to_owned(), 0.0),
            ("f".to_owned(), 0.0),
        ]);
        let x0 = array![0.0, 1.0, 2.0, 3.0];
        let rv = RadialVelocity::new().compute(&values, x0.view()).unwrap();
        assert_abs_diff_eq!(rv, x0.mapv(|t| 3.0 * (TAU * t / 4.0).cos()), epsilon = 1e-9);
    }

    #[test]
    fn missing_variable() {
        let values = Values::from([("P".to_owned(), 4.0)]);
        let error = RadialVelocity::new()
            .compute(&values, array![0.0].view())
            .unwrap_err();
        assert_eq!(
            error,
            ComposeError::MissingVariable {
                model: "radial_velocities".to_owned(),
                name: "K".to_owned(),
            }
        );
    }
}
