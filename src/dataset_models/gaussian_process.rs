use crate::dataset_models::{DatasetModelTrait, ModelCategory, Values, variable};
use crate::error::ComposeError;
use crate::gp::{DenseGaussianProcess, GaussianProcess, QuasiPeriodicKernel};
use crate::parameter::ParameterDefaults;

use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quasi-periodic Gaussian process of stellar activity
///
/// Hyperparameters `Prot`, `Pdec` and `Oamp` come from an activity common model, the amplitude
/// `Hamp` is dataset-local.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct QuasiPeriodicGp {}

impl QuasiPeriodicGp {
    pub fn new() -> Self {
        Self {}
    }
}

impl DatasetModelTrait for QuasiPeriodicGp {
    fn model_class(&self) -> &'static str {
        "gp_quasiperiodic"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::GaussianProcess
    }

    fn common_class(&self) -> Option<&'static str> {
        Some("activity")
    }

    fn common_pams(&self) -> Vec<String> {
        vec!["Prot".to_owned(), "Pdec".to_owned(), "Oamp".to_owned()]
    }

    fn dataset_pams(&self) -> BTreeMap<String, ParameterDefaults> {
        BTreeMap::from([("Hamp".to_owned(), ParameterDefaults::logarithmic(1e-4, 1e4))])
    }

    /// The process has no deterministic contribution, its prediction is added by the
    /// composer once every other model is known
    fn compute(&self, _values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError> {
        Ok(Array1::zeros(x0.len()))
    }

    fn gp_parameters(&self, values: &Values) -> Result<Vec<f64>, ComposeError> {
        ["Hamp", "Prot", "Pdec", "Oamp"]
            .iter()
            .map(|name| variable(values, self.model_class(), name))
            .collect()
    }

    fn new_gaussian_process(&self) -> Option<Box<dyn GaussianProcess + Send>> {
        Some(Box::new(DenseGaussianProcess::new(
            QuasiPeriodicKernel::default(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_vector_order() {
        let values = Values::from([
            ("Prot".to_owned(), 12.0),
            ("Pdec".to_owned(), 40.0),
            ("Oamp".to_owned(), 0.3),
            ("Hamp".to_owned(), 5.0),
        ]);
        let model = QuasiPeriodicGp::new();
        assert_eq!(
            model.gp_parameters(&values).unwrap(),
            [5.0, 12.0, 40.0, 0.3]
        );
        assert_eq!(model.new_gaussian_process().unwrap().n_parameters(), 4);
    }
}
