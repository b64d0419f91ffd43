use crate::common::polynomial::{coefficient_name, evaluate_polynomial};
use crate::dataset_models::{DatasetModelTrait, ModelCategory, Values, variable};
use crate::error::ComposeError;
use crate::parameter::ParameterDefaults;

use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn coefficients(
    model: &str,
    order: usize,
    values: &Values,
) -> Result<Vec<f64>, ComposeError> {
    (0..=order)
        .map(|i| variable(values, model, &coefficient_name(i)))
        .collect()
}

/// Trend shared through a [crate::common::PolynomialTrend] common model
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Polynomial {
    pub order: usize,
}

impl Polynomial {
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl DatasetModelTrait for Polynomial {
    fn model_class(&self) -> &'static str {
        "polynomial_trend"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Additive
    }

    fn common_class(&self) -> Option<&'static str> {
        Some("polynomial_trend")
    }

    fn common_pams(&self) -> Vec<String> {
        (0..=self.order).map(coefficient_name).collect()
    }

    fn compute(&self, values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError> {
        let coefficients = coefficients(self.model_class(), self.order, values)?;
        let x_zero = values.get("x_zero").copied().unwrap_or(0.0);
        Ok(x0.mapv(|x| evaluate_polynomial(&coefficients, x, x_zero)))
    }
}

/// Polynomial with dataset-local coefficients
///
/// With `systematic` set the polynomial describes an instrumental trend and is added before
/// every other model.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LocalPolynomial {
    pub order: usize,
    #[serde(default)]
    pub systematic: bool,
    /// Reference abscissa
    #[serde(default)]
    pub x_zero: f64,
}

impl LocalPolynomial {
    pub fn new(order: usize, systematic: bool, x_zero: f64) -> Self {
        Self {
            order,
            systematic,
            x_zero,
        }
    }
}

impl DatasetModelTrait for LocalPolynomial {
    fn model_class(&self) -> &'static str {
        "local_polynomial_trend"
    }

    fn category(&self) -> ModelCategory {
        if self.systematic {
            ModelCategory::Systematic
        } else {
            ModelCategory::Additive
        }
    }

    fn dataset_pams(&self) -> BTreeMap<String, ParameterDefaults> {
        (0..=self.order)
            .map(|i| (coefficient_name(i), ParameterDefaults::linear(-1e6, 1e6)))
            .collect()
    }

    fn compute(&self, values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError> {
        let coefficients = coefficients(self.model_class(), self.order, values)?;
        Ok(x0.mapv(|x| evaluate_polynomial(&coefficients, x, self.x_zero)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn shared_trend_uses_reference_abscissa() {
        let values = Values::from([
            ("c0".to_owned(), 1.0),
            ("c1".to_owned(), 2.0),
            ("x_zero".to_owned(), 10.0),
        ]);
        let y = Polynomial::new(1)
            .compute(&values, array![10.0, 11.0].view())
            .unwrap();
        assert_abs_diff_eq!(y, array![1.0, 3.0]);
    }

    #[test]
    fn systematic_flag_selects_category() {
        assert_eq!(
            LocalPolynomial::new(1, true, 0.0).category(),
            ModelCategory::Systematic
        );
        assert_eq!(
            LocalPolynomial::new(1, false, 0.0).category(),
            ModelCategory::Additive
        );
        assert_eq!(
            LocalPolynomial::new(2, false, 0.0)
                .dataset_pams()
                .into_keys()
                .collect::<Vec<_>>(),
            ["c0", "c1", "c2"]
        );
    }
}
