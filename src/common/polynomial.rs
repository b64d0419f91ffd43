use crate::common::CommonModelTrait;
use crate::parameter::{ParameterConfig, ParameterDefaults};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the `i`-th polynomial coefficient
pub fn coefficient_name(i: usize) -> String {
    format!("c{i}")
}

/// Horner evaluation of `Σ cᵢ (x - x_zero)ⁱ`
pub fn evaluate_polynomial(coefficients: &[f64], x: f64, x_zero: f64) -> f64 {
    let dx = x - x_zero;
    coefficients.iter().rev().fold(0.0, |acc, c| acc * dx + c)
}

/// Polynomial trend shared by datasets
///
/// Coefficients are `c0..c{order}`, the intercept `c0` is fixed at zero unless configured,
/// so datasets with their own offsets can share the trend.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PolynomialTrend {
    #[serde(default = "PolynomialTrend::default_order")]
    pub order: usize,
    /// Reference abscissa
    #[serde(default)]
    pub x_zero: f64,
}

impl PolynomialTrend {
    pub fn new(order: usize, x_zero: f64) -> Self {
        Self { order, x_zero }
    }

    pub fn default_order() -> usize {
        1
    }

    pub fn coefficient_names(&self) -> Vec<String> {
        (0..=self.order).map(coefficient_name).collect()
    }
}

impl Default for PolynomialTrend {
    fn default() -> Self {
        Self::new(Self::default_order(), 0.0)
    }
}

impl CommonModelTrait for PolynomialTrend {
    fn model_class(&self) -> &'static str {
        "polynomial_trend"
    }

    fn default_parameters(&self) -> BTreeMap<String, ParameterDefaults> {
        self.coefficient_names()
            .into_iter()
            .map(|name| (name, ParameterDefaults::linear(-1e6, 1e6)))
            .collect()
    }

    fn default_config(&self) -> BTreeMap<String, ParameterConfig> {
        BTreeMap::from([(coefficient_name(0), ParameterConfig::fixed(0.0))])
    }

    fn complete_values(&self, values: &mut BTreeMap<String, f64>) {
        values.insert("x_zero".to_owned(), self.x_zero);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn horner() {
        assert_relative_eq!(evaluate_polynomial(&[1.0, 2.0, 3.0], 2.0, 0.0), 17.0);
        assert_relative_eq!(evaluate_polynomial(&[1.0, 2.0, 3.0], 3.0, 1.0), 17.0);
        assert_eq!(evaluate_polynomial(&[], 3.0, 1.0), 0.0);
    }

    #[test]
    fn intercept_is_fixed_by_default() {
        let trend = PolynomialTrend::new(2, 10.0);
        assert_eq!(trend.coefficient_names(), ["c0", "c1", "c2"]);
        assert_eq!(trend.default_config()["c0"].fixed, Some(0.0));
        let mut values = BTreeMap::new();
        trend.complete_values(&mut values);
        assert_eq!(values["x_zero"], 10.0);
    }
}
