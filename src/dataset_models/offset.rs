use crate::dataset_models::{DatasetModelTrait, ModelCategory, Values, variable};
use crate::error::ComposeError;
use crate::parameter::ParameterDefaults;

use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

macro_rules! constant_model {
    ($name: ident, $class: expr, $category: expr, $parameter: expr, $defaults: expr) => {
        impl DatasetModelTrait for $name {
            fn model_class(&self) -> &'static str {
                $class
            }

            fn category(&self) -> ModelCategory {
                $category
            }

            fn dataset_pams(&self) -> BTreeMap<String, ParameterDefaults> {
                BTreeMap::from([($parameter.to_owned(), $defaults)])
            }

            fn time_independent(&self) -> bool {
                true
            }

            fn compute(
                &self,
                values: &Values,
                x0: ArrayView1<f64>,
            ) -> Result<Array1<f64>, ComposeError> {
                let value = variable(values, $class, $parameter)?;
                Ok(Array1::from_elem(x0.len(), value))
            }
        }
    };
}

/// Constant offset of a dataset
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Offset {}

constant_model!(
    Offset,
    "offset",
    ModelCategory::Additive,
    "offset",
    ParameterDefaults::linear(-1e6, 1e6)
);

/// Extra white noise added in quadrature to the uncertainties
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Jitter {}

constant_model!(
    Jitter,
    "jitter",
    ModelCategory::Jitter,
    "jitter",
    ParameterDefaults::logarithmic(1e-4, 1e3)
);

/// Multiplicative factor of the unitary models of a dataset
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NormalizationFactor {}

constant_model!(
    NormalizationFactor,
    "normalization_factor",
    ModelCategory::Normalization,
    "normalization_factor",
    ParameterDefaults::linear(0.1, 10.0)
);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn constant_is_broadcast() {
        let values = Values::from([("offset".to_owned(), 2.5)]);
        let y = Offset::default()
            .compute(&values, array![0.0, 1.0, 2.0].view())
            .unwrap();
        assert_eq!(y, array![2.5, 2.5, 2.5]);
        assert!(Offset::default().time_independent());
    }

    #[test]
    fn categories() {
        assert_eq!(Jitter::default().category(), ModelCategory::Jitter);
        assert_eq!(
            NormalizationFactor::default().category(),
            ModelCategory::Normalization
        );
        assert!(Jitter::default().dataset_pams().contains_key("jitter"));
    }
}
