//! Per-dataset computational units
//!
//! Every kind declares its [ModelCategory], the variables it needs from its common model and
//! its dataset-local variables. The composer switches on the category only.

mod category;
pub use category::ModelCategory;

mod gaussian_process;
pub use gaussian_process::QuasiPeriodicGp;

mod model;
pub use model::{DatasetModel, DatasetModelConfig};

mod offset;
pub use offset::{Jitter, NormalizationFactor, Offset};

mod polynomial;
pub use polynomial::{LocalPolynomial, Polynomial};

mod radial_velocity;
pub use radial_velocity::{Dynamical, RadialVelocity};

mod transit;
pub use transit::BoxTransit;

use crate::error::ComposeError;
use crate::gp::GaussianProcess;
use crate::parameter::ParameterDefaults;

use enum_dispatch::enum_dispatch;
use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decoded values seen by a dataset model: its common model values overridden by the
/// dataset-local ones
pub type Values = BTreeMap<String, f64>;

pub(crate) fn variable(values: &Values, model: &str, name: &str) -> Result<f64, ComposeError> {
    values
        .get(name)
        .copied()
        .ok_or_else(|| ComposeError::MissingVariable {
            model: model.to_owned(),
            name: name.to_owned(),
        })
}

#[enum_dispatch]
pub trait DatasetModelTrait {
    fn model_class(&self) -> &'static str;

    fn category(&self) -> ModelCategory;

    /// Class of the common model(s) referenced, `None` when none is used
    fn common_class(&self) -> Option<&'static str> {
        None
    }

    /// Variables requested from the common model
    fn common_pams(&self) -> Vec<String> {
        vec![]
    }

    /// Dataset-local variables with their fallback bounds, space and prior
    fn dataset_pams(&self) -> BTreeMap<String, ParameterDefaults> {
        BTreeMap::new()
    }

    /// Output does not depend on the abscissa
    fn time_independent(&self) -> bool {
        false
    }

    /// Contribution of the model at abscissas `x0`
    fn compute(&self, values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError>;

    /// Kernel parameter vector of a Gaussian-process model
    fn gp_parameters(&self, _values: &Values) -> Result<Vec<f64>, ComposeError> {
        Ok(vec![])
    }

    /// Fresh Gaussian-process handle for one dataset
    fn new_gaussian_process(&self) -> Option<Box<dyn GaussianProcess + Send>> {
        None
    }
}

#[enum_dispatch(DatasetModelTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum DatasetModelKind {
    RadialVelocity(RadialVelocity),
    Polynomial(Polynomial),
    LocalPolynomial(LocalPolynomial),
    Offset(Offset),
    Jitter(Jitter),
    NormalizationFactor(NormalizationFactor),
    BoxTransit(BoxTransit),
    QuasiPeriodicGp(QuasiPeriodicGp),
    Dynamical(Dynamical),
}
