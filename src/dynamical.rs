//! Contributions of dynamical models, evaluated once per theta for all datasets

use crate::dataset_models::{DatasetModelTrait, RadialVelocity, Values};
use crate::error::ComposeError;

use ndarray::{Array1, ArrayView1};
use std::collections::BTreeMap;

/// Bodies to integrate and the abscissas of one dataset
#[derive(Clone, Debug)]
pub struct DynamicalRequest<'a> {
    pub dataset: &'a str,
    pub x0: ArrayView1<'a, f64>,
    /// Decoded values of every planet, one map per body
    pub bodies: Vec<Values>,
}

/// Solver of the motion of the system
///
/// A single call covers every dynamical dataset, so an expensive integration runs once per
/// theta.
pub trait DynamicalIntegrator {
    /// Contributions keyed by dataset name
    fn integrate(
        &self,
        requests: &[DynamicalRequest<'_>],
    ) -> Result<BTreeMap<String, Array1<f64>>, ComposeError>;
}

/// Sum of independent Keplerian signals, planet-planet interactions are neglected
#[derive(Clone, Copy, Debug, Default)]
pub struct KeplerianIntegrator;

impl DynamicalIntegrator for KeplerianIntegrator {
    fn integrate(
        &self,
        requests: &[DynamicalRequest<'_>],
    ) -> Result<BTreeMap<String, Array1<f64>>, ComposeError> {
        let keplerian = RadialVelocity::new();
        requests
            .iter()
            .map(|request| {
                let mut total = Array1::zeros(request.x0.len());
                for body in &request.bodies {
                    total += &keplerian.compute(body, request.x0)?;
                }
                Ok((request.dataset.to_owned(), total))
            })
            .collect()
    }
}
