use crate::error::ConfigurationError;

use ndarray::{Array1, ArrayView1, Zip};
use std::collections::BTreeMap;

/// Observed time series and the names of the models bound to it
#[derive(Clone, Debug)]
pub struct Dataset {
    name_ref: String,
    x0: Array1<f64>,
    y: Array1<f64>,
    e: Array1<f64>,
    models: Vec<String>,
}

impl Dataset {
    pub fn new(
        name_ref: impl Into<String>,
        x0: Array1<f64>,
        y: Array1<f64>,
        e: Array1<f64>,
        models: Vec<String>,
    ) -> Result<Self, ConfigurationError> {
        let name_ref = name_ref.into();
        if x0.len() != y.len() || x0.len() != e.len() {
            return Err(ConfigurationError::DatasetLengthMismatch {
                name: name_ref,
                x0: x0.len(),
                y: y.len(),
                e: e.len(),
            });
        }
        Ok(Self {
            name_ref,
            x0,
            y,
            e,
            models,
        })
    }

    pub fn name_ref(&self) -> &str {
        &self.name_ref
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.x0.len()
    }

    pub fn x0(&self) -> ArrayView1<f64> {
        self.x0.view()
    }

    pub fn y(&self) -> ArrayView1<f64> {
        self.y.view()
    }

    pub fn e(&self) -> ArrayView1<f64> {
        self.e.view()
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// `false` for an empty model list or the `none`/`None` sentinel
    pub fn has_models(&self) -> bool {
        !self
            .models
            .iter()
            .all(|name| name == "none" || name == "None")
    }

    /// Combine accumulators into a prediction: `additive + unitary × normalization + external`
    ///
    /// A missing unitary contribution counts as zero and a missing normalization as one.
    pub fn compute_model_from_arbitrary_datasets(
        additive: ArrayView1<f64>,
        unitary: Option<ArrayView1<f64>>,
        normalization: Option<ArrayView1<f64>>,
        external: ArrayView1<f64>,
    ) -> Array1<f64> {
        let mut model = &additive + &external;
        if let Some(unitary) = unitary {
            match normalization {
                Some(normalization) => Zip::from(&mut model)
                    .and(unitary)
                    .and(normalization)
                    .for_each(|m, &u, &n| *m += u * n),
                None => model += &unitary,
            }
        }
        model
    }
}

/// Accumulators of one dataset for one theta
///
/// Allocated fresh for every composition, so nothing carries over between evaluations.
#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    /// Linear sum of jitter models
    pub jitter: Array1<f64>,
    pub additive: Array1<f64>,
    pub unitary: Option<Array1<f64>>,
    pub normalization: Option<Array1<f64>>,
    /// Contribution of the dynamical integrator
    pub external: Array1<f64>,
    /// Composite prediction, including the Gaussian-process mean once it is conditioned
    pub model: Array1<f64>,
    /// Observations minus the deterministic prediction
    pub residuals: Array1<f64>,
    pub gp_prediction: Option<Array1<f64>>,
    pub gp_ln_likelihood: Option<f64>,
    /// Output of every bound model by name
    pub components: BTreeMap<String, Array1<f64>>,
}

impl Composition {
    pub fn new(n: usize) -> Self {
        Self {
            jitter: Array1::zeros(n),
            additive: Array1::zeros(n),
            unitary: None,
            normalization: None,
            external: Array1::zeros(n),
            model: Array1::zeros(n),
            residuals: Array1::zeros(n),
            gp_prediction: None,
            gp_ln_likelihood: None,
            components: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    pub fn model_reset(&mut self) {
        *self = Self::new(self.len());
    }

    pub fn add_unitary(&mut self, contribution: &Array1<f64>) {
        let n = self.len();
        *self.unitary.get_or_insert_with(|| Array1::zeros(n)) += contribution;
        self.normalization.get_or_insert_with(|| Array1::ones(n));
    }

    pub fn multiply_normalization(&mut self, contribution: &Array1<f64>) {
        let n = self.len();
        *self.normalization.get_or_insert_with(|| Array1::ones(n)) *= contribution;
    }

    pub fn compute_model(&mut self) {
        self.model = Dataset::compute_model_from_arbitrary_datasets(
            self.additive.view(),
            self.unitary.as_ref().map(|a| a.view()),
            self.normalization.as_ref().map(|a| a.view()),
            self.external.view(),
        );
    }

    pub fn compute_residuals(&mut self, y: ArrayView1<f64>) {
        self.residuals = &y - &self.model;
    }

    /// Total uncertainty `sqrt(e² + jitter²)`
    pub fn yerr(&self, e: ArrayView1<f64>) -> Array1<f64> {
        Zip::from(e)
            .and(&self.jitter)
            .map_collect(|&e, &j| e.hypot(j))
    }
}
