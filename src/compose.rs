use crate::common::CommonModel;
use crate::dataset::{Composition, Dataset};
use crate::dataset_models::{DatasetModel, DatasetModelTrait, ModelCategory, Values};
use crate::dynamical::{DynamicalIntegrator, DynamicalRequest, KeplerianIntegrator};
use crate::error::{ComposeError, GpError};
use crate::gp::GaussianProcess;

use ndarray::{Array1, ArrayView1};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Common and dataset models a composition reads from
#[derive(Clone, Copy, Debug)]
pub struct Models<'a> {
    pub common: &'a BTreeMap<String, CommonModel>,
    pub dataset: &'a BTreeMap<String, DatasetModel>,
}

impl<'a> Models<'a> {
    pub fn new(
        common: &'a BTreeMap<String, CommonModel>,
        dataset: &'a BTreeMap<String, DatasetModel>,
    ) -> Self {
        Self { common, dataset }
    }

    fn dataset_model(&self, name: &str) -> Result<&'a DatasetModel, ComposeError> {
        self.dataset
            .get(name)
            .ok_or_else(|| ComposeError::UnknownModel(name.to_owned()))
    }

    fn common_model(&self, name: &str) -> Result<&'a CommonModel, ComposeError> {
        self.common
            .get(name)
            .ok_or_else(|| ComposeError::UnknownModel(name.to_owned()))
    }

    /// Models bound to a dataset in binding order, empty for a sentinel list
    fn bound(&self, dataset: &Dataset) -> Result<Vec<&'a DatasetModel>, ComposeError> {
        if !dataset.has_models() {
            return Ok(vec![]);
        }
        dataset
            .models()
            .iter()
            .map(|name| self.dataset_model(name))
            .collect()
    }

    /// Values seen by `model` on `dataset`, dataset-local values win on collision
    pub fn values(
        &self,
        model: &DatasetModel,
        dataset: &str,
        theta: &[f64],
    ) -> Result<Values, ComposeError> {
        let mut values = Values::new();
        for common in model.common_refs() {
            values.extend(self.common_model(common)?.decode_values(theta));
        }
        values.extend(model.decode_values(dataset, theta));
        Ok(values)
    }
}

/// Gaussian-process conditioning postponed until the deterministic model is known
#[derive(Clone, Debug)]
struct GpJob {
    model: String,
    parameters: Vec<f64>,
}

/// Combines the outputs of the models bound to a dataset into one prediction
///
/// Within a dataset the order is fixed: jitter models, systematic models, then every other
/// deterministic model (unitary, normalization, additive and dynamical), and only then the
/// Gaussian process, conditioned on the residuals of the complete deterministic model.
///
/// The composer owns one Gaussian-process handle per dataset. A handle caches its
/// factorization, so it sits behind a mutex and is never used by two evaluations at once.
pub struct ModelComposer {
    gp_handles: BTreeMap<String, Mutex<Box<dyn GaussianProcess + Send>>>,
    integrator: Box<dyn DynamicalIntegrator + Send + Sync>,
}

impl Default for ModelComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelComposer {
    pub fn new() -> Self {
        Self::with_integrator(KeplerianIntegrator)
    }

    pub fn with_integrator(integrator: impl DynamicalIntegrator + Send + Sync + 'static) -> Self {
        Self {
            gp_handles: BTreeMap::new(),
            integrator: Box::new(integrator),
        }
    }

    pub fn set_integrator(&mut self, integrator: impl DynamicalIntegrator + Send + Sync + 'static) {
        self.integrator = Box::new(integrator);
    }

    pub fn register_gaussian_process(
        &mut self,
        dataset: &str,
        handle: Box<dyn GaussianProcess + Send>,
    ) {
        self.gp_handles
            .insert(dataset.to_owned(), Mutex::new(handle));
    }

    pub fn has_gaussian_process(&self, dataset: &str) -> bool {
        self.gp_handles.contains_key(dataset)
    }

    /// Compose a single dataset
    pub fn compose(
        &self,
        dataset: &Dataset,
        models: Models<'_>,
        theta: &[f64],
    ) -> Result<Composition, ComposeError> {
        let mut external =
            self.dynamical_contributions(std::iter::once((dataset, dataset.x0())), models, theta)?;
        let (mut composition, job) = self.accumulate(
            dataset,
            dataset.x0(),
            models,
            theta,
            external.remove(dataset.name_ref()),
        )?;
        composition.compute_residuals(dataset.y());
        if let Some(job) = job {
            self.condition(dataset, &mut composition, job)?;
        }
        Ok(composition)
    }

    /// Compose every dataset
    ///
    /// The dynamical integrator runs once for all datasets before the loop and Gaussian
    /// processes are conditioned in a batch after it.
    pub fn compose_all(
        &self,
        datasets: &[Dataset],
        models: Models<'_>,
        theta: &[f64],
    ) -> Result<BTreeMap<String, Composition>, ComposeError> {
        let mut external = self.dynamical_contributions(
            datasets.iter().map(|dataset| (dataset, dataset.x0())),
            models,
            theta,
        )?;

        let mut compositions = BTreeMap::new();
        let mut deferred = vec![];
        for dataset in datasets {
            let (mut composition, job) = self.accumulate(
                dataset,
                dataset.x0(),
                models,
                theta,
                external.remove(dataset.name_ref()),
            )?;
            composition.compute_residuals(dataset.y());
            if let Some(job) = job {
                deferred.push((dataset, job));
            }
            compositions.insert(dataset.name_ref().to_owned(), composition);
        }

        for (dataset, job) in deferred {
            if let Some(composition) = compositions.get_mut(dataset.name_ref()) {
                self.condition(dataset, composition, job)?;
            }
        }
        Ok(compositions)
    }

    /// Prediction at arbitrary abscissas
    ///
    /// Deterministic models are evaluated at `x_query`, a Gaussian process is conditioned on
    /// the residuals at the observed abscissas and its mean is predicted at `x_query`.
    ///
    /// Only the data-grid integration is part of [ModelComposer::compose] and
    /// [ModelComposer::compose_all]. The dynamical integrator runs a second time here, for
    /// `x_query` only, and only when this method is called.
    pub fn compose_on_grid(
        &self,
        dataset: &Dataset,
        models: Models<'_>,
        theta: &[f64],
        x_query: ArrayView1<f64>,
    ) -> Result<Array1<f64>, ComposeError> {
        let mut external =
            self.dynamical_contributions(std::iter::once((dataset, x_query.view())), models, theta)?;
        let (on_grid, job) = self.accumulate(
            dataset,
            x_query,
            models,
            theta,
            external.remove(dataset.name_ref()),
        )?;
        let Some(job) = job else {
            return Ok(on_grid.model);
        };

        let on_data = self.compose(dataset, models, theta)?;
        let yerr = on_data.yerr(dataset.e());
        let (mean, _) = self.with_gaussian_process(dataset, &job, yerr.view(), |gp| {
            gp.predict(on_data.residuals.view(), x_query)
        })?;
        Ok(on_grid.model + mean)
    }

    /// Dynamical contributions of every dataset bound to a dynamical model, one integrator call
    fn dynamical_contributions<'d>(
        &self,
        targets: impl Iterator<Item = (&'d Dataset, ArrayView1<'d, f64>)>,
        models: Models<'_>,
        theta: &[f64],
    ) -> Result<BTreeMap<String, Array1<f64>>, ComposeError> {
        let mut requests = vec![];
        for (dataset, x0) in targets {
            let mut bodies = vec![];
            for model in models.bound(dataset)? {
                if model.category() != ModelCategory::Dynamical {
                    continue;
                }
                for common in model.common_refs() {
                    let mut values = models.common_model(common)?.decode_values(theta);
                    values.extend(model.decode_values(dataset.name_ref(), theta));
                    bodies.push(values);
                }
            }
            if !bodies.is_empty() {
                requests.push(DynamicalRequest {
                    dataset: dataset.name_ref(),
                    x0,
                    bodies,
                });
            }
        }
        if requests.is_empty() {
            return Ok(BTreeMap::new());
        }
        self.integrator.integrate(&requests)
    }

    /// Steps 1 to 5: fresh accumulators, jitter, systematic, remaining deterministic models
    /// and the composite prediction
    fn accumulate(
        &self,
        dataset: &Dataset,
        x0: ArrayView1<f64>,
        models: Models<'_>,
        theta: &[f64],
        external: Option<Array1<f64>>,
    ) -> Result<(Composition, Option<GpJob>), ComposeError> {
        let mut composition = Composition::new(x0.len());
        let bound = models.bound(dataset)?;
        if bound.is_empty() {
            return Ok((composition, None));
        }
        let name = dataset.name_ref();
        let by_category = |category: ModelCategory| {
            bound
                .iter()
                .copied()
                .filter(move |model| model.category() == category)
        };

        for model in by_category(ModelCategory::Jitter) {
            let values = models.values(model, name, theta)?;
            let output = model.kind().compute(&values, x0)?;
            composition.jitter += &output;
            composition.components.insert(model.name().to_owned(), output);
        }

        for model in by_category(ModelCategory::Systematic) {
            let values = models.values(model, name, theta)?;
            let output = model.kind().compute(&values, x0)?;
            composition.additive += &output;
            composition.components.insert(model.name().to_owned(), output);
        }

        let mut external = external;
        let mut job = None;
        for &model in &bound {
            let category = model.category();
            match category {
                ModelCategory::Jitter | ModelCategory::Systematic => continue,
                ModelCategory::GaussianProcess => {
                    if job.is_none() {
                        let values = models.values(model, name, theta)?;
                        job = Some(GpJob {
                            model: model.name().to_owned(),
                            parameters: model.kind().gp_parameters(&values)?,
                        });
                    }
                    continue;
                }
                ModelCategory::Dynamical => {
                    if let Some(output) = external.take() {
                        composition.external += &output;
                        composition.components.insert(model.name().to_owned(), output);
                    }
                    continue;
                }
                _ => {}
            }

            let values = models.values(model, name, theta)?;
            let output = model.kind().compute(&values, x0)?;
            match category {
                ModelCategory::Unitary => composition.add_unitary(&output),
                ModelCategory::Normalization => composition.multiply_normalization(&output),
                _ => composition.additive += &output,
            }
            composition.components.insert(model.name().to_owned(), output);
        }

        composition.compute_model();
        Ok((composition, job))
    }

    /// Step 6: condition the Gaussian process on the deterministic residuals and add its mean
    fn condition(
        &self,
        dataset: &Dataset,
        composition: &mut Composition,
        job: GpJob,
    ) -> Result<(), ComposeError> {
        let yerr = composition.yerr(dataset.e());
        let residuals = composition.residuals.view();
        let (ln_likelihood, mean) =
            self.with_gaussian_process(dataset, &job, yerr.view(), |gp| {
                let ln_likelihood = gp.log_likelihood(residuals)?;
                let (mean, _) = gp.predict(residuals, dataset.x0())?;
                Ok((ln_likelihood, mean))
            })?;
        composition.model += &mean;
        composition.components.insert(job.model, mean.clone());
        composition.gp_prediction = Some(mean);
        composition.gp_ln_likelihood = Some(ln_likelihood);
        Ok(())
    }

    /// Lock the handle of `dataset`, set its parameters, factorize and run `f`
    fn with_gaussian_process<T>(
        &self,
        dataset: &Dataset,
        job: &GpJob,
        yerr: ArrayView1<f64>,
        f: impl FnOnce(&mut dyn GaussianProcess) -> Result<T, GpError>,
    ) -> Result<T, ComposeError> {
        let name = dataset.name_ref();
        let wrap = |error: GpError| ComposeError::GaussianProcess {
            dataset: name.to_owned(),
            error,
        };
        let handle = self
            .gp_handles
            .get(name)
            .ok_or_else(|| ComposeError::MissingGaussianProcess(name.to_owned()))?;
        let mut gp = handle
            .lock()
            .map_err(|_| wrap(GpError::Poisoned(name.to_owned())))?;
        gp.set_parameter_vector(&job.parameters).map_err(wrap)?;
        gp.compute(dataset.x0(), yerr).map_err(wrap)?;
        f(&mut **gp).map_err(wrap)
    }
}
