use crate::common::{CommonModel, CommonModelConfig, CommonModelKind, CommonModelTrait};
use crate::compose::{ModelComposer, Models};
use crate::dataset::{Composition, Dataset};
use crate::dataset_models::{DatasetModel, DatasetModelConfig, DatasetModelTrait, ModelCategory};
use crate::dynamical::DynamicalIntegrator;
use crate::error::{ComposeError, ConfigurationError};
use crate::kepler::{M_SUN_IN_M_EARTH, M_SUN_IN_M_JUP, convert_b_to_i, get_planet_mass};
use crate::parameter::{ParameterSpace, ThetaRegistry};

use emcee::Guess;
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

/// Standard deviation of the initial population around the starting point
pub const INITIAL_POPULATION_SPREAD: f64 = 1e-7;

/// Datasets, the models bound to them and the layout of theta
///
/// Models are added first, then [ModelContainer::initialize] resolves every parameter into
/// theta. After initialization the container is read-only for evaluation and can be handed to
/// a sampler through [emcee::Prob].
pub struct ModelContainer {
    datasets: Vec<Dataset>,
    common_models: BTreeMap<String, CommonModel>,
    dataset_models: BTreeMap<String, DatasetModel>,
    registry: ThetaRegistry,
    composer: ModelComposer,
    sampler_reference: Vec<f64>,
    initialized: bool,
}

impl Default for ModelContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelContainer {
    pub fn new() -> Self {
        Self {
            datasets: vec![],
            common_models: BTreeMap::new(),
            dataset_models: BTreeMap::new(),
            registry: ThetaRegistry::new(),
            composer: ModelComposer::new(),
            sampler_reference: vec![],
            initialized: false,
        }
    }

    pub fn add_dataset(&mut self, dataset: Dataset) {
        self.datasets.push(dataset);
    }

    pub fn add_common_model(&mut self, name: &str, config: CommonModelConfig) {
        self.common_models
            .insert(name.to_owned(), CommonModel::new(name, config));
    }

    pub fn add_dataset_model(&mut self, name: &str, config: DatasetModelConfig) {
        self.dataset_models
            .insert(name.to_owned(), DatasetModel::new(name, config));
    }

    pub fn set_integrator(&mut self, integrator: impl DynamicalIntegrator + Send + Sync + 'static) {
        self.composer.set_integrator(integrator);
    }

    /// Fix every jitter at zero, must be called before [ModelContainer::initialize]
    pub fn shutdown_jitter(&mut self) {
        for model in self.dataset_models.values_mut() {
            model.shutdown_jitter();
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register the parameters of every model bound to a dataset
    ///
    /// Common parameters requested by a dataset model are registered before its dataset-local
    /// ones, datasets and models are walked in binding order. Calling it again is a no-op.
    /// On error nothing is registered, so the container can be fixed and initialized again.
    pub fn initialize(&mut self) -> Result<(), ConfigurationError> {
        if self.initialized {
            return Ok(());
        }
        let mut registry = ThetaRegistry::new();
        let mut common_models = self.common_models.clone();
        let mut dataset_models = self.dataset_models.clone();
        let mut gp_handles = vec![];

        for dataset in &self.datasets {
            if !dataset.has_models() {
                continue;
            }
            let name_ref = dataset.name_ref();
            let mut gaussian_processes = vec![];
            let mut has_unitary = false;
            let mut has_normalization = false;

            for model_name in dataset.models() {
                let model = dataset_models.get_mut(model_name).ok_or_else(|| {
                    ConfigurationError::UnknownDatasetModel {
                        dataset: name_ref.to_owned(),
                        model: model_name.clone(),
                    }
                })?;
                for common_name in model.common_refs().to_vec() {
                    let common = common_models.get_mut(&common_name).ok_or_else(|| {
                        ConfigurationError::UnknownCommonModel {
                            model: model_name.clone(),
                            common: common_name.clone(),
                        }
                    })?;
                    if let Some(expected) = model.kind().common_class() {
                        if common.kind().model_class() != expected {
                            return Err(ConfigurationError::WrongCommonModelKind {
                                model: model_name.clone(),
                                common: common_name,
                                expected,
                            });
                        }
                    }
                    for pam in model.kind().common_pams() {
                        common.register(&pam, &mut registry)?;
                    }
                }
                model.setup_dataset(name_ref, &mut registry)?;

                match model.category() {
                    ModelCategory::GaussianProcess => gaussian_processes.push(model_name),
                    ModelCategory::Unitary => has_unitary = true,
                    ModelCategory::Normalization => has_normalization = true,
                    _ => {}
                }
            }

            if gaussian_processes.len() > 1 {
                return Err(ConfigurationError::MultipleGaussianProcesses {
                    dataset: name_ref.to_owned(),
                    count: gaussian_processes.len(),
                });
            }
            if let Some(handle) = gaussian_processes
                .first()
                .and_then(|&name| dataset_models.get(name))
                .and_then(|model| model.kind().new_gaussian_process())
            {
                gp_handles.push((name_ref, handle));
            }
            if has_normalization && !has_unitary {
                log::warn!(
                    "dataset {}: normalization model without a unitary model has no effect",
                    name_ref
                );
            }
        }

        for (name_ref, handle) in gp_handles {
            self.composer.register_gaussian_process(name_ref, handle);
        }
        self.sampler_reference = registry.entries().iter().map(|e| e.midpoint()).collect();
        self.registry = registry;
        self.common_models = common_models;
        self.dataset_models = dataset_models;

        log::info!(
            "{} datasets, {} common models, {} dataset models, {} sampled dimensions",
            self.datasets.len(),
            self.common_models.len(),
            self.dataset_models.len(),
            self.registry.len()
        );
        self.initialized = true;
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), ComposeError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ComposeError::Uninitialized)
        }
    }

    fn models(&self) -> Models<'_> {
        Models::new(&self.common_models, &self.dataset_models)
    }

    fn dataset(&self, name: &str) -> Result<&Dataset, ComposeError> {
        self.datasets
            .iter()
            .find(|dataset| dataset.name_ref() == name)
            .ok_or_else(|| ComposeError::UnknownDataset(name.to_owned()))
    }

    /// Number of sampled dimensions
    pub fn ndim(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &ThetaRegistry {
        &self.registry
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn common_model(&self, name: &str) -> Option<&CommonModel> {
        self.common_models.get(name)
    }

    pub fn dataset_model(&self, name: &str) -> Option<&DatasetModel> {
        self.dataset_models.get(name)
    }

    /// `ndim × 2` sampler-space bounds
    pub fn bounds(&self) -> Array2<f64> {
        self.registry.bounds()
    }

    pub fn theta_dictionary(&self) -> BTreeMap<String, usize> {
        self.registry.theta_dictionary()
    }

    /// Sum of the log-priors of all sampled variables
    ///
    /// `-inf` for a theta of the wrong length, outside of the sampler bounds or decoding to a
    /// variable outside of its physical bounds.
    pub fn ln_prior(&self, theta: &[f64]) -> f64 {
        if self.registry.check_len(theta).is_err() || !self.registry.within_bounds(theta) {
            return f64::NEG_INFINITY;
        }
        let ln_prior: f64 = self
            .common_models
            .values()
            .map(|model| model.ln_prior(theta))
            .chain(self.dataset_models.values().map(|model| model.ln_prior(theta)))
            .sum();
        if ln_prior.is_nan() {
            f64::NEG_INFINITY
        } else {
            ln_prior
        }
    }

    pub fn ln_likelihood(&self, theta: &[f64]) -> Result<f64, ComposeError> {
        self.ensure_initialized()?;
        self.registry.check_len(theta)?;
        let compositions = self.composer.compose_all(&self.datasets, self.models(), theta)?;
        let mut ln_likelihood = 0.0;
        for dataset in &self.datasets {
            if !dataset.has_models() {
                continue;
            }
            let Some(composition) = compositions.get(dataset.name_ref()) else {
                continue;
            };
            ln_likelihood += match composition.gp_ln_likelihood {
                Some(gp_ln_likelihood) => gp_ln_likelihood,
                None => gaussian_ln_likelihood(
                    composition.residuals.view(),
                    composition.yerr(dataset.e()).view(),
                ),
            };
        }
        Ok(ln_likelihood)
    }

    /// Log-posterior up to a constant, `-inf` when the prior vanishes or evaluation fails
    pub fn ln_probability(&self, theta: &[f64]) -> f64 {
        let ln_prior = self.ln_prior(theta);
        if !ln_prior.is_finite() {
            return f64::NEG_INFINITY;
        }
        match self.ln_likelihood(theta) {
            Ok(ln_likelihood) if !ln_likelihood.is_nan() => ln_prior + ln_likelihood,
            Ok(_) => f64::NEG_INFINITY,
            Err(error) => {
                log::debug!("likelihood evaluation failed: {}", error);
                f64::NEG_INFINITY
            }
        }
    }

    /// Map a point of the unit hypercube to theta
    pub fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>, ComposeError> {
        self.registry.prior_transform(u)
    }

    pub fn compose(&self, dataset: &str, theta: &[f64]) -> Result<Composition, ComposeError> {
        self.ensure_initialized()?;
        self.registry.check_len(theta)?;
        self.composer
            .compose(self.dataset(dataset)?, self.models(), theta)
    }

    /// Compositions of every dataset, keyed by dataset name
    pub fn compose_all(&self, theta: &[f64]) -> Result<BTreeMap<String, Composition>, ComposeError> {
        self.ensure_initialized()?;
        self.registry.check_len(theta)?;
        self.composer
            .compose_all(&self.datasets, self.models(), theta)
    }

    /// Prediction of a dataset at arbitrary abscissas, e.g. a dense grid for plotting
    pub fn model_on_grid(
        &self,
        theta: &[f64],
        dataset: &str,
        x_query: ArrayView1<f64>,
    ) -> Result<Array1<f64>, ComposeError> {
        self.ensure_initialized()?;
        self.registry.check_len(theta)?;
        self.composer
            .compose_on_grid(self.dataset(dataset)?, self.models(), theta, x_query)
    }

    /// Theta built from user starting values
    ///
    /// Eccentricity sampler coordinates are delegated to their common model, other starts are
    /// converted to sampler space, coordinates without a start take the midpoint of their
    /// bounds.
    pub fn create_starting_point(&self) -> Result<Vec<f64>, ComposeError> {
        self.ensure_initialized()?;
        let mut starting_point: Vec<f64> =
            self.registry.entries().iter().map(|e| e.midpoint()).collect();
        for common in self.common_models.values() {
            for sampler_name in common.space().sampler_indices().keys() {
                if !common.initialize_starting_point(sampler_name, &mut starting_point) {
                    self.apply_start(common.space(), sampler_name, &mut starting_point);
                }
            }
        }
        for model in self.dataset_models.values() {
            for dataset in model.datasets() {
                let Some(space) = model.space(dataset) else {
                    continue;
                };
                for sampler_name in space.sampler_indices().keys() {
                    self.apply_start(space, sampler_name, &mut starting_point);
                }
            }
        }
        Ok(starting_point)
    }

    fn apply_start(&self, space: &ParameterSpace, sampler_name: &str, starting_point: &mut [f64]) {
        let Some(&index) = space.sampler_indices().get(sampler_name) else {
            return;
        };
        let Some(start) = space.config(sampler_name).and_then(|c| c.starts) else {
            return;
        };
        if let Some(entry) = self.registry.entry(index) {
            starting_point[index] = entry.space.to_sampler(start);
        }
    }

    /// `nwalkers × ndim` population scattered around `starting_point`
    ///
    /// Rows with an eccentricity pinned to one of its bounds are repaired.
    pub fn initial_population<R: Rng + ?Sized>(
        &self,
        starting_point: &[f64],
        nwalkers: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, ComposeError> {
        self.registry.check_len(starting_point)?;
        let mut population = Array2::from_shape_fn((nwalkers, starting_point.len()), |(_, j)| {
            let z: f64 = StandardNormal.sample(rng);
            starting_point[j] + INITIAL_POPULATION_SPREAD * z
        });
        for common in self.common_models.values() {
            common.repair_population(&mut population, rng);
        }
        Ok(population)
    }

    /// Center circular coordinates on `center`
    pub fn recenter_bounds(&mut self, center: &[f64]) -> Result<(), ComposeError> {
        self.registry.recenter_bounds(center)
    }

    /// Resume from a population saved with a previous theta layout
    ///
    /// Columns are matched by theta-dictionary key and the bounds of the previous run are
    /// restored. [population_median] of the result is the usual starting point.
    pub fn remap_population(
        &mut self,
        legacy_dictionary: &BTreeMap<String, usize>,
        legacy_population: &Array2<f64>,
        legacy_bounds: &Array2<f64>,
    ) -> Result<Array2<f64>, ComposeError> {
        self.ensure_initialized()?;
        self.registry
            .remap_population(legacy_dictionary, legacy_population, legacy_bounds)
    }

    pub fn fix_population(
        &self,
        center: &[f64],
        population: &mut Array2<f64>,
    ) -> Result<(), ComposeError> {
        self.registry.fix_population(center, population)
    }

    /// Redraw fixed values carrying an uncertainty, used for randomized derivations
    pub fn randomize_fixed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for model in self.common_models.values_mut() {
            model.randomize_fixed(rng);
        }
        for model in self.dataset_models.values_mut() {
            model.randomize_fixed(rng);
        }
    }

    /// Theta that [emcee::Guess] values are offsets from, the midpoint of the bounds by default
    pub fn sampler_reference(&self) -> &[f64] {
        &self.sampler_reference
    }

    /// Move the origin of [emcee::Guess] values, usually to the starting point
    ///
    /// Guesses are `f32`, so absolute epochs of order 10⁶ days would be rounded to a fraction of
    /// a day without an offset.
    pub fn set_sampler_reference(&mut self, reference: &[f64]) -> Result<(), ComposeError> {
        self.registry.check_len(reference)?;
        self.sampler_reference = reference.to_vec();
        Ok(())
    }

    /// Rows of a population as sampler guesses, relative to [ModelContainer::sampler_reference]
    pub fn population_to_guesses(&self, population: &Array2<f64>) -> Vec<Guess> {
        population
            .rows()
            .into_iter()
            .map(|row| Guess {
                values: row
                    .iter()
                    .zip(&self.sampler_reference)
                    .map(|(&x, &reference)| (x - reference) as f32)
                    .collect(),
            })
            .collect()
    }

    /// Theta of a sampler guess, see [ModelContainer::population_to_guesses]
    ///
    /// A guess of the wrong length is passed through, so that evaluation rejects it.
    pub fn guess_to_theta(&self, guess: &Guess) -> Vec<f64> {
        if guess.values.len() != self.sampler_reference.len() {
            return guess.values.iter().map(|&x| x as f64).collect();
        }
        guess
            .values
            .iter()
            .zip(&self.sampler_reference)
            .map(|(&x, &reference)| reference + x as f64)
            .collect()
    }

    /// Stellar mass in solar masses: a decoded or fixed `mass` of a star model, or its
    /// cross-derived value
    fn stellar_mass(&self, theta: &[f64]) -> Option<f64> {
        self.common_models
            .values()
            .filter(|model| matches!(model.kind(), CommonModelKind::Star(_)))
            .find_map(|star| {
                star.decode_values(theta)
                    .get("mass")
                    .copied()
                    .or_else(|| star.space().config("mass").and_then(|c| c.fixed))
                    .or_else(|| star.derive_stellar_parameters().map(|p| p.mass.0))
            })
    }

    /// Physical quantities derived from a theta, keyed by `"<planet>_<name>"`
    ///
    /// `e` and `o`, the minimum mass in Jupiter (`M_Mj`) and Earth (`M_Me`) masses and the
    /// inclination `i` in degrees. Quantities with missing inputs are skipped.
    pub fn derived_quantities(&self, theta: &[f64]) -> BTreeMap<String, f64> {
        let stellar_mass = self.stellar_mass(theta);
        let mut derived = BTreeMap::new();
        for (name, common) in &self.common_models {
            if !matches!(common.kind(), CommonModelKind::Planet(_)) {
                continue;
            }
            let values = common.decode_values(theta);
            let e = values.get("e").copied();
            let o = values.get("o").copied();
            if let Some(e) = e {
                derived.insert(format!("{name}_e"), e);
            }
            if let Some(o) = o {
                derived.insert(format!("{name}_o"), o.rem_euclid(TAU));
            }
            let e = e.unwrap_or(0.0);
            let o = o.unwrap_or(FRAC_PI_2);

            if let (Some(&period), Some(&k), Some(m_star)) =
                (values.get("P"), values.get("K"), stellar_mass)
            {
                let mass = get_planet_mass(period, k, e, m_star);
                derived.insert(format!("{name}_M_Mj"), mass * M_SUN_IN_M_JUP);
                derived.insert(format!("{name}_M_Me"), mass * M_SUN_IN_M_EARTH);
            }
            if let (Some(&b), Some(&a_rs)) = (values.get("b"), values.get("a_Rs")) {
                derived.insert(format!("{name}_i"), convert_b_to_i(b, e, o, a_rs));
            }
        }
        derived
    }
}

/// Gaussian log-likelihood of residuals with per-point total uncertainty
fn gaussian_ln_likelihood(residuals: ArrayView1<f64>, yerr: ArrayView1<f64>) -> f64 {
    -0.5 * Zip::from(residuals)
        .and(yerr)
        .fold(0.0, |acc, &r, &sigma| {
            let variance = sigma.powi(2);
            acc + r.powi(2) / variance + (TAU * variance).ln()
        })
}

/// Column-wise median of a population, one value per sampled dimension
pub fn population_median(population: &Array2<f64>) -> Vec<f64> {
    population
        .axis_iter(Axis(1))
        .map(|column| {
            let mut column = column.to_vec();
            column.sort_unstable_by(f64::total_cmp);
            let n = column.len();
            match n {
                0 => f64::NAN,
                _ if n % 2 == 1 => column[n / 2],
                _ => 0.5 * (column[n / 2 - 1] + column[n / 2]),
            }
        })
        .collect()
}

impl emcee::Prob for ModelContainer {
    fn lnlike(&self, params: &Guess) -> f32 {
        match self.ln_likelihood(&self.guess_to_theta(params)) {
            Ok(ln_likelihood) => ln_likelihood as f32,
            Err(error) => {
                log::debug!("likelihood evaluation failed: {}", error);
                f32::NEG_INFINITY
            }
        }
    }

    fn lnprior(&self, params: &Guess) -> f32 {
        self.ln_prior(&self.guess_to_theta(params)) as f32
    }
}
