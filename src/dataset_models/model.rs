use crate::dataset_models::{DatasetModelKind, DatasetModelTrait, ModelCategory, Values};
use crate::error::ConfigurationError;
use crate::parameter::{ParameterConfig, ParameterSpace, ThetaRegistry};

use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration of a dataset model
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DatasetModelConfig {
    pub kind: DatasetModelKind,
    /// Names of the common models providing shared variables
    #[serde(default)]
    pub common_ref: Vec<String>,
    /// Dataset-local parameters, applied to every bound dataset
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterConfig>,
    /// Dataset-local parameters of individual datasets, override `parameters`
    #[serde(default)]
    pub datasets: BTreeMap<String, BTreeMap<String, ParameterConfig>>,
}

impl DatasetModelConfig {
    pub fn new(kind: impl Into<DatasetModelKind>) -> Self {
        Self {
            kind: kind.into(),
            common_ref: vec![],
            parameters: BTreeMap::new(),
            datasets: BTreeMap::new(),
        }
    }

    pub fn with_common_ref(mut self, common: &str) -> Self {
        self.common_ref.push(common.to_owned());
        self
    }

    pub fn with_parameter(mut self, name: &str, config: ParameterConfig) -> Self {
        self.parameters.insert(name.to_owned(), config);
        self
    }

    pub fn with_dataset_parameter(mut self, dataset: &str, name: &str, config: ParameterConfig) -> Self {
        self.datasets
            .entry(dataset.to_owned())
            .or_default()
            .insert(name.to_owned(), config);
        self
    }
}

/// Model bound to one or more datasets, with a separate parameter space per dataset
#[derive(Clone, Debug)]
pub struct DatasetModel {
    name: String,
    kind: DatasetModelKind,
    common_refs: Vec<String>,
    parameters: BTreeMap<String, ParameterConfig>,
    dataset_parameters: BTreeMap<String, BTreeMap<String, ParameterConfig>>,
    spaces: BTreeMap<String, ParameterSpace>,
}

impl DatasetModel {
    pub fn new(name: impl Into<String>, config: DatasetModelConfig) -> Self {
        Self {
            name: name.into(),
            kind: config.kind,
            common_refs: config.common_ref,
            parameters: config.parameters,
            dataset_parameters: config.datasets,
            spaces: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DatasetModelKind {
        &self.kind
    }

    pub fn category(&self) -> ModelCategory {
        self.kind.category()
    }

    pub fn common_refs(&self) -> &[String] {
        &self.common_refs
    }

    /// Fix every dataset-local variable of a jitter model at zero
    pub fn shutdown_jitter(&mut self) {
        if self.category() != ModelCategory::Jitter {
            return;
        }
        for name in self.kind.dataset_pams().into_keys() {
            self.parameters
                .insert(name.clone(), ParameterConfig::fixed(0.0));
            for config in self.dataset_parameters.values_mut() {
                config.insert(name.clone(), ParameterConfig::fixed(0.0));
            }
        }
    }

    /// Create the parameter space of `dataset` and register its variables, once
    pub fn setup_dataset(
        &mut self,
        dataset: &str,
        registry: &mut ThetaRegistry,
    ) -> Result<(), ConfigurationError> {
        if self.spaces.contains_key(dataset) {
            return Ok(());
        }
        let mut config = self.parameters.clone();
        if let Some(overrides) = self.dataset_parameters.get(dataset) {
            config.extend(overrides.clone());
        }
        let defaults = self.kind.dataset_pams();
        let names: Vec<String> = defaults.keys().cloned().collect();
        let mut space = ParameterSpace::new(format!("{}_{}", dataset, self.name), defaults, config);
        for name in &names {
            space.register(name, registry)?;
        }
        self.spaces.insert(dataset.to_owned(), space);
        Ok(())
    }

    pub fn space(&self, dataset: &str) -> Option<&ParameterSpace> {
        self.spaces.get(dataset)
    }

    pub fn datasets(&self) -> impl Iterator<Item = &String> {
        self.spaces.keys()
    }

    /// Dataset-local values, empty for a dataset that was not set up
    pub fn decode_values(&self, dataset: &str, theta: &[f64]) -> Values {
        self.space(dataset)
            .map(|space| space.decode_values(theta))
            .unwrap_or_default()
    }

    pub fn ln_prior(&self, theta: &[f64]) -> f64 {
        self.spaces.values().map(|space| space.ln_prior(theta)).sum()
    }

    pub fn randomize_fixed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for space in self.spaces.values_mut() {
            space.randomize_fixed(rng);
        }
    }
}
