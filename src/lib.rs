#![doc = include_str!("../README.md")]

pub mod common;
pub use common::{
    CommonModel, CommonModelConfig, CommonModelKind, CommonModelTrait, EccentricityFamily,
    Parametrization,
};

mod compose;
pub use compose::{ModelComposer, Models};

mod config;
pub use config::EmceeParameters;

mod container;
pub use container::{INITIAL_POPULATION_SPREAD, ModelContainer, population_median};

mod dataset;
pub use dataset::{Composition, Dataset};

pub mod dataset_models;
pub use dataset_models::{
    DatasetModel, DatasetModelConfig, DatasetModelKind, DatasetModelTrait, ModelCategory,
};

pub mod dynamical;
pub use dynamical::{DynamicalIntegrator, DynamicalRequest, KeplerianIntegrator};

mod error;
pub use error::{ComposeError, ConfigurationError, GpError};

pub mod gp;
pub use gp::{DenseGaussianProcess, GaussianProcess, QuasiPeriodicKernel};

pub mod kepler;

pub mod parameter;
pub use parameter::{ParameterConfig, ParameterSpace, SamplingSpace, ThetaRegistry};

pub mod prelude;

pub mod prior;
pub use prior::{LnPrior1D, PriorConfig, PriorKind, PriorTransform};

pub use emcee;
pub use ndarray;
