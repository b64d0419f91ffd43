use crate::parameter::SamplingSpace;
use crate::prior::PriorKind;

/// Fatal setup error, returned while the model container is being initialized
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigurationError {
    #[error(
        "prior {kind:?} has no closed-form inverse CDF and must be sampled in Linear space, not {space:?}"
    )]
    NonLinearSpaceForPrior { kind: PriorKind, space: SamplingSpace },

    #[error("parameter {owner}:{name}: {source}")]
    Parameter {
        owner: String,
        name: String,
        source: Box<ConfigurationError>,
    },

    #[error("prior {kind:?} requires {expected} parameter(s), {actual} given")]
    PriorParameterCount {
        kind: PriorKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid prior parameters for {kind:?}: {reason}")]
    InvalidPriorParameters { kind: PriorKind, reason: String },

    #[error("bounds [{lower}, {upper}] of {owner}:{name} are not finite and increasing")]
    InvalidBounds {
        owner: String,
        name: String,
        lower: f64,
        upper: f64,
    },

    #[error("unknown name {name:?} for {what}")]
    UnknownName { what: &'static str, name: String },

    #[error("parameter {owner}:{name} has neither default nor configured bounds")]
    MissingBounds { owner: String, name: String },

    #[error("model {model} references unknown common model {common}")]
    UnknownCommonModel { model: String, common: String },

    #[error("dataset {dataset} is bound to unknown model {model}")]
    UnknownDatasetModel { dataset: String, model: String },

    #[error("model {model} requires a common model of kind {expected}, {common} is not")]
    WrongCommonModelKind {
        model: String,
        common: String,
        expected: &'static str,
    },

    #[error("dataset {dataset} is bound to {count} Gaussian-process models, at most one is allowed")]
    MultipleGaussianProcesses { dataset: String, count: usize },

    #[error("dataset {name}: arrays have different lengths ({x0}, {y}, {e})")]
    DatasetLengthMismatch {
        name: String,
        x0: usize,
        y: usize,
        e: usize,
    },
}

/// Error of the Gaussian-process collaborator
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GpError {
    #[error("covariance matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("compute() must be called before conditioning the process")]
    NotComputed,

    #[error("wrong number of kernel parameters: expected {expected}, got {actual}")]
    ParameterVector { expected: usize, actual: usize },

    #[error("Gaussian-process handle of dataset {0} is poisoned")]
    Poisoned(String),
}

/// Error returned while evaluating models for a given theta
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ComposeError {
    #[error("theta has {actual} elements, the model expects {expected}")]
    ThetaLength { expected: usize, actual: usize },

    #[error("model container must be initialized before evaluation")]
    Uninitialized,

    #[error("variable {name} is not available to model {model}")]
    MissingVariable { model: String, name: String },

    #[error("unknown dataset {0}")]
    UnknownDataset(String),

    #[error("unknown model {0}")]
    UnknownModel(String),

    #[error("Gaussian process of dataset {dataset} failed: {error}")]
    GaussianProcess { dataset: String, error: GpError },

    #[error("no Gaussian-process handle is registered for dataset {0}")]
    MissingGaussianProcess(String),

    #[error("coordinate {0} is absent from the previous theta layout")]
    UnknownLegacyCoordinate(String),

    #[error(
        "previous population has {columns} columns and bounds of shape {bound_shape:?}, index {index} does not fit"
    )]
    LegacyShape {
        index: usize,
        columns: usize,
        bound_shape: (usize, usize),
    },
}
