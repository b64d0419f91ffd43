pub use crate::common::CommonModelTrait;
pub use crate::dataset_models::DatasetModelTrait;
pub use crate::dynamical::DynamicalIntegrator;
pub use crate::gp::GaussianProcess;
pub use crate::prior::LnPrior1DTrait;
