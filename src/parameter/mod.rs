//! Mapping between the flat sampler vector and named physical parameters
//!
//! Every entity owns a [ParameterSpace]. During initialization each parameter is resolved
//! against user configuration and the entity defaults and is either fixed or appended to the
//! shared [ThetaRegistry]. At evaluation time a [Decoder] turns theta into the physical value.

pub mod config;
pub use config::{ParameterConfig, ParameterDefaults, ResolvedParameter};

pub mod entity;
pub use entity::ParameterSpace;

pub mod index;
pub use index::{Decoder, PairTransformation, ParameterIndex};

pub mod registry;
pub use registry::{ThetaEntry, ThetaRegistry};

mod space;
pub use space::SamplingSpace;
