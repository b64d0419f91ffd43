//! Physical entities shared by datasets: planets, trends, stellar activity and the star

mod activity;
pub use activity::Activity;

mod model;
pub use model::{CommonModel, CommonModelConfig, ECCENTRICITY_REPAIR_MARGIN};

mod parametrization;
pub use parametrization::{EccentricityFamily, Parametrization};

mod planet;
pub use planet::Planet;

pub mod polynomial;
pub use polynomial::PolynomialTrend;

mod star;
pub use star::{Measurement, Star, StellarParameters};

use crate::parameter::{ParameterConfig, ParameterDefaults};

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Behaviour specific to a kind of common model
#[enum_dispatch]
pub trait CommonModelTrait {
    /// Short class name, used in messages
    fn model_class(&self) -> &'static str;

    /// Recognized parameter names with their fallback bounds, space and prior
    fn default_parameters(&self) -> BTreeMap<String, ParameterDefaults>;

    /// Configuration applied unless the user overrides it
    fn default_config(&self) -> BTreeMap<String, ParameterConfig> {
        BTreeMap::new()
    }

    /// Name under which a requested variable is sampled
    fn sampled_name<'a>(&self, _parametrization: Parametrization, name: &'a str) -> &'a str {
        name
    }

    /// Add quantities derived from decoded values
    fn complete_values(&self, _values: &mut BTreeMap<String, f64>) {}
}

#[enum_dispatch(CommonModelTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum CommonModelKind {
    Planet(Planet),
    PolynomialTrend(PolynomialTrend),
    Activity(Activity),
    Star(Star),
}
