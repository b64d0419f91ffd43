use crate::common::CommonModelTrait;
use crate::parameter::ParameterDefaults;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stellar activity hyperparameters shared by quasi-periodic Gaussian processes
///
/// `Prot` rotational period, `Pdec` decay timescale of active regions, `Oamp` coherence scale
/// of the periodic component. Amplitudes are dataset-local.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Activity {}

impl Activity {
    pub fn new() -> Self {
        Self {}
    }
}

impl CommonModelTrait for Activity {
    fn model_class(&self) -> &'static str {
        "activity"
    }

    fn default_parameters(&self) -> BTreeMap<String, ParameterDefaults> {
        BTreeMap::from([
            ("Prot".to_owned(), ParameterDefaults::logarithmic(1.0, 1e3)),
            ("Pdec".to_owned(), ParameterDefaults::logarithmic(1.0, 1e4)),
            ("Oamp".to_owned(), ParameterDefaults::logarithmic(1e-3, 2.0)),
        ])
    }
}
