use crate::error::ConfigurationError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of a one-parameter prior, as named in configuration files
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum PriorKind {
    None,
    Uniform,
    Gaussian,
    #[serde(alias = "PositiveHalfGaussian")]
    HalfGaussian,
    NegativeHalfGaussian,
    #[serde(alias = "TruncatedJeffreys")]
    Jeffreys,
    #[serde(alias = "TruncatedModifiedJeffreys")]
    ModifiedJeffreys,
    TruncatedRayleigh,
    WhiteNoisePrior,
    #[serde(alias = "BetaDistribution")]
    Beta,
    File,
}

impl PriorKind {
    /// Kinds with a closed-form inverse CDF, the only ones allowed outside Linear space
    pub fn is_closed_form(self) -> bool {
        matches!(self, Self::Uniform | Self::Gaussian | Self::Beta)
    }

    /// Number of prior parameters, `None` for a variable-length list
    pub fn n_parameters(self) -> Option<usize> {
        match self {
            Self::None | Self::Uniform | Self::Jeffreys => Some(0),
            Self::ModifiedJeffreys | Self::WhiteNoisePrior => Some(1),
            Self::Gaussian
            | Self::HalfGaussian
            | Self::NegativeHalfGaussian
            | Self::TruncatedRayleigh
            | Self::Beta => Some(2),
            Self::File => None,
        }
    }
}

impl FromStr for PriorKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "None" => Self::None,
            "Uniform" => Self::Uniform,
            "Gaussian" => Self::Gaussian,
            "HalfGaussian" | "PositiveHalfGaussian" => Self::HalfGaussian,
            "NegativeHalfGaussian" => Self::NegativeHalfGaussian,
            "Jeffreys" | "TruncatedJeffreys" => Self::Jeffreys,
            "ModifiedJeffreys" | "TruncatedModifiedJeffreys" => Self::ModifiedJeffreys,
            "TruncatedRayleigh" => Self::TruncatedRayleigh,
            "WhiteNoisePrior" => Self::WhiteNoisePrior,
            "Beta" | "BetaDistribution" => Self::Beta,
            "File" => Self::File,
            _ => {
                return Err(ConfigurationError::UnknownName {
                    what: "prior kind",
                    name: s.to_owned(),
                });
            }
        };
        Ok(kind)
    }
}

/// Prior as given in the configuration: its kind plus kind-specific numbers
///
/// For [PriorKind::File] the parameters are the samples of the pre-fitted density, the kernel
/// bandwidth is chosen with Scott's rule.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PriorConfig {
    pub kind: PriorKind,
    #[serde(default)]
    pub parameters: Vec<f64>,
}

impl PriorConfig {
    pub fn new(kind: PriorKind, parameters: impl Into<Vec<f64>>) -> Self {
        Self {
            kind,
            parameters: parameters.into(),
        }
    }

    pub fn uniform() -> Self {
        Self::new(PriorKind::Uniform, vec![])
    }

    pub fn gaussian(mu: f64, sigma: f64) -> Self {
        Self::new(PriorKind::Gaussian, vec![mu, sigma])
    }

    pub fn is_gaussian(&self) -> bool {
        self.kind == PriorKind::Gaussian
    }
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self::uniform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_parse_to_the_same_kind() {
        for (alias, kind) in [
            ("PositiveHalfGaussian", PriorKind::HalfGaussian),
            ("TruncatedJeffreys", PriorKind::Jeffreys),
            ("TruncatedModifiedJeffreys", PriorKind::ModifiedJeffreys),
            ("BetaDistribution", PriorKind::Beta),
        ] {
            assert_eq!(alias.parse::<PriorKind>().unwrap(), kind);
            let from_json: PriorKind = serde_json::from_str(&format!("\"{alias}\"")).unwrap();
            assert_eq!(from_json, kind);
        }
    }

    #[test]
    fn unknown_kind() {
        assert!("Cauchy".parse::<PriorKind>().is_err());
    }

    #[test]
    fn closed_form_kinds() {
        assert!(PriorKind::Uniform.is_closed_form());
        assert!(PriorKind::Gaussian.is_closed_form());
        assert!(PriorKind::Beta.is_closed_form());
        assert!(!PriorKind::Jeffreys.is_closed_form());
        assert!(!PriorKind::File.is_closed_form());
    }

    #[test]
    fn config_from_json() {
        let config: PriorConfig =
            serde_json::from_str(r#"{"kind": "Gaussian", "parameters": [1.0, 0.1]}"#).unwrap();
        assert_eq!(config, PriorConfig::gaussian(1.0, 0.1));
        let config: PriorConfig = serde_json::from_str(r#"{"kind": "Uniform"}"#).unwrap();
        assert_eq!(config, PriorConfig::uniform());
    }
}
