use crate::common::CommonModelTrait;
use crate::parameter::{ParameterDefaults, ParameterSpace};
use crate::prior::PriorKind;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host star, `mass`, `radius` and `density` in solar units
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Star {}

/// Gaussian estimate `(value, error)`
pub type Measurement = (f64, f64);

/// Mutually consistent stellar mass, radius and density
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StellarParameters {
    pub mass: Measurement,
    pub radius: Measurement,
    pub density: Measurement,
}

impl Star {
    pub fn new() -> Self {
        Self {}
    }

    /// Cross-derive mass, radius and density from their Gaussian priors
    ///
    /// Two of the three quantities must have a Gaussian prior and one of them must be the mass
    /// or the radius. Errors are propagated to first order.
    pub fn derive_stellar_parameters(&self, space: &ParameterSpace) -> Option<StellarParameters> {
        let gaussian = |name: &str| -> Option<Measurement> {
            let prior = space.config(name)?.prior.as_ref()?;
            match (prior.kind, prior.parameters.as_slice()) {
                (PriorKind::Gaussian, &[mu, sigma]) => Some((mu, sigma)),
                _ => None,
            }
        };
        let relative = |(value, error): Measurement| error / value;

        match (gaussian("mass"), gaussian("radius"), gaussian("density")) {
            (Some(mass), Some(radius), _) => {
                let value = mass.0 / radius.0.powi(3);
                let error = value * relative(mass).hypot(3.0 * relative(radius));
                Some(StellarParameters {
                    mass,
                    radius,
                    density: (value, error),
                })
            }
            (Some(mass), None, Some(density)) => {
                let value = (mass.0 / density.0).cbrt();
                let error = value * relative(mass).hypot(relative(density)) / 3.0;
                Some(StellarParameters {
                    mass,
                    radius: (value, error),
                    density,
                })
            }
            (None, Some(radius), Some(density)) => {
                let value = density.0 * radius.0.powi(3);
                let error = value * relative(density).hypot(3.0 * relative(radius));
                Some(StellarParameters {
                    mass: (value, error),
                    radius,
                    density,
                })
            }
            (None, None, _) => {
                log::warn!(
                    "{}: a Gaussian prior on either mass or radius is required to derive stellar parameters",
                    space.owner()
                );
                None
            }
            _ => {
                log::warn!(
                    "{}: a Gaussian prior on density is required when only one of mass and radius has one",
                    space.owner()
                );
                None
            }
        }
    }
}

impl CommonModelTrait for Star {
    fn model_class(&self) -> &'static str {
        "star_parameters"
    }

    fn default_parameters(&self) -> BTreeMap<String, ParameterDefaults> {
        BTreeMap::from([
            ("mass".to_owned(), ParameterDefaults::linear(0.01, 100.0)),
            ("radius".to_owned(), ParameterDefaults::linear(0.01, 100.0)),
            ("density".to_owned(), ParameterDefaults::logarithmic(1e-6, 1e3)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterConfig;
    use crate::prior::PriorConfig;
    use approx::assert_relative_eq;

    fn space(priors: &[(&str, f64, f64)]) -> ParameterSpace {
        let config = priors
            .iter()
            .map(|&(name, mu, sigma)| {
                (
                    name.to_owned(),
                    ParameterConfig::new().with_prior(PriorConfig::gaussian(mu, sigma)),
                )
            })
            .collect();
        ParameterSpace::new("star", Star::new().default_parameters(), config)
    }

    #[test]
    fn density_from_mass_and_radius() {
        let derived = Star::new()
            .derive_stellar_parameters(&space(&[("mass", 1.0, 0.1), ("radius", 2.0, 0.1)]))
            .unwrap();
        assert_relative_eq!(derived.density.0, 0.125);
        assert_relative_eq!(
            derived.density.1,
            0.125 * 0.1_f64.hypot(0.15),
            epsilon = 1e-12
        );
    }

    #[test]
    fn radius_from_mass_and_density() {
        let derived = Star::new()
            .derive_stellar_parameters(&space(&[("mass", 1.0, 0.05), ("density", 0.125, 0.01)]))
            .unwrap();
        assert_relative_eq!(derived.radius.0, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_gaussian_priors() {
        let star = Star::new();
        assert!(star
            .derive_stellar_parameters(&space(&[("density", 1.0, 0.1)]))
            .is_none());
        assert!(star
            .derive_stellar_parameters(&space(&[("mass", 1.0, 0.1)]))
            .is_none());
    }
}
