use crate::common::CommonModelTrait;
use crate::common::parametrization::Parametrization;
use crate::kepler::{kepler_phase2tc_tref, kepler_tc2phase_tref};
use crate::parameter::ParameterDefaults;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Orbit and transit geometry of one planet
///
/// - `P` orbital period, days, logarithmic
/// - `K` radial-velocity semi-amplitude, m/s, logarithmic
/// - `e`, `o` eccentricity and argument of periastron, encoded by the parametrization
/// - `f` mean longitude at `t_ref` or `Tc` central transit time, also chosen by the
///   parametrization; the other one is derived after decoding
/// - `R` planet-to-star radius ratio, `a_Rs` scaled semi-major axis, `b` impact parameter
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Planet {
    /// Reference time of the mean longitude
    #[serde(default)]
    pub t_ref: f64,
}

impl Planet {
    pub fn new(t_ref: f64) -> Self {
        Self { t_ref }
    }
}

impl CommonModelTrait for Planet {
    fn model_class(&self) -> &'static str {
        "planet"
    }

    fn default_parameters(&self) -> BTreeMap<String, ParameterDefaults> {
        [
            ("P", ParameterDefaults::logarithmic(0.4, 1e5)),
            ("K", ParameterDefaults::logarithmic(1e-3, 1e4)),
            ("e", ParameterDefaults::linear(0.0, 1.0)),
            ("o", ParameterDefaults::angle(-PI, PI)),
            ("f", ParameterDefaults::angle(0.0, TAU)),
            ("R", ParameterDefaults::linear(1e-5, 0.5)),
            ("a_Rs", ParameterDefaults::logarithmic(1.0, 1e3)),
            ("b", ParameterDefaults::linear(0.0, 2.0)),
        ]
        .into_iter()
        .map(|(name, defaults)| (name.to_owned(), defaults))
        .collect()
    }

    fn sampled_name<'a>(&self, parametrization: Parametrization, name: &'a str) -> &'a str {
        match name {
            "f" | "Tc" => parametrization.epoch_name(),
            _ => name,
        }
    }

    fn complete_values(&self, values: &mut BTreeMap<String, f64>) {
        values.insert("Tref".to_owned(), self.t_ref);
        let Some(&period) = values.get("P") else {
            return;
        };
        let e = values.get("e").copied().unwrap_or(0.0);
        let o = values.get("o").copied().unwrap_or(FRAC_PI_2);
        match (values.get("f").copied(), values.get("Tc").copied()) {
            (None, Some(tc)) => {
                values.insert(
                    "f".to_owned(),
                    kepler_tc2phase_tref(period, tc - self.t_ref, e, o),
                );
            }
            (Some(f), None) => {
                values.insert(
                    "Tc".to_owned(),
                    self.t_ref + kepler_phase2tc_tref(period, f, e, o),
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn epoch_name_follows_parametrization() {
        let planet = Planet::default();
        assert_eq!(planet.sampled_name(Parametrization::Eastman2013, "Tc"), "f");
        assert_eq!(planet.sampled_name(Parametrization::StandardTc, "f"), "Tc");
        assert_eq!(planet.sampled_name(Parametrization::StandardTc, "K"), "K");
    }

    #[test]
    fn central_time_completes_mean_longitude() {
        let planet = Planet::new(100.0);
        let mut values = BTreeMap::from([
            ("P".to_owned(), 3.0),
            ("e".to_owned(), 0.2),
            ("o".to_owned(), 1.0),
            ("Tc".to_owned(), 101.5),
        ]);
        planet.complete_values(&mut values);
        assert_eq!(values["Tref"], 100.0);
        let mut back = values.clone();
        back.remove("Tc");
        planet.complete_values(&mut back);
        assert_relative_eq!(back["Tc"], 101.5, epsilon = 1e-9);
    }

    #[test]
    fn completion_needs_period() {
        let planet = Planet::default();
        let mut values = BTreeMap::from([("f".to_owned(), 1.0)]);
        planet.complete_values(&mut values);
        assert!(!values.contains_key("Tc"));
    }
}
