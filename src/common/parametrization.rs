use crate::error::ConfigurationError;
use crate::parameter::PairTransformation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Encoding of eccentricity `e` and argument of periastron `o` in the sampler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EccentricityFamily {
    /// `e` and `o` sampled directly
    Standard,
    /// `e cos o`, `e sin o`
    Ford2006,
    /// `√e cos o`, `√e sin o`
    Eastman2013,
}

impl EccentricityFamily {
    /// Sampler-space names of the pair, `None` for [EccentricityFamily::Standard]
    pub fn sampler_names(self) -> Option<[&'static str; 2]> {
        match self {
            Self::Standard => None,
            Self::Ford2006 => Some(["e_coso", "e_sino"]),
            Self::Eastman2013 => Some(["sre_coso", "sre_sino"]),
        }
    }

    /// Transformation decoding `e` from the pair
    pub fn eccentricity_transformation(self) -> Option<PairTransformation> {
        match self {
            Self::Standard => None,
            Self::Ford2006 => Some(PairTransformation::Hypot),
            Self::Eastman2013 => Some(PairTransformation::SquaredSum),
        }
    }

    /// Sampler pair of a physical `(e, o)`, the identity for [EccentricityFamily::Standard]
    pub fn forward(self, e: f64, o: f64) -> (f64, f64) {
        match self {
            Self::Standard => (e, o),
            Self::Ford2006 => (e * o.cos(), e * o.sin()),
            Self::Eastman2013 => {
                let sqrt_e = e.sqrt();
                (sqrt_e * o.cos(), sqrt_e * o.sin())
            }
        }
    }

    /// Physical `(e, o)` of a sampler pair
    pub fn inverse(self, x: f64, y: f64) -> (f64, f64) {
        match self.eccentricity_transformation() {
            None => (x, y),
            Some(t) => (t.apply(x, y), PairTransformation::Atan2.apply(x, y)),
        }
    }
}

/// Parametrization of a planet orbit
///
/// Selects the eccentricity encoding and whether the orbital epoch is the mean longitude `f`
/// at the reference time or the central transit time `Tc`. `*_Tcent` and `*_Tc` are synonyms.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum Parametrization {
    Standard,
    #[serde(rename = "Standard_Tcent")]
    StandardTcent,
    #[serde(rename = "Standard_Tc")]
    StandardTc,
    Ford2006,
    #[serde(rename = "Ford2006_Tcent")]
    Ford2006Tcent,
    #[serde(rename = "Ford2006_Tc")]
    Ford2006Tc,
    #[default]
    Eastman2013,
    #[serde(rename = "Eastman2013_Tcent")]
    Eastman2013Tcent,
    #[serde(rename = "Eastman2013_Tc")]
    Eastman2013Tc,
}

impl Parametrization {
    pub fn family(self) -> EccentricityFamily {
        match self {
            Self::Standard | Self::StandardTcent | Self::StandardTc => EccentricityFamily::Standard,
            Self::Ford2006 | Self::Ford2006Tcent | Self::Ford2006Tc => EccentricityFamily::Ford2006,
            Self::Eastman2013 | Self::Eastman2013Tcent | Self::Eastman2013Tc => {
                EccentricityFamily::Eastman2013
            }
        }
    }

    pub fn uses_central_time(self) -> bool {
        matches!(
            self,
            Self::StandardTcent
                | Self::StandardTc
                | Self::Ford2006Tcent
                | Self::Ford2006Tc
                | Self::Eastman2013Tcent
                | Self::Eastman2013Tc
        )
    }

    /// Name of the sampled orbital epoch, `Tc` or `f`
    pub fn epoch_name(self) -> &'static str {
        if self.uses_central_time() { "Tc" } else { "f" }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::StandardTcent => "Standard_Tcent",
            Self::StandardTc => "Standard_Tc",
            Self::Ford2006 => "Ford2006",
            Self::Ford2006Tcent => "Ford2006_Tcent",
            Self::Ford2006Tc => "Ford2006_Tc",
            Self::Eastman2013 => "Eastman2013",
            Self::Eastman2013Tcent => "Eastman2013_Tcent",
            Self::Eastman2013Tc => "Eastman2013_Tc",
        }
    }

    pub fn all() -> [Self; 9] {
        [
            Self::Standard,
            Self::StandardTcent,
            Self::StandardTc,
            Self::Ford2006,
            Self::Ford2006Tcent,
            Self::Ford2006Tc,
            Self::Eastman2013,
            Self::Eastman2013Tcent,
            Self::Eastman2013Tc,
        ]
    }
}

impl FromStr for Parametrization {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownName {
                what: "parametrization",
                name: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn names_round_trip() {
        for p in Parametrization::all() {
            assert_eq!(p.name().parse::<Parametrization>().unwrap(), p);
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.name()));
        }
        assert!("Eastman".parse::<Parametrization>().is_err());
    }

    #[test]
    fn default_is_eastman_with_mean_longitude() {
        let p = Parametrization::default();
        assert_eq!(p.family(), EccentricityFamily::Eastman2013);
        assert_eq!(p.epoch_name(), "f");
        assert_eq!(Parametrization::Ford2006Tcent.epoch_name(), "Tc");
    }

    #[test]
    fn forward_and_inverse_agree() {
        let families = [
            EccentricityFamily::Standard,
            EccentricityFamily::Ford2006,
            EccentricityFamily::Eastman2013,
        ];
        for family in families {
            for &(e, o) in &[(0.1, 0.3), (0.5, -2.0), (0.93, 3.0)] {
                let (x, y) = family.forward(e, o);
                let (e2, o2) = family.inverse(x, y);
                assert_relative_eq!(e2, e, epsilon = 1e-12);
                assert_relative_eq!(o2, o, epsilon = 1e-12);
            }
        }
    }
}
