use crate::common::parametrization::Parametrization;
use crate::common::star::StellarParameters;
use crate::common::{CommonModelKind, CommonModelTrait};
use crate::error::ConfigurationError;
use crate::parameter::{
    Decoder, PairTransformation, ParameterConfig, ParameterDefaults, ParameterIndex,
    ParameterSpace, ThetaRegistry,
};

use ndarray::{Array2, Axis};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows with eccentricity closer than this to one of its bounds are redrawn by
/// [CommonModel::repair_population]
pub const ECCENTRICITY_REPAIR_MARGIN: f64 = 0.02;

/// Configuration of a common model
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CommonModelConfig {
    pub kind: CommonModelKind,
    #[serde(default)]
    pub parametrization: Parametrization,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterConfig>,
}

impl CommonModelConfig {
    pub fn new(kind: impl Into<CommonModelKind>) -> Self {
        Self {
            kind: kind.into(),
            parametrization: Parametrization::default(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parametrization(mut self, parametrization: Parametrization) -> Self {
        self.parametrization = parametrization;
        self
    }

    pub fn with_parameter(mut self, name: &str, config: ParameterConfig) -> Self {
        self.parameters.insert(name.to_owned(), config);
        self
    }
}

/// Physical entity whose parameters can be shared by many datasets
///
/// Parameters are registered lazily: only names requested by a bound dataset model consume
/// theta coordinates. Registration of the same name is idempotent, so any number of dataset
/// models may reference the same common model.
#[derive(Clone, Debug)]
pub struct CommonModel {
    name: String,
    kind: CommonModelKind,
    parametrization: Parametrization,
    space: ParameterSpace,
    period_average: Option<f64>,
}

impl CommonModel {
    pub fn new(name: impl Into<String>, config: CommonModelConfig) -> Self {
        let name = name.into();
        let CommonModelConfig {
            kind,
            parametrization,
            parameters,
        } = config;

        let mut defaults = kind.default_parameters();
        if defaults.contains_key("e") {
            if let Some(sampler_names) = parametrization.family().sampler_names() {
                for sampler_name in sampler_names {
                    defaults.insert(sampler_name.to_owned(), ParameterDefaults::linear(-1.0, 1.0));
                }
            }
        }
        let mut config = kind.default_config();
        config.extend(parameters);

        Self {
            space: ParameterSpace::new(name.clone(), defaults, config),
            name,
            kind,
            parametrization,
            period_average: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CommonModelKind {
        &self.kind
    }

    pub fn parametrization(&self) -> Parametrization {
        self.parametrization
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut ParameterSpace {
        &mut self.space
    }

    /// Fixed period or the midpoint of its bounds, available once `P` is registered
    pub fn period_average(&self) -> Option<f64> {
        self.period_average
    }

    /// Register a requested variable, appending its sampler coordinates to `registry`
    pub fn register(
        &mut self,
        name: &str,
        registry: &mut ThetaRegistry,
    ) -> Result<(), ConfigurationError> {
        let name = self.kind.sampled_name(self.parametrization, name);
        match name {
            "e" | "o" if self.register_eccentricity(registry)? => Ok(()),
            "P" => {
                self.space.register(name, registry)?;
                self.period_average = match self.space.config(name).and_then(|c| c.fixed) {
                    Some(fixed) => Some(fixed),
                    None => {
                        let [lower, upper] = self.space.resolve(name)?.bounds;
                        Some(0.5 * (lower + upper))
                    }
                };
                Ok(())
            }
            _ => self.space.register(name, registry),
        }
    }

    /// Register `e` and `o` through a pair of sampler coordinates
    ///
    /// Returns `false` when the pair encoding does not apply and both variables must be
    /// registered one by one: the family is [crate::common::EccentricityFamily::Standard] or either
    /// variable is fixed.
    fn register_eccentricity(
        &mut self,
        registry: &mut ThetaRegistry,
    ) -> Result<bool, ConfigurationError> {
        let family = self.parametrization.family();
        let (Some(sampler_names), Some(transformation)) =
            (family.sampler_names(), family.eccentricity_transformation())
        else {
            return Ok(false);
        };
        if self.space.is_fixed("e") || self.space.is_fixed("o") {
            return Ok(false);
        }
        let already_registered = ["e", "o"]
            .into_iter()
            .chain(sampler_names)
            .any(|name| self.space.is_registered(name));
        if already_registered {
            return Ok(true);
        }

        let [x_name, y_name] = sampler_names;
        let x = self.space.resolve(x_name)?;
        let ix = self.space.register_sampler_coordinate(x_name, &x, registry)?;
        let y = self.space.resolve(y_name)?;
        let iy = self.space.register_sampler_coordinate(y_name, &y, registry)?;
        self.space
            .insert_decoder("e", Decoder::pair(ix, iy, transformation));
        self.space
            .insert_decoder("o", Decoder::pair(ix, iy, PairTransformation::Atan2));
        for name in ["e", "o"] {
            let resolved = self.space.resolve(name)?;
            self.space.set_physical(name, &resolved)?;
        }
        log::debug!(
            "{}: e and o sampled as {} and {}",
            self.name,
            x_name,
            y_name
        );
        Ok(true)
    }

    /// Decoded physical values, completed with derived quantities
    pub fn decode_values(&self, theta: &[f64]) -> BTreeMap<String, f64> {
        let mut values = self.space.decode_values(theta);
        self.kind.complete_values(&mut values);
        values
    }

    pub fn ln_prior(&self, theta: &[f64]) -> f64 {
        self.space.ln_prior(theta)
    }

    /// Starting value of an eccentricity sampler coordinate
    ///
    /// Uses a user-given start of the coordinate itself or, failing that, user-given `e` and
    /// `o` mapped forward. Returns `false` for other names or when no start is available, so
    /// the caller applies its generic fallback.
    pub fn initialize_starting_point(&self, sampler_name: &str, starting_point: &mut [f64]) -> bool {
        let family = self.parametrization.family();
        let Some(sampler_names) = family.sampler_names() else {
            return false;
        };
        let Some(position) = sampler_names.iter().position(|&n| n == sampler_name) else {
            return false;
        };
        let Some(&index) = self.space.sampler_indices().get(sampler_name) else {
            return false;
        };
        let starts = self.space.starts();
        if let Some(&start) = starts.get(sampler_name) {
            starting_point[index] = start;
            return true;
        }
        let (Some(&e), Some(&o)) = (starts.get("e"), starts.get("o")) else {
            return false;
        };
        let (x, y) = family.forward(e, o);
        starting_point[index] = if position == 0 { x } else { y };
        true
    }

    /// Redraw the eccentricity of rows lying within [ECCENTRICITY_REPAIR_MARGIN] of its
    /// bounds, keeping the argument of periastron of each row. Returns the number of
    /// repaired rows.
    pub fn repair_population<R: Rng + ?Sized>(
        &self,
        population: &mut Array2<f64>,
        rng: &mut R,
    ) -> usize {
        let Some(&decoder) = self.space.decoder("e") else {
            return 0;
        };
        if !decoder.is_sampled() {
            return 0;
        }
        let [lower, upper] = self.space.physical_bounds("e").unwrap_or([0.0, 1.0]);
        let (low, high) = (
            lower + ECCENTRICITY_REPAIR_MARGIN,
            upper - ECCENTRICITY_REPAIR_MARGIN,
        );
        if low >= high {
            return 0;
        }
        let Some(eccentricity) = self.space.decode("e", population.view()) else {
            return 0;
        };
        let omega = self.space.decode("o", population.view());
        let family = self.parametrization.family();

        let mut repaired = 0;
        for (r, (mut row, &e)) in population
            .axis_iter_mut(Axis(0))
            .zip(&eccentricity)
            .enumerate()
        {
            if low <= e && e <= high {
                continue;
            }
            let e = rng.random_range(low..high);
            match decoder {
                Decoder::Single { index, space } => row[index] = space.to_sampler(e),
                Decoder::Pair { first, second, .. } => {
                    let o = match &omega {
                        Some(omega) => omega[r],
                        None => family.inverse(row[first], row[second]).1,
                    };
                    let (x, y) = family.forward(e, o);
                    row[first] = x;
                    row[second] = y;
                }
                Decoder::Fixed(_) => {}
            }
            repaired += 1;
        }
        log::debug!("{}: eccentricity redrawn in {} rows", self.name, repaired);
        repaired
    }

    /// Mass, radius and density cross-derivation, `None` for non-stellar models or when
    /// Gaussian priors are missing
    pub fn derive_stellar_parameters(&self) -> Option<StellarParameters> {
        match &self.kind {
            CommonModelKind::Star(star) => star.derive_stellar_parameters(&self.space),
            _ => None,
        }
    }

    pub fn randomize_fixed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.space.randomize_fixed(rng);
    }

    pub fn is_eccentricity_paired(&self) -> bool {
        matches!(
            self.space.decoder("e").and_then(Decoder::index),
            Some(ParameterIndex::Pair(..))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Planet, PolynomialTrend};
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn planet(parametrization: Parametrization) -> CommonModel {
        CommonModel::new(
            "b",
            CommonModelConfig::new(Planet::default()).with_parametrization(parametrization),
        )
    }

    fn register_all(model: &mut CommonModel, names: &[&str]) -> ThetaRegistry {
        let mut registry = ThetaRegistry::new();
        for name in names {
            model.register(name, &mut registry).unwrap();
        }
        registry
    }

    #[test]
    fn eastman_pair_consumes_two_coordinates_once() {
        let mut model = planet(Parametrization::Eastman2013);
        let registry = register_all(&mut model, &["e", "o", "e", "P"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.entries()[0].name, "sre_coso");
        assert_eq!(registry.entries()[1].name, "sre_sino");
        assert_eq!(registry.entries()[0].bounds, [-1.0, 1.0]);
        assert!(model.is_eccentricity_paired());
    }

    #[test]
    fn round_trip_for_every_family() {
        for parametrization in [
            Parametrization::Standard,
            Parametrization::Ford2006,
            Parametrization::Eastman2013,
        ] {
            let mut model = planet(parametrization);
            let registry = register_all(&mut model, &["e", "o"]);
            assert_eq!(registry.len(), 2);
            let family = parametrization.family();
            for &(e, o) in &[(0.05, 0.4), (0.3, -1.2), (0.8, 2.9)] {
                let (x, y) = family.forward(e, o);
                let [x_name, y_name] = family.sampler_names().unwrap_or(["e", "o"]);
                let indices = model.space().sampler_indices();
                let mut theta = vec![0.0; 2];
                theta[indices[x_name]] = x;
                theta[indices[y_name]] = y;
                let values = model.decode_values(&theta);
                assert_relative_eq!(values["e"], e, epsilon = 1e-12);
                assert_relative_eq!(values["o"], o, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn fixed_eccentricity_skips_the_pair() {
        let mut model = CommonModel::new(
            "b",
            CommonModelConfig::new(Planet::default())
                .with_parameter("e", ParameterConfig::fixed(0.0)),
        );
        let registry = register_all(&mut model, &["e", "o"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].name, "o");
        assert!(registry.entries()[0].circular);
        assert!(!model.is_eccentricity_paired());
        let values = model.decode_values(&[1.0]);
        assert_eq!(values["e"], 0.0);
        assert_eq!(values["o"], 1.0);
    }

    #[test]
    fn period_average() {
        let mut model = CommonModel::new(
            "b",
            CommonModelConfig::new(Planet::default())
                .with_parameter("P", ParameterConfig::new().with_bounds(2.0, 4.0)),
        );
        assert_eq!(model.period_average(), None);
        register_all(&mut model, &["P"]);
        assert_eq!(model.period_average(), Some(3.0));

        let mut fixed = CommonModel::new(
            "c",
            CommonModelConfig::new(Planet::default())
                .with_parameter("P", ParameterConfig::fixed(7.5)),
        );
        register_all(&mut fixed, &["P"]);
        assert_eq!(fixed.period_average(), Some(7.5));
    }

    #[test]
    fn epoch_alias() {
        let mut model = CommonModel::new(
            "b",
            CommonModelConfig::new(Planet::default())
                .with_parametrization(Parametrization::Eastman2013Tc)
                .with_parameter("Tc", ParameterConfig::new().with_bounds(10.0, 12.0)),
        );
        let registry = register_all(&mut model, &["f", "Tc"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].name, "Tc");
    }

    #[test]
    fn ln_prior_rejects_eccentricity_above_one() {
        let mut model = planet(Parametrization::Eastman2013);
        register_all(&mut model, &["e"]);
        assert!(model.ln_prior(&[0.5, 0.5]).is_finite());
        assert_eq!(model.ln_prior(&[0.9, 0.9]), f64::NEG_INFINITY);
    }

    #[test]
    fn starting_point_from_e_and_o() {
        let mut model = CommonModel::new(
            "b",
            CommonModelConfig::new(Planet::default())
                .with_parameter("e", ParameterConfig::new().with_start(0.25))
                .with_parameter("o", ParameterConfig::new().with_start(0.0)),
        );
        register_all(&mut model, &["e", "o", "K"]);
        let mut starting_point = [0.0; 3];
        assert!(model.initialize_starting_point("sre_coso", &mut starting_point));
        assert!(model.initialize_starting_point("sre_sino", &mut starting_point));
        assert!(!model.initialize_starting_point("K", &mut starting_point));
        assert_relative_eq!(starting_point[0], 0.5);
        assert_relative_eq!(starting_point[1], 0.0);
    }

    #[test]
    fn repair_moves_rows_away_from_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for parametrization in [
            Parametrization::Standard,
            Parametrization::Ford2006,
            Parametrization::Eastman2013,
        ] {
            let mut model = planet(parametrization);
            register_all(&mut model, &["e", "o"]);
            let family = parametrization.family();
            let rows = [(0.001, 0.5), (0.01, 1.0), (0.5, 2.0), (0.995, -1.0), (1.0, 3.0)];
            let mut population = Array2::zeros((rows.len(), 2));
            for (mut row, &(e, o)) in population.axis_iter_mut(Axis(0)).zip(&rows) {
                let (x, y) = family.forward(e, o);
                row[0] = x;
                row[1] = y;
            }
            let repaired = model.repair_population(&mut population, &mut rng);
            assert_eq!(repaired, 4);
            for (row, &(_, o)) in population.rows().into_iter().zip(&rows) {
                let (e, o_new) = family.inverse(row[0], row[1]);
                assert!(e >= ECCENTRICITY_REPAIR_MARGIN - 1e-12);
                assert!(e <= 1.0 - ECCENTRICITY_REPAIR_MARGIN + 1e-12);
                assert_relative_eq!(o_new, o, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn polynomial_intercept_defaults_to_zero() {
        let mut model =
            CommonModel::new("trend", CommonModelConfig::new(PolynomialTrend::new(1, 5.0)));
        let registry = register_all(&mut model, &["c0", "c1"]);
        assert_eq!(registry.len(), 1);
        let values = model.decode_values(&[0.5]);
        assert_eq!(values["c0"], 0.0);
        assert_eq!(values["c1"], 0.5);
        assert_eq!(values["x_zero"], 5.0);
    }
}
