use crate::error::ConfigurationError;
use crate::parameter::config::{ParameterConfig, ParameterDefaults, ResolvedParameter};
use crate::parameter::index::Decoder;
use crate::parameter::registry::{ThetaEntry, ThetaRegistry};
use crate::parameter::SamplingSpace;
use crate::prior::{LnPrior1D, LnPrior1DTrait, PriorTransform};

use ndarray::{Array, ArrayView, RemoveAxis};
use rand::Rng;
use rand_distr::Normal;
use std::collections::BTreeMap;

/// Parameters of one entity: a common model or a dataset model bound to one dataset
///
/// Resolves every parameter name to either a fixed value or a decoder reading theta, keeps
/// the physical-space bounds and priors used to evaluate the log-prior, and records the
/// theta index of each sampler-space name.
#[derive(Clone, Debug)]
pub struct ParameterSpace {
    owner: String,
    defaults: BTreeMap<String, ParameterDefaults>,
    config: BTreeMap<String, ParameterConfig>,
    decoders: BTreeMap<String, Decoder>,
    sampler_indices: BTreeMap<String, usize>,
    physical_bounds: BTreeMap<String, [f64; 2]>,
    priors: BTreeMap<String, LnPrior1D>,
}

impl ParameterSpace {
    pub fn new(
        owner: impl Into<String>,
        defaults: BTreeMap<String, ParameterDefaults>,
        config: BTreeMap<String, ParameterConfig>,
    ) -> Self {
        Self {
            owner: owner.into(),
            defaults,
            config,
            decoders: BTreeMap::new(),
            sampler_indices: BTreeMap::new(),
            physical_bounds: BTreeMap::new(),
            priors: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn config(&self, name: &str) -> Option<&ParameterConfig> {
        self.config.get(name)
    }

    /// Replace the configuration of a parameter, only effective before it is registered
    pub fn set_config(&mut self, name: &str, config: ParameterConfig) {
        self.config.insert(name.to_owned(), config);
    }

    pub fn is_fixed(&self, name: &str) -> bool {
        self.config(name).and_then(|c| c.fixed).is_some()
    }

    /// Does a decoder or a sampler coordinate already exist under this name
    pub fn is_registered(&self, name: &str) -> bool {
        self.decoders.contains_key(name) || self.sampler_indices.contains_key(name)
    }

    pub fn decoder(&self, name: &str) -> Option<&Decoder> {
        self.decoders.get(name)
    }

    pub fn decoders(&self) -> impl Iterator<Item = (&String, &Decoder)> {
        self.decoders.iter()
    }

    /// Sampler-space names and their theta indices
    pub fn sampler_indices(&self) -> &BTreeMap<String, usize> {
        &self.sampler_indices
    }

    pub fn physical_bounds(&self, name: &str) -> Option<[f64; 2]> {
        self.physical_bounds.get(name).copied()
    }

    /// User-provided starting values, physical space
    pub fn starts(&self) -> BTreeMap<String, f64> {
        self.config
            .iter()
            .filter_map(|(name, c)| c.starts.map(|s| (name.clone(), s)))
            .collect()
    }

    pub(crate) fn labelled(&self, name: &str, error: ConfigurationError) -> ConfigurationError {
        ConfigurationError::Parameter {
            owner: self.owner.clone(),
            name: name.to_owned(),
            source: Box::new(error),
        }
    }

    /// Merge configuration with the entity defaults
    pub fn resolve(&self, name: &str) -> Result<ResolvedParameter, ConfigurationError> {
        let config = self.config(name);
        let defaults = self.defaults.get(name);
        let bounds = config
            .and_then(|c| c.bounds)
            .or(defaults.map(|d| d.bounds))
            .ok_or_else(|| ConfigurationError::MissingBounds {
                owner: self.owner.clone(),
                name: name.to_owned(),
            })?;
        let space = config
            .and_then(|c| c.space)
            .or(defaults.map(|d| d.space))
            .unwrap_or_default();

        let valid = bounds[0].is_finite()
            && bounds[1].is_finite()
            && bounds[0] < bounds[1]
            && (space == SamplingSpace::Linear || bounds[0] > 0.0);
        if !valid {
            return Err(ConfigurationError::InvalidBounds {
                owner: self.owner.clone(),
                name: name.to_owned(),
                lower: bounds[0],
                upper: bounds[1],
            });
        }

        Ok(ResolvedParameter {
            bounds,
            space,
            prior: config
                .and_then(|c| c.prior.clone())
                .or(defaults.map(|d| d.prior.clone()))
                .unwrap_or_default(),
            circular: defaults.is_some_and(|d| d.circular),
        })
    }

    /// Register a parameter under its own name, consuming at most one theta index
    ///
    /// Fixed parameters consume none. Registering the same name twice is a no-op.
    pub fn register(
        &mut self,
        name: &str,
        registry: &mut ThetaRegistry,
    ) -> Result<(), ConfigurationError> {
        if self.is_registered(name) {
            return Ok(());
        }
        if let Some(value) = self.config(name).and_then(|c| c.fixed) {
            log::debug!("{}:{} fixed to {}", self.owner, name, value);
            self.decoders.insert(name.to_owned(), Decoder::Fixed(value));
            return Ok(());
        }
        let resolved = self.resolve(name)?;
        let index = self.register_sampler_coordinate(name, &resolved, registry)?;
        self.decoders
            .insert(name.to_owned(), Decoder::single(index, resolved.space));
        self.set_physical(name, &resolved)
    }

    /// Append a sampler coordinate to theta without creating a decoder for it
    pub fn register_sampler_coordinate(
        &mut self,
        sampler_name: &str,
        resolved: &ResolvedParameter,
        registry: &mut ThetaRegistry,
    ) -> Result<usize, ConfigurationError> {
        let transform = PriorTransform::prepare(&resolved.prior, resolved.bounds, resolved.space)
            .map_err(|e| self.labelled(sampler_name, e))?;
        let index = registry.push(ThetaEntry {
            owner: self.owner.clone(),
            name: sampler_name.to_owned(),
            bounds: resolved.space.bounds_to_sampler(resolved.bounds),
            space: resolved.space,
            transform,
            circular: resolved.circular,
        });
        self.sampler_indices.insert(sampler_name.to_owned(), index);
        Ok(index)
    }

    pub fn insert_decoder(&mut self, name: &str, decoder: Decoder) {
        self.decoders.insert(name.to_owned(), decoder);
    }

    /// Store physical bounds and prior of a variable, used by [ParameterSpace::ln_prior]
    pub fn set_physical(
        &mut self,
        name: &str,
        resolved: &ResolvedParameter,
    ) -> Result<(), ConfigurationError> {
        let prior = LnPrior1D::from_config(&resolved.prior, resolved.bounds)
            .map_err(|e| self.labelled(name, e))?;
        self.physical_bounds.insert(name.to_owned(), resolved.bounds);
        self.priors.insert(name.to_owned(), prior);
        Ok(())
    }

    /// Physical values of all registered variables
    pub fn decode_values(&self, theta: &[f64]) -> BTreeMap<String, f64> {
        self.decoders
            .iter()
            .map(|(name, decoder)| (name.clone(), decoder.decode_slice(theta)))
            .collect()
    }

    /// Physical value of one variable from a theta vector or a stack of theta rows
    ///
    /// `None` if the variable was never registered.
    pub fn decode<D>(&self, name: &str, theta: ArrayView<f64, D>) -> Option<Array<f64, D::Smaller>>
    where
        D: RemoveAxis,
    {
        self.decoders.get(name).map(|decoder| decoder.decode(theta))
    }

    /// Sum of log-priors of sampled variables, `-inf` outside of the physical bounds
    pub fn ln_prior(&self, theta: &[f64]) -> f64 {
        let mut ln_prior = 0.0;
        for (name, decoder) in &self.decoders {
            if !decoder.is_sampled() {
                continue;
            }
            let value = decoder.decode_slice(theta);
            if let Some([lower, upper]) = self.physical_bounds(name) {
                if !(lower <= value && value <= upper) {
                    return f64::NEG_INFINITY;
                }
            }
            if let Some(prior) = self.priors.get(name) {
                ln_prior += prior.ln_prior_1d(value);
            }
        }
        ln_prior
    }

    /// Redraw fixed values that carry an uncertainty from their Gaussian distribution
    pub fn randomize_fixed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for (name, config) in &self.config {
            let (Some(value), Some(error)) = (config.fixed, config.fixed_error) else {
                continue;
            };
            let Ok(normal) = Normal::new(value, error) else {
                continue;
            };
            self.decoders
                .insert(name.clone(), Decoder::Fixed(rng.sample(normal)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prior::{PriorConfig, PriorKind};
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn space(config: BTreeMap<String, ParameterConfig>) -> ParameterSpace {
        let defaults = BTreeMap::from([
            ("K".to_owned(), ParameterDefaults::logarithmic(0.01, 100.0)),
            ("offset".to_owned(), ParameterDefaults::linear(-10.0, 10.0)),
        ]);
        ParameterSpace::new("b", defaults, config)
    }

    #[test]
    fn defaults_are_used_when_configuration_is_silent() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::new());
        space.register("K", &mut registry).unwrap();
        space.register("K", &mut registry).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].space, SamplingSpace::Logarithmic);
        assert_relative_eq!(registry.entries()[0].bounds[1], 100.0_f64.log2());
        assert_relative_eq!(space.decode_values(&[3.0])["K"], 8.0);
    }

    #[test]
    fn fixed_parameters_do_not_consume_theta() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::from([(
            "offset".to_owned(),
            ParameterConfig::fixed(1.5),
        )]));
        space.register("offset", &mut registry).unwrap();
        space.register("K", &mut registry).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(space.sampler_indices()["K"], 0);
        let values = space.decode_values(&[1.0]);
        assert_eq!(values["offset"], 1.5);
        assert_relative_eq!(values["K"], 2.0);
    }

    #[test]
    fn unknown_parameter_without_bounds() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::new());
        assert!(matches!(
            space.register("P", &mut registry),
            Err(ConfigurationError::MissingBounds { .. })
        ));
    }

    #[test]
    fn log_space_rejects_nonpositive_bounds() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::from([(
            "K".to_owned(),
            ParameterConfig::new().with_bounds(-1.0, 10.0),
        )]));
        assert!(matches!(
            space.register("K", &mut registry),
            Err(ConfigurationError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn non_closed_form_prior_in_log_space_is_fatal() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::from([(
            "K".to_owned(),
            ParameterConfig::new().with_prior(PriorConfig::new(PriorKind::Jeffreys, vec![])),
        )]));
        let error = space.register("K", &mut registry).unwrap_err();
        assert!(matches!(error, ConfigurationError::Parameter { .. }));
        assert!(error.to_string().contains("Linear"));
    }

    #[test]
    fn ln_prior_rejects_out_of_bounds() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::from([(
            "offset".to_owned(),
            ParameterConfig::new().with_prior(PriorConfig::gaussian(0.0, 1.0)),
        )]));
        space.register("offset", &mut registry).unwrap();
        assert_relative_eq!(
            space.ln_prior(&[0.0]),
            -0.5 * f64::ln(std::f64::consts::TAU),
            epsilon = 1e-12
        );
        assert_eq!(space.ln_prior(&[11.0]), f64::NEG_INFINITY);
    }

    #[test]
    fn randomized_fixed_values_scatter() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::from([(
            "offset".to_owned(),
            ParameterConfig::fixed(1.0).with_fixed_error(0.1),
        )]));
        space.register("offset", &mut registry).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        space.randomize_fixed(&mut rng);
        let value = space.decode_values(&[])["offset"];
        assert_ne!(value, 1.0);
        assert!((value - 1.0).abs() < 1.0);
    }

    #[test]
    fn decode_vector_and_population() {
        let mut registry = ThetaRegistry::new();
        let mut space = space(BTreeMap::from([(
            "offset".to_owned(),
            ParameterConfig::fixed(1.5),
        )]));
        space.register("offset", &mut registry).unwrap();
        space.register("K", &mut registry).unwrap();

        let k = space.decode("K", array![3.0].view()).unwrap();
        assert_relative_eq!(k.into_scalar(), 8.0);

        let population = array![[1.0], [3.0], [-1.0]];
        assert_relative_eq!(
            space.decode("K", population.view()).unwrap(),
            array![2.0, 8.0, 0.5]
        );
        assert_eq!(
            space.decode("offset", population.view()).unwrap(),
            array![1.5, 1.5, 1.5]
        );
        assert!(space.decode("P", population.view()).is_none());
    }
}
