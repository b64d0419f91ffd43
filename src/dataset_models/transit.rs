use crate::dataset_models::{DatasetModelTrait, ModelCategory, Values, variable};
use crate::error::ComposeError;
use crate::kepler::transit_duration;

use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Box-shaped transit of a planet on a circular orbit
///
/// Relative flux is `1 - R²` while the planet is in front of the star and `1` elsewhere.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BoxTransit {}

impl BoxTransit {
    pub fn new() -> Self {
        Self {}
    }
}

impl DatasetModelTrait for BoxTransit {
    fn model_class(&self) -> &'static str {
        "box_transit"
    }

    fn category(&self) -> ModelCategory {
        ModelCategory::Unitary
    }

    fn common_class(&self) -> Option<&'static str> {
        Some("planet")
    }

    fn common_pams(&self) -> Vec<String> {
        ["P", "Tc", "R", "a_Rs", "b"]
            .iter()
            .map(|&s| s.to_owned())
            .collect()
    }

    fn compute(&self, values: &Values, x0: ArrayView1<f64>) -> Result<Array1<f64>, ComposeError> {
        let model = self.model_class();
        let period = variable(values, model, "P")?;
        let tc = variable(values, model, "Tc")?;
        let radius_ratio = variable(values, model, "R")?;
        let a_rs = variable(values, model, "a_Rs")?;
        let b = variable(values, model, "b")?;
        let Some(duration) = transit_duration(period, a_rs, b, radius_ratio) else {
            return Ok(Array1::ones(x0.len()));
        };
        let depth = radius_ratio.powi(2);
        Ok(x0.mapv(|t| {
            let phase = ((t - tc) / period + 0.5).rem_euclid(1.0) - 0.5;
            if (phase * period).abs() < 0.5 * duration {
                1.0 - depth
            } else {
                1.0
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn values(b: f64) -> Values {
        Values::from([
            ("P".to_owned(), 10.0),
            ("Tc".to_owned(), 2.0),
            ("R".to_owned(), 0.1),
            ("a_Rs".to_owned(), 20.0),
            ("b".to_owned(), b),
        ])
    }

    #[test]
    fn flux_drops_during_transit() {
        let x0 = array![2.0, 12.01, 7.0, 21.99];
        let flux = BoxTransit::new().compute(&values(0.0), x0.view()).unwrap();
        assert_relative_eq!(flux[0], 0.99);
        assert_relative_eq!(flux[1], 0.99);
        assert_eq!(flux[2], 1.0);
        assert_relative_eq!(flux[3], 0.99);
    }

    #[test]
    fn grazing_geometry_without_transit() {
        let flux = BoxTransit::new()
            .compute(&values(1.5), array![2.0].view())
            .unwrap();
        assert_eq!(flux[0], 1.0);
    }
}
