use crate::synthetic::SyntheticDataset;

use exo_fit::kepler::transit_duration;
use exo_fit::ndarray::Array1;
use lazy_static::lazy_static;

/// Circular transiting planet used to generate the light curve
#[derive(Clone, Copy, Debug)]
pub struct TransitTruth {
    pub period: f64,
    pub tc: f64,
    pub radius_ratio: f64,
    pub a_rs: f64,
    pub b: f64,
}

impl TransitTruth {
    /// Box-shaped relative flux
    pub fn flux(&self, t: f64) -> f64 {
        let Some(duration) = transit_duration(self.period, self.a_rs, self.b, self.radius_ratio)
        else {
            return 1.0;
        };
        let phase = ((t - self.tc) / self.period + 0.5).rem_euclid(1.0) - 0.5;
        if (phase * self.period).abs() < 0.5 * duration {
            1.0 - self.radius_ratio.powi(2)
        } else {
            1.0
        }
    }
}

pub const TRANSIT: TransitTruth = TransitTruth {
    period: 3.5,
    tc: 1.2,
    radius_ratio: 0.1,
    a_rs: 9.0,
    b: 0.3,
};

lazy_static! {
    /// Two-minute cadence over ten days
    pub static ref TRANSIT_LIGHT_CURVE: SyntheticDataset = SyntheticDataset::generate(
        "phot",
        Array1::range(0.0, 10.0, 2.0 / 1440.0),
        1e-3,
        21,
        |t| TRANSIT.flux(t),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_curve_contains_transits() {
        let in_transit = TRANSIT_LIGHT_CURVE
            .x0
            .iter()
            .filter(|&&t| TRANSIT.flux(t) < 1.0)
            .count();
        assert!(in_transit > 0);
        assert!(in_transit < TRANSIT_LIGHT_CURVE.len() / 5);
    }
}
