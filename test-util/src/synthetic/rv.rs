use crate::synthetic::{SyntheticDataset, uneven_times};

use exo_fit::kepler::kepler_rv;
use lazy_static::lazy_static;

/// Orbit used to generate the radial-velocity datasets
#[derive(Clone, Copy, Debug)]
pub struct PlanetTruth {
    pub period: f64,
    pub k: f64,
    pub e: f64,
    pub omega: f64,
    /// Mean longitude at `t_ref`
    pub mean_longitude: f64,
    pub t_ref: f64,
}

impl PlanetTruth {
    pub fn rv(&self, t: f64) -> f64 {
        kepler_rv(
            t,
            self.period,
            self.k,
            self.mean_longitude,
            self.e,
            self.omega,
            self.t_ref,
        )
    }
}

pub const RV_PLANET: PlanetTruth = PlanetTruth {
    period: 12.3,
    k: 8.0,
    e: 0.15,
    omega: 1.1,
    mean_longitude: 2.0,
    t_ref: 0.0,
};

lazy_static! {
    /// Two instruments observing the same planet, with different offsets and noise levels
    pub static ref RV_DATASETS: Vec<SyntheticDataset> = vec![
        SyntheticDataset::generate("harps", uneven_times(60, 0.0, 200.0, 1), 1.0, 11, |t| {
            RV_PLANET.rv(t) + 5.0
        }),
        SyntheticDataset::generate("hires", uneven_times(35, 150.0, 120.0, 2), 2.5, 12, |t| {
            RV_PLANET.rv(t) - 3.0
        }),
    ];
}
