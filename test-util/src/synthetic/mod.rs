use exo_fit::ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

pub(crate) mod photometry;
pub(crate) mod rv;

// exo-fit types would come from a second copy of the crate in its own unit tests
pub type TripleArray = (Array1<f64>, Array1<f64>, Array1<f64>);

/// Noisy observations of a known signal
#[derive(Clone, Debug)]
pub struct SyntheticDataset {
    pub name: &'static str,
    pub x0: Array1<f64>,
    pub y: Array1<f64>,
    pub e: Array1<f64>,
}

impl SyntheticDataset {
    /// Sample `signal` at `x0` and add Gaussian noise of standard deviation `sigma`
    pub(crate) fn generate(
        name: &'static str,
        x0: Array1<f64>,
        sigma: f64,
        seed: u64,
        signal: impl Fn(f64) -> f64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, sigma).unwrap();
        let y = x0.mapv(|x| signal(x) + noise.sample(&mut rng));
        let e = Array1::from_elem(x0.len(), sigma);
        Self { name, x0, y, e }
    }

    pub fn len(&self) -> usize {
        self.x0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x0.is_empty()
    }

    pub fn arrays(&self) -> TripleArray {
        (self.x0.clone(), self.y.clone(), self.e.clone())
    }
}

/// Irregular but reproducible sampling of `[start, start + span)`
pub(crate) fn uneven_times(n: usize, start: f64, span: f64, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut t: Vec<f64> = (0..n)
        .map(|_| start + span * rng.random::<f64>())
        .collect();
    t.sort_unstable_by(f64::total_cmp);
    Array1::from_vec(t)
}
