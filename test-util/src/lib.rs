pub use synthetic::photometry::{TRANSIT, TRANSIT_LIGHT_CURVE, TransitTruth};
pub use synthetic::rv::{RV_DATASETS, RV_PLANET, PlanetTruth};
pub use synthetic::{SyntheticDataset, TripleArray};

mod synthetic;
