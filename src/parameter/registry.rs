use crate::error::ComposeError;
use crate::parameter::SamplingSpace;
use crate::prior::PriorTransform;

use ndarray::{Array2, ArrayViewMut1, Axis};
use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

/// One coordinate of theta
#[derive(Clone, Debug)]
pub struct ThetaEntry {
    /// Name of the entity owning the coordinate
    pub owner: String,
    /// Sampler-space name, e.g. `sre_coso` rather than `e`
    pub name: String,
    /// Sampler-space bounds
    pub bounds: [f64; 2],
    pub space: SamplingSpace,
    pub transform: PriorTransform,
    /// Angle in radians
    pub circular: bool,
}

impl ThetaEntry {
    pub fn key(&self) -> String {
        format!("{}_{}", self.owner, self.name)
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.bounds[0] + self.bounds[1])
    }

    pub fn contains(&self, x: f64) -> bool {
        self.bounds[0] <= x && x <= self.bounds[1]
    }
}

/// Layout of the flat vector explored by the sampler
///
/// Coordinates are appended once, while the model container is initialized. Afterwards only
/// the bounds of circular coordinates may change, see [ThetaRegistry::recenter_bounds].
#[derive(Clone, Debug, Default)]
pub struct ThetaRegistry {
    entries: Vec<ThetaEntry>,
}

impl ThetaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a coordinate and return its index
    pub fn push(&mut self, entry: ThetaEntry) -> usize {
        log::debug!(
            "theta[{}] = {} bounds {:?} {:?}",
            self.entries.len(),
            entry.key(),
            entry.bounds,
            entry.space
        );
        self.entries.push(entry);
        self.entries.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ThetaEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ThetaEntry> {
        self.entries.get(index)
    }

    /// `"<owner>_<name>"` to theta index
    pub fn theta_dictionary(&self) -> BTreeMap<String, usize> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.key(), i))
            .collect()
    }

    /// `ndim × 2` array of sampler-space bounds
    pub fn bounds(&self) -> Array2<f64> {
        let mut bounds = Array2::zeros((self.len(), 2));
        for (mut row, entry) in bounds.axis_iter_mut(Axis(0)).zip(&self.entries) {
            row[0] = entry.bounds[0];
            row[1] = entry.bounds[1];
        }
        bounds
    }

    pub fn check_len(&self, theta: &[f64]) -> Result<(), ComposeError> {
        if theta.len() == self.len() {
            Ok(())
        } else {
            Err(ComposeError::ThetaLength {
                expected: self.len(),
                actual: theta.len(),
            })
        }
    }

    pub fn within_bounds(&self, theta: &[f64]) -> bool {
        theta
            .iter()
            .zip(&self.entries)
            .all(|(&x, entry)| entry.contains(x))
    }

    /// Map a point of the unit hypercube to theta
    pub fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>, ComposeError> {
        self.check_len(u)?;
        Ok(u.iter()
            .zip(&self.entries)
            .map(|(&u, entry)| entry.transform.evaluate(u))
            .collect())
    }

    /// Center circular coordinates on `center`, their bounds become `center ± π`
    pub fn recenter_bounds(&mut self, center: &[f64]) -> Result<(), ComposeError> {
        self.check_len(center)?;
        for (entry, &c) in self.entries.iter_mut().zip(center) {
            if entry.circular {
                entry.bounds = [c - PI, c + PI];
            }
        }
        Ok(())
    }

    /// Rearrange a population saved with another theta layout into this one
    ///
    /// Columns are matched by `"<owner>_<name>"` key and every coordinate takes its bounds from
    /// the previous run. Nothing changes unless all coordinates are found.
    pub fn remap_population(
        &mut self,
        legacy_dictionary: &BTreeMap<String, usize>,
        legacy_population: &Array2<f64>,
        legacy_bounds: &Array2<f64>,
    ) -> Result<Array2<f64>, ComposeError> {
        let columns = legacy_population.ncols();
        let bound_shape = legacy_bounds.dim();
        let legacy_indices = self
            .entries
            .iter()
            .map(|entry| {
                let key = entry.key();
                let index = *legacy_dictionary
                    .get(&key)
                    .ok_or(ComposeError::UnknownLegacyCoordinate(key))?;
                if index < columns && index < bound_shape.0 && bound_shape.1 == 2 {
                    Ok(index)
                } else {
                    Err(ComposeError::LegacyShape {
                        index,
                        columns,
                        bound_shape,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut population = Array2::zeros((legacy_population.nrows(), self.len()));
        for ((mut column, entry), &index) in population
            .columns_mut()
            .into_iter()
            .zip(&mut self.entries)
            .zip(&legacy_indices)
        {
            column.assign(&legacy_population.column(index));
            entry.bounds = [legacy_bounds[[index, 0]], legacy_bounds[[index, 1]]];
        }
        Ok(population)
    }

    /// Bring every row of a population back inside the bounds
    ///
    /// Circular coordinates are wrapped by full turns, other coordinates outside of their
    /// bounds and non-finite angles are replaced with the `center` value.
    pub fn fix_population(
        &self,
        center: &[f64],
        population: &mut Array2<f64>,
    ) -> Result<(), ComposeError> {
        self.check_len(center)?;
        for mut row in population.axis_iter_mut(Axis(0)) {
            self.fix_row(center, &mut row)?;
        }
        Ok(())
    }

    fn fix_row(&self, center: &[f64], row: &mut ArrayViewMut1<f64>) -> Result<(), ComposeError> {
        if row.len() != self.len() {
            return Err(ComposeError::ThetaLength {
                expected: self.len(),
                actual: row.len(),
            });
        }
        for ((x, entry), &c) in row.iter_mut().zip(&self.entries).zip(center) {
            if entry.contains(*x) {
                continue;
            }
            *x = if entry.circular && x.is_finite() {
                entry.bounds[0] + (*x - entry.bounds[0]).rem_euclid(TAU)
            } else {
                c
            };
        }
        Ok(())
    }
}
