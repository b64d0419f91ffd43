use crate::parameter::SamplingSpace;

use ndarray::{Array, ArrayView, Axis, RemoveAxis, Zip};
use serde::{Deserialize, Serialize};

/// Position(s) of a sampled variable in theta
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParameterIndex {
    Single(usize),
    Pair(usize, usize),
}

/// Map from a pair of sampler coordinates to one physical value
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PairTransformation {
    /// x² + y²
    SquaredSum,
    /// √(x² + y²)
    Hypot,
    /// atan2(y, x)
    Atan2,
}

impl PairTransformation {
    #[inline]
    pub fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            Self::SquaredSum => x.powi(2) + y.powi(2),
            Self::Hypot => x.hypot(y),
            Self::Atan2 => y.atan2(x),
        }
    }
}

/// How a physical variable is obtained from theta
///
/// A variable is either fixed to a literal value, read from one theta coordinate in its
/// sampling space, or combined from a pair of coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decoder {
    Fixed(f64),
    Single {
        index: usize,
        space: SamplingSpace,
    },
    Pair {
        first: usize,
        second: usize,
        transformation: PairTransformation,
    },
}

impl Decoder {
    pub fn single(index: usize, space: SamplingSpace) -> Self {
        Self::Single { index, space }
    }

    pub fn pair(first: usize, second: usize, transformation: PairTransformation) -> Self {
        Self::Pair {
            first,
            second,
            transformation,
        }
    }

    pub fn is_sampled(&self) -> bool {
        !matches!(self, Self::Fixed(_))
    }

    pub fn index(&self) -> Option<ParameterIndex> {
        match *self {
            Self::Fixed(_) => None,
            Self::Single { index, .. } => Some(ParameterIndex::Single(index)),
            Self::Pair { first, second, .. } => Some(ParameterIndex::Pair(first, second)),
        }
    }

    /// Sampling space of a single-coordinate variable
    pub fn space(&self) -> Option<SamplingSpace> {
        match *self {
            Self::Single { space, .. } => Some(space),
            _ => None,
        }
    }

    /// Decode a single flat theta vector
    pub fn decode_slice(&self, theta: &[f64]) -> f64 {
        match *self {
            Self::Fixed(value) => value,
            Self::Single { index, space } => space.to_physical(theta[index]),
            Self::Pair {
                first,
                second,
                transformation,
            } => transformation.apply(theta[first], theta[second]),
        }
    }

    /// Decode theta of any dimensionality, parameters run along the last axis
    ///
    /// A 1-D theta gives a 0-D array, a stack of samples (one row per sample) gives a 1-D array
    /// with a value per row.
    pub fn decode<D>(&self, theta: ArrayView<f64, D>) -> Array<f64, D::Smaller>
    where
        D: RemoveAxis,
    {
        let axis = Axis(theta.ndim() - 1);
        match *self {
            Self::Fixed(value) => theta.map_axis(axis, |_| value),
            Self::Single { index, space } => {
                theta.index_axis(axis, index).mapv(|x| space.to_physical(x))
            }
            Self::Pair {
                first,
                second,
                transformation,
            } => Zip::from(theta.index_axis(axis, first))
                .and(theta.index_axis(axis, second))
                .map_collect(|&x, &y| transformation.apply(x, y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array0};

    #[test]
    fn single_log_decoder() {
        let decoder = Decoder::single(1, SamplingSpace::Logarithmic);
        assert_relative_eq!(decoder.decode_slice(&[0.0, 3.0]), 8.0);
    }

    #[test]
    fn one_and_two_dimensional_theta_agree() {
        let decoder = Decoder::pair(0, 2, PairTransformation::SquaredSum);
        let theta = array![[0.3, 9.0, 0.4], [0.6, 9.0, 0.0]];
        let decoded = decoder.decode(theta.view());
        assert_relative_eq!(decoded, array![0.25, 0.36], epsilon = 1e-12);

        let row: Array0<f64> = decoder.decode(theta.row(0));
        assert_relative_eq!(row.into_scalar(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(
            decoder.decode_slice(theta.row(1).as_slice().unwrap()),
            0.36,
            epsilon = 1e-12
        );
    }

    #[test]
    fn fixed_decoder_broadcasts() {
        let decoder = Decoder::Fixed(1.5);
        let theta = array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]];
        assert_eq!(decoder.decode(theta.view()), array![1.5, 1.5, 1.5]);
        assert!(!decoder.is_sampled());
        assert_eq!(decoder.index(), None);
    }

    #[test]
    fn atan2_decoder() {
        let decoder = Decoder::pair(0, 1, PairTransformation::Atan2);
        assert_relative_eq!(
            decoder.decode_slice(&[0.0, 1.0]),
            std::f64::consts::FRAC_PI_2
        );
        assert_eq!(decoder.index(), Some(ParameterIndex::Pair(0, 1)));
    }

    #[test]
    fn index_and_space_follow_the_variant() {
        let single = Decoder::single(2, SamplingSpace::Logarithmic);
        assert_eq!(single.index(), Some(ParameterIndex::Single(2)));
        assert_eq!(single.space(), Some(SamplingSpace::Logarithmic));
        assert!(single.is_sampled());

        let pair = Decoder::pair(0, 1, PairTransformation::Hypot);
        assert_eq!(pair.space(), None);
        assert_relative_eq!(pair.decode_slice(&[3.0, 4.0]), 5.0);
    }
}
