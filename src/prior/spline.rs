use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Monotone piecewise-cubic Hermite interpolant (Fritsch-Carlson slopes)
///
/// Knots must be strictly increasing. Evaluation outside of the knot range is clamped to the
/// end values.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MonotoneCubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubicSpline {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have the same size");
        assert!(x.len() >= 2, "at least two knots are required");
        assert!(
            x.iter().tuple_windows().all(|(a, b)| a < b),
            "knots must be strictly increasing"
        );

        let h: Vec<f64> = x.iter().tuple_windows().map(|(a, b)| b - a).collect();
        let delta: Vec<f64> = y
            .iter()
            .tuple_windows()
            .zip(h.iter())
            .map(|((a, b), h)| (b - a) / h)
            .collect();

        let n = x.len();
        let mut slopes = vec![0.0; n];
        slopes[0] = delta[0];
        slopes[n - 1] = delta[n - 2];
        for k in 1..n - 1 {
            let (d0, d1) = (delta[k - 1], delta[k]);
            if d0 * d1 <= 0.0 {
                continue;
            }
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            slopes[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
        }

        Self { x, y, slopes }
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        if x <= self.x[0] {
            return self.y[0];
        }
        if x >= self.x[n - 1] {
            return self.y[n - 1];
        }
        // index of the interval [x_k, x_{k+1}) containing x
        let k = self.x.partition_point(|&knot| knot <= x) - 1;
        let h = self.x[k + 1] - self.x[k];
        let t = (x - self.x[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        h00 * self.y[k] + h10 * h * self.slopes[k] + h01 * self.y[k + 1] + h11 * h * self.slopes[k + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn passes_through_knots() {
        let x = vec![0.0, 1.0, 2.5, 4.0];
        let y = vec![0.0, 0.3, 0.4, 2.0];
        let spline = MonotoneCubicSpline::new(x.clone(), y.clone());
        for (x, y) in x.into_iter().zip(y) {
            assert_relative_eq!(spline.eval(x), y, epsilon = 1e-14);
        }
    }

    #[test]
    fn reproduces_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = MonotoneCubicSpline::new(x, y);
        assert_relative_eq!(spline.eval(4.3), 3.0 * 4.3 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn stays_monotone_on_steps() {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![0.0, 0.0, 1.0, 1.0, 1.0];
        let spline = MonotoneCubicSpline::new(x, y);
        let values: Vec<f64> = (0..=400).map(|i| spline.eval(i as f64 * 0.01)).collect();
        assert!(values.iter().tuple_windows().all(|(a, b)| a <= b));
        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn clamps_outside() {
        let spline = MonotoneCubicSpline::new(vec![0.0, 1.0], vec![2.0, 5.0]);
        assert_eq!(spline.eval(-1.0), 2.0);
        assert_eq!(spline.eval(2.0), 5.0);
    }
}
