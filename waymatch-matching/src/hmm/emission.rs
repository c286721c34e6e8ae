//! Emission probabilities.

use std::f64::consts::TAU;

/// Negative-log probability of each candidate having produced the
/// observation, from the perpendicular observation-to-edge distances.
pub trait EmissionCalculator {
    fn emissions(&self, distances: &[f64]) -> Vec<f64>;
}

/// `Pr(o|r) = 1/(sqrt(2 pi) sigma) * exp(-(d/sigma)^2 / 2)`, the
/// Newson-Krumm GPS noise model.
#[derive(Debug, Clone, Copy)]
pub struct GaussianEmissionCalculator {
    pub sigma: f64,
}

impl GaussianEmissionCalculator {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }
}

impl EmissionCalculator for GaussianEmissionCalculator {
    fn emissions(&self, distances: &[f64]) -> Vec<f64> {
        let norm = (TAU.sqrt() * self.sigma).ln();
        distances
            .iter()
            .map(|d| {
                let z = d / self.sigma;
                norm + 0.5 * z * z
            })
            .collect()
    }
}

/// Candidate-set-relative weights: `Pr(o|r_j)` proportional to
/// `(sum_k d_k) / d_j`, normalised to sum to one. A candidate sitting on
/// the observation takes all the mass (split if several do).
#[derive(Debug, Clone, Copy, Default)]
pub struct BayesianEmissionCalculator;

/// Distances below this are "on the edge" for weighting purposes.
const ZERO_DISTANCE: f64 = 1e-9;

impl EmissionCalculator for BayesianEmissionCalculator {
    fn emissions(&self, distances: &[f64]) -> Vec<f64> {
        if distances.is_empty() {
            return Vec::new();
        }
        let zeros = distances.iter().filter(|&&d| d <= ZERO_DISTANCE).count();
        if zeros > 0 {
            return distances
                .iter()
                .map(|&d| {
                    if d <= ZERO_DISTANCE {
                        (zeros as f64).ln()
                    } else {
                        f64::INFINITY
                    }
                })
                .collect();
        }
        let total: f64 = distances.iter().sum();
        let weights: Vec<f64> = distances.iter().map(|d| total / d).collect();
        let weight_sum: f64 = weights.iter().sum();
        weights.iter().map(|w| -(w / weight_sum).ln()).collect()
    }
}
