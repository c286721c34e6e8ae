//! Initial state probabilities.

/// Negative-log probability of starting in each of `count` candidate
/// states.
pub trait InitialCalculator {
    fn initial(&self, count: usize) -> Vec<f64>;
}

/// Every first-step candidate is equally likely: `-ln(1/n) = ln(n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformInitialCalculator;

impl InitialCalculator for UniformInitialCalculator {
    fn initial(&self, count: usize) -> Vec<f64> {
        let cost = if count == 0 { 0.0 } else { (count as f64).ln() };
        vec![cost; count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sums_to_one() {
        let costs = UniformInitialCalculator.initial(4);
        assert_eq!(costs.len(), 4);
        let total: f64 = costs.iter().map(|c| (-c).exp()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_candidate_is_certain() {
        assert_eq!(UniformInitialCalculator.initial(1), vec![0.0]);
        assert!(UniformInitialCalculator.initial(0).is_empty());
    }
}
