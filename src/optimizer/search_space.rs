//! Hyperparameter search space
//!
//! Ranges are half-open `[low, high)`, sampled uniformly from a seeded RNG.
//! The defaults are the distributions the randomized search draws from:
//! tree count [50, 200), max depth [5, 20), min samples per split [2, 20),
//! min samples per leaf [1, 10), feature fraction [0.1, 1.0).

use crate::error::{AirqualError, Result};
use crate::training::ForestConfig;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Half-open integer range `[low, high)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntRange {
    pub low: usize,
    pub high: usize,
}

/// Half-open float range `[low, high)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FloatRange {
    pub low: f64,
    pub high: f64,
}

/// Parameter distributions for the forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSearchSpace {
    pub n_estimators: IntRange,
    pub max_depth: IntRange,
    pub min_samples_split: IntRange,
    pub min_samples_leaf: IntRange,
    pub feature_fraction: FloatRange,
}

impl Default for ForestSearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: IntRange { low: 50, high: 200 },
            max_depth: IntRange { low: 5, high: 20 },
            min_samples_split: IntRange { low: 2, high: 20 },
            min_samples_leaf: IntRange { low: 1, high: 10 },
            feature_fraction: FloatRange { low: 0.1, high: 1.0 },
        }
    }
}

impl ForestSearchSpace {
    /// Validate that every range is non-empty and ordered.
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("n_estimators", self.n_estimators),
            ("max_depth", self.max_depth),
            ("min_samples_split", self.min_samples_split),
            ("min_samples_leaf", self.min_samples_leaf),
        ] {
            if range.low >= range.high {
                return Err(AirqualError::ValidationError(format!(
                    "{name} range [{}, {}) is empty",
                    range.low, range.high
                )));
            }
        }
        if self.feature_fraction.low >= self.feature_fraction.high
            || self.feature_fraction.low <= 0.0
        {
            return Err(AirqualError::ValidationError(format!(
                "feature_fraction range [{}, {}) is invalid",
                self.feature_fraction.low, self.feature_fraction.high
            )));
        }
        Ok(())
    }

    /// Draw one parameter combination. `model_seed` is the seed every
    /// candidate model is fit with; the draw itself consumes only `rng`.
    pub fn sample(&self, rng: &mut ChaCha8Rng, model_seed: u64) -> ForestConfig {
        ForestConfig {
            n_estimators: rng.gen_range(self.n_estimators.low..self.n_estimators.high),
            max_depth: Some(rng.gen_range(self.max_depth.low..self.max_depth.high)),
            min_samples_split: rng.gen_range(self.min_samples_split.low..self.min_samples_split.high),
            min_samples_leaf: rng.gen_range(self.min_samples_leaf.low..self.min_samples_leaf.high),
            feature_fraction: rng.gen_range(self.feature_fraction.low..self.feature_fraction.high),
            seed: model_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_samples_stay_in_range() {
        let space = ForestSearchSpace::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..200 {
            let config = space.sample(&mut rng, 42);
            assert!((50..200).contains(&config.n_estimators));
            assert!((5..20).contains(&config.max_depth.unwrap()));
            assert!((2..20).contains(&config.min_samples_split));
            assert!((1..10).contains(&config.min_samples_leaf));
            assert!(config.feature_fraction >= 0.1 && config.feature_fraction < 1.0);
            assert_eq!(config.seed, 42);
        }
    }

    #[test]
    fn test_sampling_is_seeded() {
        let space = ForestSearchSpace::default();
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            let ca = space.sample(&mut a, 42);
            let cb = space.sample(&mut b, 42);
            assert_eq!(ca.n_estimators, cb.n_estimators);
            assert_eq!(ca.feature_fraction, cb.feature_fraction);
        }
    }

    #[test]
    fn test_empty_range_rejected() {
        let space = ForestSearchSpace {
            max_depth: IntRange { low: 10, high: 10 },
            ..Default::default()
        };
        assert!(space.validate().is_err());
    }
}
