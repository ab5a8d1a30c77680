//! Bagged forest of regression trees
//!
//! Trees are built in parallel; each tree's RNG is seeded from the base seed
//! plus the tree index, so a fit is reproducible bit-for-bit regardless of
//! how rayon schedules the work.

use crate::error::{AirqualError, Result};
use super::decision_tree::RegressionTree;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Forest hyperparameters. Defaults: 100 trees, depth 10, seed 42.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Fraction of features considered at each split, in (0, 1].
    pub feature_fraction: f64,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            feature_fraction: 1.0,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Compact single-line rendering used in error context and logs.
    pub fn describe(&self) -> String {
        format!(
            "n_estimators={} max_depth={:?} min_samples_split={} min_samples_leaf={} feature_fraction={:.4} seed={}",
            self.n_estimators,
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
            self.feature_fraction,
            self.seed
        )
    }
}

/// Bagged regression-tree ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl ForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit the forest. Tree fit failures are fatal and carry the attempted
    /// parameters.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(AirqualError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(AirqualError::TrainingError(format!(
                "empty training matrix ({n_samples} x {n_features}) with {}",
                self.config.describe()
            )));
        }
        if self.config.n_estimators == 0 {
            return Err(AirqualError::TrainingError(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        self.n_features = n_features;
        let max_features = ((n_features as f64 * self.config.feature_fraction).ceil() as usize)
            .clamp(1, n_features);
        let base_seed = self.config.seed;

        let trees: Vec<RegressionTree> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                // Bootstrap sample
                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = RegressionTree::new()
                    .with_min_samples_split(self.config.min_samples_split)
                    .with_min_samples_leaf(self.config.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_seed(rng.next_u64());
                if let Some(depth) = self.config.max_depth {
                    tree = tree.with_max_depth(depth);
                }

                tree.fit(&x_boot, &y_boot).map_err(|e| AirqualError::TrainingError(
                    format!("tree {tree_idx} failed with {}: {e}", self.config.describe()),
                ))?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (slot, &val) in total.iter_mut().zip(imp.iter()) {
                    *slot += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total {
            *imp /= n_trees;
        }

        // Normalize to sum 1
        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total));
    }

    /// Predict by averaging the trees. Input order is irrelevant to the
    /// fitted model; output is aligned to the input rows.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(AirqualError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_samples = x.nrows();
        let predictions: Vec<f64> = (0..n_samples)
            .map(|i| {
                let sum: f64 = all_predictions.iter().map(|p| p[i]).sum();
                sum / all_predictions.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Mean impurity-decrease importances, normalized to sum 1.
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((20, 1), (0..20).map(|i| i as f64).collect()).unwrap();
        let y = Array1::from_vec((0..20).map(|i| 2.0 * i as f64 + 1.0).collect());
        (x, y)
    }

    #[test]
    fn test_regressor_fits() {
        let (x, y) = linear_data();
        let mut forest = ForestRegressor::new(ForestConfig {
            n_estimators: 20,
            ..Default::default()
        });
        forest.fit(&x, &y).unwrap();

        let predictions = forest.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        assert!(mse < 10.0, "MSE too high: {mse}");
        assert_eq!(forest.n_trees(), 20);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = linear_data();
        let config = ForestConfig { n_estimators: 15, feature_fraction: 0.8, ..Default::default() };

        let mut a = ForestRegressor::new(config.clone());
        let mut b = ForestRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let pa = a.predict(&x).unwrap();
        let pb = b.predict(&x).unwrap();
        for (va, vb) in pa.iter().zip(pb.iter()) {
            assert_eq!(va, vb);
        }
    }

    #[test]
    fn test_different_seed_changes_model() {
        let (x, y) = linear_data();
        let mut a = ForestRegressor::new(ForestConfig { n_estimators: 15, seed: 1, ..Default::default() });
        let mut b = ForestRegressor::new(ForestConfig { n_estimators: 15, seed: 2, ..Default::default() });
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let pa = a.predict(&x).unwrap();
        let pb = b.predict(&x).unwrap();
        assert!(pa.iter().zip(pb.iter()).any(|(va, vb)| va != vb));
    }

    #[test]
    fn test_importances_sum_to_one() {
        let x = array![
            [1.0, 0.0],
            [2.0, 0.0],
            [3.0, 0.0],
            [4.0, 0.0],
            [5.0, 0.0],
            [6.0, 0.0],
        ];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

        let mut forest = ForestRegressor::new(ForestConfig {
            n_estimators: 10,
            ..Default::default()
        });
        forest.fit(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(importances.iter().all(|&v| v >= 0.0));
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let forest = ForestRegressor::new(ForestConfig::default());
        let err = forest.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, AirqualError::ModelNotFitted));
    }

    #[test]
    fn test_empty_matrix_errors_with_params() {
        let x = Array2::<f64>::zeros((0, 0));
        let y = Array1::<f64>::zeros(0);
        let err = ForestRegressor::new(ForestConfig::default())
            .fit(&x, &y)
            .unwrap_err();
        assert!(err.to_string().contains("n_estimators"));
    }
}
