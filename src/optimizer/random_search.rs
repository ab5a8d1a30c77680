//! Randomized hyperparameter search with cross-validated scoring
//!
//! Samples a fixed number of parameter combinations (not an exhaustive
//! grid), scores each by k-fold cross-validation on the train partition
//! using NEGATED mean squared error (higher is better), and refits the best
//! combination on the full train partition. All sampling and fold
//! assignment is seeded; repeated runs reproduce identical trials and
//! scores. A failed candidate fit aborts the search and carries the
//! attempted parameters.

use crate::error::{AirqualError, Result};
use crate::training::{CvScores, ForestConfig, ForestRegressor, KFold};
use super::search_space::ForestSearchSpace;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Search settings. Defaults: 50 trials, 5 folds, seed 42.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub n_iter: usize,
    pub cv_folds: usize,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { n_iter: 50, cv_folds: 5, seed: 42 }
    }
}

/// One scored trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial_id: usize,
    pub config: ForestConfig,
    /// Negated mean squared error across folds (higher is better).
    pub score: f64,
}

/// Full search result: every trial plus the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub trials: Vec<TrialOutcome>,
    pub best_config: ForestConfig,
    pub best_score: f64,
}

/// Randomized search over [`ForestSearchSpace`].
#[derive(Debug, Clone, Default)]
pub struct RandomSearch {
    space: ForestSearchSpace,
    config: SearchConfig,
}

impl RandomSearch {
    pub fn new(space: ForestSearchSpace, config: SearchConfig) -> Self {
        Self { space, config }
    }

    /// Run the search on the train partition and refit the best
    /// configuration on all of it. Returns the fitted model, its parameters,
    /// and its cross-validated score.
    pub fn run(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(ForestRegressor, ForestConfig, f64, SearchResult)> {
        self.space.validate()?;
        if self.config.n_iter == 0 {
            return Err(AirqualError::ValidationError(
                "n_iter must be at least 1".to_string(),
            ));
        }

        let folds = KFold::new(self.config.cv_folds).split(x.nrows())?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut trials = Vec::with_capacity(self.config.n_iter);
        let mut best: Option<(ForestConfig, f64)> = None;

        for trial_id in 0..self.config.n_iter {
            let candidate = self.space.sample(&mut rng, self.config.seed);
            let score = self.score_candidate(&candidate, x, y, &folds)?;

            tracing::debug!(
                trial = trial_id,
                score,
                params = %candidate.describe(),
                "search trial scored"
            );

            let improved = best.as_ref().map_or(true, |(_, b)| score > *b);
            if improved {
                best = Some((candidate.clone(), score));
            }
            trials.push(TrialOutcome { trial_id, config: candidate, score });
        }

        let (best_config, best_score) =
            best.ok_or_else(|| AirqualError::ValidationError("no trials ran".to_string()))?;

        tracing::info!(
            best_score,
            params = %best_config.describe(),
            trials = trials.len(),
            "search complete, refitting best configuration"
        );

        let mut model = ForestRegressor::new(best_config.clone());
        model.fit(x, y).map_err(|e| AirqualError::SearchError {
            params: best_config.describe(),
            reason: e.to_string(),
        })?;

        let result = SearchResult { trials, best_config: best_config.clone(), best_score };
        Ok((model, best_config, best_score, result))
    }

    /// Negated mean MSE across the folds.
    fn score_candidate(
        &self,
        candidate: &ForestConfig,
        x: &Array2<f64>,
        y: &Array1<f64>,
        folds: &[crate::training::FoldSplit],
    ) -> Result<f64> {
        let mut fold_scores = Vec::with_capacity(folds.len());

        for fold in folds {
            let x_train = x.select(Axis(0), &fold.train_indices);
            let y_train =
                Array1::from_vec(fold.train_indices.iter().map(|&i| y[i]).collect());
            let x_test = x.select(Axis(0), &fold.test_indices);
            let y_test: Vec<f64> = fold.test_indices.iter().map(|&i| y[i]).collect();

            let mut model = ForestRegressor::new(candidate.clone());
            model
                .fit(&x_train, &y_train)
                .map_err(|e| AirqualError::SearchError {
                    params: candidate.describe(),
                    reason: format!("fold {} fit failed: {e}", fold.fold_idx),
                })?;

            let predictions = model.predict(&x_test)?;
            let mse: f64 = predictions
                .iter()
                .zip(y_test.iter())
                .map(|(p, a)| (p - a).powi(2))
                .sum::<f64>()
                / y_test.len() as f64;
            fold_scores.push(-mse);
        }

        Ok(CvScores::from_scores(fold_scores).mean_score)
    }
}
