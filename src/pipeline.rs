//! End-to-end pipeline orchestration
//!
//! Raw records flow strictly left to right: clean → engineer → split →
//! encode → train/tune → evaluate. Each stage consumes only the previous
//! stage's output and returns new data; nothing reaches back upstream. The
//! input frame must already be sorted by timestamp; the pipeline warns (it
//! does not fail) when the timestamps are out of order.

use crate::error::Result;
use crate::features::{is_chronological, FeatureBuilder, FeatureConfig};
use crate::loader::validate_schema;
use crate::optimizer::{ForestSearchSpace, RandomSearch, SearchConfig, SearchResult};
use crate::partition::{split, SplitRatios};
use crate::preprocessing::{CleanReport, Cleaner, CleaningConfig, OneHotEncoder};
use crate::schema::TIMESTAMP_FIELD;
use crate::training::{evaluate, ForestConfig, ForestRegressor, Metrics};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Pipeline settings. Defaults: 80/10/10 ordered split, seed 42, 50 search
/// trials over 5 folds, whole-dataset preprocessing statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub ratios: SplitRatios,
    pub seed: u64,
    /// Run the randomized search; `false` trains the fixed default
    /// configuration instead.
    pub tune: bool,
    pub n_iter: usize,
    pub cv_folds: usize,
    /// Compute imputation medians, percentile caps, and the lag-fill median
    /// over the train prefix only instead of the full dataset. Off by
    /// default; whole-dataset statistics let validation and test rows
    /// influence preprocessing.
    pub train_only_stats: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: 42,
            tune: true,
            n_iter: 50,
            cv_folds: 5,
            train_only_stats: false,
        }
    }
}

/// Everything a caller needs after a run. The model is consumed read-only;
/// comparing validation against test metrics for generalization drift is the
/// caller's responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    #[serde(skip_serializing)]
    pub model: ForestRegressor,
    pub model_config: ForestConfig,
    /// Cross-validated score of the best trial (negated MSE); present only
    /// when tuning ran.
    pub cv_score: Option<f64>,
    pub search: Option<SearchResult>,
    pub validation: Metrics,
    pub test: Metrics,
    /// Feature name → non-negative weight, summing to 1.
    pub feature_importances: HashMap<String, f64>,
    /// Predictions aligned to the test partition's row order.
    pub test_predictions: Vec<f64>,
    pub test_actuals: Vec<f64>,
    /// Epoch-second timestamps of the test rows, for time-indexed reporting.
    pub test_timestamps: Vec<Option<i64>>,
    pub cleaning: CleanReport,
}

/// Run the full pipeline on a frame of raw records.
pub fn run(df: &DataFrame, config: &PipelineConfig) -> Result<PipelineReport> {
    validate_schema(df)?;

    let stats_rows = |n: usize| {
        config
            .train_only_stats
            .then(|| (n as f64 * config.ratios.train).floor() as usize)
    };

    let cleaner = Cleaner::new(CleaningConfig { stats_rows: stats_rows(df.height()) });
    let cleaned = cleaner.clean(df)?;

    if !is_chronological(&cleaned.frame)? {
        tracing::warn!(
            "timestamps are not sorted; rolling and lag features assume chronological row order"
        );
    }

    let builder = FeatureBuilder::new(FeatureConfig {
        stats_rows: stats_rows(cleaned.frame.height()),
    });
    let features = builder.engineer(&cleaned.frame)?;

    let parts = split(&features, &config.ratios)?;

    let mut encoder = OneHotEncoder::new();
    encoder.fit(&parts.train.frame)?;
    let x_train = encoder.transform(&parts.train.frame)?;
    let x_val = encoder.transform(&parts.validation.frame)?;
    let x_test = encoder.transform(&parts.test.frame)?;

    let (model, model_config, cv_score, search) = if config.tune {
        let search = RandomSearch::new(
            ForestSearchSpace::default(),
            SearchConfig {
                n_iter: config.n_iter,
                cv_folds: config.cv_folds,
                seed: config.seed,
            },
        );
        let (model, best_config, best_score, result) =
            search.run(&x_train, &parts.train.labels)?;
        (model, best_config, Some(best_score), Some(result))
    } else {
        let forest_config = ForestConfig { seed: config.seed, ..Default::default() };
        let mut model = ForestRegressor::new(forest_config.clone());
        model.fit(&x_train, &parts.train.labels)?;
        (model, forest_config, None, None)
    };

    let validation = evaluate(&model, &x_val, &parts.validation.labels)?;
    let test = evaluate(&model, &x_test, &parts.test.labels)?;

    tracing::info!(
        val_mae = validation.mae,
        val_r2 = validation.r2,
        test_mae = test.mae,
        test_r2 = test.r2,
        "evaluation complete"
    );

    let feature_importances = named_importances(&model, &encoder);
    let test_predictions = model.predict(&x_test)?.to_vec();
    let test_timestamps: Vec<Option<i64>> = parts
        .test
        .frame
        .column(TIMESTAMP_FIELD)?
        .i64()?
        .into_iter()
        .collect();

    Ok(PipelineReport {
        model,
        model_config,
        cv_score,
        search,
        validation,
        test,
        feature_importances,
        test_predictions,
        test_actuals: parts.test.labels.to_vec(),
        test_timestamps,
        cleaning: cleaned.report,
    })
}

/// Importances keyed by feature name, summing to 1 (when the model split at
/// all).
fn named_importances(model: &ForestRegressor, encoder: &OneHotEncoder) -> HashMap<String, f64> {
    match model.feature_importances() {
        Some(importances) => encoder
            .feature_names()
            .into_iter()
            .zip(importances.iter().copied())
            .collect(),
        None => HashMap::new(),
    }
}
