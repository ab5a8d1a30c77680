//! Regression metrics
//!
//! MAE, RMSE, and R² are always computed together. Evaluation never mutates
//! the model or its inputs.

use crate::error::{AirqualError, Result};
use super::random_forest::ForestRegressor;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Error/fit metrics for one partition. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl Metrics {
    /// Compute all three metrics from aligned truth/prediction arrays.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(AirqualError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(AirqualError::ValidationError(
                "cannot compute metrics on an empty partition".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        // Zero-variance target: 0.0 by convention.
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Ok(Self { mae, rmse: mse.sqrt(), r2 })
    }
}

/// Evaluate a fitted model on one partition.
pub fn evaluate(model: &ForestRegressor, x: &Array2<f64>, y_true: &Array1<f64>) -> Result<Metrics> {
    let y_pred = model.predict(x)?;
    Metrics::compute(y_true, &y_pred)
}
