//! Temporal feature engineering
//!
//! Derives calendar, cyclical, rolling-window, interaction, and lag features
//! from a cleaned frame, preserving row order. Rolling windows and the lag
//! run over ROW INDEX, not timestamp gaps; the input is required to already
//! be sorted by timestamp (the pipeline warns, but does not fail, when it is
//! not; see [`is_chronological`]).

pub mod calendar;

use crate::error::Result;
use crate::preprocessing::cleaner::median;
use crate::schema::{POLLUTANT_FIELDS, TARGET_FIELD, TIMESTAMP_FIELD};
use calendar::{calendar_parts, cyclical};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Rolling-mean window sizes, in rows.
pub const ROLLING_WINDOWS: [usize; 2] = [3, 7];

/// Configuration for feature engineering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Statistics window for the lag-fill median, mirroring
    /// [`crate::preprocessing::CleaningConfig::stats_rows`].
    pub stats_rows: Option<usize>,
}

/// Feature engineering stage.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Append derived feature columns to a cleaned frame. Row order is
    /// preserved; the input is not mutated.
    pub fn engineer(&self, df: &DataFrame) -> Result<DataFrame> {
        let n = df.height();
        if n == 0 {
            return Err(crate::error::AirqualError::ValidationError(
                "cannot engineer features for an empty frame".to_string(),
            ));
        }
        let mut result = df.clone();

        // Calendar fields and their cyclical encodings.
        let timestamps: Vec<Option<i64>> =
            df.column(TIMESTAMP_FIELD)?.i64()?.into_iter().collect();

        let mut day_of_week = Vec::with_capacity(n);
        let mut month = Vec::with_capacity(n);
        let mut hour = Vec::with_capacity(n);
        for &ts in &timestamps {
            let (d, m, h) = calendar_parts(ts);
            day_of_week.push(d);
            month.push(m);
            hour.push(h);
        }

        let (hour_sin, hour_cos): (Vec<_>, Vec<_>) =
            hour.iter().map(|&h| cyclical(h, 24.0)).unzip();
        let (dow_sin, dow_cos): (Vec<_>, Vec<_>) =
            day_of_week.iter().map(|&d| cyclical(d, 7.0)).unzip();

        result.with_column(Series::new("day_of_week".into(), day_of_week))?;
        result.with_column(Series::new("month".into(), month))?;
        result.with_column(Series::new("hour".into(), hour))?;
        result.with_column(Series::new("hour_sin".into(), hour_sin))?;
        result.with_column(Series::new("hour_cos".into(), hour_cos))?;
        result.with_column(Series::new("day_of_week_sin".into(), dow_sin))?;
        result.with_column(Series::new("day_of_week_cos".into(), dow_cos))?;

        // Trailing rolling means over row-index windows.
        for field in POLLUTANT_FIELDS {
            let values = column_values(df, field)?;
            for window in ROLLING_WINDOWS {
                let name = format!("{field}_rolling_mean_{window}");
                result.with_column(Series::new(name.into(), rolling_mean(&values, window)))?;
            }
        }

        // Interaction features. A zero pollutant_min yields ±inf or NaN in
        // the ratio; both are representable downstream.
        let mins = column_values(df, "pollutant_min")?;
        let maxs = column_values(df, "pollutant_max")?;
        let avgs = column_values(df, TARGET_FIELD)?;

        let ratio: Vec<f64> = mins.iter().zip(&maxs).map(|(lo, hi)| hi / lo).collect();
        let diff: Vec<f64> = maxs.iter().zip(&avgs).map(|(hi, avg)| hi - avg).collect();
        result.with_column(Series::new("pollutant_ratio".into(), ratio))?;
        result.with_column(Series::new("pollutant_diff".into(), diff))?;

        // Lag-1 of the target; the first row's hole is filled with the
        // statistics-window median.
        let stats_rows = self.config.stats_rows.map_or(n, |k| k.clamp(1, n));
        let fill = median(avgs[..stats_rows].to_vec()).unwrap_or(f64::NAN);
        result.with_column(Series::new(
            format!("{TARGET_FIELD}_lag1").into(),
            lag1(&avgs, fill),
        ))?;

        tracing::info!(
            rows = n,
            columns = result.width(),
            "feature engineering complete"
        );

        Ok(result)
    }
}

/// Whether the (non-null) timestamps are monotonically non-decreasing. The
/// pipeline treats a violation as a warning and keeps trusting row order.
pub fn is_chronological(df: &DataFrame) -> Result<bool> {
    let timestamps = df.column(TIMESTAMP_FIELD)?.i64()?;
    let mut previous: Option<i64> = None;
    for ts in timestamps.into_iter().flatten() {
        if let Some(prev) = previous {
            if ts < prev {
                return Ok(false);
            }
        }
        previous = Some(ts);
    }
    Ok(true)
}

/// Trailing mean over the previous `window` rows (inclusive), minimum one
/// sample.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &values[start..=i];
        result.push(slice.iter().sum::<f64>() / slice.len() as f64);
    }
    result
}

/// Shift by one row, filling the first row with `fill`.
fn lag1(values: &[f64], fill: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    if !values.is_empty() {
        result.push(fill);
        result.extend_from_slice(&values[..values.len() - 1]);
    }
    result
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}
