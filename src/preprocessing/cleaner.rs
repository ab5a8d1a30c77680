//! Record cleaning: imputation, winsorization, timestamp parsing, de-duplication
//!
//! Per pollutant field the median is computed first and nulls are filled with
//! it; the 95th-percentile cap is then computed over the imputed values, so
//! imputed medians participate in the percentile. Capping has no lower bound.
//! `last_update` is parsed into epoch seconds; strings that fail every known
//! format become null and are recorded as row anomalies instead of aborting
//! the batch. Finally, rows that are exact duplicates across all columns
//! (including the parsed timestamp) are dropped, keeping the first occurrence.
//!
//! The input frame is never mutated; `clean` returns a new frame together
//! with a [`CleanReport`] so callers can distinguish "succeeded with caveats"
//! from failure.

use crate::error::{AirqualError, Result};
use crate::schema::{LOCATION_FIELDS, POLLUTANT_FIELDS, TIMESTAMP_FIELD};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Timestamp formats tried in order. The upstream feed uses day-first
/// timestamps; ISO variants cover re-exported data.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Configuration for the cleaning stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Number of leading rows used to compute imputation medians and
    /// percentile caps. `None` uses the full frame, so rows that later land
    /// in the validation and test partitions influence the statistics.
    pub stats_rows: Option<usize>,
}

/// A recoverable row-level problem encountered during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowAnomaly {
    /// Row index in the input frame.
    pub row: usize,
    pub kind: AnomalyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// `last_update` was present but matched no known format.
    UnparsableTimestamp { raw: String },
}

/// Summary of what cleaning changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanReport {
    /// Nulls filled, per pollutant field.
    pub imputed: HashMap<String, usize>,
    /// Values clipped down to the cap, per pollutant field.
    pub capped: HashMap<String, usize>,
    /// The 95th-percentile cap applied, per pollutant field.
    pub caps: HashMap<String, f64>,
    pub duplicates_removed: usize,
    pub anomalies: Vec<RowAnomaly>,
}

/// Outcome of a cleaning run: the new frame plus its report.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub frame: DataFrame,
    pub report: CleanReport,
}

/// Cleaning stage.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleaningConfig,
}

impl Cleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Clean a frame of raw records. See the module docs for the exact
    /// order of operations.
    pub fn clean(&self, df: &DataFrame) -> Result<CleanOutcome> {
        if df.height() == 0 {
            return Err(AirqualError::ValidationError(
                "cannot clean an empty frame".to_string(),
            ));
        }

        let mut report = CleanReport::default();
        let mut result = cast_measurements_to_f64(df)?;
        let stats_rows = self.stats_window(result.height());

        for field in POLLUTANT_FIELDS {
            let column = result.column(field)?;
            let values: Vec<Option<f64>> = column.f64()?.into_iter().collect();

            let median = median(non_null(&values[..stats_rows]))
                .ok_or_else(|| AirqualError::ValidationError(
                    format!("no non-null values for {field} in statistics window"),
                ))?;

            let imputed_count = values.iter().filter(|v| v.is_none()).count();
            let mut filled: Vec<f64> = values
                .into_iter()
                .map(|v| v.unwrap_or(median))
                .collect();

            // Cap threshold computed post-imputation.
            let cap = percentile(filled[..stats_rows].to_vec(), 0.95)
                .ok_or_else(|| AirqualError::ValidationError(
                    format!("empty statistics window for {field}"),
                ))?;

            let mut capped_count = 0usize;
            for v in &mut filled {
                if *v > cap {
                    *v = cap;
                    capped_count += 1;
                }
            }

            report.imputed.insert(field.to_string(), imputed_count);
            report.capped.insert(field.to_string(), capped_count);
            report.caps.insert(field.to_string(), cap);

            result.with_column(Series::new(field.into(), filled))?;
        }

        self.parse_timestamps(&mut result, &mut report)?;

        let deduped = drop_exact_duplicates(&result)?;
        report.duplicates_removed = result.height() - deduped.height();

        tracing::info!(
            rows_in = df.height(),
            rows_out = deduped.height(),
            duplicates = report.duplicates_removed,
            anomalies = report.anomalies.len(),
            "cleaning complete"
        );

        Ok(CleanOutcome { frame: deduped, report })
    }

    fn stats_window(&self, n: usize) -> usize {
        match self.config.stats_rows {
            Some(k) => k.clamp(1, n),
            None => n,
        }
    }

    /// Replace the string timestamp column with nullable epoch seconds. An
    /// already-parsed Int64 column passes through, so cleaning is idempotent.
    fn parse_timestamps(&self, df: &mut DataFrame, report: &mut CleanReport) -> Result<()> {
        let column = df.column(TIMESTAMP_FIELD)?;
        if column.dtype() == &DataType::Int64 {
            return Ok(());
        }
        let raw = column
            .str()
            .map_err(|_| AirqualError::DataError(
                format!("{TIMESTAMP_FIELD} must be a string column"),
            ))?;

        let mut parsed: Vec<Option<i64>> = Vec::with_capacity(raw.len());
        for (row, value) in raw.into_iter().enumerate() {
            match value {
                None => parsed.push(None),
                Some(s) => match parse_timestamp(s) {
                    Some(ts) => parsed.push(Some(ts)),
                    None => {
                        report.anomalies.push(RowAnomaly {
                            row,
                            kind: AnomalyKind::UnparsableTimestamp { raw: s.to_string() },
                        });
                        parsed.push(None);
                    }
                },
            }
        }

        df.with_column(Series::new(TIMESTAMP_FIELD.into(), parsed))?;
        Ok(())
    }
}

/// Parse one timestamp string, trying each known format.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    TIMESTAMP_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(s.trim(), fmt)
            .ok()
            .map(|dt| dt.and_utc().timestamp())
    })
}

/// Cast measurement and location columns to Float64 so downstream stages see
/// a uniform numeric dtype regardless of what the CSV reader inferred.
fn cast_measurements_to_f64(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();
    for field in POLLUTANT_FIELDS.iter().chain(LOCATION_FIELDS.iter()) {
        let column = result.column(field)?;
        if column.dtype() != &DataType::Float64 {
            let casted = column.cast(&DataType::Float64)?;
            result.with_column(casted)?;
        }
    }
    Ok(result)
}

/// Drop rows whose every column value equals an earlier row's, keeping the
/// first occurrence.
fn drop_exact_duplicates(df: &DataFrame) -> Result<DataFrame> {
    let columns = df.get_columns();
    let mut seen: HashSet<String> = HashSet::with_capacity(df.height());
    let mut keep: Vec<bool> = Vec::with_capacity(df.height());

    for row in 0..df.height() {
        let mut key = String::new();
        for column in columns {
            let value = column.as_materialized_series().get(row)?;
            key.push_str(&format!("{value:?}\u{1f}"));
        }
        keep.push(seen.insert(key));
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

fn non_null(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().copied().flatten().collect()
}

/// Median with the usual even-count interpolation.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Linearly interpolated percentile, `q` in [0, 1].
pub fn percentile(mut values: Vec<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = q * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        Some(values[lo])
    } else {
        let frac = rank - lo as f64;
        Some(values[lo] + (values[hi] - values[lo]) * frac)
    }
}
