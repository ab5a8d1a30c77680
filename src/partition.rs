//! Ordered train/validation/test partitioning
//!
//! Time-series discipline: no shuffling, partitions are contiguous slices of
//! the input order, train precedes validation precedes test. Rounding is
//! floor for the train cut and floor again for the validation cut; the test
//! partition takes the remainder, so sizes land within one row of the
//! configured ratios.

use crate::error::{AirqualError, Result};
use crate::schema::TARGET_FIELD;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Train/validation fractions; test takes whatever remains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.8, validation: 0.1 }
    }
}

/// One contiguous slice of the feature frame with its aligned labels.
#[derive(Debug, Clone)]
pub struct Partition {
    pub frame: DataFrame,
    pub labels: Array1<f64>,
    /// Half-open row range `[start, end)` in the source frame.
    pub rows: (usize, usize),
}

/// The three ordered partitions.
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
}

/// Split an engineered frame into ordered train/validation/test partitions,
/// separating the target column into a parallel label array per partition.
pub fn split(df: &DataFrame, ratios: &SplitRatios) -> Result<Partitions> {
    if ratios.train <= 0.0
        || ratios.validation <= 0.0
        || ratios.train + ratios.validation >= 1.0
    {
        return Err(AirqualError::ValidationError(format!(
            "split ratios must be positive and sum below 1.0, got train={} validation={}",
            ratios.train, ratios.validation
        )));
    }

    let n = df.height();
    let train_end = (n as f64 * ratios.train).floor() as usize;
    let val_end = train_end + (n as f64 * ratios.validation).floor() as usize;

    if train_end == 0 || val_end == train_end || val_end >= n {
        return Err(AirqualError::ValidationError(format!(
            "{n} rows cannot fill three non-empty partitions at train={} validation={}",
            ratios.train, ratios.validation
        )));
    }

    Ok(Partitions {
        train: take(df, 0, train_end)?,
        validation: take(df, train_end, val_end)?,
        test: take(df, val_end, n)?,
    })
}

fn take(df: &DataFrame, start: usize, end: usize) -> Result<Partition> {
    let frame = df.slice(start as i64, end - start);
    let labels: Vec<f64> = frame
        .column(TARGET_FIELD)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    Ok(Partition {
        frame,
        labels: Array1::from_vec(labels),
        rows: (start, end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: usize) -> DataFrame {
        let values: Vec<f64> = (0..n).map(|i| i as f64).collect();
        DataFrame::new(vec![
            Series::new("pollutant_avg".into(), &values).into(),
            Series::new("other".into(), &values).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_split_sizes_and_order() {
        let parts = split(&frame(100), &SplitRatios::default()).unwrap();
        assert_eq!(parts.train.frame.height(), 80);
        assert_eq!(parts.validation.frame.height(), 10);
        assert_eq!(parts.test.frame.height(), 10);
        assert_eq!(parts.train.rows, (0, 80));
        assert_eq!(parts.validation.rows, (80, 90));
        assert_eq!(parts.test.rows, (90, 100));
    }

    #[test]
    fn test_concatenated_labels_reproduce_input_order() {
        let parts = split(&frame(23), &SplitRatios::default()).unwrap();
        let mut all: Vec<f64> = Vec::new();
        all.extend(parts.train.labels.iter());
        all.extend(parts.validation.labels.iter());
        all.extend(parts.test.labels.iter());
        let expected: Vec<f64> = (0..23).map(|i| i as f64).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_floor_rounding_within_one_row() {
        let parts = split(&frame(23), &SplitRatios::default()).unwrap();
        // floor(23*0.8)=18, floor(23*0.1)=2, remainder 3
        assert_eq!(parts.train.frame.height(), 18);
        assert_eq!(parts.validation.frame.height(), 2);
        assert_eq!(parts.test.frame.height(), 3);
    }

    #[test]
    fn test_ten_rows_split_eight_one_one() {
        let parts = split(&frame(10), &SplitRatios::default()).unwrap();
        assert_eq!(parts.train.frame.height(), 8);
        assert_eq!(parts.validation.frame.height(), 1);
        assert_eq!(parts.test.frame.height(), 1);
    }

    #[test]
    fn test_too_few_rows_is_an_error() {
        let err = split(&frame(2), &SplitRatios::default()).unwrap_err();
        assert!(matches!(err, AirqualError::ValidationError(_)));
    }
}
