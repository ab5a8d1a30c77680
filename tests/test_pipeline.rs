//! Integration tests: end-to-end pipeline, partitioning, encoding, determinism

use airqual::alert::{classify, AlertLevel};
use airqual::features::{FeatureBuilder, FeatureConfig};
use airqual::partition::{split, SplitRatios};
use airqual::pipeline::{run, PipelineConfig};
use airqual::preprocessing::{Cleaner, OneHotEncoder};
use polars::prelude::*;

/// Synthetic chronological records with the given target values.
fn synthetic_records(avgs: &[f64]) -> DataFrame {
    let n = avgs.len();
    let cities = ["Delhi", "Agra", "Mumbai"];

    let mut city: Vec<&str> = Vec::with_capacity(n);
    let mut station: Vec<String> = Vec::with_capacity(n);
    let mut min_v: Vec<f64> = Vec::with_capacity(n);
    let mut max_v: Vec<f64> = Vec::with_capacity(n);
    let mut lat: Vec<f64> = Vec::with_capacity(n);
    let mut lon: Vec<f64> = Vec::with_capacity(n);
    let mut ts: Vec<String> = Vec::with_capacity(n);

    for (i, &avg) in avgs.iter().enumerate() {
        city.push(cities[i % cities.len()]);
        station.push(format!("S{}", i % 2));
        min_v.push(avg - 5.0);
        max_v.push(avg + 5.0);
        lat.push(28.0 + (i % 5) as f64 * 0.1);
        lon.push(77.0 + (i % 5) as f64 * 0.1);
        ts.push(format!("{:02}-07-2023 {:02}:00:00", 1 + i / 24, i % 24));
    }

    DataFrame::new(vec![
        Series::new("country".into(), vec!["IN"; n]).into(),
        Series::new("state".into(), vec!["Delhi"; n]).into(),
        Series::new("city".into(), city).into(),
        Series::new("station".into(), station).into(),
        Series::new("pollutant_id".into(), vec!["PM2.5"; n]).into(),
        Series::new("pollutant_min".into(), min_v).into(),
        Series::new("pollutant_max".into(), max_v).into(),
        Series::new("pollutant_avg".into(), avgs).into(),
        Series::new("latitude".into(), lat).into(),
        Series::new("longitude".into(), lon).into(),
        Series::new("last_update".into(), ts).into(),
    ])
    .unwrap()
}

fn engineered(avgs: &[f64]) -> DataFrame {
    let cleaned = Cleaner::default().clean(&synthetic_records(avgs)).unwrap();
    FeatureBuilder::new(FeatureConfig::default())
        .engineer(&cleaned.frame)
        .unwrap()
}

#[test]
fn partitions_reproduce_original_order() {
    let avgs: Vec<f64> = (0..30).map(|i| 20.0 + i as f64).collect();
    let features = engineered(&avgs);
    let parts = split(&features, &SplitRatios::default()).unwrap();

    let original: Vec<f64> = features
        .column("pollutant_avg")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();

    let mut concatenated: Vec<f64> = Vec::new();
    concatenated.extend(parts.train.labels.iter());
    concatenated.extend(parts.validation.labels.iter());
    concatenated.extend(parts.test.labels.iter());
    assert_eq!(concatenated, original);

    // Non-overlapping contiguous ranges.
    assert_eq!(parts.train.rows.1, parts.validation.rows.0);
    assert_eq!(parts.validation.rows.1, parts.test.rows.0);

    // Sizes within one row of the ratios.
    let n = features.height() as f64;
    assert!((parts.train.frame.height() as f64 - n * 0.8).abs() <= 1.0);
    assert!((parts.validation.frame.height() as f64 - n * 0.1).abs() <= 1.0);
    assert!((parts.test.frame.height() as f64 - n * 0.1).abs() <= 1.0);
}

#[test]
fn encoder_is_stable_and_zeroes_unseen_values() {
    let avgs: Vec<f64> = (0..30).map(|i| 20.0 + i as f64).collect();
    let features = engineered(&avgs);
    let parts = split(&features, &SplitRatios::default()).unwrap();

    let mut encoder = OneHotEncoder::new();
    encoder.fit(&parts.train.frame).unwrap();

    let once = encoder.transform(&parts.test.frame).unwrap();
    let again = encoder.transform(&parts.test.frame).unwrap();
    assert_eq!(once, again, "repeated transform must be bit-identical");

    // A station absent from train encodes to an all-zero station block.
    let unseen = engineered(&[50.0, 60.0, 70.0]);
    let mut frame = unseen.clone();
    frame
        .with_column(Series::new("station".into(), vec!["S9"; unseen.height()]))
        .unwrap();
    let matrix = encoder.transform(&frame).unwrap();

    let names = encoder.feature_names();
    for (col, name) in names.iter().enumerate() {
        if name.starts_with("station_") {
            for row in 0..matrix.nrows() {
                assert_eq!(matrix[[row, col]], 0.0, "{name} should be zero for unseen station");
            }
        }
    }
}

#[test]
fn fixed_seed_runs_are_identical() {
    let avgs: Vec<f64> = (0..40).map(|i| 15.0 + (i as f64 * 1.3) % 60.0).collect();
    let records = synthetic_records(&avgs);
    let config = PipelineConfig { tune: false, ..Default::default() };

    let a = run(&records, &config).unwrap();
    let b = run(&records, &config).unwrap();

    assert!((a.validation.mae - b.validation.mae).abs() < 1e-9);
    assert!((a.validation.rmse - b.validation.rmse).abs() < 1e-9);
    assert!((a.validation.r2 - b.validation.r2).abs() < 1e-9);
    assert!((a.test.mae - b.test.mae).abs() < 1e-9);
    assert!((a.test.rmse - b.test.rmse).abs() < 1e-9);
    assert!((a.test.r2 - b.test.r2).abs() < 1e-9);

    for (pa, pb) in a.test_predictions.iter().zip(b.test_predictions.iter()) {
        assert!((pa - pb).abs() < 1e-9);
    }
}

#[test]
fn ten_row_end_to_end_sanity() {
    let avgs: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0).collect();
    let records = synthetic_records(&avgs);
    let config = PipelineConfig { tune: false, ..Default::default() };

    let report = run(&records, &config).unwrap();

    assert!(report.test.r2.is_finite());
    assert!(report.test.r2 <= 1.0);

    // Predictions stay within the observed range padded by the IQR
    // (q75 - q25 of 10..=100 is 45).
    let iqr = 45.0;
    for &p in &report.test_predictions {
        assert!(p >= 10.0 - iqr && p <= 100.0 + iqr, "prediction {p} out of sanity bounds");
    }

    // Importances are non-negative and sum to 1.
    let sum: f64 = report.feature_importances.values().sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(report.feature_importances.values().all(|&w| w >= 0.0));

    // Predictions align with the test partition.
    assert_eq!(report.test_predictions.len(), report.test_actuals.len());
    assert_eq!(report.test_predictions.len(), report.test_timestamps.len());
}

#[test]
fn tuned_run_reports_best_trial() {
    let avgs: Vec<f64> = (0..40).map(|i| 15.0 + (i as f64 * 1.7) % 50.0).collect();
    let records = synthetic_records(&avgs);
    let config = PipelineConfig { tune: true, n_iter: 2, cv_folds: 3, ..Default::default() };

    let report = run(&records, &config).unwrap();
    let search = report.search.expect("tuned run must include trials");

    assert_eq!(search.trials.len(), 2);
    assert_eq!(report.cv_score, Some(search.best_score));
    let best_trial = search
        .trials
        .iter()
        .map(|t| t.score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(search.best_score, best_trial);
}

#[test]
fn unsorted_timestamps_warn_but_run() {
    let avgs: Vec<f64> = (0..30).map(|i| 20.0 + i as f64).collect();
    let mut records = synthetic_records(&avgs);

    // Reverse the timestamp column so the chronology check trips.
    let reversed: Vec<String> = (0..30)
        .rev()
        .map(|i: usize| format!("{:02}-07-2023 {:02}:00:00", 1 + i / 24, i % 24))
        .collect();
    records
        .with_column(Series::new("last_update".into(), reversed))
        .unwrap();

    let config = PipelineConfig { tune: false, ..Default::default() };
    assert!(run(&records, &config).is_ok());
}

#[test]
fn alert_classification_literals() {
    assert_eq!(classify(50.0), AlertLevel::Good);
    assert_eq!(classify(51.0), AlertLevel::Moderate);
    assert_eq!(classify(100.0), AlertLevel::Moderate);
    assert_eq!(classify(101.0), AlertLevel::Unhealthy);
}
