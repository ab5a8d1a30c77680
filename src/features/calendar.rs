//! Calendar decomposition and cyclical encodings
//!
//! A null timestamp propagates to null calendar and cyclical values; it is
//! never silently mapped to hour 0 or Monday.

use chrono::{DateTime, Datelike, Timelike};
use std::f64::consts::PI;

/// Calendar parts of an epoch-seconds timestamp:
/// `(day_of_week, month, hour)` with Monday = 0.
pub fn calendar_parts(ts: Option<i64>) -> (Option<f64>, Option<f64>, Option<f64>) {
    match ts.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
        Some(dt) => (
            Some(dt.weekday().num_days_from_monday() as f64),
            Some(dt.month() as f64),
            Some(dt.hour() as f64),
        ),
        None => (None, None, None),
    }
}

/// Sine/cosine pair of `2π·value/period`, so that the encoding's distance
/// respects periodicity (hour 23 is close to hour 0).
pub fn cyclical(value: Option<f64>, period: f64) -> (Option<f64>, Option<f64>) {
    match value {
        Some(v) => {
            let angle = 2.0 * PI * v / period;
            (Some(angle.sin()), Some(angle.cos()))
        }
        None => (None, None),
    }
}
