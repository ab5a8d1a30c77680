//! CSV loading and schema validation
//!
//! Loading failures (missing file, unreadable data) surface as the distinct
//! [`AirqualError::DataUnavailable`] condition; a frame missing a required
//! column fails fast with [`AirqualError::MissingColumn`] before any stage
//! runs.

use crate::error::{AirqualError, Result};
use crate::schema::REQUIRED_COLUMNS;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Load a CSV file of raw sensor records and validate its schema.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| AirqualError::DataUnavailable(format!("{}: {}", path.display(), e)))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| AirqualError::DataUnavailable(format!("{}: {}", path.display(), e)))?;

    validate_schema(&df)?;
    Ok(df)
}

/// Check that every required column is present. Extra columns are tolerated.
pub fn validate_schema(df: &DataFrame) -> Result<()> {
    for required in REQUIRED_COLUMNS {
        if df.column(required).is_err() {
            return Err(AirqualError::MissingColumn(required.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let err = load_csv(Path::new("/nonexistent/records.csv")).unwrap_err();
        assert!(matches!(err, AirqualError::DataUnavailable(_)));
    }

    #[test]
    fn test_validate_schema_fails_fast() {
        let df = df!(
            "country" => &["IN"],
            "state" => &["Delhi"]
        )
        .unwrap();

        let err = validate_schema(&df).unwrap_err();
        assert!(matches!(err, AirqualError::MissingColumn(_)));
    }

    #[test]
    fn test_validate_schema_accepts_full_frame() {
        let df = df!(
            "country" => &["IN"],
            "state" => &["Delhi"],
            "city" => &["Delhi"],
            "station" => &["Punjabi Bagh"],
            "pollutant_id" => &["PM2.5"],
            "pollutant_min" => &[10.0],
            "pollutant_max" => &[80.0],
            "pollutant_avg" => &[45.0],
            "latitude" => &[28.67],
            "longitude" => &[77.13],
            "last_update" => &["24-07-2023 09:00:00"]
        )
        .unwrap();

        assert!(validate_schema(&df).is_ok());
    }
}
