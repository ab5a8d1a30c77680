//! Canonical column names for the sensor record schema
//!
//! The loader validates these against the incoming frame; every downstream
//! stage addresses columns through these constants rather than string
//! literals.

/// Categorical identity fields, in the order their one-hot blocks appear in
/// the encoded feature matrix.
pub const CATEGORICAL_FIELDS: [&str; 5] = ["country", "state", "city", "station", "pollutant_id"];

/// Numeric measurement fields subject to imputation and winsorization.
pub const POLLUTANT_FIELDS: [&str; 3] = ["pollutant_min", "pollutant_max", "pollutant_avg"];

/// Prediction target.
pub const TARGET_FIELD: &str = "pollutant_avg";

/// Observation timestamp. Parsed during cleaning; excluded from the numeric
/// feature matrix but retained for time-indexed reporting.
pub const TIMESTAMP_FIELD: &str = "last_update";

/// Numeric location fields.
pub const LOCATION_FIELDS: [&str; 2] = ["latitude", "longitude"];

/// Every column a raw record must carry.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "country",
    "state",
    "city",
    "station",
    "pollutant_id",
    "pollutant_min",
    "pollutant_max",
    "pollutant_avg",
    "latitude",
    "longitude",
    "last_update",
];
