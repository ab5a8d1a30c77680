//! Record preprocessing: cleaning and categorical encoding
//!
//! - Missing value imputation, winsorization, timestamp parsing, and
//!   de-duplication live in [`cleaner`].
//! - One-hot encoding into the model feature matrix lives in [`encoder`].

pub mod cleaner;
pub mod encoder;

pub use cleaner::{AnomalyKind, CleanOutcome, CleanReport, Cleaner, CleaningConfig, RowAnomaly};
pub use encoder::OneHotEncoder;
