//! Three-tier alert classification of a pollutant concentration
//!
//! Pure and stateless; it has no dependency on the trained model and simply
//! consumes a predicted (or observed) value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Human alert tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    Good,
    Moderate,
    Unhealthy,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertLevel::Good => "Good",
            AlertLevel::Moderate => "Moderate",
            AlertLevel::Unhealthy => "Unhealthy",
        };
        f.write_str(name)
    }
}

/// Classify a concentration: ≤ 50 is Good, ≤ 100 is Moderate, above that is
/// Unhealthy.
pub fn classify(value: f64) -> AlertLevel {
    if value <= 50.0 {
        AlertLevel::Good
    } else if value <= 100.0 {
        AlertLevel::Moderate
    } else {
        AlertLevel::Unhealthy
    }
}
