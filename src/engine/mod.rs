//! Aggregation engine
//!
//! Pure computations that turn raw logged quantities into daily totals and
//! challenge progress: macro aggregation, MET-based energy expenditure, and
//! target scoring. No I/O happens here; persistence lives in `models`.

pub mod energy;
pub mod macros;
pub mod progress;

use thiserror::Error;

/// Engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid activity record: {0}")]
    InvalidActivityRecord(String),

    #[error("Inconsistent activity definition: {0}")]
    InconsistentActivity(String),
}

/// Result type for engine computations
pub type EngineResult<T> = Result<T, EngineError>;

/// Round to one decimal place, half away from zero.
///
/// Every rounded value the engine produces (per-100g profiles, progress
/// percentages, stored kcal) goes through this one helper so the rounding
/// mode stays consistent.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tenth_half_away_from_zero() {
        assert_eq!(round_tenth(237.7142857), 237.7);
        assert_eq!(round_tenth(0.25), 0.3);
        assert_eq!(round_tenth(-0.25), -0.3);
        assert_eq!(round_tenth(1.04), 1.0);
    }
}
