//! Peripheral Reader Error Types

use thiserror::Error;

/// Errors raised while configuring the peripheral or its simulator
///
/// Reading never fails: out-of-range raw values are converted as-is.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReaderError {
    /// ADC resolution outside 1..=16 bits
    #[error("ADC resolution must be between 1 and 16 bits, got {0}")]
    InvalidResolution(u8),

    /// Reference voltage is zero, negative or not finite
    #[error("Reference voltage must be positive and finite, got {0}")]
    InvalidReference(f64),

    /// Divider ratio or offset is not finite
    #[error("Calibration {field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Simulated read rate is zero, negative or not finite
    #[error("Simulation sample_rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    /// Noise peak is negative or too large to sample uniformly
    #[error("Simulation noise must be finite and non-negative, got {0}")]
    InvalidNoise(f64),
}
