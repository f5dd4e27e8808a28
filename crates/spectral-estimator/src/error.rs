//! Spectral Estimation Error Types

use thiserror::Error;

/// Errors during spectral estimation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpectralError {
    /// Sampling rate is zero, negative or not finite
    #[error("Sampling rate must be positive and finite, got {0}")]
    InvalidSamplingRate(f64),

    /// Segment overlap leaves no stride
    #[error("Segment overlap {overlap} must be smaller than the segment length {nfft}")]
    InvalidOverlap { overlap: usize, nfft: usize },

    /// Transform called without samples
    #[error("Signal is empty")]
    EmptySignal,

    /// Plot could not be produced
    #[error("Rendering failed: {0}")]
    Render(String),
}
