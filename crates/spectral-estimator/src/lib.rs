//! Spectral Estimator
//!
//! Drains the ingestion buffer on demand, removes the DC component and
//! computes a Welch power spectral density, optionally rendered as a PNG.

mod error;
mod estimator;
mod render;
mod welch;

pub use error::SpectralError;
pub use estimator::{Estimation, EstimatorConfig, Periodogram, SpectralEstimator};
pub use render::{render_psd, PLOT_HEIGHT, PLOT_WIDTH};
pub use welch::{remove_dc, PsdResult, WelchEstimator, NFFT};
