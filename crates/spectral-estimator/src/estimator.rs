//! On-demand Spectral Estimation

use crate::error::SpectralError;
use crate::render::render_psd;
use crate::welch::{remove_dc, PsdResult, WelchEstimator};
use ingestion_buffer::IngestionBuffer;
use metrics::counter;
use sample_transport::Record;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Estimator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Rate used when a request does not name one (Hz)
    pub sampling_rate: f64,
    /// Samples shared by consecutive Welch segments
    pub overlap: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 44_000.0,
            overlap: 0,
        }
    }
}

/// Outcome of a spectral estimate
#[derive(Debug, Clone, PartialEq)]
pub enum Estimation {
    /// The buffer held no records
    NoData,
    /// Spectrum of the drained snapshot
    Spectrum(PsdResult),
}

/// Outcome of a rendered estimate
#[derive(Debug, Clone, PartialEq)]
pub enum Periodogram {
    /// The buffer held no records
    NoData,
    /// PNG-encoded plot
    Png(Vec<u8>),
}

/// Consumer side of the ingestion buffer
pub struct SpectralEstimator {
    buffer: Arc<IngestionBuffer>,
    welch: WelchEstimator,
    default_rate: f64,
}

impl SpectralEstimator {
    /// Create an estimator draining `buffer`
    pub fn new(buffer: Arc<IngestionBuffer>, config: EstimatorConfig) -> Result<Self, SpectralError> {
        validate_rate(config.sampling_rate)?;
        let welch = WelchEstimator::new(config.overlap)?;
        info!(
            "Spectral estimator ready: default rate {} Hz, overlap {}",
            config.sampling_rate, config.overlap
        );
        Ok(Self {
            buffer,
            welch,
            default_rate: config.sampling_rate,
        })
    }

    /// Rate applied when a request gives none
    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    /// Drain the buffer and estimate its spectrum
    ///
    /// The rate is checked before draining, so a rejected request leaves the
    /// buffer untouched. An empty snapshot yields [`Estimation::NoData`].
    pub fn estimate(&self, sampling_rate: Option<f64>) -> Result<Estimation, SpectralError> {
        let rate = sampling_rate.unwrap_or(self.default_rate);
        validate_rate(rate)?;
        counter!("psd_requests_total").increment(1);

        let snapshot = self.buffer.drain_all();
        if snapshot.is_empty() {
            counter!("psd_no_data_total").increment(1);
            debug!("Spectral estimate requested with an empty buffer");
            return Ok(Estimation::NoData);
        }

        check_ordering(&snapshot);
        let signal: Vec<f64> = snapshot.iter().map(|r| r.signal).collect();
        let centred = remove_dc(&signal);

        info!("Computing periodogram of {} samples at {} Hz", centred.len(), rate);
        let psd = self.welch.estimate(&centred, rate)?;
        Ok(Estimation::Spectrum(psd))
    }

    /// Drain, estimate and render as PNG
    pub fn periodogram(&self, sampling_rate: Option<f64>) -> Result<Periodogram, SpectralError> {
        match self.estimate(sampling_rate)? {
            Estimation::NoData => Ok(Periodogram::NoData),
            Estimation::Spectrum(psd) => render_psd(&psd.frequencies, &psd.power).map(Periodogram::Png),
        }
    }
}

fn validate_rate(rate: f64) -> Result<(), SpectralError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(SpectralError::InvalidSamplingRate(rate))
    }
}

/// Log sequence discontinuities; they do not affect the transform
fn check_ordering(snapshot: &[Record]) {
    let restarts = snapshot.windows(2).filter(|w| w[1].n <= w[0].n).count();
    let gaps = snapshot
        .windows(2)
        .filter(|w| w[1].n.saturating_sub(w[0].n) > 1)
        .count();
    if restarts > 0 {
        warn!("Snapshot contains {} sequence restarts", restarts);
    }
    if gaps > 0 {
        debug!("Snapshot contains {} sequence gaps", gaps);
    }
}
