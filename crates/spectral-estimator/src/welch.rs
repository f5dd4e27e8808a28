//! Welch Power Spectral Density

use crate::error::SpectralError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Serialize;
use std::f64::consts::PI;
use std::sync::Arc;

/// Segment length of the transform, fixed for every request
pub const NFFT: usize = 1024;

/// One-sided power spectral density
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsdResult {
    /// Bin centre frequencies (Hz), ascending from 0 to fs/2
    pub frequencies: Vec<f64>,
    /// Power density per bin (V²/Hz)
    pub power: Vec<f64>,
}

impl PsdResult {
    /// Number of frequency bins
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Check if there are no bins
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency and power of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &p)| (self.frequencies[i], p))
    }
}

/// Subtract the arithmetic mean from every sample
///
/// The mean is taken relative to the first sample, so a constant signal
/// comes out as exact zeros.
pub fn remove_dc(signal: &[f64]) -> Vec<f64> {
    let Some(&pivot) = signal.first() else {
        return Vec::new();
    };
    let shift = signal.iter().map(|&v| v - pivot).sum::<f64>() / signal.len() as f64;
    let mean = pivot + shift;
    signal.iter().map(|&v| v - mean).collect()
}

/// Symmetric Hann window
fn hann(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Welch estimator with a pre-planned transform
pub struct WelchEstimator {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    /// Σw², the window's power normalization
    window_power: f64,
    overlap: usize,
}

impl WelchEstimator {
    /// Create an estimator whose segments share `overlap` samples
    pub fn new(overlap: usize) -> Result<Self, SpectralError> {
        if overlap >= NFFT {
            return Err(SpectralError::InvalidOverlap { overlap, nfft: NFFT });
        }
        let window = hann(NFFT);
        let window_power = window.iter().map(|w| w * w).sum();
        Ok(Self {
            fft: FftPlanner::new().plan_fft_forward(NFFT),
            window,
            window_power,
            overlap,
        })
    }

    /// Samples shared by consecutive segments
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Average the periodograms of every full segment of `signal`
    ///
    /// Signals shorter than one segment are zero-padded to [`NFFT`].
    pub fn estimate(&self, signal: &[f64], sampling_rate: f64) -> Result<PsdResult, SpectralError> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(SpectralError::InvalidSamplingRate(sampling_rate));
        }
        if signal.is_empty() {
            return Err(SpectralError::EmptySignal);
        }

        let padded;
        let signal = if signal.len() < NFFT {
            padded = {
                let mut v = signal.to_vec();
                v.resize(NFFT, 0.0);
                v
            };
            &padded[..]
        } else {
            signal
        };

        let bins = NFFT / 2 + 1;
        let step = NFFT - self.overlap;
        let segments = (signal.len() - self.overlap) / step;

        let mut accumulated = vec![0.0; bins];
        let mut buffer = vec![Complex::new(0.0, 0.0); NFFT];
        for segment in 0..segments {
            let start = segment * step;
            let chunk = &signal[start..start + NFFT];
            for ((slot, &x), &w) in buffer.iter_mut().zip(chunk).zip(&self.window) {
                *slot = Complex::new(x * w, 0.0);
            }
            self.fft.process(&mut buffer);
            for (acc, c) in accumulated.iter_mut().zip(&buffer) {
                *acc += c.norm_sqr();
            }
        }

        let scale = 1.0 / (segments as f64 * sampling_rate * self.window_power);
        let power = accumulated
            .iter()
            .enumerate()
            .map(|(k, &p)| {
                // Fold negative frequencies onto every bin except DC and Nyquist
                let sides = if k == 0 || k == NFFT / 2 { 1.0 } else { 2.0 };
                p * scale * sides
            })
            .collect();

        let resolution = sampling_rate / NFFT as f64;
        let frequencies = (0..bins).map(|k| k as f64 * resolution).collect();

        Ok(PsdResult { frequencies, power })
    }
}
