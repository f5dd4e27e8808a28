//! Simulated ADC Source
//!
//! Function-generator stand-in for the real converter. Each read advances a
//! sample counter by one step of `1 / sample_rate` seconds, so the produced
//! waveform is exact regardless of wall-clock jitter in the caller.

use crate::calibration::AdcCalibration;
use crate::error::ReaderError;
use crate::reader::AdcSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::info;

/// Periodic waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Sawtooth,
    Triangle,
    /// 50% duty cycle
    Square,
}

impl Waveform {
    /// Unit-amplitude value at `phase` in [0, 1)
    pub fn value(&self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Signal generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalProfile {
    pub waveform: Waveform,
    /// Fundamental frequency (Hz)
    pub frequency: f64,
    /// Peak amplitude at the ADC pin (V)
    pub amplitude: f64,
    /// DC level at the ADC pin (V)
    pub bias: f64,
    /// Peak of uniform additive noise (V), 0 disables
    pub noise: f64,
    /// Rate at which reads are assumed to happen (Hz)
    pub sample_rate: f64,
    /// Noise seed; random when absent
    pub seed: Option<u64>,
}

impl SignalProfile {
    /// Reject settings that would produce NaN phases or an unsampleable noise range
    pub fn validate(&self) -> Result<(), ReaderError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ReaderError::InvalidSampleRate(self.sample_rate));
        }
        for (field, value) in [
            ("frequency", self.frequency),
            ("amplitude", self.amplitude),
            ("bias", self.bias),
        ] {
            if !value.is_finite() {
                return Err(ReaderError::NonFinite { field, value });
            }
        }
        // gen_range needs a finite span of 2 * noise
        if !(self.noise >= 0.0 && (2.0 * self.noise).is_finite()) {
            return Err(ReaderError::InvalidNoise(self.noise));
        }
        Ok(())
    }
}

impl Default for SignalProfile {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: 1000.0,
            amplitude: 1.0,
            bias: 1.65,
            noise: 0.0,
            sample_rate: 44_000.0,
            seed: None,
        }
    }
}

/// ADC that synthesizes readings from a [`SignalProfile`]
pub struct SimulatedAdc {
    profile: SignalProfile,
    calibration: AdcCalibration,
    n: u64,
    rng: StdRng,
}

impl SimulatedAdc {
    /// Create a simulated converter quantizing against `calibration`
    pub fn new(profile: SignalProfile, calibration: AdcCalibration) -> Result<Self, ReaderError> {
        profile.validate()?;
        info!(
            "Simulated ADC: {:?} {} Hz, amplitude={}V, bias={}V, noise={}V @ {} Hz",
            profile.waveform,
            profile.frequency,
            profile.amplitude,
            profile.bias,
            profile.noise,
            profile.sample_rate
        );
        let rng = match profile.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            profile,
            calibration,
            n: 0,
            rng,
        })
    }

    /// Pin voltage for the next sample, before quantization
    fn next_pin_voltage(&mut self) -> f64 {
        let t = self.n as f64 / self.profile.sample_rate;
        self.n += 1;
        let phase = (t * self.profile.frequency).fract();
        let mut v = self.profile.bias + self.profile.amplitude * self.profile.waveform.value(phase);
        if self.profile.noise > 0.0 {
            v += self.rng.gen_range(-self.profile.noise..=self.profile.noise);
        }
        v
    }
}

impl AdcSource for SimulatedAdc {
    fn read_u16(&mut self) -> u16 {
        let v = self.next_pin_voltage();
        self.calibration.quantize(v)
    }
}
