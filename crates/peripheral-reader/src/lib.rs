//! Peripheral Reader
//!
//! Owns the sampling hardware and turns raw ADC readings into corrected
//! voltages. Reads are synchronous and bounded: one register read, one
//! rescale, one linear conversion.

mod calibration;
mod error;
mod reader;
mod simulated;

pub use calibration::AdcCalibration;
pub use error::ReaderError;
pub use reader::{AdcSource, ConstantAdc, PeripheralReader};
pub use simulated::{SignalProfile, SimulatedAdc, Waveform};

/// Native width of a left-justified hardware reading
pub const RAW_BITS: u8 = 16;
