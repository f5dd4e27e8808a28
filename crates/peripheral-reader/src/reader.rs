//! Peripheral Reader Implementation

use crate::calibration::AdcCalibration;
use crate::error::ReaderError;
use tracing::info;

/// Raw access to an analog-to-digital converter
///
/// Implementations return a left-justified 16-bit reading and must complete
/// in bounded time without suspending.
pub trait AdcSource {
    /// Read one raw value from the converter
    fn read_u16(&mut self) -> u16;
}

/// ADC stub that always reports the same raw value
#[derive(Debug, Clone, Copy)]
pub struct ConstantAdc(pub u16);

impl AdcSource for ConstantAdc {
    fn read_u16(&mut self) -> u16 {
        self.0
    }
}

/// Exclusive owner of the sampling peripheral
pub struct PeripheralReader<A> {
    /// Underlying converter
    adc: A,
    /// Conversion constants
    calibration: AdcCalibration,
    /// Reads performed since construction
    reads: u64,
}

impl<A: AdcSource> PeripheralReader<A> {
    /// Create a reader, rejecting unusable calibration constants
    pub fn new(adc: A, calibration: AdcCalibration) -> Result<Self, ReaderError> {
        calibration.validate()?;
        info!(
            "Peripheral reader ready: {}-bit ADC, vref={}V, ratio={}, offset={}V",
            calibration.adc_bits, calibration.v_ref, calibration.divider_ratio, calibration.offset
        );
        Ok(Self {
            adc,
            calibration,
            reads: 0,
        })
    }

    /// Read one corrected voltage
    pub fn read(&mut self) -> f64 {
        let raw = self.adc.read_u16();
        self.reads += 1;
        self.calibration.convert(raw)
    }

    /// Calibration in use
    pub fn calibration(&self) -> &AdcCalibration {
        &self.calibration
    }

    /// Number of reads performed so far
    pub fn reads(&self) -> u64 {
        self.reads
    }
}
