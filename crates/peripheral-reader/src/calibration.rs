//! ADC Calibration and Voltage Conversion

use crate::error::ReaderError;
use crate::RAW_BITS;
use serde::{Deserialize, Serialize};

/// Calibration constants for converting raw ADC counts to a measured voltage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcCalibration {
    /// ADC reference voltage (V)
    pub v_ref: f64,
    /// Native resolution of the converter in bits
    pub adc_bits: u8,
    /// Ratio of the external voltage divider
    pub divider_ratio: f64,
    /// Fixed calibration offset applied after divider correction (V)
    pub offset: f64,
}

impl Default for AdcCalibration {
    fn default() -> Self {
        Self {
            v_ref: 3.3,
            adc_bits: 12,
            divider_ratio: 5.06,
            offset: -0.07,
        }
    }
}

impl AdcCalibration {
    /// Check that the constants describe a usable converter
    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.adc_bits == 0 || self.adc_bits > RAW_BITS {
            return Err(ReaderError::InvalidResolution(self.adc_bits));
        }
        if !self.v_ref.is_finite() || self.v_ref <= 0.0 {
            return Err(ReaderError::InvalidReference(self.v_ref));
        }
        if !self.divider_ratio.is_finite() {
            return Err(ReaderError::NonFinite {
                field: "divider_ratio",
                value: self.divider_ratio,
            });
        }
        if !self.offset.is_finite() {
            return Err(ReaderError::NonFinite {
                field: "offset",
                value: self.offset,
            });
        }
        Ok(())
    }

    /// Largest count at native resolution
    pub fn adc_max(&self) -> u32 {
        (1u32 << self.adc_bits) - 1
    }

    /// Shift a left-justified 16-bit reading down to native resolution
    pub fn rescale(&self, raw: u16) -> u32 {
        u32::from(raw) >> (RAW_BITS - self.adc_bits)
    }

    /// Convert a raw reading to the corrected voltage
    pub fn convert(&self, raw: u16) -> f64 {
        let counts = self.rescale(raw) as f64;
        let pin_voltage = counts * self.v_ref / self.adc_max() as f64;
        pin_voltage * self.divider_ratio + self.offset
    }

    /// Inverse of the pin-voltage step: the left-justified reading that a
    /// voltage at the ADC pin would produce
    pub fn quantize(&self, pin_voltage: f64) -> u16 {
        let full_scale = f64::from(u16::MAX);
        let raw = (pin_voltage / self.v_ref * full_scale).round();
        raw.clamp(0.0, full_scale) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let cal = AdcCalibration::default();
        assert_eq!(cal.adc_max(), 4095);
        assert!(cal.validate().is_ok());
    }

    #[test]
    fn test_rescale_drops_low_bits() {
        let cal = AdcCalibration::default();
        assert_eq!(cal.rescale(0xFFFF), 4095);
        assert_eq!(cal.rescale(0x000F), 0);
        assert_eq!(cal.rescale(0x8000), 2048);
    }

    #[test]
    fn test_convert_closed_form() {
        let cal = AdcCalibration::default();
        let expected = 2048.0 * 3.3 / 4095.0 * 5.06 - 0.07;
        assert!((cal.convert(0x8000) - expected).abs() < 1e-12);
        // Zero counts leave only the offset
        assert!((cal.convert(0) + 0.07).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_resolution() {
        let cal = AdcCalibration {
            adc_bits: 17,
            ..Default::default()
        };
        assert_eq!(cal.validate(), Err(ReaderError::InvalidResolution(17)));
    }

    #[test]
    fn test_invalid_reference() {
        let cal = AdcCalibration {
            v_ref: 0.0,
            ..Default::default()
        };
        assert!(matches!(cal.validate(), Err(ReaderError::InvalidReference(_))));
    }

    #[test]
    fn test_quantize_clamps() {
        let cal = AdcCalibration::default();
        assert_eq!(cal.quantize(-1.0), 0);
        assert_eq!(cal.quantize(10.0), u16::MAX);
        assert_eq!(cal.quantize(3.3), u16::MAX);
    }
}
