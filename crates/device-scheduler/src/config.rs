//! Device Configuration

use peripheral_reader::{AdcCalibration, ReaderError, SignalProfile};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "SIGNAL_DEVICE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "signal-device.toml";

/// Errors while loading device configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Peripheral(#[from] ReaderError),
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Address the sample server listens on
    pub listen: String,
    /// Display refresh interval (milliseconds)
    pub display_interval_ms: u64,
    /// Target transmit rate (Hz)
    pub sampling_rate: f64,
    /// ADC conversion constants
    pub calibration: AdcCalibration,
    /// Simulated input signal
    pub simulation: SignalProfile,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8081".to_string(),
            display_interval_ms: 100,
            sampling_rate: 44_000.0,
            calibration: AdcCalibration::default(),
            simulation: SignalProfile::default(),
        }
    }
}

impl DeviceConfig {
    /// Load from the optional TOML file and `SIGNAL_DEVICE__*` variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let settings = config::Config::builder()
            .add_source(config::File::new(&path, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("SIGNAL_DEVICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("Device configuration loaded from {} (file optional): {:?}", path, config);
        Ok(config)
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_interval_ms == 0 {
            return Err(ConfigError::Invalid("display_interval_ms must be > 0".into()));
        }
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sampling_rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        self.calibration.validate()?;
        self.simulation.validate()?;
        Ok(())
    }

    /// Pause between display refreshes
    pub fn display_interval(&self) -> Duration {
        Duration::from_millis(self.display_interval_ms)
    }

    /// Pause between transmitted samples
    pub fn transmit_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sampling_rate)
    }
}
