//! Host Configuration

use ingestion_buffer::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use spectral_estimator::{EstimatorConfig, NFFT};
use thiserror::Error;
use tracing::info;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "SIGNAL_HOST_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "signal-host.toml";

/// Errors while loading host configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the device's sample stream is served
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
}

impl Default for DeviceEndpoint {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
        }
    }
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Device to ingest from
    pub server: DeviceEndpoint,
    /// HTTP bind address
    pub listen: String,
    /// Default transform rate (Hz)
    #[serde(alias = "samplingRate", alias = "samplingrate")]
    pub sampling_rate: f64,
    /// Eviction threshold of the ingestion buffer
    #[serde(alias = "maxQueueSize", alias = "maxqueuesize")]
    pub max_queue_size: usize,
    /// Welch segment overlap (samples)
    pub overlap: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        let estimator = EstimatorConfig::default();
        Self {
            server: DeviceEndpoint::default(),
            listen: "0.0.0.0:8080".to_string(),
            sampling_rate: estimator.sampling_rate,
            max_queue_size: DEFAULT_CAPACITY,
            overlap: estimator.overlap,
        }
    }
}

impl HostConfig {
    /// Load from the optional TOML file and `SIGNAL_HOST__*` variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let settings = config::Config::builder()
            .add_source(config::File::new(&path, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("SIGNAL_HOST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config = Self::from_settings(settings)?;
        info!("Host configuration loaded from {} (file optional): {:?}", path, config);
        Ok(config)
    }

    /// Deserialize and validate already-merged settings
    pub fn from_settings(settings: config::Config) -> Result<Self, ConfigError> {
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_queue_size == 0 {
            return Err(ConfigError::Invalid("max_queue_size must be > 0".into()));
        }
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sampling_rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        if self.overlap >= NFFT {
            return Err(ConfigError::Invalid(format!(
                "overlap must be below {}, got {}",
                NFFT, self.overlap
            )));
        }
        Ok(())
    }

    /// `host:port` of the device stream
    pub fn device_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Settings for the spectral estimator
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            sampling_rate: self.sampling_rate,
            overlap: self.overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(text: &str) -> Result<HostConfig, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        HostConfig::from_settings(settings)
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.max_queue_size, 50_000);
        assert_eq!(config.sampling_rate, 44_000.0);
        assert_eq!(config.device_addr(), "127.0.0.1:8081");
        assert_eq!(config.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_snake_case_keys() {
        let config = from_toml("sampling_rate = 8000.0\nmax_queue_size = 1000\n[server]\nhost = \"10.0.0.5\"\n").unwrap();
        assert_eq!(config.sampling_rate, 8000.0);
        assert_eq!(config.max_queue_size, 1000);
        assert_eq!(config.device_addr(), "10.0.0.5:8081");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(from_toml("max_queue_size = 0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(from_toml("sampling_rate = -1.0"), Err(ConfigError::Invalid(_))));
        assert!(matches!(from_toml("overlap = 1024"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_estimator_config() {
        let config = HostConfig {
            sampling_rate: 1000.0,
            overlap: 512,
            ..Default::default()
        };
        let estimator = config.estimator_config();
        assert_eq!(estimator.sampling_rate, 1000.0);
        assert_eq!(estimator.overlap, 512);
    }
}
