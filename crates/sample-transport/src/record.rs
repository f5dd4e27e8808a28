//! Sample and Wire Record

use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// One acquired voltage with its per-task sequence number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Monotonic counter of the task that took the sample
    pub sequence: u64,
    /// Corrected voltage (V)
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(sequence: u64, value: f64) -> Self {
        Self { sequence, value }
    }
}

/// Wire form of a [`Sample`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Sequence counter
    pub n: u64,
    /// Corrected voltage
    pub signal: f64,
}

impl Record {
    /// Create a new record
    pub fn new(n: u64, signal: f64) -> Self {
        Self { n, signal }
    }

    /// Serialize into a single-line JSON message
    pub fn encode(&self) -> Result<String, TransportError> {
        // serde_json would silently write `null` here
        if !self.signal.is_finite() {
            return Err(TransportError::Encode(format!(
                "signal {} is not finite",
                self.signal
            )));
        }
        serde_json::to_string(self).map_err(|e| TransportError::Encode(e.to_string()))
    }

    /// Parse one JSON message
    pub fn decode(message: &str) -> Result<Self, TransportError> {
        serde_json::from_str(message.trim()).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

impl From<Sample> for Record {
    fn from(sample: Sample) -> Self {
        Self {
            n: sample.sequence,
            signal: sample.value,
        }
    }
}

impl From<Record> for Sample {
    fn from(record: Record) -> Self {
        Self {
            sequence: record.n,
            value: record.signal,
        }
    }
}
