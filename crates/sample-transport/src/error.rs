//! Transport Error Types

use thiserror::Error;

/// Errors that can occur while moving records between device and host
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Socket or stream failure
    #[error("Transport I/O error: {0}")]
    Io(String),

    /// Peer closed the connection
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Message could not be decoded into a record
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// Record could not be encoded
    #[error("Cannot encode record: {0}")]
    Encode(String),
}

impl TransportError {
    /// Whether the connection survives this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::Malformed(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
