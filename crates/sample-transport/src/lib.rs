//! Sample Transport
//!
//! Wire model and transports between the acquisition device and the host.
//! One [`Record`] travels per message, encoded as a single JSON object
//! (`{"n": .., "signal": ..}`) and framed as one line on byte streams.

mod channel;
mod error;
mod record;
mod tcp;

pub use channel::{channel, ChannelSink, ChannelSource};
pub use error::TransportError;
pub use record::{Record, Sample};
pub use tcp::{TcpRecordSource, TcpSampleServer, MAX_LINE_BYTES};

use async_trait::async_trait;

/// Device-side end of the transport
///
/// Not `Send`: the device runs its tasks on one cooperative thread.
#[async_trait(?Send)]
pub trait SampleSink {
    /// Deliver one record as one message
    async fn send(&mut self, record: &Record) -> Result<(), TransportError>;
}

/// Host-side end of the transport
#[async_trait]
pub trait RecordSource: Send {
    /// Wait for the next record
    ///
    /// [`TransportError::Malformed`] leaves the source usable; every other
    /// error means the connection is gone.
    async fn receive(&mut self) -> Result<Record, TransportError>;
}
