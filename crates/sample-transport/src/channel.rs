//! In-memory Transport

use crate::error::TransportError;
use crate::record::Record;
use crate::{RecordSource, SampleSink};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Create a connected sink/source pair buffering up to `capacity` messages
pub fn channel(capacity: usize) -> (ChannelSink, ChannelSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelSink { tx }, ChannelSource { rx })
}

/// Sending half of an in-memory transport
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    /// Push an arbitrary message, bypassing the encoder
    pub async fn send_raw(&self, message: impl Into<String>) -> Result<(), TransportError> {
        self.tx
            .send(message.into())
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

#[async_trait(?Send)]
impl SampleSink for ChannelSink {
    async fn send(&mut self, record: &Record) -> Result<(), TransportError> {
        let message = record.encode()?;
        self.send_raw(message).await
    }
}

/// Receiving half of an in-memory transport
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn receive(&mut self) -> Result<Record, TransportError> {
        match self.rx.recv().await {
            Some(message) => Record::decode(&message),
            None => Err(TransportError::ConnectionClosed),
        }
    }
}
