//! Transport Consumption Loop

use crate::buffer::IngestionBuffer;
use metrics::{counter, gauge};
use sample_transport::{RecordSource, TransportError};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Why and when the ingestion loop ended
#[derive(Debug)]
pub struct IngestionOutcome {
    /// Records pushed onto the buffer
    pub received: u64,
    /// Malformed messages dropped
    pub malformed: u64,
    /// The failure that ended the loop
    pub cause: TransportError,
}

/// Moves records from a transport into the buffer until the transport fails
pub struct IngestionLoop<R> {
    source: R,
    buffer: Arc<IngestionBuffer>,
}

impl<R: RecordSource> IngestionLoop<R> {
    /// Create a loop feeding `buffer` from `source`
    pub fn new(source: R, buffer: Arc<IngestionBuffer>) -> Self {
        Self { source, buffer }
    }

    /// Run until the connection is lost
    ///
    /// Malformed records are logged and dropped. There is no reconnect.
    pub async fn run(mut self) -> IngestionOutcome {
        info!("Starting ingestion loop (capacity {})", self.buffer.capacity());
        let mut received = 0u64;
        let mut malformed = 0u64;
        let mut evicting = false;

        let cause = loop {
            match self.source.receive().await {
                Ok(record) => {
                    let evicted = self.buffer.push(record).is_some();
                    received += 1;
                    counter!("ingest_records_total").increment(1);
                    if evicted {
                        counter!("ingest_evicted_total").increment(1);
                        if !evicting {
                            warn!("Ingestion buffer full, evicting oldest records");
                        }
                    } else if evicting {
                        debug!("Ingestion buffer below capacity again");
                    }
                    evicting = evicted;
                    gauge!("ingest_buffer_len").set(self.buffer.len() as f64);
                }
                Err(e) if e.is_recoverable() => {
                    malformed += 1;
                    counter!("ingest_malformed_total").increment(1);
                    warn!("Dropping malformed record: {}", e);
                }
                Err(e) => break e,
            }
        };

        error!(
            "Ingestion loop stopped after {} records ({} malformed): {}",
            received, malformed, cause
        );
        IngestionOutcome {
            received,
            malformed,
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_transport::{channel, Record, SampleSink};

    #[tokio::test]
    async fn test_loop_buffers_until_close() {
        let (mut sink, source) = channel(16);
        let buffer = Arc::new(IngestionBuffer::new(3));

        for n in 0..5 {
            sink.send(&Record::new(n, 1.0)).await.unwrap();
        }
        drop(sink);

        let outcome = IngestionLoop::new(source, Arc::clone(&buffer)).run().await;
        assert_eq!(outcome.received, 5);
        assert_eq!(outcome.malformed, 0);
        assert!(matches!(outcome.cause, TransportError::ConnectionClosed));

        let kept: Vec<u64> = buffer.drain_all().iter().map(|r| r.n).collect();
        assert_eq!(kept, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let (mut sink, source) = channel(16);
        let buffer = Arc::new(IngestionBuffer::new(10));

        sink.send(&Record::new(0, 0.5)).await.unwrap();
        sink.send_raw("{\"n\": 1}").await.unwrap();
        sink.send_raw("][").await.unwrap();
        sink.send(&Record::new(2, 0.7)).await.unwrap();
        drop(sink);

        let outcome = IngestionLoop::new(source, Arc::clone(&buffer)).run().await;
        assert_eq!(outcome.received, 2);
        assert_eq!(outcome.malformed, 2);
        assert_eq!(buffer.drain_all(), vec![Record::new(0, 0.5), Record::new(2, 0.7)]);
    }

    #[tokio::test]
    async fn test_corrupt_bytes_on_socket_do_not_stop_ingestion() {
        use sample_transport::TcpRecordSource;
        use tokio::io::AsyncWriteExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let device = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream
                .write_all(b"{\"n\":0,\"signal\":1.0}\n\xff\xfe\n{\"n\":1,\"signal\":2.0}\n")
                .await
                .unwrap();
        });

        let source = TcpRecordSource::connect(&addr).await.unwrap();
        device.await.unwrap();
        let buffer = Arc::new(IngestionBuffer::new(10));

        let outcome = IngestionLoop::new(source, Arc::clone(&buffer)).run().await;
        assert_eq!(outcome.received, 2);
        assert_eq!(outcome.malformed, 1);
        assert!(matches!(outcome.cause, TransportError::ConnectionClosed));
        assert_eq!(buffer.drain_all(), vec![Record::new(0, 1.0), Record::new(1, 2.0)]);
    }

    #[tokio::test]
    async fn test_drain_while_ingesting() {
        let (mut sink, source) = channel(64);
        let buffer = Arc::new(IngestionBuffer::new(1000));
        let handle = tokio::spawn(IngestionLoop::new(source, Arc::clone(&buffer)).run());

        let mut seen = Vec::new();
        for n in 0..200 {
            sink.send(&Record::new(n, 0.0)).await.unwrap();
            if n % 37 == 0 {
                tokio::task::yield_now().await;
                seen.extend(buffer.drain_all().into_iter().map(|r| r.n));
            }
        }
        drop(sink);
        let outcome = handle.await.unwrap();
        seen.extend(buffer.drain_all().into_iter().map(|r| r.n));

        assert_eq!(outcome.received, 200);
        assert!(seen.into_iter().eq(0..200));
    }
}
