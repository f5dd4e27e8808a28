//! Line-framed TCP Transport
//!
//! The device listens and the host connects, mirroring how the sampling
//! hardware exposes its stream.

use crate::error::TransportError;
use crate::record::Record;
use crate::{RecordSource, SampleSink};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Device-side listener that streams records to one connected host
pub struct TcpSampleServer {
    listener: TcpListener,
    writer: Option<BufWriter<TcpStream>>,
    sent: u64,
}

impl TcpSampleServer {
    /// Bind the listening socket
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Sample server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            writer: None,
            sent: 0,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Whether a host is currently attached
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    async fn accept(&mut self) -> Result<(), TransportError> {
        debug!("Waiting for host connection");
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        info!("Host connected from {}", peer);
        self.writer = Some(BufWriter::new(stream));
        Ok(())
    }
}

#[async_trait(?Send)]
impl SampleSink for TcpSampleServer {
    async fn send(&mut self, record: &Record) -> Result<(), TransportError> {
        let mut message = record.encode()?;
        message.push('\n');

        if self.writer.is_none() {
            self.accept().await?;
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(TransportError::ConnectionClosed);
        };

        let written = async {
            writer.write_all(message.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!("Send failed after {} records: {}", self.sent, e);
            self.writer = None;
            return Err(e.into());
        }
        self.sent += 1;
        Ok(())
    }
}

/// Longest accepted line, newline excluded
pub const MAX_LINE_BYTES: usize = 4 * 1024;

const READ_CHUNK: usize = 4096;

/// Host-side client reading records from the device
///
/// Lines that are not valid UTF-8 or exceed [`MAX_LINE_BYTES`] come back as
/// `Malformed` and the stream stays usable.
pub struct TcpRecordSource {
    stream: TcpStream,
    read_buf: Vec<u8>,
    /// Inside an overlong line; bytes are dropped until the next newline
    discarding: bool,
    peer: SocketAddr,
}

impl TcpRecordSource {
    /// Connect to a device
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr()?;
        info!("Connected to sample stream at {}", peer);
        Ok(Self {
            stream,
            read_buf: Vec::with_capacity(READ_CHUNK),
            discarding: false,
            peer,
        })
    }

    /// Remote address
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Decode the next complete line already buffered, if any
    fn take_line(&mut self) -> Option<Result<Record, TransportError>> {
        let Some(pos) = self.read_buf.iter().position(|&b| b == b'\n') else {
            if self.read_buf.len() > MAX_LINE_BYTES {
                self.read_buf.clear();
                self.discarding = true;
            }
            return None;
        };

        let line: Vec<u8> = self.read_buf.drain(..=pos).collect();
        if std::mem::take(&mut self.discarding) || line.len() > MAX_LINE_BYTES + 1 {
            warn!("Dropping line longer than {} bytes", MAX_LINE_BYTES);
            return Some(Err(TransportError::Malformed(format!(
                "line exceeds {} bytes",
                MAX_LINE_BYTES
            ))));
        }
        Some(decode_line(&line))
    }
}

fn decode_line(line: &[u8]) -> Result<Record, TransportError> {
    let text = std::str::from_utf8(line)
        .map_err(|e| TransportError::Malformed(format!("invalid UTF-8: {}", e)))?;
    Record::decode(text)
}

#[async_trait]
impl RecordSource for TcpRecordSource {
    async fn receive(&mut self) -> Result<Record, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(result) = self.take_line() {
                return result;
            }

            let read = self.stream.read(&mut chunk).await?;
            if read == 0 {
                // Unterminated trailing line
                if !self.read_buf.is_empty() && !self.discarding {
                    let line = std::mem::take(&mut self.read_buf);
                    return decode_line(&line);
                }
                self.read_buf.clear();
                return Err(TransportError::ConnectionClosed);
            }
            self.read_buf.extend_from_slice(&chunk[..read]);
        }
    }
}
