//! Ingestion Buffer
//!
//! Bounded FIFO between the transport and the spectral estimator. Pushes
//! evict the oldest record once capacity is reached; drains remove every
//! record at once. Both run under one mutex, so a record pushed during a
//! drain lands on exactly one side of the snapshot boundary.

mod buffer;
mod ingest;

pub use buffer::{BufferStats, IngestionBuffer};
pub use ingest::{IngestionLoop, IngestionOutcome};

/// Default capacity (records)
pub const DEFAULT_CAPACITY: usize = 50_000;
