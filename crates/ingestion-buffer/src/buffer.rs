//! Drop-oldest Buffer Implementation

use sample_transport::Record;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Point-in-time buffer statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferStats {
    /// Records currently held
    pub len: usize,
    /// Maximum records held
    pub capacity: usize,
    /// Records ever pushed
    pub total_pushed: u64,
    /// Records evicted to make room
    pub total_evicted: u64,
}

struct Inner {
    records: VecDeque<Record>,
    total_pushed: u64,
    total_evicted: u64,
}

/// Bounded FIFO of inbound records with drop-oldest eviction
pub struct IngestionBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl IngestionBuffer {
    /// Create a buffer holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            warn!("Ingestion buffer capacity 0 raised to 1");
        }
        let capacity = capacity.max(1);
        info!("Creating ingestion buffer with capacity {}", capacity);
        Self {
            inner: Mutex::new(Inner {
                records: VecDeque::new(),
                total_pushed: 0,
                total_evicted: 0,
            }),
            capacity,
        }
    }

    /// Create a buffer with the default capacity (50 000 records)
    pub fn with_default_capacity() -> Self {
        Self::new(crate::DEFAULT_CAPACITY)
    }

    // The guarded state stays consistent even if a holder panicked
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record, evicting the oldest first when full
    ///
    /// Returns the evicted record, if any.
    pub fn push(&self, record: Record) -> Option<Record> {
        let mut inner = self.lock();
        let evicted = if inner.records.len() >= self.capacity {
            inner.total_evicted += 1;
            inner.records.pop_front()
        } else {
            None
        };
        inner.records.push_back(record);
        inner.total_pushed += 1;
        evicted
    }

    /// Remove and return every record in insertion order
    pub fn drain_all(&self) -> Vec<Record> {
        let taken = std::mem::take(&mut self.lock().records);
        Vec::from(taken)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of records held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of size and lifetime counters
    pub fn stats(&self) -> BufferStats {
        let inner = self.lock();
        BufferStats {
            len: inner.records.len(),
            capacity: self.capacity,
            total_pushed: inner.total_pushed,
            total_evicted: inner.total_evicted,
        }
    }
}

impl Default for IngestionBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn record(n: u64) -> Record {
        Record::new(n, n as f64 * 0.001)
    }

    #[test]
    fn test_push_and_drain_in_order() {
        let buffer = IngestionBuffer::new(10);
        for n in 0..5 {
            assert!(buffer.push(record(n)).is_none());
        }
        assert_eq!(buffer.len(), 5);

        let drained = buffer.drain_all();
        let sequence: Vec<u64> = drained.iter().map(|r| r.n).collect();
        assert_eq!(sequence, vec![0, 1, 2, 3, 4]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_keeps_most_recent() {
        let buffer = IngestionBuffer::new(50_000);
        for n in 0..60_000 {
            buffer.push(record(n));
        }
        assert_eq!(buffer.len(), 50_000);

        let drained = buffer.drain_all();
        assert_eq!(drained.len(), 50_000);
        assert!(drained.iter().map(|r| r.n).eq(10_000..60_000));
    }

    #[test]
    fn test_push_reports_evicted_record() {
        let buffer = IngestionBuffer::new(2);
        buffer.push(record(0));
        buffer.push(record(1));
        assert_eq!(buffer.push(record(2)), Some(record(0)));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_second_drain_is_empty() {
        let buffer = IngestionBuffer::new(8);
        buffer.push(record(1));
        assert_eq!(buffer.drain_all().len(), 1);
        assert!(buffer.drain_all().is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn test_stats_counters() {
        let buffer = IngestionBuffer::new(3);
        for n in 0..5 {
            buffer.push(record(n));
        }
        buffer.drain_all();
        buffer.push(record(5));

        assert_eq!(
            buffer.stats(),
            BufferStats {
                len: 1,
                capacity: 3,
                total_pushed: 6,
                total_evicted: 2,
            }
        );
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let buffer = IngestionBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push(record(0));
        buffer.push(record(1));
        assert_eq!(buffer.drain_all(), vec![record(1)]);
    }

    #[test]
    fn test_concurrent_push_and_drain_lose_nothing() {
        const TOTAL: u64 = 100_000;
        let buffer = Arc::new(IngestionBuffer::new(TOTAL as usize));

        let producer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for n in 0..TOTAL {
                    buffer.push(record(n));
                }
            })
        };

        let mut seen = Vec::new();
        while !producer.is_finished() {
            seen.extend(buffer.drain_all().into_iter().map(|r| r.n));
        }
        producer.join().unwrap();
        seen.extend(buffer.drain_all().into_iter().map(|r| r.n));

        // Every record lands in exactly one snapshot, in order
        assert!(seen.into_iter().eq(0..TOTAL));
    }

    proptest! {
        #[test]
        fn prop_retains_latest_capacity_records(capacity in 1usize..64, pushes in 0u64..300) {
            let buffer = IngestionBuffer::new(capacity);
            for n in 0..pushes {
                buffer.push(record(n));
            }
            let expected_len = (pushes as usize).min(capacity);
            prop_assert_eq!(buffer.len(), expected_len);

            let first = pushes - expected_len as u64;
            let drained = buffer.drain_all();
            prop_assert!(drained.iter().map(|r| r.n).eq(first..pushes));
        }
    }
}
