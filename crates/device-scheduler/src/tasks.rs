//! Display and Transmit Tasks

use crate::display::{DisplayFrame, DisplaySink};
use peripheral_reader::{AdcSource, PeripheralReader};
use sample_transport::{Record, Sample, SampleSink, TransportError};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Handle to the peripheral shared by the device tasks
///
/// `Rc` pins every handle to the scheduler thread. Each read borrows the
/// reader for one synchronous call, so a borrow never outlives a suspension
/// point.
pub struct SharedReader<A> {
    inner: Rc<RefCell<PeripheralReader<A>>>,
}

impl<A> Clone for SharedReader<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: AdcSource> SharedReader<A> {
    /// Wrap a reader for sharing between tasks
    pub fn new(reader: PeripheralReader<A>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(reader)),
        }
    }

    /// Take one sample and tag it with `sequence`
    pub fn sample(&self, sequence: u64) -> Sample {
        let value = self.inner.borrow_mut().read();
        Sample::new(sequence, value)
    }

    /// Total reads across all tasks
    pub fn reads(&self) -> u64 {
        self.inner.borrow().reads()
    }
}

/// Low-rate task repainting the local display
pub struct DisplayTask<A, D> {
    reader: SharedReader<A>,
    display: D,
    interval: Duration,
    sequence: u64,
}

impl<A: AdcSource, D: DisplaySink> DisplayTask<A, D> {
    /// Create a display task owning `display`
    pub fn new(reader: SharedReader<A>, display: D, interval: Duration) -> Self {
        Self {
            reader,
            display,
            interval,
            sequence: 0,
        }
    }

    /// Refresh forever; display errors are logged and the next frame retried
    pub async fn run(mut self) {
        info!("Display task started, refresh every {:?}", self.interval);
        loop {
            let sample = self.reader.sample(self.sequence);
            let frame = DisplayFrame::for_sample(&sample);
            if let Err(e) = self.display.repaint(&frame) {
                warn!("Display refresh {} failed: {}", self.sequence, e);
            }
            self.sequence += 1;
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// High-rate task streaming samples to the host
pub struct TransmitTask<A> {
    reader: SharedReader<A>,
    interval: Duration,
    sequence: u64,
}

impl<A: AdcSource> TransmitTask<A> {
    /// Create a transmit task with its own sequence counter
    pub fn new(reader: SharedReader<A>, interval: Duration) -> Self {
        Self {
            reader,
            interval,
            sequence: 0,
        }
    }

    /// Stream until the transport fails, returning the failure
    pub async fn run<S: SampleSink>(mut self, mut sink: S) -> TransportError {
        info!("Transmit task started, one sample every {:?}", self.interval);
        loop {
            let record = Record::from(self.reader.sample(self.sequence));
            if let Err(e) = sink.send(&record).await {
                error!("Transmit task stopping after {} samples: {}", self.sequence, e);
                return e;
            }
            if self.sequence % 100_000 == 0 {
                debug!("Transmitted sample {}", self.sequence);
            }
            self.sequence += 1;
            tokio::time::sleep(self.interval).await;
        }
    }
}
