//! Cooperative Scheduler Implementation

use crate::config::DeviceConfig;
use crate::display::DisplaySink;
use crate::tasks::{DisplayTask, SharedReader, TransmitTask};
use peripheral_reader::{AdcSource, PeripheralReader};
use sample_transport::{SampleSink, TransportError};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

/// Task timing for the scheduler
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Pause between display refreshes
    pub display_interval: Duration,
    /// Pause between transmitted samples
    pub transmit_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&DeviceConfig::default())
    }
}

impl From<&DeviceConfig> for SchedulerConfig {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            display_interval: config.display_interval(),
            transmit_interval: config.transmit_interval(),
        }
    }
}

/// State of the transmit task when the scheduler stopped
#[derive(Debug)]
pub enum TransmitStatus {
    /// Still streaming at shutdown
    Running,
    /// Ended on a transport failure
    Failed(TransportError),
    /// Panicked or was cancelled by the runtime
    Aborted(String),
}

/// Summary returned when the scheduler stops
#[derive(Debug)]
pub struct SchedulerReport {
    pub transmit: TransmitStatus,
    /// Peripheral reads performed by both tasks
    pub reads: u64,
}

/// Single-threaded scheduler for the display and transmit tasks
pub struct DeviceScheduler<A, D> {
    reader: SharedReader<A>,
    display: D,
    config: SchedulerConfig,
}

impl<A, D> DeviceScheduler<A, D>
where
    A: AdcSource + 'static,
    D: DisplaySink + 'static,
{
    /// Take ownership of the peripheral and the display
    pub fn new(reader: PeripheralReader<A>, display: D, config: SchedulerConfig) -> Self {
        Self {
            reader: SharedReader::new(reader),
            display,
            config,
        }
    }

    /// Run both tasks until `shutdown` resolves
    ///
    /// Must be awaited inside a `tokio::task::LocalSet`. A transmit failure
    /// ends only the transmit task; the display keeps refreshing until
    /// shutdown.
    pub async fn run<S, F>(self, sink: S, shutdown: F) -> SchedulerReport
    where
        S: SampleSink + 'static,
        F: Future<Output = ()>,
    {
        info!(
            "Starting device scheduler: display every {:?}, transmit every {:?}",
            self.config.display_interval, self.config.transmit_interval
        );

        let display = tokio::task::spawn_local(
            DisplayTask::new(self.reader.clone(), self.display, self.config.display_interval).run(),
        );
        let mut transmit = tokio::task::spawn_local(
            TransmitTask::new(self.reader.clone(), self.config.transmit_interval).run(sink),
        );

        tokio::pin!(shutdown);
        let mut status = TransmitStatus::Running;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                joined = &mut transmit, if matches!(status, TransmitStatus::Running) => {
                    status = match joined {
                        Ok(e) => {
                            error!("Transmit task failed, display continues: {}", e);
                            TransmitStatus::Failed(e)
                        }
                        Err(e) => {
                            error!("Transmit task aborted: {}", e);
                            TransmitStatus::Aborted(e.to_string())
                        }
                    };
                }
            }
        }

        // Reads are single synchronous calls, nothing is left mid-transaction
        display.abort();
        transmit.abort();

        let reads = self.reader.reads();
        info!("Device scheduler stopped after {} reads", reads);
        SchedulerReport {
            transmit: status,
            reads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayError, DisplayFrame};
    use peripheral_reader::{AdcCalibration, ConstantAdc};
    use sample_transport::{channel, Record, RecordSource};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    struct RecordingDisplay(Rc<RefCell<Vec<DisplayFrame>>>);

    impl DisplaySink for RecordingDisplay {
        fn repaint(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
            self.0.borrow_mut().push(frame.clone());
            Ok(())
        }
    }

    fn reader() -> PeripheralReader<ConstantAdc> {
        PeripheralReader::new(ConstantAdc(0x8000), AdcCalibration::default()).unwrap()
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            display_interval: Duration::from_millis(100),
            transmit_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_tasks_interleave() {
        LocalSet::new()
            .run_until(async {
                let frames = Rc::new(RefCell::new(Vec::new()));
                let (sink, mut source) = channel(1024);
                let scheduler = DeviceScheduler::new(reader(), RecordingDisplay(frames.clone()), config());

                let report = scheduler
                    .run(sink, tokio::time::sleep(Duration::from_millis(255)))
                    .await;

                assert!(matches!(report.transmit, TransmitStatus::Running));
                // Display at 0, 100, 200 ms; transmit every 10 ms from 0 to 250
                assert_eq!(frames.borrow().len(), 3);
                assert_eq!(report.reads, 3 + 26);

                let mut records = Vec::new();
                for _ in 0..26 {
                    records.push(source.receive().await.unwrap());
                }
                let sequence: Vec<u64> = records.iter().map(|r| r.n).collect();
                assert_eq!(sequence, (0..26).collect::<Vec<_>>());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequences_are_independent_per_task() {
        LocalSet::new()
            .run_until(async {
                let frames = Rc::new(RefCell::new(Vec::new()));
                let (sink, mut source) = channel(1024);
                let scheduler = DeviceScheduler::new(reader(), RecordingDisplay(frames.clone()), config());
                scheduler
                    .run(sink, tokio::time::sleep(Duration::from_millis(105)))
                    .await;

                // Both streams start at zero although they share the peripheral
                assert_eq!(frames.borrow()[0].lines[0], "Sample Num: 0");
                assert_eq!(frames.borrow()[1].lines[0], "Sample Num: 1");
                assert_eq!(source.receive().await.unwrap().n, 0);
            })
            .await;
    }

    struct FailingSink {
        accepted: Rc<RefCell<Vec<Record>>>,
        limit: usize,
    }

    #[async_trait::async_trait(?Send)]
    impl SampleSink for FailingSink {
        async fn send(&mut self, record: &Record) -> Result<(), TransportError> {
            if self.accepted.borrow().len() >= self.limit {
                return Err(TransportError::ConnectionClosed);
            }
            self.accepted.borrow_mut().push(*record);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_failure_keeps_display_running() {
        LocalSet::new()
            .run_until(async {
                let frames = Rc::new(RefCell::new(Vec::new()));
                let accepted = Rc::new(RefCell::new(Vec::new()));
                let sink = FailingSink {
                    accepted: accepted.clone(),
                    limit: 5,
                };
                let scheduler = DeviceScheduler::new(reader(), RecordingDisplay(frames.clone()), config());

                let report = scheduler
                    .run(sink, tokio::time::sleep(Duration::from_millis(1050)))
                    .await;

                assert!(matches!(
                    report.transmit,
                    TransmitStatus::Failed(TransportError::ConnectionClosed)
                ));
                assert_eq!(accepted.borrow().len(), 5);
                assert_eq!(frames.borrow().len(), 11);
                // Six transmit reads: the sixth sample never made it out
                assert_eq!(report.reads, 11 + 6);
            })
            .await;
    }
}
