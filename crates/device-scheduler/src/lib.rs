//! Device Scheduler
//!
//! Runs the display task and the transmit task on one cooperative thread.
//! Both tasks share the peripheral reader; reads never span a suspension
//! point, so access is exclusive without a lock. The reader handle is `!Send`,
//! which keeps the tasks from being moved onto separate threads.

mod config;
mod display;
mod scheduler;
mod tasks;

pub use config::{ConfigError, DeviceConfig};
pub use display::{ConsoleDisplay, DisplayError, DisplayFrame, DisplaySink};
pub use scheduler::{DeviceScheduler, SchedulerConfig, SchedulerReport, TransmitStatus};
pub use tasks::{DisplayTask, SharedReader, TransmitTask};
