//! Local Display

use sample_transport::Sample;
use std::io::Write;
use thiserror::Error;

/// Display failures
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Display write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed two-line layout: sample number, then voltage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub lines: [String; 2],
}

impl DisplayFrame {
    /// Lay out one sample
    pub fn for_sample(sample: &Sample) -> Self {
        Self {
            lines: [
                format!("Sample Num: {}", sample.sequence),
                format!("Voltage: {:.2}V", sample.value),
            ],
        }
    }
}

/// A surface the display task repaints in full on every refresh
pub trait DisplaySink {
    /// Clear and draw `frame`
    fn repaint(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError>;
}

/// Terminal display that rewrites the same two lines in place
pub struct ConsoleDisplay<W> {
    out: W,
    painted: bool,
}

impl ConsoleDisplay<std::io::Stdout> {
    /// Display on standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleDisplay<W> {
    /// Display on an arbitrary writer
    pub fn new(out: W) -> Self {
        Self { out, painted: false }
    }

    /// Consume the display, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for ConsoleDisplay<W> {
    fn repaint(&mut self, frame: &DisplayFrame) -> Result<(), DisplayError> {
        if self.painted {
            // Back to the start of the previous frame
            write!(self.out, "\x1b[2F")?;
        }
        for line in &frame.lines {
            writeln!(self.out, "\x1b[2K{}", line)?;
        }
        self.out.flush()?;
        self.painted = true;
        Ok(())
    }
}
