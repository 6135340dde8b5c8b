//! Output for matching rows.

use parking_lot::Mutex;
use std::io::{self, Write};

/// Destination for matching rows.
///
/// Rows are written from many tasks at once; every call must write the whole
/// line in one piece.
pub trait RowSink: Send + Sync + 'static {
    fn emit(&self, line: &str) -> io::Result<()>;
}

/// Sink that writes one line per row to any writer, serialized by a lock
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

/// Sink for standard output
pub type ConsoleSink = WriterSink<io::Stdout>;

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl WriterSink<Vec<u8>> {
    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.writer.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl<W: Write + Send + 'static> RowSink for WriterSink<W> {
    fn emit(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}
