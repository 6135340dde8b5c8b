//! Streaming scan pipeline.
//!
//! A scan runs in cycles. Each cycle reads the source from the top under a
//! deadline, evaluates every line against the current query on a bounded set
//! of concurrent tasks, and writes matching lines to a sink. When a cycle
//! times out or the source is exhausted the next cycle starts; a
//! cancellation ends the scan.

pub mod prompt;
pub mod scanner;
pub mod sink;
pub mod source;

pub use prompt::{Prompt, StdinPrompt};
pub use scanner::{CycleOutcome, CycleReport, ScanOptions, ScanState, Scanner};
pub use sink::{ConsoleSink, RowSink, WriterSink};
pub use source::{FileSource, LineSource};

use crate::table::SchemaError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a scan.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to open {}: {source}", .path.display())]
    FileOpen { path: PathBuf, source: io::Error },

    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid header line: {0}")]
    Schema(#[from] SchemaError),

    #[error("Prompt failed: {0}")]
    Prompt(#[source] io::Error),

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
