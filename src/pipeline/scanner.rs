//! Cycle driver for the scan pipeline.

use super::prompt::Prompt;
use super::sink::RowSink;
use super::source::{spawn_reader, LineSource};
use super::PipelineResult;
use crate::query::Query;
use crate::table::{Row, Schema, DEFAULT_SEPARATOR};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Where the scan loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No column names yet; the next cycle takes them from the first line
    AwaitingSchema,
    /// Lines are being read and matched
    Scanning,
    /// A cycle ended and the source will be read again from the top
    Restarting,
    /// Terminal
    Cancelled,
}

/// How a single cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every line of the source was read
    Exhausted,
    /// The cycle deadline passed before the end of the source
    TimedOut,
    /// The scan was cancelled
    Cancelled,
}

/// Summary of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Data lines handed to row tasks
    pub rows: u64,
    /// Rows written to the sink
    pub matched: u64,
    pub elapsed: Duration,
}

/// Tunables for a scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Field separator
    pub separator: String,
    /// Deadline of one cycle
    pub timeout: Duration,
    /// Maximum number of rows evaluated at once
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            timeout: Duration::from_secs(30),
            workers: std::thread::available_parallelism().map_or(4, |n| n.get()),
        }
    }
}

/// Repeatedly scans a line source, writing rows that match the current query.
pub struct Scanner<S: LineSource, K: RowSink> {
    source: S,
    sink: Arc<K>,
    options: ScanOptions,
    cancel: CancellationToken,
    schema: Option<Arc<Schema>>,
    /// The schema was read from the first line, so later cycles skip it
    header_in_source: bool,
    state: ScanState,
}

impl<S: LineSource, K: RowSink> Scanner<S, K> {
    /// Create a scanner.
    ///
    /// With `schema` set the whole source is data; otherwise the first line
    /// supplies the column names.
    pub fn new(
        source: S,
        sink: Arc<K>,
        options: ScanOptions,
        schema: Option<Schema>,
        cancel: CancellationToken,
    ) -> Self {
        let state = if schema.is_some() {
            ScanState::Scanning
        } else {
            ScanState::AwaitingSchema
        };

        Self {
            source,
            sink,
            options,
            cancel,
            schema: schema.map(Arc::new),
            header_in_source: false,
            state,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    /// Run cycles until cancelled, asking `prompt` for a query before each.
    pub async fn run<P: Prompt>(&mut self, prompt: &mut P) -> PipelineResult<()> {
        let result = self.run_cycles(prompt).await;
        self.state = ScanState::Cancelled;
        result
    }

    async fn run_cycles<P: Prompt>(&mut self, prompt: &mut P) -> PipelineResult<()> {
        let cancel = self.cancel.clone();
        let mut query = Arc::new(Query::default());
        let mut last: Option<CycleReport> = None;

        loop {
            if self.schema.is_none() {
                self.state = ScanState::AwaitingSchema;
                let confirmed = tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    answer = prompt.confirm_header(self.source.path()) => answer?,
                };
                if !confirmed {
                    log::info!("No column names available, stopping");
                    return Ok(());
                }
            }

            let input = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                input = prompt.read_query() => input?,
            };

            match input {
                Some(raw) => {
                    log::info!("Query: {}", raw);
                    query = Arc::new(Query::new(&raw));
                }
                None => {
                    // Without interactive input, an exhausted source is read
                    // again once its deadline has passed.
                    if let Some(report) = last.filter(|r| r.outcome == CycleOutcome::Exhausted) {
                        let idle = self.options.timeout.saturating_sub(report.elapsed);
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(idle) => {}
                        }
                    }
                }
            }

            let report = self.run_cycle(Arc::clone(&query)).await?;
            log::info!(
                "Cycle {:?}: {} rows scanned, {} matched in {:?}",
                report.outcome,
                report.rows,
                report.matched,
                report.elapsed
            );

            self.state = report.outcome.into();
            if self.state == ScanState::Cancelled {
                return Ok(());
            }
            last = Some(report);
        }
    }

    /// Read the source once from the top, bounded by the cycle deadline.
    ///
    /// Lines are evaluated on at most `workers` concurrent tasks. Output order
    /// across rows is not guaranteed. On timeout the reader stops and rows
    /// already in flight finish; on cancellation they are aborted.
    pub async fn run_cycle(&mut self, query: Arc<Query>) -> PipelineResult<CycleReport> {
        let started = Instant::now();
        let root = self.cancel.clone();
        let cycle = root.child_token();
        let workers = self.options.workers.max(1);

        let (mut lines, reader) = spawn_reader(&self.source, workers, cycle.clone()).await?;
        log::debug!("Scanning {}", self.source.path().display());

        let deadline = tokio::time::sleep(self.options.timeout);
        tokio::pin!(deadline);

        let mut tasks: JoinSet<bool> = JoinSet::new();
        let mut report = CycleReport {
            outcome: CycleOutcome::Exhausted,
            rows: 0,
            matched: 0,
            elapsed: Duration::ZERO,
        };
        let mut skip_header = self.header_in_source;

        if self.schema.is_some() {
            self.state = ScanState::Scanning;
        }

        loop {
            tokio::select! {
                biased;

                _ = root.cancelled() => {
                    report.outcome = CycleOutcome::Cancelled;
                    break;
                }
                _ = &mut deadline => {
                    report.outcome = CycleOutcome::TimedOut;
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    record(&mut report, joined);
                }
                line = lines.recv(), if tasks.len() < workers => {
                    let Some(line) = line else { break };

                    let Some(schema) = self.schema.clone() else {
                        match Schema::from_header(&line, &self.options.separator) {
                            Ok(schema) => {
                                log::info!("Columns: {}", schema.columns().join(", "));
                                self.schema = Some(Arc::new(schema));
                                self.header_in_source = true;
                                self.state = ScanState::Scanning;
                                continue;
                            }
                            Err(e) => {
                                cycle.cancel();
                                return Err(e.into());
                            }
                        }
                    };

                    if skip_header {
                        skip_header = false;
                        continue;
                    }
                    if line.is_empty() {
                        continue;
                    }

                    report.rows += 1;
                    tasks.spawn(match_row(
                        line,
                        schema,
                        Arc::clone(&query),
                        Arc::clone(&self.sink),
                        self.options.separator.clone(),
                        root.clone(),
                    ));
                }
            }
        }

        // Stop the reader before draining
        cycle.cancel();

        if report.outcome == CycleOutcome::Cancelled {
            tasks.shutdown().await;
        } else {
            while let Some(joined) = tasks.join_next().await {
                record(&mut report, joined);
            }
        }

        let sent = reader.await??;
        log::debug!("Reader sent {} lines", sent);

        report.elapsed = started.elapsed();
        Ok(report)
    }
}

/// Evaluate one line and write it out if it matches.
///
/// Nothing is written once `cancel` has fired.
async fn match_row<K: RowSink>(
    line: String,
    schema: Arc<Schema>,
    query: Arc<Query>,
    sink: Arc<K>,
    separator: String,
    cancel: CancellationToken,
) -> bool {
    let row = Row::parse(&schema, &line, &separator);
    if !row.matches(&query) || cancel.is_cancelled() {
        return false;
    }

    if let Err(e) = sink.emit(&row.join(&separator)) {
        log::error!("Failed to write row: {}", e);
        return false;
    }
    true
}

fn record(report: &mut CycleReport, joined: Result<bool, JoinError>) {
    match joined {
        Ok(true) => report.matched += 1,
        Ok(false) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => log::error!("Row task failed: {}", e),
    }
}

impl From<CycleOutcome> for ScanState {
    fn from(outcome: CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::Exhausted | CycleOutcome::TimedOut => ScanState::Restarting,
            CycleOutcome::Cancelled => ScanState::Cancelled,
        }
    }
}
