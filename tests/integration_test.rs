use csv_query::config::Config;
use csv_query::pipeline::{
    CycleOutcome, FileSource, LineSource, PipelineError, PipelineResult, Prompt, ScanOptions,
    ScanState, Scanner, WriterSink,
};
use csv_query::query::{evaluate, resolve_fields, to_postfix, tokenize, Query, Token};
use csv_query::table::{Row, Schema};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio_util::sync::CancellationToken;

/// Prompt answering from a script.
///
/// Once the script runs dry it behaves like a closed stdin, and cancels the
/// scan if it was given a token.
struct ScriptedPrompt {
    accept_header: bool,
    queries: VecDeque<String>,
    cancel: Option<CancellationToken>,
    confirmations: usize,
    reads: usize,
}

impl ScriptedPrompt {
    fn new(accept_header: bool, queries: &[&str], cancel: CancellationToken) -> Self {
        let mut prompt = Self::closing(queries);
        prompt.accept_header = accept_header;
        prompt.cancel = Some(cancel);
        prompt
    }

    /// Answer `queries`, then report closed input forever
    fn closing(queries: &[&str]) -> Self {
        Self {
            accept_header: true,
            queries: queries.iter().map(|q| q.to_string()).collect(),
            cancel: None,
            confirmations: 0,
            reads: 0,
        }
    }
}

impl Prompt for ScriptedPrompt {
    async fn confirm_header(&mut self, _path: &Path) -> PipelineResult<bool> {
        self.confirmations += 1;
        Ok(self.accept_header)
    }

    async fn read_query(&mut self) -> PipelineResult<Option<String>> {
        self.reads += 1;
        let next = self.queries.pop_front();
        if next.is_none() {
            if let Some(cancel) = &self.cancel {
                cancel.cancel();
            }
        }
        Ok(next)
    }
}

fn cancel_after(cancel: &CancellationToken, delay: Duration) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        cancel.cancel();
    });
}

/// Source that yields a single row and then never ends
struct EndlessSource {
    path: PathBuf,
    writers: Mutex<Vec<DuplexStream>>,
}

impl EndlessSource {
    fn new() -> Self {
        Self {
            path: PathBuf::from("endless.csv"),
            writers: Mutex::new(Vec::new()),
        }
    }
}

impl LineSource for EndlessSource {
    type Reader = BufReader<DuplexStream>;

    async fn open(&self) -> PipelineResult<Self::Reader> {
        let (mut writer, reader) = tokio::io::duplex(1024);
        writer.write_all(b"Asia,2020-02-24\n").await.unwrap();
        // Keep the write half open so the reader never sees end of input
        self.writers.lock().push(writer);
        Ok(BufReader::new(reader))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

fn data_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn options(timeout: Duration) -> ScanOptions {
    ScanOptions {
        separator: ",".to_string(),
        timeout,
        workers: 4,
    }
}

fn schema() -> Schema {
    Schema::new(["continent", "date"]).unwrap()
}

#[test]
fn test_query_stages() {
    let tokens = tokenize("(continent='Asia' AND date>'2020-04-14')");
    assert_eq!(
        tokens,
        vec![
            "(",
            "continent",
            "=",
            "'Asia'",
            "AND",
            "date",
            ">",
            "'2020-04-14'",
            ")"
        ]
    );

    let schema = schema();
    let row = Row::new(&schema, vec!["Asia".to_string(), "2020-02-24".to_string()]);
    let mut tokens: Vec<Token> = ["CONTINENT", "=", "'Asia'"].into_iter().map(Token::from).collect();
    resolve_fields(&mut tokens, &row);
    assert_eq!(tokens, vec!["'Asia'", "=", "'Asia'"]);

    let postfix = to_postfix(&tokens);
    assert_eq!(postfix, vec!["'ASIA'", "'ASIA'", "="]);
    assert_eq!(evaluate(&postfix), Ok(true));
}

#[test]
fn test_end_to_end_matching() {
    let schema = schema();
    let query = Query::new("continent='Asia' AND (date='2020-02-25' OR date='2020-03-03')");

    let hit = Row::parse(&schema, "Asia,2020-02-25", ",");
    let miss = Row::parse(&schema, "Asia,2020-02-26", ",");

    for _ in 0..3 {
        assert!(hit.matches(&query));
        assert!(!miss.matches(&query));
    }
    assert!(hit.matches_str(""));
    assert!(!hit.matches_str("continent AND date"));
}

#[tokio::test]
async fn test_run_reads_header_and_follows_queries() {
    let file = data_file(&[
        "continent,date",
        "Asia,2020-02-24",
        "Asia,2020-02-25",
        "Africa,2020-02-26",
    ]);
    let cancel = CancellationToken::new();
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        FileSource::new(file.path()),
        sink.clone(),
        options(Duration::from_secs(5)),
        None,
        cancel.clone(),
    );
    let mut prompt = ScriptedPrompt::new(
        true,
        &["continent='Asia'", "date>'2020-02-24'"],
        cancel.clone(),
    );

    scanner.run(&mut prompt).await.unwrap();

    assert_eq!(scanner.state(), ScanState::Cancelled);
    assert_eq!(prompt.confirmations, 1);

    let mut lines = sink.lines();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "Africa,2020-02-26",
            "Asia,2020-02-24",
            "Asia,2020-02-25",
            "Asia,2020-02-25",
        ]
    );
}

#[tokio::test]
async fn test_declined_header_stops_scan() {
    let file = data_file(&["continent,date", "Asia,2020-02-24"]);
    let cancel = CancellationToken::new();
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        FileSource::new(file.path()),
        sink.clone(),
        options(Duration::from_secs(5)),
        None,
        cancel.clone(),
    );
    let mut prompt = ScriptedPrompt::new(false, &["continent='Asia'"], cancel);

    scanner.run(&mut prompt).await.unwrap();

    assert_eq!(scanner.state(), ScanState::Cancelled);
    assert!(scanner.schema().is_none());
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let mut scanner = Scanner::new(
        FileSource::new(dir.path().join("missing.csv")),
        Arc::new(WriterSink::new(Vec::new())),
        options(Duration::from_secs(5)),
        Some(schema()),
        cancel.clone(),
    );
    let mut prompt = ScriptedPrompt::new(true, &["continent='Asia'"], cancel);

    let result = scanner.run(&mut prompt).await;
    assert!(matches!(result, Err(PipelineError::FileOpen { .. })));
}

#[tokio::test]
async fn test_endless_source_times_out() {
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        EndlessSource::new(),
        sink.clone(),
        options(Duration::from_millis(200)),
        Some(schema()),
        CancellationToken::new(),
    );

    let report = scanner
        .run_cycle(Arc::new(Query::new("continent='asia'")))
        .await
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::TimedOut);
    assert_eq!(report.rows, 1);
    assert_eq!(report.matched, 1);
    assert_eq!(sink.lines(), vec!["Asia,2020-02-24"]);
    assert_eq!(scanner.state(), ScanState::Scanning);
}

#[tokio::test]
async fn test_scan_from_config_file() {
    let data = data_file(&["Europe,2020-03-01", "Asia,2020-03-02"]);
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, "timeout = 5").unwrap();
    writeln!(config_file, "workers = 2").unwrap();
    writeln!(config_file, "[head]").unwrap();
    writeln!(config_file, "path = {:?}", data.path().display().to_string()).unwrap();
    writeln!(config_file, "fields = [\"continent\", \"date\"]").unwrap();

    let config = Config::load(config_file.path()).unwrap();
    config.validate().unwrap();

    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        FileSource::new(&config.head.path),
        sink.clone(),
        config.scan_options(),
        config.schema().unwrap(),
        CancellationToken::new(),
    );

    let report = scanner
        .run_cycle(Arc::new(Query::new("NOT (continent='Asia')")))
        .await
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::Exhausted);
    assert_eq!(sink.lines(), vec!["Europe,2020-03-01"]);
}

#[tokio::test]
async fn test_cancel_during_cycle() {
    let cancel = CancellationToken::new();
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        EndlessSource::new(),
        sink.clone(),
        options(Duration::from_secs(30)),
        Some(schema()),
        cancel.clone(),
    );

    cancel_after(&cancel, Duration::from_millis(50));
    let report = scanner
        .run_cycle(Arc::new(Query::new("continent='Asia'")))
        .await
        .unwrap();

    assert_eq!(report.outcome, CycleOutcome::Cancelled);
    assert!(report.elapsed < Duration::from_secs(5));
    assert_eq!(report.rows, 1);

    // Nothing is written once the cycle has returned
    let written = sink.lines();
    assert!(written.len() <= 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.lines(), written);
}

#[tokio::test]
async fn test_cancel_during_run_is_terminal() {
    let cancel = CancellationToken::new();
    let mut scanner = Scanner::new(
        EndlessSource::new(),
        Arc::new(WriterSink::new(Vec::new())),
        options(Duration::from_secs(30)),
        Some(schema()),
        cancel.clone(),
    );
    let mut prompt = ScriptedPrompt::closing(&["continent='Asia'"]);

    let started = Instant::now();
    cancel_after(&cancel, Duration::from_millis(50));
    scanner.run(&mut prompt).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(scanner.state(), ScanState::Cancelled);
    assert_eq!(prompt.reads, 1);
}

#[tokio::test]
async fn test_run_restarts_after_timeout() {
    let cancel = CancellationToken::new();
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        EndlessSource::new(),
        sink.clone(),
        options(Duration::from_millis(100)),
        Some(schema()),
        cancel.clone(),
    );
    let mut prompt = ScriptedPrompt::new(
        true,
        &[
            "continent='Asia'",
            "date='2020-02-24'",
            "continent<>'Europe'",
        ],
        cancel,
    );

    let started = Instant::now();
    scanner.run(&mut prompt).await.unwrap();

    // Three cycles, each ended by its deadline, each reading the source anew
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(prompt.reads, 4);
    assert_eq!(sink.lines(), vec!["Asia,2020-02-24"; 3]);
    assert_eq!(scanner.state(), ScanState::Cancelled);
}

#[tokio::test]
async fn test_closed_input_waits_out_timeout_before_rescan() {
    let file = data_file(&["Asia,2020-02-24"]);
    let cancel = CancellationToken::new();
    let sink = Arc::new(WriterSink::new(Vec::new()));
    let mut scanner = Scanner::new(
        FileSource::new(file.path()),
        sink.clone(),
        options(Duration::from_millis(300)),
        Some(schema()),
        cancel.clone(),
    );
    let mut prompt = ScriptedPrompt::closing(&["continent='Asia'"]);

    cancel_after(&cancel, Duration::from_millis(1000));
    scanner.run(&mut prompt).await.unwrap();

    // One rescan per timeout period rather than a busy loop
    let cycles = sink.lines().len();
    assert!((2..=5).contains(&cycles), "{} cycles", cycles);
    assert!(prompt.reads >= cycles && prompt.reads <= cycles + 1);
    assert_eq!(scanner.state(), ScanState::Cancelled);
}
