//! Line sources feeding a scan cycle.

use super::{PipelineError, PipelineResult};
use std::borrow::Cow;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Something that can be read line by line from the beginning, any number
/// of times.
pub trait LineSource: Send + Sync + 'static {
    type Reader: AsyncBufRead + Unpin + Send + 'static;

    /// Open a fresh reader positioned at the first line.
    ///
    /// A failure here is fatal to the scan.
    fn open(&self) -> impl Future<Output = PipelineResult<Self::Reader>> + Send;

    /// Path reported in errors and prompts
    fn path(&self) -> &Path;
}

/// A delimited text file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineSource for FileSource {
    type Reader = BufReader<File>;

    async fn open(&self) -> PipelineResult<Self::Reader> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| PipelineError::FileOpen {
                path: self.path.clone(),
                source,
            })?;
        Ok(BufReader::new(file))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Open `source` and spawn a task that sends its lines, in order, into a
/// channel holding at most `capacity` lines.
///
/// The task stops at end of input, when `cancel` fires, or when the receiver
/// is dropped. It resolves to the number of lines sent.
pub async fn spawn_reader<S: LineSource>(
    source: &S,
    capacity: usize,
    cancel: CancellationToken,
) -> PipelineResult<(mpsc::Receiver<String>, JoinHandle<PipelineResult<u64>>)> {
    let reader = source.open().await?;
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let path = source.path().to_path_buf();
    let handle = tokio::spawn(read_lines(reader, path, tx, cancel));
    Ok((rx, handle))
}

async fn read_lines<R>(
    mut reader: R,
    path: PathBuf,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) -> PipelineResult<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut sent = 0;

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(source) => return Err(PipelineError::Read { path, source }),
        }

        let line = decode_line(&buf);
        if let Cow::Owned(_) = line {
            log::warn!(
                "Line {} of {} is not valid UTF-8, invalid bytes replaced",
                sent + 1,
                path.display()
            );
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            result = tx.send(line.into_owned()) => {
                if result.is_err() {
                    break;
                }
            }
        }
        sent += 1;
    }

    log::debug!("Reader for {} stopped after {} lines", path.display(), sent);
    Ok(sent)
}

/// Strip the line ending and decode, replacing invalid UTF-8 sequences.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}
