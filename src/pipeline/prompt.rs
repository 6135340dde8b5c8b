//! Interactive input for the scan loop.

use super::{PipelineError, PipelineResult};
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tokio::sync::mpsc;

/// Source of queries and answers for the scan loop.
pub trait Prompt: Send {
    /// Ask whether the first line of `path` holds the column names.
    fn confirm_header(&mut self, path: &Path) -> impl Future<Output = PipelineResult<bool>> + Send;

    /// Ask for the next query.
    ///
    /// `None` means no more input is coming; the previous query stays in use.
    fn read_query(&mut self) -> impl Future<Output = PipelineResult<Option<String>>> + Send;
}

/// Prompt reading answers from standard input.
///
/// Stdin is read on a dedicated thread so a pending read never holds up
/// shutdown.
pub struct StdinPrompt {
    lines: mpsc::UnboundedReceiver<String>,
}

impl StdinPrompt {
    pub fn spawn() -> PipelineResult<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("stdin-prompt".to_string())
            .spawn(move || forward_lines(io::stdin().lock(), tx))
            .map_err(PipelineError::Prompt)?;

        Ok(Self { lines: rx })
    }

    fn show(&self, text: &str) -> PipelineResult<()> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", text).map_err(PipelineError::Prompt)?;
        stdout.flush().map_err(PipelineError::Prompt)
    }
}

impl Prompt for StdinPrompt {
    async fn confirm_header(&mut self, path: &Path) -> PipelineResult<bool> {
        self.show(&format!(
            "\nNo column names found in the configuration.\n\
             Use the first line of {} as the header?\n\n\
             Press Y (yes) / N (no, exit): ",
            path.display()
        ))?;

        // A closed stdin accepts the header
        Ok(match self.lines.recv().await {
            Some(answer) => is_yes(&answer),
            None => true,
        })
    }

    async fn read_query(&mut self) -> PipelineResult<Option<String>> {
        self.show("csv_query>> ")?;
        Ok(self.lines.recv().await)
    }
}

/// Send lines from `input` until it ends, fails or the receiver goes away.
///
/// Returns the number of lines sent.
fn forward_lines<R: BufRead>(input: R, tx: mpsc::UnboundedSender<String>) -> usize {
    let mut sent = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Stopped reading standard input: {}", e);
                break;
            }
        };
        if tx.send(line).is_err() {
            break;
        }
        sent += 1;
    }
    log::debug!("Standard input closed, the last query stays in use");
    sent
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
