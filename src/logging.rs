//! Logger setup for the binary.

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::Level;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Install the global logger.
///
/// `RUST_LOG` takes precedence over `level`. When `output_path` is given, log
/// records are appended to that file instead of stderr. Records at warn level
/// and above are also appended to `error_output_path`, if set.
pub fn init(
    level: &str,
    output_path: Option<&Path>,
    error_output_path: Option<&Path>,
) -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));

    if let Some(path) = output_path {
        builder.target(Target::Pipe(Box::new(open_log_file(path)?)));
    }

    if let Some(path) = error_output_path {
        let errors = ErrorLog::open(path)?;
        builder.format(move |buf, record| {
            let line = format!(
                "[{} {:<5} {}] {}",
                buf.timestamp(),
                record.level(),
                record.target(),
                record.args()
            );
            if is_error_level(record.level()) {
                errors.append(&line);
            }
            writeln!(buf, "{}", line)
        });
    }

    builder
        .try_init()
        .context("Failed to initialize logger")?;
    Ok(())
}

/// Separate file receiving only warnings and errors
struct ErrorLog {
    file: Mutex<File>,
}

impl ErrorLog {
    fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            file: Mutex::new(open_log_file(path)?),
        })
    }

    fn append(&self, line: &str) {
        let mut file = self.file.lock();
        // Nowhere left to report a failure to
        let _ = writeln!(file, "{}", line);
        let _ = file.flush();
    }
}

fn is_error_level(level: Level) -> bool {
    level <= Level::Warn
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
