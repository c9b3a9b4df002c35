//! Logging init: size-rotated file under `<root>/logs`, or graceful fallback to stderr.

mod rotate;

pub use rotate::{RotatingFile, BACKUP_COUNT, MAX_LOG_BYTES};

use anyhow::Result;
use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Writer handed to the subscriber per event: the shared rotating file, or
/// stderr if the file lock is poisoned.
pub enum FileOrStderr {
    File(Arc<Mutex<RotatingFile>>),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => match f.lock() {
                Ok(mut file) => file.write(buf),
                Err(_) => io::stderr().lock().write(buf),
            },
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => match f.lock() {
                Ok(mut file) => file.flush(),
                Err(_) => io::stderr().lock().flush(),
            },
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct RotatingMakeWriter(Arc<Mutex<RotatingFile>>);

impl<'a> MakeWriter<'a> for RotatingMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        if self.0.is_poisoned() {
            FileOrStderr::Stderr
        } else {
            FileOrStderr::File(Arc::clone(&self.0))
        }
    }
}

/// `<root>/logs/<YYYY-MM-DD>/<YYYYMMDDHHMM>.log` for the given start time.
pub fn log_file_path(root: &Path, started: DateTime<Local>) -> PathBuf {
    root.join("logs")
        .join(started.format("%Y-%m-%d").to_string())
        .join(format!("{}.log", started.format("%Y%m%d%H%M")))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize structured logging to a per-run file under `<root>/logs`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging(root: &Path) -> Result<PathBuf> {
    let log_file_path = log_file_path(root, Local::now());
    let file = RotatingFile::open(&log_file_path, MAX_LOG_BYTES, BACKUP_COUNT)?;
    let writer = BoxMakeWriter::new(RotatingMakeWriter(Arc::new(Mutex::new(file))));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {}", e))?;

    tracing::info!("feedframe logging initialized at {}", log_file_path.display());
    Ok(log_file_path)
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
