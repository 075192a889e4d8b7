//! File logging for the CLI.
//!
//! The terminal belongs to the UI, so tracing output goes to
//! `<codex home>/log/codex-cli.log`. `RUST_LOG` overrides the filter.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "codex-cli.log";
pub const DEFAULT_LOG_FILTER: &str = "codex=info";

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Filter from `RUST_LOG`, or [`DEFAULT_LOG_FILTER`].
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber writing to `log_dir`.
///
/// Returns the log path on success. Any failure leaves logging disabled.
pub fn init_file_logging(log_dir: &Path) -> Option<PathBuf> {
    let path = log_dir.join(LOG_FILE_NAME);
    let file = match open_log_file(&path) {
        Ok(file) => file,
        Err(_) => return None,
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "codex starting");
    Some(path)
}
