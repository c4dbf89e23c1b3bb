//! Logging init: file under the XDG state dir, or graceful fallback to
//! stderr.

use std::fs;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sdt=debug"))
}

/// Initialize structured logging to `~/.local/state/sdt/sdt.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall
/// back to stderr.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sdt")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join("sdt.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("sdt logging initialized at {}", log_file_path.display());
    Ok(())
}

/// Initialize logging to stderr only (no file). Use when `init_logging`
/// fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
