use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prompt_router_core::config::LogSettings;
use prompt_router_core::constants::{env, paths};

const STDERR_FALLBACK: &str = "warn";

/// `<data_local_dir>/prompt-router/logs`
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(paths::CONFIG_DIR)
        .join(paths::LOGS_DIR)
}

/// One log file per day: `prompt_router_YYYYMMDD.log`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}{}.log", paths::LOG_FILE_PREFIX, date.format("%Y%m%d"))
}

/// Filter directive for stderr: `RUST_LOG`, then `LOG_LEVEL`, then `warn`.
pub fn stderr_directive(rust_log: Option<&str>, log_level: Option<&str>) -> String {
    [rust_log, log_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(STDERR_FALLBACK)
        .to_lowercase()
}

/// Open (or create) today's log file for appending.
pub fn open_log_file(dir: &Path, date: NaiveDate) -> Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let path = dir.join(log_file_name(date));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    Ok((file, path))
}

/// Install the global subscriber: a stderr layer plus a plain-text file
/// layer. Returns the log file path when file logging is active.
pub fn init(settings: &LogSettings) -> Result<Option<PathBuf>> {
    let directive = stderr_directive(
        std::env::var("RUST_LOG").ok().as_deref(),
        std::env::var(env::LOG_LEVEL).ok().as_deref(),
    );
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(STDERR_FALLBACK)),
        );

    let dir = settings.dir.clone().unwrap_or_else(default_log_dir);
    let (file_layer, log_path) = match open_log_file(&dir, Local::now().date_naive()) {
        Ok((file, path)) => {
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .with_filter(
                    EnvFilter::try_new(&settings.level)
                        .unwrap_or_else(|_| EnvFilter::new("info")),
                );
            (Some(layer), Some(path))
        }
        Err(e) => {
            eprintln!("warning: file logging disabled: {e:#}");
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to initialise logging")?;

    if let Some(ref path) = log_path {
        tracing::debug!("Logging to {}", path.display());
    }
    Ok(log_path)
}
