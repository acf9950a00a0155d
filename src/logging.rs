use crate::constants::{APP_NAME, LOG_ENV, LOG_FILE};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_NAME)
        .join(LOG_FILE)
}

/// File-only logging: the terminal belongs to the TUI.
/// The returned guard must be held until exit to flush the appender.
pub fn init_logger(log_file: &Path) -> impl Drop {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .map_or_else(|| LOG_FILE.into(), std::ffi::OsStr::to_os_string);

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter_layer)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "logging to {}", log_file.display());

    guard
}
