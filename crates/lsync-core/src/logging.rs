//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter
pub const LOG_ENV_VAR: &str = "LSYNC_LOG";

/// Filter used when `LSYNC_LOG` is unset or invalid: info for our crates,
/// warn for dependencies
pub const DEFAULT_FILTER: &str =
    "launch_sync=info,lsync_core=info,lsync_cmake=info,lsync_app=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/launch-sync/logs/`
/// Log level is controlled by `LSYNC_LOG` environment variable.
///
/// # Examples
/// ```bash
/// LSYNC_LOG=debug lsync watch
/// LSYNC_LOG=lsync_core=trace lsync sync
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "lsync.log");

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| crate::Error::config(format!("Failed to install logger: {}", e)))?;

    tracing::info!(
        "launch-sync {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("launch-sync").join("logs"))
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    Ok(dir.join("lsync.log"))
}
