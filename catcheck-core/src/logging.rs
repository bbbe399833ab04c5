//! Logging configuration using tracing
//!
//! The terminal belongs to the TUI, so logs only go to a daily rolling file.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::Result;

const LOG_ENV: &str = "CATCHECK_LOG";
const LOG_FILE: &str = "catcheck.log";
const DEFAULT_FILTER: &str = "catcheck=info,catcheck_core=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `<data_local_dir>/catcheck/logs/`.
/// Log level is controlled by the `CATCHECK_LOG` environment variable.
///
/// ```bash
/// CATCHECK_LOG=debug catcheck --sheet-id 1AbC
/// ```
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| crate::Error::config(format!("logging already initialized: {e}")))?;

    tracing::info!("catcheck {} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(log_dir)
}

fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("catcheck").join("logs")
}
