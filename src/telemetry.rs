// src/telemetry.rs

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Config, error::AppError};

/// Installs the global subscriber: stdout plus a daily-rolling file under `LOG_DIR`.
///
/// Keep the returned guard alive for the life of the process or buffered
/// file output is lost.
pub fn init(config: &Config) -> Result<WorkerGuard, AppError> {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "labqms.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_new(&config.rust_log)
        .map_err(|e| AppError::Config(format!("invalid RUST_LOG '{}': {}", config.rust_log, e)))?;
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("tracing already initialised: {}", e)))?;

    Ok(guard)
}
