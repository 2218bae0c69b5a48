//! Logging system for dotkit.
//!
//! All log output goes to stderr (and optionally a file). Stdout is reserved
//! for command output and for hook output relayed by the router.

use dotkit_types::config::{LogConfig, LogFormat};
use dotkit_types::{DotkitError, LogLevel, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Build the filter: `DOTKIT_LOG` wins, then the override, then the config level.
fn build_filter(config: &LogConfig, level_override: Option<LogLevel>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(crate::config::ENV_LOG) {
        return filter;
    }

    let level = level_override.unwrap_or(config.level);
    EnvFilter::new(format!("dotkit={0},dotkit_kit={0},dotkit_core={0}", level.as_filter()))
}

/// Initialize logging from configuration.
///
/// Returns a guard that must be held for the life of the process when a log
/// file is configured; dropping it flushes and closes the file writer.
pub fn init(config: &LogConfig, level_override: Option<LogLevel>) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config, level_override);

    let stderr_layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                DotkitError::Config(format!("Log file path has no file name: {}", path.display()))
            })?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DotkitError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
