//! Structured logging and tracing for Hestia
//!
//! Console and daily-rotated file output built on `tracing-subscriber`, plus a
//! small component-tagged logger used by the service and storage layers.

use crate::config::LoggingConfig;
use crate::error::{HestiaError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod structured;

pub use level::{min_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging system based on configuration
///
/// Only the first call installs a subscriber; later calls return the result of
/// that first attempt.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        if let Err(e) = install_subscriber(config) {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(HestiaError::config(err.clone()));
    }
    Ok(())
}

fn install_subscriber(config: &LoggingConfig) -> Result<()> {
    let base_level = parse_log_level(&config.level)?;
    let console_level = override_level(config.console_level.as_deref(), base_level);
    let file_level = override_level(config.file_level.as_deref(), base_level);

    let most_verbose = min_level(console_level, file_level);
    let filter = build_env_filter(most_verbose);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.console_output {
        layers.push(fmt_layer(std::io::stdout, config.json_format, console_level));
    }

    if let Some(dir) = config.file.as_deref()
        && !should_use_console_only()
    {
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix("hestia")
            .filename_suffix("log")
            .max_log_files(config.backup_count.max(1) as usize)
            .build(Path::new(dir))
            .map_err(|e| {
                HestiaError::io(format!("Failed to create log file appender: {e}"))
            })?;
        let (writer, guard) = non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        layers.push(fmt_layer(writer, config.json_format, file_level));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| HestiaError::config(format!("Failed to install subscriber: {e}")))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, file: {:?}",
        console_level, file_level, config.file
    );
    Ok(())
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, json: bool, level: Level) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json {
        base.json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn override_level(value: Option<&str>, fallback: Level) -> Level {
    value
        .and_then(|s| parse_log_level(s).ok())
        .unwrap_or(fallback)
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("hestia={level}").into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("HESTIA_DISABLE_FILE_LOG").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_level() {
        assert_eq!(override_level(Some("debug"), Level::INFO), Level::DEBUG);
        assert_eq!(override_level(Some("nonsense"), Level::WARN), Level::WARN);
        assert_eq!(override_level(None, Level::ERROR), Level::ERROR);
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        let config = LoggingConfig::default();
        let first = init_logging(&config).is_ok();
        let second = init_logging(&config).is_ok();
        assert_eq!(first, second);
    }
}
