//! Logging setup: console output for development plus rotating JSON log
//! files for after-the-fact debugging of flaky upstreams.

use tracing_appender::non_blocking;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration options.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for rotated log files.
    pub log_dir: String,
    /// Level filter (e.g. "info", "info,dash_aggregator=debug").
    pub level_filter: String,
    pub rotation: LogRotation,
    /// Include timestamps in console output.
    pub console_timestamps: bool,
    /// Structured JSON format for file logs.
    pub file_json_format: bool,
}

#[derive(Debug, Clone)]
pub enum LogRotation {
    Daily,
    Hourly,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            level_filter: "info,dash_aggregator=info".to_string(),
            rotation: LogRotation::Daily,
            console_timestamps: true,
            file_json_format: true,
        }
    }
}

/// Initialize dual output logging (console + rotating files).
///
/// Returns a guard that must be kept alive for the process lifetime so
/// the background writer thread keeps flushing.
pub fn init_dual_logging(
    config: LoggingConfig,
) -> Result<non_blocking::WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level_filter));
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level_filter));

    let file_appender = match config.rotation {
        LogRotation::Daily => {
            tracing_appender::rolling::daily(&config.log_dir, "dash_aggregator.log")
        }
        LogRotation::Hourly => {
            tracing_appender::rolling::hourly(&config.log_dir, "dash_aggregator.log")
        }
    };
    let (file_writer, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_level(true)
        .with_target(true)
        .with_timer(if config.console_timestamps {
            ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string())
        } else {
            ChronoUtc::new("".to_string())
        })
        .with_filter(console_filter);

    let file_layer = if config.file_json_format {
        fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_level(true)
            .with_target(true)
            .with_timer(ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string()))
            .with_filter(file_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_level(true)
            .with_target(true)
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string()))
            .with_filter(file_filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = %config.log_dir,
        rotation = ?config.rotation,
        "dual logging initialized (console + rotating files)"
    );

    Ok(guard)
}

/// Console-only logging for tests and minimal embedding hosts.
pub fn init_simple_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,dash_aggregator=info")
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.level_filter, "info,dash_aggregator=info");
        assert!(matches!(config.rotation, LogRotation::Daily));
        assert!(config.file_json_format);
    }

    #[test]
    fn test_dual_logging_creates_log_dir() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");
        let config = LoggingConfig {
            log_dir: log_dir.to_str().unwrap().to_string(),
            ..LoggingConfig::default()
        };

        // A second global subscriber registration fails under `cargo test`;
        // only the directory side effect is asserted here.
        let _ = init_dual_logging(config);
        assert!(log_dir.is_dir());
    }
}
