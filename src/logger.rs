use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger, LoggerBuilder};

use crate::config::{Config, Log, LogLevel};

const KEPT_LOG_FILES: usize = 30;

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Critical => Level::Critical,
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

/// Where logs go when `[log]` has no `location`.
pub fn default_log_location() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("Postfolio")
        .join("log")
        .join("postfolio.log")
}

// Warnings and errors go to stderr, the rest to stdout
fn add_console_sinks(builder: &mut LoggerBuilder) -> spdlog::Result<()> {
    let stdout = StdStreamSink::builder()
        .std_stream(StdStream::Stdout)
        .level_filter(LevelFilter::MoreVerbose(Level::Warn))
        .build()?;
    let stderr = StdStreamSink::builder()
        .std_stream(StdStream::Stderr)
        .level_filter(LevelFilter::MoreSevereEqual(Level::Warn))
        .build()?;

    builder.sink(Arc::new(stdout)).sink(Arc::new(stderr));
    Ok(())
}

fn build_logger(log: &Log) -> spdlog::Result<Logger> {
    let location = log.location.clone().unwrap_or_else(default_log_location);
    let file_sink = RotatingFileSink::builder()
        .base_path(location)
        .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
        .max_files(KEPT_LOG_FILES)
        .rotate_on_open(false)
        .build()?;

    let mut builder = Logger::builder();
    builder.sink(Arc::new(file_sink));
    if log.log_to_console {
        add_console_sinks(&mut builder)?;
    }

    let logger = builder.build()?;
    logger.set_level_filter(LevelFilter::MoreSevereEqual(log.level.into()));
    logger.set_flush_level_filter(LevelFilter::MoreSevereEqual(Level::Info));
    Ok(logger)
}

/// Replaces the default console logger when the configuration has a `[log]`
/// section. Without it nothing changes.
pub fn configure_logger(config: &Config) -> spdlog::Result<()> {
    let Some(ref log) = config.log else {
        return Ok(());
    };

    let logger = Arc::new(build_logger(log)?);
    logger.set_flush_period(Some(Duration::from_secs(2)));
    spdlog::set_default_logger(logger);
    Ok(())
}
