use crate::config::{ConsoleTarget, FileConfig, LoggerConfig};
use crate::forward::{AsyncSink, ForwardSink};
use crate::logger::Logger;
use crate::rotating::SizeRotatingFile;
use crate::sink::{MultiSink, Sink};
use crate::writer::{Format, WriterSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Error type returned when building sinks from a [`LoggerConfig`].
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("failed to open log file: {0}")]
    File(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("daily file output configured but the `file` feature is not enabled")]
    FileFeatureDisabled,

    #[error("alerting configured without an alert backend")]
    AlertBackendMissing,
}

/// Build the sink set described by `config`.
///
/// **Parameters**
/// - `config`: destinations and formats.
/// - `alert_backend`: receiver for alert-level records. Required when
///   `config.alert` is set; when given without an `alert` section the
///   [`AlertConfig::default`](crate::config::AlertConfig::default) levels apply.
///
/// **Returns**
/// - The fan-out sink, plus the handle of the alert delivery task when
///   alerting is active. Alerting spawns onto the current tokio runtime.
pub fn build_sink(
    config: &LoggerConfig,
    alert_backend: Option<Arc<dyn AsyncSink>>,
) -> Result<(MultiSink, Option<JoinHandle<()>>), BuildError> {
    let mut sink = MultiSink::new();

    match config.console {
        Some(ConsoleTarget::Stdout) => {
            sink.push(Arc::new(WriterSink::stdout(config.format, config.time_format.clone())));
        }
        Some(ConsoleTarget::Stderr) => {
            sink.push(Arc::new(WriterSink::stderr(config.format, config.time_format.clone())));
        }
        None => {}
    }

    if let Some(file) = &config.file {
        sink.push(file_sink(file, &config.time_format)?);
    }

    let alert_task = match (&config.alert, alert_backend) {
        (Some(_), None) => return Err(BuildError::AlertBackendMissing),
        (alert, Some(backend)) => {
            let forward = alert.clone().unwrap_or_default().forward_config();
            let (forward_sink, handle) = ForwardSink::new(backend, forward);
            sink.push(Arc::new(forward_sink));
            Some(handle)
        }
        (None, None) => None,
    };

    Ok((sink, alert_task))
}

const BYTES_PER_MB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 86_400;

// Files are always JSON so they stay machine readable.
fn file_sink(file: &FileConfig, time_format: &str) -> Result<Arc<dyn Sink>, BuildError> {
    if let Some(max_size_mb) = file.max_size_mb {
        let writer = SizeRotatingFile::new(
            &file.directory,
            file.file_name.as_str(),
            max_size_mb.saturating_mul(BYTES_PER_MB),
            Duration::from_secs(file.max_age_days as u64 * SECS_PER_DAY),
        )
        .map_err(|e| BuildError::File(Box::new(e)))?;
        return Ok(Arc::new(WriterSink::new(writer, Format::Json, time_format)));
    }

    #[cfg(feature = "file")]
    {
        use tracing_appender::rolling::{RollingFileAppender, Rotation};

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(file.file_name.as_str())
            .max_log_files(file.max_age_days.max(1))
            .build(&file.directory)
            .map_err(|e| BuildError::File(Box::new(e)))?;
        Ok(Arc::new(WriterSink::new(appender, Format::Json, time_format)))
    }

    #[cfg(not(feature = "file"))]
    {
        Err(BuildError::FileFeatureDisabled)
    }
}

/// Build a [`Logger`] over [`build_sink`] at the configured threshold.
///
/// This replaces a process-wide default logger: the caller owns the
/// returned logger and passes it (or clones of it) where logging happens.
pub fn build_logger(
    config: &LoggerConfig,
    alert_backend: Option<Arc<dyn AsyncSink>>,
) -> Result<(Logger<MultiSink>, Option<JoinHandle<()>>), BuildError> {
    let (sink, alert_task) = build_sink(config, alert_backend)?;
    tracing::debug!(
        threshold = %config.threshold(),
        destinations = sink.len(),
        alerting = alert_task.is_some(),
        "logger built"
    );
    Ok((Logger::new(sink, config.threshold()), alert_task))
}

/// Flush every destination of `logger`, e.g. before process exit.
pub fn shutdown<S: Sink>(logger: &Logger<S>) {
    if let Err(e) = logger.flush() {
        tracing::warn!(error = %e, "failed to flush log sinks");
    }
}
