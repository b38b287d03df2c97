use crate::forward::ForwardConfig;
use crate::level::{parse_level_or_info, Severity};
use crate::value::DEFAULT_TIMESTAMP_LAYOUT;
use crate::writer::Format;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration consumed by [`build_logger`](crate::init::build_logger).
///
/// **Fields**
/// - `level`: threshold name (`debug`, `info`, `warn`/`warning`, `error`).
///   An unknown name falls back to `info`.
/// - `console`: stream for console output, `None` disables it.
/// - `file`: daily rolling JSON file output.
/// - `alert`: levels forwarded to an alert backend.
/// - `format`: console line format.
/// - `time_format`: chrono layout of the record `time` key.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: String,
    pub console: Option<ConsoleTarget>,
    pub file: Option<FileConfig>,
    pub alert: Option<AlertConfig>,
    pub format: Format,
    pub time_format: String,
}

impl LoggerConfig {
    pub fn threshold(&self) -> Severity {
        parse_level_or_info(&self.level)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            console: Some(ConsoleTarget::Stdout),
            file: None,
            alert: None,
            format: Format::Json,
            time_format: DEFAULT_TIMESTAMP_LAYOUT.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

/// Rolling file output.
///
/// Without `max_size_mb` files roll daily, are named `<file_name>.<date>`
/// inside `directory`, and at most `max_age_days` of them are kept. With
/// `max_size_mb` the active file is `<directory>/<file_name>`; it rolls
/// once it would exceed that size, and rolled files older than
/// `max_age_days` days are removed.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub file_name: String,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: usize,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub(crate) fn default_max_age_days() -> usize {
    7
}

/// Which severities reach the alert backend, and how they are batched.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub levels: Vec<Severity>,
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub max_attempts: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        let forward = ForwardConfig::default();
        Self {
            levels: forward.levels,
            channel_buffer: forward.channel_buffer,
            batch_size: forward.batch_size,
            flush_interval_ms: forward.flush_interval.as_millis() as u64,
            max_attempts: forward.max_attempts,
        }
    }
}

impl AlertConfig {
    pub fn forward_config(&self) -> ForwardConfig {
        ForwardConfig {
            levels: self.levels.clone(),
            channel_buffer: self.channel_buffer,
            batch_size: self.batch_size,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_everything_to_stdout_as_json() {
        let config = LoggerConfig::default();
        assert_eq!(config.threshold(), Severity::Debug);
        assert_eq!(config.console, Some(ConsoleTarget::Stdout));
        assert_eq!(config.format, Format::Json);
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: LoggerConfig = serde_json::from_str(
            r#"{
                "level": "warn",
                "console": "stderr",
                "format": "text",
                "file": { "directory": "/var/log/app", "file_name": "app.log" },
                "alert": { "levels": ["warn", "error"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.threshold(), Severity::Warn);
        assert_eq!(config.console, Some(ConsoleTarget::Stderr));
        assert_eq!(config.format, Format::Text);
        assert_eq!(config.time_format, DEFAULT_TIMESTAMP_LAYOUT);

        let file = config.file.unwrap();
        assert_eq!(file.max_age_days, 7);
        assert_eq!(file.max_size_mb, None);

        let forward = config.alert.unwrap().forward_config();
        assert_eq!(forward.levels, vec![Severity::Warn, Severity::Error]);
        assert_eq!(forward.flush_interval, Duration::from_secs(1));
    }

    #[test]
    fn reads_file_size_cap() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "directory": "logs", "file_name": "app.log", "max_age_days": 2, "max_size_mb": 100 }"#,
        )
        .unwrap();
        assert_eq!(file.max_age_days, 2);
        assert_eq!(file.max_size_mb, Some(100));
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = LoggerConfig {
            level: "verbose".into(),
            ..LoggerConfig::default()
        };
        assert_eq!(config.threshold(), Severity::Info);
    }
}
