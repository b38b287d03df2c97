//! Environment variable names read by [`LoggerConfig::from_env`].
//!
//! These are purely helpers; the logger and sinks never touch the
//! environment themselves.

use crate::config::{default_max_age_days, ConsoleTarget, FileConfig, LoggerConfig};
use crate::writer::Format;

/// Threshold name, e.g. `info`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Console line format: `json` or `text`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Console stream: `stdout`, `stderr` or `off`.
pub const LOG_CONSOLE_ENV: &str = "LOG_CONSOLE";

/// Directory of the rolling log file. File output is enabled when set.
pub const LOG_FILE_DIR_ENV: &str = "LOG_FILE_DIR";

/// Base name of the rolling log file.
pub const LOG_FILE_NAME_ENV: &str = "LOG_FILE_NAME";

/// Number of daily files to keep.
pub const LOG_FILE_MAX_AGE_DAYS_ENV: &str = "LOG_FILE_MAX_AGE_DAYS";

/// Size cap of the log file in megabytes; enables size-based rolling.
pub const LOG_FILE_MAX_SIZE_MB_ENV: &str = "LOG_FILE_MAX_SIZE_MB";

/// chrono layout of the record `time` key.
pub const LOG_TIME_FORMAT_ENV: &str = "LOG_TIME_FORMAT";

impl LoggerConfig {
    /// Build a config from the process environment, starting from
    /// [`LoggerConfig::default`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or unparsable entries
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = LoggerConfig::default();

        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.level = level;
        }
        match lookup(LOG_FORMAT_ENV).map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("text") => config.format = Format::Text,
            Some("json") => config.format = Format::Json,
            _ => {}
        }
        match lookup(LOG_CONSOLE_ENV).map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("stdout") => config.console = Some(ConsoleTarget::Stdout),
            Some("stderr") => config.console = Some(ConsoleTarget::Stderr),
            Some("off") | Some("none") => config.console = None,
            _ => {}
        }
        if let Some(directory) = lookup(LOG_FILE_DIR_ENV) {
            config.file = Some(FileConfig {
                directory: directory.into(),
                file_name: lookup(LOG_FILE_NAME_ENV).unwrap_or_else(|| "app.log".to_string()),
                max_age_days: lookup(LOG_FILE_MAX_AGE_DAYS_ENV)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_age_days),
                max_size_mb: lookup(LOG_FILE_MAX_SIZE_MB_ENV).and_then(|s| s.parse().ok()),
            });
        }
        if let Some(time_format) = lookup(LOG_TIME_FORMAT_ENV) {
            config.time_format = time_format;
        }

        config
    }
}
