use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
///
/// Variants are ordered from most verbose to most severe, so a threshold
/// comparison is a plain `>=`: a logger configured at [`Severity::Error`]
/// drops `Debug`, `Info` and `Warn` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
    ];

    /// Map a raw numeric level code onto a severity.
    ///
    /// Codes follow the usual `-1 = debug, 0 = info, 1 = warn, 2 = error`
    /// scale. Anything else maps to [`Severity::Debug`] so no record is
    /// lost to an unmapped level.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Severity::Info,
            1 => Severity::Warn,
            2 => Severity::Error,
            _ => Severity::Debug,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Severity::Debug => -1,
            Severity::Info => 0,
            Severity::Warn => 1,
            Severity::Error => 2,
        }
    }

    /// Whether a record at `self` passes a logger configured at `threshold`.
    pub fn enabled_at(self, threshold: Severity) -> bool {
        self >= threshold
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
        }
    }

    /// `TRACE` has no counterpart and folds into `Debug`.
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Debug
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("not a valid log level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Parse a level name, falling back to [`Severity::Info`] when invalid.
pub fn parse_level_or_info(s: &str) -> Severity {
    s.parse().unwrap_or(Severity::Info)
}
