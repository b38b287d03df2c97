use crate::record::LogRecord;
use crate::sink::{Sink, SinkError};
use crate::value::{layout_is_valid, DEFAULT_TIMESTAMP_LAYOUT};
use serde::Deserialize;
use std::io::Write;
use std::sync::Mutex;

const TIME_KEY: &str = "time";
const LEVEL_KEY: &str = "level";
const MSG_KEY: &str = "msg";

/// Line format of a [`WriterSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One JSON object per line with fields flattened at top level.
    #[default]
    Json,
    /// `key=value` pairs, for humans reading a console.
    Text,
}

/// Sink rendering each record as one line onto an [`std::io::Write`].
///
/// Record fields named `time`, `level` or `msg` are written as
/// `fields.time` etc. so they never clobber the record's own keys.
pub struct WriterSink<W> {
    writer: Mutex<W>,
    format: Format,
    time_format: String,
}

impl<W: Write + Send> WriterSink<W> {
    /// `time_format` is a chrono strftime layout; an invalid one falls back
    /// to the default millisecond layout.
    pub fn new(writer: W, format: Format, time_format: impl Into<String>) -> Self {
        let mut time_format = time_format.into();
        if !layout_is_valid(&time_format) {
            tracing::warn!(time_format = %time_format, "invalid time format, using default");
            time_format = DEFAULT_TIMESTAMP_LAYOUT.to_string();
        }
        WriterSink {
            writer: Mutex::new(writer),
            format,
            time_format,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Render a record as a single line, without the trailing newline.
    pub fn render(&self, record: &LogRecord) -> Result<String, SinkError> {
        let time = record.timestamp.format(&self.time_format).to_string();
        match self.format {
            Format::Json => render_json(record, time),
            Format::Text => Ok(render_text(record, &time)),
        }
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout(format: Format, time_format: impl Into<String>) -> Self {
        WriterSink::new(std::io::stdout(), format, time_format)
    }
}

impl WriterSink<std::io::Stderr> {
    pub fn stderr(format: Format, time_format: impl Into<String>) -> Self {
        WriterSink::new(std::io::stderr(), format, time_format)
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut line = self.render(record)?;
        line.push('\n');
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.flush()?;
        Ok(())
    }
}

fn field_key(key: &str) -> String {
    match key {
        TIME_KEY | LEVEL_KEY | MSG_KEY => format!("fields.{}", key),
        _ => key.to_string(),
    }
}

fn render_json(record: &LogRecord, time: String) -> Result<String, SinkError> {
    let mut obj = serde_json::Map::new();
    if let Some(fields) = &record.fields {
        for (key, value) in fields {
            obj.insert(field_key(key), value.clone());
        }
    }
    obj.insert(TIME_KEY.to_string(), serde_json::Value::String(time));
    obj.insert(LEVEL_KEY.to_string(), serde_json::Value::String(record.level.to_string()));
    obj.insert(MSG_KEY.to_string(), serde_json::Value::String(record.message.clone()));
    Ok(serde_json::to_string(&obj)?)
}

fn render_text(record: &LogRecord, time: &str) -> String {
    let mut line = format!(
        "{}={} {}={} {}={}",
        TIME_KEY,
        quote(time),
        LEVEL_KEY,
        record.level,
        MSG_KEY,
        serde_json::Value::String(record.message.clone()),
    );
    if let Some(fields) = &record.fields {
        for (key, value) in fields {
            let rendered = match value {
                serde_json::Value::String(s) => quote(s),
                other => other.to_string(),
            };
            line.push(' ');
            line.push_str(&field_key(key));
            line.push('=');
            line.push_str(&rendered);
        }
    }
    line
}

fn quote(s: &str) -> String {
    let bare = !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '@' | '^' | '+' | ':'));
    if bare {
        s.to_string()
    } else {
        serde_json::Value::String(s.to_string()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv;
    use crate::level::Severity;
    use serde_json::json;

    fn written(format: Format, record: &LogRecord) -> String {
        let sink = WriterSink::new(Vec::new(), format, "%H:%M:%S");
        sink.write(record).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn json_lines_flatten_fields() {
        let record = LogRecord::from_keyvals(Severity::Info, kv!["message", "hello", "user", "alice"]);
        let out = written(Format::Json, &record);
        assert!(out.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(parsed["msg"], json!("hello"));
        assert_eq!(parsed["level"], json!("info"));
        assert_eq!(parsed["user"], json!("alice"));
        assert_eq!(parsed["time"].as_str().map(str::len), Some(8));
    }

    #[test]
    fn clashing_field_names_are_prefixed() {
        let record = LogRecord::from_keyvals(Severity::Warn, kv!["level", "custom", "time", 3]);
        let parsed: serde_json::Value = serde_json::from_str(written(Format::Json, &record).trim_end()).unwrap();
        assert_eq!(parsed["level"], json!("warning"));
        assert_eq!(parsed["fields.level"], json!("custom"));
        assert_eq!(parsed["fields.time"], json!(3));
        assert_eq!(parsed["msg"], json!(""));
    }

    #[test]
    fn text_lines_quote_when_needed() {
        let record = LogRecord::from_keyvals(
            Severity::Error,
            kv!["message", "disk full", "path", "/var/log", "note", "two words", "n", 3],
        );
        let out = written(Format::Text, &record);
        assert!(out.contains("level=error msg=\"disk full\""));
        assert!(out.contains("path=/var/log"));
        assert!(out.contains("note=\"two words\""));
        assert!(out.contains("n=3"));
    }

    #[test]
    fn invalid_time_format_falls_back() {
        let sink = WriterSink::new(Vec::new(), Format::Json, "%Q");
        assert_eq!(sink.time_format, DEFAULT_TIMESTAMP_LAYOUT);
    }
}
