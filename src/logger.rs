use crate::context::Context;
use crate::level::Severity;
use crate::record::{LogRecord, MESSAGE_KEY};
use crate::sink::{Sink, SinkError};
use crate::value::{self, Value};
use std::sync::Arc;

/// Leveled key/value logger over a [`Sink`].
///
/// The threshold is fixed at construction. Prefix key/values added with
/// [`Logger::with`] are prepended to every call, which is how reusable
/// deferred fields such as a timestamp or the call site are attached once:
///
/// ```
/// use structlog_sink::{kv, logger::Logger, noop_sink::NoopSink, level::Severity, value};
///
/// let logger = Logger::new(NoopSink, Severity::Info)
///     .with(kv!["ts", value::default_timestamp(), "caller", value::default_caller()]);
/// logger.log(Severity::Info, kv!["message", "ready", "port", 8080]).unwrap();
/// ```
#[derive(Clone)]
pub struct Logger<S> {
    sink: S,
    threshold: Severity,
    prefix: Arc<[Value]>,
    prefix_deferred: bool,
}

impl<S: Sink> Logger<S> {
    pub fn new(sink: S, threshold: Severity) -> Self {
        Logger {
            sink,
            threshold,
            prefix: Arc::from(Vec::new()),
            prefix_deferred: false,
        }
    }

    /// Return a logger that prepends `keyvals` to every record.
    ///
    /// An odd-length prefix is padded so it cannot shift the pairing of
    /// per-call key/values.
    pub fn with(self, keyvals: Vec<Value>) -> Self {
        let mut prefix = self.prefix.to_vec();
        prefix.extend(keyvals);
        if prefix.len() % 2 != 0 {
            prefix.push(Value::empty());
        }
        let prefix_deferred = value::contains_deferred(&prefix);
        Logger {
            sink: self.sink,
            threshold: self.threshold,
            prefix: Arc::from(prefix),
            prefix_deferred,
        }
    }

    pub fn enabled(&self, level: Severity) -> bool {
        level.enabled_at(self.threshold)
    }

    /// Emit one record with an empty request context.
    pub fn log(&self, level: Severity, keyvals: Vec<Value>) -> Result<(), SinkError> {
        self.log_ctx(&Context::default(), level, keyvals)
    }

    /// Emit one record, resolving deferred values against `ctx`.
    ///
    /// Returns immediately when `level` is below the threshold or
    /// `keyvals` is empty. Otherwise exactly one [`Sink::write`] happens
    /// and its result is returned as is.
    pub fn log_ctx(&self, ctx: &Context, level: Severity, keyvals: Vec<Value>) -> Result<(), SinkError> {
        if !self.enabled(level) || keyvals.is_empty() {
            return Ok(());
        }

        let mut keyvals = if self.prefix.is_empty() {
            keyvals
        } else {
            let mut all = Vec::with_capacity(self.prefix.len() + keyvals.len());
            all.extend(self.prefix.iter().cloned());
            all.extend(keyvals);
            all
        };

        if self.prefix_deferred || value::contains_deferred(&keyvals) {
            value::resolve(ctx, &mut keyvals);
        }

        let record = LogRecord::from_keyvals(level, keyvals);
        self.sink.write(&record)
    }

    /// Emit with a raw numeric level code; unknown codes log at debug.
    pub fn log_code(&self, code: i32, keyvals: Vec<Value>) -> Result<(), SinkError> {
        self.log(Severity::from_code(code), keyvals)
    }

    pub fn debug(&self, msg: impl Into<String>) -> Result<(), SinkError> {
        self.message(Severity::Debug, msg.into())
    }

    pub fn info(&self, msg: impl Into<String>) -> Result<(), SinkError> {
        self.message(Severity::Info, msg.into())
    }

    pub fn warn(&self, msg: impl Into<String>) -> Result<(), SinkError> {
        self.message(Severity::Warn, msg.into())
    }

    pub fn error(&self, msg: impl Into<String>) -> Result<(), SinkError> {
        self.message(Severity::Error, msg.into())
    }

    pub fn debugw(&self, keyvals: Vec<Value>) -> Result<(), SinkError> {
        self.log(Severity::Debug, keyvals)
    }

    pub fn infow(&self, keyvals: Vec<Value>) -> Result<(), SinkError> {
        self.log(Severity::Info, keyvals)
    }

    pub fn warnw(&self, keyvals: Vec<Value>) -> Result<(), SinkError> {
        self.log(Severity::Warn, keyvals)
    }

    pub fn errorw(&self, keyvals: Vec<Value>) -> Result<(), SinkError> {
        self.log(Severity::Error, keyvals)
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        self.sink.flush()
    }

    fn message(&self, level: Severity, msg: String) -> Result<(), SinkError> {
        if !self.enabled(level) {
            return Ok(());
        }
        self.log(level, vec![Value::from(MESSAGE_KEY), Value::from(msg)])
    }
}
