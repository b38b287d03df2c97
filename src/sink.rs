use crate::record::LogRecord;
use std::sync::Arc;

/// Error reported by a [`Sink`]. [`Logger::log`](crate::logger::Logger::log)
/// hands it back to the caller untouched.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("i/o error writing log record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("log channel full, record dropped")]
    ChannelFull,

    #[error("log channel closed")]
    ChannelClosed,

    #[error("log backend error: {0}")]
    Backend(String),
}

/// Synchronous destination for normalized [`LogRecord`]s.
///
/// `write` runs on the caller's thread. Implementations that talk to slow
/// backends should hand the record off (see
/// [`ForwardSink`](crate::forward::ForwardSink)) instead of blocking.
pub trait Sink: Send + Sync {
    /// Persist or forward one record.
    ///
    /// `record.fields` is `None` for a bare message; implementations may
    /// render the two shapes differently.
    fn write(&self, record: &LogRecord) -> Result<(), SinkError>;

    /// Flush any buffered output. Default implementation is a no-op.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        (**self).write(record)
    }

    fn flush(&self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        (**self).write(record)
    }

    fn flush(&self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

impl<'a, S: Sink + ?Sized> Sink for &'a S {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        (**self).write(record)
    }

    fn flush(&self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// Fans each record out to several sinks.
///
/// Every child sees every record even if an earlier one fails; the first
/// error is returned.
#[derive(Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: Arc<dyn Sink>) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for MultiSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.write(record) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv;
    use crate::level::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Sink for Counting {
        fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    impl Sink for Failing {
        fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
            Err(SinkError::Backend("down".into()))
        }
    }

    #[test]
    fn multi_sink_writes_every_child_and_reports_first_error() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let multi = MultiSink::new()
            .with(a.clone())
            .with(Arc::new(Failing))
            .with(b.clone());

        let record = LogRecord::from_keyvals(Severity::Info, kv!["message", "hi"]);
        let err = multi.write(&record).unwrap_err();

        assert!(matches!(err, SinkError::Backend(ref m) if m == "down"));
        assert_eq!(a.0.load(Ordering::SeqCst), 1);
        assert_eq!(b.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_multi_sink_accepts_records() {
        let record = LogRecord::from_keyvals(Severity::Info, kv!["message", "hi"]);
        assert!(MultiSink::new().write(&record).is_ok());
    }
}
