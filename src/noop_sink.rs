use crate::record::LogRecord;
use crate::sink::{Sink, SinkError};

/// A sink that simply drops all records.
///
/// Useful for measuring the cost of the logging call path itself without
/// any I/O, and for tests that only care about the return value.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}
