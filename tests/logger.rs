use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use structlog_sink::record::Fields;
use structlog_sink::{kv, value, Context, LogRecord, Logger, Severity, Sink, SinkError, Valuer};

#[derive(Default)]
struct Recording(Mutex<Vec<LogRecord>>);

impl Sink for Recording {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
}

impl Recording {
    fn records(&self) -> Vec<LogRecord> {
        self.0.lock().unwrap().clone()
    }
}

struct Broken;

impl Sink for Broken {
    fn write(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Err(SinkError::Backend("disk full".into()))
    }
}

fn recording(threshold: Severity) -> (Arc<Recording>, Logger<Arc<Recording>>) {
    let sink = Arc::new(Recording::default());
    (sink.clone(), Logger::new(sink, threshold))
}

fn fields(pairs: &[(&str, serde_json::Value)]) -> Option<Fields> {
    Some(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
}

#[test]
fn message_and_fields_are_split() {
    let (sink, logger) = recording(Severity::Debug);
    logger.log(Severity::Info, kv!["message", "hello", "user", "alice"]).unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Severity::Info);
    assert_eq!(records[0].message, "hello");
    assert_eq!(records[0].fields, fields(&[("user", json!("alice"))]));
}

#[test]
fn odd_list_is_padded() {
    let (sink, logger) = recording(Severity::Debug);
    logger.log(Severity::Debug, kv!["x", 1, "y"]).unwrap();

    let records = sink.records();
    assert_eq!(records[0].level, Severity::Debug);
    assert_eq!(records[0].message, "");
    assert_eq!(records[0].fields, fields(&[("x", json!(1)), ("y", json!(""))]));
}

#[test]
fn empty_list_writes_nothing() {
    let (sink, logger) = recording(Severity::Debug);
    assert!(logger.log(Severity::Warn, kv![]).is_ok());
    assert!(sink.records().is_empty());
}

#[test]
fn error_threshold_drops_lower_levels() {
    let (sink, logger) = recording(Severity::Error);
    for level in [Severity::Debug, Severity::Info, Severity::Warn] {
        logger.log(level, kv!["message", "quiet"]).unwrap();
    }
    assert!(sink.records().is_empty());

    logger.log(Severity::Error, kv!["message", "loud"]).unwrap();
    assert_eq!(sink.records().len(), 1);
}

#[test]
fn timestamps_resolve_per_call() {
    let (sink, logger) = recording(Severity::Debug);
    let ts = value::timestamp("%H:%M:%S");

    logger.log(Severity::Info, kv!["at", ts.clone()]).unwrap();
    std::thread::sleep(Duration::from_millis(1100));
    logger.log(Severity::Info, kv!["at", ts]).unwrap();

    let records = sink.records();
    let first = records[0].field("at").cloned().unwrap();
    let second = records[1].field("at").cloned().unwrap();
    assert!(first.is_string());
    assert_ne!(first, second);
}

#[test]
fn sink_errors_pass_through_unchanged() {
    let logger = Logger::new(Broken, Severity::Debug);
    let err = logger.log(Severity::Info, kv!["message", "lost"]).unwrap_err();
    assert!(matches!(err, SinkError::Backend(ref m) if m == "disk full"));

    // Filtered calls never reach the sink, so they cannot fail.
    let strict = Logger::new(Broken, Severity::Error);
    assert!(strict.log(Severity::Info, kv!["message", "skipped"]).is_ok());
}

#[test]
fn context_flows_into_deferred_values() {
    let (sink, logger) = recording(Severity::Debug);
    let logger = logger.with(kv!["trace_id", value::from_context("trace_id")]);

    let ctx = Context::new().with_value("trace_id", "4bf92f35");
    logger.log_ctx(&ctx, Severity::Info, kv!["message", "handled"]).unwrap();
    logger.log(Severity::Info, kv!["message", "no request"]).unwrap();

    let records = sink.records();
    assert_eq!(records[0].field("trace_id"), Some(&json!("4bf92f35")));
    assert_eq!(records[1].field("trace_id"), Some(&json!(null)));
}

#[test]
fn caller_reports_the_logging_call_site() {
    let (sink, logger) = recording(Severity::Debug);
    let logger = logger.with(kv!["caller", value::default_caller()]);

    logger.info("where am i").unwrap();

    let records = sink.records();
    let caller = records[0].field("caller").and_then(|v| v.as_str()).unwrap().to_string();
    assert!(caller.starts_with("tests/logger.rs:"), "unexpected caller {caller}");
    assert!(caller.contains("caller_reports_the_logging_call_site():"), "unexpected caller {caller}");
    let line: u32 = caller.rsplit(':').next().unwrap().parse().unwrap();
    assert!(line > 0);
}

#[test]
#[should_panic(expected = "quota service unavailable")]
fn failing_valuer_propagates_out_of_log() {
    let (_sink, logger) = recording(Severity::Debug);
    let quota = Valuer::new(|_| panic!("quota service unavailable"));
    let _ = logger.log(Severity::Info, kv!["quota", quota]);
}
