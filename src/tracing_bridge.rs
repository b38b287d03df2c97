//! Two-way glue between this crate and the `tracing` ecosystem.
//!
//! [`TracingSink`] re-emits records as `tracing` events, and
//! [`KeyvalLayer`] turns `tracing` events into key/value log calls.
//! Events whose target belongs to this crate are never captured by the
//! layer, so the two can share one subscriber without feeding back.

use crate::caller::{function_name, shorten_path, CallSite, CALL_SITE_KEY};
use crate::context::Context as LogContext;
use crate::level::Severity;
use crate::logger::Logger;
use crate::record::{LogRecord, MESSAGE_KEY};
use crate::sink::{Sink, SinkError};
use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::path::Path;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

const OWN_TARGET: &str = "structlog_sink";

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// The event's own location. `tracing` records no function name, so the
/// innermost module stands in for it.
fn event_call_site(meta: &Metadata<'_>) -> Option<CallSite> {
    Some(CallSite {
        file: shorten_path(Path::new(meta.file()?)),
        function: meta.module_path().map(function_name).unwrap_or_default().to_string(),
        line: meta.line()?,
    })
}

/// [`Sink`] that forwards each record to the current `tracing` subscriber.
///
/// Fields are attached as a single JSON string field named `fields`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        let fields = match &record.fields {
            Some(fields) => Some(serde_json::to_string(fields)?),
            None => None,
        };
        let fields = fields.as_deref();
        let msg = record.message.as_str();

        match record.level {
            Severity::Error => tracing::error!(target: "structlog_sink::record", fields, "{msg}"),
            Severity::Warn => tracing::warn!(target: "structlog_sink::record", fields, "{msg}"),
            Severity::Info => tracing::info!(target: "structlog_sink::record", fields, "{msg}"),
            Severity::Debug => tracing::debug!(target: "structlog_sink::record", fields, "{msg}"),
        }
        Ok(())
    }
}

/// `tracing_subscriber` layer feeding every event into a [`Logger`].
///
/// The event message becomes the `message` key and each recorded field a
/// key/value pair, so `tracing::warn!(user = "alice", "denied")` is logged
/// like `kv!["message", "denied", "user", "alice"]` at [`Severity::Warn`].
pub struct KeyvalLayer<S> {
    logger: Logger<S>,
    /// Sink errors seen while logging events; the layer cannot return them.
    pub failed_events: Arc<AtomicU64>,
}

impl<S: Sink> KeyvalLayer<S> {
    pub fn new(logger: Logger<S>) -> Self {
        KeyvalLayer {
            logger,
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<S, Sub> Layer<Sub> for KeyvalLayer<S>
where
    S: Sink + 'static,
    Sub: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, Sub>) {
        let meta = event.metadata();
        if is_own_target(meta.target()) {
            return;
        }
        let level = Severity::from_tracing(meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut keyvals = Vec::with_capacity(visitor.pairs.len() + 2);
        if let Some(message) = visitor.message {
            keyvals.push(Value::from(MESSAGE_KEY));
            keyvals.push(Value::from(message));
        }
        keyvals.extend(visitor.pairs);

        let ctx = match event_call_site(meta) {
            Some(site) => LogContext::new().with_value(CALL_SITE_KEY, site.to_string()),
            None => LogContext::new(),
        };
        if self.logger.log_ctx(&ctx, level, keyvals).is_err() {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    pairs: Vec<Value>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        self.pairs.push(Value::from(field.name()));
        self.pairs.push(value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_KEY {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == MESSAGE_KEY {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::from(format!("{:?}", value)));
        }
    }
}
