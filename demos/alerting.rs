use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use structlog_sink::config::{AlertConfig, LoggerConfig};
use structlog_sink::forward::AsyncSink;
use structlog_sink::init::build_logger;
use structlog_sink::{kv, LogRecord, Severity};

/// Example of plugging in an alerting backend by implementing `AsyncSink`.
/// A real one would call a paging or error tracking service here.
struct PrintPager;

#[async_trait]
impl AsyncSink for PrintPager {
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        println!("[pager] {}: {}", record.level, record.message);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = LoggerConfig {
        alert: Some(AlertConfig {
            levels: vec![Severity::Warn, Severity::Error],
            ..AlertConfig::default()
        }),
        ..LoggerConfig::default()
    };

    let (logger, alert_task) = build_logger(&config, Some(Arc::new(PrintPager)))?;

    logger.info("alerting example started")?;
    logger.log(Severity::Error, kv!["message", "payment provider unreachable", "provider", "acme"])?;

    // Dropping the logger closes the alert channel; wait for delivery.
    drop(logger);
    if let Some(task) = alert_task {
        task.await?;
    }
    Ok(())
}
