use structlog_sink::config::LoggerConfig;
use structlog_sink::init::{build_logger, shutdown};
use structlog_sink::{kv, value, Context, Severity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // LOG_LEVEL, LOG_FORMAT, LOG_FILE_DIR etc. override the defaults.
    let config = LoggerConfig::from_env();
    let (logger, _) = build_logger(&config, None)?;

    let logger = logger.with(kv![
        "ts", value::default_timestamp(),
        "caller", value::default_caller(),
        "trace_id", value::from_context("trace_id"),
    ]);

    logger.info("service starting")?;

    let ctx = Context::new().with_value("trace_id", "4bf92f3577b34da6");
    logger.log_ctx(&ctx, Severity::Info, kv!["message", "request handled", "status", 200, "ms", 12.5])?;
    logger.log(Severity::Error, kv!["stack", "panicked at src/db.rs:10", "query", "SELECT 1"])?;
    logger.debugw(kv!["cache", "miss", "key"])?;

    shutdown(&logger);
    Ok(())
}
