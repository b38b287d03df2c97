use std::time::Instant;

use structlog_sink::noop_sink::NoopSink;
use structlog_sink::{kv, value, Logger, Severity};

fn main() {
    let n: u64 = 100_000;

    // Filtered calls: the threshold check returns before any work.
    let logger = Logger::new(NoopSink, Severity::Error);
    let start = Instant::now();
    for i in 0..n {
        let _ = logger.log(Severity::Debug, kv!["message", "filtered", "iteration", i]);
    }
    report("filtered debug", n, start);

    // Emitted calls with a deferred timestamp resolved per record.
    let logger = Logger::new(NoopSink, Severity::Debug).with(kv!["ts", value::default_timestamp()]);
    let start = Instant::now();
    for i in 0..n {
        let _ = logger.log(Severity::Info, kv!["message", "emitted", "iteration", i]);
    }
    report("emitted info", n, start);
}

fn report(label: &str, n: u64, start: Instant) {
    let elapsed = start.elapsed();
    println!(
        "{}: {} calls in {:?} (~{:.0} calls/s)",
        label,
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
