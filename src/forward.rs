use crate::level::Severity;
use crate::record::LogRecord;
use crate::sink::{Sink, SinkError};
use async_trait::async_trait;
use std::error::Error;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Asynchronous backend that receives records forwarded by a [`ForwardSink`],
/// e.g. an alerting service or a remote log store.
#[async_trait]
pub trait AsyncSink: Send + Sync {
    /// Deliver a single record.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the record.
    /// - `Err(..)` on any transport failure. The forwarder treats this as
    ///   transient and retries the batch with backoff.
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered records. Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Tuning for a [`ForwardSink`].
///
/// **Fields**
/// - `levels`: severities that are forwarded; everything else is ignored.
/// - `channel_buffer`: records queued before new ones are rejected.
/// - `batch_size`: records delivered per batch.
/// - `flush_interval`: longest wait before a partial batch is delivered.
/// - `max_attempts`: delivery attempts per batch before it is dropped.
#[derive(Clone, Debug)]
pub struct ForwardConfig {
    pub levels: Vec<Severity>,
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_attempts: usize,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            levels: vec![Severity::Error],
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

/// Counters shared between a [`ForwardSink`] and its background task.
#[derive(Clone, Debug, Default)]
pub struct ForwardStats {
    /// Records that matched a forwarded level.
    pub total: Arc<AtomicU64>,
    /// Records accepted into the channel.
    pub enqueued: Arc<AtomicU64>,
    /// Records rejected because the channel was full or closed.
    pub dropped: Arc<AtomicU64>,
    /// Records the backend acknowledged.
    pub delivered: Arc<AtomicU64>,
}

/// [`Sink`] that hands matching records to an [`AsyncSink`] through a
/// bounded channel drained by a background task.
///
/// `write` never blocks the logging thread: a full channel is reported as
/// [`SinkError::ChannelFull`] and the record is dropped.
pub struct ForwardSink {
    sender: mpsc::Sender<LogRecord>,
    levels: Vec<Severity>,
    stats: ForwardStats,
}

impl ForwardSink {
    /// Create the sink and spawn its delivery task on the current tokio
    /// runtime. The task ends once the sink is dropped and the remaining
    /// records are delivered.
    ///
    /// Minimal thresholds are enforced for `channel_buffer`, `batch_size`,
    /// `flush_interval` and `max_attempts`.
    pub fn new(backend: Arc<dyn AsyncSink>, config: ForwardConfig) -> (Self, JoinHandle<()>) {
        let buffer = config.channel_buffer.max(16);
        let batch_size = config.batch_size.max(1);
        let flush_interval = config.flush_interval.max(Duration::from_millis(10));
        let max_attempts = config.max_attempts.max(1);

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);
        let stats = ForwardStats::default();
        let delivered = Arc::clone(&stats.delivered);

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(record) => {
                            batch.push(record);
                            if batch.len() >= batch_size {
                                deliver(&*backend, &mut batch, max_attempts, &delivered).await;
                            }
                        }
                        None => break,
                    },
                    _ = sleep(flush_interval) => {
                        if !batch.is_empty() {
                            deliver(&*backend, &mut batch, max_attempts, &delivered).await;
                        }
                    }
                }
            }

            if !batch.is_empty() {
                deliver(&*backend, &mut batch, max_attempts, &delivered).await;
            }
            if let Err(e) = backend.flush().await {
                tracing::warn!(error = %e, "log forward backend flush failed");
            }
        });

        (
            ForwardSink {
                sender: tx,
                levels: config.levels,
                stats,
            },
            handle,
        )
    }

    pub fn stats(&self) -> &ForwardStats {
        &self.stats
    }

    pub fn forwards(&self, level: Severity) -> bool {
        self.levels.contains(&level)
    }
}

impl Sink for ForwardSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        if !self.forwards(record.level) {
            return Ok(());
        }
        self.stats.total.fetch_add(1, Ordering::Relaxed);

        match self.sender.try_send(record.clone()) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::ChannelFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::ChannelClosed)
            }
        }
    }
}

/// Deliver `batch` in order, retrying the unsent tail with exponential
/// backoff. The batch is cleared either way.
async fn deliver(
    backend: &dyn AsyncSink,
    batch: &mut Vec<LogRecord>,
    max_attempts: usize,
    delivered: &AtomicU64,
) {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(10);
    let mut sent = 0;

    for attempt in 1..=max_attempts {
        let mut failure = None;
        for record in &batch[sent..] {
            match backend.send(record).await {
                Ok(()) => {
                    sent += 1;
                    delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let Some(e) = failure else {
            break;
        };
        if attempt == max_attempts {
            tracing::warn!(error = %e, dropped = batch.len() - sent, "giving up on log batch");
            break;
        }
        tracing::debug!(error = %e, ?backoff, "log forward failed, retrying");
        sleep(backoff).await;
        backoff = std::cmp::min(backoff * 2, max_backoff);
    }

    batch.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    #[async_trait]
    impl AsyncSink for Collect {
        async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.0.lock().unwrap().push(record.message.clone());
            Ok(())
        }
    }

    /// Fails the first `n` sends.
    struct Flaky {
        failures_left: Mutex<usize>,
        inner: Collect,
    }

    #[async_trait]
    impl AsyncSink for Flaky {
        async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err("unavailable".into());
                }
            }
            self.inner.send(record).await
        }
    }

    fn record(level: Severity, msg: &str) -> LogRecord {
        LogRecord::from_keyvals(level, kv!["message", msg])
    }

    #[tokio::test]
    async fn forwards_only_configured_levels() {
        let backend = Arc::new(Collect::default());
        let (sink, handle) = ForwardSink::new(backend.clone(), ForwardConfig::default());

        sink.write(&record(Severity::Info, "ignored")).unwrap();
        sink.write(&record(Severity::Error, "paged")).unwrap();
        let stats = sink.stats().clone();
        drop(sink);
        handle.await.unwrap();

        assert_eq!(*backend.0.lock().unwrap(), vec!["paged".to_string()]);
        assert_eq!(stats.total.load(Ordering::Relaxed), 1);
        assert_eq!(stats.delivered.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn full_channel_rejects_without_blocking() {
        let backend = Arc::new(Collect::default());
        let config = ForwardConfig {
            channel_buffer: 16,
            ..ForwardConfig::default()
        };
        let (sink, handle) = ForwardSink::new(backend.clone(), config);

        // The current-thread test runtime does not run the delivery task
        // until this test yields, so the channel fills up.
        for i in 0..16 {
            sink.write(&record(Severity::Error, &i.to_string())).unwrap();
        }
        let err = sink.write(&record(Severity::Error, "overflow")).unwrap_err();
        assert!(matches!(err, SinkError::ChannelFull));
        assert_eq!(sink.stats().dropped.load(Ordering::Relaxed), 1);

        drop(sink);
        handle.await.unwrap();
        assert_eq!(backend.0.lock().unwrap().len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_batches_are_retried() {
        let backend = Arc::new(Flaky {
            failures_left: Mutex::new(2),
            inner: Collect::default(),
        });
        let (sink, handle) = ForwardSink::new(backend.clone(), ForwardConfig::default());

        sink.write(&record(Severity::Error, "eventually")).unwrap();
        drop(sink);
        handle.await.unwrap();

        assert_eq!(*backend.inner.0.lock().unwrap(), vec!["eventually".to_string()]);
    }
}
