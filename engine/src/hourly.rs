use crate::context::EngineContext;
use chrono::{DateTime, Utc};
use error::DynamoError;
use rand::Rng;
use sink::FileSink;
use std::path::PathBuf;
use std::time::Duration;
use threading::WorkerPool;
use tracing::error;
use util::QueueMonitor;
use value::{RecordFactory, RecordFields};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(60 * 60);
const HOUR: chrono::Duration = chrono::Duration::seconds(3600);

/// Walks `[start, end)` in one-hour steps, submitting one task per hour
/// that generates a random count of records in `[lower, upper)` tagged
/// with that hour's timestamp (§4.5 "Hourly-range engine").
pub struct HourlyRangeEngine<F: RecordFactory> {
    context: EngineContext<F>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    lower: u64,
    upper: u64,
    threads: usize,
}

impl<F: RecordFactory + 'static> HourlyRangeEngine<F> {
    pub fn new(
        context: EngineContext<F>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        lower: u64,
        upper: u64,
        threads: usize,
    ) -> Self {
        HourlyRangeEngine {
            context,
            start,
            end,
            lower,
            upper,
            threads,
        }
    }

    pub fn produce(self) -> Result<(), DynamoError> {
        let pool = WorkerPool::new("hourly-range", self.threads.max(1), self.threads.max(1) * 4);
        let queue = pool.queue_handle();
        let monitor = QueueMonitor::spawn("hourly-range", move || queue.len());

        let mut cursor = self.start;
        while cursor < self.end {
            let hour = cursor;
            let context = self.context.clone();
            let (lower, upper) = (self.lower, self.upper);
            pool.submit(move || {
                let n = if upper > lower {
                    rand::rng().random_range(lower..upper)
                } else {
                    lower
                };
                // §4.5 Design Note 9e: the per-hour path is computed inside
                // the task itself; no shared sink state is ever mutated.
                let path = hourly_path(hour);
                let stamp = hour.timestamp_millis();
                for _ in 0..n {
                    let mut record = context.factory.create();
                    record.stamp_timestamp(stamp);
                    let fields = record.fields();
                    let result = context.retry.deliver(|| {
                        if let Some(file_sink) = context.sink.as_any().downcast_ref::<FileSink>() {
                            file_sink.send_to(&fields, &path)
                        } else {
                            context.sink.send(&fields)
                        }
                    });
                    if let Err(err) = result {
                        error!("hourly-range engine task failed permanently: {}", err.describe(false));
                    }
                }
            });
            cursor += HOUR;
        }

        pool.join(SHUTDOWN_GRACE);
        monitor.stop();
        Ok(())
    }
}

fn hourly_path(hour: DateTime<Utc>) -> PathBuf {
    PathBuf::from(hour.format("%Y/%m/%d/%H00").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retry::{RetryConfig, RetryExecutor};
    use sink::{DummySink, Sink};
    use std::sync::Arc;
    use value::sample::EventFactory;
    use value::Value;

    #[test]
    fn hourly_path_is_year_month_day_hour00() {
        let hour = DateTime::parse_from_rfc3339("2026-07-26T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(hourly_path(hour), PathBuf::from("2026/07/26/1400"));
    }

    #[test]
    fn every_delivered_record_carries_the_bucket_timestamp() {
        let dummy = Arc::new(DummySink::new());
        let sink: Arc<dyn Sink> = dummy.clone();
        let context = EngineContext::new(EventFactory, sink, RetryExecutor::new(RetryConfig::default()));

        let start = DateTime::parse_from_rfc3339("2026-07-26T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let end = start + HOUR;
        let engine = HourlyRangeEngine::new(context, start, end, 5, 5, 1);
        engine.produce().unwrap();

        let snapshot = dummy.snapshot();
        assert_eq!(snapshot.len(), 5);
        for record in snapshot {
            let timestamp = record
                .iter()
                .find(|(name, _)| name == "timestamp")
                .map(|(_, value)| value.clone());
            assert_eq!(timestamp, Some(Value::int(start.timestamp_millis())));
        }
    }
}
