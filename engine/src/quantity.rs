use crate::context::EngineContext;
use error::DynamoError;
use std::thread;
use std::time::Duration;
use threading::WorkerPool;
use tracing::error;
use util::QueueMonitor;
use value::{RecordFactory, RecordFields};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(12 * 60 * 60);

/// Produces a fixed number of records, submitting one task per record to
/// a worker pool at a throttled rate (§4.5 "Quantity engine").
pub struct QuantityEngine<F: RecordFactory> {
    context: EngineContext<F>,
    quantity: u64,
    threads: usize,
    sleepy_time: Duration,
}

impl<F: RecordFactory + 'static> QuantityEngine<F> {
    pub fn new(context: EngineContext<F>, quantity: u64, threads: usize, sleepy_time: Duration) -> Self {
        QuantityEngine {
            context,
            quantity,
            threads,
            sleepy_time,
        }
    }

    /// Submits `quantity` tasks, each of which calls the factory once and
    /// delivers that one record under the retry executor. `sleepy_time`
    /// throttles *submission*, not delivery: the pool may still be
    /// draining earlier tasks while later ones are being submitted.
    pub fn produce(self) -> Result<(), DynamoError> {
        let pool = WorkerPool::new("quantity", self.threads.max(1), self.threads.max(1) * 4);
        let queue = pool.queue_handle();
        let monitor = QueueMonitor::spawn("quantity", move || queue.len());

        for _ in 0..self.quantity {
            let context = self.context.clone();
            pool.submit(move || {
                let record = context.factory.create();
                let fields = record.fields();
                if let Err(err) = context.retry.deliver(|| context.sink.send(&fields)) {
                    error!("quantity engine task failed permanently: {}", err.describe(false));
                }
            });
            if !self.sleepy_time.is_zero() {
                thread::sleep(self.sleepy_time);
            }
        }

        pool.join(SHUTDOWN_GRACE);
        monitor.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retry::{RetryConfig, RetryExecutor};
    use sink::{DummySink, Sink};
    use std::sync::Arc;
    use value::sample::PersonFactory;

    #[test]
    fn produces_exactly_the_configured_quantity() {
        let dummy = Arc::new(DummySink::new());
        let sink: Arc<dyn Sink> = dummy.clone();
        let context = EngineContext::new(
            PersonFactory,
            sink,
            RetryExecutor::new(RetryConfig::default()),
        );
        let engine = QuantityEngine::new(context, 50, 4, Duration::ZERO);
        engine.produce().unwrap();
        assert_eq!(dummy.len(), 50);
    }

    struct AlwaysFailsSink;

    impl Sink for AlwaysFailsSink {
        fn send(&self, _fields: &[(&'static str, value::Value)]) -> Result<(), DynamoError> {
            Err(DynamoError::Permanent("destination unreachable".into()))
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn a_task_that_exhausts_retries_is_logged_not_propagated() {
        let sink: Arc<dyn Sink> = Arc::new(AlwaysFailsSink);
        let context = EngineContext::new(
            PersonFactory,
            sink,
            RetryExecutor::new(RetryConfig {
                attempts: 1,
                ..Default::default()
            }),
        );
        let engine = QuantityEngine::new(context, 1, 1, Duration::ZERO);
        assert!(engine.produce().is_ok());
        assert!(logs_contain("quantity engine task failed permanently"));
    }
}
