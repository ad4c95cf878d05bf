use crate::Sink;
use codec::Codec;
use error::DynamoError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;
use value::Value;

/// Publishes encoded records to a Kafka topic. rdkafka's producer API is
/// async-only; this sink keeps its own single-threaded runtime and
/// blocks the calling worker thread on each send, the same trade-off the
/// engine's synchronous worker pool makes everywhere else (Design Note
/// 9f).
pub struct EventBusSink {
    producer: FutureProducer,
    topic: String,
    codec: Box<dyn Codec>,
    runtime: Runtime,
}

impl EventBusSink {
    pub fn new(brokers: &str, topic: &str, codec: Box<dyn Codec>) -> Result<Self, DynamoError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| DynamoError::Construction(format!("kafka producer: {e}")))?;
        let runtime = Runtime::new()
            .map_err(|e| DynamoError::Construction(format!("kafka sink runtime: {e}")))?;
        Ok(EventBusSink {
            producer,
            topic: topic.to_string(),
            codec,
            runtime,
        })
    }
}

impl Sink for EventBusSink {
    fn send(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError> {
        let payload = self.codec.encode(fields)?;
        debug!("publishing {} bytes to topic '{}'", payload.len(), self.topic);
        let record: FutureRecord<(), _> = FutureRecord::to(&self.topic).payload(&payload);
        self.runtime
            .block_on(self.producer.send(record, Duration::from_secs(5)))
            .map(|_| ())
            .map_err(|(err, _)| DynamoError::Transient(format!("kafka send: {err}")))
    }

    fn flush(&self) -> Result<(), DynamoError> {
        self.producer
            .flush(Duration::from_secs(5))
            .map_err(|e| DynamoError::Transient(format!("kafka flush: {e}")))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
