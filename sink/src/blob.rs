use crate::Sink;
use codec::Codec;
use error::DynamoError;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;
use value::Value;

/// Writes each record as its own object under `prefix`, named by a
/// monotonically increasing sequence number plus the codec's default
/// extension. `object_store`'s API is async-only, so this sink keeps a
/// runtime to block on, the same bridge `EventBusSink` uses.
pub struct BlobStorageSink {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    codec: Box<dyn Codec>,
    sequence: AtomicU64,
    runtime: Runtime,
}

impl BlobStorageSink {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str, codec: Box<dyn Codec>) -> Result<Self, DynamoError> {
        let runtime = Runtime::new()
            .map_err(|e| DynamoError::Construction(format!("blob sink runtime: {e}")))?;
        Ok(BlobStorageSink {
            store,
            prefix: prefix.trim_end_matches('/').to_string(),
            codec,
            sequence: AtomicU64::new(0),
            runtime,
        })
    }
}

impl Sink for BlobStorageSink {
    fn send(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError> {
        let encoded = self.codec.encode(fields)?;
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        let object_path: ObjectPath = format!("{}/{n:020}.{}", self.prefix, self.codec.default_extension())
            .as_str()
            .into();
        self.runtime
            .block_on(self.store.put(&object_path, PutPayload::from(encoded)))
            .map_err(|e| DynamoError::Transient(format!("blob put: {e}")))?;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
