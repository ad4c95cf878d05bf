mod dummy;
mod event_bus;
mod document_db;
mod blob;
mod file;

pub use blob::BlobStorageSink;
pub use document_db::DocumentDbSink;
pub use dummy::DummySink;
pub use event_bus::EventBusSink;
pub use file::FileSink;

use error::DynamoError;
use std::any::Any;
use value::Value;

/// A destination for encoded records, per spec.md §4.3. `send` is called
/// once per record from inside a worker thread (never concurrently with
/// itself on the same sink instance from the caller's point of view is
/// not assumed — implementations must be `Sync`).
pub trait Sink: Send + Sync {
    fn send(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError>;

    /// Drains any buffered writes. Sinks that write eagerly (files,
    /// document databases) leave this as a no-op; `EventBusSink` blocks
    /// on its producer queue.
    fn flush(&self) -> Result<(), DynamoError> {
        Ok(())
    }

    /// Lets the hourly-range engine detect a file sink and call its
    /// path-parameterized `send_to` instead of `send` (Design Note 9e),
    /// without every other engine needing to know sinks can be files.
    fn as_any(&self) -> &dyn Any;
}
