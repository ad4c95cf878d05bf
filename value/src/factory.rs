use crate::RecordFields;

/// Zero-argument producer of records. Pure from the engine's perspective:
/// it may draw from randomness or a clock internally, but its signature
/// is deterministic (`create(&self) -> Self::Record`).
pub trait RecordFactory: Send + Sync {
    type Record: RecordFields + Clone + Send + 'static;

    fn create(&self) -> Self::Record;
}
