use crate::Value;
use error::DynamoError;

/// The reflection-free seam codecs encode/decode through (Design Note:
/// "reflection-based field enumeration", option a). A record type lists
/// its public fields in declaration order; that order is the wire order
/// for every codec.
pub trait RecordFields {
    /// Stable name used to resolve a schema file or log a type name; not
    /// necessarily the Rust type name.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Public fields in declaration order.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// The field names only, in declaration order — the schema a binary
    /// codec infers from, and the positional assignment order a
    /// delimited-text codec decodes into.
    fn field_names() -> Vec<&'static str>
    where
        Self: Sized;

    /// Rebuilds a record from decoded `(field name, value)` pairs.
    fn from_fields(fields: Vec<(String, Value)>) -> Result<Self, DynamoError>
    where
        Self: Sized;

    /// Stamps a bucket timestamp (milliseconds since the epoch) onto this
    /// record, for the hourly-range engine (§4.5, §8: "every delivered
    /// record carries a timestamp in one of the h buckets"). Record types
    /// with no timestamp field leave this a no-op.
    fn stamp_timestamp(&mut self, _millis: i64) {}
}
