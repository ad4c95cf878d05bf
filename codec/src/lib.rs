mod avro;
mod delimited;
mod json;
mod xml;

pub use avro::AvroCodec;
pub use delimited::DelimitedCodec;
pub use json::JsonCodec;
pub use xml::XmlCodec;

use error::DynamoError;
use std::path::Path;
use value::Value;

/// Stateless after construction (one optional schema cached per
/// instance, see [`AvroCodec`]). `encode` must succeed for any record
/// whose fields match the codec's expectations; `decode` takes one
/// logical record (one line for text codecs, one frame for binary) and
/// returns the decoded `(field name, value)` pairs in declaration order.
pub trait Codec: Send + Sync {
    fn encode(&self, fields: &[(&'static str, Value)]) -> Result<Vec<u8>, DynamoError>;

    fn decode(&self, line: &[u8], schema: &[&'static str]) -> Result<Vec<(String, Value)>, DynamoError>;

    /// Bytes placed between two records of an appendable sink.
    fn record_separator(&self) -> &'static [u8];

    /// One-time bytes prepended when a file-like sink creates a fresh file.
    fn header(&self) -> Option<Vec<u8>> {
        None
    }

    fn default_extension(&self) -> &'static str;
}

/// Extension-to-codec mapping for replay (§4.2). `schema_path` is
/// consulted only by the binary columnar codec.
pub fn for_extension(
    extension: &str,
    delimiter: &str,
    schema_path: Option<&Path>,
) -> Result<Box<dyn Codec>, DynamoError> {
    match extension {
        "avro" => Ok(Box::new(AvroCodec::new(schema_path)?)),
        "csv" => Ok(Box::new(DelimitedCodec::new(","))),
        "tsv" => Ok(Box::new(DelimitedCodec::new("\t"))),
        "json" => Ok(Box::new(JsonCodec)),
        "xml" => Ok(Box::new(XmlCodec)),
        "txt" => Ok(Box::new(DelimitedCodec::new(delimiter))),
        other => Err(DynamoError::Configuration(format!(
            "no codec registered for extension '.{other}'"
        ))),
    }
}

/// Resolves the codec named by `Serialization.Format`.
pub fn for_format_name(
    name: &str,
    delimiter: &str,
    schema_path: Option<&Path>,
) -> Result<Box<dyn Codec>, DynamoError> {
    match name {
        "avro" => Ok(Box::new(AvroCodec::new(schema_path)?)),
        "json" => Ok(Box::new(JsonCodec)),
        "text" => Ok(Box::new(DelimitedCodec::new(delimiter))),
        "xml" => Ok(Box::new(XmlCodec)),
        other => Err(DynamoError::Configuration(format!(
            "unknown Serialization.Format '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn unknown_extension_is_a_configuration_error() {
        let err = for_extension("parquet", ",", None).unwrap_err();
        assert_eq!(err.kind(), error::Kind::CONFIGURATION);
    }

    #[rstest]
    #[case("avro", "avro")]
    #[case("csv", "csv")]
    #[case("tsv", "tsv")]
    #[case("json", "json")]
    #[case("xml", "xml")]
    fn extension_resolves_to_the_matching_codec(#[case] extension: &str, #[case] expected_default: &str) {
        let codec = for_extension(extension, ",", None).unwrap();
        assert_eq!(codec.default_extension(), expected_default);
    }

    #[rstest]
    #[case("txt", ";")]
    fn txt_falls_back_to_the_configured_delimiter(#[case] extension: &str, #[case] delimiter: &str) {
        let codec = for_extension(extension, delimiter, None).unwrap();
        let encoded = codec.encode(&[("a", Value::int(1)), ("b", Value::int(2))]).unwrap();
        assert_eq!(encoded, format!("1{delimiter}2{delimiter}").into_bytes());
    }
}
