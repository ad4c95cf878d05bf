use crate::Codec;
use apache_avro::schema::Schema;
use apache_avro::types::Value as AvroValue;
use apache_avro::{Codec as CompressionCodec, Reader, Writer};
use error::DynamoError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use value::Value;

/// Binary columnar codec. Stateless after construction except for one
/// cached schema (§3): either loaded eagerly from `schema_path`, or
/// inferred lazily from the first record's fields (nullable-allowed —
/// any field that is `Null` on that first record becomes a nullable
/// union). Each call to `encode` produces one self-contained,
/// block-framed, Snappy-compressed container; the container format
/// handles record boundaries natively, so `record_separator` is empty.
pub struct AvroCodec {
    schema_path: Option<PathBuf>,
    schema: RwLock<Option<Schema>>,
}

impl AvroCodec {
    pub fn new(schema_path: Option<&Path>) -> Result<Self, DynamoError> {
        let schema = match schema_path {
            Some(path) => Some(load_schema(path)?),
            None => None,
        };
        Ok(AvroCodec {
            schema_path: schema_path.map(PathBuf::from),
            schema: RwLock::new(schema),
        })
    }

    fn schema_for(&self, fields: &[(&'static str, Value)]) -> Result<Schema, DynamoError> {
        if let Some(schema) = self.schema.read().unwrap().as_ref() {
            return Ok(schema.clone());
        }
        let inferred = infer_schema(fields)?;
        *self.schema.write().unwrap() = Some(inferred.clone());
        Ok(inferred)
    }
}

fn load_schema(path: &Path) -> Result<Schema, DynamoError> {
    let text = fs::read_to_string(path)
        .map_err(|e| DynamoError::Configuration(format!("cannot read schema file {path:?}: {e}")))?;
    Schema::parse_str(&text)
        .map_err(|e| DynamoError::Configuration(format!("invalid avro schema in {path:?}: {e}")))
}

fn avro_type_name(value: &Value) -> &'static str {
    match value {
        Value::Text(_) => "string",
        Value::Int(_) => "long",
        Value::Float(_) => "double",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::List(_) | Value::Map(_) => "string",
    }
}

fn infer_schema(fields: &[(&'static str, Value)]) -> Result<Schema, DynamoError> {
    let field_defs: Vec<String> = fields
        .iter()
        .map(|(name, value)| {
            let type_name = avro_type_name(value);
            if value.is_null() {
                format!(r#"{{"name":"{name}","type":["null","string"],"default":null}}"#)
            } else {
                format!(r#"{{"name":"{name}","type":"{type_name}"}}"#)
            }
        })
        .collect();
    let json = format!(
        r#"{{"type":"record","name":"DynamoRecord","fields":[{}]}}"#,
        field_defs.join(",")
    );
    Schema::parse_str(&json)
        .map_err(|e| DynamoError::encoding("<schema>", format!("cannot infer avro schema: {e}")))
}

fn value_to_avro(value: &Value) -> AvroValue {
    match value {
        Value::Text(s) => AvroValue::String(s.clone()),
        Value::Int(i) => AvroValue::Long(*i),
        Value::Float(f) => AvroValue::Double(*f),
        Value::Bool(b) => AvroValue::Boolean(*b),
        Value::Null => AvroValue::Null,
        Value::List(_) | Value::Map(_) => AvroValue::String(value.to_string()),
    }
}

fn avro_to_value(value: &AvroValue) -> Value {
    match value {
        AvroValue::String(s) => Value::Text(s.clone()),
        AvroValue::Long(i) => Value::Int(*i),
        AvroValue::Int(i) => Value::Int(*i as i64),
        AvroValue::Double(f) => Value::Float(*f),
        AvroValue::Float(f) => Value::Float(*f as f64),
        AvroValue::Boolean(b) => Value::Bool(*b),
        AvroValue::Null => Value::Null,
        AvroValue::Union(_, inner) => avro_to_value(inner),
        other => Value::Text(format!("{other:?}")),
    }
}

impl Codec for AvroCodec {
    fn encode(&self, fields: &[(&'static str, Value)]) -> Result<Vec<u8>, DynamoError> {
        let schema = self.schema_for(fields)?;
        let mut writer = Writer::with_codec(&schema, Vec::new(), CompressionCodec::Snappy);

        let record: Vec<(String, AvroValue)> = fields
            .iter()
            .map(|(name, value)| (name.to_string(), value_to_avro(value)))
            .collect();

        writer
            .append(AvroValue::Record(record))
            .map_err(|e| DynamoError::encoding("<record>", e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| DynamoError::encoding("<record>", e.to_string()))
    }

    fn decode(&self, line: &[u8], schema: &[&'static str]) -> Result<Vec<(String, Value)>, DynamoError> {
        let reader =
            Reader::new(line).map_err(|e| DynamoError::encoding("<frame>", e.to_string()))?;

        for record in reader {
            let record = record.map_err(|e| DynamoError::encoding("<frame>", e.to_string()))?;
            if let AvroValue::Record(pairs) = record {
                return Ok(schema
                    .iter()
                    .map(|name| {
                        let value = pairs
                            .iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, v)| avro_to_value(v))
                            .unwrap_or(Value::Null);
                        (name.to_string(), value)
                    })
                    .collect());
            }
        }
        Err(DynamoError::encoding("<frame>", "empty avro container"))
    }

    fn record_separator(&self) -> &'static [u8] {
        b""
    }

    fn default_extension(&self) -> &'static str {
        "avro"
    }
}

impl std::fmt::Debug for AvroCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvroCodec")
            .field("schema_path", &self.schema_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_single_block() {
        let codec = AvroCodec::new(None).unwrap();
        let fields = vec![("id", Value::int(7)), ("name", Value::text("ada"))];
        let encoded = codec.encode(&fields).unwrap();
        let decoded = codec.decode(&encoded, &["id", "name"]).unwrap();
        assert_eq!(decoded[0].1, Value::int(7));
        assert_eq!(decoded[1].1, Value::text("ada"));
    }

    #[test]
    fn schema_is_cached_after_first_encode() {
        let codec = AvroCodec::new(None).unwrap();
        assert!(codec.schema.read().unwrap().is_none());
        let fields = vec![("id", Value::int(1))];
        codec.encode(&fields).unwrap();
        assert!(codec.schema.read().unwrap().is_some());
    }
}
