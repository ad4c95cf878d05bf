use crate::Codec;
use error::DynamoError;
use std::collections::BTreeMap;
use value::Value;

pub struct JsonCodec;

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Null => serde_json::Value::Null,
        Value::List(values) => serde_json::Value::Array(values.iter().map(value_to_json).collect()),
        Value::Map(map) => {
            serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect())
        }
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(values) => Value::List(values.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                out.insert(k.clone(), json_to_value(v));
            }
            Value::Map(out)
        }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, fields: &[(&'static str, Value)]) -> Result<Vec<u8>, DynamoError> {
        let mut object = serde_json::Map::new();
        for (name, value) in fields {
            object.insert(name.to_string(), value_to_json(value));
        }
        serde_json::to_vec(&serde_json::Value::Object(object))
            .map_err(|e| DynamoError::encoding("<object>", e.to_string()))
    }

    fn decode(&self, line: &[u8], schema: &[&'static str]) -> Result<Vec<(String, Value)>, DynamoError> {
        let parsed: serde_json::Value =
            serde_json::from_slice(line).map_err(|e| DynamoError::encoding("<line>", e.to_string()))?;
        let object = parsed
            .as_object()
            .ok_or_else(|| DynamoError::encoding("<line>", "expected a JSON object"))?;
        Ok(schema
            .iter()
            .map(|name| {
                let value = object.get(*name).map(json_to_value).unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect())
    }

    fn record_separator(&self) -> &'static [u8] {
        b"\r\n"
    }

    fn default_extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_typed_fields() {
        let codec = JsonCodec;
        let fields = vec![("id", Value::int(42)), ("active", Value::bool(true))];
        let encoded = codec.encode(&fields).unwrap();
        let decoded = codec.decode(&encoded, &["id", "active"]).unwrap();
        assert_eq!(decoded[0].1, Value::int(42));
        assert_eq!(decoded[1].1, Value::bool(true));
    }
}
