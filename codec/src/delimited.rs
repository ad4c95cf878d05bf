use crate::Codec;
use error::DynamoError;
use value::Value;

/// Public fields joined by a configurable delimiter; trailing delimiter
/// is allowed on encode. Decoding splits on the same delimiter and
/// assigns positionally — no type coercion (§9 open question:
/// non-string fields are not coerced back to their original type).
pub struct DelimitedCodec {
    delimiter: String,
}

impl DelimitedCodec {
    pub fn new<S: Into<String>>(delimiter: S) -> Self {
        DelimitedCodec {
            delimiter: delimiter.into(),
        }
    }
}

impl Codec for DelimitedCodec {
    fn encode(&self, fields: &[(&'static str, Value)]) -> Result<Vec<u8>, DynamoError> {
        let mut out = String::new();
        for (_, value) in fields {
            out.push_str(&value.to_string());
            out.push_str(&self.delimiter);
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, line: &[u8], schema: &[&'static str]) -> Result<Vec<(String, Value)>, DynamoError> {
        let line = std::str::from_utf8(line)
            .map_err(|e| DynamoError::encoding("line", e.to_string()))?;
        let mut pieces: Vec<&str> = line.split(self.delimiter.as_str()).collect();
        if pieces.last() == Some(&"") && pieces.len() > schema.len() {
            pieces.pop();
        }
        Ok(schema
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = pieces
                    .get(i)
                    .map(|s| Value::text(*s))
                    .unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect())
    }

    fn record_separator(&self) -> &'static [u8] {
        b"\r\n"
    }

    fn default_extension(&self) -> &'static str {
        match self.delimiter.as_str() {
            "," => "csv",
            "\t" => "tsv",
            _ => "txt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_trailing_delimiter() {
        let codec = DelimitedCodec::new("\t");
        let fields = vec![("id", Value::text("42")), ("name", Value::text("ada"))];
        assert_eq!(codec.encode(&fields).unwrap(), b"42\tada\t");
    }

    #[test]
    fn decode_splits_positionally() {
        let codec = DelimitedCodec::new("\t");
        let decoded = codec.decode(b"42\tada", &["id", "name"]).unwrap();
        assert_eq!(decoded[0], ("id".to_string(), Value::text("42")));
        assert_eq!(decoded[1], ("name".to_string(), Value::text("ada")));
    }

    #[test]
    fn decode_trailing_delimiter_is_tolerated() {
        let codec = DelimitedCodec::new("\t");
        let decoded = codec.decode(b"42\tada\t", &["id", "name"]).unwrap();
        assert_eq!(decoded.len(), 2);
    }
}
