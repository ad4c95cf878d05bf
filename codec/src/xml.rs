use crate::Codec;
use error::DynamoError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::io::Cursor;
use value::Value;

/// A real XML mapper (Design Note 9: the source mistakenly reused its
/// JSON mapper for XML; this codec does not repeat that). Each field
/// becomes an element named after the field, tagged with its value kind
/// so decode can reconstruct more than bare strings.
pub struct XmlCodec;

const HEADER: &[u8] = b"<xml version=\"1.0\">";

fn kind_tag(value: &Value) -> &'static str {
    match value {
        Value::Text(_) => "text",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::List(_) | Value::Map(_) => "text",
    }
}

impl Codec for XmlCodec {
    fn encode(&self, fields: &[(&'static str, Value)]) -> Result<Vec<u8>, DynamoError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Start(BytesStart::new("record")))
            .map_err(|e| DynamoError::encoding("<record>", e.to_string()))?;

        for (name, value) in fields {
            let mut start = BytesStart::new(*name);
            start.push_attribute(("kind", kind_tag(value)));
            writer
                .write_event(Event::Start(start))
                .map_err(|e| DynamoError::encoding(*name, e.to_string()))?;
            writer
                .write_event(Event::Text(BytesText::new(&value.to_string())))
                .map_err(|e| DynamoError::encoding(*name, e.to_string()))?;
            writer
                .write_event(Event::End(BytesEnd::new(*name)))
                .map_err(|e| DynamoError::encoding(*name, e.to_string()))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("record")))
            .map_err(|e| DynamoError::encoding("<record>", e.to_string()))?;

        Ok(writer.into_inner().into_inner())
    }

    fn decode(&self, line: &[u8], schema: &[&'static str]) -> Result<Vec<(String, Value)>, DynamoError> {
        let mut reader = Reader::from_reader(line);
        reader.config_mut().trim_text(true);

        let mut found: Vec<(String, Value)> = Vec::new();
        let mut current_tag: Option<String> = None;
        let mut current_kind = "text".to_string();
        let mut buf = Vec::new();

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| DynamoError::encoding("<line>", e.to_string()))?
            {
                Event::Eof => break,
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                    current_kind = start
                        .try_get_attribute("kind")
                        .ok()
                        .flatten()
                        .map(|a| String::from_utf8_lossy(&a.value).to_string())
                        .unwrap_or_else(|| "text".to_string());
                    current_tag = Some(name);
                }
                Event::Text(text) => {
                    if let Some(tag) = current_tag.take() {
                        let text = text
                            .unescape()
                            .map_err(|e| DynamoError::encoding(&tag, e.to_string()))?
                            .into_owned();
                        let value = match current_kind.as_str() {
                            "int" => Value::Int(text.parse().unwrap_or_default()),
                            "float" => Value::Float(text.parse().unwrap_or_default()),
                            "bool" => Value::Bool(text.parse().unwrap_or_default()),
                            "null" => Value::Null,
                            _ => Value::Text(text),
                        };
                        found.push((tag, value));
                    }
                }
                Event::End(_) => current_tag = None,
                _ => {}
            }
            buf.clear();
        }

        Ok(schema
            .iter()
            .map(|name| {
                let value = found
                    .iter()
                    .find(|(found_name, _)| found_name == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect())
    }

    fn header(&self) -> Option<Vec<u8>> {
        Some(HEADER.to_vec())
    }

    fn record_separator(&self) -> &'static [u8] {
        b"\r\n"
    }

    fn default_extension(&self) -> &'static str {
        "xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_typed_fields() {
        let codec = XmlCodec;
        let fields = vec![("id", Value::int(42)), ("name", Value::text("ada"))];
        let encoded = codec.encode(&fields).unwrap();
        let decoded = codec.decode(&encoded, &["id", "name"]).unwrap();
        assert_eq!(decoded[0].1, Value::int(42));
        assert_eq!(decoded[1].1, Value::text("ada"));
    }

    #[test]
    fn header_is_the_literal_xml_declaration_line() {
        let codec = XmlCodec;
        assert_eq!(codec.header().unwrap(), HEADER);
    }
}
