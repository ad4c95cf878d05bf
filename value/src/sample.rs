use crate::{RecordFactory, RecordFields, Value};
use error::DynamoError;
use rand::Rng;

/// A small, synthetic person record. One of the record types the
/// launcher can resolve by name (`person` -> `PersonFactory`).
#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

const FIRST_NAMES: &[&str] = &["ada", "grace", "linus", "margaret", "alan", "barbara"];

impl RecordFields for Person {
    fn type_name() -> &'static str {
        "Person"
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![("id", Value::int(self.id)), ("name", Value::text(self.name.clone()))]
    }

    fn field_names() -> Vec<&'static str> {
        vec!["id", "name"]
    }

    fn from_fields(fields: Vec<(String, Value)>) -> Result<Self, DynamoError> {
        let mut id = None;
        let mut name = None;
        for (key, value) in fields {
            match key.as_str() {
                "id" => id = Some(coerce_i64(&value)),
                "name" => name = Some(value.to_string()),
                other => {
                    return Err(DynamoError::encoding(other, "unknown field for Person"));
                }
            }
        }
        Ok(Person {
            id: id.ok_or_else(|| DynamoError::encoding("id", "missing field"))?,
            name: name.ok_or_else(|| DynamoError::encoding("name", "missing field"))?,
        })
    }
}

pub struct PersonFactory;

impl RecordFactory for PersonFactory {
    type Record = Person;

    fn create(&self) -> Person {
        let mut rng = rand::rng();
        Person {
            id: rng.random_range(1..1_000_000),
            name: FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())].to_string(),
        }
    }
}

/// A timestamped measurement, the kind of record the hourly-range engine
/// tags with its bucket timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub device_id: String,
    pub value: f64,
    pub timestamp: i64,
}

impl RecordFields for Event {
    fn type_name() -> &'static str {
        "Event"
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("device_id", Value::text(self.device_id.clone())),
            ("value", Value::float(self.value)),
            ("timestamp", Value::int(self.timestamp)),
        ]
    }

    fn field_names() -> Vec<&'static str> {
        vec!["device_id", "value", "timestamp"]
    }

    fn from_fields(fields: Vec<(String, Value)>) -> Result<Self, DynamoError> {
        let mut device_id = None;
        let mut value = None;
        let mut timestamp = None;
        for (key, field_value) in fields {
            match key.as_str() {
                "device_id" => device_id = Some(field_value.to_string()),
                "value" => value = Some(coerce_f64(&field_value)),
                "timestamp" => timestamp = Some(coerce_i64(&field_value)),
                other => return Err(DynamoError::encoding(other, "unknown field for Event")),
            }
        }
        Ok(Event {
            device_id: device_id.ok_or_else(|| DynamoError::encoding("device_id", "missing field"))?,
            value: value.ok_or_else(|| DynamoError::encoding("value", "missing field"))?,
            timestamp: timestamp.unwrap_or_default(),
        })
    }

    fn stamp_timestamp(&mut self, millis: i64) {
        self.timestamp = millis;
    }
}

pub struct EventFactory;

impl RecordFactory for EventFactory {
    type Record = Event;

    fn create(&self) -> Event {
        let mut rng = rand::rng();
        Event {
            device_id: format!("sensor-{}", rng.random_range(0..64)),
            value: rng.random_range(0.0..100.0),
            timestamp: 0,
        }
    }
}

/// The `ObjectFactory` sentinel (§6): "no factory, create blank values".
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Blank;

impl RecordFields for Blank {
    fn type_name() -> &'static str {
        "Blank"
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    fn field_names() -> Vec<&'static str> {
        Vec::new()
    }

    fn from_fields(_fields: Vec<(String, Value)>) -> Result<Self, DynamoError> {
        Ok(Blank)
    }
}

pub struct BlankFactory;

impl RecordFactory for BlankFactory {
    type Record = Blank;

    fn create(&self) -> Blank {
        Blank
    }
}

fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        Value::Text(s) => s.parse().unwrap_or_default(),
        Value::Float(f) => *f as i64,
        _ => 0,
    }
}

fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Text(s) => s.parse().unwrap_or_default(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_factory_produces_in_range_id() {
        let factory = PersonFactory;
        let person = factory.create();
        assert!(person.id >= 1 && person.id < 1_000_000);
    }

    #[test]
    fn blank_has_no_fields() {
        assert!(Blank.fields().is_empty());
    }

    #[test]
    fn event_stamp_timestamp_overrides_the_field() {
        let mut event = EventFactory.create();
        event.stamp_timestamp(1_753_660_800_000);
        assert_eq!(event.timestamp, 1_753_660_800_000);
    }

    #[test]
    fn person_stamp_timestamp_is_a_no_op() {
        let mut person = PersonFactory.create();
        let before = person.clone();
        person.stamp_timestamp(1_753_660_800_000);
        assert_eq!(person, before);
    }
}
