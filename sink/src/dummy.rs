use crate::Sink;
use error::DynamoError;
use std::sync::Mutex;
use value::Value;

/// In-memory sink, used by tests and as the smoke-test target for a
/// freshly wired launcher (no engine/sink/record-type combination needs
/// a live broker or filesystem to exercise end to end).
#[derive(Default)]
pub struct DummySink {
    records: Mutex<Vec<Vec<(String, Value)>>>,
}

impl DummySink {
    pub fn new() -> Self {
        DummySink::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("not poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Vec<(String, Value)>> {
        self.records.lock().expect("not poisoned").clone()
    }
}

impl Sink for DummySink {
    fn send(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError> {
        let owned = fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        self.records.lock().expect("not poisoned").push(owned);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_every_send() {
        let sink = DummySink::new();
        sink.send(&[("id", Value::int(1))]).unwrap();
        sink.send(&[("id", Value::int(2))]).unwrap();
        assert_eq!(sink.len(), 2);
    }
}
