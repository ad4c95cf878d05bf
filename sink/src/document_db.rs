use crate::Sink;
use error::DynamoError;
use mongodb::bson::{Bson, Document};
use mongodb::{Client, Collection};
use tokio::runtime::Runtime;
use value::Value;

/// Writes each record as a document. `mongodb::Client` is async-only, so
/// this sink keeps its own runtime and blocks on each insert, the same
/// bridge `EventBusSink` uses for rdkafka.
pub struct DocumentDbSink {
    collection: Collection<Document>,
    runtime: Runtime,
}

impl DocumentDbSink {
    pub fn new(uri: &str, database: &str, collection: &str) -> Result<Self, DynamoError> {
        let runtime = Runtime::new()
            .map_err(|e| DynamoError::Construction(format!("document db sink runtime: {e}")))?;
        let client = runtime
            .block_on(Client::with_uri_str(uri))
            .map_err(|e| DynamoError::Construction(format!("mongo client: {e}")))?;
        let collection = client.database(database).collection(collection);
        Ok(DocumentDbSink { collection, runtime })
    }
}

fn value_to_bson(value: &Value) -> Bson {
    match value {
        Value::Text(s) => Bson::String(s.clone()),
        Value::Int(i) => Bson::Int64(*i),
        Value::Float(f) => Bson::Double(*f),
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Null => Bson::Null,
        Value::List(items) => Bson::Array(items.iter().map(value_to_bson).collect()),
        Value::Map(map) => {
            let mut doc = Document::new();
            for (k, v) in map {
                doc.insert(k.clone(), value_to_bson(v));
            }
            Bson::Document(doc)
        }
    }
}

impl Sink for DocumentDbSink {
    fn send(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError> {
        let mut doc = Document::new();
        for (name, value) in fields {
            doc.insert(*name, value_to_bson(value));
        }
        self.runtime
            .block_on(self.collection.insert_one(doc))
            .map_err(|e| DynamoError::Transient(format!("mongo insert: {e}")))?;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
