mod error;

pub use error::{DynamoError, Kind};
