use error::DynamoError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The "typed key→value lookup" the spec reduces configuration parsing
/// to (§1). Backed by a flat `key=value` properties file; `#`-prefixed
/// and blank lines are skipped. Parsed once at startup and threaded
/// into constructors by reference (Design Note: global configuration via
/// ambient file) — no component re-reads the file itself.
#[derive(Clone, Debug, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, DynamoError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DynamoError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Config { values }
    }

    pub fn get_str(&self, key: &str) -> Result<&str, DynamoError> {
        self.values
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| DynamoError::Configuration(format!("missing key '{key}'")))
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values.get(key).map(|s| s.as_str()).unwrap_or(default)
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, DynamoError> {
        self.get_str(key)?
            .parse()
            .map_err(|_| DynamoError::Configuration(format!("'{key}' is not a non-negative integer")))
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        self.values
            .get(key)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    }

    pub fn get_duration_or(&self, key: &str, default: Duration) -> Duration {
        self.values
            .get(key)
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(default)
    }

    pub fn get_path(&self, key: &str) -> Result<PathBuf, DynamoError> {
        Ok(PathBuf::from(self.get_str(key)?))
    }

    pub fn get_path_opt(&self, key: &str) -> Option<PathBuf> {
        self.values.get(key).map(PathBuf::from)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_key_value_pairs() {
        let config = Config::parse(
            "# comment\n\nEngines.Quantity.Quantity=10000\nEngines.Quantity.Threads=4\n",
        );
        assert_eq!(config.get_u64("Engines.Quantity.Quantity").unwrap(), 10_000);
        assert_eq!(config.get_u64("Engines.Quantity.Threads").unwrap(), 4);
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let config = Config::parse("");
        let err = config.get_str("missing").unwrap_err();
        assert_eq!(err.kind(), error::Kind::CONFIGURATION);
    }

    #[test]
    fn default_is_used_when_key_absent() {
        let config = Config::parse("");
        assert_eq!(config.get_str_or("Serialization.Delimiter", "\t"), "\t");
    }
}
