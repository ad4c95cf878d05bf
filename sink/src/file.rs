use crate::Sink;
use codec::Codec;
use error::DynamoError;
use std::collections::HashMap;
use std::fs::{File as StdFile, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use value::Value;

/// Writes encoded records to the filesystem. Per Design Note 9d, a
/// registry of already-open append handles is kept keyed by resolved
/// path so a record never reopens the file it was just written to; the
/// registry also tracks whether `codec.header()` has already been
/// emitted for a given path so it is written exactly once, on first
/// creation, even when the path did not exist before this process
/// started.
pub struct FileSink {
    root: PathBuf,
    codec: Box<dyn Codec>,
    handles: Mutex<HashMap<PathBuf, StdFile>>,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>, codec: Box<dyn Codec>) -> Self {
        FileSink {
            root: root.into(),
            codec,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Writes to `self.root` directly (used by the quantity and replay
    /// engines, which target a single output file).
    pub fn send_default(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError> {
        let root = self.root.clone();
        self.send_to(fields, &root)
    }

    /// Writes to `path`, relative to nothing (absolute or
    /// caller-resolved). Used by the hourly-range engine, which computes
    /// a fresh `YYYY/MM/DD/HH00` path per task and never shares mutable
    /// sink state across tasks (Design Note 9e).
    pub fn send_to(&self, fields: &[(&'static str, Value)], path: &Path) -> Result<(), DynamoError> {
        let encoded = self.codec.encode(fields)?;
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| DynamoError::Construction("file sink handle registry poisoned".into()))?;

        // §4.3: a brand-new file gets the codec's one-time header and its
        // first record with no leading separator; a file that already had
        // bytes (from an earlier run, or an earlier record this run) gets
        // the separator prepended before the new payload (§8 scenario 2).
        let needs_separator = if handles.contains_key(path) {
            true
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(DynamoError::Io)?;
                }
            }
            let is_new = !path.exists();
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(DynamoError::Io)?;
            if is_new {
                if let Some(header) = self.codec.header() {
                    file.write_all(&header).map_err(DynamoError::Io)?;
                }
            }
            handles.insert(path.to_path_buf(), file);
            !is_new
        };

        let file = handles.get_mut(path).expect("just inserted");
        if needs_separator {
            file.write_all(self.codec.record_separator()).map_err(DynamoError::Io)?;
        }
        file.write_all(&encoded).map_err(DynamoError::Io)?;
        Ok(())
    }
}

impl Sink for FileSink {
    fn send(&self, fields: &[(&'static str, Value)]) -> Result<(), DynamoError> {
        self.send_default(fields)
    }

    fn flush(&self) -> Result<(), DynamoError> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| DynamoError::Construction("file sink handle registry poisoned".into()))?;
        for file in handles.values_mut() {
            file.flush().map_err(DynamoError::Io)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::DelimitedCodec;
    use tempfile::tempdir;

    #[test]
    fn separator_is_prepended_between_records_not_trailing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let sink = FileSink::new(path.clone(), Box::new(DelimitedCodec::new(",")));

        sink.send(&[("name", Value::text("ada"))]).unwrap();
        sink.send(&[("name", Value::text("grace"))]).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "ada,\r\ngrace,");
    }

    #[test]
    fn reopening_a_file_from_a_previous_run_still_prepends_a_separator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "ada,").unwrap();

        let sink = FileSink::new(path.clone(), Box::new(DelimitedCodec::new(",")));
        sink.send(&[("name", Value::text("grace"))]).unwrap();
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "ada,\r\ngrace,");
    }

    #[test]
    fn send_to_creates_nested_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("2026/07/26/1400");
        let sink = FileSink::new(dir.path(), Box::new(DelimitedCodec::new(",")));

        sink.send_to(&[("name", Value::text("ada"))], &path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn reuses_open_handle_for_repeated_writes_to_same_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let sink = FileSink::new(path.clone(), Box::new(DelimitedCodec::new(",")));

        for i in 0..5 {
            sink.send(&[("n", Value::int(i))]).unwrap();
        }

        let handles = sink.handles.lock().unwrap();
        assert_eq!(handles.len(), 1);
    }
}
