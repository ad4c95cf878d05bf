use error::DynamoError;
use sink::Sink;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use threading::WorkerPool;
use tracing::error;
use util::QueueMonitor;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(60 * 60);

/// Replays previously produced files through the configured sink (§4.5
/// "Replay engine"). One task per matching file; each task picks a
/// codec from its own extension, so files of mixed formats may be
/// replayed in a single run.
pub struct ReplayEngine {
    files: Vec<PathBuf>,
    sink: Arc<dyn Sink>,
    delimiter: String,
    schema_path: Option<PathBuf>,
    threads: usize,
    schema: Vec<&'static str>,
}

impl ReplayEngine {
    /// Lists `path` for entries whose file name contains `substring`. A
    /// missing path or an empty match set is a terminal configuration
    /// error (§4.5, §8 scenario 6).
    pub fn discover(
        path: &std::path::Path,
        substring: &str,
        sink: Arc<dyn Sink>,
        delimiter: &str,
        schema_path: Option<PathBuf>,
        threads: usize,
        schema: Vec<&'static str>,
    ) -> Result<Self, DynamoError> {
        let entries = fs::read_dir(path).map_err(|e| {
            DynamoError::Configuration(format!("Engines.Replay.Path '{}' unreadable: {e}", path.display()))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(DynamoError::Io)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.contains(substring) {
                files.push(entry.path());
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(DynamoError::Configuration(format!(
                "no files under '{}' match Engines.Replay.Files='{}'",
                path.display(),
                substring
            )));
        }

        Ok(ReplayEngine {
            files,
            sink,
            delimiter: delimiter.to_string(),
            schema_path,
            threads,
            schema,
        })
    }

    pub fn produce(self) -> Result<(), DynamoError> {
        let pool = WorkerPool::new("replay", self.threads.max(1), self.threads.max(1) * 4);
        let queue = pool.queue_handle();
        let monitor = QueueMonitor::spawn("replay", move || queue.len());

        for file in self.files {
            let sink = self.sink.clone();
            let delimiter = self.delimiter.clone();
            let schema_path = self.schema_path.clone();
            let schema = self.schema.clone();
            pool.submit(move || {
                if let Err(err) = replay_file(&file, &sink, &delimiter, schema_path.as_deref(), &schema) {
                    error!("replay engine task failed for '{}': {}", file.display(), err.describe(false));
                }
            });
        }

        pool.join(SHUTDOWN_GRACE);
        monitor.stop();
        Ok(())
    }
}

fn replay_file(
    path: &std::path::Path,
    sink: &Arc<dyn Sink>,
    delimiter: &str,
    schema_path: Option<&std::path::Path>,
    schema: &[&'static str],
) -> Result<(), DynamoError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("txt");
    let codec = codec::for_extension(extension, delimiter, schema_path)?;

    let file = fs::File::open(path).map_err(DynamoError::Io)?;
    let reader = BufReader::new(file);

    for line in reader.lines() {
        let line = line.map_err(DynamoError::Io)?;
        // An empty line terminates reading for this file (§4.5).
        if line.is_empty() {
            break;
        }
        let decoded = codec.decode(line.as_bytes(), schema)?;
        let owned: Vec<(&'static str, value::Value)> = decoded
            .into_iter()
            .zip(schema.iter())
            .map(|((_, value), name)| (*name, value))
            .collect();
        sink.send(&owned)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sink::DummySink;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn discover_matches_files_by_substring() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("events_a.json"), "").unwrap();
        std::fs::write(dir.path().join("events_b.json"), "").unwrap();
        std::fs::write(dir.path().join("other.tsv"), "").unwrap();

        let sink: Arc<dyn Sink> = Arc::new(DummySink::new());
        let engine = ReplayEngine::discover(dir.path(), "events", sink, ",", None, 2, vec!["id"]).unwrap();
        assert_eq!(engine.files.len(), 2);
    }

    #[test]
    fn discover_errors_on_no_matches() {
        let dir = tempdir().unwrap();
        let sink: Arc<dyn Sink> = Arc::new(DummySink::new());
        let result = ReplayEngine::discover(dir.path(), "events", sink, ",", None, 1, vec!["id"]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_line_terminates_a_file_early() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events_a.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{{\"id\":1}}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{\"id\":2}}").unwrap();
        drop(file);

        let dummy = Arc::new(DummySink::new());
        let sink: Arc<dyn Sink> = dummy.clone();
        let engine = ReplayEngine::discover(dir.path(), "events", sink, ",", None, 1, vec!["id"]).unwrap();
        engine.produce().unwrap();
        assert_eq!(dummy.len(), 1);
    }
}
