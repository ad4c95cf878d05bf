mod registry;

use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use engine::{EngineContext, HourlyRangeEngine, QuantityEngine, ReplayEngine};
use error::DynamoError;
use sink::Sink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;
use util::Config;
use value::{BlankFactory, Event, EventFactory, PersonFactory, RecordFactory, RecordFields};

const USAGE: &str = "usage: dynamo <engine-name> <record-type-name> <sink-name>";
const PROPERTIES_FILE: &str = "dynamo.properties";

fn main() {
    setup_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let exit_code = match run(&args) {
        Ok(()) => 0,
        Err(err) => {
            error!("{}", err.describe(true));
            1
        }
    };
    std::process::exit(exit_code);
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// §4.6: parses the three positional arguments, loads `dynamo.properties`,
/// constructs sink -> factory -> engine in that order, then calls
/// `engine.produce()`.
fn run(args: &[String]) -> Result<(), DynamoError> {
    let [engine_name, record_type, sink_name] = args else {
        return Err(DynamoError::Usage(USAGE.to_string()));
    };

    let config = Config::load(&PathBuf::from(PROPERTIES_FILE))?;
    let sink = registry::resolve_sink(sink_name, &config)?;

    if engine_name.as_str() == "replay" {
        let schema = schema_for(record_type)?;
        return run_replay(&config, sink, schema);
    }

    let retry = registry::resolve_retry(&config);
    match record_type.as_str() {
        "person" => run_for_factory(PersonFactory, engine_name, sink, retry, &config),
        "event" => run_for_factory(EventFactory, engine_name, sink, retry, &config),
        "object" => run_for_factory(BlankFactory, engine_name, sink, retry, &config),
        other => Err(DynamoError::Construction(format!(
            "no record type registered under name '{other}'"
        ))),
    }
}

fn run_for_factory<F: RecordFactory + 'static>(
    factory: F,
    engine_name: &str,
    sink: Arc<dyn Sink>,
    retry: retry::RetryExecutor,
    config: &Config,
) -> Result<(), DynamoError> {
    let context = EngineContext::new(factory, sink, retry);
    match engine_name {
        "quantity" => {
            let quantity = config.get_u64_or("Engines.Quantity.Quantity", 1_000);
            let threads = config.get_u64_or("Engines.Quantity.Threads", num_cpus() as u64 * 2) as usize;
            let sleepy_time = config.get_duration_or("Engines.Quantity.SleepyTime", Duration::ZERO);
            QuantityEngine::new(context, quantity, threads, sleepy_time).produce()
        }
        "hourly-range" => {
            let lower = config.get_u64_or("Engines.HourlyRange.LowerQuantity", 0);
            let upper = config.get_u64_or("Engines.HourlyRange.UpperQuantity", 100);
            let threads = config.get_u64_or("Engines.HourlyRange.Threads", num_cpus() as u64) as usize;
            let (start, end) = hourly_window(config)?;
            HourlyRangeEngine::new(context, start, end, lower, upper, threads).produce()
        }
        other => Err(DynamoError::Construction(format!(
            "no engine registered under name '{other}'"
        ))),
    }
}

fn run_replay(config: &Config, sink: Arc<dyn Sink>, schema: Vec<&'static str>) -> Result<(), DynamoError> {
    let path = config.get_path("Engines.Replay.Path")?;
    let files = config.get_str_or("Engines.Replay.Files", "");
    if files.is_empty() {
        return Err(DynamoError::Configuration(
            "Engines.Replay.Files must not be empty".to_string(),
        ));
    }
    let threads = config.get_u64_or("Engines.Replay.Threads", (num_cpus() / 2).max(1) as u64) as usize;
    let delimiter = config.get_str_or("Serialization.Delimiter", "\t");
    let schema_path = config.get_path_opt("Serialization.SchemaFile");

    let engine = ReplayEngine::discover(&path, files, sink, delimiter, schema_path, threads, schema)?;
    engine.produce()
}

/// Resolves `record-type-name` into the field-name schema a replay task
/// decodes positionally into — the replay engine has no factory to
/// derive this from, since it never calls `create()`.
fn schema_for(record_type: &str) -> Result<Vec<&'static str>, DynamoError> {
    match record_type {
        "person" => Ok(value::Person::field_names()),
        "event" => Ok(Event::field_names()),
        "object" => Ok(value::Blank::field_names()),
        other => Err(DynamoError::Construction(format!(
            "no record type registered under name '{other}'"
        ))),
    }
}

/// `Engines.HourlyRange.{Start,End}Date` default to `[now - 30d, now)`
/// (§4.5, format `yyyy/MM/dd`).
fn hourly_window(config: &Config) -> Result<(chrono::DateTime<Utc>, chrono::DateTime<Utc>), DynamoError> {
    let now = Utc::now();
    let default_start = now - ChronoDuration::days(30);

    let start = match config.get_str("Engines.HourlyRange.StartDate") {
        Ok(s) => parse_date(s)?,
        Err(_) => default_start,
    };
    let end = match config.get_str("Engines.HourlyRange.EndDate") {
        Ok(s) => parse_date(s)?,
        Err(_) => now,
    };
    Ok((start, end))
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<Utc>, DynamoError> {
    let date = NaiveDate::parse_from_str(raw, "%Y/%m/%d")
        .map_err(|e| DynamoError::Configuration(format!("invalid date '{raw}': {e}")))?;
    Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid")))
}

fn num_cpus() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn bare_invocation_is_a_usage_error() {
        let err = run(&[]).unwrap_err();
        assert_eq!(err.kind(), error::Kind::USAGE);
    }

    #[rstest]
    #[case("person", &["id", "name"])]
    #[case("event", &["device_id", "value", "timestamp"])]
    #[case("object", &[])]
    fn schema_for_known_record_types(#[case] record_type: &str, #[case] expected: &[&str]) {
        assert_eq!(schema_for(record_type).unwrap(), expected);
    }

    #[rstest]
    #[case("2026/07/26")]
    #[case("2000/01/01")]
    fn parse_date_accepts_yyyy_mm_dd(#[case] raw: &str) {
        assert!(parse_date(raw).is_ok());
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("07-26-2026").is_err());
    }

    #[test]
    fn unknown_record_type_is_a_construction_error() {
        let dir = tempfile::tempdir().unwrap();
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        std::fs::write("dynamo.properties", "").unwrap();

        let err = run(&[
            "quantity".to_string(),
            "spaceship".to_string(),
            "dummy".to_string(),
        ])
        .unwrap_err();

        std::env::set_current_dir(previous).unwrap();
        assert_eq!(err.kind(), error::Kind::CONSTRUCTION);
    }
}
