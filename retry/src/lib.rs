mod policy;

pub use policy::BackoffPolicy;

use error::{DynamoError, Kind};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for a [`RetryExecutor`], as spec.md §4.4/§8: a fixed
/// attempt budget, a backoff policy, and two `Kind` allow-lists that
/// decide whether a given failure is retried at all.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub attempts: u32,
    pub backoff: BackoffPolicy,
    pub sleep: Duration,
    /// Kinds that are never retried even if they also match `retry_kinds`.
    /// Checked first.
    pub fail_kinds: Vec<Kind>,
    /// Kinds that are retried. Empty means "retry everything not in
    /// `fail_kinds`".
    pub retry_kinds: Vec<Kind>,
    pub show_stack_trace: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            attempts: 3,
            backoff: BackoffPolicy::Static,
            sleep: Duration::from_secs(1),
            fail_kinds: Vec::new(),
            retry_kinds: Vec::new(),
            show_stack_trace: false,
        }
    }
}

impl RetryConfig {
    /// Decides whether `kind` should be retried. A match against any
    /// `fail_kinds` entry wins over a match against `retry_kinds`.
    fn should_retry(&self, kind: &Kind) -> bool {
        if self.fail_kinds.iter().any(|k| kind.matches(k)) {
            return false;
        }
        if self.retry_kinds.is_empty() {
            return true;
        }
        self.retry_kinds.iter().any(|k| kind.matches(k))
    }
}

/// Runs an operation under a [`RetryConfig`], implementing the
/// CALL -> DONE / FAIL / SLEEP -> CALL -> ... -> EXHAUSTED -> FAIL
/// state machine of spec.md §4.4.
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        RetryExecutor { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Calls `op` until it succeeds, a non-retryable error is hit, or the
    /// attempt budget (`config.attempts`) is exhausted. Between attempts,
    /// sleeps for a duration derived from `config.backoff` and the attempt
    /// number.
    pub fn deliver<F>(&self, mut op: F) -> Result<(), DynamoError>
    where
        F: FnMut() -> Result<(), DynamoError>,
    {
        let mut attempt = 1u32;
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(err) => {
                    let kind = err.kind();
                    if !self.config.should_retry(&kind) {
                        warn!(
                            "attempt {} failed with non-retryable kind {}: {}",
                            attempt,
                            kind,
                            err.describe(self.config.show_stack_trace)
                        );
                        return Err(err);
                    }
                    if attempt >= self.config.attempts {
                        warn!(
                            "Maximum attempts of {} reached, giving up: {}",
                            self.config.attempts,
                            err.describe(self.config.show_stack_trace)
                        );
                        return Err(err);
                    }
                    let delay = self.config.backoff.delay(self.config.sleep, attempt);
                    info!(
                        "attempt {} failed ({}), retrying in {:?}",
                        attempt, kind, delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
