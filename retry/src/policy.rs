use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;

/// How the delay between retry attempts grows, per spec.md §4.4/§8.
/// `attempt` is 1-based (the attempt that just failed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Always `base`.
    Static,
    /// `base * attempt`.
    Linear,
    /// `base * attempt^2`.
    Exponential,
    /// `base * U[0, 2^(attempt+1))`, drawn uniformly over integers from
    /// `OsRng` (a cryptographically strong source, not a PRNG seeded from
    /// wall-clock time).
    Random,
}

impl BackoffPolicy {
    pub fn delay(&self, base: Duration, attempt: u32) -> Duration {
        match self {
            BackoffPolicy::Static => base,
            BackoffPolicy::Linear => base.saturating_mul(attempt),
            BackoffPolicy::Exponential => base.saturating_mul(attempt.saturating_mul(attempt)),
            BackoffPolicy::Random => {
                let exponent = attempt.saturating_add(1).min(31);
                let bound: u32 = 1u32 << exponent;
                let drawn = OsRng.random_range(0..bound);
                base.saturating_mul(drawn)
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "static" => Some(BackoffPolicy::Static),
            "linear" => Some(BackoffPolicy::Linear),
            "exponential" => Some(BackoffPolicy::Exponential),
            "random" => Some(BackoffPolicy::Random),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_backoff_is_constant() {
        let base = Duration::from_millis(100);
        assert_eq!(BackoffPolicy::Static.delay(base, 1), base);
        assert_eq!(BackoffPolicy::Static.delay(base, 5), base);
    }

    #[test]
    fn linear_backoff_scales_with_attempt() {
        let base = Duration::from_millis(100);
        assert_eq!(BackoffPolicy::Linear.delay(base, 3), Duration::from_millis(300));
    }

    #[test]
    fn exponential_backoff_scales_with_attempt_squared() {
        let base = Duration::from_millis(100);
        assert_eq!(BackoffPolicy::Exponential.delay(base, 1), Duration::from_millis(100));
        assert_eq!(BackoffPolicy::Exponential.delay(base, 3), Duration::from_millis(900));
    }

    #[test]
    fn random_backoff_stays_within_ceiling() {
        let base = Duration::from_millis(50);
        for attempt in 1..=4 {
            let ceiling = base.saturating_mul(1u32 << (attempt + 1));
            let drawn = BackoffPolicy::Random.delay(base, attempt);
            assert!(drawn < ceiling);
        }
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(BackoffPolicy::from_name("EXPONENTIAL"), Some(BackoffPolicy::Exponential));
        assert_eq!(BackoffPolicy::from_name("bogus"), None);
    }
}
