//! Retry policies.

use std::fmt;
use std::time::Duration;

use rand::Rng;

/// Decides whether a failed attempt is retried, and after how long.
pub trait Retryer: Send + Sync + fmt::Debug {
    /// Delay before attempt `attempt + 1`, or `None` to give up.
    ///
    /// `attempt` counts the attempts already made (starting at 1).
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl Retryer for NeverRetry {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Backoff growing by half the previous delay per attempt, bounded by a maximum
/// number of attempts.
#[derive(Debug, Clone)]
pub struct DefaultRetryer {
    /// Base delay in milliseconds.
    pub period_ms: u64,
    /// Upper bound for a single delay in milliseconds.
    pub max_period_ms: u64,
    /// Total attempts including the first one.
    pub max_attempts: u32,
}

impl DefaultRetryer {
    pub fn new(period_ms: u64, max_period_ms: u64, max_attempts: u32) -> Self {
        Self {
            period_ms,
            max_period_ms,
            max_attempts,
        }
    }
}

impl Default for DefaultRetryer {
    fn default() -> Self {
        Self::new(100, 1000, 5)
    }
}

impl Retryer for DefaultRetryer {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.interval(attempt))
    }
}

impl DefaultRetryer {
    /// `period * 1.5^(attempt - 1)`, capped at `max_period`, plus up to 10% jitter.
    fn interval(&self, attempt: u32) -> Duration {
        let growth = 1.5f64.powi(attempt.saturating_sub(1) as i32);
        let delay_ms = ((self.period_ms as f64) * growth).min(self.max_period_ms as f64) as u64;

        let jitter_range = delay_ms / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };
        Duration::from_millis(delay_ms + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_retry() {
        assert_eq!(NeverRetry.next_delay(1), None);
    }

    #[test]
    fn test_default_retryer_stops_at_max_attempts() {
        let retryer = DefaultRetryer::new(10, 100, 3);
        assert!(retryer.next_delay(1).is_some());
        assert!(retryer.next_delay(2).is_some());
        assert_eq!(retryer.next_delay(3), None);
    }

    #[test]
    fn test_interval_grows_and_caps() {
        let retryer = DefaultRetryer::new(100, 1000, 20);
        let first = retryer.next_delay(1).unwrap().as_millis();
        assert!((100..110).contains(&first));
        let second = retryer.next_delay(2).unwrap().as_millis();
        assert!((150..165).contains(&second));
        let capped = retryer.next_delay(15).unwrap().as_millis();
        assert!((1000..1100).contains(&capped));
    }
}
