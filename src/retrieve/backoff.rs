//! Bounded backoff delays for in-strategy retries.
//!
//! Only transient failures retry in place, and each retry waits a short
//! exponentially growing delay with jitter. The decision of *whether* to
//! retry lives with the orchestrator (it follows the classifier's
//! disposition); this policy only answers *how long* to wait.

use std::time::Duration;

use rand::Rng;

/// Default base delay before the first retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default delay cap. Kept low: the whole request runs under a wall-clock
/// budget, and long sleeps are better spent on the next strategy.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Default multiplier applied each attempt.
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Maximum jitter added to each delay.
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Delay schedule for in-strategy retries.
///
/// Delay formula: `min(base * multiplier^(attempt-1), max) + jitter`.
/// With defaults the schedule is roughly 1s, 2s, 4s, 8s, 8s...
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy with custom settings.
    #[must_use]
    pub fn new(base_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            max_delay,
            multiplier,
        }
    }

    /// Returns the delay before retrying after failed attempt `attempt`
    /// (1-indexed: the delay after the first failure is `delay_for(1)`).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = f64::from(attempt.saturating_sub(1));
        let scaled_ms = self.base_delay.as_millis() as f64 * self.multiplier.powf(exponent);
        let capped_ms = scaled_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + jitter()
    }
}

/// Random jitter in `0..=MAX_JITTER`, spreading out simultaneous retries.
fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(0..=MAX_JITTER.as_millis() as u64))
}
