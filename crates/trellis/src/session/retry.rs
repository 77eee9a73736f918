use trellis_core::Error;

use std::time::Duration;

/// Decides whether a failed operation is attempted again.
pub trait RetryPolicy: Send + Sync {
    /// `attempt` counts from zero.
    fn should_retry(&self, attempt: u32, error: &Error) -> bool;

    fn delay(&self, attempt: u32) -> Duration;
}

/// Never retries.
#[derive(Debug, Clone)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn should_retry(&self, _attempt: u32, _error: &Error) -> bool {
        false
    }

    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Retries up to `max_attempts` times, waiting `interval` in between.
///
/// Mapping errors and stale objects fail the same way on every attempt and
/// are never retried.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    max_attempts: u32,
}

impl FixedInterval {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        FixedInterval {
            interval,
            max_attempts,
        }
    }
}

impl RetryPolicy for FixedInterval {
    fn should_retry(&self, attempt: u32, error: &Error) -> bool {
        attempt < self.max_attempts
            && !error.any(|err| {
                err.is_invalid_mapping() || err.is_stale_object() || err.is_mandatory_relation()
            })
    }

    fn delay(&self, _attempt: u32) -> Duration {
        self.interval
    }
}
