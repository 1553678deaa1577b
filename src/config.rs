// ABOUTME: Batch configuration - named knobs for rate limiting, workers, and retries.
// ABOUTME: Defaults mirror the workflow constants the library was built around.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LimiterError;
use crate::executor::ExecutionMode;
use crate::limiter::RateLimiter;
use crate::retry::{Backoff, RetryPolicy};

/// Configuration for a fan-out workload.
///
/// Every knob is named and independently settable; none of them implies
/// another. The struct serializes cleanly so batch settings can live in a
/// config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Admissions allowed per trailing minute.
    pub max_calls_per_minute: usize,

    /// Upper bound on concurrently processing items.
    pub max_workers: usize,

    /// How workers are scheduled.
    pub mode: ExecutionMode,

    /// Attempt budget per remote call, including the first attempt.
    pub max_attempts: u32,

    /// Delay policy between attempts.
    pub backoff: Backoff,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_calls_per_minute: 60,
            max_workers: 4,
            mode: ExecutionMode::Concurrent,
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(5)),
        }
    }
}

impl Config {
    /// Build a rate limiter for this configuration.
    pub fn limiter(&self) -> Result<RateLimiter, LimiterError> {
        RateLimiter::new(self.max_calls_per_minute)
    }

    /// Build a retry policy for this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff.clone(),
        }
    }
}
