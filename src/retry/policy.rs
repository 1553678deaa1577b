// ABOUTME: Retry attempt budget and backoff delay policy.
// ABOUTME: Fixed delay is the default; exponential growth is available where it pays off.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay inserted between retry attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(Duration),

    /// Delay grows by `multiplier` per failed attempt, capped at `max`.
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to sleep before the retry that follows `failed_attempts` failures.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        match self {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let factor = multiplier.powi(failed_attempts.saturating_sub(1) as i32);
                let scaled = initial.as_secs_f64() * factor;
                Duration::from_secs_f64(scaled.min(max.as_secs_f64()))
            }
        }
    }
}

/// Attempt budget and backoff for a retried remote call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. The budget is finite: a call
    /// never retries forever.
    pub max_attempts: u32,

    /// Delay policy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(5)),
        }
    }
}
