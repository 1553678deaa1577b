// ABOUTME: Sliding-window rate limiter for API call throttling.
// ABOUTME: Admits at most max_calls within any trailing window, blocking excess callers.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::LimiterError;

/// Default window width; quotas are stated per minute.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Mutable state for the rate limiter, protected by a single mutex.
struct LimiterState {
    max_calls: usize,
    timestamps: VecDeque<Instant>,
}

impl LimiterState {
    /// Drop timestamps that have left the window. Half-open: an admission
    /// exactly `window` old is expired.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window rate limiter for API call throttling.
///
/// Records the admission time of each recent call and suspends callers once
/// `max_calls` admissions have happened within the trailing window. This is
/// an admission-control primitive, not an error signal: a gated call always
/// proceeds eventually, it just waits its turn.
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter with the default one-minute window.
    ///
    /// Returns [`LimiterError::ZeroBudget`] when `max_calls_per_minute` is
    /// zero rather than constructing a limiter that would never admit.
    pub fn new(max_calls_per_minute: usize) -> Result<Self, LimiterError> {
        Self::with_window(max_calls_per_minute, DEFAULT_WINDOW)
    }

    /// Create a limiter with an explicit window width.
    ///
    /// # Arguments
    ///
    /// * `max_calls` - Admissions allowed inside one window.
    /// * `window` - Trailing window width.
    pub fn with_window(max_calls: usize, window: Duration) -> Result<Self, LimiterError> {
        if max_calls == 0 {
            return Err(LimiterError::ZeroBudget);
        }

        Ok(Self {
            state: Mutex::new(LimiterState {
                max_calls,
                timestamps: VecDeque::new(),
            }),
            window,
        })
    }

    /// Replace the active budget.
    ///
    /// Safe to call while other tasks sit in [`wait_if_needed`]: sleepers
    /// re-check against the new budget when they wake. A caller already
    /// queued behind the old budget may still be admitted under it -
    /// reconfiguration is an operational action, not a mid-burst control.
    ///
    /// [`wait_if_needed`]: RateLimiter::wait_if_needed
    pub async fn configure(&self, max_calls: usize) -> Result<(), LimiterError> {
        if max_calls == 0 {
            return Err(LimiterError::ZeroBudget);
        }

        let mut state = self.state.lock().await;
        state.max_calls = max_calls;
        Ok(())
    }

    /// Wait until a call may proceed, then record its admission.
    ///
    /// The accounting and the decision to sleep come from one consistent
    /// snapshot under the mutex; the sleep itself runs with the lock
    /// released so other callers can make their own admission checks. A
    /// woken caller re-checks instead of admitting unconditionally - two
    /// sleepers waking together must not jointly exceed the budget.
    pub async fn wait_if_needed(&self) {
        loop {
            let wait = self.try_admit().await;
            if wait.is_zero() {
                return;
            }

            // Clock granularity varies across platforms; waits under 10ms
            // degrade into a lock-thrashing busy loop.
            let wait = wait.max(Duration::from_millis(10));
            debug!(wait_ms = wait.as_millis() as u64, "rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Attempt one admission without waiting.
    ///
    /// Returns `Duration::ZERO` on admission (the timestamp is recorded),
    /// otherwise the time until the oldest recorded call leaves the window.
    async fn try_admit(&self) -> Duration {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        state.prune(now, self.window);

        if state.timestamps.len() < state.max_calls {
            state.timestamps.push_back(now);
            return Duration::ZERO;
        }

        // Queue is full; the front entry is the next to expire.
        match state.timestamps.front() {
            Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
            None => Duration::ZERO,
        }
    }

    /// Number of admissions currently inside the window (for monitoring).
    ///
    /// Note: prunes expired timestamps as a side effect.
    pub async fn in_window(&self) -> usize {
        let mut state = self.state.lock().await;
        state.prune(Instant::now(), self.window);
        state.timestamps.len()
    }
}
