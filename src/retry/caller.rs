// ABOUTME: RetryingCaller - drives a Service through rate limiting, retries, and backoff.
// ABOUTME: Retryable failures consume attempts; configuration errors abort immediately.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::policy::RetryPolicy;
use super::service::Service;
use crate::error::CallError;
use crate::limiter::RateLimiter;

/// Wraps a [`Service`] with rate-limiter gating, a bounded attempt budget,
/// and backoff between attempts.
///
/// Each call walks attempt by attempt: gate on the limiter, invoke, then
/// validate. Retryable failures (rate limits, transient errors, malformed
/// responses) consume one attempt and back off; configuration errors abort
/// immediately without consuming further attempts. Once the budget is
/// spent the caller returns [`CallError::Exhausted`] carrying the last
/// error - an explicit failure value, so the orchestrating layer can tell
/// "the service answered with nothing" apart from "the service never
/// answered".
pub struct RetryingCaller<S> {
    service: S,
    policy: RetryPolicy,
    limiter: Option<Arc<RateLimiter>>,
}

impl<S: Service> RetryingCaller<S> {
    /// Wrap a service with the default policy and no rate limiter.
    pub fn new(service: S) -> Self {
        Self {
            service,
            policy: RetryPolicy::default(),
            limiter: None,
        }
    }

    /// Replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Gate every attempt through a shared rate limiter.
    ///
    /// Attachment is per caller: call sites that are not metered simply
    /// never attach one.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Invoke the service, retrying transient failures up to the budget.
    pub async fn call(&self, request: &S::Request) -> Result<S::Payload, CallError> {
        let mut last_error: Option<CallError> = None;

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                let delay = self.policy.backoff.delay_for(attempt - 1);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }

            if let Some(limiter) = &self.limiter {
                limiter.wait_if_needed().await;
            }

            let result = match self.service.invoke(request).await {
                Ok(response) => self.service.extract(response),
                Err(e) => Err(e),
            };

            match result {
                Ok(payload) => {
                    if attempt > 1 {
                        debug!(attempt, "call succeeded after retries");
                    }
                    return Ok(payload);
                }
                Err(e) if !e.is_retryable() => {
                    error!(error = %e, "non-retryable error, aborting");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        // A zero-attempt policy reaches here without ever invoking.
        let source = Box::new(
            last_error.unwrap_or_else(|| CallError::Transient("no attempt was made".to_string())),
        );
        error!(attempts = self.policy.max_attempts, error = %source, "retry budget exhausted");
        Err(CallError::Exhausted {
            attempts: self.policy.max_attempts,
            source,
        })
    }
}
