// ABOUTME: Defines all error types for the fanout library using thiserror.
// ABOUTME: Each submodule has its own error enum, unified under FanoutError.

/// Top-level error type for the fanout library.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("rate limiter error: {0}")]
    Limiter(#[from] LimiterError),

    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("call error: {0}")]
    Call(#[from] CallError),
}

/// Errors from rate limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LimiterError {
    /// A zero budget could never admit a call; every waiter would sleep forever.
    #[error("max_calls_per_minute must be at least 1")]
    ZeroBudget,
}

/// Errors that abort an executor batch before any work is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("max_workers must be at least 1")]
    NoWorkers,
}

/// A failure captured while processing one item of a batch.
///
/// Task errors are isolated to the owning item's outcome and never
/// propagate to sibling items or to the caller of `run`.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The per-item function returned an error.
    #[error("processing failed: {0}")]
    Failed(#[source] anyhow::Error),

    /// The per-item function panicked.
    #[error("processing panicked: {0}")]
    Panicked(String),
}

/// Errors from a retried remote call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The service reported its rate quota was exceeded.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Network or 5xx-class failure.
    #[error("transient service error: {0}")]
    Transient(String),

    /// The transport succeeded but the payload is missing the expected content.
    #[error("invalid response shape: {0}")]
    InvalidResponse(String),

    /// Programming or configuration error, such as missing credentials.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every attempt in the budget was consumed without a usable payload.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<CallError>,
    },
}

impl CallError {
    /// Whether the retrying caller may spend another attempt on this error.
    ///
    /// Rate-limit, transient, and malformed-response failures are worth
    /// retrying; configuration errors and an exhausted budget are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CallError::RateLimited(_) | CallError::Transient(_) | CallError::InvalidResponse(_)
        )
    }
}
