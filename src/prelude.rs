// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use fanout::prelude::*;` to get started quickly.

pub use crate::config::Config;
pub use crate::error::{CallError, ExecutorError, FanoutError, LimiterError, TaskError};
pub use crate::executor::{
    ConcurrentExecutor, ErrorCallback, ExecutionMode, ExecutorConfig, ProgressCallback,
    TaskOutcome,
};
pub use crate::limiter::RateLimiter;
pub use crate::retry::{Backoff, RetryPolicy, RetryingCaller, Service};
