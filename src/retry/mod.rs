// ABOUTME: Retry module - rate-limited, validated calls against a flaky remote service.
// ABOUTME: Contains the backoff policy, the Service seam, and the retrying caller.

mod caller;
mod policy;
mod service;

pub use caller::RetryingCaller;
pub use policy::{Backoff, RetryPolicy};
pub use service::Service;

#[cfg(test)]
mod caller_test;
