// ABOUTME: Concurrent executor module - bounded fan-out of per-item work.
// ABOUTME: Contains the executor, its configuration, and per-item outcomes.

mod executor;
mod outcome;

pub use executor::{
    ConcurrentExecutor, ErrorCallback, ExecutionMode, ExecutorConfig, ProgressCallback,
};
pub use outcome::TaskOutcome;
