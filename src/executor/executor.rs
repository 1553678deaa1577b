// ABOUTME: Bounded-parallelism executor - maps a fallible async function over items.
// ABOUTME: Captures per-item failures and reports progress without aborting the batch.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::TaskOutcome;
use crate::error::{ExecutorError, TaskError};

/// How worker invocations are scheduled.
///
/// This is an explicit configuration choice, not a hidden detail: the right
/// strategy depends on the shape of the per-item work, which only the
/// caller knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Each item runs as a task on the shared runtime. Suits I/O-bound
    /// work such as network calls.
    Concurrent,

    /// Each item runs on a dedicated blocking thread. Suits CPU-bound work
    /// that would otherwise starve the runtime.
    Dedicated,
}

/// Progress observer: `(completed_count, total_count)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Failure observer: `(item, error)`, invoked as each failure is observed.
pub type ErrorCallback<T> = Arc<dyn Fn(&T, &TaskError) + Send + Sync>;

/// Configuration for a [`ConcurrentExecutor`].
pub struct ExecutorConfig<T> {
    /// Upper bound on concurrently processing items. Clamped to the item
    /// count at run time so no idle workers are created.
    pub max_workers: usize,

    /// Scheduling strategy.
    pub mode: ExecutionMode,

    /// Invoked exactly once per completed item, in completion order, with
    /// a strictly increasing completed count.
    pub progress: Option<ProgressCallback>,

    /// Invoked for each failed item, primarily for logging. A panicking
    /// observer is contained and does not abort the batch.
    pub on_error: Option<ErrorCallback<T>>,
}

impl<T> ExecutorConfig<T> {
    /// Create a config with the given worker bound and [`ExecutionMode::Concurrent`].
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            mode: ExecutionMode::Concurrent,
            progress: None,
            on_error: None,
        }
    }

    /// Select the scheduling strategy.
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach a progress observer.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(f));
        self
    }

    /// Attach a failure observer.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &TaskError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }
}

/// Bounded-parallelism driver applying a function to each item of a batch.
///
/// One item's failure never cancels or affects any other in-flight or
/// queued item; every submitted item produces exactly one [`TaskOutcome`].
/// The executor imposes no per-item timeout - a caller that wants one
/// enforces it inside the per-item function.
pub struct ConcurrentExecutor<T> {
    config: ExecutorConfig<T>,
}

impl<T> ConcurrentExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an executor from a configuration.
    pub fn new(config: ExecutorConfig<T>) -> Self {
        Self { config }
    }

    /// Process `items` with at most `max_workers` concurrent invocations
    /// of `process_fn`.
    ///
    /// Outcomes come back in completion order, which is not guaranteed to
    /// match submission order - callers that need submission order
    /// re-associate via [`TaskOutcome::item`]. An empty batch returns
    /// immediately without spawning a single worker.
    pub async fn run<R, F, Fut>(
        &self,
        items: Vec<T>,
        process_fn: F,
    ) -> Result<Vec<TaskOutcome<T, R>>, ExecutorError>
    where
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, anyhow::Error>> + Send + 'static,
    {
        if self.config.max_workers == 0 {
            return Err(ExecutorError::NoWorkers);
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total = items.len();
        let workers = self.config.max_workers.min(total);
        let batch_id = Uuid::new_v4();
        info!(
            %batch_id,
            items = total,
            workers,
            mode = ?self.config.mode,
            "starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let process_fn = Arc::new(process_fn);
        let mut set: JoinSet<TaskOutcome<T, R>> = JoinSet::new();

        for item in items {
            let semaphore = semaphore.clone();
            let process_fn = process_fn.clone();

            match self.config.mode {
                ExecutionMode::Concurrent => {
                    set.spawn(async move {
                        // The semaphore is never closed, so acquire cannot fail.
                        let _permit = semaphore.acquire_owned().await.ok();
                        let caught =
                            AssertUnwindSafe(process_fn(item.clone())).catch_unwind().await;
                        into_outcome(item, caught)
                    });
                }
                ExecutionMode::Dedicated => {
                    let handle = Handle::current();
                    set.spawn(async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        let fallback = item.clone();
                        let joined = tokio::task::spawn_blocking(move || {
                            let caught = std::panic::catch_unwind(AssertUnwindSafe(|| {
                                handle.block_on(process_fn(item.clone()))
                            }));
                            into_outcome(item, caught)
                        })
                        .await;
                        match joined {
                            Ok(outcome) => outcome,
                            // Panics are caught inside the closure; this is
                            // only reachable if the blocking task is aborted.
                            Err(e) => TaskOutcome::err(fallback, TaskError::Panicked(e.to_string())),
                        }
                    });
                }
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut completed = 0usize;

        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Worker tasks contain their own panics; a join error
                    // means the task was aborted externally and there is no
                    // item left to report.
                    warn!(%batch_id, error = %e, "worker task produced no outcome");
                    continue;
                }
            };

            completed += 1;

            if let Err(error) = &outcome.result {
                debug!(%batch_id, error = %error, "item failed");
                if let Some(cb) = &self.config.on_error {
                    let contained = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        cb(&outcome.item, error);
                    }));
                    if contained.is_err() {
                        warn!(%batch_id, "error callback panicked; continuing");
                    }
                }
            }

            if let Some(cb) = &self.config.progress {
                let contained = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    cb(completed, total);
                }));
                if contained.is_err() {
                    warn!(%batch_id, "progress callback panicked; continuing");
                }
            }

            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(%batch_id, completed, failed, "batch finished");
        Ok(outcomes)
    }
}

/// Fold a caught per-item result into an outcome.
fn into_outcome<T, R>(
    item: T,
    caught: Result<Result<R, anyhow::Error>, Box<dyn Any + Send>>,
) -> TaskOutcome<T, R> {
    match caught {
        Ok(Ok(value)) => TaskOutcome::ok(item, value),
        Ok(Err(e)) => TaskOutcome::err(item, TaskError::Failed(e)),
        Err(payload) => TaskOutcome::err(item, TaskError::Panicked(panic_message(&*payload))),
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
