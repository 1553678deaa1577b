// ABOUTME: Per-item result type produced by the concurrent executor.
// ABOUTME: Pairs each submitted item with its success value or captured error.

use crate::error::TaskError;

/// Outcome of processing one submitted item.
///
/// Exactly one of success or failure is present, carried as a `Result` so
/// failure handling is a data-flow concern rather than unwinding. The
/// executor returns outcomes in completion order; callers that need
/// submission order re-associate through [`item`](TaskOutcome::item).
#[derive(Debug)]
pub struct TaskOutcome<T, R> {
    /// The item as it was submitted.
    pub item: T,

    /// The success value or the captured per-item error.
    pub result: Result<R, TaskError>,
}

impl<T, R> TaskOutcome<T, R> {
    pub(crate) fn ok(item: T, value: R) -> Self {
        Self {
            item,
            result: Ok(value),
        }
    }

    pub(crate) fn err(item: T, error: TaskError) -> Self {
        Self {
            item,
            result: Err(error),
        }
    }

    /// True if the item was processed successfully.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The captured error, if the item failed.
    pub fn error(&self) -> Option<&TaskError> {
        self.result.as_ref().err()
    }
}
