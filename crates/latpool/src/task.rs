//! Identifiers and records exchanged between the dispatcher, the workers, and
//! the collector.

use core::fmt;
use core::time::Duration;

/// One unit of synthetic work within a batch, numbered `1..=N`.
pub type TaskId = usize;

/// Identifies one client-initiated batch for the lifetime of a pool.
///
/// Every task is tagged with the batch it belongs to so that workers can route
/// their completion records back to the right collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(u64);

impl BatchId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A task as it travels through the shared queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub batch: BatchId,
    pub id: TaskId,
}

/// The `(identifier, elapsed)` pair a worker emits after finishing a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionRecord {
    pub task: TaskId,
    pub duration: Duration,
}

/// What a worker reports for a single task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The workload finished; carries the measured wall-clock time.
    Completed(CompletionRecord),

    /// The workload could not finish (for example, it panicked).
    Failed { task: TaskId, cause: String },
}

impl TaskOutcome {
    pub const fn task(&self) -> TaskId {
        match self {
            Self::Completed(record) => record.task,
            Self::Failed { task, .. } => *task,
        }
    }
}
