//! Error types for the worker pool.
//!
//! The synthetic workloads themselves never fail, so most of these variants
//! describe the pool's lifecycle or a batch that could not be completed.
//!
//! ## Error Cases
//! - `ServiceShutdown`: a batch was submitted after shutdown began.
//! - `ChannelError`: an internal queue or result channel closed unexpectedly.
//! - `TaskFailed`: a worker reported a failure (e.g. a panicking workload).
//! - `Starvation`: the batch deadline expired before every record arrived.
//! - `InvalidBatch`: the requested batch violates a configured limit.
//! - `InvalidRecord`: a worker reported an identifier outside the batch.
//! - `InvalidConfig`: the pool cannot be built from the given settings.

use crate::task::{BatchId, TaskId};

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the worker pool.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The pool is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A worker could not complete a task.
    #[error("Task {task} failed: {cause}")]
    TaskFailed { task: TaskId, cause: String },

    /// The deadline expired before all completion records were received.
    #[error("Batch {batch} starved: received {received} of {expected} records before the deadline")]
    Starvation {
        batch: BatchId,
        /// Records the collector had consumed when the deadline hit. Always
        /// 0 if the deadline hit during dispatch, since collection starts
        /// only after every task is enqueued; records already buffered in the
        /// batch channel are not counted.
        received: usize,
        expected: usize,
    },

    /// The batch request was rejected before dispatch.
    #[error("Invalid batch: {reason}")]
    InvalidBatch { reason: String },

    /// A completion record referenced an identifier outside `[1, N]` or one
    /// that was already reported.
    #[error("Batch {batch} received an invalid record for task {task}")]
    InvalidRecord { batch: BatchId, task: TaskId },

    #[error("Invalid pool configuration: {reason}")]
    InvalidConfig { reason: String },
}
