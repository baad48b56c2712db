#![doc = include_str!("../README.md")]

pub mod baseline;
pub mod batch;
mod error;
pub mod pool;
mod series;
mod task;
pub mod workload;

pub use baseline::{SequentialRun, run_sequential};
pub use error::{Error, Result};
pub use pool::{
    config::{
        DEFAULT_MAX_BATCH_SIZE, DEFAULT_NUM_WORKERS, DEFAULT_QUEUE_CAPACITY, MAX_BATCH_SIZE_LIMIT,
        PoolConfig,
    },
    manager::WorkerPool,
};
pub use series::TimingSeries;
pub use task::{BatchId, CompletionRecord, Task, TaskId, TaskOutcome};
pub use workload::Workload;
