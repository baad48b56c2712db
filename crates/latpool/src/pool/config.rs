use crate::{
    error::{Error, Result},
    workload::Workload,
};
use core::time::Duration;

/// Default number of long-lived workers.
pub const DEFAULT_NUM_WORKERS: usize = 10;

/// Default capacity of the shared task queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// Default upper bound on the number of tasks in one batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100_000;

/// Largest `max_batch_size` a pool accepts. Each batch's result channel is
/// sized to its task count and cannot exceed this many slots.
pub const MAX_BATCH_SIZE_LIMIT: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Default time allowed for in-flight batches to drain during shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Settings fixed for the lifetime of a [`WorkerPool`].
///
/// [`WorkerPool`]: crate::WorkerPool
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of workers draining the shared queue.
    pub num_workers: usize,

    /// Capacity of the shared task queue. The dispatcher suspends while it is
    /// full.
    pub queue_capacity: usize,

    /// Largest batch accepted by [`WorkerPool::run_batch`]. Must not exceed
    /// [`MAX_BATCH_SIZE_LIMIT`].
    ///
    /// [`WorkerPool::run_batch`]: crate::WorkerPool::run_batch
    pub max_batch_size: usize,

    /// How long shutdown waits for in-flight batches before cancelling them.
    pub shutdown_timeout: Duration,

    /// Work performed for every task.
    pub workload: Workload,
}

impl PoolConfig {
    pub fn new(workload: Workload) -> Self {
        Self {
            workload,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    #[must_use]
    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    #[must_use]
    pub const fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig {
                reason: "num_workers must be greater than 0".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "queue_capacity must be greater than 0".to_string(),
            });
        }
        if self.max_batch_size > MAX_BATCH_SIZE_LIMIT {
            return Err(Error::InvalidConfig {
                reason: format!(
                    "max_batch_size {} exceeds the limit of {MAX_BATCH_SIZE_LIMIT}",
                    self.max_batch_size
                ),
            });
        }
        if let Workload::Sleep { min, max } = &self.workload {
            if min > max {
                return Err(Error::InvalidConfig {
                    reason: format!("sleep range is empty ({min:?} > {max:?})"),
                });
            }
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_NUM_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            workload: Workload::default(),
        }
    }
}
