//! The [`WorkerPool`]: a fixed set of workers draining one shared bounded
//! queue.
//!
//! The pool is built once at startup and shared (typically behind an [`Arc`])
//! by everything that submits batches. Each call to
//! [`WorkerPool::run_batch`] allocates a fresh [`BatchId`], registers a
//! dedicated result channel for it, dispatches its tasks, and collects exactly
//! its own outcomes. Overlapping batches are therefore isolated from each
//! other even though they share the same queue and workers.
//!
//! Shutdown is coordinated through two [`CancellationToken`]s: the first makes
//! the pool reject new batches, the second abandons whatever is still in
//! flight once the drain window has elapsed. Every worker is then asked to
//! stop.

use super::{
    config::PoolConfig,
    registry::BatchRegistry,
    request::WorkRequest,
    worker::{SharedQueue, worker_loop},
};
use crate::{
    batch::{collector::Collector, dispatcher::dispatch},
    error::{Error, Result},
    series::TimingSeries,
    task::BatchId,
};
use core::time::Duration;
use portable_atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::{
    sync::{Mutex, mpsc, oneshot},
    time::{Instant, sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// A pool of long-lived workers consuming from one shared bounded queue.
pub struct WorkerPool {
    queue: mpsc::Sender<WorkRequest>,
    registry: Arc<BatchRegistry>,
    next_batch: AtomicU64,
    batches_inflight: Arc<AtomicUsize>,
    num_workers: usize,
    max_batch_size: usize,
    shutdown_timeout: Duration,
    closing: CancellationToken,
    shutdown_token: CancellationToken,
}

impl WorkerPool {
    /// Validates `config` and spawns `config.num_workers` worker tasks onto
    /// the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the worker count or queue capacity
    /// is zero, or the workload is malformed.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let queue: SharedQueue = Arc::new(Mutex::new(rx));
        let registry = Arc::new(BatchRegistry::new());

        for worker_id in 1..=config.num_workers {
            tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&registry),
                config.workload.clone(),
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Spawned {} workers (queue capacity {}, workload {:?})",
            config.num_workers,
            config.queue_capacity,
            config.workload
        );

        Ok(Self {
            queue: tx,
            registry,
            next_batch: AtomicU64::new(1),
            batches_inflight: Arc::new(AtomicUsize::new(0)),
            num_workers: config.num_workers,
            max_batch_size: config.max_batch_size,
            shutdown_timeout: config.shutdown_timeout,
            closing: CancellationToken::new(),
            shutdown_token: CancellationToken::new(),
        })
    }

    pub const fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of batches currently between dispatch and collection.
    pub fn batches_inflight(&self) -> usize {
        self.batches_inflight.load(Ordering::Acquire)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.closing.is_cancelled()
    }

    /// Allocates the next batch identifier.
    ///
    /// Uses a relaxed atomic increment; identifiers only need to be unique.
    fn next_batch_id(&self) -> BatchId {
        BatchId::new(self.next_batch.fetch_add(1, Ordering::Relaxed))
    }

    /// Runs one batch of `count` tasks and returns their durations ordered by
    /// task identifier.
    ///
    /// With `deadline = None` this waits until every task has completed, with
    /// no upper bound. With a deadline, the whole batch (dispatch included)
    /// must finish within it.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] if shutdown has begun.
    /// - [`Error::InvalidBatch`] if `count` exceeds the configured maximum.
    /// - [`Error::Starvation`] if the deadline expires.
    /// - [`Error::TaskFailed`] if a worker reports a failure.
    /// - [`Error::ChannelError`] if the queue has closed.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(batch = tracing::field::Empty)))]
    pub async fn run_batch(&self, count: usize, deadline: Option<Duration>) -> Result<TimingSeries> {
        if self.closing.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        if count > self.max_batch_size {
            return Err(Error::InvalidBatch {
                reason: format!(
                    "Count {count} exceeds maximum allowed ({})",
                    self.max_batch_size
                ),
            });
        }

        let batch = self.next_batch_id();
        #[cfg(feature = "tracing")]
        tracing::Span::current().record("batch", tracing::field::display(batch));

        let deadline = deadline.map(|d| Instant::now() + d);
        let _inflight = InflightGuard::new(Arc::clone(&self.batches_inflight));

        // Register before dispatching so no outcome can beat its route.
        let collector = Collector::new(self.registry.register(batch, count), count);

        let run = async {
            dispatch(&self.queue, batch, count, deadline).await?;
            collector.collect(deadline).await
        };

        // Abandon the batch if the drain window closes underneath it.
        tokio::select! {
            res = run => {
                #[cfg(feature = "tracing")]
                match &res {
                    Ok(series) => tracing::debug!("Batch {batch} completed {} tasks", series.len()),
                    Err(e) => tracing::warn!("Batch {batch} failed: {e}"),
                }
                res
            }
            () = self.shutdown_token.cancelled() => Err(Error::ServiceShutdown),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Stops accepting new batches.
    /// - Waits (up to the configured shutdown timeout) for in-flight batches
    ///   to finish, then fails the stragglers with [`Error::ServiceShutdown`].
    /// - Sends a [`WorkRequest::Shutdown`] per worker and waits up to 3
    ///   seconds for each acknowledgement.
    ///
    /// Calling this more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; failures to reach individual workers are logged.
    pub async fn shutdown(&self) -> Result<()> {
        if self.closing.is_cancelled() {
            return Ok(());
        }

        // === Phase 0: Stop accepting new batches ===
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new batches");
        self.closing.cancel();

        // === Phase 1: Wait for in-flight batches to drain ===
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Draining in-flight batches ({} active)",
            self.batches_inflight()
        );
        let drain_result = timeout(self.shutdown_timeout, async {
            while self.batches_inflight() > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("All in-flight batches drained successfully");
            }
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Graceful drain timed out ({} batches still active)",
                    self.batches_inflight()
                );
            }
        }

        // === Phase 2: Abandon any remaining batches ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling remaining batches via shutdown token");
        self.shutdown_token.cancel();

        // === Phase 3: Notify workers to shut down ===
        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.num_workers);

        for _i in 0..self.num_workers {
            let (tx, rx) = oneshot::channel();
            match timeout(
                Duration::from_secs(3),
                self.queue.send(WorkRequest::Shutdown { response: tx }),
            )
            .await
            {
                Ok(Ok(())) => shutdown_handles.push(rx),
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Failed to send shutdown request {_i}: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Timed out queueing shutdown request {_i}");
                }
            }
        }

        let timeout_futures = shutdown_handles.into_iter().map(|rx| async move {
            match timeout(Duration::from_secs(3), rx).await {
                Ok(Ok(())) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker shutdown acknowledged");
                }
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker dropped its shutdown acknowledgement: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker shutdown timed out");
                }
            }
        });

        futures::future::join_all(timeout_futures).await;

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}

/// Tracks a batch as in flight for as long as it is alive.
struct InflightGuard(Arc<AtomicUsize>);

impl InflightGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
