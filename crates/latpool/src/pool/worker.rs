use super::{registry::BatchRegistry, request::WorkRequest};
use crate::{
    task::{CompletionRecord, Task, TaskOutcome},
    workload::Workload,
};
use std::{sync::Arc, time::Instant};
use tokio::sync::{Mutex, mpsc};

/// Receiving half of the shared task queue.
///
/// Every worker holds a clone of this handle and takes the lock only while
/// waiting for the next request, so at most one worker is parked on the
/// channel at a time and the rest queue up on the mutex.
pub type SharedQueue = Arc<Mutex<mpsc::Receiver<WorkRequest>>>;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// Each worker pulls from the queue shared by the whole pool, runs the
/// [`Workload`] for every task it receives, and routes a [`TaskOutcome`] back to
/// the task's batch through the [`BatchRegistry`].
///
/// This function is designed to be spawned as a Tokio task. It returns when it
/// receives [`WorkRequest::Shutdown`] or when the queue is closed and drained.
///
/// # Arguments
///
/// - `worker_id`: Numeric identifier for this worker, used in logs.
/// - `queue`: The pool's shared task queue.
/// - `registry`: Routes outcomes to the collector of each batch.
/// - `workload`: The synthetic work performed per task.
pub async fn worker_loop(
    worker_id: usize,
    queue: SharedQueue,
    registry: Arc<BatchRegistry>,
    workload: Workload,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    loop {
        // Release the lock before running the task so other workers can
        // receive concurrently.
        let work = { queue.lock().await.recv().await };

        match work {
            Some(WorkRequest::Run { task }) => {
                let outcome = process_task(worker_id, task, &workload).await;
                deliver(worker_id, task, outcome, &registry).await;
            }
            Some(WorkRequest::Shutdown { response }) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
            None => break,
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}

#[allow(clippy::used_underscore_binding)]
async fn process_task(_worker_id: usize, task: Task, workload: &Workload) -> TaskOutcome {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "Worker {_worker_id} processing task {} of batch {}",
        task.id,
        task.batch
    );

    let start = Instant::now();
    match workload.execute(task.id).await {
        Ok(()) => TaskOutcome::Completed(CompletionRecord {
            task: task.id,
            duration: start.elapsed(),
        }),
        Err(cause) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Worker {_worker_id} failed task {}: {cause}", task.id);
            TaskOutcome::Failed {
                task: task.id,
                cause,
            }
        }
    }
}

#[allow(clippy::used_underscore_binding)]
async fn deliver(_worker_id: usize, task: Task, outcome: TaskOutcome, registry: &BatchRegistry) {
    let Some(tx) = registry.route(task.batch) else {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Worker {_worker_id} dropping outcome for task {}: batch {} no longer collecting",
            task.id,
            task.batch
        );
        return;
    };

    if let Err(_e) = tx.send(outcome).await {
        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {_worker_id} failed to send outcome: {_e}");
    }
}
