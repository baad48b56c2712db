use crate::task::Task;
use tokio::sync::oneshot;

/// A message placed on the pool's shared queue.
///
/// Workers pull these in FIFO order. Because the queue is shared, a
/// [`WorkRequest::Shutdown`] is consumed by exactly one worker; the pool sends
/// one per worker.
#[derive(Debug)]
pub enum WorkRequest {
    /// Run the workload for one task and report the outcome to its batch.
    Run { task: Task },

    /// Request the receiving worker to stop after acknowledging.
    ///
    /// - `response`: One-shot channel for acknowledging that the worker has
    ///   left its loop.
    Shutdown { response: oneshot::Sender<()> },
}
