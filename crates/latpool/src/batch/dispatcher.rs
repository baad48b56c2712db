use crate::{
    error::{Error, Result},
    pool::request::WorkRequest,
    task::{BatchId, Task},
};
use tokio::{sync::mpsc, time::Instant};

/// Enqueues tasks `1..=count` for `batch`, in order.
///
/// Suspends whenever the queue is full until a worker frees a slot. If
/// `deadline` passes first, dispatch stops and returns
/// [`Error::Starvation`] with `received: 0`, because the collector has not
/// consumed any record yet. Tasks already enqueued still run, but their
/// outcomes are discarded once the batch's collector is gone.
///
/// # Errors
///
/// - [`Error::ChannelError`] if the queue has been closed.
/// - [`Error::Starvation`] if the deadline expires mid-dispatch.
pub async fn dispatch(
    queue: &mpsc::Sender<WorkRequest>,
    batch: BatchId,
    count: usize,
    deadline: Option<Instant>,
) -> Result<()> {
    for id in 1..=count {
        let request = WorkRequest::Run {
            task: Task { batch, id },
        };
        let sent = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, queue.send(request))
                .await
                .map_err(|_| Error::Starvation {
                    batch,
                    received: 0,
                    expected: count,
                })?,
            None => queue.send(request).await,
        };
        sent.map_err(|_| Error::ChannelError {
            context: format!("Task queue closed while dispatching batch {batch}"),
        })?;
    }

    Ok(())
}
