//! The non-pooled comparison point.

use crate::{
    error::{Error, Result},
    series::TimingSeries,
    task::TaskId,
    workload::Workload,
};
use core::time::Duration;
use std::time::Instant;

/// The outcome of running a batch strictly sequentially.
#[derive(Clone, Debug)]
pub struct SequentialRun {
    /// Wall-clock time for the whole batch.
    pub elapsed: Duration,
    /// Per-task durations, ordered by task identifier.
    pub series: TimingSeries,
}

/// Runs tasks `1..=count` one after another on the calling task, with no
/// concurrency and no shared state.
///
/// # Errors
///
/// Returns [`Error::TaskFailed`] for the first task whose workload fails; the
/// remaining tasks are not run.
pub async fn run_sequential(workload: &Workload, count: usize) -> Result<SequentialRun> {
    let start = Instant::now();
    let mut durations = Vec::with_capacity(count);

    for task in 1..=count {
        durations.push(time_task(workload, task).await?);
    }

    Ok(SequentialRun {
        elapsed: start.elapsed(),
        series: durations.into(),
    })
}

async fn time_task(workload: &Workload, task: TaskId) -> Result<Duration> {
    let start = Instant::now();
    workload
        .execute(task)
        .await
        .map_err(|cause| Error::TaskFailed { task, cause })?;
    Ok(start.elapsed())
}
