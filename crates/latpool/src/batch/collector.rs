use crate::{
    error::{Error, Result},
    pool::registry::Registration,
    series::TimingSeries,
    task::TaskOutcome,
};
use core::time::Duration;
use tokio::time::Instant;

/// Gathers the outcomes of a single batch and restores identifier order.
///
/// The collector owns the batch's [`Registration`]; once it is dropped (after
/// success, failure, or a missed deadline), workers discard any late outcomes
/// for the batch.
#[derive(Debug)]
pub struct Collector {
    registration: Registration,
    expected: usize,
}

impl Collector {
    pub const fn new(registration: Registration, expected: usize) -> Self {
        Self {
            registration,
            expected,
        }
    }

    /// Receives exactly `expected` completion records and writes each duration
    /// into slot `task - 1`.
    ///
    /// Without a deadline this waits for as long as it takes. With one, it
    /// gives up at `deadline` and reports how many records had arrived.
    ///
    /// # Errors
    ///
    /// - [`Error::TaskFailed`] on the first failure reported by a worker.
    /// - [`Error::InvalidRecord`] if a record is out of range or duplicated.
    /// - [`Error::Starvation`] if the deadline expires.
    /// - [`Error::ChannelError`] if the result channel closes early.
    pub async fn collect(mut self, deadline: Option<Instant>) -> Result<TimingSeries> {
        let batch = self.registration.batch();
        let mut slots: Vec<Option<Duration>> = vec![None; self.expected];
        let mut received = 0;

        while received < self.expected {
            let next = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, self.registration.recv())
                    .await
                    .map_err(|_| Error::Starvation {
                        batch,
                        received,
                        expected: self.expected,
                    })?,
                None => self.registration.recv().await,
            };

            let record = match next {
                Some(TaskOutcome::Completed(record)) => record,
                Some(TaskOutcome::Failed { task, cause }) => {
                    return Err(Error::TaskFailed { task, cause });
                }
                None => {
                    return Err(Error::ChannelError {
                        context: format!(
                            "Result channel for batch {batch} closed after {received} records"
                        ),
                    });
                }
            };

            let slot = record
                .task
                .checked_sub(1)
                .and_then(|idx| slots.get_mut(idx))
                .filter(|slot| slot.is_none())
                .ok_or(Error::InvalidRecord {
                    batch,
                    task: record.task,
                })?;
            *slot = Some(record.duration);
            received += 1;
        }

        // Every slot is filled: `received` only counts first writes.
        Ok(slots.into_iter().flatten().collect::<Vec<_>>().into())
    }
}
