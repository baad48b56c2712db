//! Routing table from batch identifiers to their collectors.
//!
//! Each in-flight batch owns a dedicated result channel. Workers look up the
//! channel by the [`BatchId`] carried on every task, so records from
//! overlapping batches can never reach the wrong collector.

use crate::task::{BatchId, TaskOutcome};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
pub struct BatchRegistry {
    routes: Mutex<HashMap<BatchId, mpsc::Sender<TaskOutcome>>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a result channel for `batch` able to buffer every outcome of a
    /// batch of `expected` tasks without blocking a worker.
    ///
    /// The route is removed when the returned [`Registration`] is dropped.
    pub fn register(self: &Arc<Self>, batch: BatchId, expected: usize) -> Registration {
        let (tx, rx) = mpsc::channel(expected.max(1));
        self.routes.lock().insert(batch, tx);
        Registration {
            registry: Arc::clone(self),
            batch,
            rx,
        }
    }

    /// Returns the result channel for `batch`, or `None` if its collector has
    /// already gone away.
    pub fn route(&self, batch: BatchId) -> Option<mpsc::Sender<TaskOutcome>> {
        self.routes.lock().get(&batch).cloned()
    }

    /// Number of batches currently awaiting results.
    pub fn len(&self) -> usize {
        self.routes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.lock().is_empty()
    }

    fn deregister(&self, batch: BatchId) {
        self.routes.lock().remove(&batch);
    }
}

/// The receiving half of a batch's result channel.
///
/// Deregisters the batch on drop so late outcomes are discarded instead of
/// piling up.
#[derive(Debug)]
pub struct Registration {
    registry: Arc<BatchRegistry>,
    batch: BatchId,
    rx: mpsc::Receiver<TaskOutcome>,
}

impl Registration {
    pub const fn batch(&self) -> BatchId {
        self.batch
    }

    pub async fn recv(&mut self) -> Option<TaskOutcome> {
        self.rx.recv().await
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::CompletionRecord;
    use core::time::Duration;

    #[tokio::test]
    async fn routes_only_to_the_registered_batch() {
        let registry = Arc::new(BatchRegistry::new());
        let mut first = registry.register(BatchId::new(1), 1);
        let mut second = registry.register(BatchId::new(2), 1);
        assert_eq!(registry.len(), 2);

        let record = TaskOutcome::Completed(CompletionRecord {
            task: 1,
            duration: Duration::from_millis(1),
        });
        registry
            .route(BatchId::new(2))
            .unwrap()
            .send(record.clone())
            .await
            .unwrap();

        assert_eq!(second.recv().await, Some(record));
        assert!(first.rx.try_recv().is_err());
    }

    #[test]
    fn drop_deregisters() {
        let registry = Arc::new(BatchRegistry::new());
        let registration = registry.register(BatchId::new(7), 3);
        assert!(registry.route(BatchId::new(7)).is_some());

        drop(registration);
        assert!(registry.route(BatchId::new(7)).is_none());
        assert!(registry.is_empty());
    }
}
