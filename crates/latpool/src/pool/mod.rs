//! The worker pool and its plumbing.
//!
//! - [`manager`] - the [`WorkerPool`] that owns the queue and runs batches.
//! - [`worker`] - the loop each worker runs.
//! - [`registry`] - routes outcomes from workers to the right batch.
//! - [`request`] - messages carried on the shared queue.
//! - [`config`] - settings fixed at pool creation.
//!
//! [`WorkerPool`]: manager::WorkerPool

pub mod config;
pub mod manager;
pub mod registry;
pub mod request;
pub mod worker;
