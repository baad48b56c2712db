//! Fan-out and fan-in halves of a batch.
//!
//! - [`dispatcher`] - seeds the shared queue with tasks `1..=N`.
//! - [`collector`] - gathers the batch's outcomes into a [`TimingSeries`].
//!
//! [`TimingSeries`]: crate::TimingSeries

pub mod collector;
pub mod dispatcher;
