//! Sequential-versus-pool comparison sweep.
//!
//! - [`config`] - CLI configuration (`CompareConfig`).
//! - [`sweep`] - runs both execution models across the batch sizes.

pub mod config;
pub mod sweep;
