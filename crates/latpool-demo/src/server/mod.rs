//! HTTP front end for the worker pool.
//!
//! - [`config`] - CLI/environment configuration (`ServerConfig`).
//! - [`handler`] - the axum router and the `/process` endpoint.

pub mod config;
pub mod handler;
