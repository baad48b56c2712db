#![doc = include_str!("../README.md")]

pub mod compare;
pub mod plot;
pub mod server;
pub mod telemetry;
