//! Data models for the vehicle telemetry API

pub mod signal;
pub mod vehicle;

pub use signal::*;
pub use vehicle::*;
