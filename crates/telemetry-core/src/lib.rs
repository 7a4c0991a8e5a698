//! telemetry-core - Shared types for the vehicle telemetry API
//!
//! Holds the models a client decodes server responses into, plus
//! [`DynamicValue`] for payloads whose shape is not known up front.

pub mod dynamic;
pub mod models;

pub use dynamic::DynamicValue;
pub use models::*;
