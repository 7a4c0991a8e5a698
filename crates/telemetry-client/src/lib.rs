//! Vehicle Telemetry Client Library
//!
//! Provides a typed HTTP client for a Smartcar-style vehicle telemetry API.
//!
//! # Example
//!
//! ```rust,no_run
//! use telemetry_client::TelemetryClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TelemetryClient::new("http://localhost:8080")?;
//!
//!     // Send the user here to link their vehicles
//!     let login = client.authorization_url("user_123")?;
//!     println!("Open {login}");
//!
//!     // List linked vehicles
//!     let vehicles = client.fetch_vehicles("user_123").await?;
//!
//!     // Read one signal
//!     let soc = client.fetch_state_of_charge("user_123", "vehicle_456").await?;
//!     println!("Battery: {}%", soc.payload.value);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Dynamic payloads
//!
//! `fetch_battery` and `fetch_latest_signals` return [`DynamicValue`]
//! payloads because their shape varies by vehicle:
//!
//! ```rust,ignore
//! let latest = client.fetch_latest_signals("user_123", "vehicle_456").await?;
//! if let Some(limit) = latest
//!     .get("charge_limits")
//!     .and_then(|s| s.payload.get("values"))
//!     .and_then(|v| v.get("activeLimit"))
//! {
//!     println!("Active limit: {limit}");
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a mock backend and a throwaway server:
//!
//! ```rust,ignore
//! use telemetry_client::testing::{MockBackend, TestServer};
//!
//! let backend = MockBackend::with_fixtures("user_123", "vehicle_456");
//! let server = TestServer::start(backend.router()).await?;
//! let vehicles = server.client.fetch_vehicles("user_123").await?;
//! ```

mod client;
mod config;
mod error;
pub mod testing;
mod types;

pub use client::TelemetryClient;
pub use config::ClientConfig;
pub use error::{Result, TelemetryClientError};
pub use types::*;

// Re-export core types for convenience
pub use telemetry_core::{
    BatteryLevel, ChargeLimit, DynamicValue, LatestData, LatestSignals, Location,
    NominalCapacity, Odometer, SignalEnvelope, SignalKind, StateOfCharge, VehicleList,
    VehicleSummary,
};
