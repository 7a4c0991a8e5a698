//! Response types as they appear on the wire
//!
//! Each endpoint wraps its signal differently (`location: {...}`,
//! `odometer: {value}`, a bare `state_of_charge`). These structs mirror the
//! JSON exactly and convert into the uniform [`SignalEnvelope`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use telemetry_core::{
    ChargeLimit, DynamicValue, LatestSignals, Location, NominalCapacity, Odometer, SignalEnvelope,
    StateOfCharge,
};

use crate::error::Result;

// =============================================================================
// Fixed-shape signal responses
// =============================================================================

/// `GET .../location`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub timestamp: String,
    pub location: Location,
}

impl From<LocationResponse> for SignalEnvelope<Location> {
    fn from(r: LocationResponse) -> Self {
        SignalEnvelope::new(r.user_id, r.vehicle_id, r.timestamp, r.location)
    }
}

/// `GET .../odometer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdometerResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub timestamp: String,
    pub odometer: Odometer,
}

impl From<OdometerResponse> for SignalEnvelope<Odometer> {
    fn from(r: OdometerResponse) -> Self {
        SignalEnvelope::new(r.user_id, r.vehicle_id, r.timestamp, r.odometer)
    }
}

/// `GET .../state-of-charge`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateOfChargeResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub timestamp: String,
    pub state_of_charge: i64,
}

impl From<StateOfChargeResponse> for SignalEnvelope<StateOfCharge> {
    fn from(r: StateOfChargeResponse) -> Self {
        SignalEnvelope::new(
            r.user_id,
            r.vehicle_id,
            r.timestamp,
            StateOfCharge {
                value: r.state_of_charge,
            },
        )
    }
}

/// `GET .../nominal-capacity`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominalCapacityResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub timestamp: String,
    pub nominal_capacity: i64,
}

impl From<NominalCapacityResponse> for SignalEnvelope<NominalCapacity> {
    fn from(r: NominalCapacityResponse) -> Self {
        SignalEnvelope::new(
            r.user_id,
            r.vehicle_id,
            r.timestamp,
            NominalCapacity {
                value: r.nominal_capacity,
            },
        )
    }
}

/// `GET .../charge-limits`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeLimitsResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub timestamp: String,
    pub charge_limit: i64,
}

impl From<ChargeLimitsResponse> for SignalEnvelope<ChargeLimit> {
    fn from(r: ChargeLimitsResponse) -> Self {
        SignalEnvelope::new(
            r.user_id,
            r.vehicle_id,
            r.timestamp,
            ChargeLimit {
                value: r.charge_limit,
            },
        )
    }
}

// =============================================================================
// Dynamic responses
// =============================================================================

/// `GET .../battery`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub timestamp: String,
    pub battery: DynamicValue,
}

impl From<BatteryResponse> for SignalEnvelope<DynamicValue> {
    fn from(r: BatteryResponse) -> Self {
        SignalEnvelope::new(r.user_id, r.vehicle_id, r.timestamp, r.battery)
    }
}

/// One entry of the `signals` map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalData {
    pub timestamp: String,
    pub data: DynamicValue,
}

/// `GET .../latest-signals`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestSignalsResponse {
    pub user_id: String,
    pub vehicle_id: String,
    pub signals: BTreeMap<String, Option<SignalData>>,
}

impl From<LatestSignalsResponse> for LatestSignals {
    fn from(r: LatestSignalsResponse) -> Self {
        let signals = r
            .signals
            .into_iter()
            .map(|(name, signal)| {
                let envelope = signal.map(|s| {
                    SignalEnvelope::new(r.user_id.as_str(), r.vehicle_id.as_str(), s.timestamp, s.data)
                });
                (name, envelope)
            })
            .collect();

        LatestSignals {
            user_id: r.user_id,
            vehicle_id: r.vehicle_id,
            signals,
        }
    }
}

// =============================================================================
// Errors and aggregates
// =============================================================================

/// Error body the server may attach to a non-200 response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// The most descriptive text available, if any
    pub fn text(&self) -> Option<&str> {
        [self.error.as_str(), self.message.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

/// All fixed-shape signals of one vehicle, fetched together
///
/// Each field keeps its own outcome so one failing endpoint does not hide the
/// others.
#[derive(Debug)]
pub struct VehicleSnapshot {
    pub location: Result<SignalEnvelope<Location>>,
    pub odometer: Result<SignalEnvelope<Odometer>>,
    pub state_of_charge: Result<SignalEnvelope<StateOfCharge>>,
    pub nominal_capacity: Result<SignalEnvelope<NominalCapacity>>,
    pub charge_limit: Result<SignalEnvelope<ChargeLimit>>,
}

impl VehicleSnapshot {
    /// Number of signals that failed
    pub fn error_count(&self) -> usize {
        [
            self.location.is_err(),
            self.odometer.is_err(),
            self.state_of_charge.is_err(),
            self.nominal_capacity.is_err(),
            self.charge_limit.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }

    pub fn is_complete(&self) -> bool {
        self.error_count() == 0
    }
}
