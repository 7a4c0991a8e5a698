//! Signal models
//!
//! One payload type per fixed-shape endpoint, the envelope every signal
//! arrives in, and the dynamic per-signal map served by `latest-signals`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dynamic::DynamicValue;

/// Per-vehicle endpoints exposed by the telemetry API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Location,
    Odometer,
    StateOfCharge,
    NominalCapacity,
    ChargeLimits,
    /// Free-form battery object
    Battery,
    /// Every signal the backend last received, keyed by name
    LatestSignals,
}

impl SignalKind {
    /// All kinds, in the order the API documents them
    pub const ALL: [SignalKind; 7] = [
        SignalKind::Location,
        SignalKind::Odometer,
        SignalKind::StateOfCharge,
        SignalKind::NominalCapacity,
        SignalKind::ChargeLimits,
        SignalKind::Battery,
        SignalKind::LatestSignals,
    ];

    /// Last path segment of the endpoint
    pub fn path(&self) -> &'static str {
        match self {
            SignalKind::Location => "location",
            SignalKind::Odometer => "odometer",
            SignalKind::StateOfCharge => "state-of-charge",
            SignalKind::NominalCapacity => "nominal-capacity",
            SignalKind::ChargeLimits => "charge-limits",
            SignalKind::Battery => "battery",
            SignalKind::LatestSignals => "latest-signals",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Location => "Location",
            SignalKind::Odometer => "Odometer",
            SignalKind::StateOfCharge => "State of Charge",
            SignalKind::NominalCapacity => "Nominal Capacity",
            SignalKind::ChargeLimits => "Charge Limit",
            SignalKind::Battery => "Battery",
            SignalKind::LatestSignals => "Latest Signals",
        }
    }

    /// Whether the payload is a [`DynamicValue`] rather than a fixed struct
    pub fn is_dynamic(&self) -> bool {
        matches!(self, SignalKind::Battery | SignalKind::LatestSignals)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Unrecognized signal name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal '{0}' (expected one of: location, odometer, state-of-charge, nominal-capacity, charge-limits, battery, latest-signals)")]
pub struct UnknownSignal(pub String);

impl FromStr for SignalKind {
    type Err = UnknownSignal;

    /// Accepts the path form (`state-of-charge`) and the snake_case form
    /// (`state_of_charge`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == normalized)
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}

/// Common wrapper around a single signal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope<P> {
    pub user_id: String,
    pub vehicle_id: String,
    /// ISO-8601 string as sent by the server, not parsed
    pub timestamp: String,
    pub payload: P,
}

impl<P> SignalEnvelope<P> {
    pub fn new(
        user_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        timestamp: impl Into<String>,
        payload: P,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            vehicle_id: vehicle_id.into(),
            timestamp: timestamp.into(),
            payload,
        }
    }

    /// Replace the payload, keeping the envelope fields
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> SignalEnvelope<Q> {
        SignalEnvelope {
            user_id: self.user_id,
            vehicle_id: self.vehicle_id,
            timestamp: self.timestamp,
            payload: f(self.payload),
        }
    }
}

// =============================================================================
// Fixed-shape payloads
// =============================================================================

/// Vehicle position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Compass direction, e.g. "NE"
    #[serde(default)]
    pub direction: Option<String>,
    /// Heading in degrees
    #[serde(default)]
    pub heading: Option<f64>,
    /// e.g. "PARKED"
    #[serde(default, rename = "locationType", alias = "location_type")]
    pub location_type: Option<String>,
}

/// Traveled distance; the unit is whatever the backend reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odometer {
    pub value: i64,
}

/// Battery state of charge in percent.
///
/// The backend is trusted; values outside 0-100 are carried unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOfCharge {
    pub value: i64,
}

impl StateOfCharge {
    pub fn is_in_range(&self) -> bool {
        (0..=100).contains(&self.value)
    }
}

/// Nominal battery capacity in kWh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominalCapacity {
    pub value: i64,
}

/// Active charge limit in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeLimit {
    pub value: i64,
}

// =============================================================================
// Dynamic payloads
// =============================================================================

/// Response of the `latest-signals` endpoint
///
/// A signal the backend knows about but has no data for maps to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSignals {
    pub user_id: String,
    pub vehicle_id: String,
    pub signals: BTreeMap<String, Option<SignalEnvelope<DynamicValue>>>,
}

impl LatestSignals {
    /// Data for a signal, if the backend has any
    pub fn get(&self, name: &str) -> Option<&SignalEnvelope<DynamicValue>> {
        self.signals.get(name).and_then(Option::as_ref)
    }

    /// Names of signals that carry data
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.signals
            .iter()
            .filter(|(_, signal)| signal.is_some())
            .map(|(name, _)| name.as_str())
    }

    /// Names of signals reported as null
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.signals
            .iter()
            .filter(|(_, signal)| signal.is_none())
            .map(|(name, _)| name.as_str())
    }
}
