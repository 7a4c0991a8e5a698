//! Vehicle list models

use serde::{Deserialize, Serialize};

use super::signal::{Location, Odometer};

/// Battery level as embedded in a vehicle's latest data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryLevel {
    pub value: i64,
}

/// Most recent signals the backend stored for a vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestData {
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub battery: Option<BatteryLevel>,
    #[serde(default)]
    pub odometer: Option<Odometer>,
}

/// A vehicle linked to a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSummary {
    #[serde(rename = "smartcar_vehicle_id", alias = "vehicle_id")]
    pub vehicle_id: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub latest_data: Option<LatestData>,
}

impl VehicleSummary {
    /// "2020 Tesla Model 3", skipping whatever is unknown
    pub fn display_name(&self) -> String {
        let year = self.year.map(|y| y.to_string());
        let parts: Vec<&str> = [year.as_deref(), self.make.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .collect();

        if parts.is_empty() {
            self.vehicle_id.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Response of the vehicle list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleList {
    pub user_id: String,
    pub vehicles: Vec<VehicleSummary>,
    /// Count reported by the server; may disagree with `vehicles.len()`
    #[serde(rename = "total_vehicles")]
    pub total_count: i64,
}

impl VehicleList {
    /// Whether the reported count matches the list
    pub fn is_consistent(&self) -> bool {
        usize::try_from(self.total_count).is_ok_and(|count| count == self.vehicles.len())
    }

    pub fn find(&self, vehicle_id: &str) -> Option<&VehicleSummary> {
        self.vehicles.iter().find(|v| v.vehicle_id == vehicle_id)
    }
}
