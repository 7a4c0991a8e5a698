//! Vehicles command - list linked vehicles

use anyhow::{Context, Result};
use telemetry_client::{TelemetryClient, VehicleSummary};

use crate::output::{or_dash, OutputContext, VehicleRow};

/// List the vehicles linked to a user
pub async fn vehicles(client: &TelemetryClient, user_id: &str, ctx: &OutputContext) -> Result<()> {
    let list = client
        .fetch_vehicles(user_id)
        .await
        .with_context(|| format!("Failed to list vehicles for '{}'", user_id))?;

    if !list.is_consistent() {
        ctx.warn(&format!(
            "Server reported {} vehicles but returned {}",
            list.total_count,
            list.vehicles.len()
        ));
    }

    let rows: Vec<VehicleRow> = list.vehicles.iter().map(vehicle_row).collect();
    ctx.print(&rows);
    Ok(())
}

fn vehicle_row(vehicle: &VehicleSummary) -> VehicleRow {
    let latest = vehicle.latest_data.clone().unwrap_or_default();

    VehicleRow {
        id: vehicle.vehicle_id.clone(),
        name: vehicle.display_name(),
        battery: or_dash(latest.battery.map(|b| format!("{}%", b.value))),
        odometer: or_dash(latest.odometer.map(|o| o.value)),
        location: or_dash(
            latest
                .location
                .map(|l| format!("{:.4}, {:.4}", l.latitude, l.longitude)),
        ),
    }
}
