//! Dashboard command - all fixed signals of a vehicle at once

use anyhow::Result;
use telemetry_client::{SignalEnvelope, SignalKind, TelemetryClient, VehicleSnapshot};

use crate::output::{DashboardRow, OutputContext};

/// Fetch every fixed-shape signal concurrently and print one row each
///
/// A failing signal shows as an error row; the others still render.
pub async fn dashboard(
    client: &TelemetryClient,
    user_id: &str,
    vehicle_id: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let snapshot = client.fetch_snapshot(user_id, vehicle_id).await;

    let failed = snapshot.error_count();
    ctx.print(&dashboard_rows(&snapshot));

    if failed > 0 {
        ctx.error(&format!("{} of 5 signals could not be read", failed));
    } else {
        ctx.info(&format!("All signals read for {}", vehicle_id));
    }
    Ok(())
}

fn dashboard_rows(snapshot: &VehicleSnapshot) -> Vec<DashboardRow> {
    vec![
        row(SignalKind::Location, &snapshot.location, |l| {
            format!("{:.4}, {:.4}", l.latitude, l.longitude)
        }),
        row(SignalKind::Odometer, &snapshot.odometer, |o| o.value.to_string()),
        row(SignalKind::StateOfCharge, &snapshot.state_of_charge, |s| {
            format!("{}%", s.value)
        }),
        row(SignalKind::NominalCapacity, &snapshot.nominal_capacity, |c| {
            format!("{} kWh", c.value)
        }),
        row(SignalKind::ChargeLimits, &snapshot.charge_limit, |c| {
            format!("{}%", c.value)
        }),
    ]
}

fn row<P>(
    kind: SignalKind,
    result: &telemetry_client::Result<SignalEnvelope<P>>,
    render: impl FnOnce(&P) -> String,
) -> DashboardRow {
    match result {
        Ok(signal) => DashboardRow {
            signal: kind.label().to_string(),
            value: render(&signal.payload),
            timestamp: signal.timestamp.clone(),
        },
        Err(e) => DashboardRow {
            signal: kind.label().to_string(),
            value: format!("Error: {}", e),
            timestamp: "-".to_string(),
        },
    }
}
