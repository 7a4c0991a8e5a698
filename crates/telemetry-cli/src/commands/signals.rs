//! Signals command - show every signal the backend last stored

use anyhow::{Context, Result};
use telemetry_client::{LatestSignals, TelemetryClient};

use crate::output::{OutputContext, SignalRow};

/// Print the latest-signals map of a vehicle
pub async fn signals(
    client: &TelemetryClient,
    user_id: &str,
    vehicle_id: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let latest = client
        .fetch_latest_signals(user_id, vehicle_id)
        .await
        .with_context(|| format!("Failed to read latest signals of '{}'", vehicle_id))?;

    ctx.print(&signal_rows(&latest));
    Ok(())
}

fn signal_rows(latest: &LatestSignals) -> Vec<SignalRow> {
    latest
        .signals
        .iter()
        .map(|(name, signal)| match signal {
            Some(signal) => SignalRow {
                signal: name.clone(),
                timestamp: signal.timestamp.clone(),
                data: signal.payload.to_string(),
            },
            None => SignalRow {
                signal: name.clone(),
                timestamp: "-".to_string(),
                data: "-".to_string(),
            },
        })
        .collect()
}
