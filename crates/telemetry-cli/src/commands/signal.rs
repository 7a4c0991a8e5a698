//! Signal command - read one signal of a vehicle

use anyhow::{Context, Result};
use telemetry_client::{DynamicValue, Location, SignalEnvelope, SignalKind, TelemetryClient};

use crate::output::{format_value, or_dash, OutputContext};

/// Fetch a single signal and print its fields
pub async fn signal(
    client: &TelemetryClient,
    user_id: &str,
    vehicle_id: &str,
    kind: SignalKind,
    ctx: &OutputContext,
) -> Result<()> {
    let context = || format!("Failed to read {} of '{}'", kind.label(), vehicle_id);

    let pairs = match kind {
        SignalKind::Location => {
            let signal = client
                .fetch_location(user_id, vehicle_id)
                .await
                .with_context(context)?;
            envelope_pairs(kind, &signal, location_fields(&signal.payload))
        }
        SignalKind::Odometer => {
            let signal = client
                .fetch_odometer(user_id, vehicle_id)
                .await
                .with_context(context)?;
            envelope_pairs(kind, &signal, vec![("Value", signal.payload.value.to_string())])
        }
        SignalKind::StateOfCharge => {
            let signal = client
                .fetch_state_of_charge(user_id, vehicle_id)
                .await
                .with_context(context)?;
            if !signal.payload.is_in_range() {
                ctx.warn(&format!(
                    "State of charge {} is outside 0-100",
                    signal.payload.value
                ));
            }
            envelope_pairs(kind, &signal, vec![("Value", format!("{}%", signal.payload.value))])
        }
        SignalKind::NominalCapacity => {
            let signal = client
                .fetch_nominal_capacity(user_id, vehicle_id)
                .await
                .with_context(context)?;
            envelope_pairs(kind, &signal, vec![("Value", format!("{} kWh", signal.payload.value))])
        }
        SignalKind::ChargeLimits => {
            let signal = client
                .fetch_charge_limits(user_id, vehicle_id)
                .await
                .with_context(context)?;
            envelope_pairs(kind, &signal, vec![("Value", format!("{}%", signal.payload.value))])
        }
        SignalKind::Battery => {
            let signal = client
                .fetch_battery(user_id, vehicle_id)
                .await
                .with_context(context)?;
            envelope_pairs(kind, &signal, dynamic_fields(&signal.payload))
        }
        SignalKind::LatestSignals => {
            return super::signals(client, user_id, vehicle_id, ctx).await;
        }
    };

    let pairs: Vec<(&str, String)> = pairs.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    ctx.print_kv(&pairs);
    Ok(())
}

/// Envelope fields followed by the payload's fields
fn envelope_pairs<P, K: Into<String>>(
    kind: SignalKind,
    signal: &SignalEnvelope<P>,
    fields: Vec<(K, String)>,
) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("Signal".to_string(), kind.label().to_string()),
        ("Vehicle".to_string(), signal.vehicle_id.clone()),
        ("Timestamp".to_string(), signal.timestamp.clone()),
    ];
    pairs.extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
    pairs
}

fn location_fields(location: &Location) -> Vec<(&'static str, String)> {
    vec![
        ("Latitude", location.latitude.to_string()),
        ("Longitude", location.longitude.to_string()),
        ("Direction", or_dash(location.direction.as_deref())),
        ("Heading", or_dash(location.heading)),
        ("Type", or_dash(location.location_type.as_deref())),
    ]
}

/// Top-level keys of an object payload, or the whole value otherwise
fn dynamic_fields(value: &DynamicValue) -> Vec<(String, String)> {
    match value.as_object() {
        Some(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), format_value(value)))
            .collect(),
        None => vec![("Value".to_string(), format_value(value))],
    }
}
