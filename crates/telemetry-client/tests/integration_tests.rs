//! Integration tests for telemetry-client
//!
//! These tests spin up a mock telemetry server and use the client against it
//! over real HTTP.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use rstest::rstest;
use telemetry_client::testing::{
    fixtures, MockBackend, MockResponse, TestServer, TEST_USER_ID, TEST_VEHICLE_ID,
};
use telemetry_client::{
    ChargeLimit, DynamicValue, NominalCapacity, Odometer, SignalKind, StateOfCharge,
    TelemetryClient, TelemetryClientError,
};

// =============================================================================
// Test Helpers
// =============================================================================

async fn create_test_server() -> (MockBackend, TestServer) {
    let backend = MockBackend::with_fixtures(TEST_USER_ID, TEST_VEHICLE_ID);
    let server = TestServer::start(backend.router())
        .await
        .expect("Failed to start test server");
    (backend, server)
}

fn signal_path(kind: SignalKind) -> String {
    MockBackend::signal_path(TEST_USER_ID, TEST_VEHICLE_ID, kind)
}

/// Run the fetch operation for `kind` and drop the payload
async fn fetch_kind(client: &TelemetryClient, kind: SignalKind) -> telemetry_client::Result<()> {
    let (user, vehicle) = (TEST_USER_ID, TEST_VEHICLE_ID);
    match kind {
        SignalKind::Location => client.fetch_location(user, vehicle).await.map(drop),
        SignalKind::Odometer => client.fetch_odometer(user, vehicle).await.map(drop),
        SignalKind::StateOfCharge => client.fetch_state_of_charge(user, vehicle).await.map(drop),
        SignalKind::NominalCapacity => {
            client.fetch_nominal_capacity(user, vehicle).await.map(drop)
        }
        SignalKind::ChargeLimits => client.fetch_charge_limits(user, vehicle).await.map(drop),
        SignalKind::Battery => client.fetch_battery(user, vehicle).await.map(drop),
        SignalKind::LatestSignals => client.fetch_latest_signals(user, vehicle).await.map(drop),
    }
}

// =============================================================================
// Vehicle List Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_vehicles() {
    let (backend, server) = create_test_server().await;

    let list = server.client.fetch_vehicles(TEST_USER_ID).await.unwrap();
    assert_eq!(list.user_id, TEST_USER_ID);
    assert_eq!(list.total_count, 1);
    assert!(list.is_consistent());

    let vehicle = &list.vehicles[0];
    assert_eq!(vehicle.vehicle_id, TEST_VEHICLE_ID);
    assert_eq!(vehicle.make.as_deref(), Some("Tesla"));
    assert_eq!(vehicle.model.as_deref(), Some("Model 3"));
    assert_eq!(vehicle.year, Some(2020));

    let latest = vehicle.latest_data.as_ref().unwrap();
    assert_eq!(latest.odometer, Some(Odometer { value: fixtures::ODOMETER }));
    assert_eq!(
        latest.battery.map(|b| b.value),
        Some(fixtures::STATE_OF_CHARGE)
    );
    assert_eq!(
        latest.location.as_ref().map(|l| l.latitude),
        Some(fixtures::LATITUDE)
    );

    assert_eq!(backend.hits(&MockBackend::vehicles_path(TEST_USER_ID)), 1);
    assert_eq!(backend.total_hits(), 1);
}

#[tokio::test]
async fn test_fetch_vehicles_count_mismatch_is_not_fatal() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        MockBackend::vehicles_path(TEST_USER_ID),
        MockResponse::ok(serde_json::json!({
            "user_id": TEST_USER_ID,
            "vehicles": [{ "smartcar_vehicle_id": "a" }, { "smartcar_vehicle_id": "b" }],
            "total_vehicles": 5
        })),
    );

    let list = server.client.fetch_vehicles(TEST_USER_ID).await.unwrap();
    assert_eq!(list.vehicles.len(), 2);
    assert_eq!(list.total_count, 5);
    assert!(!list.is_consistent());
    assert_eq!(list.vehicles[1].make, None);
}

// =============================================================================
// Fixed-shape Signal Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_location() {
    let (backend, server) = create_test_server().await;

    let location = server
        .client
        .fetch_location(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();

    assert_eq!(location.user_id, TEST_USER_ID);
    assert_eq!(location.vehicle_id, TEST_VEHICLE_ID);
    assert_eq!(location.timestamp, fixtures::TIMESTAMP);
    assert_eq!(location.payload.latitude, fixtures::LATITUDE);
    assert_eq!(location.payload.longitude, fixtures::LONGITUDE);
    assert_eq!(location.payload.direction.as_deref(), Some("NE"));
    assert_eq!(location.payload.heading, Some(fixtures::HEADING));
    assert_eq!(location.payload.location_type.as_deref(), Some("PARKED"));

    assert_eq!(backend.hits(&signal_path(SignalKind::Location)), 1);
    assert_eq!(backend.total_hits(), 1);
}

#[tokio::test]
async fn test_fetch_location_without_optional_fields() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::Location),
        MockResponse::ok(serde_json::json!({
            "user_id": TEST_USER_ID,
            "vehicle_id": TEST_VEHICLE_ID,
            "timestamp": fixtures::TIMESTAMP,
            "location": { "latitude": 51.5, "longitude": -0.125 }
        })),
    );

    let location = server
        .client
        .fetch_location(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(location.payload.latitude, 51.5);
    assert_eq!(location.payload.direction, None);
    assert_eq!(location.payload.heading, None);
    assert_eq!(location.payload.location_type, None);
}

#[tokio::test]
async fn test_fetch_odometer() {
    let (_backend, server) = create_test_server().await;

    let odometer = server
        .client
        .fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(odometer.payload, Odometer { value: fixtures::ODOMETER });
    assert_eq!(odometer.timestamp, fixtures::TIMESTAMP);
}

#[tokio::test]
async fn test_fetch_state_of_charge() {
    let (_backend, server) = create_test_server().await;

    let soc = server
        .client
        .fetch_state_of_charge(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(
        soc.payload,
        StateOfCharge {
            value: fixtures::STATE_OF_CHARGE
        }
    );
    assert!(soc.payload.is_in_range());
}

#[rstest]
#[case(140)]
#[case(-5)]
#[tokio::test]
async fn test_fetch_state_of_charge_out_of_range(#[case] value: i64) {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::StateOfCharge),
        MockResponse::ok(serde_json::json!({
            "user_id": TEST_USER_ID,
            "vehicle_id": TEST_VEHICLE_ID,
            "timestamp": fixtures::TIMESTAMP,
            "state_of_charge": value
        })),
    );

    let soc = server
        .client
        .fetch_state_of_charge(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(soc.payload.value, value);
    assert!(!soc.payload.is_in_range());
}

#[tokio::test]
async fn test_fetch_nominal_capacity() {
    let (_backend, server) = create_test_server().await;

    let capacity = server
        .client
        .fetch_nominal_capacity(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(
        capacity.payload,
        NominalCapacity {
            value: fixtures::NOMINAL_CAPACITY
        }
    );
}

#[tokio::test]
async fn test_fetch_charge_limits() {
    let (_backend, server) = create_test_server().await;

    let limit = server
        .client
        .fetch_charge_limits(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(
        limit.payload,
        ChargeLimit {
            value: fixtures::CHARGE_LIMIT
        }
    );
    assert_eq!(limit.user_id, TEST_USER_ID);
}

// =============================================================================
// Dynamic Signal Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_battery() {
    let (_backend, server) = create_test_server().await;

    let battery = server
        .client
        .fetch_battery(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(
        battery.payload.get("value"),
        Some(&DynamicValue::Int(fixtures::STATE_OF_CHARGE))
    );
    assert_eq!(battery.payload.get("range"), Some(&DynamicValue::Float(310.5)));
    assert_eq!(
        battery.payload.get("isCharging"),
        Some(&DynamicValue::Bool(false))
    );
}

#[tokio::test]
async fn test_fetch_latest_signals() {
    let (_backend, server) = create_test_server().await;

    let latest = server
        .client
        .fetch_latest_signals(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    assert_eq!(latest.user_id, TEST_USER_ID);
    assert_eq!(latest.vehicle_id, TEST_VEHICLE_ID);
    assert_eq!(latest.signals.len(), 5);

    // Null entries are kept, not dropped
    assert!(latest.signals.contains_key("battery"));
    assert!(latest.get("battery").is_none());
    assert_eq!(latest.missing().collect::<Vec<_>>(), vec!["battery"]);

    let location = latest.get("location").unwrap();
    assert_eq!(location.timestamp, fixtures::TIMESTAMP);
    assert_eq!(location.user_id, TEST_USER_ID);
    assert_eq!(
        location.payload.get("locationType").and_then(DynamicValue::as_str),
        Some("PARKED")
    );

    let active_limit = latest
        .get("charge_limits")
        .and_then(|s| s.payload.get("values"))
        .and_then(|v| v.get("activeLimit"))
        .and_then(DynamicValue::as_i64);
    assert_eq!(active_limit, Some(fixtures::CHARGE_LIMIT));

    let capacities = latest
        .get("nominal_capacity")
        .and_then(|s| s.payload.get("availableCapacities"))
        .and_then(DynamicValue::as_array)
        .unwrap();
    assert_eq!(capacities.len(), 2);
    assert_eq!(
        capacities[0].get("description").and_then(DynamicValue::as_str),
        Some("Standard Range")
    );
}

#[tokio::test]
async fn test_latest_signals_keeps_quoted_numbers_as_strings() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::LatestSignals),
        MockResponse::ok(serde_json::json!({
            "user_id": TEST_USER_ID,
            "vehicle_id": TEST_VEHICLE_ID,
            "signals": {
                "firmware": { "timestamp": "t", "data": { "version": "123", "beta": "true", "build": 123 } }
            }
        })),
    );

    let latest = server
        .client
        .fetch_latest_signals(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    let data = &latest.get("firmware").unwrap().payload;
    assert_eq!(data.get("version"), Some(&DynamicValue::from("123")));
    assert_eq!(data.get("beta"), Some(&DynamicValue::from("true")));
    assert_eq!(data.get("build"), Some(&DynamicValue::Int(123)));
}

// =============================================================================
// Error Tests
// =============================================================================

#[rstest]
#[case(SignalKind::Location, 404)]
#[case(SignalKind::Odometer, 500)]
#[case(SignalKind::StateOfCharge, 403)]
#[case(SignalKind::NominalCapacity, 502)]
#[case(SignalKind::ChargeLimits, 201)]
#[case(SignalKind::Odometer, 302)]
#[case(SignalKind::Battery, 204)]
#[case(SignalKind::LatestSignals, 404)]
#[tokio::test]
async fn test_non_200_is_server_error(#[case] kind: SignalKind, #[case] status: u16) {
    let (backend, server) = create_test_server().await;
    let status_code = StatusCode::from_u16(status).unwrap();

    // A well-formed body must not rescue a non-200 status
    backend.respond(
        signal_path(kind),
        MockResponse::json(
            status_code,
            fixtures::signal(kind, TEST_USER_ID, TEST_VEHICLE_ID),
        ),
    );

    let err = fetch_kind(&server.client, kind).await.unwrap_err();
    match err {
        TelemetryClientError::ServerError { status: got, .. } => assert_eq!(got, status),
        other => panic!("expected ServerError, got {:?}", other),
    }
    assert_eq!(backend.hits(&signal_path(kind)), 1);
}

#[rstest]
#[case(301)]
#[case(302)]
#[case(307)]
#[case(308)]
#[tokio::test]
async fn test_redirect_is_not_followed(#[case] status: u16) {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::Odometer),
        MockResponse::redirect(StatusCode::from_u16(status).unwrap(), "/elsewhere"),
    );
    backend.respond(
        "/elsewhere",
        MockResponse::ok(fixtures::signal(
            SignalKind::Odometer,
            TEST_USER_ID,
            TEST_VEHICLE_ID,
        )),
    );

    let err = server
        .client
        .fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(status));
    assert_eq!(backend.hits(&signal_path(SignalKind::Odometer)), 1);
    assert_eq!(backend.hits("/elsewhere"), 0);
}

#[tokio::test]
async fn test_server_error_uses_error_body() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        MockBackend::vehicles_path(TEST_USER_ID),
        MockResponse::json(
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": "User not found" }),
        ),
    );

    let err = server.client.fetch_vehicles(TEST_USER_ID).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Server error 404: User not found");
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::Odometer),
        MockResponse::raw(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
    );

    let err = server
        .client
        .fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap_err();
    match err {
        TelemetryClientError::ServerError { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("500"));
        }
        other => panic!("expected ServerError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_vehicle_is_server_error() {
    let (_backend, server) = create_test_server().await;

    let err = server
        .client
        .fetch_odometer(TEST_USER_ID, "unknown_vehicle")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_missing_required_field_is_decode_error() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::Odometer),
        MockResponse::ok(serde_json::json!({
            "user_id": TEST_USER_ID,
            "vehicle_id": TEST_VEHICLE_ID,
            "timestamp": fixtures::TIMESTAMP
        })),
    );

    let err = server
        .client
        .fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(err, TelemetryClientError::DecodeError(_)),
        "expected DecodeError, got {:?}",
        err
    );
}

#[rstest]
#[case(SignalKind::StateOfCharge, "state_of_charge", serde_json::json!("85"))]
#[case(SignalKind::NominalCapacity, "nominal_capacity", serde_json::json!(null))]
#[case(SignalKind::ChargeLimits, "charge_limit", serde_json::json!({ "value": 80 }))]
#[case(SignalKind::Location, "location", serde_json::json!({ "latitude": 1.0 }))]
#[tokio::test]
async fn test_wrong_shape_is_decode_error(
    #[case] kind: SignalKind,
    #[case] field: &str,
    #[case] value: serde_json::Value,
) {
    let (backend, server) = create_test_server().await;
    let mut body = fixtures::signal(kind, TEST_USER_ID, TEST_VEHICLE_ID);
    body[field] = value;
    backend.respond(signal_path(kind), MockResponse::ok(body));

    let err = fetch_kind(&server.client, kind).await.unwrap_err();
    assert!(
        matches!(err, TelemetryClientError::DecodeError(_)),
        "expected DecodeError, got {:?}",
        err
    );
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        MockBackend::vehicles_path(TEST_USER_ID),
        MockResponse::raw(StatusCode::OK, "{\"user_id\": "),
    );

    let err = server.client.fetch_vehicles(TEST_USER_ID).await.unwrap_err();
    assert!(matches!(err, TelemetryClientError::DecodeError(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TelemetryClient::new(&format!("http://{}", addr)).unwrap();
    let err = client
        .fetch_location(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap_err();
    assert!(
        matches!(err, TelemetryClientError::TransportError(_)),
        "expected TransportError, got {:?}",
        err
    );
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let backend = MockBackend::with_fixtures(TEST_USER_ID, TEST_VEHICLE_ID);
    backend.respond(
        signal_path(SignalKind::Odometer),
        MockResponse::ok(fixtures::signal(
            SignalKind::Odometer,
            TEST_USER_ID,
            TEST_VEHICLE_ID,
        ))
        .with_delay(Duration::from_secs(2)),
    );
    let config = telemetry_client::ClientConfig::default().with_timeout(Duration::from_millis(200));
    let server = TestServer::start_with_config(backend.router(), &config)
        .await
        .unwrap();

    let err = server
        .client
        .fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap_err();
    match err {
        TelemetryClientError::TransportError(e) => assert!(e.is_timeout()),
        other => panic!("expected TransportError, got {:?}", other),
    }
    assert_eq!(backend.hits(&signal_path(SignalKind::Odometer)), 1);
}

#[tokio::test]
async fn test_invalid_ids_fail_before_any_request() {
    let (backend, server) = create_test_server().await;

    let err = server.client.fetch_location("", TEST_VEHICLE_ID).await.unwrap_err();
    assert!(matches!(err, TelemetryClientError::InvalidRequest(_)));

    let err = server.client.fetch_vehicles("bad\u{0}id").await.unwrap_err();
    assert!(matches!(err, TelemetryClientError::InvalidRequest(_)));

    assert_eq!(backend.total_hits(), 0);
}

#[tokio::test]
async fn test_ids_are_percent_encoded() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        "/api/user/team%2Falice/vehicles",
        MockResponse::ok(serde_json::json!({
            "user_id": "team/alice",
            "vehicles": [],
            "total_vehicles": 0
        })),
    );

    let list = server.client.fetch_vehicles("team/alice").await.unwrap();
    assert_eq!(list.user_id, "team/alice");
    assert!(list.vehicles.is_empty());
    assert_eq!(backend.hits("/api/user/team%2Falice/vehicles"), 1);
}

// =============================================================================
// Authorization URL Tests
// =============================================================================

#[tokio::test]
async fn test_authorization_url_does_not_touch_network() {
    let (backend, server) = create_test_server().await;

    let url = server.client.authorization_url("user_123").unwrap();
    assert_eq!(url.as_str(), format!("{}/login?user_id=user_123", server.base_url()));
    assert_eq!(backend.total_hits(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test]
async fn test_concurrent_fetches_do_not_block_each_other() {
    let (backend, server) = create_test_server().await;
    let delay = Duration::from_millis(300);
    for kind in [SignalKind::Location, SignalKind::Odometer] {
        backend.respond(
            signal_path(kind),
            MockResponse::ok(fixtures::signal(kind, TEST_USER_ID, TEST_VEHICLE_ID))
                .with_delay(delay),
        );
    }

    let started = Instant::now();
    let (location, odometer) = tokio::join!(
        server.client.fetch_location(TEST_USER_ID, TEST_VEHICLE_ID),
        server.client.fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID),
    );
    let elapsed = started.elapsed();

    assert_eq!(location.unwrap().payload.latitude, fixtures::LATITUDE);
    assert_eq!(odometer.unwrap().payload.value, fixtures::ODOMETER);
    assert!(
        elapsed < delay * 2,
        "requests ran sequentially: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_cancelled_fetch_does_not_affect_others() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::Location),
        MockResponse::ok(fixtures::signal(
            SignalKind::Location,
            TEST_USER_ID,
            TEST_VEHICLE_ID,
        ))
        .with_delay(Duration::from_secs(5)),
    );

    let client = server.client.clone();
    let slow = tokio::spawn(async move {
        client.fetch_location(TEST_USER_ID, TEST_VEHICLE_ID).await
    });

    let soc = server
        .client
        .fetch_state_of_charge(TEST_USER_ID, TEST_VEHICLE_ID)
        .await
        .unwrap();
    slow.abort();

    assert_eq!(soc.payload.value, fixtures::STATE_OF_CHARGE);
    assert!(slow.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_fetch_snapshot() {
    let (backend, server) = create_test_server().await;

    let snapshot = server
        .client
        .fetch_snapshot(TEST_USER_ID, TEST_VEHICLE_ID)
        .await;
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.odometer.unwrap().payload.value, fixtures::ODOMETER);
    assert_eq!(
        snapshot.charge_limit.unwrap().payload.value,
        fixtures::CHARGE_LIMIT
    );

    // One request per fixed-shape signal, nothing else
    assert_eq!(backend.total_hits(), 5);
    for kind in [
        SignalKind::Location,
        SignalKind::Odometer,
        SignalKind::StateOfCharge,
        SignalKind::NominalCapacity,
        SignalKind::ChargeLimits,
    ] {
        assert_eq!(backend.hits(&signal_path(kind)), 1, "{}", kind);
    }
}

#[tokio::test]
async fn test_fetch_snapshot_keeps_partial_results() {
    let (backend, server) = create_test_server().await;
    backend.respond(
        signal_path(SignalKind::NominalCapacity),
        MockResponse::json(
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": "No data" }),
        ),
    );

    let snapshot = server
        .client
        .fetch_snapshot(TEST_USER_ID, TEST_VEHICLE_ID)
        .await;
    assert_eq!(snapshot.error_count(), 1);
    assert!(!snapshot.is_complete());
    assert_eq!(
        snapshot.nominal_capacity.unwrap_err().status(),
        Some(503)
    );
    assert_eq!(
        snapshot.state_of_charge.unwrap().payload.value,
        fixtures::STATE_OF_CHARGE
    );
}

#[tokio::test]
async fn test_shared_transport_across_clients() {
    let (backend, server) = create_test_server().await;

    let second =
        TelemetryClient::with_http_client(&server.base_url(), server.client.http_client().clone())
            .unwrap();
    let results = futures::future::join_all(
        [&server.client, &second]
            .into_iter()
            .map(|c| c.fetch_vehicles(TEST_USER_ID)),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap().vehicles.len(), 1);
    }
    assert_eq!(backend.hits(&MockBackend::vehicles_path(TEST_USER_ID)), 2);
}
