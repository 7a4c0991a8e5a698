//! Test utilities for telemetry-client
//!
//! [`TestServer`] runs an axum router on an ephemeral port and hands out a
//! client pointed at it. [`MockBackend`] is a router that answers every path
//! from a table of canned responses and counts the requests it sees.
//!
//! ```rust,no_run
//! use telemetry_client::testing::{MockBackend, TestServer, TEST_USER_ID, TEST_VEHICLE_ID};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let backend = MockBackend::with_fixtures(TEST_USER_ID, TEST_VEHICLE_ID);
//! let server = TestServer::start(backend.router()).await?;
//!
//! let odometer = server.client.fetch_odometer(TEST_USER_ID, TEST_VEHICLE_ID).await?;
//! assert_eq!(odometer.payload.value, 78432);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use telemetry_core::SignalKind;
use tokio::net::TcpListener;

use crate::{ClientConfig, TelemetryClient};

/// User ID the fixtures are registered for
pub const TEST_USER_ID: &str = "user_123";
/// Vehicle ID the fixtures are registered for
pub const TEST_VEHICLE_ID: &str = "vehicle_456";

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: TelemetryClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` and build a client for it
    pub async fn start<S>(router: axum::Router<S>) -> anyhow::Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(2));
        Self::start_with_config(router, &config).await
    }

    /// Serve `router` and build a client with custom transport settings
    pub async fn start_with_config<S>(
        router: axum::Router<S>,
        config: &ClientConfig,
    ) -> anyhow::Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let router: axum::Router = router.into();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let base_url = format!("http://{}", addr);
        let client = TelemetryClient::with_config(&base_url, config)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &TelemetryClient {
        &self.client
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Mock backend
// =============================================================================

/// A canned HTTP response
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: String,
    /// Wait this long before answering
    pub delay: Option<Duration>,
    /// Extra headers, e.g. `Location` on a redirect
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    /// 200 with a JSON body
    pub fn ok(body: serde_json::Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self::raw(status, body.to_string())
    }

    /// Arbitrary body text, sent as `application/json` whether or not it is
    pub fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
            headers: Vec::new(),
        }
    }

    /// An empty-bodied redirect to `location`
    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        Self::raw(status, "").with_header(header::LOCATION.as_str(), location)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<String, MockResponse>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Router that answers from a table of canned responses keyed by path
///
/// Unregistered paths get a 404 with an `{"error": ...}` body. Clones share
/// the same table and counters.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend serving every documented endpoint for one user and vehicle
    pub fn with_fixtures(user_id: &str, vehicle_id: &str) -> Self {
        let backend = Self::new();
        backend.respond(
            Self::vehicles_path(user_id),
            MockResponse::ok(fixtures::vehicles(user_id, vehicle_id)),
        );
        for kind in SignalKind::ALL {
            backend.respond(
                Self::signal_path(user_id, vehicle_id, kind),
                MockResponse::ok(fixtures::signal(kind, user_id, vehicle_id)),
            );
        }
        backend
    }

    /// Path of the vehicle list endpoint
    pub fn vehicles_path(user_id: &str) -> String {
        format!("/api/user/{}/vehicles", user_id)
    }

    /// Path of a per-vehicle signal endpoint
    pub fn signal_path(user_id: &str, vehicle_id: &str, kind: SignalKind) -> String {
        format!("/api/user/{}/vehicle/{}/{}", user_id, vehicle_id, kind.path())
    }

    /// Register (or replace) the response for a path
    pub fn respond(&self, path: impl Into<String>, response: MockResponse) {
        self.state.routes.lock().insert(path.into(), response);
    }

    /// Requests received for a path
    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().get(path).copied().unwrap_or(0)
    }

    /// Requests received across all paths
    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().values().sum()
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .fallback(serve_mock)
            .with_state(self.clone())
    }

    /// Count the request and look up its response
    fn record(&self, path: &str) -> Option<MockResponse> {
        *self.state.hits.lock().entry(path.to_string()).or_default() += 1;
        self.state.routes.lock().get(path).cloned()
    }
}

async fn serve_mock(State(backend): State<MockBackend>, uri: Uri) -> Response {
    let path = uri.path();

    match backend.record(path) {
        Some(response) => {
            if let Some(delay) = response.delay {
                tokio::time::sleep(delay).await;
            }
            let mut reply = (
                response.status,
                [(header::CONTENT_TYPE, "application/json")],
                response.body,
            )
                .into_response();
            for (name, value) in &response.headers {
                if let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    reply.headers_mut().insert(name, value);
                }
            }
            reply
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(serde_json::json!({ "error": format!("No route for {}", path) })),
        )
            .into_response(),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Canned response bodies in the documented wire shapes
pub mod fixtures {
    use serde_json::{json, Value};
    use telemetry_core::SignalKind;

    pub const TIMESTAMP: &str = "2025-08-07T00:15:45.450000";

    pub const LATITUDE: f64 = 37.7749;
    pub const LONGITUDE: f64 = -122.4194;
    pub const HEADING: f64 = 45.3;
    pub const ODOMETER: i64 = 78432;
    pub const STATE_OF_CHARGE: i64 = 85;
    pub const NOMINAL_CAPACITY: i64 = 75;
    pub const CHARGE_LIMIT: i64 = 80;

    pub fn vehicles(user_id: &str, vehicle_id: &str) -> Value {
        json!({
            "user_id": user_id,
            "vehicles": [
                {
                    "smartcar_vehicle_id": vehicle_id,
                    "make": "Tesla",
                    "model": "Model 3",
                    "year": 2020,
                    "latest_data": {
                        "location": location_data(),
                        "battery": { "value": STATE_OF_CHARGE },
                        "odometer": { "value": ODOMETER }
                    }
                }
            ],
            "total_vehicles": 1
        })
    }

    /// Body for any per-vehicle endpoint
    pub fn signal(kind: SignalKind, user_id: &str, vehicle_id: &str) -> Value {
        match kind {
            SignalKind::Location => {
                envelope(user_id, vehicle_id, "location", location_data())
            }
            SignalKind::Odometer => {
                envelope(user_id, vehicle_id, "odometer", json!({ "value": ODOMETER }))
            }
            SignalKind::StateOfCharge => {
                envelope(user_id, vehicle_id, "state_of_charge", json!(STATE_OF_CHARGE))
            }
            SignalKind::NominalCapacity => {
                envelope(user_id, vehicle_id, "nominal_capacity", json!(NOMINAL_CAPACITY))
            }
            SignalKind::ChargeLimits => {
                envelope(user_id, vehicle_id, "charge_limit", json!(CHARGE_LIMIT))
            }
            SignalKind::Battery => envelope(
                user_id,
                vehicle_id,
                "battery",
                json!({ "value": STATE_OF_CHARGE, "range": 310.5, "isCharging": false }),
            ),
            SignalKind::LatestSignals => latest_signals(user_id, vehicle_id),
        }
    }

    pub fn latest_signals(user_id: &str, vehicle_id: &str) -> Value {
        json!({
            "user_id": user_id,
            "vehicle_id": vehicle_id,
            "signals": {
                "location": { "timestamp": TIMESTAMP, "data": location_data() },
                "odometer": { "timestamp": TIMESTAMP, "data": { "value": ODOMETER } },
                "nominal_capacity": {
                    "timestamp": TIMESTAMP,
                    "data": {
                        "source": "SMARTCAR",
                        "capacity": NOMINAL_CAPACITY,
                        "availableCapacities": [
                            { "capacity": 55, "description": "Standard Range" },
                            { "capacity": 75, "description": "Long Range" }
                        ]
                    }
                },
                "charge_limits": {
                    "timestamp": TIMESTAMP,
                    "data": {
                        "values": {
                            "activeLimit": CHARGE_LIMIT,
                            "values": [
                                { "type": "global", "limit": CHARGE_LIMIT },
                                { "type": "connector", "condition": { "connectorType": "J1772" }, "limit": 52 }
                            ]
                        }
                    }
                },
                "battery": null
            }
        })
    }

    pub fn location_data() -> Value {
        json!({
            "latitude": LATITUDE,
            "longitude": LONGITUDE,
            "direction": "NE",
            "heading": HEADING,
            "locationType": "PARKED"
        })
    }

    fn envelope(user_id: &str, vehicle_id: &str, field: &str, value: Value) -> Value {
        let mut body = json!({
            "user_id": user_id,
            "vehicle_id": vehicle_id,
            "timestamp": TIMESTAMP,
        });
        body[field] = value;
        body
    }
}
