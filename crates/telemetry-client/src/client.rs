//! Telemetry HTTP client implementation

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use telemetry_core::{
    ChargeLimit, DynamicValue, LatestSignals, Location, NominalCapacity, Odometer, SignalEnvelope,
    SignalKind, StateOfCharge, VehicleList,
};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Result, TelemetryClientError};
use crate::types::*;

/// Reject identifiers that cannot be embedded in a request.
///
/// Everything else is percent-encoded when the URL is built, so a `/` in an
/// ID stays inside its own path segment.
fn validate_id(kind: &str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(TelemetryClientError::InvalidRequest(format!(
            "{} must not be empty",
            kind
        )));
    }
    if id == "." || id == ".." {
        return Err(TelemetryClientError::InvalidRequest(format!(
            "{} cannot be a relative path segment: {:?}",
            kind, id
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(TelemetryClientError::InvalidRequest(format!(
            "{} contains control characters: {:?}",
            kind, id
        )));
    }
    Ok(())
}

/// Vehicle telemetry REST API client
///
/// Holds only configuration: the base URL and a pooled HTTP transport. Cheap
/// to clone; clones share the connection pool. Every operation is a single,
/// independent GET.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    client: Client,
    base_url: Url,
}

impl TelemetryClient {
    /// Create a new client with the transport's default settings
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the telemetry server (e.g., "https://telemetry.example.com")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, &ClientConfig::default())
    }

    /// Create a new client with custom transport configuration
    pub fn with_config(base_url: &str, config: &ClientConfig) -> Result<Self> {
        // A 3xx is a server error, not something to chase
        let mut builder = Client::builder().redirect(Policy::none());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder.build().map_err(|e| {
            TelemetryClientError::InvalidRequest(format!("invalid client configuration: {}", e))
        })?;

        Self::with_http_client(base_url, client)
    }

    /// Create a client on top of an existing transport
    ///
    /// Useful for sharing one connection pool across several base URLs. The
    /// client should be built with `redirect(Policy::none())`, otherwise a
    /// redirect is followed and its target decoded as the response.
    pub fn with_http_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(TelemetryClientError::InvalidRequest(format!(
                "unsupported URL scheme '{}'",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(TelemetryClientError::InvalidRequest(format!(
                "'{}' cannot be used as a base URL",
                base_url
            )));
        }

        if base_url.query().is_some() || base_url.fragment().is_some() {
            return Err(TelemetryClientError::InvalidRequest(format!(
                "base URL '{}' must not have a query or fragment",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Build the URL that starts the OAuth flow for `user_id`
    ///
    /// Pure string composition: nothing is requested. The redirect itself is
    /// handled by whatever opens the URL.
    pub fn authorization_url(&self, user_id: &str) -> Result<Url> {
        validate_id("user ID", user_id)?;

        let mut url = self.endpoint(&["login"])?;
        url.query_pairs_mut().append_pair("user_id", user_id);
        Ok(url)
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    /// List the vehicles linked to a user
    #[instrument(skip(self))]
    pub async fn fetch_vehicles(&self, user_id: &str) -> Result<VehicleList> {
        validate_id("user ID", user_id)?;

        let url = self.endpoint(&["api", "user", user_id, "vehicles"])?;
        let list: VehicleList = self.get_json(url).await?;

        if !list.is_consistent() {
            debug!(
                "Server reported {} vehicles but listed {}",
                list.total_count,
                list.vehicles.len()
            );
        }
        Ok(list)
    }

    // =========================================================================
    // Fixed-shape signals
    // =========================================================================

    /// Current vehicle position
    #[instrument(skip(self))]
    pub async fn fetch_location(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<SignalEnvelope<Location>> {
        self.fetch_signal::<LocationResponse>(user_id, vehicle_id, SignalKind::Location)
            .await
            .map(Into::into)
    }

    /// Odometer reading
    #[instrument(skip(self))]
    pub async fn fetch_odometer(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<SignalEnvelope<Odometer>> {
        self.fetch_signal::<OdometerResponse>(user_id, vehicle_id, SignalKind::Odometer)
            .await
            .map(Into::into)
    }

    /// Battery state of charge
    #[instrument(skip(self))]
    pub async fn fetch_state_of_charge(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<SignalEnvelope<StateOfCharge>> {
        self.fetch_signal::<StateOfChargeResponse>(user_id, vehicle_id, SignalKind::StateOfCharge)
            .await
            .map(Into::into)
    }

    /// Nominal battery capacity
    #[instrument(skip(self))]
    pub async fn fetch_nominal_capacity(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<SignalEnvelope<NominalCapacity>> {
        self.fetch_signal::<NominalCapacityResponse>(
            user_id,
            vehicle_id,
            SignalKind::NominalCapacity,
        )
        .await
        .map(Into::into)
    }

    /// Active charge limit
    #[instrument(skip(self))]
    pub async fn fetch_charge_limits(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<SignalEnvelope<ChargeLimit>> {
        self.fetch_signal::<ChargeLimitsResponse>(user_id, vehicle_id, SignalKind::ChargeLimits)
            .await
            .map(Into::into)
    }

    // =========================================================================
    // Dynamic signals
    // =========================================================================

    /// Free-form battery object
    #[instrument(skip(self))]
    pub async fn fetch_battery(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<SignalEnvelope<DynamicValue>> {
        self.fetch_signal::<BatteryResponse>(user_id, vehicle_id, SignalKind::Battery)
            .await
            .map(Into::into)
    }

    /// Every signal the backend last stored, keyed by signal name
    #[instrument(skip(self))]
    pub async fn fetch_latest_signals(
        &self,
        user_id: &str,
        vehicle_id: &str,
    ) -> Result<LatestSignals> {
        self.fetch_signal::<LatestSignalsResponse>(user_id, vehicle_id, SignalKind::LatestSignals)
            .await
            .map(Into::into)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Fetch all fixed-shape signals concurrently
    ///
    /// Issues one request per signal; each outcome is kept separately.
    #[instrument(skip(self))]
    pub async fn fetch_snapshot(&self, user_id: &str, vehicle_id: &str) -> VehicleSnapshot {
        let (location, odometer, state_of_charge, nominal_capacity, charge_limit) = tokio::join!(
            self.fetch_location(user_id, vehicle_id),
            self.fetch_odometer(user_id, vehicle_id),
            self.fetch_state_of_charge(user_id, vehicle_id),
            self.fetch_nominal_capacity(user_id, vehicle_id),
            self.fetch_charge_limits(user_id, vehicle_id),
        );

        let snapshot = VehicleSnapshot {
            location,
            odometer,
            state_of_charge,
            nominal_capacity,
            charge_limit,
        };
        debug!("Snapshot complete with {} errors", snapshot.error_count());
        snapshot
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// URL for a per-vehicle signal endpoint
    pub fn signal_url(&self, user_id: &str, vehicle_id: &str, kind: SignalKind) -> Result<Url> {
        validate_id("user ID", user_id)?;
        validate_id("vehicle ID", vehicle_id)?;

        self.endpoint(&["api", "user", user_id, "vehicle", vehicle_id, kind.path()])
    }

    async fn fetch_signal<T: DeserializeOwned>(
        &self,
        user_id: &str,
        vehicle_id: &str,
        kind: SignalKind,
    ) -> Result<T> {
        let url = self.signal_url(user_id, vehicle_id, kind)?;
        self.get_json(url).await
    }

    /// Append percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TelemetryClientError::InvalidRequest(format!(
                    "'{}' cannot be used as a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Check the status, then deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status != StatusCode::OK {
            return Err(self.extract_error(response, status).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!("Failed to decode response body: {}", e);
            TelemetryClientError::DecodeError(e.to_string())
        })
    }

    /// Build a server error, using the body's error text when it has one
    async fn extract_error(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> TelemetryClientError {
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body
                .text()
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };

        warn!("Server returned {}: {}", status, message);
        TelemetryClientError::server_error(status.as_u16(), message)
    }
}
