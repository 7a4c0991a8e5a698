//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transport settings for [`TelemetryClient`](crate::TelemetryClient)
///
/// The default adds nothing on top of the HTTP transport's own defaults:
/// no request timeout, no connect timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout in milliseconds
    #[serde(default)]
    pub request_ms: Option<u64>,

    /// Connect timeout in milliseconds
    #[serde(default)]
    pub connect_ms: Option<u64>,

    /// Overrides the default `User-Agent` header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_ms = Some(duration_ms(timeout));
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_ms = Some(duration_ms(timeout));
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.request_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_ms.map(Duration::from_millis)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
