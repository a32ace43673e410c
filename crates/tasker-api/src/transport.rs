// Shared transport configuration for building `reqwest::Client` instances.
//
// Tasker's HTTP server lives on the device's LAN address and speaks plain
// HTTP on a high port; long-running task invocations mean the default
// timeout is generous (120 s) and per-call overrides may raise it but
// never lower it.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

/// Default per-request timeout. Task invocations can legitimately take
/// this long (the remote runs arbitrary user automation).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Timeout actually applied to a call: the requested value, floored
    /// at the configured default. Never shorter than [`DEFAULT_TIMEOUT`].
    pub fn call_timeout(&self, requested: Option<Duration>) -> Duration {
        requested.map_or(self.timeout, |t| t.max(self.timeout))
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// The remote drops idle sockets aggressively, so `Connection:
    /// keep-alive` is pinned on every request.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("tasker-api/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(client)
    }
}
