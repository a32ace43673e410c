// ── Coordinator configuration ──

use std::time::Duration;

use secrecy::SecretString;

use tasker_api::DEFAULT_PORT;
use tasker_api::transport::DEFAULT_TIMEOUT;

use crate::error::CoreError;

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Everything the coordinator needs to talk to one Tasker device.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Device address (IP or hostname on the LAN).
    pub host: String,

    /// Port of Tasker's HTTP server.
    pub port: u16,

    /// Access token. When absent and `authenticate` is set, the token is
    /// obtained through the handshake during bootstrap.
    pub api_key: Option<SecretString>,

    /// Run the auth handshake during bootstrap.
    pub authenticate: bool,

    /// Interval between poll cycles.
    pub poll_interval: Duration,

    /// Per-request timeout; floored at the transport default.
    pub request_timeout: Duration,

    /// Fetch (and drain) the fired-command log each cycle.
    pub fetch_commands: bool,

    /// Friendly name for the device record, overriding what the remote
    /// reports.
    pub device_name: Option<String>,

    /// Builtin global variable names (well-known remote variables such
    /// as `BATT`) subscribed from the start without registration.
    pub builtin_globals: Vec<String>,
}

impl LinkConfig {
    /// Minimal config for `host` with every default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            api_key: None,
            authenticate: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_TIMEOUT,
            fetch_commands: true,
            device_name: None,
            builtin_globals: Vec::new(),
        }
    }

    /// Validate the pieces that can be checked offline.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "host must not be empty".into(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::Config {
                message: "poll interval must be non-zero".into(),
            });
        }
        Ok(())
    }

    /// The effective per-request timeout (never below the transport
    /// default -- task invocations are allowed to be slow).
    pub fn effective_timeout(&self) -> Duration {
        self.request_timeout.max(DEFAULT_TIMEOUT)
    }
}
