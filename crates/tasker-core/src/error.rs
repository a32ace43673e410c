// ── Core error types ──
//
// Consumer-facing errors from tasker-core. These are NOT transport
// errors -- consumers never see HTTP statuses or JSON parse failures
// directly. The `From<tasker_api::Error>` impl translates the API-layer
// taxonomy into the three conditions that matter to a host: the token is
// dead, the link hiccuped, or bootstrap never completed.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The remote rejected our token (or the handshake failed). The
    /// current cycle is abandoned; re-authentication is required before
    /// polling can resume.
    #[error("Authentication expired: {message}")]
    AuthExpired { message: String },

    /// A fetch failed for a reason worth retrying next cycle. The
    /// previous snapshot stays current.
    #[error("Fetch failed: {message}")]
    Fetch { message: String },

    /// Bootstrap could not establish device identity or the initial name
    /// universe. The coordinator never becomes ready; the caller may
    /// retry the whole bootstrap later.
    #[error("Bootstrap failed: {message}")]
    Bootstrap { message: String },

    /// The coordinator has been shut down (or was never started).
    #[error("Coordinator is not running")]
    NotRunning,

    /// Configuration rejected before any network traffic.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invariant violation inside the core crate.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` when re-authentication is the only way forward.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthExpired { .. })
    }
}

// ── Conversion from API-layer errors ─────────────────────────────────

impl From<tasker_api::Error> for CoreError {
    fn from(err: tasker_api::Error) -> Self {
        match err {
            tasker_api::Error::Auth { message } => CoreError::AuthExpired { message },
            tasker_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid remote address: {e}"),
            },
            other => CoreError::Fetch {
                message: other.to_string(),
            },
        }
    }
}
