//! CLI error types with miette diagnostics.
//!
//! Maps core/API errors into user-facing errors with actionable help
//! text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tasker_core::CoreError;

/// Exit codes, stable for scripting.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("No device configured")]
    #[diagnostic(
        code(tasker::no_device),
        help(
            "Pass --host, or create a profile in the config file.\n\
             Config path: {config_path}"
        )
    )]
    NoDevice { config_path: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tasker::auth_failed),
        help(
            "Run `tasker auth` to obtain a token, or pass one with\n\
             --token / TASKER_API_KEY."
        )
    )]
    Auth { message: String },

    #[error("{kind} '{name}' not found on the device")]
    #[diagnostic(code(tasker::not_found), help("Run `tasker {kind} list` to see what exists"))]
    NotFound { kind: &'static str, name: String },

    #[error("Could not reach the device: {message}")]
    #[diagnostic(
        code(tasker::connection),
        help("Check that Tasker's HTTP server is enabled and on this network.")
    )]
    Connection { message: String },

    #[error("{message}")]
    #[diagnostic(code(tasker::usage))]
    Usage { message: String },

    #[error(transparent)]
    #[diagnostic(code(tasker::config))]
    Config(#[from] tasker_config::ConfigError),

    #[error(transparent)]
    #[diagnostic(code(tasker::io))]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(tasker::core))]
    Core(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoDevice { .. } | Self::Usage { .. } | Self::Config(_) => exit_code::USAGE,
            Self::Auth { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::Io(_) | Self::Core(_) => exit_code::GENERAL,
        }
    }
}

impl From<tasker_api::Error> for CliError {
    fn from(err: tasker_api::Error) -> Self {
        match err {
            tasker_api::Error::Auth { message } => Self::Auth { message },
            tasker_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                Self::Connection {
                    message: err.to_string(),
                }
            }
            other => Self::Core(other.to_string()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthExpired { message } => Self::Auth { message },
            CoreError::Fetch { message } | CoreError::Bootstrap { message } => {
                Self::Connection { message }
            }
            CoreError::Config { message } => Self::Usage { message },
            other => Self::Core(other.to_string()),
        }
    }
}
