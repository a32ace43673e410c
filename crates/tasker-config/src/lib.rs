//! Shared configuration for taskerlink consumers.
//!
//! TOML profiles, credential resolution (env + plaintext), and
//! translation to `tasker_core::LinkConfig`. The CLI layers flag
//! overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tasker_core::LinkConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Poll interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Drain the fired-command log each cycle.
    #[serde(default = "default_commands")]
    pub commands: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            commands: default_commands(),
        }
    }
}

fn default_interval() -> u64 {
    30
}
fn default_timeout() -> u64 {
    120
}
fn default_commands() -> bool {
    true
}

/// A named device profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Device address (IP or hostname on the LAN).
    pub host: String,

    /// Port of Tasker's HTTP server. Defaults to 1821.
    pub port: Option<u16>,

    /// Access token (plaintext -- prefer `api_key_env` or `TASKER_API_KEY`).
    pub api_key: Option<String>,

    /// Environment variable name containing the access token.
    pub api_key_env: Option<String>,

    /// Run the auth handshake during bootstrap.
    #[serde(default)]
    pub authenticate: bool,

    /// Friendly device name override.
    pub name: Option<String>,

    /// Poll interval override (seconds).
    pub interval: Option<u64>,

    /// Request timeout override (seconds).
    pub timeout: Option<u64>,

    /// Fired-command drain override.
    pub commands: Option<bool>,

    /// Builtin global variable names subscribed from the start
    /// (e.g. `["BATT", "WIFII"]`).
    #[serde(default)]
    pub builtin_globals: Vec<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "taskerlink", "taskerlink").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("taskerlink");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full [`Config`] from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a [`Config`] from an explicit TOML path + environment.
///
/// Environment overlay uses `TASKER_` with `__` as the section
/// separator, e.g. `TASKER_DEFAULTS__INTERVAL=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TASKER_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning defaults if the file doesn't exist or fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Resolution ──────────────────────────────────────────────────────

/// The profile the caller should use: an explicit choice, the
/// configured default, or `"default"`.
pub fn active_profile_name(explicit: Option<&str>, cfg: &Config) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve the access token for a profile: named env var, then the
/// well-known `TASKER_API_KEY`, then plaintext config. Tokenless setups
/// are legal (the remote may run without auth, or the handshake obtains
/// a key), so absence is `None`, not an error.
pub fn resolve_api_key(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    if let Ok(val) = std::env::var("TASKER_API_KEY") {
        return Some(SecretString::from(val));
    }
    profile.api_key.clone().map(SecretString::from)
}

/// Build a [`LinkConfig`] from a profile plus the config defaults.
pub fn resolve_profile(
    cfg: &Config,
    profile_name: &str,
) -> Result<LinkConfig, ConfigError> {
    let profile = cfg
        .profiles
        .get(profile_name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: profile_name.into(),
        })?;

    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let mut link = LinkConfig::new(profile.host.clone());
    if let Some(port) = profile.port {
        link.port = port;
    }
    link.api_key = resolve_api_key(profile);
    link.authenticate = profile.authenticate;
    link.poll_interval = Duration::from_secs(profile.interval.unwrap_or(cfg.defaults.interval));
    link.request_timeout = Duration::from_secs(profile.timeout.unwrap_or(cfg.defaults.timeout));
    link.fetch_commands = profile.commands.unwrap_or(cfg.defaults.commands);
    link.device_name = profile.name.clone();
    link.builtin_globals = profile.builtin_globals.clone();
    Ok(link)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::{Config, active_profile_name, load_config_from, resolve_profile};

    fn write_config(toml_text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(toml_text.as_bytes()).expect("write");
        file
    }

    #[test]
    fn load_and_resolve_profile() {
        let file = write_config(
            r#"
            default_profile = "phone"

            [defaults]
            interval = 15

            [profiles.phone]
            host = "192.168.1.30"
            port = 8421
            api_key = "tok"
            authenticate = true
            name = "Kitchen Tablet"
            builtin_globals = ["BATT"]
            "#,
        );

        let cfg = load_config_from(file.path()).expect("loads");
        assert_eq!(active_profile_name(None, &cfg), "phone");

        let link = resolve_profile(&cfg, "phone").expect("resolves");
        assert_eq!(link.host, "192.168.1.30");
        assert_eq!(link.port, 8421);
        assert_eq!(
            link.api_key.as_ref().map(|k| k.expose_secret().to_owned()),
            Some("tok".to_owned())
        );
        assert!(link.authenticate);
        assert_eq!(link.poll_interval.as_secs(), 15);
        assert_eq!(link.device_name.as_deref(), Some("Kitchen Tablet"));
        assert_eq!(link.builtin_globals, vec!["BATT"]);
    }

    #[test]
    fn profile_overrides_beat_defaults() {
        let file = write_config(
            r#"
            [profiles.phone]
            host = "10.0.0.2"
            interval = 5
            commands = false
            "#,
        );

        let cfg = load_config_from(file.path()).expect("loads");
        let link = resolve_profile(&cfg, "phone").expect("resolves");
        assert_eq!(link.poll_interval.as_secs(), 5);
        assert!(!link.fetch_commands);
        assert_eq!(link.port, 1821);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        assert!(resolve_profile(&cfg, "nope").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config_from(std::path::Path::new("/nonexistent/config.toml"))
            .expect("defaults");
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.interval, 30);
        assert!(cfg.profiles.is_empty());
    }
}
