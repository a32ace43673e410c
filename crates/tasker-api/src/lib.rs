//! Async Rust client for the Tasker (Android) HTTP automation API.
//!
//! Tasker exposes a small REST surface on the device (`/api/stats`,
//! `/api/profiles`, `/api/tasks`, ...) with an optional token handshake.
//! The awkward part of the protocol is that task output and variable
//! values are format-free: a payload may be JSON, XML, comma-delimited
//! text, or a bare scalar, and nothing in the response says which. The
//! [`output`] module owns that problem -- a first-success decode cascade
//! that always produces a [`serde_json::Value`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tasker_api::{TaskerClient, TransportConfig};
//!
//! let client = TaskerClient::new("192.168.1.30", tasker_api::DEFAULT_PORT, None, &TransportConfig::default())?;
//! client.authenticate(false).await?;
//! let stats = client.stats().await?;
//! println!("Tasker {} with {} tasks", stats.version, stats.total_tasks);
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod output;
pub mod tasks;
pub mod transport;

pub use client::{DEFAULT_PORT, TaskerClient};
pub use error::Error;
pub use models::{
    DeviceInfo, GlobalVar, Profile, Scene, SceneAction, SceneStatus, Stats, Task,
    decode_global_value, encode_global_value,
};
pub use output::{cast, normalize};
pub use transport::{DEFAULT_TIMEOUT, TransportConfig};
