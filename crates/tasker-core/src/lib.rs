// tasker-core: polling snapshot layer between tasker-api and consumers.
//
// Owns the subscription sets, the per-cycle snapshot, and the poll
// coordinator. Consumers subscribe to names, watch snapshots, and get
// fired commands pushed through a broadcast channel.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod snapshot;
pub mod subscriptions;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::FiredCommand;
pub use config::{DEFAULT_POLL_INTERVAL, LinkConfig};
pub use coordinator::{LinkState, NameUniverse, PollCoordinator};
pub use error::CoreError;
pub use snapshot::{PendingNames, Snapshot};
pub use subscriptions::{Category, Subscriptions};

// Re-export the record types at the crate root for ergonomics; the wire
// shapes ARE the domain records for this remote.
pub use tasker_api::models::{
    DeviceInfo, GlobalVar, Profile, Scene, SceneAction, SceneStatus, Stats, Task,
};
