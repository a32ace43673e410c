// ── Poll coordinator ──
//
// Drives the cycle Idle -> Fetching -> Assembling -> Published on a
// fixed interval. All fetches within a cycle run sequentially on one
// task; a cycle mutex plus a generation counter makes manual refreshes
// coalesce with an in-flight cycle instead of overlapping it.
//
// Failure policy per cycle: the stats fetch is the liveness probe and
// its loss degrades the whole cycle; a category fetch that yields
// nothing falls back to the previous snapshot's mapping for just that
// category; a 401 anywhere aborts the cycle with the distinct auth
// classification and publishes nothing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use chrono::Utc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tasker_api::models::DeviceInfo;
use tasker_api::tasks::{self, TASK_DEVICE_INFO};
use tasker_api::transport::TransportConfig;
use tasker_api::TaskerClient;

use crate::command::FiredCommand;
use crate::config::LinkConfig;
use crate::error::CoreError;
use crate::snapshot::{PendingNames, Snapshot};
use crate::subscriptions::{Category, Subscriptions};

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── LinkState ────────────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not bootstrapped (or shut down).
    Idle,
    /// Last cycle published a snapshot.
    Connected,
    /// Last cycle failed transiently; previous snapshot still current.
    Degraded,
    /// The remote rejected our token; re-authentication required.
    AuthExpired,
}

/// Full remote name universe per category, enumerated at bootstrap.
#[derive(Debug, Clone, Default)]
pub struct NameUniverse {
    pub profiles: HashSet<String>,
    pub tasks: HashSet<String>,
    pub scenes: HashSet<String>,
    pub globals: HashSet<String>,
}

// ── PollCoordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Owns the subscription sets, the current
/// snapshot, and the background poll task. Construction does no I/O --
/// call [`start()`](Self::start) (or [`bootstrap()`](Self::bootstrap) +
/// [`refresh()`](Self::refresh) manually) to go live.
#[derive(Clone)]
pub struct PollCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: TaskerClient,
    config: LinkConfig,
    subscriptions: Subscriptions,
    device: OnceLock<DeviceInfo>,
    universe: RwLock<NameUniverse>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    state_tx: watch::Sender<LinkState>,
    command_tx: broadcast::Sender<FiredCommand>,
    /// Serializes cycles; taken by [`PollCoordinator::refresh`].
    cycle_lock: Mutex<()>,
    /// Bumped on every published snapshot; used for refresh coalescing.
    generation: AtomicU64,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PollCoordinator {
    /// Create a coordinator from configuration. Does NOT touch the
    /// network.
    pub fn new(config: LinkConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let transport = TransportConfig {
            timeout: config.effective_timeout(),
        };
        let client = TaskerClient::new(
            &config.host,
            config.port,
            config.api_key.clone(),
            &transport,
        )?;

        let (snapshot_tx, _) = watch::channel(None);
        let (state_tx, _) = watch::channel(LinkState::Idle);
        let (command_tx, _) = broadcast::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                client,
                config,
                subscriptions: Subscriptions::new(),
                device: OnceLock::new(),
                universe: RwLock::new(NameUniverse::default()),
                snapshot_tx,
                state_tx,
                command_tx,
                cycle_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// The underlying API client, for direct actions (running tasks,
    /// flipping profiles). Action results should be followed by a
    /// [`refresh()`](Self::refresh) so the snapshot catches up.
    pub fn client(&self) -> &TaskerClient {
        &self.inner.client
    }

    pub fn config(&self) -> &LinkConfig {
        &self.inner.config
    }

    // ── Bootstrap ────────────────────────────────────────────────

    /// First-contact sequence: auth handshake (when configured),
    /// enumeration of the full name universe per category, and stable
    /// device identity via the Device Info task.
    ///
    /// An auth failure here is non-recoverable ([`CoreError::AuthExpired`]);
    /// anything else is a [`CoreError::Bootstrap`], and the whole
    /// sequence may be retried later.
    pub async fn bootstrap(&self) -> Result<(), CoreError> {
        let inner = &self.inner;

        if inner.config.authenticate {
            let refresh = inner.config.api_key.is_some();
            inner
                .client
                .authenticate(refresh)
                .await
                .map_err(CoreError::from)?;
            debug!("auth handshake complete");
        }

        let universe = self
            .fetch_universe()
            .await
            .map_err(Self::classify_bootstrap)?;
        info!(
            profiles = universe.profiles.len(),
            tasks = universe.tasks.len(),
            scenes = universe.scenes.len(),
            globals = universe.globals.len(),
            "enumerated remote name universe"
        );

        let import = !universe.tasks.contains(TASK_DEVICE_INFO);
        if let Ok(mut slot) = inner.universe.write() {
            *slot = universe;
        }

        let device = tasks::device_info(
            &inner.client,
            inner.config.device_name.as_deref(),
            Some(import),
        )
        .await
        .map_err(Self::classify_bootstrap)?;
        info!(
            android_id = %device.android_id,
            model = %device.model,
            "resolved device identity"
        );
        let _ = inner.device.set(device);

        for name in &inner.config.builtin_globals {
            inner.subscriptions.subscribe(Category::Globals, name.clone());
        }

        Ok(())
    }

    fn classify_bootstrap(err: tasker_api::Error) -> CoreError {
        if err.is_auth() {
            CoreError::AuthExpired {
                message: err.to_string(),
            }
        } else {
            CoreError::Bootstrap {
                message: err.to_string(),
            }
        }
    }

    /// Enumerate every name the remote knows, independent of
    /// subscriptions. Sequential fetches, like everything in a cycle.
    async fn fetch_universe(&self) -> Result<NameUniverse, tasker_api::Error> {
        let client = &self.inner.client;
        Ok(NameUniverse {
            profiles: client
                .profiles(None)
                .await?
                .into_iter()
                .map(|p| p.name)
                .collect(),
            tasks: client
                .tasks(None)
                .await?
                .into_iter()
                .map(|t| t.name)
                .collect(),
            scenes: client
                .scenes(None)
                .await?
                .into_iter()
                .map(|s| s.name)
                .collect(),
            globals: client
                .globals(None, false)
                .await?
                .into_iter()
                .map(|g| g.name)
                .collect(),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Bootstrap, run the first cycle, and spawn the periodic poll task.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.bootstrap().await?;
        self.refresh().await?;

        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        let interval = self.inner.config.poll_interval;
        let handle = tokio::spawn(poll_task(coordinator, interval, cancel));
        self.inner.task_handles.lock().await.push(handle);
        Ok(())
    }

    /// Cancel the poll task and drop into [`LinkState::Idle`]. Any
    /// in-flight cycle's result is discarded, never published.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        let _ = self.inner.state_tx.send(LinkState::Idle);
        debug!("coordinator shut down");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run one poll cycle, or join the one already in flight.
    ///
    /// If another cycle publishes while we wait for the cycle lock, its
    /// snapshot is returned instead of starting a new cycle (request
    /// coalescing). Cycles are never concurrent.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::NotRunning);
        }

        let seen = self.inner.generation.load(Ordering::Acquire);
        let _guard = self.inner.cycle_lock.lock().await;
        if self.inner.generation.load(Ordering::Acquire) != seen {
            if let Some(snapshot) = self.inner.snapshot_tx.borrow().clone() {
                debug!("refresh coalesced with a just-completed cycle");
                return Ok(snapshot);
            }
        }

        self.run_cycle().await
    }

    /// Re-run the auth handshake after [`LinkState::AuthExpired`], then
    /// immediately poll.
    pub async fn reauthenticate(&self) -> Result<Arc<Snapshot>, CoreError> {
        let refresh = self.inner.client.api_key().is_some();
        self.inner.client.authenticate(refresh).await?;
        self.refresh().await
    }

    async fn run_cycle(&self) -> Result<Arc<Snapshot>, CoreError> {
        let inner = &self.inner;
        let previous = self.snapshot();

        debug!("fetching stats");
        let stats = match inner.client.stats().await {
            Ok(stats) => stats,
            Err(e) if e.is_auth() => return Err(self.auth_abort(e)),
            Err(e) => {
                let _ = inner.state_tx.send(LinkState::Degraded);
                warn!(error = %e, "stats fetch failed; previous snapshot retained");
                return Err(CoreError::Fetch {
                    message: e.to_string(),
                });
            }
        };
        let mut next = Snapshot::new(stats);

        if inner.config.fetch_commands {
            debug!("draining fired commands");
            match inner.client.commands(true).await {
                Ok(commands) => next.commands = commands,
                Err(e) if e.is_auth() => return Err(self.auth_abort(e)),
                // The command log is a drain, not state; nothing to carry
                // forward on a miss.
                Err(e) => warn!(error = %e, "command drain failed"),
            }
        }

        if inner.subscriptions.is_subscribed(Category::Profiles) {
            let names = inner.subscriptions.names(Category::Profiles);
            debug!(count = names.len(), "fetching profiles");
            match inner.client.profiles(Some(&names)).await {
                Ok(list) if !list.is_empty() => {
                    next.profiles = list
                        .into_iter()
                        .filter(|p| names.contains(&p.name))
                        .map(|p| (p.name.clone(), p))
                        .collect();
                }
                Ok(_) => {
                    if let Some(prev) = &previous {
                        next.profiles = prev.profiles.clone();
                    }
                }
                Err(e) if e.is_auth() => return Err(self.auth_abort(e)),
                Err(e) => {
                    warn!(error = %e, "profiles fetch failed; keeping previous");
                    if let Some(prev) = &previous {
                        next.profiles = prev.profiles.clone();
                    }
                }
            }
        }

        if inner.subscriptions.is_subscribed(Category::Tasks) {
            let names = inner.subscriptions.names(Category::Tasks);
            debug!(count = names.len(), "fetching tasks");
            match inner.client.tasks(Some(&names)).await {
                Ok(list) if !list.is_empty() => {
                    next.tasks = list
                        .into_iter()
                        .filter(|t| names.contains(&t.name))
                        .map(|t| (t.name.clone(), t))
                        .collect();
                }
                Ok(_) => {
                    if let Some(prev) = &previous {
                        next.tasks = prev.tasks.clone();
                    }
                }
                Err(e) if e.is_auth() => return Err(self.auth_abort(e)),
                Err(e) => {
                    warn!(error = %e, "tasks fetch failed; keeping previous");
                    if let Some(prev) = &previous {
                        next.tasks = prev.tasks.clone();
                    }
                }
            }
        }

        if inner.subscriptions.is_subscribed(Category::Scenes) {
            let names = inner.subscriptions.names(Category::Scenes);
            debug!(count = names.len(), "fetching scenes");
            match inner.client.scenes(Some(&names)).await {
                Ok(list) if !list.is_empty() => {
                    next.scenes = list
                        .into_iter()
                        .filter(|s| names.contains(&s.name))
                        .map(|s| (s.name.clone(), s))
                        .collect();
                }
                Ok(_) => {
                    if let Some(prev) = &previous {
                        next.scenes = prev.scenes.clone();
                    }
                }
                Err(e) if e.is_auth() => return Err(self.auth_abort(e)),
                Err(e) => {
                    warn!(error = %e, "scenes fetch failed; keeping previous");
                    if let Some(prev) = &previous {
                        next.scenes = prev.scenes.clone();
                    }
                }
            }
        }

        if inner.subscriptions.is_subscribed(Category::Globals) {
            let names = inner.subscriptions.names(Category::Globals);
            debug!(count = names.len(), "fetching globals");
            match inner.client.globals(Some(&names), true).await {
                Ok(list) if !list.is_empty() => {
                    next.globals = list
                        .into_iter()
                        .filter(|g| names.contains(&g.name))
                        .map(|g| (g.name.clone(), g))
                        .collect();
                }
                Ok(_) => {
                    if let Some(prev) = &previous {
                        next.globals = prev.globals.clone();
                    }
                }
                Err(e) if e.is_auth() => return Err(self.auth_abort(e)),
                Err(e) => {
                    warn!(error = %e, "globals fetch failed; keeping previous");
                    if let Some(prev) = &previous {
                        next.globals = prev.globals.clone();
                    }
                }
            }
        }

        // Names that now have data are no longer pending; the rest ride
        // along in the snapshot so consumers aren't dropped early.
        let subs = &inner.subscriptions;
        subs.mark_delivered(Category::Profiles, next.profiles.keys().map(String::as_str));
        subs.mark_delivered(Category::Tasks, next.tasks.keys().map(String::as_str));
        subs.mark_delivered(Category::Scenes, next.scenes.keys().map(String::as_str));
        subs.mark_delivered(Category::Globals, next.globals.keys().map(String::as_str));
        next.pending = PendingNames {
            profiles: subs.pending_names(Category::Profiles).into_iter().collect(),
            tasks: subs.pending_names(Category::Tasks).into_iter().collect(),
            scenes: subs.pending_names(Category::Scenes).into_iter().collect(),
            globals: subs.pending_names(Category::Globals).into_iter().collect(),
        };
        next.refreshed_at = Utc::now();

        // Teardown discards in-flight results; nothing is published
        // after cancellation.
        if inner.cancel.is_cancelled() {
            return Err(CoreError::NotRunning);
        }

        let snapshot = Arc::new(next);
        inner.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
        inner.generation.fetch_add(1, Ordering::Release);
        let _ = inner.state_tx.send(LinkState::Connected);

        for raw in &snapshot.commands {
            let _ = inner.command_tx.send(FiredCommand::parse(raw.clone()));
        }

        debug!(
            profiles = snapshot.profiles.len(),
            tasks = snapshot.tasks.len(),
            scenes = snapshot.scenes.len(),
            globals = snapshot.globals.len(),
            commands = snapshot.commands.len(),
            "cycle published"
        );
        Ok(snapshot)
    }

    fn auth_abort(&self, err: tasker_api::Error) -> CoreError {
        let _ = self.inner.state_tx.send(LinkState::AuthExpired);
        warn!(error = %err, "cycle aborted: re-authentication required");
        CoreError::AuthExpired {
            message: err.to_string(),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Register interest in a name; it will be fetched from the next
    /// cycle on.
    pub fn subscribe(&self, category: Category, name: impl Into<String>) {
        self.inner.subscriptions.subscribe(category, name);
    }

    /// Drop interest in a name; its category stops being fetched when
    /// the set empties.
    pub fn unsubscribe(&self, category: Category, name: &str) {
        self.inner.subscriptions.unsubscribe(category, name);
    }

    // ── State observation ────────────────────────────────────────

    /// The current snapshot, if any cycle has published yet.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn watch_snapshots(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// The current link state.
    pub fn state(&self) -> LinkState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to link state changes.
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to fired commands (decoded, broadcast per cycle).
    pub fn commands(&self) -> broadcast::Receiver<FiredCommand> {
        self.inner.command_tx.subscribe()
    }

    /// Device identity resolved at bootstrap.
    pub fn device(&self) -> Option<DeviceInfo> {
        self.inner.device.get().cloned()
    }

    /// The full remote name universe for a category (bootstrap-time
    /// enumeration, independent of subscriptions).
    pub fn universe(&self, category: Category) -> HashSet<String> {
        let universe = match self.inner.universe.read() {
            Ok(u) => u,
            Err(_) => return HashSet::new(),
        };
        match category {
            Category::Profiles => universe.profiles.clone(),
            Category::Tasks => universe.tasks.clone(),
            Category::Scenes => universe.scenes.clone(),
            Category::Globals => universe.globals.clone(),
        }
    }
}

impl std::fmt::Debug for PollCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollCoordinator")
            .field("base_url", &self.inner.client.base_url().as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ── Background task ──────────────────────────────────────────────────

/// Periodically poll the remote until cancelled.
async fn poll_task(
    coordinator: PollCoordinator,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    warn!(error = %e, "periodic poll failed");
                }
            }
        }
    }
}
