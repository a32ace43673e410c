// ── Poll snapshot ──
//
// One cycle's complete result set. Snapshots are immutable once
// published and replaced wholesale each cycle -- there is no incremental
// merge and no history. Each name-keyed map is restricted to the names
// subscribed at fetch time; the pending sets carry subscribed names that
// have not yet produced data, so consumers aren't dropped between
// subscribing and their first cycle.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use tasker_api::models::{GlobalVar, Profile, Scene, Stats, Task};

use crate::subscriptions::Category;

/// Names subscribed but not yet represented in their mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingNames {
    pub profiles: HashSet<String>,
    pub tasks: HashSet<String>,
    pub scenes: HashSet<String>,
    pub globals: HashSet<String>,
}

impl PendingNames {
    pub fn by_category(&self, category: Category) -> &HashSet<String> {
        match category {
            Category::Profiles => &self.profiles,
            Category::Tasks => &self.tasks,
            Category::Scenes => &self.scenes,
            Category::Globals => &self.globals,
        }
    }
}

/// The complete result of one poll cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Aggregate counters + version; present in every snapshot because
    /// the stats fetch doubles as the liveness probe.
    pub stats: Stats,

    /// Commands drained from the remote command log this cycle.
    pub commands: Vec<String>,

    pub profiles: HashMap<String, Profile>,
    pub tasks: HashMap<String, Task>,
    pub scenes: HashMap<String, Scene>,
    pub globals: HashMap<String, GlobalVar>,

    /// Subscribed names still awaiting their first data.
    pub pending: PendingNames,

    /// When this cycle completed.
    pub refreshed_at: DateTime<Utc>,
}

impl Snapshot {
    /// An empty snapshot around freshly fetched stats.
    pub fn new(stats: Stats) -> Self {
        Self {
            stats,
            commands: Vec::new(),
            profiles: HashMap::new(),
            tasks: HashMap::new(),
            scenes: HashMap::new(),
            globals: HashMap::new(),
            pending: PendingNames::default(),
            refreshed_at: Utc::now(),
        }
    }

    /// True when no category holds data or pending names.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
            && self.tasks.is_empty()
            && self.scenes.is_empty()
            && self.globals.is_empty()
            && self.pending == PendingNames::default()
    }

    /// A profile is "known" while mapped or pending.
    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name) || self.pending.profiles.contains(name)
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.contains_key(name) || self.pending.tasks.contains(name)
    }

    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name) || self.pending.scenes.contains(name)
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains_key(name) || self.pending.globals.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use tasker_api::models::Stats;

    use super::Snapshot;

    fn stats() -> Stats {
        Stats {
            active_profiles: 1,
            total_profiles: 2,
            total_tasks: 3,
            total_scenes: 0,
            total_globals: 4,
            version: "6.2".into(),
        }
    }

    #[test]
    fn fresh_snapshot_is_empty() {
        let snap = Snapshot::new(stats());
        assert!(snap.is_empty());
        assert!(!snap.has_profile("Home"));
    }

    #[test]
    fn pending_names_count_as_known() {
        let mut snap = Snapshot::new(stats());
        snap.pending.profiles.insert("Home".into());
        assert!(snap.has_profile("Home"));
        assert!(!snap.is_empty());
    }
}
