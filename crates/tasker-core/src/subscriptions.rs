// ── Subscription sets ──
//
// Consumers register interest in entity names per category; the
// coordinator only fetches categories with at least one subscriber and
// restricts each fetch to the subscribed names. A freshly subscribed
// name is also marked pending so a consumer isn't treated as removed
// before its first data arrives.

use dashmap::DashSet;

/// Entity categories the remote exposes as pollable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Profiles,
    Tasks,
    Scenes,
    Globals,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Profiles,
        Category::Tasks,
        Category::Scenes,
        Category::Globals,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Profiles => "profiles",
            Category::Tasks => "tasks",
            Category::Scenes => "scenes",
            Category::Globals => "globals",
        }
    }
}

/// One `DashSet` per category, owned by the coordinator. Membership at
/// the instant a cycle reads a set is authoritative for that cycle's
/// fetch; registration events may interleave freely.
#[derive(Debug, Default)]
pub struct Subscriptions {
    profiles: DashSet<String>,
    tasks: DashSet<String>,
    scenes: DashSet<String>,
    globals: DashSet<String>,

    pending_profiles: DashSet<String>,
    pending_tasks: DashSet<String>,
    pending_scenes: DashSet<String>,
    pending_globals: DashSet<String>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    fn enabled(&self, category: Category) -> &DashSet<String> {
        match category {
            Category::Profiles => &self.profiles,
            Category::Tasks => &self.tasks,
            Category::Scenes => &self.scenes,
            Category::Globals => &self.globals,
        }
    }

    fn pending(&self, category: Category) -> &DashSet<String> {
        match category {
            Category::Profiles => &self.pending_profiles,
            Category::Tasks => &self.pending_tasks,
            Category::Scenes => &self.pending_scenes,
            Category::Globals => &self.pending_globals,
        }
    }

    /// Register interest in a name. The name is pending until the next
    /// cycle delivers data for it.
    pub fn subscribe(&self, category: Category, name: impl Into<String>) {
        let name = name.into();
        self.pending(category).insert(name.clone());
        self.enabled(category).insert(name);
    }

    /// Drop interest in a name.
    pub fn unsubscribe(&self, category: Category, name: &str) {
        self.enabled(category).remove(name);
        self.pending(category).remove(name);
    }

    /// Whether anything is subscribed in this category.
    pub fn is_subscribed(&self, category: Category) -> bool {
        !self.enabled(category).is_empty()
    }

    /// Snapshot of the subscribed names, in no particular order.
    pub fn names(&self, category: Category) -> Vec<String> {
        self.enabled(category)
            .iter()
            .map(|n| n.key().clone())
            .collect()
    }

    /// Snapshot of the names still awaiting their first data.
    pub fn pending_names(&self, category: Category) -> Vec<String> {
        self.pending(category)
            .iter()
            .map(|n| n.key().clone())
            .collect()
    }

    /// Clear pending state for names that have now been delivered.
    pub fn mark_delivered<'a>(&self, category: Category, names: impl Iterator<Item = &'a str>) {
        let pending = self.pending(category);
        for name in names {
            pending.remove(name);
        }
    }
}
