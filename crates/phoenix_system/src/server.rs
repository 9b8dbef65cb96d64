//! Server runtime for plugin orchestration.
//!
//! The [`Server`] owns plugins and the state they publish. It has no
//! behavior of its own: everything, including hot-swap registries and log
//! setup, arrives through plugins.
//!
//! # Lifecycle
//!
//! 1. **Add** - [`add_plugins`](Server::add_plugins) queues plugins
//! 2. **Finish** - [`finish`](Server::finish) orders plugins by their
//!    dependencies, calls `build()` on each, then `ready()` on each, then
//!    indexes which plugins listen to which schedules
//! 3. **Tick** - [`tick`](Server::tick) dispatches `update()` to listeners,
//!    in dependency order
//! 4. **Cleanup** - [`cleanup`](Server::cleanup) calls `cleanup()` in
//!    reverse dependency order
//!
//! # State
//!
//! Plugins publish state as globals
//! ([`insert_global`](Server::insert_global)) that live as long as the
//! server, e.g. a resource registry or a refresh coordinator.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::plugin::{DynPlugin, PluginId, Plugins, ScheduleId};
use crate::resource::{GlobalResource, Resources};

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// Where the server is in its one-way build sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    Building,
    Built,
}

/// A plugin the server knows about.
struct PluginEntry {
    id: PluginId,
    plugin: Arc<dyn DynPlugin>,
    name: String,
}

/// The runtime that orchestrates plugins and holds their published state.
///
/// ```
/// use phoenix_system::plugin::{Plugin, Version};
/// use phoenix_system::server::Server;
///
/// struct Noop;
/// impl Plugin for Noop {
///     const ID: &'static str = "demo::noop";
///     const VERSION: Version = Version::new(0, 0, 1);
///     fn build(&self, _server: &mut Server) {}
/// }
///
/// let mut server = Server::new();
/// server.add_plugins(Noop);
/// server.finish();
/// assert!(server.is_built());
/// server.cleanup();
/// ```
#[derive(Default)]
pub struct Server {
    /// Lifetime-scoped state published by plugins.
    global: Resources,

    /// Plugins added but not yet built.
    pending: Vec<PluginEntry>,

    /// Plugins in the order they were built.
    built: Vec<PluginEntry>,

    /// Every plugin id added so far, for duplicate detection.
    plugin_ids: HashSet<PluginId>,

    /// Schedule -> indices into `built`, in dependency order.
    listeners: HashMap<ScheduleId, Vec<usize>>,

    state: BuildState,
}

impl Server {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin.
    ///
    /// Plugins added from inside another plugin's `build()` are built
    /// immediately.
    ///
    /// # Panics
    ///
    /// - If a unique plugin is added twice
    /// - If the server has already finished building
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn DynPlugin>) {
        let name = plugin.name().to_string();

        assert!(
            self.state != BuildState::Built,
            "Plugin '{name}' was added after Server::finish().\n\
             Add every plugin before finishing the server."
        );

        if plugin.is_unique() && !self.plugin_ids.insert(id) {
            panic!(
                "Plugin '{name}' ({}) is unique and was already added.\n\
                 Return `false` from `is_unique()` to allow several instances.",
                plugin.id_str()
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry {
            id,
            plugin: Arc::from(plugin),
            name,
        };

        if self.state == BuildState::Building {
            let plugin = Arc::clone(&entry.plugin);
            plugin.build(self);
            self.built.push(entry);
        } else {
            self.pending.push(entry);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Globals
    // ─────────────────────────────────────────────────────────────────────────

    /// Publishes a global resource, returning any value it replaced.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Returns `true` if a global of type `R` exists.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.global.contains::<R>()
    }

    /// Borrows a global resource. `None` if it was never published.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<&R> {
        self.global.get::<R>().ok()
    }

    /// Returns `true` once [`finish`](Self::finish) has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.state == BuildState::Built
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ticks
    // ─────────────────────────────────────────────────────────────────────────

    /// Dispatches `update()` to every plugin listening to schedule `S`.
    pub fn tick<S: 'static>(&mut self) {
        self.tick_schedule(ScheduleId::of::<S>());
    }

    /// Non-generic form of [`tick`](Self::tick).
    ///
    /// Ticking a schedule nobody listens to, or ticking before
    /// [`finish`](Self::finish), does nothing.
    pub fn tick_schedule(&mut self, schedule: ScheduleId) {
        let Some(indices) = self.listeners.get(&schedule).cloned() else {
            return;
        };

        for idx in indices {
            let plugin = Arc::clone(&self.built[idx].plugin);
            plugin.update(self, schedule);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Builds and readies every added plugin.
    ///
    /// # Panics
    ///
    /// - If called twice
    /// - If a plugin depends on a plugin that was never added
    /// - If plugin dependencies form a cycle
    pub fn finish(&mut self) {
        assert!(
            self.state == BuildState::NotStarted,
            "Server::finish() was already called. A server is built once."
        );

        let ordered = self.dependency_order();

        self.state = BuildState::Building;
        for entry in ordered {
            let plugin = Arc::clone(&entry.plugin);
            plugin.build(self);
            self.built.push(entry);
        }

        // `ready()` may still add plugins; those are built on the spot and
        // readied by this same loop.
        let mut idx = 0;
        while idx < self.built.len() {
            let plugin = Arc::clone(&self.built[idx].plugin);
            plugin.ready(self);
            idx += 1;
        }

        self.index_listeners();
        self.state = BuildState::Built;
    }

    /// Calls `cleanup()` on every built plugin, last built first.
    pub fn cleanup(&mut self) {
        for idx in (0..self.built.len()).rev() {
            let plugin = Arc::clone(&self.built[idx].plugin);
            plugin.cleanup(self);
        }
    }

    fn index_listeners(&mut self) {
        self.listeners.clear();
        for (idx, entry) in self.built.iter().enumerate() {
            for schedule in entry.plugin.tick_schedules() {
                self.listeners.entry(schedule).or_default().push(idx);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Dependency Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Drains the pending plugins in an order where every plugin follows its
    /// dependencies. Ties keep insertion order.
    fn dependency_order(&mut self) -> Vec<PluginEntry> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit(
            idx: usize,
            entries: &[PluginEntry],
            first_of: &HashMap<PluginId, usize>,
            marks: &mut [Mark],
            path: &mut Vec<usize>,
            order: &mut Vec<usize>,
        ) {
            match marks[idx] {
                Mark::Done => return,
                Mark::Visiting => {
                    let start = path.iter().position(|&i| i == idx).unwrap_or(0);
                    let cycle: Vec<&str> = path[start..]
                        .iter()
                        .map(|&i| entries[i].name.as_str())
                        .collect();
                    panic!(
                        "Circular dependency detected among plugins: {cycle:?}\n\
                         Move the shared part into a plugin both can depend on."
                    );
                }
                Mark::Unvisited => {}
            }

            marks[idx] = Mark::Visiting;
            path.push(idx);
            for dep in entries[idx].plugin.dependencies() {
                // Dependencies already built in an earlier phase have no entry here.
                if let Some(&dep_idx) = first_of.get(&dep) {
                    visit(dep_idx, entries, first_of, marks, path, order);
                }
            }
            path.pop();
            marks[idx] = Mark::Done;
            order.push(idx);
        }

        let pending = core::mem::take(&mut self.pending);

        let mut first_of: HashMap<PluginId, usize> = HashMap::new();
        for (idx, entry) in pending.iter().enumerate() {
            first_of.entry(entry.id).or_insert(idx);
        }

        for entry in &pending {
            for dep in entry.plugin.dependencies() {
                let satisfied =
                    first_of.contains_key(&dep) || self.built.iter().any(|b| b.id == dep);
                assert!(
                    satisfied,
                    "Plugin '{}' requires '{}' which was not added.\n\
                     Add {} before finishing the server.",
                    entry.name,
                    dep.type_name(),
                    dep.type_name()
                );
            }
        }

        let mut marks = vec![Mark::Unvisited; pending.len()];
        let mut order = Vec::with_capacity(pending.len());
        let mut path = Vec::new();
        for idx in 0..pending.len() {
            visit(idx, &pending, &first_of, &mut marks, &mut path, &mut order);
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}
