//! Plugins: the unit of composition for a Phoenix host.
//!
//! Hot-swap registries, logging and any application wiring are delivered as
//! plugins. A plugin inserts state during [`build`](Plugin::build), validates
//! or starts things in [`ready`](Plugin::ready), reacts to schedule ticks in
//! [`update`](Plugin::update) and releases what it holds in
//! [`cleanup`](Plugin::cleanup).
//!
//! # Example
//!
//! ```
//! use phoenix_system::plugin::{Plugin, PluginId, ScheduleId, Version};
//! use phoenix_system::server::Server;
//!
//! pub struct OnConfigChanged;
//!
//! struct WatcherPlugin;
//!
//! impl Plugin for WatcherPlugin {
//!     const ID: &'static str = "demo::watcher";
//!     const VERSION: Version = Version::new(0, 1, 0);
//!
//!     fn build(&self, _server: &mut Server) {}
//!
//!     fn tick_schedules(&self) -> Vec<ScheduleId> {
//!         vec![ScheduleId::of::<OnConfigChanged>()]
//!     }
//!
//!     fn update(&self, _server: &mut Server, _schedule: ScheduleId) {
//!         // react to the change
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(WatcherPlugin);
//! server.finish();
//! server.tick::<OnConfigChanged>();
//! ```

mod schedule;

pub use schedule::{Schedule, ScheduleId};

use core::any::TypeId;
use core::fmt;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a plugin type, used for dependency resolution and duplicate
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Returns the identifier of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Version
// ─────────────────────────────────────────────────────────────────────────────

/// A plugin's own version, declared as an associated constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl Version {
    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of functionality added to a [`Server`].
///
/// Lifecycle, driven by the server:
///
/// 1. `build()` in dependency order, during [`Server::finish`]
/// 2. `ready()` in dependency order, once every plugin is built
/// 3. `update()` whenever a schedule listed in `tick_schedules()` is ticked
/// 4. `cleanup()` in reverse dependency order, during [`Server::cleanup`]
pub trait Plugin: Send + Sync + 'static {
    /// Stable, human-readable identifier (e.g. `"phoenix::tracing"`).
    const ID: &'static str;

    /// Version of this plugin.
    const VERSION: Version;

    /// Inserts resources and sub-plugins. Called exactly once.
    fn build(&self, server: &mut Server);

    /// Called after every plugin has been built.
    ///
    /// Use it to validate that required resources exist or to start
    /// anything that depends on other plugins' state.
    fn ready(&self, _server: &mut Server) {}

    /// Called when a schedule returned by [`tick_schedules`](Self::tick_schedules)
    /// is ticked.
    fn update(&self, _server: &mut Server, _schedule: ScheduleId) {}

    /// Called on shutdown, dependents before their dependencies.
    fn cleanup(&self, _server: &mut Server) {}

    /// Schedules this plugin wants [`update`](Self::update) calls for.
    fn tick_schedules(&self) -> Vec<ScheduleId> {
        Vec::new()
    }

    /// Name used in diagnostics. Defaults to the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Plugins that must be built before this one.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Whether adding a second plugin of this type is an error.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Things accepted by [`Server::add_plugins`].
pub trait Plugins {
    /// Adds the contained plugins to `server`.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        server.add_plugin_boxed(PluginId::of::<P>(), Box::new(self));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Object-safe view
// ─────────────────────────────────────────────────────────────────────────────

/// Object-safe mirror of [`Plugin`]; the associated constants are captured
/// as methods so plugins can be stored as trait objects.
pub(crate) trait DynPlugin: Send + Sync + 'static {
    fn id_str(&self) -> &'static str;
    fn version(&self) -> Version;
    fn build(&self, server: &mut Server);
    fn ready(&self, server: &mut Server);
    fn update(&self, server: &mut Server, schedule: ScheduleId);
    fn cleanup(&self, server: &mut Server);
    fn tick_schedules(&self) -> Vec<ScheduleId>;
    fn name(&self) -> &str;
    fn dependencies(&self) -> Vec<PluginId>;
    fn is_unique(&self) -> bool;
}

impl<P: Plugin> DynPlugin for P {
    fn id_str(&self) -> &'static str {
        P::ID
    }
    fn version(&self) -> Version {
        P::VERSION
    }
    fn build(&self, server: &mut Server) {
        Plugin::build(self, server);
    }
    fn ready(&self, server: &mut Server) {
        Plugin::ready(self, server);
    }
    fn update(&self, server: &mut Server, schedule: ScheduleId) {
        Plugin::update(self, server, schedule);
    }
    fn cleanup(&self, server: &mut Server) {
        Plugin::cleanup(self, server);
    }
    fn tick_schedules(&self) -> Vec<ScheduleId> {
        Plugin::tick_schedules(self)
    }
    fn name(&self) -> &str {
        Plugin::name(self)
    }
    fn dependencies(&self) -> Vec<PluginId> {
        Plugin::dependencies(self)
    }
    fn is_unique(&self) -> bool {
        Plugin::is_unique(self)
    }
}
