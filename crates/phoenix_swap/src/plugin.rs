//! Server integration.
//!
//! [`HotSwapPlugin`] publishes a [`ResourceRegistry`] and a
//! [`RefreshCoordinator`] as globals and runs a refresh cycle whenever its
//! schedule ([`OnRefresh`] by default) is ticked.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts the registry and the coordinator.
//! - **`ready()`** logs how many resources were registered during build.
//! - **`update()`** runs [`RefreshCoordinator::refresh_all`].
//! - **`cleanup()`** logs the final registry size.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use phoenix_swap::{
//!     BoxError, ConstructionParams, Descriptor, HotSwapPlugin, LegacyBootstrap,
//!     LegacyConfiguration, ModernBootstrap, OnRefresh, Properties, RefreshCoordinator,
//!     ResourceBuilder, ResourceRegistry,
//! };
//! use phoenix_system::server::Server;
//!
//! struct Engine;
//!
//! impl ModernBootstrap<String> for Engine {
//!     fn create(&self, name: &str, _: &Properties) -> Result<Arc<String>, BoxError> {
//!         Ok(Arc::new(format!("{name} (rebuilt)")))
//!     }
//!     fn builder(
//!         &self,
//!         _: &Descriptor,
//!         _: &Properties,
//!     ) -> Result<Box<dyn ResourceBuilder<String>>, BoxError> {
//!         Err("descriptors are not supported".into())
//!     }
//! }
//!
//! impl LegacyBootstrap<String> for Engine {
//!     fn new_configuration(&self) -> Result<Box<dyn LegacyConfiguration<String>>, BoxError> {
//!         Err("legacy API is not available".into())
//!     }
//! }
//!
//! let engine = Arc::new(Engine);
//! let probe = Arc::new(|| "4.3.0".to_string());
//! let plugin = HotSwapPlugin::<String>::new(probe, engine.clone(), engine);
//! let registry: ResourceRegistry<String> = plugin.registry();
//!
//! let mut server = Server::new();
//! server.add_plugins(plugin);
//! server.finish();
//!
//! let templates = registry
//!     .register(
//!         Arc::new("templates".into()),
//!         ConstructionParams::named("templates", Properties::new()),
//!     )
//!     .unwrap();
//!
//! server.tick::<OnRefresh>();
//! assert_eq!(templates.forward(|t| t.clone()), "templates (rebuilt)");
//!
//! let coordinator = server.get_global::<RefreshCoordinator<String>>().unwrap();
//! assert_eq!(coordinator.last_report().unwrap().refreshed, vec!["templates"]);
//! ```

use std::sync::Arc;

use phoenix_system::plugin::{Plugin, Schedule, ScheduleId, Version};
use phoenix_system::server::Server;

use crate::bootstrap::{LegacyBootstrap, ModernBootstrap};
use crate::refresh::{HotSwapConfig, RefreshCoordinator};
use crate::registry::ResourceRegistry;
use crate::strategy::StrategySet;
use crate::version::{Capability, VersionProbe};

/// Default schedule that triggers a refresh of every hot-swappable resource.
///
/// Tick it from whatever notices a change: a file watcher, an admin
/// endpoint, a signal handler.
pub struct OnRefresh;

impl Schedule for OnRefresh {}

/// Hot-swap support for resources of type `R`.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`ResourceRegistry<R>`] | Global | Handles by name |
/// | [`RefreshCoordinator<R>`] | Global | Runs refresh cycles |
///
/// The registry is shared: [`registry`](Self::registry) hands out a clone
/// before the plugin is added, so resources can be registered from anywhere.
pub struct HotSwapPlugin<R: ?Sized> {
    registry: ResourceRegistry<R>,
    probe: Arc<dyn VersionProbe>,
    legacy: Arc<dyn LegacyBootstrap<R>>,
    modern: Arc<dyn ModernBootstrap<R>>,
    config: HotSwapConfig,
}

impl<R: ?Sized + Send + Sync + 'static> HotSwapPlugin<R> {
    /// Creates the plugin from the library's collaborators.
    pub fn new(
        probe: Arc<dyn VersionProbe>,
        legacy: Arc<dyn LegacyBootstrap<R>>,
        modern: Arc<dyn ModernBootstrap<R>>,
    ) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            probe,
            legacy,
            modern,
            config: HotSwapConfig::default(),
        }
    }

    /// Creates the plugin from one object that implements every collaborator.
    pub fn for_library<L>(library: Arc<L>) -> Self
    where
        L: VersionProbe + LegacyBootstrap<R> + ModernBootstrap<R> + 'static,
    {
        Self::new(library.clone(), library.clone(), library)
    }

    /// Uses an existing registry instead of a fresh one.
    #[must_use]
    pub fn with_registry(mut self, registry: ResourceRegistry<R>) -> Self {
        self.registry = registry;
        self
    }

    /// Always rebuild with `capability` instead of probing the library.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.config.forced_capability = Some(capability);
        self
    }

    /// Refresh when `S` is ticked instead of [`OnRefresh`].
    #[must_use]
    pub fn on_schedule<S: Schedule>(mut self) -> Self {
        self.config.schedule = ScheduleId::of::<S>();
        self
    }

    /// Returns a clone of the registry this plugin will publish.
    #[must_use]
    pub fn registry(&self) -> ResourceRegistry<R> {
        self.registry.clone()
    }

    /// Configuration the coordinator will run with.
    #[must_use]
    pub fn config(&self) -> &HotSwapConfig {
        &self.config
    }
}

impl<R: ?Sized + Send + Sync + 'static> Plugin for HotSwapPlugin<R> {
    const ID: &'static str = "phoenix::hot_swap";
    const VERSION: Version = Version::new(0, 0, 1);

    fn build(&self, server: &mut Server) {
        let strategies =
            StrategySet::from_bootstraps(Arc::clone(&self.legacy), Arc::clone(&self.modern));
        let coordinator =
            RefreshCoordinator::new(self.registry.clone(), Arc::clone(&self.probe), strategies)
                .with_config(self.config);

        server.insert_global(self.registry.clone());
        server.insert_global(coordinator);
    }

    fn ready(&self, _server: &mut Server) {
        tracing::info!(
            resources = self.registry.len(),
            schedule = self.config.schedule.type_name(),
            forced_capability = ?self.config.forced_capability,
            "hot-swap ready"
        );
    }

    fn tick_schedules(&self) -> Vec<ScheduleId> {
        vec![self.config.schedule]
    }

    fn update(&self, server: &mut Server, _schedule: ScheduleId) {
        match server.get_global::<RefreshCoordinator<R>>() {
            Some(coordinator) => {
                coordinator.refresh_all();
            }
            None => tracing::warn!("refresh requested but no coordinator is published"),
        }
    }

    fn cleanup(&self, _server: &mut Server) {
        tracing::info!(resources = self.registry.len(), "hot-swap shutting down");
    }
}
