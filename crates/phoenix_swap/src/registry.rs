//! Name to handle mapping.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use phoenix_system::resource::GlobalResource;

use crate::error::RegisterError;
use crate::handle::ResourceHandle;
use crate::params::ConstructionParams;
use crate::proxy::ForwardingProxy;

/// Every hot-swappable resource of one type, by name.
///
/// Handles are created on first lookup and never removed, so a handle
/// obtained once stays valid for the registry's lifetime. Iteration follows
/// creation order.
///
/// Cloning is cheap and every clone sees the same handles. Create one
/// registry at startup and share it; [`HotSwapPlugin`](crate::HotSwapPlugin)
/// publishes it as a server global.
///
/// ```
/// use std::sync::Arc;
/// use phoenix_swap::ResourceRegistry;
///
/// let registry = ResourceRegistry::<String>::new();
/// let first = registry.get_or_create("orders");
/// let again = registry.get_or_create("orders");
///
/// assert!(Arc::ptr_eq(&first, &again));
/// assert_eq!(registry.len(), 1);
/// ```
pub struct ResourceRegistry<R: ?Sized> {
    handles: Arc<RwLock<IndexMap<String, Arc<ResourceHandle<R>>>>>,
}

impl<R: ?Sized + Send + Sync + 'static> ResourceRegistry<R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handles: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Returns the handle for `name`, creating an empty one if needed.
    ///
    /// Concurrent first calls for the same name all receive the same handle.
    pub fn get_or_create(&self, name: &str) -> Arc<ResourceHandle<R>> {
        if let Some(handle) = self.handles.read().get(name) {
            return Arc::clone(handle);
        }

        // Another caller may have inserted between the two locks; the entry
        // check under the write lock settles it.
        let mut handles = self.handles.write();
        let handle = handles.entry(name.to_owned()).or_insert_with(|| {
            tracing::debug!(resource = %name, "created resource handle");
            Arc::new(ResourceHandle::new(name.to_owned()))
        });
        Arc::clone(handle)
    }

    /// Looks up the handle named in `params` and registers `instance` on it.
    ///
    /// # Errors
    ///
    /// [`RegisterError::AlreadyRegistered`] if the name already has an
    /// instance.
    pub fn register(
        &self,
        instance: Arc<R>,
        params: ConstructionParams,
    ) -> Result<ForwardingProxy<R>, RegisterError> {
        self.get_or_create(params.name()).register(instance, params)
    }

    /// Returns the handle for `name` if it exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ResourceHandle<R>>> {
        self.handles.read().get(name).cloned()
    }

    /// Returns `true` if a handle exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handles.read().contains_key(name)
    }

    /// Number of handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    /// Returns `true` if no handle was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    /// Handle names in creation order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.handles.read().keys().cloned().collect()
    }

    /// Snapshot of every handle in creation order.
    ///
    /// Handles created after the call are not included.
    #[must_use]
    pub fn handles(&self) -> Vec<Arc<ResourceHandle<R>>> {
        self.handles.read().values().cloned().collect()
    }
}

impl<R: ?Sized + Send + Sync + 'static> Default for ResourceRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ?Sized> Clone for ResourceRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            handles: Arc::clone(&self.handles),
        }
    }
}

impl<R: ?Sized> fmt::Debug for ResourceRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("names", &self.handles.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<R: ?Sized + Send + Sync + 'static> GlobalResource for ResourceRegistry<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Properties;

    #[test]
    fn get_or_create_is_idempotent() {
        let registry = ResourceRegistry::<u32>::new();
        let a = registry.get_or_create("a");
        let b = registry.get_or_create("a");
        let other = registry.get_or_create("b");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clones_share_state() {
        let registry = ResourceRegistry::<u32>::new();
        let clone = registry.clone();
        let created = clone.get_or_create("a");

        assert!(registry.contains("a"));
        assert!(Arc::ptr_eq(&registry.get("a").unwrap(), &created));
    }

    #[test]
    fn lookups_do_not_create() {
        let registry = ResourceRegistry::<u32>::new();
        assert!(registry.get("missing").is_none());
        assert!(!registry.contains("missing"));
        assert!(registry.is_empty());
    }

    #[test]
    fn iteration_follows_creation_order() {
        let registry = ResourceRegistry::<u32>::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.get_or_create(name);
        }
        registry.get_or_create("alpha");

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        let names: Vec<String> = registry
            .handles()
            .iter()
            .map(|h| h.name().to_owned())
            .collect();
        assert_eq!(names, registry.names());
    }

    #[test]
    fn register_uses_the_params_name() {
        let registry = ResourceRegistry::<u32>::new();
        let proxy = registry
            .register(Arc::new(7), ConstructionParams::named("seven", Properties::new()))
            .unwrap();

        assert_eq!(proxy.forward(|n| *n), 7);
        assert!(registry.get("seven").unwrap().is_registered());

        let again =
            registry.register(Arc::new(8), ConstructionParams::named("seven", Properties::new()));
        assert!(matches!(again, Err(RegisterError::AlreadyRegistered(_))));
    }
}
