//! The object callers hold instead of the resource itself.

use core::fmt;
use std::sync::Arc;

use crate::handle::ResourceHandle;

/// Stable stand-in for a hot-swappable resource.
///
/// Every call goes through [`forward`](Self::forward): pass the handle's
/// barrier, take a snapshot of the installed instance, run the operation on
/// it. Nothing is held while the operation runs, so callers never serialize
/// against each other, and errors or panics from the operation reach the
/// caller untouched.
///
/// For a trait marked with [`#[forwarding]`](crate::forwarding), the proxy
/// implements the trait directly, so it can be passed wherever the resource
/// is expected.
///
/// ```
/// use std::sync::Arc;
/// use phoenix_swap::{ConstructionParams, Properties, ResourceRegistry};
///
/// let registry = ResourceRegistry::<Vec<u32>>::new();
/// let ports = registry
///     .register(Arc::new(vec![5432, 5433]), ConstructionParams::named("ports", Properties::new()))
///     .unwrap();
///
/// assert_eq!(ports.forward(|p| p.len()), 2);
/// assert_eq!(ports.name(), "ports");
/// ```
pub struct ForwardingProxy<R: ?Sized> {
    handle: Arc<ResourceHandle<R>>,
}

impl<R: ?Sized + Send + Sync + 'static> ForwardingProxy<R> {
    pub(crate) fn new(handle: Arc<ResourceHandle<R>>) -> Self {
        Self { handle }
    }

    /// Runs `operation` against the currently installed instance.
    ///
    /// Blocks only while a rebuild of this resource is in progress. The
    /// instance may be replaced while `operation` runs; the operation keeps
    /// working against the instance it started with.
    pub fn forward<T>(&self, operation: impl FnOnce(&R) -> T) -> T {
        let target = self.handle.snapshot();
        operation(&target)
    }

    /// Returns the currently installed instance.
    ///
    /// Useful across `.await` points, where a borrow from
    /// [`forward`](Self::forward) cannot live.
    #[must_use]
    pub fn snapshot(&self) -> Arc<R> {
        self.handle.snapshot()
    }

    /// Name of the proxied resource.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// The handle behind this proxy.
    #[must_use]
    pub fn handle(&self) -> &Arc<ResourceHandle<R>> {
        &self.handle
    }
}

impl<R: ?Sized> Clone for ForwardingProxy<R> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<R: ?Sized> fmt::Debug for ForwardingProxy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingProxy")
            .field("handle", &self.handle)
            .finish()
    }
}
