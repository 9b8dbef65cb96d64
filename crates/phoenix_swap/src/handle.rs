//! The long-lived handle that owns the current instance.

use core::fmt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::error::{RebuildError, RegisterError};
use crate::params::ConstructionParams;
use crate::proxy::ForwardingProxy;
use crate::strategy::RebuildStrategy;

/// State that exists once the handle is registered.
struct Installed<R: ?Sized> {
    params: ConstructionParams,
    current: RwLock<Arc<R>>,
}

/// What a single handle refresh did.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A fresh instance was built and installed.
    Swapped,
    /// No replacement was built; the previous instance stays installed.
    Failed(RebuildError),
    /// The handle was created but never registered, so there is nothing to
    /// rebuild from.
    Unregistered,
}

/// Stable identity for one named resource.
///
/// A handle is created empty by
/// [`ResourceRegistry::get_or_create`](crate::ResourceRegistry::get_or_create),
/// receives its first instance and parameters through
/// [`register`](Self::register), and lives as long as the registry.
///
/// Two locks guard it:
///
/// - the **reload lock** is held for the whole duration of a rebuild. A
///   forwarding call takes it and drops it straight away, so it never reads
///   the instance while a rebuild is in flight.
/// - the **instance lock** is only held to clone or replace the `Arc`.
///
/// Forwarded calls run outside both locks. A call that started before a
/// swap finishes against the instance it snapshotted, which stays alive
/// until that call drops it.
pub struct ResourceHandle<R: ?Sized> {
    name: String,
    reload_lock: Mutex<()>,
    installed: OnceLock<Installed<R>>,
    generation: AtomicU64,
}

impl<R: ?Sized + Send + Sync + 'static> ResourceHandle<R> {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            reload_lock: Mutex::new(()),
            installed: OnceLock::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Logical name of the resource.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once an instance has been installed.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.installed.get().is_some()
    }

    /// Parameters captured at registration.
    #[must_use]
    pub fn params(&self) -> Option<&ConstructionParams> {
        self.installed.get().map(|installed| &installed.params)
    }

    /// Number of successful rebuilds so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Installs the first instance and captures its construction parameters.
    ///
    /// Returns the proxy callers keep for the rest of the process.
    ///
    /// # Errors
    ///
    /// - [`RegisterError::NameMismatch`] if `params` names another resource
    /// - [`RegisterError::AlreadyRegistered`] if the handle already has an
    ///   instance; the installed instance is left alone
    pub fn register(
        self: &Arc<Self>,
        instance: Arc<R>,
        params: ConstructionParams,
    ) -> Result<ForwardingProxy<R>, RegisterError> {
        if params.name() != self.name {
            return Err(RegisterError::NameMismatch {
                handle: self.name.clone(),
                params: params.name().to_owned(),
            });
        }

        let detailed = params.is_detailed();
        self.installed
            .set(Installed {
                params,
                current: RwLock::new(instance),
            })
            .map_err(|_| RegisterError::AlreadyRegistered(self.name.clone()))?;

        tracing::debug!(resource = %self.name, detailed, "registered resource");
        Ok(ForwardingProxy::new(Arc::clone(self)))
    }

    /// Returns a proxy for an already registered handle.
    #[must_use]
    pub fn proxy(self: &Arc<Self>) -> Option<ForwardingProxy<R>> {
        self.is_registered()
            .then(|| ForwardingProxy::new(Arc::clone(self)))
    }

    /// Passes the barrier and returns the installed instance.
    ///
    /// `None` if the handle was never registered.
    #[must_use]
    pub fn current(&self) -> Option<Arc<R>> {
        let installed = self.installed.get()?;
        self.barrier();
        Some(Arc::clone(&installed.current.read()))
    }

    /// Waits out any rebuild in progress.
    fn barrier(&self) {
        drop(self.reload_lock.lock());
    }

    /// Barrier plus snapshot, for proxies.
    pub(crate) fn snapshot(&self) -> Arc<R> {
        self.current()
            .expect("forwarding proxies are only issued for registered handles")
    }

    /// Rebuilds with `strategy` and installs the result.
    ///
    /// The reload lock is held until the outcome is settled. On any failure,
    /// panics included, the previous instance stays installed.
    pub(crate) fn refresh_with(&self, strategy: &dyn RebuildStrategy<R>) -> RefreshOutcome {
        let _reload = self.reload_lock.lock();

        let Some(installed) = self.installed.get() else {
            tracing::debug!(resource = %self.name, "skipping refresh of unregistered resource");
            return RefreshOutcome::Unregistered;
        };

        let current = Arc::clone(&installed.current.read());
        let capability = strategy.capability();
        let rebuilt = panic::catch_unwind(AssertUnwindSafe(|| {
            strategy.rebuild(&installed.params, &current)
        }));

        let err = match rebuilt {
            Ok(Ok(fresh)) => {
                *installed.current.write() = fresh;
                let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::info!(resource = %self.name, %capability, generation, "resource rebuilt");
                return RefreshOutcome::Swapped;
            }
            Ok(Err(err)) => err,
            Err(payload) => RebuildError::Panicked {
                name: self.name.clone(),
                message: panic_message(payload.as_ref()),
            },
        };

        tracing::error!(
            resource = %self.name,
            %capability,
            error = %err,
            "rebuild failed, keeping previous instance"
        );
        RefreshOutcome::Failed(err)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

impl<R: ?Sized> fmt::Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .field("registered", &self.installed.get().is_some())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
