//! Type-keyed resource storage.
//!
//! The [`Server`](crate::server::Server) keeps one [`Resources`] container of
//! [`GlobalResource`]s that stay available for the server's lifetime.
//!
//! Globals are written while plugins build and only read afterwards. Shared
//! state that changes at runtime (a registry, a report slot) carries its own
//! interior locking.

use core::any::{Any, TypeId};
use hashbrown::HashMap;

/// Anything that can live in a [`Resources`] container.
///
/// Implemented automatically for every `Send + Sync + 'static` type.
pub trait Resource: Send + Sync + 'static {
    /// Returns the type name for diagnostics.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl<T: Send + Sync + 'static> Resource for T {}

/// Marker for resources that are published for the whole server lifetime.
///
/// Registries, coordinators and configuration snapshots implement this so
/// they can be inserted with
/// [`Server::insert_global`](crate::server::Server::insert_global).
///
/// ```
/// use phoenix_system::resource::GlobalResource;
/// use phoenix_system::server::Server;
///
/// struct WatchRoots(Vec<String>);
/// impl GlobalResource for WatchRoots {}
///
/// let mut server = Server::new();
/// server.insert_global(WatchRoots(vec!["config/".into()]));
/// assert!(server.contains_global::<WatchRoots>());
/// ```
pub trait GlobalResource: Resource {}

/// Errors returned when reading from a [`Resources`] container.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No resource of the requested type has been inserted.
    #[error("resource not found: {0}")]
    NotFound(&'static str),
}

type Erased = Box<dyn Any + Send + Sync>;

/// Container mapping a type to exactly one value of that type.
///
/// ```
/// use phoenix_system::resource::Resources;
///
/// struct Attempts(u32);
///
/// let mut resources = Resources::new();
/// resources.insert(Attempts(3));
/// assert_eq!(resources.get::<Attempts>().unwrap().0, 3);
/// ```
#[derive(Default)]
pub struct Resources {
    slots: HashMap<TypeId, Erased>,
}

impl Resources {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Inserts `resource`, returning the value it replaced, if any.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        let previous = self.slots.insert(TypeId::of::<T>(), Box::new(resource))?;
        previous.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Returns `true` if a resource of type `T` is stored.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Borrows a resource.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NotFound`] if no `T` was inserted.
    pub fn get<T: Resource>(&self) -> Result<&T, ResourceError> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
            .ok_or(ResourceError::NotFound(core::any::type_name::<T>()))
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
