//! A simulated connection-pool library.
//!
//! Mirrors the shape of a real driver: it reports a version string, offers a
//! one-call factory and a builder on newer versions, and a configuration
//! object plus an instance registry on older ones.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use phoenix_swap::{
    BoxError, Capability, ConstructionParams, Descriptor, LegacyBootstrap, LegacyConfiguration,
    ModernBootstrap, Properties, ResourceBuilder, VersionProbe, forwarding,
};

/// A pool of connections to one database.
#[forwarding]
pub trait Pool: Send + Sync {
    /// Database URL the pool connects to.
    fn url(&self) -> String;

    /// Serial number of this pool instance, unique per library.
    fn serial(&self) -> u64;

    /// Which construction path built this pool.
    fn built_by(&self) -> Capability;

    /// Hands out a connection id for `client`.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] once `max_connections` have been handed out.
    fn checkout(&self, client: &str) -> Result<u64, PoolError>;
}

/// Errors returned by pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Every connection is in use.
    #[error("pool {url} exhausted after {max} connections")]
    Exhausted {
        /// Pool URL.
        url: String,
        /// Configured maximum.
        max: u64,
    },
}

/// Descriptor handed to the library for descriptor-based builds.
#[derive(Debug, Clone)]
pub struct PoolUnit {
    /// Database URL.
    pub url: String,
}

struct SimulatedPool {
    url: String,
    serial: u64,
    built_by: Capability,
    max_connections: u64,
    handed_out: AtomicU64,
}

impl Pool for SimulatedPool {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn serial(&self) -> u64 {
        self.serial
    }

    fn built_by(&self) -> Capability {
        self.built_by
    }

    fn checkout(&self, client: &str) -> Result<u64, PoolError> {
        let id = self.handed_out.fetch_add(1, Ordering::Relaxed);
        if id >= self.max_connections {
            return Err(PoolError::Exhausted {
                url: self.url.clone(),
                max: self.max_connections,
            });
        }
        tracing::trace!(pool = self.serial, client, connection = id, "checkout");
        Ok(id)
    }
}

/// An instance tracked by the legacy registry.
struct Registered {
    key: String,
    serial: u64,
}

#[derive(Default)]
struct Shared {
    version: Mutex<String>,
    next_serial: AtomicU64,
    /// Legacy instance registry; a key may appear once.
    registered: Mutex<Vec<Registered>>,
    /// Keys whose next build fails.
    failing: Mutex<Vec<String>>,
}

/// The simulated library. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct PoolLibrary {
    shared: Arc<Shared>,
}

impl PoolLibrary {
    /// Creates a library reporting `version`.
    #[must_use]
    pub fn new(version: &str) -> Self {
        let library = Self::default();
        library.set_version(version);
        library
    }

    /// Simulates upgrading or downgrading the library.
    pub fn set_version(&self, version: &str) {
        *self.shared.version.lock() = version.to_owned();
    }

    /// Makes the next build keyed `key` fail.
    ///
    /// Named builds are keyed by the logical name, descriptor builds by URL.
    pub fn fail_next_build(&self, key: &str) {
        self.shared.failing.lock().push(key.to_owned());
    }

    /// Opens the first instance of a pool, the way application startup would.
    ///
    /// # Errors
    ///
    /// Same failures as a rebuild.
    pub fn open(&self, params: &ConstructionParams) -> Result<Arc<dyn Pool>, BoxError> {
        let url = match params.descriptor() {
            Some(descriptor) => unit_url(descriptor)?,
            None => url_property(params.properties())?,
        };
        self.build(params.name(), url, params.properties(), Capability::Modern)
    }

    fn build(
        &self,
        key: &str,
        url: String,
        properties: &Properties,
        built_by: Capability,
    ) -> Result<Arc<dyn Pool>, BoxError> {
        {
            let mut failing = self.shared.failing.lock();
            if let Some(pos) = failing.iter().position(|k| k == key) {
                failing.remove(pos);
                return Err(format!("could not reach {url}").into());
            }
        }

        let max_connections = properties
            .get("max_connections")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(16);
        let serial = self.shared.next_serial.fetch_add(1, Ordering::Relaxed);

        if built_by == Capability::Legacy {
            let mut registered = self.shared.registered.lock();
            if registered.iter().any(|r| r.key == key) {
                return Err(format!("a pool keyed '{key}' is already registered").into());
            }
            registered.push(Registered {
                key: key.to_owned(),
                serial,
            });
        }

        Ok(Arc::new(SimulatedPool {
            url,
            serial,
            built_by,
            max_connections,
            handed_out: AtomicU64::new(0),
        }))
    }
}

fn unit_url(descriptor: &Descriptor) -> Result<String, BoxError> {
    descriptor
        .downcast_ref::<PoolUnit>()
        .map(|unit| unit.url.clone())
        .ok_or_else(|| format!("unsupported descriptor {}", descriptor.type_name()).into())
}

fn url_property(properties: &Properties) -> Result<String, BoxError> {
    properties
        .get("url")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| "missing 'url' property".into())
}

impl VersionProbe for PoolLibrary {
    fn version_string(&self) -> String {
        self.shared.version.lock().clone()
    }
}

impl ModernBootstrap<dyn Pool> for PoolLibrary {
    fn create(&self, name: &str, properties: &Properties) -> Result<Arc<dyn Pool>, BoxError> {
        self.build(name, url_property(properties)?, properties, Capability::Modern)
    }

    fn builder(
        &self,
        descriptor: &Descriptor,
        properties: &Properties,
    ) -> Result<Box<dyn ResourceBuilder<dyn Pool>>, BoxError> {
        Ok(Box::new(PoolBuilder {
            library: self.clone(),
            url: unit_url(descriptor)?,
            properties: properties.clone(),
        }))
    }
}

struct PoolBuilder {
    library: PoolLibrary,
    url: String,
    properties: Properties,
}

impl ResourceBuilder<dyn Pool> for PoolBuilder {
    fn build(self: Box<Self>) -> Result<Arc<dyn Pool>, BoxError> {
        let PoolBuilder {
            library,
            url,
            properties,
        } = *self;
        // Builders are not told the logical name.
        let key = url.clone();
        library.build(&key, url, &properties, Capability::Modern)
    }
}

impl LegacyBootstrap<dyn Pool> for PoolLibrary {
    fn new_configuration(&self) -> Result<Box<dyn LegacyConfiguration<dyn Pool>>, BoxError> {
        Ok(Box::new(PoolConfiguration {
            library: self.clone(),
            key: None,
            url: None,
            properties: Properties::new(),
        }))
    }

    fn deregister(&self, name: &str, instance: &Arc<dyn Pool>) -> Result<(), BoxError> {
        let serial = instance.serial();
        tracing::debug!(pool = name, serial, "deregistering");
        self.shared
            .registered
            .lock()
            .retain(|r| r.serial != serial);
        Ok(())
    }
}

struct PoolConfiguration {
    library: PoolLibrary,
    key: Option<String>,
    url: Option<String>,
    properties: Properties,
}

impl LegacyConfiguration<dyn Pool> for PoolConfiguration {
    fn configure_descriptor(
        &mut self,
        descriptor: &Descriptor,
        properties: &Properties,
    ) -> Result<(), BoxError> {
        let url = unit_url(descriptor)?;
        self.key = Some(url.clone());
        self.url = Some(url);
        self.properties = properties.clone();
        Ok(())
    }

    fn configure_named(&mut self, name: &str, properties: &Properties) -> Result<(), BoxError> {
        self.key = Some(name.to_owned());
        self.url = Some(url_property(properties)?);
        self.properties = properties.clone();
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<Arc<dyn Pool>, BoxError> {
        let PoolConfiguration {
            library,
            key,
            url,
            properties,
        } = *self;
        let (Some(key), Some(url)) = (key, url) else {
            return Err("configuration built before it was configured".into());
        };
        library.build(&key, url, &properties, Capability::Legacy)
    }
}
