//! Rebuild strategies, one per library generation.

use std::sync::Arc;

use crate::bootstrap::{BoxError, LegacyBootstrap, ModernBootstrap};
use crate::error::RebuildError;
use crate::params::ConstructionParams;
use crate::version::Capability;

/// Produces a replacement instance from cached construction parameters.
///
/// Implementations must not touch the handle; they only build. The caller
/// holds the handle's reload lock for the whole call and installs the result.
pub trait RebuildStrategy<R: ?Sized>: Send + Sync {
    /// The capability this strategy serves.
    fn capability(&self) -> Capability;

    /// Builds a fresh instance.
    ///
    /// `current` is the installed instance, which stays installed if this
    /// returns an error.
    ///
    /// # Errors
    ///
    /// [`RebuildError::Construction`] when the library fails to build.
    fn rebuild(&self, params: &ConstructionParams, current: &Arc<R>)
    -> Result<Arc<R>, RebuildError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Modern
// ─────────────────────────────────────────────────────────────────────────────

/// Rebuilds through the factory and builder API.
///
/// - name-only parameters: one `create(name, properties)` call
/// - detailed parameters: `builder(descriptor, properties)` then `build()`
pub struct ModernStrategy<R: ?Sized> {
    bootstrap: Arc<dyn ModernBootstrap<R>>,
}

impl<R: ?Sized> ModernStrategy<R> {
    /// Creates the strategy around the library's modern bootstrap.
    pub fn new(bootstrap: Arc<dyn ModernBootstrap<R>>) -> Self {
        Self { bootstrap }
    }
}

impl<R: ?Sized + Send + Sync> RebuildStrategy<R> for ModernStrategy<R> {
    fn capability(&self) -> Capability {
        Capability::Modern
    }

    fn rebuild(
        &self,
        params: &ConstructionParams,
        _current: &Arc<R>,
    ) -> Result<Arc<R>, RebuildError> {
        let name = params.name();
        let properties = params.properties();

        let built: Result<Arc<R>, BoxError> = match params.descriptor() {
            None => {
                tracing::trace!(resource = %name, "creating instance from name");
                self.bootstrap.create(name, properties)
            }
            Some(descriptor) => {
                tracing::trace!(
                    resource = %name,
                    descriptor = descriptor.type_name(),
                    "building instance from descriptor"
                );
                self.bootstrap
                    .builder(descriptor, properties)
                    .and_then(|builder| builder.build())
            }
        };

        built.map_err(|source| RebuildError::construction(name, Capability::Modern, source))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Legacy
// ─────────────────────────────────────────────────────────────────────────────

/// Rebuilds through a fresh configuration object.
///
/// The installed instance is deregistered from the library first. That step
/// is best effort: its failure is logged and the rebuild continues.
pub struct LegacyStrategy<R: ?Sized> {
    bootstrap: Arc<dyn LegacyBootstrap<R>>,
}

impl<R: ?Sized> LegacyStrategy<R> {
    /// Creates the strategy around the library's legacy bootstrap.
    pub fn new(bootstrap: Arc<dyn LegacyBootstrap<R>>) -> Self {
        Self { bootstrap }
    }
}

impl<R: ?Sized + Send + Sync> RebuildStrategy<R> for LegacyStrategy<R> {
    fn capability(&self) -> Capability {
        Capability::Legacy
    }

    fn rebuild(
        &self,
        params: &ConstructionParams,
        current: &Arc<R>,
    ) -> Result<Arc<R>, RebuildError> {
        let name = params.name();
        let properties = params.properties();

        if let Err(err) = self.bootstrap.deregister(name, current) {
            tracing::warn!(
                resource = %name,
                error = %err,
                "failed to deregister instance, rebuilding anyway"
            );
        }

        let built = self.bootstrap.new_configuration().and_then(|mut configuration| {
            match params.descriptor() {
                Some(descriptor) => {
                    tracing::trace!(resource = %name, "configuring from descriptor");
                    configuration.configure_descriptor(descriptor, properties)?;
                }
                None => {
                    tracing::trace!(resource = %name, "configuring from name");
                    configuration.configure_named(name, properties)?;
                }
            }
            configuration.build()
        });

        built.map_err(|source| RebuildError::construction(name, Capability::Legacy, source))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────────────────────────

/// One strategy per [`Capability`].
pub struct StrategySet<R: ?Sized> {
    legacy: Box<dyn RebuildStrategy<R>>,
    modern: Box<dyn RebuildStrategy<R>>,
}

impl<R: ?Sized + Send + Sync + 'static> StrategySet<R> {
    /// Pairs two strategies.
    ///
    /// # Panics
    ///
    /// If a strategy reports a different capability than its slot.
    pub fn new(
        legacy: impl RebuildStrategy<R> + 'static,
        modern: impl RebuildStrategy<R> + 'static,
    ) -> Self {
        assert_eq!(
            legacy.capability(),
            Capability::Legacy,
            "legacy slot given a strategy for another capability"
        );
        assert_eq!(
            modern.capability(),
            Capability::Modern,
            "modern slot given a strategy for another capability"
        );
        Self {
            legacy: Box::new(legacy),
            modern: Box::new(modern),
        }
    }

    /// Builds the standard strategies from library bootstraps.
    pub fn from_bootstraps(
        legacy: Arc<dyn LegacyBootstrap<R>>,
        modern: Arc<dyn ModernBootstrap<R>>,
    ) -> Self {
        Self::new(LegacyStrategy::new(legacy), ModernStrategy::new(modern))
    }

    /// Returns the strategy serving `capability`.
    #[must_use]
    pub fn select(&self, capability: Capability) -> &dyn RebuildStrategy<R> {
        match capability {
            Capability::Legacy => self.legacy.as_ref(),
            Capability::Modern => self.modern.as_ref(),
        }
    }
}
