//! Seams to the wrapped library's construction API.
//!
//! The hot-swap core never builds a resource itself. It calls one of the
//! bootstraps below, which the library integration implements.

use std::sync::Arc;

use crate::params::{Descriptor, Properties};

/// Error type returned by library collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Factory and builder API of newer library generations.
pub trait ModernBootstrap<R: ?Sized>: Send + Sync {
    /// Builds an instance in one call from a name and properties.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn create(&self, name: &str, properties: &Properties) -> Result<Arc<R>, BoxError>;

    /// Returns a builder primed with a descriptor and properties.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn builder(
        &self,
        descriptor: &Descriptor,
        properties: &Properties,
    ) -> Result<Box<dyn ResourceBuilder<R>>, BoxError>;
}

/// Second step of a descriptor-based modern build.
pub trait ResourceBuilder<R: ?Sized>: Send {
    /// Builds the instance. Takes no further input.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn build(self: Box<Self>) -> Result<Arc<R>, BoxError>;
}

/// Configuration-object API of older library generations.
pub trait LegacyBootstrap<R: ?Sized>: Send + Sync {
    /// Returns a fresh, unconfigured configuration object.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn new_configuration(&self) -> Result<Box<dyn LegacyConfiguration<R>>, BoxError>;

    /// Removes `instance` from the library's internal registry.
    ///
    /// Called before every legacy rebuild. Failures are logged and ignored.
    /// The default does nothing, for libraries without such a registry.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn deregister(&self, name: &str, instance: &Arc<R>) -> Result<(), BoxError> {
        let _ = (name, instance);
        Ok(())
    }
}

/// A legacy configuration object, configured once and then built.
pub trait LegacyConfiguration<R: ?Sized>: Send {
    /// Configures from a library descriptor.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn configure_descriptor(
        &mut self,
        descriptor: &Descriptor,
        properties: &Properties,
    ) -> Result<(), BoxError>;

    /// Configures from a resource name.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn configure_named(&mut self, name: &str, properties: &Properties) -> Result<(), BoxError>;

    /// Builds the configured instance.
    ///
    /// # Errors
    ///
    /// Any library failure.
    fn build(self: Box<Self>) -> Result<Arc<R>, BoxError>;
}
