//! Error types for registration and rebuilds.

use crate::bootstrap::BoxError;
use crate::version::Capability;

/// Errors returned by [`ResourceHandle::register`](crate::ResourceHandle::register).
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// The handle already has an instance installed.
    #[error("resource '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The parameters describe a different resource than the handle.
    #[error("construction parameters name '{params}' but the handle is '{handle}'")]
    NameMismatch {
        /// Name of the handle.
        handle: String,
        /// Name carried by the parameters.
        params: String,
    },
}

/// A rebuild that produced no replacement instance.
///
/// The handle keeps serving the previous instance in both cases.
#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    /// The library failed to build a fresh instance.
    #[error("unable to build a fresh instance of '{name}' ({capability} strategy): {source}")]
    Construction {
        /// Resource name.
        name: String,
        /// Strategy that attempted the build.
        capability: Capability,
        /// Error reported by the library.
        #[source]
        source: BoxError,
    },

    /// The library panicked while building.
    #[error("rebuild of '{name}' panicked: {message}")]
    Panicked {
        /// Resource name.
        name: String,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl RebuildError {
    /// Wraps a library error raised while building `name`.
    pub fn construction(
        name: impl Into<String>,
        capability: Capability,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Construction {
            name: name.into(),
            capability,
            source: source.into(),
        }
    }

    /// Name of the resource whose rebuild failed.
    #[must_use]
    pub fn resource(&self) -> &str {
        match self {
            Self::Construction { name, .. } | Self::Panicked { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn construction_error_keeps_source() {
        let err = RebuildError::construction("orders", Capability::Modern, "pool url missing");

        assert_eq!(err.resource(), "orders");
        assert_eq!(
            err.to_string(),
            "unable to build a fresh instance of 'orders' (modern strategy): pool url missing"
        );
        assert_eq!(err.source().unwrap().to_string(), "pool url missing");
    }

    #[test]
    fn panicked_error_names_resource() {
        let err = RebuildError::Panicked {
            name: "billing".into(),
            message: "boom".into(),
        };
        assert_eq!(err.resource(), "billing");
        assert_eq!(err.to_string(), "rebuild of 'billing' panicked: boom");
        assert!(err.source().is_none());
    }

    #[test]
    fn register_errors_display() {
        assert_eq!(
            RegisterError::AlreadyRegistered("orders".into()).to_string(),
            "resource 'orders' is already registered"
        );
        let mismatch = RegisterError::NameMismatch {
            handle: "orders".into(),
            params: "billing".into(),
        };
        assert!(mismatch.to_string().contains("'billing'"));
    }
}
