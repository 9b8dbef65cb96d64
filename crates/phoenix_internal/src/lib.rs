//! # Phoenix Internal Library
//!
//! Re-exports the core Phoenix crates for convenience.

/// Plugin host and shared-state container.
pub use phoenix_system;

/// Hot-swappable resource handles, registries and refresh.
pub use phoenix_swap;

/// Infrastructure plugins (tracing).
pub use phoenix_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use phoenix_core_plugins::{TracingFormat, TracingPlugin};
    pub use phoenix_swap::prelude::*;
    pub use phoenix_system::prelude::*;
}
