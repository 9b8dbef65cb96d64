//! Stable handles to resources that are rebuilt in place at runtime.
//!
//! A connection pool, a compiled engine or a factory object is expensive to
//! build and carries state. When its configuration changes, the running
//! instance has to be thrown away and rebuilt, but the code holding onto it
//! should not notice. This crate keeps the identity stable and swaps the
//! instance behind it.
//!
//! # Pieces
//!
//! - [`ResourceRegistry`]: one [`ResourceHandle`] per logical name, created on
//!   first lookup and never removed
//! - [`ResourceHandle`]: the current instance, the [`ConstructionParams`] it
//!   was built from, and the reload lock
//! - [`ForwardingProxy`]: what callers hold; every call passes the handle's
//!   barrier and then runs against the installed instance
//! - [`RebuildStrategy`]: [`LegacyStrategy`] or [`ModernStrategy`], chosen per
//!   refresh from the library's reported [`Capability`]
//! - [`RefreshCoordinator`]: rebuilds every registered handle, one at a time,
//!   isolating failures
//! - [`HotSwapPlugin`]: wires all of the above into a
//!   [`Server`](phoenix_system::server::Server) and refreshes on the
//!   [`OnRefresh`] schedule
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use phoenix_swap::{ConstructionParams, ResourceRegistry, Properties};
//!
//! #[phoenix_swap::forwarding]
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self, who: &str) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self, who: &str) -> String {
//!         format!("hello {who}")
//!     }
//! }
//!
//! let registry = ResourceRegistry::<dyn Greeter>::new();
//! let greeter = registry
//!     .register(Arc::new(English), ConstructionParams::named("greeter", Properties::new()))
//!     .unwrap();
//!
//! // `ForwardingProxy<dyn Greeter>` implements `Greeter` itself.
//! assert_eq!(greeter.greet("world"), "hello world");
//! ```

extern crate self as phoenix_swap;

mod bootstrap;
mod error;
mod handle;
mod params;
mod plugin;
mod proxy;
mod refresh;
mod registry;
mod strategy;
mod version;

pub use bootstrap::{
    BoxError, LegacyBootstrap, LegacyConfiguration, ModernBootstrap, ResourceBuilder,
};
pub use error::{RebuildError, RegisterError};
pub use handle::{RefreshOutcome, ResourceHandle};
pub use params::{ConstructionParams, Descriptor, Properties};
pub use phoenix_swap_macros::forwarding;
pub use plugin::{HotSwapPlugin, OnRefresh};
pub use proxy::ForwardingProxy;
pub use refresh::{HotSwapConfig, RefreshCoordinator, RefreshFailure, RefreshReport};
pub use registry::ResourceRegistry;
pub use strategy::{LegacyStrategy, ModernStrategy, RebuildStrategy, StrategySet};
pub use version::{Capability, LibraryVersion, VersionParseError, VersionProbe};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        Capability, ConstructionParams, ForwardingProxy, HotSwapPlugin, OnRefresh, Properties,
        RefreshCoordinator, RefreshReport, ResourceHandle, ResourceRegistry, VersionProbe,
        forwarding,
    };
}
