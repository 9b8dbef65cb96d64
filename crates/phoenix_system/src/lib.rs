//! The plugin host underneath Phoenix.
//!
//! `phoenix_system` is deliberately small. It knows nothing about resource
//! reloading; it only provides the pieces every other Phoenix crate plugs
//! into:
//!
//! - [`plugin`] - Plugin lifecycle and tick schedules
//! - [`resource`] - Type-keyed shared state stored on the server
//! - [`server`] - The orchestrator that builds plugins and dispatches ticks
//!
//! # Example
//!
//! ```
//! use phoenix_system::plugin::{Plugin, Version};
//! use phoenix_system::resource::GlobalResource;
//! use phoenix_system::server::Server;
//!
//! struct ReloadBudget { max_per_minute: u32 }
//! impl GlobalResource for ReloadBudget {}
//!
//! struct BudgetPlugin;
//!
//! impl Plugin for BudgetPlugin {
//!     const ID: &'static str = "demo::budget";
//!     const VERSION: Version = Version::new(0, 1, 0);
//!
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(ReloadBudget { max_per_minute: 6 });
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(BudgetPlugin);
//! server.finish();
//!
//! assert_eq!(server.get_global::<ReloadBudget>().unwrap().max_per_minute, 6);
//! ```

/// Plugin trait and schedules.
pub mod plugin;

/// Type-keyed resource storage.
pub mod resource;

/// Server runtime for plugin orchestration.
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
