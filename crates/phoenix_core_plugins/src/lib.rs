//! Core infrastructure plugins for Phoenix.
//!
//! - [`TracingPlugin`] - installs the `tracing` subscriber every other crate
//!   logs through
//!
//! # Example
//!
//! ```
//! use phoenix_system::server::Server;
//! use phoenix_core_plugins::{TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let mut server = Server::new();
//! server.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! server.finish();
//! ```

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};
