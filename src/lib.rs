//! Stable handles to expensive resources that are rebuilt in place while the
//! program keeps running.
//!
//! ```
//! use phoenix::prelude::*;
//!
//! let mut server = Server::new();
//! server.add_plugins(TracingPlugin::default());
//! server.finish();
//! ```

pub use phoenix_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use phoenix_internal::prelude::*;
}
