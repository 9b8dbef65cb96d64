//! Connection pools that are rebuilt in place while callers keep using them.
//!
//! [`PoolLibrary`] stands in for a database driver whose construction API
//! changed between versions. The `pool-reload` binary registers two pools
//! with a [`HotSwapPlugin`](phoenix_swap::HotSwapPlugin), keeps worker
//! threads checking out connections through their proxies, and refreshes the
//! pools across a library upgrade.
//!
//! ```text
//! workers ──▶ ForwardingProxy<dyn Pool> ──▶ ResourceHandle ──▶ SimulatedPool #n
//!                                               ▲
//!           Server::tick::<OnRefresh>() ──▶ RefreshCoordinator
//!                                               │
//!                                     LegacyStrategy / ModernStrategy
//!                                               │
//!                                          PoolLibrary
//! ```

mod pool;
mod workers;

pub use pool::{Pool, PoolError, PoolLibrary, PoolUnit};
pub use workers::{WorkerSummary, Workers};
