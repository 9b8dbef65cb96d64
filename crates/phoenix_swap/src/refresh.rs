//! Refresh cycles over every registered handle.

use std::sync::Arc;

use parking_lot::Mutex;
use phoenix_system::plugin::ScheduleId;
use phoenix_system::resource::GlobalResource;

use crate::error::RebuildError;
use crate::handle::RefreshOutcome;
use crate::plugin::OnRefresh;
use crate::registry::ResourceRegistry;
use crate::strategy::StrategySet;
use crate::version::{Capability, VersionProbe};

/// Settings for refresh cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotSwapConfig {
    /// Use this capability instead of probing the library version.
    pub forced_capability: Option<Capability>,
    /// Schedule whose ticks trigger [`RefreshCoordinator::refresh_all`] when
    /// driven by [`HotSwapPlugin`](crate::HotSwapPlugin).
    pub schedule: ScheduleId,
}

impl Default for HotSwapConfig {
    fn default() -> Self {
        Self {
            forced_capability: None,
            schedule: ScheduleId::of::<OnRefresh>(),
        }
    }
}

/// A handle whose rebuild failed during a cycle.
#[derive(Debug)]
pub struct RefreshFailure {
    /// Resource name.
    pub name: String,
    /// Why no replacement was installed.
    pub error: RebuildError,
}

/// Summary of one refresh cycle.
#[derive(Debug)]
pub struct RefreshReport {
    /// Capability applied to every handle in the cycle.
    pub capability: Capability,
    /// Handles that now serve a fresh instance.
    pub refreshed: Vec<String>,
    /// Handles still serving their previous instance.
    pub failed: Vec<RefreshFailure>,
    /// Handles that were created but never registered.
    pub skipped: Vec<String>,
}

impl RefreshReport {
    fn new(capability: Capability) -> Self {
        Self {
            capability,
            refreshed: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn record(&mut self, name: &str, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Swapped => self.refreshed.push(name.to_owned()),
            RefreshOutcome::Failed(error) => self.failed.push(RefreshFailure {
                name: name.to_owned(),
                error,
            }),
            RefreshOutcome::Unregistered => self.skipped.push(name.to_owned()),
        }
    }

    /// Returns `true` if no rebuild failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the failure recorded for `name`, if any.
    #[must_use]
    pub fn failure(&self, name: &str) -> Option<&RebuildError> {
        self.failed
            .iter()
            .find(|failure| failure.name == name)
            .map(|failure| &failure.error)
    }
}

/// Rebuilds registered resources on demand.
///
/// Each cycle probes the library version once and applies the selected
/// strategy to every handle, one handle at a time. A failing handle keeps
/// its previous instance and the cycle moves on.
///
/// Overlapping cycles are not coordinated beyond the per-handle reload
/// lock; trigger them from one place.
pub struct RefreshCoordinator<R: ?Sized> {
    registry: ResourceRegistry<R>,
    probe: Arc<dyn VersionProbe>,
    strategies: StrategySet<R>,
    config: HotSwapConfig,
    last_report: Mutex<Option<Arc<RefreshReport>>>,
}

impl<R: ?Sized + Send + Sync + 'static> RefreshCoordinator<R> {
    /// Creates a coordinator over `registry`.
    pub fn new(
        registry: ResourceRegistry<R>,
        probe: Arc<dyn VersionProbe>,
        strategies: StrategySet<R>,
    ) -> Self {
        Self {
            registry,
            probe,
            strategies,
            config: HotSwapConfig::default(),
            last_report: Mutex::new(None),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: HotSwapConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &HotSwapConfig {
        &self.config
    }

    /// The registry this coordinator refreshes.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry<R> {
        &self.registry
    }

    /// Capability the next cycle would use.
    #[must_use]
    pub fn capability(&self) -> Capability {
        self.config
            .forced_capability
            .unwrap_or_else(|| Capability::detect(self.probe.as_ref()))
    }

    /// Rebuilds every handle present when the cycle starts, in creation order.
    pub fn refresh_all(&self) -> Arc<RefreshReport> {
        let capability = self.capability();
        let strategy = self.strategies.select(capability);
        let handles = self.registry.handles();

        tracing::debug!(%capability, handles = handles.len(), "starting refresh cycle");

        let mut report = RefreshReport::new(capability);
        for handle in handles {
            let outcome = handle.refresh_with(strategy);
            report.record(handle.name(), outcome);
        }

        tracing::info!(
            %capability,
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "refresh cycle complete"
        );

        let report = Arc::new(report);
        *self.last_report.lock() = Some(Arc::clone(&report));
        report
    }

    /// Rebuilds one handle. `None` if no handle has that name.
    ///
    /// Does not update [`last_report`](Self::last_report).
    pub fn refresh(&self, name: &str) -> Option<RefreshOutcome> {
        let handle = self.registry.get(name)?;
        let capability = self.capability();
        Some(handle.refresh_with(self.strategies.select(capability)))
    }

    /// Report of the most recent [`refresh_all`](Self::refresh_all).
    #[must_use]
    pub fn last_report(&self) -> Option<Arc<RefreshReport>> {
        self.last_report.lock().clone()
    }
}

impl<R: ?Sized + Send + Sync + 'static> GlobalResource for RefreshCoordinator<R> {}
