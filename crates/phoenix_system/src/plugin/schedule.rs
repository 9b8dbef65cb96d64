//! Schedule identifiers for tick-based plugin updates.
//!
//! A schedule is any `'static` marker type. Whoever owns an event (a file
//! watcher, an admin endpoint, a test) calls
//! [`Server::tick::<S>()`](crate::server::Server::tick) and every plugin that
//! listed `ScheduleId::of::<S>()` in
//! [`Plugin::tick_schedules`](super::Plugin::tick_schedules) gets an
//! [`update`](super::Plugin::update) call.

use core::any::TypeId;

/// Identifier for a tick schedule, derived from a marker type.
///
/// ```
/// # use phoenix_system::plugin::ScheduleId;
/// pub struct OnDeploy;
///
/// let schedule = ScheduleId::of::<OnDeploy>();
/// assert!(schedule.type_name().ends_with("OnDeploy"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ScheduleId {
    /// Returns the identifier of marker type `S`.
    #[must_use]
    pub fn of<S: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: core::any::type_name::<S>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Conventional marker trait for schedule types.
///
/// [`ScheduleId::of`] accepts any `'static` type; implementing `Schedule`
/// documents intent and lets APIs bound on it.
pub trait Schedule: 'static {
    /// Returns the [`ScheduleId`] of this schedule.
    #[must_use]
    fn id() -> ScheduleId
    where
        Self: Sized,
    {
        ScheduleId::of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnSave;
    impl Schedule for OnSave {}

    struct OnDeploy;
    impl Schedule for OnDeploy {}

    #[test]
    fn ids_compare_by_type() {
        assert_eq!(ScheduleId::of::<OnSave>(), ScheduleId::of::<OnSave>());
        assert_ne!(ScheduleId::of::<OnSave>(), ScheduleId::of::<OnDeploy>());
        assert_eq!(ScheduleId::of::<OnSave>().type_id(), TypeId::of::<OnSave>());
    }

    #[test]
    fn schedule_trait_id_matches() {
        assert_eq!(OnDeploy::id(), ScheduleId::of::<OnDeploy>());
        assert!(OnDeploy::id().type_name().contains("OnDeploy"));
    }
}
