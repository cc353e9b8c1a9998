use crate::traits::Entity;

/// Decides, after each applied delta, whether the resulting state should be
/// persisted as an acceleration point.
///
/// Pure predicate. `previous` is `None` when there is no baseline (the first
/// applied delta of a replay window).
pub trait SnapshotStrategy<E: Entity>: Send + Sync {
    fn should_snapshot(&self, previous: Option<&E>, next: &E) -> bool;
}

/// Never snapshot; every load replays full history.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotNever;

impl<E: Entity> SnapshotStrategy<E> for SnapshotNever {
    fn should_snapshot(&self, _previous: Option<&E>, _next: &E) -> bool {
        false
    }
}

/// Snapshot after every applied delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotAlways;

impl<E: Entity> SnapshotStrategy<E> for SnapshotAlways {
    fn should_snapshot(&self, _previous: Option<&E>, _next: &E) -> bool {
        true
    }
}

/// Snapshot whenever the reached version is a multiple of `n`.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotEvery(pub u64);

impl<E: Entity> SnapshotStrategy<E> for SnapshotEvery {
    fn should_snapshot(&self, _previous: Option<&E>, next: &E) -> bool {
        self.0 > 0 && next.version().get() % self.0 == 0
    }
}
