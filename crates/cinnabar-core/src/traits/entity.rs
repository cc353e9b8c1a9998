use crate::types::{Id, Lease, Tag, VersionNumber};

/// One atomic, immutable unit of change over a state type.
///
/// `reduce` must be pure and deterministic: replaying the same delta sequence
/// always rebuilds the same state. The lease/tag methods are optional facets;
/// a delta that contributes no metadata keeps the empty defaults.
pub trait Delta<S>: Send + Sync + 'static {
    /// Fold this delta into the state, producing the next state value.
    fn reduce(&self, state: S) -> S;

    /// Declared type of this delta, used by type-equality query predicates.
    fn type_name(&self) -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// Leases this delta grants, given the state it applies to.
    fn added_leases(&self, state: &S) -> Vec<Lease> {
        let _ = state;
        Vec::new()
    }

    /// Leases this delta releases.
    fn deleted_leases(&self, state: &S) -> Vec<Lease> {
        let _ = state;
        Vec::new()
    }

    /// Tags this delta attaches.
    fn added_tags(&self, state: &S) -> Vec<Tag> {
        let _ = state;
        Vec::new()
    }

    /// Tags this delta removes.
    fn deleted_tags(&self, state: &S) -> Vec<Tag> {
        let _ = state;
        Vec::new()
    }
}

/// A reconstructable domain object: an entity or a derived projection.
///
/// State is never mutated in place. `construct` yields the version-0 value,
/// and every applied delta produces a new value one version further on.
pub trait Entity: Clone + Send + Sync + 'static {
    type Delta: Delta<Self>;

    /// The initial, unconstructed state for an id (version 0).
    fn construct(id: Id) -> Self;

    fn id(&self) -> Id;

    fn version(&self) -> VersionNumber;

    /// The same state value stamped with a new version number.
    fn with_version(self, version: VersionNumber) -> Self;
}
