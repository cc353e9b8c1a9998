use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::query::{DeltaQuery, LeaseQuery, MessageQuery, TagQuery};
use crate::traits::Entity;
use crate::types::{
    AgentSignature, DeltaRecord, Id, LeaseRecord, MessageRecord, TagRecord, Transaction,
    VersionNumber,
};

/// Read access to an entity's recorded history.
///
/// Implementations must return deltas ordered oldest-first and must observe
/// the cancellation token before doing any work.
#[async_trait]
pub trait HistorySource<E: Entity>: Send + Sync {
    /// Fetch all deltas strictly newer than `after`, oldest first.
    async fn fetch_deltas(
        &self,
        entity_id: Id,
        after: VersionNumber,
        cancel: &CancellationToken,
    ) -> Result<Vec<(E::Delta, VersionNumber)>>;
}

/// Storage for acceleration snapshots.
///
/// The store guarantees at most one current snapshot per entity id; `put`
/// supersedes any older snapshot for the same id.
#[async_trait]
pub trait SnapshotSource<E: Entity>: Send + Sync {
    /// The highest-version snapshot recorded for the entity, if any.
    async fn get_latest(
        &self,
        entity_id: Id,
        cancel: &CancellationToken,
    ) -> Result<Option<(E, VersionNumber)>>;

    async fn put(
        &self,
        entity_id: Id,
        version: VersionNumber,
        state: E,
        cancel: &CancellationToken,
    ) -> Result<()>;

    async fn delete(&self, entity_ids: &[Id], cancel: &CancellationToken) -> Result<()>;
}

/// The optimistic-concurrency commit contract a storage adapter implements.
///
/// `Ok(false)` is the rejection channel for expected-version mismatches and
/// lease-uniqueness violations: the adapter wrote nothing, logged a
/// structured event with the conflict details, and the caller is expected to
/// reload and retry. Errors are reserved for storage faults and cancellation.
#[async_trait]
pub trait CommitSink<D>: Send + Sync {
    /// Persist the whole transaction atomically, or nothing at all.
    ///
    /// For every step, the currently persisted version of the step's entity
    /// must equal `expected_previous_version`. Cancellation must be observed
    /// before any write.
    async fn commit(
        &self,
        transaction: &Transaction<D>,
        cancel: &CancellationToken,
    ) -> Result<bool>;
}

/// Query access to the four recorded data facets.
///
/// Each method is generic over the logical query shape; the adapter compiles
/// the query against its own filter/sort builders. No code outside the
/// adapter ever sees backend-native filter or sort values.
#[async_trait]
pub trait QuerySource<D>: Send + Sync {
    async fn find_deltas<Q>(
        &self,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeltaRecord<D>>>
    where
        Q: DeltaQuery + Sync;

    async fn find_messages<Q>(
        &self,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<Vec<MessageRecord<D>>>
    where
        Q: MessageQuery + Sync;

    async fn find_leases<Q>(
        &self,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<Vec<LeaseRecord>>
    where
        Q: LeaseQuery + Sync;

    async fn find_tags<Q>(&self, query: &Q, cancel: &CancellationToken)
        -> Result<Vec<TagRecord>>
    where
        Q: TagQuery + Sync;
}

/// The single yes/no authorization decision point the engine calls out to.
///
/// Policy lives entirely in the implementor; the engine only propagates the
/// verdict.
pub trait AuthorizationOracle<E: Entity>: Send + Sync {
    fn is_authorized(&self, state: &E, delta: &E::Delta, agent: &AgentSignature) -> bool;
}

/// Oracle that admits every append.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl<E: Entity> AuthorizationOracle<E> for AllowAll {
    fn is_authorized(&self, _state: &E, _delta: &E::Delta, _agent: &AgentSignature) -> bool {
        true
    }
}
