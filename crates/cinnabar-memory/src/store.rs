//! In-memory storage adapter.
//!
//! One [`MemoryStore`] holds every recorded facet behind a single
//! `parking_lot::RwLock`, which makes commits trivially atomic: validation
//! and application happen under one write guard, and a rejected transaction
//! releases the guard without touching anything.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use cinnabar_core::error::{CinnabarError, Result};
use cinnabar_core::query::{DeltaQuery, LeaseQuery, MessageQuery, TagQuery};
use cinnabar_core::traits::{
    CommitSink, Delta, Entity, HistorySource, QuerySource, SnapshotSource,
};
use cinnabar_core::types::{
    DeltaRecord, Id, Lease, LeaseRecord, MessageRecord, Pointer, Tag, TagRecord, TimeStamp,
    Transaction, VersionNumber,
};

use crate::query::{
    Comparator, ComparatorBuilder, LeaseRow, MessageRow, PredicateBuilder, Row, TagRow,
};

struct StoredDelta<D> {
    transaction_id: Id,
    timestamp: TimeStamp,
    version: VersionNumber,
    type_name: &'static str,
    payload: serde_json::Value,
    delta: D,
}

struct Inner<E: Entity> {
    histories: HashMap<Id, Vec<StoredDelta<E::Delta>>>,
    leases: HashMap<Lease, Pointer>,
    tags: Vec<(Pointer, Tag)>,
    snapshots: HashMap<Id, (E, VersionNumber)>,
}

impl<E: Entity> Default for Inner<E> {
    fn default() -> Self {
        Self {
            histories: HashMap::new(),
            leases: HashMap::new(),
            tags: Vec::new(),
            snapshots: HashMap::new(),
        }
    }
}

/// All four storage roles over process-local state.
///
/// Cloning is cheap and yields a handle to the same store, so one instance
/// can serve as history source, snapshot source, commit sink and query
/// source for any number of repositories.
pub struct MemoryStore<E: Entity> {
    inner: Arc<RwLock<Inner<E>>>,
}

impl<E: Entity> Clone for MemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Latest persisted version of an entity, `ZERO` if unrecorded.
    pub fn latest_version(&self, entity_id: Id) -> VersionNumber {
        let inner = self.inner.read();
        inner
            .histories
            .get(&entity_id)
            .and_then(|h| h.last())
            .map(|d| d.version)
            .unwrap_or(VersionNumber::ZERO)
    }

    /// The revision currently holding a lease, if any.
    pub fn lease_holder(&self, lease: &Lease) -> Option<Pointer> {
        self.inner.read().leases.get(lease).copied()
    }

    /// Version of the current snapshot for an entity, if one exists.
    pub fn snapshot_version(&self, entity_id: Id) -> Option<VersionNumber> {
        self.inner.read().snapshots.get(&entity_id).map(|(_, v)| *v)
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(CinnabarError::Cancelled);
    }
    Ok(())
}

fn paginate<T>(rows: Vec<T>, skip: Option<u64>, take: Option<u64>) -> Vec<T> {
    rows.into_iter()
        .skip(skip.unwrap_or(0) as usize)
        .take(take.map(|t| t as usize).unwrap_or(usize::MAX))
        .collect()
}

fn apply_order<R>(rows: &mut [R], sort: Option<Comparator<R>>) {
    if let Some(sort) = sort {
        rows.sort_by(|a, b| sort.compare(a, b));
    }
}

struct DeltaView<D> {
    entity: Pointer,
    type_name: String,
    payload: serde_json::Value,
    delta: D,
}

impl<D> Row for DeltaView<D> {
    fn entity(&self) -> Pointer {
        self.entity
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

struct MessageView<D> {
    transaction_id: Id,
    timestamp: TimeStamp,
    entity: Pointer,
    type_name: String,
    payload: serde_json::Value,
    delta: D,
}

impl<D> Row for MessageView<D> {
    fn entity(&self) -> Pointer {
        self.entity
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl<D> MessageRow for MessageView<D> {
    fn transaction_id(&self) -> Id {
        self.transaction_id
    }

    fn timestamp(&self) -> TimeStamp {
        self.timestamp
    }
}

struct LeaseView {
    entity: Pointer,
    lease: Lease,
    payload: serde_json::Value,
}

impl Row for LeaseView {
    fn entity(&self) -> Pointer {
        self.entity
    }

    fn type_name(&self) -> &str {
        "lease"
    }

    fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl LeaseRow for LeaseView {
    fn lease(&self) -> &Lease {
        &self.lease
    }
}

struct TagView {
    entity: Pointer,
    tag: Tag,
    payload: serde_json::Value,
}

impl Row for TagView {
    fn entity(&self) -> Pointer {
        self.entity
    }

    fn type_name(&self) -> &str {
        "tag"
    }

    fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl TagRow for TagView {
    fn tag(&self) -> &Tag {
        &self.tag
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| CinnabarError::Serialization(e.to_string()))
}

#[async_trait]
impl<E> HistorySource<E> for MemoryStore<E>
where
    E: Entity,
    E::Delta: Clone,
{
    async fn fetch_deltas(
        &self,
        entity_id: Id,
        after: VersionNumber,
        cancel: &CancellationToken,
    ) -> Result<Vec<(E::Delta, VersionNumber)>> {
        check_cancelled(cancel)?;
        let inner = self.inner.read();
        let deltas = inner
            .histories
            .get(&entity_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|d| d.version > after)
                    .map(|d| (d.delta.clone(), d.version))
                    .collect()
            })
            .unwrap_or_default();
        Ok(deltas)
    }
}

#[async_trait]
impl<E: Entity> SnapshotSource<E> for MemoryStore<E> {
    async fn get_latest(
        &self,
        entity_id: Id,
        cancel: &CancellationToken,
    ) -> Result<Option<(E, VersionNumber)>> {
        check_cancelled(cancel)?;
        Ok(self.inner.read().snapshots.get(&entity_id).cloned())
    }

    async fn put(
        &self,
        entity_id: Id,
        version: VersionNumber,
        state: E,
        cancel: &CancellationToken,
    ) -> Result<()> {
        check_cancelled(cancel)?;
        self.inner
            .write()
            .snapshots
            .insert(entity_id, (state, version));
        Ok(())
    }

    async fn delete(&self, entity_ids: &[Id], cancel: &CancellationToken) -> Result<()> {
        check_cancelled(cancel)?;
        let mut inner = self.inner.write();
        for id in entity_ids {
            inner.snapshots.remove(id);
        }
        Ok(())
    }
}

#[async_trait]
impl<E> CommitSink<E::Delta> for MemoryStore<E>
where
    E: Entity,
    E::Delta: Clone + Serialize,
{
    async fn commit(
        &self,
        transaction: &Transaction<E::Delta>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        check_cancelled(cancel)?;
        let mut inner = self.inner.write();

        // Validate pass: nothing is written until every step checks out.
        let mut running: HashMap<Id, VersionNumber> = HashMap::new();
        let mut held: HashSet<Lease> = inner.leases.keys().cloned().collect();
        for step in &transaction.steps {
            if step.next_version != step.expected_previous_version.next() {
                tracing::warn!(
                    transaction_id = %transaction.id,
                    entity_id = %step.entity_id,
                    expected_previous = %step.expected_previous_version,
                    next = %step.next_version,
                    "commit rejected: step does not advance by one version"
                );
                return Ok(false);
            }
            let current = *running.entry(step.entity_id).or_insert_with(|| {
                inner
                    .histories
                    .get(&step.entity_id)
                    .and_then(|h| h.last())
                    .map(|d| d.version)
                    .unwrap_or(VersionNumber::ZERO)
            });
            if current != step.expected_previous_version {
                tracing::warn!(
                    transaction_id = %transaction.id,
                    entity_id = %step.entity_id,
                    expected = %step.expected_previous_version,
                    actual = %current,
                    "commit rejected: version mismatch"
                );
                return Ok(false);
            }
            running.insert(step.entity_id, step.next_version);

            for lease in &step.delete_leases {
                held.remove(lease);
            }
            for lease in &step.add_leases {
                if !held.insert(lease.clone()) {
                    tracing::warn!(
                        transaction_id = %transaction.id,
                        entity_id = %step.entity_id,
                        scope = %lease.scope,
                        label = %lease.label,
                        value = %lease.value,
                        "commit rejected: lease already held"
                    );
                    return Ok(false);
                }
            }
        }

        // Serialize payloads before mutating so a serialization fault cannot
        // leave a partial write behind.
        let mut payloads = Vec::with_capacity(transaction.steps.len());
        for step in &transaction.steps {
            payloads.push(to_payload(&step.delta)?);
        }

        // Apply pass.
        for (step, payload) in transaction.steps.iter().zip(payloads) {
            let pointer = step.pointer();
            inner
                .histories
                .entry(step.entity_id)
                .or_default()
                .push(StoredDelta {
                    transaction_id: transaction.id,
                    timestamp: transaction.timestamp,
                    version: step.next_version,
                    type_name: step.delta.type_name(),
                    payload,
                    delta: step.delta.clone(),
                });
            for lease in &step.delete_leases {
                inner.leases.remove(lease);
            }
            for lease in &step.add_leases {
                inner.leases.insert(lease.clone(), pointer);
            }
            for tag in &step.delete_tags {
                inner
                    .tags
                    .retain(|(p, t)| !(p.id == step.entity_id && t == tag));
            }
            for tag in &step.add_tags {
                inner.tags.push((pointer, tag.clone()));
            }
        }

        tracing::debug!(
            transaction_id = %transaction.id,
            steps = transaction.steps.len(),
            "transaction committed"
        );
        Ok(true)
    }
}

#[async_trait]
impl<E> QuerySource<E::Delta> for MemoryStore<E>
where
    E: Entity,
    E::Delta: Clone,
{
    async fn find_deltas<Q>(
        &self,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeltaRecord<E::Delta>>>
    where
        Q: DeltaQuery + Sync,
    {
        check_cancelled(cancel)?;
        let inner = self.inner.read();
        let builder = PredicateBuilder::<DeltaView<E::Delta>>::default();
        let filter = query.compile_filter(&builder);
        let mut rows: Vec<DeltaView<E::Delta>> = inner
            .histories
            .iter()
            .flat_map(|(id, history)| {
                history.iter().map(|d| DeltaView {
                    entity: Pointer::new(*id, d.version),
                    type_name: d.type_name.to_string(),
                    payload: d.payload.clone(),
                    delta: d.delta.clone(),
                })
            })
            .filter(|row| filter.matches(row))
            .collect();
        apply_order(&mut rows, query.compile_sort(&ComparatorBuilder::default()));
        Ok(paginate(rows, query.skip(), query.take())
            .into_iter()
            .map(|row| DeltaRecord {
                entity: row.entity,
                type_name: row.type_name,
                delta: row.delta,
            })
            .collect())
    }

    async fn find_messages<Q>(
        &self,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<Vec<MessageRecord<E::Delta>>>
    where
        Q: MessageQuery + Sync,
    {
        check_cancelled(cancel)?;
        let inner = self.inner.read();
        let builder = PredicateBuilder::<MessageView<E::Delta>>::default();
        let filter = query.compile_filter(&builder);
        let mut rows: Vec<MessageView<E::Delta>> = inner
            .histories
            .iter()
            .flat_map(|(id, history)| {
                history.iter().map(|d| MessageView {
                    transaction_id: d.transaction_id,
                    timestamp: d.timestamp,
                    entity: Pointer::new(*id, d.version),
                    type_name: d.type_name.to_string(),
                    payload: d.payload.clone(),
                    delta: d.delta.clone(),
                })
            })
            .filter(|row| filter.matches(row))
            .collect();
        apply_order(&mut rows, query.compile_sort(&ComparatorBuilder::default()));
        Ok(paginate(rows, query.skip(), query.take())
            .into_iter()
            .map(|row| MessageRecord {
                transaction_id: row.transaction_id,
                timestamp: row.timestamp,
                entity: row.entity,
                type_name: row.type_name,
                delta: row.delta,
            })
            .collect())
    }

    async fn find_leases<Q>(
        &self,
        query: &Q,
        cancel: &CancellationToken,
    ) -> Result<Vec<LeaseRecord>>
    where
        Q: LeaseQuery + Sync,
    {
        check_cancelled(cancel)?;
        let inner = self.inner.read();
        let builder = PredicateBuilder::<LeaseView>::default();
        let filter = query.compile_filter(&builder);
        let mut rows = Vec::new();
        for (lease, pointer) in &inner.leases {
            let row = LeaseView {
                entity: *pointer,
                lease: lease.clone(),
                payload: to_payload(lease)?,
            };
            if filter.matches(&row) {
                rows.push(row);
            }
        }
        apply_order(&mut rows, query.compile_sort(&ComparatorBuilder::default()));
        Ok(paginate(rows, query.skip(), query.take())
            .into_iter()
            .map(|row| LeaseRecord {
                entity: row.entity,
                lease: row.lease,
            })
            .collect())
    }

    async fn find_tags<Q>(&self, query: &Q, cancel: &CancellationToken) -> Result<Vec<TagRecord>>
    where
        Q: TagQuery + Sync,
    {
        check_cancelled(cancel)?;
        let inner = self.inner.read();
        let builder = PredicateBuilder::<TagView>::default();
        let filter = query.compile_filter(&builder);
        let mut rows = Vec::new();
        for (pointer, tag) in &inner.tags {
            let row = TagView {
                entity: *pointer,
                tag: tag.clone(),
                payload: to_payload(tag)?,
            };
            if filter.matches(&row) {
                rows.push(row);
            }
        }
        apply_order(&mut rows, query.compile_sort(&ComparatorBuilder::default()));
        Ok(paginate(rows, query.skip(), query.take())
            .into_iter()
            .map(|row| TagRecord {
                entity: row.entity,
                tag: row.tag,
            })
            .collect())
    }
}
