use serde::{Deserialize, Serialize};

use crate::types::{AgentSignature, Id, Lease, Pointer, Tag, TimeStamp, VersionNumber};

/// One entity's contribution to a commit unit.
///
/// Every step advances its entity by exactly one version:
/// `next_version == expected_previous_version.next()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStep<D> {
    pub entity_id: Id,

    /// The version the adapter must observe as persisted latest before
    /// writing, or the whole transaction is rejected.
    pub expected_previous_version: VersionNumber,

    /// The version the entity reaches once this step is applied.
    pub next_version: VersionNumber,

    pub delta: D,

    pub add_leases: Vec<Lease>,
    pub delete_leases: Vec<Lease>,
    pub add_tags: Vec<Tag>,
    pub delete_tags: Vec<Tag>,
}

impl<D> TransactionStep<D> {
    /// Pointer to the revision this step produces.
    pub fn pointer(&self) -> Pointer {
        Pointer::new(self.entity_id, self.next_version)
    }
}

/// Immutable, atomic multi-entity commit unit.
///
/// All steps commit or none do. A committed transaction is complete and
/// self-describing: downstream consumers (snapshot refreshers, projectors,
/// outbox workers) can process it independently and idempotently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction<D> {
    pub id: Id,
    pub timestamp: TimeStamp,
    pub agent: AgentSignature,
    /// Entity-first-tracked order; append order within an entity.
    pub steps: Vec<TransactionStep<D>>,
}

impl<D> Transaction<D> {
    /// Distinct entity ids touched by this transaction, in step order.
    pub fn entity_ids(&self) -> Vec<Id> {
        let mut ids = Vec::new();
        for step in &self.steps {
            if !ids.contains(&step.entity_id) {
                ids.push(step.entity_id);
            }
        }
        ids
    }

    /// Steps touching one entity, in append order.
    pub fn steps_for(&self, entity_id: Id) -> impl Iterator<Item = &TransactionStep<D>> {
        self.steps.iter().filter(move |s| s.entity_id == entity_id)
    }
}
