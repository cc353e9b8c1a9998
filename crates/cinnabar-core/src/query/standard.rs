//! Canned queries for the engine's own needs and common caller patterns.

use crate::query::filter::{
    DeltaFilterBuilder, LeaseFilterBuilder, MessageFilterBuilder, TagFilterBuilder,
};
use crate::query::sort::{DeltaSortBuilder, RecordSortBuilder};
use crate::query::{DeltaQuery, LeaseQuery, MessageQuery, TagQuery};
use crate::types::{Id, Lease, Tag, VersionNumber};

/// All deltas of one entity strictly newer than `after`, oldest first.
///
/// This is the replay-window query the engine issues when loading an entity
/// from a snapshot (or from scratch, with `after == ZERO`).
#[derive(Debug, Clone)]
pub struct DeltasForEntity {
    pub entity_id: Id,
    pub after: VersionNumber,
}

impl DeltasForEntity {
    pub fn new(entity_id: Id, after: VersionNumber) -> Self {
        Self { entity_id, after }
    }

    /// The full history of an entity.
    pub fn from_start(entity_id: Id) -> Self {
        Self::new(entity_id, VersionNumber::ZERO)
    }
}

impl DeltaQuery for DeltasForEntity {
    fn compile_filter<B: DeltaFilterBuilder>(&self, builder: &B) -> B::Filter {
        builder.and(vec![
            builder.entity_id_in(&[self.entity_id]),
            builder.version_gte(self.after.next()),
        ])
    }

    fn compile_sort<B: DeltaSortBuilder>(&self, builder: &B) -> Option<B::Sort> {
        Some(builder.version(true))
    }
}

/// All deltas with a given declared type.
#[derive(Debug, Clone)]
pub struct DeltasOfType {
    pub type_name: String,
}

impl DeltasOfType {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl DeltaQuery for DeltasOfType {
    fn compile_filter<B: DeltaFilterBuilder>(&self, builder: &B) -> B::Filter {
        builder.type_is(&self.type_name)
    }

    fn compile_sort<B: DeltaSortBuilder>(&self, builder: &B) -> Option<B::Sort> {
        Some(builder.combine(vec![builder.entity_id(true), builder.version(true)]))
    }
}

/// Every message recorded by one committed transaction.
#[derive(Debug, Clone)]
pub struct MessagesInTransaction {
    pub transaction_id: Id,
}

impl MessagesInTransaction {
    pub fn new(transaction_id: Id) -> Self {
        Self { transaction_id }
    }
}

impl MessageQuery for MessagesInTransaction {
    fn compile_filter<B: MessageFilterBuilder>(&self, builder: &B) -> B::Filter {
        builder.transaction_id_in(&[self.transaction_id])
    }
}

/// Exact-match set of leases.
///
/// One logical query serves every backend; wrapping it in
/// [`Invert`](crate::query::Invert) yields "everything but these leases"
/// without backend-specific branches.
#[derive(Debug, Clone)]
pub struct MatchingLeases(pub Vec<Lease>);

impl LeaseQuery for MatchingLeases {
    fn compile_filter<B: LeaseFilterBuilder>(&self, builder: &B) -> B::Filter {
        builder.or(self.0.iter().map(|l| builder.lease_matches(l)).collect())
    }
}

/// Exact-match set of tags.
#[derive(Debug, Clone)]
pub struct MatchingTags(pub Vec<Tag>);

impl TagQuery for MatchingTags {
    fn compile_filter<B: TagFilterBuilder>(&self, builder: &B) -> B::Filter {
        builder.or(self.0.iter().map(|t| builder.tag_matches(t)).collect())
    }
}
