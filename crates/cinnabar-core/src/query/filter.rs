//! Backend filter-builder interfaces.
//!
//! A query never produces a backend-native filter value itself; it calls back
//! into these primitives and lets the backend assemble whatever its store
//! understands (a predicate closure, a BSON document, a SQL fragment). Each
//! backend implements the builder traits exactly once.

use crate::types::{Id, Lease, Tag, TimeStamp, VersionNumber};

/// Logical connectives every filter family supports.
pub trait FilterCombinator {
    /// The backend-native filter value.
    type Filter;

    fn and(&self, filters: Vec<Self::Filter>) -> Self::Filter;
    fn or(&self, filters: Vec<Self::Filter>) -> Self::Filter;
    fn not(&self, filter: Self::Filter) -> Self::Filter;
}

/// Primitive predicates over any recorded row (delta, message, lease, tag).
pub trait RecordFilterBuilder: FilterCombinator {
    fn entity_id_in(&self, entity_ids: &[Id]) -> Self::Filter;
    fn version_eq(&self, version: VersionNumber) -> Self::Filter;
    fn version_gte(&self, version: VersionNumber) -> Self::Filter;
    fn version_lte(&self, version: VersionNumber) -> Self::Filter;
    fn type_is(&self, type_name: &str) -> Self::Filter;

    /// Match a property of the recorded payload, addressed by JSON pointer.
    fn property_matches(&self, path: &str, value: &serde_json::Value) -> Self::Filter;
}

/// Filter builder for the delta facet.
pub trait DeltaFilterBuilder: RecordFilterBuilder {}

/// Filter builder for the message facet (deltas with their commit envelope).
pub trait MessageFilterBuilder: RecordFilterBuilder {
    fn transaction_id_in(&self, transaction_ids: &[Id]) -> Self::Filter;
    fn timestamp_gte(&self, timestamp: TimeStamp) -> Self::Filter;
    fn timestamp_lte(&self, timestamp: TimeStamp) -> Self::Filter;
}

/// Filter builder for the lease facet.
pub trait LeaseFilterBuilder: RecordFilterBuilder {
    /// Exact scope+label+value match.
    fn lease_matches(&self, lease: &Lease) -> Self::Filter;
}

/// Filter builder for the tag facet.
pub trait TagFilterBuilder: RecordFilterBuilder {
    /// Exact label+value match.
    fn tag_matches(&self, tag: &Tag) -> Self::Filter;
}
