//! Cinnabar Core: traits and types for the cinnabar event-sourcing engine
//!
//! This crate defines the core abstractions for an append-only,
//! state-reconstruction storage engine:
//! - Value identifiers: ids, version numbers, pointers, timestamps
//! - Deltas: pure, immutable units of change with optional lease/tag facets
//! - Reduction: the strict left fold rebuilding current state from history
//! - Snapshot strategies: policies deciding when to persist acceleration points
//! - Collaborator traits: history/snapshot sources, the optimistic-concurrency
//!   commit sink, query sources, the authorization oracle
//! - Query abstraction: backend-independent filters/sorts compiled through
//!   per-backend builders, composable via modifier wrappers
//!
//! Key invariants:
//! - Replay is deterministic: the same delta sequence always rebuilds the
//!   same state, bit for bit
//! - Versions advance by exactly one per applied delta
//! - A transaction commits atomically or not at all; expected-version
//!   mismatches are reported through a boolean channel, never silently
//!   overwritten

pub mod config;
pub mod error;
pub mod observe;
pub mod query;
pub mod reduce;
pub mod traits;
pub mod types;

pub use config::CommitOptions;
pub use error::{CinnabarError, Result};
pub use query::{DeltaQuery, Invert, LeaseQuery, MessageQuery, Repaginate, Reverse, TagQuery};
pub use reduce::{reconstruct, reconstruct_from};
pub use traits::{
    AllowAll, AuthorizationOracle, CommitSink, Delta, Entity, HistorySource, QuerySource,
    SnapshotAlways, SnapshotEvery, SnapshotNever, SnapshotSource, SnapshotStrategy,
};
pub use types::{
    AgentSignature, DeltaRecord, Id, Lease, LeaseRecord, MessageRecord, Pointer, Tag, TagRecord,
    TimeStamp, Transaction, TransactionStep, VersionNumber,
};
