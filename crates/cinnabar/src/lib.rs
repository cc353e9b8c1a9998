//! Cinnabar: an event-sourcing state-reconstruction and consistency engine
//!
//! Entities are never stored as mutable rows. Their history is an ordered,
//! append-only sequence of immutable deltas; current state is always the
//! fold of that sequence, optionally accelerated by snapshots. Cinnabar
//! provides:
//! - **Staging**: [`SourceBuilder`] accumulates deltas per entity and emits
//!   one immutable, atomic, multi-entity [`Transaction`]
//! - **Optimistic concurrency**: every step records the version it expects;
//!   the storage adapter commits all steps atomically or rejects the unit
//! - **Snapshots**: pluggable [`SnapshotStrategy`] policies plus a
//!   post-commit refresher
//! - **Queries**: backend-independent filter/sort descriptions over deltas,
//!   messages, leases and tags, compiled per backend
//!
//! # Quick Start
//!
//! ```ignore
//! use cinnabar::prelude::*;
//!
//! # async fn demo(repo: Repository<MyEntity>) -> Result<()> {
//! let cancel = CancellationToken::new();
//! let mut builder = repo.builder(AgentSignature::system());
//! repo.load_into(&mut builder, entity_id, &cancel).await?;
//! builder.append(entity_id, MyDelta::Rename("new name".into()))?;
//! let transaction = builder.build(Id::random());
//! if !repo.commit(&transaction, &cancel).await? {
//!     // Version conflict: reload and restage.
//! }
//! # Ok(())
//! # }
//! ```

pub mod commit;
pub mod prelude;
pub mod repository;
pub mod snapshot;
pub mod staging;

pub use commit::commit_with_retry;
pub use repository::Repository;
pub use snapshot::refresh_snapshots;
pub use staging::SourceBuilder;

// Re-export core types
pub use cinnabar_core::{
    config::CommitOptions,
    error::{CinnabarError, Result},
    query::{
        DeltaFilterBuilder, DeltaQuery, DeltaSortBuilder, DeltasForEntity, DeltasOfType,
        FilterCombinator, Invert, LeaseFilterBuilder, LeaseQuery, LeaseSortBuilder,
        MatchingLeases, MatchingTags, MessageFilterBuilder, MessageQuery, MessageSortBuilder,
        MessagesInTransaction, RecordFilterBuilder, RecordSortBuilder, Repaginate, Reverse,
        Reversed, SortCombinator, TagFilterBuilder, TagQuery, TagSortBuilder,
    },
    reduce::{reconstruct, reconstruct_from},
    traits::{
        AllowAll, AuthorizationOracle, CommitSink, Delta, Entity, HistorySource, QuerySource,
        SnapshotAlways, SnapshotEvery, SnapshotNever, SnapshotSource, SnapshotStrategy,
    },
    types::{
        AgentSignature, DeltaRecord, Id, Lease, LeaseRecord, MessageRecord, Pointer, Tag,
        TagRecord, TimeStamp, Transaction, TransactionStep, VersionNumber,
    },
};
