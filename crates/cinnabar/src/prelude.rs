//! Cinnabar Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use cinnabar::prelude::*;
//! ```

// Core types
pub use crate::{
    AgentSignature, CinnabarError, Id, Lease, Pointer, Result, Tag, TimeStamp, Transaction,
    TransactionStep, VersionNumber,
};

// Traits
pub use crate::{
    AuthorizationOracle, CommitSink, Delta, Entity, HistorySource, QuerySource, SnapshotSource,
    SnapshotStrategy,
};

// Strategies and defaults
pub use crate::{AllowAll, SnapshotAlways, SnapshotEvery, SnapshotNever};

// Engine
pub use crate::{
    commit_with_retry, reconstruct, reconstruct_from, refresh_snapshots, CommitOptions,
    Repository, SourceBuilder,
};

// Queries
pub use crate::{
    DeltaQuery, DeltasForEntity, Invert, LeaseQuery, MatchingLeases, MatchingTags, MessageQuery,
    Repaginate, Reverse, TagQuery,
};

// Re-export common external deps
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tokio_util::sync::CancellationToken;
pub use tracing;
