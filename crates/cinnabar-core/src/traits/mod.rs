pub mod entity;
pub mod snapshot;
pub mod source;

pub use entity::{Delta, Entity};
pub use snapshot::{SnapshotAlways, SnapshotEvery, SnapshotNever, SnapshotStrategy};
pub use source::{
    AllowAll, AuthorizationOracle, CommitSink, HistorySource, QuerySource, SnapshotSource,
};
