use serde::{Deserialize, Serialize};

use crate::types::{Id, Lease, Pointer, Tag, TimeStamp};

/// A recorded delta, as returned by delta queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaRecord<D> {
    pub entity: Pointer,
    pub type_name: String,
    pub delta: D,
}

/// A recorded delta together with its commit envelope, as returned by
/// message queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord<D> {
    pub transaction_id: Id,
    pub timestamp: TimeStamp,
    pub entity: Pointer,
    pub type_name: String,
    pub delta: D,
}

/// A currently-held lease, as returned by lease queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// The revision whose step added the lease.
    pub entity: Pointer,
    pub lease: Lease,
}

/// A currently-held tag, as returned by tag queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    /// The revision whose step added the tag.
    pub entity: Pointer,
    pub tag: Tag,
}
