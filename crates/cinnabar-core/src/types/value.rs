use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque 128-bit random identifier for entities, transactions and agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(Uuid);

impl Id {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Position in an entity's history.
///
/// Zero means the entity is unconstructed: nothing has ever been recorded
/// for it. The number advances by exactly one per applied delta.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VersionNumber(u64);

impl VersionNumber {
    pub const ZERO: VersionNumber = VersionNumber(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The version that follows this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// True when no delta has ever been applied at this version.
    pub const fn is_unconstructed(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// UTC instant attached to committed transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeStamp(DateTime<Utc>);

impl TimeStamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.to_rfc3339().fmt(f)
    }
}

/// Addressable revision of an entity: an id plus a version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pointer {
    pub id: Id,
    pub version: VersionNumber,
}

impl Pointer {
    pub const fn new(id: Id, version: VersionNumber) -> Self {
        Self { id, version }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_number_advances_by_one() {
        let v = VersionNumber::ZERO;
        assert!(v.is_unconstructed());
        assert_eq!(v.next().get(), 1);
        assert_eq!(v.next().next().get(), 2);
        assert!(!v.next().is_unconstructed());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Id::random(), Id::random());
    }

    #[test]
    fn pointer_orders_by_id_then_version() {
        let id = Id::random();
        let a = Pointer::new(id, VersionNumber::new(1));
        let b = Pointer::new(id, VersionNumber::new(2));
        assert!(a < b);
    }
}
