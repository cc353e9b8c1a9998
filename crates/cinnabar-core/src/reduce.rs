//! State reconstruction: the strict left fold of recorded deltas.
//!
//! Current state is always the fold of an entity's delta sequence over its
//! constructed initial value; snapshots only shorten the window, never change
//! the result. Both entry points are pure and perform no I/O.

use crate::error::{CinnabarError, Result};
use crate::traits::{Delta, Entity};
use crate::types::{Id, VersionNumber};

/// Rebuild an entity from its full history.
///
/// `deltas` must belong to `entity_id`, be ordered oldest first, and carry
/// contiguous versions starting at 1. A gap or reorder fails with
/// [`CinnabarError::VersionGap`]; such input indicates corrupted history or a
/// staging bug and is never retried.
pub fn reconstruct<E, I>(entity_id: Id, deltas: I) -> Result<E>
where
    E: Entity,
    I: IntoIterator<Item = (E::Delta, VersionNumber)>,
{
    reconstruct_from(E::construct(entity_id), deltas)
}

/// Resume the fold from a snapshot state.
///
/// The caller must supply only deltas strictly newer than the snapshot's
/// version; the contiguity check catches any off-by-one in that window.
pub fn reconstruct_from<E, I>(state: E, deltas: I) -> Result<E>
where
    E: Entity,
    I: IntoIterator<Item = (E::Delta, VersionNumber)>,
{
    let entity_id = state.id();
    let mut state = state;
    for (delta, version) in deltas {
        let expected = state.version().next();
        if version != expected {
            return Err(CinnabarError::VersionGap {
                entity_id,
                expected,
                found: version,
            });
        }
        state = delta.reduce(state).with_version(version);
    }
    Ok(state)
}
