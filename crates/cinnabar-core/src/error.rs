use thiserror::Error;

use crate::types::{Id, VersionNumber};

#[derive(Error, Debug)]
pub enum CinnabarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Entity {0} is already tracked by this builder")]
    EntityAlreadyTracked(Id),

    #[error("Entity {0} has never been created (resolved version is 0)")]
    EntityNotCreated(Id),

    #[error("Entity {0} is not tracked by this builder")]
    EntityNotTracked(Id),

    #[error("Agent is not authorized to append {delta_type} to entity {entity_id}")]
    NotAuthorized {
        entity_id: Id,
        delta_type: &'static str,
    },

    #[error(
        "Version gap while reducing entity {entity_id}: expected {expected}, found {found}"
    )]
    VersionGap {
        entity_id: Id,
        expected: VersionNumber,
        found: VersionNumber,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CinnabarError>;
