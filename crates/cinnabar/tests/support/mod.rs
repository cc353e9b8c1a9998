//! Shared fixture: a profile entity with lease and tag facets, wired over
//! the in-memory adapter.

#![allow(dead_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cinnabar::prelude::*;
use cinnabar_memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Id,
    pub version: VersionNumber,
    pub name: String,
    pub score: i64,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileDelta {
    Register { name: String },
    SetEmail { email: String },
    ClearEmail,
    AddScore { amount: i64 },
    Label { label: String, value: String },
    Unlabel { label: String, value: String },
}

fn email_lease(email: &str) -> Lease {
    Lease::new("profiles", "email", email)
}

impl Delta<Profile> for ProfileDelta {
    fn reduce(&self, mut state: Profile) -> Profile {
        match self {
            ProfileDelta::Register { name } => state.name = name.clone(),
            ProfileDelta::SetEmail { email } => state.email = Some(email.clone()),
            ProfileDelta::ClearEmail => state.email = None,
            ProfileDelta::AddScore { amount } => state.score += amount,
            ProfileDelta::Label { .. } | ProfileDelta::Unlabel { .. } => {}
        }
        state
    }

    fn type_name(&self) -> &'static str {
        match self {
            ProfileDelta::Register { .. } => "register",
            ProfileDelta::SetEmail { .. } => "set_email",
            ProfileDelta::ClearEmail => "clear_email",
            ProfileDelta::AddScore { .. } => "add_score",
            ProfileDelta::Label { .. } => "label",
            ProfileDelta::Unlabel { .. } => "unlabel",
        }
    }

    fn added_leases(&self, _state: &Profile) -> Vec<Lease> {
        match self {
            ProfileDelta::SetEmail { email } => vec![email_lease(email)],
            _ => Vec::new(),
        }
    }

    fn deleted_leases(&self, state: &Profile) -> Vec<Lease> {
        match self {
            ProfileDelta::SetEmail { .. } | ProfileDelta::ClearEmail => {
                state.email.as_deref().map(email_lease).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    fn added_tags(&self, _state: &Profile) -> Vec<Tag> {
        match self {
            ProfileDelta::Label { label, value } => vec![Tag::new(label.clone(), value.clone())],
            _ => Vec::new(),
        }
    }

    fn deleted_tags(&self, _state: &Profile) -> Vec<Tag> {
        match self {
            ProfileDelta::Unlabel { label, value } => vec![Tag::new(label.clone(), value.clone())],
            _ => Vec::new(),
        }
    }
}

impl Entity for Profile {
    type Delta = ProfileDelta;

    fn construct(id: Id) -> Self {
        Self {
            id,
            version: VersionNumber::ZERO,
            name: String::new(),
            score: 0,
            email: None,
        }
    }

    fn id(&self) -> Id {
        self.id
    }

    fn version(&self) -> VersionNumber {
        self.version
    }

    fn with_version(mut self, version: VersionNumber) -> Self {
        self.version = version;
        self
    }
}

pub fn register(name: &str) -> ProfileDelta {
    ProfileDelta::Register {
        name: name.to_string(),
    }
}

pub fn set_email(email: &str) -> ProfileDelta {
    ProfileDelta::SetEmail {
        email: email.to_string(),
    }
}

pub fn add_score(amount: i64) -> ProfileDelta {
    ProfileDelta::AddScore { amount }
}

pub fn label(label: &str, value: &str) -> ProfileDelta {
    ProfileDelta::Label {
        label: label.to_string(),
        value: value.to_string(),
    }
}

pub fn unlabel(label: &str, value: &str) -> ProfileDelta {
    ProfileDelta::Unlabel {
        label: label.to_string(),
        value: value.to_string(),
    }
}

pub fn store() -> MemoryStore<Profile> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    MemoryStore::new()
}

/// Repository over one store handle, without snapshot acceleration.
pub fn repository(store: &MemoryStore<Profile>) -> Repository<Profile> {
    Repository::new(Arc::new(store.clone()), Arc::new(store.clone()))
}

/// Repository over one store handle, with snapshot acceleration.
pub fn repository_with_snapshots(
    store: &MemoryStore<Profile>,
    strategy: Arc<dyn SnapshotStrategy<Profile>>,
) -> Repository<Profile> {
    repository(store).with_snapshots(Arc::new(store.clone()), strategy)
}
