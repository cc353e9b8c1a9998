use serde::{Deserialize, Serialize};

/// Uniqueness-constrained metadata attribute.
///
/// At most one entity may hold a given `(scope, label, value)` triple at a
/// time; the storage adapter enforces this at commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lease {
    pub scope: String,
    pub label: String,
    pub value: String,
}

impl Lease {
    pub fn new(
        scope: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Searchable, non-unique metadata attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    pub value: String,
}

impl Tag {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Signature of the agent responsible for a committed transaction.
///
/// The payload is opaque to the engine; identity extraction is a collaborator
/// concern (HTTP layer, CLI, worker identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSignature {
    /// Discriminator for the signing mechanism ("user", "system", ...).
    pub kind: String,
    /// Mechanism-specific payload.
    pub data: serde_json::Value,
}

impl AgentSignature {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Signature for engine-internal activity.
    pub fn system() -> Self {
        Self {
            kind: "system".to_string(),
            data: serde_json::Value::Null,
        }
    }
}
