use serde::{Deserialize, Serialize};

/// Caller-side commit budget.
///
/// Bounds how many times a whole check-and-write cycle may be attempted
/// against the sink; the budget is never exceeded and steps are never
/// partially applied across attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOptions {
    /// Maximum commit attempts, including the first.
    /// Default: 1 (no retries; callers reload and restage on conflict)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds.
    /// Default: 0
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    0
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl CommitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.retry_backoff_ms = ms;
        self
    }
}
