//! Optional metrics instrumentation for Cinnabar.
//!
//! When the `observe` feature is enabled, key operations emit counters and
//! histograms via the [`metrics`] crate; a downstream application must
//! install a recorder to collect them. Without the feature every function
//! here is a zero-cost no-op.

/// Record a commit attempt outcome.
///
/// - `cinnabar.commit.total` – counter with `outcome` label (`ok` / `conflict`)
/// - `cinnabar.commit.duration_seconds` – histogram of commit latency
#[inline]
pub fn record_commit(duration: std::time::Duration, committed: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if committed { "ok" } else { "conflict" };
        metrics::counter!("cinnabar.commit.total", "outcome" => outcome).increment(1);
        metrics::histogram!("cinnabar.commit.duration_seconds").record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, committed);
    }
}

/// Record a staged-entity load (replay window size after snapshot).
///
/// - `cinnabar.load.total` – counter
/// - `cinnabar.load.replayed_deltas` – histogram of deltas folded per load
#[inline]
pub fn record_load(replayed_deltas: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("cinnabar.load.total").increment(1);
        metrics::histogram!("cinnabar.load.replayed_deltas").record(replayed_deltas as f64);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = replayed_deltas;
    }
}

/// Record a written acceleration snapshot.
///
/// - `cinnabar.snapshot.writes_total` – counter
#[inline]
pub fn record_snapshot_write() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("cinnabar.snapshot.writes_total").increment(1);
    }
}
