//! Bounded-retry commit against any [`CommitSink`].
//!
//! The sink's boolean result is the concurrency-rejection channel; this
//! helper only re-drives the whole check-and-write cycle within the caller's
//! budget. Retrying the *same* staged transaction only absorbs transient
//! adapter races: a genuine lost race needs a reload-and-restage by the
//! caller, which is out of this helper's hands.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use cinnabar_core::error::Result;
use cinnabar_core::observe;
use cinnabar_core::traits::CommitSink;
use cinnabar_core::types::Transaction;
use cinnabar_core::CommitOptions;

/// Commit `transaction` through `sink`, attempting at most
/// `options.max_attempts` times.
///
/// Returns the sink's final verdict: `Ok(true)` committed, `Ok(false)`
/// rejected on every attempt. Storage faults and cancellation surface as
/// errors immediately, without consuming further attempts.
pub async fn commit_with_retry<D, S>(
    sink: &S,
    transaction: &Transaction<D>,
    options: &CommitOptions,
    cancel: &CancellationToken,
) -> Result<bool>
where
    D: Send + Sync,
    S: CommitSink<D> + ?Sized,
{
    let attempts = options.max_attempts.max(1);
    let started = Instant::now();

    for attempt in 1..=attempts {
        let committed = sink.commit(transaction, cancel).await?;
        if committed {
            observe::record_commit(started.elapsed(), true);
            return Ok(true);
        }

        if attempt < attempts {
            tracing::debug!(
                transaction_id = %transaction.id,
                attempt,
                max_attempts = attempts,
                "commit rejected, retrying"
            );
            if options.retry_backoff_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.retry_backoff_ms)).await;
            }
        }
    }

    observe::record_commit(started.elapsed(), false);
    tracing::warn!(
        transaction_id = %transaction.id,
        attempts,
        "commit rejected after exhausting retry budget"
    );
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use cinnabar_core::types::{AgentSignature, Id, TimeStamp};

    /// Sink that rejects the first `reject_first` commits, then accepts.
    struct FlakySink {
        reject_first: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CommitSink<&'static str> for FlakySink {
        async fn commit(
            &self,
            _transaction: &Transaction<&'static str>,
            _cancel: &CancellationToken,
        ) -> Result<bool> {
            let seen = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(seen >= self.reject_first)
        }
    }

    fn empty_transaction() -> Transaction<&'static str> {
        Transaction {
            id: Id::random(),
            timestamp: TimeStamp::now(),
            agent: AgentSignature::system(),
            steps: Vec::new(),
        }
    }

    #[tokio::test]
    async fn succeeds_within_budget() {
        let sink = FlakySink {
            reject_first: 2,
            calls: AtomicU32::new(0),
        };
        let options = CommitOptions::new().with_max_attempts(3);
        let committed =
            commit_with_retry(&sink, &empty_transaction(), &options, &CancellationToken::new())
                .await
                .unwrap();
        assert!(committed);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_exceeds_the_budget() {
        let sink = FlakySink {
            reject_first: 10,
            calls: AtomicU32::new(0),
        };
        let options = CommitOptions::new().with_max_attempts(2);
        let committed =
            commit_with_retry(&sink, &empty_transaction(), &options, &CancellationToken::new())
                .await
                .unwrap();
        assert!(!committed);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }
}
