//! The engine facade: collaborators wired together behind one handle.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cinnabar_core::error::{CinnabarError, Result};
use cinnabar_core::reduce::reconstruct_from;
use cinnabar_core::traits::{
    AllowAll, AuthorizationOracle, CommitSink, Entity, HistorySource, SnapshotNever,
    SnapshotSource, SnapshotStrategy,
};
use cinnabar_core::types::{AgentSignature, Id, Transaction, VersionNumber};
use cinnabar_core::CommitOptions;

use crate::commit::commit_with_retry;
use crate::snapshot::refresh_snapshots;
use crate::staging::SourceBuilder;

/// One handle over a storage backend's collaborator surfaces.
///
/// Wire it once, then hand out clones of the `Arc`ed collaborators through
/// [`builder`](Repository::builder), snapshot-accelerated one-shot reads
/// through [`load`](Repository::load), and retry-bounded commits (with
/// snapshot refresh on success) through [`commit`](Repository::commit).
pub struct Repository<E: Entity> {
    history: Arc<dyn HistorySource<E>>,
    snapshots: Option<Arc<dyn SnapshotSource<E>>>,
    sink: Arc<dyn CommitSink<E::Delta>>,
    strategy: Arc<dyn SnapshotStrategy<E>>,
    authorizer: Arc<dyn AuthorizationOracle<E>>,
    options: CommitOptions,
}

impl<E: Entity> Repository<E> {
    pub fn new(history: Arc<dyn HistorySource<E>>, sink: Arc<dyn CommitSink<E::Delta>>) -> Self {
        Self {
            history,
            snapshots: None,
            sink,
            strategy: Arc::new(SnapshotNever),
            authorizer: Arc::new(AllowAll),
            options: CommitOptions::default(),
        }
    }

    /// Enable snapshot acceleration (and post-commit snapshot refresh).
    pub fn with_snapshots(
        mut self,
        snapshots: Arc<dyn SnapshotSource<E>>,
        strategy: Arc<dyn SnapshotStrategy<E>>,
    ) -> Self {
        self.snapshots = Some(snapshots);
        self.strategy = strategy;
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn AuthorizationOracle<E>>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_commit_options(mut self, options: CommitOptions) -> Self {
        self.options = options;
        self
    }

    /// A fresh staging session for one logical unit of work.
    pub fn builder(&self, agent: AgentSignature) -> SourceBuilder<E> {
        SourceBuilder::with_authorizer(agent, Arc::clone(&self.authorizer))
    }

    /// Load an entity into a staging session in one call.
    pub async fn load_into(
        &self,
        builder: &mut SourceBuilder<E>,
        entity_id: Id,
        cancel: &CancellationToken,
    ) -> Result<()> {
        builder
            .load(
                entity_id,
                self.history.as_ref(),
                self.snapshots.as_deref(),
                cancel,
            )
            .await
    }

    /// Snapshot-accelerated one-shot read of an entity's current state.
    ///
    /// Fails with [`CinnabarError::EntityNotCreated`] when nothing has ever
    /// been recorded for the id.
    pub async fn load(&self, entity_id: Id, cancel: &CancellationToken) -> Result<E> {
        let base = match &self.snapshots {
            Some(source) => source.get_latest(entity_id, cancel).await?,
            None => None,
        };
        let (state, after) = match base {
            Some((state, version)) => (state.with_version(version), version),
            None => (E::construct(entity_id), VersionNumber::ZERO),
        };

        let deltas = self.history.fetch_deltas(entity_id, after, cancel).await?;
        let state = reconstruct_from(state, deltas)?;
        if state.version().is_unconstructed() {
            return Err(CinnabarError::EntityNotCreated(entity_id));
        }
        Ok(state)
    }

    /// Commit a built transaction within the configured retry budget; on
    /// success, refresh snapshots for every touched entity.
    ///
    /// `Ok(false)` means the sink rejected the transaction (version conflict
    /// or lease collision); reload and restage to retry meaningfully.
    /// Snapshots are acceleration state only: a refresh failure after a
    /// landed commit is logged, and the commit still reports `Ok(true)`.
    pub async fn commit(
        &self,
        transaction: &Transaction<E::Delta>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let committed =
            commit_with_retry(self.sink.as_ref(), transaction, &self.options, cancel).await?;

        if committed {
            if let Some(snapshots) = &self.snapshots {
                if let Err(err) = refresh_snapshots(
                    transaction,
                    self.history.as_ref(),
                    snapshots.as_ref(),
                    self.strategy.as_ref(),
                    cancel,
                )
                .await
                {
                    tracing::warn!(
                        transaction_id = %transaction.id,
                        error = %err,
                        "snapshot refresh failed after a committed transaction"
                    );
                }
            }
        }
        Ok(committed)
    }
}
