//! Transaction staging: the mutable, in-process accumulator that turns
//! appended deltas into one immutable, atomic commit unit.
//!
//! A [`SourceBuilder`] tracks, per entity, the current reconstructed state
//! and the ordered list of pending steps. It is single-session state: one
//! logical unit of work (an HTTP request, a worker task) gets its own
//! builder; a builder must never be shared across concurrent callers.
//!
//! # Build policy
//!
//! [`SourceBuilder::build`] *drains* pending steps. Entities stay tracked at
//! their advanced versions, so further appends continue from where the last
//! build left off, and a second `build` without new appends yields a
//! transaction with no steps. Re-emitting the same steps is deliberately not
//! supported: two commits of the same steps would apply the same deltas
//! twice.
//!
//! # Example
//!
//! ```no_run
//! use cinnabar::prelude::*;
//! # use cinnabar_core::traits::{Delta, Entity};
//! # #[derive(Clone)]
//! # struct Account { id: Id, version: VersionNumber }
//! # struct Deposit(u64);
//! # impl Delta<Account> for Deposit {
//! #     fn reduce(&self, state: Account) -> Account { state }
//! # }
//! # impl Entity for Account {
//! #     type Delta = Deposit;
//! #     fn construct(id: Id) -> Self { Self { id, version: VersionNumber::ZERO } }
//! #     fn id(&self) -> Id { self.id }
//! #     fn version(&self) -> VersionNumber { self.version }
//! #     fn with_version(mut self, v: VersionNumber) -> Self { self.version = v; self }
//! # }
//! # fn main() -> Result<()> {
//! let mut builder: SourceBuilder<Account> =
//!     SourceBuilder::new(AgentSignature::system());
//! let account_id = Id::random();
//! builder.create(account_id, Deposit(100))?;
//! builder.append(account_id, Deposit(50))?;
//! let transaction = builder.build(Id::random());
//! assert_eq!(transaction.steps.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cinnabar_core::error::{CinnabarError, Result};
use cinnabar_core::observe;
use cinnabar_core::reduce::reconstruct_from;
use cinnabar_core::traits::{
    AllowAll, AuthorizationOracle, Delta, Entity, HistorySource, SnapshotSource,
};
use cinnabar_core::types::{
    AgentSignature, Id, TimeStamp, Transaction, TransactionStep, VersionNumber,
};

struct TrackedEntity<E: Entity> {
    state: E,
    pending: Vec<TransactionStep<E::Delta>>,
}

/// Mutable accumulator for one staging session.
pub struct SourceBuilder<E: Entity> {
    agent: AgentSignature,
    authorizer: Arc<dyn AuthorizationOracle<E>>,
    tracked: HashMap<Id, TrackedEntity<E>>,
    /// Entity ids in first-tracked order; `build` emits steps in this order.
    order: Vec<Id>,
}

impl<E: Entity> SourceBuilder<E> {
    /// Builder whose appends are always authorized.
    pub fn new(agent: AgentSignature) -> Self {
        Self::with_authorizer(agent, Arc::new(AllowAll))
    }

    /// Builder consulting an external authorization decision on every append.
    pub fn with_authorizer(
        agent: AgentSignature,
        authorizer: Arc<dyn AuthorizationOracle<E>>,
    ) -> Self {
        Self {
            agent,
            authorizer,
            tracked: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Begin tracking a brand-new entity at version 0 and stage its first
    /// delta.
    ///
    /// Fails with [`CinnabarError::EntityAlreadyTracked`] if the id is
    /// already tracked in this builder. A rejected first delta (denied
    /// authorization) leaves the builder unchanged, so the same id can be
    /// created again.
    pub fn create(&mut self, entity_id: Id, delta: E::Delta) -> Result<()> {
        if self.tracked.contains_key(&entity_id) {
            return Err(CinnabarError::EntityAlreadyTracked(entity_id));
        }
        self.track(entity_id, E::construct(entity_id));
        if let Err(err) = self.append(entity_id, delta) {
            self.untrack(entity_id);
            return Err(err);
        }
        Ok(())
    }

    /// Reconstruct an existing entity from storage and begin tracking it.
    ///
    /// Fetches the latest snapshot when `snapshots` is given, then all deltas
    /// strictly newer than the snapshot's version, and folds them. Fails with
    /// [`CinnabarError::EntityAlreadyTracked`] on double-load and with
    /// [`CinnabarError::EntityNotCreated`] when nothing has ever been
    /// recorded for the id.
    pub async fn load<H, S>(
        &mut self,
        entity_id: Id,
        history: &H,
        snapshots: Option<&S>,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        H: HistorySource<E> + ?Sized,
        S: SnapshotSource<E> + ?Sized,
    {
        if self.tracked.contains_key(&entity_id) {
            return Err(CinnabarError::EntityAlreadyTracked(entity_id));
        }

        let base = match snapshots {
            Some(source) => source.get_latest(entity_id, cancel).await?,
            None => None,
        };
        let (state, after) = match base {
            Some((state, version)) => (state.with_version(version), version),
            None => (E::construct(entity_id), VersionNumber::ZERO),
        };

        let deltas = history.fetch_deltas(entity_id, after, cancel).await?;
        let replayed = deltas.len();
        let state = reconstruct_from(state, deltas)?;
        if state.version().is_unconstructed() {
            return Err(CinnabarError::EntityNotCreated(entity_id));
        }

        tracing::debug!(
            entity_id = %entity_id,
            version = %state.version(),
            replayed_deltas = replayed,
            "loaded entity into staging session"
        );
        observe::record_load(replayed);

        self.track(entity_id, state);
        Ok(())
    }

    /// Stage one delta against a tracked entity.
    ///
    /// Consults the authorization oracle, computes the delta's lease/tag
    /// contributions against the current state, stages a step advancing the
    /// entity by exactly one version, and updates the tracked state.
    pub fn append(&mut self, entity_id: Id, delta: E::Delta) -> Result<()> {
        let entry = self
            .tracked
            .get_mut(&entity_id)
            .ok_or(CinnabarError::EntityNotTracked(entity_id))?;

        if !self
            .authorizer
            .is_authorized(&entry.state, &delta, &self.agent)
        {
            return Err(CinnabarError::NotAuthorized {
                entity_id,
                delta_type: delta.type_name(),
            });
        }

        let add_leases = delta.added_leases(&entry.state);
        let delete_leases = delta.deleted_leases(&entry.state);
        let add_tags = delta.added_tags(&entry.state);
        let delete_tags = delta.deleted_tags(&entry.state);

        let expected_previous_version = entry.state.version();
        let next_version = expected_previous_version.next();
        let next_state = delta.reduce(entry.state.clone()).with_version(next_version);

        entry.pending.push(TransactionStep {
            entity_id,
            expected_previous_version,
            next_version,
            delta,
            add_leases,
            delete_leases,
            add_tags,
            delete_tags,
        });
        entry.state = next_state;
        Ok(())
    }

    /// Emit the staged work as one immutable commit unit, signed with the
    /// builder's agent and timestamped now.
    ///
    /// Pending steps are drained (see the module docs for the policy).
    pub fn build(&mut self, transaction_id: Id) -> Transaction<E::Delta> {
        let mut steps = Vec::new();
        for id in &self.order {
            if let Some(entry) = self.tracked.get_mut(id) {
                steps.append(&mut entry.pending);
            }
        }
        Transaction {
            id: transaction_id,
            timestamp: TimeStamp::now(),
            agent: self.agent.clone(),
            steps,
        }
    }

    /// Whether an entity is tracked by this session.
    pub fn is_tracked(&self, entity_id: Id) -> bool {
        self.tracked.contains_key(&entity_id)
    }

    /// The tracked (staged, not yet committed) state of an entity.
    pub fn state(&self, entity_id: Id) -> Option<&E> {
        self.tracked.get(&entity_id).map(|t| &t.state)
    }

    /// The version the entity will reach if the staged work commits.
    pub fn version(&self, entity_id: Id) -> Option<VersionNumber> {
        self.state(entity_id).map(Entity::version)
    }

    fn track(&mut self, entity_id: Id, state: E) {
        self.tracked.insert(
            entity_id,
            TrackedEntity {
                state,
                pending: Vec::new(),
            },
        );
        self.order.push(entity_id);
    }

    fn untrack(&mut self, entity_id: Id) {
        self.tracked.remove(&entity_id);
        self.order.retain(|id| *id != entity_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinnabar_core::types::{Lease, Tag};

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: Id,
        version: VersionNumber,
        balance: i64,
        owner: Option<String>,
    }

    #[derive(Debug, Clone)]
    enum AccountDelta {
        Open { owner: String },
        Deposit(i64),
        Withdraw(i64),
    }

    impl Delta<Account> for AccountDelta {
        fn reduce(&self, mut state: Account) -> Account {
            match self {
                AccountDelta::Open { owner } => state.owner = Some(owner.clone()),
                AccountDelta::Deposit(amount) => state.balance += amount,
                AccountDelta::Withdraw(amount) => state.balance -= amount,
            }
            state
        }

        fn added_leases(&self, state: &Account) -> Vec<Lease> {
            match self {
                AccountDelta::Open { owner } => {
                    vec![Lease::new("accounts", "owner", owner.clone())]
                }
                _ => {
                    let _ = state;
                    Vec::new()
                }
            }
        }

        fn added_tags(&self, _state: &Account) -> Vec<Tag> {
            match self {
                AccountDelta::Deposit(amount) => {
                    vec![Tag::new("deposit", amount.to_string())]
                }
                _ => Vec::new(),
            }
        }
    }

    impl Entity for Account {
        type Delta = AccountDelta;

        fn construct(id: Id) -> Self {
            Self {
                id,
                version: VersionNumber::ZERO,
                balance: 0,
                owner: None,
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

    struct DenyWithdrawals;

    impl AuthorizationOracle<Account> for DenyWithdrawals {
        fn is_authorized(
            &self,
            _state: &Account,
            delta: &AccountDelta,
            _agent: &AgentSignature,
        ) -> bool {
            !matches!(delta, AccountDelta::Withdraw(_))
        }
    }

    fn open(owner: &str) -> AccountDelta {
        AccountDelta::Open {
            owner: owner.to_string(),
        }
    }

    #[test]
    fn create_stages_the_first_delta_at_version_one() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let id = Id::random();
        builder.create(id, open("ada")).unwrap();

        assert_eq!(builder.version(id), Some(VersionNumber::new(1)));
        let tx = builder.build(Id::random());
        assert_eq!(tx.steps.len(), 1);
        assert_eq!(tx.steps[0].expected_previous_version, VersionNumber::ZERO);
        assert_eq!(tx.steps[0].next_version, VersionNumber::new(1));
        assert_eq!(
            tx.steps[0].add_leases,
            vec![Lease::new("accounts", "owner", "ada")]
        );
    }

    #[test]
    fn create_twice_is_rejected() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let id = Id::random();
        builder.create(id, open("ada")).unwrap();
        let err = builder.create(id, open("ada")).unwrap_err();
        assert!(matches!(err, CinnabarError::EntityAlreadyTracked(e) if e == id));
    }

    #[test]
    fn append_to_untracked_entity_is_rejected() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let id = Id::random();
        let err = builder.append(id, AccountDelta::Deposit(5)).unwrap_err();
        assert!(matches!(err, CinnabarError::EntityNotTracked(e) if e == id));
    }

    #[test]
    fn versions_are_monotonic_and_steps_span_one_version_each() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let id = Id::random();
        builder.create(id, open("ada")).unwrap();
        for i in 0..5 {
            builder.append(id, AccountDelta::Deposit(i)).unwrap();
        }

        assert_eq!(builder.version(id), Some(VersionNumber::new(6)));
        let tx = builder.build(Id::random());
        assert_eq!(tx.steps.len(), 6);
        for step in &tx.steps {
            assert_eq!(
                step.next_version,
                step.expected_previous_version.next(),
                "every step advances by exactly one version"
            );
        }
    }

    #[test]
    fn unauthorized_append_fails_and_stages_nothing() {
        let mut builder = SourceBuilder::<Account>::with_authorizer(
            AgentSignature::system(),
            Arc::new(DenyWithdrawals),
        );
        let id = Id::random();
        builder.create(id, open("ada")).unwrap();
        builder.append(id, AccountDelta::Deposit(10)).unwrap();

        let err = builder.append(id, AccountDelta::Withdraw(5)).unwrap_err();
        assert!(matches!(err, CinnabarError::NotAuthorized { .. }));

        // The denied delta neither advanced the version nor staged a step.
        assert_eq!(builder.version(id), Some(VersionNumber::new(2)));
        assert_eq!(builder.state(id).unwrap().balance, 10);
        assert_eq!(builder.build(Id::random()).steps.len(), 2);
    }

    #[test]
    fn denied_create_leaves_the_builder_unchanged() {
        let mut builder = SourceBuilder::<Account>::with_authorizer(
            AgentSignature::system(),
            Arc::new(DenyWithdrawals),
        );
        let id = Id::random();

        let err = builder.create(id, AccountDelta::Withdraw(5)).unwrap_err();
        assert!(matches!(err, CinnabarError::NotAuthorized { .. }));
        assert!(!builder.is_tracked(id));
        assert!(builder.build(Id::random()).steps.is_empty());

        // The id is free again; an authorized create succeeds.
        builder.create(id, open("ada")).unwrap();
        assert_eq!(builder.version(id), Some(VersionNumber::new(1)));
    }

    #[test]
    fn build_drains_pending_steps() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let id = Id::random();
        builder.create(id, open("ada")).unwrap();

        let first = builder.build(Id::random());
        assert_eq!(first.steps.len(), 1);

        let second = builder.build(Id::random());
        assert!(second.steps.is_empty());

        // The entity stays tracked; later appends continue from version 1.
        builder.append(id, AccountDelta::Deposit(3)).unwrap();
        let third = builder.build(Id::random());
        assert_eq!(third.steps.len(), 1);
        assert_eq!(
            third.steps[0].expected_previous_version,
            VersionNumber::new(1)
        );
    }

    #[test]
    fn steps_are_ordered_by_first_tracked_entity_then_append_order() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let a = Id::random();
        let b = Id::random();
        builder.create(a, open("ada")).unwrap();
        builder.create(b, open("brin")).unwrap();
        builder.append(a, AccountDelta::Deposit(1)).unwrap();
        builder.append(b, AccountDelta::Deposit(2)).unwrap();
        builder.append(a, AccountDelta::Deposit(3)).unwrap();

        let tx = builder.build(Id::random());
        let entities: Vec<Id> = tx.steps.iter().map(|s| s.entity_id).collect();
        assert_eq!(entities, vec![a, a, a, b, b]);
    }

    #[test]
    fn tag_facets_flow_into_steps() {
        let mut builder = SourceBuilder::<Account>::new(AgentSignature::system());
        let id = Id::random();
        builder.create(id, open("ada")).unwrap();
        builder.append(id, AccountDelta::Deposit(42)).unwrap();

        let tx = builder.build(Id::random());
        assert_eq!(tx.steps[1].add_tags, vec![Tag::new("deposit", "42")]);
        assert!(tx.steps[1].add_leases.is_empty());
    }
}
