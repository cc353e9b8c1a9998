//! Optimistic-concurrency tests: racing sessions, the boolean rejection
//! channel, and the reload-and-restage recovery path.

mod support;

use cinnabar::prelude::*;
use support::*;

async fn seed(repo: &Repository<Profile>, cancel: &CancellationToken) -> Id {
    let id = Id::random();
    let mut builder = repo.builder(AgentSignature::system());
    builder.create(id, register("ada")).unwrap();
    assert!(repo.commit(&builder.build(Id::random()), cancel).await.unwrap());
    id
}

#[tokio::test]
async fn exactly_one_of_two_racing_sessions_commits() {
    let store = store();
    let repo = repository(&store);
    let cancel = CancellationToken::new();
    let id = seed(&repo, &cancel).await;

    // Both sessions observe version 1 before either commits.
    let mut first = repo.builder(AgentSignature::system());
    repo.load_into(&mut first, id, &cancel).await.unwrap();
    let mut second = repo.builder(AgentSignature::system());
    repo.load_into(&mut second, id, &cancel).await.unwrap();

    first.append(id, add_score(10)).unwrap();
    second.append(id, add_score(20)).unwrap();

    assert!(repo.commit(&first.build(Id::random()), &cancel).await.unwrap());
    assert!(!repo.commit(&second.build(Id::random()), &cancel).await.unwrap());

    let profile = repo.load(id, &cancel).await.unwrap();
    assert_eq!(profile.version, VersionNumber::new(2));
    assert_eq!(profile.score, 10, "the losing session's delta never applied");
}

#[tokio::test]
async fn losing_session_recovers_by_reloading() {
    let store = store();
    let repo = repository(&store);
    let cancel = CancellationToken::new();
    let id = seed(&repo, &cancel).await;

    let mut stale = repo.builder(AgentSignature::system());
    repo.load_into(&mut stale, id, &cancel).await.unwrap();

    let mut winner = repo.builder(AgentSignature::system());
    repo.load_into(&mut winner, id, &cancel).await.unwrap();
    winner.append(id, add_score(10)).unwrap();
    assert!(repo.commit(&winner.build(Id::random()), &cancel).await.unwrap());

    stale.append(id, add_score(20)).unwrap();
    assert!(!repo.commit(&stale.build(Id::random()), &cancel).await.unwrap());

    // Fresh session over current state: the same logical change lands.
    let mut retry = repo.builder(AgentSignature::system());
    repo.load_into(&mut retry, id, &cancel).await.unwrap();
    retry.append(id, add_score(20)).unwrap();
    assert!(repo.commit(&retry.build(Id::random()), &cancel).await.unwrap());

    let profile = repo.load(id, &cancel).await.unwrap();
    assert_eq!(profile.version, VersionNumber::new(3));
    assert_eq!(profile.score, 30);
}

#[tokio::test]
async fn email_lease_is_exclusive_across_entities() {
    let store = store();
    let repo = repository(&store);
    let cancel = CancellationToken::new();

    let a = Id::random();
    let mut session = repo.builder(AgentSignature::system());
    session.create(a, register("ada")).unwrap();
    session.append(a, set_email("shared@example.com")).unwrap();
    assert!(repo.commit(&session.build(Id::random()), &cancel).await.unwrap());

    // A second entity claiming the same address is rejected wholesale.
    let b = Id::random();
    let mut session = repo.builder(AgentSignature::system());
    session.create(b, register("brin")).unwrap();
    session.append(b, set_email("shared@example.com")).unwrap();
    assert!(!repo.commit(&session.build(Id::random()), &cancel).await.unwrap());
    assert!(repo.load(b, &cancel).await.is_err(), "rejection wrote nothing");

    // After the holder releases, the address is claimable again.
    let mut session = repo.builder(AgentSignature::system());
    repo.load_into(&mut session, a, &cancel).await.unwrap();
    session.append(a, ProfileDelta::ClearEmail).unwrap();
    assert!(repo.commit(&session.build(Id::random()), &cancel).await.unwrap());

    let mut session = repo.builder(AgentSignature::system());
    session.create(b, register("brin")).unwrap();
    session.append(b, set_email("shared@example.com")).unwrap();
    assert!(repo.commit(&session.build(Id::random()), &cancel).await.unwrap());
}

#[tokio::test]
async fn changing_email_releases_the_old_lease() {
    let store = store();
    let repo = repository(&store);
    let cancel = CancellationToken::new();

    let a = Id::random();
    let mut session = repo.builder(AgentSignature::system());
    session.create(a, register("ada")).unwrap();
    session.append(a, set_email("old@example.com")).unwrap();
    assert!(repo.commit(&session.build(Id::random()), &cancel).await.unwrap());

    let mut session = repo.builder(AgentSignature::system());
    repo.load_into(&mut session, a, &cancel).await.unwrap();
    session.append(a, set_email("new@example.com")).unwrap();
    assert!(repo.commit(&session.build(Id::random()), &cancel).await.unwrap());

    assert!(store
        .lease_holder(&Lease::new("profiles", "email", "old@example.com"))
        .is_none());
    assert!(store
        .lease_holder(&Lease::new("profiles", "email", "new@example.com"))
        .is_some());
}

#[tokio::test]
async fn retry_budget_does_not_mask_a_real_conflict() {
    let store = store();
    let repo = repository(&store)
        .with_commit_options(CommitOptions::default().with_max_attempts(3));
    let cancel = CancellationToken::new();
    let id = seed(&repo, &cancel).await;

    let mut stale = repo.builder(AgentSignature::system());
    repo.load_into(&mut stale, id, &cancel).await.unwrap();

    let mut winner = repo.builder(AgentSignature::system());
    repo.load_into(&mut winner, id, &cancel).await.unwrap();
    winner.append(id, add_score(1)).unwrap();
    assert!(repo.commit(&winner.build(Id::random()), &cancel).await.unwrap());

    // The staged transaction stays stale no matter how often it is retried.
    stale.append(id, add_score(2)).unwrap();
    assert!(!repo.commit(&stale.build(Id::random()), &cancel).await.unwrap());
    assert_eq!(
        repo.load(id, &cancel).await.unwrap().version,
        VersionNumber::new(2)
    );
}
