//! Contract Test: Commit Gating
//!
//! Constraints verified:
//! - The new address is committed only when no domain failed
//! - A skipped commit means the next run retries every domain
//! - An address lookup failure aborts before any provider call
//! - A commit failure is reported, not swallowed
//! - The strict absence policy also withholds the commit on missing zones/records
//!
//! If this test fails, a failed domain can be silently left stale forever.

mod common;

use common::*;
use dnsync_core::config::AbsencePolicy;
use dnsync_core::engine::EngineEvent;
use dnsync_core::{DdnsEngine, DomainOutcome, Error, PassState};
use std::sync::Arc;

#[tokio::test]
async fn failed_domain_withholds_commit() {
    let provider = FakeProvider::new().failing_updates_for("example.org");
    let store = RecordingStateStore::with_address(addr("198.51.100.1"));

    let (engine, mut events) = DdnsEngine::new(
        Box::new(ScriptedAddressSource::new(addr("203.0.113.7"))),
        Arc::new(provider.clone()),
        Box::new(store.clone()),
        config_for(&["example.com", "example.org"]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_once().await.expect("pass completes");

    assert!(!report.result.should_commit);
    assert!(report.has_failures());
    assert_eq!(report.state, PassState::CommitSkipped);
    assert_eq!(store.commit_count(), 0);
    assert_eq!(store.last().await, Some(addr("198.51.100.1")));

    drop(engine);
    let mut decided = None;
    while let Some(event) = events.recv().await {
        assert!(!matches!(event, EngineEvent::AddressCommitted { .. }));
        if let EngineEvent::PassDecided {
            should_commit,
            failed_domains,
            ..
        } = event
        {
            decided = Some((should_commit, failed_domains));
        }
    }
    assert_eq!(decided, Some((false, vec!["example.org".to_string()])));
}

#[tokio::test]
async fn skipped_commit_is_retried_next_run() {
    let provider = FakeProvider::new().failing_updates_for("example.org");
    let store = RecordingStateStore::with_address(addr("198.51.100.1"));

    let (engine, _events) = DdnsEngine::new(
        Box::new(ScriptedAddressSource::new(addr("203.0.113.7"))),
        Arc::new(provider.clone()),
        Box::new(store.clone()),
        config_for(&["example.com", "example.org"]),
    )
    .expect("engine construction succeeds");

    engine.run_once().await.expect("first pass completes");
    assert_eq!(store.commit_count(), 0);
    assert_eq!(provider.update_calls(), 2);

    provider.heal("example.org");
    let report = engine.run_once().await.expect("second pass completes");

    // Both domains are reconciled again, the healthy one included
    assert!(!report.result.no_update_needed);
    assert_eq!(provider.update_calls(), 4);
    assert!(report.result.should_commit);
    assert_eq!(store.commit_count(), 1);
    assert_eq!(store.last().await, Some(addr("203.0.113.7")));
}

#[tokio::test]
async fn address_lookup_failure_aborts_before_provider_calls() {
    let provider = FakeProvider::new();
    let store = RecordingStateStore::with_address(addr("198.51.100.1"));

    let (engine, _events) = DdnsEngine::new(
        Box::new(ScriptedAddressSource::failing()),
        Arc::new(provider.clone()),
        Box::new(store.clone()),
        config_for(&["example.com"]),
    )
    .expect("engine construction succeeds");

    let err = engine.run_once().await.expect_err("lookup failure aborts");

    assert!(matches!(err, Error::AddressLookup(_)), "got {:?}", err);
    assert_eq!(provider.total_calls(), 0);
    assert_eq!(store.load_count(), 0);
    assert_eq!(store.commit_count(), 0);
}

#[tokio::test]
async fn commit_failure_surfaces_as_state_store_error() {
    let provider = FakeProvider::new();
    let store = RecordingStateStore::new();
    store.fail_commits();

    let (engine, _events) = DdnsEngine::new(
        Box::new(ScriptedAddressSource::new(addr("203.0.113.7"))),
        Arc::new(provider.clone()),
        Box::new(store.clone()),
        config_for(&["example.com"]),
    )
    .expect("engine construction succeeds");

    let err = engine.run_once().await.expect_err("commit failure is reported");

    assert!(matches!(err, Error::StateStore(_)), "got {:?}", err);
    assert_eq!(provider.update_calls(), 1, "DNS was already updated");
    assert_eq!(store.last().await, None);
}

#[tokio::test]
async fn strict_policy_withholds_commit_on_absence() {
    let provider = FakeProvider::new()
        .without_zone("example.org")
        .with_records("example.net", 0);
    let store = RecordingStateStore::new();

    let mut config = config_for(&["example.com", "example.org", "example.net"]);
    config.engine.absence_policy = AbsencePolicy::Strict;

    let (engine, _events) = DdnsEngine::new(
        Box::new(ScriptedAddressSource::new(addr("203.0.113.7"))),
        Arc::new(provider.clone()),
        Box::new(store.clone()),
        config,
    )
    .expect("engine construction succeeds");

    let report = engine.run_once().await.expect("pass completes");

    let outcomes: Vec<_> = report.result.outcomes.iter().map(|r| &r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            &DomainOutcome::Updated(1),
            &DomainOutcome::NoZoneFound,
            &DomainOutcome::NoRecordsFound,
        ]
    );
    assert!(!report.result.should_commit);
    assert!(!report.has_failures());
    assert_eq!(store.commit_count(), 0);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_any_io() {
    let provider = FakeProvider::new();
    let source = ScriptedAddressSource::new(addr("203.0.113.7"));

    let result = DdnsEngine::new(
        Box::new(source.clone()),
        Arc::new(provider.clone()),
        Box::new(RecordingStateStore::new()),
        config_for(&[]),
    );

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(source.call_count(), 0);
    assert_eq!(provider.total_calls(), 0);
}
