//! Contract Test: Change Detection
//!
//! Constraints verified:
//! - Persisted IP equal to discovered IP: no write, no reconciliation
//! - Never persisted: the first observation always reconciles
//! - Discovery failure: no write, no reconciliation, the cycle fails
//! - Persisting happens before reconciliation by default, and a failed
//!   write abandons the cycle before any provider call
//!
//! If this test fails, the scheduler's state machine is broken.

mod common;

use common::*;
use zoneddns_core::engine::{CycleOutcome, EngineEvent, SubdomainOutcome};
use zoneddns_core::traits::RecordPayload;
use zoneddns_core::{DdnsEngine, Error, PublicIp};

#[tokio::test]
async fn unchanged_ip_skips_write_and_reconciliation() {
    let provider = RecordingProvider::new();
    let state_store = CountingStateStore::with_ip("1.2.3.4");

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::fixed("1.2.3.4")),
        Box::new(state_store.clone()),
        registry_with(&provider),
        config_with(&["home"]),
    )
    .unwrap();

    let outcome = engine.run_cycle().await.unwrap();

    assert_eq!(
        outcome,
        CycleOutcome::Unchanged {
            ip: PublicIp::new("1.2.3.4")
        }
    );
    assert_eq!(state_store.save_count(), 0, "no persistence write");
    assert!(provider.calls().is_empty(), "no reconciliation call");
    assert_eq!(
        event_rx.try_recv().unwrap(),
        EngineEvent::IpUnchanged {
            ip: PublicIp::new("1.2.3.4")
        }
    );
}

#[tokio::test]
async fn never_persisted_creates_record_and_persists() {
    let provider = RecordingProvider::new();
    let state_store = CountingStateStore::new();

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::fixed("9.9.9.9")),
        Box::new(state_store.clone()),
        registry_with(&provider),
        config_with(&["home"]),
    )
    .unwrap();

    let outcome = engine.run_cycle().await.unwrap();

    assert_eq!(state_store.current().await, Some(PublicIp::new("9.9.9.9")));

    let mutations: Vec<_> = provider
        .calls()
        .into_iter()
        .filter(|c| c.is_mutation())
        .collect();
    assert_eq!(
        mutations,
        vec![ProviderCall::Create {
            zone_id: "zone-example-com".to_string(),
            payload: RecordPayload::address("home.example.com", "9.9.9.9"),
        }]
    );

    match outcome {
        CycleOutcome::Changed {
            previous,
            current,
            report,
        } => {
            assert_eq!(previous, None);
            assert_eq!(current, PublicIp::new("9.9.9.9"));
            assert_eq!(report.created(), 1);
            assert_eq!(report.entries[0].full_name, "home.example.com");
        }
        other => panic!("expected Changed, got {:?}", other),
    }

    assert_eq!(
        event_rx.try_recv().unwrap(),
        EngineEvent::IpChanged {
            previous: None,
            current: PublicIp::new("9.9.9.9"),
        }
    );
    assert_eq!(
        event_rx.try_recv().unwrap(),
        EngineEvent::RecordCreated {
            record_name: "home.example.com".to_string(),
            ip: PublicIp::new("9.9.9.9"),
        }
    );
}

#[tokio::test]
async fn changed_ip_reports_previous_value() {
    let provider = RecordingProvider::new();
    let state_store = CountingStateStore::with_ip("1.2.3.4");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::fixed("5.6.7.8")),
        Box::new(state_store.clone()),
        registry_with(&provider),
        config_with(&["home"]),
    )
    .unwrap();

    match engine.run_cycle().await.unwrap() {
        CycleOutcome::Changed { previous, .. } => {
            assert_eq!(previous, Some(PublicIp::new("1.2.3.4")));
        }
        other => panic!("expected Changed, got {:?}", other),
    }
    assert_eq!(state_store.current().await, Some(PublicIp::new("5.6.7.8")));
}

#[tokio::test]
async fn discovery_failure_touches_nothing() {
    let provider = RecordingProvider::new();
    let state_store = CountingStateStore::with_ip("1.2.3.4");

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::failing("operation timed out")),
        Box::new(state_store.clone()),
        registry_with(&provider),
        config_with(&["home"]),
    )
    .unwrap();

    let result = engine.run_cycle().await;

    assert!(matches!(result, Err(Error::Network(_))));
    assert_eq!(state_store.save_count(), 0);
    assert_eq!(state_store.current().await, Some(PublicIp::new("1.2.3.4")));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn persistence_failure_abandons_cycle_before_reconciling() {
    let provider = RecordingProvider::new();
    let state_store = CountingStateStore::new();
    state_store.fail_saves(true);

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ScriptedIpSource::fixed("9.9.9.9")),
        Box::new(state_store.clone()),
        registry_with(&provider),
        config_with(&["home"]),
    )
    .unwrap();

    let result = engine.run_cycle().await;
    assert!(matches!(result, Err(Error::StateStore(_))));
    assert!(provider.calls().is_empty());

    // Storage recovers: the next tick still sees a change and reconciles
    state_store.fail_saves(false);
    let outcome = engine.run_cycle().await.unwrap();
    match outcome {
        CycleOutcome::Changed { report, .. } => {
            assert!(matches!(
                report.entries[0].outcome,
                SubdomainOutcome::Created { .. }
            ));
        }
        other => panic!("expected Changed, got {:?}", other),
    }
}
