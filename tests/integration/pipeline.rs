//! Integration tests for the driver → evaluator → hub pipeline
//!
//! These tests verify that:
//! - Raised alerts travel with the snapshot of the cycle that raised them
//! - Active flags follow the readings across cycles
//! - History stays bounded while the pipeline keeps running
//! - Subscribers come and go without disturbing each other

use std::time::Duration;

use pretty_assertions::assert_eq;
use syspulse::{
    Snapshot,
    actors::{driver::SamplingDriver, hub::HubHandle},
    alerts::{AlertKind, AlertLevel, MAX_HISTORY},
    config::HubConfig,
};

use crate::helpers::{ScriptedSampler, evaluator, hub_with_capacity, wait_for_clients};

fn decode(frame: &str) -> Snapshot {
    serde_json::from_str(frame).unwrap()
}

#[tokio::test]
async fn test_alert_lifecycle_across_cycles() {
    let evaluator = evaluator();
    let hub = HubHandle::spawn(&HubConfig::default());
    let mut subscription = hub.register().await;

    // warning, warning, cleared, critical
    let sampler = ScriptedSampler::cpu(&[85.0, 88.0, 40.0, 95.0]);
    let mut driver = SamplingDriver::new(
        sampler,
        evaluator.clone(),
        hub.clone(),
        Duration::from_millis(500),
    );

    let mut alerts_per_cycle = Vec::new();
    for _ in 0..4 {
        driver.run_cycle().await.unwrap();
        let frame = subscription.recv().await.unwrap();
        alerts_per_cycle.push(decode(&frame).alerts);
    }

    assert_eq!(alerts_per_cycle[0].len(), 1);
    assert_eq!(alerts_per_cycle[0][0].level, AlertLevel::Warning);
    assert_eq!(alerts_per_cycle[1].len(), 1);
    assert_eq!(alerts_per_cycle[1][0].level, AlertLevel::Warning);
    assert!(alerts_per_cycle[2].is_empty());
    assert_eq!(alerts_per_cycle[3].len(), 1);
    assert_eq!(alerts_per_cycle[3][0].level, AlertLevel::Critical);

    let history = evaluator.history().await;
    assert_eq!(history.alerts.len(), 3);
    assert!(history.alerts.iter().all(|alert| alert.active));
    assert_eq!(history.stats.active_alerts, 1);
    assert!(evaluator.is_active(AlertKind::Cpu).await);
}

#[tokio::test]
async fn test_history_bounded_while_running() {
    let evaluator = evaluator();
    let hub = HubHandle::spawn(&HubConfig::default());

    // every breaching cycle raises a new CPU alert
    let script: Vec<f64> = (0..MAX_HISTORY + 10).map(|i| 81.0 + i as f64 / 10.0).collect();
    let mut driver = SamplingDriver::new(
        ScriptedSampler::cpu(&script),
        evaluator.clone(),
        hub,
        Duration::from_millis(500),
    );

    for _ in 0..script.len() {
        driver.run_cycle().await.unwrap();
    }

    let history = evaluator.history().await;
    assert_eq!(history.alerts.len(), MAX_HISTORY);
    assert_eq!(history.stats.total_alerts, MAX_HISTORY);

    // the first ten readings were evicted
    let values: Vec<f64> = history.alerts.iter().map(|alert| alert.value).collect();
    assert_eq!(values, script[10..].to_vec());

    // ids are unique even within the same second
    let mut ids: Vec<_> = history.alerts.iter().map(|alert| alert.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), MAX_HISTORY);
}

#[tokio::test]
async fn test_all_subscribers_receive_same_order() {
    let hub = HubHandle::spawn(&HubConfig::default());
    let mut subscriptions = Vec::new();
    for _ in 0..5 {
        subscriptions.push(hub.register().await);
    }

    let script: Vec<f64> = (1..=10).map(f64::from).collect();
    let mut driver = SamplingDriver::new(
        ScriptedSampler::cpu(&script),
        evaluator(),
        hub.clone(),
        Duration::from_millis(500),
    );

    for _ in 0..script.len() {
        assert_eq!(driver.run_cycle().await.unwrap(), 5);
    }

    for subscription in &mut subscriptions {
        let mut seen = Vec::new();
        while let Some(frame) = subscription.try_recv() {
            seen.push(decode(&frame).cpu.usage);
        }
        assert_eq!(seen, script);
    }
}

#[tokio::test]
async fn test_departed_subscriber_does_not_affect_others() {
    let hub = HubHandle::spawn(&HubConfig::default());
    let mut staying = hub.register().await;
    let leaving = hub.register().await;

    let mut driver = SamplingDriver::new(
        ScriptedSampler::cpu(&[1.0, 2.0, 3.0]),
        evaluator(),
        hub.clone(),
        Duration::from_millis(500),
    );

    assert_eq!(driver.run_cycle().await.unwrap(), 2);
    drop(leaving);
    assert_eq!(driver.run_cycle().await.unwrap(), 1);
    assert_eq!(driver.run_cycle().await.unwrap(), 1);

    wait_for_clients(&hub, 1).await;

    let mut seen = Vec::new();
    while let Some(frame) = staying.try_recv() {
        seen.push(decode(&frame).cpu.usage);
    }
    assert_eq!(seen, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_stalled_subscriber_is_disconnected() {
    let hub = hub_with_capacity(2);
    let mut reader = hub.register().await;
    let stalled = hub.register().await;

    let mut driver = SamplingDriver::new(
        ScriptedSampler::cpu(&[1.0, 2.0, 3.0, 4.0]),
        evaluator(),
        hub.clone(),
        Duration::from_millis(500),
    );

    for expected in [1.0, 2.0, 3.0, 4.0] {
        driver.run_cycle().await.unwrap();
        let frame = reader.recv().await.unwrap();
        assert_eq!(decode(&frame).cpu.usage, expected);
    }

    // the stalled queue overflowed on the third frame
    assert_eq!(hub.active_count().await, 1);
    drop(stalled);
}

#[tokio::test]
async fn test_spawned_pipeline_streams_to_late_subscriber() {
    let hub = HubHandle::spawn(&HubConfig::default());
    let driver = SamplingDriver::new(
        ScriptedSampler::cpu(&[20.0]),
        evaluator(),
        hub.clone(),
        Duration::from_millis(20),
    );
    let task = driver.spawn();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut late = hub.register().await;

    let frame = tokio::time::timeout(Duration::from_secs(2), late.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decode(&frame).cpu.usage, 20.0);

    hub.shutdown().await;
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap();
}
