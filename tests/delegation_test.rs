//! Delegation integration tests
//!
//! Cover task decomposition, round-robin assignment and the lifecycle of the
//! monitor spawned for each leadership context.

use std::time::Duration;

use deep_reasoner::config::{Config, EngineConfig};
use deep_reasoner::random::ConstantRandom;
use deep_reasoner::storage::{ContextStatus, WorkStatus};
use deep_reasoner::{MonitorOutcome, ThinkingEngine};
use pretty_assertions::assert_eq;
use serde_json::json;

fn engine(gate: f64) -> ThinkingEngine {
    let config = Config {
        engine: EngineConfig {
            tick_interval_ms: 60_000,
            monitor_interval_ms: 10,
            ..Default::default()
        },
        ..Default::default()
    };
    ThinkingEngine::with_random_source(config, Box::new(ConstantRandom(gate))).unwrap()
}

fn resources(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_lead_and_delegate_summary() {
    let engine = engine(0.0);
    let summary = engine
        .lead_and_delegate("ship release", &resources(&["alice", "bob"]))
        .await;

    assert_eq!(summary.task, "ship release");
    assert_eq!(summary.status, "leading");
    // Only the problem-solving perspective qualifies.
    assert_eq!(summary.work_items.len(), 1);
    assert!(summary.decomposition.is_some());

    let context = engine.context(&summary.context).await.unwrap();
    assert_eq!(context.name, "Leadership: ship release");

    let item = engine.work_item(&summary.work_items[0]).await.unwrap();
    assert_eq!(item.assigned_to.as_deref(), Some("alice"));
    assert_eq!(item.status, WorkStatus::InProgress);
    assert_eq!(item.context_id, summary.context);
    assert_eq!(
        item.description,
        "How to solve: Analyzing: How to break down: ship release"
    );

    assert_eq!(engine.active_monitors().await, 1);
    engine.cancel_all_monitors().await;
}

#[tokio::test]
async fn test_blocked_decomposition_delegates_round_robin() {
    let engine = engine(0.0);
    let summary = engine
        .lead_and_delegate("fix failed deploy", &resources(&["A", "B"]))
        .await;

    // Every perspective is a blocker and requires action.
    assert_eq!(summary.work_items.len(), 3);
    let assigned: Vec<_> = summary
        .work_items
        .iter()
        .map(|id| summary.delegation[id].as_str())
        .collect();
    assert_eq!(assigned, vec!["A", "B", "A"]);
    engine.cancel_all_monitors().await;
}

#[tokio::test]
async fn test_empty_resources_leave_items_pending() {
    let engine = engine(0.0);
    let summary = engine.lead_and_delegate("ship release", &[]).await;

    assert!(summary.delegation.is_empty());
    assert!(!summary.work_items.is_empty());
    for id in &summary.work_items {
        let item = engine.work_item(id).await.unwrap();
        assert!(item.assigned_to.is_none());
        assert_eq!(item.status, WorkStatus::Pending);
    }
    engine.cancel_all_monitors().await;
}

#[tokio::test]
async fn test_monitor_completes_context() {
    let engine = engine(0.0);
    let summary = engine
        .lead_and_delegate("fix failed deploy", &resources(&["A"]))
        .await;

    for id in &summary.work_items {
        assert!(engine.complete_work_item(id, json!({"ok": true})).await);
    }

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        engine.wait_for_monitor(&summary.context),
    )
    .await
    .unwrap();
    assert_eq!(outcome, Some(MonitorOutcome::Completed));

    let context = engine.context(&summary.context).await.unwrap();
    assert_eq!(context.status, ContextStatus::Completed);
    let item = engine.work_item(&summary.work_items[0]).await.unwrap();
    assert_eq!(item.result, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_monitor_unblocks_item_with_confident_chain() {
    // An open gate makes every unblock chain saturate the depth bonus (0.8).
    let engine = engine(1.0);
    let summary = engine.lead_and_delegate("ship release", &resources(&["A"])).await;
    let id = summary.work_items[0].clone();
    assert!(engine.set_work_item_status(&id, WorkStatus::Blocked).await);

    let resumed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if engine.work_item(&id).await.unwrap().status == WorkStatus::InProgress {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(resumed.is_ok());

    assert!(engine.cancel_monitor(&summary.context).await);
}

#[tokio::test]
async fn test_cancel_monitor() {
    let engine = engine(0.0);
    let first = engine.lead_and_delegate("task one", &[]).await;
    engine.lead_and_delegate("task two", &[]).await;
    assert_eq!(engine.active_monitors().await, 2);

    assert!(engine.cancel_monitor(&first.context).await);
    assert!(!engine.cancel_monitor(&first.context).await);
    assert_eq!(engine.active_monitors().await, 1);

    assert_eq!(engine.cancel_all_monitors().await, 1);
    assert_eq!(engine.active_monitors().await, 0);
}

#[tokio::test]
async fn test_engine_shutdown_does_not_stop_monitors() {
    let engine = engine(0.0);
    let summary = engine.lead_and_delegate("task", &[]).await;

    engine.shutdown().await.unwrap();
    assert!(!engine.is_thinking());
    assert_eq!(engine.active_monitors().await, 1);

    for id in &summary.work_items {
        engine.complete_work_item(id, json!(null)).await;
    }
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        engine.wait_for_monitor(&summary.context),
    )
    .await
    .unwrap();
    assert_eq!(outcome, Some(MonitorOutcome::Completed));
}
