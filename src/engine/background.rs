//! Background maintenance loop.
//!
//! Started once per engine. Every tick it hands at most one queued
//! [`BackgroundThought`] to the worker pool, then runs a maintenance pass
//! (blocker scan, connection discovery, context maintenance). The loop ends
//! when the enable flag is cleared or the shutdown signal fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Notify, Semaphore};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::core::EngineCore;
use crate::heuristics::perspective_content;
use crate::storage::{EntityStore, ThoughtId, ThoughtType};

/// Work submitted to the background loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackgroundThought {
    /// Link two existing thoughts.
    Connection { from: ThoughtId, to: ThoughtId },
    /// Grow an optimization child under an existing thought.
    Optimization { thought_id: ThoughtId },
}

impl BackgroundThought {
    /// Get the request kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            BackgroundThought::Connection { .. } => "connection",
            BackgroundThought::Optimization { .. } => "optimization",
        }
    }
}

/// Apply one background request. Returns false when it referenced unknown
/// thoughts or changed nothing.
pub(crate) fn handle_background_thought(store: &mut EntityStore, request: &BackgroundThought) -> bool {
    match request {
        BackgroundThought::Connection { from, to } => store.connect(from, to),
        BackgroundThought::Optimization { thought_id } => {
            let Some(target) = store.thought(thought_id) else {
                debug!(thought_id = %thought_id, "Optimization target missing, skipping");
                return false;
            };
            let content = perspective_content(ThoughtType::Optimization, &target.content);
            let context = target.context.clone();
            let depth = target.depth + 1;

            let child = store.create_thought(
                ThoughtType::Optimization,
                content,
                &context,
                depth,
                Some(thought_id),
            );
            store.add_child(thought_id, &child)
        }
    }
}

/// Run until `enabled` is cleared or `shutdown` is notified.
pub(crate) async fn thinking_loop(
    core: EngineCore,
    mut queue: UnboundedReceiver<BackgroundThought>,
    workers: Arc<Semaphore>,
    enabled: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let period = core.config().engine.tick_interval();
    // First pass one period after start, not immediately.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        tick_ms = core.config().engine.tick_interval_ms,
        workers = workers.available_permits(),
        "Thinking loop started"
    );

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => {
                debug!("Thinking loop received shutdown signal");
                break;
            }

            _ = interval.tick() => {
                if !enabled.load(Ordering::SeqCst) {
                    break;
                }
                ticks += 1;
                dispatch_one(&core, &mut queue, &workers);
                core.maintain().await;
            }
        }
    }

    enabled.store(false, Ordering::SeqCst);
    info!(ticks = ticks, "Thinking loop stopped");
}

/// Drain at most one request without waiting and hand it to a worker.
fn dispatch_one(
    core: &EngineCore,
    queue: &mut UnboundedReceiver<BackgroundThought>,
    workers: &Arc<Semaphore>,
) {
    let request = match queue.try_recv() {
        Ok(request) => request,
        Err(TryRecvError::Empty) => return,
        Err(TryRecvError::Disconnected) => {
            debug!("Background queue closed");
            return;
        }
    };

    let core = core.clone();
    let workers = Arc::clone(workers);
    tokio::spawn(async move {
        let Ok(_permit) = workers.acquire_owned().await else {
            debug!("Worker pool closed, dropping background thought");
            return;
        };
        let kind = request.kind();
        let applied = {
            let mut store = core.store().lock().await;
            handle_background_thought(&mut store, &request)
        };
        debug!(kind = kind, applied = applied, "Handled background thought");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EngineConfig};
    use crate::random::ConstantRandom;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_loop_exits_when_flag_cleared() {
        let config = Config {
            engine: EngineConfig {
                tick_interval_ms: 20,
                ..Default::default()
            },
            ..Default::default()
        };
        let core = EngineCore::new(config, Box::new(ConstantRandom(0.0)));
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let enabled = Arc::new(AtomicBool::new(true));
        // Never notified: only the flag can stop the loop.
        let shutdown = Arc::new(Notify::new());

        let handle = tokio::spawn(thinking_loop(
            core,
            rx,
            Arc::new(Semaphore::new(1)),
            Arc::clone(&enabled),
            Arc::clone(&shutdown),
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());

        enabled.store(false, Ordering::SeqCst);
        let joined = tokio::time::timeout(Duration::from_millis(500), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
        assert!(!enabled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_background_thought_serde_tag() {
        let request = BackgroundThought::Connection {
            from: "a".into(),
            to: "b".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"type": "connection", "from": "a", "to": "b"})
        );

        let parsed: BackgroundThought =
            serde_json::from_value(json!({"type": "optimization", "thought_id": "t"})).unwrap();
        assert_eq!(
            parsed,
            BackgroundThought::Optimization {
                thought_id: "t".into()
            }
        );
        assert_eq!(parsed.kind(), "optimization");
    }

    #[test]
    fn test_unknown_background_type_is_rejected() {
        let parsed = serde_json::from_value::<BackgroundThought>(json!({"type": "dream"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_connection_handler_links_known_thoughts() {
        let mut store = EntityStore::default();
        let a = store.create_thought(ThoughtType::Analysis, "a", "ctx", 0, None);
        let b = store.create_thought(ThoughtType::Analysis, "b", "ctx", 0, None);

        let request = BackgroundThought::Connection {
            from: a.clone(),
            to: b.clone(),
        };
        assert!(handle_background_thought(&mut store, &request));
        assert!(!handle_background_thought(&mut store, &request));
        assert!(store.thought(&b).unwrap().connections.contains(&a));

        let ghost = BackgroundThought::Connection {
            from: a,
            to: "ghost".into(),
        };
        assert!(!handle_background_thought(&mut store, &ghost));
    }

    #[test]
    fn test_optimization_handler_adds_child() {
        let mut store = EntityStore::default();
        let ctx = store.create_context("c", None);
        let target = store.create_thought(ThoughtType::ProblemSolving, "How to solve: x", &ctx, 2, None);

        let request = BackgroundThought::Optimization {
            thought_id: target.clone(),
        };
        assert!(handle_background_thought(&mut store, &request));

        let parent = store.thought(&target).unwrap();
        assert_eq!(parent.child_thoughts.len(), 1);
        let child = store.thought(&parent.child_thoughts[0]).unwrap();
        assert_eq!(child.thought_type, ThoughtType::Optimization);
        assert_eq!(child.content, "Optimizing: How to solve: x");
        assert_eq!(child.depth, 3);
        assert_eq!(child.context, ctx);
        assert_eq!(child.parent_thought.as_ref(), Some(&target));
    }

    #[test]
    fn test_optimization_handler_skips_unknown() {
        let mut store = EntityStore::default();
        let request = BackgroundThought::Optimization {
            thought_id: "ghost".into(),
        };
        assert!(!handle_background_thought(&mut store, &request));
        assert_eq!(store.thought_count(), 0);
    }
}
