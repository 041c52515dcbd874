//! The continuous thinking engine.
//!
//! [`ThinkingEngine`] is the public handle. It owns the shared
//! [`EngineCore`], the background maintenance loop and the monitors spawned
//! for delegated work:
//!
//! - `expansion` - recursive thought expansion and alternative paths
//! - `context` - blocker scanning and context switching
//! - `connections` - similarity-based connection discovery
//! - `delegation` - task decomposition, delegation and monitoring
//! - `background` - the maintenance loop and background-thought handlers
//! - `patterns` - the problem-solving pattern library

mod background;
mod connections;
mod context;
mod core;
mod delegation;
mod expansion;
mod patterns;

pub use self::core::{EngineCore, MaintenanceReport};
pub use background::BackgroundThought;
pub use delegation::{
    LeadershipSummary, MonitorOutcome, DECOMPOSITION_DEPTH, LEADING_STATUS, UNBLOCK_CONFIDENCE,
    UNBLOCK_DEPTH,
};
pub use expansion::NO_CONCLUSION;
pub use patterns::ProblemPattern;

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ReasonerError, ReasonerResult};
use crate::heuristics::{breakdown_topic, leadership_context_name};
use crate::random::{source_for, RandomSource};
use crate::storage::{
    Context, ContextId, ContextSwitch, ReasoningChain, Thought, ThoughtId, WorkItem, WorkStatus,
};

/// How long shutdown waits for the background loop.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
/// Width of the rule under the graph header.
const GRAPH_RULE_WIDTH: usize = 50;
/// Characters of content shown per thought in the graph.
const GRAPH_PREVIEW_CHARS: usize = 40;

/// Point-in-time counters of the engine's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingStatus {
    /// Thoughts ever created.
    pub total_thoughts: usize,
    /// Thoughts in the recent window.
    pub active_thoughts: usize,
    /// Known contexts.
    pub contexts: usize,
    /// Registered reasoning chains.
    pub reasoning_chains: usize,
    /// Work items across all leadership contexts.
    pub work_items: usize,
    /// Thoughts promoted to blockers.
    pub blocked_paths: usize,
    /// Blockers with recorded alternatives.
    pub alternative_paths: usize,
    /// Adjacency entries; each link counts once per endpoint.
    pub thought_connections: usize,
    /// Context switches performed so far.
    pub context_switches: usize,
    /// Top of the context stack.
    pub current_context: Option<ContextId>,
}

struct MonitorHandle {
    cancel: Arc<Notify>,
    handle: JoinHandle<MonitorOutcome>,
}

/// Handle to a running thinking engine.
///
/// Construction spawns the background loop, so it must happen inside a
/// Tokio runtime. Dropping the handle stops the loop at its next tick;
/// [`ThinkingEngine::shutdown`] stops it and waits.
pub struct ThinkingEngine {
    core: EngineCore,
    background_tx: mpsc::UnboundedSender<BackgroundThought>,
    thinking_enabled: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    monitors: Mutex<HashMap<ContextId, MonitorHandle>>,
}

impl ThinkingEngine {
    /// Validate `config` and start an engine whose randomness follows
    /// `config.engine.seed`.
    pub fn new(config: Config) -> ReasonerResult<Self> {
        let random = source_for(config.engine.seed);
        Self::with_random_source(config, random)
    }

    /// Validate `config` and start an engine with an explicit randomness source.
    pub fn with_random_source(
        config: Config,
        random: Box<dyn RandomSource>,
    ) -> ReasonerResult<Self> {
        config.validate()?;

        let core = EngineCore::new(config, random);
        let (background_tx, background_rx) = mpsc::unbounded_channel();
        let thinking_enabled = Arc::new(AtomicBool::new(true));
        let shutdown_notify = Arc::new(Notify::new());
        let workers = Arc::new(Semaphore::new(core.config().thinking.parallel_thoughts));

        let handle = tokio::spawn(background::thinking_loop(
            core.clone(),
            background_rx,
            workers,
            Arc::clone(&thinking_enabled),
            Arc::clone(&shutdown_notify),
        ));

        info!(
            max_depth = core.config().thinking.max_depth,
            parallel_thoughts = core.config().thinking.parallel_thoughts,
            connection_threshold = core.config().thinking.connection_threshold,
            "Thinking engine started"
        );

        Ok(Self {
            core,
            background_tx,
            thinking_enabled,
            shutdown_notify,
            loop_handle: Mutex::new(Some(handle)),
            monitors: Mutex::new(HashMap::new()),
        })
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &Config {
        self.core.config()
    }

    /// Get a reference to the shared core.
    pub fn core(&self) -> &EngineCore {
        &self.core
    }

    // ========================================================================
    // Reasoning
    // ========================================================================

    /// Run one reasoning episode about `topic`.
    ///
    /// An absent or unknown `context` is replaced by a new context named
    /// after the topic. `depth` above `thinking.max_depth` is clamped.
    pub async fn think_about(
        &self,
        topic: &str,
        context: Option<&str>,
        depth: usize,
    ) -> ReasoningChain {
        self.core.think_about(topic, context, depth).await
    }

    /// Materialize a problem-solving pattern as thoughts and return their ids.
    pub async fn apply_pattern(
        &self,
        pattern: ProblemPattern,
        problem: &str,
        context: Option<&str>,
    ) -> Vec<ThoughtId> {
        let mut store = self.core.store().lock().await;
        patterns::apply_pattern(&mut store, pattern, problem, context)
    }

    /// Mark a thought resolved so it no longer counts as a blocker.
    pub async fn resolve_thought(&self, thought_id: &str) -> bool {
        let mut store = self.core.store().lock().await;
        match store.thought_mut(thought_id) {
            Some(thought) => {
                thought.resolved = true;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Leadership and delegation
    // ========================================================================

    /// Decompose `task`, delegate the resulting work items to `resources`
    /// round-robin and start monitoring them.
    ///
    /// An empty `resources` slice leaves every item unassigned.
    pub async fn lead_and_delegate(&self, task: &str, resources: &[String]) -> LeadershipSummary {
        info!(task = %task, resources = resources.len(), "Leading task");

        let context_id = {
            let mut store = self.core.store().lock().await;
            store.create_context(&leadership_context_name(task), None)
        };

        let chain = self
            .core
            .think_about(&breakdown_topic(task), Some(&context_id), DECOMPOSITION_DEPTH)
            .await;

        let (work_items, delegation) = {
            let mut store = self.core.store().lock().await;
            let items = delegation::work_items_from_chain(&mut store, &chain, &context_id);
            let assignments = delegation::delegate_work_items(&mut store, &items, resources);
            (items, assignments)
        };

        let cancel = Arc::new(Notify::new());
        let handle = tokio::spawn(delegation::monitor_delegated_work(
            self.core.clone(),
            work_items.clone(),
            context_id.clone(),
            self.core.config().engine.monitor_interval(),
            Arc::clone(&cancel),
        ));
        {
            let mut monitors = self.monitors.lock().await;
            monitors.retain(|_, monitor| !monitor.handle.is_finished());
            monitors.insert(context_id.clone(), MonitorHandle { cancel, handle });
        }

        info!(
            context_id = %context_id,
            work_items = work_items.len(),
            delegated = delegation.len(),
            "Task delegated"
        );

        LeadershipSummary {
            task: task.to_string(),
            context: context_id,
            work_items,
            delegation,
            status: LEADING_STATUS.to_string(),
            decomposition: chain.conclusion,
        }
    }

    /// Set a work item's status. Returns false for unknown ids.
    pub async fn set_work_item_status(&self, work_item_id: &str, status: WorkStatus) -> bool {
        let mut store = self.core.store().lock().await;
        match store.work_item_mut(work_item_id) {
            Some(item) => {
                debug!(work_item_id = %work_item_id, status = %status, "Work item status set");
                item.status = status;
                true
            }
            None => false,
        }
    }

    /// Complete a work item with a result payload. Returns false for unknown ids.
    pub async fn complete_work_item(&self, work_item_id: &str, result: serde_json::Value) -> bool {
        let mut store = self.core.store().lock().await;
        match store.work_item_mut(work_item_id) {
            Some(item) => {
                item.status = WorkStatus::Completed;
                item.result = Some(result);
                info!(work_item_id = %work_item_id, "Work item completed");
                true
            }
            None => false,
        }
    }

    /// Cancel the monitor of a leadership context.
    ///
    /// Returns false if no monitor was registered for it.
    pub async fn cancel_monitor(&self, context_id: &str) -> bool {
        match self.monitors.lock().await.remove(context_id) {
            Some(monitor) => {
                monitor.cancel.notify_one();
                debug!(context_id = %context_id, "Monitor cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Cancel every monitor, returning how many were still running.
    pub async fn cancel_all_monitors(&self) -> usize {
        let monitors: Vec<_> = self.monitors.lock().await.drain().collect();
        let mut running = 0;
        for (_, monitor) in monitors {
            if !monitor.handle.is_finished() {
                running += 1;
            }
            monitor.cancel.notify_one();
        }
        running
    }

    /// Wait for the monitor of a leadership context to finish.
    ///
    /// Returns `None` if no monitor is registered or the task panicked.
    /// Finished monitors are forgotten at the next `lead_and_delegate`.
    pub async fn wait_for_monitor(&self, context_id: &str) -> Option<MonitorOutcome> {
        let monitor = self.monitors.lock().await.remove(context_id)?;
        match monitor.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(context_id = %context_id, error = %e, "Monitor task failed");
                None
            }
        }
    }

    /// Number of monitors still running.
    pub async fn active_monitors(&self) -> usize {
        self.monitors
            .lock()
            .await
            .values()
            .filter(|monitor| !monitor.handle.is_finished())
            .count()
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    /// Create a context, nested under `parent` when it is known.
    pub async fn create_context(&self, name: &str, parent: Option<&str>) -> ContextId {
        let mut store = self.core.store().lock().await;
        store.create_context(name, parent)
    }

    /// Push a known context onto the current-context stack.
    pub async fn enter_context(&self, context_id: &str) -> bool {
        let mut store = self.core.store().lock().await;
        store.push_context(context_id)
    }

    /// Pop the current context.
    pub async fn exit_context(&self) -> Option<ContextId> {
        let mut store = self.core.store().lock().await;
        store.pop_context()
    }

    // ========================================================================
    // Background work
    // ========================================================================

    /// Queue a request for the background loop.
    ///
    /// Returns false once the loop has stopped.
    pub fn submit_background_thought(&self, request: BackgroundThought) -> bool {
        if !self.is_thinking() {
            return false;
        }
        self.background_tx.send(request).is_ok()
    }

    /// Run one maintenance pass now, outside the loop's schedule.
    pub async fn maintain_once(&self) -> MaintenanceReport {
        self.core.maintain().await
    }

    /// Whether the background loop is running.
    pub fn is_thinking(&self) -> bool {
        self.thinking_enabled.load(Ordering::SeqCst)
    }

    /// Stop the background loop and wait for it to exit.
    ///
    /// Monitors are not affected; cancel them separately.
    pub async fn shutdown(&self) -> ReasonerResult<()> {
        self.thinking_enabled.store(false, Ordering::SeqCst);
        self.shutdown_notify.notify_one();

        let Some(handle) = self.loop_handle.lock().await.take() else {
            return Ok(());
        };
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => {
                info!("Thinking engine stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ReasonerError::Engine {
                message: format!("Thinking loop panicked: {}", e),
            }),
            Err(_) => {
                warn!(timeout_secs = SHUTDOWN_TIMEOUT.as_secs(), "Thinking loop did not stop in time");
                Err(ReasonerError::Engine {
                    message: "Timed out waiting for the thinking loop to stop".to_string(),
                })
            }
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Snapshot of the engine's counters.
    pub async fn get_thinking_status(&self) -> ThinkingStatus {
        let store = self.core.store().lock().await;
        ThinkingStatus {
            total_thoughts: store.thought_count(),
            active_thoughts: store.active_thought_count(),
            contexts: store.context_count(),
            reasoning_chains: store.chain_count(),
            work_items: store.work_item_count(),
            blocked_paths: store.blocked_path_count(),
            alternative_paths: store.alternative_path_count(),
            thought_connections: store.connection_count(),
            context_switches: store.context_switches().len(),
            current_context: store.current_context().cloned(),
        }
    }

    /// Human-readable rendering of the `limit` most recent thoughts.
    pub async fn visualize_thought_graph(&self, limit: usize) -> String {
        let store = self.core.store().lock().await;

        let mut viz = String::from("Thought Graph (Recent):\n");
        viz.push_str(&"=".repeat(GRAPH_RULE_WIDTH));
        viz.push('\n');

        for id in store.recent_thoughts(limit) {
            let Some(thought) = store.thought(&id) else {
                continue;
            };
            let label: String = thought.thought_type.as_str().chars().take(4).collect();
            let preview: String = thought.content.chars().take(GRAPH_PREVIEW_CHARS).collect();
            viz.push_str(&format!("\n[{}] {}...", label, preview));

            if let Some(parent) = &thought.parent_thought {
                viz.push_str(&format!("\n  ↑ Parent: {}", parent));
            }
            if !thought.child_thoughts.is_empty() {
                viz.push_str(&format!("\n  ↓ Children: {}", thought.child_thoughts.len()));
            }
            if !thought.connections.is_empty() {
                viz.push_str(&format!("\n  ↔ Connected: {}", thought.connections.len()));
            }
            if thought.is_blocker() {
                viz.push_str("\n  🚧 BLOCKER");
                if let Some(alternatives) = store.alternatives_for(&id) {
                    viz.push_str(&format!(" → {} alternatives", alternatives.len()));
                }
            }
        }
        viz
    }

    /// Clone of a thought.
    pub async fn thought(&self, thought_id: &str) -> Option<Thought> {
        self.core.store().lock().await.thought(thought_id).cloned()
    }

    /// Clone of a context.
    pub async fn context(&self, context_id: &str) -> Option<Context> {
        self.core.store().lock().await.context(context_id).cloned()
    }

    /// Clone of a registered reasoning chain.
    pub async fn reasoning_chain(&self, chain_id: &str) -> Option<ReasoningChain> {
        self.core.store().lock().await.chain(chain_id).cloned()
    }

    /// Clone of a work item.
    pub async fn work_item(&self, work_item_id: &str) -> Option<WorkItem> {
        self.core.store().lock().await.work_item(work_item_id).cloned()
    }

    /// Alternatives recorded for a blocker.
    pub async fn alternatives_for(&self, thought_id: &str) -> Option<Vec<ThoughtId>> {
        self.core
            .store()
            .lock()
            .await
            .alternatives_for(thought_id)
            .map(<[ThoughtId]>::to_vec)
    }

    /// Connections of a thought in the adjacency index.
    pub async fn connections_of(&self, thought_id: &str) -> BTreeSet<ThoughtId> {
        self.core
            .store()
            .lock()
            .await
            .connections_of(thought_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every recorded context switch, oldest first.
    pub async fn context_switches(&self) -> Vec<ContextSwitch> {
        self.core.store().lock().await.context_switches().to_vec()
    }
}

impl Drop for ThinkingEngine {
    fn drop(&mut self) {
        self.thinking_enabled.store(false, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ThinkingConfig};
    use crate::random::ConstantRandom;
    use crate::storage::ThoughtType;

    fn engine(gate: f64) -> ThinkingEngine {
        let config = Config {
            engine: EngineConfig {
                tick_interval_ms: 10,
                monitor_interval_ms: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        ThinkingEngine::with_random_source(config, Box::new(ConstantRandom(gate))).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = Config {
            thinking: ThinkingConfig {
                max_depth: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = ThinkingEngine::new(config);
        assert!(matches!(result, Err(ReasonerError::Config(_))));
    }

    #[tokio::test]
    async fn test_status_after_think() {
        let engine = engine(0.0);
        engine.think_about("rust", None, 1).await;

        let status = engine.get_thinking_status().await;
        assert_eq!(status.total_thoughts, 4);
        assert_eq!(status.active_thoughts, 4);
        assert_eq!(status.contexts, 1);
        assert_eq!(status.reasoning_chains, 1);
        assert_eq!(status.work_items, 0);
        assert!(status.current_context.is_none());
    }

    #[tokio::test]
    async fn test_visualize_marks_blockers() {
        let engine = engine(0.0);
        engine.think_about("stuck pipeline", None, 1).await;

        let viz = engine.visualize_thought_graph(20).await;
        assert!(viz.starts_with("Thought Graph (Recent):\n=================================================="));
        assert!(viz.contains("[anal] Analyzing: stuck pipeline..."));
        assert!(viz.contains("↓ Children: 3"));
        assert!(viz.contains("[bloc]"));
        assert!(viz.contains("🚧 BLOCKER → 3 alternatives"));
        assert!(viz.contains("[alte] Lateral approach: bypass "));
    }

    #[tokio::test]
    async fn test_visualize_limit_and_preview_length() {
        let engine = engine(0.0);
        let topic = "a".repeat(100);
        engine.think_about(&topic, None, 0).await;

        let viz = engine.visualize_thought_graph(0).await;
        assert_eq!(viz, format!("Thought Graph (Recent):\n{}\n", "=".repeat(50)));

        let viz = engine.visualize_thought_graph(1).await;
        let expected: String = format!("Analyzing: {}", topic).chars().take(40).collect();
        assert!(viz.contains(&format!("[anal] {}...", expected)));
    }

    #[tokio::test]
    async fn test_resolve_thought() {
        let engine = engine(0.0);
        let chain = engine.think_about("rust", None, 0).await;
        assert!(engine.resolve_thought(&chain.root_thought).await);
        assert!(engine.thought(&chain.root_thought).await.unwrap().resolved);
        assert!(!engine.resolve_thought("ghost").await);
    }

    #[tokio::test]
    async fn test_enter_and_exit_context() {
        let engine = engine(0.0);
        let ctx = engine.create_context("work", None).await;

        assert!(!engine.enter_context("ghost").await);
        assert!(engine.enter_context(&ctx).await);
        assert_eq!(
            engine.get_thinking_status().await.current_context,
            Some(ctx.clone())
        );
        assert_eq!(engine.exit_context().await, Some(ctx));
        assert_eq!(engine.exit_context().await, None);
    }

    #[tokio::test]
    async fn test_apply_pattern_through_engine() {
        let engine = engine(0.0);
        let ids = engine
            .apply_pattern(ProblemPattern::LateralThinking, "latency", None)
            .await;
        assert_eq!(ids.len(), 3);
        let thought = engine.thought(&ids[1]).await.unwrap();
        assert_eq!(thought.thought_type, ThoughtType::AlternativePath);
        assert_eq!(thought.content, "Unrelated solution to latency");
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let engine = engine(0.0);
        assert!(engine.is_thinking());

        engine.shutdown().await.unwrap();
        assert!(!engine.is_thinking());
        assert!(!engine.submit_background_thought(BackgroundThought::Optimization {
            thought_id: "t".into()
        }));

        // A second shutdown is a no-op.
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_stops_loop() {
        let engine = engine(0.0);
        let enabled = Arc::clone(&engine.thinking_enabled);
        let handle = engine.loop_handle.lock().await.take().unwrap();

        drop(engine);
        assert!(!enabled.load(Ordering::SeqCst));

        let joined = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_finished_monitors_are_pruned() {
        let engine = engine(0.0);
        let first = engine.lead_and_delegate("task one", &[]).await;
        for id in &first.work_items {
            engine.complete_work_item(id, serde_json::Value::Null).await;
        }

        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            while engine.active_monitors().await > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(finished.is_ok());
        assert_eq!(engine.monitors.lock().await.len(), 1);

        let second = engine.lead_and_delegate("task two", &[]).await;
        let monitors = engine.monitors.lock().await;
        assert_eq!(monitors.len(), 1);
        assert!(monitors.contains_key(&second.context));
        drop(monitors);

        engine.cancel_all_monitors().await;
    }

    #[tokio::test]
    async fn test_unknown_work_item_operations() {
        let engine = engine(0.0);
        assert!(!engine.set_work_item_status("ghost", WorkStatus::Blocked).await);
        assert!(!engine.complete_work_item("ghost", serde_json::json!({})).await);
        assert!(!engine.cancel_monitor("ghost").await);
        assert!(engine.wait_for_monitor("ghost").await.is_none());
        assert_eq!(engine.active_monitors().await, 0);
    }
}
