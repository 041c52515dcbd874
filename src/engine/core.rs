//! Core infrastructure shared by every engine component.
//!
//! [`EngineCore`] centralizes the entity store, the randomness source and the
//! configuration. It is a cheap clone: the background loop and every
//! delegated-work monitor hold their own copy.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{connections, context, expansion};
use crate::config::Config;
use crate::random::RandomSource;
use crate::storage::{ContextSwitch, EntityStore, ReasoningChain};

/// What one maintenance pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Contexts newly marked blocked.
    pub contexts_blocked: usize,
    /// Blockers that received alternatives during the scan.
    pub alternatives_generated: usize,
    /// New connections between recent thoughts.
    pub connections_added: usize,
    /// Switch performed away from a blocked current context.
    pub context_switched: Option<ContextSwitch>,
}

impl MaintenanceReport {
    /// Whether the pass changed anything.
    pub fn is_noop(&self) -> bool {
        self.contexts_blocked == 0
            && self.alternatives_generated == 0
            && self.connections_added == 0
            && self.context_switched.is_none()
    }
}

/// Shared handle to the engine's state.
///
/// Lock order is always store, then randomness.
#[derive(Clone)]
pub struct EngineCore {
    store: Arc<Mutex<EntityStore>>,
    random: Arc<Mutex<Box<dyn RandomSource>>>,
    config: Arc<Config>,
}

impl EngineCore {
    /// Create a core with an empty store sized by `config.engine.active_capacity`.
    pub fn new(config: Config, random: Box<dyn RandomSource>) -> Self {
        Self {
            store: Arc::new(Mutex::new(EntityStore::new(config.engine.active_capacity))),
            random: Arc::new(Mutex::new(random)),
            config: Arc::new(config),
        }
    }

    /// Get a reference to the entity store.
    #[inline]
    pub fn store(&self) -> &Arc<Mutex<EntityStore>> {
        &self.store
    }

    /// Get a reference to the configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one reasoning episode about `topic`.
    ///
    /// An absent or unknown context is replaced by a fresh one named after
    /// the topic. `depth` is clamped to `thinking.max_depth`.
    pub async fn think_about(
        &self,
        topic: &str,
        context: Option<&str>,
        depth: usize,
    ) -> ReasoningChain {
        let max_depth = self.config.thinking.max_depth;
        let depth = if depth > max_depth {
            warn!(
                requested = depth,
                max_depth = max_depth,
                "Requested depth exceeds max_depth, clamping"
            );
            max_depth
        } else {
            depth
        };

        let start = Instant::now();
        info!(topic = %topic, depth = depth, "Deep thinking started");

        let chain = {
            let mut store = self.store.lock().await;
            let mut random = self.random.lock().await;
            expansion::reason(&mut store, &mut **random, topic, context, depth)
        };

        info!(
            chain_id = %chain.id,
            thoughts = chain.thoughts.len(),
            confidence = chain.confidence,
            latency_ms = start.elapsed().as_millis() as u64,
            "Deep thinking finished"
        );
        chain
    }

    /// Blocker scan, connection discovery and context maintenance, in order.
    pub async fn maintain(&self) -> MaintenanceReport {
        let mut store = self.store.lock().await;

        let scan = context::scan_for_blockers(&mut store);
        let connections_added = connections::discover_connections(
            &mut store,
            self.config.engine.connection_window,
            self.config.thinking.connection_threshold,
        );
        let context_switched = context::maintain_contexts(&mut store);

        let report = MaintenanceReport {
            contexts_blocked: scan.contexts_blocked,
            alternatives_generated: scan.alternatives_generated,
            connections_added,
            context_switched,
        };
        if !report.is_noop() {
            debug!(
                contexts_blocked = report.contexts_blocked,
                alternatives_generated = report.alternatives_generated,
                connections_added = report.connections_added,
                switched = report.context_switched.is_some(),
                "Maintenance pass"
            );
        }
        report
    }
}
