//! Task decomposition, delegation and monitoring of delegated work.
//!
//! A leadership episode turns a reasoning chain into work items, hands them to
//! resources round-robin and then watches them from a spawned monitor until
//! they all complete or the monitor is cancelled.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info};

use super::core::EngineCore;
use crate::heuristics::unblock_topic;
use crate::storage::{
    derived_id, ContextId, ContextStatus, EntityStore, ReasoningChain, ThoughtType, WorkItem,
    WorkItemId, WorkStatus,
};

/// Depth of the episode that decomposes a task.
pub const DECOMPOSITION_DEPTH: usize = 3;
/// Depth of the episode that tries to unblock a work item.
pub const UNBLOCK_DEPTH: usize = 2;
/// Confidence an unblock episode must exceed to resume the item.
pub const UNBLOCK_CONFIDENCE: f64 = 0.7;
/// Status reported by a fresh leadership summary.
pub const LEADING_STATUS: &str = "leading";

/// Result of [`ThinkingEngine::lead_and_delegate`](super::ThinkingEngine::lead_and_delegate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipSummary {
    /// The task that was delegated.
    pub task: String,
    /// Leadership context owning the work items.
    pub context: ContextId,
    /// Work items derived from the decomposition, in chain order.
    pub work_items: Vec<WorkItemId>,
    /// Work item to resource assignments.
    pub delegation: BTreeMap<WorkItemId, String>,
    /// Always "leading" when returned.
    pub status: String,
    /// Conclusion of the decomposition chain.
    pub decomposition: Option<String>,
}

/// How a monitor finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorOutcome {
    /// Every work item completed and the context was marked completed.
    Completed,
    /// The monitor was cancelled first.
    Cancelled,
}

/// Turn the action-bearing thoughts of `chain` into work items.
///
/// Thoughts requiring action, and problem-solving or delegation thoughts,
/// qualify. When none do, a single item wraps the chain's conclusion.
pub(crate) fn work_items_from_chain(
    store: &mut EntityStore,
    chain: &ReasoningChain,
    context_id: &str,
) -> Vec<WorkItemId> {
    let candidates: Vec<WorkItem> = chain
        .thoughts
        .iter()
        .filter_map(|id| store.thought(id))
        .filter(|thought| {
            thought.action_required
                || matches!(
                    thought.thought_type,
                    ThoughtType::ProblemSolving | ThoughtType::Delegation
                )
        })
        .map(|thought| {
            WorkItem::new(
                derived_id(&format!("work_{}", thought.id)),
                thought.content.clone(),
                context_id,
            )
            .with_priority(thought.priority)
        })
        .collect();

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for item in candidates {
        if seen.insert(item.id.clone()) {
            items.push(item.id.clone());
            store.insert_work_item(item);
        }
    }

    if items.is_empty() {
        let description = chain.conclusion.clone().unwrap_or_default();
        let item = WorkItem::new(derived_id(&format!("work_{}", chain.id)), description, context_id);
        debug!(chain_id = %chain.id, "No actionable thoughts, delegating the conclusion");
        items.push(item.id.clone());
        store.insert_work_item(item);
    }

    items
}

/// Assign `items` to `resources` round-robin and mark them in progress.
///
/// No resources means no assignments; the items stay pending.
pub(crate) fn delegate_work_items(
    store: &mut EntityStore,
    items: &[WorkItemId],
    resources: &[String],
) -> BTreeMap<WorkItemId, String> {
    let mut delegation = BTreeMap::new();
    if resources.is_empty() {
        debug!(items = items.len(), "No resources, nothing delegated");
        return delegation;
    }

    for (index, id) in items.iter().enumerate() {
        let resource = &resources[index % resources.len()];
        let Some(item) = store.work_item_mut(id) else {
            debug!(work_item_id = %id, "Work item missing, skipping delegation");
            continue;
        };
        item.assigned_to = Some(resource.clone());
        item.status = WorkStatus::InProgress;
        delegation.insert(id.clone(), resource.clone());
        info!(work_item_id = %id, resource = %resource, "Delegated work item");
    }
    delegation
}

/// Poll delegated work until it all completes or `cancel` fires.
///
/// Blocked items are reasoned about again; an unblock episode whose
/// confidence exceeds [`UNBLOCK_CONFIDENCE`] resumes the item.
pub(crate) async fn monitor_delegated_work(
    core: EngineCore,
    items: Vec<WorkItemId>,
    context_id: ContextId,
    interval: Duration,
    cancel: Arc<Notify>,
) -> MonitorOutcome {
    info!(context_id = %context_id, items = items.len(), "Monitoring delegated work");

    loop {
        let (all_complete, blocked) = {
            let store = core.store().lock().await;
            let mut all_complete = true;
            let mut blocked = Vec::new();
            for id in &items {
                let Some(item) = store.work_item(id) else {
                    debug!(work_item_id = %id, "Work item missing, skipping");
                    continue;
                };
                if item.status == WorkStatus::Completed {
                    continue;
                }
                all_complete = false;
                if item.status == WorkStatus::Blocked {
                    blocked.push((id.clone(), item.description.clone()));
                }
            }
            (all_complete, blocked)
        };

        if all_complete {
            let mut store = core.store().lock().await;
            if let Some(context) = store.context_mut(&context_id) {
                context.status = ContextStatus::Completed;
            }
            info!(context_id = %context_id, "All delegated work completed");
            return MonitorOutcome::Completed;
        }

        for (id, description) in blocked {
            let chain = core
                .think_about(&unblock_topic(&description), Some(&context_id), UNBLOCK_DEPTH)
                .await;
            if chain.confidence <= UNBLOCK_CONFIDENCE {
                debug!(
                    work_item_id = %id,
                    confidence = chain.confidence,
                    "Unblock attempt not confident enough"
                );
                continue;
            }
            let mut store = core.store().lock().await;
            if let Some(item) = store.work_item_mut(&id) {
                if item.status == WorkStatus::Blocked {
                    item.status = WorkStatus::InProgress;
                    info!(
                        work_item_id = %id,
                        confidence = chain.confidence,
                        "Unblocked work item"
                    );
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.notified() => {
                info!(context_id = %context_id, "Monitor cancelled");
                return MonitorOutcome::Cancelled;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
