//! Blocker scanning and context switching.

use chrono::Utc;
use tracing::{debug, info};

use super::expansion::find_alternative_path;
use crate::storage::{ContextId, ContextStatus, ContextSwitch, EntityStore, Thought, ThoughtId};

/// Outcome of one blocker scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScanOutcome {
    pub contexts_blocked: usize,
    pub alternatives_generated: usize,
}

/// Mark every active context holding an unresolved blocker as blocked, and
/// generate alternatives for blockers that have none yet.
pub(crate) fn scan_for_blockers(store: &mut EntityStore) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for context_id in store.context_ids() {
        let blockers: Vec<ThoughtId> = match store.context(&context_id) {
            Some(context) if context.status == ContextStatus::Active => context
                .active_thoughts
                .iter()
                .filter(|id| store.thought(id).map_or(false, Thought::is_blocker))
                .cloned()
                .collect(),
            _ => continue,
        };
        if blockers.is_empty() {
            continue;
        }

        if let Some(context) = store.context_mut(&context_id) {
            context.status = ContextStatus::Blocked;
        }
        outcome.contexts_blocked += 1;
        info!(
            context_id = %context_id,
            blockers = blockers.len(),
            "Context blocked"
        );

        for blocker in blockers {
            if store.has_alternatives(&blocker) {
                continue;
            }
            if find_alternative_path(store, &blocker, &context_id).is_some() {
                outcome.alternatives_generated += 1;
            }
        }
    }

    outcome
}

/// Switch away from the current context if it is blocked.
pub(crate) fn maintain_contexts(store: &mut EntityStore) -> Option<ContextSwitch> {
    let current = store.current_context()?.clone();
    let blocked = store.context(&current).map_or(false, |c| c.is_blocked());
    if !blocked {
        return None;
    }
    switch_context(store, &current)
}

/// Replace `from` on top of the stack with its first unblocked sibling.
///
/// Returns `None` when `from` has no known parent or every sibling is
/// blocked; the engine then stays where it is.
pub(crate) fn switch_context(store: &mut EntityStore, from: &str) -> Option<ContextSwitch> {
    let target = unblocked_sibling(store, from);
    let Some(target) = target else {
        debug!(context_id = %from, "No unblocked sibling, staying in blocked context");
        return None;
    };

    store.replace_current_context(&target);
    let switch = ContextSwitch {
        from: from.to_string(),
        to: target,
        at: Utc::now(),
    };
    store.record_switch(switch.clone());
    info!(from = %switch.from, to = %switch.to, "Switched context");
    Some(switch)
}

fn unblocked_sibling(store: &EntityStore, from: &str) -> Option<ContextId> {
    let parent_id = store.context(from)?.parent_context.as_deref()?;
    let parent = store.context(parent_id)?;
    parent
        .sub_contexts
        .iter()
        .filter(|id| id.as_str() != from)
        .find(|id| store.context(id).map_or(false, |c| !c.is_blocked()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ThoughtType;

    fn family(store: &mut EntityStore, children: usize) -> (ContextId, Vec<ContextId>) {
        let parent = store.create_context("parent", None);
        let kids = (0..children)
            .map(|i| store.create_context(&format!("child {i}"), Some(&parent)))
            .collect();
        (parent, kids)
    }

    fn block(store: &mut EntityStore, id: &str) {
        store.context_mut(id).unwrap().status = ContextStatus::Blocked;
    }

    #[test]
    fn test_scan_blocks_context_with_blocker() {
        let mut store = EntityStore::default();
        let ctx = store.create_context("c", None);
        let blocker = store.create_thought(ThoughtType::BlockerDetection, "stuck", &ctx, 0, None);
        store.create_thought(ThoughtType::Analysis, "fine", &ctx, 0, None);

        let outcome = scan_for_blockers(&mut store);

        assert_eq!(outcome.contexts_blocked, 1);
        assert_eq!(outcome.alternatives_generated, 1);
        assert!(store.context(&ctx).unwrap().is_blocked());
        assert_eq!(store.alternatives_for(&blocker).unwrap().len(), 3);
    }

    #[test]
    fn test_scan_ignores_keyword_content_without_blocker_type() {
        let mut store = EntityStore::default();
        let ctx = store.create_context("c", None);
        store.create_thought(ThoughtType::Analysis, "we are stuck", &ctx, 0, None);

        assert_eq!(scan_for_blockers(&mut store), ScanOutcome::default());
        assert!(!store.context(&ctx).unwrap().is_blocked());
    }

    #[test]
    fn test_scan_skips_resolved_blockers_and_inactive_contexts() {
        let mut store = EntityStore::default();
        let resolved_ctx = store.create_context("resolved", None);
        let id = store.create_thought(ThoughtType::BlockerDetection, "x", &resolved_ctx, 0, None);
        store.thought_mut(&id).unwrap().resolved = true;

        let done_ctx = store.create_context("done", None);
        store.create_thought(ThoughtType::BlockerDetection, "y", &done_ctx, 0, None);
        store.context_mut(&done_ctx).unwrap().status = ContextStatus::Completed;

        assert_eq!(scan_for_blockers(&mut store), ScanOutcome::default());
        assert_eq!(
            store.context(&done_ctx).unwrap().status,
            ContextStatus::Completed
        );
    }

    #[test]
    fn test_scan_does_not_regenerate_alternatives() {
        let mut store = EntityStore::default();
        let ctx = store.create_context("c", None);
        let blocker = store.create_thought(ThoughtType::BlockerDetection, "stuck", &ctx, 0, None);
        store.record_alternatives(&blocker, vec!["existing".to_string()]);

        let outcome = scan_for_blockers(&mut store);
        assert_eq!(outcome.contexts_blocked, 1);
        assert_eq!(outcome.alternatives_generated, 0);
        assert_eq!(store.alternatives_for(&blocker).unwrap(), ["existing".to_string()]);
    }

    #[test]
    fn test_switch_to_first_unblocked_sibling() {
        let mut store = EntityStore::default();
        let (_, kids) = family(&mut store, 3);
        block(&mut store, &kids[0]);
        block(&mut store, &kids[1]);
        store.push_context(&kids[0]);

        let switch = maintain_contexts(&mut store).unwrap();

        assert_eq!(switch.from, kids[0]);
        assert_eq!(switch.to, kids[2]);
        assert_eq!(store.current_context(), Some(&kids[2]));
        assert_eq!(store.context_switches().len(), 1);
    }

    #[test]
    fn test_no_switch_when_siblings_blocked() {
        let mut store = EntityStore::default();
        let (_, kids) = family(&mut store, 2);
        block(&mut store, &kids[0]);
        block(&mut store, &kids[1]);
        store.push_context(&kids[0]);

        assert!(maintain_contexts(&mut store).is_none());
        assert_eq!(store.current_context(), Some(&kids[0]));
        assert!(store.context_switches().is_empty());
    }

    #[test]
    fn test_never_switches_to_self() {
        let mut store = EntityStore::default();
        let (_, kids) = family(&mut store, 1);
        block(&mut store, &kids[0]);
        store.push_context(&kids[0]);

        assert!(maintain_contexts(&mut store).is_none());
    }

    #[test]
    fn test_no_switch_when_current_not_blocked_or_orphan() {
        let mut store = EntityStore::default();
        assert!(maintain_contexts(&mut store).is_none());

        let (_, kids) = family(&mut store, 2);
        store.push_context(&kids[0]);
        assert!(maintain_contexts(&mut store).is_none());

        let orphan = store.create_context("orphan", None);
        block(&mut store, &orphan);
        store.push_context(&orphan);
        assert!(maintain_contexts(&mut store).is_none());
    }

    #[test]
    fn test_switch_skips_unknown_sibling_ids() {
        let mut store = EntityStore::default();
        let (parent, kids) = family(&mut store, 2);
        store
            .context_mut(&parent)
            .unwrap()
            .sub_contexts
            .insert(1, "ghost".to_string());
        block(&mut store, &kids[0]);
        store.push_context(&kids[0]);

        let switch = maintain_contexts(&mut store).unwrap();
        assert_eq!(switch.to, kids[1]);
    }
}
