//! Recursive thought expansion.
//!
//! One reasoning episode grows a tree under a root analysis thought. Every
//! expanded thought gets one child per perspective, blocker children are
//! routed around with alternative paths, and recursion into each child is
//! gated by the randomness source.

use tracing::{debug, info};

use crate::heuristics::{
    alternative_framings, is_blocker_content, perspective_content, root_content,
    thinking_context_name, EXPANDED_PERSPECTIVES, PERSPECTIVES,
};
use crate::random::{RandomSource, RECURSION_GATE};
use crate::storage::{ContextId, EntityStore, ReasoningChain, ThoughtId, ThoughtType};

/// Conclusion of a chain with no thoughts.
pub const NO_CONCLUSION: &str = "No conclusion reached";

/// Added per chain element to the average thought confidence.
const DEPTH_BONUS_STEP: f64 = 0.05;
/// Ceiling of the depth bonus.
const DEPTH_BONUS_CAP: f64 = 0.3;

/// Run one full episode: root, expansion, confidence, conclusion.
///
/// `depth` must already be clamped by the caller.
pub(crate) fn reason(
    store: &mut EntityStore,
    random: &mut dyn RandomSource,
    topic: &str,
    context: Option<&str>,
    depth: usize,
) -> ReasoningChain {
    let context_id = resolve_context(store, topic, context);

    let root = store.create_thought(
        ThoughtType::Analysis,
        root_content(topic),
        &context_id,
        0,
        None,
    );
    let chain_id = store.next_id(topic);
    let mut chain = ReasoningChain::new(chain_id, root.clone());

    expand(store, random, &root, depth, &mut chain, &context_id);

    chain.confidence = chain_confidence(store, &chain);
    chain.conclusion = Some(synthesize_reasoning(store, &chain));
    store.insert_chain(chain.clone());
    chain
}

/// Use the given context if it exists, otherwise create one named after the topic.
pub(crate) fn resolve_context(
    store: &mut EntityStore,
    topic: &str,
    context: Option<&str>,
) -> ContextId {
    match context {
        Some(id) if store.context(id).is_some() => id.to_string(),
        Some(id) => {
            debug!(context = %id, "Unknown context, creating a new one");
            store.create_context(&thinking_context_name(topic), None)
        }
        None => store.create_context(&thinking_context_name(topic), None),
    }
}

fn expand(
    store: &mut EntityStore,
    random: &mut dyn RandomSource,
    thought_id: &str,
    remaining: usize,
    chain: &mut ReasoningChain,
    context_id: &str,
) {
    if remaining == 0 {
        return;
    }
    let (parent_content, parent_depth) = match store.thought(thought_id) {
        Some(thought) => (thought.content.clone(), thought.depth),
        None => {
            debug!(thought_id = %thought_id, "Expansion target missing, skipping");
            return;
        }
    };

    for perspective in PERSPECTIVES.iter().take(EXPANDED_PERSPECTIVES) {
        let content = perspective_content(*perspective, &parent_content);
        let blocker = is_blocker_content(&content);

        let child = store.create_thought(
            *perspective,
            content,
            context_id,
            parent_depth + 1,
            Some(thought_id),
        );
        store.add_child(thought_id, &child);
        chain.add_thought(child.clone());

        if blocker {
            if let Some(alternative) = find_alternative_path(store, &child, context_id) {
                chain.add_thought(alternative);
            }
        }

        if random.next_f64() > RECURSION_GATE {
            expand(store, random, &child, remaining - 1, chain, context_id);
        }
    }
}

/// Promote `blocked` to a blocker and route around it.
///
/// Three alternative-path thoughts are generated the first time; later calls
/// reuse the recorded ones. Returns the primary alternative, or `None` when
/// the thought is unknown.
pub(crate) fn find_alternative_path(
    store: &mut EntityStore,
    blocked: &str,
    context_id: &str,
) -> Option<ThoughtId> {
    let (content, depth) = {
        let thought = store.thought_mut(blocked)?;
        thought.thought_type = ThoughtType::BlockerDetection;
        thought.action_required = true;
        (thought.content.clone(), thought.depth)
    };
    store.mark_blocked_path(blocked);

    if let Some(existing) = store.alternatives_for(blocked) {
        return existing.first().cloned();
    }

    let alternatives: Vec<ThoughtId> = alternative_framings(&content)
        .into_iter()
        .map(|framing| {
            store.create_thought(ThoughtType::AlternativePath, framing, context_id, depth, None)
        })
        .collect();

    info!(
        thought_id = %blocked,
        alternatives = alternatives.len(),
        "Blocker detected, generated alternative paths"
    );

    let primary = alternatives.first().cloned();
    store.record_alternatives(blocked, alternatives);
    primary
}

/// Average thought confidence plus a depth bonus, capped at 1.0.
pub(crate) fn chain_confidence(store: &EntityStore, chain: &ReasoningChain) -> f64 {
    if chain.thoughts.is_empty() {
        return 0.0;
    }
    let total: f64 = chain
        .thoughts
        .iter()
        .filter_map(|id| store.thought(id))
        .map(|thought| thought.confidence)
        .sum();
    let average = total / chain.thoughts.len() as f64;
    let bonus = (chain.depth as f64 * DEPTH_BONUS_STEP).min(DEPTH_BONUS_CAP);
    (average + bonus).min(1.0)
}

/// Multi-line summary of a chain citing its final confidence.
pub(crate) fn synthesize_reasoning(store: &EntityStore, chain: &ReasoningChain) -> String {
    if chain.thoughts.is_empty() {
        return NO_CONCLUSION.to_string();
    }

    let mut blockers = 0;
    let mut solutions = 0;
    let mut alternatives = 0;
    for thought in chain.thoughts.iter().filter_map(|id| store.thought(id)) {
        match thought.thought_type {
            ThoughtType::BlockerDetection => blockers += 1,
            ThoughtType::ProblemSolving => solutions += 1,
            ThoughtType::AlternativePath => alternatives += 1,
            _ => {}
        }
    }

    let mut synthesis = format!(
        "Based on {} thoughts at depth {}:\n",
        chain.thoughts.len(),
        chain.depth
    );
    if blockers > 0 {
        synthesis.push_str(&format!("Identified {} blockers with alternatives.\n", blockers));
    }
    if solutions > 0 {
        synthesis.push_str(&format!("Found {} solution approaches.\n", solutions));
    }
    if alternatives > 0 {
        synthesis.push_str(&format!("Generated {} alternative paths.\n", alternatives));
    }
    synthesis.push_str(&format!(
        "Conclusion: Multi-path approach with {:.1}% confidence.",
        chain.confidence * 100.0
    ));
    synthesis
}
