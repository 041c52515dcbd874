//! Unit tests for storage entity types.
//!
//! Tests construction defaults, priority derivation, blocker state,
//! chain depth tracking and string conversions for the status enums.

use super::*;
use serde_json::json;

// ============================================================================
// ThoughtType tests
// ============================================================================

#[test]
fn test_thought_type_priorities() {
    assert_eq!(ThoughtType::BlockerDetection.default_priority(), 9);
    assert_eq!(ThoughtType::ProblemSolving.default_priority(), 8);
    assert_eq!(ThoughtType::AlternativePath.default_priority(), 7);
    assert_eq!(ThoughtType::Analysis.default_priority(), 5);
    assert_eq!(ThoughtType::Validation.default_priority(), 5);
}

#[test]
fn test_thought_type_string_conversions() {
    assert_eq!(ThoughtType::ProblemSolving.as_str(), "problem_solving");
    assert_eq!(format!("{}", ThoughtType::BlockerDetection), "blocker_detection");
    assert_eq!(
        "ALTERNATIVE_PATH".parse::<ThoughtType>().unwrap(),
        ThoughtType::AlternativePath
    );
    assert_eq!(
        "daydream".parse::<ThoughtType>().unwrap_err(),
        "Unknown thought type: daydream"
    );
}

#[test]
fn test_thought_type_serializes_snake_case() {
    let value = serde_json::to_value(ThoughtType::RiskAssessment).unwrap();
    assert_eq!(value, json!("risk_assessment"));
}

// ============================================================================
// Thought tests
// ============================================================================

#[test]
fn test_thought_new_defaults() {
    let thought = Thought::new("t1", ThoughtType::Analysis, "Analyzing: x", "ctx", 0);
    assert_eq!(thought.id, "t1");
    assert_eq!(thought.context, "ctx");
    assert_eq!(thought.depth, 0);
    assert!(thought.parent_thought.is_none());
    assert!(thought.child_thoughts.is_empty());
    assert!(thought.connections.is_empty());
    assert_eq!(thought.confidence, 0.5);
    assert!(!thought.resolved);
    assert!(!thought.action_required);
    assert_eq!(thought.priority, 5);
}

#[test]
fn test_thought_priority_follows_type() {
    let thought = Thought::new("t1", ThoughtType::ProblemSolving, "How to solve: x", "ctx", 1);
    assert_eq!(thought.priority, 8);
}

#[test]
fn test_thought_with_parent_and_confidence() {
    let thought = Thought::new("t2", ThoughtType::Connection, "c", "ctx", 1)
        .with_parent("t1")
        .with_confidence(1.7);
    assert_eq!(thought.parent_thought.as_deref(), Some("t1"));
    assert_eq!(thought.confidence, 1.0);
}

#[test]
fn test_thought_is_blocker() {
    let mut thought = Thought::new("t1", ThoughtType::BlockerDetection, "stuck", "ctx", 1);
    assert!(thought.is_blocker());

    thought.resolved = true;
    assert!(!thought.is_blocker());

    let other = Thought::new("t2", ThoughtType::Analysis, "stuck", "ctx", 1);
    assert!(!other.is_blocker());
}

// ============================================================================
// Context tests
// ============================================================================

#[test]
fn test_context_new() {
    let context = Context::new("c1", "Thinking about rust");
    assert_eq!(context.name, "Thinking about rust");
    assert_eq!(context.description, "Context for Thinking about rust");
    assert_eq!(context.status, ContextStatus::Active);
    assert!(context.parent_context.is_none());
    assert!(!context.is_blocked());
}

#[test]
fn test_context_is_blocked_tracks_status() {
    let mut context = Context::new("c1", "x").with_parent("p");
    context.status = ContextStatus::Blocked;
    assert!(context.is_blocked());
    context.status = ContextStatus::Completed;
    assert!(!context.is_blocked());
    assert_eq!(context.parent_context.as_deref(), Some("p"));
}

#[test]
fn test_context_add_thought_is_a_set() {
    let mut context = Context::new("c1", "x");
    context.add_thought("t1");
    context.add_thought("t1");
    assert_eq!(context.active_thoughts.len(), 1);
}

#[test]
fn test_context_status_from_str() {
    assert_eq!("Blocked".parse::<ContextStatus>().unwrap(), ContextStatus::Blocked);
    assert!("paused".parse::<ContextStatus>().is_err());
}

// ============================================================================
// ReasoningChain tests
// ============================================================================

#[test]
fn test_chain_new_contains_root() {
    let chain = ReasoningChain::new("ch1", "root");
    assert_eq!(chain.thoughts, vec!["root".to_string()]);
    assert_eq!(chain.depth, 1);
    assert!(chain.conclusion.is_none());
    assert_eq!(chain.confidence, 0.0);
    assert!(chain.branches.is_empty());
}

#[test]
fn test_chain_depth_tracks_len_with_duplicates() {
    let mut chain = ReasoningChain::new("ch1", "root");
    chain.add_thought("a");
    chain.add_thought("a");
    assert_eq!(chain.depth, 3);
    assert_eq!(chain.depth, chain.thoughts.len());
}

// ============================================================================
// WorkItem tests
// ============================================================================

#[test]
fn test_work_item_new() {
    let item = WorkItem::new("w1", "Ship it", "ctx").with_priority(8);
    assert_eq!(item.status, WorkStatus::Pending);
    assert!(item.assigned_to.is_none());
    assert!(item.dependencies.is_empty());
    assert!(item.deadline.is_none());
    assert!(item.result.is_none());
    assert_eq!(item.priority, 8);
}

#[test]
fn test_work_status_conversions() {
    assert_eq!(WorkStatus::InProgress.to_string(), "in_progress");
    assert_eq!(
        "in_progress".parse::<WorkStatus>().unwrap(),
        WorkStatus::InProgress
    );
    assert_eq!(
        serde_json::to_value(WorkStatus::Completed).unwrap(),
        json!("completed")
    );
    assert!("done".parse::<WorkStatus>().is_err());
}
