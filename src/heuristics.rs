//! Pure heuristics over thought content.
//!
//! Content is opaque text: blockers are found by substring containment of a
//! fixed keyword set, similarity is the Jaccard index of whitespace token
//! sets, and new content is produced by template substitution.

use std::collections::HashSet;

use crate::storage::ThoughtType;

/// Words whose presence marks a thought as a blocker candidate.
pub const BLOCKER_KEYWORDS: [&str; 10] = [
    "cannot", "unable", "blocked", "failed", "error", "missing", "required", "depends", "waiting",
    "stuck",
];

/// Perspectives considered during expansion, in order.
pub const PERSPECTIVES: [ThoughtType; 5] = [
    ThoughtType::Analysis,
    ThoughtType::ProblemSolving,
    ThoughtType::Connection,
    ThoughtType::ReverseEngineering,
    ThoughtType::RiskAssessment,
];

/// How many of [`PERSPECTIVES`] each expansion step uses.
pub const EXPANDED_PERSPECTIVES: usize = 3;

// ============================================================================
// Blocker detection
// ============================================================================

/// Whether content contains any blocker keyword, case-insensitively.
pub fn is_blocker_content(content: &str) -> bool {
    let lowered = content.to_lowercase();
    BLOCKER_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

// ============================================================================
// Similarity
// ============================================================================

/// Lowercased whitespace-separated tokens of `text`.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard index of two token sets; 0.0 if either is empty.
pub fn jaccard_index(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Lexical similarity of two pieces of content.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    jaccard_index(&word_set(a), &word_set(b))
}

// ============================================================================
// Content templates
// ============================================================================

/// Content of a child thought seen from `perspective`.
pub fn perspective_content(perspective: ThoughtType, parent_content: &str) -> String {
    match perspective {
        ThoughtType::Analysis => format!("Breaking down: {}", parent_content),
        ThoughtType::ProblemSolving => format!("How to solve: {}", parent_content),
        ThoughtType::Connection => format!("This relates to: {}", parent_content),
        ThoughtType::ReverseEngineering => format!("Working backwards from: {}", parent_content),
        ThoughtType::RiskAssessment => format!("Risks in: {}", parent_content),
        ThoughtType::Optimization => format!("Optimizing: {}", parent_content),
        ThoughtType::AlternativePath => format!("Alternative to: {}", parent_content),
        ThoughtType::Planning
        | ThoughtType::BlockerDetection
        | ThoughtType::Delegation
        | ThoughtType::Monitoring
        | ThoughtType::ContextSwitching
        | ThoughtType::PatternMatching
        | ThoughtType::Hypothesis
        | ThoughtType::Validation => format!("Considering: {}", parent_content),
    }
}

/// The three framings generated for a blocked thought: lateral bypass,
/// decomposition, different approach.
pub fn alternative_framings(blocked_content: &str) -> [String; 3] {
    [
        format!("Lateral approach: bypass {}", blocked_content),
        format!("Break down {} into smaller parts", blocked_content),
        format!("Use different approach for {}", blocked_content),
    ]
}

/// Content of the root thought of a reasoning episode.
pub fn root_content(topic: &str) -> String {
    format!("Analyzing: {}", topic)
}

/// Name of a context created for an episode without one.
pub fn thinking_context_name(topic: &str) -> String {
    format!("Thinking about {}", topic)
}

/// Name of the context that owns a delegated task.
pub fn leadership_context_name(task: &str) -> String {
    format!("Leadership: {}", task)
}

/// Topic used to decompose a delegated task.
pub fn breakdown_topic(task: &str) -> String {
    format!("How to break down: {}", task)
}

/// Topic used to reason a blocked work item loose.
pub fn unblock_topic(description: &str) -> String {
    format!("How to unblock: {}", description)
}
