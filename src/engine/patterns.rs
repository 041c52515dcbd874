//! Problem-solving pattern library.
//!
//! Each pattern reframes a problem three fixed ways. Applying a pattern
//! materializes the framings as thoughts under a hypothesis root.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::expansion::resolve_context;
use crate::storage::{EntityStore, ThoughtId, ThoughtType};

/// A named way of reframing a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemPattern {
    /// Split the problem into parts.
    DivideAndConquer,
    /// Start from the goal and work back.
    ReverseEngineer,
    /// Approach from an unrelated angle.
    LateralThinking,
    /// Reduce to fundamentals.
    FirstPrinciples,
    /// Compare with something familiar.
    Analogical,
}

impl ProblemPattern {
    /// Every pattern, in library order.
    pub const ALL: [ProblemPattern; 5] = [
        ProblemPattern::DivideAndConquer,
        ProblemPattern::ReverseEngineer,
        ProblemPattern::LateralThinking,
        ProblemPattern::FirstPrinciples,
        ProblemPattern::Analogical,
    ];

    /// Get the pattern name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemPattern::DivideAndConquer => "divide_and_conquer",
            ProblemPattern::ReverseEngineer => "reverse_engineer",
            ProblemPattern::LateralThinking => "lateral_thinking",
            ProblemPattern::FirstPrinciples => "first_principles",
            ProblemPattern::Analogical => "analogical",
        }
    }

    /// Type of the thoughts the pattern produces.
    pub fn thought_type(&self) -> ThoughtType {
        match self {
            ProblemPattern::DivideAndConquer => ThoughtType::Planning,
            ProblemPattern::ReverseEngineer => ThoughtType::ReverseEngineering,
            ProblemPattern::LateralThinking => ThoughtType::AlternativePath,
            ProblemPattern::FirstPrinciples => ThoughtType::Analysis,
            ProblemPattern::Analogical => ThoughtType::PatternMatching,
        }
    }

    /// The three framings of `problem`.
    pub fn expand(&self, problem: &str) -> Vec<String> {
        match self {
            ProblemPattern::DivideAndConquer => (1..=3)
                .map(|part| format!("Part {} of {}", part, problem))
                .collect(),
            ProblemPattern::ReverseEngineer => vec![
                format!("End goal: {}", problem),
                format!("What's needed before: {}", problem),
                format!("Prerequisites for: {}", problem),
            ],
            ProblemPattern::LateralThinking => vec![
                format!("Alternative view of {}", problem),
                format!("Unrelated solution to {}", problem),
                format!("Creative approach to {}", problem),
            ],
            ProblemPattern::FirstPrinciples => vec![
                format!("Fundamental truth about {}", problem),
                format!("Core components of {}", problem),
                format!("Basic building blocks of {}", problem),
            ],
            ProblemPattern::Analogical => vec![
                format!("This is like: {}", problem),
                format!("Similar pattern to {}", problem),
                format!("Reminds me of {}", problem),
            ],
        }
    }
}

impl std::fmt::Display for ProblemPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProblemPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "divide_and_conquer" | "divide_conquer" => Ok(ProblemPattern::DivideAndConquer),
            "reverse_engineer" => Ok(ProblemPattern::ReverseEngineer),
            "lateral_thinking" | "lateral" => Ok(ProblemPattern::LateralThinking),
            "first_principles" => Ok(ProblemPattern::FirstPrinciples),
            "analogical" => Ok(ProblemPattern::Analogical),
            _ => Err(format!("Unknown problem pattern: {}", s)),
        }
    }
}

/// Materialize `pattern` for `problem`, returning the framing thought ids.
pub(crate) fn apply_pattern(
    store: &mut EntityStore,
    pattern: ProblemPattern,
    problem: &str,
    context: Option<&str>,
) -> Vec<ThoughtId> {
    let context_id = resolve_context(store, problem, context);
    let root = store.create_thought(
        ThoughtType::Hypothesis,
        format!("Applying {}: {}", pattern, problem),
        &context_id,
        0,
        None,
    );

    let framings: Vec<ThoughtId> = pattern
        .expand(problem)
        .into_iter()
        .map(|framing| {
            let id = store.create_thought(pattern.thought_type(), framing, &context_id, 1, Some(&root));
            store.add_child(&root, &id);
            id
        })
        .collect();

    info!(
        pattern = %pattern,
        context_id = %context_id,
        framings = framings.len(),
        "Applied problem pattern"
    );
    framings
}
