//! In-memory entity storage for the thought graph.
//!
//! This module defines the four entity kinds (thoughts, contexts, reasoning
//! chains and work items) and the [`EntityStore`] that owns their tables.
//! Nothing here is persisted; all state lives for the lifetime of the engine.

mod memory;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use memory::EntityStore;
pub(crate) use memory::derived_id;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a thought.
pub type ThoughtId = String;
/// Identifier of a context.
pub type ContextId = String;
/// Identifier of a reasoning chain.
pub type ChainId = String;
/// Identifier of a work item.
pub type WorkItemId = String;

/// Default confidence assigned to new thoughts.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
/// Default priority for thoughts and work items.
pub const DEFAULT_PRIORITY: i32 = 5;

/// The kind of reasoning a thought represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtType {
    /// Breaking a subject into parts.
    Analysis,
    /// Ordering steps toward a goal.
    Planning,
    /// Looking for a solution.
    ProblemSolving,
    /// Relating a subject to something else.
    Connection,
    /// An obstruction was detected.
    BlockerDetection,
    /// A route around a blocker.
    AlternativePath,
    /// Working backwards from the goal.
    ReverseEngineering,
    /// Looking for what could go wrong.
    RiskAssessment,
    /// Improving an existing line of thought.
    Optimization,
    /// Handing work to someone else.
    Delegation,
    /// Watching delegated work.
    Monitoring,
    /// Moving focus to another context.
    ContextSwitching,
    /// Recognizing a familiar shape.
    PatternMatching,
    /// A tentative claim.
    Hypothesis,
    /// Checking a claim.
    Validation,
}

impl ThoughtType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ThoughtType::Analysis => "analysis",
            ThoughtType::Planning => "planning",
            ThoughtType::ProblemSolving => "problem_solving",
            ThoughtType::Connection => "connection",
            ThoughtType::BlockerDetection => "blocker_detection",
            ThoughtType::AlternativePath => "alternative_path",
            ThoughtType::ReverseEngineering => "reverse_engineering",
            ThoughtType::RiskAssessment => "risk_assessment",
            ThoughtType::Optimization => "optimization",
            ThoughtType::Delegation => "delegation",
            ThoughtType::Monitoring => "monitoring",
            ThoughtType::ContextSwitching => "context_switching",
            ThoughtType::PatternMatching => "pattern_matching",
            ThoughtType::Hypothesis => "hypothesis",
            ThoughtType::Validation => "validation",
        }
    }

    /// Priority a freshly created thought of this type receives.
    pub fn default_priority(&self) -> i32 {
        match self {
            ThoughtType::BlockerDetection => 9,
            ThoughtType::ProblemSolving => 8,
            ThoughtType::AlternativePath => 7,
            ThoughtType::Analysis
            | ThoughtType::Planning
            | ThoughtType::Connection
            | ThoughtType::ReverseEngineering
            | ThoughtType::RiskAssessment
            | ThoughtType::Optimization
            | ThoughtType::Delegation
            | ThoughtType::Monitoring
            | ThoughtType::ContextSwitching
            | ThoughtType::PatternMatching
            | ThoughtType::Hypothesis
            | ThoughtType::Validation => DEFAULT_PRIORITY,
        }
    }
}

impl std::fmt::Display for ThoughtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThoughtType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "analysis" => Ok(ThoughtType::Analysis),
            "planning" => Ok(ThoughtType::Planning),
            "problem_solving" => Ok(ThoughtType::ProblemSolving),
            "connection" => Ok(ThoughtType::Connection),
            "blocker_detection" => Ok(ThoughtType::BlockerDetection),
            "alternative_path" => Ok(ThoughtType::AlternativePath),
            "reverse_engineering" => Ok(ThoughtType::ReverseEngineering),
            "risk_assessment" => Ok(ThoughtType::RiskAssessment),
            "optimization" => Ok(ThoughtType::Optimization),
            "delegation" => Ok(ThoughtType::Delegation),
            "monitoring" => Ok(ThoughtType::Monitoring),
            "context_switching" => Ok(ThoughtType::ContextSwitching),
            "pattern_matching" => Ok(ThoughtType::PatternMatching),
            "hypothesis" => Ok(ThoughtType::Hypothesis),
            "validation" => Ok(ThoughtType::Validation),
            _ => Err(format!("Unknown thought type: {}", s)),
        }
    }
}

/// A node in the reasoning graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    /// Unique thought identifier.
    pub id: ThoughtId,
    /// The kind of reasoning this thought represents.
    pub thought_type: ThoughtType,
    /// Opaque text content.
    pub content: String,
    /// Owning context.
    pub context: ContextId,
    /// Distance from the root thought of its episode.
    pub depth: usize,
    /// Parent thought, if any.
    pub parent_thought: Option<ThoughtId>,
    /// Children in creation order.
    pub child_thoughts: Vec<ThoughtId>,
    /// Undirected peer links.
    pub connections: BTreeSet<ThoughtId>,
    /// Confidence score (0.0-1.0).
    pub confidence: f64,
    /// When the thought was created.
    pub timestamp: DateTime<Utc>,
    /// Whether the thought no longer needs attention.
    pub resolved: bool,
    /// Whether the thought calls for action.
    pub action_required: bool,
    /// Scheduling priority; higher is more urgent.
    pub priority: i32,
}

impl Thought {
    /// Create a new thought. Priority is derived from the type.
    pub fn new(
        id: impl Into<ThoughtId>,
        thought_type: ThoughtType,
        content: impl Into<String>,
        context: impl Into<ContextId>,
        depth: usize,
    ) -> Self {
        Self {
            id: id.into(),
            thought_type,
            content: content.into(),
            context: context.into(),
            depth,
            parent_thought: None,
            child_thoughts: Vec::new(),
            connections: BTreeSet::new(),
            confidence: DEFAULT_CONFIDENCE,
            timestamp: Utc::now(),
            resolved: false,
            action_required: false,
            priority: thought_type.default_priority(),
        }
    }

    /// Set the parent thought
    pub fn with_parent(mut self, parent: impl Into<ThoughtId>) -> Self {
        self.parent_thought = Some(parent.into());
        self
    }

    /// Set confidence, clamped to 0.0-1.0
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// An active blocker is an unresolved blocker-detection thought.
    pub fn is_blocker(&self) -> bool {
        self.thought_type == ThoughtType::BlockerDetection && !self.resolved
    }
}

/// Lifecycle status of a context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    /// Work is progressing.
    #[default]
    Active,
    /// An unresolved blocker was found among its thoughts.
    Blocked,
    /// All delegated work finished.
    Completed,
}

impl std::fmt::Display for ContextStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextStatus::Active => write!(f, "active"),
            ContextStatus::Blocked => write!(f, "blocked"),
            ContextStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for ContextStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ContextStatus::Active),
            "blocked" => Ok(ContextStatus::Blocked),
            "completed" => Ok(ContextStatus::Completed),
            _ => Err(format!("Unknown context status: {}", s)),
        }
    }
}

/// A named scope of work grouping related thoughts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Unique context identifier.
    pub id: ContextId,
    /// Human-readable name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Enclosing context, if any.
    pub parent_context: Option<ContextId>,
    /// Nested contexts in creation order.
    pub sub_contexts: Vec<ContextId>,
    /// Thoughts created in this context.
    pub active_thoughts: BTreeSet<ThoughtId>,
    /// Constraints the work must respect.
    pub constraints: Vec<String>,
    /// Goals the work should reach.
    pub goals: Vec<String>,
    /// Arbitrary attached resources.
    pub resources: BTreeMap<String, serde_json::Value>,
    /// Current lifecycle status.
    pub status: ContextStatus,
    /// When the context was created.
    pub created_at: DateTime<Utc>,
}

impl Context {
    /// Create a new active context.
    pub fn new(id: impl Into<ContextId>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            description: format!("Context for {}", name),
            name,
            parent_context: None,
            sub_contexts: Vec::new(),
            active_thoughts: BTreeSet::new(),
            constraints: Vec::new(),
            goals: Vec::new(),
            resources: BTreeMap::new(),
            status: ContextStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Set the parent context
    pub fn with_parent(mut self, parent: impl Into<ContextId>) -> Self {
        self.parent_context = Some(parent.into());
        self
    }

    /// Track a thought as belonging to this context.
    pub fn add_thought(&mut self, thought_id: impl Into<ThoughtId>) {
        self.active_thoughts.insert(thought_id.into());
    }

    /// Whether the context is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.status == ContextStatus::Blocked
    }
}

/// Ordered trace of one reasoning episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChain {
    /// Unique chain identifier.
    pub id: ChainId,
    /// The episode's root thought.
    pub root_thought: ThoughtId,
    /// Thoughts in discovery order; duplicates allowed.
    pub thoughts: Vec<ThoughtId>,
    /// Synthesized conclusion, set when the episode finishes.
    pub conclusion: Option<String>,
    /// Confidence in the chain (0.0-1.0).
    pub confidence: f64,
    /// Number of thoughts at the last append.
    pub depth: usize,
    /// Nested chains; structurally supported, never populated by expansion.
    pub branches: Vec<ReasoningChain>,
}

impl ReasoningChain {
    /// Create a chain seeded with its root thought.
    pub fn new(id: impl Into<ChainId>, root_thought: impl Into<ThoughtId>) -> Self {
        let root_thought = root_thought.into();
        let mut chain = Self {
            id: id.into(),
            root_thought: root_thought.clone(),
            thoughts: Vec::new(),
            conclusion: None,
            confidence: 0.0,
            depth: 0,
            branches: Vec::new(),
        };
        chain.add_thought(root_thought);
        chain
    }

    /// Append a thought; depth tracks the sequence length.
    pub fn add_thought(&mut self, thought_id: impl Into<ThoughtId>) {
        self.thoughts.push(thought_id.into());
        self.depth = self.thoughts.len();
    }
}

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Not yet assigned.
    #[default]
    Pending,
    /// Assigned and being worked on.
    InProgress,
    /// Stuck; the monitor will try to reason it loose.
    Blocked,
    /// Finished.
    Completed,
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkStatus::Pending => write!(f, "pending"),
            WorkStatus::InProgress => write!(f, "in_progress"),
            WorkStatus::Blocked => write!(f, "blocked"),
            WorkStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WorkStatus::Pending),
            "in_progress" => Ok(WorkStatus::InProgress),
            "blocked" => Ok(WorkStatus::Blocked),
            "completed" => Ok(WorkStatus::Completed),
            _ => Err(format!("Unknown work status: {}", s)),
        }
    }
}

/// A unit of delegated work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique work item identifier.
    pub id: WorkItemId,
    /// What needs doing.
    pub description: String,
    /// Resource the item was delegated to.
    pub assigned_to: Option<String>,
    /// Current lifecycle status.
    pub status: WorkStatus,
    /// Owning context.
    pub context_id: ContextId,
    /// Work items this one waits on.
    pub dependencies: Vec<WorkItemId>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// Optional due date.
    pub deadline: Option<DateTime<Utc>>,
    /// Scheduling priority; higher is more urgent.
    pub priority: i32,
    /// Result payload reported on completion.
    pub result: Option<serde_json::Value>,
}

impl WorkItem {
    /// Create a new pending work item.
    pub fn new(
        id: impl Into<WorkItemId>,
        description: impl Into<String>,
        context_id: impl Into<ContextId>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            assigned_to: None,
            status: WorkStatus::Pending,
            context_id: context_id.into(),
            dependencies: Vec::new(),
            created_at: Utc::now(),
            deadline: None,
            priority: DEFAULT_PRIORITY,
            result: None,
        }
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// A recorded move of focus between contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSwitch {
    /// The blocked context that was left.
    pub from: ContextId,
    /// The sibling that took its place.
    pub to: ContextId,
    /// When the switch happened.
    pub at: DateTime<Utc>,
}
