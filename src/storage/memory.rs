use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{
    ChainId, Context, ContextId, ContextSwitch, ReasoningChain, Thought, ThoughtId, ThoughtType,
    WorkItem, WorkItemId,
};

const ID_LEN: usize = 16;

/// Short identifier derived from a seed string, the clock and a sequence number.
pub(crate) fn generate_id(seed: &str, sequence: u64) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    derived_id(&format!("{}{}#{}", seed, nanos, sequence))
}

/// Short identifier that depends only on `name`.
pub(crate) fn derived_id(name: &str) -> String {
    let mut id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
        .simple()
        .to_string();
    id.truncate(ID_LEN);
    id
}

/// Owner of every entity table plus the indexes built over them.
///
/// All other components hold ids into these tables and must treat a missing
/// id as "skip". Entities are never deleted; the only eviction is the
/// recent-thoughts ring buffer, which drops its oldest id once
/// `active_capacity` is exceeded.
#[derive(Debug)]
pub struct EntityStore {
    thoughts: HashMap<ThoughtId, Thought>,
    contexts: HashMap<ContextId, Context>,
    reasoning_chains: HashMap<ChainId, ReasoningChain>,
    work_items: HashMap<WorkItemId, WorkItem>,
    active_thoughts: VecDeque<ThoughtId>,
    active_capacity: usize,
    thought_connections: HashMap<ThoughtId, BTreeSet<ThoughtId>>,
    blocked_paths: BTreeSet<ThoughtId>,
    alternative_paths: HashMap<ThoughtId, Vec<ThoughtId>>,
    context_stack: Vec<ContextId>,
    context_switches: Vec<ContextSwitch>,
    sequence: u64,
}

impl EntityStore {
    /// Create an empty store whose recent-thoughts window holds `active_capacity` ids.
    pub fn new(active_capacity: usize) -> Self {
        Self {
            thoughts: HashMap::new(),
            contexts: HashMap::new(),
            reasoning_chains: HashMap::new(),
            work_items: HashMap::new(),
            active_thoughts: VecDeque::new(),
            active_capacity: active_capacity.max(1),
            thought_connections: HashMap::new(),
            blocked_paths: BTreeSet::new(),
            alternative_paths: HashMap::new(),
            context_stack: Vec::new(),
            context_switches: Vec::new(),
            sequence: 0,
        }
    }

    /// Allocate a fresh identifier seeded by `seed`.
    pub fn next_id(&mut self, seed: &str) -> String {
        self.sequence += 1;
        generate_id(seed, self.sequence)
    }

    // ------------------------------------------------------------------
    // Thoughts
    // ------------------------------------------------------------------

    /// Create and register a thought, returning its id.
    ///
    /// The parent link is recorded on the new thought only; callers append
    /// the child to the parent with [`EntityStore::add_child`].
    pub fn create_thought(
        &mut self,
        thought_type: ThoughtType,
        content: impl Into<String>,
        context: &str,
        depth: usize,
        parent: Option<&str>,
    ) -> ThoughtId {
        let content = content.into();
        let id = self.next_id(&content);
        let mut thought = Thought::new(id, thought_type, content, context, depth);
        if let Some(parent) = parent {
            thought = thought.with_parent(parent);
        }
        self.insert_thought(thought)
    }

    /// Register an already-built thought.
    pub fn insert_thought(&mut self, thought: Thought) -> ThoughtId {
        let id = thought.id.clone();
        if let Some(context) = self.contexts.get_mut(&thought.context) {
            context.add_thought(id.clone());
        }
        self.thoughts.insert(id.clone(), thought);

        self.active_thoughts.push_back(id.clone());
        while self.active_thoughts.len() > self.active_capacity {
            if let Some(evicted) = self.active_thoughts.pop_front() {
                debug!(thought_id = %evicted, "Evicted thought from recent window");
            }
        }
        id
    }

    /// Get a thought by ID.
    pub fn thought(&self, id: &str) -> Option<&Thought> {
        self.thoughts.get(id)
    }

    /// Get a mutable thought by ID.
    pub fn thought_mut(&mut self, id: &str) -> Option<&mut Thought> {
        self.thoughts.get_mut(id)
    }

    /// Append `child` to `parent`'s children. Returns false if the parent is unknown.
    pub fn add_child(&mut self, parent: &str, child: &str) -> bool {
        match self.thoughts.get_mut(parent) {
            Some(thought) => {
                thought.child_thoughts.push(child.to_string());
                true
            }
            None => false,
        }
    }

    /// The most recent `limit` thought ids, oldest first.
    pub fn recent_thoughts(&self, limit: usize) -> Vec<ThoughtId> {
        let skip = self.active_thoughts.len().saturating_sub(limit);
        self.active_thoughts.iter().skip(skip).cloned().collect()
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Link two distinct, known thoughts in both directions.
    ///
    /// Returns true only when the pair was not already connected.
    pub fn connect(&mut self, a: &str, b: &str) -> bool {
        if a == b || !self.thoughts.contains_key(a) || !self.thoughts.contains_key(b) {
            return false;
        }

        let added = self
            .thought_connections
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.thought_connections
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());

        if let Some(thought) = self.thoughts.get_mut(a) {
            thought.connections.insert(b.to_string());
        }
        if let Some(thought) = self.thoughts.get_mut(b) {
            thought.connections.insert(a.to_string());
        }
        added
    }

    /// Adjacency of a thought in the connection index.
    pub fn connections_of(&self, id: &str) -> Option<&BTreeSet<ThoughtId>> {
        self.thought_connections.get(id)
    }

    // ------------------------------------------------------------------
    // Blockers and alternatives
    // ------------------------------------------------------------------

    /// Record the alternatives generated for a blocker.
    ///
    /// The first recording wins; later calls return false and change nothing.
    pub fn record_alternatives(&mut self, blocked: &str, alternatives: Vec<ThoughtId>) -> bool {
        if self.alternative_paths.contains_key(blocked) {
            return false;
        }
        self.alternative_paths
            .insert(blocked.to_string(), alternatives);
        true
    }

    /// Alternatives recorded for a blocker, if any.
    pub fn alternatives_for(&self, blocked: &str) -> Option<&[ThoughtId]> {
        self.alternative_paths.get(blocked).map(Vec::as_slice)
    }

    /// Whether alternatives were already recorded for a blocker.
    pub fn has_alternatives(&self, blocked: &str) -> bool {
        self.alternative_paths.contains_key(blocked)
    }

    /// Remember a thought that was promoted to a blocker.
    pub fn mark_blocked_path(&mut self, id: &str) {
        self.blocked_paths.insert(id.to_string());
    }

    // ------------------------------------------------------------------
    // Contexts
    // ------------------------------------------------------------------

    /// Create and register a context.
    ///
    /// A known parent gets the new id appended to its sub-contexts. No cycle
    /// detection is performed.
    pub fn create_context(&mut self, name: &str, parent: Option<&str>) -> ContextId {
        let id = self.next_id(name);
        let mut context = Context::new(id.clone(), name);
        if let Some(parent_id) = parent {
            context = context.with_parent(parent_id);
            match self.contexts.get_mut(parent_id) {
                Some(parent) => parent.sub_contexts.push(id.clone()),
                None => debug!(parent = %parent_id, "Parent context unknown, not linking"),
            }
        }
        self.contexts.insert(id.clone(), context);
        id
    }

    /// Get a context by ID.
    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    /// Get a mutable context by ID.
    pub fn context_mut(&mut self, id: &str) -> Option<&mut Context> {
        self.contexts.get_mut(id)
    }

    /// Ids of every context, sorted.
    pub fn context_ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<_> = self.contexts.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Top of the current-context stack.
    pub fn current_context(&self) -> Option<&ContextId> {
        self.context_stack.last()
    }

    /// Push a known context onto the stack.
    pub fn push_context(&mut self, id: &str) -> bool {
        if !self.contexts.contains_key(id) {
            return false;
        }
        self.context_stack.push(id.to_string());
        true
    }

    /// Pop the top of the stack.
    pub fn pop_context(&mut self) -> Option<ContextId> {
        self.context_stack.pop()
    }

    /// Replace the top of the stack, returning what was there.
    pub fn replace_current_context(&mut self, id: &str) -> Option<ContextId> {
        let previous = self.context_stack.pop();
        self.context_stack.push(id.to_string());
        previous
    }

    /// Append a switch event.
    pub fn record_switch(&mut self, switch: ContextSwitch) {
        self.context_switches.push(switch);
    }

    /// Every recorded switch, oldest first.
    pub fn context_switches(&self) -> &[ContextSwitch] {
        &self.context_switches
    }

    // ------------------------------------------------------------------
    // Reasoning chains and work items
    // ------------------------------------------------------------------

    /// Register a finished chain.
    pub fn insert_chain(&mut self, chain: ReasoningChain) {
        self.reasoning_chains.insert(chain.id.clone(), chain);
    }

    /// Get a chain by ID.
    pub fn chain(&self, id: &str) -> Option<&ReasoningChain> {
        self.reasoning_chains.get(id)
    }

    /// Register a work item.
    pub fn insert_work_item(&mut self, item: WorkItem) {
        self.work_items.insert(item.id.clone(), item);
    }

    /// Get a work item by ID.
    pub fn work_item(&self, id: &str) -> Option<&WorkItem> {
        self.work_items.get(id)
    }

    /// Get a mutable work item by ID.
    pub fn work_item_mut(&mut self, id: &str) -> Option<&mut WorkItem> {
        self.work_items.get_mut(id)
    }

    // ------------------------------------------------------------------
    // Counters
    // ------------------------------------------------------------------

    /// Number of thoughts ever created.
    pub fn thought_count(&self) -> usize {
        self.thoughts.len()
    }

    /// Number of thoughts in the recent window.
    pub fn active_thought_count(&self) -> usize {
        self.active_thoughts.len()
    }

    /// Number of contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Number of registered reasoning chains.
    pub fn chain_count(&self) -> usize {
        self.reasoning_chains.len()
    }

    /// Number of work items.
    pub fn work_item_count(&self) -> usize {
        self.work_items.len()
    }

    /// Number of thoughts promoted to blockers.
    pub fn blocked_path_count(&self) -> usize {
        self.blocked_paths.len()
    }

    /// Number of blockers with recorded alternatives.
    pub fn alternative_path_count(&self) -> usize {
        self.alternative_paths.len()
    }

    /// Sum of adjacency sizes; every link counts once per endpoint.
    pub fn connection_count(&self) -> usize {
        self.thought_connections.values().map(BTreeSet::len).sum()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}
