//! Command-line interface.
//!
//! Each command runs against a fresh in-memory engine and renders its result
//! as text, followed by a status snapshot.

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::engine::{ProblemPattern, ThinkingEngine, ThinkingStatus};

const RULE: &str = "═══════════════════════════════════════════════════════════════════════════════";

/// Continuous thinking engine.
#[derive(Parser, Debug)]
#[command(name = "deep-reasoner", version, about)]
pub struct Cli {
    /// Seed for reproducible expansion; overrides ENGINE_SEED
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Reasoner subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Think about a topic and print the reasoning chain
    Think {
        /// Topic to reason about
        topic: String,

        /// Maximum expansion depth
        #[arg(long, default_value = "3")]
        depth: usize,

        /// Number of recent thoughts to render in the graph
        #[arg(long, default_value = "20")]
        graph: usize,
    },

    /// Decompose a task and delegate the work items
    Lead {
        /// Task to lead
        task: String,

        /// Resource to delegate to (repeatable)
        #[arg(long = "resource")]
        resources: Vec<String>,

        /// Let the monitor run this long before reporting
        #[arg(long, default_value = "0")]
        wait_ms: u64,
    },

    /// Apply a problem-solving pattern to a problem
    Pattern {
        /// divide_and_conquer, reverse_engineer, lateral_thinking, first_principles or analogical
        pattern: String,

        /// Problem to reframe
        problem: String,
    },

    /// Show the effective configuration
    Config,
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a CLI command against `engine`.
pub async fn execute_command(engine: &ThinkingEngine, command: Commands) -> CliResult {
    match command {
        Commands::Think {
            topic,
            depth,
            graph,
        } => execute_think(engine, &topic, depth, graph).await,
        Commands::Lead {
            task,
            resources,
            wait_ms,
        } => execute_lead(engine, &task, &resources, wait_ms).await,
        Commands::Pattern { pattern, problem } => execute_pattern(engine, &pattern, &problem).await,
        Commands::Config => execute_config(engine.config()),
    }
}

/// Execute think command.
async fn execute_think(engine: &ThinkingEngine, topic: &str, depth: usize, graph: usize) -> CliResult {
    let chain = engine.think_about(topic, None, depth).await;
    let mut output = String::new();

    output.push_str("\nReasoning Chain\n");
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!("Chain: {}\n", chain.id));
    output.push_str(&format!("Thoughts: {}\n", chain.thoughts.len()));
    output.push_str(&format!("Confidence: {:.1}%\n\n", chain.confidence * 100.0));
    if let Some(conclusion) = &chain.conclusion {
        output.push_str(conclusion);
        output.push_str("\n\n");
    }

    output.push_str(&engine.visualize_thought_graph(graph).await);
    output.push_str("\n\n");
    output.push_str(&render_status(&engine.get_thinking_status().await));

    CliResult::success(output)
}

/// Execute lead command.
async fn execute_lead(
    engine: &ThinkingEngine,
    task: &str,
    resources: &[String],
    wait_ms: u64,
) -> CliResult {
    let summary = engine.lead_and_delegate(task, resources).await;
    if wait_ms > 0 {
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
    }

    let mut output = String::new();
    output.push_str("\nLeadership Summary\n");
    output.push_str(RULE);
    output.push_str("\n\n");
    output.push_str(&format!("Task: {}\n", summary.task));
    output.push_str(&format!("Context: {}\n", summary.context));
    output.push_str(&format!("Status: {}\n\n", summary.status));

    output.push_str(&format!("Work Items ({}):\n", summary.work_items.len()));
    for id in &summary.work_items {
        let Some(item) = engine.work_item(id).await else {
            continue;
        };
        let assignee = item.assigned_to.as_deref().unwrap_or("unassigned");
        output.push_str(&format!(
            "  {} [{}] -> {}: {}\n",
            item.id, item.status, assignee, item.description
        ));
    }
    output.push('\n');

    if let Some(decomposition) = &summary.decomposition {
        output.push_str("Decomposition:\n");
        output.push_str(decomposition);
        output.push_str("\n\n");
    }

    output.push_str(&render_status(&engine.get_thinking_status().await));
    CliResult::success(output)
}

/// Execute pattern command.
async fn execute_pattern(engine: &ThinkingEngine, pattern: &str, problem: &str) -> CliResult {
    let pattern = match pattern.parse::<ProblemPattern>() {
        Ok(p) => p,
        Err(e) => return CliResult::error(e),
    };
    let ids = engine.apply_pattern(pattern, problem, None).await;

    let mut output = String::new();
    output.push_str(&format!("\nPattern: {}\n", pattern));
    output.push_str(RULE);
    output.push_str("\n\n");
    for id in &ids {
        if let Some(thought) = engine.thought(id).await {
            output.push_str(&format!("  [{}] {}\n", thought.thought_type, thought.content));
        }
    }
    CliResult::success(output)
}

/// Execute config command.
fn execute_config(config: &Config) -> CliResult {
    let thinking = &config.thinking;
    let engine = &config.engine;
    let mut output = String::new();

    output.push_str("\nReasoner Configuration\n");
    output.push_str(RULE);
    output.push_str("\n\n");

    output.push_str("Thinking Settings:\n");
    output.push_str(&format!("  Max Depth: {}\n", thinking.max_depth));
    output.push_str(&format!("  Parallel Thoughts: {}\n", thinking.parallel_thoughts));
    output.push_str(&format!(
        "  Context Switch Threshold: {:.2}\n",
        thinking.context_switch_threshold
    ));
    output.push_str(&format!("  Blocker Timeout: {}s\n", thinking.blocker_timeout));
    output.push_str(&format!(
        "  Connection Threshold: {:.2}\n",
        thinking.connection_threshold
    ));
    output.push_str(&format!(
        "  Delegation Threshold: {}\n",
        thinking.delegation_threshold
    ));
    output.push('\n');

    output.push_str("Engine Settings:\n");
    output.push_str(&format!("  Tick Interval: {}ms\n", engine.tick_interval_ms));
    output.push_str(&format!("  Monitor Interval: {}ms\n", engine.monitor_interval_ms));
    output.push_str(&format!("  Active Capacity: {}\n", engine.active_capacity));
    output.push_str(&format!("  Connection Window: {}\n", engine.connection_window));
    output.push_str(&format!(
        "  Seed: {}\n",
        engine
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "entropy".to_string())
    ));
    output.push('\n');

    output.push_str("Logging Settings:\n");
    output.push_str(&format!("  Level: {}\n", config.logging.level));
    output.push_str(&format!("  Format: {:?}\n", config.logging.format));

    CliResult::success(output)
}

fn render_status(status: &ThinkingStatus) -> String {
    let mut output = String::from("Engine Status:\n");
    output.push_str(&format!("  Thoughts: {} ({} recent)\n", status.total_thoughts, status.active_thoughts));
    output.push_str(&format!("  Contexts: {}\n", status.contexts));
    output.push_str(&format!("  Reasoning Chains: {}\n", status.reasoning_chains));
    output.push_str(&format!("  Work Items: {}\n", status.work_items));
    output.push_str(&format!("  Blocked Paths: {}\n", status.blocked_paths));
    output.push_str(&format!("  Alternative Paths: {}\n", status.alternative_paths));
    output.push_str(&format!("  Connections: {}\n", status.thought_connections));
    output.push_str(&format!("  Context Switches: {}\n", status.context_switches));
    output.push_str(&format!(
        "  Current Context: {}\n",
        status.current_context.as_deref().unwrap_or("none")
    ));
    output
}
