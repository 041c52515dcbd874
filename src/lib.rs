//! # Deep Reasoner
//!
//! A continuously running thinking engine. It grows a graph of thoughts by
//! recursive expansion, scans it for blockers and routes around them with
//! alternative paths, links similar thoughts, switches away from blocked
//! contexts, and decomposes tasks into delegated work items that are
//! monitored in the background.
//!
//! ## Features
//!
//! - **Recursive expansion**: each thought is explored from three perspectives,
//!   with recursion gated by an injectable randomness source
//! - **Blocker detection**: keyword-based, with three alternative paths per blocker
//! - **Connection discovery**: Jaccard similarity over the recent-thoughts window
//! - **Context switching**: moves focus from a blocked context to an unblocked sibling
//! - **Delegation**: round-robin assignment of work items with cancellable monitors
//! - **Problem patterns**: divide and conquer, reverse engineering, lateral,
//!   first principles and analogical reframing
//!
//! ## Architecture
//!
//! ```text
//! Caller → ThinkingEngine → EngineCore → EntityStore (in memory)
//!               ↓                ↑
//!        background loop ────────┘
//!        delegated-work monitors
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use deep_reasoner::{Config, ThinkingEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ThinkingEngine::new(Config::from_env()?)?;
//!     let chain = engine.think_about("How to scale the service", None, 3).await;
//!     println!("{}", chain.conclusion.unwrap_or_default());
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line interface commands and rendering.
pub mod cli;
/// Configuration management for the engine.
pub mod config;
/// Thinking engine, background loop and delegation.
pub mod engine;
/// Error types and result aliases.
pub mod error;
/// Blocker keywords, similarity and content templates.
pub mod heuristics;
/// Injectable randomness for the expansion gate.
pub mod random;
/// In-memory entity storage.
pub mod storage;

pub use config::Config;
pub use engine::{
    BackgroundThought, LeadershipSummary, MaintenanceReport, MonitorOutcome, ProblemPattern,
    ThinkingEngine, ThinkingStatus,
};
pub use error::{ConfigError, ReasonerError, ReasonerResult};
