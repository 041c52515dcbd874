use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Names accepted by [`ThinkingConfig::from_options`].
pub const THINKING_OPTIONS: [&str; 6] = [
    "max_depth",
    "parallel_thoughts",
    "context_switch_threshold",
    "blocker_timeout",
    "connection_threshold",
    "delegation_threshold",
];

/// Upper bound for `max_depth`; expansion is exponential in depth.
pub const MAX_DEPTH_LIMIT: usize = 32;

/// Upper bound for `parallel_thoughts`, the background worker pool size.
pub const MAX_PARALLEL_THOUGHTS: usize = 1024;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub thinking: ThinkingConfig,
    pub engine: EngineConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Options that shape how the engine thinks.
///
/// Only `max_depth`, `parallel_thoughts` and `connection_threshold` drive
/// behavior; the remaining options are carried and reported but reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkingConfig {
    /// Cap applied to the depth requested from `think_about`.
    pub max_depth: usize,
    /// Worker pool size for background-thought handlers.
    pub parallel_thoughts: usize,
    /// Reserved.
    pub context_switch_threshold: f64,
    /// Reserved, in seconds.
    pub blocker_timeout: u64,
    /// Jaccard similarity a pair must exceed to become connected.
    pub connection_threshold: f64,
    /// Reserved.
    pub delegation_threshold: usize,
}

/// Runtime knobs for the background loop, monitors and indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Background maintenance tick, in milliseconds.
    pub tick_interval_ms: u64,
    /// Poll interval of each delegated-work monitor, in milliseconds.
    pub monitor_interval_ms: u64,
    /// Capacity of the recent-thoughts ring buffer.
    pub active_capacity: usize,
    /// How many of the most recent thoughts connection discovery compares.
    pub connection_window: usize,
    /// Seed for the randomness source; entropy when absent.
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let config = Config {
            logging,
            thinking: ThinkingConfig::from_env()?,
            engine: EngineConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.thinking.validate()?;
        self.engine.validate()
    }
}

impl ThinkingConfig {
    /// Load from environment variables. Unparsable values are rejected.
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_depth: env_or("THINKING_MAX_DEPTH", "max_depth", defaults.max_depth)?,
            parallel_thoughts: env_or(
                "THINKING_PARALLEL_THOUGHTS",
                "parallel_thoughts",
                defaults.parallel_thoughts,
            )?,
            context_switch_threshold: env_or(
                "THINKING_CONTEXT_SWITCH_THRESHOLD",
                "context_switch_threshold",
                defaults.context_switch_threshold,
            )?,
            blocker_timeout: env_or(
                "THINKING_BLOCKER_TIMEOUT",
                "blocker_timeout",
                defaults.blocker_timeout,
            )?,
            connection_threshold: env_or(
                "THINKING_CONNECTION_THRESHOLD",
                "connection_threshold",
                defaults.connection_threshold,
            )?,
            delegation_threshold: env_or(
                "THINKING_DELEGATION_THRESHOLD",
                "delegation_threshold",
                defaults.delegation_threshold,
            )?,
        })
    }

    /// Build from a JSON object of options, rejecting unknown names.
    pub fn from_options(options: serde_json::Value) -> ConfigResult<Self> {
        let map = options
            .as_object()
            .ok_or_else(|| ConfigError::invalid("options", "expected a JSON object"))?;

        if let Some(unknown) = map
            .keys()
            .find(|key| !THINKING_OPTIONS.contains(&key.as_str()))
        {
            return Err(ConfigError::UnknownOption {
                option: unknown.clone(),
            });
        }

        let config: ThinkingConfig = serde_json::from_value(options)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every option is within its accepted range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::invalid(
                "max_depth",
                format!("must be within 1..={}", MAX_DEPTH_LIMIT),
            ));
        }
        if self.parallel_thoughts == 0 || self.parallel_thoughts > MAX_PARALLEL_THOUGHTS {
            return Err(ConfigError::invalid(
                "parallel_thoughts",
                format!("must be within 1..={}", MAX_PARALLEL_THOUGHTS),
            ));
        }
        check_unit_interval("context_switch_threshold", self.context_switch_threshold)?;
        if self.blocker_timeout == 0 {
            return Err(ConfigError::invalid("blocker_timeout", "must be at least 1"));
        }
        check_unit_interval("connection_threshold", self.connection_threshold)
    }
}

impl EngineConfig {
    /// Load from environment variables. Unparsable values are rejected.
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        let seed = match env::var("ENGINE_SEED") {
            Ok(raw) => Some(parse_value("ENGINE_SEED", "seed", &raw)?),
            Err(_) => None,
        };

        Ok(Self {
            tick_interval_ms: env_or(
                "ENGINE_TICK_INTERVAL_MS",
                "tick_interval_ms",
                defaults.tick_interval_ms,
            )?,
            monitor_interval_ms: env_or(
                "ENGINE_MONITOR_INTERVAL_MS",
                "monitor_interval_ms",
                defaults.monitor_interval_ms,
            )?,
            active_capacity: env_or(
                "ENGINE_ACTIVE_CAPACITY",
                "active_capacity",
                defaults.active_capacity,
            )?,
            connection_window: env_or(
                "ENGINE_CONNECTION_WINDOW",
                "connection_window",
                defaults.connection_window,
            )?,
            seed,
        })
    }

    /// Check intervals and capacities are non-zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("tick_interval_ms", "must be at least 1"));
        }
        if self.monitor_interval_ms == 0 {
            return Err(ConfigError::invalid("monitor_interval_ms", "must be at least 1"));
        }
        if self.active_capacity == 0 {
            return Err(ConfigError::invalid("active_capacity", "must be at least 1"));
        }
        if self.connection_window == 0 {
            return Err(ConfigError::invalid("connection_window", "must be at least 1"));
        }
        Ok(())
    }

    /// Background tick as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Monitor poll interval as a `Duration`.
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

fn check_unit_interval(option: &str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(option, "must be within 0.0..=1.0"))
    }
}

fn parse_value<T: FromStr>(var: &str, option: &str, raw: &str) -> ConfigResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(option, format!("cannot parse {}={:?}", var, raw)))
}

fn env_or<T: FromStr>(var: &str, option: &str, default: T) -> ConfigResult<T> {
    match env::var(var) {
        Ok(raw) => parse_value(var, option, &raw),
        Err(_) => Ok(default),
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            parallel_thoughts: 20,
            context_switch_threshold: 0.3,
            blocker_timeout: 60,
            connection_threshold: 0.6,
            delegation_threshold: 5,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            monitor_interval_ms: 5000,
            active_capacity: 10_000,
            connection_window: 100,
            seed: None,
        }
    }
}
