use thiserror::Error;

/// Base error type for the reasoning engine.
///
/// Graph-internal inconsistencies (unknown ids, empty inputs) are never
/// surfaced through this type; they degrade to no-ops. Only boundary
/// failures reach the caller.
#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {message}")]
    Engine { message: String },
}

/// Configuration and option validation errors
///
/// Validation failures have no separate kind: an option that is out of
/// range or cannot be parsed is reported as `InvalidValue`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue { option: String, reason: String },

    #[error("Unknown configuration option: {option}")]
    UnknownOption { option: String },

    #[error("Malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(option: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for engine operations
pub type ReasonerResult<T> = Result<T, ReasonerError>;

/// Result type alias for configuration loading and validation
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasoner_error_display() {
        let err = ReasonerError::Engine {
            message: "loop stuck".to_string(),
        };
        assert_eq!(err.to_string(), "Engine error: loop stuck");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            option: "connection_threshold".to_string(),
            reason: "must be within 0.0..=1.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for connection_threshold: must be within 0.0..=1.0"
        );

        let err = ConfigError::UnknownOption {
            option: "max_width".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown configuration option: max_width");
    }

    #[test]
    fn test_invalid_helper() {
        let err = ConfigError::invalid("max_depth", "must be at least 1");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn test_malformed_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ConfigError = serde_err.into();
        assert!(matches!(err, ConfigError::Malformed(_)));
        assert!(err.to_string().starts_with("Malformed configuration:"));
    }

    #[test]
    fn test_config_error_conversion_to_reasoner_error() {
        let config_err = ConfigError::UnknownOption {
            option: "bogus".to_string(),
        };
        let err: ReasonerError = config_err.into();
        assert!(matches!(err, ReasonerError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown configuration option: bogus"
        );
    }
}
