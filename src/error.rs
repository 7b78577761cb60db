//! Error types for graph normalization and configuration loading

use std::fmt;
use std::path::PathBuf;

/// Fatal normalization errors
///
/// Any of these aborts the pipeline; the caller gets a failed
/// [`NormalizationResult`](crate::normalizer::NormalizationResult) with no
/// partial output.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// A connection closes a directed cycle through this node
    CycleDetected { node: String },
    /// A pattern property has a value of unexpected shape
    MalformedProperties {
        node: String,
        property: String,
        reason: String,
    },
    /// Two nodes share the same id
    DuplicateNode(String),
    /// A node feeds more than one target and the config rejects fan-out
    FanOutRejected { node: String, targets: Vec<String> },
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::CycleDetected { node } => write!(
                f,
                "Cycle detected: graph contains a cycle through node '{}'",
                node
            ),
            NormalizeError::MalformedProperties {
                node,
                property,
                reason,
            } => write!(
                f,
                "Malformed property '{}' on node '{}': {}",
                property, node, reason
            ),
            NormalizeError::DuplicateNode(id) => write!(f, "Duplicate node id '{}'", id),
            NormalizeError::FanOutRejected { node, targets } => write!(
                f,
                "Node '{}' fans out to {} targets ({}); fan-out is rejected by configuration",
                node,
                targets.len(),
                targets.join(", ")
            ),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Result type for pipeline stages
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Errors raised while loading a node schema or normalizer config
#[derive(Debug)]
pub enum ConfigError {
    /// IO error
    Io(std::io::Error),
    /// File content could not be parsed as any supported format
    Parse { path: Option<PathBuf>, message: String },
    /// File extension is neither .toml nor .json
    UnsupportedFormat(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse {
                path: Some(path),
                message,
            } => write!(f, "Failed to parse {}: {}", path.display(), message),
            ConfigError::Parse { path: None, message } => {
                write!(f, "Failed to parse configuration: {}", message)
            }
            ConfigError::UnsupportedFormat(path) => write!(
                f,
                "Unsupported configuration format: {} (expected .toml or .json)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_mentions_cycle() {
        let err = NormalizeError::CycleDetected {
            node: "lpf1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.to_lowercase().contains("cycle"));
        assert!(msg.contains("lpf1"));
    }

    #[test]
    fn test_fan_out_message_lists_targets() {
        let err = NormalizeError::FanOutRejected {
            node: "src".to_string(),
            targets: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Node 'src' fans out to 2 targets (a, b); fan-out is rejected by configuration"
        );
    }

    #[test]
    fn test_config_io_error_has_source() {
        use std::error::Error;
        let err = ConfigError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("IO error"));
    }
}
