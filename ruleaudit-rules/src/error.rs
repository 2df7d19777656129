use std::path::PathBuf;

use thiserror::Error;

use crate::index::NodeId;

/// Errors returned when loading rules, rule payloads or schema files.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rules path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read rules from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules from {path}: {message}")]
    Parse { path: String, message: String },
    #[error("duplicate rule identifier detected: {id}")]
    DuplicateRule { id: String },
    #[error("malformed rule at {path}: {message}")]
    Shape { path: String, message: String },
    #[error("invalid field schema {path}: {message}")]
    Schema { path: String, message: String },
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }

    pub fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        RuleError::Shape {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code used by the HTTP API.
    pub fn code(&self) -> &'static str {
        match self {
            RuleError::MissingPath(_) | RuleError::Io { .. } => "io_error",
            RuleError::Parse { .. } => "parse_error",
            RuleError::DuplicateRule { .. } => "duplicate_rule",
            RuleError::Shape { .. } => "invalid_rule",
            RuleError::Schema { .. } => "invalid_schema",
        }
    }
}

/// Fault raised by a single analysis check. The analyzer turns it into an
/// `analysis_error` issue and keeps running the remaining checks.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckFault {
    #[error("value {value} is not a finite number")]
    NonFiniteNumber { node: NodeId, value: f64 },
    #[error("{0} is not part of the condition index")]
    UnknownNode(NodeId),
    #[error("nesting below {node} exceeds the maximum depth of {limit} and was not analyzed")]
    DepthLimit { node: NodeId, limit: usize },
}

impl CheckFault {
    /// Node the fault is attached to, if it concerns a single node.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            CheckFault::NonFiniteNumber { node, .. } => Some(*node),
            CheckFault::UnknownNode(node) => Some(*node),
            CheckFault::DepthLimit { node, .. } => Some(*node),
        }
    }
}
