use std::io;

use thiserror::Error;

/// Result type used across the core crate.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Canonical error representation shared by the binaries and services.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid rule definition: {0}")]
    InvalidRule(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("report generation failed: {0}")]
    Report(String),

    #[error("{0}")]
    General(String),
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Deserialization(err.to_string())
    }
}

impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        AuditError::General(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("invalid url in {key}: {source}")]
    InvalidUrl {
        key: String,
        #[source]
        source: url::ParseError,
    },
}

impl From<ConfigError> for AuditError {
    fn from(value: ConfigError) -> Self {
        AuditError::Config(value.to_string())
    }
}
