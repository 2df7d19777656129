//! Core shared library for the ruleaudit workspace.
//!
//! The analyzer, report and CLI crates depend on the primitives exposed
//! here: configuration loading from the environment, the canonical error
//! types and the tracing subscriber setup.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{AuditConfig, Environment, GeneratorSettings};
pub use errors::{AuditError, ConfigError, Result as CoreResult};
