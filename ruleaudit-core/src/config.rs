use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::errors::{AuditError, ConfigError};

const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8000";
const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_LLM_MODEL: &str = "gpt-4";

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Connection settings for the external report generator.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl GeneratorSettings {
    /// Whether credentials are available to call the generator at all.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Process-wide configuration shared by the CLI and the HTTP service.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub environment: Environment,
    pub http_bind: String,
    pub schema_path: Option<PathBuf>,
    pub max_depth: usize,
    pub depth_warning: usize,
    pub node_warning: usize,
    pub generator: GeneratorSettings,
}

impl AuditConfig {
    /// Loads configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let environment = read("RULEAUDIT_ENV")
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();
        let http_bind = read("RULEAUDIT_HTTP_BIND").unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string());
        let schema_path = read("RULEAUDIT_SCHEMA_PATH").map(PathBuf::from);

        let max_depth = parse_or("RULEAUDIT_MAX_DEPTH", read("RULEAUDIT_MAX_DEPTH"), 50usize)?;
        let depth_warning = parse_or(
            "RULEAUDIT_MAX_DEPTH_WARNING",
            read("RULEAUDIT_MAX_DEPTH_WARNING"),
            5usize,
        )?;
        let node_warning = parse_or(
            "RULEAUDIT_MAX_NODES_WARNING",
            read("RULEAUDIT_MAX_NODES_WARNING"),
            10usize,
        )?;

        let raw_url = read("RULEAUDIT_LLM_URL").unwrap_or_else(|| DEFAULT_LLM_URL.to_string());
        let base_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            key: "RULEAUDIT_LLM_URL".into(),
            source,
        })?;
        let timeout_secs = parse_or(
            "RULEAUDIT_LLM_TIMEOUT_SECS",
            read("RULEAUDIT_LLM_TIMEOUT_SECS"),
            30u64,
        )?;

        let generator = GeneratorSettings {
            api_key: read("OPENAI_API_KEY"),
            model: read("RULEAUDIT_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            environment,
            http_bind,
            schema_path,
            max_depth,
            depth_warning,
            node_warning,
            generator,
        })
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// Helper that loads config and converts to the canonical error type.
pub fn load_audit_config() -> Result<AuditConfig, AuditError> {
    Ok(AuditConfig::from_env()?)
}
