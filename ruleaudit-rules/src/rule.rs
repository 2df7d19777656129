use crate::action::RuleAction;
use crate::condition::Condition;
use serde::{Deserialize, Serialize};

/// Declarative business rule: a condition forest and the actions it triggers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    /// Identifier, when the source carried one.
    #[serde(default)]
    pub id: Option<String>,
    /// Human readable name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Top-level conditions, implicitly AND-combined.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Actions executed when the conditions match.
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    /// Execution priority. Lower numbers run first.
    #[serde(default = "Rule::default_priority")]
    pub priority: i64,
    /// Whether the rule is active.
    #[serde(default = "Rule::default_enabled")]
    pub enabled: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            conditions,
            actions: Vec::new(),
            priority: Self::default_priority(),
            enabled: Self::default_enabled(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn default_priority() -> i64 {
        1
    }

    pub fn default_enabled() -> bool {
        true
    }

    /// Identifier used in reports; `N/A` when the rule has none.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("N/A")
    }
}
