use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action attached to a rule. Analysis never executes actions; they are
/// carried so reports can echo the complete rule definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleAction {
    /// Kind of action, e.g. `apply_discount`.
    pub action_type: String,
    /// Free-form parameters passed to the action.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl RuleAction {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}
