use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Ordering comparisons. String fields never accept these.
pub const ORDERING_OPERATORS: [&str; 4] = [">", ">=", "<", "<="];

/// Membership comparisons whose value is a list of candidates.
pub const MEMBERSHIP_OPERATORS: [&str; 2] = ["in", "not_in"];

pub fn is_ordering(operator: &str) -> bool {
    ORDERING_OPERATORS.contains(&operator)
}

pub fn is_membership(operator: &str) -> bool {
    MEMBERSHIP_OPERATORS.contains(&operator)
}

/// Logical operator combining the children of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// Parses `AND`/`OR` case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AND" => Some(LogicalOperator::And),
            "OR" => Some(LogicalOperator::Or),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf condition testing one field against one literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: FieldValue,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FieldValue::Text(text) => write!(f, "{} {} \"{}\"", self.field, self.operator, text),
            value => write!(f, "{} {} {}", self.field, self.operator, value),
        }
    }
}

/// Group combining nested conditions.
///
/// The operator is kept as authored so that anything other than `AND`/`OR`
/// can be reported instead of silently coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn logical_operator(&self) -> Option<LogicalOperator> {
        LogicalOperator::parse(&self.operator)
    }
}

/// Node of a rule's condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Comparison(Comparison),
    Group(ConditionGroup),
}

impl Condition {
    pub fn compare(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Condition::Comparison(Comparison {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        })
    }

    pub fn group(operator: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Condition::Group(ConditionGroup {
            operator: operator.into(),
            conditions,
        })
    }

    /// All nested conditions must hold.
    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::group(LogicalOperator::And.as_str(), conditions)
    }

    /// At least one nested condition must hold.
    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::group(LogicalOperator::Or.as_str(), conditions)
    }

    pub fn as_comparison(&self) -> Option<&Comparison> {
        match self {
            Condition::Comparison(comparison) => Some(comparison),
            Condition::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            Condition::Group(group) => Some(group),
            Condition::Comparison(_) => None,
        }
    }

    pub fn children(&self) -> &[Condition] {
        match self {
            Condition::Group(group) => &group.conditions,
            Condition::Comparison(_) => &[],
        }
    }
}
