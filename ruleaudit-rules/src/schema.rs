use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::condition::{is_membership, is_ordering};
use crate::error::RuleError;
use crate::value::FieldValue;

const NUMERIC_COMPARISONS: [&str; 6] = ["==", "!=", ">", "<", ">=", "<="];

/// Declared data type of a rule field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Date => "date",
        }
    }

    /// Operators accepted by every field of this type unless the field overrides them.
    pub fn default_operators(&self) -> &'static [&'static str] {
        match self {
            FieldType::String => &["==", "!=", "contains", "starts_with", "ends_with"],
            FieldType::Number => &["==", "!=", ">", "<", ">=", "<=", "in"],
            FieldType::Boolean => &["==", "!="],
            FieldType::Array => &["contains", "not_contains", "in", "not_in"],
            FieldType::Date => &["==", "!=", ">", "<", ">=", "<="],
        }
    }

    /// Example literal used in suggestions.
    pub fn example(&self) -> &'static str {
        match self {
            FieldType::String => "\"VIP\"",
            FieldType::Number => "100",
            FieldType::Boolean => "true",
            FieldType::Array => "[\"tag1\", \"tag2\"]",
            FieldType::Date => "\"2024-01-31\"",
        }
    }

    /// Whether `value` is an acceptable literal for a field of this type used with `operator`.
    ///
    /// `null` is always accepted. Membership operators expect a list whose
    /// elements fit the field type. Array fields otherwise require a list,
    /// except that `contains`/`not_contains` take the single element being
    /// looked for; every other operator with a scalar is a mismatch.
    pub fn accepts(&self, operator: &str, value: &FieldValue) -> bool {
        if value.is_null() {
            return true;
        }
        if let FieldType::Array = self {
            return match value {
                FieldValue::List(_) => true,
                _ => matches!(operator, "contains" | "not_contains"),
            };
        }
        if is_membership(operator) {
            return match value {
                FieldValue::List(items) => items.iter().all(|item| self.accepts_scalar(item)),
                _ => false,
            };
        }
        self.accepts_scalar(value)
    }

    fn accepts_scalar(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) => true,
            (FieldType::Number, FieldValue::Number(_)) => true,
            (FieldType::String, FieldValue::Text(_) | FieldValue::Date(_)) => true,
            (FieldType::Boolean, FieldValue::Bool(_)) => true,
            (FieldType::Boolean, FieldValue::Text(text)) => {
                text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")
            }
            (FieldType::Date, FieldValue::Date(_)) => true,
            (FieldType::Array, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business policy flags attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_group: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchemaEntry {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_operators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<FieldPolicy>,
}

impl FieldSchemaEntry {
    pub fn new(field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            field_type,
            description: description.into(),
            allowed_operators: None,
            policy: None,
        }
    }

    pub fn with_operators(mut self, operators: &[&str]) -> Self {
        self.allowed_operators = Some(operators.iter().map(|op| op.to_string()).collect());
        self
    }

    pub fn with_policy(mut self, sortable: bool, code_group: bool) -> Self {
        self.policy = Some(FieldPolicy {
            sortable: Some(sortable),
            code_group: Some(code_group),
        });
        self
    }
}

/// Registry of known fields. Read-only once analysis starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldSchemaEntry>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field registry shipped with the analyzer.
    pub fn builtin() -> Self {
        use FieldType::*;
        let numeric_override = ["==", "!=", ">", "<", ">=", "<=", "in"];

        Self::new()
            .with_field(
                "MBL_ACT_MEM_PCNT",
                FieldSchemaEntry::new(Number, "Mobile line count").with_operators(&numeric_override),
            )
            .with_field(
                "IOT_MEM_PCNT",
                FieldSchemaEntry::new(Number, "IoT line count").with_operators(&numeric_override),
            )
            .with_field("age", FieldSchemaEntry::new(Number, "Age"))
            .with_field("score", FieldSchemaEntry::new(Number, "Score"))
            .with_field("price", FieldSchemaEntry::new(Number, "Price"))
            .with_field("amount", FieldSchemaEntry::new(Number, "Amount"))
            .with_field("quantity", FieldSchemaEntry::new(Number, "Quantity"))
            .with_field(
                "ENTR_STUS_CD",
                FieldSchemaEntry::new(String, "Subscription status").with_policy(false, true),
            )
            .with_field(
                "MRKT_CD",
                FieldSchemaEntry::new(String, "Market code")
                    .with_policy(false, false)
                    .with_operators(&["==", "!=", "in"]),
            )
            .with_field("name", FieldSchemaEntry::new(String, "Name"))
            .with_field("grade", FieldSchemaEntry::new(String, "Grade"))
            .with_field("category", FieldSchemaEntry::new(String, "Category"))
            .with_field("membership", FieldSchemaEntry::new(String, "Membership"))
            .with_field("status", FieldSchemaEntry::new(String, "Status"))
            .with_field("tags", FieldSchemaEntry::new(Array, "Tag list"))
            .with_field("date", FieldSchemaEntry::new(Date, "Date"))
    }

    /// Loads a JSON or YAML map of field entries and layers it over the built-in registry.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
        let custom: FieldSchema = serde_yaml::from_str(&raw).map_err(|err| RuleError::Schema {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self::builtin().merge(custom))
    }

    pub fn with_field(mut self, name: impl Into<String>, entry: FieldSchemaEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: FieldSchemaEntry) {
        self.fields.insert(name.into(), entry);
    }

    /// Entries of `other` replace same-named entries of `self`.
    pub fn merge(mut self, other: FieldSchema) -> Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldSchemaEntry> {
        self.fields.get(field)
    }

    pub fn is_declared(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSchemaEntry)> {
        self.fields.iter()
    }

    /// Declared type of `field`; undeclared fields are treated as strings.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.get(field)
            .map(|entry| entry.field_type)
            .unwrap_or(FieldType::String)
    }

    /// Human readable label, e.g. `age (Age)`.
    pub fn label(&self, field: &str) -> String {
        match self.get(field) {
            Some(entry) if !entry.description.is_empty() => format!("{} ({})", field, entry.description),
            _ => field.to_string(),
        }
    }

    /// Operators configured for `field`: the field override if present, else the type default.
    pub fn allowed_operators(&self, field: &str) -> Vec<String> {
        match self.get(field).and_then(|entry| entry.allowed_operators.as_ref()) {
            Some(operators) => operators.clone(),
            None => self
                .field_type(field)
                .default_operators()
                .iter()
                .map(|op| op.to_string())
                .collect(),
        }
    }

    pub fn is_operator_allowed(&self, field: &str, operator: &str) -> bool {
        match self.field_type(field) {
            FieldType::Number if NUMERIC_COMPARISONS.contains(&operator) => return true,
            FieldType::String if is_ordering(operator) => return false,
            _ => {}
        }
        self.allowed_operators(field).iter().any(|allowed| allowed == operator)
    }

    /// Markdown listing of every field, used in reports and prompts.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|(name, entry)| {
                format!(
                    "- {} ({}): {}. Operators: {}",
                    name,
                    entry.field_type,
                    if entry.description.is_empty() { name } else { &entry.description },
                    self.allowed_operators(name).join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
