//! Normalization of heterogeneous rule JSON into [`Rule`].
//!
//! Accepts the canonical serde shape as well as the legacy editor shape
//! where groups are written as `{field: "placeholder", operator: "AND",
//! conditions: [...]}` and operators may be mnemonics such as `gte`.

use serde_json::{Map, Value};

use crate::action::RuleAction;
use crate::condition::{Condition, LogicalOperator};
use crate::error::RuleError;
use crate::rule::Rule;
use crate::value::FieldValue;

const DEFAULT_RULE_NAME: &str = "Unnamed Rule";

/// Builds a [`Rule`] from a raw JSON payload.
pub fn rule_from_json(raw: &Value) -> Result<Rule, RuleError> {
    let object = unwrap_envelope(raw)
        .as_object()
        .ok_or_else(|| RuleError::shape("rule", "expected a JSON object"))?;

    let conditions = match object.get("conditions") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(position, item)| condition_from_json(item, &format!("conditions[{}]", position)))
            .collect::<Result<Vec<_>, _>>()?,
        Some(anchor @ Value::Object(_)) => vec![condition_from_json(anchor, "conditions")?],
        Some(_) => return Err(RuleError::shape("conditions", "expected a list or an object")),
    };

    Ok(Rule {
        id: text_or_number(object.get("id").or_else(|| object.get("ruleId"))),
        name: object
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_RULE_NAME)
            .to_string(),
        description: object
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        conditions,
        actions: actions_from_json(object)?,
        priority: priority(object.get("priority"))?,
        enabled: object
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or_else(Rule::default_enabled),
    })
}

fn unwrap_envelope(raw: &Value) -> &Value {
    for key in ["rule_json", "rule"] {
        if let Some(inner @ Value::Object(_)) = raw.get(key) {
            return inner;
        }
    }
    raw
}

fn text_or_number(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn priority(value: Option<&Value>) -> Result<i64, RuleError> {
    match value {
        None | Some(Value::Null) => Ok(Rule::default_priority()),
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| RuleError::shape("priority", "expected an integer")),
        Some(Value::String(text)) => text
            .trim()
            .parse()
            .map_err(|_| RuleError::shape("priority", format!("'{}' is not an integer", text))),
        Some(_) => Err(RuleError::shape("priority", "expected an integer")),
    }
}

fn actions_from_json(object: &Map<String, Value>) -> Result<Vec<RuleAction>, RuleError> {
    let raw: Vec<&Value> = match (object.get("actions"), object.get("action")) {
        (Some(Value::Array(items)), _) => items.iter().collect(),
        (Some(single @ Value::Object(_)), _) | (None, Some(single @ Value::Object(_))) => vec![single],
        (None | Some(Value::Null), _) => Vec::new(),
        (Some(_), _) => return Err(RuleError::shape("actions", "expected a list of actions")),
    };

    raw.into_iter()
        .enumerate()
        .map(|(position, item)| {
            let path = format!("actions[{}]", position);
            let entry = item
                .as_object()
                .ok_or_else(|| RuleError::shape(&path, "expected an object"))?;
            let action_type = entry
                .get("action_type")
                .or_else(|| entry.get("type"))
                .and_then(Value::as_str)
                .ok_or_else(|| RuleError::shape(&path, "missing action_type"))?;
            let parameters = match entry.get("parameters") {
                Some(Value::Object(parameters)) => parameters.clone(),
                _ => Map::new(),
            };
            Ok(RuleAction {
                action_type: action_type.to_string(),
                parameters,
            })
        })
        .collect()
}

/// Converts one condition node, canonical or legacy.
pub fn condition_from_json(raw: &Value, path: &str) -> Result<Condition, RuleError> {
    let object = raw
        .as_object()
        .ok_or_else(|| RuleError::shape(path, "expected a condition object"))?;

    if let Some(tag) = object.get("type").and_then(Value::as_str) {
        if matches!(tag, "comparison" | "group") {
            return serde_json::from_value(raw.clone())
                .map_err(|err| RuleError::shape(path, err.to_string()));
        }
    }

    let field = object.get("field").and_then(Value::as_str).map(str::trim);
    let operator = object
        .get("operator")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    let children = match object.get("conditions") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items),
        Some(_) => return Err(RuleError::shape(path, "nested conditions must be a list")),
    };

    let sentinel_field = match field {
        None => true,
        Some(name) => matches!(
            name.to_ascii_lowercase().as_str(),
            "" | "placeholder" | "group" | "and" | "or"
        ),
    };
    let logical_operator = matches!(operator.to_ascii_uppercase().as_str(), "AND" | "OR" | "GROUP");

    // A node naming a real field is always a comparison, nested list or not.
    if sentinel_field && (children.is_some() || logical_operator) {
        let group_operator = match (LogicalOperator::parse(operator), field.and_then(LogicalOperator::parse)) {
            (Some(parsed), _) => parsed.as_str().to_string(),
            (None, Some(parsed)) => parsed.as_str().to_string(),
            (None, None) => operator.to_string(),
        };
        let conditions = children
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(position, item)| {
                        condition_from_json(item, &format!("{}.conditions[{}]", path, position))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();
        return Ok(Condition::group(group_operator, conditions));
    }

    Ok(Condition::compare(
        field.unwrap_or_default(),
        normalize_operator(operator),
        FieldValue::from_json(object.get("value").unwrap_or(&Value::Null)),
    ))
}

/// Maps operator mnemonics to their symbols; anything else is lower-cased.
pub fn normalize_operator(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let symbol = match lowered.as_str() {
        "eq" | "equals" | "=" => "==",
        "neq" | "ne" | "not_equals" | "<>" => "!=",
        "gt" => ">",
        "gte" | "ge" => ">=",
        "lt" => "<",
        "lte" | "le" => "<=",
        "not in" | "notin" => "not_in",
        _ => return lowered,
    };
    symbol.to_string()
}
