use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Runtime kind of a [`FieldValue`], used when grouping and explaining conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Date,
    Array,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal compared against a field in a comparison condition.
///
/// The variant is decided once, when the value is ingested: JSON numbers
/// become [`FieldValue::Number`], strings shaped `YYYY-MM-DD` become
/// [`FieldValue::Date`] and every other string stays [`FieldValue::Text`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Null => ValueKind::Null,
            FieldValue::Bool(_) => ValueKind::Boolean,
            FieldValue::Number(_) => ValueKind::Number,
            FieldValue::Text(_) => ValueKind::String,
            FieldValue::Date(_) => ValueKind::Date,
            FieldValue::List(_) => ValueKind::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the first non-finite number held by this value, if any.
    pub fn non_finite(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) if !value.is_finite() => Some(*value),
            FieldValue::List(items) => items.iter().find_map(FieldValue::non_finite),
            _ => None,
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(flag) => FieldValue::Bool(*flag),
            Value::Number(number) => FieldValue::Number(number.as_f64().unwrap_or(f64::NAN)),
            Value::String(text) => match parse_date(text) {
                Some(date) => FieldValue::Date(date),
                None => FieldValue::Text(text.clone()),
            },
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from_json).collect()),
            // Objects are not comparable literals; keep their JSON text so they still surface in reports.
            Value::Object(_) => FieldValue::Text(value.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(flag) => Value::Bool(*flag),
            FieldValue::Number(number) => {
                if is_integral(*number) {
                    Value::from(*number as i64)
                } else {
                    serde_json::Number::from_f64(*number)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // Only the canonical ten-character shape of a real calendar day counts as a date literal.
    if text.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

fn is_integral(number: f64) -> bool {
    number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(flag) => write!(f, "{}", flag),
            FieldValue::Number(number) if is_integral(*number) => write!(f, "{}", *number as i64),
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            FieldValue::List(items) => {
                f.write_str("[")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(FieldValue::from_json(&raw))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::from_json(&value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::from_json(&Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::from_json(&Value::String(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_date_shaped_strings() {
        assert_eq!(FieldValue::from("2023-01-31").kind(), ValueKind::Date);
        assert_eq!(FieldValue::from("2023-1-31").kind(), ValueKind::String);
        assert_eq!(FieldValue::from("2023-13-01").kind(), ValueKind::String);
        assert_eq!(FieldValue::from("2024-02-30").kind(), ValueKind::String);
        assert_eq!(FieldValue::from("2024-02-29").kind(), ValueKind::Date);
    }

    #[test]
    fn displays_integral_numbers_without_fraction() {
        assert_eq!(FieldValue::from(20).to_string(), "20");
        assert_eq!(FieldValue::from(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::from(json!([1, "a"])).to_string(), "[1, a]");
    }

    #[test]
    fn serializes_back_to_plain_json() {
        let value = FieldValue::from(json!({"nested": true}));
        assert_eq!(value.kind(), ValueKind::String);

        let list = FieldValue::from(json!([1, 2.5, "2024-02-29", null]));
        assert_eq!(
            serde_json::to_value(&list).expect("serialize"),
            json!([1, 2.5, "2024-02-29", null])
        );
    }

    #[test]
    fn finds_non_finite_numbers_inside_lists() {
        let value = FieldValue::List(vec![FieldValue::from(1), FieldValue::Number(f64::NAN)]);
        assert!(value.non_finite().is_some());
        assert!(FieldValue::from(3).non_finite().is_none());
    }
}
