//! Remediation hints attached to issues, keyed by issue type and field type.

use crate::schema::{FieldSchema, FieldType};
use crate::value::FieldValue;

pub(crate) fn empty_rule() -> String {
    "Add at least one condition that describes when the rule applies.".to_string()
}

pub(crate) fn invalid_operator(schema: &FieldSchema, field: &str) -> String {
    let label = schema.label(field);
    let allowed = schema.allowed_operators(field).join(", ");
    let hint = match schema.field_type(field) {
        FieldType::String => "text fields compare with ==, != or contains, never with >, >=, < or <=",
        FieldType::Number => "numeric fields compare with ==, >, < and their variants",
        FieldType::Boolean => "boolean fields only compare with == and !=",
        FieldType::Date => "date fields compare with ==, <= and >= style operators",
        FieldType::Array => "list fields compare with contains and not_contains",
    };
    format!("Use one of the operators allowed for {}: {} ({}).", label, allowed, hint)
}

pub(crate) fn type_mismatch(schema: &FieldSchema, field: &str, value: &FieldValue) -> String {
    let label = schema.label(field);
    let field_type = schema.field_type(field);
    if field_type == FieldType::Number {
        if let Some(number) = value.as_text().and_then(|text| text.trim().parse::<f64>().ok()) {
            return format!(
                "{} must be a number. Use {} instead of the string \"{}\".",
                label,
                FieldValue::Number(number),
                value
            );
        }
    }
    format!(
        "{} expects a {} value, for example {}.",
        label,
        field_type,
        field_type.example()
    )
}

pub(crate) fn duplicate(schema: &FieldSchema, field: &str) -> String {
    format!(
        "Keep a single copy of the repeated condition on {} and remove the others.",
        schema.label(field)
    )
}

pub(crate) fn self_contradiction(schema: &FieldSchema, field: &str) -> String {
    format!(
        "Rewrite the conditions on {} so that some value can satisfy all of them, or move the alternatives into an OR group.",
        schema.label(field)
    )
}

pub(crate) fn missing_zero_case(schema: &FieldSchema, field: &str) -> String {
    format!(
        "Add an explicit condition for {} = 0 (or its default value) so that case is handled.",
        schema.label(field)
    )
}

pub(crate) fn ambiguous_branch(schema: &FieldSchema, field: &str) -> String {
    format!(
        "Give every possible {} value exactly one branch: make the OR alternatives disjoint and cover the remaining values.",
        schema.label(field)
    )
}

pub(crate) fn complexity() -> String {
    "Split the rule into smaller rules or flatten nested groups that use the same operator.".to_string()
}

pub(crate) fn invalid_structure() -> String {
    "Use AND or OR as the group operator and give every group at least one condition.".to_string()
}

pub(crate) fn analysis_error() -> String {
    "Check the format and the values of the condition.".to_string()
}
