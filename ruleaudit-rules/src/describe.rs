//! Plain-language descriptions of rules.

use std::collections::HashMap;

use crate::condition::{Condition, LogicalOperator};
use crate::index::ConditionIndex;
use crate::issue::Issue;
use crate::result::StructureInfo;
use crate::rule::Rule;
use crate::schema::FieldSchema;

/// Readable name for a comparison operator, e.g. `is greater than (>)`.
pub fn readable_operator(operator: &str) -> String {
    let phrase = match operator {
        "==" => "equals",
        "!=" => "does not equal",
        ">" => "is greater than",
        ">=" => "is greater than or equal to",
        "<" => "is less than",
        "<=" => "is less than or equal to",
        "in" => "is one of",
        "not_in" => "is none of",
        "contains" => "contains",
        "not_contains" => "does not contain",
        "starts_with" => "starts with",
        "ends_with" => "ends with",
        other => return other.to_string(),
    };
    format!("{} ({})", phrase, operator)
}

/// Indented outline of the condition tree.
pub fn rule_summary(rule: &Rule, schema: &FieldSchema) -> String {
    if rule.conditions.is_empty() {
        return "This rule has no conditions.".to_string();
    }
    let mut lines = vec!["This rule applies when:".to_string()];
    for condition in &rule.conditions {
        outline(condition, schema, 1, &mut lines);
    }
    lines.join("\n")
}

fn outline(condition: &Condition, schema: &FieldSchema, indent: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    match condition {
        Condition::Comparison(comparison) if comparison.field.is_empty() => {
            lines.push(format!("{}- (condition without a field)", pad));
        }
        Condition::Comparison(comparison) => {
            lines.push(format!(
                "{}- {} field '{}' {} '{}'",
                pad,
                schema.field_type(&comparison.field),
                comparison.field,
                readable_operator(&comparison.operator),
                comparison.value
            ));
        }
        Condition::Group(group) => {
            let heading = match group.logical_operator() {
                Some(LogicalOperator::And) => "All of the following must hold:".to_string(),
                Some(LogicalOperator::Or) => "At least one of the following must hold:".to_string(),
                None => format!("Group with unsupported operator '{}':", group.operator),
            };
            lines.push(format!("{}- {}", pad, heading));
            for child in &group.conditions {
                outline(child, schema, indent + 1, lines);
            }
        }
    }
}

/// Up to two advisory remarks about the rule's shape; `None` for small, clean rules.
pub fn advisory_comment(
    index: &ConditionIndex<'_>,
    structure: &StructureInfo,
    schema: &FieldSchema,
    issues: &[Issue],
) -> Option<String> {
    if issues.is_empty() && structure.depth <= 2 && structure.condition_node_count <= 5 {
        return None;
    }

    let mut remarks = Vec::new();
    if structure.depth >= 4 || structure.condition_node_count >= 8 {
        remarks.push(
            "Deeply nested or large condition trees are hard to maintain; consider refactoring into simpler rules."
                .to_string(),
        );
    }

    let (mut and_groups, mut or_groups) = (0usize, 0usize);
    for (_, group) in index.groups() {
        match group.logical_operator() {
            Some(LogicalOperator::And) => and_groups += 1,
            Some(LogicalOperator::Or) => or_groups += 1,
            None => {}
        }
    }
    if or_groups > 2 && or_groups > and_groups * 2 {
        remarks.push(
            "The rule relies heavily on OR groups; check whether some alternatives overlap or can be merged."
                .to_string(),
        );
    }

    let mut per_field: Vec<(&str, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (_, comparison) in index.comparisons() {
        let field = comparison.field.as_str();
        match positions.get(field) {
            Some(slot) => per_field[*slot].1 += 1,
            None => {
                positions.insert(field, per_field.len());
                per_field.push((field, 1));
            }
        }
    }
    if let Some((field, count)) = per_field.into_iter().find(|(_, count)| *count >= 3) {
        remarks.push(format!(
            "{} has {} conditions; consider expressing them as a single range.",
            schema.label(field),
            count
        ));
    }

    if remarks.is_empty() {
        return None;
    }
    remarks.truncate(2);
    Some(remarks.join(" "))
}
