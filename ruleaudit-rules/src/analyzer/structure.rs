//! Per-node checks: value types, operators and group shape.

use crate::condition::{Comparison, Condition, ConditionGroup};
use crate::error::CheckFault;
use crate::index::NodeId;
use crate::issue::{Issue, IssueType};
use crate::suggestion;
use crate::value::FieldValue;

use super::AnalysisContext;

pub(super) type NodeOutcome = Result<Option<Issue>, CheckFault>;

pub(super) fn check_types(ctx: &AnalysisContext<'_>) -> Vec<(NodeId, NodeOutcome)> {
    ctx.index
        .comparisons()
        .map(|(entry, comparison)| (entry.id, leaf_type(ctx, entry.id, comparison)))
        .collect()
}

fn leaf_type(ctx: &AnalysisContext<'_>, id: NodeId, comparison: &Comparison) -> NodeOutcome {
    if let Some(value) = comparison.value.non_finite() {
        return Err(CheckFault::NonFiniteNumber { node: id, value });
    }
    if comparison.field.is_empty() {
        return Ok(None);
    }

    let field_type = ctx.schema.field_type(&comparison.field);
    if field_type.accepts(&comparison.operator, &comparison.value) {
        return Ok(None);
    }

    let explanation = format!(
        "Type mismatch: {} is a {} field, but `{}` compares it with a {} value.",
        ctx.schema.label(&comparison.field),
        field_type,
        comparison,
        describe_kind(&comparison.value)
    );
    Ok(Some(
        Issue::error(IssueType::TypeMismatch, id.to_string(), explanation)
            .with_field(comparison.field.clone())
            .with_suggestion(suggestion::type_mismatch(
                ctx.schema,
                &comparison.field,
                &comparison.value,
            )),
    ))
}

fn describe_kind(value: &FieldValue) -> String {
    match value {
        FieldValue::List(_) => "list".to_string(),
        other => other.kind().to_string(),
    }
}

/// Operator validation for leaves and shape validation for groups, in tree order.
/// Leaves that already failed the type check or faulted are skipped.
pub(super) fn check_nodes(ctx: &AnalysisContext<'_>) -> Vec<NodeOutcome> {
    ctx.index
        .entries()
        .iter()
        .filter(|entry| !ctx.type_failures.contains(&entry.id) && !ctx.faulted.contains(&entry.id))
        .map(|entry| match entry.node {
            Condition::Comparison(comparison) => Ok(leaf_operator(ctx, entry.id, comparison)),
            Condition::Group(group) => Ok(group_shape(entry.id, group)),
        })
        .collect()
}

fn leaf_operator(ctx: &AnalysisContext<'_>, id: NodeId, comparison: &Comparison) -> Option<Issue> {
    if comparison.field.is_empty() {
        return Some(
            Issue::error(
                IssueType::InvalidStructure,
                id.to_string(),
                format!("Comparison `{}` does not name a field.", comparison.operator),
            )
            .with_suggestion(suggestion::invalid_structure()),
        );
    }
    if ctx.schema.is_operator_allowed(&comparison.field, &comparison.operator) {
        return None;
    }

    let field_type = ctx.schema.field_type(&comparison.field);
    let mut explanation = format!(
        "Operator '{}' cannot be used with {} ({} field).",
        comparison.operator,
        ctx.schema.label(&comparison.field),
        field_type
    );
    if let Some(policy) = ctx.schema.get(&comparison.field).and_then(|entry| entry.policy.as_ref()) {
        if policy.sortable == Some(false) {
            explanation.push_str(" The field is not sortable.");
        }
        if policy.code_group == Some(true) {
            explanation.push_str(" Its values are codes from a code group.");
        }
    }
    Some(
        Issue::error(IssueType::InvalidOperator, id.to_string(), explanation)
            .with_field(comparison.field.clone())
            .with_suggestion(suggestion::invalid_operator(ctx.schema, &comparison.field)),
    )
}

fn group_shape(id: NodeId, group: &ConditionGroup) -> Option<Issue> {
    let explanation = if group.logical_operator().is_none() {
        format!(
            "Logical group uses '{}' but only AND and OR are supported.",
            group.operator
        )
    } else if group.conditions.is_empty() {
        format!("The {} group has no nested conditions.", group.operator.to_ascii_uppercase())
    } else {
        return None;
    };
    Some(
        Issue::error(IssueType::InvalidStructure, id.to_string(), explanation)
            .with_suggestion(suggestion::invalid_structure()),
    )
}
