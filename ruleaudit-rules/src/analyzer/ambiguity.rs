//! Ambiguous branching: OR alternatives that overlap, and canonical values
//! that no alternative handles.
//!
//! The gap check is a heuristic. It only tries a handful of canonical values
//! (`0` and `1` for numbers, the empty string and an absent value for text)
//! and only for fields that take part in an OR group, so it can miss gaps in
//! arbitrary domains.

use std::collections::BTreeMap;

use crate::condition::LogicalOperator;
use crate::error::CheckFault;
use crate::index::{format_location, NodeId};
use crate::issue::{Issue, IssueType};
use crate::schema::FieldType;
use crate::suggestion;
use crate::value::FieldValue;

use super::interval::Interval;
use super::{AnalysisContext, FieldLeaves, Leaf};

pub(super) fn check(ctx: &AnalysisContext<'_>) -> Result<Vec<Issue>, CheckFault> {
    let mut issues = Vec::new();

    for group in ctx.field_groups() {
        if group.leaves.len() < 2 {
            continue;
        }
        let issue = match ctx.schema.field_type(group.field) {
            FieldType::Number => numeric(ctx, &group)?,
            FieldType::String => textual(ctx, &group),
            _ => None,
        };
        issues.extend(issue);
    }

    Ok(issues)
}

fn numeric(ctx: &AnalysisContext<'_>, group: &FieldLeaves<'_>) -> Result<Option<Issue>, CheckFault> {
    // Alternatives are the leaves sharing one OR parent.
    let mut alternatives: BTreeMap<NodeId, Vec<(NodeId, Interval)>> = BTreeMap::new();
    for leaf in group.leaves.iter().filter(|leaf| leaf.context == LogicalOperator::Or) {
        let Some(parent) = leaf.parent else {
            continue;
        };
        ctx.index.get(parent).ok_or(CheckFault::UnknownNode(parent))?;
        if let Some(interval) = leaf_interval(leaf) {
            alternatives.entry(parent).or_default().push((leaf.id, interval));
        }
    }

    let mut overlaps = Vec::new();
    for members in alternatives.values() {
        for (position, (first_id, first)) in members.iter().enumerate() {
            for (second_id, second) in &members[position + 1..] {
                if first.overlaps(second) {
                    overlaps.push(format_location(&[*first_id, *second_id]));
                }
            }
        }
    }

    if !overlaps.is_empty() {
        return Ok(Some(issue(
            ctx,
            group.field,
            overlaps.join("; "),
            format!(
                "Conditions on {} overlap inside an OR group, so one value can match several branches.",
                ctx.schema.label(group.field)
            ),
        )));
    }

    if !in_or_branch(group) {
        return Ok(None);
    }
    let samples = [FieldValue::Number(0.0), FieldValue::Number(1.0)];
    let uncovered: Vec<String> = samples
        .iter()
        .filter(|sample| !group.leaves.iter().any(|leaf| matches(sample, leaf)))
        .map(|sample| sample.to_string())
        .collect();
    Ok(gap_issue(ctx, group, uncovered))
}

fn textual(ctx: &AnalysisContext<'_>, group: &FieldLeaves<'_>) -> Option<Issue> {
    let mut by_value: Vec<(&str, Vec<Leaf<'_>>)> = Vec::new();
    for leaf in &group.leaves {
        let (Some(text), "==") = (leaf.value().as_text(), leaf.operator()) else {
            continue;
        };
        match by_value.iter_mut().find(|(value, _)| *value == text) {
            Some((_, leaves)) => leaves.push(*leaf),
            None => by_value.push((text, vec![*leaf])),
        }
    }

    let repeated: Vec<(&str, Vec<NodeId>)> = by_value
        .into_iter()
        .filter(|(_, leaves)| {
            leaves.len() > 1
                && (leaves.iter().any(|leaf| leaf.context == LogicalOperator::Or)
                    || leaves.iter().any(|leaf| leaf.context != leaves[0].context))
        })
        .map(|(value, leaves)| (value, leaves.iter().map(|leaf| leaf.id).collect()))
        .collect();

    if !repeated.is_empty() {
        let values = repeated
            .iter()
            .map(|(value, _)| format!("'{}'", value))
            .collect::<Vec<_>>()
            .join(", ");
        let location = repeated
            .iter()
            .map(|(_, ids)| format_location(ids))
            .collect::<Vec<_>>()
            .join("; ");
        return Some(issue(
            ctx,
            group.field,
            location,
            format!(
                "{} is tested for {} in more than one branch, so the processing path is unclear.",
                ctx.schema.label(group.field),
                values
            ),
        ));
    }

    if !in_or_branch(group) {
        return None;
    }
    let uncovered: Vec<String> = [FieldValue::Text(String::new()), FieldValue::Null]
        .iter()
        .filter(|sample| !group.leaves.iter().any(|leaf| matches(sample, leaf)))
        .map(|sample| match sample {
            FieldValue::Null => "an absent value".to_string(),
            _ => "an empty string".to_string(),
        })
        .collect();
    gap_issue(ctx, group, uncovered)
}

fn in_or_branch(group: &FieldLeaves<'_>) -> bool {
    group.leaves.iter().any(|leaf| leaf.context == LogicalOperator::Or)
}

fn gap_issue(ctx: &AnalysisContext<'_>, group: &FieldLeaves<'_>, uncovered: Vec<String>) -> Option<Issue> {
    if uncovered.is_empty() {
        return None;
    }
    Some(issue(
        ctx,
        group.field,
        format_location(&group.ids()),
        format!(
            "No condition on {} matches {}, so such input follows no branch.",
            ctx.schema.label(group.field),
            uncovered.join(" or ")
        ),
    ))
}

fn issue(ctx: &AnalysisContext<'_>, field: &str, location: String, explanation: String) -> Issue {
    Issue::warning(IssueType::AmbiguousBranch, location, explanation)
        .with_field(field)
        .with_suggestion(suggestion::ambiguous_branch(ctx.schema, field))
}

fn leaf_interval(leaf: &Leaf<'_>) -> Option<Interval> {
    leaf.value()
        .as_f64()
        .and_then(|value| Interval::from_operator(leaf.operator(), value))
}

/// Whether `sample` satisfies the leaf's comparison.
fn matches(sample: &FieldValue, leaf: &Leaf<'_>) -> bool {
    let value = leaf.value();
    match leaf.operator() {
        "==" => sample == value,
        "!=" => sample != value,
        ">" | ">=" | "<" | "<=" => {
            let ordering = match (sample, value) {
                (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
                (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
                _ => None,
            };
            match (leaf.operator(), ordering) {
                (">", Some(order)) => order.is_gt(),
                (">=", Some(order)) => order.is_ge(),
                ("<", Some(order)) => order.is_lt(),
                ("<=", Some(order)) => order.is_le(),
                _ => false,
            }
        }
        "in" => value.as_list().map(|items| items.contains(sample)).unwrap_or(false),
        "not_in" => value.as_list().map(|items| !items.contains(sample)).unwrap_or(false),
        "contains" => text_pair(sample, value).map(|(p, v)| p.contains(v)).unwrap_or(false),
        "starts_with" => text_pair(sample, value).map(|(p, v)| p.starts_with(v)).unwrap_or(false),
        "ends_with" => text_pair(sample, value).map(|(p, v)| p.ends_with(v)).unwrap_or(false),
        _ => false,
    }
}

fn text_pair<'v>(sample: &'v FieldValue, value: &'v FieldValue) -> Option<(&'v str, &'v str)> {
    Some((sample.as_text()?, value.as_text()?))
}

#[cfg(test)]
mod tests {
    use crate::analyzer::RuleAnalyzer;
    use crate::condition::Condition;
    use crate::issue::{Issue, IssueType};
    use crate::rule::Rule;

    fn ambiguous(conditions: Vec<Condition>) -> Vec<Issue> {
        RuleAnalyzer::with_builtin_schema()
            .analyze(&Rule::new("t", conditions))
            .issues()
            .iter()
            .filter(|issue| issue.issue_type == IssueType::AmbiguousBranch)
            .cloned()
            .collect()
    }

    #[test]
    fn overlapping_or_ranges_are_ambiguous() {
        let found = ambiguous(vec![Condition::any(vec![
            Condition::compare("score", ">", 50),
            Condition::compare("score", ">", 80),
        ])]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location, "condition 2, 3");
    }

    #[test]
    fn disjoint_or_ranges_with_gap_at_zero() {
        let found = ambiguous(vec![Condition::any(vec![
            Condition::compare("score", ">=", 10),
            Condition::compare("score", "<", 5),
        ])]);
        // 0 and 1 fall under `< 5`, so nothing is reported.
        assert!(found.is_empty());

        let found = ambiguous(vec![Condition::any(vec![
            Condition::compare("score", ">=", 10),
            Condition::compare("score", "==", 5),
        ])]);
        assert_eq!(found.len(), 1);
        assert!(found[0].explanation.contains("0 or 1"), "{}", found[0].explanation);
    }

    #[test]
    fn repeated_text_value_under_or_is_ambiguous() {
        let found = ambiguous(vec![Condition::any(vec![
            Condition::compare("grade", "==", "VIP"),
            Condition::all(vec![Condition::compare("grade", "==", "VIP")]),
        ])]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location, "condition 2, 4");
    }

    #[test]
    fn conjunctive_fields_skip_the_gap_check() {
        let found = ambiguous(vec![
            Condition::compare("age", ">=", 20),
            Condition::compare("age", "<=", 60),
        ]);
        assert!(found.is_empty());
    }
}
