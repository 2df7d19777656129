//! Pairs of comparisons on one field that can never hold together.

use std::collections::BTreeSet;

use crate::error::CheckFault;
use crate::index::format_location;
use crate::issue::{Issue, IssueType};
use crate::suggestion;
use crate::value::FieldValue;

use super::interval::Interval;
use super::{AnalysisContext, Leaf};

/// Returns the contradiction issues and the set of fields that carry one.
pub(super) fn check(
    ctx: &AnalysisContext<'_>,
) -> Result<(Vec<Issue>, BTreeSet<String>), CheckFault> {
    let mut issues = Vec::new();
    let mut fields = BTreeSet::new();

    for group in ctx.field_groups() {
        if group.leaves.len() < 2 {
            continue;
        }
        for (position, first) in group.leaves.iter().enumerate() {
            for second in &group.leaves[position + 1..] {
                if !ctx.index.conjunctive(first.id, second.id) {
                    continue;
                }
                let Some(reason) = conflict(group.field, first, second) else {
                    continue;
                };
                fields.insert(group.field.to_string());
                issues.push(
                    Issue::error(
                        IssueType::SelfContradiction,
                        format_location(&[first.id, second.id]),
                        format!("Self-contradiction: {}", reason),
                    )
                    .with_field(group.field)
                    .with_suggestion(suggestion::self_contradiction(ctx.schema, group.field)),
                );
            }
        }
    }

    Ok((issues, fields))
}

fn conflict(field: &str, first: &Leaf<'_>, second: &Leaf<'_>) -> Option<String> {
    let (op_a, op_b) = (first.operator(), second.operator());
    let (value_a, value_b) = (first.value(), second.value());

    let negated_pair = matches!((op_a, op_b), ("==", "!=") | ("!=", "=="));
    if negated_pair && value_a.to_string() == value_b.to_string() {
        let value = if op_a == "==" { value_a } else { value_b };
        return Some(format!("{} cannot both equal and differ from '{}'", field, value));
    }

    if op_a == "==" && op_b == "==" && value_a.kind() == value_b.kind() && value_a != value_b {
        return Some(format!(
            "{} cannot equal '{}' and '{}' at the same time",
            field, value_a, value_b
        ));
    }

    if let (FieldValue::Number(a), FieldValue::Number(b)) = (value_a, value_b) {
        if let (Some(range_a), Some(range_b)) =
            (Interval::from_operator(op_a, *a), Interval::from_operator(op_b, *b))
        {
            if !range_a.overlaps(&range_b) {
                return Some(format!(
                    "no value of {} satisfies both {} {} {} and {} {} {}",
                    field, field, op_a, value_a, field, op_b, value_b
                ));
            }
        }
    }

    if op_a == "==" && op_b == "==" && value_a.kind() != value_b.kind() {
        return Some(format!(
            "{} cannot equal '{}' ({}) and '{}' ({}) at the same time",
            field,
            value_a,
            value_a.kind(),
            value_b,
            value_b.kind()
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::analyzer::RuleAnalyzer;
    use crate::condition::Condition;
    use crate::issue::IssueType;
    use crate::rule::Rule;

    fn contradictions(conditions: Vec<Condition>) -> Vec<String> {
        RuleAnalyzer::with_builtin_schema()
            .analyze(&Rule::new("t", conditions))
            .issues()
            .iter()
            .filter(|issue| issue.issue_type == IssueType::SelfContradiction)
            .map(|issue| issue.location.clone())
            .collect()
    }

    #[test]
    fn detects_numeric_range_conflicts() {
        let found = contradictions(vec![
            Condition::compare("score", ">", 90),
            Condition::compare("score", "<", 80),
        ]);
        assert_eq!(found, vec!["condition 1, 2".to_string()]);

        let found = contradictions(vec![
            Condition::compare("age", ">=", 30),
            Condition::compare("age", "<", 30),
        ]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn detects_equality_conflicts() {
        assert_eq!(
            contradictions(vec![
                Condition::compare("grade", "==", "VIP"),
                Condition::compare("grade", "!=", "VIP"),
            ])
            .len(),
            1
        );
        assert_eq!(
            contradictions(vec![
                Condition::compare("grade", "==", "VIP"),
                Condition::compare("grade", "==", "GOLD"),
            ])
            .len(),
            1
        );
    }

    #[test]
    fn detects_cross_type_equality() {
        let found = contradictions(vec![
            Condition::compare("score", "==", 100),
            Condition::compare("score", "==", "high"),
        ]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn ignores_alternatives_under_or() {
        let found = contradictions(vec![Condition::any(vec![
            Condition::compare("score", ">", 90),
            Condition::compare("score", "<", 80),
        ])]);
        assert!(found.is_empty());
    }

    #[test]
    fn pairs_on_one_field_merge_into_one_issue() {
        let found = contradictions(vec![
            Condition::compare("age", "==", 20),
            Condition::compare("age", "==", 30),
            Condition::compare("age", "==", 40),
        ]);
        assert_eq!(
            found,
            vec!["condition 1, 2; condition 1, 3; condition 2, 3".to_string()]
        );
    }
}
