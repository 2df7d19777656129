//! Numeric fields bounded only from below, leaving the zero case unhandled.

use std::collections::BTreeMap;

use crate::error::CheckFault;
use crate::index::{format_location, NodeId};
use crate::issue::{Issue, IssueType};
use crate::schema::FieldType;
use crate::suggestion;
use crate::value::FieldValue;

use super::{AnalysisContext, Leaf};

pub(super) fn check(ctx: &AnalysisContext<'_>) -> Result<Vec<Issue>, CheckFault> {
    let mut issues = Vec::new();

    for group in ctx.field_groups() {
        let declared_numeric = ctx
            .schema
            .get(group.field)
            .map(|entry| entry.field_type == FieldType::Number)
            .unwrap_or(false);
        if !declared_numeric {
            continue;
        }

        // Siblings are judged together; each group of siblings is its own branch.
        let mut siblings: BTreeMap<Option<NodeId>, Vec<Leaf<'_>>> = BTreeMap::new();
        for leaf in &group.leaves {
            siblings.entry(leaf.parent).or_default().push(*leaf);
        }

        for leaves in siblings.values() {
            if let Some(issue) = unbounded_from_zero(ctx, group.field, leaves) {
                issues.push(issue);
            }
        }
    }

    Ok(issues)
}

fn unbounded_from_zero(ctx: &AnalysisContext<'_>, field: &str, leaves: &[Leaf<'_>]) -> Option<Issue> {
    let mut lower: Vec<(NodeId, f64)> = Vec::new();
    let mut has_upper = false;
    let mut covers_zero = false;

    for leaf in leaves {
        let FieldValue::Number(value) = leaf.value() else {
            continue;
        };
        match leaf.operator() {
            ">" | ">=" => lower.push((leaf.id, *value)),
            "<" | "<=" => has_upper = true,
            "==" if *value == 0.0 => covers_zero = true,
            "!=" => covers_zero = true,
            _ => {}
        }
    }

    if lower.is_empty() || has_upper || covers_zero {
        return None;
    }
    let minimum = lower.iter().map(|(_, value)| *value).fold(f64::INFINITY, f64::min);
    if minimum <= 0.0 {
        return None;
    }

    let ids: Vec<NodeId> = lower.iter().map(|(id, _)| *id).collect();
    Some(
        Issue::warning(
            IssueType::MissingCondition,
            format_location(&ids),
            format!(
                "No condition handles {} = 0: only lower bounds are defined (smallest is {}).",
                ctx.schema.label(field),
                FieldValue::Number(minimum)
            ),
        )
        .with_field(field)
        .with_suggestion(suggestion::missing_zero_case(ctx.schema, field)),
    )
}

#[cfg(test)]
mod tests {
    use crate::analyzer::RuleAnalyzer;
    use crate::condition::Condition;
    use crate::issue::IssueType;
    use crate::rule::Rule;

    fn missing(conditions: Vec<Condition>) -> usize {
        RuleAnalyzer::with_builtin_schema()
            .analyze(&Rule::new("t", conditions))
            .issue_counts()
            .get(IssueType::MissingCondition)
    }

    #[test]
    fn lower_bound_only_misses_zero() {
        assert_eq!(missing(vec![Condition::compare("age", ">=", 20)]), 1);
        assert_eq!(missing(vec![Condition::compare("MBL_ACT_MEM_PCNT", ">", 2)]), 1);
    }

    #[test]
    fn upper_bound_or_zero_case_is_enough() {
        assert_eq!(
            missing(vec![
                Condition::compare("age", ">=", 20),
                Condition::compare("age", "<", 65),
            ]),
            0
        );
        assert_eq!(
            missing(vec![
                Condition::compare("age", ">=", 20),
                Condition::compare("age", "==", 0),
            ]),
            0
        );
        assert_eq!(missing(vec![Condition::compare("age", ">=", 0)]), 0);
    }

    #[test]
    fn undeclared_fields_are_not_checked() {
        assert_eq!(missing(vec![Condition::compare("visits", ">", 3)]), 0);
    }
}
