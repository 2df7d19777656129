//! Repeated identical comparisons.

use crate::error::CheckFault;
use crate::index::{format_location, NodeId};
use crate::issue::{Issue, IssueType};
use crate::suggestion;

use super::{AnalysisContext, Leaf};

pub(super) fn check(ctx: &AnalysisContext<'_>) -> Result<Vec<Issue>, CheckFault> {
    let mut issues = Vec::new();

    for group in ctx.field_groups() {
        if ctx.contradiction_fields.contains(group.field) {
            continue;
        }

        // Keyed by operator and value; value equality includes its variant.
        let mut buckets: Vec<(Leaf<'_>, Vec<NodeId>)> = Vec::new();
        for leaf in &group.leaves {
            match buckets.iter_mut().find(|(first, _)| {
                first.operator() == leaf.operator() && first.value() == leaf.value()
            }) {
                Some((_, ids)) => ids.push(leaf.id),
                None => buckets.push((*leaf, vec![leaf.id])),
            }
        }

        for (first, ids) in buckets.into_iter().filter(|(_, ids)| ids.len() > 1) {
            issues.push(
                Issue::warning(
                    IssueType::DuplicateCondition,
                    format_location(&ids),
                    format!(
                        "The condition `{}` appears {} times.",
                        first.comparison,
                        ids.len()
                    ),
                )
                .with_field(group.field)
                .with_suggestion(suggestion::duplicate(ctx.schema, group.field)),
            );
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use crate::analyzer::RuleAnalyzer;
    use crate::condition::Condition;
    use crate::issue::IssueType;
    use crate::rule::Rule;

    #[test]
    fn repeated_comparison_is_one_warning() {
        let result = RuleAnalyzer::with_builtin_schema().analyze(&Rule::new(
            "dup",
            vec![
                Condition::compare("age", "==", 20),
                Condition::compare("age", "==", 20),
            ],
        ));
        assert!(result.is_valid());
        assert_eq!(result.issues().len(), 1);
        let issue = &result.issues()[0];
        assert_eq!(issue.issue_type, IssueType::DuplicateCondition);
        assert_eq!(issue.field.as_deref(), Some("age"));
        assert_eq!(issue.location, "condition 1, 2");
    }

    #[test]
    fn same_text_with_different_types_is_not_a_duplicate() {
        let result = RuleAnalyzer::with_builtin_schema().analyze(&Rule::new(
            "dup",
            vec![
                Condition::compare("name", "!=", "20"),
                Condition::compare("name", "!=", 20),
            ],
        ));
        assert_eq!(result.issue_counts().get(IssueType::DuplicateCondition), 0);
    }
}
