//! Nesting depth and node count thresholds.

use crate::issue::{Issue, IssueType};
use crate::result::StructureInfo;
use crate::suggestion;

use super::AnalyzerConfig;

pub(super) fn check(structure: &StructureInfo, config: &AnalyzerConfig) -> Option<Issue> {
    let mut reasons = Vec::new();
    if structure.depth >= config.depth_warning {
        reasons.push(format!(
            "nesting depth {} reaches the limit of {}",
            structure.depth, config.depth_warning
        ));
    }
    if structure.condition_node_count >= config.node_warning {
        reasons.push(format!(
            "{} condition nodes reach the limit of {}",
            structure.condition_node_count, config.node_warning
        ));
    }
    if reasons.is_empty() {
        return None;
    }

    Some(
        Issue::warning(
            IssueType::ComplexityWarning,
            "entire rule structure",
            format!("The rule is complex: {}.", reasons.join(" and ")),
        )
        .with_suggestion(suggestion::complexity()),
    )
}
