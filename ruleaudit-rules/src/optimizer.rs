//! Collapses and orders analyzer findings.
//!
//! Issues sharing `(field, issue_type)` merge into one issue whose location
//! and explanation are the de-duplicated union of the originals. Duplicate
//! warnings on a field that also carries a contradiction are dropped. The
//! result is ordered by severity, then by issue-type rank; the sort is stable
//! so equal keys keep their analysis order.

use std::collections::HashSet;

use crate::issue::{Issue, IssueType};

const TRAILING: &[char] = &['.', ';', ',', ' '];

pub fn optimize(issues: Vec<Issue>) -> Vec<Issue> {
    let contradicted: HashSet<Option<String>> = issues
        .iter()
        .filter(|issue| issue.issue_type == IssueType::SelfContradiction)
        .map(|issue| issue.field.clone())
        .collect();

    let mut merged: Vec<Issue> = Vec::new();
    for issue in issues {
        if issue.issue_type == IssueType::DuplicateCondition && contradicted.contains(&issue.field) {
            continue;
        }
        match merged
            .iter_mut()
            .find(|kept| kept.issue_type == issue.issue_type && kept.field == issue.field)
        {
            Some(kept) => absorb(kept, issue),
            None => merged.push(issue),
        }
    }

    merged.sort_by_key(|issue| (issue.severity.rank(), issue.issue_type.rank()));
    merged
}

fn absorb(kept: &mut Issue, other: Issue) {
    let locations: Vec<&str> = kept.location.split("; ").collect();
    if !other.location.is_empty() && !locations.contains(&other.location.as_str()) {
        kept.location = if kept.location.is_empty() {
            other.location
        } else {
            format!("{}; {}", kept.location, other.location)
        };
    }

    let trimmed = other.explanation.trim_end_matches(TRAILING);
    let already = kept
        .explanation
        .split(". ")
        .any(|sentence| sentence.trim_end_matches(TRAILING) == trimmed);
    if !trimmed.is_empty() && !already {
        let base = kept.explanation.trim_end_matches(TRAILING).to_string();
        kept.explanation = format!("{}. {}.", base, trimmed);
    }
}
