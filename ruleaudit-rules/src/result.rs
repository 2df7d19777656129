use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::issue::{Issue, IssueCounts, IssueType};

/// Shape metrics of a condition tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub depth: usize,
    pub condition_node_count: usize,
    pub field_condition_count: usize,
    pub unique_fields: BTreeSet<String>,
}

impl StructureInfo {
    /// Relative complexity signal: `depth*2 + comparisons + nodes/2`, plus half a
    /// point per unique field beyond the first three, truncated.
    pub fn complexity_score(&self) -> u32 {
        let extra_fields = self.unique_fields.len().saturating_sub(3) as f64;
        let score = (self.depth * 2) as f64
            + self.field_condition_count as f64
            + 0.5 * self.condition_node_count as f64
            + 0.5 * extra_fields;
        score as u32
    }
}

/// Complete outcome of analyzing one rule.
///
/// `issue_counts`, `is_valid` and `summary` are derived from `issues` every
/// time the issue list changes, including when a result is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ValidationResultWire")]
pub struct ValidationResult {
    is_valid: bool,
    issue_counts: IssueCounts,
    issues: Vec<Issue>,
    pub structure: StructureInfo,
    summary: String,
    pub rule_summary: String,
    pub complexity_score: u32,
    pub ai_comment: Option<String>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<Issue>, structure: StructureInfo) -> Self {
        let complexity_score = structure.complexity_score();
        let mut result = Self {
            is_valid: true,
            issue_counts: IssueCounts::default(),
            issues,
            structure,
            summary: String::new(),
            rule_summary: String::new(),
            complexity_score,
            ai_comment: None,
        };
        result.rederive();
        result
    }

    /// Minimal result used when a rule could not be analyzed at all.
    pub fn failure(reason: impl Into<String>) -> Self {
        let issue = Issue::error(
            IssueType::MissingCondition,
            "entire rule",
            format!("The rule could not be analyzed: {}", reason.into()),
        )
        .with_field("conditions")
        .with_suggestion("Check that the rule is a JSON object with a name and a list of conditions.");
        Self::from_issues(vec![issue], StructureInfo::default())
    }

    pub fn with_rule_summary(mut self, rule_summary: impl Into<String>) -> Self {
        self.rule_summary = rule_summary.into();
        self
    }

    pub fn with_ai_comment(mut self, ai_comment: Option<String>) -> Self {
        self.ai_comment = ai_comment;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue_counts(&self) -> &IssueCounts {
        &self.issue_counts
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    /// Replaces the issue list through `update` and re-derives everything that depends on it.
    pub fn map_issues<F>(mut self, update: F) -> Self
    where
        F: FnOnce(Vec<Issue>) -> Vec<Issue>,
    {
        let issues = std::mem::take(&mut self.issues);
        self.issues = update(issues);
        self.rederive();
        self
    }

    pub fn retain_issues<F>(self, mut keep: F) -> Self
    where
        F: FnMut(&Issue) -> bool,
    {
        self.map_issues(|mut issues| {
            issues.retain(|issue| keep(issue));
            issues
        })
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    fn rederive(&mut self) {
        self.issue_counts = IssueCounts::from_issues(&self.issues);
        self.is_valid = !self.issues.iter().any(Issue::is_error);
        self.summary = summarize(&self.issue_counts, self.error_count());
    }
}

fn summarize(counts: &IssueCounts, errors: usize) -> String {
    if counts.is_empty() {
        return "No issues found.".to_string();
    }
    let warnings = counts.total() - errors;
    format!(
        "Found {} issue type(s) and {} issue(s) in total ({} error(s), {} warning(s)).",
        counts.type_count(),
        counts.total(),
        errors,
        warnings
    )
}

/// Incoming shape; derived fields are accepted but ignored.
#[derive(Deserialize)]
struct ValidationResultWire {
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    structure: StructureInfo,
    #[serde(default)]
    rule_summary: String,
    #[serde(default)]
    complexity_score: Option<u32>,
    #[serde(default)]
    ai_comment: Option<String>,
}

impl From<ValidationResultWire> for ValidationResult {
    fn from(wire: ValidationResultWire) -> Self {
        let mut result = ValidationResult::from_issues(wire.issues, wire.structure);
        if let Some(score) = wire.complexity_score {
            result.complexity_score = score;
        }
        result
            .with_rule_summary(wire.rule_summary)
            .with_ai_comment(wire.ai_comment)
    }
}
