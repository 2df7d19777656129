use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of a defect reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    SelfContradiction,
    InvalidOperator,
    TypeMismatch,
    AmbiguousBranch,
    MissingCondition,
    ComplexityWarning,
    DuplicateCondition,
    InvalidStructure,
    AnalysisError,
}

impl IssueType {
    pub const ALL: [IssueType; 9] = [
        IssueType::SelfContradiction,
        IssueType::InvalidOperator,
        IssueType::TypeMismatch,
        IssueType::AmbiguousBranch,
        IssueType::MissingCondition,
        IssueType::ComplexityWarning,
        IssueType::DuplicateCondition,
        IssueType::InvalidStructure,
        IssueType::AnalysisError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::DuplicateCondition => "duplicate_condition",
            IssueType::MissingCondition => "missing_condition",
            IssueType::AmbiguousBranch => "ambiguous_branch",
            IssueType::SelfContradiction => "self_contradiction",
            IssueType::InvalidOperator => "invalid_operator",
            IssueType::TypeMismatch => "type_mismatch",
            IssueType::ComplexityWarning => "complexity_warning",
            IssueType::InvalidStructure => "invalid_structure",
            IssueType::AnalysisError => "analysis_error",
        }
    }

    /// Heading used for this type in rendered reports.
    pub fn title(&self) -> &'static str {
        match self {
            IssueType::DuplicateCondition => "Duplicate conditions",
            IssueType::MissingCondition => "Missing conditions",
            IssueType::AmbiguousBranch => "Ambiguous branches",
            IssueType::SelfContradiction => "Self-contradictions",
            IssueType::InvalidOperator => "Invalid operators",
            IssueType::TypeMismatch => "Type mismatches",
            IssueType::ComplexityWarning => "Complexity warnings",
            IssueType::InvalidStructure => "Invalid structure",
            IssueType::AnalysisError => "Analysis errors",
        }
    }

    /// Resolves a report heading (or a snake_case name) back to its type.
    pub fn from_title(raw: &str) -> Option<IssueType> {
        let wanted = raw.trim();
        IssueType::ALL.iter().copied().find(|issue_type| {
            issue_type.title().eq_ignore_ascii_case(wanted) || issue_type.as_str() == wanted
        })
    }

    /// Sort rank; lower sorts first. Declaration order doubles as priority order.
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        IssueType::ALL
            .iter()
            .copied()
            .find(|issue_type| issue_type.as_str() == raw.trim())
            .ok_or_else(|| format!("unknown issue type: {}", raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn rank(&self) -> usize {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub field: Option<String>,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub location: String,
    pub explanation: String,
    #[serde(default)]
    pub suggestion: String,
}

impl Issue {
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        location: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            field: None,
            issue_type,
            severity,
            location: location.into(),
            explanation: explanation.into(),
            suggestion: String::new(),
        }
    }

    pub fn error(issue_type: IssueType, location: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::new(issue_type, Severity::Error, location, explanation)
    }

    pub fn warning(issue_type: IssueType, location: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::new(issue_type, Severity::Warning, location, explanation)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Per-type issue tally. Only ever built from an issue list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueCounts(BTreeMap<IssueType, usize>);

impl IssueCounts {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut counts = BTreeMap::new();
        for issue in issues {
            *counts.entry(issue.issue_type).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn get(&self, issue_type: IssueType) -> usize {
        self.0.get(&issue_type).copied().unwrap_or(0)
    }

    pub fn contains(&self, issue_type: IssueType) -> bool {
        self.get(issue_type) > 0
    }

    /// Total number of issues.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Number of distinct issue types present.
    pub fn type_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Present types with their counts, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (IssueType, usize)> + '_ {
        self.0.iter().map(|(issue_type, count)| (*issue_type, *count))
    }
}
