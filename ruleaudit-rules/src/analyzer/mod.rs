//! Static analysis of a single rule.
//!
//! [`RuleAnalyzer::analyze`] runs every check in a fixed order and always
//! returns a well-formed [`ValidationResult`]. A check that faults is
//! reported as an `analysis_error` issue and the remaining checks still run.

mod ambiguity;
mod complexity;
mod contradiction;
mod coverage;
mod duplicate;
mod interval;
mod structure;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter;
use crate::condition::{Comparison, LogicalOperator};
use crate::describe;
use crate::error::CheckFault;
use crate::index::{ConditionIndex, NodeId};
use crate::issue::{Issue, IssueType};
use crate::optimizer;
use crate::result::{StructureInfo, ValidationResult};
use crate::rule::Rule;
use crate::schema::FieldSchema;
use crate::suggestion;
use crate::value::FieldValue;

/// Knobs controlling the analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Nesting level below which the indexer stops descending.
    pub max_depth: usize,
    /// Depth at which a complexity warning is raised.
    pub depth_warning: usize,
    /// Node count at which a complexity warning is raised.
    pub node_warning: usize,
    /// Issue types kept in results; everything else is dropped before counting.
    pub enabled_issue_types: BTreeSet<IssueType>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            depth_warning: 5,
            node_warning: 10,
            enabled_issue_types: IssueType::ALL.into_iter().collect(),
        }
    }
}

impl AnalyzerConfig {
    pub fn disable(mut self, issue_type: IssueType) -> Self {
        self.enabled_issue_types.remove(&issue_type);
        self
    }

    pub fn is_enabled(&self, issue_type: IssueType) -> bool {
        self.enabled_issue_types.contains(&issue_type)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleAnalyzer {
    schema: FieldSchema,
    config: AnalyzerConfig,
}

impl RuleAnalyzer {
    pub fn new(schema: FieldSchema, config: AnalyzerConfig) -> Self {
        Self { schema, config }
    }

    /// Analyzer over the built-in field registry with default thresholds.
    pub fn with_builtin_schema() -> Self {
        Self::new(FieldSchema::builtin(), AnalyzerConfig::default())
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, rule: &Rule) -> ValidationResult {
        // A panicking check degrades to the failure result instead of unwinding into the caller.
        match catch_unwind(AssertUnwindSafe(|| self.run(rule))) {
            Ok(result) => result,
            Err(_) => {
                warn!(rule = %rule.name, "rule analysis panicked");
                ValidationResult::failure("internal analyzer failure")
            }
        }
    }

    /// Normalizes raw rule JSON and analyzes it. Payloads that are not rule
    /// shaped yield the minimal failure result.
    pub fn analyze_json(&self, raw: &Value) -> ValidationResult {
        match adapter::rule_from_json(raw) {
            Ok(rule) => self.analyze(&rule),
            Err(err) => {
                warn!(error = %err, "rule payload rejected by adapter");
                ValidationResult::failure(err.to_string())
            }
        }
    }

    /// Analyzes rules in parallel; results keep the input order.
    pub fn analyze_batch(&self, rules: &[Rule]) -> Vec<ValidationResult> {
        rules.par_iter().map(|rule| self.analyze(rule)).collect()
    }

    fn run(&self, rule: &Rule) -> ValidationResult {
        debug!(rule = %rule.name, conditions = rule.conditions.len(), "analyzing rule");

        let index = ConditionIndex::build(&rule.conditions, self.config.max_depth);
        let mut ctx = AnalysisContext::new(rule, &self.schema, &self.config, index);

        ctx.check_empty();
        ctx.check_depth_limit();
        ctx.check_types();
        ctx.check_nodes();
        ctx.check_contradictions();

        let duplicates = duplicate::check(&ctx);
        ctx.absorb("duplicate detection", duplicates);
        let missing = coverage::check(&ctx);
        ctx.absorb("missing condition detection", missing);
        let ambiguous = ambiguity::check(&ctx);
        ctx.absorb("ambiguous branch detection", ambiguous);

        let structure = ctx.structure();
        if let Some(issue) = complexity::check(&structure, ctx.config) {
            ctx.issues.push(issue);
        }

        let AnalysisContext { index, issues, .. } = ctx;
        let issues: Vec<Issue> = issues
            .into_iter()
            .filter(|issue| self.config.is_enabled(issue.issue_type))
            .collect();

        let comment = describe::advisory_comment(&index, &structure, &self.schema, &issues);
        let result = ValidationResult::from_issues(issues, structure)
            .map_issues(optimizer::optimize)
            .with_rule_summary(describe::rule_summary(rule, &self.schema))
            .with_ai_comment(comment);

        debug!(
            rule = %rule.name,
            valid = result.is_valid(),
            issues = result.issues().len(),
            "rule analysis finished"
        );
        result
    }
}

/// Comparison leaf together with its position in the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Leaf<'a> {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub context: LogicalOperator,
    pub comparison: &'a Comparison,
}

impl<'a> Leaf<'a> {
    pub fn operator(&self) -> &'a str {
        &self.comparison.operator
    }

    pub fn value(&self) -> &'a FieldValue {
        &self.comparison.value
    }
}

/// All usable leaves of one field, in tree order.
#[derive(Debug, Clone)]
pub(crate) struct FieldLeaves<'a> {
    pub field: &'a str,
    pub leaves: Vec<Leaf<'a>>,
}

impl FieldLeaves<'_> {
    pub fn ids(&self) -> Vec<NodeId> {
        self.leaves.iter().map(|leaf| leaf.id).collect()
    }
}

pub(crate) struct AnalysisContext<'a> {
    rule: &'a Rule,
    pub schema: &'a FieldSchema,
    pub config: &'a AnalyzerConfig,
    pub index: ConditionIndex<'a>,
    issues: Vec<Issue>,
    type_failures: HashSet<NodeId>,
    faulted: HashSet<NodeId>,
    pub contradiction_fields: BTreeSet<String>,
}

impl<'a> AnalysisContext<'a> {
    fn new(
        rule: &'a Rule,
        schema: &'a FieldSchema,
        config: &'a AnalyzerConfig,
        index: ConditionIndex<'a>,
    ) -> Self {
        Self {
            rule,
            schema,
            config,
            index,
            issues: Vec::new(),
            type_failures: HashSet::new(),
            faulted: HashSet::new(),
            contradiction_fields: BTreeSet::new(),
        }
    }

    /// Leaves grouped by field in order of first appearance. Faulted leaves
    /// and leaves without a field name are left out.
    pub fn field_groups(&self) -> Vec<FieldLeaves<'a>> {
        let mut groups: Vec<FieldLeaves<'a>> = Vec::new();
        let mut slots: HashMap<&'a str, usize> = HashMap::new();
        for (entry, comparison) in self.index.comparisons() {
            if comparison.field.is_empty() || self.faulted.contains(&entry.id) {
                continue;
            }
            let leaf = Leaf {
                id: entry.id,
                parent: entry.parent,
                context: entry.context,
                comparison,
            };
            let field = comparison.field.as_str();
            match slots.get(field) {
                Some(slot) => groups[*slot].leaves.push(leaf),
                None => {
                    slots.insert(field, groups.len());
                    groups.push(FieldLeaves {
                        field,
                        leaves: vec![leaf],
                    });
                }
            }
        }
        groups
    }

    fn structure(&self) -> StructureInfo {
        StructureInfo {
            depth: self.index.depth(),
            condition_node_count: self.index.node_count(),
            field_condition_count: self.index.comparison_count(),
            unique_fields: self.index.unique_fields(),
        }
    }

    fn check_empty(&mut self) {
        if self.rule.conditions.is_empty() {
            self.issues.push(
                Issue::error(
                    IssueType::MissingCondition,
                    "top-level conditions",
                    "The rule has no conditions. At least one condition is required.",
                )
                .with_field("conditions")
                .with_suggestion(suggestion::empty_rule()),
            );
        }
    }

    fn check_depth_limit(&mut self) {
        let limit = self.index.max_depth();
        let truncated = self.index.truncated().to_vec();
        for node in truncated {
            self.record_fault("depth limit", CheckFault::DepthLimit { node, limit });
        }
    }

    fn check_types(&mut self) {
        for (id, outcome) in structure::check_types(self) {
            match outcome {
                Ok(Some(issue)) => {
                    self.type_failures.insert(id);
                    self.issues.push(issue);
                }
                Ok(None) => {}
                Err(fault) => self.record_fault("type check", fault),
            }
        }
    }

    fn check_nodes(&mut self) {
        for outcome in structure::check_nodes(self) {
            match outcome {
                Ok(Some(issue)) => self.issues.push(issue),
                Ok(None) => {}
                Err(fault) => self.record_fault("condition validation", fault),
            }
        }
    }

    fn check_contradictions(&mut self) {
        match contradiction::check(self) {
            Ok((issues, fields)) => {
                self.issues.extend(issues);
                self.contradiction_fields = fields;
            }
            Err(fault) => self.record_fault("contradiction detection", fault),
        }
    }

    fn absorb(&mut self, check: &str, outcome: Result<Vec<Issue>, CheckFault>) {
        match outcome {
            Ok(issues) => self.issues.extend(issues),
            Err(fault) => self.record_fault(check, fault),
        }
    }

    fn record_fault(&mut self, check: &str, fault: CheckFault) {
        warn!(rule = %self.rule.name, check, error = %fault, "analysis check faulted");

        let node = fault.node();
        let location = node
            .map(|id| id.to_string())
            .unwrap_or_else(|| "condition structure".to_string());
        let field = node
            .and_then(|id| self.index.get(id))
            .and_then(|entry| entry.node.as_comparison())
            .map(|comparison| comparison.field.clone());
        if let Some(id) = node {
            self.faulted.insert(id);
        }

        let mut issue = Issue::error(
            IssueType::AnalysisError,
            location,
            format!("The {} could not be completed: {}.", check, fault),
        )
        .with_suggestion(suggestion::analysis_error());
        if let Some(field) = field {
            issue = issue.with_field(field);
        }
        self.issues.push(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use serde_json::json;

    fn analyze(conditions: Vec<Condition>) -> ValidationResult {
        RuleAnalyzer::with_builtin_schema().analyze(&Rule::new("test", conditions))
    }

    fn types(result: &ValidationResult) -> Vec<IssueType> {
        result.issues().iter().map(|issue| issue.issue_type).collect()
    }

    #[test]
    fn clean_rule_is_valid() {
        let result = analyze(vec![
            Condition::compare("age", "<", 65),
            Condition::compare("grade", "==", "VIP"),
        ]);
        assert!(result.is_valid(), "{:?}", result.issues());
        assert!(result.issues().is_empty());
        assert_eq!(result.structure.depth, 1);
        assert_eq!(result.summary(), "No issues found.");
    }

    #[test]
    fn empty_rule_reports_missing_condition() {
        let result = analyze(Vec::new());
        assert!(!result.is_valid());
        assert_eq!(types(&result), vec![IssueType::MissingCondition]);
        assert_eq!(result.structure.depth, 0);
    }

    #[test]
    fn type_failure_suppresses_operator_check() {
        let result = analyze(vec![Condition::compare("grade", ">", 5)]);
        assert_eq!(types(&result), vec![IssueType::TypeMismatch]);
    }

    #[test]
    fn non_finite_numbers_become_analysis_errors() {
        let result = analyze(vec![
            Condition::compare("age", ">", f64::NAN),
            Condition::compare("grade", "==", "VIP"),
        ]);
        assert_eq!(types(&result), vec![IssueType::AnalysisError]);
        assert_eq!(result.issues()[0].location, "condition 1");
        assert_eq!(result.issues()[0].field.as_deref(), Some("age"));
    }

    #[test]
    fn depth_limit_becomes_analysis_error() {
        let mut node = Condition::compare("age", ">", 1);
        for _ in 0..4 {
            node = Condition::all(vec![node]);
        }
        let config = AnalyzerConfig {
            max_depth: 2,
            ..AnalyzerConfig::default()
        };
        let analyzer = RuleAnalyzer::new(FieldSchema::builtin(), config);
        let result = analyzer.analyze(&Rule::new("deep", vec![node]));
        assert!(types(&result).contains(&IssueType::AnalysisError));
        assert_eq!(result.issue_counts().total(), result.issues().len());
    }

    #[test]
    fn disabled_issue_types_are_dropped_before_validity() {
        let config = AnalyzerConfig::default().disable(IssueType::TypeMismatch);
        let analyzer = RuleAnalyzer::new(FieldSchema::builtin(), config);
        let result = analyzer.analyze(&Rule::new("t", vec![Condition::compare("age", "==", "x")]));
        assert!(result.is_valid());
        assert!(result.issues().is_empty());
    }

    #[test]
    fn malformed_json_yields_failure_shape() {
        let result = RuleAnalyzer::with_builtin_schema().analyze_json(&json!("not a rule"));
        assert_eq!(types(&result), vec![IssueType::MissingCondition]);
        assert_eq!(result.issue_counts().total(), 1);
    }

    #[test]
    fn batch_preserves_order() {
        let rules = vec![
            Rule::new("clean", vec![Condition::compare("age", ">", 1)]),
            Rule::new("empty", Vec::new()),
        ];
        let results = RuleAnalyzer::with_builtin_schema().analyze_batch(&rules);
        assert!(results[0].is_valid());
        assert!(!results[1].is_valid());
    }
}
