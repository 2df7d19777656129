//! ruleaudit: static analysis and reporting for declarative business rules.
//!
//! Rules are trees of field comparisons combined with AND/OR groups. The
//! workspace is split into:
//!
//! * `ruleaudit-core`: configuration, shared error types and tracing setup
//! * `ruleaudit-rules`: rule model, field schema registry, condition indexer,
//!   analyzer and issue optimizer
//! * `ruleaudit-report`: report template, generator client, reconciliation
//!   and the HTTP API
//! * `ruleaudit-cli`: the `ruleaudit` binary
//!
//! This crate re-exports the public surface of the library crates.

pub use ruleaudit_core as core;
pub use ruleaudit_report as report;
pub use ruleaudit_rules as rules;

pub use ruleaudit_core::{AuditConfig, AuditError};
pub use ruleaudit_report::{ReportRenderer, RuleReport};
pub use ruleaudit_rules::{
    load_rules, rule_from_json, Condition, FieldSchema, Issue, IssueType, Rule, RuleAnalyzer,
    Severity, ValidationResult,
};

/// Analyzes a rule against the built-in field registry with default settings.
pub fn analyze(rule: &Rule) -> ValidationResult {
    RuleAnalyzer::with_builtin_schema().analyze(rule)
}
