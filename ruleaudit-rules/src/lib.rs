//! Rule model, field schema registry and static analyzer.
//!
//! Rules are nested condition trees over named business fields. The
//! [`RuleAnalyzer`] indexes a rule, runs its structural, type and logical
//! checks, merges the findings and returns a [`ValidationResult`] whose
//! counts are always derived from its issue list.

mod action;
mod adapter;
mod analyzer;
mod condition;
mod describe;
mod error;
mod index;
mod issue;
mod loader;
mod optimizer;
mod result;
mod rule;
mod schema;
mod suggestion;
mod value;

pub use action::RuleAction;
pub use adapter::{condition_from_json, normalize_operator, rule_from_json};
pub use analyzer::{AnalyzerConfig, RuleAnalyzer};
pub use condition::{
    is_membership, is_ordering, Comparison, Condition, ConditionGroup, LogicalOperator,
    MEMBERSHIP_OPERATORS, ORDERING_OPERATORS,
};
pub use describe::{readable_operator, rule_summary};
pub use error::{CheckFault, RuleError};
pub use index::{format_location, ConditionIndex, IndexedCondition, NodeId};
pub use issue::{Issue, IssueCounts, IssueType, Severity};
pub use loader::load_rules;
pub use optimizer::optimize;
pub use result::{StructureInfo, ValidationResult};
pub use rule::Rule;
pub use schema::{FieldPolicy, FieldSchema, FieldSchemaEntry, FieldType};
pub use value::{FieldValue, ValueKind};
