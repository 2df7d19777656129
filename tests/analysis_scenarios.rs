// Behavioral scenarios for the rule analyzer.
use ruleaudit::rules::{FieldSchemaEntry, FieldType};
use ruleaudit::{Condition, FieldSchema, IssueType, Rule, RuleAnalyzer, Severity};
use serde_json::json;
use test_case::test_case;

fn rule(conditions: Vec<Condition>) -> Rule {
    Rule::new("scenario", conditions).with_id("S-1")
}

/// `levels` nested AND groups, each holding one string comparison.
fn nested(levels: usize) -> Vec<Condition> {
    let fields = ["name", "grade", "category", "membership", "status"];
    let mut inner: Option<Condition> = None;
    for level in (0..levels).rev() {
        let mut children = vec![Condition::compare(fields[level % fields.len()], "==", "x")];
        children.extend(inner.take());
        inner = Some(Condition::all(children));
    }
    inner.into_iter().collect()
}

#[test_case(
    vec![Condition::compare("age", "==", 20), Condition::compare("age", "==", 20)],
    &[(IssueType::DuplicateCondition, 1)],
    true ;
    "duplicate detection"
)]
#[test_case(
    vec![Condition::compare("score", ">", 90), Condition::compare("score", "<", 80)],
    &[(IssueType::SelfContradiction, 1)],
    false ;
    "self contradiction"
)]
#[test_case(
    vec![
        Condition::compare("score", ">", 90),
        Condition::compare("score", "<", 80),
        Condition::compare("score", "<", 80),
    ],
    &[(IssueType::SelfContradiction, 1)],
    false ;
    "contradiction suppresses duplicates on the same field"
)]
#[test_case(
    vec![Condition::compare("name", ">", "Kim")],
    &[(IssueType::InvalidOperator, 1)],
    false ;
    "string ordering operator"
)]
#[test_case(
    vec![Condition::compare("score", "==", "100")],
    &[(IssueType::TypeMismatch, 1)],
    false ;
    "type mismatch wins over operator check"
)]
#[test_case(
    vec![Condition::compare("grade", "==", "VIP"), Condition::compare("grade", "==", "GOLD")],
    &[(IssueType::SelfContradiction, 1)],
    false ;
    "conjunctive equality on two values"
)]
#[test_case(
    vec![Condition::compare("age", ">=", 20), Condition::compare("age", "<", 65)],
    &[],
    true ;
    "bounded range is clean"
)]
#[test_case(
    vec![Condition::compare("age", ">=", 20)],
    &[(IssueType::MissingCondition, 1)],
    true ;
    "lower bound only misses zero case"
)]
#[test_case(
    Vec::new(),
    &[(IssueType::MissingCondition, 1)],
    false ;
    "empty rule"
)]
#[test_case(
    vec![Condition::group("XOR", vec![Condition::compare("grade", "==", "VIP")])],
    &[(IssueType::InvalidStructure, 1)],
    false ;
    "unknown group operator"
)]
fn analyzes_scenario(conditions: Vec<Condition>, expected: &[(IssueType, usize)], valid: bool) {
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule(conditions));

    let counts: Vec<(IssueType, usize)> = result.issue_counts().iter().collect();
    assert_eq!(counts, expected.to_vec(), "issues: {:#?}", result.issues());
    assert_eq!(result.is_valid(), valid);
}

#[test]
fn duplicate_counts_serialize_as_expected() {
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule(vec![
        Condition::compare("age", "==", 20),
        Condition::compare("age", "==", 20),
    ]));
    let value = serde_json::to_value(&result).expect("serialize");
    assert_eq!(value["issue_counts"], json!({"duplicate_condition": 1}));
    assert_eq!(value["is_valid"], json!(true));
    assert_eq!(value["issues"][0]["field"], json!("age"));
    assert_eq!(value["issues"][0]["location"], json!("condition 1, 2"));
}

#[test]
fn string_ordering_ignores_policy_overrides() {
    let schema = FieldSchema::builtin().with_field(
        "name",
        FieldSchemaEntry::new(FieldType::String, "Name")
            .with_policy(true, false)
            .with_operators(&["==", ">"]),
    );
    let analyzer = RuleAnalyzer::new(schema, Default::default());
    let result = analyzer.analyze(&rule(vec![Condition::compare("name", ">", "Kim")]));

    assert!(!result.is_valid());
    assert_eq!(result.issue_counts().get(IssueType::InvalidOperator), 1);
    assert_eq!(result.issues()[0].severity, Severity::Error);
}

#[test]
fn type_mismatch_is_the_only_issue_for_the_leaf() {
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule(vec![Condition::compare("score", "==", "100")]));
    assert_eq!(result.issues().len(), 1);
    assert_eq!(result.issues()[0].issue_type, IssueType::TypeMismatch);
    assert_eq!(result.issues()[0].location, "condition 1");
}

#[test]
fn five_nested_groups_trigger_complexity() {
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule(nested(5)));
    assert_eq!(result.structure.depth, 5);
    assert_eq!(result.issue_counts().get(IssueType::ComplexityWarning), 1);
    assert!(result.is_valid());
}

#[test]
fn four_nested_groups_stay_below_thresholds() {
    let mut conditions = nested(4);
    conditions.push(Condition::compare("status", "!=", "closed"));
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule(conditions));
    assert_eq!(result.structure.depth, 4);
    assert_eq!(result.structure.condition_node_count, 9);
    assert_eq!(result.issue_counts().get(IssueType::ComplexityWarning), 0);
}

#[test]
fn single_leaf_under_five_groups_warns_on_depth() {
    let mut conditions = vec![Condition::compare("grade", "==", "VIP")];
    for _ in 0..5 {
        conditions = vec![Condition::all(conditions)];
    }
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule(conditions));

    assert_eq!(result.structure.depth, 5);
    assert_eq!(result.structure.condition_node_count, 6);
    assert_eq!(result.issue_counts().get(IssueType::ComplexityWarning), 1);
    let warning = result
        .issues()
        .iter()
        .find(|issue| issue.issue_type == IssueType::ComplexityWarning)
        .expect("complexity warning");
    assert!(warning.explanation.contains("nesting depth 5"), "{}", warning.explanation);
}

#[test]
fn legacy_leaves_with_empty_nested_lists_are_comparisons() {
    let result = RuleAnalyzer::with_builtin_schema().analyze_json(&json!({
        "name": "adult",
        "conditions": [
            {"field": "age", "operator": ">=", "value": 20, "conditions": []},
            {"field": "age", "operator": "<", "value": 65, "conditions": []}
        ]
    }));

    assert!(result.is_valid(), "issues: {:#?}", result.issues());
    assert!(result.issue_counts().is_empty());
    assert_eq!(result.structure.field_condition_count, 2);
    assert!(result.structure.unique_fields.contains("age"));
}

#[test]
fn impossible_calendar_dates_are_type_mismatches() {
    let result = RuleAnalyzer::with_builtin_schema().analyze_json(&json!({
        "name": "leap",
        "conditions": [{"field": "date", "operator": ">=", "value": "2024-02-30"}]
    }));
    assert_eq!(result.issue_counts().get(IssueType::TypeMismatch), 1);
}

#[test]
fn legacy_payload_is_analyzed_end_to_end() {
    let result = RuleAnalyzer::with_builtin_schema().analyze_json(&json!({
        "ruleId": "LEGACY-1",
        "name": "legacy",
        "conditions": [
            {"field": "MBL_ACT_MEM_PCNT", "operator": "gt", "value": 2},
            {
                "field": "placeholder",
                "operator": "AND",
                "conditions": [
                    {"field": "score", "operator": "gt", "value": 90},
                    {"field": "score", "operator": "lt", "value": 80}
                ]
            }
        ]
    }));

    assert_eq!(result.issue_counts().get(IssueType::SelfContradiction), 1);
    assert_eq!(result.issue_counts().get(IssueType::MissingCondition), 1);
    let contradiction = &result.issues()[0];
    assert_eq!(contradiction.issue_type, IssueType::SelfContradiction);
    assert_eq!(contradiction.location, "condition 3, 4");
}

#[test]
fn malformed_payload_yields_minimal_failure() {
    let result = RuleAnalyzer::with_builtin_schema().analyze_json(&json!("not a rule"));
    assert!(!result.is_valid());
    assert_eq!(result.issues().len(), 1);
    assert_eq!(result.issues()[0].issue_type, IssueType::MissingCondition);
    assert_eq!(result.issues()[0].location, "entire rule");
}
