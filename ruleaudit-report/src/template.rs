//! Deterministic markdown report built only from a rule and its analysis.
//!
//! This is the fallback when no generator is available and also the draft
//! handed to the generator. Every number in it comes from
//! [`ValidationResult::issue_counts`].

use ruleaudit_rules::{Condition, FieldSchema, Issue, IssueCounts, IssueType, Rule, ValidationResult};

pub const BASIC_INFO_HEADING: &str = "## 1. Basic Information";
pub const STRUCTURE_HEADING: &str = "## 2. Structure Summary";
pub const ISSUES_HEADING: &str = "## 3. Detected Issues";
pub const ASSESSMENT_HEADING: &str = "## 4. Assessment";

/// `Total: N issue types, M issues detected.`
pub fn summary_line(counts: &IssueCounts) -> String {
    format!(
        "Total: {} issue types, {} issues detected.",
        counts.type_count(),
        counts.total()
    )
}

pub fn section_heading(issue_type: IssueType, count: usize) -> String {
    format!("### {}: {} issue(s)", issue_type.title(), count)
}

pub fn count_line(issue_type: IssueType, count: usize) -> String {
    format!("- {}: {} issue(s)", issue_type.title(), count)
}

/// Subsection for one issue type, grouped by field in order of appearance.
pub fn issue_section(issue_type: IssueType, count: usize, issues: &[&Issue]) -> String {
    let mut by_field: Vec<(&str, Vec<&Issue>)> = Vec::new();
    for issue in issues {
        let field = issue.field.as_deref().unwrap_or("Entire rule");
        match by_field.iter_mut().find(|(name, _)| *name == field) {
            Some((_, grouped)) => grouped.push(issue),
            None => by_field.push((field, vec![issue])),
        }
    }

    let mut out = format!("{}\n\n", section_heading(issue_type, count));
    for (field, grouped) in by_field {
        out.push_str(&format!("**{}**\n", field));
        for issue in grouped {
            if issue.location.is_empty() {
                out.push_str(&format!("- {}\n", issue.explanation));
            } else {
                out.push_str(&format!("- {} (location: {})\n", issue.explanation, issue.location));
            }
            if !issue.suggestion.is_empty() {
                out.push_str(&format!("  Suggestion: {}\n", issue.suggestion));
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_template(rule: &Rule, result: &ValidationResult, schema: &FieldSchema) -> String {
    let mut out = format!("# Rule Analysis Report: {} - {}\n\n", rule.display_id(), rule.name);

    out.push_str(BASIC_INFO_HEADING);
    out.push_str("\n\n| Item | Value |\n|------|-------|\n");
    table_row(&mut out, "Rule ID", rule.display_id());
    table_row(&mut out, "Rule name", &rule.name);
    table_row(&mut out, "Priority", &rule.priority.to_string());
    table_row(&mut out, "Status", if rule.enabled { "Enabled" } else { "Disabled" });
    table_row(
        &mut out,
        "Description",
        rule.description.as_deref().unwrap_or("No description"),
    );

    let structure = &result.structure;
    out.push('\n');
    out.push_str(STRUCTURE_HEADING);
    out.push_str("\n\n| Item | Value |\n|------|-------|\n");
    table_row(&mut out, "Top-level operator", &top_level_operator(&rule.conditions));
    table_row(&mut out, "Nesting depth", &structure.depth.to_string());
    table_row(&mut out, "Condition nodes", &structure.condition_node_count.to_string());
    table_row(&mut out, "Field conditions", &structure.field_condition_count.to_string());
    table_row(&mut out, "Unique fields", &structure.unique_fields.len().to_string());
    table_row(&mut out, "Complexity score", &result.complexity_score.to_string());

    out.push_str("\nFields used:\n");
    if structure.unique_fields.is_empty() {
        out.push_str("  - none\n");
    }
    for field in &structure.unique_fields {
        out.push_str(&format!("  - {}\n", schema.label(field)));
    }
    if !result.rule_summary.is_empty() {
        out.push_str(&format!("\n{}\n", result.rule_summary));
    }

    out.push('\n');
    out.push_str(ISSUES_HEADING);
    out.push_str("\n\n");
    let counts = result.issue_counts();
    if counts.is_empty() {
        out.push_str("**Issue summary:** No issues found.\n\nNo issues were detected.\n");
    } else {
        out.push_str(&format!("**Issue summary:** {}\n", summary_line(counts)));
        for (issue_type, count) in counts.iter() {
            out.push_str(&count_line(issue_type, count));
            out.push('\n');
        }
        out.push_str(&format!(
            "\n{} error(s) must be fixed for the rule to work; {} warning(s) are advisory.\n\n",
            result.error_count(),
            result.warning_count()
        ));
        for (issue_type, count) in counts.iter() {
            let issues: Vec<&Issue> = result
                .issues()
                .iter()
                .filter(|issue| issue.issue_type == issue_type)
                .collect();
            out.push_str(&issue_section(issue_type, count, &issues));
        }
    }

    out.push('\n');
    out.push_str(ASSESSMENT_HEADING);
    out.push_str("\n\n");
    out.push_str(&assessment(rule, result));
    out.push('\n');
    out
}

/// Closing paragraph; depends only on validity and severities.
pub fn assessment(rule: &Rule, result: &ValidationResult) -> String {
    let mut text = if result.issues().is_empty() {
        "The rule passed every check and can be applied as is.".to_string()
    } else if !result.is_valid() {
        "The rule has errors that must be fixed before it is applied. Address the issues above and validate it again."
            .to_string()
    } else {
        "The rule only has warnings and can be applied; reviewing them would make it more robust.".to_string()
    };
    if rule.conditions.is_empty() {
        text.push_str("\n\nThe rule defines no conditions; add at least one before using it.");
    }
    if let Some(comment) = &result.ai_comment {
        text.push_str(&format!("\n\nAdvisory: {}", comment));
    }
    text
}

fn top_level_operator(conditions: &[Condition]) -> String {
    match conditions {
        [] => "N/A".to_string(),
        [Condition::Group(group)] => group.operator.clone(),
        _ => "AND (implicit)".to_string(),
    }
}

fn table_row(out: &mut String, item: &str, value: &str) {
    out.push_str(&format!("| {} | {} |\n", item, value.replace('|', "\\|")));
}
