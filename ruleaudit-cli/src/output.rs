use colored::*;
use serde::Serialize;

use ruleaudit_rules::{Issue, Rule, Severity, ValidationResult};

/// One entry of `ruleaudit analyze --json`.
#[derive(Debug, Serialize)]
pub struct AnalysisEntry<'a> {
    pub rule_id: &'a str,
    pub rule_name: &'a str,
    pub validation_result: &'a ValidationResult,
}

pub fn print_analysis(rule: &Rule, result: &ValidationResult) {
    let title = format!("{} {}", rule.display_id(), rule.name);
    if result.is_valid() {
        println!("{} {}", "✔ valid".green().bold(), title.bold());
    } else {
        println!("{} {}", "✘ invalid".red().bold(), title.bold());
    }
    println!("  {}", result.summary());

    for issue in result.issues() {
        let tag = match issue.severity {
            Severity::Error => "[error]".red(),
            Severity::Warning => "[warning]".yellow(),
        };
        println!("  {} {}", tag, issue_line(issue));
        if !issue.suggestion.is_empty() {
            println!("      {} {}", "→".dimmed(), issue.suggestion.dimmed());
        }
    }

    if let Some(comment) = &result.ai_comment {
        println!("  {} {}", "Advisory:".cyan(), comment);
    }
    println!();
}

pub fn print_totals(results: &[ValidationResult]) {
    let line = totals_line(results);
    if results.iter().all(ValidationResult::is_valid) {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
}

pub fn print_report_written(path: &str, count: usize) {
    println!(
        "{} {} report(s) to {}",
        "✔ Wrote".green().bold(),
        count,
        path.bold()
    );
}

pub fn issue_line(issue: &Issue) -> String {
    let field = issue
        .field
        .as_deref()
        .map(|field| format!(" {}", field))
        .unwrap_or_default();
    format!(
        "{}{} @ {}: {}",
        issue.issue_type, field, issue.location, issue.explanation
    )
}

pub fn totals_line(results: &[ValidationResult]) -> String {
    let invalid = results.iter().filter(|result| !result.is_valid()).count();
    format!(
        "Analyzed {} rule(s): {} valid, {} invalid.",
        results.len(),
        results.len() - invalid,
        invalid
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleaudit_rules::{Condition, IssueType, RuleAnalyzer};

    #[test]
    fn formats_issue_lines_without_color() {
        let issue = Issue::error(IssueType::TypeMismatch, "condition 1", "Bad value.").with_field("score");
        assert_eq!(issue_line(&issue), "type_mismatch score @ condition 1: Bad value.");
    }

    #[test]
    fn totals_count_invalid_rules() {
        let analyzer = RuleAnalyzer::with_builtin_schema();
        let results = vec![
            analyzer.analyze(&Rule::new("ok", vec![Condition::compare("grade", "==", "VIP")])),
            analyzer.analyze(&Rule::new("empty", Vec::new())),
        ];
        assert_eq!(totals_line(&results), "Analyzed 2 rule(s): 1 valid, 1 invalid.");
    }
}
