use serde_json::Value;

use ruleaudit_rules::ValidationResult;

use crate::generator::GenerationRequest;
use crate::template::summary_line;

const SYSTEM_MESSAGE: &str = "\
You write review reports for business rules from the output of a static rule analyzer.

Rules you must follow:
1. Mention only the issues listed in the analysis. Never invent conditions, operators or issues.
2. Report counts exactly as given in the authoritative counts block.
3. Start the issue section with the summary line in exactly this format:
   Total: N issue types, M issues detected.
   followed by one line per issue type: `- <Type title>: <count> issue(s)`.
4. Give every issue type its own subsection headed `### <Type title>: <count> issue(s)`,
   using the type titles from the counts block.
5. Use field names and locations exactly as they appear in the issues.
6. If there is a self-contradiction, discuss it first and do not raise other issues for the same field.
7. Keep the four sections of the draft report: basic information, structure summary,
   detected issues and assessment.";

/// Builds the generator request for one analyzed rule.
pub fn build_request(rule_json: &Value, result: &ValidationResult, draft: &str) -> GenerationRequest {
    GenerationRequest {
        system: SYSTEM_MESSAGE.to_string(),
        prompt: user_prompt(rule_json, result, draft),
    }
}

fn user_prompt(rule_json: &Value, result: &ValidationResult, draft: &str) -> String {
    let rule_text = serde_json::to_string_pretty(rule_json).unwrap_or_else(|_| rule_json.to_string());
    let issues_text =
        serde_json::to_string_pretty(result.issues()).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Rewrite the draft report below into a clear review for the rule's author.\n\n\
         ## Rule\n```json\n{}\n```\n\n\
         {}\n\
         ## Issues\n```json\n{}\n```\n\n\
         ## Draft report\n{}\n",
        rule_text,
        counts_block(result),
        issues_text,
        draft
    )
}

/// Counts the generator must repeat verbatim.
pub fn counts_block(result: &ValidationResult) -> String {
    let counts = result.issue_counts();
    let counts_json = serde_json::to_string(counts).unwrap_or_else(|_| "{}".to_string());

    let mut block = String::from("## Authoritative counts\n");
    block.push_str(&format!("- issue_counts: {}\n", counts_json));
    block.push_str(&format!("- issue types: {}\n", counts.type_count()));
    block.push_str(&format!("- total issues: {}\n", counts.total()));
    block.push_str(&format!("- summary line: {}\n", summary_line(counts)));
    if !counts.is_empty() {
        block.push_str("\nPer type (report exactly these counts):\n");
        for (issue_type, count) in counts.iter() {
            block.push_str(&format!("- {} ({}): {} issue(s)\n", issue_type.title(), issue_type, count));
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleaudit_rules::{Condition, Rule, RuleAnalyzer};
    use serde_json::json;

    #[test]
    fn prompt_carries_authoritative_counts() {
        let rule = Rule::new(
            "dup",
            vec![Condition::compare("age", "==", 20), Condition::compare("age", "==", 20)],
        );
        let result = RuleAnalyzer::with_builtin_schema().analyze(&rule);
        let request = build_request(&json!({"name": "dup"}), &result, "draft body");

        assert!(request.system.contains("Total: N issue types, M issues detected."));
        assert!(request.prompt.contains("- issue_counts: {\"duplicate_condition\":1}"));
        assert!(request.prompt.contains("- summary line: Total: 1 issue types, 1 issues detected."));
        assert!(request.prompt.contains("- Duplicate conditions (duplicate_condition): 1 issue(s)"));
        assert!(request.prompt.ends_with("draft body\n"));
    }
}
