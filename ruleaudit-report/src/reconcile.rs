//! Post-validation of generated report text against the analysis result.
//!
//! Generated prose is never trusted for numbers. The summary line, the
//! per-type count lines and the per-type subsection headings are rewritten
//! from [`ValidationResult::issue_counts`]; subsections for types that are
//! not present are removed and missing ones are synthesized from the issues.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use ruleaudit_rules::{Issue, IssueType, ValidationResult};

use crate::template::{count_line, issue_section, section_heading, summary_line};

/// Reconciled report text plus a description of every correction applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub report: String,
    pub corrections: Vec<String>,
}

impl Reconciliation {
    pub fn is_unchanged(&self) -> bool {
        self.corrections.is_empty()
    }
}

fn summary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)total:\s*(\d+)\s+issue\s+types?,\s*(\d+)\s+issues?\s+detected\.?")
            .expect("valid regex")
    })
}

fn section_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^###\s+(.+?):\s*(\d+)\s+issues?(?:\(s\))?\s*$").expect("valid regex")
    })
}

fn count_line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s+(.+?):\s*(\d+)\s+issues?(?:\(s\))?\s*$").expect("valid regex")
    })
}

fn assessment_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^##\s+(?:\d+\.\s*)?(?:assessment|overall)").expect("valid regex"))
}

pub fn reconcile(report: &str, result: &ValidationResult) -> Reconciliation {
    let mut corrections = Vec::new();
    let (lines, present) = rewrite_sections(report, result, &mut corrections);
    let mut text = lines.join("\n");

    text = rewrite_summary(text, result, &mut corrections);
    text = synthesize_missing(text, result, &present, &mut corrections);

    if report.ends_with('\n') && !text.ends_with('\n') {
        text.push('\n');
    }
    for correction in &corrections {
        debug!(correction = %correction, "report corrected");
    }
    Reconciliation {
        report: text,
        corrections,
    }
}

/// Fixes count headings and count lines, dropping subsections that are not backed by a count.
fn rewrite_sections(
    report: &str,
    result: &ValidationResult,
    corrections: &mut Vec<String>,
) -> (Vec<String>, BTreeSet<IssueType>) {
    let counts = result.issue_counts();
    let mut present = BTreeSet::new();
    let mut lines = Vec::new();
    let mut skipping = false;

    for line in report.lines() {
        if let Some(captures) = section_pattern().captures(line) {
            let claimed = &captures[1];
            let reported: usize = captures[2].parse().unwrap_or(usize::MAX);
            match IssueType::from_title(claimed).filter(|issue_type| counts.contains(*issue_type)) {
                Some(issue_type) if present.insert(issue_type) => {
                    let actual = counts.get(issue_type);
                    if reported != actual {
                        corrections.push(format!(
                            "subsection '{}' count {} -> {}",
                            issue_type.title(),
                            reported,
                            actual
                        ));
                    }
                    lines.push(section_heading(issue_type, actual));
                    skipping = false;
                }
                Some(issue_type) => {
                    corrections.push(format!("removed repeated subsection '{}'", issue_type.title()));
                    skipping = true;
                }
                None => {
                    corrections.push(format!("removed unbacked subsection '{}'", claimed.trim()));
                    skipping = true;
                }
            }
            continue;
        }

        if line.trim_start().starts_with('#') {
            skipping = false;
            lines.push(line.to_string());
            continue;
        }
        if skipping {
            continue;
        }

        if let Some(captures) = count_line_pattern().captures(line) {
            if let Some(issue_type) = IssueType::from_title(&captures[1]) {
                let actual = counts.get(issue_type);
                let reported: usize = captures[2].parse().unwrap_or(usize::MAX);
                if actual == 0 {
                    corrections.push(format!("removed unbacked count line '{}'", issue_type.title()));
                    continue;
                }
                if reported != actual {
                    corrections.push(format!(
                        "count line '{}' {} -> {}",
                        issue_type.title(),
                        reported,
                        actual
                    ));
                }
                lines.push(count_line(issue_type, actual));
                continue;
            }
        }

        lines.push(line.to_string());
    }

    (lines, present)
}

fn rewrite_summary(text: String, result: &ValidationResult, corrections: &mut Vec<String>) -> String {
    let counts = result.issue_counts();
    let expected = summary_line(counts);

    let mut claims = Vec::new();
    for captures in summary_pattern().captures_iter(&text) {
        claims.push((captures[0].to_string(), captures[1].to_string(), captures[2].to_string()));
    }

    if claims.is_empty() {
        if counts.is_empty() {
            return text;
        }
        corrections.push("inserted missing summary line".to_string());
        let mut block = format!("**Issue summary:** {}\n", expected);
        for (issue_type, count) in counts.iter() {
            block.push_str(&count_line(issue_type, count));
            block.push('\n');
        }
        block.push('\n');
        return insert_before_first(text, &block, |line| {
            section_pattern().is_match(line) || assessment_pattern().is_match(line)
        });
    }

    let mut text = text;
    for (claimed, types, total) in claims {
        if claimed.trim_end_matches('.') != expected.trim_end_matches('.') {
            corrections.push(format!(
                "summary {} types / {} issues -> {} / {}",
                types,
                total,
                counts.type_count(),
                counts.total()
            ));
            text = text.replace(&claimed, &expected);
        }
    }
    text
}

fn synthesize_missing(
    text: String,
    result: &ValidationResult,
    present: &BTreeSet<IssueType>,
    corrections: &mut Vec<String>,
) -> String {
    let mut text = text;
    for (issue_type, count) in result.issue_counts().iter() {
        if present.contains(&issue_type) {
            continue;
        }
        let issues: Vec<&Issue> = result
            .issues()
            .iter()
            .filter(|issue| issue.issue_type == issue_type)
            .collect();
        corrections.push(format!("added missing subsection '{}'", issue_type.title()));
        let section = issue_section(issue_type, count, &issues);
        text = insert_before_first(text, &section, |line| assessment_pattern().is_match(line));
    }
    text
}

/// Inserts `block` before the first line matching `anchor`, or appends it.
fn insert_before_first<F>(text: String, block: &str, anchor: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if anchor(line.trim_end_matches(['\r', '\n'])) {
            let mut out = String::with_capacity(text.len() + block.len());
            out.push_str(&text[..offset]);
            out.push_str(block);
            out.push_str(&text[offset..]);
            return out;
        }
        offset += line.len();
    }

    let mut out = text;
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(block);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::render_template;
    use ruleaudit_rules::{Condition, FieldSchema, Rule, RuleAnalyzer};

    fn analyzed() -> (Rule, ValidationResult) {
        let rule = Rule::new(
            "mixed",
            vec![
                Condition::compare("age", "==", 20),
                Condition::compare("age", "==", 20),
                Condition::compare("name", ">", "Kim"),
            ],
        );
        let result = RuleAnalyzer::with_builtin_schema().analyze(&rule);
        (rule, result)
    }

    #[test]
    fn template_needs_no_corrections() {
        let (rule, result) = analyzed();
        let report = render_template(&rule, &result, &FieldSchema::builtin());
        let reconciled = reconcile(&report, &result);
        assert!(reconciled.is_unchanged(), "{:?}", reconciled.corrections);
        assert_eq!(reconciled.report, report);
    }

    #[test]
    fn rewrites_wrong_counts_and_drops_invented_sections() {
        let (_, result) = analyzed();
        let generated = "\
## 3. Detected Issues

**Issue summary:** Total: 4 issue types, 7 issues detected.
- Duplicate conditions: 3 issue(s)
- Type mismatches: 2 issue(s)

### Duplicate conditions: 3 issue(s)

**age**
- age is repeated.

### Type mismatches: 2 issue(s)

**age**
- invented problem

## 4. Assessment

Fix it.
";
        let reconciled = reconcile(generated, &result);
        let report = &reconciled.report;

        assert!(report.contains("Total: 2 issue types, 2 issues detected."));
        assert!(report.contains("- Duplicate conditions: 1 issue(s)"));
        assert!(!report.contains("Type mismatches"));
        assert!(!report.contains("invented problem"));
        assert!(report.contains("### Duplicate conditions: 1 issue(s)"));
        assert!(report.contains("### Invalid operators: 1 issue(s)"));
        let added = report.find("### Invalid operators").expect("synthesized section");
        let assessment = report.find("## 4. Assessment").expect("assessment kept");
        assert!(added < assessment);
        assert!(report.ends_with("Fix it.\n"));
    }

    #[test]
    fn inserts_summary_when_generator_omits_it() {
        let (_, result) = analyzed();
        let generated = "Some prose without numbers.\n\n## Overall assessment\n\nLooks risky.";
        let reconciled = reconcile(generated, &result);
        let summary = reconciled
            .report
            .find("Total: 2 issue types, 2 issues detected.")
            .expect("summary inserted");
        let assessment = reconciled.report.find("## Overall assessment").expect("heading");
        assert!(summary < assessment);
        assert!(reconciled.report.contains("### Duplicate conditions: 1 issue(s)"));
    }

    #[test]
    fn clean_results_strip_every_issue_section() {
        let rule = Rule::new(
            "clean",
            vec![Condition::compare("age", ">=", 20), Condition::compare("age", "<", 65)],
        );
        let result = RuleAnalyzer::with_builtin_schema().analyze(&rule);
        let reconciled = reconcile(
            "Total: 1 issue types, 1 issues detected.\n\n### Self-contradictions: 1 issue(s)\n\n- bogus\n",
            &result,
        );
        assert!(reconciled.report.contains("Total: 0 issue types, 0 issues detected."));
        assert!(!reconciled.report.contains("bogus"));
    }
}
