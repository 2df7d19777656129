// Report rendering: template completeness and reconciliation of generated prose.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ruleaudit::report::generator::{GenerationRequest, ReportGenerator};
use ruleaudit::report::template::{count_line, section_heading, summary_line, ASSESSMENT_HEADING};
use ruleaudit::report::{reconcile, GeneratorError, ReportSource};
use ruleaudit::{Condition, FieldSchema, ReportRenderer, Rule, RuleAnalyzer, ValidationResult};

fn analyzed(rule: Rule) -> (Rule, ValidationResult) {
    let result = RuleAnalyzer::with_builtin_schema().analyze(&rule);
    (rule, result)
}

fn rules() -> Vec<Rule> {
    vec![
        Rule::new("empty", Vec::new()).with_id("R-0"),
        Rule::new(
            "bounded",
            vec![Condition::compare("age", ">=", 20), Condition::compare("age", "<", 65)],
        )
        .with_id("R-1"),
        Rule::new(
            "noisy",
            vec![
                Condition::compare("age", "==", 20),
                Condition::compare("age", "==", 20),
                Condition::compare("name", ">", "Kim"),
                Condition::compare("score", "==", "100"),
                Condition::any(vec![
                    Condition::compare("grade", "==", "VIP"),
                    Condition::compare("grade", "==", "GOLD"),
                ]),
            ],
        )
        .with_id("R-2"),
        Rule::new(
            "contradiction",
            vec![
                Condition::compare("score", ">", 90),
                Condition::compare("score", "<", 80),
                Condition::compare("MBL_ACT_MEM_PCNT", ">", 2),
            ],
        )
        .with_id("R-3"),
    ]
}

struct Scripted(&'static str);

#[async_trait]
impl ReportGenerator for Scripted {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
        assert!(request.prompt.contains("issue_counts"));
        Ok(self.0.to_string())
    }
}

struct Failing;

#[async_trait]
impl ReportGenerator for Failing {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, GeneratorError> {
        Err(GeneratorError::Http("connection reset by peer".to_string()))
    }
}

struct Slow;

#[async_trait]
impl ReportGenerator for Slow {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, GeneratorError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("too late".to_string())
    }
}

#[tokio::test]
async fn template_reports_every_counted_type() {
    let renderer = ReportRenderer::offline(FieldSchema::builtin());
    for rule in rules() {
        let (rule, result) = analyzed(rule);
        let report = renderer.render(&rule, &result).await;

        assert_eq!(report.source, ReportSource::Template);
        assert_eq!(report.rule_id, rule.display_id());
        if result.issue_counts().is_empty() {
            assert!(report.report.contains("No issues were detected."));
        } else {
            assert!(report.report.contains(&summary_line(result.issue_counts())));
        }
        for (issue_type, count) in result.issue_counts().iter() {
            assert!(
                report.report.contains(&section_heading(issue_type, count)),
                "{} missing from report for {}",
                issue_type,
                rule.name
            );
            assert!(report.report.contains(&count_line(issue_type, count)));
        }
        assert!(report.report.contains(ASSESSMENT_HEADING));
    }
}

#[test]
fn template_reports_are_already_reconciled() {
    let renderer = ReportRenderer::offline(FieldSchema::builtin());
    for rule in rules() {
        let (rule, result) = analyzed(rule);
        let report = renderer.render_template(&rule, &result);
        let reconciled = reconcile(&report.report, &result);
        assert!(reconciled.is_unchanged(), "{}: {:?}", rule.name, reconciled.corrections);
    }
}

#[tokio::test]
async fn generated_numbers_are_replaced_by_analysis_counts() {
    let (rule, result) = analyzed(rules().remove(3));
    let renderer = ReportRenderer::offline(FieldSchema::builtin()).with_generator(Arc::new(Scripted(
        "## Detected issues\n\nTotal: 5 issue types, 9 issues detected.\n\n### Self-contradictions: 4 issue(s)\n\n- score can never match.\n\n### Ambiguous branches: 2 issue(s)\n\n- made up\n\n## 4. Assessment\n\nRewrite the rule.\n",
    )));

    let report = renderer.render(&rule, &result).await;

    assert_eq!(report.source, ReportSource::Generated);
    assert!(report.report.contains(&summary_line(result.issue_counts())));
    assert!(report.report.contains("### Self-contradictions: 1 issue(s)"));
    assert!(report.report.contains("### Missing conditions: 1 issue(s)"));
    assert!(!report.report.contains("made up"));
    assert!(report.report.contains("Rewrite the rule."));
}

#[tokio::test]
async fn generator_failure_falls_back_to_template() {
    let (rule, result) = analyzed(rules().remove(2));
    let renderer = ReportRenderer::offline(FieldSchema::builtin()).with_generator(Arc::new(Failing));

    let report = renderer.render(&rule, &result).await;
    let template = renderer.render_template(&rule, &result);

    assert_eq!(report.source, ReportSource::Template);
    assert_eq!(report, template);
}

#[tokio::test]
async fn slow_generator_times_out_into_template() {
    let (rule, result) = analyzed(rules().remove(1));
    let renderer = ReportRenderer::offline(FieldSchema::builtin())
        .with_generator(Arc::new(Slow))
        .with_timeout(Duration::from_millis(50));

    let report = renderer.render(&rule, &result).await;

    assert_eq!(report.source, ReportSource::Template);
    assert!(!report.report.contains("too late"));
}
