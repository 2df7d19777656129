use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use ruleaudit_rules::{FieldSchema, Rule, ValidationResult};

use crate::error::GeneratorError;
use crate::generator::ReportGenerator;
use crate::prompt;
use crate::reconcile::reconcile;
use crate::template::render_template;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the report text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Generator prose, reconciled against the analysis.
    Generated,
    /// Deterministic template.
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    pub report: String,
    pub rule_id: String,
    pub rule_name: String,
    pub source: ReportSource,
}

/// Turns an analyzed rule into report text.
///
/// With a generator attached the prose comes from it, bounded by a timeout
/// and corrected by [`reconcile`]; any generator failure falls back to the
/// template. Rendering itself never fails.
#[derive(Clone)]
pub struct ReportRenderer {
    schema: FieldSchema,
    generator: Option<Arc<dyn ReportGenerator>>,
    timeout: Duration,
}

impl ReportRenderer {
    /// Template-only renderer.
    pub fn offline(schema: FieldSchema) -> Self {
        Self {
            schema,
            generator: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ReportGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub async fn render(&self, rule: &Rule, result: &ValidationResult) -> RuleReport {
        let draft = render_template(rule, result, &self.schema);
        let Some(generator) = &self.generator else {
            return self.finish(rule, draft, ReportSource::Template);
        };

        let rule_json = serde_json::to_value(rule).unwrap_or(Value::Null);
        let request = prompt::build_request(&rule_json, result, &draft);
        let outcome = match tokio::time::timeout(self.timeout, generator.generate(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GeneratorError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(text) => {
                let reconciled = reconcile(&text, result);
                if !reconciled.is_unchanged() {
                    info!(
                        rule = %rule.name,
                        corrections = reconciled.corrections.len(),
                        "generated report corrected against analysis"
                    );
                }
                self.finish(rule, reconciled.report, ReportSource::Generated)
            }
            Err(err) => {
                warn!(rule = %rule.name, error = %err, "report generator failed; using template");
                self.finish(rule, draft, ReportSource::Template)
            }
        }
    }

    /// Deterministic report without consulting the generator.
    pub fn render_template(&self, rule: &Rule, result: &ValidationResult) -> RuleReport {
        let draft = render_template(rule, result, &self.schema);
        self.finish(rule, draft, ReportSource::Template)
    }

    fn finish(&self, rule: &Rule, report: String, source: ReportSource) -> RuleReport {
        RuleReport {
            report,
            rule_id: rule.display_id().to_string(),
            rule_name: rule.name.clone(),
            source,
        }
    }
}
