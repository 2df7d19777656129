use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info};

use ruleaudit_rules::{rule_from_json, rule_summary, RuleAnalyzer, RuleError, ValidationResult};

use crate::renderer::{ReportRenderer, RuleReport};

/// Configuration for the report API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ReportServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub validation_result: ValidationResult,
    pub rule_summary: String,
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    rule_json: Value,
    #[serde(default)]
    validation_result: Option<ValidationResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
struct ReportServiceState {
    analyzer: Arc<RuleAnalyzer>,
    renderer: Arc<ReportRenderer>,
}

/// Helper used by the binary to compose the REST API router.
#[derive(Clone)]
pub struct ReportApiBuilder {
    state: ReportServiceState,
}

impl ReportApiBuilder {
    pub fn new(analyzer: RuleAnalyzer, renderer: ReportRenderer) -> Self {
        Self {
            state: ReportServiceState {
                analyzer: Arc::new(analyzer),
                renderer: Arc::new(renderer),
            },
        }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/api/v1/validate-json", post(validate_json))
            .route("/api/v1/report", post(report))
            .with_state(self.state)
    }

    /// Spawns an HTTP server binding to the configured address.
    pub async fn serve(self, config: ReportServiceConfig) -> anyhow::Result<oneshot::Sender<()>> {
        let (tx, rx) = oneshot::channel();
        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let app = self.into_router();

        tokio::spawn(async move {
            info!(address = %config.bind_address, "starting rule report service");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
                .ok();
        });

        Ok(tx)
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn validate_json(
    State(state): State<ReportServiceState>,
    Json(payload): Json<Value>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let rule = rule_from_json(&payload).map_err(bad_request)?;
    let validation_result = state.analyzer.analyze(&rule);
    debug!(
        rule = %rule.name,
        issues = validation_result.issues().len(),
        "validated rule payload"
    );
    Ok(Json(ValidateResponse {
        rule_summary: rule_summary(&rule, state.analyzer.schema()),
        validation_result,
    }))
}

async fn report(
    State(state): State<ReportServiceState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<RuleReport>, ApiError> {
    let rule = rule_from_json(&payload.rule_json).map_err(bad_request)?;
    // Supplied results were re-derived from their issue list during deserialization.
    let result = match payload.validation_result {
        Some(result) => result,
        None => state.analyzer.analyze(&rule),
    };
    Ok(Json(state.renderer.render(&rule, &result).await))
}

fn bad_request(err: RuleError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
        }),
    )
}
