use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use ruleaudit_core::GeneratorSettings;

use crate::error::GeneratorError;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 2000;

/// One prose-generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

/// Source of natural-language report text.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError>;
}

/// Typed client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionGenerator {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatCompletionGenerator {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeneratorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeneratorError::MissingCredentials);
        }

        let mut url = Url::parse(base_url).map_err(|err| GeneratorError::InvalidUrl {
            url: base_url.to_string(),
            source: err,
        })?;
        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_string();
            path.push('/');
            url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GeneratorError::Http(err.to_string()))?;

        Ok(Self {
            http,
            base_url: url,
            api_key,
            model: model.into(),
            timeout,
        })
    }

    /// Builds the client from process configuration; fails when no API key is set.
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, GeneratorError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(GeneratorError::MissingCredentials)?;
        Self::new(
            settings.base_url.as_str(),
            api_key,
            settings.model.clone(),
            settings.timeout,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReportGenerator for ChatCompletionGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GeneratorError> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|err| GeneratorError::InvalidUrl {
                url: format!("{}chat/completions", self.base_url),
                source: err,
            })?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, "requesting report prose");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GeneratorError::Timeout(self.timeout)
                } else {
                    GeneratorError::Http(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeneratorError::UnexpectedStatus {
                status: response.status(),
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|err| GeneratorError::Decode(err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GeneratorError::Decode("response contained no message content".into()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}
