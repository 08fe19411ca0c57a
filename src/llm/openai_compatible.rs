//! OpenAI-compatible chat completions client
//!
//! Groq, the Hugging Face router and OpenAI itself all accept
//! `POST {api_base}/chat/completions` with a bearer token, so one client
//! covers every [`ModelChoice`](super::ModelChoice).

use crate::llm::client::{GenerationParams, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Client for one model on one OpenAI-compatible endpoint.
pub struct OpenAICompatibleClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAICompatibleClient {
    /// Create a client sharing an existing HTTP connection pool.
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: None,
        }
    }

    /// Token limit used when the request parameters don't set one.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens.or(self.max_tokens),
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("LLM endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "LLM request failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(format!(
                    "LLM endpoint rejected the credential ({}): {}",
                    status, body
                )),
                StatusCode::TOO_MANY_REQUESTS => {
                    AppError::Generation(format!("LLM endpoint rate limit reached: {}", body))
                }
                _ => AppError::Generation(format!("LLM request failed ({}): {}", status, body)),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Malformed LLM response: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::Generation("LLM returned no answer text".to_string()))?;

        debug!(answer_len = text.len(), "Received completion");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
