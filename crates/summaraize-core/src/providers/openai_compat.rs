//! OpenAI chat completions client, shared by OpenAI and Groq

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ChatMessage, GenerationRequest, GenerationResult, LlmProvider};
use crate::config::ProviderSettings;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Provider speaking the `/chat/completions` wire format
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: Client,
    identifier: String,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("identifier", &self.identifier)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiCompatProvider {
    pub fn new(
        identifier: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            identifier: identifier.into(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn groq(settings: &ProviderSettings) -> Self {
        Self::from_settings("groq", settings, GROQ_DEFAULT_MODEL, GROQ_BASE_URL)
    }

    pub fn openai(settings: &ProviderSettings) -> Self {
        Self::from_settings("openai", settings, OPENAI_DEFAULT_MODEL, OPENAI_BASE_URL)
    }

    fn from_settings(
        identifier: &str,
        settings: &ProviderSettings,
        default_model: &str,
        default_base_url: &str,
    ) -> Self {
        Self::new(
            identifier,
            settings.api_key.clone(),
            settings.model.as_deref().unwrap_or(default_model),
            settings.base_url.as_deref().unwrap_or(default_base_url),
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let messages = request.messages();
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
        };
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            provider = self.identifier.as_str(),
            model = self.model.as_str(),
            "Chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} chat completion request", self.identifier))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            anyhow::bail!("{} returned HTTP {status}: {message}", self.identifier);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} chat completion response", self.identifier))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        debug!(
            provider = self.identifier.as_str(),
            chars = text.len(),
            "Chat completion response"
        );

        Ok(GenerationResult { text })
    }
}
