//! Google Gemini `generateContent` client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{GenerationRequest, GenerationResult, LlmProvider};
use crate::config::ProviderSettings;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            base_url: settings
                .base_url
                .as_deref()
                .unwrap_or(GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_body(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(request.system_prompt().to_string()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.user_content().to_string()),
                }],
            }],
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn identifier(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = Self::build_body(request);

        debug!(model = self.model.as_str(), "Gemini generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send Gemini generateContent request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            anyhow::bail!("gemini returned HTTP {status}: {message}");
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini generateContent response")?;

        // Parts of the first candidate are fragments of one answer
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        debug!(chars = text.len(), "Gemini generateContent response");

        Ok(GenerationResult { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(&ProviderSettings {
            api_key: "APIKEY".to_string(),
            model: None,
            base_url: Some(server.uri()),
        })
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiProvider::build_body(&GenerationRequest::new("sys", "usr"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "usr");
    }

    #[test]
    fn test_defaults_and_availability() {
        let provider = GeminiProvider::new(&ProviderSettings::default());
        assert_eq!(provider.model(), GEMINI_DEFAULT_MODEL);
        assert_eq!(provider.base_url, GEMINI_BASE_URL);
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn test_generate_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "APIKEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Hello, " }, { "text": "world." }]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .generate(&GenerationRequest::new("sys", "usr"))
            .await
            .unwrap();
        assert_eq!(result.text, "Hello, world.");
    }

    #[tokio::test]
    async fn test_generate_blocked_prompt_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .generate(&GenerationRequest::new("sys", "usr"))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_generate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationRequest::new("sys", "usr"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gemini returned HTTP 403"));
        assert!(err.to_string().contains("API key not valid"));
    }
}
