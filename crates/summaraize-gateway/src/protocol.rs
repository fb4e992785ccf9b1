//! Gateway HTTP protocol: JSON bodies exchanged with the front-end

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    /// Guidance for the summary; may be empty
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub transcript: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(rename = "documentContent", alias = "document_content")]
    pub document_content: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: i64,
}

/// Error body: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: GatewayError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: String,
    pub message: String,
}

// ── Error codes ──

pub const ERR_INVALID_INPUT: &str = "invalid_input";
pub const ERR_GENERATION_FAILED: &str = "generation_failed";
pub const ERR_NO_PROVIDER: &str = "no_provider";
pub const ERR_PAYLOAD_TOO_LARGE: &str = "payload_too_large";

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: GatewayError {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
