//! Provider-agnostic types for multi-provider generation

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A normalized generation request: system instructions plus user content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    system_prompt: String,
    user_content: String,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_content: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_content: user_content.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn user_content(&self) -> &str {
        &self.user_content
    }

    /// The request as an ordered `[system, user]` message list
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: ChatRole::System,
                content: self.system_prompt.clone(),
            },
            ChatMessage {
                role: ChatRole::User,
                content: self.user_content.clone(),
            },
        ]
    }
}

/// Provider-agnostic chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Text produced by a single provider call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
}

impl GenerationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Empty or whitespace-only text is not a usable result
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Trait that all LLM providers implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable provider name used in logs and reports (e.g. "groq", "gemini")
    fn identifier(&self) -> &str;

    /// Model identifier sent to the provider (e.g. "gpt-4o-mini")
    fn model(&self) -> &str;

    /// Whether the provider has the credential it needs
    fn is_available(&self) -> bool;

    /// Perform one generation call against the provider
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}
