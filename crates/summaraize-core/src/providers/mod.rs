//! Multi-provider LLM abstraction layer
//!
//! Supports Groq and OpenAI (both over the OpenAI chat completions wire
//! format) and Google Gemini. Providers implement the [`LlmProvider`] trait
//! and are composed via [`FallbackRouter`] for automatic failover.

pub mod gemini;
pub mod openai_compat;
pub mod router;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

use std::sync::Arc;

use tracing::debug;

use crate::config::{ProviderKind, ProvidersConfig};

pub use router::{FallbackRouter, Generation};
pub use types::{ChatMessage, ChatRole, GenerationRequest, GenerationResult, LlmProvider};

/// Build provider adapters in the configured priority order.
///
/// Providers whose credential is missing are still built; the router skips
/// them at invocation time.
pub fn build_providers(config: &ProvidersConfig) -> Vec<Arc<dyn LlmProvider>> {
    config
        .order
        .iter()
        .map(|kind| {
            let settings = config.settings(*kind);
            debug!(
                provider = kind.as_str(),
                model = settings.model.as_deref().unwrap_or("default"),
                has_key = !settings.api_key.is_empty(),
                "Building provider"
            );
            let provider: Arc<dyn LlmProvider> = match kind {
                ProviderKind::Groq => Arc::new(openai_compat::OpenAiCompatProvider::groq(settings)),
                ProviderKind::OpenAi => {
                    Arc::new(openai_compat::OpenAiCompatProvider::openai(settings))
                }
                ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(settings)),
            };
            provider
        })
        .collect()
}
